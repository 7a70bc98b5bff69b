//! Command and batch buffers. Commands are appended whole; relocations recorded against a
//! command are committed together with its bytes.

use std::ops::{Deref, DerefMut};

use intel_mhw_sys::HwCommand;
use tracing::{debug, trace, warn};

use crate::{
    os::{GpuResource, OsInterface, ResourceId},
    utils::{align_up, PAGE_SIZE},
    ve::VeHint,
    MhwStatus,
};

/// A pending address patch. `dw_index` is relative to the start of the buffer once
/// committed, and relative to the command while it is being built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    pub resource_id: ResourceId,
    /// Byte offset into the resource, already aligned to `1 << lsb_num`.
    pub offset: u64,
    pub dw_index: usize,
    pub lsb_num: u32,
    pub writable: bool,
    pub upper_bound: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandBufferAttributes {
    pub use_virtual_engine_hint: bool,
    pub virtual_engine_hint: Option<VeHint>,
}

#[derive(Debug, Clone)]
pub struct CommandBuffer {
    data: Vec<u32>,
    capacity: usize,
    relocations: Vec<Relocation>,
    resource: Option<GpuResource>,
    pub attributes: CommandBufferAttributes,
}

impl CommandBuffer {
    /// A buffer that accepts at most `capacity_bytes` bytes of commands.
    pub fn new(capacity_bytes: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity_bytes / 4),
            capacity: capacity_bytes,
            relocations: Vec::new(),
            resource: None,
            attributes: CommandBufferAttributes::default(),
        }
    }

    /// A buffer backed by an OS resource, for states that point back into the command buffer.
    pub fn allocate(os: &dyn OsInterface, capacity_bytes: u32) -> Result<Self, MhwStatus> {
        let size = align_up(capacity_bytes, PAGE_SIZE);
        let resource = os.allocate_resource(size, "command buffer")?;
        let mut buffer = Self::new(size as usize);
        buffer.resource = Some(resource);
        Ok(buffer)
    }

    pub fn resource(&self) -> Option<&GpuResource> {
        self.resource.as_ref()
    }

    /// Bytes written so far.
    pub fn offset(&self) -> usize {
        self.data.len() * 4
    }

    pub fn dword_offset(&self) -> usize {
        self.data.len()
    }

    pub fn remaining(&self) -> usize {
        self.capacity - self.offset()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn dwords(&self) -> &[u32] {
        &self.data
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        self.data.iter().flat_map(|dw| dw.to_le_bytes()).collect()
    }

    pub fn relocations(&self) -> &[Relocation] {
        &self.relocations
    }

    pub fn append_command<C: HwCommand>(&mut self, cmd: &C) -> Result<(), MhwStatus> {
        self.append_command_relocated(cmd, Vec::new())
    }

    /// Appends `cmd` and commits `relocations`, whose indices are relative to the command.
    pub fn append_command_relocated<C: HwCommand>(
        &mut self,
        cmd: &C,
        relocations: Vec<Relocation>,
    ) -> Result<(), MhwStatus> {
        trace!(command = C::NAME, size = C::BYTE_SIZE, "append");
        self.append_dwords_relocated(cmd.as_dwords(), relocations)
    }

    pub fn append_dwords(&mut self, dwords: &[u32]) -> Result<(), MhwStatus> {
        self.append_dwords_relocated(dwords, Vec::new())
    }

    pub(crate) fn append_dwords_relocated(
        &mut self,
        dwords: &[u32],
        relocations: Vec<Relocation>,
    ) -> Result<(), MhwStatus> {
        if dwords.len() * 4 > self.remaining() {
            warn!(
                needed = dwords.len() * 4,
                remaining = self.remaining(),
                "command buffer full"
            );
            return Err(MhwStatus::NoSpace);
        }
        if relocations.iter().any(|r| r.dw_index >= dwords.len()) {
            return Err(MhwStatus::InvalidParameter);
        }

        let base = self.data.len();
        self.data.extend_from_slice(dwords);
        self.relocations
            .extend(relocations.into_iter().map(|mut r| {
                r.dw_index += base;
                r
            }));
        Ok(())
    }

    /// Appends raw bytes. The length must be a whole number of DWords.
    pub fn append_bytes(&mut self, bytes: &[u8]) -> Result<(), MhwStatus> {
        if bytes.len() % 4 != 0 {
            return Err(MhwStatus::InvalidParameter);
        }
        let dwords: Vec<u32> = bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        self.append_dwords(&dwords)
    }

    /// Patches every pending relocation with the final GPU address of its resource and
    /// drains the list. Nothing is written unless every resource resolves.
    pub fn resolve_relocations<F>(&mut self, mut address_of: F) -> Result<usize, MhwStatus>
    where
        F: FnMut(ResourceId) -> Option<u64>,
    {
        let mut resolved = Vec::with_capacity(self.relocations.len());
        for reloc in &self.relocations {
            match address_of(reloc.resource_id) {
                Some(address) => resolved.push(address),
                None => {
                    warn!(id = reloc.resource_id, "relocation against unknown resource");
                    return Err(MhwStatus::InvalidHandle);
                }
            }
        }

        let count = self.relocations.len();
        for (reloc, base) in self.relocations.drain(..).zip(resolved) {
            let address = base + reloc.offset;
            crate::resource::write_address(&mut self.data, reloc.dw_index, address, reloc.lsb_num);
        }
        debug!(count, "resolved relocations");
        Ok(count)
    }

    /// Drops every command, relocation and attribute. The backing resource is kept.
    pub fn reset(&mut self) {
        self.data.clear();
        self.relocations.clear();
        self.attributes = CommandBufferAttributes::default();
    }
}

/// A second-level buffer that can be chained from a primary command buffer.
#[derive(Debug)]
pub struct BatchBuffer {
    buffer: CommandBuffer,
    resource: GpuResource,
    pub busy: bool,
    /// Number of times the batch has been submitted.
    pub count: u32,
}

impl BatchBuffer {
    pub fn allocate(os: &dyn OsInterface, size: u32) -> Result<Self, MhwStatus> {
        if size == 0 {
            return Err(MhwStatus::InvalidParameter);
        }
        let size = align_up(size, PAGE_SIZE);
        let resource = os.allocate_resource(size, "batch buffer")?;
        debug!(id = resource.id(), size, "allocated batch buffer");
        Ok(Self {
            buffer: CommandBuffer::new(size as usize),
            resource,
            busy: false,
            count: 0,
        })
    }

    pub fn resource(&self) -> &GpuResource {
        &self.resource
    }

    pub fn free(self, os: &dyn OsInterface) -> Result<(), MhwStatus> {
        if self.busy {
            warn!(id = self.resource.id(), "freeing a busy batch buffer");
        }
        os.free_resource(&self.resource)
    }
}

impl Deref for BatchBuffer {
    type Target = CommandBuffer;

    fn deref(&self) -> &Self::Target {
        &self.buffer
    }
}

impl DerefMut for BatchBuffer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buffer
    }
}

/// Appends `cmd` to the batch buffer when one is supplied, otherwise to the command buffer.
pub fn add_command_cmd_or_bb<C: HwCommand>(
    cmd_buffer: Option<&mut CommandBuffer>,
    batch: Option<&mut BatchBuffer>,
    cmd: &C,
) -> Result<(), MhwStatus> {
    match (batch, cmd_buffer) {
        (Some(batch), _) => batch.append_command(cmd),
        (None, Some(buffer)) => buffer.append_command(cmd),
        (None, None) => Err(MhwStatus::NullPointer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::os::MockOs;
    use intel_mhw_sys::g12::mi::{MiBatchBufferEnd, MiNoop, MiStoreDataImm};

    #[test]
    fn append_tracks_offset() {
        let mut buffer = CommandBuffer::new(64);
        buffer.append_command(&MiNoop::default()).unwrap();
        buffer.append_command(&MiStoreDataImm::default()).unwrap();
        assert_eq!(buffer.offset(), 24);
        assert_eq!(buffer.remaining(), 40);
        assert_eq!(buffer.dwords()[0], 0);
    }

    #[test]
    fn overflow_leaves_buffer_untouched() {
        let mut buffer = CommandBuffer::new(8);
        buffer.append_command(&MiNoop::default()).unwrap();
        let before = buffer.as_bytes();
        assert_eq!(
            buffer.append_command(&MiStoreDataImm::default()),
            Err(MhwStatus::NoSpace)
        );
        assert_eq!(buffer.as_bytes(), before);
        assert_eq!(buffer.offset(), 4);
    }

    #[test]
    fn append_bytes_needs_whole_dwords() {
        let mut buffer = CommandBuffer::new(16);
        assert_eq!(buffer.append_bytes(&[1, 2, 3]), Err(MhwStatus::InvalidParameter));
        buffer.append_bytes(&[0x78, 0x56, 0x34, 0x12]).unwrap();
        assert_eq!(buffer.dwords(), &[0x1234_5678]);
    }

    #[test]
    fn relocations_are_rebased() {
        let mut buffer = CommandBuffer::new(64);
        buffer.append_command(&MiNoop::default()).unwrap();
        let reloc = Relocation {
            resource_id: 7,
            offset: 0x40,
            dw_index: 1,
            lsb_num: 2,
            writable: true,
            upper_bound: false,
        };
        buffer
            .append_command_relocated(&MiStoreDataImm::default(), vec![reloc])
            .unwrap();
        assert_eq!(buffer.relocations()[0].dw_index, 2);

        let count = buffer
            .resolve_relocations(|id| (id == 7).then_some(0x2_0000_1000))
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(buffer.dwords()[2], 0x0000_1040);
        assert_eq!(buffer.dwords()[3], 0x2);
        assert!(buffer.relocations().is_empty());
    }

    #[test]
    fn unresolved_relocation_writes_nothing() {
        let mut buffer = CommandBuffer::new(64);
        let relocs = vec![
            Relocation {
                resource_id: 1,
                offset: 0,
                dw_index: 1,
                lsb_num: 2,
                writable: false,
                upper_bound: false,
            },
            Relocation {
                resource_id: 2,
                offset: 0,
                dw_index: 1,
                lsb_num: 2,
                writable: false,
                upper_bound: false,
            },
        ];
        buffer
            .append_command_relocated(&MiStoreDataImm::default(), relocs)
            .unwrap();
        let before = buffer.as_bytes();
        assert_eq!(
            buffer.resolve_relocations(|id| (id == 1).then_some(0x1000)),
            Err(MhwStatus::InvalidHandle)
        );
        assert_eq!(buffer.as_bytes(), before);
        assert_eq!(buffer.relocations().len(), 2);
    }

    #[test]
    fn batch_buffer_takes_precedence() {
        let os = MockOs::new();
        let mut primary = CommandBuffer::new(64);
        let mut batch = BatchBuffer::allocate(&os, 100).unwrap();
        assert_eq!(batch.capacity(), 4096);

        add_command_cmd_or_bb(Some(&mut primary), Some(&mut batch), &MiBatchBufferEnd::default()).unwrap();
        assert_eq!(primary.offset(), 0);
        assert_eq!(batch.offset(), 4);

        add_command_cmd_or_bb(Some(&mut primary), None, &MiBatchBufferEnd::default()).unwrap();
        assert_eq!(primary.offset(), 4);

        assert_eq!(
            add_command_cmd_or_bb::<MiNoop>(None, None, &MiNoop::default()),
            Err(MhwStatus::NullPointer)
        );
        batch.free(&os).unwrap();
    }

    #[test]
    fn reset_clears_attributes() {
        let mut buffer = CommandBuffer::new(16);
        buffer.attributes.use_virtual_engine_hint = true;
        buffer.append_command(&MiNoop::default()).unwrap();
        buffer.reset();
        assert_eq!(buffer.offset(), 0);
        assert!(!buffer.attributes.use_virtual_engine_hint);
    }
}
