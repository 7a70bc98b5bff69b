//! Writing resource addresses into commands.
//!
//! A command is built in a local DWord array. Each referenced resource gets its presumed
//! address written in place and a [`Relocation`] recorded, so the submission path can patch
//! the final address later. The caller commits the command and its relocations in one step,
//! see [`CommandBuffer::append_command_relocated`](crate::cmdbuffer::CommandBuffer::append_command_relocated).

use tracing::trace;

use crate::{
    cmdbuffer::Relocation,
    constants::ResourceAccess,
    os::{GpuResource, OsInterface},
    utils::{align_up, mask_bits},
    MhwStatus,
};

/// Bit position of the MOCS index inside the memory attribute DWord that follows most
/// video engine addresses.
pub const MOCS_ATTRIBUTE_LSB: u32 = 1;
pub const MOCS_INDEX_WIDTH: u32 = 6;

#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceParams<'a> {
    pub resource: Option<&'a GpuResource>,
    /// Byte offset into the resource.
    pub offset: u32,
    /// DWord of the command holding the low address bits.
    pub location_in_cmd: u32,
    /// Low address bits the field does not hold.
    pub lsb_num: u32,
    pub writable: bool,
    /// DWord, relative to `location_in_cmd`, receiving the upper bound. Zero disables it.
    pub upper_bound_location_offset: u32,
    /// Size used for the upper bound. Zero means the whole resource.
    pub size: u32,
    /// DWord, relative to `location_in_cmd`, holding the MOCS attribute.
    pub shared_mocs_offset: i32,
    pub mocs_index: Option<u32>,
    /// Bit position of the MOCS index in the attribute DWord.
    pub mocs_lsb: u32,
}

impl<'a> ResourceParams<'a> {
    pub fn new(resource: Option<&'a GpuResource>, location_in_cmd: u32) -> Self {
        Self {
            resource,
            location_in_cmd,
            mocs_lsb: MOCS_ATTRIBUTE_LSB,
            ..Default::default()
        }
    }

    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    pub fn writable(mut self, writable: bool) -> Self {
        self.writable = writable;
        self
    }

    pub fn with_lsb(mut self, lsb_num: u32) -> Self {
        self.lsb_num = lsb_num;
        self
    }

    pub fn with_upper_bound(mut self, location_offset: u32, size: u32) -> Self {
        self.upper_bound_location_offset = location_offset;
        self.size = size;
        self
    }

    pub fn with_mocs(mut self, shared_offset: i32, lsb: u32, index: u32) -> Self {
        self.shared_mocs_offset = shared_offset;
        self.mocs_lsb = lsb;
        self.mocs_index = Some(index);
        self
    }
}

/// Writes `address` into `cmd[loc]` (keeping the low `lsb` control bits) and `cmd[loc + 1]`.
pub(crate) fn write_address(cmd: &mut [u32], loc: usize, address: u64, lsb: u32) {
    let mask = mask_bits(lsb);
    cmd[loc] = (cmd[loc] & !mask) | (address as u32 & mask);
    cmd[loc + 1] = (address >> 32) as u32;
}

/// Places a MOCS table index into bits `bit..bit + width` of `cmd[dw_index]`.
pub fn encode_mocs(cmd: &mut [u32], dw_index: usize, bit: u32, width: u32, value: u32) -> Result<(), MhwStatus> {
    if dw_index >= cmd.len() || width == 0 || bit + width > 32 {
        return Err(MhwStatus::InvalidParameter);
    }
    let field = if width == 32 { u32::MAX } else { (1u32 << width) - 1 };
    if value > field {
        return Err(MhwStatus::InvalidParameter);
    }
    cmd[dw_index] = (cmd[dw_index] & !(field << bit)) | (value << bit);
    Ok(())
}

/// Registers `params.resource` with the OS, writes its presumed address (plus offset) into
/// `cmd` and records a relocation for the address and, if requested, the upper bound.
///
/// Every check happens before `cmd` or `relocations` is touched.
pub fn add_resource_to_cmd(
    os: &dyn OsInterface,
    cmd: &mut [u32],
    relocations: &mut Vec<Relocation>,
    params: &ResourceParams,
) -> Result<(), MhwStatus> {
    let resource = params.resource.ok_or(MhwStatus::NullPointer)?;
    if params.lsb_num >= 32 {
        return Err(MhwStatus::InvalidParameter);
    }

    let loc = params.location_in_cmd as usize;
    if loc + 1 >= cmd.len() {
        return Err(MhwStatus::InvalidParameter);
    }

    let upper_bound_loc = match params.upper_bound_location_offset {
        0 => None,
        offset => {
            let ub = loc + offset as usize;
            if ub + 1 >= cmd.len() {
                return Err(MhwStatus::InvalidParameter);
            }
            Some(ub)
        }
    };

    let mocs_loc = match params.mocs_index {
        Some(index) => {
            let dw = params.location_in_cmd as i64 + params.shared_mocs_offset as i64;
            if dw < 0 || dw as usize >= cmd.len() {
                return Err(MhwStatus::InvalidParameter);
            }
            if params.mocs_lsb + MOCS_INDEX_WIDTH > 32 || index >= 1 << MOCS_INDEX_WIDTH {
                return Err(MhwStatus::InvalidParameter);
            }
            Some((dw as usize, index))
        }
        None => None,
    };

    let access = if params.writable {
        ResourceAccess::READ_WRITE
    } else {
        ResourceAccess::READ
    };
    os.register_resource(resource, access)?;

    let alignment = 1u32 << params.lsb_num;
    let offset = align_up(params.offset, alignment) as u64;
    let presumed = os.presumed_address(resource).unwrap_or(0);
    let address = presumed + offset;
    write_address(cmd, loc, address, params.lsb_num);
    relocations.push(Relocation {
        resource_id: resource.id(),
        offset,
        dw_index: loc,
        lsb_num: params.lsb_num,
        writable: params.writable,
        upper_bound: false,
    });

    if let Some(ub) = upper_bound_loc {
        let size = match params.size {
            0 => resource.size(),
            size => size,
        };
        let size = align_up(size, alignment) as u64;
        write_address(cmd, ub, address + size, params.lsb_num);
        relocations.push(Relocation {
            resource_id: resource.id(),
            offset: offset + size,
            dw_index: ub,
            lsb_num: params.lsb_num,
            writable: params.writable,
            upper_bound: true,
        });
    }

    if let Some((dw, index)) = mocs_loc {
        encode_mocs(cmd, dw, params.mocs_lsb, MOCS_INDEX_WIDTH, index)?;
    }

    trace!(
        id = resource.id(),
        loc,
        offset,
        writable = params.writable,
        upper_bound = upper_bound_loc.is_some(),
        "resource added to command"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::os::MockOs;

    #[test]
    fn address_keeps_control_bits() {
        let os = MockOs::new();
        let res = os.allocate_resource(0x2000, "surface").unwrap();
        let base = os.gpu_address(res.id()).unwrap();

        let mut cmd = [0u32; 4];
        cmd[1] = 0xABC;
        let mut relocs = Vec::new();
        let params = ResourceParams::new(Some(&res), 1).with_lsb(12).with_offset(0x10);
        add_resource_to_cmd(&os, &mut cmd, &mut relocs, &params).unwrap();

        // The offset is aligned up to the 4KB the field can express.
        let expected = base + 0x1000;
        assert_eq!(cmd[1], (expected as u32 & 0xFFFF_F000) | 0xABC);
        assert_eq!(cmd[2], (expected >> 32) as u32);
        assert_eq!(relocs.len(), 1);
        assert_eq!(relocs[0].offset, 0x1000);
        assert_eq!(os.registered_access(res.id()), Some(ResourceAccess::READ));
    }

    #[test]
    fn upper_bound_adds_second_relocation() {
        let os = MockOs::new().without_presumed_addresses();
        let res = os.allocate_resource(0x1800, "bitstream").unwrap();

        let mut cmd = [0u32; 6];
        let mut relocs = Vec::new();
        let params = ResourceParams::new(Some(&res), 1)
            .with_lsb(12)
            .writable(true)
            .with_upper_bound(3, 0);
        add_resource_to_cmd(&os, &mut cmd, &mut relocs, &params).unwrap();

        assert_eq!(cmd[1], 0);
        assert_eq!(cmd[4], 0x2000);
        assert_eq!(relocs.len(), 2);
        assert!(relocs[1].upper_bound);
        assert_eq!(relocs[1].dw_index, 4);
        assert_eq!(relocs[1].offset, 0x2000);
        assert_eq!(os.registered_access(res.id()), Some(ResourceAccess::READ_WRITE));
    }

    #[test]
    fn shared_mocs_lands_in_attribute_dword() {
        let os = MockOs::new();
        let res = os.allocate_resource(0x1000, "state").unwrap();

        let mut cmd = [0u32; 8];
        let mut relocs = Vec::new();
        // Attribute DWord sits before the address.
        let params = ResourceParams::new(Some(&res), 4)
            .with_lsb(12)
            .with_mocs(1 - 4, 26, 3);
        add_resource_to_cmd(&os, &mut cmd, &mut relocs, &params).unwrap();
        assert_eq!(cmd[1], 3 << 26);
    }

    #[test]
    fn failures_leave_command_untouched() {
        let os = MockOs::new();
        let res = os.allocate_resource(0x1000, "x").unwrap();
        let mut cmd = [0x5A5A_5A5Au32; 4];
        let mut relocs = Vec::new();

        let missing = ResourceParams::new(None, 1);
        assert_eq!(
            add_resource_to_cmd(&os, &mut cmd, &mut relocs, &missing),
            Err(MhwStatus::NullPointer)
        );

        let past_end = ResourceParams::new(Some(&res), 3);
        assert_eq!(
            add_resource_to_cmd(&os, &mut cmd, &mut relocs, &past_end),
            Err(MhwStatus::InvalidParameter)
        );

        let bad_bound = ResourceParams::new(Some(&res), 1).with_upper_bound(2, 0);
        assert_eq!(
            add_resource_to_cmd(&os, &mut cmd, &mut relocs, &bad_bound),
            Err(MhwStatus::InvalidParameter)
        );

        let bad_mocs = ResourceParams::new(Some(&res), 1).with_mocs(-2, 1, 1);
        assert_eq!(
            add_resource_to_cmd(&os, &mut cmd, &mut relocs, &bad_mocs),
            Err(MhwStatus::InvalidParameter)
        );

        assert_eq!(cmd, [0x5A5A_5A5A; 4]);
        assert!(relocs.is_empty());
        assert_eq!(os.registered_access(res.id()), Some(ResourceAccess::empty()));
    }

    #[test]
    fn unregistered_resource_is_rejected() {
        let os = MockOs::new();
        let res = os.allocate_resource(0x1000, "gone").unwrap();
        os.free_resource(&res).unwrap();
        let mut cmd = [0u32; 4];
        let mut relocs = Vec::new();
        assert_eq!(
            add_resource_to_cmd(&os, &mut cmd, &mut relocs, &ResourceParams::new(Some(&res), 1)),
            Err(MhwStatus::InvalidHandle)
        );
        assert_eq!(cmd, [0; 4]);
    }

    #[test]
    fn mocs_field_bounds() {
        let mut cmd = [0u32; 2];
        encode_mocs(&mut cmd, 1, 1, 6, 0x3F).unwrap();
        assert_eq!(cmd[1], 0x3F << 1);
        assert_eq!(encode_mocs(&mut cmd, 1, 1, 6, 0x40), Err(MhwStatus::InvalidParameter));
        assert_eq!(encode_mocs(&mut cmd, 2, 1, 6, 1), Err(MhwStatus::InvalidParameter));
        assert_eq!(encode_mocs(&mut cmd, 0, 30, 6, 1), Err(MhwStatus::InvalidParameter));
    }
}
