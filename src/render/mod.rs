//! Render and compute front end state shared by the Gen12 media pipeline and the Xe_HPG
//! compute pipeline.

use intel_mhw_sys::{g12::mi::MiLoadRegisterImm, g12::render::StateBaseAddress, HwCommand};
use tracing::{debug, trace};

use crate::{
    caps::{HwCaps, L3_CACHE_CNTL_REGISTER},
    cmdbuffer::{CommandBuffer, Relocation},
    constants::MocsUsage,
    mi::MmioRegisters,
    os::{GpuResource, OsInterface},
    resource::{add_resource_to_cmd, ResourceParams},
    utils::page_count,
    MhwStatus,
};

pub mod g12;
pub mod xe_hpg;

pub use g12::RenderInterfaceG12;
pub use xe_hpg::RenderInterfaceXeHpg;

/// Largest per-thread scratch space the front end can address.
pub const MAX_PER_THREAD_SCRATCH_SPACE: u32 = 2 * 1024 * 1024;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KernelParams {
    pub thread_count: u32,
}

/// Front end settings common to every generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VfeBaseParams {
    /// Zero selects the kernel's thread count, then the platform maximum.
    pub max_threads: u32,
    pub kernel: Option<KernelParams>,
    pub number_of_urb_entries: u32,
    pub urb_entry_allocation_size: u32,
    /// CURBE allocation in bytes.
    pub curbe_allocation_size: u32,
    /// Encoded per-thread scratch space, see [`encode_per_thread_scratch_space`].
    pub per_thread_scratch_space: u32,
    pub scratch_space_base: u32,
    pub stack_size: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VfeGen12Params {
    pub base: VfeBaseParams,
    pub fused_eu_dispatch: bool,
    pub max_dual_subslices: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CfeParams {
    pub base: VfeBaseParams,
    pub fused_eu_dispatch: bool,
    pub number_of_walkers: u32,
    pub single_slice_dispatch_ccs_mode: bool,
    /// Byte offset of the scratch surface state, 64-byte aligned.
    pub scratch_surface_state_offset: u32,
}

/// Front end parameters tagged with the generation that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VfeParams {
    Base(VfeBaseParams),
    Gen12(VfeGen12Params),
    XeHpg(CfeParams),
}

impl VfeParams {
    pub fn base(&self) -> &VfeBaseParams {
        match self {
            VfeParams::Base(base) => base,
            VfeParams::Gen12(p) => &p.base,
            VfeParams::XeHpg(p) => &p.base,
        }
    }
}

/// Maximum thread count field value. The hardware counts from zero.
pub(crate) fn max_threads_field(caps: &HwCaps, base: &VfeBaseParams) -> u32 {
    if base.max_threads > 0 {
        base.max_threads - 1
    } else if let Some(kernel) = base.kernel {
        kernel.thread_count.saturating_sub(1)
    } else {
        caps.max_threads.saturating_sub(1)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GpgpuWalkerParams {
    pub interface_descriptor_offset: u32,
    pub group_start_x: u32,
    pub group_start_y: u32,
    pub group_start_z: u32,
    /// Group and thread dimensions treat zero as one.
    pub group_width: u32,
    pub group_height: u32,
    pub group_depth: u32,
    pub thread_width: u32,
    pub thread_height: u32,
    pub thread_depth: u32,
    pub indirect_data_length: u32,
    pub indirect_data_start_address: u32,
    pub emit_local_id: bool,
    pub generate_local_id: bool,
    /// Copied into the walker's inline data.
    pub inline_data: Option<[u32; 8]>,
}

pub(crate) fn zero_means_one(value: u32) -> u32 {
    value.max(1)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterfaceDescriptorParams {
    pub kernel_offset: u32,
    pub sampler_state_offset: u32,
    pub sampler_count: u32,
    pub binding_table_offset: u32,
    /// Shared local memory in bytes.
    pub slm_size: u32,
    pub barrier_enable: bool,
    pub preempt_disable: bool,
}

/// Heaps programmed by STATE_BASE_ADDRESS. A `None` resource leaves the base unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct StateBaseAddressParams<'a> {
    pub general_state: Option<&'a GpuResource>,
    pub general_state_size: u32,
    pub surface_state: Option<&'a GpuResource>,
    pub surface_state_offset: u32,
    pub dynamic_state: Option<&'a GpuResource>,
    pub dynamic_state_size: u32,
    pub indirect_object: Option<&'a GpuResource>,
    pub indirect_object_size: u32,
    pub instruction: Option<&'a GpuResource>,
    pub instruction_size: u32,
    pub bindless_surface: Option<&'a GpuResource>,
    pub bindless_surface_size: u32,
    /// MOCS overrides. Zero keeps the platform default.
    pub general_state_mocs: u32,
    pub surface_state_mocs: u32,
    pub dynamic_state_mocs: u32,
    pub indirect_object_mocs: u32,
    pub instruction_mocs: u32,
    pub stateless_mocs: u32,
}

/// Points the surface state base at the indirect state area of the command buffer when
/// the kernel driver does not patch it.
pub fn set_indirect_state_base<'a>(
    os: &dyn OsInterface,
    cmd_buffer_resource: Option<&'a GpuResource>,
    params: &mut StateBaseAddressParams<'a>,
) -> Result<(), MhwStatus> {
    if !os.no_kmd_parsing() {
        return Ok(());
    }
    let resource = cmd_buffer_resource.ok_or(MhwStatus::NullPointer)?;
    let (offset, size) = os.get_indirect_state()?;
    debug!(offset, size, "surface state base moved to indirect state");
    params.surface_state = Some(resource);
    params.surface_state_offset = offset;
    Ok(())
}

fn pick_mocs(override_index: u32, caps: &HwCaps) -> u32 {
    match override_index {
        0 => caps.mocs_index(MocsUsage::StateHeap),
        index => index,
    }
}

/// Fills STATE_BASE_ADDRESS. Shared by every render generation.
pub(crate) fn build_state_base_address(
    os: &dyn OsInterface,
    caps: &HwCaps,
    params: &StateBaseAddressParams,
) -> Result<(StateBaseAddress, Vec<Relocation>), MhwStatus> {
    let mut cmd = StateBaseAddress::default();
    let mut relocs = Vec::new();
    let lsb = StateBaseAddress::BASE_ADDRESS_SHIFT;

    // MOCS fields hold the table index above a reserved bit.
    if let Some(res) = params.general_state {
        cmd.set_general_state_base_address_modify_enable(1);
        cmd.set_general_state_memory_object_control_state(pick_mocs(params.general_state_mocs, caps) << 1);
        cmd.set_general_state_buffer_size_modify_enable(1);
        cmd.set_general_state_buffer_size(page_count(params.general_state_size));
        let p = ResourceParams::new(Some(res), StateBaseAddress::GENERAL_STATE_BASE_DW).with_lsb(lsb);
        add_resource_to_cmd(os, cmd.as_dwords_mut(), &mut relocs, &p)?;
    }

    if let Some(res) = params.surface_state {
        cmd.set_surface_state_base_address_modify_enable(1);
        cmd.set_surface_state_memory_object_control_state(pick_mocs(params.surface_state_mocs, caps) << 1);
        let p = ResourceParams::new(Some(res), StateBaseAddress::SURFACE_STATE_BASE_DW)
            .with_offset(params.surface_state_offset)
            .with_lsb(lsb);
        add_resource_to_cmd(os, cmd.as_dwords_mut(), &mut relocs, &p)?;
    }

    if let Some(res) = params.dynamic_state {
        cmd.set_dynamic_state_base_address_modify_enable(1);
        cmd.set_dynamic_state_memory_object_control_state(pick_mocs(params.dynamic_state_mocs, caps) << 1);
        cmd.set_dynamic_state_buffer_size_modify_enable(1);
        cmd.set_dynamic_state_buffer_size(page_count(params.dynamic_state_size));
        let p = ResourceParams::new(Some(res), StateBaseAddress::DYNAMIC_STATE_BASE_DW).with_lsb(lsb);
        add_resource_to_cmd(os, cmd.as_dwords_mut(), &mut relocs, &p)?;
    }

    if let Some(res) = params.indirect_object {
        cmd.set_indirect_object_base_address_modify_enable(1);
        cmd.set_indirect_object_memory_object_control_state(pick_mocs(params.indirect_object_mocs, caps) << 1);
        cmd.set_indirect_object_buffer_size_modify_enable(1);
        cmd.set_indirect_object_buffer_size(page_count(params.indirect_object_size));
        let p = ResourceParams::new(Some(res), StateBaseAddress::INDIRECT_OBJECT_BASE_DW).with_lsb(lsb);
        add_resource_to_cmd(os, cmd.as_dwords_mut(), &mut relocs, &p)?;
    }

    if let Some(res) = params.instruction {
        cmd.set_instruction_base_address_modify_enable(1);
        cmd.set_instruction_memory_object_control_state(pick_mocs(params.instruction_mocs, caps) << 1);
        cmd.set_instruction_buffer_size_modify_enable(1);
        cmd.set_instruction_buffer_size(page_count(params.instruction_size));
        let p = ResourceParams::new(Some(res), StateBaseAddress::INSTRUCTION_BASE_DW).with_lsb(lsb);
        add_resource_to_cmd(os, cmd.as_dwords_mut(), &mut relocs, &p)?;
    }

    if let Some(res) = params.bindless_surface {
        cmd.set_bindless_surface_state_base_address_modify_enable(1);
        cmd.set_bindless_surface_state_memory_object_control_state(
            caps.mocs_index(MocsUsage::StateHeap) << 1,
        );
        cmd.set_bindless_surface_state_size(page_count(params.bindless_surface_size));
        let p = ResourceParams::new(Some(res), StateBaseAddress::BINDLESS_SURFACE_BASE_DW).with_lsb(lsb);
        add_resource_to_cmd(os, cmd.as_dwords_mut(), &mut relocs, &p)?;
    }

    let stateless = match params.stateless_mocs {
        0 => caps.mocs_index(MocsUsage::Default),
        index => index,
    };
    cmd.set_stateless_data_port_access_memory_object_control_state(stateless << 1);

    trace!(relocations = relocs.len(), "state base address built");
    Ok((cmd, relocs))
}

/// Shared STATE_BASE_ADDRESS emission, including the indirect state base substitution.
pub(crate) fn emit_state_base_address(
    os: &dyn OsInterface,
    caps: &HwCaps,
    buffer: &mut CommandBuffer,
    params: &StateBaseAddressParams,
) -> Result<(), MhwStatus> {
    let cmd_resource = buffer.resource().cloned();
    let mut local = *params;
    set_indirect_state_base(os, cmd_resource.as_ref(), &mut local)?;
    let (cmd, relocs) = build_state_base_address(os, caps, &local)?;
    buffer.append_command_relocated(&cmd, relocs)
}

/// Encodes a per-thread scratch space size in bytes as the power of two above 1KB.
/// Sizes are rounded up to the next power of two. Zero disables scratch space.
pub fn encode_per_thread_scratch_space(bytes: u32) -> Result<u32, MhwStatus> {
    if bytes == 0 {
        return Ok(0);
    }
    if bytes > MAX_PER_THREAD_SCRATCH_SPACE {
        return Err(MhwStatus::InvalidParameter);
    }
    let size = bytes.max(1024).next_power_of_two();
    Ok((size >> 10).trailing_zeros())
}

/// Bytes of scratch memory needed to give every hardware thread `per_thread` bytes.
pub fn get_scratch_space_size(caps: &HwCaps, per_thread: u32) -> u32 {
    if caps.eu_count == 0 || caps.subslice_count == 0 {
        return 0;
    }
    let threads_per_eu = caps.max_threads / caps.eu_count;
    let eu_per_subslice = caps.eu_count / caps.subslice_count;
    let entries = eu_per_subslice * threads_per_eu * caps.subslice_count;
    entries.saturating_mul(per_thread)
}

/// Programs the L3 cache configuration. `value` overrides the platform default.
pub fn enable_l3_cache(buffer: &mut CommandBuffer, caps: &HwCaps, value: Option<u32>) -> Result<(), MhwStatus> {
    let mut cmd = MiLoadRegisterImm::default();
    cmd.set_register_offset(L3_CACHE_CNTL_REGISTER >> 2);
    cmd.set_data_dword(value.unwrap_or(caps.l3_cache_cntl_value));
    buffer.append_command(&cmd)
}

pub fn init_mmio_registers() -> MmioRegisters {
    MmioRegisters::for_render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{caps::caps_for, constants::ProductFamily, os::MockOs};

    fn tgl() -> &'static HwCaps {
        caps_for(ProductFamily::TigerlakeLp).unwrap()
    }

    #[test]
    fn thread_count_minus_one() {
        let caps = tgl();
        let mut base = VfeBaseParams {
            max_threads: 64,
            ..Default::default()
        };
        assert_eq!(max_threads_field(caps, &base), 63);

        base.max_threads = 0;
        base.kernel = Some(KernelParams { thread_count: 10 });
        assert_eq!(max_threads_field(caps, &base), 9);

        base.kernel = Some(KernelParams { thread_count: 0 });
        assert_eq!(max_threads_field(caps, &base), 0);

        base.kernel = None;
        assert_eq!(max_threads_field(caps, &base), caps.max_threads - 1);
    }

    #[test]
    fn scratch_space_encoding() {
        assert_eq!(encode_per_thread_scratch_space(0), Ok(0));
        assert_eq!(encode_per_thread_scratch_space(1024), Ok(0));
        assert_eq!(encode_per_thread_scratch_space(2048), Ok(1));
        assert_eq!(encode_per_thread_scratch_space(3000), Ok(2));
        assert_eq!(encode_per_thread_scratch_space(MAX_PER_THREAD_SCRATCH_SPACE), Ok(11));
        assert_eq!(
            encode_per_thread_scratch_space(MAX_PER_THREAD_SCRATCH_SPACE + 1),
            Err(MhwStatus::InvalidParameter)
        );
    }

    #[test]
    fn scratch_space_covers_every_thread() {
        let caps = tgl();
        assert_eq!(get_scratch_space_size(caps, 1024), 672 * 1024);
    }

    #[test]
    fn l3_config() {
        let caps = tgl();
        let mut buffer = CommandBuffer::new(64);
        enable_l3_cache(&mut buffer, caps, None).unwrap();
        assert_eq!(buffer.dwords()[1], L3_CACHE_CNTL_REGISTER);
        assert_eq!(buffer.dwords()[2], caps.l3_cache_cntl_value);

        enable_l3_cache(&mut buffer, caps, Some(0x1234)).unwrap();
        assert_eq!(buffer.dwords()[5], 0x1234);
    }

    #[test]
    fn state_base_address_sizes_are_pages() {
        let os = MockOs::new();
        let caps = tgl();
        let heap = os.allocate_resource(8192, "heap").unwrap();
        let params = StateBaseAddressParams {
            dynamic_state: Some(&heap),
            dynamic_state_size: 1,
            instruction: Some(&heap),
            instruction_size: 4097,
            instruction_mocs: 5,
            ..Default::default()
        };
        let (cmd, relocs) = build_state_base_address(&os, caps, &params).unwrap();
        assert_eq!(cmd.dynamic_state_buffer_size(), 1);
        assert_eq!(cmd.instruction_buffer_size(), 2);
        assert_eq!(cmd.dynamic_state_base_address_modify_enable(), 1);
        assert_eq!(cmd.general_state_base_address_modify_enable(), 0);
        assert_eq!(cmd.dynamic_state_memory_object_control_state(), caps.mocs_index(MocsUsage::StateHeap) << 1);
        assert_eq!(cmd.instruction_memory_object_control_state(), 5 << 1);
        assert_eq!(relocs.len(), 2);
        assert_eq!(relocs[0].dw_index, StateBaseAddress::DYNAMIC_STATE_BASE_DW as usize);
        assert_eq!(relocs[1].dw_index, StateBaseAddress::INSTRUCTION_BASE_DW as usize);

        let address = os.gpu_address(heap.id()).unwrap();
        assert_eq!(cmd.dw[6] & 0xFFFF_F000, address as u32);
    }

    #[test]
    fn indirect_state_only_without_kmd_parsing() {
        let cb = MockOs::new().allocate_resource(4096, "cb").unwrap();

        let os = MockOs::new().with_indirect_state(0x3000, 0x1000);
        let mut params = StateBaseAddressParams::default();
        set_indirect_state_base(&os, Some(&cb), &mut params).unwrap();
        assert!(params.surface_state.is_none());

        let os = os.with_no_kmd_parsing(true);
        set_indirect_state_base(&os, Some(&cb), &mut params).unwrap();
        assert_eq!(params.surface_state.map(|r| r.id()), Some(cb.id()));
        assert_eq!(params.surface_state_offset, 0x3000);

        let mut params = StateBaseAddressParams::default();
        assert_eq!(
            set_indirect_state_base(&os, None, &mut params),
            Err(MhwStatus::NullPointer)
        );
    }
}
