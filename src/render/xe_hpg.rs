//! Xe_HPG compute front end. MEDIA_VFE_STATE and GPGPU_WALKER are replaced by CFE_STATE
//! and COMPUTE_WALKER, the interface descriptor travels inside the walker.

use std::sync::Arc;

use intel_mhw_sys::{xe_hpg::render::*, HwCommand};
use tracing::{debug, trace};

use super::{
    emit_state_base_address, g12::PipelineSelection, get_scratch_space_size, max_threads_field, zero_means_one,
    GpgpuWalkerParams, InterfaceDescriptorParams, StateBaseAddressParams, VfeParams,
};
use crate::{
    caps::HwCaps,
    cmdbuffer::{add_command_cmd_or_bb, BatchBuffer, CommandBuffer},
    constants::MocsUsage,
    mi::MmioRegisters,
    os::{GpuResource, OsInterface},
    resource::{add_resource_to_cmd, ResourceParams},
    utils::page_count,
    MhwStatus,
};

/// Completion write performed by the walker.
#[derive(Debug, Clone, Copy)]
pub struct WalkerPostSync<'a> {
    pub resource: &'a GpuResource,
    pub offset: u32,
    /// `None` writes a timestamp.
    pub immediate: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StateComputeModeParams {
    pub large_grf_mode: bool,
    pub force_non_coherent: u32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BindingTablePoolParams<'a> {
    pub resource: Option<&'a GpuResource>,
    pub size: u32,
    /// Zero keeps the platform default.
    pub mocs: u32,
}

/// `NumberOfWalkers` field value.
fn encode_number_of_walkers(n: u32) -> u32 {
    if n > 2 {
        1
    } else if n > 0 {
        n - 1
    } else {
        0
    }
}

/// SHARED_LOCAL_MEMORY_SIZE encoding for `bytes` of SLM per thread group.
fn encode_slm_size(bytes: u32) -> Result<u32, MhwStatus> {
    Ok(match bytes {
        0 => SHARED_LOCAL_MEMORY_SIZE_0K,
        1..=1024 => SHARED_LOCAL_MEMORY_SIZE_1K,
        1025..=2048 => SHARED_LOCAL_MEMORY_SIZE_2K,
        2049..=4096 => SHARED_LOCAL_MEMORY_SIZE_4K,
        4097..=8192 => SHARED_LOCAL_MEMORY_SIZE_8K,
        8193..=16384 => SHARED_LOCAL_MEMORY_SIZE_16K,
        16385..=32768 => SHARED_LOCAL_MEMORY_SIZE_32K,
        32769..=65536 => SHARED_LOCAL_MEMORY_SIZE_64K,
        _ => return Err(MhwStatus::InvalidParameter),
    })
}

pub struct RenderInterfaceXeHpg {
    os: Arc<dyn OsInterface>,
    caps: &'static HwCaps,
    mmio: MmioRegisters,
}

impl std::fmt::Debug for RenderInterfaceXeHpg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderInterfaceXeHpg")
            .field("family", &self.caps.family)
            .finish()
    }
}

impl RenderInterfaceXeHpg {
    #[tracing::instrument(skip(os, caps), fields(family = ?caps.family))]
    pub fn new(os: Arc<dyn OsInterface>, caps: &'static HwCaps) -> Self {
        debug!("compute interface created");
        Self {
            os,
            caps,
            mmio: super::init_mmio_registers(),
        }
    }

    pub fn caps(&self) -> &'static HwCaps {
        self.caps
    }

    pub fn mmio_registers(&self) -> &MmioRegisters {
        &self.mmio
    }

    pub fn add_cfe_state(&self, buffer: &mut CommandBuffer, params: &VfeParams) -> Result<(), MhwStatus> {
        let VfeParams::XeHpg(cfe) = params else {
            return Err(MhwStatus::InvalidParameter);
        };

        let mut cmd = CfeState::default();
        cmd.set_maximum_number_of_threads(max_threads_field(self.caps, &cfe.base));
        cmd.set_scratch_space_buffer(cfe.scratch_surface_state_offset >> 6);
        // The field is the inverse of the requested mode.
        cmd.set_fused_eu_dispatch(!cfe.fused_eu_dispatch as u32);
        cmd.set_number_of_walkers(encode_number_of_walkers(cfe.number_of_walkers));
        cmd.set_single_slice_dispatch_ccs_mode(cfe.single_slice_dispatch_ccs_mode as u32);

        trace!(
            max_threads = cmd.maximum_number_of_threads(),
            walkers = cmd.number_of_walkers(),
            "CFE_STATE"
        );
        buffer.append_command(&cmd)
    }

    pub fn add_compute_walker(
        &self,
        buffer: &mut CommandBuffer,
        walker: &GpgpuWalkerParams,
        descriptor: &InterfaceDescriptorParams,
        post_sync: Option<WalkerPostSync>,
    ) -> Result<(), MhwStatus> {
        let slm = encode_slm_size(descriptor.slm_size)?;
        let thread_width = zero_means_one(walker.thread_width);
        let thread_height = zero_means_one(walker.thread_height);
        let threads = thread_width * thread_height;

        let mut cmd = ComputeWalker::default();
        cmd.set_indirect_data_length(walker.indirect_data_length);
        cmd.set_indirect_data_start_address(walker.indirect_data_start_address >> 6);
        cmd.set_simd_size(intel_mhw_sys::g12::render::SIMD_SIZE_SIMD32);
        cmd.set_message_simd(intel_mhw_sys::g12::render::SIMD_SIZE_SIMD32);
        cmd.set_execution_mask(0xffff_ffff);
        if walker.emit_local_id {
            cmd.set_emit_local(0x7);
            cmd.set_local_x_maximum(thread_width - 1);
            cmd.set_local_y_maximum(thread_height - 1);
            cmd.set_local_z_maximum(zero_means_one(walker.thread_depth) - 1);
        }
        cmd.set_generate_local_id(walker.generate_local_id as u32);

        cmd.set_thread_group_id_x_dimension(zero_means_one(walker.group_width));
        cmd.set_thread_group_id_y_dimension(zero_means_one(walker.group_height));
        cmd.set_thread_group_id_z_dimension(zero_means_one(walker.group_depth));
        cmd.set_thread_group_id_starting_x(walker.group_start_x);
        cmd.set_thread_group_id_starting_y(walker.group_start_y);
        cmd.set_thread_group_id_starting_z(walker.group_start_z);

        cmd.set_kernel_start_pointer(descriptor.kernel_offset >> 6);
        cmd.set_sampler_count(descriptor.sampler_count);
        cmd.set_sampler_state_pointer(descriptor.sampler_state_offset >> 5);
        cmd.set_binding_table_pointer((descriptor.binding_table_offset + 31) / 32);
        cmd.set_number_of_threads_in_gpgpu_thread_group(threads);
        cmd.set_shared_local_memory_size(slm);
        cmd.set_barrier_enable(descriptor.barrier_enable as u32);
        cmd.set_thread_preemption_disable(descriptor.preempt_disable as u32);

        if let Some(inline) = walker.inline_data {
            cmd.set_emit_inline_parameter(1);
            cmd.inline_data_mut().copy_from_slice(&inline);
        }

        let mut relocs = Vec::new();
        if let Some(post) = post_sync {
            match post.immediate {
                Some(value) => {
                    cmd.set_postsync_operation(POSTSYNC_OPERATION_WRITE_IMMEDIATE);
                    cmd.set_postsync_immediate_data(value as u32);
                    cmd.set_postsync_immediate_data_high((value >> 32) as u32);
                }
                None => cmd.set_postsync_operation(POSTSYNC_OPERATION_WRITE_TIMESTAMP),
            }
            // MOCS sits in the postsync control DWord ahead of the address.
            let params = ResourceParams::new(Some(post.resource), ComputeWalker::POSTSYNC_ADDRESS_DW)
                .with_offset(post.offset)
                .writable(true)
                .with_mocs(-1, 5, self.caps.mocs_index(MocsUsage::Uncached));
            add_resource_to_cmd(self.os.as_ref(), cmd.as_dwords_mut(), &mut relocs, &params)?;
        }

        trace!(threads, slm, "COMPUTE_WALKER");
        buffer.append_command_relocated(&cmd, relocs)
    }

    pub fn add_state_base_address(
        &self,
        buffer: &mut CommandBuffer,
        params: &StateBaseAddressParams,
    ) -> Result<(), MhwStatus> {
        emit_state_base_address(self.os.as_ref(), self.caps, buffer, params)
    }

    pub fn add_state_compute_mode(
        &self,
        buffer: &mut CommandBuffer,
        params: &StateComputeModeParams,
    ) -> Result<(), MhwStatus> {
        let mut cmd = StateComputeMode::default();
        cmd.set_large_grf_mode(params.large_grf_mode as u32);
        cmd.set_force_non_coherent(params.force_non_coherent);
        cmd.set_mask_bits(0xFFFF);
        buffer.append_command(&cmd)
    }

    pub fn add_binding_table_pool_alloc(
        &self,
        buffer: &mut CommandBuffer,
        params: &BindingTablePoolParams,
    ) -> Result<(), MhwStatus> {
        let mut cmd = BindingTablePoolAlloc::default();
        cmd.set_binding_table_pool_buffer_size(page_count(params.size));

        let mocs = match params.mocs {
            0 => self.caps.mocs_index(MocsUsage::StateHeap),
            index => index,
        };
        let mut relocs = Vec::new();
        let res = ResourceParams::new(params.resource, BindingTablePoolAlloc::BASE_ADDRESS_DW)
            .with_lsb(12)
            .with_mocs(0, 1, mocs);
        add_resource_to_cmd(self.os.as_ref(), cmd.as_dwords_mut(), &mut relocs, &res)?;
        buffer.append_command_relocated(&cmd, relocs)
    }

    pub fn add_pipeline_select(
        &self,
        buffer: Option<&mut CommandBuffer>,
        batch: Option<&mut BatchBuffer>,
        selection: PipelineSelection,
    ) -> Result<(), MhwStatus> {
        let mut cmd = PipelineSelect::default();
        cmd.set_mask_bits(0x13);
        cmd.set_pipeline_selection(selection.encode());
        add_command_cmd_or_bb(buffer, batch, &cmd)
    }

    /// Scratch memory for `per_thread` bytes on every hardware thread.
    pub fn scratch_space_size(&self, per_thread: u32) -> u32 {
        get_scratch_space_size(self.caps, per_thread)
    }
}
