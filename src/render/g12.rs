use std::sync::Arc;

use intel_mhw_sys::g12::render::*;
use tracing::{debug, trace};

use super::{
    emit_state_base_address, max_threads_field, zero_means_one, GpgpuWalkerParams, StateBaseAddressParams,
    VfeParams,
};
use crate::{
    caps::HwCaps,
    cmdbuffer::{add_command_cmd_or_bb, BatchBuffer, CommandBuffer},
    mi::MmioRegisters,
    os::OsInterface,
    utils::align_up,
    MhwStatus,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct CurbeLoadParams {
    pub length: u32,
    pub offset: u32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IdLoadParams {
    pub total_length: u32,
    pub offset: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineSelection {
    ThreeD,
    Media,
    Gpgpu,
}

impl PipelineSelection {
    pub(crate) fn encode(self) -> u32 {
        match self {
            Self::ThreeD => PIPELINE_SELECTION_3D,
            Self::Media => PIPELINE_SELECTION_MEDIA,
            Self::Gpgpu => PIPELINE_SELECTION_GPGPU,
        }
    }
}

/// Gen12 media pipeline: VFE state, GPGPU walker and the media state loads.
pub struct RenderInterfaceG12 {
    os: Arc<dyn OsInterface>,
    caps: &'static HwCaps,
    mmio: MmioRegisters,
}

impl std::fmt::Debug for RenderInterfaceG12 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderInterfaceG12")
            .field("family", &self.caps.family)
            .finish()
    }
}

impl RenderInterfaceG12 {
    #[tracing::instrument(skip(os, caps), fields(family = ?caps.family))]
    pub fn new(os: Arc<dyn OsInterface>, caps: &'static HwCaps) -> Self {
        debug!("render interface created");
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

    pub fn add_media_vfe_cmd(&self, buffer: &mut CommandBuffer, params: &VfeParams) -> Result<(), MhwStatus> {
        let VfeParams::Gen12(gen12) = params else {
            return Err(MhwStatus::InvalidParameter);
        };
        let base = &gen12.base;

        let mut cmd = MediaVfeState::default();
        if base.per_thread_scratch_space > 0 || base.scratch_space_base > 0 {
            cmd.set_per_thread_scratch_space(base.per_thread_scratch_space);
            cmd.set_scratch_space_base_pointer(base.scratch_space_base >> 10);
            cmd.set_scratch_space_base_pointer_high(0);
        }
        cmd.set_stack_size(base.stack_size);
        cmd.set_maximum_number_of_threads(max_threads_field(self.caps, base));
        cmd.set_number_of_urb_entries(base.number_of_urb_entries);
        cmd.set_curbe_allocation_size(base.curbe_allocation_size >> 5);
        cmd.set_urb_entry_allocation_size(base.urb_entry_allocation_size.max(1));

        // Field value 0 selects fused dispatch.
        cmd.set_fused_eu_dispatch(if gen12.fused_eu_dispatch {
            VFE_FUSED_EU_DISPATCH_FUSED
        } else {
            VFE_FUSED_EU_DISPATCH_LEGACY
        });
        cmd.set_maximum_number_of_dual_subslices(match gen12.max_dual_subslices {
            0 => self.caps.max_dual_subslices,
            n => n,
        });

        trace!(max_threads = cmd.maximum_number_of_threads(), "MEDIA_VFE_STATE");
        buffer.append_command(&cmd)
    }

    pub fn add_state_base_address(
        &self,
        buffer: &mut CommandBuffer,
        params: &StateBaseAddressParams,
    ) -> Result<(), MhwStatus> {
        emit_state_base_address(self.os.as_ref(), self.caps, buffer, params)
    }

    pub fn add_gpgpu_walker(&self, buffer: &mut CommandBuffer, params: &GpgpuWalkerParams) -> Result<(), MhwStatus> {
        let mut cmd = GpgpuWalker::default();
        cmd.set_interface_descriptor_offset(params.interface_descriptor_offset);
        cmd.set_indirect_data_length(params.indirect_data_length);
        cmd.set_indirect_data_start_address(params.indirect_data_start_address >> 6);

        cmd.set_thread_width_counter_maximum(zero_means_one(params.thread_width) - 1);
        cmd.set_thread_height_counter_maximum(zero_means_one(params.thread_height) - 1);
        cmd.set_thread_depth_counter_maximum(zero_means_one(params.thread_depth) - 1);
        cmd.set_simd_size(SIMD_SIZE_SIMD32);

        cmd.set_thread_group_id_starting_x(params.group_start_x);
        cmd.set_thread_group_id_x_dimension(zero_means_one(params.group_width));
        cmd.set_thread_group_id_starting_y(params.group_start_y);
        cmd.set_thread_group_id_y_dimension(zero_means_one(params.group_height));
        cmd.set_thread_group_id_starting_resume_z(params.group_start_z);
        cmd.set_thread_group_id_z_dimension(zero_means_one(params.group_depth));
        cmd.set_right_execution_mask(0xffff_ffff);
        cmd.set_bottom_execution_mask(0xffff_ffff);

        buffer.append_command(&cmd)
    }

    pub fn add_media_curbe_load(&self, buffer: &mut CommandBuffer, params: &CurbeLoadParams) -> Result<(), MhwStatus> {
        let mut cmd = MediaCurbeLoad::default();
        if params.length > 0 {
            cmd.set_curbe_total_data_length(align_up(params.length, 64));
            cmd.set_curbe_data_start_address(params.offset);
        }
        buffer.append_command(&cmd)
    }

    pub fn add_media_id_load(&self, buffer: &mut CommandBuffer, params: &IdLoadParams) -> Result<(), MhwStatus> {
        let mut cmd = MediaInterfaceDescriptorLoad::default();
        cmd.set_interface_descriptor_total_length(params.total_length);
        cmd.set_interface_descriptor_data_start_address(params.offset);
        buffer.append_command(&cmd)
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

    /// Points the system routine at `sip_offset` in the instruction heap.
    pub fn add_state_sip(&self, buffer: &mut CommandBuffer, sip_offset: u32) -> Result<(), MhwStatus> {
        let mut cmd = StateSip::default();
        cmd.set_system_instruction_pointer(sip_offset >> 4);
        buffer.append_command(&cmd)
    }
}
