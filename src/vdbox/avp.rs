use std::sync::Arc;

use intel_mhw_sys::{g12::avp::*, HwCommand};
use tracing::{debug, trace};

use super::{
    hcp::{encode_multi_engine_mode, encode_pipe_working_mode},
    BsdParams, CodecMode, CodecStandard, PipeModeSelectParams, SurfaceStateParams,
};
use crate::{
    caps::HwCaps,
    cmdbuffer::CommandBuffer,
    constants::{MocsUsage, SurfaceFormat},
    mi::mfx_wait,
    os::{GpuResource, OsInterface},
    resource::{add_resource_to_cmd, ResourceParams, MOCS_ATTRIBUTE_LSB},
    MhwStatus,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct AvpIndObjParams<'a> {
    pub mode: CodecMode,
    pub data_buffer: Option<&'a GpuResource>,
    pub data_offset: u32,
    /// Zero covers the whole resource.
    pub data_size: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileCodingParams {
    pub mode: CodecMode,
    pub tile_id: u32,
    pub tile_num_in_group: u32,
    pub tile_group_id: u32,
    pub tile_column_position_in_sb: u32,
    pub tile_row_position_in_sb: u32,
    pub tile_width_in_sb_minus1: u32,
    pub tile_height_in_sb_minus1: u32,
    pub is_last_tile_of_column: bool,
    pub is_last_tile_of_row: bool,
    pub is_start_tile_of_tile_group: bool,
    pub is_end_tile_of_tile_group: bool,
    pub is_last_tile_of_frame: bool,
    pub disable_cdf_update: bool,
    pub disable_frame_context_update: bool,
    pub number_of_active_be_pipes: u32,
    pub num_of_tile_columns_minus1: u32,
    pub num_of_tile_rows_minus1: u32,
}

fn surface_format(format: SurfaceFormat, bit_depth: u32) -> Result<u32, MhwStatus> {
    match (format, bit_depth) {
        (SurfaceFormat::Nv12, 8) => Ok(AVP_SURFACE_FORMAT_PLANAR_420_8),
        (SurfaceFormat::P010, 10) => Ok(AVP_SURFACE_FORMAT_P010),
        _ => Err(MhwStatus::InvalidParameter),
    }
}

/// Gen12 AV1 pipe.
pub struct AvpInterfaceG12 {
    os: Arc<dyn OsInterface>,
    caps: &'static HwCaps,
}

impl std::fmt::Debug for AvpInterfaceG12 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvpInterfaceG12")
            .field("family", &self.caps.family)
            .finish()
    }
}

impl AvpInterfaceG12 {
    #[tracing::instrument(skip(os, caps), fields(family = ?caps.family))]
    pub fn new(os: Arc<dyn OsInterface>, caps: &'static HwCaps) -> Self {
        debug!("AVP interface created");
        Self { os, caps }
    }

    /// AVP_PIPE_MODE_SELECT surrounded by MFX_WAIT with the VDBOX stall flag, appended as one
    /// unit.
    pub fn add_avp_pipe_mode_select(
        &self,
        buffer: &mut CommandBuffer,
        params: &PipeModeSelectParams,
    ) -> Result<(), MhwStatus> {
        let gen12 = params.gen12().ok_or(MhwStatus::InvalidParameter)?;
        if gen12.base.standard != CodecStandard::Av1 {
            return Err(MhwStatus::InvalidParameter);
        }

        let mut cmd = AvpPipeModeSelect::default();
        cmd.set_codec_select(match gen12.base.mode {
            CodecMode::Decode => CODEC_SELECT_DECODE,
            CodecMode::Encode => CODEC_SELECT_ENCODE,
        });
        cmd.set_codec_standard_select(CODEC_STANDARD_SELECT_AV1);
        cmd.set_pic_status_error_report_enable(gen12.base.status_report as u32);
        cmd.set_pic_status_error_report_id(gen12.base.status_report_id);
        cmd.set_multi_engine_mode(encode_multi_engine_mode(gen12.multi_engine_mode));
        cmd.set_pipe_working_mode(encode_pipe_working_mode(gen12.pipe_working_mode));
        cmd.set_tile_based_engine(gen12.tile_based_engine as u32);
        cmd.set_media_soft_reset_counter_per_1000_clocks(gen12.media_soft_reset_counter);
        cmd.set_phase_indicator(gen12.phase_indicator);

        let wait = mfx_wait(true);
        let mut dwords = Vec::with_capacity(AvpPipeModeSelect::DW_SIZE + 2);
        dwords.extend_from_slice(wait.as_dwords());
        dwords.extend_from_slice(cmd.as_dwords());
        dwords.extend_from_slice(wait.as_dwords());
        buffer.append_dwords(&dwords)
    }

    pub fn add_avp_surface_state(
        &self,
        buffer: &mut CommandBuffer,
        params: &SurfaceStateParams,
    ) -> Result<(), MhwStatus> {
        let surface = &params.surface;
        surface.validate()?;
        let format = surface_format(surface.format, params.bit_depth())?;

        let mut cmd = AvpSurfaceState::default();
        cmd.set_surface_pitch_minus1(surface.pitch - 1);
        cmd.set_surface_id(params.surface_id);
        cmd.set_surface_format(format);
        cmd.set_y_offset_for_u_cb(surface.u_offset_y);
        cmd.set_y_offset_for_v_cr(surface.v_offset_y);
        if surface.compressed {
            cmd.set_memory_compression_enable(0xFFFF);
        }
        buffer.append_command(&cmd)
    }

    pub fn add_avp_ind_obj_base_addr(
        &self,
        buffer: &mut CommandBuffer,
        params: &AvpIndObjParams,
    ) -> Result<(), MhwStatus> {
        let mut cmd = AvpIndObjBaseAddrState::default();
        let mut relocs = Vec::new();

        if params.mode == CodecMode::Decode || params.data_buffer.is_some() {
            let res = ResourceParams::new(params.data_buffer, AvpIndObjBaseAddrState::BASE_ADDRESS_DW)
                .with_offset(params.data_offset)
                .with_lsb(12)
                .writable(params.mode == CodecMode::Encode)
                .with_upper_bound(AvpIndObjBaseAddrState::UPPER_BOUND_OFFSET, params.data_size)
                .with_mocs(
                    (AvpIndObjBaseAddrState::ATTRIBUTES_DW - AvpIndObjBaseAddrState::BASE_ADDRESS_DW) as i32,
                    MOCS_ATTRIBUTE_LSB,
                    self.caps.mocs_index(MocsUsage::Bitstream),
                );
            add_resource_to_cmd(self.os.as_ref(), cmd.as_dwords_mut(), &mut relocs, &res)?;
        }
        buffer.append_command_relocated(&cmd, relocs)
    }

    pub fn add_avp_bsd_object(&self, buffer: &mut CommandBuffer, params: &BsdParams) -> Result<(), MhwStatus> {
        let mut cmd = AvpBsdObject::default();
        cmd.set_tile_indirect_bsd_data_length(params.data_length);
        cmd.set_tile_indirect_data_start_address(params.data_offset);
        buffer.append_command(&cmd)
    }

    pub fn add_avp_tile_coding(&self, buffer: &mut CommandBuffer, params: &TileCodingParams) -> Result<(), MhwStatus> {
        if params.mode == CodecMode::Encode {
            return Err(MhwStatus::Unimplemented);
        }

        let mut cmd = AvpTileCoding::default();
        cmd.set_frame_tile_id(params.tile_id);
        cmd.set_tg_tile_num(params.tile_num_in_group);
        cmd.set_tile_group_id(params.tile_group_id);
        cmd.set_tile_column_position_in_sb_unit(params.tile_column_position_in_sb);
        cmd.set_tile_row_position_in_sb_unit(params.tile_row_position_in_sb);
        cmd.set_tile_width_in_superblock_unit_minus1(params.tile_width_in_sb_minus1);
        cmd.set_tile_height_in_superblock_unit_minus1(params.tile_height_in_sb_minus1);
        cmd.set_is_last_tile_of_column(params.is_last_tile_of_column as u32);
        cmd.set_is_last_tile_of_row(params.is_last_tile_of_row as u32);
        cmd.set_is_start_tile_of_tile_group(params.is_start_tile_of_tile_group as u32);
        cmd.set_is_end_tile_of_tile_group(params.is_end_tile_of_tile_group as u32);
        cmd.set_is_last_tile_of_frame(params.is_last_tile_of_frame as u32);
        cmd.set_disable_cdf_update(params.disable_cdf_update as u32);
        cmd.set_disable_frame_context_update(params.disable_frame_context_update as u32);
        cmd.set_number_of_active_be_pipes(params.number_of_active_be_pipes.max(1));
        cmd.set_num_of_tile_columns_minus1_in_frame(params.num_of_tile_columns_minus1);
        cmd.set_num_of_tile_rows_minus1_in_frame(params.num_of_tile_rows_minus1);

        trace!(tile = params.tile_id, group = params.tile_group_id, "AVP_TILE_CODING");
        buffer.append_command(&cmd)
    }
}
