use std::sync::Arc;

use intel_mhw_sys::g12::vdenc::*;
use tracing::{debug, trace};

use super::{CodecStandard, PipeModeSelectParams, SurfaceInfo};
use crate::{
    caps::HwCaps,
    cmdbuffer::CommandBuffer,
    constants::{SurfaceFormat, TileType},
    os::OsInterface,
    MhwStatus,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VdencWalkerParams {
    pub mb_lcu_start_x: u32,
    pub mb_lcu_start_y: u32,
    pub next_slice_start_x: u32,
    pub next_slice_start_y: u32,
    pub first_super_slice: bool,
    pub log2_weight_denom_luma: u32,
    /// Set when the frame is split into tiles.
    pub tile: Option<VdencTileParams>,
    /// Pipes working on the frame. Zero and one both mean a single pipe.
    pub num_pipes: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VdencTileParams {
    pub tile_number: u32,
    pub start_ctb_x: u32,
    pub start_ctb_y: u32,
    pub width: u32,
    pub height: u32,
    pub stream_in_offset: Option<u32>,
    pub row_store_offset: Option<u32>,
    pub stream_out_offset: Option<u32>,
    pub lcu_stream_out_offset: Option<u32>,
}

/// Which VDBOX pipes a VD_PIPELINE_FLUSH waits for and flushes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VdPipelineFlushParams {
    pub wait_done_hevc: bool,
    pub wait_done_vdenc: bool,
    pub wait_done_mfl: bool,
    pub wait_done_mfx: bool,
    pub wait_done_vd_command_message_parser: bool,
    pub flush_hevc: bool,
    pub flush_vdenc: bool,
    pub flush_mfl: bool,
    pub flush_mfx: bool,
}

fn src_surface_format(format: SurfaceFormat) -> Result<u32, MhwStatus> {
    Ok(match format {
        SurfaceFormat::Nv12 => VDENC_SURFACE_FORMAT_PLANAR_420_8,
        SurfaceFormat::P010 => VDENC_SURFACE_FORMAT_P010,
        SurfaceFormat::Yuy2 => VDENC_SURFACE_FORMAT_YUV422,
        SurfaceFormat::Y210 => VDENC_SURFACE_FORMAT_Y216,
        SurfaceFormat::Ayuv => VDENC_SURFACE_FORMAT_YUV444,
        SurfaceFormat::Y410 => VDENC_SURFACE_FORMAT_Y410,
        SurfaceFormat::Y8 => VDENC_SURFACE_FORMAT_Y8_UNORM,
        SurfaceFormat::Argb | SurfaceFormat::Abgr => VDENC_SURFACE_FORMAT_R10G10B10A2_UNORM,
        SurfaceFormat::P016 => return Err(MhwStatus::InvalidParameter),
    })
}

/// Gen12 VDENC encoder front end.
pub struct VdencInterfaceG12 {
    os: Arc<dyn OsInterface>,
    caps: &'static HwCaps,
}

impl std::fmt::Debug for VdencInterfaceG12 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VdencInterfaceG12")
            .field("family", &self.caps.family)
            .field("scalability", &self.os.is_scalability_supported())
            .finish()
    }
}

impl VdencInterfaceG12 {
    #[tracing::instrument(skip(os, caps), fields(family = ?caps.family))]
    pub fn new(os: Arc<dyn OsInterface>, caps: &'static HwCaps) -> Self {
        debug!("VDENC interface created");
        Self { os, caps }
    }

    pub fn add_vdenc_pipe_mode_select(
        &self,
        buffer: &mut CommandBuffer,
        params: &PipeModeSelectParams,
    ) -> Result<(), MhwStatus> {
        let base = params.base();
        let standard = match base.standard {
            CodecStandard::Hevc => STANDARD_SELECT_HEVC,
            CodecStandard::Vp9 => STANDARD_SELECT_VP9,
            CodecStandard::Avc => STANDARD_SELECT_AVC,
            _ => return Err(MhwStatus::InvalidParameter),
        };

        let mut cmd = VdencPipeModeSelect::default();
        cmd.set_standard_select(standard);
        cmd.set_frame_statistics_stream_out_enable(base.frame_statistics_stream_out as u32);
        cmd.set_vdenc_pak_obj_cmd_stream_out_enable(base.stream_out as u32);
        cmd.set_tlb_prefetch_enable(1);
        cmd.set_pak_chroma_sub_sampling_type(CHROMA_SUBSAMPLING_420);

        if let Some(gen12) = params.gen12() {
            let bit_depth = match gen12.bit_depth {
                0 | 8 => BIT_DEPTH_8BPP,
                10 if standard != STANDARD_SELECT_AVC => BIT_DEPTH_10BPP,
                _ => return Err(MhwStatus::InvalidParameter),
            };
            cmd.set_bit_depth(bit_depth);
            if gen12.chroma_444 {
                cmd.set_pak_chroma_sub_sampling_type(CHROMA_SUBSAMPLING_444);
            }
            cmd.set_scalability_mode(gen12.tile_based_engine as u32);
        }

        trace!(standard, bit_depth = cmd.bit_depth(), "VDENC_PIPE_MODE_SELECT");
        buffer.append_command(&cmd)
    }

    pub fn add_vdenc_src_surface_state(&self, buffer: &mut CommandBuffer, surface: &SurfaceInfo) -> Result<(), MhwStatus> {
        surface.validate()?;
        let format = src_surface_format(surface.format)?;

        let mut cmd = VdencSrcSurfaceState::default();
        cmd.set_width(surface.width - 1);
        cmd.set_height(surface.height - 1);
        cmd.set_tiled_surface(surface.is_tiled() as u32);
        cmd.set_tile_walk((surface.tile_type != TileType::TileX) as u32);
        cmd.set_surface_pitch(surface.pitch - 1);
        cmd.set_surface_format(format);
        cmd.set_y_offset_for_u_cb(surface.u_offset_y);
        cmd.set_y_offset_for_v_cr(surface.v_offset_y);
        buffer.append_command(&cmd)
    }

    pub fn add_vdenc_walker_state(
        &self,
        buffer: &mut CommandBuffer,
        params: &VdencWalkerParams,
    ) -> Result<(), MhwStatus> {
        let mut cmd = VdencWalkerState::default();
        cmd.set_mb_lcu_start_x_position(params.mb_lcu_start_x);
        cmd.set_mb_lcu_start_y_position(params.mb_lcu_start_y);
        cmd.set_next_slice_mb_lcu_start_x_position(params.next_slice_start_x);
        cmd.set_next_slice_mb_start_y_position(params.next_slice_start_y);
        cmd.set_first_super_slice(params.first_super_slice as u32);
        cmd.set_log2_weight_denom_luma(params.log2_weight_denom_luma);
        cmd.set_num_par_engine(params.num_pipes.max(1) - 1);

        if let Some(tile) = &params.tile {
            if tile.width == 0 || tile.height == 0 {
                return Err(MhwStatus::InvalidParameter);
            }
            cmd.set_tile_number(tile.tile_number);
            cmd.set_tile_start_ctb_x(tile.start_ctb_x);
            cmd.set_tile_start_ctb_y(tile.start_ctb_y);
            cmd.set_tile_width(tile.width - 1);
            cmd.set_tile_height(tile.height - 1);
            // Offsets are in cache lines.
            if let Some(offset) = tile.stream_in_offset {
                cmd.set_streamin_offset_enable(1);
                cmd.set_tile_streamin_offset(offset);
            }
            if let Some(offset) = tile.row_store_offset {
                cmd.set_row_store_offset_enable(1);
                cmd.set_tile_rowstore_offset(offset);
            }
            if let Some(offset) = tile.stream_out_offset {
                cmd.set_tile_streamout_offset_enable(1);
                cmd.set_tile_streamout_offset(offset);
            }
            if let Some(offset) = tile.lcu_stream_out_offset {
                cmd.set_lcu_stream_out_offset_enable(1);
                cmd.set_tile_lcu_stream_out_offset(offset);
            }
        }
        buffer.append_command(&cmd)
    }

    pub fn add_vdenc_control_state(&self, buffer: &mut CommandBuffer, initialization: bool) -> Result<(), MhwStatus> {
        let mut cmd = VdencControlState::default();
        cmd.set_vdenc_initialization(initialization as u32);
        buffer.append_command(&cmd)
    }

    pub fn add_vd_pipeline_flush(
        &self,
        buffer: &mut CommandBuffer,
        params: &VdPipelineFlushParams,
    ) -> Result<(), MhwStatus> {
        let mut cmd = VdPipelineFlush::default();
        cmd.set_hevc_pipeline_done(params.wait_done_hevc as u32);
        cmd.set_vdenc_pipeline_done(params.wait_done_vdenc as u32);
        cmd.set_mfl_pipeline_done(params.wait_done_mfl as u32);
        cmd.set_mfx_pipeline_done(params.wait_done_mfx as u32);
        cmd.set_vd_command_message_parser_done(params.wait_done_vd_command_message_parser as u32);
        cmd.set_hevc_pipeline_command_flush(params.flush_hevc as u32);
        cmd.set_vdenc_pipeline_command_flush(params.flush_vdenc as u32);
        cmd.set_mfl_pipeline_command_flush(params.flush_mfl as u32);
        cmd.set_mfx_pipeline_command_flush(params.flush_mfx as u32);
        buffer.append_command(&cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        caps::caps_for,
        constants::ProductFamily,
        os::MockOs,
        vdbox::{PipeModeSelectBase, PipeModeSelectGen12},
    };
    use intel_mhw_sys::HwCommand;

    fn vdenc() -> VdencInterfaceG12 {
        VdencInterfaceG12::new(Arc::new(MockOs::new()), caps_for(ProductFamily::TigerlakeLp).unwrap())
    }

    fn gen12(standard: CodecStandard, bit_depth: u32) -> PipeModeSelectParams {
        PipeModeSelectParams::Gen12(PipeModeSelectGen12 {
            base: PipeModeSelectBase {
                standard,
                ..Default::default()
            },
            bit_depth,
            ..Default::default()
        })
    }

    #[test]
    fn ten_bit_avc_is_rejected() {
        let vdenc = vdenc();
        let mut buffer = CommandBuffer::new(128);
        vdenc
            .add_vdenc_pipe_mode_select(&mut buffer, &gen12(CodecStandard::Hevc, 10))
            .unwrap();
        let cmd = VdencPipeModeSelect {
            dw: buffer.dwords().try_into().unwrap(),
        };
        assert_eq!(cmd.standard_select(), STANDARD_SELECT_HEVC);
        assert_eq!(cmd.bit_depth(), BIT_DEPTH_10BPP);
        // Prefetch defaults survive.
        assert_eq!(cmd.dw[2], VdencPipeModeSelect::default().dw[2]);

        assert_eq!(
            vdenc.add_vdenc_pipe_mode_select(&mut buffer, &gen12(CodecStandard::Avc, 10)),
            Err(MhwStatus::InvalidParameter)
        );
        assert_eq!(buffer.offset(), VdencPipeModeSelect::BYTE_SIZE);
    }

    #[test]
    fn src_surface_minus_one_fields() {
        let vdenc = vdenc();
        let mut buffer = CommandBuffer::new(64);
        let surface = SurfaceInfo::planar(1280, 720, 1536, SurfaceFormat::Nv12, TileType::TileY);
        vdenc.add_vdenc_src_surface_state(&mut buffer, &surface).unwrap();
        let cmd = VdencSrcSurfaceState {
            dw: buffer.dwords().try_into().unwrap(),
        };
        assert_eq!(cmd.width(), 1279);
        assert_eq!(cmd.height(), 719);
        assert_eq!(cmd.surface_pitch(), 1535);
        assert_eq!(cmd.surface_format(), VDENC_SURFACE_FORMAT_PLANAR_420_8);
        assert_eq!(cmd.y_offset_for_u_cb(), 720);
    }

    #[test]
    fn walker_tile_fields() {
        let vdenc = vdenc();
        let mut buffer = CommandBuffer::new(128);
        let params = VdencWalkerParams {
            tile: Some(VdencTileParams {
                tile_number: 2,
                start_ctb_x: 10,
                width: 320,
                height: 256,
                row_store_offset: Some(8),
                ..Default::default()
            }),
            num_pipes: 2,
            ..Default::default()
        };
        vdenc.add_vdenc_walker_state(&mut buffer, &params).unwrap();
        let cmd = VdencWalkerState {
            dw: buffer.dwords().try_into().unwrap(),
        };
        assert_eq!(cmd.tile_number(), 2);
        assert_eq!(cmd.tile_width(), 319);
        assert_eq!(cmd.tile_height(), 255);
        assert_eq!(cmd.row_store_offset_enable(), 1);
        assert_eq!(cmd.tile_rowstore_offset(), 8);
        assert_eq!(cmd.streamin_offset_enable(), 0);
        assert_eq!(cmd.num_par_engine(), 1);
    }

    #[test]
    fn pipeline_flush_bits() {
        let vdenc = vdenc();
        let mut buffer = CommandBuffer::new(64);
        vdenc.add_vdenc_control_state(&mut buffer, true).unwrap();
        vdenc
            .add_vd_pipeline_flush(
                &mut buffer,
                &VdPipelineFlushParams {
                    wait_done_hevc: true,
                    wait_done_vdenc: true,
                    flush_hevc: true,
                    flush_vdenc: true,
                    ..Default::default()
                },
            )
            .unwrap();
        let dw = buffer.dwords();
        assert_eq!(dw[1], 1 << 1);
        assert_eq!(dw[3], 0b11 | (0b11 << 16));
    }
}
