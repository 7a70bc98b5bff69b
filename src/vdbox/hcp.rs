use std::sync::Arc;

use intel_mhw_sys::g12::hcp::*;
use tracing::{debug, trace};

use super::{
    BsdParams, CodecMode, CodecStandard, MultiEngineMode, PipeModeSelectParams, PipeWorkingMode, SurfaceStateParams,
};
use crate::{caps::HwCaps, cmdbuffer::CommandBuffer, constants::SurfaceFormat, os::OsInterface, MhwStatus};

pub(crate) fn encode_multi_engine_mode(mode: MultiEngineMode) -> u32 {
    match mode {
        MultiEngineMode::Single => MULTI_ENGINE_MODE_SINGLE,
        MultiEngineMode::Left => MULTI_ENGINE_MODE_LEFT,
        MultiEngineMode::Right => MULTI_ENGINE_MODE_RIGHT,
        MultiEngineMode::Middle => MULTI_ENGINE_MODE_MIDDLE,
    }
}

pub(crate) fn encode_pipe_working_mode(mode: PipeWorkingMode) -> u32 {
    match mode {
        PipeWorkingMode::Legacy => PIPE_WORKING_MODE_LEGACY,
        PipeWorkingMode::CabacFeOnly => PIPE_WORKING_MODE_CABAC_FE_ONLY,
        PipeWorkingMode::DecoderBeOnly => PIPE_WORKING_MODE_DECODER_BE_ONLY,
        PipeWorkingMode::RealTiles => PIPE_WORKING_MODE_REAL_TILES,
    }
}

/// HCP_SURFACE_STATE format for a surface format and luma bit depth.
fn surface_format(format: SurfaceFormat, bit_depth: u32) -> Result<u32, MhwStatus> {
    Ok(match (format, bit_depth) {
        (SurfaceFormat::Nv12, 8) => HCP_SURFACE_FORMAT_PLANAR_420_8,
        (SurfaceFormat::P010, 8 | 10) => HCP_SURFACE_FORMAT_P010,
        (SurfaceFormat::P016, 10 | 12 | 16) => HCP_SURFACE_FORMAT_P016,
        (SurfaceFormat::Yuy2, 8) => HCP_SURFACE_FORMAT_YUY2,
        (SurfaceFormat::Y210, 10) => HCP_SURFACE_FORMAT_Y210,
        (SurfaceFormat::Ayuv, 8) => HCP_SURFACE_FORMAT_AYUV,
        (SurfaceFormat::Y410, 10) => HCP_SURFACE_FORMAT_Y410,
        _ => return Err(MhwStatus::InvalidParameter),
    })
}

/// Gen12 HEVC/VP9 codec pipe.
pub struct HcpInterfaceG12 {
    os: Arc<dyn OsInterface>,
    caps: &'static HwCaps,
}

impl std::fmt::Debug for HcpInterfaceG12 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HcpInterfaceG12")
            .field("family", &self.caps.family)
            .field("scalability", &self.os.is_scalability_supported())
            .finish()
    }
}

impl HcpInterfaceG12 {
    #[tracing::instrument(skip(os, caps), fields(family = ?caps.family))]
    pub fn new(os: Arc<dyn OsInterface>, caps: &'static HwCaps) -> Self {
        debug!("HCP interface created");
        Self { os, caps }
    }

    pub fn add_hcp_pipe_mode_select(
        &self,
        buffer: &mut CommandBuffer,
        params: &PipeModeSelectParams,
    ) -> Result<(), MhwStatus> {
        let base = params.base();
        let standard = match base.standard {
            CodecStandard::Hevc => CODEC_STANDARD_SELECT_HEVC,
            CodecStandard::Vp9 => CODEC_STANDARD_SELECT_VP9,
            _ => return Err(MhwStatus::InvalidParameter),
        };

        let mut cmd = HcpPipeModeSelect::default();
        cmd.set_codec_select((base.mode == CodecMode::Encode) as u32);
        cmd.set_codec_standard_select(standard);
        cmd.set_deblocker_streamout_enable(base.deblocker_stream_out as u32);
        cmd.set_pak_pipeline_streamout_enable(base.stream_out as u32);
        cmd.set_pic_status_error_report_enable(base.status_report as u32);
        cmd.set_pic_status_error_report_id(base.status_report_id);
        cmd.set_vdenc_mode(base.vdenc as u32);
        cmd.set_pak_frame_level_streamout_enable(base.frame_statistics_stream_out as u32);

        if let Some(gen12) = params.gen12() {
            cmd.set_multi_engine_mode(encode_multi_engine_mode(gen12.multi_engine_mode));
            cmd.set_pipe_working_mode(encode_pipe_working_mode(gen12.pipe_working_mode));
            cmd.set_tile_based_engine(gen12.tile_based_engine as u32);
            cmd.set_media_soft_reset_counter_per_1000_clocks(gen12.media_soft_reset_counter);
            cmd.set_phase_indicator(gen12.phase_indicator);
        }

        trace!(
            standard,
            multi_engine = cmd.multi_engine_mode(),
            working_mode = cmd.pipe_working_mode(),
            "HCP_PIPE_MODE_SELECT"
        );
        buffer.append_command(&cmd)
    }

    pub fn add_hcp_surface_state(
        &self,
        buffer: &mut CommandBuffer,
        params: &SurfaceStateParams,
    ) -> Result<(), MhwStatus> {
        let surface = &params.surface;
        surface.validate()?;
        let format = surface_format(surface.format, params.bit_depth())?;

        let mut cmd = HcpSurfaceState::default();
        cmd.set_surface_pitch_minus1(surface.pitch - 1);
        cmd.set_surface_id(params.surface_id);
        cmd.set_surface_format(format);
        cmd.set_y_offset_for_u_cb(surface.u_offset_y);
        cmd.set_y_offset_for_v_cr(surface.v_offset_y);
        if surface.compressed {
            cmd.set_memory_compression_enable(0xFF);
        }
        buffer.append_command(&cmd)
    }

    pub fn add_hcp_bsd_object(&self, buffer: &mut CommandBuffer, params: &BsdParams) -> Result<(), MhwStatus> {
        let mut cmd = HcpBsdObject::default();
        cmd.set_indirect_bsd_data_length(params.data_length);
        cmd.set_indirect_data_start_address(params.data_offset);
        buffer.append_command(&cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        caps::caps_for,
        constants::{ProductFamily, TileType},
        os::MockOs,
        vdbox::{PipeModeSelectBase, PipeModeSelectGen12, SurfaceInfo},
    };

    fn hcp() -> HcpInterfaceG12 {
        HcpInterfaceG12::new(Arc::new(MockOs::new()), caps_for(ProductFamily::TigerlakeLp).unwrap())
    }

    #[test]
    fn scalable_pipe_mode() {
        let hcp = hcp();
        let mut buffer = CommandBuffer::new(64);
        let params = PipeModeSelectParams::Gen12(PipeModeSelectGen12 {
            base: PipeModeSelectBase {
                standard: CodecStandard::Vp9,
                ..Default::default()
            },
            multi_engine_mode: MultiEngineMode::Right,
            pipe_working_mode: PipeWorkingMode::RealTiles,
            ..Default::default()
        });
        hcp.add_hcp_pipe_mode_select(&mut buffer, &params).unwrap();
        let cmd = HcpPipeModeSelect {
            dw: buffer.dwords().try_into().unwrap(),
        };
        assert_eq!(cmd.codec_standard_select(), CODEC_STANDARD_SELECT_VP9);
        assert_eq!(cmd.multi_engine_mode(), MULTI_ENGINE_MODE_RIGHT);
        assert_eq!(cmd.pipe_working_mode(), PIPE_WORKING_MODE_REAL_TILES);
        assert_eq!(cmd.codec_select(), 0);
    }

    #[test]
    fn avc_is_not_an_hcp_standard() {
        let hcp = hcp();
        let mut buffer = CommandBuffer::new(64);
        let params = PipeModeSelectParams::Base(PipeModeSelectBase::default());
        assert_eq!(
            hcp.add_hcp_pipe_mode_select(&mut buffer, &params),
            Err(MhwStatus::InvalidParameter)
        );
        assert_eq!(buffer.offset(), 0);
    }

    #[test]
    fn surface_formats_follow_bit_depth() {
        let hcp = hcp();
        let mut buffer = CommandBuffer::new(128);
        let surface = SurfaceInfo::planar(64, 64, 256, SurfaceFormat::P010, TileType::TileY);
        hcp.add_hcp_surface_state(&mut buffer, &SurfaceStateParams::new(surface, HCP_SURFACE_ID_DECODED_PICTURE))
            .unwrap();
        let cmd = HcpSurfaceState {
            dw: buffer.dwords().try_into().unwrap(),
        };
        assert_eq!(cmd.surface_format(), HCP_SURFACE_FORMAT_P010);
        assert_eq!(cmd.surface_pitch_minus1(), 255);
        assert_eq!(cmd.y_offset_for_u_cb(), 64);

        let nv12 = SurfaceInfo::planar(64, 64, 64, SurfaceFormat::Nv12, TileType::TileY);
        let mut params = SurfaceStateParams::new(nv12, 0);
        params.bit_depth = 10;
        assert_eq!(
            hcp.add_hcp_surface_state(&mut buffer, &params),
            Err(MhwStatus::InvalidParameter)
        );
        assert_eq!(buffer.offset(), HcpSurfaceState::BYTE_SIZE);
    }
}
