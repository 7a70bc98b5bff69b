use std::sync::Arc;

use intel_mhw_sys::{g12::mfx::*, HwCommand};
use tracing::{debug, trace};

use super::{CodecMode, CodecStandard, PipeModeSelectParams, SurfaceStateParams};
use crate::{
    caps::HwCaps,
    cmdbuffer::CommandBuffer,
    constants::{MocsUsage, SurfaceFormat, TileType},
    os::{GpuResource, OsInterface},
    resource::{add_resource_to_cmd, ResourceParams, MOCS_ATTRIBUTE_LSB},
    MhwStatus,
};

/// Indirect objects read or written by the MFX pipe.
#[derive(Debug, Clone, Copy, Default)]
pub struct MfxIndObjParams<'a> {
    pub mode: CodecMode,
    /// Compressed input when decoding.
    pub data_buffer: Option<&'a GpuResource>,
    pub data_offset: u32,
    /// Zero covers the whole resource.
    pub data_size: u32,
    pub mv_object: Option<&'a GpuResource>,
    pub mv_object_offset: u32,
    /// Bitstream output when encoding.
    pub pak_base_object: Option<&'a GpuResource>,
    pub pak_base_object_offset: u32,
    pub pak_base_object_size: u32,
}

fn standard_select(standard: CodecStandard) -> Result<u32, MhwStatus> {
    Ok(match standard {
        CodecStandard::Mpeg2 => STANDARD_SELECT_MPEG2,
        CodecStandard::Vc1 => STANDARD_SELECT_VC1,
        CodecStandard::Avc => STANDARD_SELECT_AVC,
        CodecStandard::Jpeg => STANDARD_SELECT_JPEG,
        CodecStandard::Vp8 => STANDARD_SELECT_VP8,
        _ => return Err(MhwStatus::InvalidParameter),
    })
}

fn surface_format(format: SurfaceFormat) -> Result<u32, MhwStatus> {
    Ok(match format {
        SurfaceFormat::Nv12 => MFX_SURFACE_FORMAT_PLANAR_420_8,
        SurfaceFormat::Y8 => MFX_SURFACE_FORMAT_Y8_UNORM,
        SurfaceFormat::Yuy2 => MFX_SURFACE_FORMAT_YCRCB_NORMAL,
        _ => return Err(MhwStatus::InvalidParameter),
    })
}

/// Gen12 MFX pipe (AVC, MPEG2, VC1, JPEG, VP8).
pub struct MfxInterfaceG12 {
    os: Arc<dyn OsInterface>,
    caps: &'static HwCaps,
}

impl std::fmt::Debug for MfxInterfaceG12 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MfxInterfaceG12")
            .field("family", &self.caps.family)
            .finish()
    }
}

impl MfxInterfaceG12 {
    #[tracing::instrument(skip(os, caps), fields(family = ?caps.family))]
    pub fn new(os: Arc<dyn OsInterface>, caps: &'static HwCaps) -> Self {
        debug!("MFX interface created");
        Self { os, caps }
    }

    pub fn add_mfx_pipe_mode_select(
        &self,
        buffer: &mut CommandBuffer,
        params: &PipeModeSelectParams,
    ) -> Result<(), MhwStatus> {
        let base = params.base();
        let mut cmd = MfxPipeModeSelect::default();
        cmd.set_standard_select(standard_select(base.standard)?);
        cmd.set_codec_select(match base.mode {
            CodecMode::Decode => CODEC_SELECT_DECODE,
            CodecMode::Encode => CODEC_SELECT_ENCODE,
        });
        cmd.set_stream_out_enable(base.stream_out as u32);
        cmd.set_pre_deblocking_output_enable(base.pre_deblocking_output as u32);
        cmd.set_post_deblocking_output_enable(base.post_deblocking_output as u32);
        cmd.set_deblocker_stream_out_enable(base.deblocker_stream_out as u32);
        cmd.set_frame_statistics_streamout_enable(base.frame_statistics_stream_out as u32);
        cmd.set_vdenc_mode(base.vdenc as u32);
        cmd.set_decoder_short_format_mode(base.short_format as u32);
        cmd.set_decoder_mode_select(DECODER_MODE_SELECT_VLD);
        cmd.set_pic_error_status_report_enable(base.status_report as u32);
        cmd.set_pic_status_error_report_id(base.status_report_id);
        buffer.append_command(&cmd)
    }

    pub fn add_mfx_surface_state(
        &self,
        buffer: &mut CommandBuffer,
        params: &SurfaceStateParams,
    ) -> Result<(), MhwStatus> {
        let surface = &params.surface;
        surface.validate()?;
        let format = surface_format(surface.format)?;

        let mut cmd = MfxSurfaceState::default();
        cmd.set_surface_id(params.surface_id);
        cmd.set_width(surface.width - 1);
        cmd.set_height(surface.height - 1);
        cmd.set_tiled_surface(surface.is_tiled() as u32);
        cmd.set_tile_walk((surface.tile_type == TileType::TileY) as u32);
        cmd.set_surface_pitch(surface.pitch - 1);
        cmd.set_surface_format(format);
        cmd.set_interleave_chroma((surface.format == SurfaceFormat::Nv12) as u32);
        cmd.set_y_offset_for_u_cb(surface.u_offset_y);
        cmd.set_y_offset_for_v_cr(surface.v_offset_y);

        trace!(id = params.surface_id, format, "MFX_SURFACE_STATE");
        buffer.append_command(&cmd)
    }

    pub fn add_mfx_ind_obj_base_addr(
        &self,
        buffer: &mut CommandBuffer,
        params: &MfxIndObjParams,
    ) -> Result<(), MhwStatus> {
        let mocs = self.caps.mocs_index(MocsUsage::Bitstream);
        let os = self.os.as_ref();
        let mut cmd = MfxIndObjBaseAddrState::default();
        let mut relocs = Vec::new();

        match params.mode {
            CodecMode::Decode => {
                let res = ResourceParams::new(params.data_buffer, MfxIndObjBaseAddrState::BITSTREAM_DW)
                    .with_offset(params.data_offset)
                    .with_lsb(12)
                    .with_upper_bound(MfxIndObjBaseAddrState::UPPER_BOUND_OFFSET, params.data_size)
                    .with_mocs(2, MOCS_ATTRIBUTE_LSB, mocs);
                add_resource_to_cmd(os, cmd.as_dwords_mut(), &mut relocs, &res)?;
            }
            CodecMode::Encode => {
                if params.mv_object.is_some() {
                    let res = ResourceParams::new(params.mv_object, MfxIndObjBaseAddrState::MV_OBJECT_DW)
                        .with_offset(params.mv_object_offset)
                        .with_lsb(12)
                        .with_mocs(2, MOCS_ATTRIBUTE_LSB, self.caps.mocs_index(MocsUsage::StreamOut));
                    add_resource_to_cmd(os, cmd.as_dwords_mut(), &mut relocs, &res)?;
                }
                let res = ResourceParams::new(params.pak_base_object, MfxIndObjBaseAddrState::PAK_BSE_DW)
                    .with_offset(params.pak_base_object_offset)
                    .with_lsb(12)
                    .writable(true)
                    .with_upper_bound(MfxIndObjBaseAddrState::UPPER_BOUND_OFFSET, params.pak_base_object_size)
                    .with_mocs(2, MOCS_ATTRIBUTE_LSB, mocs);
                add_resource_to_cmd(os, cmd.as_dwords_mut(), &mut relocs, &res)?;
            }
        }

        buffer.append_command_relocated(&cmd, relocs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        caps::caps_for,
        constants::ProductFamily,
        os::MockOs,
        vdbox::{PipeModeSelectBase, SurfaceInfo},
    };

    fn setup() -> (Arc<MockOs>, MfxInterfaceG12) {
        let os = Arc::new(MockOs::new());
        let mfx = MfxInterfaceG12::new(os.clone(), caps_for(ProductFamily::TigerlakeLp).unwrap());
        (os, mfx)
    }

    #[test]
    fn pipe_mode_select() {
        let (_, mfx) = setup();
        let mut buffer = CommandBuffer::new(64);
        let params = PipeModeSelectParams::Base(PipeModeSelectBase {
            mode: CodecMode::Encode,
            standard: CodecStandard::Avc,
            vdenc: true,
            ..Default::default()
        });
        mfx.add_mfx_pipe_mode_select(&mut buffer, &params).unwrap();
        let cmd = MfxPipeModeSelect {
            dw: buffer.dwords().try_into().unwrap(),
        };
        assert_eq!(cmd.standard_select(), STANDARD_SELECT_AVC);
        assert_eq!(cmd.codec_select(), CODEC_SELECT_ENCODE);
        assert_eq!(cmd.vdenc_mode(), 1);

        let hevc = PipeModeSelectParams::Base(PipeModeSelectBase {
            standard: CodecStandard::Hevc,
            ..Default::default()
        });
        assert_eq!(
            mfx.add_mfx_pipe_mode_select(&mut buffer, &hevc),
            Err(MhwStatus::InvalidParameter)
        );
    }

    #[test]
    fn surface_state_minus_one_fields() {
        let (_, mfx) = setup();
        let mut buffer = CommandBuffer::new(64);
        let surface = SurfaceInfo::planar(1920, 1080, 2048, SurfaceFormat::Nv12, TileType::TileY);
        mfx.add_mfx_surface_state(&mut buffer, &SurfaceStateParams::new(surface, MFX_SURFACE_ID_SOURCE_INPUT))
            .unwrap();
        let cmd = MfxSurfaceState {
            dw: buffer.dwords().try_into().unwrap(),
        };
        assert_eq!(cmd.width(), 1919);
        assert_eq!(cmd.height(), 1079);
        assert_eq!(cmd.surface_pitch(), 2047);
        assert_eq!(cmd.surface_format(), MFX_SURFACE_FORMAT_PLANAR_420_8);
        assert_eq!(cmd.interleave_chroma(), 1);
        assert_eq!(cmd.tile_walk(), 1);
        assert_eq!(cmd.y_offset_for_u_cb(), 1080);

        let p010 = SurfaceInfo::planar(64, 64, 128, SurfaceFormat::P010, TileType::TileY);
        assert_eq!(
            mfx.add_mfx_surface_state(&mut buffer, &SurfaceStateParams::new(p010, 0)),
            Err(MhwStatus::InvalidParameter)
        );
    }

    #[test]
    fn decode_bitstream_with_upper_bound() {
        let (os, mfx) = setup();
        let bitstream = os.allocate_resource(0x5000, "bitstream").unwrap();
        let mut buffer = CommandBuffer::new(256);
        mfx.add_mfx_ind_obj_base_addr(
            &mut buffer,
            &MfxIndObjParams {
                data_buffer: Some(&bitstream),
                data_size: 0x1800,
                ..Default::default()
            },
        )
        .unwrap();

        let cmd = MfxIndObjBaseAddrState {
            dw: buffer.dwords().try_into().unwrap(),
        };
        let address = os.gpu_address(bitstream.id()).unwrap();
        assert_eq!(cmd.dw[1], address as u32);
        assert_eq!(cmd.dw[4], (address + 0x2000) as u32);
        assert_eq!(cmd.bitstream_mocs(), mfx.caps.mocs_index(MocsUsage::Bitstream));
        assert_eq!(buffer.relocations().len(), 2);

        assert_eq!(
            mfx.add_mfx_ind_obj_base_addr(&mut buffer, &MfxIndObjParams::default()),
            Err(MhwStatus::NullPointer)
        );
    }
}
