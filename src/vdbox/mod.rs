//! Video box (VDBOX) command interfaces: the MFX, HCP and AVP codec pipes, the HuC
//! microcontroller and the VDENC encoder front end.

use crate::{
    constants::{SurfaceFormat, TileType},
    utils::surface_format_to_plane_bits,
    MhwStatus,
};

pub mod avp;
pub mod hcp;
pub mod huc;
pub mod mfx;
pub mod vdenc;

pub use avp::AvpInterfaceG12;
pub use hcp::HcpInterfaceG12;
pub use huc::HucInterface;
pub use mfx::MfxInterfaceG12;
pub use vdenc::VdencInterfaceG12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodecMode {
    #[default]
    Decode,
    Encode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodecStandard {
    Mpeg2,
    Vc1,
    #[default]
    Avc,
    Jpeg,
    Vp8,
    Hevc,
    Vp9,
    Av1,
}

/// How a pipe participates in a multi-VDBOX (scalable) workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MultiEngineMode {
    #[default]
    Single,
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipeWorkingMode {
    #[default]
    Legacy,
    CabacFeOnly,
    DecoderBeOnly,
    RealTiles,
}

/// Surface geometry as the video engines see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceInfo {
    pub width: u32,
    pub height: u32,
    pub pitch: u32,
    pub format: SurfaceFormat,
    pub tile_type: TileType,
    /// Row of the U (or interleaved UV) plane, in luma rows.
    pub u_offset_y: u32,
    pub v_offset_y: u32,
    pub compressed: bool,
}

impl SurfaceInfo {
    /// A linear or tiled NV12/P010 style surface with the chroma plane directly below luma.
    pub fn planar(width: u32, height: u32, pitch: u32, format: SurfaceFormat, tile_type: TileType) -> Self {
        Self {
            width,
            height,
            pitch,
            format,
            tile_type,
            u_offset_y: height,
            v_offset_y: height,
            compressed: false,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), MhwStatus> {
        if self.width == 0 || self.height == 0 || self.pitch == 0 {
            return Err(MhwStatus::InvalidParameter);
        }
        Ok(())
    }

    pub(crate) fn is_tiled(&self) -> bool {
        self.tile_type != TileType::Linear
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceStateParams {
    pub surface: SurfaceInfo,
    /// Engine specific surface id (decoded picture, source, reference ...).
    pub surface_id: u32,
    /// Luma bit depth. Zero derives it from the surface format.
    pub bit_depth: u32,
}

impl SurfaceStateParams {
    pub fn new(surface: SurfaceInfo, surface_id: u32) -> Self {
        Self {
            surface,
            surface_id,
            bit_depth: 0,
        }
    }

    pub(crate) fn bit_depth(&self) -> u32 {
        match self.bit_depth {
            0 => surface_format_to_plane_bits(self.surface.format),
            depth => depth,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipeModeSelectBase {
    pub mode: CodecMode,
    pub standard: CodecStandard,
    pub stream_out: bool,
    pub pre_deblocking_output: bool,
    pub post_deblocking_output: bool,
    pub deblocker_stream_out: bool,
    pub vdenc: bool,
    pub short_format: bool,
    pub status_report: bool,
    pub status_report_id: u32,
    pub frame_statistics_stream_out: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipeModeSelectGen12 {
    pub base: PipeModeSelectBase,
    pub multi_engine_mode: MultiEngineMode,
    pub pipe_working_mode: PipeWorkingMode,
    pub tile_based_engine: bool,
    pub phase_indicator: u32,
    pub media_soft_reset_counter: u32,
    pub bit_depth: u32,
    pub chroma_444: bool,
}

/// Pipe mode parameters tagged with the generation that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipeModeSelectParams {
    Base(PipeModeSelectBase),
    Gen12(PipeModeSelectGen12),
}

impl PipeModeSelectParams {
    pub fn base(&self) -> &PipeModeSelectBase {
        match self {
            Self::Base(base) => base,
            Self::Gen12(p) => &p.base,
        }
    }

    pub fn gen12(&self) -> Option<&PipeModeSelectGen12> {
        match self {
            Self::Gen12(p) => Some(p),
            Self::Base(_) => None,
        }
    }
}

/// Indirect data handed to a BSD/stream object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BsdParams {
    pub data_length: u32,
    pub data_offset: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_depth_from_format() {
        let surface = SurfaceInfo::planar(64, 64, 128, SurfaceFormat::P010, TileType::TileY);
        let mut params = SurfaceStateParams::new(surface, 0);
        assert_eq!(params.bit_depth(), 10);
        params.bit_depth = 8;
        assert_eq!(params.bit_depth(), 8);
        assert!(surface.is_tiled());
    }

    #[test]
    fn empty_surfaces_are_rejected() {
        let surface = SurfaceInfo::planar(0, 64, 64, SurfaceFormat::Nv12, TileType::Linear);
        assert_eq!(surface.validate(), Err(MhwStatus::InvalidParameter));
    }
}
