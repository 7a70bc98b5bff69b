//! VEBOX (video enhancement box) commands for Gen12.

use std::sync::Arc;

use intel_mhw_sys::{g9::vebox::*, HwCommand};
use tracing::{debug, trace};

use crate::{
    caps::HwCaps,
    cmdbuffer::{CommandBuffer, Relocation},
    constants::{EngineClass, MocsUsage, SurfaceFormat, TileType, VeboxFeatures},
    os::{EnhancedContextOptions, GpuContextCreateOptions, GpuContextHandle, GpuResource, OsInterface},
    resource::{add_resource_to_cmd, ResourceParams, MOCS_ATTRIBUTE_LSB},
    vdbox::SurfaceInfo,
    MhwStatus,
};

/// MOCS position in the VEBOX_STATE surface control bits.
const STATE_SURFACE_MOCS_LSB: u32 = 26;

/// The driver side VEBOX state heap. Each instance holds one copy of every sub state.
#[derive(Debug, Clone, Copy)]
pub struct VeboxHeap<'a> {
    pub resource: &'a GpuResource,
    pub instance_size: u32,
    pub current_instance: u32,
    pub dndi_state_offset: u32,
    pub iecp_state_offset: u32,
    pub gamut_state_offset: u32,
    pub vertex_table_offset: u32,
    pub capture_pipe_state_offset: u32,
    pub gamma_correction_state_offset: u32,
}

impl VeboxHeap<'_> {
    fn instance_base(&self) -> u32 {
        self.instance_size * self.current_instance
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VeboxStateParams<'a> {
    pub heap: Option<VeboxHeap<'a>>,
    pub features: VeboxFeatures,
    /// Replaces the gamut state when present.
    pub lut_1d: Option<&'a GpuResource>,
    /// Required when `features` has LACE.
    pub lace_lut: Option<&'a GpuResource>,
    pub dn_di_first_frame: bool,
    pub di_output_frames: u32,
    pub single_slice: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VeboxSurfaceStateParams {
    pub input: Option<SurfaceInfo>,
    pub output: Option<SurfaceInfo>,
    pub derived_surface_pitch: u32,
    pub skin_score_surface_pitch: u32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DiIecpParams<'a> {
    pub starting_x: u32,
    pub ending_x: u32,
    pub current_frame_input: Option<&'a GpuResource>,
    pub previous_frame_input: Option<&'a GpuResource>,
    pub stmm_input: Option<&'a GpuResource>,
    pub stmm_output: Option<&'a GpuResource>,
    pub denoised_current_output: Option<&'a GpuResource>,
    pub current_frame_output: Option<&'a GpuResource>,
    pub previous_frame_output: Option<&'a GpuResource>,
    pub statistics_output: Option<&'a GpuResource>,
    pub alpha_vignette: Option<&'a GpuResource>,
    pub lace_ace_rgb_histogram: Option<&'a GpuResource>,
    pub skin_score_output: Option<&'a GpuResource>,
}

fn surface_format(format: SurfaceFormat) -> Result<u32, MhwStatus> {
    Ok(match format {
        SurfaceFormat::Nv12 => VEBOX_SURFACE_FORMAT_PLANAR_420_8,
        SurfaceFormat::P010 | SurfaceFormat::P016 => VEBOX_SURFACE_FORMAT_PLANAR_420_16,
        SurfaceFormat::Yuy2 => VEBOX_SURFACE_FORMAT_YCRCB_NORMAL,
        SurfaceFormat::Y8 => VEBOX_SURFACE_FORMAT_Y8_UNORM,
        SurfaceFormat::Argb | SurfaceFormat::Abgr => VEBOX_SURFACE_FORMAT_R8G8B8A8_UNORM,
        _ => return Err(MhwStatus::InvalidParameter),
    })
}

pub struct VeboxInterfaceG12 {
    os: Arc<dyn OsInterface>,
    caps: &'static HwCaps,
}

impl std::fmt::Debug for VeboxInterfaceG12 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VeboxInterfaceG12")
            .field("family", &self.caps.family)
            .field("ctx_based_scheduling", &self.os.is_ctx_based_scheduling())
            .finish()
    }
}

impl VeboxInterfaceG12 {
    #[tracing::instrument(skip(os, caps), fields(family = ?caps.family))]
    pub fn new(os: Arc<dyn OsInterface>, caps: &'static HwCaps) -> Self {
        debug!("VEBOX interface created");
        Self { os, caps }
    }

    fn build_surface_state(
        &self,
        surface: &SurfaceInfo,
        id: u32,
        params: &VeboxSurfaceStateParams,
    ) -> Result<VeboxSurfaceState, MhwStatus> {
        surface.validate()?;
        let mut cmd = VeboxSurfaceState::default();
        cmd.set_surface_identification(id);
        cmd.set_width(surface.width - 1);
        cmd.set_height(surface.height - 1);
        cmd.set_tiled_surface(surface.is_tiled() as u32);
        cmd.set_tile_walk((surface.tile_type == TileType::TileY) as u32);
        cmd.set_surface_pitch(surface.pitch - 1);
        cmd.set_surface_format(surface_format(surface.format)?);
        cmd.set_interleave_chroma(matches!(surface.format, SurfaceFormat::Nv12 | SurfaceFormat::P010 | SurfaceFormat::P016) as u32);
        cmd.set_y_offset_for_u(surface.u_offset_y);
        cmd.set_y_offset_for_v(surface.v_offset_y);
        cmd.set_derived_surface_pitch(params.derived_surface_pitch.saturating_sub(1));
        cmd.set_surface_pitch_for_skin_score_output_surfaces(params.skin_score_surface_pitch.saturating_sub(1));
        Ok(cmd)
    }

    /// Emits the input surface state and, when given, the output one. Both are
    /// appended together or not at all.
    pub fn add_vebox_surface_states(
        &self,
        buffer: &mut CommandBuffer,
        params: &VeboxSurfaceStateParams,
    ) -> Result<(), MhwStatus> {
        let input = params.input.as_ref().ok_or(MhwStatus::NullPointer)?;
        let mut dwords = Vec::with_capacity(2 * VeboxSurfaceState::DW_SIZE);
        dwords.extend_from_slice(self.build_surface_state(input, VEBOX_SURFACE_INPUT, params)?.as_dwords());
        if let Some(output) = &params.output {
            dwords.extend_from_slice(self.build_surface_state(output, VEBOX_SURFACE_OUTPUT, params)?.as_dwords());
        }
        buffer.append_dwords(&dwords)
    }

    pub fn add_vebox_state(&self, buffer: &mut CommandBuffer, params: &VeboxStateParams) -> Result<(), MhwStatus> {
        let heap = params.heap.as_ref().ok_or(MhwStatus::NullPointer)?;
        let lace = params.features.contains(VeboxFeatures::LACE);
        if lace && params.lace_lut.is_none() {
            return Err(MhwStatus::NullPointer);
        }

        let mocs = self.caps.mocs_index(MocsUsage::VpSurface);
        let os = self.os.as_ref();
        let mut cmd = VeboxState::default();
        let mut relocs = Vec::new();

        let mut add = |cmd: &mut VeboxState, resource: &GpuResource, offset: u32, loc: u32| {
            let res = ResourceParams::new(Some(resource), loc)
                .with_offset(offset)
                .with_lsb(12)
                .with_mocs(
                    VeboxState::STATE_SURFACE_CONTROL_DW as i32 - loc as i32,
                    STATE_SURFACE_MOCS_LSB,
                    mocs,
                );
            add_resource_to_cmd(os, cmd.as_dwords_mut(), &mut relocs, &res)
        };

        let base = heap.instance_base();
        add(&mut cmd, heap.resource, base + heap.dndi_state_offset, VeboxState::DN_DI_STATE_DW)?;
        add(&mut cmd, heap.resource, base + heap.iecp_state_offset, VeboxState::IECP_STATE_DW)?;
        match params.lut_1d {
            Some(lut) => add(&mut cmd, lut, 0, VeboxState::GAMUT_STATE_DW)?,
            None => add(&mut cmd, heap.resource, base + heap.gamut_state_offset, VeboxState::GAMUT_STATE_DW)?,
        }
        add(&mut cmd, heap.resource, base + heap.vertex_table_offset, VeboxState::VERTEX_TABLE_STATE_DW)?;
        add(
            &mut cmd,
            heap.resource,
            base + heap.capture_pipe_state_offset,
            VeboxState::CAPTURE_PIPE_STATE_DW,
        )?;
        if let Some(lut) = params.lace_lut {
            add(&mut cmd, lut, 0, VeboxState::LACE_LUT_STATE_DW)?;
        }
        add(
            &mut cmd,
            heap.resource,
            base + heap.gamma_correction_state_offset,
            VeboxState::GAMMA_CORRECTION_STATE_DW,
        )?;

        let features = params.features;
        cmd.set_dn_enable(features.contains(VeboxFeatures::DN) as u32);
        cmd.set_di_enable(features.contains(VeboxFeatures::DI) as u32);
        cmd.set_global_iecp_enable(features.contains(VeboxFeatures::IECP) as u32);
        cmd.set_lace_correction_enable(lace as u32);
        cmd.set_color_gamut_expansion_enable(features.contains(VeboxFeatures::GAMUT_EXPANSION) as u32);
        cmd.set_color_gamut_compression_enable(features.contains(VeboxFeatures::GAMUT_COMPRESSION) as u32);
        cmd.set_forward_gamma_correction_enable(features.contains(VeboxFeatures::FORWARD_GAMMA) as u32);
        cmd.set_alpha_plane_enable(features.contains(VeboxFeatures::ALPHA_PLANE) as u32);
        cmd.set_dn_di_first_frame(params.dn_di_first_frame as u32);
        cmd.set_di_output_frames(params.di_output_frames);
        cmd.set_single_slice_vebox_enable(params.single_slice as u32);

        trace!(features = ?features, relocations = relocs.len(), "VEBOX_STATE");
        buffer.append_command_relocated(&cmd, relocs)
    }

    pub fn add_vebox_di_iecp(&self, buffer: &mut CommandBuffer, params: &DiIecpParams) -> Result<(), MhwStatus> {
        if params.ending_x < params.starting_x {
            return Err(MhwStatus::InvalidParameter);
        }

        let os = self.os.as_ref();
        let mut cmd = VebDiIecp::default();
        cmd.set_starting_x(params.starting_x);
        cmd.set_ending_x(params.ending_x);
        let mut relocs: Vec<Relocation> = Vec::new();

        let surfaces = [
            (params.current_frame_input, VebDiIecp::CURRENT_FRAME_INPUT_DW, false, MocsUsage::VpSurface),
            (params.previous_frame_input, VebDiIecp::PREVIOUS_FRAME_INPUT_DW, false, MocsUsage::VpSurface),
            (params.stmm_input, VebDiIecp::STMM_INPUT_DW, false, MocsUsage::VpSurface),
            (params.stmm_output, VebDiIecp::STMM_OUTPUT_DW, true, MocsUsage::VpSurface),
            (params.denoised_current_output, VebDiIecp::DENOISED_CURRENT_OUTPUT_DW, true, MocsUsage::VpSurface),
            (params.current_frame_output, VebDiIecp::CURRENT_FRAME_OUTPUT_DW, true, MocsUsage::VpSurface),
            (params.previous_frame_output, VebDiIecp::PREVIOUS_FRAME_OUTPUT_DW, true, MocsUsage::VpSurface),
            (params.statistics_output, VebDiIecp::STATISTICS_OUTPUT_DW, true, MocsUsage::StreamOut),
            (params.alpha_vignette, VebDiIecp::ALPHA_VIGNETTE_DW, true, MocsUsage::VpSurface),
            (params.lace_ace_rgb_histogram, VebDiIecp::LACE_ACE_RGB_HISTOGRAM_DW, true, MocsUsage::StreamOut),
            (params.skin_score_output, VebDiIecp::SKIN_SCORE_OUTPUT_DW, true, MocsUsage::StreamOut),
        ];

        for (resource, loc, writable, usage) in surfaces {
            if resource.is_none() {
                continue;
            }
            let res = ResourceParams::new(resource, loc)
                .with_lsb(12)
                .writable(writable)
                .with_mocs(0, MOCS_ATTRIBUTE_LSB, self.caps.mocs_index(usage));
            add_resource_to_cmd(os, cmd.as_dwords_mut(), &mut relocs, &res)?;
        }

        if relocs.is_empty() {
            return Err(MhwStatus::NullPointer);
        }
        buffer.append_command_relocated(&cmd, relocs)
    }

    /// Creates the VEBOX GPU context, using the enhanced options when the kernel schedules
    /// per context.
    pub fn create_gpu_context(&self) -> Result<GpuContextHandle, MhwStatus> {
        let options = if self.os.is_ctx_based_scheduling() {
            GpuContextCreateOptions::enhanced(
                EngineClass::VideoEnhance,
                EnhancedContextOptions {
                    lrca_count: 1,
                    using_sfc: true,
                    ..Default::default()
                },
            )
        } else {
            GpuContextCreateOptions::basic(EngineClass::VideoEnhance)
        };
        let handle = self.os.create_gpu_context(&options)?;
        debug!(?handle, enhanced = options.enhanced.is_some(), "VEBOX context created");
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{caps::caps_for, constants::ProductFamily, os::MockOs};

    fn setup(os: MockOs) -> (Arc<MockOs>, VeboxInterfaceG12) {
        let os = Arc::new(os);
        let vebox = VeboxInterfaceG12::new(os.clone(), caps_for(ProductFamily::TigerlakeLp).unwrap());
        (os, vebox)
    }

    fn heap(resource: &GpuResource) -> VeboxHeap<'_> {
        VeboxHeap {
            resource,
            instance_size: 0x4000,
            current_instance: 1,
            dndi_state_offset: 0,
            iecp_state_offset: 0x1000,
            gamut_state_offset: 0x2000,
            vertex_table_offset: 0x3000,
            capture_pipe_state_offset: 0x3000,
            gamma_correction_state_offset: 0x3000,
        }
    }

    #[test]
    fn state_heap_mocs_is_shared() {
        let (os, vebox) = setup(MockOs::new());
        let res = os.allocate_resource(0x8000, "vebox heap").unwrap();
        let mut buffer = CommandBuffer::new(256);
        vebox
            .add_vebox_state(
                &mut buffer,
                &VeboxStateParams {
                    heap: Some(heap(&res)),
                    features: VeboxFeatures::DN | VeboxFeatures::IECP,
                    ..Default::default()
                },
            )
            .unwrap();

        let cmd = VeboxState {
            dw: buffer.dwords().try_into().unwrap(),
        };
        let mocs = vebox.caps.mocs_index(MocsUsage::VpSurface);
        assert_eq!(cmd.state_surface_control_bits(), mocs << 1);
        assert_eq!(cmd.dn_enable(), 1);
        assert_eq!(cmd.global_iecp_enable(), 1);
        assert_eq!(cmd.di_enable(), 0);

        let relocs = buffer.relocations();
        assert_eq!(relocs.len(), 6);
        assert_eq!(relocs[0].offset, 0x4000);
        assert_eq!(relocs[1].offset, 0x5000);
        assert_eq!(relocs[5].dw_index, VeboxState::GAMMA_CORRECTION_STATE_DW as usize);
        assert_eq!(relocs[5].offset, 0x7000);
        assert_eq!(cmd.dw[14] & 0xFFF, 0);
    }

    #[test]
    fn default_state_params() {
        let params = VeboxStateParams::default();
        assert!(params.features.is_empty());
        assert!(params.heap.is_none());
        assert_eq!(params.di_output_frames, 0);
    }

    #[test]
    fn lace_needs_a_lookup_table() {
        let (os, vebox) = setup(MockOs::new());
        let res = os.allocate_resource(0x8000, "vebox heap").unwrap();
        let mut buffer = CommandBuffer::new(256);
        let mut params = VeboxStateParams {
            heap: Some(heap(&res)),
            features: VeboxFeatures::LACE,
            ..Default::default()
        };
        assert_eq!(vebox.add_vebox_state(&mut buffer, &params), Err(MhwStatus::NullPointer));
        assert_eq!(
            vebox.add_vebox_state(&mut buffer, &VeboxStateParams::default()),
            Err(MhwStatus::NullPointer)
        );
        assert_eq!(buffer.offset(), 0);

        let lut = os.allocate_resource(0x1000, "lace lut").unwrap();
        params.lace_lut = Some(&lut);
        vebox.add_vebox_state(&mut buffer, &params).unwrap();
        assert!(buffer.relocations().iter().any(|r| r.resource_id == lut.id() && r.dw_index == 12));
    }

    #[test]
    fn surface_states_are_appended_together() {
        let (_, vebox) = setup(MockOs::new());
        let mut buffer = CommandBuffer::new(256);
        let input = SurfaceInfo::planar(720, 480, 768, SurfaceFormat::Nv12, TileType::TileY);
        let bad_output = SurfaceInfo::planar(720, 480, 768, SurfaceFormat::Y410, TileType::TileY);
        let params = VeboxSurfaceStateParams {
            input: Some(input),
            output: Some(bad_output),
            ..Default::default()
        };
        assert_eq!(
            vebox.add_vebox_surface_states(&mut buffer, &params),
            Err(MhwStatus::InvalidParameter)
        );
        assert_eq!(buffer.offset(), 0);

        let params = VeboxSurfaceStateParams {
            output: Some(input),
            ..params
        };
        vebox.add_vebox_surface_states(&mut buffer, &params).unwrap();
        assert_eq!(buffer.offset(), 2 * VeboxSurfaceState::BYTE_SIZE);
        let output = VeboxSurfaceState {
            dw: buffer.dwords()[VeboxSurfaceState::DW_SIZE..].try_into().unwrap(),
        };
        assert_eq!(output.surface_identification(), VEBOX_SURFACE_OUTPUT);
        assert_eq!(output.width(), 719);
    }

    #[test]
    fn di_iecp_surfaces() {
        let (os, vebox) = setup(MockOs::new());
        let input = os.allocate_resource(0x10000, "input").unwrap();
        let output = os.allocate_resource(0x10000, "output").unwrap();
        let mut buffer = CommandBuffer::new(256);

        let mut params = DiIecpParams {
            starting_x: 64,
            ending_x: 32,
            current_frame_input: Some(&input),
            current_frame_output: Some(&output),
            ..Default::default()
        };
        assert_eq!(vebox.add_vebox_di_iecp(&mut buffer, &params), Err(MhwStatus::InvalidParameter));

        params.starting_x = 0;
        params.ending_x = 1279;
        vebox.add_vebox_di_iecp(&mut buffer, &params).unwrap();
        let cmd = VebDiIecp {
            dw: buffer.dwords().try_into().unwrap(),
        };
        assert_eq!(cmd.ending_x(), 1279);
        assert_eq!(
            cmd.surface_mocs(VebDiIecp::CURRENT_FRAME_OUTPUT_DW),
            vebox.caps.mocs_index(MocsUsage::VpSurface)
        );
        let relocs = buffer.relocations();
        assert_eq!(relocs.len(), 2);
        assert!(relocs[1].writable);
        assert_eq!(os.registered_access(output.id()), Some(crate::constants::ResourceAccess::READ_WRITE));
    }

    #[test]
    fn gpu_context_options_follow_scheduling() {
        let (os, vebox) = setup(MockOs::new());
        let handle = vebox.create_gpu_context().unwrap();
        assert_eq!(os.context_options(handle).unwrap().enhanced, None);

        let (os, vebox) = setup(MockOs::new().with_ctx_based_scheduling(true));
        let handle = vebox.create_gpu_context().unwrap();
        let enhanced = os.context_options(handle).unwrap().enhanced.unwrap();
        assert_eq!(enhanced.lrca_count, 1);
        assert!(enhanced.using_sfc);
    }
}
