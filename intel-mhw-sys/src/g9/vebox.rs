//! VEBOX (video enhancement) commands.

use crate::bits::field;

const VEBOX_OPCODE: u32 = 4;

const fn vebox_header(sub_opcode_a: u32, sub_opcode_b: u32, dword_length: u32) -> u32 {
    field(29, 31, crate::COMMAND_TYPE_PARALLEL_VIDEO_PIPE)
        | field(27, 28, 2)
        | field(24, 26, VEBOX_OPCODE)
        | field(21, 23, sub_opcode_a)
        | field(16, 20, sub_opcode_b)
        | dword_length
}

pub const VEBOX_SURFACE_INPUT: u32 = 0;
pub const VEBOX_SURFACE_OUTPUT: u32 = 1;

pub const VEBOX_SURFACE_FORMAT_YCRCB_NORMAL: u32 = 0;
pub const VEBOX_SURFACE_FORMAT_PLANAR_420_8: u32 = 4;
pub const VEBOX_SURFACE_FORMAT_R8G8B8A8_UNORM: u32 = 9;
pub const VEBOX_SURFACE_FORMAT_Y8_UNORM: u32 = 12;
pub const VEBOX_SURFACE_FORMAT_PLANAR_420_16: u32 = 13;

hw_command! {
    pub struct VeboxSurfaceState: 9 {
        default { 0 => vebox_header(0, 0, 7) }
        surface_identification, set_surface_identification: 1, 0..=0;
        width, set_width: 2, 4..=17;
        height, set_height: 2, 18..=31;
        tile_walk, set_tile_walk: 3, 0..=0;
        tiled_surface, set_tiled_surface: 3, 1..=1;
        half_pitch_for_chroma, set_half_pitch_for_chroma: 3, 2..=2;
        surface_pitch, set_surface_pitch: 3, 3..=19;
        interleave_chroma, set_interleave_chroma: 3, 27..=27;
        surface_format, set_surface_format: 3, 28..=31;
        y_offset_for_u, set_y_offset_for_u: 4, 0..=14;
        x_offset_for_u, set_x_offset_for_u: 4, 16..=28;
        y_offset_for_v, set_y_offset_for_v: 5, 0..=14;
        x_offset_for_v, set_x_offset_for_v: 5, 16..=28;
        y_offset_for_frame, set_y_offset_for_frame: 6, 0..=14;
        x_offset_for_frame, set_x_offset_for_frame: 6, 16..=30;
        derived_surface_pitch, set_derived_surface_pitch: 7, 0..=16;
        surface_pitch_for_skin_score_output_surfaces, set_surface_pitch_for_skin_score_output_surfaces: 8, 0..=16;
    }
}

hw_command! {
    pub struct VeboxState: 16 {
        default { 0 => vebox_header(0, 2, 14) }
        color_gamut_expansion_enable, set_color_gamut_expansion_enable: 1, 0..=0;
        color_gamut_compression_enable, set_color_gamut_compression_enable: 1, 1..=1;
        global_iecp_enable, set_global_iecp_enable: 1, 2..=2;
        dn_enable, set_dn_enable: 1, 3..=3;
        di_enable, set_di_enable: 1, 4..=4;
        dn_di_first_frame, set_dn_di_first_frame: 1, 5..=5;
        di_output_frames, set_di_output_frames: 1, 8..=9;
        alpha_plane_enable, set_alpha_plane_enable: 1, 12..=12;
        single_slice_vebox_enable, set_single_slice_vebox_enable: 1, 14..=15;
        lace_correction_enable, set_lace_correction_enable: 1, 16..=16;
        disable_encoder_statistics, set_disable_encoder_statistics: 1, 17..=17;
        disable_temporal_denoise_filter, set_disable_temporal_denoise_filter: 1, 18..=18;
        single_pipe_enable, set_single_pipe_enable: 1, 19..=19;
        forward_gamma_correction_enable, set_forward_gamma_correction_enable: 1, 21..=21;
        state_surface_control_bits, set_state_surface_control_bits: 1, 25..=31;
        dn_di_state_pointer, set_dn_di_state_pointer: 2, 12..=31;
        dn_di_state_pointer_high, set_dn_di_state_pointer_high: 3, 0..=15;
        iecp_state_pointer, set_iecp_state_pointer: 4, 12..=31;
        iecp_state_pointer_high, set_iecp_state_pointer_high: 5, 0..=15;
        gamut_state_pointer, set_gamut_state_pointer: 6, 12..=31;
        gamut_state_pointer_high, set_gamut_state_pointer_high: 7, 0..=15;
        vertex_table_state_pointer, set_vertex_table_state_pointer: 8, 12..=31;
        vertex_table_state_pointer_high, set_vertex_table_state_pointer_high: 9, 0..=15;
        capture_pipe_state_pointer, set_capture_pipe_state_pointer: 10, 12..=31;
        capture_pipe_state_pointer_high, set_capture_pipe_state_pointer_high: 11, 0..=15;
        lace_lut_table_state_pointer, set_lace_lut_table_state_pointer: 12, 12..=31;
        lace_lut_table_state_pointer_high, set_lace_lut_table_state_pointer_high: 13, 0..=15;
        gamma_correction_values_address, set_gamma_correction_values_address: 14, 12..=31;
        gamma_correction_values_address_high, set_gamma_correction_values_address_high: 15, 0..=31;
    }
}

impl VeboxState {
    pub const DN_DI_STATE_DW: u32 = 2;
    pub const IECP_STATE_DW: u32 = 4;
    pub const GAMUT_STATE_DW: u32 = 6;
    pub const VERTEX_TABLE_STATE_DW: u32 = 8;
    pub const CAPTURE_PIPE_STATE_DW: u32 = 10;
    pub const LACE_LUT_STATE_DW: u32 = 12;
    pub const GAMMA_CORRECTION_STATE_DW: u32 = 14;
    /// DW1 holds the state surface control bits, so MOCS for the state heaps lands
    /// there rather than next to each pointer.
    pub const STATE_SURFACE_CONTROL_DW: u32 = 1;
}

hw_command! {
    /// VEB_DI_IECP. Each surface takes a pair of DWords: control bits and low address,
    /// then the high address.
    pub struct VebDiIecp: 24 {
        default { 0 => vebox_header(0, 3, 22) }
        ending_x, set_ending_x: 1, 0..=13;
        starting_x, set_starting_x: 1, 16..=29;
    }
}

impl VebDiIecp {
    pub const CURRENT_FRAME_INPUT_DW: u32 = 2;
    pub const PREVIOUS_FRAME_INPUT_DW: u32 = 4;
    pub const STMM_INPUT_DW: u32 = 6;
    pub const STMM_OUTPUT_DW: u32 = 8;
    pub const DENOISED_CURRENT_OUTPUT_DW: u32 = 10;
    pub const CURRENT_FRAME_OUTPUT_DW: u32 = 12;
    pub const PREVIOUS_FRAME_OUTPUT_DW: u32 = 14;
    pub const STATISTICS_OUTPUT_DW: u32 = 16;
    pub const ALPHA_VIGNETTE_DW: u32 = 18;
    pub const LACE_ACE_RGB_HISTOGRAM_DW: u32 = 20;
    pub const SKIN_SCORE_OUTPUT_DW: u32 = 22;

    pub fn surface_mocs(&self, surface_dw: u32) -> u32 {
        crate::bits::get(self.dw[surface_dw as usize], 1, 6)
    }

    pub fn set_surface_mocs(&mut self, surface_dw: u32, mocs: u32) {
        crate::bits::set(&mut self.dw[surface_dw as usize], 1, 6, mocs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_values() {
        assert_eq!(VeboxSurfaceState::default().dw[0], 0x7400_0007);
        assert_eq!(VeboxState::default().dw[0], 0x7402_000E);
        assert_eq!(VebDiIecp::default().dw[0], 0x7403_0016);
    }

    #[test]
    fn byte_sizes() {
        assert_eq!(VeboxSurfaceState::BYTE_SIZE, 36);
        assert_eq!(VeboxState::BYTE_SIZE, 64);
        assert_eq!(VebDiIecp::BYTE_SIZE, 96);
    }

    #[test]
    fn surface_control_bits_share_the_address_dword() {
        let mut cmd = VebDiIecp::default();
        cmd.dw[VebDiIecp::CURRENT_FRAME_OUTPUT_DW as usize] = 0xABCD_E000;
        cmd.set_surface_mocs(VebDiIecp::CURRENT_FRAME_OUTPUT_DW, 2);
        assert_eq!(cmd.dw[12], 0xABCD_E004);
        assert_eq!(cmd.surface_mocs(VebDiIecp::CURRENT_FRAME_OUTPUT_DW), 2);
    }
}
