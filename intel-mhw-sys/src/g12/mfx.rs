//! MFX (multi-format codec) common state commands.

use crate::bits::field;

const MFX_COMMON_STATE: u32 = 0;

const fn mfx_header(sub_opcode_a: u32, sub_opcode_b: u32, dword_length: u32) -> u32 {
    field(29, 31, crate::COMMAND_TYPE_PARALLEL_VIDEO_PIPE)
        | field(27, 28, 2)
        | field(24, 26, MFX_COMMON_STATE)
        | field(21, 23, sub_opcode_a)
        | field(16, 20, sub_opcode_b)
        | dword_length
}

pub const STANDARD_SELECT_MPEG2: u32 = 0;
pub const STANDARD_SELECT_VC1: u32 = 1;
pub const STANDARD_SELECT_AVC: u32 = 2;
pub const STANDARD_SELECT_JPEG: u32 = 3;
pub const STANDARD_SELECT_VP8: u32 = 5;

pub const CODEC_SELECT_DECODE: u32 = 0;
pub const CODEC_SELECT_ENCODE: u32 = 1;

pub const DECODER_MODE_SELECT_VLD: u32 = 0;
pub const DECODER_MODE_SELECT_IT: u32 = 1;

hw_command! {
    pub struct MfxPipeModeSelect: 5 {
        default { 0 => mfx_header(0, 0, 3) }
        standard_select, set_standard_select: 1, 0..=3;
        codec_select, set_codec_select: 1, 4..=4;
        stitch_mode, set_stitch_mode: 1, 5..=5;
        frame_statistics_streamout_enable, set_frame_statistics_streamout_enable: 1, 6..=6;
        scaled_surface_enable, set_scaled_surface_enable: 1, 7..=7;
        pre_deblocking_output_enable, set_pre_deblocking_output_enable: 1, 8..=8;
        post_deblocking_output_enable, set_post_deblocking_output_enable: 1, 9..=9;
        stream_out_enable, set_stream_out_enable: 1, 10..=10;
        pic_error_status_report_enable, set_pic_error_status_report_enable: 1, 11..=11;
        deblocker_stream_out_enable, set_deblocker_stream_out_enable: 1, 12..=12;
        vdenc_mode, set_vdenc_mode: 1, 13..=13;
        standalone_vdenc_mode_enable, set_standalone_vdenc_mode_enable: 1, 14..=14;
        decoder_mode_select, set_decoder_mode_select: 1, 15..=16;
        decoder_short_format_mode, set_decoder_short_format_mode: 1, 17..=17;
        extended_stream_out_enable, set_extended_stream_out_enable: 1, 18..=18;
        clock_gate_enable_at_slice_level, set_clock_gate_enable_at_slice_level: 2, 8..=8;
        pic_status_error_report_id, set_pic_status_error_report_id: 3, 0..=31;
    }
}

pub const MFX_SURFACE_ID_DECODED_AND_REFERENCE: u32 = 0;
pub const MFX_SURFACE_ID_SOURCE_INPUT: u32 = 4;

pub const MFX_SURFACE_FORMAT_YCRCB_NORMAL: u32 = 0;
pub const MFX_SURFACE_FORMAT_PLANAR_420_8: u32 = 4;
pub const MFX_SURFACE_FORMAT_Y8_UNORM: u32 = 12;

hw_command! {
    pub struct MfxSurfaceState: 6 {
        default { 0 => mfx_header(0, 1, 4) }
        surface_id, set_surface_id: 1, 0..=3;
        cr_v_cb_u_pixel_offset_v_direction, set_cr_v_cb_u_pixel_offset_v_direction: 2, 0..=1;
        /// Width minus one.
        width, set_width: 2, 4..=17;
        /// Height minus one.
        height, set_height: 2, 18..=31;
        tile_walk, set_tile_walk: 3, 0..=0;
        tiled_surface, set_tiled_surface: 3, 1..=1;
        half_pitch_for_chroma, set_half_pitch_for_chroma: 3, 2..=2;
        /// Pitch minus one.
        surface_pitch, set_surface_pitch: 3, 3..=19;
        interleave_chroma, set_interleave_chroma: 3, 27..=27;
        surface_format, set_surface_format: 3, 28..=31;
        y_offset_for_u_cb, set_y_offset_for_u_cb: 4, 0..=14;
        x_offset_for_u_cb, set_x_offset_for_u_cb: 4, 16..=30;
        y_offset_for_v_cr, set_y_offset_for_v_cr: 5, 0..=15;
        x_offset_for_v_cr, set_x_offset_for_v_cr: 5, 16..=28;
    }
}

hw_command! {
    /// Five indirect object regions, each a 4KB-aligned base address (2 DW), a memory
    /// attributes DW, and an access upper bound (2 DW).
    pub struct MfxIndObjBaseAddrState: 26 {
        default { 0 => mfx_header(0, 3, 24) }
        bitstream_base_address, set_bitstream_base_address: 1, 12..=31;
        bitstream_base_address_high, set_bitstream_base_address_high: 2, 0..=15;
        bitstream_mocs, set_bitstream_mocs: 3, 1..=6;
        bitstream_upper_bound, set_bitstream_upper_bound: 4, 12..=31;
        bitstream_upper_bound_high, set_bitstream_upper_bound_high: 5, 0..=15;
        mv_object_base_address, set_mv_object_base_address: 6, 12..=31;
        mv_object_mocs, set_mv_object_mocs: 8, 1..=6;
        it_coeff_base_address, set_it_coeff_base_address: 11, 12..=31;
        it_coeff_mocs, set_it_coeff_mocs: 13, 1..=6;
        it_dblk_base_address, set_it_dblk_base_address: 16, 12..=31;
        it_dblk_mocs, set_it_dblk_mocs: 18, 1..=6;
        pak_bse_base_address, set_pak_bse_base_address: 21, 12..=31;
        pak_bse_mocs, set_pak_bse_mocs: 23, 1..=6;
        pak_bse_upper_bound, set_pak_bse_upper_bound: 24, 12..=31;
    }
}

impl MfxIndObjBaseAddrState {
    pub const BITSTREAM_DW: u32 = 1;
    pub const MV_OBJECT_DW: u32 = 6;
    pub const IT_COEFF_DW: u32 = 11;
    pub const IT_DBLK_DW: u32 = 16;
    pub const PAK_BSE_DW: u32 = 21;
    /// Distance from a base address DW to its upper bound DW.
    pub const UPPER_BOUND_OFFSET: u32 = 3;
}
