//! AVP (AV1 video pipe) commands.

use crate::bits::field;

const AVP_ENGINE_OPCODE: u32 = 3;

const fn avp_header(command: u32, dword_length: u32) -> u32 {
    field(29, 31, crate::COMMAND_TYPE_PARALLEL_VIDEO_PIPE)
        | field(27, 28, 2)
        | field(23, 26, AVP_ENGINE_OPCODE)
        | field(16, 22, command)
        | dword_length
}

pub const CODEC_SELECT_DECODE: u32 = 0;
pub const CODEC_SELECT_ENCODE: u32 = 1;
pub const CODEC_STANDARD_SELECT_AV1: u32 = 2;

pub const PHASE_INDICATOR_FIRST: u32 = 0;
pub const PHASE_INDICATOR_MIDDLE: u32 = 1;
pub const PHASE_INDICATOR_LAST: u32 = 2;

hw_command! {
    pub struct AvpPipeModeSelect: 6 {
        default { 0 => avp_header(0, 4) }
        codec_select, set_codec_select: 1, 0..=0;
        cdef_output_streamout_enable, set_cdef_output_streamout_enable: 1, 1..=1;
        loop_restoration_output_streamout_enable, set_loop_restoration_output_streamout_enable: 1, 2..=2;
        pic_status_error_report_enable, set_pic_status_error_report_enable: 1, 3..=3;
        codec_standard_select, set_codec_standard_select: 1, 5..=7;
        multi_engine_mode, set_multi_engine_mode: 1, 13..=14;
        pipe_working_mode, set_pipe_working_mode: 1, 15..=16;
        tile_based_engine, set_tile_based_engine: 1, 17..=17;
        media_soft_reset_counter_per_1000_clocks, set_media_soft_reset_counter_per_1000_clocks: 2, 0..=31;
        pic_status_error_report_id, set_pic_status_error_report_id: 3, 0..=31;
        phase_indicator, set_phase_indicator: 5, 0..=1;
    }
}

pub const AVP_SURFACE_ID_RECON: u32 = 0;
pub const AVP_SURFACE_ID_SOURCE_INPUT: u32 = 1;
/// AV1 reference pictures use ids `AVP_SURFACE_ID_AV1_REF0 + n` for n in 0..8.
pub const AVP_SURFACE_ID_AV1_REF0: u32 = 6;
pub const AVP_SURFACE_ID_INTRABC_DECODED: u32 = 14;

pub const AVP_SURFACE_FORMAT_PLANAR_420_8: u32 = 4;
pub const AVP_SURFACE_FORMAT_P010: u32 = 13;

hw_command! {
    pub struct AvpSurfaceState: 5 {
        default { 0 => avp_header(1, 3) }
        surface_pitch_minus1, set_surface_pitch_minus1: 1, 0..=16;
        surface_id, set_surface_id: 1, 28..=31;
        y_offset_for_u_cb, set_y_offset_for_u_cb: 2, 0..=14;
        surface_format, set_surface_format: 2, 27..=31;
        default_alpha_value, set_default_alpha_value: 3, 0..=15;
        y_offset_for_v_cr, set_y_offset_for_v_cr: 3, 16..=31;
        memory_compression_enable, set_memory_compression_enable: 4, 0..=15;
        compression_format, set_compression_format: 4, 16..=20;
    }
}

hw_command! {
    pub struct AvpIndObjBaseAddrState: 6 {
        default { 0 => avp_header(3, 4) }
        indirect_bitstream_base_address, set_indirect_bitstream_base_address: 1, 12..=31;
        indirect_bitstream_base_address_high, set_indirect_bitstream_base_address_high: 2, 0..=31;
        indirect_bitstream_mocs, set_indirect_bitstream_mocs: 3, 1..=6;
        indirect_bitstream_arbitration_priority, set_indirect_bitstream_arbitration_priority: 3, 7..=8;
        indirect_bitstream_memory_compression_enable, set_indirect_bitstream_memory_compression_enable: 3, 9..=9;
        indirect_bitstream_tiled_resource_mode, set_indirect_bitstream_tiled_resource_mode: 3, 13..=14;
        indirect_bitstream_upper_bound, set_indirect_bitstream_upper_bound: 4, 12..=31;
        indirect_bitstream_upper_bound_high, set_indirect_bitstream_upper_bound_high: 5, 0..=31;
    }
}

impl AvpIndObjBaseAddrState {
    pub const BASE_ADDRESS_DW: u32 = 1;
    pub const ATTRIBUTES_DW: u32 = 3;
    pub const UPPER_BOUND_OFFSET: u32 = 3;
}

hw_command! {
    pub struct AvpBsdObject: 3 {
        default { 0 => avp_header(0x20, 1) }
        tile_indirect_bsd_data_length, set_tile_indirect_bsd_data_length: 1, 0..=31;
        tile_indirect_data_start_address, set_tile_indirect_data_start_address: 2, 0..=28;
    }
}

hw_command! {
    pub struct AvpTileCoding: 6 {
        default { 0 => avp_header(21, 4) }
        frame_tile_id, set_frame_tile_id: 1, 0..=11;
        tg_tile_num, set_tg_tile_num: 1, 12..=23;
        tile_group_id, set_tile_group_id: 1, 24..=31;
        tile_column_position_in_sb_unit, set_tile_column_position_in_sb_unit: 2, 0..=9;
        tile_row_position_in_sb_unit, set_tile_row_position_in_sb_unit: 2, 16..=25;
        tile_width_in_superblock_unit_minus1, set_tile_width_in_superblock_unit_minus1: 3, 0..=5;
        tile_height_in_superblock_unit_minus1, set_tile_height_in_superblock_unit_minus1: 3, 16..=25;
        film_grain_sample_template_write_read_control, set_film_grain_sample_template_write_read_control: 4, 0..=0;
        is_last_tile_of_column, set_is_last_tile_of_column: 4, 25..=25;
        is_last_tile_of_row, set_is_last_tile_of_row: 4, 26..=26;
        is_start_tile_of_tile_group, set_is_start_tile_of_tile_group: 4, 27..=27;
        is_end_tile_of_tile_group, set_is_end_tile_of_tile_group: 4, 28..=28;
        is_last_tile_of_frame, set_is_last_tile_of_frame: 4, 29..=29;
        disable_cdf_update, set_disable_cdf_update: 4, 30..=30;
        disable_frame_context_update, set_disable_frame_context_update: 4, 31..=31;
        number_of_active_be_pipes, set_number_of_active_be_pipes: 5, 0..=7;
        num_of_tile_columns_minus1_in_frame, set_num_of_tile_columns_minus1_in_frame: 5, 12..=21;
        num_of_tile_rows_minus1_in_frame, set_num_of_tile_rows_minus1_in_frame: 5, 22..=31;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_values() {
        assert_eq!(AvpPipeModeSelect::default().dw[0], 0x7180_0004);
        assert_eq!(AvpSurfaceState::default().dw[0], 0x7181_0003);
        assert_eq!(AvpIndObjBaseAddrState::default().dw[0], 0x7183_0004);
        assert_eq!(AvpBsdObject::default().dw[0], 0x71A0_0001);
        assert_eq!(AvpTileCoding::default().dw[0], 0x7195_0004);
    }

    #[test]
    fn byte_sizes() {
        assert_eq!(AvpPipeModeSelect::BYTE_SIZE, 24);
        assert_eq!(AvpSurfaceState::BYTE_SIZE, 20);
        assert_eq!(AvpIndObjBaseAddrState::BYTE_SIZE, 24);
        assert_eq!(AvpBsdObject::BYTE_SIZE, 12);
        assert_eq!(AvpTileCoding::BYTE_SIZE, 24);
    }
}
