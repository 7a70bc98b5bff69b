//! VDENC (video encoder front end) commands and the VD pipeline flush.

use crate::bits::field;

const VDENC_OPCODE: u32 = 1;
const VD_PIPELINE_FLUSH_OPCODE: u32 = 15;

const fn vdenc_header(opcode: u32, sub_opcode_a: u32, sub_opcode_b: u32, dword_length: u32) -> u32 {
    field(29, 31, crate::COMMAND_TYPE_PARALLEL_VIDEO_PIPE)
        | field(27, 28, 2)
        | field(23, 26, opcode)
        | field(21, 22, sub_opcode_a)
        | field(16, 20, sub_opcode_b)
        | dword_length
}

pub const STANDARD_SELECT_HEVC: u32 = 0;
pub const STANDARD_SELECT_VP9: u32 = 1;
pub const STANDARD_SELECT_AVC: u32 = 2;

pub const BIT_DEPTH_8BPP: u32 = 0;
pub const BIT_DEPTH_10BPP: u32 = 1;

pub const CHROMA_SUBSAMPLING_420: u32 = 1;
pub const CHROMA_SUBSAMPLING_444: u32 = 3;

hw_command! {
    pub struct VdencPipeModeSelect: 6 {
        default {
            0 => vdenc_header(VDENC_OPCODE, 0, 0, 4),
            1 => field(21, 22, 1) | field(23, 24, 2),
            2 => field(0, 0, 1)
                | field(1, 2, 1)
                | field(3, 3, 1)
                | field(8, 11, 3)
                | field(16, 19, 11)
                | field(20, 23, 2),
            3 => field(0, 0, 1) | field(1, 1, 1) | field(8, 11, 3) | field(24, 27, 4),
        }
        standard_select, set_standard_select: 1, 0..=3;
        scalability_mode, set_scalability_mode: 1, 4..=4;
        frame_statistics_stream_out_enable, set_frame_statistics_stream_out_enable: 1, 5..=5;
        vdenc_pak_obj_cmd_stream_out_enable, set_vdenc_pak_obj_cmd_stream_out_enable: 1, 6..=6;
        tlb_prefetch_enable, set_tlb_prefetch_enable: 1, 7..=7;
        pak_threshold_check_enable, set_pak_threshold_check_enable: 1, 8..=8;
        vdenc_stream_in_enable, set_vdenc_stream_in_enable: 1, 9..=9;
        downscaled_8x_write_disable, set_downscaled_8x_write_disable: 1, 10..=10;
        downscaled_4x_write_disable, set_downscaled_4x_write_disable: 1, 11..=11;
        bit_depth, set_bit_depth: 1, 12..=14;
        pak_chroma_sub_sampling_type, set_pak_chroma_sub_sampling_type: 1, 15..=16;
        output_range_control_after_color_space_conversion, set_output_range_control_after_color_space_conversion: 1, 17..=17;
        is_random_access, set_is_random_access: 1, 18..=18;
        rgb_encoding_enable, set_rgb_encoding_enable: 1, 20..=20;
        primary_channel_selection_for_rgb_encoding, set_primary_channel_selection_for_rgb_encoding: 1, 21..=22;
        first_secondary_channel_selection_for_rgb_encoding, set_first_secondary_channel_selection_for_rgb_encoding: 1, 23..=24;
        tile_replay_enable, set_tile_replay_enable: 1, 25..=25;
        streaming_buffer_config, set_streaming_buffer_config: 1, 26..=27;
        disable_speed_mode_fetch_optimization, set_disable_speed_mode_fetch_optimization: 1, 31..=31;
        hme_region_prefetch_enable, set_hme_region_prefetch_enable: 2, 0..=0;
        top_prefetch_enable_mode, set_top_prefetch_enable_mode: 2, 1..=2;
        left_prefetch_at_wrap_around, set_left_prefetch_at_wrap_around: 2, 3..=3;
        vertical_shift32_minus1, set_vertical_shift32_minus1: 2, 4..=7;
        hz_shift32_minus1, set_hz_shift32_minus1: 2, 8..=11;
        num_vertical_req_minus1, set_num_vertical_req_minus1: 2, 16..=19;
        num_hz_req_minus1, set_num_hz_req_minus1: 2, 20..=23;
        pre_fetch_offset_for_reference_in_16_pixel_minus1, set_pre_fetch_offset_for_reference_in_16_pixel_minus1: 2, 24..=27;
        source_luma_packed_data_tlb_prefetch_enable, set_source_luma_packed_data_tlb_prefetch_enable: 3, 0..=0;
        source_chroma_tlb_prefetch_enable, set_source_chroma_tlb_prefetch_enable: 3, 1..=1;
        vertical_shift32_minus1_src, set_vertical_shift32_minus1_src: 3, 4..=7;
        hz_shift32_minus1_src, set_hz_shift32_minus1_src: 3, 8..=11;
        num_vertical_req_minus1_src, set_num_vertical_req_minus1_src: 3, 16..=19;
        num_hz_req_minus1_src, set_num_hz_req_minus1_src: 3, 20..=23;
        pre_fetch_offset_for_source, set_pre_fetch_offset_for_source: 3, 24..=27;
        frame_number, set_frame_number: 5, 0..=3;
        capture_mode, set_capture_mode: 5, 11..=12;
        session_id, set_session_id: 5, 13..=15;
        tail_pointer_read_frequency, set_tail_pointer_read_frequency: 5, 24..=31;
    }
}

pub const VDENC_SURFACE_FORMAT_YUV422: u32 = 0;
pub const VDENC_SURFACE_FORMAT_RGBA4444: u32 = 1;
pub const VDENC_SURFACE_FORMAT_YUV444: u32 = 2;
pub const VDENC_SURFACE_FORMAT_Y8_UNORM: u32 = 3;
pub const VDENC_SURFACE_FORMAT_PLANAR_420_8: u32 = 4;
pub const VDENC_SURFACE_FORMAT_YCRCB_SWAPY_422: u32 = 5;
pub const VDENC_SURFACE_FORMAT_P010: u32 = 8;
pub const VDENC_SURFACE_FORMAT_R10G10B10A2_UNORM: u32 = 9;
pub const VDENC_SURFACE_FORMAT_Y410: u32 = 10;
pub const VDENC_SURFACE_FORMAT_Y216: u32 = 13;

hw_command! {
    /// Source surface state; DW2..=5 carry the shared VDENC surface fields.
    pub struct VdencSrcSurfaceState: 6 {
        default {
            0 => vdenc_header(VDENC_OPCODE, 0, 1, 4),
            3 => field(0, 0, 1) | field(1, 1, 1),
        }
        cr_v_cb_u_pixel_offset_v_direction, set_cr_v_cb_u_pixel_offset_v_direction: 2, 0..=1;
        surface_format_byte_swizzle, set_surface_format_byte_swizzle: 2, 2..=2;
        color_space_selection, set_color_space_selection: 2, 3..=3;
        /// Width minus one.
        width, set_width: 2, 4..=17;
        /// Height minus one.
        height, set_height: 2, 18..=31;
        tile_walk, set_tile_walk: 3, 0..=0;
        tiled_surface, set_tiled_surface: 3, 1..=1;
        half_pitch_for_chroma, set_half_pitch_for_chroma: 3, 2..=2;
        /// Pitch minus one.
        surface_pitch, set_surface_pitch: 3, 3..=19;
        chroma_downsample_filter_control, set_chroma_downsample_filter_control: 3, 20..=22;
        surface_format, set_surface_format: 3, 27..=31;
        y_offset_for_u_cb, set_y_offset_for_u_cb: 4, 0..=14;
        x_offset_for_u_cb, set_x_offset_for_u_cb: 4, 16..=30;
        y_offset_for_v_cr, set_y_offset_for_v_cr: 5, 0..=15;
        x_offset_for_v_cr, set_x_offset_for_v_cr: 5, 16..=28;
    }
}

hw_command! {
    pub struct VdencWalkerState: 27 {
        default { 0 => vdenc_header(VDENC_OPCODE, 0, 7, 25) }
        mb_lcu_start_y_position, set_mb_lcu_start_y_position: 1, 0..=8;
        mb_lcu_start_x_position, set_mb_lcu_start_x_position: 1, 16..=24;
        first_super_slice, set_first_super_slice: 1, 28..=28;
        next_slice_mb_start_y_position, set_next_slice_mb_start_y_position: 2, 0..=9;
        next_slice_mb_lcu_start_x_position, set_next_slice_mb_lcu_start_x_position: 2, 16..=25;
        log2_weight_denom_luma, set_log2_weight_denom_luma: 3, 0..=2;
        hevc_log2_weight_denom_luma, set_hevc_log2_weight_denom_luma: 3, 4..=6;
        num_par_engine, set_num_par_engine: 3, 9..=10;
        tile_row_store_select, set_tile_row_store_select: 3, 16..=16;
        tile_number, set_tile_number: 3, 24..=31;
        tile_start_ctb_y, set_tile_start_ctb_y: 4, 0..=15;
        tile_start_ctb_x, set_tile_start_ctb_x: 4, 16..=31;
        tile_width, set_tile_width: 5, 0..=15;
        tile_height, set_tile_height: 5, 16..=31;
        streamin_offset_enable, set_streamin_offset_enable: 6, 0..=0;
        tile_streamin_offset, set_tile_streamin_offset: 6, 6..=31;
        row_store_offset_enable, set_row_store_offset_enable: 7, 0..=0;
        tile_rowstore_offset, set_tile_rowstore_offset: 7, 6..=31;
        tile_streamout_offset_enable, set_tile_streamout_offset_enable: 8, 0..=0;
        tile_streamout_offset, set_tile_streamout_offset: 8, 6..=31;
        lcu_stream_out_offset_enable, set_lcu_stream_out_offset_enable: 9, 0..=0;
        tile_lcu_stream_out_offset, set_tile_lcu_stream_out_offset: 9, 6..=31;
    }
}

hw_command! {
    pub struct VdencControlState: 2 {
        default { 0 => vdenc_header(VDENC_OPCODE, 0, 11, 0) }
        vdenc_initialization, set_vdenc_initialization: 1, 1..=1;
    }
}

hw_command! {
    pub struct VdPipelineFlush: 2 {
        default { 0 => vdenc_header(VD_PIPELINE_FLUSH_OPCODE, 0, 0, 0) }
        hevc_pipeline_done, set_hevc_pipeline_done: 1, 0..=0;
        vdenc_pipeline_done, set_vdenc_pipeline_done: 1, 1..=1;
        mfl_pipeline_done, set_mfl_pipeline_done: 1, 2..=2;
        mfx_pipeline_done, set_mfx_pipeline_done: 1, 3..=3;
        vd_command_message_parser_done, set_vd_command_message_parser_done: 1, 4..=4;
        hevc_pipeline_command_flush, set_hevc_pipeline_command_flush: 1, 16..=16;
        vdenc_pipeline_command_flush, set_vdenc_pipeline_command_flush: 1, 17..=17;
        mfl_pipeline_command_flush, set_mfl_pipeline_command_flush: 1, 18..=18;
        mfx_pipeline_command_flush, set_mfx_pipeline_command_flush: 1, 19..=19;
    }
}
