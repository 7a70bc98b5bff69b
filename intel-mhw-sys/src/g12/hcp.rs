//! HCP (HEVC/VP9 codec pipe) commands.

use crate::bits::field;

const HCP_ENGINE_OPCODE: u32 = 7;

const fn hcp_header(command: u32, dword_length: u32) -> u32 {
    field(29, 31, crate::COMMAND_TYPE_PARALLEL_VIDEO_PIPE)
        | field(27, 28, 2)
        | field(23, 26, HCP_ENGINE_OPCODE)
        | field(16, 22, command)
        | dword_length
}

pub const CODEC_STANDARD_SELECT_HEVC: u32 = 0;
pub const CODEC_STANDARD_SELECT_VP9: u32 = 1;

pub const MULTI_ENGINE_MODE_SINGLE: u32 = 0;
pub const MULTI_ENGINE_MODE_LEFT: u32 = 1;
pub const MULTI_ENGINE_MODE_RIGHT: u32 = 2;
pub const MULTI_ENGINE_MODE_MIDDLE: u32 = 3;

pub const PIPE_WORKING_MODE_LEGACY: u32 = 0;
pub const PIPE_WORKING_MODE_CABAC_FE_ONLY: u32 = 1;
pub const PIPE_WORKING_MODE_DECODER_BE_ONLY: u32 = 2;
pub const PIPE_WORKING_MODE_REAL_TILES: u32 = 3;

hw_command! {
    pub struct HcpPipeModeSelect: 7 {
        default { 0 => hcp_header(0, 5) }
        codec_select, set_codec_select: 1, 0..=0;
        deblocker_streamout_enable, set_deblocker_streamout_enable: 1, 1..=1;
        pak_pipeline_streamout_enable, set_pak_pipeline_streamout_enable: 1, 2..=2;
        pic_status_error_report_enable, set_pic_status_error_report_enable: 1, 3..=3;
        codec_standard_select, set_codec_standard_select: 1, 5..=7;
        advanced_rate_control_enable, set_advanced_rate_control_enable: 1, 9..=9;
        vdenc_mode, set_vdenc_mode: 1, 10..=10;
        rdoq_enabled_flag, set_rdoq_enabled_flag: 1, 11..=11;
        pak_frame_level_streamout_enable, set_pak_frame_level_streamout_enable: 1, 12..=12;
        multi_engine_mode, set_multi_engine_mode: 1, 13..=14;
        pipe_working_mode, set_pipe_working_mode: 1, 15..=16;
        tile_based_engine, set_tile_based_engine: 1, 17..=17;
        prefetch_disable, set_prefetch_disable: 1, 18..=18;
        vp9_dynamic_scaling_enable, set_vp9_dynamic_scaling_enable: 1, 19..=19;
        motion_comp_memory_tracker_cntl_enable, set_motion_comp_memory_tracker_cntl_enable: 1, 23..=23;
        media_soft_reset_counter_per_1000_clocks, set_media_soft_reset_counter_per_1000_clocks: 2, 0..=31;
        pic_status_error_report_id, set_pic_status_error_report_id: 3, 0..=31;
        phase_indicator, set_phase_indicator: 6, 0..=1;
        hevc_separate_tile_programming, set_hevc_separate_tile_programming: 6, 2..=2;
        frame_reconstruction_disable, set_frame_reconstruction_disable: 6, 3..=3;
    }
}

pub const HCP_SURFACE_ID_DECODED_PICTURE: u32 = 0;
pub const HCP_SURFACE_ID_SOURCE_INPUT: u32 = 1;
pub const HCP_SURFACE_ID_PREV_REFERENCE: u32 = 2;
pub const HCP_SURFACE_ID_GOLDEN_REFERENCE: u32 = 3;
pub const HCP_SURFACE_ID_ALTREF_REFERENCE: u32 = 4;

pub const HCP_SURFACE_FORMAT_PLANAR_420_8: u32 = 4;
pub const HCP_SURFACE_FORMAT_YUY2: u32 = 5;
pub const HCP_SURFACE_FORMAT_AYUV: u32 = 9;
pub const HCP_SURFACE_FORMAT_P010: u32 = 13;
pub const HCP_SURFACE_FORMAT_Y210: u32 = 14;
pub const HCP_SURFACE_FORMAT_Y410: u32 = 16;
pub const HCP_SURFACE_FORMAT_P016: u32 = 19;

hw_command! {
    pub struct HcpSurfaceState: 5 {
        default { 0 => hcp_header(1, 3) }
        surface_pitch_minus1, set_surface_pitch_minus1: 1, 0..=16;
        surface_id, set_surface_id: 1, 28..=31;
        y_offset_for_u_cb, set_y_offset_for_u_cb: 2, 0..=14;
        surface_format, set_surface_format: 2, 27..=31;
        default_alpha_value, set_default_alpha_value: 3, 0..=15;
        y_offset_for_v_cr, set_y_offset_for_v_cr: 3, 16..=31;
        memory_compression_enable, set_memory_compression_enable: 4, 0..=7;
        compression_type, set_compression_type: 4, 8..=15;
    }
}

hw_command! {
    pub struct HcpBsdObject: 3 {
        default { 0 => hcp_header(0x20, 1) }
        indirect_bsd_data_length, set_indirect_bsd_data_length: 1, 0..=31;
        indirect_data_start_address, set_indirect_data_start_address: 2, 0..=28;
    }
}
