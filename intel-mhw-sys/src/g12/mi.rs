//! Memory-interface (MI) commands plus the few pipeline flush/wait commands
//! the MI interface owns.

use crate::bits::field;

const fn mi_header(opcode: u32, dword_length: u32) -> u32 {
    field(29, 31, crate::COMMAND_TYPE_MI) | field(23, 28, opcode) | dword_length
}

pub const MI_OPCODE_NOOP: u32 = 0;
pub const MI_OPCODE_ARB_CHECK: u32 = 5;
pub const MI_OPCODE_BATCH_BUFFER_END: u32 = 10;
pub const MI_OPCODE_SEMAPHORE_WAIT: u32 = 28;
pub const MI_OPCODE_FORCE_WAKEUP: u32 = 29;
pub const MI_OPCODE_STORE_DATA_IMM: u32 = 32;
pub const MI_OPCODE_LOAD_REGISTER_IMM: u32 = 34;
pub const MI_OPCODE_STORE_REGISTER_MEM: u32 = 36;
pub const MI_OPCODE_FLUSH_DW: u32 = 38;
pub const MI_OPCODE_LOAD_REGISTER_MEM: u32 = 41;
pub const MI_OPCODE_LOAD_REGISTER_REG: u32 = 42;
pub const MI_OPCODE_ATOMIC: u32 = 47;
pub const MI_OPCODE_BATCH_BUFFER_START: u32 = 49;
pub const MI_OPCODE_CONDITIONAL_BATCH_BUFFER_END: u32 = 54;

hw_command! {
    pub struct MiNoop: 1 {
        default { 0 => mi_header(MI_OPCODE_NOOP, 0) }
        identification_number, set_identification_number: 0, 0..=21;
        identification_number_register_write_enable, set_identification_number_register_write_enable: 0, 22..=22;
    }
}

hw_command! {
    pub struct MiBatchBufferEnd: 1 {
        default { 0 => mi_header(MI_OPCODE_BATCH_BUFFER_END, 0) }
        end_context, set_end_context: 0, 0..=0;
    }
}

hw_command! {
    pub struct MiArbCheck: 1 {
        default { 0 => mi_header(MI_OPCODE_ARB_CHECK, 0) }
        pre_parser_disable, set_pre_parser_disable: 0, 0..=0;
        mask_bits, set_mask_bits: 0, 8..=15;
    }
}

hw_command! {
    pub struct MiLoadRegisterImm: 3 {
        default { 0 => mi_header(MI_OPCODE_LOAD_REGISTER_IMM, 1) }
        dword_length, set_dword_length: 0, 0..=7;
        byte_write_disables, set_byte_write_disables: 0, 8..=11;
        mmio_remap_enable, set_mmio_remap_enable: 0, 17..=17;
        add_cs_mmio_start_offset, set_add_cs_mmio_start_offset: 0, 19..=19;
        /// Register offset in DWord units (byte offset >> 2).
        register_offset, set_register_offset: 1, 2..=22;
        data_dword, set_data_dword: 2, 0..=31;
    }
}

hw_command! {
    pub struct MiLoadRegisterMem: 4 {
        default { 0 => mi_header(MI_OPCODE_LOAD_REGISTER_MEM, 2) }
        memory_object_control_state, set_memory_object_control_state: 0, 8..=14;
        memory_object_control_state_enable, set_memory_object_control_state_enable: 0, 15..=15;
        mmio_remap_enable, set_mmio_remap_enable: 0, 17..=17;
        add_cs_mmio_start_offset, set_add_cs_mmio_start_offset: 0, 19..=19;
        async_mode_enable, set_async_mode_enable: 0, 21..=21;
        use_global_gtt, set_use_global_gtt: 0, 22..=22;
        register_address, set_register_address: 1, 2..=22;
        memory_address, set_memory_address: 2, 2..=31;
        memory_address_high, set_memory_address_high: 3, 0..=31;
    }
}

hw_command! {
    pub struct MiLoadRegisterReg: 3 {
        default { 0 => mi_header(MI_OPCODE_LOAD_REGISTER_REG, 1) }
        mmio_remap_enable_source, set_mmio_remap_enable_source: 0, 16..=16;
        mmio_remap_enable_destination, set_mmio_remap_enable_destination: 0, 17..=17;
        add_cs_mmio_start_offset_source, set_add_cs_mmio_start_offset_source: 0, 18..=18;
        add_cs_mmio_start_offset_destination, set_add_cs_mmio_start_offset_destination: 0, 19..=19;
        source_register_address, set_source_register_address: 1, 2..=22;
        destination_register_address, set_destination_register_address: 2, 2..=22;
    }
}

hw_command! {
    pub struct MiStoreRegisterMem: 4 {
        default { 0 => mi_header(MI_OPCODE_STORE_REGISTER_MEM, 2) }
        mmio_remap_enable, set_mmio_remap_enable: 0, 17..=17;
        add_cs_mmio_start_offset, set_add_cs_mmio_start_offset: 0, 19..=19;
        predicate_enable, set_predicate_enable: 0, 21..=21;
        use_global_gtt, set_use_global_gtt: 0, 22..=22;
        register_address, set_register_address: 1, 2..=22;
        memory_address, set_memory_address: 2, 2..=31;
        memory_address_high, set_memory_address_high: 3, 0..=31;
    }
}

hw_command! {
    pub struct MiBatchBufferStart: 3 {
        default { 0 => mi_header(MI_OPCODE_BATCH_BUFFER_START, 1) }
        /// 0 = GGTT, 1 = PPGTT.
        address_space_indicator, set_address_space_indicator: 0, 8..=8;
        second_level_batch_buffer, set_second_level_batch_buffer: 0, 22..=22;
        batch_buffer_start_address, set_batch_buffer_start_address: 1, 2..=31;
        batch_buffer_start_address_high, set_batch_buffer_start_address_high: 2, 0..=15;
    }
}

hw_command! {
    pub struct MiStoreDataImm: 5 {
        default { 0 => mi_header(MI_OPCODE_STORE_DATA_IMM, 3) }
        dword_length, set_dword_length: 0, 0..=9;
        memory_object_control_state, set_memory_object_control_state: 0, 13..=19;
        memory_object_control_state_enable, set_memory_object_control_state_enable: 0, 20..=20;
        store_qword, set_store_qword: 0, 21..=21;
        use_global_gtt, set_use_global_gtt: 0, 22..=22;
        address, set_address: 1, 2..=31;
        address_high, set_address_high: 2, 0..=15;
        data_dword0, set_data_dword0: 3, 0..=31;
        data_dword1, set_data_dword1: 4, 0..=31;
    }
}

pub const FLUSH_DW_POST_SYNC_NONE: u32 = 0;
pub const FLUSH_DW_POST_SYNC_WRITE_IMMEDIATE: u32 = 1;
pub const FLUSH_DW_POST_SYNC_WRITE_TIMESTAMP: u32 = 3;

hw_command! {
    pub struct MiFlushDw: 5 {
        default { 0 => mi_header(MI_OPCODE_FLUSH_DW, 3) }
        dword_length, set_dword_length: 0, 0..=5;
        video_pipeline_cache_invalidate, set_video_pipeline_cache_invalidate: 0, 7..=7;
        notify_enable, set_notify_enable: 0, 8..=8;
        flush_llc, set_flush_llc: 0, 9..=9;
        post_sync_operation, set_post_sync_operation: 0, 14..=15;
        tlb_invalidate, set_tlb_invalidate: 0, 18..=18;
        store_data_index, set_store_data_index: 0, 21..=21;
        /// 1 = global GTT, 0 = per-process GTT.
        destination_address_type, set_destination_address_type: 1, 2..=2;
        address, set_address: 1, 3..=31;
        address_high, set_address_high: 2, 0..=15;
        immediate_data0, set_immediate_data0: 3, 0..=31;
        immediate_data1, set_immediate_data1: 4, 0..=31;
    }
}

pub const SEMAPHORE_COMPARE_SAD_GREATER_THAN_SDD: u32 = 0;
pub const SEMAPHORE_COMPARE_SAD_GREATER_THAN_OR_EQUAL_SDD: u32 = 1;
pub const SEMAPHORE_COMPARE_SAD_LESS_THAN_SDD: u32 = 2;
pub const SEMAPHORE_COMPARE_SAD_LESS_THAN_OR_EQUAL_SDD: u32 = 3;
pub const SEMAPHORE_COMPARE_SAD_EQUAL_SDD: u32 = 4;
pub const SEMAPHORE_COMPARE_SAD_NOT_EQUAL_SDD: u32 = 5;

hw_command! {
    pub struct MiSemaphoreWait: 5 {
        default { 0 => mi_header(MI_OPCODE_SEMAPHORE_WAIT, 3) }
        compare_operation, set_compare_operation: 0, 12..=14;
        /// 1 = polling, 0 = signal mode.
        wait_mode, set_wait_mode: 0, 15..=15;
        register_poll_mode, set_register_poll_mode: 0, 16..=16;
        memory_type, set_memory_type: 0, 22..=22;
        semaphore_data_dword, set_semaphore_data_dword: 1, 0..=31;
        semaphore_address, set_semaphore_address: 2, 2..=31;
        semaphore_address_high, set_semaphore_address_high: 3, 0..=31;
        wait_token_number, set_wait_token_number: 4, 5..=9;
    }
}

hw_command! {
    pub struct MiConditionalBatchBufferEnd: 4 {
        default { 0 => mi_header(MI_OPCODE_CONDITIONAL_BATCH_BUFFER_END, 2) }
        compare_operation, set_compare_operation: 0, 12..=14;
        end_current_batch_buffer_level, set_end_current_batch_buffer_level: 0, 18..=18;
        compare_mask_mode, set_compare_mask_mode: 0, 19..=19;
        compare_semaphore, set_compare_semaphore: 0, 21..=21;
        use_global_gtt, set_use_global_gtt: 0, 22..=22;
        compare_data_dword, set_compare_data_dword: 1, 0..=31;
        compare_address, set_compare_address: 2, 3..=31;
        compare_address_high, set_compare_address_high: 3, 0..=15;
    }
}

hw_command! {
    pub struct MiAtomic: 11 {
        default { 0 => mi_header(MI_OPCODE_ATOMIC, 9) }
        memory_object_control_state, set_memory_object_control_state: 0, 0..=6;
        atomic_opcode, set_atomic_opcode: 0, 8..=15;
        return_data_control, set_return_data_control: 0, 16..=16;
        cs_stall, set_cs_stall: 0, 17..=17;
        inline_data, set_inline_data: 0, 18..=18;
        data_size, set_data_size: 0, 19..=20;
        post_sync_operation, set_post_sync_operation: 0, 21..=21;
        memory_type, set_memory_type: 0, 22..=22;
        memory_address, set_memory_address: 1, 2..=31;
        memory_address_high, set_memory_address_high: 2, 0..=15;
        operand1_data_dword0, set_operand1_data_dword0: 3, 0..=31;
        operand2_data_dword0, set_operand2_data_dword0: 4, 0..=31;
        operand1_data_dword1, set_operand1_data_dword1: 5, 0..=31;
        operand2_data_dword1, set_operand2_data_dword1: 6, 0..=31;
        operand1_data_dword2, set_operand1_data_dword2: 7, 0..=31;
        operand2_data_dword2, set_operand2_data_dword2: 8, 0..=31;
        operand1_data_dword3, set_operand1_data_dword3: 9, 0..=31;
        operand2_data_dword3, set_operand2_data_dword3: 10, 0..=31;
    }
}

hw_command! {
    pub struct MiForceWakeup: 2 {
        default { 0 => mi_header(MI_OPCODE_FORCE_WAKEUP, 0) }
        force_media_slice0_awake, set_force_media_slice0_awake: 1, 0..=0;
        force_render_awake, set_force_render_awake: 1, 1..=1;
        force_media_slice1_awake, set_force_media_slice1_awake: 1, 2..=2;
        force_media_slice2_awake, set_force_media_slice2_awake: 1, 3..=3;
        force_media_slice3_awake, set_force_media_slice3_awake: 1, 4..=4;
        hevc_power_well_control, set_hevc_power_well_control: 1, 8..=8;
        mfx_power_well_control, set_mfx_power_well_control: 1, 9..=9;
        mask_bits, set_mask_bits: 1, 16..=31;
    }
}

pub const PIPE_CONTROL_POST_SYNC_NONE: u32 = 0;
pub const PIPE_CONTROL_POST_SYNC_WRITE_IMMEDIATE: u32 = 1;
pub const PIPE_CONTROL_POST_SYNC_WRITE_PS_DEPTH_COUNT: u32 = 2;
pub const PIPE_CONTROL_POST_SYNC_WRITE_TIMESTAMP: u32 = 3;

hw_command! {
    pub struct PipeControl: 6 {
        default {
            0 => field(29, 31, 3) | field(27, 28, 3) | field(24, 26, 2) | field(16, 23, 0) | 4,
        }
        hdc_pipeline_flush, set_hdc_pipeline_flush: 0, 9..=9;
        post_sync_l3_cacheability_control, set_post_sync_l3_cacheability_control: 0, 12..=12;
        depth_cache_flush_enable, set_depth_cache_flush_enable: 1, 0..=0;
        stall_at_pixel_scoreboard, set_stall_at_pixel_scoreboard: 1, 1..=1;
        state_cache_invalidation_enable, set_state_cache_invalidation_enable: 1, 2..=2;
        constant_cache_invalidation_enable, set_constant_cache_invalidation_enable: 1, 3..=3;
        vf_cache_invalidation_enable, set_vf_cache_invalidation_enable: 1, 4..=4;
        dc_flush_enable, set_dc_flush_enable: 1, 5..=5;
        pipe_control_flush_enable, set_pipe_control_flush_enable: 1, 7..=7;
        notify_enable, set_notify_enable: 1, 8..=8;
        indirect_state_pointers_disable, set_indirect_state_pointers_disable: 1, 9..=9;
        texture_cache_invalidation_enable, set_texture_cache_invalidation_enable: 1, 10..=10;
        instruction_cache_invalidate_enable, set_instruction_cache_invalidate_enable: 1, 11..=11;
        render_target_cache_flush_enable, set_render_target_cache_flush_enable: 1, 12..=12;
        depth_stall_enable, set_depth_stall_enable: 1, 13..=13;
        post_sync_operation, set_post_sync_operation: 1, 14..=15;
        generic_media_state_clear, set_generic_media_state_clear: 1, 16..=16;
        psd_sync_enable, set_psd_sync_enable: 1, 17..=17;
        tlb_invalidate, set_tlb_invalidate: 1, 18..=18;
        global_snapshot_count_reset, set_global_snapshot_count_reset: 1, 19..=19;
        command_streamer_stall_enable, set_command_streamer_stall_enable: 1, 20..=20;
        store_data_index, set_store_data_index: 1, 21..=21;
        lri_post_sync_operation, set_lri_post_sync_operation: 1, 23..=23;
        destination_address_type, set_destination_address_type: 1, 24..=24;
        amfs_flush_enable, set_amfs_flush_enable: 1, 25..=25;
        flush_llc, set_flush_llc: 1, 26..=26;
        tile_cache_flush_enable, set_tile_cache_flush_enable: 1, 28..=28;
        command_cache_invalidate_enable, set_command_cache_invalidate_enable: 1, 29..=29;
        address, set_address: 2, 2..=31;
        address_high, set_address_high: 3, 0..=31;
        immediate_data0, set_immediate_data0: 4, 0..=31;
        immediate_data1, set_immediate_data1: 5, 0..=31;
    }
}

hw_command! {
    pub struct MediaStateFlush: 2 {
        default { 0 => field(29, 31, 3) | field(27, 28, 2) | field(24, 26, 0) | field(16, 23, 4) }
        interface_descriptor_offset, set_interface_descriptor_offset: 1, 0..=5;
        flush_to_go, set_flush_to_go: 1, 7..=7;
    }
}

hw_command! {
    pub struct MfxWait: 1 {
        default { 0 => field(29, 31, 3) | field(27, 28, 1) | field(16, 26, 0) }
        dword_length, set_dword_length: 0, 0..=5;
        mfx_sync_control_flag, set_mfx_sync_control_flag: 0, 8..=8;
    }
}

pub const VD_CONTROL_STATE_COMMAND_HCP: u32 = 10;
pub const VD_CONTROL_STATE_COMMAND_VDENC: u32 = 11;
pub const VD_CONTROL_STATE_OPCODE_VDENC: u32 = 1;
pub const VD_CONTROL_STATE_OPCODE_HCP: u32 = 7;

hw_command! {
    pub struct VdControlState: 3 {
        default {
            0 => field(29, 31, 3)
                | field(27, 28, 2)
                | field(23, 26, VD_CONTROL_STATE_OPCODE_HCP)
                | field(16, 22, VD_CONTROL_STATE_COMMAND_HCP)
                | 1,
        }
        dword_length, set_dword_length: 0, 0..=11;
        media_instruction_command, set_media_instruction_command: 0, 16..=22;
        media_instruction_opcode, set_media_instruction_opcode: 0, 23..=26;
        pipeline_initialization, set_pipeline_initialization: 1, 0..=0;
        scalable_mode_pipe_lock, set_scalable_mode_pipe_lock: 2, 0..=0;
        scalable_mode_pipe_unlock, set_scalable_mode_pipe_unlock: 2, 1..=1;
        memory_implicit_flush, set_memory_implicit_flush: 2, 2..=2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HwCommand;

    #[test]
    fn header_values() {
        assert_eq!(MiNoop::default().dw[0], 0);
        assert_eq!(MiBatchBufferEnd::default().dw[0], 0x0500_0000);
        assert_eq!(MiLoadRegisterImm::default().dw[0], 0x1100_0001);
        assert_eq!(MiBatchBufferStart::default().dw[0], 0x1880_0001);
        assert_eq!(MiFlushDw::default().dw[0], 0x1300_0003);
        assert_eq!(PipeControl::default().dw[0], 0x7A00_0004);
        assert_eq!(MediaStateFlush::default().dw[0], 0x7004_0000);
        assert_eq!(MfxWait::default().dw[0], 0x6800_0000);
        assert_eq!(VdControlState::default().dw[0], 0x738A_0001);
    }

    #[test]
    fn byte_sizes() {
        assert_eq!(<MiNoop as HwCommand>::BYTE_SIZE, 4);
        assert_eq!(MiLoadRegisterImm::BYTE_SIZE, 12);
        assert_eq!(MiLoadRegisterMem::BYTE_SIZE, 16);
        assert_eq!(MiStoreRegisterMem::BYTE_SIZE, 16);
        assert_eq!(MiBatchBufferStart::BYTE_SIZE, 12);
        assert_eq!(MiStoreDataImm::BYTE_SIZE, 20);
        assert_eq!(MiFlushDw::BYTE_SIZE, 20);
        assert_eq!(MiSemaphoreWait::BYTE_SIZE, 20);
        assert_eq!(MiConditionalBatchBufferEnd::BYTE_SIZE, 16);
        assert_eq!(MiAtomic::BYTE_SIZE, 44);
        assert_eq!(MiForceWakeup::BYTE_SIZE, 8);
        assert_eq!(PipeControl::BYTE_SIZE, 24);
        assert_eq!(MediaStateFlush::BYTE_SIZE, 8);
        assert_eq!(MfxWait::BYTE_SIZE, 4);
        assert_eq!(VdControlState::BYTE_SIZE, 12);
    }

    #[test]
    fn dword_length_matches_size() {
        let lri = MiLoadRegisterImm::default();
        assert_eq!(lri.dword_length(), MiLoadRegisterImm::DWORD_LENGTH);
        let flush = MiFlushDw::default();
        assert_eq!(flush.dword_length(), MiFlushDw::DWORD_LENGTH);
    }

    #[test]
    fn register_offset_is_dword_addressed() {
        let mut lri = MiLoadRegisterImm::default();
        lri.set_register_offset(0x1C0890 >> 2);
        assert_eq!(lri.dw[1], 0x1C0890);
    }
}
