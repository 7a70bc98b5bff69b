//! Xe_HPG compute front end commands. STATE_BASE_ADDRESS and PIPELINE_SELECT keep the
//! Gen12 layout and are re-exported from there.

use crate::bits::field;

pub use crate::g12::render::{PipelineSelect, StateBaseAddress};

const COMPUTE_PIPELINE: u32 = 2;
const CFE_COMMAND_OPCODE: u32 = 2;
const CFE_SUBOPCODE_CFE_STATE: u32 = 0;
const CFE_SUBOPCODE_COMPUTE_WALKER: u32 = 2;

const fn cfe_header(sub_opcode: u32, dword_length: u32) -> u32 {
    field(29, 31, crate::COMMAND_TYPE_GFXPIPE)
        | field(27, 28, COMPUTE_PIPELINE)
        | field(24, 26, CFE_COMMAND_OPCODE)
        | field(18, 23, sub_opcode)
        | dword_length
}

pub const OVER_DISPATCH_CONTROL_NONE: u32 = 0;
pub const OVER_DISPATCH_CONTROL_LOW: u32 = 1;
pub const OVER_DISPATCH_CONTROL_NORMAL: u32 = 2;
pub const OVER_DISPATCH_CONTROL_HIGH: u32 = 3;

hw_command! {
    pub struct CfeState: 6 {
        default {
            0 => cfe_header(CFE_SUBOPCODE_CFE_STATE, 4),
            3 => field(14, 15, OVER_DISPATCH_CONTROL_NORMAL),
        }
        cfe_sub_opcode_variant, set_cfe_sub_opcode_variant: 0, 16..=17;
        /// Scratch surface state offset in 64-byte units.
        scratch_space_buffer, set_scratch_space_buffer: 1, 10..=31;
        number_of_walkers, set_number_of_walkers: 3, 3..=5;
        fused_eu_dispatch, set_fused_eu_dispatch: 3, 6..=6;
        single_slice_dispatch_ccs_mode, set_single_slice_dispatch_ccs_mode: 3, 13..=13;
        over_dispatch_control, set_over_dispatch_control: 3, 14..=15;
        /// Encoded as thread count minus one.
        maximum_number_of_threads, set_maximum_number_of_threads: 3, 16..=31;
        stop_and_drain_timer, set_stop_and_drain_timer: 4, 24..=30;
        stop_and_drain_timer_enable, set_stop_and_drain_timer_enable: 4, 31..=31;
        debug_counter_control, set_debug_counter_control: 5, 0..=1;
        debug_object_id, set_debug_object_id: 5, 8..=31;
    }
}

pub const SHARED_LOCAL_MEMORY_SIZE_0K: u32 = 0;
pub const SHARED_LOCAL_MEMORY_SIZE_1K: u32 = 1;
pub const SHARED_LOCAL_MEMORY_SIZE_2K: u32 = 2;
pub const SHARED_LOCAL_MEMORY_SIZE_4K: u32 = 3;
pub const SHARED_LOCAL_MEMORY_SIZE_8K: u32 = 4;
pub const SHARED_LOCAL_MEMORY_SIZE_16K: u32 = 5;
pub const SHARED_LOCAL_MEMORY_SIZE_32K: u32 = 6;
pub const SHARED_LOCAL_MEMORY_SIZE_64K: u32 = 7;

pub const POSTSYNC_OPERATION_NO_WRITE: u32 = 0;
pub const POSTSYNC_OPERATION_WRITE_IMMEDIATE: u32 = 1;
pub const POSTSYNC_OPERATION_WRITE_TIMESTAMP: u32 = 3;

hw_command! {
    /// COMPUTE_WALKER with its embedded interface descriptor (DW18..=25), post-sync
    /// payload (DW26..=30) and inline data (DW31..=38).
    pub struct ComputeWalker: 39 {
        default { 0 => cfe_header(CFE_SUBOPCODE_COMPUTE_WALKER, 37) }
        predicate_enable, set_predicate_enable: 0, 8..=8;
        workload_partition_enable, set_workload_partition_enable: 0, 9..=9;
        indirect_parameter_enable, set_indirect_parameter_enable: 0, 10..=10;
        systolic_mode_enable, set_systolic_mode_enable: 0, 14..=14;
        debug_object_id, set_debug_object_id: 1, 8..=31;
        indirect_data_length, set_indirect_data_length: 2, 0..=16;
        l3_prefetch_disable, set_l3_prefetch_disable: 2, 17..=17;
        partition_dispatch_parameter, set_partition_dispatch_parameter: 2, 18..=29;
        partition_type, set_partition_type: 2, 30..=31;
        indirect_data_start_address, set_indirect_data_start_address: 3, 6..=31;
        message_simd, set_message_simd: 4, 17..=18;
        tile_layout, set_tile_layout: 4, 19..=21;
        walk_order, set_walk_order: 4, 22..=24;
        emit_inline_parameter, set_emit_inline_parameter: 4, 25..=25;
        emit_local, set_emit_local: 4, 26..=28;
        generate_local_id, set_generate_local_id: 4, 29..=29;
        simd_size, set_simd_size: 4, 30..=31;
        execution_mask, set_execution_mask: 5, 0..=31;
        local_x_maximum, set_local_x_maximum: 6, 0..=9;
        local_y_maximum, set_local_y_maximum: 6, 10..=19;
        local_z_maximum, set_local_z_maximum: 6, 20..=29;
        thread_group_id_x_dimension, set_thread_group_id_x_dimension: 7, 0..=31;
        thread_group_id_y_dimension, set_thread_group_id_y_dimension: 8, 0..=31;
        thread_group_id_z_dimension, set_thread_group_id_z_dimension: 9, 0..=31;
        thread_group_id_starting_x, set_thread_group_id_starting_x: 10, 0..=31;
        thread_group_id_starting_y, set_thread_group_id_starting_y: 11, 0..=31;
        thread_group_id_starting_z, set_thread_group_id_starting_z: 12, 0..=31;
        partition_id, set_partition_id: 13, 0..=31;
        partition_size, set_partition_size: 14, 0..=31;
        preempt_x, set_preempt_x: 15, 0..=31;
        preempt_y, set_preempt_y: 16, 0..=31;
        preempt_z, set_preempt_z: 17, 0..=31;

        kernel_start_pointer, set_kernel_start_pointer: 18, 6..=31;
        software_exception_enable, set_software_exception_enable: 20, 7..=7;
        mask_stack_exception_enable, set_mask_stack_exception_enable: 20, 11..=11;
        illegal_opcode_exception_enable, set_illegal_opcode_exception_enable: 20, 13..=13;
        /// 0 = IEEE-754.
        floating_point_mode, set_floating_point_mode: 20, 16..=16;
        single_program_flow, set_single_program_flow: 20, 18..=18;
        denorm_mode, set_denorm_mode: 20, 19..=19;
        thread_preemption_disable, set_thread_preemption_disable: 20, 20..=20;
        sampler_count, set_sampler_count: 21, 2..=4;
        sampler_state_pointer, set_sampler_state_pointer: 21, 5..=31;
        binding_table_entry_count, set_binding_table_entry_count: 22, 0..=4;
        binding_table_pointer, set_binding_table_pointer: 22, 5..=20;
        number_of_threads_in_gpgpu_thread_group, set_number_of_threads_in_gpgpu_thread_group: 23, 0..=9;
        shared_local_memory_size, set_shared_local_memory_size: 23, 16..=20;
        barrier_enable, set_barrier_enable: 23, 21..=21;
        /// 0 = round to nearest even.
        rounding_mode, set_rounding_mode: 23, 22..=23;
        thread_group_dispatch_size, set_thread_group_dispatch_size: 23, 26..=27;
        btd_mode, set_btd_mode: 23, 31..=31;
        preferred_slm_allocation_size_per_subslice, set_preferred_slm_allocation_size_per_subslice: 24, 0..=3;

        postsync_operation, set_postsync_operation: 26, 0..=1;
        postsync_hdc_pipeline_flush, set_postsync_hdc_pipeline_flush: 26, 2..=2;
        postsync_l3_flush, set_postsync_l3_flush: 26, 3..=3;
        postsync_mocs, set_postsync_mocs: 26, 4..=10;
        postsync_destination_address, set_postsync_destination_address: 27, 0..=31;
        postsync_destination_address_high, set_postsync_destination_address_high: 28, 0..=31;
        postsync_immediate_data, set_postsync_immediate_data: 29, 0..=31;
        postsync_immediate_data_high, set_postsync_immediate_data_high: 30, 0..=31;
    }
}

impl ComputeWalker {
    pub const INTERFACE_DESCRIPTOR_DW: usize = 18;
    pub const POSTSYNC_DW: usize = 26;
    pub const POSTSYNC_ADDRESS_DW: u32 = 27;
    pub const INLINE_DATA_DW: usize = 31;
    pub const INLINE_DATA_DW_SIZE: usize = 8;

    pub fn inline_data(&self) -> &[u32] {
        &self.dw[Self::INLINE_DATA_DW..Self::INLINE_DATA_DW + Self::INLINE_DATA_DW_SIZE]
    }

    pub fn inline_data_mut(&mut self) -> &mut [u32] {
        &mut self.dw[Self::INLINE_DATA_DW..Self::INLINE_DATA_DW + Self::INLINE_DATA_DW_SIZE]
    }
}

hw_command! {
    pub struct StateComputeMode: 2 {
        default {
            0 => field(29, 31, 3) | field(27, 28, 0) | field(24, 26, 1) | field(16, 23, 5),
            1 => field(1, 1, 1) | field(2, 2, 1),
        }
        disable_support_for_multi_gpu_fence, set_disable_support_for_multi_gpu_fence: 1, 0..=0;
        disable_support_for_multi_gpu_atomics, set_disable_support_for_multi_gpu_atomics: 1, 1..=1;
        disable_support_multi_gpu_partial_writes, set_disable_support_multi_gpu_partial_writes: 1, 2..=2;
        force_non_coherent, set_force_non_coherent: 1, 3..=4;
        fast_clear_disabled_on_compressed_surface, set_fast_clear_disabled_on_compressed_surface: 1, 5..=5;
        disable_slm_read_merge_optimization, set_disable_slm_read_merge_optimization: 1, 6..=6;
        async_compute_thread_limit, set_async_compute_thread_limit: 1, 7..=9;
        binding_table_alignment, set_binding_table_alignment: 1, 10..=10;
        disable_atomic_on_clear_data, set_disable_atomic_on_clear_data: 1, 11..=11;
        coherent_access_l1_cache_disable, set_coherent_access_l1_cache_disable: 1, 12..=12;
        disable_l1_invalidate_for_non_l1_cacheable_writes, set_disable_l1_invalidate_for_non_l1_cacheable_writes: 1, 13..=13;
        large_grf_mode, set_large_grf_mode: 1, 15..=15;
        mask_bits, set_mask_bits: 1, 16..=31;
    }
}

hw_command! {
    pub struct BindingTablePoolAlloc: 4 {
        default { 0 => field(29, 31, 3) | field(27, 28, 3) | field(24, 26, 1) | field(16, 23, 25) | 2 }
        surface_object_control_state, set_surface_object_control_state: 1, 0..=6;
        binding_table_pool_base_address, set_binding_table_pool_base_address: 1, 12..=31;
        binding_table_pool_base_address_high, set_binding_table_pool_base_address_high: 2, 0..=31;
        binding_table_pool_buffer_size, set_binding_table_pool_buffer_size: 3, 12..=31;
    }
}

impl BindingTablePoolAlloc {
    pub const BASE_ADDRESS_DW: u32 = 1;
}
