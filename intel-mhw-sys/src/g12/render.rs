//! Gen12 render/media pipeline state commands.

use crate::bits::field;

const fn gfx_header(subtype: u32, opcode: u32, sub_opcode: u32, dword_length: u32) -> u32 {
    field(29, 31, crate::COMMAND_TYPE_GFXPIPE)
        | field(27, 28, subtype)
        | field(24, 26, opcode)
        | field(16, 23, sub_opcode)
        | dword_length
}

pub const PIPELINE_SELECTION_3D: u32 = 0;
pub const PIPELINE_SELECTION_MEDIA: u32 = 1;
pub const PIPELINE_SELECTION_GPGPU: u32 = 2;

hw_command! {
    /// STATE_BASE_ADDRESS. Base addresses are 4KB aligned and patched through relocations,
    /// sizes are in pages.
    pub struct StateBaseAddress: 22 {
        default { 0 => gfx_header(0, 1, 1, 20) }
        general_state_base_address_modify_enable, set_general_state_base_address_modify_enable: 1, 0..=0;
        general_state_memory_object_control_state, set_general_state_memory_object_control_state: 1, 4..=10;
        general_state_base_address, set_general_state_base_address: 1, 12..=31;
        general_state_base_address_high, set_general_state_base_address_high: 2, 0..=31;
        stateless_data_port_access_memory_object_control_state, set_stateless_data_port_access_memory_object_control_state: 3, 16..=22;
        surface_state_base_address_modify_enable, set_surface_state_base_address_modify_enable: 4, 0..=0;
        surface_state_memory_object_control_state, set_surface_state_memory_object_control_state: 4, 4..=10;
        surface_state_base_address, set_surface_state_base_address: 4, 12..=31;
        surface_state_base_address_high, set_surface_state_base_address_high: 5, 0..=31;
        dynamic_state_base_address_modify_enable, set_dynamic_state_base_address_modify_enable: 6, 0..=0;
        dynamic_state_memory_object_control_state, set_dynamic_state_memory_object_control_state: 6, 4..=10;
        dynamic_state_base_address, set_dynamic_state_base_address: 6, 12..=31;
        dynamic_state_base_address_high, set_dynamic_state_base_address_high: 7, 0..=31;
        indirect_object_base_address_modify_enable, set_indirect_object_base_address_modify_enable: 8, 0..=0;
        indirect_object_memory_object_control_state, set_indirect_object_memory_object_control_state: 8, 4..=10;
        indirect_object_base_address, set_indirect_object_base_address: 8, 12..=31;
        indirect_object_base_address_high, set_indirect_object_base_address_high: 9, 0..=31;
        instruction_base_address_modify_enable, set_instruction_base_address_modify_enable: 10, 0..=0;
        instruction_memory_object_control_state, set_instruction_memory_object_control_state: 10, 4..=10;
        instruction_base_address, set_instruction_base_address: 10, 12..=31;
        instruction_base_address_high, set_instruction_base_address_high: 11, 0..=31;
        general_state_buffer_size_modify_enable, set_general_state_buffer_size_modify_enable: 12, 0..=0;
        general_state_buffer_size, set_general_state_buffer_size: 12, 12..=31;
        dynamic_state_buffer_size_modify_enable, set_dynamic_state_buffer_size_modify_enable: 13, 0..=0;
        dynamic_state_buffer_size, set_dynamic_state_buffer_size: 13, 12..=31;
        indirect_object_buffer_size_modify_enable, set_indirect_object_buffer_size_modify_enable: 14, 0..=0;
        indirect_object_buffer_size, set_indirect_object_buffer_size: 14, 12..=31;
        instruction_buffer_size_modify_enable, set_instruction_buffer_size_modify_enable: 15, 0..=0;
        instruction_buffer_size, set_instruction_buffer_size: 15, 12..=31;
        bindless_surface_state_base_address_modify_enable, set_bindless_surface_state_base_address_modify_enable: 16, 0..=0;
        bindless_surface_state_memory_object_control_state, set_bindless_surface_state_memory_object_control_state: 16, 4..=10;
        bindless_surface_state_base_address, set_bindless_surface_state_base_address: 16, 12..=31;
        bindless_surface_state_base_address_high, set_bindless_surface_state_base_address_high: 17, 0..=31;
        bindless_surface_state_size, set_bindless_surface_state_size: 18, 12..=31;
        bindless_sampler_state_base_address_modify_enable, set_bindless_sampler_state_base_address_modify_enable: 19, 0..=0;
        bindless_sampler_state_memory_object_control_state, set_bindless_sampler_state_memory_object_control_state: 19, 4..=10;
        bindless_sampler_state_base_address, set_bindless_sampler_state_base_address: 19, 12..=31;
        bindless_sampler_state_base_address_high, set_bindless_sampler_state_base_address_high: 20, 0..=31;
        bindless_sampler_state_buffer_size, set_bindless_sampler_state_buffer_size: 21, 12..=31;
    }
}

impl StateBaseAddress {
    pub const GENERAL_STATE_BASE_DW: u32 = 1;
    pub const SURFACE_STATE_BASE_DW: u32 = 4;
    pub const DYNAMIC_STATE_BASE_DW: u32 = 6;
    pub const INDIRECT_OBJECT_BASE_DW: u32 = 8;
    pub const INSTRUCTION_BASE_DW: u32 = 10;
    pub const BINDLESS_SURFACE_BASE_DW: u32 = 16;
    /// Base address fields store bits 12 and up.
    pub const BASE_ADDRESS_SHIFT: u32 = 12;
}

pub const VFE_FUSED_EU_DISPATCH_FUSED: u32 = 0;
pub const VFE_FUSED_EU_DISPATCH_LEGACY: u32 = 1;

hw_command! {
    pub struct MediaVfeState: 9 {
        default { 0 => gfx_header(2, 0, 0, 7) }
        per_thread_scratch_space, set_per_thread_scratch_space: 1, 0..=3;
        stack_size, set_stack_size: 1, 4..=7;
        scratch_space_base_pointer, set_scratch_space_base_pointer: 1, 10..=31;
        scratch_space_base_pointer_high, set_scratch_space_base_pointer_high: 2, 0..=15;
        dispatch_load_balance, set_dispatch_load_balance: 3, 2..=2;
        fused_eu_dispatch, set_fused_eu_dispatch: 3, 6..=6;
        number_of_urb_entries, set_number_of_urb_entries: 3, 8..=15;
        /// Encoded as thread count minus one.
        maximum_number_of_threads, set_maximum_number_of_threads: 3, 16..=31;
        maximum_number_of_dual_subslices, set_maximum_number_of_dual_subslices: 4, 0..=7;
        curbe_allocation_size, set_curbe_allocation_size: 5, 0..=15;
        urb_entry_allocation_size, set_urb_entry_allocation_size: 5, 16..=31;
    }
}

pub const SIMD_SIZE_SIMD8: u32 = 0;
pub const SIMD_SIZE_SIMD16: u32 = 1;
pub const SIMD_SIZE_SIMD32: u32 = 2;

hw_command! {
    pub struct GpgpuWalker: 15 {
        default { 0 => gfx_header(2, 1, 5, 13) }
        predicate_enable, set_predicate_enable: 0, 8..=8;
        indirect_parameter_enable, set_indirect_parameter_enable: 0, 10..=10;
        interface_descriptor_offset, set_interface_descriptor_offset: 1, 0..=5;
        indirect_data_length, set_indirect_data_length: 2, 0..=16;
        indirect_data_start_address, set_indirect_data_start_address: 3, 6..=31;
        thread_width_counter_maximum, set_thread_width_counter_maximum: 4, 0..=5;
        thread_height_counter_maximum, set_thread_height_counter_maximum: 4, 8..=13;
        thread_depth_counter_maximum, set_thread_depth_counter_maximum: 4, 16..=21;
        simd_size, set_simd_size: 4, 30..=31;
        thread_group_id_starting_x, set_thread_group_id_starting_x: 5, 0..=31;
        thread_group_id_x_dimension, set_thread_group_id_x_dimension: 7, 0..=31;
        thread_group_id_starting_y, set_thread_group_id_starting_y: 8, 0..=31;
        thread_group_id_y_dimension, set_thread_group_id_y_dimension: 10, 0..=31;
        thread_group_id_starting_resume_z, set_thread_group_id_starting_resume_z: 11, 0..=31;
        thread_group_id_z_dimension, set_thread_group_id_z_dimension: 12, 0..=31;
        right_execution_mask, set_right_execution_mask: 13, 0..=31;
        bottom_execution_mask, set_bottom_execution_mask: 14, 0..=31;
    }
}

hw_command! {
    pub struct MediaCurbeLoad: 4 {
        default { 0 => gfx_header(2, 0, 1, 2) }
        curbe_total_data_length, set_curbe_total_data_length: 2, 0..=16;
        curbe_data_start_address, set_curbe_data_start_address: 3, 0..=31;
    }
}

hw_command! {
    pub struct MediaInterfaceDescriptorLoad: 4 {
        default { 0 => gfx_header(2, 0, 2, 2) }
        interface_descriptor_total_length, set_interface_descriptor_total_length: 2, 0..=16;
        interface_descriptor_data_start_address, set_interface_descriptor_data_start_address: 3, 0..=31;
    }
}

hw_command! {
    pub struct PipelineSelect: 1 {
        default { 0 => gfx_header(1, 1, 4, 0) }
        pipeline_selection, set_pipeline_selection: 0, 0..=1;
        render_slice_common_power_gate_enable, set_render_slice_common_power_gate_enable: 0, 2..=2;
        render_sampler_power_gate_enable, set_render_sampler_power_gate_enable: 0, 3..=3;
        media_sampler_dop_clock_gate_enable, set_media_sampler_dop_clock_gate_enable: 0, 4..=4;
        force_media_awake, set_force_media_awake: 0, 5..=5;
        media_sampler_power_clock_gate_disable, set_media_sampler_power_clock_gate_disable: 0, 6..=6;
        mask_bits, set_mask_bits: 0, 8..=15;
    }
}

hw_command! {
    pub struct StateSip: 3 {
        default { 0 => gfx_header(0, 1, 2, 1) }
        system_instruction_pointer, set_system_instruction_pointer: 1, 4..=31;
        system_instruction_pointer_high, set_system_instruction_pointer_high: 2, 0..=31;
    }
}
