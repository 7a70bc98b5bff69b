//! HuC (microcontroller) commands. The layout is unchanged from Gen9 through Gen12.

use crate::bits::field;

const HUC_ENGINE_OPCODE: u32 = 11;

const fn huc_header(command: u32, dword_length: u32) -> u32 {
    field(29, 31, crate::COMMAND_TYPE_PARALLEL_VIDEO_PIPE)
        | field(27, 28, 2)
        | field(23, 26, HUC_ENGINE_OPCODE)
        | field(16, 22, command)
        | dword_length
}

/// Number of regions addressable through HUC_VIRTUAL_ADDR_STATE.
pub const HUC_VIRTUAL_ADDR_REGION_NUM: usize = 16;

hw_command! {
    pub struct HucPipeModeSelect: 3 {
        default { 0 => huc_header(0, 1) }
        indirect_stream_out_enable, set_indirect_stream_out_enable: 1, 4..=4;
        huc_stream_object_enable, set_huc_stream_object_enable: 1, 10..=10;
        media_soft_reset_counter_per_1000_clocks, set_media_soft_reset_counter_per_1000_clocks: 2, 0..=31;
    }
}

hw_command! {
    pub struct HucImemState: 5 {
        default { 0 => huc_header(1, 3) }
        huc_firmware_descriptor, set_huc_firmware_descriptor: 4, 0..=7;
    }
}

hw_command! {
    pub struct HucDmemState: 6 {
        default { 0 => huc_header(2, 4) }
        huc_data_source_base_address, set_huc_data_source_base_address: 1, 6..=31;
        huc_data_source_base_address_high, set_huc_data_source_base_address_high: 2, 0..=15;
        huc_data_source_mocs, set_huc_data_source_mocs: 3, 1..=6;
        /// 64 byte aligned offset into the HuC data memory.
        huc_data_destination_base_address, set_huc_data_destination_base_address: 4, 6..=16;
        huc_data_length, set_huc_data_length: 5, 6..=16;
    }
}

impl HucDmemState {
    pub const SOURCE_BASE_DW: u32 = 1;
    pub const SOURCE_ATTRIBUTES_DW: u32 = 3;
}

hw_command! {
    /// Sixteen regions of three DWords each: low address, high address, attributes.
    pub struct HucVirtualAddrState: 49 {
        default { 0 => huc_header(4, 47) }
    }
}

impl HucVirtualAddrState {
    pub const REGION_DW_SIZE: usize = 3;

    /// DWord index of the low address of `region`.
    pub const fn region_address_dw(region: usize) -> usize {
        1 + region * Self::REGION_DW_SIZE
    }

    pub const fn region_attributes_dw(region: usize) -> usize {
        Self::region_address_dw(region) + 2
    }

    pub fn region_mocs(&self, region: usize) -> u32 {
        crate::bits::get(self.dw[Self::region_attributes_dw(region)], 1, 6)
    }

    pub fn set_region_mocs(&mut self, region: usize, mocs: u32) {
        crate::bits::set(&mut self.dw[Self::region_attributes_dw(region)], 1, 6, mocs)
    }
}

hw_command! {
    pub struct HucIndObjBaseAddrState: 11 {
        default { 0 => huc_header(5, 9) }
        huc_indirect_stream_in_object_base_address, set_huc_indirect_stream_in_object_base_address: 1, 12..=31;
        huc_indirect_stream_in_object_base_address_high, set_huc_indirect_stream_in_object_base_address_high: 2, 0..=15;
        huc_indirect_stream_in_object_mocs, set_huc_indirect_stream_in_object_mocs: 3, 1..=6;
        huc_indirect_stream_in_object_access_upper_bound, set_huc_indirect_stream_in_object_access_upper_bound: 4, 12..=31;
        huc_indirect_stream_out_object_base_address, set_huc_indirect_stream_out_object_base_address: 6, 12..=31;
        huc_indirect_stream_out_object_mocs, set_huc_indirect_stream_out_object_mocs: 8, 1..=6;
        huc_indirect_stream_out_object_access_upper_bound, set_huc_indirect_stream_out_object_access_upper_bound: 9, 12..=31;
    }
}

impl HucIndObjBaseAddrState {
    pub const STREAM_IN_DW: u32 = 1;
    pub const STREAM_OUT_DW: u32 = 6;
    pub const UPPER_BOUND_OFFSET: u32 = 3;
}

hw_command! {
    pub struct HucStreamObject: 5 {
        default { 0 => huc_header(32, 3) }
        indirect_stream_in_data_length, set_indirect_stream_in_data_length: 1, 0..=31;
        indirect_stream_in_start_address, set_indirect_stream_in_start_address: 2, 0..=28;
        huc_processing, set_huc_processing: 2, 31..=31;
        indirect_stream_out_start_address, set_indirect_stream_out_start_address: 3, 0..=28;
        start_code_byte0, set_start_code_byte0: 4, 0..=7;
        start_code_byte1, set_start_code_byte1: 4, 8..=15;
        start_code_byte2, set_start_code_byte2: 4, 16..=23;
        start_code_search_engine, set_start_code_search_engine: 4, 24..=24;
        emulation_prevention_byte_removal, set_emulation_prevention_byte_removal: 4, 25..=25;
        stream_out, set_stream_out: 4, 26..=26;
        drm_length_mode, set_drm_length_mode: 4, 27..=28;
        huc_bitstream_enable, set_huc_bitstream_enable: 4, 29..=29;
    }
}

hw_command! {
    pub struct HucStart: 2 {
        default { 0 => huc_header(33, 0) }
        last_stream_object, set_last_stream_object: 1, 0..=0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_values() {
        assert_eq!(HucPipeModeSelect::default().dw[0], 0x7580_0001);
        assert_eq!(HucImemState::default().dw[0], 0x7581_0003);
        assert_eq!(HucDmemState::default().dw[0], 0x7582_0004);
        assert_eq!(HucIndObjBaseAddrState::default().dw[0], 0x7585_0009);
        assert_eq!(HucVirtualAddrState::default().dw[0], 0x7584_002F);
        assert_eq!(HucStreamObject::default().dw[0], 0x75A0_0003);
        assert_eq!(HucStart::default().dw[0], 0x75A1_0000);
    }

    #[test]
    fn byte_sizes() {
        assert_eq!(HucPipeModeSelect::BYTE_SIZE, 12);
        assert_eq!(HucImemState::BYTE_SIZE, 20);
        assert_eq!(HucDmemState::BYTE_SIZE, 24);
        assert_eq!(HucVirtualAddrState::BYTE_SIZE, 196);
        assert_eq!(HucStreamObject::BYTE_SIZE, 20);
        assert_eq!(HucStart::BYTE_SIZE, 8);
    }

    #[test]
    fn virtual_addr_regions() {
        assert_eq!(HucVirtualAddrState::region_address_dw(0), 1);
        assert_eq!(HucVirtualAddrState::region_attributes_dw(15), 48);

        let mut cmd = HucVirtualAddrState::default();
        cmd.set_region_mocs(15, 0x3);
        assert_eq!(cmd.dw[48], 0x3 << 1);
        assert_eq!(cmd.region_mocs(15), 3);
    }

    #[test]
    fn start_code_fields() {
        let mut cmd = HucStreamObject::default();
        cmd.set_start_code_byte2(1);
        cmd.set_start_code_search_engine(1);
        cmd.set_huc_bitstream_enable(1);
        assert_eq!(cmd.dw[4], (1 << 16) | (1 << 24) | (1 << 29));
    }
}
