use std::sync::Arc;

use intel_mhw_sys::{g9::huc::*, HwCommand};
use tracing::{debug, trace, warn};

use super::BsdParams;
use crate::{
    caps::HwCaps,
    cmdbuffer::CommandBuffer,
    constants::MocsUsage,
    os::{GpuResource, OsInterface},
    resource::{add_resource_to_cmd, ResourceParams, MOCS_ATTRIBUTE_LSB},
    utils::align_up,
    MhwStatus,
};

/// HuC data memory is written in 64 byte units.
pub const HUC_DMEM_ALIGNMENT: u32 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HucPipeModeSelectParams {
    pub stream_out: bool,
    pub stream_object: bool,
    pub media_soft_reset_counter: u32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HucDmemParams<'a> {
    pub data_source: Option<&'a GpuResource>,
    pub data_source_offset: u32,
    /// Byte length, rounded up to [`HUC_DMEM_ALIGNMENT`].
    pub data_length: u32,
    /// Byte offset into HuC data memory. Must be 64 byte aligned.
    pub dmem_offset: u32,
}

/// One HUC_VIRTUAL_ADDR_STATE region.
#[derive(Debug, Clone, Copy)]
pub struct HucRegion<'a> {
    pub resource: &'a GpuResource,
    pub offset: u32,
    pub writable: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HucVirtualAddrParams<'a> {
    pub regions: [Option<HucRegion<'a>>; HUC_VIRTUAL_ADDR_REGION_NUM],
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HucIndObjParams<'a> {
    pub stream_in: Option<&'a GpuResource>,
    pub stream_in_offset: u32,
    pub stream_in_size: u32,
    pub stream_out: Option<&'a GpuResource>,
    pub stream_out_offset: u32,
    pub stream_out_size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HucStreamObjectParams {
    pub stream_in: BsdParams,
    pub stream_out_start: u32,
    pub huc_processing: bool,
    pub start_code: Option<[u8; 3]>,
    pub emulation_prevention_byte_removal: bool,
    pub stream_out: bool,
    pub drm_length_mode: u32,
    pub huc_bitstream: bool,
}

/// HuC microcontroller commands. The layout is shared by every supported generation.
pub struct HucInterface {
    os: Arc<dyn OsInterface>,
    caps: &'static HwCaps,
}

impl std::fmt::Debug for HucInterface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HucInterface").field("family", &self.caps.family).finish()
    }
}

impl HucInterface {
    #[tracing::instrument(skip(os, caps), fields(family = ?caps.family))]
    pub fn new(os: Arc<dyn OsInterface>, caps: &'static HwCaps) -> Self {
        debug!("HuC interface created");
        Self { os, caps }
    }

    pub fn add_huc_pipe_mode_select(
        &self,
        buffer: &mut CommandBuffer,
        params: &HucPipeModeSelectParams,
    ) -> Result<(), MhwStatus> {
        let mut cmd = HucPipeModeSelect::default();
        cmd.set_indirect_stream_out_enable(params.stream_out as u32);
        cmd.set_huc_stream_object_enable(params.stream_object as u32);
        cmd.set_media_soft_reset_counter_per_1000_clocks(params.media_soft_reset_counter);
        buffer.append_command(&cmd)
    }

    /// Selects the firmware the HuC runs.
    pub fn add_huc_imem_state(&self, buffer: &mut CommandBuffer, firmware_descriptor: u32) -> Result<(), MhwStatus> {
        if firmware_descriptor > 0xFF {
            return Err(MhwStatus::InvalidParameter);
        }
        let mut cmd = HucImemState::default();
        cmd.set_huc_firmware_descriptor(firmware_descriptor);
        buffer.append_command(&cmd)
    }

    pub fn add_huc_dmem_state(&self, buffer: &mut CommandBuffer, params: &HucDmemParams) -> Result<(), MhwStatus> {
        if params.dmem_offset % HUC_DMEM_ALIGNMENT != 0 {
            return Err(MhwStatus::InvalidParameter);
        }
        let length = align_up(params.data_length, HUC_DMEM_ALIGNMENT);
        if length == 0 {
            return Err(MhwStatus::InvalidParameter);
        }

        let mut cmd = HucDmemState::default();
        let mut relocs = Vec::new();
        let res = ResourceParams::new(params.data_source, HucDmemState::SOURCE_BASE_DW)
            .with_offset(params.data_source_offset)
            .with_lsb(6)
            .with_mocs(
                (HucDmemState::SOURCE_ATTRIBUTES_DW - HucDmemState::SOURCE_BASE_DW) as i32,
                MOCS_ATTRIBUTE_LSB,
                self.caps.mocs_index(MocsUsage::HucData),
            );
        add_resource_to_cmd(self.os.as_ref(), cmd.as_dwords_mut(), &mut relocs, &res)?;

        cmd.set_huc_data_destination_base_address(params.dmem_offset >> 6);
        cmd.set_huc_data_length(length >> 6);
        if length != params.data_length {
            trace!(requested = params.data_length, length, "HuC DMEM length rounded");
        }
        buffer.append_command_relocated(&cmd, relocs)
    }

    /// Unset regions stay zero.
    pub fn add_huc_virtual_addr_state(
        &self,
        buffer: &mut CommandBuffer,
        params: &HucVirtualAddrParams,
    ) -> Result<(), MhwStatus> {
        let mocs = self.caps.mocs_index(MocsUsage::HucData);
        let mut cmd = HucVirtualAddrState::default();
        let mut relocs = Vec::new();

        for (index, region) in params.regions.iter().enumerate() {
            let Some(region) = region else { continue };
            let res = ResourceParams::new(
                Some(region.resource),
                HucVirtualAddrState::region_address_dw(index) as u32,
            )
            .with_offset(region.offset)
            .with_lsb(12)
            .writable(region.writable);
            add_resource_to_cmd(self.os.as_ref(), cmd.as_dwords_mut(), &mut relocs, &res)?;
            cmd.set_region_mocs(index, mocs);
        }

        if relocs.is_empty() {
            warn!("HUC_VIRTUAL_ADDR_STATE without any region");
        }
        buffer.append_command_relocated(&cmd, relocs)
    }

    pub fn add_huc_ind_obj_base_addr(
        &self,
        buffer: &mut CommandBuffer,
        params: &HucIndObjParams,
    ) -> Result<(), MhwStatus> {
        let mocs = self.caps.mocs_index(MocsUsage::Bitstream);
        let os = self.os.as_ref();
        let mut cmd = HucIndObjBaseAddrState::default();
        let mut relocs = Vec::new();

        if params.stream_in.is_some() {
            let res = ResourceParams::new(params.stream_in, HucIndObjBaseAddrState::STREAM_IN_DW)
                .with_offset(params.stream_in_offset)
                .with_lsb(12)
                .with_upper_bound(HucIndObjBaseAddrState::UPPER_BOUND_OFFSET, params.stream_in_size)
                .with_mocs(2, MOCS_ATTRIBUTE_LSB, mocs);
            add_resource_to_cmd(os, cmd.as_dwords_mut(), &mut relocs, &res)?;
        }
        if params.stream_out.is_some() {
            let res = ResourceParams::new(params.stream_out, HucIndObjBaseAddrState::STREAM_OUT_DW)
                .with_offset(params.stream_out_offset)
                .with_lsb(12)
                .writable(true)
                .with_upper_bound(HucIndObjBaseAddrState::UPPER_BOUND_OFFSET, params.stream_out_size)
                .with_mocs(2, MOCS_ATTRIBUTE_LSB, mocs);
            add_resource_to_cmd(os, cmd.as_dwords_mut(), &mut relocs, &res)?;
        }
        buffer.append_command_relocated(&cmd, relocs)
    }

    pub fn add_huc_stream_object(
        &self,
        buffer: &mut CommandBuffer,
        params: &HucStreamObjectParams,
    ) -> Result<(), MhwStatus> {
        let mut cmd = HucStreamObject::default();
        cmd.set_indirect_stream_in_data_length(params.stream_in.data_length);
        cmd.set_indirect_stream_in_start_address(params.stream_in.data_offset);
        cmd.set_huc_processing(params.huc_processing as u32);
        cmd.set_indirect_stream_out_start_address(params.stream_out_start);
        if let Some([b0, b1, b2]) = params.start_code {
            cmd.set_start_code_byte0(b0 as u32);
            cmd.set_start_code_byte1(b1 as u32);
            cmd.set_start_code_byte2(b2 as u32);
            cmd.set_start_code_search_engine(1);
        }
        cmd.set_emulation_prevention_byte_removal(params.emulation_prevention_byte_removal as u32);
        cmd.set_stream_out(params.stream_out as u32);
        cmd.set_drm_length_mode(params.drm_length_mode);
        cmd.set_huc_bitstream_enable(params.huc_bitstream as u32);
        buffer.append_command(&cmd)
    }

    pub fn add_huc_start(&self, buffer: &mut CommandBuffer, last_stream_object: bool) -> Result<(), MhwStatus> {
        let mut cmd = HucStart::default();
        cmd.set_last_stream_object(last_stream_object as u32);
        buffer.append_command(&cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{caps::caps_for, constants::ProductFamily, os::MockOs};

    fn setup() -> (Arc<MockOs>, HucInterface) {
        let os = Arc::new(MockOs::new());
        let huc = HucInterface::new(os.clone(), caps_for(ProductFamily::TigerlakeLp).unwrap());
        (os, huc)
    }

    #[test]
    fn dmem_length_is_rounded_to_64_bytes() {
        let (os, huc) = setup();
        let data = os.allocate_resource(0x1000, "dmem").unwrap();
        let mut buffer = CommandBuffer::new(64);
        huc.add_huc_dmem_state(
            &mut buffer,
            &HucDmemParams {
                data_source: Some(&data),
                data_length: 100,
                dmem_offset: 0x2000,
                ..Default::default()
            },
        )
        .unwrap();

        let cmd = HucDmemState {
            dw: buffer.dwords().try_into().unwrap(),
        };
        assert_eq!(cmd.huc_data_length(), 2);
        assert_eq!(cmd.huc_data_destination_base_address(), 0x2000 >> 6);
        assert_eq!(cmd.huc_data_source_mocs(), huc.caps.mocs_index(MocsUsage::HucData));
        assert_eq!(buffer.relocations()[0].lsb_num, 6);
    }

    #[test]
    fn dmem_offset_must_be_aligned() {
        let (os, huc) = setup();
        let data = os.allocate_resource(0x1000, "dmem").unwrap();
        let mut buffer = CommandBuffer::new(64);
        let params = HucDmemParams {
            data_source: Some(&data),
            data_length: 64,
            dmem_offset: 0x20,
            ..Default::default()
        };
        assert_eq!(huc.add_huc_dmem_state(&mut buffer, &params), Err(MhwStatus::InvalidParameter));
        assert_eq!(
            huc.add_huc_dmem_state(&mut buffer, &HucDmemParams { data_length: 64, ..Default::default() }),
            Err(MhwStatus::NullPointer)
        );
        assert_eq!(buffer.offset(), 0);
    }

    #[test]
    fn virtual_addr_regions_are_sparse() {
        let (os, huc) = setup();
        let a = os.allocate_resource(0x1000, "region 0").unwrap();
        let b = os.allocate_resource(0x1000, "region 15").unwrap();
        let mut params = HucVirtualAddrParams::default();
        params.regions[0] = Some(HucRegion {
            resource: &a,
            offset: 0,
            writable: false,
        });
        params.regions[15] = Some(HucRegion {
            resource: &b,
            offset: 0,
            writable: true,
        });

        let mut buffer = CommandBuffer::new(256);
        huc.add_huc_virtual_addr_state(&mut buffer, &params).unwrap();
        let cmd = HucVirtualAddrState {
            dw: buffer.dwords().try_into().unwrap(),
        };
        let relocs = buffer.relocations();
        assert_eq!(relocs.len(), 2);
        assert_eq!(relocs[1].dw_index, 46);
        assert!(relocs[1].writable);
        assert_eq!(cmd.region_mocs(15), huc.caps.mocs_index(MocsUsage::HucData));
        assert_eq!(cmd.dw[HucVirtualAddrState::region_address_dw(7)], 0);
    }

    #[test]
    fn imem_descriptor_range() {
        let (_, huc) = setup();
        let mut buffer = CommandBuffer::new(64);
        huc.add_huc_imem_state(&mut buffer, 6).unwrap();
        assert_eq!(
            huc.add_huc_imem_state(&mut buffer, 0x100),
            Err(MhwStatus::InvalidParameter)
        );
        assert_eq!(buffer.offset(), HucImemState::BYTE_SIZE);
    }

    #[test]
    fn stream_object_with_start_code() {
        let (_, huc) = setup();
        let mut buffer = CommandBuffer::new(64);
        let params = HucStreamObjectParams {
            stream_in: BsdParams {
                data_length: 0x400,
                data_offset: 0x40,
            },
            start_code: Some([0, 0, 1]),
            huc_bitstream: true,
            ..Default::default()
        };
        huc.add_huc_stream_object(&mut buffer, &params).unwrap();
        huc.add_huc_start(&mut buffer, true).unwrap();

        let dw = buffer.dwords();
        assert_eq!(dw[1], 0x400);
        assert_eq!(dw[4], (1 << 16) | (1 << 24) | (1 << 29));
        assert_eq!(dw[6], 1);
    }
}
