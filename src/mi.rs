//! Memory-interface commands, pipeline flushes and the generic submission prolog.

use std::sync::Arc;

use intel_mhw_sys::{
    g12::mi::*,
    HwCommand,
};
use tracing::{debug, warn};

use crate::{
    caps::HwCaps,
    cmdbuffer::{add_command_cmd_or_bb, BatchBuffer, CommandBuffer},
    constants::{EngineClass, FlushMode, MocsUsage, PipeControlFlags},
    os::{GpuResource, OsInterface},
    resource::{add_resource_to_cmd, ResourceParams},
    MhwStatus,
};

/// Base of the first VDBOX register block.
pub const VDBOX0_MMIO_BASE: u32 = 0x1C_0000;
/// Distance between consecutive VDBOX register blocks.
pub const VDBOX_MMIO_STRIDE: u32 = 0x1_0000;
pub const MAX_VDBOX: u32 = 4;
/// Base of the render command streamer registers.
pub const RENDER_MMIO_BASE: u32 = 0x2000;

/// Low address bits the hardware reserves for control fields, per command.
pub const FLUSH_DW_ADDRESS_SHIFT: u32 = 3;
pub const PIPE_CONTROL_ADDRESS_SHIFT: u32 = 3;
pub const CONDITIONAL_BATCH_BUFFER_END_ADDRESS_SHIFT: u32 = 3;

/// Registers the encode/decode status paths read back through MI_STORE_REGISTER_MEM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MmioRegisters {
    pub general_purpose_register0_lo: u32,
    pub general_purpose_register0_hi: u32,
    pub general_purpose_register4_lo: u32,
    pub general_purpose_register4_hi: u32,
    pub general_purpose_register11_lo: u32,
    pub general_purpose_register11_hi: u32,
    pub general_purpose_register12_lo: u32,
    pub general_purpose_register12_hi: u32,
    pub cs_engine_id: u32,
    pub watchdog_count_ctrl: u32,
    pub watchdog_count_threshold: u32,
    pub mfc_bitstream_byte_count_frame: u32,
    pub mfx_image_status_mask: u32,
    pub mfx_image_status_ctrl: u32,
    pub hcp_bitstream_byte_count_frame: u32,
    pub hcp_image_status_mask: u32,
    pub hcp_image_status_ctrl: u32,
    pub hcp_decode_status: u32,
    pub hcp_debug_fe_stream_out_size: u32,
    pub avp_decode_error_status: u32,
}

const fn gpr(base: u32, index: u32) -> (u32, u32) {
    let lo = base + 0x600 + index * 8;
    (lo, lo + 4)
}

impl MmioRegisters {
    /// Register offsets for the VDBOX at `index`.
    pub fn for_vdbox(index: u32) -> Result<Self, MhwStatus> {
        if index >= MAX_VDBOX {
            return Err(MhwStatus::InvalidParameter);
        }
        let base = VDBOX0_MMIO_BASE + index * VDBOX_MMIO_STRIDE;
        let (gpr0_lo, gpr0_hi) = gpr(base, 0);
        let (gpr4_lo, gpr4_hi) = gpr(base, 4);
        let (gpr11_lo, gpr11_hi) = gpr(base, 11);
        let (gpr12_lo, gpr12_hi) = gpr(base, 12);

        Ok(Self {
            general_purpose_register0_lo: gpr0_lo,
            general_purpose_register0_hi: gpr0_hi,
            general_purpose_register4_lo: gpr4_lo,
            general_purpose_register4_hi: gpr4_hi,
            general_purpose_register11_lo: gpr11_lo,
            general_purpose_register11_hi: gpr11_hi,
            general_purpose_register12_lo: gpr12_lo,
            general_purpose_register12_hi: gpr12_hi,
            cs_engine_id: base + 0x8C,
            watchdog_count_ctrl: base + 0x178,
            watchdog_count_threshold: base + 0x17C,
            mfc_bitstream_byte_count_frame: base + 0x8A0,
            mfx_image_status_mask: base + 0x8B4,
            mfx_image_status_ctrl: base + 0x8B8,
            hcp_bitstream_byte_count_frame: base + 0x28A0,
            hcp_image_status_mask: base + 0x28B8,
            hcp_image_status_ctrl: base + 0x28BC,
            hcp_decode_status: base + 0x2800,
            hcp_debug_fe_stream_out_size: base + 0x2828,
            avp_decode_error_status: base + 0x2B08,
        })
    }

    /// General purpose registers of the render command streamer.
    pub fn for_render() -> Self {
        let (gpr0_lo, gpr0_hi) = gpr(RENDER_MMIO_BASE, 0);
        let (gpr4_lo, gpr4_hi) = gpr(RENDER_MMIO_BASE, 4);
        let (gpr11_lo, gpr11_hi) = gpr(RENDER_MMIO_BASE, 11);
        let (gpr12_lo, gpr12_hi) = gpr(RENDER_MMIO_BASE, 12);
        Self {
            general_purpose_register0_lo: gpr0_lo,
            general_purpose_register0_hi: gpr0_hi,
            general_purpose_register4_lo: gpr4_lo,
            general_purpose_register4_hi: gpr4_hi,
            general_purpose_register11_lo: gpr11_lo,
            general_purpose_register11_hi: gpr11_hi,
            general_purpose_register12_lo: gpr12_lo,
            general_purpose_register12_hi: gpr12_hi,
            cs_engine_id: RENDER_MMIO_BASE + 0x8C,
            watchdog_count_ctrl: RENDER_MMIO_BASE + 0x178,
            watchdog_count_threshold: RENDER_MMIO_BASE + 0x17C,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoadRegisterImmParams {
    /// Register byte offset.
    pub register: u32,
    pub data: u32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoadRegisterMemParams<'a> {
    pub resource: Option<&'a GpuResource>,
    pub offset: u32,
    pub register: u32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoadRegisterRegParams {
    pub source: u32,
    pub destination: u32,
}

pub type StoreRegisterMemParams<'a> = LoadRegisterMemParams<'a>;

#[derive(Debug, Clone, Copy, Default)]
pub struct StoreDataParams<'a> {
    pub resource: Option<&'a GpuResource>,
    pub offset: u32,
    pub value: u32,
    /// Second DWord, written as a QWord store when present.
    pub value_high: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostSync {
    #[default]
    None,
    WriteImmediate(u64),
    WriteTimestamp,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FlushDwParams<'a> {
    pub video_pipeline_cache_invalidate: bool,
    pub resource: Option<&'a GpuResource>,
    pub offset: u32,
    pub post_sync: PostSync,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemaphoreCompare {
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Equal,
    NotEqual,
}

impl SemaphoreCompare {
    fn encode(self) -> u32 {
        match self {
            Self::GreaterThan => SEMAPHORE_COMPARE_SAD_GREATER_THAN_SDD,
            Self::GreaterThanOrEqual => SEMAPHORE_COMPARE_SAD_GREATER_THAN_OR_EQUAL_SDD,
            Self::LessThan => SEMAPHORE_COMPARE_SAD_LESS_THAN_SDD,
            Self::LessThanOrEqual => SEMAPHORE_COMPARE_SAD_LESS_THAN_OR_EQUAL_SDD,
            Self::Equal => SEMAPHORE_COMPARE_SAD_EQUAL_SDD,
            Self::NotEqual => SEMAPHORE_COMPARE_SAD_NOT_EQUAL_SDD,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SemaphoreWaitParams<'a> {
    pub resource: Option<&'a GpuResource>,
    pub offset: u32,
    pub value: u32,
    pub compare: SemaphoreCompare,
    /// Poll the semaphore instead of waiting for a signal.
    pub polling: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionalBatchBufferEndParams<'a> {
    pub resource: Option<&'a GpuResource>,
    pub offset: u32,
    pub data: u32,
    pub compare_mask_mode: bool,
    pub end_current_level: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtomicOpcode {
    Increment,
    Decrement,
    Add,
    Sub,
    And,
    Or,
    Xor,
    Move,
    CompareExchange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtomicDataSize {
    Dword,
    Qword,
    Octword,
}

#[derive(Debug, Clone, Copy)]
pub struct AtomicParams<'a> {
    pub resource: Option<&'a GpuResource>,
    pub offset: u32,
    pub opcode: AtomicOpcode,
    pub data_size: AtomicDataSize,
    pub inline_data: bool,
    pub return_data_control: bool,
    pub operand1: [u32; 4],
    pub operand2: [u32; 4],
}

impl AtomicParams<'_> {
    /// Hardware opcode: the data size selects the opcode block, the operation the low bits.
    fn encode_opcode(&self) -> u32 {
        let base = match self.data_size {
            AtomicDataSize::Dword => 0x00,
            AtomicDataSize::Qword => 0x20,
            AtomicDataSize::Octword => 0x40,
        };
        let op = match self.opcode {
            AtomicOpcode::CompareExchange => 0x0E,
            AtomicOpcode::Increment => 0x05,
            AtomicOpcode::Decrement => 0x06,
            AtomicOpcode::Add => 0x07,
            AtomicOpcode::Sub => 0x08,
            AtomicOpcode::And => 0x01,
            AtomicOpcode::Or => 0x02,
            AtomicOpcode::Xor => 0x03,
            AtomicOpcode::Move => 0x04,
        };
        base + op
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ForceWakeupParams {
    pub render_awake: bool,
    pub media_slice0_awake: bool,
    pub hevc_power_well: bool,
    pub mfx_power_well: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct PipeControlParams<'a> {
    pub flush_mode: FlushMode,
    /// Used verbatim with [`FlushMode::Custom`], added on top of the mode otherwise.
    pub flags: PipeControlFlags,
    pub resource: Option<&'a GpuResource>,
    pub offset: u32,
    pub post_sync: PostSync,
}

impl Default for PipeControlParams<'_> {
    fn default() -> Self {
        Self {
            flush_mode: FlushMode::WriteCache,
            flags: PipeControlFlags::empty(),
            resource: None,
            offset: 0,
            post_sync: PostSync::None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MediaStateFlushParams {
    pub flush_to_go: bool,
    pub interface_descriptor_offset: u32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VdControlStateParams {
    pub initialization: bool,
    pub scalable_mode_pipe_lock: bool,
    pub scalable_mode_pipe_unlock: bool,
    pub memory_implicit_flush: bool,
    /// Target the VDENC pipe instead of HCP.
    pub vdenc: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GenericPrologParams<'a> {
    pub status_resource: Option<&'a GpuResource>,
    pub offset: u32,
    pub value: u32,
}

/// Gen12 MI interface. Later generations reuse it unchanged.
pub struct MiInterfaceG12 {
    os: Arc<dyn OsInterface>,
    caps: &'static HwCaps,
    mmio: MmioRegisters,
}

impl std::fmt::Debug for MiInterfaceG12 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiInterfaceG12")
            .field("family", &self.caps.family)
            .field("mmio", &self.mmio)
            .finish()
    }
}

impl MiInterfaceG12 {
    #[tracing::instrument(skip(os, caps), fields(family = ?caps.family))]
    pub fn new(os: Arc<dyn OsInterface>, caps: &'static HwCaps) -> Self {
        debug!("MI interface created");
        Self {
            os,
            caps,
            mmio: MmioRegisters::for_render(),
        }
    }

    pub fn mmio_registers(&self) -> &MmioRegisters {
        &self.mmio
    }

    fn mocs(&self, usage: MocsUsage) -> u32 {
        self.caps.mocs_index(usage)
    }

    /// Converts command streamer timestamp ticks to nanoseconds.
    pub fn convert_to_nanoseconds(&self, ticks: u64) -> u64 {
        let freq = self.caps.timestamp_frequency_hz.max(1) as u128;
        (ticks as u128 * 1_000_000_000 / freq) as u64
    }

    pub fn add_mi_noop(
        &self,
        buffer: Option<&mut CommandBuffer>,
        batch: Option<&mut BatchBuffer>,
    ) -> Result<(), MhwStatus> {
        add_command_cmd_or_bb(buffer, batch, &MiNoop::default())
    }

    pub fn add_mi_batch_buffer_end(
        &self,
        buffer: Option<&mut CommandBuffer>,
        batch: Option<&mut BatchBuffer>,
    ) -> Result<(), MhwStatus> {
        add_command_cmd_or_bb(buffer, batch, &MiBatchBufferEnd::default())
    }

    /// Chains `batch` as a second level batch buffer.
    pub fn add_mi_batch_buffer_start(
        &self,
        buffer: &mut CommandBuffer,
        batch: &BatchBuffer,
    ) -> Result<(), MhwStatus> {
        let mut cmd = MiBatchBufferStart::default();
        cmd.set_address_space_indicator(1);
        cmd.set_second_level_batch_buffer(1);

        let mut relocs = Vec::new();
        let params = ResourceParams::new(Some(batch.resource()), 1).with_lsb(2);
        add_resource_to_cmd(self.os.as_ref(), cmd.as_dwords_mut(), &mut relocs, &params)?;
        buffer.append_command_relocated(&cmd, relocs)
    }

    pub fn add_mi_arb_check(&self, buffer: &mut CommandBuffer) -> Result<(), MhwStatus> {
        buffer.append_command(&MiArbCheck::default())
    }

    pub fn add_mi_load_register_imm(
        &self,
        buffer: &mut CommandBuffer,
        params: &LoadRegisterImmParams,
    ) -> Result<(), MhwStatus> {
        if params.register % 4 != 0 {
            return Err(MhwStatus::InvalidParameter);
        }
        let mut cmd = MiLoadRegisterImm::default();
        cmd.set_register_offset(params.register >> 2);
        cmd.set_data_dword(params.data);
        buffer.append_command(&cmd)
    }

    pub fn add_mi_load_register_mem(
        &self,
        buffer: &mut CommandBuffer,
        params: &LoadRegisterMemParams,
    ) -> Result<(), MhwStatus> {
        let mut cmd = MiLoadRegisterMem::default();
        cmd.set_register_address(params.register >> 2);

        let mut relocs = Vec::new();
        let res = ResourceParams::new(params.resource, 2)
            .with_offset(params.offset)
            .with_lsb(2);
        add_resource_to_cmd(self.os.as_ref(), cmd.as_dwords_mut(), &mut relocs, &res)?;
        buffer.append_command_relocated(&cmd, relocs)
    }

    pub fn add_mi_load_register_reg(
        &self,
        buffer: &mut CommandBuffer,
        params: &LoadRegisterRegParams,
    ) -> Result<(), MhwStatus> {
        let mut cmd = MiLoadRegisterReg::default();
        cmd.set_source_register_address(params.source >> 2);
        cmd.set_destination_register_address(params.destination >> 2);
        buffer.append_command(&cmd)
    }

    pub fn add_mi_store_register_mem(
        &self,
        buffer: &mut CommandBuffer,
        params: &StoreRegisterMemParams,
    ) -> Result<(), MhwStatus> {
        let mut cmd = MiStoreRegisterMem::default();
        cmd.set_register_address(params.register >> 2);

        let mut relocs = Vec::new();
        let res = ResourceParams::new(params.resource, 2)
            .with_offset(params.offset)
            .with_lsb(2)
            .writable(true);
        add_resource_to_cmd(self.os.as_ref(), cmd.as_dwords_mut(), &mut relocs, &res)?;
        buffer.append_command_relocated(&cmd, relocs)
    }

    pub fn add_mi_store_data_imm(
        &self,
        buffer: &mut CommandBuffer,
        params: &StoreDataParams,
    ) -> Result<(), MhwStatus> {
        let mut cmd = MiStoreDataImm::default();
        cmd.set_data_dword0(params.value);
        if let Some(high) = params.value_high {
            cmd.set_store_qword(1);
            cmd.set_data_dword1(high);
        }

        let mut relocs = Vec::new();
        let res = ResourceParams::new(params.resource, 1)
            .with_offset(params.offset)
            .with_lsb(2)
            .writable(true);
        add_resource_to_cmd(self.os.as_ref(), cmd.as_dwords_mut(), &mut relocs, &res)?;
        buffer.append_command_relocated(&cmd, relocs)
    }

    pub fn add_mi_flush_dw(&self, buffer: &mut CommandBuffer, params: &FlushDwParams) -> Result<(), MhwStatus> {
        let mut cmd = MiFlushDw::default();
        cmd.set_video_pipeline_cache_invalidate(params.video_pipeline_cache_invalidate as u32);

        let mut relocs = Vec::new();
        match params.post_sync {
            PostSync::None => cmd.set_post_sync_operation(FLUSH_DW_POST_SYNC_NONE),
            PostSync::WriteImmediate(value) => {
                cmd.set_post_sync_operation(FLUSH_DW_POST_SYNC_WRITE_IMMEDIATE);
                cmd.set_immediate_data0(value as u32);
                cmd.set_immediate_data1((value >> 32) as u32);
            }
            PostSync::WriteTimestamp => cmd.set_post_sync_operation(FLUSH_DW_POST_SYNC_WRITE_TIMESTAMP),
        }
        if params.post_sync != PostSync::None {
            cmd.set_destination_address_type(self.os.use_global_gtt(EngineClass::Video) as u32);
            let res = ResourceParams::new(params.resource, 1)
                .with_offset(params.offset)
                .with_lsb(FLUSH_DW_ADDRESS_SHIFT)
                .writable(true);
            add_resource_to_cmd(self.os.as_ref(), cmd.as_dwords_mut(), &mut relocs, &res)?;
        } else if params.resource.is_some() {
            warn!("MI_FLUSH_DW resource ignored without a post sync operation");
        }
        buffer.append_command_relocated(&cmd, relocs)
    }

    pub fn add_mi_semaphore_wait(
        &self,
        buffer: &mut CommandBuffer,
        params: &SemaphoreWaitParams,
    ) -> Result<(), MhwStatus> {
        let mut cmd = MiSemaphoreWait::default();
        cmd.set_compare_operation(params.compare.encode());
        cmd.set_wait_mode(params.polling as u32);
        cmd.set_semaphore_data_dword(params.value);

        let mut relocs = Vec::new();
        let res = ResourceParams::new(params.resource, 2)
            .with_offset(params.offset)
            .with_lsb(2);
        add_resource_to_cmd(self.os.as_ref(), cmd.as_dwords_mut(), &mut relocs, &res)?;
        buffer.append_command_relocated(&cmd, relocs)
    }

    pub fn add_mi_conditional_batch_buffer_end(
        &self,
        buffer: &mut CommandBuffer,
        params: &ConditionalBatchBufferEndParams,
    ) -> Result<(), MhwStatus> {
        let mut cmd = MiConditionalBatchBufferEnd::default();
        cmd.set_compare_semaphore(0);
        cmd.set_compare_mask_mode(params.compare_mask_mode as u32);
        cmd.set_end_current_batch_buffer_level(params.end_current_level as u32);
        cmd.set_compare_data_dword(params.data);

        let mut relocs = Vec::new();
        let res = ResourceParams::new(params.resource, 2)
            .with_offset(params.offset)
            .with_lsb(CONDITIONAL_BATCH_BUFFER_END_ADDRESS_SHIFT);
        add_resource_to_cmd(self.os.as_ref(), cmd.as_dwords_mut(), &mut relocs, &res)?;
        buffer.append_command_relocated(&cmd, relocs)
    }

    pub fn add_mi_atomic(&self, buffer: &mut CommandBuffer, params: &AtomicParams) -> Result<(), MhwStatus> {
        let mut cmd = MiAtomic::default();
        cmd.set_atomic_opcode(params.encode_opcode());
        cmd.set_data_size(match params.data_size {
            AtomicDataSize::Dword => 0,
            AtomicDataSize::Qword => 1,
            AtomicDataSize::Octword => 2,
        });
        cmd.set_return_data_control(params.return_data_control as u32);
        cmd.set_cs_stall(1);
        if params.inline_data {
            cmd.set_inline_data(1);
            cmd.set_operand1_data_dword0(params.operand1[0]);
            cmd.set_operand2_data_dword0(params.operand2[0]);
            cmd.set_operand1_data_dword1(params.operand1[1]);
            cmd.set_operand2_data_dword1(params.operand2[1]);
            cmd.set_operand1_data_dword2(params.operand1[2]);
            cmd.set_operand2_data_dword2(params.operand2[2]);
            cmd.set_operand1_data_dword3(params.operand1[3]);
            cmd.set_operand2_data_dword3(params.operand2[3]);
        }

        let mut relocs = Vec::new();
        let res = ResourceParams::new(params.resource, 1)
            .with_offset(params.offset)
            .with_lsb(2)
            .writable(true);
        add_resource_to_cmd(self.os.as_ref(), cmd.as_dwords_mut(), &mut relocs, &res)?;
        buffer.append_command_relocated(&cmd, relocs)
    }

    pub fn add_mi_force_wakeup(
        &self,
        buffer: &mut CommandBuffer,
        params: &ForceWakeupParams,
    ) -> Result<(), MhwStatus> {
        let mut cmd = MiForceWakeup::default();
        cmd.set_force_render_awake(params.render_awake as u32);
        cmd.set_force_media_slice0_awake(params.media_slice0_awake as u32);
        cmd.set_hevc_power_well_control(params.hevc_power_well as u32);
        cmd.set_mfx_power_well_control(params.mfx_power_well as u32);
        // Only the bits named above are updated.
        cmd.set_mask_bits(0x0303);
        buffer.append_command(&cmd)
    }

    /// Emits a PIPE_CONTROL. With a resource, the post sync operation writes into it.
    pub fn add_pipe_control(
        &self,
        buffer: Option<&mut CommandBuffer>,
        batch: Option<&mut BatchBuffer>,
        params: &PipeControlParams,
    ) -> Result<(), MhwStatus> {
        let mut cmd = PipeControl::default();
        cmd.set_command_streamer_stall_enable(1);

        let flags = match params.flush_mode {
            FlushMode::WriteCache => {
                params.flags | PipeControlFlags::RENDER_TARGET_CACHE_FLUSH | PipeControlFlags::DC_FLUSH
            }
            FlushMode::ReadCache => {
                params.flags
                    | PipeControlFlags::CONSTANT_CACHE_INVALIDATE
                    | PipeControlFlags::STATE_CACHE_INVALIDATE
                    | PipeControlFlags::VF_CACHE_INVALIDATE
                    | PipeControlFlags::INSTRUCTION_CACHE_INVALIDATE
                    | PipeControlFlags::TEXTURE_CACHE_INVALIDATE
            }
            FlushMode::Custom => params.flags,
        };
        apply_pipe_control_flags(&mut cmd, flags);

        let mut relocs = Vec::new();
        match params.post_sync {
            PostSync::None => cmd.set_post_sync_operation(PIPE_CONTROL_POST_SYNC_NONE),
            PostSync::WriteImmediate(value) => {
                cmd.set_post_sync_operation(PIPE_CONTROL_POST_SYNC_WRITE_IMMEDIATE);
                cmd.set_immediate_data0(value as u32);
                cmd.set_immediate_data1((value >> 32) as u32);
            }
            PostSync::WriteTimestamp => cmd.set_post_sync_operation(PIPE_CONTROL_POST_SYNC_WRITE_TIMESTAMP),
        }
        if params.post_sync != PostSync::None {
            cmd.set_destination_address_type(self.os.use_global_gtt(EngineClass::Render) as u32);
            let res = ResourceParams::new(params.resource, 2)
                .with_offset(params.offset)
                .with_lsb(PIPE_CONTROL_ADDRESS_SHIFT)
                .writable(true);
            add_resource_to_cmd(self.os.as_ref(), cmd.as_dwords_mut(), &mut relocs, &res)?;
        }

        match (batch, buffer) {
            (Some(batch), _) => batch.append_command_relocated(&cmd, relocs),
            (None, Some(buffer)) => buffer.append_command_relocated(&cmd, relocs),
            (None, None) => Err(MhwStatus::NullPointer),
        }
    }

    pub fn add_media_state_flush(
        &self,
        buffer: Option<&mut CommandBuffer>,
        batch: Option<&mut BatchBuffer>,
        params: &MediaStateFlushParams,
    ) -> Result<(), MhwStatus> {
        let mut cmd = MediaStateFlush::default();
        cmd.set_flush_to_go(params.flush_to_go as u32);
        cmd.set_interface_descriptor_offset(params.interface_descriptor_offset);
        add_command_cmd_or_bb(buffer, batch, &cmd)
    }

    pub fn add_mfx_wait(&self, buffer: &mut CommandBuffer, stall_vdbox_pipeline: bool) -> Result<(), MhwStatus> {
        buffer.append_command(&mfx_wait(stall_vdbox_pipeline))
    }

    pub fn add_vd_control_state(
        &self,
        buffer: &mut CommandBuffer,
        params: &VdControlStateParams,
    ) -> Result<(), MhwStatus> {
        let mut cmd = VdControlState::default();
        if params.vdenc {
            cmd.set_media_instruction_command(VD_CONTROL_STATE_COMMAND_VDENC);
            cmd.set_media_instruction_opcode(VD_CONTROL_STATE_OPCODE_VDENC);
        }
        cmd.set_pipeline_initialization(params.initialization as u32);
        cmd.set_scalable_mode_pipe_lock(params.scalable_mode_pipe_lock as u32);
        cmd.set_scalable_mode_pipe_unlock(params.scalable_mode_pipe_unlock as u32);
        cmd.set_memory_implicit_flush(params.memory_implicit_flush as u32);
        buffer.append_command(&cmd)
    }

    /// Commands every submission starts with. The render engine flushes its write caches and
    /// then stores `value` through a read cache invalidating PIPE_CONTROL. Other engines use
    /// MI_FLUSH_DW with the same store.
    pub fn send_generic_prolog(
        &self,
        buffer: &mut CommandBuffer,
        params: &GenericPrologParams,
    ) -> Result<(), MhwStatus> {
        let status = params.status_resource.ok_or(MhwStatus::NullPointer)?;
        let engine = self.os.current_engine_class();
        debug!(?engine, offset = params.offset, value = params.value, "generic prolog");

        match engine {
            EngineClass::Render | EngineClass::Compute => {
                self.add_pipe_control(
                    Some(&mut *buffer),
                    None,
                    &PipeControlParams {
                        flush_mode: FlushMode::WriteCache,
                        ..Default::default()
                    },
                )?;
                self.add_pipe_control(
                    Some(buffer),
                    None,
                    &PipeControlParams {
                        flush_mode: FlushMode::ReadCache,
                        resource: Some(status),
                        offset: params.offset,
                        post_sync: PostSync::WriteImmediate(params.value as u64),
                        ..Default::default()
                    },
                )
            }
            _ => self.add_mi_flush_dw(
                buffer,
                &FlushDwParams {
                    video_pipeline_cache_invalidate: true,
                    resource: Some(status),
                    offset: params.offset,
                    post_sync: PostSync::WriteImmediate(params.value as u64),
                },
            ),
        }
    }

    /// MOCS index for status buffers polled by the CPU.
    pub fn status_mocs(&self) -> u32 {
        self.mocs(MocsUsage::Uncached)
    }
}

pub(crate) fn mfx_wait(stall_vdbox_pipeline: bool) -> MfxWait {
    let mut cmd = MfxWait::default();
    cmd.set_mfx_sync_control_flag(stall_vdbox_pipeline as u32);
    cmd
}

fn apply_pipe_control_flags(cmd: &mut PipeControl, flags: PipeControlFlags) {
    let bit = |f: PipeControlFlags| flags.contains(f) as u32;
    cmd.set_render_target_cache_flush_enable(bit(PipeControlFlags::RENDER_TARGET_CACHE_FLUSH));
    cmd.set_dc_flush_enable(bit(PipeControlFlags::DC_FLUSH));
    cmd.set_constant_cache_invalidation_enable(bit(PipeControlFlags::CONSTANT_CACHE_INVALIDATE));
    cmd.set_state_cache_invalidation_enable(bit(PipeControlFlags::STATE_CACHE_INVALIDATE));
    cmd.set_vf_cache_invalidation_enable(bit(PipeControlFlags::VF_CACHE_INVALIDATE));
    cmd.set_instruction_cache_invalidate_enable(bit(PipeControlFlags::INSTRUCTION_CACHE_INVALIDATE));
    cmd.set_texture_cache_invalidation_enable(bit(PipeControlFlags::TEXTURE_CACHE_INVALIDATE));
    cmd.set_tlb_invalidate(bit(PipeControlFlags::TLB_INVALIDATE));
    cmd.set_generic_media_state_clear(bit(PipeControlFlags::GENERIC_MEDIA_STATE_CLEAR));
    cmd.set_hdc_pipeline_flush(bit(PipeControlFlags::HDC_PIPELINE_FLUSH));
    if flags.contains(PipeControlFlags::CS_STALL) {
        cmd.set_command_streamer_stall_enable(1);
    }
}
