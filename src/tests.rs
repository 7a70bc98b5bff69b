use std::sync::Arc;

use hex_literal::hex;
use rand::Rng;
use sha2::{Digest, Sha256};
use tracing_test::traced_test;

use crate::{
    cmdbuffer::CommandBuffer,
    constants::{EngineClass, ProductFamily, SurfaceFormat, TileType},
    create_hal_for_generation,
    mi::{FlushDwParams, GenericPrologParams, PostSync, StoreDataParams},
    os::{GpuContextCreateOptions, MockOs, OsInterface},
    render::{CfeParams, VfeBaseParams, VfeParams},
    settings::{MediaUserSettingsMgr, SettingValue, FORCE_VDBOX},
    sys::{
        g12::{hcp::HcpPipeModeSelect, mi::MiFlushDw},
        xe_hpg::render::CfeState,
        HwCommand,
    },
    vdbox::{
        BsdParams, CodecMode, CodecStandard, PipeModeSelectBase, PipeModeSelectGen12, PipeModeSelectParams,
        SurfaceInfo, SurfaceStateParams,
    },
    ve::{VeHintParams, VeState},
    vp9, HwInterface, MhwStatus,
};

fn fingerprint(buffer: &CommandBuffer) -> Vec<u8> {
    Sha256::digest(buffer.as_bytes()).to_vec()
}

/// Decode setup for one HEVC frame on a video context.
fn hevc_decode_frame(hal: &HwInterface, os: &MockOs, buffer: &mut CommandBuffer) -> Result<(), MhwStatus> {
    let status = os.allocate_resource(4096, "status")?;
    let bitstream = os.allocate_resource(0x4_0000, "bitstream")?;

    hal.mi.send_generic_prolog(
        buffer,
        &GenericPrologParams {
            status_resource: Some(&status),
            offset: 0,
            value: 1,
        },
    )?;
    hal.hcp.add_hcp_pipe_mode_select(
        buffer,
        &PipeModeSelectParams::Gen12(PipeModeSelectGen12 {
            base: PipeModeSelectBase {
                mode: CodecMode::Decode,
                standard: CodecStandard::Hevc,
                ..Default::default()
            },
            ..Default::default()
        }),
    )?;
    let surface = SurfaceInfo::planar(1920, 1080, 2048, SurfaceFormat::Nv12, TileType::TileY);
    hal.hcp.add_hcp_surface_state(buffer, &SurfaceStateParams::new(surface, 0))?;
    hal.mfx.add_mfx_ind_obj_base_addr(
        buffer,
        &crate::vdbox::mfx::MfxIndObjParams {
            data_buffer: Some(&bitstream),
            ..Default::default()
        },
    )?;
    hal.hcp.add_hcp_bsd_object(
        buffer,
        &BsdParams {
            data_length: 0x1234,
            data_offset: 0,
        },
    )?;
    hal.mi.add_mi_flush_dw(
        buffer,
        &FlushDwParams {
            resource: Some(&status),
            offset: 8,
            post_sync: PostSync::WriteImmediate(2),
            ..Default::default()
        },
    )?;
    hal.mi.add_mi_batch_buffer_end(Some(buffer), None)
}

fn video_hal(family: ProductFamily) -> (Arc<MockOs>, HwInterface) {
    let os = Arc::new(MockOs::new());
    os.create_gpu_context(&GpuContextCreateOptions::basic(EngineClass::Video))
        .unwrap();
    let hal = create_hal_for_generation(family, os.clone()).unwrap();
    (os, hal)
}

#[test]
fn decode_frame_is_deterministic() {
    let (os_a, hal_a) = video_hal(ProductFamily::TigerlakeLp);
    let (os_b, hal_b) = video_hal(ProductFamily::TigerlakeLp);
    let mut a = CommandBuffer::new(4096);
    let mut b = CommandBuffer::new(4096);
    hevc_decode_frame(&hal_a, &os_a, &mut a).unwrap();
    hevc_decode_frame(&hal_b, &os_b, &mut b).unwrap();

    assert_eq!(fingerprint(&a), fingerprint(&b));
    assert_eq!(a.relocations(), b.relocations());

    // The prolog on a video context is a single MI_FLUSH_DW, followed by the pipe mode.
    let flush = MiFlushDw {
        dw: a.dwords()[..MiFlushDw::DW_SIZE].try_into().unwrap(),
    };
    assert_eq!(flush.video_pipeline_cache_invalidate(), 1);
    let pipe_mode = HcpPipeModeSelect {
        dw: a.dwords()[MiFlushDw::DW_SIZE..MiFlushDw::DW_SIZE + HcpPipeModeSelect::DW_SIZE]
            .try_into()
            .unwrap(),
    };
    assert_eq!(pipe_mode.codec_standard_select(), 0);
}

#[test]
fn batch_end_only_buffer_hash() {
    let hal = create_hal_for_generation(ProductFamily::Dg1, Arc::new(MockOs::new())).unwrap();
    let mut buffer = CommandBuffer::new(16);
    hal.mi.add_mi_batch_buffer_end(Some(&mut buffer), None).unwrap();
    assert_eq!(buffer.as_bytes(), [0x00, 0x00, 0x00, 0x05]);
    assert_eq!(
        fingerprint(&buffer),
        hex!("221f8af2372a95064f2ef7d7712216a9ab46e7ef98482fd237e106f83eaa7569")
    );
}

#[test]
fn rejected_commands_leave_the_buffer_unchanged() {
    let (os, hal) = video_hal(ProductFamily::Dg1);
    let mut buffer = CommandBuffer::new(4096);
    hevc_decode_frame(&hal, &os, &mut buffer).unwrap();
    let before = fingerprint(&buffer);
    let relocations = buffer.relocations().len();

    // Base tagged parameters where Gen12 ones are required.
    let base = PipeModeSelectParams::Base(PipeModeSelectBase {
        standard: CodecStandard::Av1,
        ..Default::default()
    });
    assert_eq!(
        hal.avp.add_avp_pipe_mode_select(&mut buffer, &base),
        Err(MhwStatus::InvalidParameter)
    );
    assert_eq!(
        hal.render
            .add_vfe_state(&mut buffer, &VfeParams::Base(VfeBaseParams::default())),
        Err(MhwStatus::InvalidParameter)
    );
    let bad_surface = SurfaceInfo::planar(64, 64, 64, SurfaceFormat::Argb, TileType::Linear);
    assert_eq!(
        hal.hcp
            .add_hcp_surface_state(&mut buffer, &SurfaceStateParams::new(bad_surface, 0)),
        Err(MhwStatus::InvalidParameter)
    );

    assert_eq!(fingerprint(&buffer), before);
    assert_eq!(buffer.relocations().len(), relocations);
}

#[test]
fn cfe_state_through_the_factory() {
    let hal = create_hal_for_generation(ProductFamily::Dg2, Arc::new(MockOs::new())).unwrap();
    let mut buffer = CommandBuffer::new(256);
    hal.render
        .add_vfe_state(
            &mut buffer,
            &VfeParams::XeHpg(CfeParams {
                base: VfeBaseParams {
                    max_threads: 64,
                    ..Default::default()
                },
                fused_eu_dispatch: true,
                ..Default::default()
            }),
        )
        .unwrap();
    let cmd = CfeState {
        dw: buffer.dwords().try_into().unwrap(),
    };
    assert_eq!(cmd.maximum_number_of_threads(), 63);
    assert_eq!(cmd.fused_eu_dispatch(), 0);
}

#[test]
fn relocations_resolve_to_address_plus_offset() {
    let mut rng = rand::thread_rng();
    let os = Arc::new(MockOs::new().without_presumed_addresses());
    let hal = create_hal_for_generation(ProductFamily::TigerlakeLp, os.clone()).unwrap();
    let target = os.allocate_resource(0x10_0000, "target").unwrap();

    for _ in 0..64 {
        let offset = rng.gen_range(0..0x10_0000u32 / 4) * 4;
        let base = rng.gen_range(1u64..1 << 35) << 12;

        let mut buffer = CommandBuffer::new(64);
        hal.mi
            .add_mi_store_data_imm(
                &mut buffer,
                &StoreDataParams {
                    resource: Some(&target),
                    offset,
                    value: 0xC0FFEE,
                    value_high: None,
                },
            )
            .unwrap();
        let control = buffer.dwords()[1] & 0x3;

        let resolved = buffer
            .resolve_relocations(|id| (id == target.id()).then_some(base))
            .unwrap();
        assert_eq!(resolved, 1);

        let dw = buffer.dwords();
        let address = ((dw[2] as u64) << 32) | (dw[1] & !0x3) as u64;
        assert_eq!(address, base + offset as u64);
        assert_eq!(dw[1] & 0x3, control);
        assert_eq!(dw[3], 0xC0FFEE);
        assert!(buffer.relocations().is_empty());
    }
}

#[test]
fn unknown_relocation_targets_are_rejected() {
    let os = Arc::new(MockOs::new());
    let hal = create_hal_for_generation(ProductFamily::TigerlakeLp, os.clone()).unwrap();
    let target = os.allocate_resource(4096, "target").unwrap();
    let mut buffer = CommandBuffer::new(64);
    hal.mi
        .add_mi_store_data_imm(
            &mut buffer,
            &StoreDataParams {
                resource: Some(&target),
                ..Default::default()
            },
        )
        .unwrap();
    let before = fingerprint(&buffer);
    assert_eq!(buffer.resolve_relocations(|_| None), Err(MhwStatus::InvalidHandle));
    assert_eq!(fingerprint(&buffer), before);
    assert_eq!(buffer.relocations().len(), 1);
}

#[test]
fn vp9_key_and_inter_tables_differ() {
    let mut key = vec![0xAAu8; vp9::PROB_MAX_NUM_ELEM];
    let mut inter = vec![0x55u8; vp9::PROB_MAX_NUM_ELEM];
    vp9::init_context_buffer(&mut key, true).unwrap();
    vp9::init_context_buffer(&mut inter, false).unwrap();

    assert_eq!(key[..vp9::INTER_PROB_OFFSET], inter[..vp9::INTER_PROB_OFFSET]);
    assert_ne!(key[vp9::INTER_PROB_OFFSET..vp9::SEG_PROB_OFFSET], inter[vp9::INTER_PROB_OFFSET..vp9::SEG_PROB_OFFSET]);
    let seg = vp9::SEG_PROB_OFFSET..vp9::SEG_PROB_OFFSET + vp9::SEG_PROB_LEN;
    assert!(key[seg.clone()].iter().all(|&b| b == 0xAA));
    assert!(inter[seg].iter().all(|&b| b == 0x55));
    assert_eq!(
        key[vp9::SEG_PROB_OFFSET + vp9::SEG_PROB_LEN..],
        inter[vp9::SEG_PROB_OFFSET + vp9::SEG_PROB_LEN..]
    );

    let mut short = vec![0u8; vp9::PROB_MAX_NUM_ELEM - 1];
    assert_eq!(vp9::init_context_buffer(&mut short, true), Err(MhwStatus::NoSpace));
    assert!(short.iter().all(|&b| b == 0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn settings_survive_concurrent_users() {
    let mgr = Arc::new(MediaUserSettingsMgr::new());
    let owner = mgr.init();

    let tasks: Vec<_> = (0..32u32)
        .map(|i| {
            let mgr = mgr.clone();
            tokio::task::spawn_blocking(move || {
                let settings = mgr.init();
                settings.set(FORCE_VDBOX, SettingValue::U32(i % 4)).unwrap();
                assert!(settings.get(FORCE_VDBOX).and_then(|v| v.as_u32()).is_some());
                mgr.close()
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert!(Arc::ptr_eq(&owner, &mgr.settings().unwrap()));
    mgr.close().unwrap();
    assert_eq!(mgr.init_count(), 1);
    assert_eq!(mgr.teardown_count(), 1);
    assert_eq!(mgr.ref_count(), 0);
}

#[test]
#[traced_test]
fn factory_logs_creation() {
    let os = Arc::new(MockOs::new());
    assert!(create_hal_for_generation(ProductFamily::Acm, os).is_some());
    assert!(logs_contain("hardware interface created"));
    assert!(logs_contain("VEBOX interface created"));
}

#[test]
#[traced_test]
fn scalable_platforms_use_a_single_pipe_virtual_engine() {
    let os = Arc::new(MockOs::new().with_scalability(true));
    let hal = create_hal_for_generation(ProductFamily::TigerlakeLp, os).unwrap();
    let mut ve = hal.ve.unwrap();
    assert_eq!(ve.state(), VeState::Initialized);
    assert_eq!(ve.engine_count(), 1);
    assert!(logs_contain("using a single-pipe virtual engine"));
    assert!(!logs_contain("no virtual engine"));

    let mut buffer = CommandBuffer::new(64);
    ve.set_hint_params(&VeHintParams {
        batch_buffer_count: 1,
        ..Default::default()
    })
    .unwrap();
    ve.populate_hint_params(&mut buffer).unwrap();
    assert!(buffer.attributes.use_virtual_engine_hint);
}
