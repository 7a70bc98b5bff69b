///! Builds a one-dispatch compute batch for DG2 on the in-memory OS layer and prints the
///! resulting DWords and relocations.
use std::sync::Arc;

use mhw::{
    cmdbuffer::CommandBuffer,
    constants::{FlushMode, ProductFamily},
    create_hal_for_generation,
    mi::{PipeControlParams, PostSync},
    os::{MockOs, OsInterface},
    render::{
        g12::PipelineSelection, xe_hpg::WalkerPostSync, CfeParams, GpgpuWalkerParams, InterfaceDescriptorParams,
        StateBaseAddressParams, VfeBaseParams, VfeParams,
    },
};

pub fn main() {
    // Setup basic logger
    tracing_subscriber::fmt::init();

    let os = Arc::new(MockOs::new());
    let hal = create_hal_for_generation(ProductFamily::Dg2, os.clone()).unwrap();
    let render = hal.render.as_xe_hpg().unwrap();

    let heap = os.allocate_resource(64 * 1024, "state heap").unwrap();
    let kernels = os.allocate_resource(16 * 1024, "kernels").unwrap();
    let status = os.allocate_resource(4096, "status").unwrap();

    let mut buffer = CommandBuffer::new(4096);

    render
        .add_pipeline_select(Some(&mut buffer), None, PipelineSelection::Gpgpu)
        .unwrap();
    render
        .add_state_base_address(
            &mut buffer,
            &StateBaseAddressParams {
                general_state: Some(&heap),
                general_state_size: 64 * 1024,
                dynamic_state: Some(&heap),
                dynamic_state_size: 64 * 1024,
                instruction: Some(&kernels),
                instruction_size: 16 * 1024,
                ..Default::default()
            },
        )
        .unwrap();
    render
        .add_cfe_state(
            &mut buffer,
            &VfeParams::XeHpg(CfeParams {
                base: VfeBaseParams {
                    max_threads: 64,
                    ..Default::default()
                },
                number_of_walkers: 1,
                ..Default::default()
            }),
        )
        .unwrap();
    render
        .add_compute_walker(
            &mut buffer,
            &GpgpuWalkerParams {
                group_width: 120,
                group_height: 68,
                thread_width: 16,
                thread_height: 1,
                ..Default::default()
            },
            &InterfaceDescriptorParams {
                kernel_offset: 0,
                slm_size: 4096,
                barrier_enable: true,
                ..Default::default()
            },
            Some(WalkerPostSync {
                resource: &status,
                offset: 0,
                immediate: Some(1),
            }),
        )
        .unwrap();
    hal.mi
        .add_pipe_control(
            Some(&mut buffer),
            None,
            &PipeControlParams {
                flush_mode: FlushMode::WriteCache,
                resource: Some(&status),
                offset: 8,
                post_sync: PostSync::WriteImmediate(2),
                ..Default::default()
            },
        )
        .unwrap();
    hal.mi.add_mi_batch_buffer_end(Some(&mut buffer), None).unwrap();

    for (i, dw) in buffer.dwords().iter().enumerate() {
        println!("{i:4}: {dw:08x}");
    }
    for reloc in buffer.relocations() {
        println!("{reloc:?}");
    }
    println!("{} bytes, {} relocations", buffer.offset(), buffer.relocations().len());
}
