//! Builds the set of interface objects for a product family.

use std::{collections::HashMap, sync::Arc};

use once_cell::sync::Lazy;
use tracing::{debug, warn};

use crate::{
    caps::{caps_for, HwCaps},
    cmdbuffer::{BatchBuffer, CommandBuffer},
    constants::{EngineClass, Generation, ProductFamily},
    mi::MiInterfaceG12,
    os::OsInterface,
    render::{
        g12::PipelineSelection, RenderInterfaceG12, RenderInterfaceXeHpg, StateBaseAddressParams, VfeParams,
    },
    vdbox::{AvpInterfaceG12, HcpInterfaceG12, HucInterface, MfxInterfaceG12, VdencInterfaceG12},
    ve::{create_virtual_engine_state, SinglePipeVirtualEngine},
    vebox::VeboxInterfaceG12,
    MhwStatus,
};

/// The render/compute interface matching the platform's render generation.
#[derive(Debug)]
pub enum RenderInterface {
    Gen12(RenderInterfaceG12),
    XeHpg(RenderInterfaceXeHpg),
}

impl RenderInterface {
    pub fn caps(&self) -> &'static HwCaps {
        match self {
            Self::Gen12(render) => render.caps(),
            Self::XeHpg(render) => render.caps(),
        }
    }

    /// MEDIA_VFE_STATE on Gen12, CFE_STATE on Xe_HPG.
    pub fn add_vfe_state(&self, buffer: &mut CommandBuffer, params: &VfeParams) -> Result<(), MhwStatus> {
        match self {
            Self::Gen12(render) => render.add_media_vfe_cmd(buffer, params),
            Self::XeHpg(render) => render.add_cfe_state(buffer, params),
        }
    }

    pub fn add_state_base_address(
        &self,
        buffer: &mut CommandBuffer,
        params: &StateBaseAddressParams,
    ) -> Result<(), MhwStatus> {
        match self {
            Self::Gen12(render) => render.add_state_base_address(buffer, params),
            Self::XeHpg(render) => render.add_state_base_address(buffer, params),
        }
    }

    pub fn add_pipeline_select(
        &self,
        buffer: Option<&mut CommandBuffer>,
        batch: Option<&mut BatchBuffer>,
        selection: PipelineSelection,
    ) -> Result<(), MhwStatus> {
        match self {
            Self::Gen12(render) => render.add_pipeline_select(buffer, batch, selection),
            Self::XeHpg(render) => render.add_pipeline_select(buffer, batch, selection),
        }
    }

    pub fn as_gen12(&self) -> Option<&RenderInterfaceG12> {
        match self {
            Self::Gen12(render) => Some(render),
            Self::XeHpg(_) => None,
        }
    }

    pub fn as_xe_hpg(&self) -> Option<&RenderInterfaceXeHpg> {
        match self {
            Self::XeHpg(render) => Some(render),
            Self::Gen12(_) => None,
        }
    }
}

/// Every command interface of one platform, sharing one OS interface.
#[derive(Debug)]
pub struct HwInterface {
    pub family: ProductFamily,
    pub caps: &'static HwCaps,
    pub mi: MiInterfaceG12,
    pub render: RenderInterface,
    pub mfx: MfxInterfaceG12,
    pub hcp: HcpInterfaceG12,
    pub avp: AvpInterfaceG12,
    pub huc: HucInterface,
    pub vdenc: VdencInterfaceG12,
    pub vebox: VeboxInterfaceG12,
    /// Initialized for the video engine. `None` when the OS layer reports no video engine
    /// instance.
    pub ve: Option<SinglePipeVirtualEngine>,
}

type HalCreator = fn(Arc<dyn OsInterface>, &'static HwCaps) -> HwInterface;

fn create_video_engine(os: Arc<dyn OsInterface>) -> Option<SinglePipeVirtualEngine> {
    let mut ve = match create_virtual_engine_state(os) {
        Ok(ve) => ve,
        Err(status) => {
            warn!(%status, "no virtual engine");
            return None;
        }
    };
    match ve.init_interface(EngineClass::Video) {
        Ok(()) => Some(ve),
        Err(status) => {
            warn!(%status, "virtual engine init failed");
            None
        }
    }
}

fn create_common(os: Arc<dyn OsInterface>, caps: &'static HwCaps, render: RenderInterface) -> HwInterface {
    HwInterface {
        family: caps.family,
        caps,
        mi: MiInterfaceG12::new(os.clone(), caps),
        render,
        mfx: MfxInterfaceG12::new(os.clone(), caps),
        hcp: HcpInterfaceG12::new(os.clone(), caps),
        avp: AvpInterfaceG12::new(os.clone(), caps),
        huc: HucInterface::new(os.clone(), caps),
        vdenc: VdencInterfaceG12::new(os.clone(), caps),
        vebox: VeboxInterfaceG12::new(os.clone(), caps),
        ve: create_video_engine(os),
    }
}

fn create_gen12(os: Arc<dyn OsInterface>, caps: &'static HwCaps) -> HwInterface {
    let render = RenderInterface::Gen12(RenderInterfaceG12::new(os.clone(), caps));
    create_common(os, caps, render)
}

fn create_xe_hpg(os: Arc<dyn OsInterface>, caps: &'static HwCaps) -> HwInterface {
    let render = RenderInterface::XeHpg(RenderInterfaceXeHpg::new(os.clone(), caps));
    create_common(os, caps, render)
}

static CREATORS: Lazy<HashMap<ProductFamily, HalCreator>> = Lazy::new(|| {
    let mut creators: HashMap<ProductFamily, HalCreator> = HashMap::new();
    creators.insert(ProductFamily::TigerlakeLp, create_gen12);
    creators.insert(ProductFamily::Dg1, create_gen12);
    creators.insert(ProductFamily::Dg2, create_xe_hpg);
    creators.insert(ProductFamily::Acm, create_xe_hpg);
    creators
});

/// Families [`create_hal_for_generation`] can build interfaces for.
pub fn registered_families() -> Vec<ProductFamily> {
    let mut families: Vec<_> = CREATORS.keys().copied().collect();
    families.sort_by_key(|family| family.repr());
    families
}

/// Creates the interfaces for `family`, or `None` if the family is not registered.
#[tracing::instrument(skip(os))]
pub fn create_hal_for_generation(family: ProductFamily, os: Arc<dyn OsInterface>) -> Option<HwInterface> {
    let creator = CREATORS.get(&family)?;
    let caps = caps_for(family)?;
    let hal = creator(os, caps);
    debug_assert_eq!(
        matches!(hal.render, RenderInterface::XeHpg(_)),
        caps.generation == Generation::XeHpg
    );
    debug!(generation = ?caps.generation, ve = hal.ve.is_some(), "hardware interface created");
    Some(hal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::os::MockOs;

    #[test]
    fn unregistered_family_yields_none() {
        let os = Arc::new(MockOs::new());
        assert!(create_hal_for_generation(ProductFamily::Skylake, os.clone()).is_none());
        assert!(create_hal_for_generation(ProductFamily::IcelakeLp, os).is_none());
    }

    #[test]
    fn render_follows_generation() {
        let tgl = create_hal_for_generation(ProductFamily::TigerlakeLp, Arc::new(MockOs::new())).unwrap();
        assert!(tgl.render.as_gen12().is_some());
        assert_eq!(tgl.caps.generation, Generation::Gen12);

        let dg2 = create_hal_for_generation(ProductFamily::Dg2, Arc::new(MockOs::new())).unwrap();
        assert!(dg2.render.as_xe_hpg().is_some());
        assert_eq!(dg2.render.caps().family, ProductFamily::Dg2);
    }

    #[test]
    fn virtual_engine_is_initialized() {
        let hal = create_hal_for_generation(ProductFamily::Dg1, Arc::new(MockOs::new())).unwrap();
        let ve = hal.ve.unwrap();
        assert_eq!(ve.state(), crate::ve::VeState::Initialized);
        assert_eq!(ve.engine_count(), 1);

        let scalable = Arc::new(MockOs::new().with_scalability(true));
        let hal = create_hal_for_generation(ProductFamily::Dg1, scalable).unwrap();
        assert_eq!(hal.ve.unwrap().engine_count(), 1);

        let no_video = Arc::new(MockOs::new().with_engine_instances(EngineClass::Video, Vec::new()));
        let hal = create_hal_for_generation(ProductFamily::Dg1, no_video).unwrap();
        assert!(hal.ve.is_none());
    }

    #[test]
    fn registry_lists_four_families() {
        assert_eq!(
            registered_families(),
            vec![
                ProductFamily::TigerlakeLp,
                ProductFamily::Dg1,
                ProductFamily::Dg2,
                ProductFamily::Acm
            ]
        );
    }
}
