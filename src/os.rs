//! The OS services the command builders depend on, and an in-process implementation.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use tracing::{debug, trace, warn};

use crate::{
    constants::{EngineClass, ResourceAccess, SkuFlags, TileType},
    utils::{align_up, PAGE_SIZE},
    MhwStatus,
};

pub type ResourceId = u32;

/// A GPU buffer or surface as seen by the command builders. The GPU address is only
/// known to the OS layer; commands carry relocations until submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuResource {
    id: ResourceId,
    size: u32,
    name: Arc<str>,
    pub tile_type: TileType,
    pub compressible: bool,
}

impl GpuResource {
    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineInstance {
    pub logical_id: u8,
    pub physical_id: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpuContextHandle(pub u32);

impl GpuContextHandle {
    pub const INVALID: GpuContextHandle = GpuContextHandle(u32::MAX);
}

/// Extra context creation options used when the kernel driver schedules per context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnhancedContextOptions {
    pub lrca_count: u32,
    pub using_sfc: bool,
    /// Logical engine ids the context may be placed on.
    pub engine_instance: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuContextCreateOptions {
    pub engine_class: EngineClass,
    pub cmd_buffer_num_scale: u32,
    pub enhanced: Option<EnhancedContextOptions>,
}

impl GpuContextCreateOptions {
    pub fn basic(engine_class: EngineClass) -> Self {
        Self {
            engine_class,
            cmd_buffer_num_scale: 1,
            enhanced: None,
        }
    }

    pub fn enhanced(engine_class: EngineClass, options: EnhancedContextOptions) -> Self {
        Self {
            engine_class,
            cmd_buffer_num_scale: 1,
            enhanced: Some(options),
        }
    }
}

pub trait OsInterface: Send + Sync {
    /// Offset and size of the indirect state area inside the current command buffer.
    fn get_indirect_state(&self) -> Result<(u32, u32), MhwStatus>;

    fn allocate_resource(&self, size: u32, name: &str) -> Result<GpuResource, MhwStatus>;

    fn free_resource(&self, resource: &GpuResource) -> Result<(), MhwStatus>;

    /// Records that the next submission reads and/or writes `resource`.
    fn register_resource(&self, resource: &GpuResource, access: ResourceAccess) -> Result<(), MhwStatus>;

    /// Address the resource is expected to live at, if the OS tracks one.
    fn presumed_address(&self, resource: &GpuResource) -> Option<u64>;

    fn engine_instances(&self, class: EngineClass) -> Vec<EngineInstance>;

    fn is_scalability_supported(&self) -> bool;

    fn is_ctx_based_scheduling(&self) -> bool;

    fn create_gpu_context(&self, options: &GpuContextCreateOptions) -> Result<GpuContextHandle, MhwStatus>;

    fn destroy_gpu_context(&self, handle: GpuContextHandle) -> Result<(), MhwStatus>;

    fn current_gpu_context(&self) -> GpuContextHandle;

    fn current_engine_class(&self) -> EngineClass;

    fn sku(&self) -> SkuFlags;

    /// The kernel driver does not patch command buffers, so the indirect state base must be
    /// programmed explicitly.
    fn no_kmd_parsing(&self) -> bool;

    /// Post-sync writes issued on `class` target the global GTT instead of the per-process one.
    fn use_global_gtt(&self, _class: EngineClass) -> bool {
        false
    }
}

const MOCK_GPU_VA_BASE: u64 = 0x1_0000_0000;

#[derive(Debug)]
struct MockAllocation {
    address: u64,
    access: ResourceAccess,
}

#[derive(Debug)]
struct MockState {
    next_id: ResourceId,
    next_address: u64,
    allocations: HashMap<ResourceId, MockAllocation>,
    next_context: u32,
    contexts: HashMap<GpuContextHandle, GpuContextCreateOptions>,
    current_context: GpuContextHandle,
}

/// In-memory [`OsInterface`] with deterministic, page-aligned GPU addresses.
#[derive(Debug)]
pub struct MockOs {
    state: Mutex<MockState>,
    indirect_state: (u32, u32),
    no_kmd_parsing: bool,
    ctx_based_scheduling: bool,
    scalability: bool,
    presumed_addresses: bool,
    global_gtt: bool,
    sku: SkuFlags,
    engines: HashMap<EngineClass, Vec<EngineInstance>>,
}

impl Default for MockOs {
    fn default() -> Self {
        Self::new()
    }
}

impl MockOs {
    pub fn new() -> Self {
        let mut engines = HashMap::new();
        for class in [
            EngineClass::Render,
            EngineClass::Video,
            EngineClass::VideoEnhance,
            EngineClass::Compute,
        ] {
            engines.insert(
                class,
                vec![EngineInstance {
                    logical_id: 0,
                    physical_id: 0,
                }],
            );
        }

        Self {
            state: Mutex::new(MockState {
                next_id: 1,
                next_address: MOCK_GPU_VA_BASE,
                allocations: HashMap::new(),
                next_context: 0,
                contexts: HashMap::new(),
                current_context: GpuContextHandle::INVALID,
            }),
            indirect_state: (0, 0),
            no_kmd_parsing: false,
            ctx_based_scheduling: false,
            scalability: false,
            presumed_addresses: true,
            global_gtt: false,
            sku: SkuFlags::empty(),
            engines,
        }
    }

    pub fn with_indirect_state(mut self, offset: u32, size: u32) -> Self {
        self.indirect_state = (offset, size);
        self
    }

    pub fn with_no_kmd_parsing(mut self, enabled: bool) -> Self {
        self.no_kmd_parsing = enabled;
        self
    }

    pub fn with_ctx_based_scheduling(mut self, enabled: bool) -> Self {
        self.ctx_based_scheduling = enabled;
        self
    }

    pub fn with_scalability(mut self, enabled: bool) -> Self {
        self.scalability = enabled;
        self
    }

    pub fn with_engine_instances(mut self, class: EngineClass, instances: Vec<EngineInstance>) -> Self {
        self.engines.insert(class, instances);
        self
    }

    pub fn with_global_gtt(mut self, enabled: bool) -> Self {
        self.global_gtt = enabled;
        self
    }

    pub fn with_sku(mut self, sku: SkuFlags) -> Self {
        self.sku = sku;
        self
    }

    /// Relocations are then written with a zero presumed address.
    pub fn without_presumed_addresses(mut self) -> Self {
        self.presumed_addresses = false;
        self
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Address assigned at allocation time, regardless of presumed address reporting.
    pub fn gpu_address(&self, id: ResourceId) -> Option<u64> {
        self.lock().allocations.get(&id).map(|a| a.address)
    }

    pub fn registered_access(&self, id: ResourceId) -> Option<ResourceAccess> {
        self.lock().allocations.get(&id).map(|a| a.access)
    }

    pub fn context_options(&self, handle: GpuContextHandle) -> Option<GpuContextCreateOptions> {
        self.lock().contexts.get(&handle).cloned()
    }

    pub fn set_gpu_context(&self, handle: GpuContextHandle) -> Result<(), MhwStatus> {
        let mut state = self.lock();
        if !state.contexts.contains_key(&handle) {
            return Err(MhwStatus::InvalidHandle);
        }
        state.current_context = handle;
        Ok(())
    }
}

impl OsInterface for MockOs {
    fn get_indirect_state(&self) -> Result<(u32, u32), MhwStatus> {
        Ok(self.indirect_state)
    }

    fn allocate_resource(&self, size: u32, name: &str) -> Result<GpuResource, MhwStatus> {
        if size == 0 {
            return Err(MhwStatus::InvalidParameter);
        }
        let mut state = self.lock();
        let id = state.next_id;
        let address = state.next_address;
        state.next_id += 1;
        state.next_address += align_up(size, PAGE_SIZE) as u64;
        state.allocations.insert(
            id,
            MockAllocation {
                address,
                access: ResourceAccess::empty(),
            },
        );
        trace!(id, size, address, name, "allocated resource");

        Ok(GpuResource {
            id,
            size,
            name: Arc::from(name),
            tile_type: TileType::Linear,
            compressible: false,
        })
    }

    fn free_resource(&self, resource: &GpuResource) -> Result<(), MhwStatus> {
        match self.lock().allocations.remove(&resource.id) {
            Some(_) => Ok(()),
            None => {
                warn!(id = resource.id, "freeing unknown resource");
                Err(MhwStatus::InvalidHandle)
            }
        }
    }

    fn register_resource(&self, resource: &GpuResource, access: ResourceAccess) -> Result<(), MhwStatus> {
        let mut state = self.lock();
        let allocation = state
            .allocations
            .get_mut(&resource.id)
            .ok_or(MhwStatus::InvalidHandle)?;
        allocation.access |= access;
        Ok(())
    }

    fn presumed_address(&self, resource: &GpuResource) -> Option<u64> {
        if !self.presumed_addresses {
            return None;
        }
        self.gpu_address(resource.id)
    }

    fn engine_instances(&self, class: EngineClass) -> Vec<EngineInstance> {
        self.engines.get(&class).cloned().unwrap_or_default()
    }

    fn is_scalability_supported(&self) -> bool {
        self.scalability
    }

    fn is_ctx_based_scheduling(&self) -> bool {
        self.ctx_based_scheduling
    }

    fn create_gpu_context(&self, options: &GpuContextCreateOptions) -> Result<GpuContextHandle, MhwStatus> {
        if self.engine_instances(options.engine_class).is_empty() {
            return Err(MhwStatus::InvalidParameter);
        }
        let mut state = self.lock();
        let handle = GpuContextHandle(state.next_context);
        state.next_context += 1;
        state.contexts.insert(handle, options.clone());
        state.current_context = handle;
        debug!(?handle, class = ?options.engine_class, enhanced = options.enhanced.is_some(), "created gpu context");
        Ok(handle)
    }

    fn destroy_gpu_context(&self, handle: GpuContextHandle) -> Result<(), MhwStatus> {
        let mut state = self.lock();
        state.contexts.remove(&handle).ok_or(MhwStatus::InvalidHandle)?;
        if state.current_context == handle {
            state.current_context = GpuContextHandle::INVALID;
        }
        Ok(())
    }

    fn current_gpu_context(&self) -> GpuContextHandle {
        self.lock().current_context
    }

    fn current_engine_class(&self) -> EngineClass {
        let state = self.lock();
        state
            .contexts
            .get(&state.current_context)
            .map(|o| o.engine_class)
            .unwrap_or(EngineClass::Render)
    }

    fn sku(&self) -> SkuFlags {
        self.sku
    }

    fn no_kmd_parsing(&self) -> bool {
        self.no_kmd_parsing
    }

    fn use_global_gtt(&self, _class: EngineClass) -> bool {
        self.global_gtt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocations_are_page_aligned() {
        let os = MockOs::new();
        let a = os.allocate_resource(10, "a").unwrap();
        let b = os.allocate_resource(4097, "b").unwrap();
        let c = os.allocate_resource(1, "c").unwrap();
        assert_eq!(os.gpu_address(a.id()), Some(MOCK_GPU_VA_BASE));
        assert_eq!(os.gpu_address(b.id()), Some(MOCK_GPU_VA_BASE + 0x1000));
        assert_eq!(os.gpu_address(c.id()), Some(MOCK_GPU_VA_BASE + 0x3000));
        assert_eq!(b.name(), "b");
        assert_eq!(os.allocate_resource(0, "empty"), Err(MhwStatus::InvalidParameter));
    }

    #[test]
    fn register_accumulates_access() {
        let os = MockOs::new();
        let res = os.allocate_resource(64, "status").unwrap();
        os.register_resource(&res, ResourceAccess::READ).unwrap();
        os.register_resource(&res, ResourceAccess::WRITE).unwrap();
        assert_eq!(os.registered_access(res.id()), Some(ResourceAccess::READ_WRITE));

        os.free_resource(&res).unwrap();
        assert_eq!(
            os.register_resource(&res, ResourceAccess::READ),
            Err(MhwStatus::InvalidHandle)
        );
        assert_eq!(os.free_resource(&res), Err(MhwStatus::InvalidHandle));
    }

    #[test]
    fn presumed_addresses_can_be_hidden() {
        let os = MockOs::new().without_presumed_addresses();
        let res = os.allocate_resource(64, "x").unwrap();
        assert_eq!(os.presumed_address(&res), None);
        assert!(os.gpu_address(res.id()).is_some());
    }

    #[test]
    fn contexts_track_current_engine() {
        let os = MockOs::new();
        assert_eq!(os.current_gpu_context(), GpuContextHandle::INVALID);
        let render = os
            .create_gpu_context(&GpuContextCreateOptions::basic(EngineClass::Render))
            .unwrap();
        let video = os
            .create_gpu_context(&GpuContextCreateOptions::basic(EngineClass::Video))
            .unwrap();
        assert_eq!(os.current_engine_class(), EngineClass::Video);
        os.set_gpu_context(render).unwrap();
        assert_eq!(os.current_engine_class(), EngineClass::Render);

        os.destroy_gpu_context(video).unwrap();
        assert_eq!(os.destroy_gpu_context(video), Err(MhwStatus::InvalidHandle));
        assert_eq!(os.set_gpu_context(video), Err(MhwStatus::InvalidHandle));
    }

    #[test]
    fn context_needs_an_engine() {
        let os = MockOs::new().with_engine_instances(EngineClass::Blitter, vec![]);
        assert_eq!(
            os.create_gpu_context(&GpuContextCreateOptions::basic(EngineClass::Blitter)),
            Err(MhwStatus::InvalidParameter)
        );
    }
}
