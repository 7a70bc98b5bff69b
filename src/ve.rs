//! Virtual engine scheduling for single-pipe submissions.
//!
//! A virtual engine lets the kernel driver pick the physical VDBOX/VEBOX a submission runs
//! on. Single-pipe workloads always target one engine, so the state machine only has to
//! carry the hint into each command buffer:
//!
//! ```text
//! Uninitialized -> Initialized -> HintSet -> Populated
//!        ^------------------ destroy() -------------'
//! ```
//!
//! Under context based scheduling the kernel places the context itself and hints are ignored.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::{
    cmdbuffer::CommandBuffer,
    constants::EngineClass,
    os::{EnhancedContextOptions, GpuContextCreateOptions, OsInterface},
    MhwStatus,
};

/// Most engines a hint can name.
pub const MAX_ENGINE_INSTANCE_NUM: usize = 4;

/// Placement information attached to one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VeHint {
    pub batch_buffer_count: u32,
    pub engine_logical_id: [u8; MAX_ENGINE_INSTANCE_NUM],
    pub using_frame_split: bool,
    pub same_engine_as_last_submission: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VeHintParams {
    pub batch_buffer_count: u32,
    pub using_frame_split: bool,
    pub same_engine_as_last_submission: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VeState {
    Uninitialized,
    Initialized,
    HintSet,
    Populated,
}

pub struct SinglePipeVirtualEngine {
    os: Arc<dyn OsInterface>,
    state: VeState,
    engine_class: EngineClass,
    engine_count: u32,
    engine_logical_id: u8,
    ctx_based_scheduling: bool,
    hint: Option<VeHint>,
}

impl std::fmt::Debug for SinglePipeVirtualEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinglePipeVirtualEngine")
            .field("state", &self.state)
            .field("engine_class", &self.engine_class)
            .field("engine_count", &self.engine_count)
            .field("ctx_based_scheduling", &self.ctx_based_scheduling)
            .field("hint", &self.hint)
            .finish()
    }
}

/// Picks the virtual engine implementation for the platform. Only single-pipe is provided, so
/// platforms reporting scalability still get a single-pipe engine.
pub fn create_virtual_engine_state(os: Arc<dyn OsInterface>) -> Result<SinglePipeVirtualEngine, MhwStatus> {
    if os.is_scalability_supported() {
        debug!("scalability supported, using a single-pipe virtual engine");
    }
    Ok(SinglePipeVirtualEngine::new(os))
}

impl SinglePipeVirtualEngine {
    pub fn new(os: Arc<dyn OsInterface>) -> Self {
        Self {
            os,
            state: VeState::Uninitialized,
            engine_class: EngineClass::Video,
            engine_count: 0,
            engine_logical_id: 0,
            ctx_based_scheduling: false,
            hint: None,
        }
    }

    pub fn state(&self) -> VeState {
        self.state
    }

    pub fn engine_count(&self) -> u32 {
        self.engine_count
    }

    pub fn hint(&self) -> Option<&VeHint> {
        self.hint.as_ref()
    }

    /// Binds the engine to the first instance of `engine_class`.
    #[tracing::instrument(skip(self))]
    pub fn init_interface(&mut self, engine_class: EngineClass) -> Result<(), MhwStatus> {
        let instances = self.os.engine_instances(engine_class);
        let first = instances.first().ok_or(MhwStatus::PlatformNotSupported)?;

        self.engine_class = engine_class;
        self.engine_logical_id = first.logical_id;
        self.engine_count = 1;
        self.ctx_based_scheduling = self.os.is_ctx_based_scheduling();
        self.hint = None;
        self.state = VeState::Initialized;
        debug!(
            instances = instances.len(),
            scalability = self.os.is_scalability_supported(),
            logical_id = first.logical_id,
            ctx_based = self.ctx_based_scheduling,
            "virtual engine initialized"
        );
        Ok(())
    }

    pub fn set_hint_params(&mut self, params: &VeHintParams) -> Result<(), MhwStatus> {
        if self.state == VeState::Uninitialized {
            return Err(MhwStatus::NullPointer);
        }
        if self.ctx_based_scheduling {
            trace!("hint ignored under context based scheduling");
            return Ok(());
        }
        if params.batch_buffer_count != 1 {
            return Err(MhwStatus::InvalidParameter);
        }

        let mut engine_logical_id = [0u8; MAX_ENGINE_INSTANCE_NUM];
        engine_logical_id[0] = self.engine_logical_id;
        self.hint = Some(VeHint {
            batch_buffer_count: params.batch_buffer_count,
            engine_logical_id,
            using_frame_split: params.using_frame_split,
            same_engine_as_last_submission: params.same_engine_as_last_submission,
        });
        self.state = VeState::HintSet;
        Ok(())
    }

    /// Attaches the current hint to `buffer`.
    pub fn populate_hint_params(&mut self, buffer: &mut CommandBuffer) -> Result<(), MhwStatus> {
        if self.ctx_based_scheduling {
            return Ok(());
        }
        let hint = self.hint.as_ref().ok_or(MhwStatus::NullPointer)?;
        buffer.attributes.use_virtual_engine_hint = true;
        buffer.attributes.virtual_engine_hint = Some(hint.clone());
        self.state = VeState::Populated;
        Ok(())
    }

    pub fn construct_parms_for_gpu_ctx_creation(
        &self,
        options: &mut GpuContextCreateOptions,
    ) -> Result<(), MhwStatus> {
        if self.state == VeState::Uninitialized {
            return Err(MhwStatus::NullPointer);
        }
        let enhanced = options.enhanced.get_or_insert_with(EnhancedContextOptions::default);
        enhanced.lrca_count = self.engine_count;
        enhanced.engine_instance = vec![self.engine_logical_id];
        options.engine_class = self.engine_class;
        Ok(())
    }

    pub fn destroy(&mut self) {
        self.hint = None;
        self.engine_count = 0;
        self.state = VeState::Uninitialized;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::os::{EngineInstance, MockOs};

    fn engine(os: MockOs) -> SinglePipeVirtualEngine {
        let mut ve = create_virtual_engine_state(Arc::new(os)).unwrap();
        ve.init_interface(EngineClass::Video).unwrap();
        ve
    }

    #[test]
    fn hint_flows_into_command_buffer() {
        let os = MockOs::new().with_engine_instances(
            EngineClass::Video,
            vec![EngineInstance {
                logical_id: 2,
                physical_id: 5,
            }],
        );
        let mut ve = engine(os);
        assert_eq!(ve.state(), VeState::Initialized);
        assert_eq!(ve.engine_count(), 1);

        let mut buffer = CommandBuffer::new(64);
        assert_eq!(ve.populate_hint_params(&mut buffer), Err(MhwStatus::NullPointer));

        ve.set_hint_params(&VeHintParams {
            batch_buffer_count: 1,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(ve.state(), VeState::HintSet);

        ve.populate_hint_params(&mut buffer).unwrap();
        assert_eq!(ve.state(), VeState::Populated);
        assert!(buffer.attributes.use_virtual_engine_hint);
        let hint = buffer.attributes.virtual_engine_hint.as_ref().unwrap();
        assert_eq!(hint.engine_logical_id[0], 2);
        assert_eq!(hint.batch_buffer_count, 1);

        ve.destroy();
        assert_eq!(ve.state(), VeState::Uninitialized);
        assert!(ve.hint().is_none());
    }

    #[test]
    fn multiple_batches_are_rejected() {
        let mut ve = engine(MockOs::new());
        assert_eq!(
            ve.set_hint_params(&VeHintParams {
                batch_buffer_count: 2,
                ..Default::default()
            }),
            Err(MhwStatus::InvalidParameter)
        );
        assert_eq!(ve.state(), VeState::Initialized);
    }

    #[test]
    fn context_based_scheduling_ignores_hints() {
        let mut ve = engine(MockOs::new().with_ctx_based_scheduling(true));
        ve.set_hint_params(&VeHintParams {
            batch_buffer_count: 3,
            ..Default::default()
        })
        .unwrap();
        assert!(ve.hint().is_none());

        let mut buffer = CommandBuffer::new(64);
        ve.populate_hint_params(&mut buffer).unwrap();
        assert!(!buffer.attributes.use_virtual_engine_hint);
    }

    #[test]
    fn uninitialized_engine_refuses_hints() {
        let mut ve = SinglePipeVirtualEngine::new(Arc::new(MockOs::new()));
        assert_eq!(
            ve.set_hint_params(&VeHintParams::default()),
            Err(MhwStatus::NullPointer)
        );
        let mut options = GpuContextCreateOptions::basic(EngineClass::Video);
        assert_eq!(
            ve.construct_parms_for_gpu_ctx_creation(&mut options),
            Err(MhwStatus::NullPointer)
        );
    }

    #[test]
    fn missing_engine_class() {
        let os = MockOs::new().with_engine_instances(EngineClass::Video, vec![]);
        let mut ve = SinglePipeVirtualEngine::new(Arc::new(os));
        assert_eq!(
            ve.init_interface(EngineClass::Video),
            Err(MhwStatus::PlatformNotSupported)
        );
    }

    #[test]
    fn scalable_platforms_get_a_single_pipe_engine() {
        let os = MockOs::new().with_scalability(true).with_engine_instances(
            EngineClass::Video,
            vec![
                EngineInstance {
                    logical_id: 0,
                    physical_id: 0,
                },
                EngineInstance {
                    logical_id: 1,
                    physical_id: 2,
                },
            ],
        );
        let mut ve = create_virtual_engine_state(Arc::new(os)).unwrap();
        ve.init_interface(EngineClass::Video).unwrap();
        assert_eq!(ve.state(), VeState::Initialized);
        assert_eq!(ve.engine_count(), 1);

        ve.set_hint_params(&VeHintParams {
            batch_buffer_count: 1,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(ve.state(), VeState::HintSet);
    }

    #[test]
    fn context_creation_options() {
        let ve = engine(MockOs::new());
        let mut options = GpuContextCreateOptions::basic(EngineClass::Render);
        ve.construct_parms_for_gpu_ctx_creation(&mut options).unwrap();
        assert_eq!(options.engine_class, EngineClass::Video);
        let enhanced = options.enhanced.unwrap();
        assert_eq!(enhanced.lrca_count, 1);
        assert_eq!(enhanced.engine_instance, vec![0]);
    }
}
