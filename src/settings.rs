//! Process-wide user settings.
//!
//! The table is created by the first [`MediaUserSettingsMgr::init`] and destroyed by the
//! matching last [`MediaUserSettingsMgr::close`]. Handles stay readable after teardown, but
//! a new `init` builds a fresh table.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard, RwLock},
};

use once_cell::sync::Lazy;
use tracing::{debug, trace, warn};

use crate::MhwStatus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Bool(bool),
    U32(u32),
    U64(u64),
    I32(i32),
    String(String),
}

impl SettingValue {
    fn same_kind(&self, other: &SettingValue) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::U32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::U64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::I32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::U32(v) => write!(f, "{v}"),
            Self::U64(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
        }
    }
}

pub const DISABLE_SCALABILITY: &str = "Disable Scalability";
pub const ENABLE_FRAME_TRACKING: &str = "Enable Frame Tracking";
pub const FORCE_VDBOX: &str = "Force VDBOX";
pub const MEDIA_RESET_THRESHOLD: &str = "Media Reset TH";
pub const SSEU_SETTING_OVERRIDE: &str = "SSEU Setting Override";
pub const VE_DEBUG_OVERRIDE: &str = "VE Debug Override";
pub const HUC_FIRMWARE_PATH: &str = "HuC Firmware Path";

fn defaults() -> HashMap<String, SettingValue> {
    [
        (DISABLE_SCALABILITY, SettingValue::Bool(false)),
        (ENABLE_FRAME_TRACKING, SettingValue::Bool(true)),
        (FORCE_VDBOX, SettingValue::U32(0)),
        (MEDIA_RESET_THRESHOLD, SettingValue::U32(0)),
        (SSEU_SETTING_OVERRIDE, SettingValue::U64(0xDEAD_BEEF)),
        (VE_DEBUG_OVERRIDE, SettingValue::I32(0)),
        (HUC_FIRMWARE_PATH, SettingValue::String(String::new())),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value))
    .collect()
}

/// A settings table. Keys are fixed at creation; values keep the type of their default.
#[derive(Debug)]
pub struct MediaUserSettings {
    values: RwLock<HashMap<String, SettingValue>>,
}

impl MediaUserSettings {
    fn with_defaults() -> Self {
        Self {
            values: RwLock::new(defaults()),
        }
    }

    pub fn get(&self, key: &str) -> Option<SettingValue> {
        let values = self.values.read().unwrap_or_else(|e| e.into_inner());
        values.get(key).cloned()
    }

    /// Unknown keys and values of the wrong type are rejected with `InvalidParameter`.
    pub fn set(&self, key: &str, value: SettingValue) -> Result<(), MhwStatus> {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        let slot = values.get_mut(key).ok_or(MhwStatus::InvalidParameter)?;
        if !slot.same_kind(&value) {
            warn!(key, current = %slot, new = %value, "setting type mismatch");
            return Err(MhwStatus::InvalidParameter);
        }
        trace!(key, %value, "setting updated");
        *slot = value;
        Ok(())
    }

    pub fn keys(&self) -> Vec<String> {
        let values = self.values.read().unwrap_or_else(|e| e.into_inner());
        let mut keys: Vec<_> = values.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[derive(Debug, Default)]
struct MgrState {
    ref_count: u32,
    settings: Option<Arc<MediaUserSettings>>,
    init_count: u32,
    teardown_count: u32,
}

/// Reference counted owner of the settings table.
#[derive(Debug, Default)]
pub struct MediaUserSettingsMgr {
    state: Mutex<MgrState>,
}

static GLOBAL: Lazy<MediaUserSettingsMgr> = Lazy::new(MediaUserSettingsMgr::new);

impl MediaUserSettingsMgr {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide manager.
    pub fn global() -> &'static MediaUserSettingsMgr {
        &GLOBAL
    }

    fn lock(&self) -> MutexGuard<'_, MgrState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn init(&self) -> Arc<MediaUserSettings> {
        let mut state = self.lock();
        state.ref_count += 1;
        if let Some(settings) = &state.settings {
            return settings.clone();
        }

        let settings = Arc::new(MediaUserSettings::with_defaults());
        state.settings = Some(settings.clone());
        state.init_count += 1;
        debug!(init_count = state.init_count, "user settings created");
        settings
    }

    /// Drops one reference. The table is destroyed when the last one goes; closing more
    /// often than initializing gives `InvalidHandle`.
    pub fn close(&self) -> Result<(), MhwStatus> {
        let mut state = self.lock();
        if state.ref_count == 0 {
            return Err(MhwStatus::InvalidHandle);
        }
        state.ref_count -= 1;
        if state.ref_count == 0 {
            state.settings = None;
            state.teardown_count += 1;
            debug!(teardown_count = state.teardown_count, "user settings destroyed");
        }
        Ok(())
    }

    pub fn settings(&self) -> Option<Arc<MediaUserSettings>> {
        self.lock().settings.clone()
    }

    pub fn ref_count(&self) -> u32 {
        self.lock().ref_count
    }

    /// Times a table was actually created.
    pub fn init_count(&self) -> u32 {
        self.lock().init_count
    }

    /// Times a table was actually destroyed.
    pub fn teardown_count(&self) -> u32 {
        self.lock().teardown_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_counting() {
        let mgr = MediaUserSettingsMgr::new();
        let a = mgr.init();
        let b = mgr.init();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(mgr.init_count(), 1);

        mgr.close().unwrap();
        assert!(mgr.settings().is_some());
        mgr.close().unwrap();
        assert!(mgr.settings().is_none());
        assert_eq!(mgr.teardown_count(), 1);
        assert_eq!(mgr.close(), Err(MhwStatus::InvalidHandle));

        let c = mgr.init();
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(mgr.init_count(), 2);
    }

    #[test]
    fn typed_values() {
        let mgr = MediaUserSettingsMgr::new();
        let settings = mgr.init();
        assert_eq!(settings.get(DISABLE_SCALABILITY).and_then(|v| v.as_bool()), Some(false));

        settings.set(FORCE_VDBOX, SettingValue::U32(2)).unwrap();
        assert_eq!(settings.get(FORCE_VDBOX), Some(SettingValue::U32(2)));

        assert_eq!(
            settings.set(FORCE_VDBOX, SettingValue::Bool(true)),
            Err(MhwStatus::InvalidParameter)
        );
        assert_eq!(
            settings.set("No Such Key", SettingValue::U32(1)),
            Err(MhwStatus::InvalidParameter)
        );
        assert_eq!(settings.get("No Such Key"), None);
        assert_eq!(settings.keys().len(), 7);
    }
}
