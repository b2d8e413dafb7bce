// Copyright 2024 The Kubernetes Authors.
// Licensed under the Apache License, Version 2.0

//! Read access to cluster settings.
//!
//! Plugins look settings up by name through a [`SettingLister`]. How the
//! lister is kept fresh (watch, periodic resync) is up to the embedder.

use crate::admission::{AdmissionError, AdmissionResult};
use crate::api::harvester::{Setting, SETTING_KIND};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Trait for looking up Setting objects by name.
pub trait SettingLister: Send + Sync {
    /// Get the named setting.
    ///
    /// A missing setting is reported as [`AdmissionError::NotFound`].
    fn get(&self, name: &str) -> AdmissionResult<Setting>;
}

/// In-memory implementation of SettingLister.
pub struct InMemorySettingLister {
    settings: RwLock<HashMap<String, Setting>>,
}

impl InMemorySettingLister {
    pub fn new() -> Self {
        Self {
            settings: RwLock::new(HashMap::new()),
        }
    }

    /// Insert or replace a setting, keyed by its name.
    pub fn add_setting(&self, setting: Setting) {
        let mut settings = self.settings.write().unwrap_or_else(PoisonError::into_inner);
        settings.insert(setting.name.clone(), setting);
    }

    pub fn remove_setting(&self, name: &str) -> Option<Setting> {
        let mut settings = self.settings.write().unwrap_or_else(PoisonError::into_inner);
        settings.remove(name)
    }
}

impl Default for InMemorySettingLister {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingLister for InMemorySettingLister {
    fn get(&self, name: &str) -> AdmissionResult<Setting> {
        let settings = self.settings.read().unwrap_or_else(PoisonError::into_inner);
        settings
            .get(name)
            .cloned()
            .ok_or_else(|| AdmissionError::not_found(SETTING_KIND, name))
    }
}
