// Copyright 2024 The Kubernetes Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Plugin registry for admission controllers.

use super::errors::{AdmissionError, AdmissionResult};
use super::interfaces::MutationInterface;
use crate::settings::SettingLister;
use std::collections::HashMap;
use std::io::Read;
use std::sync::{Arc, PoisonError, RwLock};

/// PluginContext carries the shared cluster caches handed to every plugin factory.
#[derive(Clone, Default)]
pub struct PluginContext {
    /// Read-through cache of cluster settings.
    pub settings: Option<Arc<dyn SettingLister>>,
}

impl PluginContext {
    pub fn new(settings: Arc<dyn SettingLister>) -> Self {
        Self {
            settings: Some(settings),
        }
    }
}

/// Factory is a function that creates an admission plugin instance.
pub type Factory = fn(
    config: Option<&mut dyn Read>,
    context: &PluginContext,
) -> AdmissionResult<Arc<dyn MutationInterface>>;

/// Plugins is a registry of admission plugins.
#[derive(Default)]
pub struct Plugins {
    registry: RwLock<HashMap<String, Factory>>,
}

impl Plugins {
    /// Create a new empty plugin registry.
    pub fn new() -> Self {
        Self {
            registry: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new admission plugin with the given name and factory.
    pub fn register(&self, name: &str, factory: Factory) {
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        registry.insert(name.to_string(), factory);
    }

    /// Get a factory for the given plugin name.
    pub fn get_factory(&self, name: &str) -> Option<Factory> {
        let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
        registry.get(name).copied()
    }

    /// Get all registered plugin names, sorted.
    pub fn registered_names(&self) -> Vec<String> {
        let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = registry.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a plugin is registered.
    pub fn is_registered(&self, name: &str) -> bool {
        let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
        registry.contains_key(name)
    }

    /// Create a new instance of the named plugin.
    pub fn new_from_plugins(
        &self,
        name: &str,
        config: Option<&mut dyn Read>,
        context: &PluginContext,
    ) -> AdmissionResult<Arc<dyn MutationInterface>> {
        let factory = self
            .get_factory(name)
            .ok_or_else(|| AdmissionError::internal_error(format!("unknown admission plugin: {}", name)))?;
        factory(config, context)
    }
}
