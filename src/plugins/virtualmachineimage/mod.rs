// Copyright 2024 The Kubernetes Authors.
// Licensed under the Apache License, Version 2.0

//! VirtualMachineImage storage class parameters admission controller.
//!
//! On create and update, this controller merges the cluster-wide default
//! storage class parameters (from the `image-default-storage-class-parameters`
//! setting) with the parameters set on the image, and patches the merged set
//! onto `spec.extraStorageClassParameters`. Keys set on the image win.

mod config;
pub mod parameters;

pub use config::Configuration;

use crate::admission::{
    AdmissionError, AdmissionResult, Attributes, Handler, Interface, MutationInterface, Operation,
    PatchOps, PluginContext, Plugins,
};
use crate::api::harvester::{self, VirtualMachineImage};
use crate::settings::SettingLister;
use parameters::{
    build_patch, merge_parameters, parameters_unchanged, patch_verb, resolve_default_parameters,
};
use std::io::Read;
use std::sync::Arc;
use tracing::debug;

pub const PLUGIN_NAME: &str = "VirtualMachineImageStorageClassParameters";

pub fn register(plugins: &Plugins) {
    plugins.register(
        PLUGIN_NAME,
        |config: Option<&mut dyn Read>, context: &PluginContext| {
            let config = Configuration::load(config)?;
            let mut plugin = Plugin::with_config(config);
            if let Some(settings) = &context.settings {
                plugin.set_setting_lister(Arc::clone(settings));
            }
            Ok(Arc::new(plugin) as Arc<dyn MutationInterface>)
        },
    );
}

pub struct Plugin {
    handler: Handler,
    config: Configuration,
    /// Lister for Setting objects.
    settings: Option<Arc<dyn SettingLister>>,
}

impl Plugin {
    pub fn new() -> Self {
        Self::with_config(Configuration::default())
    }

    pub fn with_config(config: Configuration) -> Self {
        Self {
            handler: Handler::new_create_update(),
            config,
            settings: None,
        }
    }

    /// Create a plugin with a setting lister already set.
    pub fn with_setting_lister(settings: Arc<dyn SettingLister>) -> Self {
        let mut plugin = Self::new();
        plugin.set_setting_lister(settings);
        plugin
    }

    pub fn set_setting_lister(&mut self, settings: Arc<dyn SettingLister>) {
        self.settings = Some(settings);
    }

    /// Compute the patch recording the effective storage class parameters on
    /// `image`. `old_image` is the stored object and is only set on update.
    pub fn patch_storage_class_parameters(
        &self,
        old_image: Option<&VirtualMachineImage>,
        image: &VirtualMachineImage,
    ) -> AdmissionResult<PatchOps> {
        let settings = self
            .settings
            .as_deref()
            .ok_or_else(|| AdmissionError::not_ready(PLUGIN_NAME))?;

        let defaults = resolve_default_parameters(settings, &self.config.setting_name)?;
        let incoming = image.spec.extra_storage_class_parameters.as_ref();
        let effective = merge_parameters(defaults.as_ref(), incoming);

        if let Some(old_image) = old_image {
            let stored = old_image.spec.extra_storage_class_parameters.as_ref();
            if parameters_unchanged(stored, &effective) {
                debug!(
                    image = %image.name,
                    namespace = %image.namespace,
                    "storage class parameters unchanged, skipping patch"
                );
                return Ok(Vec::new());
            }
        }

        let verb = patch_verb(incoming);
        let op = build_patch(verb, &effective)?;
        debug!(
            image = %image.name,
            namespace = %image.namespace,
            op = %verb,
            parameters = effective.len(),
            "patching storage class parameters"
        );
        Ok(vec![op])
    }
}

impl Default for Plugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Interface for Plugin {
    fn handles(&self, operation: Operation) -> bool {
        self.handler.handles(operation)
    }
}

impl MutationInterface for Plugin {
    fn admit(&self, attributes: &dyn Attributes) -> AdmissionResult<PatchOps> {
        if attributes.get_resource().group_resource() != harvester::virtual_machine_image_group_resource() {
            return Ok(Vec::new());
        }

        // Ignore subresources
        if !attributes.get_subresource().is_empty() {
            return Ok(Vec::new());
        }

        let operation = attributes.get_operation();
        if !self.handles(operation) {
            return Ok(Vec::new());
        }

        let image = attributes
            .get_object()
            .and_then(|obj| obj.as_any().downcast_ref::<VirtualMachineImage>())
            .ok_or_else(|| {
                AdmissionError::bad_request(format!(
                    "Expected VirtualMachineImage resource, got: {}",
                    attributes.get_kind().kind
                ))
            })?;

        let old_image = match operation {
            Operation::Update => Some(
                attributes
                    .get_old_object()
                    .and_then(|obj| obj.as_any().downcast_ref::<VirtualMachineImage>())
                    .ok_or_else(|| {
                        AdmissionError::bad_request("Expected old VirtualMachineImage on update")
                    })?,
            ),
            _ => None,
        };

        self.patch_storage_class_parameters(old_image, image)
    }
}
