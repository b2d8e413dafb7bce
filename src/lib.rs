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

//! Mutating admission for virtual machine images.
//!
//! This crate computes the effective storage class parameters of a
//! VirtualMachineImage from the cluster-wide defaults setting and the
//! parameters set on the image, and answers admission requests with the
//! JSON patch that records them.

pub mod admission;
pub mod api;
pub mod plugins;
pub mod settings;

// Re-export commonly used types
pub use admission::{
    AdmissionError, AdmissionResult, Attributes, AttributesRecord, Handler, Interface,
    JsonPatchOperation, MutationInterface, Operation, PatchOps, PluginContext, Plugins,
};
pub use api::harvester::{ParameterMap, Setting, VirtualMachineImage, VirtualMachineImageSpec};
pub use settings::{InMemorySettingLister, SettingLister};
