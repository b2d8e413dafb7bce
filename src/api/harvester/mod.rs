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

//! harvesterhci.io/v1beta1 types: VirtualMachineImage and Setting.

use crate::admission::attributes::{GroupResource, GroupVersionKind, GroupVersionResource};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;

/// ParameterMap maps storage class parameter names to their values.
///
/// Keys iterate (and serialize) in lexicographic order.
pub type ParameterMap = BTreeMap<String, String>;

/// ApiObject is a trait for API objects that can be used in admission.
pub trait ApiObject: Send + Sync {
    /// Returns the object as Any for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Returns the kind of this object.
    fn kind(&self) -> &str;
}

// ============================================================================
// Constants
// ============================================================================

pub const GROUP: &str = "harvesterhci.io";
pub const VERSION: &str = "v1beta1";

pub const VIRTUAL_MACHINE_IMAGE_RESOURCE: &str = "virtualmachineimages";
pub const VIRTUAL_MACHINE_IMAGE_KIND: &str = "VirtualMachineImage";
pub const SETTING_KIND: &str = "Setting";

/// Name of the setting holding the cluster-wide default image storage class parameters.
pub const IMAGE_DEFAULT_STORAGE_CLASS_PARAMETERS_SETTING_NAME: &str =
    "image-default-storage-class-parameters";

/// JSON pointer to the image's storage class parameter field.
pub const EXTRA_STORAGE_CLASS_PARAMETERS_PATH: &str = "/spec/extraStorageClassParameters";

pub fn virtual_machine_image_resource() -> GroupVersionResource {
    GroupVersionResource::new(GROUP, VERSION, VIRTUAL_MACHINE_IMAGE_RESOURCE)
}

pub fn virtual_machine_image_group_resource() -> GroupResource {
    GroupResource::new(GROUP, VIRTUAL_MACHINE_IMAGE_RESOURCE)
}

pub fn virtual_machine_image_kind() -> GroupVersionKind {
    GroupVersionKind::new(GROUP, VERSION, VIRTUAL_MACHINE_IMAGE_KIND)
}

// ============================================================================
// VirtualMachineImage
// ============================================================================

/// VirtualMachineImageSpec is the desired state of an image.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineImageSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub display_name: String,
    /// Storage class parameters used when backing the image.
    /// `None` when the field is null or missing, which is distinct from an empty map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_storage_class_parameters: Option<ParameterMap>,
}

/// VirtualMachineImage is a disk image that virtual machines are created from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VirtualMachineImage {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub spec: VirtualMachineImageSpec,
}

impl VirtualMachineImage {
    pub fn new(name: &str, namespace: &str) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
            spec: VirtualMachineImageSpec::default(),
        }
    }

    pub fn with_parameters(name: &str, namespace: &str, parameters: Option<ParameterMap>) -> Self {
        let mut image = Self::new(name, namespace);
        image.spec.extra_storage_class_parameters = parameters;
        image
    }
}

impl ApiObject for VirtualMachineImage {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn kind(&self) -> &str {
        VIRTUAL_MACHINE_IMAGE_KIND
    }
}

// ============================================================================
// Setting
// ============================================================================

/// Setting is a cluster-scoped configuration entry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Setting {
    #[serde(default)]
    pub name: String,
    /// Explicit value set by the cluster operator.
    #[serde(default)]
    pub value: String,
    /// Built-in fallback used when no value is set.
    #[serde(default)]
    pub default: String,
}

impl Setting {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_default(mut self, default: &str) -> Self {
        self.default = default.to_string();
        self
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self
    }

    /// Returns the value if set, else the default if set.
    pub fn effective_value(&self) -> Option<&str> {
        if !self.value.is_empty() {
            Some(&self.value)
        } else if !self.default.is_empty() {
            Some(&self.default)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setting_effective_value() {
        let setting = Setting::new("s").with_default("d").with_value("v");
        assert_eq!(setting.effective_value(), Some("v"));

        let setting = Setting::new("s").with_default("d");
        assert_eq!(setting.effective_value(), Some("d"));

        let setting = Setting::new("s");
        assert_eq!(setting.effective_value(), None);
    }

    #[test]
    fn test_image_decode_keeps_null_and_empty_apart() {
        let null: VirtualMachineImage =
            serde_json::from_str(r#"{"spec":{"extraStorageClassParameters":null}}"#).unwrap();
        assert_eq!(null.spec.extra_storage_class_parameters, None);

        let missing: VirtualMachineImage = serde_json::from_str(r#"{"spec":{}}"#).unwrap();
        assert_eq!(missing.spec.extra_storage_class_parameters, None);

        let empty: VirtualMachineImage =
            serde_json::from_str(r#"{"spec":{"extraStorageClassParameters":{}}}"#).unwrap();
        assert_eq!(empty.spec.extra_storage_class_parameters, Some(ParameterMap::new()));
    }

    #[test]
    fn test_image_encode_sorted_parameters() {
        let params: ParameterMap = [("numberOfReplicas", "3"), ("migratable", "true")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let image = VirtualMachineImage::with_parameters("img", "default", Some(params));
        let encoded = serde_json::to_string(&image.spec).unwrap();
        assert_eq!(
            encoded,
            r#"{"extraStorageClassParameters":{"migratable":"true","numberOfReplicas":"3"}}"#
        );
    }

    #[test]
    fn test_api_object_kind() {
        let image = VirtualMachineImage::new("img", "default");
        assert_eq!(image.kind(), "VirtualMachineImage");
        assert!(image.as_any().downcast_ref::<VirtualMachineImage>().is_some());
    }
}
