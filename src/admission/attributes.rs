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

//! Admission attributes that describe an admission request.

use super::interfaces::Operation;
use crate::api::harvester::{self, ApiObject, VirtualMachineImage};

/// GroupVersionResource identifies a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupVersionResource {
    pub group: String,
    pub version: String,
    pub resource: String,
}

impl GroupVersionResource {
    pub fn new(group: &str, version: &str, resource: &str) -> Self {
        Self {
            group: group.to_string(),
            version: version.to_string(),
            resource: resource.to_string(),
        }
    }

    /// Returns just the group and resource portion.
    pub fn group_resource(&self) -> GroupResource {
        GroupResource {
            group: self.group.clone(),
            resource: self.resource.clone(),
        }
    }
}

/// GroupResource identifies a resource without version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupResource {
    pub group: String,
    pub resource: String,
}

impl GroupResource {
    pub fn new(group: &str, resource: &str) -> Self {
        Self {
            group: group.to_string(),
            resource: resource.to_string(),
        }
    }
}

/// GroupVersionKind identifies a kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupVersionKind {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl GroupVersionKind {
    pub fn new(group: &str, version: &str, kind: &str) -> Self {
        Self {
            group: group.to_string(),
            version: version.to_string(),
            kind: kind.to_string(),
        }
    }
}

/// Attributes describes an admission request to the plugins evaluating it.
pub trait Attributes {
    /// Returns the name of the object as presented in the request.
    fn get_name(&self) -> &str;

    /// Returns the namespace associated with the request (if any).
    fn get_namespace(&self) -> &str;

    /// Returns the resource being requested.
    fn get_resource(&self) -> &GroupVersionResource;

    /// Returns the name of the subresource being requested.
    fn get_subresource(&self) -> &str;

    /// Returns the operation being performed.
    fn get_operation(&self) -> Operation;

    /// Returns the object from the incoming request.
    fn get_object(&self) -> Option<&dyn ApiObject>;

    /// Returns the stored object (only populated for UPDATE and DELETE requests).
    fn get_old_object(&self) -> Option<&dyn ApiObject>;

    /// Returns the kind of object being manipulated.
    fn get_kind(&self) -> &GroupVersionKind;
}

/// AttributesRecord is a concrete implementation of Attributes.
pub struct AttributesRecord {
    pub name: String,
    pub namespace: String,
    pub resource: GroupVersionResource,
    pub subresource: String,
    pub operation: Operation,
    pub object: Option<Box<dyn ApiObject>>,
    pub old_object: Option<Box<dyn ApiObject>>,
    pub kind: GroupVersionKind,
}

impl AttributesRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: &str,
        namespace: &str,
        resource: GroupVersionResource,
        subresource: &str,
        operation: Operation,
        object: Option<Box<dyn ApiObject>>,
        old_object: Option<Box<dyn ApiObject>>,
        kind: GroupVersionKind,
    ) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
            resource,
            subresource: subresource.to_string(),
            operation,
            object,
            old_object,
            kind,
        }
    }

    /// Helper to create attributes for a VirtualMachineImage request.
    pub fn new_image(
        operation: Operation,
        image: VirtualMachineImage,
        old_image: Option<VirtualMachineImage>,
    ) -> Self {
        Self {
            name: image.name.clone(),
            namespace: image.namespace.clone(),
            resource: harvester::virtual_machine_image_resource(),
            subresource: String::new(),
            operation,
            object: Some(Box::new(image)),
            old_object: old_image.map(|i| Box::new(i) as Box<dyn ApiObject>),
            kind: harvester::virtual_machine_image_kind(),
        }
    }

    /// Get the image from the object, if it is an image.
    pub fn get_image(&self) -> Option<&VirtualMachineImage> {
        self.object
            .as_ref()
            .and_then(|obj| obj.as_any().downcast_ref::<VirtualMachineImage>())
    }

    /// Get the old image from the old object, if it is an image.
    pub fn get_old_image(&self) -> Option<&VirtualMachineImage> {
        self.old_object
            .as_ref()
            .and_then(|obj| obj.as_any().downcast_ref::<VirtualMachineImage>())
    }
}

impl Attributes for AttributesRecord {
    fn get_name(&self) -> &str {
        &self.name
    }

    fn get_namespace(&self) -> &str {
        &self.namespace
    }

    fn get_resource(&self) -> &GroupVersionResource {
        &self.resource
    }

    fn get_subresource(&self) -> &str {
        &self.subresource
    }

    fn get_operation(&self) -> Operation {
        self.operation
    }

    fn get_object(&self) -> Option<&dyn ApiObject> {
        self.object.as_ref().map(|o| o.as_ref())
    }

    fn get_old_object(&self) -> Option<&dyn ApiObject> {
        self.old_object.as_ref().map(|o| o.as_ref())
    }

    fn get_kind(&self) -> &GroupVersionKind {
        &self.kind
    }
}
