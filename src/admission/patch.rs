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

//! JSON patch operations produced by mutating admission plugins.

use super::errors::{AdmissionError, AdmissionResult};
use serde::Serialize;

/// Patch operation verb for inserting a field that is not set yet.
pub const OP_ADD: &str = "add";

/// Patch operation verb for overwriting a field that is already set.
pub const OP_REPLACE: &str = "replace";

/// JsonPatchOperation represents a single JSON Patch operation.
///
/// Object values are `serde_json::Map`s, which keep their keys sorted, so two
/// operations built from equal maps encode to identical bytes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonPatchOperation {
    /// Operation type.
    pub op: String,
    /// Path to the target location.
    pub path: String,
    /// Value to use.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

impl JsonPatchOperation {
    pub fn add(path: &str, value: serde_json::Value) -> Self {
        Self {
            op: OP_ADD.to_string(),
            path: path.to_string(),
            value: Some(value),
        }
    }

    pub fn replace(path: &str, value: serde_json::Value) -> Self {
        Self {
            op: OP_REPLACE.to_string(),
            path: path.to_string(),
            value: Some(value),
        }
    }

    /// Encode this operation as a single JSON object.
    pub fn to_json(&self) -> AdmissionResult<String> {
        serde_json::to_string(self).map_err(AdmissionError::Serialization)
    }
}

/// PatchOps is the ordered list of operations a mutating plugin wants applied.
pub type PatchOps = Vec<JsonPatchOperation>;

/// Encode patch operations as the JSON array carried in an admission response.
pub fn encode_patch(ops: &[JsonPatchOperation]) -> AdmissionResult<Vec<u8>> {
    serde_json::to_vec(ops).map_err(AdmissionError::Serialization)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_patch_operation_add() {
        let op = JsonPatchOperation::add("/metadata/labels/foo", json!("bar"));
        assert_eq!(op.op, "add");
        assert_eq!(op.path, "/metadata/labels/foo");
        assert_eq!(op.value, Some(json!("bar")));
    }

    #[test]
    fn test_json_patch_operation_replace() {
        let op = JsonPatchOperation::replace("/spec/replicas", json!(3));
        assert_eq!(op.op, "replace");
        assert_eq!(op.path, "/spec/replicas");
        assert_eq!(op.value, Some(json!(3)));
    }

    #[test]
    fn test_to_json_sorts_object_keys() {
        let op = JsonPatchOperation::add("/spec/params", json!({"zeta": "1", "alpha": "2"}));
        assert_eq!(
            op.to_json().unwrap(),
            r#"{"op":"add","path":"/spec/params","value":{"alpha":"2","zeta":"1"}}"#
        );
    }

    #[test]
    fn test_encode_patch() {
        let ops = vec![JsonPatchOperation::replace("/spec/a", json!({}))];
        let encoded = encode_patch(&ops).unwrap();
        assert_eq!(
            String::from_utf8(encoded).unwrap(),
            r#"[{"op":"replace","path":"/spec/a","value":{}}]"#
        );

        let empty = encode_patch(&[]).unwrap();
        assert_eq!(empty, b"[]");
    }
}
