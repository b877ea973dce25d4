//! The `inputs:` block of an `action.yml`
//!
//! Only `required` and `default` matter here. Everything else in the file
//! (`runs`, `branding`, outputs) is ignored.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::loader::scalar_to_string;
use super::rules::InputSpec;
use crate::error::{Result, StepGuardError};

#[derive(Debug, Deserialize)]
struct RawAction {
    name: Option<String>,
    #[serde(default)]
    inputs: BTreeMap<String, RawInput>,
}

#[derive(Debug, Deserialize)]
struct RawInput {
    description: Option<String>,
    #[serde(default)]
    required: bool,
    default: Option<serde_yaml::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaInput {
    pub description: Option<String>,
    pub required: bool,
    pub default: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ActionSchema {
    pub name: Option<String>,
    pub inputs: BTreeMap<String, SchemaInput>,
}

impl ActionSchema {
    pub fn from_yaml(content: &str) -> Result<Self> {
        let raw: RawAction = serde_yaml::from_str(content)?;
        let mut inputs = BTreeMap::new();
        for (name, input) in raw.inputs {
            let default = input
                .default
                .map(|value| scalar_to_string(&name, value))
                .transpose()?
                .flatten();
            inputs.insert(
                name,
                SchemaInput {
                    description: input.description,
                    required: input.required,
                    default,
                },
            );
        }
        Ok(Self {
            name: raw.name,
            inputs,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| StepGuardError::from(e).with_context(path.display()))?;
        Self::from_yaml(&content).map_err(|e| e.with_context(path.display()))
    }

    pub fn input(&self, name: &str) -> Option<&SchemaInput> {
        self.inputs.get(name)
    }

    /// Overlay the schema's required/default flags onto a resolved spec
    ///
    /// The schema alone decides `required`. An input with a schema default is
    /// never required, since the runner substitutes the default before the
    /// step sees an empty value. A required input without one drops the
    /// rule's default so an empty value stays rejected.
    pub fn apply(&self, input: &str, mut spec: InputSpec) -> InputSpec {
        if let Some(entry) = self.inputs.get(input) {
            spec.required = entry.required && entry.default.is_none();
            if entry.default.is_some() {
                spec.default = entry.default.clone();
            } else if spec.required {
                spec.default = None;
            }
        }
        spec
    }
}
