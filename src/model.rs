use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const LAMBDA_FUNCTION: &str = "AWS::Lambda::Function";
pub const ECS_TASK_DEFINITION: &str = "AWS::ECS::TaskDefinition";
pub const CLOUDFORMATION_STACK: &str = "AWS::CloudFormation::Stack";

pub const UNKNOWN_REGION: &str = "unknown-region";
pub const UNKNOWN_ACCOUNT: &str = "unknown-account";

const REF_KEY: &str = "Ref";

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ReferenceError {
    #[error("ref must be a mapping, got {0}")]
    NotAMapping(String),

    #[error("ref mapping must contain 'Ref' key")]
    MissingRefKey,

    #[error("ref['Ref'] must be a non-empty string, got {0}")]
    NonStringRef(String),

    #[error("ref['Ref'] must be a non-empty string")]
    EmptyRef,
}

/// The `Type` tag of a template resource.
///
/// Only the kinds the resolver acts on are modelled, anything else is kept
/// verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResourceType {
    LambdaFunction,
    EcsTaskDefinition,
    CloudFormationStack,
    Other(String),
}

impl ResourceType {
    pub fn as_str(&self) -> &str {
        match self {
            ResourceType::LambdaFunction => LAMBDA_FUNCTION,
            ResourceType::EcsTaskDefinition => ECS_TASK_DEFINITION,
            ResourceType::CloudFormationStack => CLOUDFORMATION_STACK,
            ResourceType::Other(tag) => tag.as_str(),
        }
    }
}

impl From<&str> for ResourceType {
    fn from(tag: &str) -> Self {
        match tag {
            LAMBDA_FUNCTION => ResourceType::LambdaFunction,
            ECS_TASK_DEFINITION => ResourceType::EcsTaskDefinition,
            CLOUDFORMATION_STACK => ResourceType::CloudFormationStack,
            other => ResourceType::Other(other.to_string()),
        }
    }
}

impl From<String> for ResourceType {
    fn from(tag: String) -> Self {
        return ResourceType::from(tag.as_str());
    }
}

impl From<ResourceType> for String {
    fn from(resource_type: ResourceType) -> Self {
        return resource_type.as_str().to_string();
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Construct path, e.g. `ExampleStack/ExampleFunction/Resource`.
    #[serde(rename = "aws:cdk:path", default, skip_serializing_if = "Option::is_none")]
    pub cdk_path: Option<String>,

    /// Asset file backing the resource. Nested stacks point at their template here.
    #[serde(rename = "aws:asset:path", default, skip_serializing_if = "Option::is_none")]
    pub asset_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "Type")]
    pub resource_type: ResourceType,

    #[serde(rename = "Properties", default)]
    pub properties: Map<String, Value>,

    #[serde(rename = "Metadata", default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl Resource {
    pub fn cdk_path(&self) -> Option<&str> {
        self.metadata.as_ref()?.cdk_path.as_deref()
    }

    pub fn asset_path(&self) -> Option<&str> {
        self.metadata.as_ref()?.asset_path.as_deref()
    }

    /// Whether the construct path carries `id` as a whole path segment.
    ///
    /// The match is a plain substring test on `/<id>/`, so the top-level
    /// construct (the stack itself) never matches.
    pub fn has_construct_id(&self, id: &str) -> bool {
        match self.cdk_path() {
            Some(path) => path.contains(&format!("/{}/", id)),
            None => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(rename = "Resources", default)]
    pub resources: IndexMap<String, Resource>,
}

/// Deployment target of a stack, parsed from `aws://<account>/<region>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub account: String,
    pub region: String,
}

impl Environment {
    pub fn unknown() -> Self {
        return Self {
            account: UNKNOWN_ACCOUNT.to_string(),
            region: UNKNOWN_REGION.to_string(),
        };
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let rest = raw.strip_prefix("aws://")?;
        let (account, region) = rest.split_once('/')?;
        if account.is_empty() || region.is_empty() || region.contains('/') {
            return None;
        }

        return Some(Self {
            account: account.to_string(),
            region: region.to_string(),
        });
    }

    /// The region, unless it is still the synthesis-time placeholder.
    pub fn resolved_region(&self) -> Option<&str> {
        if self.region == UNKNOWN_REGION {
            return None;
        }
        return Some(&self.region);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stack {
    pub stack_name: String,
    pub template: Template,
    pub environment: Environment,
}

/// A validated `{"Ref": "<logical-id>"}` document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub logical_id: String,
}

impl Reference {
    /// Whether `value` is shaped like a reference at all, i.e. a mapping with a `Ref` key.
    pub fn is_reference(value: &Value) -> bool {
        match value {
            Value::Object(map) => map.contains_key(REF_KEY),
            _ => false,
        }
    }
}

impl TryFrom<&Value> for Reference {
    type Error = ReferenceError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        let map = match value {
            Value::Object(map) => map,
            other => return Err(ReferenceError::NotAMapping(json_kind(other).to_string())),
        };

        let logical_id = match map.get(REF_KEY) {
            None => return Err(ReferenceError::MissingRefKey),
            Some(Value::String(logical_id)) => logical_id,
            Some(other) => return Err(ReferenceError::NonStringRef(json_kind(other).to_string())),
        };

        if logical_id.is_empty() {
            return Err(ReferenceError::EmptyRef);
        }

        return Ok(Self {
            logical_id: logical_id.clone(),
        });
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
