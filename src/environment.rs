use indexmap::IndexMap;
use serde_json::Value;

use crate::model::{Resource, ResourceType};

/// Declared environment of a resource. Values are kept as written in the
/// template, so they may still be `{"Ref": ...}` documents.
pub type DeclaredEnvironment = IndexMap<String, Value>;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("resource must be of type {expected}, got {actual}")]
    UnexpectedResourceType {
        expected: ResourceType,
        actual: ResourceType,
    },
}

fn ensure_type(resource: &Resource, expected: ResourceType) -> Result<(), Error> {
    if resource.resource_type != expected {
        return Err(Error::UnexpectedResourceType {
            expected,
            actual: resource.resource_type.clone(),
        });
    }
    return Ok(());
}

/// `Properties.Environment.Variables` of an `AWS::Lambda::Function`.
pub fn extract_lambda_function_environment_vars(
    resource: &Resource,
) -> Result<DeclaredEnvironment, Error> {
    ensure_type(resource, ResourceType::LambdaFunction)?;

    let variables = resource
        .properties
        .get("Environment")
        .and_then(|environment| environment.get("Variables"))
        .and_then(Value::as_object);

    let env_vars = match variables {
        Some(variables) => variables
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect(),
        None => DeclaredEnvironment::new(),
    };

    return Ok(env_vars);
}

/// Environment of every container of an `AWS::ECS::TaskDefinition`, flattened.
///
/// Containers are read in order and a later container overwrites a variable an
/// earlier one declared. Entries without both `Name` and `Value` are skipped.
pub fn extract_ecs_task_definition_environment_vars(
    resource: &Resource,
) -> Result<DeclaredEnvironment, Error> {
    ensure_type(resource, ResourceType::EcsTaskDefinition)?;

    let mut env_vars = DeclaredEnvironment::new();

    let containers = resource
        .properties
        .get("ContainerDefinitions")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_else(|| &[]);

    for container in containers {
        let entries = container
            .get("Environment")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_else(|| &[]);

        for entry in entries {
            let name = entry.get("Name").and_then(Value::as_str);
            let value = entry.get("Value");

            if let (Some(name), Some(value)) = (name, value) {
                env_vars.insert(name.to_string(), value.clone());
            }
        }
    }

    return Ok(env_vars);
}
