use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::assembly::Assembly;
use crate::environment::{
    self, extract_ecs_task_definition_environment_vars, extract_lambda_function_environment_vars,
};
use crate::finder::find_resource;
use crate::model::{Reference, ResourceType};
use crate::resolver::{self, resolve_ref, Session};

/// Resolved variables of one function or task definition.
pub type ResolvedEnvironment = IndexMap<String, String>;

/// `{"<id>": {"<VAR>": "<value>"}}`, the shape `sam local invoke --env-vars` reads.
pub type SamEnvVars = IndexMap<String, ResolvedEnvironment>;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("Lambda function '{0}' not found")]
    FunctionNotFound(String),

    #[error("ECS task definition '{0}' not found")]
    TaskDefinitionNotFound(String),

    #[error(transparent)]
    Environment(#[from] environment::Error),

    #[error("Unable to resolve {0}: {1}")]
    Resolve(String, #[source] resolver::Error),
}

/// Which kind of resource an environment is generated for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnvSource {
    #[default]
    Function,
    TaskDefinition,
}

impl EnvSource {
    pub fn resource_type(&self) -> ResourceType {
        match self {
            EnvSource::Function => ResourceType::LambdaFunction,
            EnvSource::TaskDefinition => ResourceType::EcsTaskDefinition,
        }
    }

    fn not_found(&self, id: &str) -> Error {
        match self {
            EnvSource::Function => Error::FunctionNotFound(id.to_string()),
            EnvSource::TaskDefinition => Error::TaskDefinitionNotFound(id.to_string()),
        }
    }
}

impl FromStr for EnvSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "function" => Ok(EnvSource::Function),
            "task-definition" => Ok(EnvSource::TaskDefinition),
            other => Err(format!(
                "unknown resource type `{}`, expected `function` or `task-definition`",
                other
            )),
        }
    }
}

impl fmt::Display for EnvSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvSource::Function => f.write_str("function"),
            EnvSource::TaskDefinition => f.write_str("task-definition"),
        }
    }
}

/// SAM CLI environment for the Lambda function with construct id `function_id`.
pub async fn generate_sam_env_vars(
    assembly: &Assembly,
    session: &Session,
    function_id: &str,
) -> Result<SamEnvVars, Error> {
    return generate_env_vars(assembly, session, function_id, EnvSource::Function).await;
}

/// Finds `id`, reads its declared environment and resolves every reference in it.
///
/// References are resolved one after another against the stack that owns the
/// resource. The first failure aborts the whole run.
pub async fn generate_env_vars(
    assembly: &Assembly,
    session: &Session,
    id: &str,
    source: EnvSource,
) -> Result<SamEnvVars, Error> {
    let found = find_resource(assembly, id, &source.resource_type())
        .ok_or_else(|| source.not_found(id))?;

    info!(
        id,
        logical_id = %found.logical_id,
        stack_name = %found.stack.stack_name,
        "Found {}", source
    );

    let declared = match source {
        EnvSource::Function => extract_lambda_function_environment_vars(found.resource)?,
        EnvSource::TaskDefinition => extract_ecs_task_definition_environment_vars(found.resource)?,
    };

    let mut resolved = ResolvedEnvironment::new();
    for (name, value) in declared {
        let value = if Reference::is_reference(&value) {
            resolve_ref(session, found.stack, &value)
                .await
                .map_err(|error| Error::Resolve(name.clone(), error))?
        } else {
            literal_value(value)
        };

        debug!(name = %name, value = %value, "Resolved environment variable");
        resolved.insert(name, value);
    }

    let mut env_vars = SamEnvVars::new();
    env_vars.insert(id.to_string(), resolved);

    return Ok(env_vars);
}

/// String form of a value that is not a reference: strings as-is, anything else as JSON.
fn literal_value(value: Value) -> String {
    match value {
        Value::String(value) => value,
        other => other.to_string(),
    }
}
