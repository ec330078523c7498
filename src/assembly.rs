use std::collections::{HashSet, VecDeque};
use std::path::Path;
use std::{fs, io};

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{debug, info};

use crate::model::{Environment, ResourceType, Stack, Template};

pub const MANIFEST_FILE: &str = "manifest.json";

const STACK_ARTIFACT: &str = "aws:cloudformation:stack";

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("File {0} not found")]
    FileNotFound(String),

    #[error("Parsing error in {0}: {1}")]
    ParsingError(String, String),

    #[error("Stack artifact {0} is missing the templateFile property")]
    MissingTemplateFile(String),

    #[error("Invalid environment {1} for stack artifact {0}")]
    InvalidEnvironment(String, String),

    #[error("Unknown error occurred: {0}")]
    Unknown(String),
}

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    artifacts: IndexMap<String, Artifact>,
}

#[derive(Debug, Deserialize)]
struct Artifact {
    #[serde(rename = "type")]
    artifact_type: String,

    environment: Option<String>,

    #[serde(default)]
    properties: ArtifactProperties,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArtifactProperties {
    template_file: Option<String>,
    stack_name: Option<String>,
}

/// The stacks of a synthesized cloud assembly (`cdk.out`).
///
/// Stacks listed in the manifest come first, in manifest order, followed by
/// the nested stack templates they reference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assembly {
    pub stacks: Vec<Stack>,
}

impl Assembly {
    pub fn stack(&self, stack_name: &str) -> Option<&Stack> {
        self.stacks
            .iter()
            .find(|stack| stack.stack_name == stack_name)
    }
}

/// Name a stack gets from its template file, i.e. the file name up to the first `.`.
///
/// `ExampleStackNested0A1B2C3D.nested.template.json` becomes `ExampleStackNested0A1B2C3D`.
pub fn stack_name_from_template_file(template_file: &str) -> &str {
    let file_name = Path::new(template_file)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(template_file);

    return file_name.split('.').next().unwrap_or(file_name);
}

pub fn load_assembly(directory: &Path) -> Result<Assembly, Error> {
    let manifest: Manifest = read_json(&directory.join(MANIFEST_FILE))?;

    let mut stacks = Vec::new();
    let mut loaded_templates = HashSet::new();

    for (artifact_id, artifact) in manifest.artifacts {
        if artifact.artifact_type != STACK_ARTIFACT {
            continue;
        }

        let template_file = artifact
            .properties
            .template_file
            .ok_or_else(|| Error::MissingTemplateFile(artifact_id.clone()))?;

        let environment = match artifact.environment {
            Some(raw) => Environment::parse(&raw)
                .ok_or_else(|| Error::InvalidEnvironment(artifact_id.clone(), raw.clone()))?,
            None => Environment::unknown(),
        };

        let template: Template = read_json(&directory.join(&template_file))?;
        let stack_name = artifact.properties.stack_name.unwrap_or(artifact_id);

        debug!(stack_name = %stack_name, template_file = %template_file, "Loaded stack template");
        loaded_templates.insert(template_file);
        stacks.push(Stack {
            stack_name,
            template,
            environment,
        });
    }

    let nested = load_nested_stacks(directory, &stacks, &mut loaded_templates)?;
    stacks.extend(nested);

    info!(
        directory = %directory.display(),
        stacks = stacks.len(),
        "Loaded cloud assembly"
    );

    return Ok(Assembly { stacks });
}

fn load_nested_stacks(
    directory: &Path,
    parents: &[Stack],
    loaded_templates: &mut HashSet<String>,
) -> Result<Vec<Stack>, Error> {
    let mut nested = Vec::new();
    let mut pending: VecDeque<(String, Environment)> = VecDeque::new();

    for parent in parents {
        queue_children(parent, &mut pending);
    }

    while let Some((template_file, environment)) = pending.pop_front() {
        if loaded_templates.contains(&template_file) {
            continue;
        }
        let path = directory.join(&template_file);
        if !path.is_file() {
            debug!(template_file = %template_file, "Nested stack template not present in assembly");
            continue;
        }

        let template: Template = read_json(&path)?;
        let stack = Stack {
            stack_name: stack_name_from_template_file(&template_file).to_string(),
            template,
            environment,
        };

        debug!(
            stack_name = %stack.stack_name,
            template_file = %template_file,
            "Loaded nested stack template"
        );
        loaded_templates.insert(template_file);
        queue_children(&stack, &mut pending);
        nested.push(stack);
    }

    return Ok(nested);
}

fn queue_children(stack: &Stack, pending: &mut VecDeque<(String, Environment)>) {
    for resource in stack.template.resources.values() {
        if resource.resource_type != ResourceType::CloudFormationStack {
            continue;
        }
        if let Some(asset_path) = resource.asset_path() {
            pending.push_back((asset_path.to_string(), stack.environment.clone()));
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, Error> {
    let contents = match fs::read_to_string(path) {
        Ok(raw_contents) => Ok(raw_contents),
        Err(error) => match error.kind() {
            io::ErrorKind::NotFound => Err(Error::FileNotFound(path.display().to_string())),
            _ => Err(Error::Unknown(error.to_string())),
        },
    }?;

    return serde_json::from_str(&contents)
        .map_err(|error| Error::ParsingError(path.display().to_string(), error.to_string()));
}
