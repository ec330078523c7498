use serde::{Deserialize, Serialize};
use std::{fs, io, path::Path, path::PathBuf};
use validator::{Validate, ValidationError};

use crate::generate::EnvSource;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("File {0} not found")]
    FileNotFound(String),

    #[error("Parsing error: {0}")]
    ParsingError(String),

    #[error("Validation errors: {0}")]
    ValidationError(String),

    #[error("Unknown error occurred: {0}")]
    Unknown(String),
}

/// One function (or task definition) to generate an environment file for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct ConfigEntry {
    /// Cloud assembly directory, usually `cdk.out`.
    #[validate(required)]
    pub app: Option<PathBuf>,

    #[validate(required, length(min = 1))]
    pub function_name: Option<String>,

    /// `function` when neither the entry nor the command line sets it.
    #[serde(default)]
    pub resource_type: Option<EnvSource>,

    #[validate(custom = "validate_json_file")]
    pub output: Option<PathBuf>,

    #[validate(length(min = 1))]
    pub profile: Option<String>,

    #[validate(length(min = 1))]
    pub region: Option<String>,
}

/// A validated `ConfigEntry` with its defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub app: PathBuf,
    pub function_name: String,
    pub resource_type: EnvSource,
    pub output: PathBuf,
    pub profile: Option<String>,
    pub region: Option<String>,
}

impl ConfigEntry {
    /// Fills the settings this entry leaves unset from `defaults`.
    pub fn or_defaults(self, defaults: &ConfigEntry) -> ConfigEntry {
        return ConfigEntry {
            resource_type: self.resource_type.or(defaults.resource_type),
            profile: self.profile.or_else(|| defaults.profile.clone()),
            region: self.region.or_else(|| defaults.region.clone()),
            ..self
        };
    }

    pub fn into_job(self) -> Result<Job, Error> {
        if let Err(error) = self.validate() {
            return Err(Error::ValidationError(error.to_string()));
        }

        let (app, function_name) = match (self.app, self.function_name) {
            (Some(app), Some(function_name)) => (app, function_name),
            _ => {
                return Err(Error::ValidationError(String::from(
                    "app and function_name are required",
                )))
            }
        };

        let output = self
            .output
            .unwrap_or_else(|| default_output(&function_name));

        return Ok(Job {
            app,
            function_name,
            resource_type: self.resource_type.unwrap_or_default(),
            output,
            profile: self.profile,
            region: self.region,
        });
    }
}

pub fn default_output(function_name: &str) -> PathBuf {
    return PathBuf::from(format!("{}.env.json", function_name));
}

pub type Config = Vec<ConfigEntry>;

pub fn parse(path: &Path) -> Result<Vec<Job>, Error> {
    return parse_with_defaults(path, &ConfigEntry::default());
}

/// Like `parse`, with `profile`, `region` and `resource_type` taken from
/// `defaults` for entries that leave them unset.
pub fn parse_with_defaults(path: &Path, defaults: &ConfigEntry) -> Result<Vec<Job>, Error> {
    let contents = match fs::read_to_string(path) {
        Ok(raw_contents) => Ok(raw_contents),
        Err(error) => match error.kind() {
            io::ErrorKind::NotFound => Err(Error::FileNotFound(path.display().to_string())),
            _ => Err(Error::Unknown(error.to_string())),
        },
    }?;

    let config: Config = match serde_yaml::from_str(&contents) {
        Ok(data) => Ok(data),
        Err(error) => Err(Error::ParsingError(error.to_string())),
    }?;

    let mut jobs = Vec::with_capacity(config.len());
    for config_entry in config {
        jobs.push(config_entry.or_defaults(defaults).into_job()?);
    }

    return Ok(jobs);
}

fn validate_json_file(json_file: &PathBuf) -> Result<(), ValidationError> {
    let file_extension = match json_file.extension() {
        Some(extension) => extension,
        None => {
            return Err(ValidationError::new(
                "Unable to parse the extension of the output file location",
            ))
        }
    };
    if file_extension != "json" {
        return Err(ValidationError::new(
            "The output file location has to end with `.json`",
        ));
    }

    return Ok(());
}
