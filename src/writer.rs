use std::fs;
use std::path::Path;

use tracing::info;

use crate::generate::SamEnvVars;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Unable to serialize environment variables: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unable to write {0}: {1}")]
    Io(String, #[source] std::io::Error),
}

/// Writes `env_vars` as an indented JSON document, replacing any existing file.
pub fn write(path: &Path, env_vars: &SamEnvVars) -> Result<(), Error> {
    let mut file_contents = serde_json::to_string_pretty(env_vars)?;
    file_contents.push('\n');

    fs::write(path, file_contents).map_err(|error| Error::Io(path.display().to_string(), error))?;
    info!(path = %path.display(), functions = env_vars.len(), "Wrote environment variables");

    return Ok(());
}
