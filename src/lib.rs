//! Generates `sam local invoke --env-vars` files for functions defined in a
//! CDK app, resolving `{"Ref": ...}` values to the physical ids of the
//! deployed resources.

pub mod assembly;
pub mod config;
pub mod environment;
pub mod finder;
pub mod generate;
pub mod model;
pub mod resolver;
pub mod writer;

#[cfg(test)]
mod testing;

pub use assembly::{load_assembly, Assembly};
pub use environment::{
    extract_ecs_task_definition_environment_vars, extract_lambda_function_environment_vars,
};
pub use finder::{find_resource, FoundResource};
pub use generate::{generate_env_vars, generate_sam_env_vars, EnvSource, SamEnvVars};
pub use resolver::{resolve_ref, Session, StackResourceDescriber};

use tracing::info;

use crate::config::Job;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] config::Error),

    #[error(transparent)]
    Assembly(#[from] assembly::Error),

    #[error(transparent)]
    Generate(#[from] generate::Error),

    #[error(transparent)]
    Writer(#[from] writer::Error),
}

/// Loads the assembly of `job`, resolves the environment and writes it to `job.output`.
pub async fn run(job: &Job) -> Result<SamEnvVars, Error> {
    info!(
        app = %job.app.display(),
        id = %job.function_name,
        resource_type = %job.resource_type,
        "Generating environment variables"
    );

    let assembly = load_assembly(&job.app)?;
    let session = Session::load(job.profile.as_deref(), job.region.as_deref()).await;

    let env_vars =
        generate_env_vars(&assembly, &session, &job.function_name, job.resource_type).await?;
    writer::write(&job.output, &env_vars)?;

    return Ok(env_vars);
}
