use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use sam_env_refsolver::config::{self, ConfigEntry, Job};
use sam_env_refsolver::EnvSource;
use tracing_subscriber::EnvFilter;

/// Generate SAM CLI environment variables with resolved CloudFormation references
#[derive(Parser, Debug)]
#[command(name = "sam-env-refsolver")]
#[command(version)]
struct Cli {
    /// Path to the CDK assembly directory (e.g., cdk.out)
    #[arg(long, value_name = "DIR", required_unless_present = "config")]
    app: Option<PathBuf>,

    /// CDK construct id of the Lambda function
    #[arg(long, value_name = "ID", required_unless_present = "config")]
    function_name: Option<String>,

    /// Output file path (default: {function_name}.env.json)
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// AWS profile to use for resolving references
    #[arg(long)]
    profile: Option<String>,

    /// AWS region of the deployed stacks (default: the profile's region)
    #[arg(long)]
    region: Option<String>,

    /// Kind of resource to read the environment from: function (default) or task-definition
    #[arg(long, value_name = "TYPE")]
    resource_type: Option<EnvSource>,

    /// YAML file listing several functions to generate. `--profile`, `--region` and
    /// `--resource-type` apply to entries that leave them unset
    #[arg(long, value_name = "FILE", conflicts_with_all = ["app", "function_name", "output"])]
    config: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error (overrides RUST_LOG)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

impl Cli {
    fn jobs(&self) -> Result<Vec<Job>, config::Error> {
        let config_entry = ConfigEntry {
            app: self.app.clone(),
            function_name: self.function_name.clone(),
            resource_type: self.resource_type,
            output: self.output.clone(),
            profile: self.profile.clone(),
            region: self.region.clone(),
        };

        if let Some(config_path) = &self.config {
            return config::parse_with_defaults(config_path, &config_entry);
        }

        return Ok(vec![config_entry.into_job()?]);
    }
}

fn init_tracing(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: &Cli) -> Result<(), sam_env_refsolver::Error> {
    for job in cli.jobs()? {
        sam_env_refsolver::run(&job).await?;
        println!("Environment variables written to {}", job.output.display());
    }

    return Ok(());
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {}", error);
            ExitCode::FAILURE
        }
    }
}
