use aws_sdk_cloudformation::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_types::region::Region;
use aws_types::SdkConfig;
use serde_json::Value;
use tracing::{debug, info};

use crate::model::{Reference, ReferenceError, Stack};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error(transparent)]
    InvalidReference(#[from] ReferenceError),

    #[error(
        "Unable to determine the region of stack {0}. Pass a region or pin the stack environment."
    )]
    RegionNotResolved(String),

    #[error("Service error ocurred: {0}.")]
    ServiceError(String),

    #[error("Unknown error ocurred: {0}.")]
    UnknownError(String),

    #[error("Resource {1} in stack {0} has no physical id")]
    MissingPhysicalId(String, String),
}

/// Looks up the physical id of a deployed stack resource.
#[async_trait::async_trait]
pub trait StackResourceDescriber: Send + Sync {
    async fn describe_stack_resource(
        &self,
        region: &str,
        stack_name: &str,
        logical_id: &str,
    ) -> Result<String, Error>;
}

/// `DescribeStackResource` against the CloudFormation API.
pub struct CloudFormation {
    sdk_config: SdkConfig,
}

impl CloudFormation {
    pub fn new(sdk_config: SdkConfig) -> Self {
        return Self { sdk_config };
    }

    fn client(&self, region: &str) -> aws_sdk_cloudformation::Client {
        let config = aws_sdk_cloudformation::config::Builder::from(&self.sdk_config)
            .region(Region::new(region.to_string()))
            .build();

        return aws_sdk_cloudformation::Client::from_conf(config);
    }
}

#[async_trait::async_trait]
impl StackResourceDescriber for CloudFormation {
    async fn describe_stack_resource(
        &self,
        region: &str,
        stack_name: &str,
        logical_id: &str,
    ) -> Result<String, Error> {
        let result = self
            .client(region)
            .describe_stack_resource()
            .stack_name(stack_name)
            .logical_resource_id(logical_id)
            .send()
            .await;

        let result = match result {
            Ok(data) => data,
            Err(SdkError::ServiceError(context)) => {
                return Err(Error::ServiceError(service_error_message(context.err())));
            }
            Err(err) => return Err(Error::UnknownError(DisplayErrorContext(&err).to_string())),
        };

        let physical_id = result
            .stack_resource_detail()
            .and_then(|detail| detail.physical_resource_id())
            .ok_or_else(|| {
                Error::MissingPhysicalId(stack_name.to_string(), logical_id.to_string())
            })?;

        return Ok(physical_id.to_string());
    }
}

/// `<code>: <message>` as sent by CloudFormation, e.g.
/// `ValidationError: Stack with id ExampleStack does not exist`.
fn service_error_message<E>(err: &E) -> String
where
    E: ProvideErrorMetadata + std::error::Error,
{
    match (err.code(), err.message()) {
        (Some(code), Some(message)) => format!("{}: {}", code, message),
        _ => DisplayErrorContext(err).to_string(),
    }
}

/// Credentials and region used to talk to the deployed stacks.
pub struct Session {
    describer: Box<dyn StackResourceDescriber>,
    region: Option<String>,
}

impl Session {
    pub fn new(describer: Box<dyn StackResourceDescriber>, region: Option<String>) -> Self {
        return Self { describer, region };
    }

    /// Loads the SDK configuration for `profile` (or the default chain).
    ///
    /// An explicit `region` wins over whatever the profile configures.
    pub async fn load(profile: Option<&str>, region: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }
        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }

        let sdk_config = loader.load().await;
        let region = sdk_config.region().map(|region| region.to_string());
        info!(profile = ?profile, region = ?region, "Loaded AWS configuration");

        return Self::new(Box::new(CloudFormation::new(sdk_config)), region);
    }

    /// The caller's region, else the stack's pinned region.
    pub fn region_for(&self, stack: &Stack) -> Result<String, Error> {
        if let Some(region) = &self.region {
            return Ok(region.clone());
        }

        match stack.environment.resolved_region() {
            Some(region) => Ok(region.to_string()),
            None => Err(Error::RegionNotResolved(stack.stack_name.clone())),
        }
    }
}

/// Translates `{"Ref": "<logical-id>"}` into the physical id of the resource deployed in `stack`.
pub async fn resolve_ref(
    session: &Session,
    stack: &Stack,
    reference: &Value,
) -> Result<String, Error> {
    let reference = Reference::try_from(reference)?;
    let region = session.region_for(stack)?;

    debug!(
        stack_name = %stack.stack_name,
        logical_id = %reference.logical_id,
        region = %region,
        "Describing stack resource"
    );

    return session
        .describer
        .describe_stack_resource(&region, &stack.stack_name, &reference.logical_id)
        .await;
}
