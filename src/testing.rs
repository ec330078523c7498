//! Fixtures shared by the unit tests: a synthesized assembly on disk and a
//! recording stand-in for CloudFormation.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use crate::resolver::{Error, StackResourceDescriber};

pub const NESTED_TEMPLATE_FILE: &str =
    "ExampleStackWorkersNestedStack5C2F2B1A.nested.template.json";

#[derive(Debug, Clone, PartialEq)]
pub struct DescribeCall {
    pub region: String,
    pub stack_name: String,
    pub logical_id: String,
}

#[derive(Default)]
pub struct RecordingDescriber {
    physical_ids: HashMap<String, String>,
    calls: Mutex<Vec<DescribeCall>>,
}

impl RecordingDescriber {
    pub fn new(physical_ids: &[(&str, &str)]) -> Self {
        return Self {
            physical_ids: physical_ids
                .iter()
                .map(|(logical_id, physical_id)| (logical_id.to_string(), physical_id.to_string()))
                .collect(),
            calls: Mutex::new(Vec::new()),
        };
    }

    pub fn calls(&self) -> Vec<DescribeCall> {
        return self.calls.lock().unwrap().clone();
    }
}

#[async_trait::async_trait]
impl StackResourceDescriber for RecordingDescriber {
    async fn describe_stack_resource(
        &self,
        region: &str,
        stack_name: &str,
        logical_id: &str,
    ) -> Result<String, Error> {
        self.calls.lock().unwrap().push(DescribeCall {
            region: region.to_string(),
            stack_name: stack_name.to_string(),
            logical_id: logical_id.to_string(),
        });

        match self.physical_ids.get(logical_id) {
            Some(physical_id) => Ok(physical_id.clone()),
            None => Err(Error::ServiceError(format!(
                "Resource {} does not exist for stack {}",
                logical_id, stack_name
            ))),
        }
    }
}

#[async_trait::async_trait]
impl StackResourceDescriber for Arc<RecordingDescriber> {
    async fn describe_stack_resource(
        &self,
        region: &str,
        stack_name: &str,
        logical_id: &str,
    ) -> Result<String, Error> {
        self.as_ref()
            .describe_stack_resource(region, stack_name, logical_id)
            .await
    }
}

fn write_json(dir: &Path, file_name: &str, contents: &Value) {
    fs::write(dir.join(file_name), serde_json::to_string_pretty(contents).unwrap()).unwrap();
}

/// Writes a `cdk.out` resembling what `cdk synth` produces for a small app: an
/// unpinned `ExampleStack` with a bucket, a table, a Fargate task definition,
/// a function and a nested `Workers` stack, plus a `PinnedStack` deployed to
/// `eu-central-1`.
pub fn write_example_assembly(dir: &Path) {
    write_json(
        dir,
        "manifest.json",
        &json!({
            "version": "36.0.0",
            "artifacts": {
                "ExampleStack.assets": {
                    "type": "cdk:asset-manifest",
                    "properties": {"file": "ExampleStack.assets.json"}
                },
                "ExampleStack": {
                    "type": "aws:cloudformation:stack",
                    "environment": "aws://unknown-account/unknown-region",
                    "properties": {"templateFile": "ExampleStack.template.json"},
                    "displayName": "ExampleStack"
                },
                "PinnedStack": {
                    "type": "aws:cloudformation:stack",
                    "environment": "aws://123456789012/eu-central-1",
                    "properties": {
                        "templateFile": "PinnedStack.template.json",
                        "stackName": "PinnedStack"
                    }
                },
                "Tree": {
                    "type": "cdk:tree",
                    "properties": {"file": "tree.json"}
                }
            }
        }),
    );

    write_json(
        dir,
        "ExampleStack.template.json",
        &json!({
            "Resources": {
                "ExampleBucketDC717CF4": {
                    "Type": "AWS::S3::Bucket",
                    "UpdateReplacePolicy": "Delete",
                    "DeletionPolicy": "Delete",
                    "Metadata": {"aws:cdk:path": "ExampleStack/ExampleBucket/Resource"}
                },
                "ExampleTable114D508F": {
                    "Type": "AWS::DynamoDB::Table",
                    "Properties": {
                        "KeySchema": [{"AttributeName": "id", "KeyType": "HASH"}]
                    },
                    "Metadata": {"aws:cdk:path": "ExampleStack/ExampleTable/Resource"}
                },
                "ExampleFargateServiceTaskDef940E3A80": {
                    "Type": "AWS::ECS::TaskDefinition",
                    "Properties": {
                        "ContainerDefinitions": [
                            {
                                "Name": "web",
                                "Image": "public.ecr.aws/docker/library/busybox:latest",
                                "Environment": [
                                    {
                                        "Name": "BUCKET_NAME",
                                        "Value": {"Ref": "ExampleBucketDC717CF4"}
                                    },
                                    {
                                        "Name": "TABLE_NAME",
                                        "Value": {"Ref": "ExampleTable114D508F"}
                                    }
                                ]
                            },
                            {
                                "Name": "sidecar",
                                "Image": "public.ecr.aws/docker/library/busybox:latest",
                                "Environment": [
                                    {"Name": "TABLE_NAME", "Value": "sidecar-table"},
                                    {"Name": "LOG_LEVEL", "Value": "debug"},
                                    {"Name": "MISSING_VALUE"},
                                    {"Value": "missing-name"}
                                ]
                            },
                            {
                                "Name": "init",
                                "Image": "public.ecr.aws/docker/library/busybox:latest"
                            }
                        ],
                        "Cpu": "512",
                        "Memory": "1024"
                    },
                    "Metadata": {
                        "aws:cdk:path": "ExampleStack/ExampleFargateService/TaskDef/Resource"
                    }
                },
                "ExampleFunctionServiceRoleD3E3B5A1": {
                    "Type": "AWS::IAM::Role",
                    "Metadata": {
                        "aws:cdk:path": "ExampleStack/ExampleFunction/ServiceRole/Resource"
                    }
                },
                "ExampleFunction1D4F8B3C": {
                    "Type": "AWS::Lambda::Function",
                    "Properties": {
                        "Handler": "index.handler",
                        "Runtime": "python3.9",
                        "Environment": {
                            "Variables": {
                                "BUCKET_NAME": {"Ref": "ExampleBucketDC717CF4"},
                                "TABLE_NAME": {"Ref": "ExampleTable114D508F"}
                            }
                        }
                    },
                    "DependsOn": ["ExampleFunctionServiceRoleD3E3B5A1"],
                    "Metadata": {"aws:cdk:path": "ExampleStack/ExampleFunction/Resource"}
                },
                "BareFunction0F1E2D3C": {
                    "Type": "AWS::Lambda::Function",
                    "Properties": {"Handler": "index.handler"},
                    "Metadata": {"aws:cdk:path": "ExampleStack/BareFunction/Resource"}
                },
                "WorkersNestedStackWorkersNestedStackResource6B3F0C4E": {
                    "Type": "AWS::CloudFormation::Stack",
                    "Properties": {
                        "TemplateURL": {
                            "Fn::Join": [
                                "",
                                [
                                    "https://s3.",
                                    {"Ref": "AWS::Region"},
                                    ".amazonaws.com/nested.json"
                                ]
                            ]
                        }
                    },
                    "Metadata": {
                        "aws:cdk:path":
                            "ExampleStack/Workers.NestedStack/Workers.NestedStackResource",
                        "aws:asset:path": NESTED_TEMPLATE_FILE
                    }
                },
                "CDKMetadata": {
                    "Type": "AWS::CDK::Metadata",
                    "Properties": {"Analytics": "v2:deflate64:H4sIAAAAAAAA"},
                    "Metadata": {"aws:cdk:path": "ExampleStack/CDKMetadata/Default"}
                }
            }
        }),
    );

    write_json(
        dir,
        NESTED_TEMPLATE_FILE,
        &json!({
            "Resources": {
                "WorkerQueue5E6F7A8B": {
                    "Type": "AWS::SQS::Queue",
                    "Metadata": {"aws:cdk:path": "ExampleStack/Workers/WorkerQueue/Resource"}
                },
                "WorkerFunctionA1B2C3D4": {
                    "Type": "AWS::Lambda::Function",
                    "Properties": {
                        "Environment": {
                            "Variables": {
                                "QUEUE_URL": {"Ref": "WorkerQueue5E6F7A8B"},
                                "STAGE": "dev",
                                "RETRIES": 3,
                                "DEBUG": false,
                                "QUEUE_ARN": {"Fn::GetAtt": ["WorkerQueue5E6F7A8B", "Arn"]}
                            }
                        }
                    },
                    "Metadata": {"aws:cdk:path": "ExampleStack/Workers/WorkerFunction/Resource"}
                }
            }
        }),
    );

    write_json(
        dir,
        "PinnedStack.template.json",
        &json!({
            "Resources": {
                "PinnedBucket4C3B2A19": {
                    "Type": "AWS::S3::Bucket",
                    "Metadata": {"aws:cdk:path": "PinnedStack/PinnedBucket/Resource"}
                },
                "PinnedFunction8E7D6C5B": {
                    "Type": "AWS::Lambda::Function",
                    "Properties": {
                        "Environment": {
                            "Variables": {
                                "BUCKET_NAME": {"Ref": "PinnedBucket4C3B2A19"}
                            }
                        }
                    },
                    "Metadata": {"aws:cdk:path": "PinnedStack/PinnedFunction/Resource"}
                },
                "BrokenFunction2B3C4D5E": {
                    "Type": "AWS::Lambda::Function",
                    "Properties": {
                        "Environment": {
                            "Variables": {
                                "BUCKET_NAME": {"Ref": "PinnedBucket4C3B2A19"},
                                "BROKEN": {"Ref": ""}
                            }
                        }
                    },
                    "Metadata": {"aws:cdk:path": "PinnedStack/BrokenFunction/Resource"}
                },
                "WorkerFunction9A8B7C6D": {
                    "Type": "AWS::Lambda::Function",
                    "Metadata": {"aws:cdk:path": "PinnedStack/WorkerFunction/Resource"}
                }
            }
        }),
    );
}
