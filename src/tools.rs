use std::sync::Arc;

use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    protocol::{RpcError, invalid_params},
    reference::{ReferenceCatalog, ReferenceError, ReferenceErrorKind},
};

pub const SERVICE_CODES: &str = "retrieve_service_codes";
pub const SERVICE_INFORMATION: &str = "retrieve_service_information";
pub const SERVICE_STATS: &str = "retrieve_service_stats";
pub const SERVICE_ACTIONS: &str = "retrieve_service_actions";
pub const SERVICE_RESOURCES: &str = "retrieve_service_resources";
pub const SERVICE_CONDITION_KEYS: &str = "retrieve_service_condition_keys";
pub const SERVICE_ACTION_INFORMATION: &str = "retrieve_service_action_information";
pub const SERVICE_RESOURCE_INFORMATION: &str = "retrieve_service_resource_information";
pub const SERVICE_CONDITION_KEY_INFORMATION: &str = "retrieve_service_condition_key_information";

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct NoArgs {}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ServiceArgs {
    /// Code of the AWS service, e.g. `s3`. Call retrieve_service_codes if unsure.
    pub service: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ServiceActionArgs {
    /// Code of the AWS service, e.g. `s3`. Call retrieve_service_codes if unsure.
    pub service: String,
    /// Action name without the service prefix, e.g. `GetObject`.
    pub action: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ServiceResourceArgs {
    /// Code of the AWS service, e.g. `s3`. Call retrieve_service_codes if unsure.
    pub service: String,
    /// Resource type name, e.g. `object`.
    pub resource: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ServiceConditionKeyArgs {
    /// Code of the AWS service, e.g. `s3`. Call retrieve_service_codes if unsure.
    pub service: String,
    /// Full condition key name, e.g. `s3:prefix`.
    pub condition_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

fn input_schema<T: JsonSchema>() -> Value {
    serde_json::to_value(schema_for!(T)).unwrap_or(Value::Null)
}

pub fn tool_descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: SERVICE_CODES,
            description: "Retrieve every service code accepted by the other tools, as a comma-separated list.",
            input_schema: input_schema::<NoArgs>(),
        },
        ToolDescriptor {
            name: SERVICE_INFORMATION,
            description: "Retrieve the full authorization reference (IAM actions, resources and condition keys) of one AWS service. The document can be very large; prefer the narrower tools when they suffice.",
            input_schema: input_schema::<ServiceArgs>(),
        },
        ToolDescriptor {
            name: SERVICE_STATS,
            description: "Retrieve the number of actions, resources and condition keys of one AWS service.",
            input_schema: input_schema::<ServiceArgs>(),
        },
        ToolDescriptor {
            name: SERVICE_ACTIONS,
            description: "Retrieve the actions of one AWS service, as a comma-separated list.",
            input_schema: input_schema::<ServiceArgs>(),
        },
        ToolDescriptor {
            name: SERVICE_RESOURCES,
            description: "Retrieve the resource types of one AWS service, as a comma-separated list.",
            input_schema: input_schema::<ServiceArgs>(),
        },
        ToolDescriptor {
            name: SERVICE_CONDITION_KEYS,
            description: "Retrieve the condition keys of one AWS service, as a comma-separated list.",
            input_schema: input_schema::<ServiceArgs>(),
        },
        ToolDescriptor {
            name: SERVICE_ACTION_INFORMATION,
            description: "Retrieve the authorization reference of a single action, with the ARN formats and condition keys of every resource it targets.",
            input_schema: input_schema::<ServiceActionArgs>(),
        },
        ToolDescriptor {
            name: SERVICE_RESOURCE_INFORMATION,
            description: "Retrieve the authorization reference of a single resource type: actions that target it and condition keys (and their actions) that rely on it.",
            input_schema: input_schema::<ServiceResourceArgs>(),
        },
        ToolDescriptor {
            name: SERVICE_CONDITION_KEY_INFORMATION,
            description: "Retrieve the authorization reference of a single condition key: the actions and resource types that use it.",
            input_schema: input_schema::<ServiceConditionKeyArgs>(),
        },
    ]
}

#[derive(Debug, Clone)]
pub enum ToolCall {
    ServiceCodes,
    ServiceInformation(ServiceArgs),
    ServiceStats(ServiceArgs),
    ServiceActions(ServiceArgs),
    ServiceResources(ServiceArgs),
    ServiceConditionKeys(ServiceArgs),
    ServiceActionInformation(ServiceActionArgs),
    ServiceResourceInformation(ServiceResourceArgs),
    ServiceConditionKeyInformation(ServiceConditionKeyArgs),
}

fn arguments<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T, RpcError> {
    let arguments = if arguments.is_null() {
        Value::Object(Default::default())
    } else {
        arguments
    };
    serde_json::from_value(arguments)
        .map_err(|err| invalid_params(format!("invalid arguments for {tool}: {err}")))
}

impl ToolCall {
    pub fn parse(name: &str, args: Value) -> Result<Self, RpcError> {
        let call = match name {
            SERVICE_CODES => {
                arguments::<NoArgs>(name, args)?;
                Self::ServiceCodes
            }
            SERVICE_INFORMATION => Self::ServiceInformation(arguments(name, args)?),
            SERVICE_STATS => Self::ServiceStats(arguments(name, args)?),
            SERVICE_ACTIONS => Self::ServiceActions(arguments(name, args)?),
            SERVICE_RESOURCES => Self::ServiceResources(arguments(name, args)?),
            SERVICE_CONDITION_KEYS => Self::ServiceConditionKeys(arguments(name, args)?),
            SERVICE_ACTION_INFORMATION => Self::ServiceActionInformation(arguments(name, args)?),
            SERVICE_RESOURCE_INFORMATION => {
                Self::ServiceResourceInformation(arguments(name, args)?)
            }
            SERVICE_CONDITION_KEY_INFORMATION => {
                Self::ServiceConditionKeyInformation(arguments(name, args)?)
            }
            other => return Err(invalid_params(format!("unknown tool: {other}"))),
        };
        Ok(call)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ServiceCodes => SERVICE_CODES,
            Self::ServiceInformation(_) => SERVICE_INFORMATION,
            Self::ServiceStats(_) => SERVICE_STATS,
            Self::ServiceActions(_) => SERVICE_ACTIONS,
            Self::ServiceResources(_) => SERVICE_RESOURCES,
            Self::ServiceConditionKeys(_) => SERVICE_CONDITION_KEYS,
            Self::ServiceActionInformation(_) => SERVICE_ACTION_INFORMATION,
            Self::ServiceResourceInformation(_) => SERVICE_RESOURCE_INFORMATION,
            Self::ServiceConditionKeyInformation(_) => SERVICE_CONDITION_KEY_INFORMATION,
        }
    }
}

/// Runs tool calls against the catalog. Every call yields JSON or null;
/// lookup failures are logged, not returned.
#[derive(Clone)]
pub struct Toolbox {
    catalog: Arc<ReferenceCatalog>,
}

impl Toolbox {
    pub fn new(catalog: Arc<ReferenceCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &ReferenceCatalog {
        &self.catalog
    }

    pub async fn call(&self, call: ToolCall) -> Value {
        let tool = call.name();
        let catalog = &self.catalog;
        match call {
            ToolCall::ServiceCodes => settle(
                tool,
                catalog
                    .service_codes()
                    .await
                    .map(|codes| if codes.is_empty() { None } else { joined(codes) }),
            ),
            ToolCall::ServiceInformation(args) => {
                settle(tool, catalog.service_document(&args.service).await.map(Some))
            }
            ToolCall::ServiceStats(args) => {
                settle(tool, catalog.service_stats(&args.service).await.map(Some))
            }
            ToolCall::ServiceActions(args) => {
                settle(tool, catalog.action_names(&args.service).await.map(joined))
            }
            ToolCall::ServiceResources(args) => {
                settle(tool, catalog.resource_names(&args.service).await.map(joined))
            }
            ToolCall::ServiceConditionKeys(args) => settle(
                tool,
                catalog.condition_key_names(&args.service).await.map(joined),
            ),
            ToolCall::ServiceActionInformation(args) => settle(
                tool,
                catalog
                    .action_information(&args.service, &args.action)
                    .await,
            ),
            ToolCall::ServiceResourceInformation(args) => settle(
                tool,
                catalog
                    .resource_information(&args.service, &args.resource)
                    .await,
            ),
            ToolCall::ServiceConditionKeyInformation(args) => settle(
                tool,
                catalog
                    .condition_key_information(&args.service, &args.condition_key)
                    .await,
            ),
        }
    }
}

fn joined(names: Vec<String>) -> Option<String> {
    Some(names.join(", "))
}

fn settle<T: Serialize>(tool: &str, outcome: Result<Option<T>, ReferenceError>) -> Value {
    match outcome {
        Ok(Some(value)) => serde_json::to_value(value).unwrap_or_else(|err| {
            tracing::warn!(target: "tools", tool, error = %err, "tool_result_serialization_failed");
            Value::Null
        }),
        Ok(None) => {
            tracing::debug!(target: "tools", tool, "tool_no_match");
            Value::Null
        }
        Err(err) if err.kind == ReferenceErrorKind::ServiceNotFound => {
            tracing::info!(target: "tools", tool, error = %err, "tool_unknown_service");
            Value::Null
        }
        Err(err) => {
            tracing::warn!(
                target: "tools",
                tool,
                error = %err,
                kind = ?err.kind,
                http_status = ?err.http_status,
                "tool_lookup_failed"
            );
            Value::Null
        }
    }
}
