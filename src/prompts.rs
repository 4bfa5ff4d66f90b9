use serde::Serialize;
use serde_json::{Value, json};

use crate::protocol::{RpcError, invalid_params};

pub const IAM_REFERENCE_PROMPT: &str = "get_iam_reference_data_for_service";

const IAM_REFERENCE_GUIDANCE: &str = "To retrieve information about an AWS service, work step by step: \
first call retrieve_service_codes and find the code of the service, \
then call retrieve_service_actions, retrieve_service_resources or retrieve_service_condition_keys \
depending on what you need to look at, \
then call retrieve_service_action_information, retrieve_service_resource_information \
or retrieve_service_condition_key_information to get the details of a single entry.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub arguments: Vec<Value>,
}

pub fn prompt_descriptors() -> Vec<PromptDescriptor> {
    vec![PromptDescriptor {
        name: IAM_REFERENCE_PROMPT,
        description: "Retrieve authorization reference data (IAM actions, resources and condition keys) for AWS services",
        arguments: Vec::new(),
    }]
}

/// `prompts/get` result for `name`.
pub fn render_prompt(name: &str) -> Result<Value, RpcError> {
    let descriptor = prompt_descriptors()
        .into_iter()
        .find(|descriptor| descriptor.name == name)
        .ok_or_else(|| invalid_params(format!("unknown prompt: {name}")))?;

    Ok(json!({
        "description": descriptor.description,
        "messages": [{
            "role": "user",
            "content": {"type": "text", "text": IAM_REFERENCE_GUIDANCE},
        }],
    }))
}
