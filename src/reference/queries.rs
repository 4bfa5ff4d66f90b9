//! Joins over a single service document.

use crate::reference::types::{
    ActionEntry, ConditionKeyInformation, ResourceInformation, ResourceSummary, ServiceDocument,
    ServiceStats,
};

pub fn service_stats(document: &ServiceDocument) -> ServiceStats {
    ServiceStats {
        actions: document.actions.len(),
        resources: document.resources.len(),
        condition_keys: document.condition_keys.len(),
    }
}

pub fn action_names(document: &ServiceDocument) -> Vec<String> {
    document.actions.iter().map(|a| a.name.clone()).collect()
}

pub fn resource_names(document: &ServiceDocument) -> Vec<String> {
    document.resources.iter().map(|r| r.name.clone()).collect()
}

pub fn condition_key_names(document: &ServiceDocument) -> Vec<String> {
    document
        .condition_keys
        .iter()
        .map(|key| key.name.clone())
        .collect()
}

/// The named action, with each of its resources carrying the ARN formats and
/// condition keys of the matching service-level resource.
pub fn action_information(document: &ServiceDocument, action: &str) -> Option<ActionEntry> {
    let mut entry = document
        .actions
        .iter()
        .find(|candidate| candidate.name == action)?
        .clone();

    if let Some(references) = entry.resources.as_mut() {
        for reference in references.iter_mut() {
            let Some(resource) = document
                .resources
                .iter()
                .find(|resource| resource.name == reference.name)
            else {
                continue;
            };
            reference.arn_formats = Some(resource.arn_formats.clone().unwrap_or_default());
            if let Some(condition_keys) = &resource.condition_keys {
                reference.condition_keys = Some(condition_keys.clone());
            }
        }
    }

    Some(entry)
}

/// `service:Placeholder` when the last path segment of the ARN format is a
/// `${Placeholder}` variable, e.g. `s3:ObjectName` for
/// `arn:${Partition}:s3:::${BucketName}/${ObjectName}`.
pub fn resource_identifier(service: &str, arn_format: &str) -> Option<String> {
    let last_segment = arn_format.rsplit('/').next().unwrap_or(arn_format);
    let placeholder = last_segment.strip_prefix("${")?.strip_suffix('}')?;
    Some(format!("{service}:{placeholder}"))
}

pub fn resource_information(
    service: &str,
    document: &ServiceDocument,
    resource: &str,
) -> Option<ResourceInformation> {
    let entry = document
        .resources
        .iter()
        .find(|candidate| candidate.name == resource)?;

    let mut information = ResourceInformation {
        resource: entry.clone(),
        actions_where_resource_appears_in_condition_key: None,
        actions_targeting_resource: None,
        condition_keys_that_rely_on_resource: None,
    };

    let Some(identifier) = entry
        .first_arn_format()
        .and_then(|arn_format| resource_identifier(service, arn_format))
    else {
        return Some(information);
    };
    tracing::debug!(target: "reference", resource, identifier = %identifier, "resource_identifier_resolved");

    let mut condition_keys = Vec::new();
    let mut actions_in_condition_keys = Vec::new();
    for condition_key in document
        .condition_keys
        .iter()
        .filter(|key| key.name.contains(&identifier))
    {
        condition_keys.push(condition_key.name.clone());
        actions_in_condition_keys.extend(
            document
                .actions
                .iter()
                .filter(|action| action.uses_condition_key(&condition_key.name))
                .map(|action| action.name.clone()),
        );
    }

    let actions_targeting = document
        .actions
        .iter()
        .filter(|action| action.targets_resource(resource))
        .map(|action| action.name.clone())
        .collect();

    information.condition_keys_that_rely_on_resource = Some(condition_keys);
    information.actions_where_resource_appears_in_condition_key = Some(actions_in_condition_keys);
    information.actions_targeting_resource = Some(actions_targeting);
    Some(information)
}

pub fn condition_key_information(
    document: &ServiceDocument,
    condition_key: &str,
) -> Option<ConditionKeyInformation> {
    let entry = document
        .condition_keys
        .iter()
        .find(|candidate| candidate.name == condition_key)?;

    Some(ConditionKeyInformation {
        condition_key: entry.clone(),
        actions_using_condition_key: document
            .actions
            .iter()
            .filter(|action| action.uses_condition_key(condition_key))
            .map(|action| action.name.clone())
            .collect(),
        resources_using_condition_key: document
            .resources
            .iter()
            .filter(|resource| resource.uses_condition_key(condition_key))
            .map(ResourceSummary::from)
            .collect(),
    })
}
