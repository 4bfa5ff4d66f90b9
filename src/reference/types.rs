use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::reference::error::{ReferenceError, decode_error, unexpected_format};

pub type ServiceCode = String;

/// One row of the upstream index: a service code and the URL of its document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEntry {
    pub service: ServiceCode,
    pub url: String,
}

/// Service code to document URL mapping, in upstream order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceIndex {
    entries: Vec<ServiceEntry>,
    positions: HashMap<ServiceCode, usize>,
}

impl ServiceIndex {
    /// A repeated service code overwrites the URL of the first occurrence
    /// and keeps that occurrence's position.
    pub fn from_entries(entries: impl IntoIterator<Item = ServiceEntry>) -> Self {
        let mut index = Self::default();
        for entry in entries {
            match index.positions.get(&entry.service) {
                Some(&position) => index.entries[position].url = entry.url,
                None => {
                    index
                        .positions
                        .insert(entry.service.clone(), index.entries.len());
                    index.entries.push(entry);
                }
            }
        }
        index
    }

    pub fn from_value(value: Value) -> Result<Self, ReferenceError> {
        let Value::Array(items) = value else {
            return Err(unexpected_format(
                "unexpected service index format: not a list",
            ));
        };

        let entries = items
            .into_iter()
            .enumerate()
            .map(|(position, item)| {
                serde_json::from_value::<ServiceEntry>(item).map_err(|err| {
                    unexpected_format(format!("invalid service index entry #{position}: {err}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::from_entries(entries))
    }

    pub fn url_for(&self, service: &str) -> Option<&str> {
        self.positions
            .get(service)
            .map(|&position| self.entries[position].url.as_str())
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.service.as_str())
    }

    pub fn entries(&self) -> &[ServiceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Authorization reference document for a single service, decoded for the
/// joins. The full document is served from the raw upstream JSON instead.
///
/// Missing or `null` sections decode as empty.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServiceDocument {
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "Actions", default, deserialize_with = "null_as_empty")]
    pub actions: Vec<ActionEntry>,
    #[serde(rename = "Resources", default, deserialize_with = "null_as_empty")]
    pub resources: Vec<ResourceEntry>,
    #[serde(rename = "ConditionKeys", default, deserialize_with = "null_as_empty")]
    pub condition_keys: Vec<ConditionKeyEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ServiceDocument {
    pub fn from_value(url: &str, value: Value) -> Result<Self, ReferenceError> {
        serde_json::from_value(value).map_err(|err| decode_error(url, err))
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionEntry {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(
        rename = "ActionConditionKeys",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub action_condition_keys: Option<Vec<String>>,
    #[serde(rename = "Resources", default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<ActionResourceRef>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ActionEntry {
    pub fn uses_condition_key(&self, condition_key: &str) -> bool {
        self.action_condition_keys
            .as_ref()
            .is_some_and(|keys| keys.iter().any(|key| key == condition_key))
    }

    pub fn targets_resource(&self, resource: &str) -> bool {
        self.resources
            .as_ref()
            .is_some_and(|refs| refs.iter().any(|reference| reference.name == resource))
    }
}

/// A resource named by an action. `arn_formats` and `condition_keys` are
/// filled in from the service-level resource when the action is looked up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResourceRef {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "ARNFormats", default, skip_serializing_if = "Option::is_none")]
    pub arn_formats: Option<Vec<String>>,
    #[serde(rename = "ConditionKeys", default, skip_serializing_if = "Option::is_none")]
    pub condition_keys: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceEntry {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "ARNFormats", default, skip_serializing_if = "Option::is_none")]
    pub arn_formats: Option<Vec<String>>,
    #[serde(rename = "ConditionKeys", default, skip_serializing_if = "Option::is_none")]
    pub condition_keys: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResourceEntry {
    pub fn first_arn_format(&self) -> Option<&str> {
        self.arn_formats.as_deref()?.first().map(String::as_str)
    }

    pub fn uses_condition_key(&self, condition_key: &str) -> bool {
        self.condition_keys
            .as_ref()
            .is_some_and(|keys| keys.iter().any(|key| key == condition_key))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionKeyEntry {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStats {
    #[serde(rename = "Actions")]
    pub actions: usize,
    #[serde(rename = "Resources")]
    pub resources: usize,
    #[serde(rename = "ConditionKeys")]
    pub condition_keys: usize,
}

/// Resource plus the actions and condition keys linked to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceInformation {
    #[serde(flatten)]
    pub resource: ResourceEntry,
    #[serde(
        rename = "ActionsWhereResourceAppearInConditionKey",
        skip_serializing_if = "Option::is_none"
    )]
    pub actions_where_resource_appears_in_condition_key: Option<Vec<String>>,
    #[serde(
        rename = "ActionsTargetingResource",
        skip_serializing_if = "Option::is_none"
    )]
    pub actions_targeting_resource: Option<Vec<String>>,
    #[serde(
        rename = "ConditionKeysThatRelyOnResource",
        skip_serializing_if = "Option::is_none"
    )]
    pub condition_keys_that_rely_on_resource: Option<Vec<String>>,
}

/// Resource as listed under a condition key: its own `ConditionKeys` are dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceSummary {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "ARNFormats", skip_serializing_if = "Option::is_none")]
    pub arn_formats: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<&ResourceEntry> for ResourceSummary {
    fn from(resource: &ResourceEntry) -> Self {
        Self {
            name: resource.name.clone(),
            arn_formats: resource.arn_formats.clone(),
            extra: resource.extra.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionKeyInformation {
    #[serde(flatten)]
    pub condition_key: ConditionKeyEntry,
    #[serde(rename = "ActionsUsingConditionKey")]
    pub actions_using_condition_key: Vec<String>,
    #[serde(rename = "ResourcesUsingConditionKey")]
    pub resources_using_condition_key: Vec<ResourceSummary>,
}
