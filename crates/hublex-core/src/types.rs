//! Core types for hublex-core.
//!
//! This module defines the data structures shared across all layers: the
//! [`ObjectType`] discriminant, remote schema descriptors, the persisted
//! [`Encyclopedia`], and the [`Filter`] conditions handed to the remote
//! search API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The CRM object kinds this middleware knows about.
///
/// Any other string is a caller-side validation error — the boundary layer
/// rejects it before the resolvers ever see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    Companies,
    Contacts,
    Deals,
    Tickets,
}

impl ObjectType {
    pub const ALL: [ObjectType; 4] = [
        ObjectType::Companies,
        ObjectType::Contacts,
        ObjectType::Deals,
        ObjectType::Tickets,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ObjectType::Companies => "companies",
            ObjectType::Contacts => "contacts",
            ObjectType::Deals => "deals",
            ObjectType::Tickets => "tickets",
        }
    }

    /// Parse a caller-supplied object type. Case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "companies" => Some(ObjectType::Companies),
            "contacts" => Some(ObjectType::Contacts),
            "deals" => Some(ObjectType::Deals),
            "tickets" => Some(ObjectType::Tickets),
            _ => None,
        }
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One enumerated option on a property, as the remote schema reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyOption {
    pub label: String,
    pub value: String,
}

/// A property definition fetched from the remote schema API.
///
/// `options` is non-empty only for enumerable field types (enumeration,
/// radio, select, checkbox).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(rename = "groupName", default)]
    pub group: String,
    #[serde(default)]
    pub options: Vec<PropertyOption>,
}

impl PropertyDescriptor {
    /// Field types whose options carry a label → value mapping.
    pub fn is_enumerable(&self) -> bool {
        matches!(
            self.field_type.as_str(),
            "enumeration" | "radio" | "select" | "checkbox"
        )
    }
}

/// One entry from the remote owner directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerRecord {
    pub id: String,
    #[serde(rename = "firstName", default)]
    pub first_name: String,
    #[serde(rename = "lastName", default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

impl OwnerRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Human label → internal value, for one property. Multiple labels may map
/// to the same internal value (aliases). Ordered so that iteration, file
/// output, and tie-breaks are deterministic.
pub type ValueMapping = BTreeMap<String, String>;

/// A property as it appears inside a [`GroupDescriptor`], with its value
/// mapping embedded when one exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupProperty {
    pub label: String,
    pub field_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub options: Vec<PropertyOption>,
    #[serde(default)]
    pub value_mapping: ValueMapping,
}

/// A schema-declared property group. Every property belongs to exactly one
/// group; ungrouped properties land in the synthetic `other` group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDescriptor {
    pub key: String,
    pub display_label: String,
    pub properties: BTreeMap<String, GroupProperty>,
    pub property_count: usize,
}

/// The persisted bundle of property and value mappings for one object type.
///
/// Produced by a refresh, written to one JSON file per object type, loaded
/// back into memory at resolver construction, and authoritative until the
/// next caller-triggered refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Encyclopedia {
    pub object_type: ObjectType,
    /// internal property name → human label.
    pub property_mappings: BTreeMap<String, String>,
    /// property name → (human label → internal value).
    pub value_mappings: BTreeMap<String, ValueMapping>,
    /// Grouped variant, present only for hierarchical exports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<BTreeMap<String, GroupDescriptor>>,
    /// How many live records the export sampled (diagnostic only).
    #[serde(default)]
    pub sample_records: usize,
    pub exported_at: chrono::DateTime<chrono::Utc>,
}

impl Encyclopedia {
    pub fn empty(object_type: ObjectType) -> Self {
        Self {
            object_type,
            property_mappings: BTreeMap::new(),
            value_mappings: BTreeMap::new(),
            groups: None,
            sample_records: 0,
            exported_at: chrono::Utc::now(),
        }
    }

    /// Total number of label → value entries across all properties.
    pub fn total_values(&self) -> usize {
        self.value_mappings.values().map(BTreeMap::len).sum()
    }
}

/// Comparison operator understood by the remote search API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterOperator {
    Eq,
    Neq,
    Gt,
    Lt,
    Gte,
    Lte,
    ContainsToken,
    StartsWith,
    EndsWith,
    In,
    NotIn,
    HasProperty,
}

/// One structured condition submitted to the remote search API.
///
/// `In`/`NotIn` carry `values`; every other operator carries `value`.
/// Serialized field names match the remote wire format (`propertyName`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(rename = "propertyName")]
    pub property_name: String,
    pub operator: FilterOperator,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}

impl Filter {
    pub fn eq(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property_name: property.into(),
            operator: FilterOperator::Eq,
            value: Some(value.into()),
            values: None,
        }
    }

    /// Non-null check: "this property has a value set".
    pub fn has_property(property: impl Into<String>) -> Self {
        Self {
            property_name: property.into(),
            operator: FilterOperator::HasProperty,
            value: Some(String::new()),
            values: None,
        }
    }

}

/// One record returned by the remote search API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub id: String,
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,
}

impl ObjectRecord {
    /// The property value as a string, if present and non-null.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).and_then(|v| v.as_str())
    }
}
