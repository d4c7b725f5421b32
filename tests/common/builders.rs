//! Test builders — short constructors for schema descriptors, owners, and
//! result records. Readability over generality; these panic rather than
//! return `Result`.

use std::collections::BTreeMap;

use hublex_core::types::{ObjectRecord, OwnerRecord, PropertyDescriptor, PropertyOption};

/// A plain string property in a group.
pub fn string_prop(name: &str, label: &str, group: &str) -> PropertyDescriptor {
    PropertyDescriptor {
        name: name.into(),
        label: label.into(),
        field_type: "string".into(),
        group: group.into(),
        options: vec![],
    }
}

/// An enumeration property with label → value options.
pub fn enum_prop(name: &str, label: &str, group: &str, options: &[(&str, &str)]) -> PropertyDescriptor {
    PropertyDescriptor {
        name: name.into(),
        label: label.into(),
        field_type: "enumeration".into(),
        group: group.into(),
        options: options
            .iter()
            .map(|(l, v)| PropertyOption {
                label: l.to_string(),
                value: v.to_string(),
            })
            .collect(),
    }
}

/// A date-typed property (no options, never enumerable).
pub fn date_prop(name: &str, label: &str, group: &str) -> PropertyDescriptor {
    PropertyDescriptor {
        name: name.into(),
        label: label.into(),
        field_type: "date".into(),
        group: group.into(),
        options: vec![],
    }
}

pub fn owner(id: &str, first: &str, last: &str, email: &str) -> OwnerRecord {
    OwnerRecord {
        id: id.into(),
        first_name: first.into(),
        last_name: last.into(),
        email: email.into(),
    }
}

/// A search result row with string property values.
pub fn record(id: &str, props: &[(&str, &str)]) -> ObjectRecord {
    let properties: BTreeMap<String, serde_json::Value> = props
        .iter()
        .map(|(k, v)| (k.to_string(), serde_json::json!(v)))
        .collect();
    ObjectRecord {
        id: id.into(),
        properties,
    }
}
