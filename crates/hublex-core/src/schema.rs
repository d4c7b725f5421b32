//! Schema cache — property and group metadata per object type, with TTL.
//!
//! Wraps the remote schema collaborator behind a time-bounded cache so that
//! resolution never re-queries schema metadata on every request. Entries are
//! replaced wholesale; a fetch failure degrades to an empty mapping and is
//! never raised (callers must treat empty as "unknown", not as "this object
//! type has no properties").

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::api::CrmApi;
use crate::cache::{evict, new_ttl_map, read_valid, replace_entry, TtlMap};
use crate::error::{ApiError, Fetched};
use crate::types::{GroupDescriptor, GroupProperty, ObjectType, PropertyDescriptor};

/// internal property name → derived human label.
pub type PropertyLabels = BTreeMap<String, String>;
/// normalized group key → group descriptor (value mappings not yet merged).
pub type GroupedProperties = BTreeMap<String, GroupDescriptor>;

/// Curated display labels for group keys the remote tends to report with
/// machine-flavored names. Keys are normalized group keys.
static GROUP_LABELS: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "companyinformation" => "Company Information",
    "company_information" => "Company Information",
    "billing_information" => "Billing Information",
    "customer_success" => "Customer Success",
    "web_analytics" => "Web Analytics",
    "social_media" => "Social Media",
    "conversion_information" => "Conversion Information",
};

/// Group key for properties the schema reports without a group.
pub const UNGROUPED_KEY: &str = "other";

/// Time-bounded cache over the remote schema API.
pub struct SchemaCache<C> {
    api: Arc<C>,
    ttl: Duration,
    flat: TtlMap<Arc<PropertyLabels>>,
    grouped: TtlMap<Arc<GroupedProperties>>,
}

impl<C: CrmApi> SchemaCache<C> {
    pub fn new(api: Arc<C>, ttl: Duration) -> Self {
        Self {
            api,
            ttl,
            flat: new_ttl_map(),
            grouped: new_ttl_map(),
        }
    }

    /// All properties of one object type as internal name → human label.
    pub async fn fetch_properties(&self, object_type: ObjectType) -> Fetched<Arc<PropertyLabels>> {
        if let Some(cached) = read_valid(&self.flat, object_type, self.ttl) {
            return Fetched::Fresh(cached);
        }

        match self.api.fetch_properties(object_type).await {
            Ok(props) => {
                let labels: PropertyLabels = props
                    .iter()
                    .filter(|p| !p.name.is_empty())
                    .map(|p| (p.name.clone(), readable_name(p)))
                    .collect();
                let labels = Arc::new(labels);
                replace_entry(&self.flat, object_type, labels.clone());
                Fetched::Fresh(labels)
            }
            Err(cause) => {
                tracing::warn!(%object_type, error = %cause, "schema fetch failed, degrading to empty property map");
                Fetched::Degraded {
                    fallback: Arc::new(PropertyLabels::new()),
                    cause,
                }
            }
        }
    }

    /// All properties of one object type partitioned by schema-declared
    /// group, with derived labels.
    pub async fn fetch_grouped_properties(
        &self,
        object_type: ObjectType,
    ) -> Fetched<Arc<GroupedProperties>> {
        if let Some(cached) = read_valid(&self.grouped, object_type, self.ttl) {
            return Fetched::Fresh(cached);
        }

        match self.api.fetch_properties(object_type).await {
            Ok(props) => {
                let groups = Arc::new(organize_by_groups(&props));
                replace_entry(&self.grouped, object_type, groups.clone());
                Fetched::Fresh(groups)
            }
            Err(cause) => {
                tracing::warn!(%object_type, error = %cause, "grouped schema fetch failed, degrading to empty group map");
                Fetched::Degraded {
                    fallback: Arc::new(GroupedProperties::new()),
                    cause,
                }
            }
        }
    }

    /// Drop any cached entries for one object type. The next fetch goes to
    /// the collaborator.
    pub fn invalidate(&self, object_type: ObjectType) {
        evict(&self.flat, object_type);
        evict(&self.grouped, object_type);
    }
}

// ---------------------------------------------------------------------------
// Group organization
// ---------------------------------------------------------------------------

fn organize_by_groups(props: &[PropertyDescriptor]) -> GroupedProperties {
    let mut groups = GroupedProperties::new();

    for prop in props {
        if prop.name.is_empty() {
            continue;
        }
        let raw_group = if prop.group.is_empty() {
            UNGROUPED_KEY
        } else {
            prop.group.as_str()
        };
        let key = normalize_group_key(raw_group);

        let group = groups.entry(key.clone()).or_insert_with(|| GroupDescriptor {
            key: key.clone(),
            display_label: humanize_group_name(raw_group),
            properties: BTreeMap::new(),
            property_count: 0,
        });

        group.properties.insert(
            prop.name.clone(),
            GroupProperty {
                label: readable_name(prop),
                field_type: prop.field_type.clone(),
                description: String::new(),
                options: if prop.is_enumerable() {
                    prop.options.clone()
                } else {
                    Vec::new()
                },
                value_mapping: BTreeMap::new(),
            },
        );
        group.property_count += 1;
    }

    groups
}

/// Normalize a remote group key for lookup identity: lowercase, spaces and
/// hyphens become underscores.
pub fn normalize_group_key(raw: &str) -> String {
    if raw.is_empty() {
        return UNGROUPED_KEY.to_string();
    }
    raw.to_lowercase().replace([' ', '-'], "_")
}

/// Display label for a group: curated mapping when known, otherwise the raw
/// name title-cased.
pub fn humanize_group_name(raw: &str) -> String {
    if raw.is_empty() {
        return "Other Properties".to_string();
    }
    let normalized = normalize_group_key(raw);
    if let Some(label) = GROUP_LABELS.get(normalized.as_str()) {
        return (*label).to_string();
    }
    title_case(&raw.replace(['_', '-'], " "))
}

// ---------------------------------------------------------------------------
// Label derivation
// ---------------------------------------------------------------------------

/// The human label for a property: the schema-provided label when it is
/// usable, otherwise a label derived from the internal name.
pub fn readable_name(prop: &PropertyDescriptor) -> String {
    if is_clean_label(&prop.label) {
        return clean_label(&prop.label);
    }
    humanize_internal_name(&prop.name)
}

/// A schema label is usable when it reads like prose: contains a space, is
/// not all-lowercase, has no underscores, and sits in a reasonable length
/// band.
fn is_clean_label(label: &str) -> bool {
    !label.is_empty()
        && label.contains(' ')
        && label.chars().any(|c| c.is_uppercase())
        && !label.contains('_')
        && (3..=50).contains(&label.len())
}

fn clean_label(label: &str) -> String {
    let trimmed = label.trim();
    if trimmed.chars().skip(1).any(|c| c.is_uppercase()) {
        trimmed.to_string()
    } else {
        title_case(trimmed)
    }
}

/// Derive a label from an internal name: strip the `hs_` prefix, split on
/// underscores or camelCase humps, title-case each segment.
pub fn humanize_internal_name(internal: &str) -> String {
    if internal.is_empty() {
        return String::new();
    }

    let name = internal.strip_prefix("hs_").unwrap_or(internal);

    if name.contains('_') {
        return name
            .split('_')
            .filter(|w| !w.is_empty())
            .map(capitalize)
            .collect::<Vec<_>>()
            .join(" ");
    }

    if name.chars().skip(1).any(|c| c.is_uppercase()) {
        let mut words: Vec<String> = Vec::new();
        let mut current = String::new();
        for c in name.chars() {
            if c.is_uppercase() && !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            current.extend(c.to_lowercase());
        }
        if !current.is_empty() {
            words.push(current);
        }
        return words.iter().map(|w| capitalize(w)).collect::<Vec<_>>().join(" ");
    }

    title_case(&name.replace('-', " "))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
