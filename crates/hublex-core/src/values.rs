//! Value index — human labels to internal values, per property.
//!
//! Built from two sources: the remote owner directory (attached under both
//! owner property aliases, since object types disagree on the field name)
//! and the option lists of enumerable properties. Lookup falls back from
//! exact match through case-insensitive match to substring match, and an
//! unresolvable label passes through unchanged — a filter that never
//! matches is preferred over a rejected query.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::api::CrmApi;
use crate::cache::{evict, new_ttl_map, read_valid, replace_entry, TtlMap};
use crate::error::Fetched;
use crate::types::{ObjectType, OwnerRecord, ValueMapping};

/// Property names an owner mapping is attached under. Different object
/// types report the owning user under different field names.
pub const OWNER_PROPERTY_ALIASES: [&str; 2] = ["hubspot_owner_id", "company_owner"];

/// Substring fallback never considers labels shorter than this. Mirrors the
/// guard on the generic resolver fallback; without it a two-letter option
/// label would swallow arbitrary queries.
const MIN_SUBSTRING_LABEL: usize = 3;

/// property name → (label → internal value), for one object type.
pub type ValueMappings = BTreeMap<String, ValueMapping>;

/// Time-bounded index of label → internal-value mappings.
pub struct ValueIndex<C> {
    api: Arc<C>,
    ttl: Duration,
    cache: TtlMap<Arc<ValueMappings>>,
}

impl<C: CrmApi> ValueIndex<C> {
    pub fn new(api: Arc<C>, ttl: Duration) -> Self {
        Self {
            api,
            ttl,
            cache: new_ttl_map(),
        }
    }

    /// All value mappings for one object type, fetching from the
    /// collaborator when the cache entry is absent or expired.
    ///
    /// A failed sub-fetch degrades to whatever the other source produced;
    /// the cause is retained so callers can tell partial knowledge apart
    /// from a complete one.
    pub async fn discover_all_property_values(
        &self,
        object_type: ObjectType,
    ) -> Fetched<Arc<ValueMappings>> {
        if let Some(cached) = read_valid(&self.cache, object_type, self.ttl) {
            return Fetched::Fresh(cached);
        }

        let mut mappings = ValueMappings::new();
        let mut degraded_cause = None;

        match self.api.fetch_owners().await {
            Ok(owners) => {
                let owner_mapping = build_owner_mapping(&owners);
                if !owner_mapping.is_empty() {
                    for alias in OWNER_PROPERTY_ALIASES {
                        mappings.insert(alias.to_string(), owner_mapping.clone());
                    }
                }
            }
            Err(cause) => {
                tracing::warn!(error = %cause, "owner directory fetch failed, owner labels unavailable");
                degraded_cause = Some(cause);
            }
        }

        match self.api.fetch_properties(object_type).await {
            Ok(props) => {
                for prop in &props {
                    if !prop.is_enumerable() || prop.options.is_empty() {
                        continue;
                    }
                    let mut option_mapping = ValueMapping::new();
                    for option in &prop.options {
                        let label = option.label.trim();
                        if label.is_empty() || option.value.is_empty() {
                            continue;
                        }
                        option_mapping.insert(label.to_string(), option.value.clone());
                        option_mapping.insert(label.to_lowercase(), option.value.clone());
                    }
                    if !option_mapping.is_empty() {
                        mappings.insert(prop.name.clone(), option_mapping);
                    }
                }
            }
            Err(cause) => {
                tracing::warn!(%object_type, error = %cause, "property options fetch failed, option labels unavailable");
                degraded_cause = Some(cause);
            }
        }

        let mappings = Arc::new(mappings);
        match degraded_cause {
            None => {
                replace_entry(&self.cache, object_type, mappings.clone());
                Fetched::Fresh(mappings)
            }
            // A partial index is not cached: the next call retries the
            // failed source instead of serving degraded data for an hour.
            Some(cause) => Fetched::Degraded {
                fallback: mappings,
                cause,
            },
        }
    }

    /// Resolve a human-readable value to the internal value the remote
    /// search API expects. Returns the input unchanged when nothing maps.
    pub async fn map_value_to_internal(
        &self,
        object_type: ObjectType,
        property: &str,
        human_value: &str,
    ) -> String {
        let mappings = self.discover_all_property_values(object_type).await.into_inner();
        let Some(mapping) = mappings.get(property) else {
            return human_value.to_string();
        };
        resolve_label(mapping, human_value)
    }

    /// Inverse of [`map_value_to_internal`]: the human label for an internal
    /// value. Ties resolve to the lexicographically smallest label.
    pub async fn map_internal_to_human(
        &self,
        object_type: ObjectType,
        property: &str,
        internal_value: &str,
    ) -> String {
        let mappings = self.discover_all_property_values(object_type).await.into_inner();
        mappings
            .get(property)
            .and_then(|mapping| {
                mapping
                    .iter()
                    .find(|(_, v)| v.as_str() == internal_value)
                    .map(|(label, _)| label.clone())
            })
            .unwrap_or_else(|| internal_value.to_string())
    }

    /// All labels containing `keyword` (case-insensitive), per property.
    pub async fn search_values_by_keyword(
        &self,
        object_type: ObjectType,
        keyword: &str,
    ) -> ValueMappings {
        let mappings = self.discover_all_property_values(object_type).await.into_inner();
        let needle = keyword.to_lowercase();

        let mut matches = ValueMappings::new();
        for (property, mapping) in mappings.iter() {
            let hits: ValueMapping = mapping
                .iter()
                .filter(|(label, _)| label.to_lowercase().contains(&needle))
                .map(|(l, v)| (l.clone(), v.clone()))
                .collect();
            if !hits.is_empty() {
                matches.insert(property.clone(), hits);
            }
        }
        matches
    }

    /// Drop cached mappings and re-fetch. Returns the total number of
    /// label → value entries now known per object type.
    pub async fn refresh(&self, object_type: Option<ObjectType>) -> BTreeMap<ObjectType, usize> {
        let targets: Vec<ObjectType> = match object_type {
            Some(ot) => vec![ot],
            None => ObjectType::ALL.to_vec(),
        };

        let mut counts = BTreeMap::new();
        for ot in targets {
            evict(&self.cache, ot);
            let mappings = self.discover_all_property_values(ot).await.into_inner();
            counts.insert(ot, mappings.values().map(BTreeMap::len).sum());
        }
        counts
    }
}

// ---------------------------------------------------------------------------
// Lookup algorithm
// ---------------------------------------------------------------------------

/// Resolve one label against one property's mapping, in priority order:
/// exact, case-insensitive exact, then substring either direction. Among
/// several substring candidates the longest label wins, then lexicographic
/// order — an explicit tie-break where the original behavior depended on
/// map iteration order.
pub fn resolve_label(mapping: &ValueMapping, human_value: &str) -> String {
    if let Some(v) = mapping.get(human_value) {
        return v.clone();
    }

    let needle = human_value.to_lowercase();
    if let Some(label) = best_label(
        mapping
            .keys()
            .filter(|label| label.to_lowercase() == needle)
            .map(String::as_str),
    ) {
        return mapping[label].clone();
    }

    if let Some(label) = best_label(mapping.keys().map(String::as_str).filter(|label| {
        if label.len() < MIN_SUBSTRING_LABEL {
            return false;
        }
        let label_l = label.to_lowercase();
        needle.contains(&label_l) || label_l.contains(&needle)
    })) {
        return mapping[label].clone();
    }

    human_value.to_string()
}

/// Deterministic candidate selection: longest label first, lexicographic on
/// equal length.
pub(crate) fn best_label<'a>(candidates: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    candidates.min_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)))
}

/// Owner directory → label → owner id, keyed by full name, first name,
/// email, and email local part. Owners are processed in id order so that
/// shared first names resolve deterministically (highest id wins the
/// ambiguous short keys).
pub fn build_owner_mapping(owners: &[OwnerRecord]) -> ValueMapping {
    let mut sorted: Vec<&OwnerRecord> = owners.iter().filter(|o| !o.id.is_empty()).collect();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));

    let mut mapping = ValueMapping::new();
    for owner in sorted {
        let full_name = owner.full_name();
        if !full_name.is_empty() {
            mapping.insert(full_name, owner.id.clone());
        }
        if !owner.first_name.is_empty() {
            mapping.insert(owner.first_name.clone(), owner.id.clone());
        }
        if !owner.email.is_empty() {
            mapping.insert(owner.email.clone(), owner.id.clone());
            if let Some(local) = owner.email.split('@').next() {
                if !local.is_empty() {
                    mapping.insert(local.to_string(), owner.id.clone());
                }
            }
        }
    }
    mapping
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
