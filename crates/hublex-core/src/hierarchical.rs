//! Hierarchical resolver — group-scoped filter resolution.
//!
//! Instead of scanning every value mapping, ranks the schema-declared
//! property groups against the query and runs the category resolvers inside
//! each ranked group, stopping at the first group that yields any filter.
//! Requires a grouped encyclopedia export; without one the resolution
//! degrades to an unfiltered search.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::api::CrmApi;
use crate::config::KeywordTables;
use crate::groups::{GroupIndex, RankedGroup};
use crate::insight;
use crate::resolver::{QueryAnalysis, QueryResolver, ResolvedQuery};
use crate::types::{Filter, GroupDescriptor, GroupProperty, ObjectType};
use crate::values::best_label;

/// Group-scoped resolver sharing the flat resolver's encyclopedia cache
/// and search execution.
pub struct HierarchicalResolver<C> {
    flat: Arc<QueryResolver<C>>,
}

impl<C: CrmApi> HierarchicalResolver<C> {
    pub fn new(flat: Arc<QueryResolver<C>>) -> Self {
        Self { flat }
    }

    /// Resolve and search, scoped to the top-ranked property groups.
    pub async fn resolve_and_search(
        &self,
        object_type: ObjectType,
        query: &str,
        limit: usize,
        identity_hint: Option<&str>,
    ) -> ResolvedQuery {
        let limit = self.flat.effective_limit(query, limit);
        let encyclopedia = self.flat.encyclopedia(object_type);
        let empty = BTreeMap::new();
        let groups = encyclopedia
            .as_deref()
            .and_then(|e| e.groups.as_ref())
            .unwrap_or(&empty);

        let index = GroupIndex::build(groups);
        let ranked = index.identify_relevant_groups(groups, query);
        let group_labels: Vec<String> = ranked
            .iter()
            .map(|g| g.group.display_label.clone())
            .collect();

        let query_lower = query.to_lowercase();
        let mut analysis = analyze_within_groups(&query_lower, &ranked);
        analysis.groups_analyzed = group_labels.clone();

        let filters = resolve_within_groups(
            &query_lower,
            &ranked,
            self.flat.keywords(),
            identity_hint,
        );
        tracing::debug!(
            %object_type,
            query,
            groups = ranked.len(),
            filters = filters.len(),
            "hierarchical resolution"
        );

        let results = self.flat.execute(object_type, &filters, limit).await;
        let note = insight::generate_hierarchical_insights(
            &analysis,
            &filters,
            &results,
            query,
            ranked.len(),
        );

        let display_results = self.flat.translate(&results);
        ResolvedQuery {
            query: query.to_string(),
            object_type,
            query_analysis: analysis,
            resolved_filters: filters,
            total_returned: results.len(),
            results,
            display_results,
            limit_applied: limit,
            note,
            relevant_groups: Some(group_labels),
        }
    }
}

// ---------------------------------------------------------------------------
// Group-scoped analysis and resolution
// ---------------------------------------------------------------------------

/// Categorize the ranked groups' properties against the query terms.
fn analyze_within_groups(query: &str, ranked: &[RankedGroup<'_>]) -> QueryAnalysis {
    let mut analysis = QueryAnalysis::default();
    let query_terms: Vec<&str> = query.split_whitespace().collect();

    for group in ranked {
        for prop in group.group.properties.values() {
            let label_lower = prop.label.to_lowercase();
            if !query_terms.iter().any(|term| label_lower.contains(term)) {
                continue;
            }
            if label_lower.contains("owner") {
                analysis.owner_terms.push(prop.label.clone());
            } else if label_lower.contains("status") || label_lower.contains("stage") {
                analysis.status_terms.push(prop.label.clone());
            } else if label_lower.contains("date") || label_lower.contains("renewal") {
                analysis.date_terms.push(prop.label.clone());
            }
            analysis
                .detected_terms
                .push(format!("{}: {}", group.group.display_label, prop.label));
        }
    }

    analysis
}

/// Run the group-scoped resolvers per ranked group, stopping at the first
/// group that yields any filter.
fn resolve_within_groups(
    query: &str,
    ranked: &[RankedGroup<'_>],
    keywords: &KeywordTables,
    identity_hint: Option<&str>,
) -> Vec<Filter> {
    for group in ranked {
        let mut filters = Vec::new();
        filters.extend(resolve_owner_in_group(query, group.group, keywords, identity_hint));
        filters.extend(resolve_status_in_group(query, group.group));
        filters.extend(resolve_date_in_group(query, group.group, keywords));
        if !filters.is_empty() {
            return filters;
        }
    }
    Vec::new()
}

/// Owner resolution inside one group: any property whose label reads like
/// an owner field and carries a value mapping.
fn resolve_owner_in_group(
    query: &str,
    group: &GroupDescriptor,
    keywords: &KeywordTables,
    identity_hint: Option<&str>,
) -> Vec<Filter> {
    for (name, prop) in owner_properties(group) {
        if let Some(email) = identity_hint {
            let has_identity_cue =
                keywords.identity_cues.iter().any(|c| query.contains(c.as_str()));
            if has_identity_cue {
                if let Some(filter) = match_email_against(name, prop, email) {
                    return vec![filter];
                }
            }
        }

        let label = best_label(prop.value_mapping.keys().map(String::as_str).filter(|label| {
            let lower = label.to_lowercase();
            query.contains(&lower) || query.contains(&format!("{lower}'s"))
        }));
        if let Some(label) = label {
            return vec![Filter::eq(name, prop.value_mapping[label].clone())];
        }
    }
    Vec::new()
}

fn owner_properties(group: &GroupDescriptor) -> impl Iterator<Item = (&str, &GroupProperty)> {
    group
        .properties
        .iter()
        .filter(|(_, prop)| {
            prop.label.to_lowercase().contains("owner") && !prop.value_mapping.is_empty()
        })
        .map(|(name, prop)| (name.as_str(), prop))
}

fn match_email_against(name: &str, prop: &GroupProperty, email: &str) -> Option<Filter> {
    let local = email.split('@').next()?.to_lowercase();
    if local.is_empty() {
        return None;
    }
    let name_phrase = local.replace(['.', '_'], " ");

    // Whole-phrase matches beat token matches, which hit shared first names.
    let whole = best_label(
        prop.value_mapping
            .keys()
            .map(String::as_str)
            .filter(|label| label.to_lowercase().contains(&name_phrase)),
    );
    let label = whole.or_else(|| {
        best_label(prop.value_mapping.keys().map(String::as_str).filter(|label| {
            let lower = label.to_lowercase();
            name_phrase
                .split_whitespace()
                .any(|part| part.len() >= 3 && lower.contains(part))
        }))
    })?;
    Some(Filter::eq(name, prop.value_mapping[label].clone()))
}

/// Status resolution inside one group: properties labeled as a status or
/// stage, one filter for the best label found in the query.
fn resolve_status_in_group(query: &str, group: &GroupDescriptor) -> Vec<Filter> {
    for (name, prop) in &group.properties {
        let label_lower = prop.label.to_lowercase();
        if !(label_lower.contains("status") || label_lower.contains("stage"))
            || prop.value_mapping.is_empty()
        {
            continue;
        }
        let label = best_label(
            prop.value_mapping
                .keys()
                .map(String::as_str)
                .filter(|label| query.contains(&label.to_lowercase())),
        );
        if let Some(label) = label {
            return vec![Filter::eq(name.clone(), prop.value_mapping[label].clone())];
        }
    }
    Vec::new()
}

/// Renewal-date resolution inside one group: with a renewal cue, exactly
/// one HAS_PROPERTY filter; a priority-token label outranks the rest.
fn resolve_date_in_group(
    query: &str,
    group: &GroupDescriptor,
    keywords: &KeywordTables,
) -> Vec<Filter> {
    let has_renewal_term = keywords.renewal.iter().any(|term| query.contains(term.as_str()));
    if !has_renewal_term {
        return Vec::new();
    }

    let mut candidates: Vec<&str> = group
        .properties
        .iter()
        .filter(|(_, prop)| {
            let lower = prop.label.to_lowercase();
            lower.contains("renewal") || lower.contains("renew")
        })
        .map(|(name, _)| name.as_str())
        .collect();
    candidates.sort();

    if !keywords.priority_date_token.is_empty() {
        if let Some(pos) = candidates.iter().position(|name| {
            let prop = &group.properties[*name];
            prop.label.to_lowercase().contains(&keywords.priority_date_token)
                || name.to_lowercase().contains(&keywords.priority_date_token)
        }) {
            let priority = candidates.remove(pos);
            candidates.insert(0, priority);
        }
    }

    match candidates.first() {
        Some(name) => vec![Filter::has_property(*name)],
        None => Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FilterOperator;
    use pretty_assertions::assert_eq;

    fn group_with(props: &[(&str, &str, &[(&str, &str)])]) -> GroupDescriptor {
        let properties: BTreeMap<String, GroupProperty> = props
            .iter()
            .map(|(name, label, mapping)| {
                (
                    name.to_string(),
                    GroupProperty {
                        label: label.to_string(),
                        field_type: "enumeration".into(),
                        value_mapping: mapping
                            .iter()
                            .map(|(l, v)| (l.to_string(), v.to_string()))
                            .collect(),
                        ..GroupProperty::default()
                    },
                )
            })
            .collect();
        GroupDescriptor {
            key: "customer_success".into(),
            display_label: "Customer Success".into(),
            property_count: properties.len(),
            properties,
        }
    }

    #[test]
    fn owner_filter_from_group_scoped_mapping() {
        let group = group_with(&[(
            "hubspot_owner_id",
            "Company Owner",
            &[("Tyler Beagley", "123"), ("Tyler Price", "456")],
        )]);
        let keywords = KeywordTables::default();
        let filters =
            resolve_owner_in_group("tyler beagley's companies", &group, &keywords, None);
        assert_eq!(filters, vec![Filter::eq("hubspot_owner_id", "123")]);
    }

    #[test]
    fn status_filter_respects_stage_labels() {
        let group = group_with(&[(
            "dealstage",
            "Deal Stage",
            &[("Closed Won", "closedwon"), ("Closed Lost", "closedlost")],
        )]);
        let filters = resolve_status_in_group("closed won deals", &group);
        assert_eq!(filters, vec![Filter::eq("dealstage", "closedwon")]);
    }

    #[test]
    fn texting_renewal_label_outranks_generic_renewal() {
        let group = group_with(&[
            ("next_renewal_date", "Next Renewal Date", &[]),
            ("texting_renewal_date", "Texting Renewal Date", &[]),
        ]);
        let keywords = crate::config::Config::defaults().keywords;
        let filters = resolve_date_in_group("upcoming texting renewal", &group, &keywords);
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].property_name, "texting_renewal_date");
        assert_eq!(filters[0].operator, FilterOperator::HasProperty);
    }

    #[test]
    fn resolution_stops_at_first_group_with_filters() {
        let first = group_with(&[(
            "account_status",
            "Account Status",
            &[("Active", "evaluating")],
        )]);
        let second = group_with(&[(
            "renewal_status",
            "Renewal Status",
            &[("Active", "renewing")],
        )]);
        let groups: crate::schema::GroupedProperties = [
            ("a".to_string(), first.clone()),
            ("b".to_string(), second),
        ]
        .into_iter()
        .collect();
        let ranked: Vec<RankedGroup<'_>> = groups
            .iter()
            .map(|(key, group)| RankedGroup {
                key,
                group,
                score: 1,
                matched_keywords: vec![],
            })
            .collect();

        let keywords = KeywordTables::default();
        let filters = resolve_within_groups("active companies", &ranked, &keywords, None);
        assert_eq!(filters, vec![Filter::eq("account_status", "evaluating")]);
    }
}
