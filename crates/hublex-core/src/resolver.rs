//! Query resolver — natural-language query to structured search filters.
//!
//! The pipeline is ANALYZE (record which known labels appear in the query),
//! RESOLVE_FILTERS (category resolvers in a fixed order), EXECUTE (remote
//! search, errors degrade to zero results), EXPLAIN (diagnostic note).
//! Filter order is a stable output contract: owner, status, industry, tier,
//! location, date, generic.

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock, RwLock};

use regex::Regex;
use serde::Serialize;

use crate::api::CrmApi;
use crate::config::{Config, KeywordTables, SearchConfig};
use crate::encyclopedia::EncyclopediaStore;
use crate::insight;
use crate::translate::{TranslatedRecord, Translator};
use crate::types::{Encyclopedia, Filter, ObjectRecord, ObjectType, ValueMapping};
use crate::values::{best_label, ValueMappings, OWNER_PROPERTY_ALIASES};

/// Properties the category resolvers claim; the generic fallback skips
/// these so it never duplicates a category's filter.
const CATEGORY_PROPERTIES: [&str; 5] = [
    "hubspot_owner_id",
    "company_owner",
    "account_status",
    "industry",
    "customer_tier",
];

/// Labels at or below this length never participate in verbatim substring
/// matching against the query.
const MIN_GENERIC_LABEL: usize = 3;

static QUERY_LIMIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:limit|top|first|show)\s+(\d+)\b|\b(\d+)\s+results?\b")
        .expect("static regex")
});

/// An explicit result count written into the query ("top 10", "first 5",
/// "limit 20", "25 results"), if any.
pub fn extract_limit(query: &str) -> Option<usize> {
    let caps = QUERY_LIMIT.captures(query)?;
    let digits = caps.get(1).or_else(|| caps.get(2))?;
    digits.as_str().parse().ok().filter(|n| *n > 0)
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Which known labels the ANALYZE step found in the query, per category.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryAnalysis {
    pub detected_terms: Vec<String>,
    pub owner_terms: Vec<String>,
    pub status_terms: Vec<String>,
    pub date_terms: Vec<String>,
    pub location_terms: Vec<String>,
    pub industry_terms: Vec<String>,
    pub tier_terms: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups_analyzed: Vec<String>,
}

/// The full outcome of one resolution: analysis, filters, results, note.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedQuery {
    pub query: String,
    pub object_type: ObjectType,
    pub query_analysis: QueryAnalysis,
    pub resolved_filters: Vec<Filter>,
    pub results: Vec<ObjectRecord>,
    /// The same rows with display property names, readable values, and
    /// formatted dates and numbers.
    pub display_results: Vec<TranslatedRecord>,
    pub total_returned: usize,
    pub limit_applied: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevant_groups: Option<Vec<String>>,
}

/// Per-property value-mapping summary, up to five sample labels each.
#[derive(Debug, Clone, Serialize)]
pub struct MappingsSummary {
    pub object_type: ObjectType,
    pub total_properties: usize,
    pub properties: BTreeMap<String, PropertySummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PropertySummary {
    pub total_values: usize,
    pub sample_values: Vec<String>,
}

/// Result of a label search across all of one object type's mappings.
#[derive(Debug, Clone, Serialize)]
pub struct MappingMatches {
    pub object_type: ObjectType,
    pub search_term: String,
    pub matching_properties: usize,
    pub matches: ValueMappings,
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Encyclopedia-backed query resolver.
///
/// Holds an in-memory cache of persisted encyclopedias, replaced wholesale
/// on refresh. Resolution itself is synchronous over that cache; only the
/// EXECUTE step talks to the collaborator.
pub struct QueryResolver<C> {
    api: Arc<C>,
    keywords: KeywordTables,
    search: SearchConfig,
    translator: Translator,
    encyclopedias: RwLock<BTreeMap<ObjectType, Arc<Encyclopedia>>>,
}

impl<C: CrmApi> QueryResolver<C> {
    pub fn new(api: Arc<C>, config: &Config) -> Self {
        Self {
            api,
            keywords: config.keywords.clone(),
            search: config.search.clone(),
            translator: Translator::new(),
            encyclopedias: RwLock::new(BTreeMap::new()),
        }
    }

    /// Load every persisted encyclopedia the store has into memory.
    pub fn load_from_store(&self, store: &EncyclopediaStore) {
        for object_type in ObjectType::ALL {
            match store.load(object_type) {
                Ok(Some(enc)) => {
                    tracing::info!(
                        %object_type,
                        properties = enc.value_mappings.len(),
                        "loaded encyclopedia"
                    );
                    self.install(object_type, Arc::new(enc));
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(%object_type, error = %e, "failed to load encyclopedia");
                }
            }
        }
    }

    /// Replace the cached encyclopedia for one object type.
    pub fn install(&self, object_type: ObjectType, encyclopedia: Arc<Encyclopedia>) {
        if let Ok(mut guard) = self.encyclopedias.write() {
            guard.insert(object_type, encyclopedia);
        }
    }

    pub fn encyclopedia(&self, object_type: ObjectType) -> Option<Arc<Encyclopedia>> {
        self.encyclopedias
            .read()
            .ok()
            .and_then(|guard| guard.get(&object_type).cloned())
    }

    /// Resolve a natural-language query and run the resulting search.
    ///
    /// `identity_hint` is the caller's email, consulted only when the query
    /// carries an identity cue ("my name", "in my name"). An explicit count
    /// in the query ("top 10") overrides the requested limit. A query that
    /// resolves to zero filters still executes the bounded, unfiltered
    /// search. Execution errors degrade to zero results.
    pub async fn resolve_and_search(
        &self,
        object_type: ObjectType,
        query: &str,
        limit: usize,
        identity_hint: Option<&str>,
    ) -> ResolvedQuery {
        let limit = self.effective_limit(query, limit);
        let encyclopedia = self.encyclopedia(object_type);
        let empty = ValueMappings::new();
        let value_mappings = encyclopedia
            .as_deref()
            .map_or(&empty, |e| &e.value_mappings);

        let analysis = analyze_query(query, value_mappings, &self.keywords);
        let filters = resolve_filters(
            query,
            value_mappings,
            encyclopedia
                .as_deref()
                .map(|e| e.property_mappings.keys().map(String::as_str).collect())
                .unwrap_or_default(),
            &self.keywords,
            identity_hint,
        );
        tracing::debug!(%object_type, query, filters = filters.len(), "resolved filters");

        let results = self.execute(object_type, &filters, limit).await;
        let note = insight::generate_insights(&analysis, &filters, &results, query);
        let display_results = self.translate(&results);

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
            relevant_groups: None,
        }
    }

    pub(crate) fn translate(&self, results: &[ObjectRecord]) -> Vec<TranslatedRecord> {
        results
            .iter()
            .map(|r| self.translator.translate_record(r))
            .collect()
    }

    pub(crate) async fn execute(
        &self,
        object_type: ObjectType,
        filters: &[Filter],
        limit: usize,
    ) -> Vec<ObjectRecord> {
        let properties = if self.search.display_properties.is_empty() {
            None
        } else {
            Some(self.search.display_properties.as_slice())
        };
        match self.api.search(object_type, filters, properties, limit).await {
            Ok(results) => results,
            Err(e) => {
                tracing::error!(%object_type, error = %e, "search failed, returning zero results");
                Vec::new()
            }
        }
    }

    /// Per-property counts and up to five sample labels. `None` when no
    /// encyclopedia is loaded for this object type.
    pub fn get_available_mappings(&self, object_type: ObjectType) -> Option<MappingsSummary> {
        let encyclopedia = self.encyclopedia(object_type)?;

        let properties: BTreeMap<String, PropertySummary> = encyclopedia
            .value_mappings
            .iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(name, values)| {
                (
                    name.clone(),
                    PropertySummary {
                        total_values: values.len(),
                        sample_values: values.keys().take(5).cloned().collect(),
                    },
                )
            })
            .collect();

        Some(MappingsSummary {
            object_type,
            total_properties: properties.len(),
            properties,
        })
    }

    /// All labels containing `term` (case-insensitive), per property.
    /// `None` when no encyclopedia is loaded.
    pub fn search_mappings(&self, object_type: ObjectType, term: &str) -> Option<MappingMatches> {
        let encyclopedia = self.encyclopedia(object_type)?;
        let needle = term.to_lowercase();

        let mut matches = ValueMappings::new();
        for (property, values) in &encyclopedia.value_mappings {
            let hits: ValueMapping = values
                .iter()
                .filter(|(label, _)| label.to_lowercase().contains(&needle))
                .map(|(l, v)| (l.clone(), v.clone()))
                .collect();
            if !hits.is_empty() {
                matches.insert(property.clone(), hits);
            }
        }

        Some(MappingMatches {
            object_type,
            search_term: term.to_string(),
            matching_properties: matches.len(),
            matches,
        })
    }

    pub(crate) fn keywords(&self) -> &KeywordTables {
        &self.keywords
    }

    /// The limit actually applied: an explicit count in the query overrides
    /// the caller's limit, clamped to the configured maximum either way.
    pub(crate) fn effective_limit(&self, query: &str, requested: usize) -> usize {
        extract_limit(query)
            .unwrap_or(requested)
            .min(self.search.max_limit)
    }
}

// ---------------------------------------------------------------------------
// ANALYZE
// ---------------------------------------------------------------------------

/// Record which known labels and vocabulary terms appear in the query.
/// Purely observational; filter resolution does not consult the analysis.
pub fn analyze_query(
    query: &str,
    value_mappings: &ValueMappings,
    keywords: &KeywordTables,
) -> QueryAnalysis {
    let query_lower = query.to_lowercase();
    let mut analysis = QueryAnalysis::default();

    for alias in OWNER_PROPERTY_ALIASES {
        if let Some(owners) = value_mappings.get(alias) {
            for label in owners.keys() {
                let lower = label.to_lowercase();
                if query_lower.contains(&lower) || query_lower.contains(&format!("{lower}'s")) {
                    if !analysis.owner_terms.contains(label) {
                        analysis.owner_terms.push(label.clone());
                        analysis.detected_terms.push(format!("Owner: {label}"));
                    }
                }
            }
        }
    }

    if let Some(statuses) = value_mappings.get("account_status") {
        for label in statuses.keys() {
            if query_lower.contains(&label.to_lowercase())
                && !analysis.status_terms.contains(label)
            {
                analysis.status_terms.push(label.clone());
                analysis.detected_terms.push(format!("Status: {label}"));
            }
        }
    }

    if let Some(industries) = value_mappings.get("industry") {
        for label in industries.keys() {
            if query_lower.contains(&label.to_lowercase())
                && !analysis.industry_terms.contains(label)
            {
                analysis.industry_terms.push(label.clone());
                analysis.detected_terms.push(format!("Industry: {label}"));
            }
        }
    }

    if let Some(tiers) = value_mappings.get("customer_tier") {
        for label in tiers.keys() {
            if query_lower.contains(&label.to_lowercase()) && !analysis.tier_terms.contains(label)
            {
                analysis.tier_terms.push(label.clone());
                analysis.detected_terms.push(format!("Tier: {label}"));
            }
        }
    }

    for term in &keywords.renewal {
        if query_lower.contains(term.as_str()) {
            analysis.date_terms.push(term.clone());
            analysis.detected_terms.push(format!("Date: {term}"));
        }
    }

    for (term, value) in &keywords.cities {
        if query_lower.contains(term.as_str()) {
            analysis.location_terms.push(value.clone());
            analysis.detected_terms.push(format!("Location: {value}"));
        }
    }

    analysis
}

// ---------------------------------------------------------------------------
// RESOLVE_FILTERS — category resolvers in fixed order
// ---------------------------------------------------------------------------

/// Run every category resolver against the query, in the stable output
/// order: owner, status, industry, tier, location, date, generic.
pub fn resolve_filters(
    query: &str,
    value_mappings: &ValueMappings,
    property_names: Vec<&str>,
    keywords: &KeywordTables,
    identity_hint: Option<&str>,
) -> Vec<Filter> {
    let query_lower = query.to_lowercase();

    let mut filters = Vec::new();
    filters.extend(resolve_owner(&query_lower, value_mappings, keywords, identity_hint));
    filters.extend(resolve_status(&query_lower, value_mappings));
    filters.extend(resolve_industry(&query_lower, value_mappings));
    filters.extend(resolve_tier(&query_lower, value_mappings, keywords));
    filters.extend(resolve_location(&query_lower, keywords));
    filters.extend(resolve_date(&query_lower, &property_names, keywords));
    filters.extend(resolve_generic(&query_lower, value_mappings));
    filters
}

/// Owner resolution. Emits at most one filter, and only when the query
/// carries an ownership cue or an identity cue plus caller email — a bare
/// name in a location query must not trigger an owner filter.
pub fn resolve_owner(
    query: &str,
    value_mappings: &ValueMappings,
    keywords: &KeywordTables,
    identity_hint: Option<&str>,
) -> Vec<Filter> {
    for alias in OWNER_PROPERTY_ALIASES {
        let Some(owners) = value_mappings.get(alias) else {
            continue;
        };

        if let Some(email) = identity_hint {
            let has_identity_cue = keywords.identity_cues.iter().any(|c| query.contains(c.as_str()));
            if has_identity_cue {
                if let Some(filter) = match_owner_by_email(alias, owners, email) {
                    return vec![filter];
                }
            }
        }

        let has_owner_cue = keywords.owner_cues.iter().any(|c| query.contains(c.as_str()));
        if !has_owner_cue {
            continue;
        }

        // Exact full-label matches beat possessive-first-name partials.
        let exact = best_label(owners.keys().map(String::as_str).filter(|label| {
            let lower = label.to_lowercase();
            query.contains(&lower) || query.contains(&format!("{lower}'s"))
        }));
        if let Some(label) = exact {
            return vec![Filter::eq(alias, owners[label].clone())];
        }

        // Possessive first-name partials, longest full label winning so
        // "Tyler's" cannot pick between two Tylers nondeterministically.
        if query.contains("'s") {
            let partial = best_label(owners.keys().map(String::as_str).filter(|label| {
                label.contains(' ')
                    && label
                        .split_whitespace()
                        .next()
                        .is_some_and(|first| query.contains(&format!("{}'s", first.to_lowercase())))
            }));
            if let Some(label) = partial {
                return vec![Filter::eq(alias, owners[label].clone())];
            }
        }
    }

    Vec::new()
}

/// Match the caller's email local part (split on `.`/`_`) against owner
/// labels. A whole-phrase match ("tyler price") always beats token matches
/// ("tyler"), which would otherwise hit every shared first name.
fn match_owner_by_email(property: &str, owners: &ValueMapping, email: &str) -> Option<Filter> {
    let local = email.split('@').next()?.to_lowercase();
    if local.is_empty() {
        return None;
    }
    let name_phrase = local.replace(['.', '_'], " ");

    let whole = best_label(
        owners
            .keys()
            .map(String::as_str)
            .filter(|label| label.to_lowercase().contains(&name_phrase)),
    );
    let label = whole.or_else(|| {
        best_label(owners.keys().map(String::as_str).filter(|label| {
            let lower = label.to_lowercase();
            name_phrase
                .split_whitespace()
                .any(|part| part.len() >= MIN_GENERIC_LABEL && lower.contains(part))
        }))
    })?;
    Some(Filter::eq(property, owners[label].clone()))
}

/// Status resolution over `account_status`: one filter for the best label
/// found verbatim in the query.
pub fn resolve_status(query: &str, value_mappings: &ValueMappings) -> Vec<Filter> {
    let Some(statuses) = value_mappings.get("account_status") else {
        return Vec::new();
    };
    match best_label(
        statuses
            .keys()
            .map(String::as_str)
            .filter(|label| query.contains(&label.to_lowercase())),
    ) {
        Some(label) => vec![Filter::eq("account_status", statuses[label].clone())],
        None => Vec::new(),
    }
}

/// Industry resolution: each label also matches in de-pluralized form, and
/// any "technology" label matches the "tech" shorthand.
pub fn resolve_industry(query: &str, value_mappings: &ValueMappings) -> Vec<Filter> {
    let Some(industries) = value_mappings.get("industry") else {
        return Vec::new();
    };
    match best_label(industries.keys().map(String::as_str).filter(|label| {
        let lower = label.to_lowercase();
        if query.contains(&lower) || query.contains(lower.trim_end_matches('s')) {
            return true;
        }
        lower.contains("technology") && query.contains("tech")
    })) {
        Some(label) => vec![Filter::eq("industry", industries[label].clone())],
        None => Vec::new(),
    }
}

/// Tier resolution over `customer_tier`, with the configurable synonym
/// table ("enterprise" also matches "large", "big", and so on).
pub fn resolve_tier(
    query: &str,
    value_mappings: &ValueMappings,
    keywords: &KeywordTables,
) -> Vec<Filter> {
    let Some(tiers) = value_mappings.get("customer_tier") else {
        return Vec::new();
    };
    match best_label(tiers.keys().map(String::as_str).filter(|label| {
        let lower = label.to_lowercase();
        match keywords.tiers.get(&lower) {
            Some(synonyms) => synonyms.iter().any(|term| query.contains(term.as_str())),
            None => query.contains(&lower),
        }
    })) {
        Some(label) => vec![Filter::eq("customer_tier", tiers[label].clone())],
        None => Vec::new(),
    }
}

/// Location resolution against the configurable city/state table.
/// Two-character values are state codes; city matches suppress state
/// matches entirely ("Austin, Texas" filters on the city alone).
pub fn resolve_location(query: &str, keywords: &KeywordTables) -> Vec<Filter> {
    let mut city_filters = Vec::new();
    let mut state_filters = Vec::new();

    for (term, value) in &keywords.cities {
        if !query.contains(term.as_str()) {
            continue;
        }
        if value.len() == 2 {
            state_filters.push(Filter::eq("state", value.clone()));
        } else {
            city_filters.push(Filter::eq("city", value.clone()));
        }
    }

    if !city_filters.is_empty() {
        city_filters
    } else {
        state_filters
    }
}

/// Renewal/date resolution: with a renewal cue in the query, emit exactly
/// one HAS_PROPERTY filter over the best renewal-flavored property name.
/// A name containing the priority token (the channel-qualified variant)
/// outranks the generic ones.
pub fn resolve_date(query: &str, property_names: &[&str], keywords: &KeywordTables) -> Vec<Filter> {
    let has_renewal_term = keywords.renewal.iter().any(|term| query.contains(term.as_str()));
    if !has_renewal_term {
        return Vec::new();
    }

    let mut candidates: Vec<&str> = property_names
        .iter()
        .copied()
        .filter(|name| {
            let lower = name.to_lowercase();
            keywords
                .renewal_property_tokens
                .iter()
                .any(|token| lower.contains(token.as_str()))
        })
        .collect();
    candidates.sort();
    if !keywords.priority_date_token.is_empty() {
        if let Some(pos) = candidates
            .iter()
            .position(|name| name.to_lowercase().contains(&keywords.priority_date_token))
        {
            let priority = candidates.remove(pos);
            candidates.insert(0, priority);
        }
    }

    match candidates.first() {
        Some(name) => vec![Filter::has_property(*name)],
        None => Vec::new(),
    }
}

/// Generic fallback: any label longer than two characters found verbatim
/// in the query, for properties no category resolver claims. One filter
/// per property, property order and label tie-breaks deterministic.
pub fn resolve_generic(query: &str, value_mappings: &ValueMappings) -> Vec<Filter> {
    let mut filters = Vec::new();

    for (property, values) in value_mappings {
        if CATEGORY_PROPERTIES.contains(&property.as_str()) {
            continue;
        }
        let label = best_label(values.keys().map(String::as_str).filter(|label| {
            label.len() >= MIN_GENERIC_LABEL && query.contains(&label.to_lowercase())
        }));
        if let Some(label) = label {
            filters.push(Filter::eq(property.clone(), values[label].clone()));
        }
    }

    filters
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
