//! Group index — query-to-group relevance for the hierarchical resolver.
//!
//! Object types can carry thousands of properties; scoring schema-declared
//! property groups against the query narrows the search scope to a handful
//! of groups before any filter resolution runs.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::schema::GroupedProperties;
use crate::types::GroupDescriptor;

/// Never hand the resolver more than this many groups.
pub const MAX_RELEVANT_GROUPS: usize = 5;

/// When nothing scores, fall back to the groups queries most commonly mean,
/// in this priority order (keys that exist in the cache only).
pub const FALLBACK_GROUP_KEYS: [&str; 4] = [
    "company_information",
    "companyinformation",
    "billing_information",
    "customer_success",
];

static WORDS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w+\b").expect("static regex"));

/// One group selected for a query, most relevant first.
#[derive(Debug)]
pub struct RankedGroup<'a> {
    pub key: &'a str,
    pub group: &'a GroupDescriptor,
    pub score: usize,
    pub matched_keywords: Vec<String>,
}

/// Per-group keyword sets derived from a grouped schema snapshot.
pub struct GroupIndex {
    keywords: BTreeMap<String, BTreeSet<String>>,
}

impl GroupIndex {
    /// Keyword set per group: words of the display label, underscore tokens
    /// of each property's internal name, and words of each property label.
    pub fn build(groups: &GroupedProperties) -> Self {
        let mut keywords = BTreeMap::new();

        for (key, group) in groups {
            let mut set = BTreeSet::new();
            for word in group.display_label.to_lowercase().split_whitespace() {
                set.insert(word.to_string());
            }
            for (name, prop) in &group.properties {
                for token in name.to_lowercase().split('_') {
                    if !token.is_empty() {
                        set.insert(token.to_string());
                    }
                }
                for word in prop.label.to_lowercase().split_whitespace() {
                    set.insert(word.to_string());
                }
            }
            keywords.insert(key.clone(), set);
        }

        Self { keywords }
    }

    /// Rank groups by relevance to `query`, most relevant first, capped at
    /// [`MAX_RELEVANT_GROUPS`].
    ///
    /// Score = count of query words in the group's keyword set, plus 2 per
    /// query word appearing as a substring of the display label. The bonus
    /// double-counts against the base score on purpose: an explicit
    /// group-name mention should dominate incidental keyword overlap.
    /// Ties keep the groups' discovery (key) order; the sort is stable.
    pub fn identify_relevant_groups<'a>(
        &self,
        groups: &'a GroupedProperties,
        query: &str,
    ) -> Vec<RankedGroup<'a>> {
        let query_lower = query.to_lowercase();
        let query_words: BTreeSet<&str> =
            WORDS.find_iter(&query_lower).map(|m| m.as_str()).collect();

        let mut ranked: Vec<RankedGroup<'a>> = Vec::new();
        for (key, group) in groups {
            let empty = BTreeSet::new();
            let keywords = self.keywords.get(key).unwrap_or(&empty);

            let matched: Vec<String> = query_words
                .iter()
                .filter(|w| keywords.contains(**w))
                .map(|w| w.to_string())
                .collect();
            let mut score = matched.len();

            let label_lower = group.display_label.to_lowercase();
            for word in &query_words {
                if label_lower.contains(*word) {
                    score += 2;
                }
            }

            if score > 0 {
                ranked.push(RankedGroup {
                    key,
                    group,
                    score,
                    matched_keywords: matched,
                });
            }
        }

        ranked.sort_by(|a, b| b.score.cmp(&a.score));

        if ranked.is_empty() {
            for key in FALLBACK_GROUP_KEYS {
                if let Some((key, group)) = groups.get_key_value(key) {
                    ranked.push(RankedGroup {
                        key,
                        group,
                        score: 0,
                        matched_keywords: Vec::new(),
                    });
                }
            }
        }

        ranked.truncate(MAX_RELEVANT_GROUPS);
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GroupProperty;
    use pretty_assertions::assert_eq;

    fn group(key: &str, label: &str, props: &[(&str, &str)]) -> (String, GroupDescriptor) {
        let properties: BTreeMap<String, GroupProperty> = props
            .iter()
            .map(|(name, plabel)| {
                (
                    name.to_string(),
                    GroupProperty {
                        label: plabel.to_string(),
                        field_type: "string".into(),
                        ..Default::default()
                    },
                )
            })
            .collect();
        let property_count = properties.len();
        (
            key.to_string(),
            GroupDescriptor {
                key: key.to_string(),
                display_label: label.to_string(),
                properties,
                property_count,
            },
        )
    }

    fn fixture() -> GroupedProperties {
        [
            group(
                "billing_information",
                "Billing Information",
                &[("billing_email", "Billing Email"), ("invoice_due_date", "Invoice Due Date")],
            ),
            group(
                "customer_success",
                "Customer Success",
                &[("health_score", "Health Score"), ("account_status", "Account Status")],
            ),
            group(
                "companyinformation",
                "Company Information",
                &[("name", "Company Name"), ("city", "City")],
            ),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn explicit_group_mention_ranks_first() {
        let groups = fixture();
        let index = GroupIndex::build(&groups);
        let ranked = index.identify_relevant_groups(&groups, "billing contact");
        assert_eq!(ranked[0].key, "billing_information");
        assert!(ranked[0].score >= 3); // keyword hit + display-label bonus
    }

    #[test]
    fn result_list_never_exceeds_cap() {
        let groups: GroupedProperties = (0..10)
            .map(|i| {
                group(
                    &format!("group_{i}"),
                    &format!("Shared Billing {i}"),
                    &[("billing_code", "Billing Code")],
                )
            })
            .collect();
        let index = GroupIndex::build(&groups);
        let ranked = index.identify_relevant_groups(&groups, "billing");
        assert_eq!(ranked.len(), MAX_RELEVANT_GROUPS);
    }

    #[test]
    fn zero_score_falls_back_to_common_groups() {
        let groups = fixture();
        let index = GroupIndex::build(&groups);
        let ranked = index.identify_relevant_groups(&groups, "zzz qqq");
        let keys: Vec<&str> = ranked.iter().map(|g| g.key).collect();
        // Priority order, restricted to groups present in the cache.
        assert_eq!(keys, vec!["companyinformation", "billing_information", "customer_success"]);
        assert!(ranked.iter().all(|g| g.score == 0));
    }

    #[test]
    fn ties_keep_discovery_order() {
        let groups: GroupedProperties = [
            group("alpha", "Alpha Things", &[("renewal_date", "Renewal Date")]),
            group("beta", "Beta Things", &[("renewal_code", "Renewal Code")]),
        ]
        .into_iter()
        .collect();
        let index = GroupIndex::build(&groups);
        let ranked = index.identify_relevant_groups(&groups, "renewal");
        assert_eq!(ranked[0].key, "alpha");
        assert_eq!(ranked[1].key, "beta");
        assert_eq!(ranked[0].score, ranked[1].score);
    }
}
