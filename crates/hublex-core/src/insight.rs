//! Insight generation — free-text diagnostics for search outcomes.
//!
//! Correlates zero or low result counts with the category signals the
//! analysis detected. Observational only: nothing here alters filters or
//! results.

use crate::resolver::QueryAnalysis;
use crate::types::{Filter, ObjectRecord};

/// The renewal-date property inspected when summarizing owner + date
/// results.
const RENEWAL_DATE_PROPERTY: &str = "next_renewal_date";

/// Diagnostic note for a flat resolution, or `None` when there is nothing
/// worth saying.
pub fn generate_insights(
    analysis: &QueryAnalysis,
    _filters: &[Filter],
    results: &[ObjectRecord],
    _query: &str,
) -> Option<String> {
    let mut insights: Vec<String> = Vec::new();
    let total = results.len();

    if total == 0 {
        if let Some(status) = analysis.status_terms.first() {
            insights.push(format!("No records found with '{status}' status. This could mean:"));
            insights.push("• The status is labeled differently in your CRM".into());
            insights.push("• No records currently have this status".into());
            insights.push("• Records might be in other statuses instead".into());
        } else if !analysis.date_terms.is_empty() {
            insights.push("No records found with upcoming renewal dates. This could mean:".into());
            insights.push("• Renewal dates haven't been set yet".into());
            insights.push("• The renewal date field is named differently".into());
            insights.push("• All renewals may be past due or future-dated".into());
        }
    } else if !analysis.owner_terms.is_empty() && !analysis.date_terms.is_empty() {
        let owner = &analysis.owner_terms[0];
        insights.push(format!("Found {total} records for {owner} with renewal date criteria."));

        let with_dates = results
            .iter()
            .filter(|r| {
                r.property(RENEWAL_DATE_PROPERTY)
                    .is_some_and(|v| !v.is_empty() && v != "N/A")
            })
            .count();
        if with_dates == 0 {
            insights.push(format!(
                "However, none of these {total} records have renewal dates populated."
            ));
        } else {
            insights.push(format!("{with_dates} of these records have actual renewal dates set."));
        }
    }

    if insights.is_empty() {
        None
    } else {
        Some(insights.join(" "))
    }
}

/// Diagnostic note for a hierarchical resolution. Always opens with the
/// groups-searched summary; the rest mirrors the flat diagnostics.
pub fn generate_hierarchical_insights(
    analysis: &QueryAnalysis,
    filters: &[Filter],
    results: &[ObjectRecord],
    query: &str,
    groups_searched: usize,
) -> Option<String> {
    let mut insights = vec![format!(
        "Searched {groups_searched} most relevant property groups for maximum efficiency."
    )];

    if results.is_empty() {
        insights.push("No results found. This could indicate:".into());
        if !analysis.owner_terms.is_empty() {
            insights.push("• Owner assignments may need to be verified".into());
        }
        if !analysis.date_terms.is_empty() {
            insights.push("• Date fields may not be populated yet".into());
        }
        if let Some(note) = generate_insights(analysis, filters, results, query) {
            insights.push(note);
        }
    } else if !analysis.owner_terms.is_empty() && !analysis.date_terms.is_empty() {
        insights.push(format!("Found {} records matching your criteria.", results.len()));
    }

    Some(insights.join(" "))
}
