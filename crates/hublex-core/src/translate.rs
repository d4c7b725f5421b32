//! Display translation — internal property names and values to readable
//! forms on returned records, and the reverse direction for caller-supplied
//! filters.
//!
//! The curated seed tables cover the common CRM properties; anything not
//! seeded passes through unchanged (the schema cache's derived labels cover
//! the long tail).

use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::{Filter, ObjectRecord};

/// Curated internal name → display name seeds.
static SEED_PROPERTIES: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "name" => "Company Name",
    "domain" => "Website Domain",
    "industry" => "Industry",
    "city" => "City",
    "state" => "State",
    "country" => "Country",
    "numberofemployees" => "Number of Employees",
    "annualrevenue" => "Annual Revenue",
    "createdate" => "Created Date",
    "hs_lastmodifieddate" => "Last Modified Date",
    "hs_object_id" => "Record ID",
    "description" => "Description",
    "phone" => "Phone Number",
    "website" => "Website",
    "lifecyclestage" => "Lifecycle Stage",
    "hubspot_owner_id" => "Owner ID",
    "hs_lead_status" => "Lead Status",
    "account_status" => "Account Status",
    "subscription_type" => "Subscription Type",
    "contract_start_date" => "Contract Start Date",
    "contract_end_date" => "Contract End Date",
    "monthly_recurring_revenue" => "Monthly Recurring Revenue",
    "customer_tier" => "Customer Tier",
    "support_level" => "Support Level",
    "onboarding_status" => "Onboarding Status",
    "health_score" => "Health Score",
    "last_activity_date" => "Last Activity Date",
    "renewal_date" => "Renewal Date",
    "next_renewal_date" => "Next Renewal Date",
    "churn_risk" => "Churn Risk",
};

static ACCOUNT_STATUS_VALUES: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "cancelled" => "Pending Cancellation",
    "active" => "Active",
    "inactive" => "Inactive",
    "trial" => "Trial",
    "suspended" => "Suspended",
    "pending" => "Pending Setup",
};

static LIFECYCLE_STAGE_VALUES: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "subscriber" => "Subscriber",
    "lead" => "Lead",
    "marketingqualifiedlead" => "Marketing Qualified Lead",
    "salesqualifiedlead" => "Sales Qualified Lead",
    "opportunity" => "Opportunity",
    "customer" => "Customer",
    "evangelist" => "Evangelist",
    "other" => "Other",
};

static CUSTOMER_TIER_VALUES: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "enterprise" => "Enterprise",
    "professional" => "Professional",
    "standard" => "Standard",
    "basic" => "Basic",
    "startup" => "Startup",
};

static CHURN_RISK_VALUES: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "high" => "High Risk",
    "medium" => "Medium Risk",
    "low" => "Low Risk",
    "none" => "No Risk",
};

fn seed_values(property: &str) -> Option<&'static phf::Map<&'static str, &'static str>> {
    match property {
        "account_status" => Some(&ACCOUNT_STATUS_VALUES),
        "lifecyclestage" => Some(&LIFECYCLE_STAGE_VALUES),
        "customer_tier" => Some(&CUSTOMER_TIER_VALUES),
        "churn_risk" => Some(&CHURN_RISK_VALUES),
        _ => None,
    }
}

/// Properties rendered with compact large-number formatting.
const NUMERIC_DISPLAY_PROPERTIES: [&str; 2] = ["annualrevenue", "numberofemployees"];

// ---------------------------------------------------------------------------
// Translator
// ---------------------------------------------------------------------------

/// Bidirectional name/value translator over the curated seed tables.
pub struct Translator {
    reverse_properties: BTreeMap<String, String>,
}

impl Default for Translator {
    fn default() -> Self {
        Self::new()
    }
}

impl Translator {
    pub fn new() -> Self {
        let reverse_properties = SEED_PROPERTIES
            .entries()
            .map(|(internal, display)| (display.to_string(), internal.to_string()))
            .collect();
        Self { reverse_properties }
    }

    /// Internal property name → display name, pass-through when unseeded.
    pub fn humanize_property(&self, name: &str) -> String {
        SEED_PROPERTIES
            .get(name)
            .map(|s| s.to_string())
            .unwrap_or_else(|| name.to_string())
    }

    /// Display name → internal property name; unseeded names are lowercased
    /// with spaces as underscores (the conventional internal form).
    pub fn internalize_property(&self, display: &str) -> String {
        self.reverse_properties
            .get(display)
            .cloned()
            .unwrap_or_else(|| display.to_lowercase().replace(' ', "_"))
    }

    /// Internal value → display value for one property, pass-through when
    /// the property or value has no seed.
    pub fn humanize_value(&self, property: &str, value: &str) -> String {
        seed_values(property)
            .and_then(|m| m.get(value.to_lowercase().as_str()))
            .map(|s| s.to_string())
            .unwrap_or_else(|| value.to_string())
    }

    /// Display value → internal value for one property.
    pub fn internalize_value(&self, property: &str, value: &str) -> String {
        seed_values(property)
            .and_then(|m| {
                m.entries()
                    .find(|(_, display)| display.eq_ignore_ascii_case(value))
                    .map(|(internal, _)| internal.to_string())
            })
            .unwrap_or_else(|| value.to_string())
    }

    /// A record with display property names, display values, formatted
    /// dates, and compact large numbers.
    pub fn translate_record(&self, record: &ObjectRecord) -> TranslatedRecord {
        let mut properties = BTreeMap::new();

        for (name, value) in &record.properties {
            let display_name = self.humanize_property(name);
            let mut display_value = match value.as_str() {
                Some(s) => self.humanize_value(name, s),
                None => value.to_string(),
            };

            if name.to_lowercase().contains("date") {
                display_value = format_date(&display_value);
            }
            if NUMERIC_DISPLAY_PROPERTIES.contains(&name.as_str()) {
                display_value = format_number(&display_value);
            }

            properties.insert(display_name, display_value);
        }

        TranslatedRecord {
            id: record.id.clone(),
            properties,
        }
    }

    /// Rewrite caller-supplied filters into internal names and values.
    pub fn internalize_filters(&self, filters: &[Filter]) -> Vec<Filter> {
        filters
            .iter()
            .map(|f| {
                let property_name = self.internalize_property(&f.property_name);
                Filter {
                    value: f
                        .value
                        .as_ref()
                        .map(|v| self.internalize_value(&property_name, v)),
                    values: f.values.as_ref().map(|vs| {
                        vs.iter()
                            .map(|v| self.internalize_value(&property_name, v))
                            .collect()
                    }),
                    property_name,
                    operator: f.operator,
                }
            })
            .collect()
    }
}

/// A search result row after display translation.
#[derive(Debug, Clone, Serialize)]
pub struct TranslatedRecord {
    pub id: String,
    pub properties: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Remote date values arrive as millisecond timestamps; render them as
/// `YYYY-MM-DD HH:MM:SS` UTC. Non-numeric values pass through.
pub fn format_date(value: &str) -> String {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return value.to_string();
    }
    match value.parse::<i64>().ok().and_then(chrono::DateTime::from_timestamp_millis) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => value.to_string(),
    }
}

/// Compact rendering for large counts and revenue: `1.2M`, `3.4K`,
/// otherwise the integer form. Non-numeric values pass through.
pub fn format_number(value: &str) -> String {
    let Ok(num) = value.parse::<f64>() else {
        return value.to_string();
    };
    if num >= 1_000_000.0 {
        format!("{:.1}M", num / 1_000_000.0)
    } else if num >= 1_000.0 {
        format!("{:.1}K", num / 1_000.0)
    } else {
        format!("{}", num as i64)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn property_names_round_trip_through_seeds() {
        let t = Translator::new();
        assert_eq!(t.humanize_property("annualrevenue"), "Annual Revenue");
        assert_eq!(t.internalize_property("Annual Revenue"), "annualrevenue");
        // Unseeded display names fall back to the conventional form.
        assert_eq!(t.internalize_property("Custom Score"), "custom_score");
    }

    #[test]
    fn values_translate_case_insensitively() {
        let t = Translator::new();
        assert_eq!(t.humanize_value("account_status", "CANCELLED"), "Pending Cancellation");
        assert_eq!(t.internalize_value("account_status", "pending cancellation"), "cancelled");
        assert_eq!(t.humanize_value("city", "Dallas"), "Dallas");
    }

    #[rstest]
    #[case("1714521600000", "2024-05-01 00:00:00")]
    #[case("not a date", "not a date")]
    #[case("", "")]
    fn date_formatting(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(format_date(input), expected);
    }

    #[rstest]
    #[case("1200000", "1.2M")]
    #[case("3400", "3.4K")]
    #[case("999", "999")]
    #[case("unknown", "unknown")]
    fn number_formatting(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(format_number(input), expected);
    }

    #[test]
    fn record_translation_renames_and_formats() {
        let t = Translator::new();
        let mut record = ObjectRecord {
            id: "77".into(),
            ..ObjectRecord::default()
        };
        record
            .properties
            .insert("annualrevenue".into(), serde_json::json!("2500000"));
        record
            .properties
            .insert("account_status".into(), serde_json::json!("active"));

        let translated = t.translate_record(&record);
        assert_eq!(translated.properties["Annual Revenue"], "2.5M");
        assert_eq!(translated.properties["Account Status"], "Active");
    }

    #[test]
    fn filters_internalize_names_and_values() {
        let t = Translator::new();
        let filters = vec![Filter::eq("Account Status", "Active")];
        let internal = t.internalize_filters(&filters);
        assert_eq!(internal, vec![Filter::eq("account_status", "active")]);
    }
}
