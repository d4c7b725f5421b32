//! Canonical company fixture shared by the harnesses: a realistic company
//! schema, a two-Tyler owner directory, and a few result rows.

use std::sync::Arc;

use hublex_core::config::Config;
use hublex_core::encyclopedia::{EncyclopediaStore, Exporter};
use hublex_core::hierarchical::HierarchicalResolver;
use hublex_core::resolver::QueryResolver;
use hublex_core::schema::SchemaCache;
use hublex_core::types::ObjectType;
use hublex_core::values::ValueIndex;

use super::builders::*;
use super::fake_crm::FakeCrm;

/// Company schema with enumerable status/industry/tier properties spread
/// across three schema groups, plus renewal date fields.
pub fn company_fake() -> FakeCrm {
    FakeCrm::new()
        .with_properties(
            ObjectType::Companies,
            vec![
                string_prop("name", "Company Name", "companyinformation"),
                string_prop("hubspot_owner_id", "Company Owner", "companyinformation"),
                string_prop("city", "City", "companyinformation"),
                string_prop("state", "State", "companyinformation"),
                enum_prop(
                    "industry",
                    "Industry",
                    "companyinformation",
                    &[("Technology", "TECH"), ("Restaurants", "RESTAURANTS")],
                ),
                enum_prop(
                    "account_status",
                    "Account Status",
                    "customer_success",
                    &[("Active", "evaluating"), ("Churned", "lost")],
                ),
                enum_prop(
                    "customer_tier",
                    "Customer Tier",
                    "customer_success",
                    &[("Enterprise", "enterprise"), ("Startup", "startup")],
                ),
                enum_prop(
                    "payment_method",
                    "Payment Method",
                    "billing_information",
                    &[("Credit Card", "credit_card"), ("Invoice", "invoice")],
                ),
                date_prop("next_renewal_date", "Next Renewal Date", "billing_information"),
                date_prop("texting_renewal_date", "Texting Renewal Date", "billing_information"),
            ],
        )
        .with_owners(vec![
            owner("123", "Tyler", "Beagley", "tyler.beagley@example.com"),
            owner("456", "Tyler", "Price", "tyler.price@example.com"),
        ])
        .with_results(vec![
            record(
                "1",
                &[
                    ("name", "Acme Foods"),
                    ("city", "Dallas"),
                    ("account_status", "evaluating"),
                    ("next_renewal_date", "1714521600000"),
                ],
            ),
            record("2", &[("name", "Globex"), ("city", "Austin")]),
        ])
}

/// The wired stack over a fake: exporter, flat and hierarchical resolvers,
/// with a grouped encyclopedia exported and installed.
pub struct Stack {
    pub api: Arc<FakeCrm>,
    pub resolver: Arc<QueryResolver<FakeCrm>>,
    pub hierarchical: HierarchicalResolver<FakeCrm>,
    pub exporter: Exporter<FakeCrm>,
    // Keeps the encyclopedia directory alive for the harness lifetime.
    _dir: tempfile::TempDir,
}

/// Export a grouped encyclopedia from the fake and install it into fresh
/// resolvers, mirroring the production wiring.
pub async fn stack_with(api: FakeCrm) -> Stack {
    let api = Arc::new(api);
    let config = Config::defaults();
    let ttl = config.cache_ttl();
    let dir = tempfile::tempdir().expect("tempdir");

    let schema = Arc::new(SchemaCache::new(api.clone(), ttl));
    let values = Arc::new(ValueIndex::new(api.clone(), ttl));
    let store = EncyclopediaStore::new(dir.path().join("encyclopedia"));
    let exporter = Exporter::new(api.clone(), schema, values, store, 10);

    let resolver = Arc::new(QueryResolver::new(api.clone(), &config));
    for (object_type, encyclopedia) in exporter.refresh(Some(ObjectType::Companies)).await {
        resolver.install(object_type, encyclopedia);
    }
    let hierarchical = HierarchicalResolver::new(resolver.clone());

    Stack {
        api,
        resolver,
        hierarchical,
        exporter,
        _dir: dir,
    }
}

pub async fn company_stack() -> Stack {
    stack_with(company_fake()).await
}
