//! hublex — natural-language search middleware over a CRM's object data.
//!
//! The root crate exposes the HTTP boundary layer and the component wiring
//! so that integration tests can drive the same stack the binary serves.
//!
//! # Architecture
//!
//! ```text
//! HTTP / CLI ──► QueryResolver ──► CrmApi (hublex-remote)
//!                    │
//!                    └──► Encyclopedia store (JSON per object type)
//! ```

pub mod server;

use std::sync::Arc;

use anyhow::Context;

use hublex_core::api::CrmApi;
use hublex_core::config::Config;
use hublex_core::encyclopedia::{EncyclopediaStore, Exporter};
use hublex_core::hierarchical::HierarchicalResolver;
use hublex_core::resolver::QueryResolver;
use hublex_core::schema::SchemaCache;
use hublex_core::values::ValueIndex;
use hublex_remote::CrmClient;

use server::AppState;

/// Wire the full component stack over any collaborator. Persisted
/// encyclopedias are loaded into the resolver cache immediately.
pub fn build_state<C: CrmApi>(api: Arc<C>, config: &Config) -> AppState<C> {
    let ttl = config.cache_ttl();
    let schema = Arc::new(SchemaCache::new(api.clone(), ttl));
    let values = Arc::new(ValueIndex::new(api.clone(), ttl));
    let store = EncyclopediaStore::new(config.cache.encyclopedia_dir.clone());
    let exporter = Arc::new(Exporter::new(
        api.clone(),
        schema,
        values,
        store,
        config.cache.sample_size,
    ));

    let resolver = Arc::new(QueryResolver::new(api, config));
    resolver.load_from_store(exporter.store());
    let hierarchical = Arc::new(HierarchicalResolver::new(resolver.clone()));

    AppState {
        resolver,
        hierarchical,
        exporter,
        default_limit: config.search.default_limit,
    }
}

/// Build the production stack: a [`CrmClient`] authenticated from the
/// environment variable named in the config.
pub fn build_remote_state(config: &Config) -> anyhow::Result<AppState<CrmClient>> {
    let token = std::env::var(&config.remote.token_env).with_context(|| {
        format!("missing CRM access token: set {}", config.remote.token_env)
    })?;
    let client = CrmClient::new(&config.remote.base_url, token)
        .context("failed to construct CRM client")?;
    Ok(build_state(Arc::new(client), config))
}
