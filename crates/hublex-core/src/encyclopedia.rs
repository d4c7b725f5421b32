//! Encyclopedia export and persistence.
//!
//! An export walks the remote schema, owner directory, and enumerable
//! options for each object type and writes the combined mappings to one
//! JSON file per type. The grouped variant additionally merges value
//! mappings into the group descriptors so the hierarchical resolver can
//! work group-by-group. Exports are best-effort per type: one failing
//! object type records an error marker and the rest proceed.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::api::CrmApi;
use crate::error::Fetched;
use crate::schema::{GroupedProperties, SchemaCache};
use crate::types::{Encyclopedia, ObjectType};
use crate::values::{ValueIndex, ValueMappings};

/// A persistence failure. Export itself soft-fails; only the file layer
/// returns hard errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("encyclopedia io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encyclopedia serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// One JSON file per object type under a configurable directory.
pub struct EncyclopediaStore {
    dir: PathBuf,
}

impl EncyclopediaStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, object_type: ObjectType) -> PathBuf {
        self.dir.join(format!("{object_type}_encyclopedia.json"))
    }

    pub fn save(&self, encyclopedia: &Encyclopedia) -> Result<PathBuf, StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path(encyclopedia.object_type);
        let json = serde_json::to_string_pretty(encyclopedia)?;
        std::fs::write(&path, json)?;
        Ok(path)
    }

    /// `Ok(None)` when no export has ever been written for this type.
    pub fn load(&self, object_type: ObjectType) -> Result<Option<Encyclopedia>, StoreError> {
        let path = self.path(object_type);
        if !path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

// ---------------------------------------------------------------------------
// Exporter
// ---------------------------------------------------------------------------

/// Per-type outcome of an export run.
#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    pub properties: usize,
    pub values: usize,
    pub sample_records: usize,
    pub degraded: bool,
}

/// Outcome of a full export: summaries for the types that produced a file,
/// error markers for the ones that did not.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportReport {
    pub exported: BTreeMap<ObjectType, ExportSummary>,
    pub errors: BTreeMap<ObjectType, String>,
}

/// Builds and persists encyclopedias from the live remote schema.
pub struct Exporter<C> {
    api: Arc<C>,
    schema: Arc<SchemaCache<C>>,
    values: Arc<ValueIndex<C>>,
    store: EncyclopediaStore,
    sample_size: usize,
}

impl<C: CrmApi> Exporter<C> {
    pub fn new(
        api: Arc<C>,
        schema: Arc<SchemaCache<C>>,
        values: Arc<ValueIndex<C>>,
        store: EncyclopediaStore,
        sample_size: usize,
    ) -> Self {
        Self {
            api,
            schema,
            values,
            store,
            sample_size,
        }
    }

    pub fn store(&self) -> &EncyclopediaStore {
        &self.store
    }

    /// Build one flat encyclopedia from the live schema. Record sampling is
    /// diagnostic and non-fatal; a degraded schema or value fetch yields a
    /// partial encyclopedia rather than an error.
    pub async fn export_one(&self, object_type: ObjectType) -> (Encyclopedia, bool) {
        let (property_mappings, schema_degraded) =
            split(self.schema.fetch_properties(object_type).await);
        let (value_mappings, values_degraded) =
            split(self.values.discover_all_property_values(object_type).await);

        let sample_records = match self.api.search(object_type, &[], None, self.sample_size).await
        {
            Ok(records) => records.len(),
            Err(e) => {
                tracing::warn!(%object_type, error = %e, "record sampling failed, continuing without samples");
                0
            }
        };

        let encyclopedia = Encyclopedia {
            object_type,
            property_mappings: (*property_mappings).clone(),
            value_mappings: (*value_mappings).clone(),
            groups: None,
            sample_records,
            exported_at: chrono::Utc::now(),
        };
        (encyclopedia, schema_degraded || values_degraded)
    }

    /// Grouped variant: the flat mappings plus group descriptors with value
    /// mappings merged in, for the hierarchical resolver.
    pub async fn export_grouped(&self, object_type: ObjectType) -> (Encyclopedia, bool) {
        let (mut encyclopedia, degraded) = self.export_one(object_type).await;
        let (grouped, grouped_degraded) =
            split(self.schema.fetch_grouped_properties(object_type).await);

        let mut groups = (*grouped).clone();
        merge_value_mappings(&mut groups, &encyclopedia.value_mappings);
        encyclopedia.groups = Some(groups);

        (encyclopedia, degraded || grouped_degraded)
    }

    /// Export and persist every requested type. One failing type records an
    /// error marker; the rest still export.
    pub async fn export_full(&self, object_type: Option<ObjectType>) -> ExportReport {
        let mut report = ExportReport::default();

        for ot in targets(object_type) {
            let (encyclopedia, degraded) = self.export_grouped(ot).await;
            match self.store.save(&encyclopedia) {
                Ok(path) => {
                    tracing::info!(object_type = %ot, path = %path.display(), "exported encyclopedia");
                    report.exported.insert(
                        ot,
                        ExportSummary {
                            properties: encyclopedia.property_mappings.len(),
                            values: encyclopedia.total_values(),
                            sample_records: encyclopedia.sample_records,
                            degraded,
                        },
                    );
                }
                Err(e) => {
                    tracing::error!(object_type = %ot, error = %e, "failed to persist encyclopedia");
                    report.errors.insert(ot, e.to_string());
                }
            }
        }

        report
    }

    /// Drop the schema and value caches, re-export, persist, and hand back
    /// the fresh encyclopedias for installation into the resolvers.
    pub async fn refresh(
        &self,
        object_type: Option<ObjectType>,
    ) -> BTreeMap<ObjectType, Arc<Encyclopedia>> {
        let mut refreshed = BTreeMap::new();

        for ot in targets(object_type) {
            self.schema.invalidate(ot);
            self.values.refresh(Some(ot)).await;

            let (encyclopedia, _) = self.export_grouped(ot).await;
            if let Err(e) = self.store.save(&encyclopedia) {
                tracing::error!(object_type = %ot, error = %e, "refresh export not persisted");
            }
            refreshed.insert(ot, Arc::new(encyclopedia));
        }

        refreshed
    }
}

fn targets(object_type: Option<ObjectType>) -> Vec<ObjectType> {
    match object_type {
        Some(ot) => vec![ot],
        None => ObjectType::ALL.to_vec(),
    }
}

fn split<T>(fetched: Fetched<T>) -> (T, bool) {
    let degraded = fetched.is_degraded();
    (fetched.into_inner(), degraded)
}

/// Attach each property's value mapping to its group descriptor.
pub fn merge_value_mappings(groups: &mut GroupedProperties, value_mappings: &ValueMappings) {
    for group in groups.values_mut() {
        for (name, prop) in group.properties.iter_mut() {
            if let Some(mapping) = value_mappings.get(name) {
                prop.value_mapping = mapping.clone();
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FakeCrm;
    use crate::types::{GroupDescriptor, GroupProperty};
    use pretty_assertions::assert_eq;

    fn store_in(dir: &tempfile::TempDir) -> EncyclopediaStore {
        EncyclopediaStore::new(dir.path().join("encyclopedia"))
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let mut encyclopedia = Encyclopedia::empty(ObjectType::Companies);
        encyclopedia
            .property_mappings
            .insert("city".into(), "City".into());
        store.save(&encyclopedia).unwrap();

        let loaded = store.load(ObjectType::Companies).unwrap().unwrap();
        assert_eq!(loaded, encyclopedia);
        assert!(store.load(ObjectType::Deals).unwrap().is_none());
    }

    #[test]
    fn merge_attaches_mappings_by_property_name() {
        let mut groups = GroupedProperties::new();
        groups.insert(
            "customer_success".into(),
            GroupDescriptor {
                key: "customer_success".into(),
                display_label: "Customer Success".into(),
                properties: [(
                    "account_status".to_string(),
                    GroupProperty {
                        label: "Account Status".into(),
                        field_type: "enumeration".into(),
                        ..GroupProperty::default()
                    },
                )]
                .into_iter()
                .collect(),
                property_count: 1,
            },
        );
        let mut value_mappings = ValueMappings::new();
        value_mappings.insert(
            "account_status".into(),
            [("Active".to_string(), "evaluating".to_string())]
                .into_iter()
                .collect(),
        );

        merge_value_mappings(&mut groups, &value_mappings);

        let merged = &groups["customer_success"].properties["account_status"];
        assert_eq!(merged.value_mapping.get("Active").unwrap(), "evaluating");
    }

    #[tokio::test]
    async fn export_full_produces_one_file_per_type() {
        let dir = tempfile::tempdir().unwrap();
        let api = Arc::new(FakeCrm::with_company_schema());
        let schema = Arc::new(SchemaCache::new(api.clone(), std::time::Duration::from_secs(60)));
        let values = Arc::new(ValueIndex::new(api.clone(), std::time::Duration::from_secs(60)));
        let exporter = Exporter::new(api, schema, values, store_in(&dir), 10);

        let report = exporter.export_full(Some(ObjectType::Companies)).await;

        assert!(report.errors.is_empty());
        let summary = &report.exported[&ObjectType::Companies];
        assert!(summary.properties > 0);
        assert!(summary.values > 0);
        assert!(exporter.store().path(ObjectType::Companies).exists());
    }

    #[tokio::test]
    async fn failed_sampling_is_non_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let api = Arc::new(FakeCrm::with_company_schema().failing_search());
        let schema = Arc::new(SchemaCache::new(api.clone(), std::time::Duration::from_secs(60)));
        let values = Arc::new(ValueIndex::new(api.clone(), std::time::Duration::from_secs(60)));
        let exporter = Exporter::new(api, schema, values, store_in(&dir), 10);

        let (encyclopedia, degraded) = exporter.export_one(ObjectType::Companies).await;

        assert_eq!(encyclopedia.sample_records, 0);
        assert!(!degraded);
        assert!(!encyclopedia.property_mappings.is_empty());
    }
}
