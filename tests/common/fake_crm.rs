//! In-memory `CrmApi` fake with per-endpoint failure switches and a log of
//! executed searches, so harnesses can assert the exact filter payloads the
//! resolvers produced.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use hublex_core::api::CrmApi;
use hublex_core::error::ApiError;
use hublex_core::types::{
    Filter, ObjectRecord, ObjectType, OwnerRecord, PropertyDescriptor,
};

/// One recorded call to [`CrmApi::search`].
#[derive(Debug, Clone)]
pub struct RecordedSearch {
    pub object_type: ObjectType,
    pub filters: Vec<Filter>,
    pub limit: usize,
}

#[derive(Default)]
pub struct FakeCrm {
    properties: BTreeMap<ObjectType, Vec<PropertyDescriptor>>,
    owners: Vec<OwnerRecord>,
    results: Vec<ObjectRecord>,
    searches: Mutex<Vec<RecordedSearch>>,
    fail_properties: AtomicBool,
    fail_owners: AtomicBool,
    fail_search: AtomicBool,
}

impl FakeCrm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_properties(mut self, object_type: ObjectType, props: Vec<PropertyDescriptor>) -> Self {
        self.properties.insert(object_type, props);
        self
    }

    pub fn with_owners(mut self, owners: Vec<OwnerRecord>) -> Self {
        self.owners = owners;
        self
    }

    pub fn with_results(mut self, results: Vec<ObjectRecord>) -> Self {
        self.results = results;
        self
    }

    pub fn set_fail_properties(&self, fail: bool) {
        self.fail_properties.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_owners(&self, fail: bool) {
        self.fail_owners.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_search(&self, fail: bool) {
        self.fail_search.store(fail, Ordering::SeqCst);
    }

    /// Every search executed so far, in call order.
    pub fn recorded_searches(&self) -> Vec<RecordedSearch> {
        self.searches.lock().unwrap().clone()
    }

    /// The filter payload of the most recent search.
    pub fn last_filters(&self) -> Vec<Filter> {
        self.searches
            .lock()
            .unwrap()
            .last()
            .map(|s| s.filters.clone())
            .unwrap_or_default()
    }
}

impl CrmApi for FakeCrm {
    async fn fetch_properties(
        &self,
        object_type: ObjectType,
    ) -> Result<Vec<PropertyDescriptor>, ApiError> {
        if self.fail_properties.load(Ordering::SeqCst) {
            return Err(ApiError::Transport("fake: schema endpoint down".into()));
        }
        Ok(self.properties.get(&object_type).cloned().unwrap_or_default())
    }

    async fn fetch_owners(&self) -> Result<Vec<OwnerRecord>, ApiError> {
        if self.fail_owners.load(Ordering::SeqCst) {
            return Err(ApiError::Transport("fake: owners endpoint down".into()));
        }
        Ok(self.owners.clone())
    }

    async fn search(
        &self,
        object_type: ObjectType,
        filters: &[Filter],
        _properties: Option<&[String]>,
        limit: usize,
    ) -> Result<Vec<ObjectRecord>, ApiError> {
        self.searches.lock().unwrap().push(RecordedSearch {
            object_type,
            filters: filters.to_vec(),
            limit,
        });
        if self.fail_search.load(Ordering::SeqCst) {
            return Err(ApiError::Transport("fake: search endpoint down".into()));
        }
        Ok(self.results.iter().take(limit).cloned().collect())
    }
}
