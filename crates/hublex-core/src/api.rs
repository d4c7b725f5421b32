//! The collaborator seam — everything the core needs from the remote CRM.
//!
//! The production implementation lives in the `hublex-remote` crate; tests
//! substitute an in-memory fake. The core never constructs HTTP requests
//! itself.

use std::future::Future;

use crate::error::ApiError;
use crate::types::{Filter, ObjectRecord, ObjectType, OwnerRecord, PropertyDescriptor};

/// Remote CRM operations consumed by the schema cache, value index, and
/// resolvers. Implementations must be cheap to share behind an `Arc`.
pub trait CrmApi: Send + Sync {
    /// Fetch all property definitions for one object type.
    fn fetch_properties(
        &self,
        object_type: ObjectType,
    ) -> impl Future<Output = Result<Vec<PropertyDescriptor>, ApiError>> + Send;

    /// Fetch the owner directory (shared across object types).
    fn fetch_owners(&self) -> impl Future<Output = Result<Vec<OwnerRecord>, ApiError>> + Send;

    /// Execute a filtered search, returning at most `limit` records.
    /// An empty filter list is a valid unfiltered (default-ordered) search.
    fn search(
        &self,
        object_type: ObjectType,
        filters: &[Filter],
        properties: Option<&[String]>,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<ObjectRecord>, ApiError>> + Send;
}
