//! hublex-core — CRM label-resolution and query-filter-synthesis core.
//!
//! This crate turns natural-language queries over CRM records into
//! structured search filters, backed by a persisted "encyclopedia" of
//! property and value mappings per object type.
//!
//! # Architecture
//!
//! ```text
//! CrmApi ──► SchemaCache ──┐
//!    │                     ├──► Exporter ──► EncyclopediaStore
//!    └────► ValueIndex ────┘                       │
//!                                                  ▼
//!              QueryResolver / HierarchicalResolver ──► Filters ──► search
//! ```
//!
//! The `CrmApi` trait is the single collaborator seam; everything above it
//! is deterministic and testable against a fake.

pub mod api;
mod cache;
pub mod config;
pub mod encyclopedia;
pub mod error;
pub mod groups;
pub mod hierarchical;
pub mod insight;
pub mod resolver;
pub mod schema;
pub mod translate;
pub mod types;
pub mod values;

pub use error::{ApiError, Fetched};
pub use types::{Encyclopedia, Filter, FilterOperator, ObjectRecord, ObjectType};
