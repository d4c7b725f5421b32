//! Shared test utilities for hublex integration harnesses.
//!
//! Import everything via `mod common; use common::*;` at the top of each
//! harness file. The fake collaborator is deterministic; no harness touches
//! the network.
#![allow(dead_code)]

pub mod assertions;
pub mod builders;
pub mod fake_crm;
pub mod fixtures;

pub use builders::*;
pub use fake_crm::*;
pub use fixtures::*;
