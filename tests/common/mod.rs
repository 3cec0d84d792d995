//! Common test infrastructure
//!
//! Builds stores, feeds and storages wired the way an application would wire
//! them. Tests should only import from this module.

mod fixtures;

#[allow(unused_imports)]
pub use fixtures::{
    confirmed_record, memory_feed, memory_store, notification, sqlite_storage, wait_for_change,
    SqliteFixture,
};
