//! Schema of the device-local client state database.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema};

// =============================================================================
// Version 1 - Client state key-value store
// =============================================================================

/// Key-value rows. A NULL value is a tombstone left by `remove`, so that other
/// instances polling by revision still see the change.
const CLIENT_STATE_TABLE_V1: Table = Table {
    name: "client_state",
    columns: &[
        sqlite_column!("key", &SqlType::Text, is_primary_key = true),
        sqlite_column!("value", &SqlType::Text),
        sqlite_column!("writer", &SqlType::Text, non_null = true),
        sqlite_column!("revision", &SqlType::Integer, non_null = true),
        sqlite_column!("updated_at", &SqlType::Integer, non_null = true),
    ],
    indices: &[("idx_client_state_revision", "revision")],
};

pub const CLIENT_STATE_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 1,
    tables: &[CLIENT_STATE_TABLE_V1],
    migration: None,
}];
