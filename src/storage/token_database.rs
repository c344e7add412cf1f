// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded access-token database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `access_tokens`: record id (u128) → serialized AccessToken
//! - `token_owner_index`: composite key (token|owner|id) → expiry (unix ms)
//! - `principals`: user_id → serialized Principal
//!
//! Both index segments are length-prefixed, so a prefix scan on `token`
//! alone finds every holder of a value and a prefix scan on `token|owner`
//! finds exactly one owner's records.

use std::path::Path;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use uuid::Uuid;

use crate::models::{AccessToken, Principal};

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: record id → serialized AccessToken (JSON bytes).
const ACCESS_TOKENS: TableDefinition<u128, &[u8]> = TableDefinition::new("access_tokens");

/// Index: `len|token|len|owner|id` → expiry in unix milliseconds.
const TOKEN_OWNER_INDEX: TableDefinition<&[u8], i64> = TableDefinition::new("token_owner_index");

/// Principal directory: user_id → serialized Principal (JSON bytes).
const PRINCIPALS: TableDefinition<&str, &[u8]> = TableDefinition::new("principals");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("could not find an unclaimed token value after {attempts} attempts")]
    CollisionLimit { attempts: u32 },
}

pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Index Key Helpers
// =============================================================================

fn push_segment(key: &mut Vec<u8>, segment: &str) {
    key.extend_from_slice(&(segment.len() as u32).to_be_bytes());
    key.extend_from_slice(segment.as_bytes());
}

/// Prefix shared by every index entry holding `token`, whatever the owner.
fn token_prefix(token: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(4 + token.len());
    push_segment(&mut prefix, token);
    prefix
}

/// Prefix shared by every index entry for `token` held by `owner_id`.
fn owner_prefix(token: &str, owner_id: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(8 + token.len() + owner_id.len() + 16);
    push_segment(&mut prefix, token);
    push_segment(&mut prefix, owner_id);
    prefix
}

fn make_index_key(token: &str, owner_id: &str, id: Uuid) -> Vec<u8> {
    let mut key = owner_prefix(token, owner_id);
    key.extend_from_slice(id.as_bytes());
    key
}

/// The record id is always the trailing 16 bytes of an index key.
fn id_from_index_key(key: &[u8]) -> Option<Uuid> {
    let start = key.len().checked_sub(16)?;
    Uuid::from_slice(&key[start..]).ok()
}

/// Whether any index entry for `token` has not expired at `now_ms`.
fn held_by_unexpired<T>(index: &T, token: &str, now_ms: i64) -> StoreResult<bool>
where
    T: ReadableTable<&'static [u8], i64>,
{
    let prefix = token_prefix(token);
    for entry in index.range(prefix.as_slice()..)? {
        let (key, expiry) = entry?;
        if !key.value().starts_with(&prefix) {
            break;
        }
        if expiry.value() >= now_ms {
            return Ok(true);
        }
    }
    Ok(false)
}

// =============================================================================
// TokenDatabase
// =============================================================================

/// Embedded ACID store for access tokens and the principal directory.
pub struct TokenDatabase {
    db: Database,
}

impl TokenDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ACCESS_TOKENS)?;
            let _ = write_txn.open_table(TOKEN_OWNER_INDEX)?;
            let _ = write_txn.open_table(PRINCIPALS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Cheap readiness probe: opens a read transaction on the primary table.
    pub fn ping(&self) -> StoreResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(ACCESS_TOKENS)?;
        Ok(())
    }

    // =========================================================================
    // Principals
    // =========================================================================

    /// Register a principal. Returns the existing row if already present.
    pub fn register_principal(&self, user_id: &str) -> StoreResult<Principal> {
        let write_txn = self.db.begin_write()?;
        let principal = {
            let mut table = write_txn.open_table(PRINCIPALS)?;
            let existing = match table.get(user_id)? {
                Some(value) => Some(serde_json::from_slice::<Principal>(value.value())?),
                None => None,
            };
            match existing {
                Some(principal) => principal,
                None => {
                    let principal = Principal {
                        user_id: user_id.to_string(),
                        registered_at: Utc::now(),
                    };
                    let json = serde_json::to_vec(&principal)?;
                    table.insert(user_id, json.as_slice())?;
                    principal
                }
            }
        };
        write_txn.commit()?;
        Ok(principal)
    }

    /// Remove a principal. Tokens already issued to it are left in place.
    pub fn remove_principal(&self, user_id: &str) -> StoreResult<bool> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(PRINCIPALS)?;
            let removed = table.remove(user_id)?.is_some();
            removed
        };
        write_txn.commit()?;
        Ok(removed)
    }

    /// Resolve a principal by user ID.
    pub fn get_principal(&self, user_id: &str) -> StoreResult<Option<Principal>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PRINCIPALS)?;
        match table.get(user_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    // =========================================================================
    // Access tokens
    // =========================================================================

    /// Insert `record` unless its token value is held by any unexpired record.
    ///
    /// The check and the insert run in one write transaction. Returns
    /// `false` (and writes nothing) when the value is already taken.
    pub fn insert_if_unclaimed(&self, record: &AccessToken, now: DateTime<Utc>) -> StoreResult<bool> {
        let json = serde_json::to_vec(record)?;
        let now_ms = now.timestamp_millis();

        let write_txn = self.db.begin_write()?;
        let claimed = {
            let index = write_txn.open_table(TOKEN_OWNER_INDEX)?;
            held_by_unexpired(&index, &record.token, now_ms)?
        };
        if claimed {
            write_txn.abort()?;
            return Ok(false);
        }

        {
            let mut records = write_txn.open_table(ACCESS_TOKENS)?;
            records.insert(record.id.as_u128(), json.as_slice())?;

            let mut index = write_txn.open_table(TOKEN_OWNER_INDEX)?;
            let key = make_index_key(&record.token, &record.owner_id, record.id);
            index.insert(key.as_slice(), record.expiry.timestamp_millis())?;
        }
        write_txn.commit()?;
        Ok(true)
    }

    /// Look up a single record by id.
    #[cfg(test)]
    pub fn get_token(&self, id: Uuid) -> StoreResult<Option<AccessToken>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ACCESS_TOKENS)?;
        match table.get(id.as_u128())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// All records whose value is exactly `token` and whose owner is exactly
    /// `owner_id`, expired or not.
    pub fn find_for_owner(&self, token: &str, owner_id: &str) -> StoreResult<Vec<AccessToken>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(TOKEN_OWNER_INDEX)?;
        let records = read_txn.open_table(ACCESS_TOKENS)?;

        let prefix = owner_prefix(token, owner_id);
        let mut found = Vec::new();
        for entry in index.range(prefix.as_slice()..)? {
            let (key, _expiry) = entry?;
            let key = key.value();
            if !key.starts_with(&prefix) {
                break;
            }
            // Only the 16-byte id may follow the prefix
            if key.len() != prefix.len() + 16 {
                continue;
            }
            let Some(id) = id_from_index_key(key) else {
                continue;
            };
            if let Some(value) = records.get(id.as_u128())? {
                found.push(serde_json::from_slice(value.value())?);
            }
        }
        Ok(found)
    }

    /// Delete every record whose expiry is before `now`. Returns the count.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> StoreResult<usize> {
        let now_ms = now.timestamp_millis();

        let write_txn = self.db.begin_write()?;
        let purged = {
            let mut index = write_txn.open_table(TOKEN_OWNER_INDEX)?;
            let mut records = write_txn.open_table(ACCESS_TOKENS)?;

            let mut expired_keys = Vec::new();
            for entry in index.iter()? {
                let (key, expiry) = entry?;
                if expiry.value() < now_ms {
                    expired_keys.push(key.value().to_vec());
                }
            }

            for key in &expired_keys {
                index.remove(key.as_slice())?;
                if let Some(id) = id_from_index_key(key) {
                    records.remove(id.as_u128())?;
                }
            }
            expired_keys.len()
        };
        write_txn.commit()?;

        Ok(purged)
    }
}

// =============================================================================
// Tests
// =============================================================================
