//! Backup envelope codec
//!
//! An envelope is `{ meta, data }` serialized as compact JSON and gzipped.
//! `meta.hash` is the hex SHA-256 of the envelope serialized without the
//! hash (but with `size`). Every collection is an id-ordered vector and every
//! struct has a fixed field order, so re-serializing a parsed envelope
//! reproduces the stored bytes exactly. Decoding requires that it does, both
//! for the json and for the gzip stream.

use std::io::{Read, Write};

use chrono::{DateTime, SecondsFormat, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{ContaError, ContaResult};
use crate::models::{BillingRecord, Client, Service};
use crate::storage::Snapshot;

pub const FORMAT_VERSION: &str = "1.0";

/// Length of the fixed gzip member header
const GZIP_HEADER_LEN: usize = 10;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Where a backup was written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackupSource {
    #[default]
    Local,
    Gdrive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupMeta {
    pub backup_id: Uuid,
    pub version: String,
    /// RFC 3339, UTC
    pub created_at: String,
    pub source: BackupSource,
    /// Uncompressed size in MB, two decimals
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl BackupMeta {
    pub fn new(source: BackupSource, created_at: DateTime<Utc>) -> Self {
        Self {
            backup_id: Uuid::new_v4(),
            version: FORMAT_VERSION.to_string(),
            created_at: created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            source,
            size: None,
            hash: None,
        }
    }

    /// Parsed creation time, used for ordering listings
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.created_at)
            .ok()
            .map(|d| d.with_timezone(&Utc))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackupData {
    pub clients: Vec<Client>,
    pub billings: Vec<BillingRecord>,
    pub services: Vec<Service>,
}

impl From<Snapshot> for BackupData {
    fn from(snapshot: Snapshot) -> Self {
        Self {
            clients: snapshot.clients,
            billings: snapshot.billings,
            services: snapshot.services,
        }
    }
}

impl From<BackupData> for Snapshot {
    fn from(data: BackupData) -> Self {
        Self {
            clients: data.clients,
            billings: data.billings,
            services: data.services,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    pub meta: BackupMeta,
    pub data: BackupData,
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn size_in_mb(len: usize) -> f64 {
    ((len as f64 / BYTES_PER_MB) * 100.0).round() / 100.0
}

fn gzip(bytes: &[u8]) -> ContaResult<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    Ok(encoder.finish()?)
}

/// The exact header [`gzip`] emits; mtime is zero so it never varies
fn expected_header() -> ContaResult<Vec<u8>> {
    let mut empty = gzip(&[])?;
    empty.truncate(GZIP_HEADER_LEN);
    Ok(empty)
}

/// Serialize, size, hash and compress an envelope
///
/// Any `size` or `hash` already present in `backup.meta` is replaced.
pub fn encode(mut backup: Backup) -> ContaResult<(BackupMeta, Vec<u8>)> {
    backup.meta.size = None;
    backup.meta.hash = None;

    let bare = serde_json::to_vec(&backup)?;
    backup.meta.size = Some(size_in_mb(bare.len()));

    let sized = serde_json::to_vec(&backup)?;
    backup.meta.hash = Some(sha256_hex(&sized));

    let json = serde_json::to_vec(&backup)?;
    Ok((backup.meta, gzip(&json)?))
}

/// Decompress and verify an envelope
///
/// Fails with `BACKUP.INVALID_OR_CORRUPTED_BACKUP` on a foreign header, a
/// broken gzip stream or CRC, unparsable JSON, a hash mismatch, or any byte
/// that differs from what [`encode`] would write for the same envelope.
pub fn decode(bytes: &[u8]) -> ContaResult<Backup> {
    let header = expected_header()?;
    if bytes.len() < GZIP_HEADER_LEN || bytes[..GZIP_HEADER_LEN] != header[..] {
        return Err(ContaError::corrupted_backup("unexpected gzip header"));
    }

    let mut json = Vec::new();
    GzDecoder::new(bytes)
        .read_to_end(&mut json)
        .map_err(|e| ContaError::corrupted_backup(format!("gzip: {}", e)))?;

    let mut backup: Backup = serde_json::from_slice(&json)
        .map_err(|e| ContaError::corrupted_backup(format!("json: {}", e)))?;

    // Whitespace, key order and escapes are not covered by the hash
    if serde_json::to_vec(&backup)? != json {
        return Err(ContaError::corrupted_backup("non-canonical json"));
    }

    // Deflate padding bits decompress to the same json
    if gzip(&json)? != bytes {
        return Err(ContaError::corrupted_backup("non-canonical gzip stream"));
    }

    let stored = backup
        .meta
        .hash
        .take()
        .ok_or_else(|| ContaError::corrupted_backup("missing hash"))?;

    let canonical = serde_json::to_vec(&backup)?;
    if sha256_hex(&canonical) != stored {
        return Err(ContaError::corrupted_backup("hash mismatch"));
    }

    backup.meta.hash = Some(stored);
    Ok(backup)
}
