//! Interchange file: a two-column CSV of `conn_id,encrypted_data`
//!
//! Every data row carries one connection as a token under the transport
//! key. The token wraps the JSON form of an [`ExportRecord`] including its
//! plaintext secrets, so the file is only as safe as the transport key.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::connection::ExportRecord;
use crate::crypto::{decrypt, encrypt, DomainKey};
use crate::error::{MigratorError, Result};
use crate::storage::write_private_file;

/// Column names of the header row
pub const HEADER: [&str; 2] = ["conn_id", "encrypted_data"];

/// Secret-free view of one interchange row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterchangeEntry {
    pub conn_id: String,
    pub conn_type: String,
    pub host: Option<String>,
    pub exported_at: String,
    pub has_password: bool,
    pub has_extra: bool,
}

impl From<&ExportRecord> for InterchangeEntry {
    fn from(record: &ExportRecord) -> Self {
        Self {
            conn_id: record.conn_id.clone(),
            conn_type: record.conn_type.clone(),
            host: record.host.clone(),
            exported_at: record.exported_at.clone(),
            has_password: record.password.as_deref().is_some_and(|p| !p.is_empty()),
            has_extra: record.extra.as_deref().is_some_and(|e| !e.is_empty()),
        }
    }
}

/// Serialize `records` into interchange bytes
pub fn encode(records: &[ExportRecord], key: &DomainKey) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADER)?;

    for record in records {
        let json = Zeroizing::new(serde_json::to_vec(record)?);
        let token = encrypt(key, &json)?;
        writer.write_record([record.conn_id.as_str(), token.as_str()])?;
    }

    writer
        .into_inner()
        .map_err(|e| MigratorError::Interchange(e.to_string()))
}

/// Parse and decrypt interchange bytes
///
/// A file without rows, or with just the header, holds zero records. Any row
/// that fails to decrypt, or repeats an earlier id, fails the whole file.
pub fn decode(bytes: &[u8], key: &DomainKey) -> Result<Vec<ExportRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);
    let mut rows = reader.records();

    match rows.next() {
        None => return Ok(Vec::new()),
        Some(header) => check_header(&header?)?,
    }

    let mut records = Vec::new();
    let mut seen = HashSet::new();
    for (index, row) in rows.enumerate() {
        let row = row?;
        // Header is line 1
        let line = index + 2;
        if row.len() != HEADER.len() {
            return Err(MigratorError::Interchange(format!(
                "line {}: expected {} columns, found {}",
                line,
                HEADER.len(),
                row.len()
            )));
        }

        if !seen.insert(row[0].to_string()) {
            return Err(MigratorError::Interchange(format!(
                "line {}: duplicate connection id {}",
                line, &row[0]
            )));
        }

        records.push(decode_row(&row[0], &row[1], key)?);
    }

    debug!("Decoded {} interchange rows", records.len());
    Ok(records)
}

fn check_header(header: &csv::StringRecord) -> Result<()> {
    let names: Vec<&str> = header
        .iter()
        .map(|name| name.trim_start_matches('\u{feff}').trim())
        .collect();
    if names != HEADER {
        return Err(MigratorError::Interchange(format!(
            "unexpected header: {}",
            names.join(",")
        )));
    }
    Ok(())
}

fn decode_row(conn_id: &str, token: &str, key: &DomainKey) -> Result<ExportRecord> {
    if conn_id.is_empty() {
        return Err(MigratorError::Interchange("empty connection id".to_string()));
    }

    let json = decrypt(key, token).map(Zeroizing::new).map_err(|e| match e {
        MigratorError::InvalidToken(msg) => {
            MigratorError::InvalidToken(format!("connection {}: {}", conn_id, msg))
        }
        other => other,
    })?;

    let mut record: ExportRecord = serde_json::from_slice(&json)?;
    record.conn_id = conn_id.to_string();
    Ok(record)
}

/// Encode `records` and atomically write them to `path`
pub async fn write_file(path: &Path, records: &[ExportRecord], key: &DomainKey) -> Result<()> {
    let bytes = encode(records, key)?;
    write_private_file(path, &bytes).await?;
    info!("Wrote {} connections to {:?}", records.len(), path);
    Ok(())
}

/// Read and decrypt the interchange file at `path`
pub async fn read_file(path: &Path, key: &DomainKey) -> Result<Vec<ExportRecord>> {
    let bytes = tokio::fs::read(path).await?;
    decode(&bytes, key)
}

/// List what an interchange file carries without exposing any secret
pub async fn inspect(path: &Path, key: &DomainKey) -> Result<Vec<InterchangeEntry>> {
    let records = read_file(path, key).await?;
    Ok(records.iter().map(InterchangeEntry::from).collect())
}
