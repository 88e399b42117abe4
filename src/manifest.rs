//! Manifest: the `manifest.json` sidecar written alongside each output
//! artifact set, recording enough to verify the artifacts later without
//! re-running the pipeline.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

pub const SCHEMA_VERSION: u16 = 1;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub schema_version: u16,
    pub tool_version: String,
    pub created_at: String,
    pub inputs: BTreeMap<String, String>,
    /// filename -> lowercase hex SHA-256 of file bytes.
    pub outputs: BTreeMap<String, String>,
    pub stats: BTreeMap<String, usize>,
    pub build: BuildInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildInfo {
    pub host: String,
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            host: format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
        }
    }
}

impl Manifest {
    pub fn new(
        inputs: BTreeMap<String, String>,
        outputs: BTreeMap<String, String>,
        stats: BTreeMap<String, usize>,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            inputs,
            outputs,
            stats,
            build: BuildInfo::default(),
        }
    }

    pub fn write(&self, path: &Path) -> Result<(), Error> {
        let file = fs::File::create(path)?;
        // `serde_json::Value`'s `Map` is `BTreeMap`-backed (the
        // non-`preserve_order` default), so routing through it here
        // gives alphabetically sorted top-level keys on disk rather
        // than struct declaration order.
        let value = serde_json::to_value(self)?;
        serde_json::to_writer_pretty(file, &value)?;
        Ok(())
    }
}

/// Computes the lowercase hex SHA-256 of each named file within
/// `output_dir`, for the manifest's `outputs` map.
pub fn checksum_outputs(output_dir: &Path, file_names: &[&str]) -> Result<BTreeMap<String, String>, Error> {
    let mut outputs = BTreeMap::new();
    for name in file_names {
        let bytes = fs::read(output_dir.join(name))?;
        outputs.insert(name.to_string(), hex_digest(&bytes));
    }
    Ok(outputs)
}

fn hex_digest(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
