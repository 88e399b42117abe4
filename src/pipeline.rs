//! Pipeline orchestration: wires the Feed Reader, Validator,
//! Transformer, Codec, and Manifest writer together behind a single
//! `convert` entry point, plus an artifact `check` used by the
//! `validate` CLI verb.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use thiserror::Error;
use tracing::{info, warn};

use crate::codec::{self, binary::FileKind};
use crate::gtfs::{Feed, GtfsFileNames};
use crate::manifest::{self, Manifest};
use crate::transform::{self, Network, TransformConfig};
use crate::validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Binary,
    Json,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodMode {
    Auto,
    Lyon,
}

#[derive(Debug, Clone)]
pub struct ConvertConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub format: OutputFormat,
    pub compression: bool,
    pub debug_json: bool,
    pub gen_transfers: bool,
    pub allow_partial_trips: bool,
    pub speed_walk_m_s: f64,
    pub transfer_cutoff_m: f64,
    pub split_by_periods: bool,
    pub mode: PeriodMode,
    pub jobs: Option<usize>,
    pub file_names: GtfsFileNames,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output: PathBuf::new(),
            format: OutputFormat::Binary,
            compression: true,
            debug_json: false,
            gen_transfers: false,
            allow_partial_trips: false,
            speed_walk_m_s: 1.33,
            transfer_cutoff_m: 500.0,
            split_by_periods: false,
            mode: PeriodMode::Auto,
            jobs: None,
            file_names: GtfsFileNames::default(),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("lyon period-detection mode is not implemented; use auto")]
    LyonModeUnsupported,
    #[error("failed to build thread pool: {0}")]
    ThreadPool(String),
    #[error(transparent)]
    Gtfs(#[from] crate::gtfs::Error),
    #[error("feed failed validation:\n{}", .0.join("\n"))]
    ValidationFailed(Vec<String>),
    #[error(transparent)]
    Codec(#[from] codec::Error),
    #[error(transparent)]
    Manifest(#[from] manifest::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// `true` for CLI usage errors (exit code 2); `false` for
    /// conversion/validation failures (exit code 1).
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Error::LyonModeUnsupported)
    }
}

pub fn convert(config: &ConvertConfig) -> Result<(), Error> {
    if config.mode == PeriodMode::Lyon {
        return Err(Error::LyonModeUnsupported);
    }
    if !config.compression {
        // The on-disk route time arrays have exactly one layout (delta
        // encoded); there is no alternative wire format to fall back to.
        tracing::debug!("--compression=false has no effect: binary output is always delta-encoded");
    }

    let started = Instant::now();
    let feed = Feed::read_from_dir(&config.input, &config.file_names)?;

    let report = validate::validate(&feed);
    for warning in &report.warnings {
        warn!("{warning}");
    }
    if !report.valid {
        return Err(Error::ValidationFailed(report.errors));
    }

    let transform_config = TransformConfig {
        allow_partial_trips: config.allow_partial_trips,
        gen_transfers: config.gen_transfers,
        speed_walk_m_s: config.speed_walk_m_s,
        transfer_cutoff_m: config.transfer_cutoff_m,
    };

    let base_network = match config.jobs {
        Some(jobs) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build()
                .map_err(|e| Error::ThreadPool(e.to_string()))?;
            pool.install(|| transform::build_network(&feed, &transform_config))
        }
        None => transform::build_network(&feed, &transform_config),
    };

    if config.split_by_periods {
        let periods = transform::periods::split(&feed);
        for period in periods {
            let network = transform::filter_by_service(&base_network, &period.service_ids);
            if network.routes.is_empty() {
                warn!(period = %period.name, "period has zero surviving routes; skipping");
                continue;
            }
            write_artifacts(config, &config.output.join(&period.name), &network)?;
        }
    } else {
        write_artifacts(config, &config.output, &base_network)?;
    }

    info!(elapsed = ?started.elapsed(), "conversion completed");
    Ok(())
}

fn write_artifacts(config: &ConvertConfig, dir: &Path, network: &Network) -> Result<(), Error> {
    fs::create_dir_all(dir)?;

    let write_binary = !matches!(config.format, OutputFormat::Json);
    let write_json = matches!(config.format, OutputFormat::Json | OutputFormat::Both) || config.debug_json;

    let mut output_names: Vec<&str> = Vec::new();

    if write_binary {
        let route_offsets = {
            let file = fs::File::create(dir.join("routes.bin"))?;
            codec::binary::write_routes(file, network)?
        };
        let stop_offsets = {
            let file = fs::File::create(dir.join("stops.bin"))?;
            codec::binary::write_stops(file, network)?
        };
        {
            let file = fs::File::create(dir.join("index.bin"))?;
            codec::binary::write_index(file, network, &route_offsets, &stop_offsets)?;
        }
        output_names.extend(["routes.bin", "stops.bin", "index.bin"]);
    }

    if write_json {
        codec::json::write_routes(fs::File::create(dir.join("routes.json"))?, network)?;
        codec::json::write_stops(fs::File::create(dir.join("stops.json"))?, network)?;
        codec::json::write_index(fs::File::create(dir.join("index.json"))?, network)?;
        output_names.extend(["routes.json", "stops.json", "index.json"]);
    }

    let outputs = manifest::checksum_outputs(dir, &output_names)?;

    let mut inputs = BTreeMap::new();
    inputs.insert("path".to_string(), config.input.display().to_string());

    let mut stats = BTreeMap::new();
    stats.insert("stops".to_string(), network.stops.len());
    stats.insert("routes".to_string(), network.routes.len());
    stats.insert(
        "trips".to_string(),
        network.routes.iter().map(|r| r.trips.len()).sum(),
    );

    Manifest::new(inputs, outputs, stats).write(&dir.join("manifest.json"))?;
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct ArtifactCheckReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Implements the `validate` CLI verb: checks that an output directory
/// contains well-formed artifacts and that `manifest.json`'s recorded
/// checksums match the files on disk.
pub fn check_artifacts(dir: &Path) -> Result<ArtifactCheckReport, Error> {
    let mut report = ArtifactCheckReport::default();

    let manifest_path = dir.join("manifest.json");
    let manifest_bytes = match fs::read(&manifest_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            report.errors.push(format!("cannot read manifest.json: {e}"));
            return Ok(report);
        }
    };
    let manifest: Manifest = serde_json::from_slice(&manifest_bytes)?;

    for (name, expected_digest) in &manifest.outputs {
        match manifest::checksum_outputs(dir, &[name.as_str()]) {
            Ok(digests) => {
                let actual = digests.get(name).cloned().unwrap_or_default();
                if &actual != expected_digest {
                    report
                        .errors
                        .push(format!("{name}: checksum mismatch (manifest says {expected_digest}, file is {actual})"));
                }
            }
            Err(e) => report.errors.push(format!("{name}: {e}")),
        }
    }

    for (name, kind) in [
        ("routes.bin", FileKind::Routes),
        ("stops.bin", FileKind::Stops),
        ("index.bin", FileKind::Index),
    ] {
        let path = dir.join(name);
        if !path.is_file() {
            continue;
        }
        let mut file = fs::File::open(&path)?;
        if let Err(e) = codec::binary::check_header(&mut file, kind) {
            report.errors.push(format!("{name}: {e}"));
        }
    }

    report.valid = report.errors.is_empty();
    Ok(report)
}
