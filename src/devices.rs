//! Device-sync wrapper.
//!
//! Optionally runs the external stage-2 device parser, copies its JSON output
//! (`categories.json`, `devices.json` and one `<id>.json` per device) into the
//! site's device data directory, then merges `devices.json` into the curated
//! `device-list.json` by `id`.

use crate::config::DevicesConfig;
use crate::error::{FileError, SyncError};
use crate::generator::write_json;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};
use walkdir::WalkDir;

pub const CATEGORIES_FILE: &str = "categories.json";
pub const DEVICES_FILE: &str = "devices.json";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub updated: usize,
    pub appended: usize,
}

#[derive(Debug, Default)]
pub struct SyncReport {
    pub copied: Vec<PathBuf>,
    /// `None` when the merge was skipped or failed.
    pub merge: Option<MergeOutcome>,
}

pub fn sync_devices(config: &DevicesConfig) -> Result<SyncReport, SyncError> {
    if let Some(script) = &config.parser_script {
        run_parser(&config.parser_program, script)?;
    }

    if !config.parser_output.is_dir() {
        return Err(SyncError::MissingParserOutput(config.parser_output.clone()));
    }
    fs::create_dir_all(&config.target_dir).map_err(|source| FileError::CreateDir {
        path: config.target_dir.clone(),
        source,
    })?;

    let copied = copy_json_outputs(&config.parser_output, &config.target_dir)?;
    for expected in [CATEGORIES_FILE, DEVICES_FILE] {
        if !config.parser_output.join(expected).is_file() {
            warn!(file = expected, "device parser did not produce index file");
        }
    }

    let merge = match merge_device_list(&config.parser_output.join(DEVICES_FILE), &config.device_list) {
        Ok(outcome) => {
            info!(
                updated = outcome.updated,
                appended = outcome.appended,
                list = %config.device_list.display(),
                "merged device list"
            );
            Some(outcome)
        }
        Err(err) => {
            warn!("could not update device list: {err}");
            None
        }
    };

    Ok(SyncReport { copied, merge })
}

fn run_parser(program: &str, script: &Path) -> Result<(), SyncError> {
    if !script.is_file() {
        return Err(SyncError::MissingParserScript(script.to_path_buf()));
    }
    info!(program, script = %script.display(), "running device parser");
    let status = Command::new(program)
        .arg(script)
        .status()
        .map_err(|source| SyncError::ParserLaunch {
            program: program.to_string(),
            source,
        })?;
    if !status.success() {
        return Err(SyncError::ParserFailed {
            code: status.code(),
        });
    }
    Ok(())
}

/// Copy every `*.json` directly inside `from` (symlinks resolved) into `to`,
/// in lexical order.
fn copy_json_outputs(from: &Path, to: &Path) -> Result<Vec<PathBuf>, SyncError> {
    let mut copied = Vec::new();
    for entry in WalkDir::new(from).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(dir = %from.display(), "skipping unreadable entry: {err}");
                continue;
            }
        };
        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let dest = to.join(entry.file_name());
        fs::copy(path, &dest).map_err(|source| FileError::Write {
            path: dest.clone(),
            source,
        })?;
        copied.push(dest);
    }
    info!(count = copied.len(), target = %to.display(), "copied device data");
    Ok(copied)
}

fn read_value(path: &Path) -> Result<Value, SyncError> {
    let text = fs::read_to_string(path).map_err(|source| FileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| SyncError::InvalidJson {
        path: path.to_path_buf(),
        source,
    })
}

/// Device array of a document that is either `[...]` or `{"devices": [...]}`.
fn device_array(value: &Value) -> Option<&Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(map) => map.get("devices").and_then(Value::as_array),
        _ => None,
    }
}

fn device_array_mut(value: &mut Value) -> Option<&mut Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(map) => map.get_mut("devices").and_then(Value::as_array_mut),
        _ => None,
    }
}

fn device_id(device: &Value) -> Option<&str> {
    device.get("id").and_then(Value::as_str)
}

/// Overwrite entries of `list` that share an `id` with an entry of
/// `incoming`; append the rest. The list's outer shape is kept.
pub fn merge_devices(list: &mut Vec<Value>, incoming: &[Value]) -> MergeOutcome {
    let mut outcome = MergeOutcome::default();
    for device in incoming {
        let existing = device_id(device)
            .and_then(|id| list.iter().position(|d| device_id(d) == Some(id)));
        match existing {
            Some(i) => {
                list[i] = device.clone();
                outcome.updated += 1;
            }
            None => {
                list.push(device.clone());
                outcome.appended += 1;
            }
        }
    }
    outcome
}

pub fn merge_device_list(devices_path: &Path, list_path: &Path) -> Result<MergeOutcome, SyncError> {
    if !list_path.is_file() {
        return Err(SyncError::MissingDeviceList(list_path.to_path_buf()));
    }
    let incoming = read_value(devices_path)?;
    let incoming = device_array(&incoming)
        .ok_or_else(|| SyncError::NotADeviceList(devices_path.to_path_buf()))?;

    let mut list = read_value(list_path)?;
    let entries = device_array_mut(&mut list)
        .ok_or_else(|| SyncError::NotADeviceList(list_path.to_path_buf()))?;
    let outcome = merge_devices(entries, incoming);

    write_json(list_path, &list)?;
    Ok(outcome)
}
