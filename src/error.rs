use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Conditions that stop a generation run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("source root {} does not exist or is not a directory", .0.display())]
    MissingSourceRoot(PathBuf),

    #[error("failed to create target root {}: {}", .path.display(), .source)]
    CreateTargetRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to list {}: {}", .path.display(), .source)]
    ListSource {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// A failure confined to one file. The run records it and moves on.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("failed to read {}: {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create directory {}: {}", .path.display(), .source)]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize {}: {}", .path.display(), .source)]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write {}: {}", .path.display(), .source)]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}: component id `{id}` collides with a generated file", .path.display())]
    ReservedComponentId { path: PathBuf, id: String },

    #[error("{}: component id `{id}` was already written by an earlier file", .path.display())]
    DuplicateComponentId { path: PathBuf, id: String },
}

impl FileError {
    pub fn path(&self) -> &Path {
        match self {
            FileError::Read { path, .. }
            | FileError::CreateDir { path, .. }
            | FileError::Serialize { path, .. }
            | FileError::Write { path, .. }
            | FileError::ReservedComponentId { path, .. }
            | FileError::DuplicateComponentId { path, .. } => path,
        }
    }
}

/// Errors from the device-sync wrapper.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("device parser script not found: {}", .0.display())]
    MissingParserScript(PathBuf),

    #[error("failed to launch device parser `{program}`: {source}")]
    ParserLaunch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("device parser exited with {}", exit_label(.code))]
    ParserFailed { code: Option<i32> },

    #[error("device parser output directory not found: {}", .0.display())]
    MissingParserOutput(PathBuf),

    #[error("device list {} does not exist", .0.display())]
    MissingDeviceList(PathBuf),

    #[error("{} is not valid JSON: {}", .path.display(), .source)]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{} does not contain a device array", .0.display())]
    NotADeviceList(PathBuf),

    #[error(transparent)]
    File(#[from] FileError),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}
