use std::path::{Path, PathBuf};

use serde::Serialize;

/// One unit of upload work.
///
/// Either a spreadsheet on local disk, or a remote document identified by
/// URL together with the authorization payload handed over by a picker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FileTask {
    File {
        name: String,
        path: PathBuf,
    },
    Remote {
        name: String,
        url: String,
        auth_payload: serde_json::Value,
    },
}

impl FileTask {
    /// Task for a local file. The display name is the path's final component.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        FileTask::File { name, path }
    }

    pub fn remote(name: impl Into<String>, url: impl Into<String>, auth_payload: serde_json::Value) -> Self {
        FileTask::Remote {
            name: name.into(),
            url: url.into(),
            auth_payload,
        }
    }

    /// File name shown next to the outcome.
    pub fn name(&self) -> &str {
        match self {
            FileTask::File { name, .. } | FileTask::Remote { name, .. } => name,
        }
    }

    /// Local path, if this task reads from disk.
    pub fn path(&self) -> Option<&Path> {
        match self {
            FileTask::File { path, .. } => Some(path),
            FileTask::Remote { .. } => None,
        }
    }

    /// Key used for ordering a drop: the path for local files, the URL otherwise.
    pub fn sort_key(&self) -> String {
        match self {
            FileTask::File { path, .. } => path.to_string_lossy().into_owned(),
            FileTask::Remote { url, .. } => url.clone(),
        }
    }
}
