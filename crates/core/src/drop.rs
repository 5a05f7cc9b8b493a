//! Preparing a set of dropped files for dispatch.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use icu_collator::{Collator, CollatorOptions};

use crate::task::FileTask;

thread_local! {
    // Root-locale collation; `None` only if the compiled data fails to load
    static COLLATOR: Option<Collator> =
        Collator::try_new(&Default::default(), CollatorOptions::new()).ok();
}

/// Files dropped together in one user action, ready to submit.
#[derive(Debug, Clone, PartialEq)]
pub struct DropBatch {
    tasks: Vec<FileTask>,
    title: String,
}

impl DropBatch {
    /// Build a batch from dropped paths. Returns `None` for an empty drop.
    ///
    /// Tasks are ordered by path with [`locale_compare`] so that the same
    /// drop always dispatches in the same order.
    pub fn from_paths(paths: Vec<PathBuf>) -> Option<Self> {
        let tasks = paths.into_iter().map(FileTask::from_path).collect();
        Self::from_tasks(tasks)
    }

    /// Build a batch from already-constructed tasks. Returns `None` when empty.
    pub fn from_tasks(mut tasks: Vec<FileTask>) -> Option<Self> {
        if tasks.is_empty() {
            return None;
        }
        tasks.sort_by(|a, b| locale_compare(&a.sort_key(), &b.sort_key()));

        let title = match tasks.as_slice() {
            [only] => strip_extension(only.name()),
            many => format!("{} files", many.len()),
        };

        Some(Self { tasks, title })
    }

    /// A single remote document (picker selection).
    pub fn remote(name: impl Into<String>, url: impl Into<String>, auth_payload: serde_json::Value) -> Self {
        let task = FileTask::remote(name, url, auth_payload);
        let title = strip_extension(task.name());
        Self { tasks: vec![task], title }
    }

    pub fn tasks(&self) -> &[FileTask] {
        &self.tasks
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Base name without its extension ("q3 budget.xlsx" -> "q3 budget").
fn strip_extension(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string())
}

/// Locale-aware string ordering (Unicode root collation).
///
/// Base letters decide first, so accents and case only break ties: `e`
/// before `é` before `f`, and `a` before `A`. Strings the collator deems
/// equal fall back to code-point order.
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    COLLATOR
        .with(|collator| match collator {
            Some(c) => c.compare(a, b),
            None => {
                let folded_a = a.chars().flat_map(char::to_lowercase);
                let folded_b = b.chars().flat_map(char::to_lowercase);
                folded_a.cmp(folded_b)
            }
        })
        .then_with(|| a.cmp(b))
}
