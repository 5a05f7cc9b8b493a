//! Drop → dispatch → aggregate, for a single interactive session.

use std::path::PathBuf;

use sheetlint_core::{DropBatch, FileTask, LintOutcome, ResultAggregator};

use crate::client::LintClient;

/// State behind a results view: everything linted so far, whether a batch
/// is in flight, and the title of the latest drop.
#[derive(Debug, Default)]
pub struct Workbench {
    results: ResultAggregator,
    loading: bool,
    title: Option<String>,
}

impl Workbench {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lint a set of dropped files.
    ///
    /// An empty drop leaves the results untouched and clears the loading
    /// flag. Returns the number of outcomes added.
    pub fn drop_files(&mut self, client: &LintClient, paths: Vec<PathBuf>) -> usize {
        self.drop_tasks(client, paths.into_iter().map(FileTask::from_path).collect())
    }

    /// Lint dropped tasks (local files, remote documents, or both).
    /// Same empty-drop rules as [`Workbench::drop_files`].
    pub fn drop_tasks(&mut self, client: &LintClient, tasks: Vec<FileTask>) -> usize {
        self.loading = true;
        match DropBatch::from_tasks(tasks) {
            Some(batch) => self.submit(client, batch),
            None => {
                log::debug!("empty drop ignored");
                self.loading = false;
                0
            }
        }
    }

    /// Lint a prepared batch and put its outcomes in front of older ones.
    pub fn submit(&mut self, client: &LintClient, batch: DropBatch) -> usize {
        self.loading = true;
        self.title = Some(batch.title().to_string());

        let outcomes = client.submit_batch(batch.tasks());
        let added = outcomes.len();
        self.results.prepend_batch(outcomes);

        self.loading = false;
        added
    }

    pub fn results(&self) -> &ResultAggregator {
        &self.results
    }

    pub fn outcomes(&self) -> &[LintOutcome] {
        self.results.outcomes()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }
}
