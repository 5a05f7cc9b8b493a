//! Session-long history of lint outcomes.

use crate::outcome::LintOutcome;

/// Ordered list of outcomes, most recent batch first.
///
/// Grows only by prepending whole batches. Entries are never edited,
/// deduplicated or evicted.
#[derive(Debug, Clone, Default)]
pub struct ResultAggregator {
    outcomes: Vec<LintOutcome>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a settled batch in front of everything collected so far,
    /// keeping the batch's own order.
    pub fn prepend_batch(&mut self, batch: Vec<LintOutcome>) {
        if batch.is_empty() {
            return;
        }
        let previous = std::mem::replace(&mut self.outcomes, batch);
        self.outcomes.extend(previous);
    }

    pub fn outcomes(&self) -> &[LintOutcome] {
        &self.outcomes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LintOutcome> {
        self.outcomes.iter()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.len() - self.success_count()
    }
}

impl<'a> IntoIterator for &'a ResultAggregator {
    type Item = &'a LintOutcome;
    type IntoIter = std::slice::Iter<'a, LintOutcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
