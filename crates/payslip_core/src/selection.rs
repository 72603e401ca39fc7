use std::collections::BTreeSet;

use crate::{Matricule, PreviewBatch, PreviewItem, SendSelectedRequest};

/// Recipient choice over one preview batch.
///
/// Only `can_send` items ever enter the selection. The search query filters
/// what is displayed and never touches the selection itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientSelector {
    batch: PreviewBatch,
    selected: BTreeSet<Matricule>,
    query: String,
    submitting: bool,
}

impl RecipientSelector {
    /// Starts with every eligible item selected.
    pub fn new(batch: PreviewBatch) -> Self {
        let selected = eligible(&batch.items)
            .map(|item| item.matricule.clone())
            .collect();
        Self {
            batch,
            selected,
            query: String::new(),
            submitting: false,
        }
    }

    pub fn batch(&self) -> &PreviewBatch {
        &self.batch
    }

    /// Flips one recipient. Returns `false` for unknown or ineligible matricules.
    pub fn toggle(&mut self, matricule: &str) -> bool {
        if !self.is_eligible(matricule) {
            return false;
        }
        if !self.selected.remove(matricule) {
            self.selected.insert(matricule.to_string());
        }
        true
    }

    /// True when there is at least one eligible item and all of them are selected.
    pub fn all_selected(&self) -> bool {
        let mut eligible = eligible(&self.batch.items).peekable();
        eligible.peek().is_some() && eligible.all(|item| self.selected.contains(&item.matricule))
    }

    pub fn toggle_all(&mut self) {
        if self.all_selected() {
            for item in eligible(&self.batch.items) {
                self.selected.remove(&item.matricule);
            }
        } else {
            for item in eligible(&self.batch.items) {
                self.selected.insert(item.matricule.clone());
            }
        }
    }

    pub fn search(&mut self, text: impl Into<String>) {
        self.query = text.into();
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Items matching the search query, in batch order.
    pub fn visible(&self) -> Vec<&PreviewItem> {
        let needle = self.query.trim().to_lowercase();
        if needle.is_empty() {
            return self.batch.items.iter().collect();
        }
        self.batch
            .items
            .iter()
            .filter(|item| {
                format!("{} {} {}", item.fullname, item.matricule, item.email)
                    .to_lowercase()
                    .contains(&needle)
            })
            .collect()
    }

    pub fn is_selected(&self, matricule: &str) -> bool {
        self.selected.contains(matricule)
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    pub fn eligible_count(&self) -> usize {
        eligible(&self.batch.items).count()
    }

    /// Selected matricules in batch order.
    pub fn selected_matricules(&self) -> Vec<Matricule> {
        let mut seen = BTreeSet::new();
        self.batch
            .items
            .iter()
            .filter(|item| self.selected.contains(&item.matricule))
            .filter(|item| seen.insert(item.matricule.as_str()))
            .map(|item| item.matricule.clone())
            .collect()
    }

    pub fn can_confirm(&self) -> bool {
        !self.submitting && !self.selected.is_empty()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Marks a submission in flight and returns its payload, unless one is
    /// already running or nothing is selected.
    pub fn begin_confirm(&mut self) -> Option<SendSelectedRequest> {
        if !self.can_confirm() {
            return None;
        }
        self.submitting = true;
        Some(SendSelectedRequest {
            batch_id: self.batch.batch_id.clone(),
            year: self.batch.year,
            month: self.batch.month,
            matricules: self.selected_matricules(),
        })
    }

    /// Re-enables confirmation after the backend rejected a submission.
    pub fn confirm_failed(&mut self) {
        self.submitting = false;
    }

    fn is_eligible(&self, matricule: &str) -> bool {
        eligible(&self.batch.items).any(|item| item.matricule == matricule)
    }
}

fn eligible(items: &[PreviewItem]) -> impl Iterator<Item = &PreviewItem> {
    items.iter().filter(|item| item.can_send)
}
