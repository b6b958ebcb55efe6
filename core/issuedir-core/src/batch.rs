//! Bulk backlinking over every issue folder under the search root.

use crate::backlink::BacklinkOutcome;
use crate::locator::IssueFolder;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pending,
    Processing,
    Done,
    Skipped,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchItem {
    pub issue_id: String,
    pub path: PathBuf,
    pub status: ItemStatus,
    /// Outcome message once the item has been processed.
    pub result: Option<String>,
}

impl From<IssueFolder> for BatchItem {
    fn from(folder: IssueFolder) -> Self {
        Self {
            issue_id: folder.issue_id,
            path: folder.path,
            status: ItemStatus::Pending,
            result: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchProgress {
    pub total: usize,
    pub current: usize,
    pub created: usize,
    pub updated: usize,
    pub errors: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub disabled: usize,
    pub errors: usize,
    pub cancelled: bool,
}

impl BatchSummary {
    pub fn render(&self) -> String {
        format!(
            "Created: {}, Updated: {}, Errors: {}",
            self.created, self.updated, self.errors
        )
    }
}

/// Reconciles `items` one at a time.
///
/// `cancel` is only checked between items; an item that has started always
/// finishes. Per-item failures are recorded and never stop the batch.
pub fn run_batch<B, P>(
    items: &mut [BatchItem],
    mut backlink: B,
    cancel: &AtomicBool,
    mut on_progress: P,
) -> BatchSummary
where
    B: FnMut(&str) -> BacklinkOutcome,
    P: FnMut(&BatchProgress, &BatchItem),
{
    let mut summary = BatchSummary::default();
    let mut progress = BatchProgress {
        total: items.len(),
        ..BatchProgress::default()
    };

    for (index, item) in items.iter_mut().enumerate() {
        if cancel.load(Ordering::SeqCst) {
            tracing::info!(processed = index, total = progress.total, "Batch cancelled");
            summary.cancelled = true;
            break;
        }

        item.status = ItemStatus::Processing;
        let outcome = backlink(&item.issue_id);

        item.status = match &outcome {
            BacklinkOutcome::Created { .. } => {
                summary.created += 1;
                progress.created += 1;
                ItemStatus::Done
            }
            BacklinkOutcome::Updated { .. } => {
                summary.updated += 1;
                progress.updated += 1;
                ItemStatus::Done
            }
            BacklinkOutcome::Skipped { .. } => {
                summary.skipped += 1;
                ItemStatus::Skipped
            }
            BacklinkOutcome::Disabled => {
                summary.disabled += 1;
                ItemStatus::Skipped
            }
            BacklinkOutcome::Failed { message, .. } => {
                tracing::warn!(issue_id = %item.issue_id, error = %message, "Batch item failed");
                summary.errors += 1;
                progress.errors += 1;
                ItemStatus::Error
            }
        };
        item.result = Some(outcome.message());
        progress.current = index + 1;
        on_progress(&progress, item);
    }

    tracing::info!(
        created = summary.created,
        updated = summary.updated,
        skipped = summary.skipped,
        errors = summary.errors,
        "Batch finished"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backlink::UpdatedField;

    fn items(ids: &[&str]) -> Vec<BatchItem> {
        ids.iter()
            .map(|id| {
                BatchItem::from(IssueFolder {
                    path: PathBuf::from(format!("/work/{}", id)),
                    issue_id: id.to_string(),
                })
            })
            .collect()
    }

    fn outcome_for(id: &str) -> BacklinkOutcome {
        let url = format!("app://{}", id);
        match id {
            "ENG-1" => BacklinkOutcome::Created { url },
            "ENG-2" => BacklinkOutcome::Updated {
                url,
                field: UpdatedField::Url,
                replaced: true,
            },
            "ENG-3" => BacklinkOutcome::Skipped { url },
            _ => BacklinkOutcome::Failed {
                message: "boom".into(),
                auth_required: false,
            },
        }
    }

    #[test]
    fn test_counts_each_outcome_and_keeps_going_after_errors() {
        let mut batch = items(&["ENG-4", "ENG-1", "ENG-2", "ENG-3"]);
        let mut seen = Vec::new();
        let summary = run_batch(&mut batch, outcome_for, &AtomicBool::new(false), |progress, item| {
            seen.push((progress.current, item.status));
        });

        assert_eq!(summary.render(), "Created: 1, Updated: 1, Errors: 1");
        assert_eq!(summary.skipped, 1);
        assert!(!summary.cancelled);
        assert_eq!(
            seen,
            vec![
                (1, ItemStatus::Error),
                (2, ItemStatus::Done),
                (3, ItemStatus::Done),
                (4, ItemStatus::Skipped),
            ]
        );
        assert_eq!(batch[0].result.as_deref(), Some("boom"));
        assert_eq!(batch[3].result.as_deref(), Some("Link matches configuration"));
    }

    #[test]
    fn test_cancellation_stops_between_items() {
        let mut batch = items(&["ENG-1", "ENG-2", "ENG-3"]);
        let cancel = AtomicBool::new(false);
        let summary = run_batch(
            &mut batch,
            |id| {
                cancel.store(true, Ordering::SeqCst);
                outcome_for(id)
            },
            &cancel,
            |_, _| {},
        );

        assert!(summary.cancelled);
        assert_eq!(summary.created, 1);
        assert_eq!(batch[0].status, ItemStatus::Done);
        assert_eq!(batch[1].status, ItemStatus::Pending);
        assert_eq!(batch[2].status, ItemStatus::Pending);
    }

    #[test]
    fn test_empty_batch_is_a_no_op() {
        let summary = run_batch(&mut [], outcome_for, &AtomicBool::new(false), |_, _| {});
        assert_eq!(summary, BatchSummary::default());
    }
}
