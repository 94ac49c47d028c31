//! Drives a transfer: ratings first, then the watchlist.
//!
//! The checkpoint is threaded through by value. Each category is persisted
//! once it stops, unless it stopped on an authentication failure.

use crate::csv_processor::{RatingEntry, WatchlistEntry};
use crate::imdb::{SubmitOutcome, TitleService};
use crate::state::{Category, Checkpoint, CheckpointStore};
use crate::utils::{Result, TransferError};
use std::collections::HashSet;
use tracing::{error, info, warn};

/// Entries read from the exports. `None` means the category was not requested.
#[derive(Debug, Clone, Default)]
pub struct TransferPlan {
    pub ratings: Option<Vec<RatingEntry>>,
    pub watchlist: Option<Vec<WatchlistEntry>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryOutcome {
    Done,
    RateLimited,
    AuthFailed(String),
    Aborted(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryReport {
    pub category: Category,
    pub submitted: usize,
    pub outcome: CategoryOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    /// Remaining entries are left for the next run.
    RateLimited,
    Aborted { detail: String },
}

impl RunStatus {
    /// Process exit code: a rate-limited run still counts as a clean exit.
    pub fn exit_code(&self) -> u8 {
        match self {
            RunStatus::Completed | RunStatus::RateLimited => 0,
            RunStatus::Aborted { .. } => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub status: RunStatus,
    pub reports: Vec<CategoryReport>,
}

/// One unit of work for the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission<'a> {
    Rating { title_id: &'a str, score: u8 },
    Watchlist { title_id: &'a str },
}

impl Submission<'_> {
    pub fn title_id(&self) -> &str {
        match self {
            Submission::Rating { title_id, .. } | Submission::Watchlist { title_id } => title_id,
        }
    }
}

fn done_ids(checkpoint: &Checkpoint, category: Category) -> HashSet<&str> {
    checkpoint.ids(category).iter().map(String::as_str).collect()
}

pub fn pending_ratings<'a>(
    entries: &'a [RatingEntry],
    checkpoint: &Checkpoint,
) -> Vec<Submission<'a>> {
    let done = done_ids(checkpoint, Category::Ratings);
    entries
        .iter()
        .filter(|e| !done.contains(e.title_id.as_str()))
        .map(|e| Submission::Rating {
            title_id: &e.title_id,
            score: e.score,
        })
        .collect()
}

pub fn pending_watchlist<'a>(
    entries: &'a [WatchlistEntry],
    checkpoint: &Checkpoint,
) -> Vec<Submission<'a>> {
    let done = done_ids(checkpoint, Category::Watchlist);
    entries
        .iter()
        .filter(|e| !done.contains(e.title_id.as_str()))
        .map(|e| Submission::Watchlist {
            title_id: &e.title_id,
        })
        .collect()
}

/// Submits `pending` in order until one submission does not succeed.
pub async fn process_category<S: TitleService>(
    service: &S,
    category: Category,
    pending: &[Submission<'_>],
    mut checkpoint: Checkpoint,
) -> (Checkpoint, CategoryReport) {
    let mut submitted = 0;

    for submission in pending {
        let outcome = match *submission {
            Submission::Rating { title_id, score } => service.submit_rating(title_id, score).await,
            Submission::Watchlist { title_id } => service.add_to_watchlist(title_id).await,
        };

        let stop = match outcome {
            SubmitOutcome::Success => {
                checkpoint.record(category, submission.title_id());
                submitted += 1;
                match submission {
                    Submission::Rating { title_id, score } => {
                        info!(title_id = %title_id, score = *score, "IMDb title rated")
                    }
                    Submission::Watchlist { title_id } => {
                        info!(title_id = %title_id, "IMDb title added to the watchlist")
                    }
                }
                continue;
            }
            SubmitOutcome::RateLimited => {
                warn!(%category, title_id = %submission.title_id(), "IMDb rate limit exceeded");
                CategoryOutcome::RateLimited
            }
            SubmitOutcome::AuthFailed(message) => {
                error!(%category, message = %message, "Failed to authenticate with cookie");
                CategoryOutcome::AuthFailed(message)
            }
            SubmitOutcome::Failed(e) => {
                error!(%category, title_id = %submission.title_id(), error = %e, "Submission failed");
                CategoryOutcome::Aborted(format!("{}: {}", submission.title_id(), e))
            }
        };

        return (
            checkpoint,
            CategoryReport {
                category,
                submitted,
                outcome: stop,
            },
        );
    }

    (
        checkpoint,
        CategoryReport {
            category,
            submitted,
            outcome: CategoryOutcome::Done,
        },
    )
}

pub struct Transfer<'a, S> {
    service: &'a S,
    store: &'a CheckpointStore,
}

impl<'a, S: TitleService> Transfer<'a, S> {
    pub fn new(service: &'a S, store: &'a CheckpointStore) -> Self {
        Self { service, store }
    }

    pub async fn run(&self, plan: &TransferPlan, mut checkpoint: Checkpoint) -> Result<RunSummary> {
        let mut reports = Vec::new();

        let categories = [
            (
                Category::Ratings,
                plan.ratings.as_deref().map(|e| pending_ratings(e, &checkpoint)),
            ),
            (
                Category::Watchlist,
                plan.watchlist
                    .as_deref()
                    .map(|e| pending_watchlist(e, &checkpoint)),
            ),
        ];

        for (category, pending) in categories {
            let Some(pending) = pending else {
                continue;
            };
            if pending.is_empty() {
                info!(%category, "Nothing left to submit");
                continue;
            }

            info!(%category, pending = pending.len(), "Submitting titles");
            let (updated, report) =
                process_category(self.service, category, &pending, checkpoint).await;
            checkpoint = updated;

            if report.submitted > 0 && !matches!(report.outcome, CategoryOutcome::AuthFailed(_)) {
                self.store.save(&checkpoint)?;
                info!(
                    %category,
                    submitted = report.submitted,
                    path = %self.store.path().display(),
                    "Processed titles saved"
                );
            }

            let outcome = report.outcome.clone();
            reports.push(report);

            match outcome {
                CategoryOutcome::Done => {}
                CategoryOutcome::RateLimited => {
                    warn!("IMDb rate limit exceeded, try again in a few minutes");
                    return Ok(RunSummary {
                        status: RunStatus::RateLimited,
                        reports,
                    });
                }
                CategoryOutcome::AuthFailed(message) => {
                    return Err(TransferError::AuthenticationFailed(message));
                }
                CategoryOutcome::Aborted(detail) => {
                    return Ok(RunSummary {
                        status: RunStatus::Aborted { detail },
                        reports,
                    });
                }
            }
        }

        Ok(RunSummary {
            status: RunStatus::Completed,
            reports,
        })
    }
}
