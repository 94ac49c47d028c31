pub mod client;
pub mod credential;

pub use client::{classify_response, ImdbClient};
pub use credential::Credential;

use crate::state::Category;
use thiserror::Error;

/// How a single submission ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Success,
    /// HTTP 429. Remaining work should wait for a later run.
    RateLimited,
    /// The cookie was rejected; every further call would fail too.
    AuthFailed(String),
    Failed(SubmissionError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Error submitting IMDb {category}. Code: {status}")]
    Status { category: Category, status: u16 },

    #[error("{0}")]
    Api(String),

    #[error("Unexpected response body: {0}")]
    UnexpectedBody(String),

    #[error("Request failed: {0}")]
    Transport(String),
}

/// The two write operations against the destination account.
#[allow(async_fn_in_trait)]
pub trait TitleService {
    async fn submit_rating(&self, title_id: &str, score: u8) -> SubmitOutcome;

    async fn add_to_watchlist(&self, title_id: &str) -> SubmitOutcome;
}
