pub mod cli;
pub mod csv_processor;
pub mod imdb;
pub mod state;
pub mod transfer;
pub mod utils;

pub use cli::Cli;
pub use csv_processor::{
    read_ratings_csv, read_watchlist_csv, ParsedCsv, RatingEntry, WatchlistEntry,
};
pub use imdb::{Credential, ImdbClient, SubmissionError, SubmitOutcome, TitleService};
pub use state::{Category, Checkpoint, CheckpointStore};
pub use transfer::{RunStatus, RunSummary, Transfer, TransferPlan};
pub use utils::{AppConfig, Result, TransferError};
