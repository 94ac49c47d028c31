pub mod reader;

pub use reader::{
    read_ratings_csv, read_watchlist_csv, ParsedCsv, RatingEntry, SkippedRow, WatchlistEntry,
};
