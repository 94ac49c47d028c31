use clap::{ArgGroup, Parser};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "imdb-transfer",
    version,
    about = "Imports IMDb ratings and watchlist from another account"
)]
#[command(group(
    ArgGroup::new("inputs")
        .args(["ratings", "watchlist"])
        .required(true)
        .multiple(true)
))]
pub struct Cli {
    /// File holding the cookie of the destination IMDb account
    #[arg(short = 'c', long = "cookie", value_name = "FILE")]
    pub cookie: PathBuf,

    /// ratings.csv exported from the originating IMDb account
    #[arg(short = 'r', long, value_name = "CSV")]
    pub ratings: Option<PathBuf>,

    /// watchlist.csv exported from the originating IMDb account
    #[arg(short = 'w', long, value_name = "CSV")]
    pub watchlist: Option<PathBuf>,

    /// Where processed titles are recorded (overrides the config file)
    #[arg(long, value_name = "FILE")]
    pub checkpoint: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_ratings_or_watchlist() {
        let err = Cli::try_parse_from(["imdb-transfer", "-c", "cookie.txt"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn requires_cookie() {
        assert!(Cli::try_parse_from(["imdb-transfer", "-r", "ratings.csv"]).is_err());
    }

    #[test]
    fn accepts_both_inputs() {
        let cli = Cli::try_parse_from([
            "imdb-transfer",
            "-c",
            "cookie.txt",
            "-r",
            "ratings.csv",
            "--watchlist",
            "watchlist.csv",
            "--checkpoint",
            "state.json",
        ])
        .unwrap();

        assert_eq!(cli.cookie, PathBuf::from("cookie.txt"));
        assert_eq!(cli.ratings, Some(PathBuf::from("ratings.csv")));
        assert_eq!(cli.watchlist, Some(PathBuf::from("watchlist.csv")));
        assert_eq!(cli.checkpoint, Some(PathBuf::from("state.json")));
        assert!(cli.config.is_none());
    }
}
