use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::resolve::DEFAULT_CORPUS;
use crate::config::{DiffConfig, SearchConfig};

#[derive(Parser)]
#[command(
    name = "imgmatch",
    about = "Perceptual image comparison and similarity search"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create .imgmatch/config.toml with default settings
    Init {
        /// Corpus directory searched by default
        #[arg(long, default_value = DEFAULT_CORPUS)]
        corpus: PathBuf,
        /// Overwrite an existing config
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Compare two images and report how much they differ (exit 0 = visually equal)
    Compare {
        /// Reference image; its dimensions are authoritative
        first: PathBuf,
        /// Image compared against the reference (resized if needed)
        second: PathBuf,
        /// Write the diff overlay here when the images are not visually equal
        #[arg(long, short = 'd')]
        diff: Option<PathBuf>,
        /// Write the diff overlay even when the images are visually equal
        #[arg(long, requires = "diff")]
        always_diff: bool,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        options: DiffConfig,
    },

    /// Rank the images of a corpus directory by similarity to a query image
    Search {
        /// Query image
        query: PathBuf,
        /// Only show the N most similar images
        #[arg(long, short = 'n', conflicts_with = "min_similarity")]
        top: Option<usize>,
        /// Only show images at least this similar (0-100)
        #[arg(long, short = 'm')]
        min_similarity: Option<f64>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        search: SearchConfig,
        #[command(flatten)]
        options: DiffConfig,
    },

    /// Convert an image to JPEG
    Convert {
        /// Image to convert
        input: PathBuf,
        /// Output path (default: next to the input with a .jpg extension)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
        /// JPEG quality (1-100)
        #[arg(long, short = 'q', default_value_t = imgmatch::convert::DEFAULT_QUALITY,
              value_parser = clap::value_parser!(u8).range(1..=100))]
        quality: u8,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn include_aa_flag_without_value_means_true() {
        let cli =
            Cli::try_parse_from(["imgmatch", "compare", "a.png", "b.png", "--include-aa"]).unwrap();
        let Command::Compare { options, .. } = cli.command else {
            panic!("expected compare");
        };
        assert_eq!(options.include_anti_aliasing, Some(true));
    }

    #[test]
    fn unset_flags_stay_none() {
        let cli = Cli::try_parse_from(["imgmatch", "search", "q.png"]).unwrap();
        let Command::Search {
            options,
            search,
            top,
            ..
        } = cli.command
        else {
            panic!("expected search");
        };
        assert!(options.include_anti_aliasing.is_none());
        assert!(options.threshold.is_none());
        assert!(search.corpus.is_none());
        assert!(top.is_none());
    }

    #[test]
    fn top_and_min_similarity_conflict() {
        let parsed = Cli::try_parse_from(["imgmatch", "search", "q.png", "-n", "3", "-m", "80"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let parsed =
            Cli::try_parse_from(["imgmatch", "compare", "a.png", "b.png", "--threshold", "2"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let parsed = Cli::try_parse_from(["imgmatch", "search", "q.png", "--timeout-secs", "0"]);
        assert!(parsed.is_err());
    }
}
