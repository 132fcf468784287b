//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Plan Heart of the Mountain trees and powder spending for a mining goal
#[derive(Parser, Debug)]
#[command(name = "hotm")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Raise log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Spend powder on a tree and report the resulting rate
    Optimize {
        /// Player configuration (RON, TOML or JSON)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        config: PathBuf,

        /// Directory with nodes/layout/mining files (default: built-in data)
        #[arg(long, value_hint = ValueHint::DirPath)]
        data_dir: Option<PathBuf>,

        /// Always buy one level at a time
        #[arg(long)]
        no_fast_path: bool,
    },

    /// List candidate trees for the configured required nodes
    Paths {
        /// Player configuration (RON, TOML or JSON)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        config: PathBuf,

        /// Directory with nodes/layout/mining files (default: built-in data)
        #[arg(long, value_hint = ValueHint::DirPath)]
        data_dir: Option<PathBuf>,

        /// Print at most this many trees
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show the tree layout and every node
    Catalog {
        /// Directory with nodes/layout/mining files (default: built-in data)
        #[arg(long, value_hint = ValueHint::DirPath)]
        data_dir: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn debug_flag_counts() {
        let cli = Cli::parse_from(["hotm", "-dd", "catalog"]);
        assert_eq!(cli.debug, 2);
        assert!(matches!(cli.command, Commands::Catalog { data_dir: None }));
    }

    #[test]
    fn optimize_args() {
        let cli = Cli::parse_from(["hotm", "optimize", "-c", "me.toml", "--no-fast-path"]);
        match cli.command {
            Commands::Optimize {
                config,
                data_dir,
                no_fast_path,
            } => {
                assert_eq!(config, PathBuf::from("me.toml"));
                assert!(data_dir.is_none());
                assert!(no_fast_path);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
