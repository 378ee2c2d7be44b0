use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Horse and barn stall management")]
pub struct Cli {
    /// Directory holding the users, horses and barns files
    #[clap(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Username to log in as (prompted when omitted)
    #[clap(long, short = 'u', global = true)]
    pub user: Option<String>,

    #[clap(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Register a new user
    Register,

    /// Open the interactive menu (default)
    Menu,

    /// List horses
    Horses {
        /// Only horses whose name contains this text
        #[clap(long, short = 's')]
        search: Option<String>,

        /// Only the horse in this barn (use with --stall)
        #[clap(long, requires = "stall")]
        barn: Option<String>,

        /// Stall number within --barn
        #[clap(long, requires = "barn")]
        stall: Option<u32>,
    },

    /// List barns with their capacity
    Barns,

    /// Show barns that still have empty stalls
    Vacancies,

    /// Export the horse list to a document
    Export {
        /// Output format (markdown, json)
        #[clap(long, short = 'f', default_value = "markdown")]
        format: String,

        /// Output file path
        #[clap(long, short = 'o')]
        output: Option<PathBuf>,
    },
}
