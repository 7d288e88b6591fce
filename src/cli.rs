use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ffweave")]
#[command(author, version, about = "Build ffmpeg command lines and parse ffmpeg progress output")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a JSON job as a quoted command string
    Render {
        /// Job file (`-` reads stdin)
        #[arg(required = true)]
        job: PathBuf,

        /// Omit the program name
        #[arg(long)]
        no_program: bool,
    },

    /// Render a JSON job as a JSON array of arguments
    Tokens {
        /// Job file (`-` reads stdin)
        #[arg(required = true)]
        job: PathBuf,

        /// Pretty-print the array
        #[arg(long)]
        pretty: bool,
    },

    /// Parse a progress stream and print each update as a JSON line
    Progress {
        /// File holding `-progress` output (reads stdin if omitted)
        file: Option<PathBuf>,

        /// Print the buffered log lines after the stream ends
        #[arg(long)]
        log: bool,
    },

    /// Check that a JSON job builds a valid command
    Validate {
        /// Job file (`-` reads stdin)
        #[arg(required = true)]
        job: PathBuf,
    },

    /// Validate configuration file
    CheckConfig {
        /// Config file to validate (uses default search paths if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
