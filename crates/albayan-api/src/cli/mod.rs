//! CLI command definitions for the `albayan` binary.
//!
//! Uses clap derive macros for argument parsing. Running `albayan` with no
//! subcommand opens the interactive chat.

pub mod ask;
pub mod chat;
pub mod session;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Shown in place of a raw error trace when something unexpected fails.
pub const UNEXPECTED_ERROR_TEXT: &str = "عذراً، حدث خطأ غير متوقع. يرجى إعادة المحاولة.";

/// Al-Bayan: an Islamic guidance assistant in your terminal.
#[derive(Parser)]
#[command(name = "albayan", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Keep history in memory only for this run.
    #[arg(long, global = true)]
    pub ephemeral: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat (the default).
    Chat {
        /// Reopen a stored session by list number or id.
        #[arg(long, short)]
        session: Option<String>,
    },

    /// Ask a single question and print the answer.
    Ask {
        /// The question.
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        /// Ask as a follow-up in a stored session (list number or id).
        #[arg(long, short)]
        session: Option<String>,
    },

    /// List stored conversations, newest first.
    #[command(alias = "ls")]
    Sessions,

    /// Export a conversation as Markdown (or JSON with --json).
    Show {
        /// List number or id.
        session: String,
    },

    /// Delete a conversation.
    #[command(alias = "rm")]
    Delete {
        /// List number or id.
        session: String,

        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
