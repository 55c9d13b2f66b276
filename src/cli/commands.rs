use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "tennis-notes")]
#[command(version, about = "Tennis practice notes, grouped by shot")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Signed-in user id; without it notes are kept locally
    #[arg(long, global = true, env = "TENNIS_USER")]
    pub user: Option<String>,

    /// Directory holding local notes and the notes database
    #[arg(long, global = true, env = "TENNIS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the shot categories and their shot types
    Shots {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List notes, grouped by shot and progress
    List {
        /// Shot category (forehand, backhand, serve)
        #[arg(long)]
        shot: Option<String>,

        /// Shot type (e.g. Baseline, Volley, Kick)
        #[arg(long = "type", requires = "shot")]
        shot_type: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a note to "to work on"
    Add {
        /// Note text
        text: String,

        /// Shot category (forehand, backhand, serve)
        #[arg(long, default_value = "forehand")]
        shot: String,

        /// Shot type; defaults to the first type of the category
        #[arg(long = "type")]
        shot_type: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Move a note to another progress category
    Move {
        /// Note ID (full id or unique prefix)
        id: String,

        /// Target category; defaults to the next step (focus, master, revise)
        #[arg(long)]
        to: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replace the text of a note
    Edit {
        /// Note ID (full id or unique prefix)
        id: String,

        /// New text
        text: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a note
    Delete {
        /// Note ID (full id or unique prefix)
        id: String,
    },

    /// Run the HTTP API behind the auth gate
    Serve {
        /// Port to listen on (overrides TENNIS_PORT)
        #[arg(long)]
        port: Option<u16>,
    },
}
