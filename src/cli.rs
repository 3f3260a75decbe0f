use ar_notes::config::DEFAULT_STORE_PORT;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "arnotes")]
#[command(
    about = "Marker-anchored shopping and to-do notes backed by a shared document store",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print a note or to-do list
    Show {
        note_id: String,
    },
    /// Append an item to a shopping note
    Add {
        note_id: String,
        name: String,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a note's colour (palette name or #RRGGBB)
    Color {
        note_id: String,
        color: String,
    },
    /// List configured markers
    Markers,
    /// Serve the local store over HTTP
    Serve {
        /// Port to run the server on
        #[arg(short, long, default_value_t = DEFAULT_STORE_PORT)]
        port: u16,
    },
}
