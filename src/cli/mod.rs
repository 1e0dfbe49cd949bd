use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

use commands::ItemSelection;

#[derive(Parser)]
#[command(name = "return-workflow")]
#[command(about = "Check, estimate and submit order return requests")]
#[command(long_about = "Drives the return request workflow for an order: eligibility check, \
                       item selection with refund estimate, and submission to the order return service. \
                       Orders and policies are read from JSON files.")]
pub struct Cli {
    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check whether an order can still be returned
    Check {
        /// Order JSON file
        #[arg(long)]
        order: PathBuf,
        /// Return policy JSON file (fetched from the service when omitted)
        #[arg(long)]
        policy: Option<PathBuf>,
        /// Evaluate as of this RFC 3339 timestamp instead of now
        #[arg(long)]
        now: Option<String>,
    },
    /// Estimate the refund for a selection of items
    Estimate {
        /// Order JSON file
        #[arg(long)]
        order: PathBuf,
        /// Return policy JSON file (fetched from the service when omitted)
        #[arg(long)]
        policy: Option<PathBuf>,
        /// Reason applied to selected items that do not name one
        #[arg(long)]
        reason: Option<String>,
        /// Item selection: index:quantity[:condition[:reason]]
        #[arg(long = "item", value_name = "SPEC")]
        items: Vec<ItemSelection>,
    },
    /// Submit a return request to the order return service
    Submit {
        /// Order JSON file
        #[arg(long)]
        order: PathBuf,
        /// Primary return reason
        #[arg(long)]
        reason: String,
        /// Item selection: index:quantity[:condition[:reason]]
        #[arg(long = "item", value_name = "SPEC", required = true)]
        items: Vec<ItemSelection>,
        /// Free-text description of the problem
        #[arg(long, default_value = "")]
        description: String,
        /// Notes for the pharmacy
        #[arg(long, default_value = "")]
        notes: String,
    },
}
