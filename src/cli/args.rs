// file: src/cli/args.rs
// version: 1.0.0
// guid: 7a40d2c9-1e86-4b53-9f07-c28b6d41e095

//! Command line argument definitions

use crate::policy::Role;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "secops-agent")]
#[command(about = "Policy-gated security tool execution from conversational queries")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    // Long-only: -q belongs to `query -q <text>`.
    #[arg(long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interpret a query, authorize it and run the matching tools
    Query {
        /// The natural-language query, e.g. "scan 203.0.113.5 for open ports"
        #[arg(short, long)]
        query: String,

        #[arg(short, long, help = "Explicit target, overriding extraction from the query")]
        target: Option<String>,

        #[arg(short, long, default_value = "operator")]
        user: String,

        #[arg(short, long, value_enum, default_value = "analyst")]
        role: RoleArg,

        #[arg(short, long)]
        config: Option<String>,
    },

    /// Report catalogued tools and their installation status
    Tools {
        #[arg(short, long)]
        json: bool,

        #[arg(short, long)]
        config: Option<String>,
    },

    /// Check how the target policy would treat a target
    CheckTarget {
        target: String,

        #[arg(short, long)]
        config: Option<String>,
    },
}

/// Role argument for CLI
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum RoleArg {
    Analyst,
    PentestLead,
    Admin,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Analyst => Role::Analyst,
            RoleArg::PentestLead => Role::PentestLead,
            RoleArg::Admin => Role::Admin,
        }
    }
}
