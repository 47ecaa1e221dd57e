use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "wafctl")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(
    about = "Run resumable reconciliation handlers for firewall resources",
    long_about = None
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Provisioning API endpoint (overrides the config file)
    #[arg(long, env = "WAFCTL_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// Region used to derive the endpoint (overrides the config file)
    #[arg(long, env = "WAFCTL_REGION", global = true)]
    pub region: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run one handler invocation and print the response
    Handle {
        /// Request JSON file, or - for stdin
        input: String,
    },

    /// Re-invoke until the resource reaches a terminal state
    Converge {
        /// Request JSON file, or - for stdin
        input: String,

        /// Give up after this many invocations
        #[arg(long, default_value = "200")]
        max_invocations: usize,
    },

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Config Commands
// ============================================================================

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,

    /// Print the config file location
    Path,
}
