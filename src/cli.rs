use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "vh3", about = "VH3 Connect field-service client")]
pub struct Cli {
    /// Path to config file (default: ./config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Log in and persist the session token
    Login {
        /// Account email; the password is prompted
        email: String,
    },
    /// Create an account and log in
    Signup {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        /// UK number, e.g. 447808648469 or 07808648469
        #[arg(long)]
        phone: String,
    },
    /// Drop the persisted session token
    Logout,
    /// Show the logged-in user
    Whoami,
    /// List channels
    Chats,
    /// List contacts
    Contacts,
    /// Send a message into a channel
    Send {
        /// Target channel id
        channel: String,
        text: String,
    },
    /// Create a new channel
    NewChat {
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// User id to include; repeatable
        #[arg(long = "participant", required = true)]
        participants: Vec<i64>,
    },
    /// Follow a channel, printing messages as they arrive
    Watch {
        /// Channel id to follow
        channel: String,
        /// Also open the realtime socket
        #[arg(long)]
        realtime: bool,
    },
    /// Show dashboard statistics
    Stats {
        /// Dashboard id
        dashboard: String,
    },
    /// Knowledge-base documents
    #[command(subcommand)]
    Docs(DocsCommand),
}

#[derive(Debug, Clone, Subcommand)]
pub enum DocsCommand {
    /// List all documents
    List,
    /// Show one document
    Show { doc_id: String },
    /// Upload a PDF
    Upload { path: PathBuf },
}
