use clap::{Parser, Subcommand};

use rust_assignment_store::models::Bucket;

#[derive(Parser, Debug)]
#[command(name = "assignments")]
#[command(about = "Manage pending and completed assignments for a user", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Act as this user instead of the configured identity
    #[arg(short, long, global = true)]
    pub user: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List pending assignments, earliest due date first
    #[command(alias = "ls")]
    List,

    /// List completed assignments
    Completed,

    /// Mark a pending assignment complete
    Complete {
        /// Assignment ID
        id: String,
    },

    /// Delete an assignment
    #[command(alias = "rm")]
    Delete {
        /// Assignment ID
        id: String,

        /// Bucket to delete from
        #[arg(short, long, default_value = "current")]
        bucket: Bucket,
    },

    /// Remove pending copies of assignments that are already completed
    Reconcile,

    /// Add a pending assignment directly to the backend
    Add {
        /// Course label
        #[arg(short, long)]
        course: String,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: String,

        /// Free-text details
        #[arg(short, long, default_value = "")]
        details: String,
    },
}
