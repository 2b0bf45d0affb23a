//! Offshoot CLI - a minimal git client.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

/// Offshoot - minimal content-addressed version control
#[derive(Parser, Debug)]
#[command(name = "offshoot")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Initialize a new repository
    Init {
        /// Path to initialize (default: current directory)
        path: Option<String>,
    },

    /// Clone a remote repository over HTTP
    Clone {
        /// Repository URL
        url: String,
        /// Destination directory (default: derived from the URL)
        dir: Option<String>,
    },

    /// Print the content of an object
    CatFile {
        /// Pretty-print the object content
        #[arg(short = 'p')]
        pretty: bool,
        /// Object identity (40-hex)
        id: String,
    },

    /// Compute the blob identity of a file
    HashObject {
        /// Also write the blob into the object store
        #[arg(short = 'w')]
        write: bool,
        /// File to hash
        file: String,
    },

    /// List the entries of a tree object
    LsTree {
        /// Print entry names only
        #[arg(long)]
        name_only: bool,
        /// Tree identity (40-hex)
        id: String,
    },

    /// Snapshot the working directory into tree objects
    WriteTree,

    /// Create a commit object for a tree
    CommitTree {
        /// Tree identity (40-hex)
        tree: String,
        /// Parent commit identity
        #[arg(short = 'p')]
        parent: Option<String>,
        /// Commit message
        #[arg(short = 'm')]
        message: String,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("offshoot={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match cli.command {
        Commands::Init { path } => commands::init(path.as_deref()),
        Commands::Clone { url, dir } => commands::clone(&url, dir.as_deref()),
        Commands::CatFile { pretty, id } => commands::cat_file(pretty, &id),
        Commands::HashObject { write, file } => commands::hash_object(write, &file),
        Commands::LsTree { name_only, id } => commands::ls_tree(name_only, &id),
        Commands::WriteTree => commands::write_tree(),
        Commands::CommitTree {
            tree,
            parent,
            message,
        } => commands::commit_tree(&tree, parent.as_deref(), &message),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
