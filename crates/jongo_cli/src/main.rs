//! Jongo CLI
//!
//! Command-line client for tables exposed by a Jongo REST server.
//!
//! # Commands
//!
//! - `list` - List a page of rows, optionally sorted or through a dynamic finder
//! - `get` - Read one row by identity
//! - `create` - Insert a row
//! - `update` - Update fields of a row
//! - `delete` - Delete a row
//! - `query` - Run a named query
//! - `count` - Count the rows of a table

mod commands;
mod error;

use clap::{Parser, Subcommand};
use commands::{Connection, OutputFormat};
use jongo_client::Direction;
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

/// Command-line client for Jongo REST servers.
#[derive(Parser)]
#[command(name = "jongo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Server address, e.g. localhost:8080
    #[arg(global = true, short, long, default_value = "localhost:8080")]
    server: String,

    /// Path prefix the server is mounted under, e.g. /jongo
    #[arg(global = true, long, default_value = "")]
    root: String,

    /// Database alias
    #[arg(global = true, short, long, default_value = "demo")]
    database: String,

    /// Table name
    #[arg(global = true, short, long)]
    table: Option<String>,

    /// Identity column of the table
    #[arg(global = true, long, default_value = "id")]
    id_column: String,

    /// Comma separated columns to read; every column when omitted
    #[arg(global = true, long, value_delimiter = ',')]
    fields: Vec<String>,

    /// Request timeout in seconds (0 disables it)
    #[arg(global = true, long, default_value = "30")]
    timeout: u64,

    /// Output format
    #[arg(global = true, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List a page of rows
    List {
        /// Page index, starting at 0
        #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
        page: i64,

        /// Rows per page
        #[arg(long, default_value = "25")]
        size: u32,

        /// Column to sort by
        #[arg(long)]
        sort: Option<String>,

        /// Sort direction (asc, desc)
        #[arg(long, default_value = "asc")]
        dir: Direction,

        /// Dynamic finder, e.g. findAllByAgeGreaterThan
        #[arg(long)]
        finder: Option<String>,

        /// Finder argument (repeatable)
        #[arg(long = "arg")]
        args: Vec<String>,
    },

    /// Read one row by identity
    Get {
        /// Identity of the row
        id: String,
    },

    /// Insert a row
    Create {
        /// Assignments as column=value
        #[arg(required = true)]
        assignments: Vec<String>,
    },

    /// Update fields of a row
    Update {
        /// Identity of the row
        id: String,

        /// Assignments as column=value
        #[arg(required = true)]
        assignments: Vec<String>,
    },

    /// Delete a row
    Delete {
        /// Identity of the row
        id: String,
    },

    /// Run a named query
    Query {
        /// Query name
        name: String,

        /// Positional arguments
        args: Vec<String>,
    },

    /// Count the rows of a table
    Count,

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let connection = Connection {
        server: cli.server,
        root: cli.root,
        database: cli.database,
        table: cli.table,
        id_column: cli.id_column,
        fields: cli.fields,
        timeout: cli.timeout,
    };
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let format = cli.format;

    match cli.command {
        Commands::List {
            page,
            size,
            sort,
            dir,
            finder,
            args,
        } => {
            let proxy = connection.proxy()?;
            let options = commands::list::ListOptions {
                page,
                size,
                sort: sort.map(|column| (column, dir)),
                finder,
                args,
            };
            commands::list::run(&proxy, &options, format, &mut out)?;
        }
        Commands::Get { id } => {
            let proxy = connection.proxy()?;
            commands::get::run(&proxy, &id, format, &mut out)?;
        }
        Commands::Create { assignments } => {
            let proxy = connection.proxy()?;
            commands::write::create(&proxy, &assignments, &mut out)?;
        }
        Commands::Update { id, assignments } => {
            let proxy = connection.proxy()?;
            commands::write::update(&proxy, &id, &assignments, &mut out)?;
        }
        Commands::Delete { id } => {
            let proxy = connection.proxy()?;
            commands::write::delete(&proxy, &id, &mut out)?;
        }
        Commands::Query { name, args } => {
            let proxy = connection.proxy()?;
            commands::query::run(&proxy, &name, &args, format, &mut out)?;
        }
        Commands::Count => {
            let proxy = connection.proxy()?;
            commands::count::run(&proxy, format, &mut out)?;
        }
        Commands::Version => {
            writeln!(out, "Jongo CLI v{}", env!("CARGO_PKG_VERSION"))?;
        }
    }

    Ok(())
}
