//! oxide-stmt CLI
//!
//! Reads `Resource` and `Table` descriptors from JSON files, prints the
//! generated MySQL statements or runs them through the MySQL backend.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use oxide_stmt_core::{
    CreateMode, Engine, Resource, SchemaBuilder, SchemaOperation, SqlValue, Statement,
    StatementBuilder, Table, TracingQueryLog,
};
use oxide_stmt_mysql::{ConnectionConfig, MySqlBackend};

/// Parameterized MySQL statements from JSON descriptors.
#[derive(Debug, Parser)]
#[command(name = "oxide-stmt")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// JSON file holding the whole connection configuration.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Server host.
    #[arg(long, env = "MYSQL_HOST")]
    pub host: Option<String>,

    /// Server port.
    #[arg(long, env = "MYSQL_PORT")]
    pub port: Option<u16>,

    /// Default database.
    #[arg(short, long, env = "MYSQL_DATABASE")]
    pub database: Option<String>,

    /// User name.
    #[arg(short, long, env = "MYSQL_USER")]
    pub user: Option<String>,

    /// Password.
    #[arg(long, env = "MYSQL_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Connect timeout in seconds.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Log every executed statement with its values inline.
    #[arg(long)]
    pub log_queries: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build a SELECT (or DELETE) from a resource descriptor.
    Select {
        /// Resource descriptor file.
        resource: PathBuf,

        /// Build a DELETE instead of a SELECT.
        #[arg(long)]
        delete: bool,

        /// Run the statement and print the rows as JSON lines.
        #[arg(short, long)]
        execute: bool,
    },

    /// Create a table from a table descriptor.
    Create {
        /// Table descriptor file.
        table: PathBuf,

        /// Use CREATE TABLE IF NOT EXISTS.
        #[arg(long, conflicts_with = "drop_if_exists")]
        if_not_exists: bool,

        /// Drop the table first if it exists.
        #[arg(long)]
        drop_if_exists: bool,

        /// Show SQL without executing (dry run).
        #[arg(long)]
        dry_run: bool,
    },

    /// Apply the pending drops, changes and additions of a table descriptor.
    Alter {
        /// Table descriptor file.
        table: PathBuf,

        /// Show SQL without executing (dry run).
        #[arg(long)]
        dry_run: bool,
    },

    /// Create an index on a table.
    Index {
        /// Table descriptor file.
        table: PathBuf,

        /// Index name.
        #[arg(short, long)]
        name: String,

        /// Comma-separated columns, e.g. `email,name(10)`.
        #[arg(long)]
        columns: String,

        /// Create a UNIQUE index.
        #[arg(long)]
        unique: bool,

        /// Show SQL without executing (dry run).
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the current columns of a table as JSON.
    Describe {
        /// Table name.
        table: String,
    },
}

impl Cli {
    /// Connection settings: the `--config` file (or defaults) overridden
    /// by individual flags.
    pub fn connection_config(&self) -> anyhow::Result<ConnectionConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ConnectionConfig::default(),
        };
        if let Some(host) = &self.host {
            config.host.clone_from(host);
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(database) = &self.database {
            config.database.clone_from(database);
        }
        if let Some(user) = &self.user {
            config.user.clone_from(user);
        }
        if let Some(password) = &self.password {
            config.password.clone_from(password);
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        if self.log_queries {
            config.log_queries = true;
        }
        Ok(config)
    }
}

/// Reads a connection configuration file.
pub fn load_config(path: &Path) -> anyhow::Result<ConnectionConfig> {
    load_json(path, "connection config")
}

/// Reads a resource descriptor file.
pub fn load_resource(path: &Path) -> anyhow::Result<Resource> {
    load_json(path, "resource descriptor")
}

/// Reads a table descriptor file.
pub fn load_table(path: &Path) -> anyhow::Result<Table> {
    load_json(path, "table descriptor")
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> anyhow::Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {what} {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid {what} {}", path.display()))
}

/// A statement as printed by dry runs.
#[derive(Debug, Serialize)]
pub struct PrintedStatement<'a> {
    /// SQL text with `?` placeholders.
    pub sql: &'a str,
    /// Values bound to the placeholders, in order.
    pub binds: &'a [SqlValue],
}

/// Writes each statement as one JSON line.
pub fn print_statements(out: &mut impl Write, statements: &[Statement]) -> anyhow::Result<()> {
    for statement in statements {
        let printed = PrintedStatement {
            sql: &statement.sql,
            binds: statement.binds.values(),
        };
        writeln!(out, "{}", serde_json::to_string(&printed)?)?;
    }
    Ok(())
}

/// Maps the create flags to a [`CreateMode`].
#[must_use]
pub const fn create_mode(if_not_exists: bool, drop_if_exists: bool) -> CreateMode {
    if drop_if_exists {
        CreateMode::DropIfExists
    } else if if_not_exists {
        CreateMode::IfNotExists
    } else {
        CreateMode::Plain
    }
}

/// Runs a parsed command line, writing results to `out`.
pub fn run(cli: &Cli, out: &mut impl Write) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Select {
            resource,
            delete,
            execute,
        } => {
            let resource = load_resource(resource)?;
            let statement = StatementBuilder.build(&resource, *delete)?;
            if !*execute {
                return print_statements(out, &[statement]);
            }
            let mut engine = connect(cli)?;
            let rows = engine.stage(statement).execute()?;
            for row in &rows {
                writeln!(out, "{}", serde_json::to_string(row)?)?;
            }
            info!(rows = rows.len(), "statement executed");
        }

        Commands::Create {
            table,
            if_not_exists,
            drop_if_exists,
            dry_run,
        } => {
            let mut table = load_table(table)?;
            let operation = SchemaOperation::CreateTable {
                mode: create_mode(*if_not_exists, *drop_if_exists),
            };
            if *dry_run {
                info!("Dry run mode - SQL will be printed but not executed.");
                let statements = SchemaBuilder.statements(&operation, &mut table, &[])?;
                return print_statements(out, &statements);
            }
            connect(cli)?.apply(&operation, &mut table)?;
            info!(table = %table.name(), "table created");
        }

        Commands::Alter { table, dry_run } => {
            let mut table = load_table(table)?;
            plan_or_apply(cli, out, &SchemaOperation::AlterTable, &mut table, *dry_run)?;
        }

        Commands::Index {
            table,
            name,
            columns,
            unique,
            dry_run,
        } => {
            let mut table = load_table(table)?;
            let operation = SchemaOperation::AddIndex {
                name: name.clone(),
                columns: columns.clone(),
                unique: *unique,
            };
            plan_or_apply(cli, out, &operation, &mut table, *dry_run)?;
        }

        Commands::Describe { table } => {
            let columns = connect(cli)?.describe_columns(table)?;
            if columns.is_empty() {
                info!(table = %table, "table has no columns or does not exist");
            }
            writeln!(out, "{}", serde_json::to_string_pretty(&columns)?)?;
        }
    }

    Ok(())
}

/// Introspects, then prints (dry run) or executes the operation.
fn plan_or_apply(
    cli: &Cli,
    out: &mut impl Write,
    operation: &SchemaOperation,
    table: &mut Table,
    dry_run: bool,
) -> anyhow::Result<()> {
    let mut engine = connect(cli)?;
    if dry_run {
        info!("Dry run mode - SQL will be printed but not executed.");
        let statements = engine.plan(operation, table)?;
        return print_statements(out, &statements);
    }
    engine.apply(operation, table)?;
    info!(table = %table.name(), "schema updated");
    Ok(())
}

fn connect(cli: &Cli) -> anyhow::Result<Engine<MySqlBackend>> {
    let config = cli.connection_config()?;
    let backend = MySqlBackend::connect(&config)
        .with_context(|| format!("cannot connect to {}", config.address()))?;
    let engine = Engine::new(backend);
    Ok(if config.log_queries {
        engine.with_query_log(TracingQueryLog)
    } else {
        engine
    })
}
