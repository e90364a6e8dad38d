//! norm-inspect CLI
//!
//! Read-only inspection of a database reachable through norm.

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use norm::{ConnectionBuilder, ConnectionConfig, Dialect, LiveColumn, SqlPayload};

/// Inspect databases through norm's connection layer.
#[derive(Parser)]
#[command(name = "norm-inspect")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON connection file. Overrides the individual options.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dialect: sqlite or mysql.
    #[arg(long, env = "NORM_DIALECT", default_value = "sqlite", value_parser = parse_dialect)]
    dialect: Dialect,

    /// SQLite data source (file path or :memory:).
    #[arg(long, env = "NORM_DATA_SOURCE")]
    data_source: Option<String>,

    /// MySQL server host.
    #[arg(long, env = "NORM_HOST")]
    host: Option<String>,

    /// MySQL user.
    #[arg(long, env = "NORM_USER")]
    user: Option<String>,

    /// MySQL password.
    #[arg(long, env = "NORM_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// MySQL database.
    #[arg(long, env = "NORM_DATABASE")]
    database: Option<String>,

    /// MySQL port.
    #[arg(long, env = "NORM_PORT")]
    port: Option<u16>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open and close a connection.
    Ping,

    /// List the live columns of a table.
    Columns {
        /// Table name.
        table: String,
    },
}

fn parse_dialect(value: &str) -> Result<Dialect, String> {
    match value.to_ascii_lowercase().as_str() {
        "sqlite" => Ok(Dialect::Sqlite),
        "mysql" => Ok(Dialect::MySql),
        other => Err(format!("unknown dialect '{other}' (expected sqlite or mysql)")),
    }
}

impl Cli {
    fn builder(&self) -> anyhow::Result<ConnectionBuilder> {
        if let Some(path) = &self.config {
            let config = ConnectionConfig::from_file(path)
                .with_context(|| format!("reading {}", path.display()))?;
            return Ok(config.into_builder()?);
        }

        let mut builder = ConnectionBuilder::new(self.dialect);
        match self.dialect {
            Dialect::Sqlite => {
                let Some(data_source) = &self.data_source else {
                    bail!("sqlite needs --data-source or NORM_DATA_SOURCE");
                };
                builder = builder.data_source(data_source)?;
            }
            Dialect::MySql => {
                if let Some(host) = &self.host {
                    builder = builder.hostname(host)?;
                }
                if let Some(user) = &self.user {
                    builder = builder.username(user)?;
                }
                if let Some(password) = &self.password {
                    builder = builder.password(password)?;
                }
                if let Some(database) = &self.database {
                    builder = builder.database(database)?;
                }
                if let Some(port) = self.port {
                    builder = builder.port(port)?;
                }
            }
        }
        Ok(builder)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let connection = cli.builder()?.build_and_connect()?;
    let dialect = connection.dialect();

    match &cli.command {
        Commands::Ping => {
            info!(%dialect, "Connection opened");
        }

        Commands::Columns { table } => {
            let payload =
                SqlPayload::new(dialect, table.as_str(), dialect.table_info_query(table));
            let columns = LiveColumn::from_rows(&connection.query(&payload)?);
            if columns.is_empty() {
                info!(table = %table, "No such table, or it has no columns");
            }
            for column in columns {
                println!("{}\t{}", column.name, column.sql_type);
            }
        }
    }

    connection.close()?;
    Ok(())
}
