use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use finance_storage::prelude::*;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(author, version, about = "Run one statement against the finance store")]
struct Args {
    /// Statement to run, written with `$N` placeholders.
    sql: String,
    /// Force an engine instead of reading `USE_SQLITE` and the postgres settings.
    #[arg(long, value_enum)]
    dialect: Option<Dialect>,
    #[arg(long)]
    sqlite_path: Option<PathBuf>,
    #[arg(long)]
    database_url: Option<String>,
    /// One JSON value per placeholder, in order. Repeatable.
    #[arg(long = "param", value_parser = parse_json)]
    params: Vec<serde_json::Value>,
    #[arg(long, short)]
    verbose: bool,
}

fn parse_json(raw: &str) -> Result<serde_json::Value, String> {
    // bare words are taken as strings so `--param amex` works without quoting
    Ok(serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_owned())))
}

impl Args {
    fn config(&self) -> Result<StorageConfig, StorageError> {
        let mut config = StorageConfig::from_env()?;
        if let Some(dialect) = self.dialect {
            config.use_sqlite = Some(dialect == Dialect::Sqlite);
        }
        if let Some(path) = &self.sqlite_path {
            config.sqlite_path = Some(path.clone());
        }
        if let Some(url) = &self.database_url {
            config.postgres.url = Some(url.clone());
        }
        Ok(config)
    }
}

async fn run(args: Args) -> Result<String, StorageError> {
    let config = args.config()?;
    let pool = StoragePool::connect(&config).await?;
    let params = Params::Positional(args.params.into_iter().map(RowValues::from_json).collect());
    let outcome = pool.query(&args.sql, params).await;
    pool.close().await?;
    let result = outcome?;
    serde_json::to_string_pretty(&result)
        .map_err(|e| StorageError::ExecutionError(format!("cannot render result: {e}")))
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    match run(args).await {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
