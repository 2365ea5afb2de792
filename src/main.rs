mod assemble;
mod catalog;
mod cli;
mod codegen;
mod error;
mod order;
mod schema;
#[cfg(test)]
mod testutil;
mod typemap;

use std::fs;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::catalog::pg::PgSource;
use crate::catalog::remote::RemoteSource;
use crate::catalog::Catalog;
use crate::cli::{Cli, ConnectionConfig};
use crate::codegen::dump::SqlDumpGenerator;
use crate::codegen::metadata::MetadataGenerator;
use crate::codegen::Generator;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = cli.parse_connection()?;
    let options = cli.dump_options();

    tracing::debug!(namespace = %options.namespace, "Connecting to catalog...");

    let snapshot = match config {
        ConnectionConfig::Postgres(url) => {
            let pool = catalog::pg::connect(&url, options.query_timeout).await?;
            let catalog = Catalog::new(PgSource::new(pool.clone(), &url), &options);
            tracing::debug!("Reading catalog...");
            let s = assemble::extract(&catalog, &options).await;
            pool.close().await;
            s?
        }
        ConnectionConfig::Remote {
            project_url,
            api_key,
            service_key,
        } => {
            let source = RemoteSource::new(
                &project_url,
                &api_key,
                service_key.as_deref(),
                options.query_timeout,
            )?;
            let catalog = Catalog::new(source, &options);
            tracing::debug!("Reading catalog...");
            assemble::extract(&catalog, &options).await?
        }
    };

    if let Err(e) = snapshot.ensure_populated() {
        tracing::warn!("{e}");
    }

    // Built fully in memory so a failed run never leaves a partial script.
    let output = SqlDumpGenerator.generate(&snapshot)?;

    match cli.outfile {
        Some(ref path) => {
            fs::write(path, &output)?;
            tracing::info!("Output written to {path}");
        }
        None => {
            print!("{output}");
        }
    }

    if let Some(ref path) = cli.metadata {
        let summary = MetadataGenerator.generate(&snapshot)?;
        fs::write(path, summary)?;
        tracing::info!("Metadata written to {path}");
    }

    Ok(())
}
