use anyhow::{Context, Result};
use clap::Parser;
use mdpress_config::Config;
use mdpress_server::AppState;
use pdf_export::Exporter;
use std::sync::Arc;

/// Serves the HTTP API until SIGINT/SIGTERM.
#[derive(Parser, Debug, Clone)]
pub struct Serve {
    /// Interface to bind, overrides the config.
    #[clap(long)]
    host: Option<String>,

    /// Port to listen on, overrides the config and `PORT`.
    #[clap(long)]
    port: Option<u16>,
}

impl Serve {
    pub async fn run(&self, config: &Config) -> Result<()> {
        let host = self.host.as_deref().unwrap_or(&config.server.host);
        let port = self.port.unwrap_or_else(|| config.server.port());

        let listener = tokio::net::TcpListener::bind((host, port))
            .await
            .with_context(|| format!("failed to bind {host}:{port}"))?;

        println!("mdpress server running on http://{}", listener.local_addr()?);

        let exporter = Arc::new(Exporter::with_chrome(config));

        mdpress_server::run(listener, AppState::new(exporter), config.server.body_limit_bytes)
            .await?;

        Ok(())
    }
}
