mod config;
mod jira;
mod server;
mod tools;
mod tracker;

use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use rmcp::{
    ServiceExt,
    transport::stdio,
    transport::streamable_http_server::{
        StreamableHttpService, session::local::LocalSessionManager,
    },
};
use tracing_subscriber::EnvFilter;

use config::Config;
use jira::JiraClient;
use server::JiraServer;
use tools::IssueToolAdapter;
use tracker::IssueTracker;

/// Only path served by the HTTP transport.
const MCP_PATH: &str = "/mcp";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Transport {
    /// Newline-delimited JSON-RPC over stdin/stdout
    Stdio,
    /// Streamable HTTP
    #[value(alias = "sse")]
    Http,
}

#[derive(Debug, Parser)]
#[command(version, about = "MCP server for creating and updating Jira issues")]
struct Cli {
    /// Transport used to serve the tools
    #[arg(long, value_enum, default_value_t = Transport::Stdio)]
    transport: Transport,

    /// Port for the HTTP transport
    #[arg(long, default_value_t = 3001)]
    port: u16,

    /// Address the HTTP transport binds to
    #[arg(long, default_value = "0.0.0.0")]
    host: IpAddr,

    /// Sets the level of verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout carries the stdio protocol, so logs go to stderr.
    let level = match cli.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    tracing::info!("Starting Jira MCP server with config:");
    tracing::info!("  Base URL: {}", config.base_url);
    tracing::info!("  Username: {}", config.username);
    tracing::info!("  Project Key: {}", config.project_key);
    tracing::info!("  API Token: {}", config.masked_token());

    let jira = JiraClient::new(&config.base_url, &config.username, &config.api_token);

    tracing::info!("Testing Jira connection...");
    let me = jira
        .myself()
        .await
        .context("Failed to authenticate with Jira")?;
    tracing::info!(
        "Connected to Jira as: {} ({})",
        me.display_name,
        me.email_address.as_deref().unwrap_or("no email")
    );

    let adapter = IssueToolAdapter::new(Arc::new(jira), &config.base_url, &config.project_key);
    let server = JiraServer::new(adapter);

    match cli.transport {
        Transport::Stdio => {
            tracing::info!("Starting MCP server with stdio transport");
            let service = server.serve(stdio()).await?;
            service.waiting().await?;
        }
        Transport::Http => {
            let addr = SocketAddr::new(cli.host, cli.port);
            serve_http(server, addr).await?;
        }
    }

    Ok(())
}

fn http_router(server: JiraServer) -> axum::Router {
    let service = StreamableHttpService::new(
        move || Ok(server.clone()),
        LocalSessionManager::default().into(),
        Default::default(),
    );
    axum::Router::new().route_service(MCP_PATH, service)
}

async fn serve_http(server: JiraServer, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind HTTP transport to {}", addr))?;

    tracing::info!(
        "Starting MCP server with HTTP transport on http://{}{}",
        addr,
        MCP_PATH
    );

    axum::serve(listener, http_router(server))
        .with_graceful_shutdown(shutdown_signal(tokio::signal::ctrl_c()))
        .await?;

    Ok(())
}

/// Resolves once the signal fires. If the handler cannot be installed the
/// server keeps running instead of shutting down immediately.
async fn shutdown_signal<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => tracing::info!("Shutting down HTTP transport"),
        Err(e) => {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
