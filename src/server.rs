//! MCP server initialization for stdio and Streamable HTTP transports.

use crate::brain::CompanionServices;
use crate::config::EchoConfig;
use crate::tools::{CompanionMap, EchoTools};
use anyhow::Result;
use rmcp::ServiceExt;

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: EchoConfig) -> Result<()> {
    tracing::info!("starting EchoSoul MCP server on stdio");

    let services = CompanionServices::from_config(config)?;
    let tools = EchoTools::new(services);
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running, waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");

    Ok(())
}

/// Start the MCP server over Streamable HTTP, mounted at `/mcp`.
pub async fn serve_http(config: EchoConfig) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!(addr = %bind_addr, "starting EchoSoul MCP server on HTTP");

    let services = CompanionServices::from_config(config)?;
    // Sessions come and go; companions (and their chat history) outlive them.
    let companions = CompanionMap::default();

    let service = rmcp::transport::streamable_http_server::StreamableHttpService::new(
        move || Ok(EchoTools::with_companions(services.clone(), companions.clone())),
        rmcp::transport::streamable_http_server::session::local::LocalSessionManager::default()
            .into(),
        Default::default(),
    );

    let router = axum::Router::new().nest_service("/mcp", service);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "MCP server listening at http://{bind_addr}/mcp");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
            tracing::info!("shutting down HTTP server");
        })
        .await?;

    Ok(())
}
