use std::sync::Arc;

use anyhow::Context;

use sender_inbox::api::inbox_routes;
use sender_inbox::auth::{AuthSession, TokenProvider};
use sender_inbox::config::{GmailConfig, InboxConfig, RenderConfig, ServerConfig};
use sender_inbox::gmail::{GmailClient, MailApi};
use sender_inbox::render::{PassthroughRenderer, Renderer, WebDriverRenderer};
use sender_inbox::service::InboxService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; real environment variables still apply.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let server_config = ServerConfig::from_env();
    let gmail_config = GmailConfig::from_env();
    let inbox_config = InboxConfig::from_env();
    let render_config = RenderConfig::from_env();

    eprintln!("📬 Sender Inbox v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Token file: {}", gmail_config.token_path.display());
    eprintln!(
        "   Scan window: {} messages, {} per sender",
        inbox_config.scan_window, inbox_config.per_sender
    );

    // ── Auth ─────────────────────────────────────────────────────────────
    let session = AuthSession::new(gmail_config.token_path.clone());
    match session.is_valid().await {
        Ok(true) => tracing::info!("OAuth token loaded"),
        Ok(false) => tracing::info!("OAuth token expired, will refresh on first request"),
        Err(e) => tracing::warn!(error = %e, "OAuth token not usable yet"),
    }
    let tokens: Arc<dyn TokenProvider> = Arc::new(session);

    // ── Collaborators ────────────────────────────────────────────────────
    let api: Arc<dyn MailApi> = Arc::new(GmailClient::new(&gmail_config, tokens));
    let renderer: Arc<dyn Renderer> = match &render_config.webdriver_url {
        Some(url) => {
            eprintln!("   Renderer: WebDriver at {url}");
            Arc::new(WebDriverRenderer::new(url.clone(), &render_config))
        }
        None => {
            eprintln!("   Renderer: passthrough (set WEBDRIVER_URL to enable)");
            Arc::new(PassthroughRenderer)
        }
    };

    let service = Arc::new(InboxService::new(api, renderer, inbox_config));
    let app = inbox_routes(service);

    let addr = server_config
        .socket_addr()
        .context("invalid listen address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    eprintln!("   API: http://{addr}\n");
    tracing::info!(%addr, "Sender inbox server started");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
