//! sitechat - website chat widget backend
//!
//! Summarizes a site's content when a visitor opens the widget and answers
//! their questions about it through a configured LLM provider.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod conversation;
mod flows;
mod knowledge;
mod providers;
mod routes;
mod widget;

use config::{Config, PromptManager, SiteConfig};
use flows::{Flows, ProviderExecutor};
use knowledge::{KnowledgeBase, SiteContent};
use providers::Provider;
use widget::WidgetService;

/// How often idle sessions are swept
const EVICTION_INTERVAL: Duration = Duration::from_secs(60);

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub site_name: Arc<str>,
    pub widget: Arc<WidgetService>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sitechat=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let site = SiteConfig::load_or_default(&config.site_config_path)?;
    let site_content = SiteContent::new(site.site_content()?);

    let mut prompts = PromptManager::new(site.prompts.dir.clone());
    let overrides = prompts.load_overrides().await?;

    let provider = Provider::from_llm_config(&site.llm, &config)?;
    tracing::info!(
        "🤖 Using {} provider with model {} ({} prompt override(s))",
        provider.name(),
        site.llm.model,
        overrides
    );

    let knowledge = KnowledgeBase::new(site.knowledge.path.clone());
    if !knowledge.path().exists() {
        tracing::warn!(
            "Knowledge file {} does not exist yet; answers will fail until it does",
            knowledge.path().display()
        );
    }

    let executor = ProviderExecutor::new(provider, site.llm.model.clone(), prompts);
    let flows = Flows::new(Arc::new(executor), knowledge);

    let widget = Arc::new(WidgetService::new(
        flows,
        site_content,
        config.session_idle_timeout(),
    ));

    let reaper = Arc::clone(&widget);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(EVICTION_INTERVAL);
        loop {
            interval.tick().await;
            reaper.evict_idle().await;
        }
    });

    let state = AppState {
        site_name: Arc::from(site.site.name.as_str()),
        widget,
    };

    let app = Router::new()
        .merge(routes::router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!("💬 {} chat widget API running at http://{}", site.site.name, addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
