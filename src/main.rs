use std::sync::Arc;

use snipfeed::config::Config;
use snipfeed::notice::LogNotices;
use snipfeed::session::Session;
use snipfeed::{FeedList, Gateway, ViewContext};
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is only read in debug builds
    if cfg!(debug_assertions) {
        let _ = dotenv::dotenv();
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    info!("Bootstrapping snipfeed");
    let cfg = Config::from_env()?;
    let viewer = resolve_viewer(&cfg);
    let gateway = build_gateway(&cfg, viewer.as_ref())?;

    let ctx = ViewContext::new(gateway, Arc::new(LogNotices))
        .with_viewer(viewer)
        .with_avatar_base_url(cfg.avatar_base_url.clone());
    let mut feed = FeedList::new(ctx).with_page_size(cfg.page_size);
    feed.set_filter(cfg.feed_language.clone()).await?;

    let options: Vec<String> = feed.filter_options().iter().map(|f| f.to_string()).collect();
    println!("filter: {} (options: {})", feed.filter(), options.join(", "));
    for card in feed.posts() {
        let state = card.engagement.state();
        println!();
        println!("{} [{}] by {} - {}", card.title, card.language, card.author, card.timestamp());
        println!("--- initial ---\n{}", card.initial_code);
        println!("--- optimized ---\n{}", card.optimized_code);
        println!("likes: {}{}  comments: {}", state.count, if state.liked { " (liked)" } else { "" }, card.comment_count());
    }
    Ok(())
}

/// Signed-in viewer from the configured access token, if it validates.
fn resolve_viewer(cfg: &Config) -> Option<Session> {
    let token = cfg.access_token.as_deref()?;
    let Some(secret) = cfg.jwt_secret.as_deref() else {
        warn!("GATEWAY_ACCESS_TOKEN set without GATEWAY_JWT_SECRET; continuing anonymously");
        return None;
    };
    match Session::from_access_token(token, secret, &cfg.jwt_audience) {
        Ok(s) => {
            info!(user_id = %s.user_id, "signed in");
            Some(s)
        }
        Err(e) => {
            warn!("ignoring access token: {e}");
            None
        }
    }
}

fn build_gateway(cfg: &Config, viewer: Option<&Session>) -> anyhow::Result<Arc<dyn Gateway>> {
    match hosted_gateway(cfg, viewer) {
        Some(gw) => Ok(gw),
        None => fallback_gateway(),
    }
}

#[cfg(feature = "rest-gateway")]
fn hosted_gateway(cfg: &Config, viewer: Option<&Session>) -> Option<Arc<dyn Gateway>> {
    let rest = snipfeed::rest::RestGateway::from_config(cfg)?;
    info!("Using hosted store gateway");
    let rest = match viewer {
        Some(s) => rest.with_session(s),
        None => rest,
    };
    let gw: Arc<dyn Gateway> = Arc::new(rest);
    Some(gw)
}

#[cfg(not(feature = "rest-gateway"))]
fn hosted_gateway(_cfg: &Config, _viewer: Option<&Session>) -> Option<Arc<dyn Gateway>> {
    None
}

#[cfg(feature = "inmem-gateway")]
fn fallback_gateway() -> anyhow::Result<Arc<dyn Gateway>> {
    info!("Using in-memory gateway with sample posts");
    Ok(Arc::new(snipfeed::gateway::inmem::InMemGateway::with_sample_posts()))
}

#[cfg(not(feature = "inmem-gateway"))]
fn fallback_gateway() -> anyhow::Result<Arc<dyn Gateway>> {
    anyhow::bail!("GATEWAY_URL and GATEWAY_ANON_KEY must be set (no in-memory gateway compiled in)")
}
