use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use once_cell::sync::OnceCell;
use salvo::prelude::*;
use tracing::info;

use crate::bot::BotCore;
use crate::config::Config;
use crate::db::DatabaseManager;
use crate::slack::EnvelopeDecoder;
use crate::tokenizer::DictionaryCache;

pub mod handlers;
pub mod metrics;
pub mod router;

use self::router::create_router;

#[derive(Clone)]
pub struct WebState {
    pub db_manager: Arc<DatabaseManager>,
    pub bot: Arc<BotCore>,
    pub decoder: Arc<EnvelopeDecoder>,
    pub dictionary: Arc<DictionaryCache>,
    pub request_timeout: Duration,
    pub started_at: Instant,
}

static WEB_STATE: OnceCell<WebState> = OnceCell::new();

pub fn web_state() -> &'static WebState {
    WEB_STATE
        .get()
        .expect("web state is not initialized before handler execution")
}

#[derive(Clone)]
pub struct WebServer {
    config: Arc<Config>,
}

impl WebServer {
    pub fn new(
        config: Arc<Config>,
        db_manager: Arc<DatabaseManager>,
        bot: Arc<BotCore>,
        decoder: Arc<EnvelopeDecoder>,
        dictionary: Arc<DictionaryCache>,
    ) -> Self {
        metrics::Metrics::start();
        let _ = WEB_STATE.set(WebState {
            db_manager,
            bot,
            decoder,
            dictionary,
            request_timeout: Duration::from_secs(config.server.request_timeout_secs),
            started_at: Instant::now(),
        });

        Self { config }
    }

    pub async fn start(&self) -> Result<()> {
        let bind_addr = format!(
            "{}:{}",
            self.config.server.bind_address, self.config.server.port
        );
        info!("starting web server on {}", bind_addr);

        let acceptor = TcpListener::new(bind_addr).bind().await;
        Server::new(acceptor)
            .serve(create_router(self.config.metrics.enabled))
            .await;

        Ok(())
    }
}
