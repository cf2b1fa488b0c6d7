#![forbid(unsafe_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use secrecy::SecretString;
use tracing::{error, info};

mod bot;
mod cli;
mod config;
mod db;
mod parsers;
mod slack;
mod tokenizer;
mod utils;
mod web;

use bot::{
    AnswerResolver, BotCore, BotIdentity, EventDeduplicator, ReplyBuilder, SynonymResolver,
};
use cli::{Cli, Command};
use config::Config;
use db::DatabaseManager;
use slack::{EnvelopeDecoder, SlackClient};
use tokenizer::{DictionaryCache, LinderaAnalyzer, Tokenizer};
use web::WebServer;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Arc::new(
        Config::load_from_file(&cli.config)
            .with_context(|| format!("failed to load {}", cli.config.display()))?,
    );
    utils::logging::init_tracing(&config.logging);

    let db_manager = Arc::new(DatabaseManager::new(&config.database).await?);

    match cli.command() {
        Command::Migrate => {
            db_manager.migrate().await?;
            info!("migrations applied");
            Ok(())
        }
        Command::Ask { text, requester } => {
            let (replies, _) = build_replies(&config, &db_manager)?;
            println!("{}", replies.build_reply(requester, text).await);
            Ok(())
        }
        Command::Serve => serve(config, db_manager).await,
    }
}

fn build_replies(
    config: &Config,
    db_manager: &DatabaseManager,
) -> Result<(ReplyBuilder, Arc<DictionaryCache>)> {
    let analyzer = LinderaAnalyzer::new().context("failed to build morphological analyzer")?;
    let dictionary = Arc::new(DictionaryCache::new(tokenizer::source::from_config(
        &config.dictionary,
    )));
    let extractor = Tokenizer::new(Arc::new(analyzer), dictionary.clone());

    let replies = ReplyBuilder::new(
        Arc::new(extractor),
        SynonymResolver::new(db_manager.synonym_store()),
        AnswerResolver::new(db_manager.answer_store()),
    );
    Ok((replies, dictionary))
}

async fn serve(config: Arc<Config>, db_manager: Arc<DatabaseManager>) -> Result<()> {
    config.validate_slack()?;
    info!("slack faq bot starting up");
    db_manager.migrate().await?;

    let (replies, dictionary) = build_replies(&config, &db_manager)?;
    let terms = dictionary.get().await.len();
    info!("supplemental dictionary ready terms={}", terms);

    let slack = Arc::new(SlackClient::new(
        &config.slack.api_base_url,
        SecretString::from(config.slack.bot_token.clone()),
    ));
    let decoder = Arc::new(EnvelopeDecoder::new(SecretString::from(
        config.slack.verification_token.clone(),
    )));

    let bot = Arc::new(BotCore::new(
        BotIdentity {
            bot_id: config.slack.bot_id.clone(),
            bot_user_id: config.slack.bot_user_id.clone(),
        },
        EventDeduplicator::new(
            db_manager.event_store(),
            config.bot.dedup_failure_policy,
        ),
        replies,
        slack,
    ));

    let web_server = WebServer::new(config.clone(), db_manager, bot, decoder, dictionary);

    let web_handle = tokio::spawn(async move {
        if let Err(e) = web_server.start().await {
            error!("web server error: {}", e);
        }
    });

    tokio::select! {
        _ = web_handle => {},
        _ = tokio::signal::ctrl_c() => {
            info!("received shutdown signal");
        },
    }

    info!("slack faq bot shutting down");
    Ok(())
}
