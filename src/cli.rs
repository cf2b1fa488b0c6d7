use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "slack-faq-bot")]
#[command(about = "Answers glossary questions asked in Slack", version)]
pub struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, short = 'c', env = "CONFIG_PATH", default_value = "config.yaml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run migrations, load the dictionary and serve the events endpoint
    Serve,
    /// Create the tables and exit
    Migrate,
    /// Print the reply a question would get, without sending it
    Ask {
        text: String,
        /// User id to mention in the reply
        #[arg(long, default_value = "U0000000000")]
        requester: String,
    },
}

impl Cli {
    pub fn command(&self) -> &Command {
        self.command.as_ref().unwrap_or(&Command::Serve)
    }
}
