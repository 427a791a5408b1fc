//! Interactive Quizcast client.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin quizcast -- --role broadcaster --username teacher
//! cargo run --bin quizcast -- --username alice
//! ```

use std::time::Duration;

use clap::{Parser, ValueEnum};
use quizcast_client::{
    domain::{BaseTopic, DEFAULT_BASE_TOPIC, Role},
    session::{DEFAULT_USERNAME, SessionConfig},
    ui,
};
use quizcast_shared::logger::setup_logger;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RoleArg {
    Broadcaster,
    Participant,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Broadcaster => Role::Broadcaster,
            RoleArg::Participant => Role::Participant,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "quizcast", version, about = "Live classroom quiz client")]
struct Args {
    /// Broker WebSocket URL
    #[arg(long, env = "QUIZCAST_URL", default_value = "ws://127.0.0.1:3000/ws")]
    url: String,

    /// Base topic of the classroom
    #[arg(long, env = "QUIZCAST_TOPIC", default_value = DEFAULT_BASE_TOPIC)]
    topic: String,

    #[arg(long, value_enum, default_value_t = RoleArg::Participant)]
    role: RoleArg,

    /// Display name used in chat
    #[arg(long, env = "QUIZCAST_USERNAME", default_value = DEFAULT_USERNAME)]
    username: String,

    /// Seconds to wait before reconnecting
    #[arg(long, default_value_t = 5)]
    reconnect_secs: u64,

    /// Seconds before a connect attempt is abandoned
    #[arg(long, default_value_t = 10)]
    connect_timeout_secs: u64,

    /// Seconds between keepalive pings (0 disables keepalive)
    #[arg(long, env = "QUIZCAST_KEEPALIVE", default_value_t = 30)]
    keepalive_secs: u64,

    /// Do not ask for the current question after connecting
    #[arg(long)]
    no_resync: bool,
}

#[tokio::main]
async fn main() {
    setup_logger(env!("CARGO_BIN_NAME"), "warn");
    let args = Args::parse();

    let base_topic = match BaseTopic::new(args.topic.clone()) {
        Ok(topic) => topic,
        Err(e) => {
            tracing::error!("Invalid topic '{}': {}", args.topic, e);
            std::process::exit(2);
        }
    };
    let config = SessionConfig::new(args.role.into())
        .with_base_topic(base_topic)
        .with_username(args.username)
        .with_reconnect_backoff(Duration::from_secs(args.reconnect_secs))
        .with_connect_timeout(Duration::from_secs(args.connect_timeout_secs))
        .with_keepalive(Some(Duration::from_secs(args.keepalive_secs)).filter(|k| !k.is_zero()))
        .with_resync_on_connect(!args.no_resync);

    if let Err(e) = ui::run(args.url, config).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
