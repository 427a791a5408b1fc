//! Quizcast relay broker.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin quizcast-broker -- --port 3000
//! ```

use clap::Parser;
use quizcast_broker::ui::{DEFAULT_HOST, DEFAULT_PORT};
use quizcast_shared::logger::setup_logger;

#[derive(Debug, Parser)]
#[command(name = "quizcast-broker", version, about = "Quizcast topic relay broker")]
struct Args {
    /// Address to listen on
    #[arg(long, env = "QUIZCAST_HOST", default_value = DEFAULT_HOST)]
    host: String,

    /// Port to listen on
    #[arg(long, env = "QUIZCAST_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");
    let args = Args::parse();

    // Run the server
    if let Err(e) = quizcast_broker::run(&args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
