mod commands;
mod config;

use peril_gamelogic::input::{self, InputReader};
use peril_gamelogic::logs;
use peril_pubsub::{self as pubsub, AckDecision, Channel, ExchangeKind, QueueType};
use peril_routing::{self as routing, GameLog, PlayingState};

use crate::commands::ServerCommand;

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

#[tokio::main]
async fn main() {
    // Load .env locally; safe to ignore when not present.
    let _ = dotenvy::dotenv();
    init_tracing();
    tracing::info!("starting peril server");

    let amqp_url = config::amqp_url();
    tracing::info!(url = %pubsub::redacted_amqp_url(&amqp_url), "connecting to broker");
    let conn = match pubsub::connect(&amqp_url).await {
        Ok(conn) => conn,
        Err(error) => {
            tracing::error!(%error, "failed to connect to broker");
            return; // Abort startup, nothing works without the broker.
        }
    };

    // Dedicated channel for pause/resume publishing.
    let publish_channel = match pubsub::open_channel(&conn).await {
        Ok(channel) => channel,
        Err(error) => {
            tracing::error!(%error, "failed to open publish channel");
            return;
        }
    };
    if let Err(error) = declare_exchanges(&publish_channel).await {
        tracing::error!(%error, "failed to declare exchanges");
        return;
    }

    // One durable queue aggregates every player's telemetry. The handler
    // requeues on write failure so a full disk loses nothing.
    let subscription = match pubsub::subscribe_json(
        &conn,
        routing::EXCHANGE_PERIL_TOPIC,
        routing::GAME_LOG_SLUG,
        routing::GAME_LOG_BINDING_KEY,
        QueueType::Durable,
        |log: GameLog| match logs::write_log(&log) {
            Ok(()) => AckDecision::Ack,
            Err(error) => {
                tracing::error!(%error, username = %log.username, "failed to append game log");
                AckDecision::NackRequeue
            }
        },
    )
    .await
    {
        Ok(subscription) => subscription,
        Err(error) => {
            tracing::error!(%error, queue = routing::GAME_LOG_SLUG, "failed to subscribe to game logs");
            return;
        }
    };

    input::print_server_help();
    run_repl(&mut InputReader::new(), &publish_channel).await;

    input::print_quit();
    subscription.cancel().await;
    if let Err(error) = conn.close(200, "server shutdown").await {
        tracing::warn!(%error, "failed to close broker connection");
    }
}

async fn declare_exchanges(channel: &Channel) -> Result<(), pubsub::PubsubError> {
    pubsub::declare_exchange(channel, routing::EXCHANGE_PERIL_DIRECT, ExchangeKind::Direct).await?;
    pubsub::declare_exchange(channel, routing::EXCHANGE_PERIL_TOPIC, ExchangeKind::Topic).await?;
    Ok(())
}

async fn run_repl(input: &mut InputReader, channel: &Channel) {
    loop {
        let words = match input.read_words().await {
            Ok(Some(words)) => words,
            Ok(None) => break,
            Err(error) => {
                tracing::error!(%error, "failed to read input");
                break;
            }
        };
        if words.is_empty() {
            continue;
        }

        match commands::parse(&words) {
            Ok(ServerCommand::Pause) => publish_playing_state(channel, true).await,
            Ok(ServerCommand::Resume) => publish_playing_state(channel, false).await,
            Ok(ServerCommand::Help) => input::print_server_help(),
            Ok(ServerCommand::Quit) => break,
            Err(error) => println!("{error}"),
        }
    }
}

// Broadcast the pause state. Advisory only: with no client connected the
// broker drops it, which is fine for a control message.
async fn publish_playing_state(channel: &Channel, is_paused: bool) {
    tracing::info!(is_paused, "broadcasting pause state");
    let state = PlayingState { is_paused };
    if let Err(error) = pubsub::publish_json(
        channel,
        routing::EXCHANGE_PERIL_DIRECT,
        routing::PAUSE_KEY,
        &state,
    )
    .await
    {
        tracing::error!(%error, "failed to publish pause state");
    }
}
