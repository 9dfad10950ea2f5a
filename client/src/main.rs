mod commands;
mod config;

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use peril_gamelogic::GameState;
use peril_gamelogic::input::{self, InputReader};
use peril_pubsub::{self as pubsub, AckDecision, Channel, ExchangeKind, QueueType};
use peril_routing::{self as routing, GameLog, PlayingState};

use crate::commands::ClientCommand;

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // Logs go to stderr so stdout stays clean for the game UI.
    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
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

    let amqp_url = config::amqp_url();
    tracing::info!(url = %pubsub::redacted_amqp_url(&amqp_url), "connecting to broker");
    let conn = match pubsub::connect(&amqp_url).await {
        Ok(conn) => conn,
        Err(error) => {
            tracing::error!(%error, "failed to connect to broker");
            return; // Abort startup, nothing works without the broker.
        }
    };

    // Dedicated channel for everything this process publishes.
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

    let mut input = InputReader::new();
    let username = match input.client_welcome().await {
        Ok(Some(username)) => username,
        Ok(None) => return,
        Err(error) => {
            tracing::error!(%error, "failed to read username");
            return;
        }
    };

    let game = Arc::new(Mutex::new(GameState::new(&username)));

    // Transient per-player queue; the broker drops it when we disconnect.
    let pause_queue = routing::pause_queue_name(&username);
    let handler_game = Arc::clone(&game);
    let subscription = match pubsub::subscribe_json(
        &conn,
        routing::EXCHANGE_PERIL_DIRECT,
        &pause_queue,
        routing::PAUSE_KEY,
        QueueType::Transient,
        move |state: PlayingState| {
            lock(&handler_game).handle_pause(&state);
            println!();
            println!(
                "The game is now {}.",
                if state.is_paused { "paused" } else { "running" }
            );
            let _ = input::prompt();
            AckDecision::Ack
        },
    )
    .await
    {
        Ok(subscription) => subscription,
        Err(error) => {
            tracing::error!(%error, queue = %pause_queue, "failed to subscribe to pause broadcasts");
            return;
        }
    };

    input::print_client_help();
    run_repl(&mut input, &publish_channel, &game, &username).await;

    input::print_quit();
    subscription.cancel().await;
    if let Err(error) = conn.close(200, "client shutdown").await {
        tracing::warn!(%error, "failed to close broker connection");
    }
}

fn lock<'a>(game: &'a Arc<Mutex<GameState>>) -> MutexGuard<'a, GameState> {
    game.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

async fn declare_exchanges(channel: &Channel) -> Result<(), pubsub::PubsubError> {
    pubsub::declare_exchange(channel, routing::EXCHANGE_PERIL_DIRECT, ExchangeKind::Direct).await?;
    pubsub::declare_exchange(channel, routing::EXCHANGE_PERIL_TOPIC, ExchangeKind::Topic).await?;
    Ok(())
}

async fn run_repl(
    input: &mut InputReader,
    channel: &Channel,
    game: &Arc<Mutex<GameState>>,
    username: &str,
) {
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
            Ok(ClientCommand::Spawn { location, rank }) => {
                match lock(game).command_spawn(&location, &rank) {
                    Ok(unit) => println!(
                        "Spawned unit #{} ({} in {}).",
                        unit.id, unit.rank, unit.location
                    ),
                    Err(error) => println!("Error: {error}"),
                }
            }
            Ok(ClientCommand::Move { location, unit_id }) => {
                match lock(game).command_move(&location, &unit_id) {
                    Ok(unit) => println!("Moved unit #{} to {}.", unit.id, unit.location),
                    Err(error) => println!("Error: {error}"),
                }
            }
            Ok(ClientCommand::Status) => {
                for line in lock(game).status_lines() {
                    println!("{line}");
                }
            }
            Ok(ClientCommand::Help) => input::print_client_help(),
            Ok(ClientCommand::Spam { count }) => spam_logs(channel, username, count).await,
            Ok(ClientCommand::Quit) => break,
            Err(error) => println!("{error}"),
        }
    }
}

// Publish `count` telemetry lines to the topic exchange. Publish failures
// end the batch but never the process.
async fn spam_logs(channel: &Channel, username: &str, count: u32) {
    let routing_key = routing::game_log_routing_key(username);
    let mut published = 0;
    for sequence in 0..count {
        let log = GameLog {
            current_time: Utc::now(),
            message: format!("Practice telemetry message {sequence}"),
            username: username.to_string(),
        };
        if let Err(error) =
            pubsub::publish_json(channel, routing::EXCHANGE_PERIL_TOPIC, &routing_key, &log).await
        {
            tracing::error!(%error, routing_key = %routing_key, "failed to publish game log");
            break;
        }
        published += 1;
    }
    println!("Published {published} log messages.");
}
