use anyhow::{anyhow, Result};
use clap::Parser;
use log::{info, LevelFilter};
use serde::Serialize;
use std::path::PathBuf;

mod utils;

use chatsync::{
    config::{self, ClientConfig},
    engine::{actor, merge},
    protocol, replay, ChannelTransport, ChatEngine, EngineSnapshot,
};

/// Command line arguments for chatsync
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "chatsync: replay a chat session through the synchronization engine.",
    long_about = "Replays a JSON-lines transcript of server frames and user actions through the\n\
    chat synchronization engine and prints the resulting state as JSON.\n\n\
    The user id is taken from --user-id, then the config file, then CHATSYNC_USER_ID."
)]
struct Args {
    /// JSON-lines transcript to replay
    #[arg(long, value_name = "PATH")]
    transcript: PathBuf,

    /// Id of the logged-in user
    #[arg(long)]
    user_id: Option<i64>,

    /// Config file to use instead of the per-user one
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    /// Only list contacts whose name or username contains this text
    #[arg(long)]
    filter: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    snapshot: EngineSnapshot,
    requests: Vec<serde_json::Value>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(path) = &args.config {
        config::set_config_path_override(path.clone());
    }
    let file_config = config::load_config()?;

    let user_id = args
        .user_id
        .or_else(|| file_config.as_ref().map(|c| c.user_id))
        .or_else(config::user_id_from_env)
        .ok_or_else(|| {
            anyhow!(
                "No user id: pass --user-id, set it in the config file, or set {}",
                config::USER_ID_ENV
            )
        })?;
    let settings = file_config.unwrap_or_else(|| ClientConfig::new(user_id));

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        utils::parse_level(&settings.log_level)
    };
    let log_file = args.log_file.clone().or_else(|| settings.log_file.clone());
    utils::setup_logging(log_file.as_deref(), level)?;
    info!("chatsync starting for user {}", user_id);

    let steps = replay::load_transcript(&args.transcript)?;

    let (transport, mut outbound_rx) = ChannelTransport::new(settings.channel_capacity);
    let writer = tokio::spawn(async move {
        let mut requests = Vec::new();
        while let Some(request) = outbound_rx.recv().await {
            requests.push(protocol::request_frame(&request));
        }
        requests
    });

    let engine = ChatEngine::new(user_id, transport);
    let (handle, engine_task) = actor::spawn(engine, settings.channel_capacity);

    let replayed = replay::run(&handle, steps).await?;
    let mut snapshot = handle.snapshot().await?;
    info!("Replayed {} steps", replayed);

    if let Some(term) = &args.filter {
        snapshot.contacts = merge::filter_contacts(snapshot.contacts, term);
    }

    // Dropping the last handle stops the engine, which drops the transport
    // and lets the writer drain
    drop(handle);
    drop(engine_task.await?);
    let requests = writer.await?;

    let report = Report { snapshot, requests };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
