use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use vigil_core::speech::{NoVoiceClone, SpeechComposer};
use vigil_engine::Engine;
use vigil_server::{AppState, Settings, ticker};
use vigil_store_sqlite::SqliteStore;
use vigil_telephony::{HttpGateway, HttpSpeechComposer};

#[derive(Parser)]
#[command(author, version, about = "Vigil reminder scheduling and escalation server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "vigil.toml")]
  config: PathBuf,

  /// Run a single tick for the current minute, print its summary and exit.
  #[arg(long)]
  once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings: Settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("VIGIL")
        .separator("__")
        .try_parsing(true),
    )
    .build()
    .context("failed to read configuration")?
    .try_deserialize()
    .context("failed to deserialise configuration")?;

  let store_path = expand_tilde(&settings.server.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let gateway = HttpGateway::new(settings.telephony.clone())
    .context("failed to build telephony client")?;

  match settings.speech.clone() {
    Some(speech) => {
      let composer = HttpSpeechComposer::new(speech).context("failed to build speech client")?;
      run(settings, store, gateway, composer, cli.once).await
    }
    None => {
      tracing::info!("no voice-clone provider configured; voice calls use synthesized speech");
      run(settings, store, gateway, NoVoiceClone, cli.once).await
    }
  }
}

async fn run<V>(
  settings: Settings,
  store: SqliteStore,
  gateway: HttpGateway,
  speech: V,
  once: bool,
) -> anyhow::Result<()>
where
  V: SpeechComposer + 'static,
{
  let engine = Engine::new(
    Arc::new(store),
    Arc::new(gateway),
    Arc::new(speech),
    settings.engine.clone(),
  );

  if once {
    let summary = engine.tick(chrono::Utc::now()).await;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    return Ok(());
  }

  if settings.server.ticker {
    tokio::spawn(ticker::run(engine.clone()));
  }

  let app = vigil_server::router(AppState { engine });
  let address = format!("{}:{}", settings.server.host, settings.server.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
