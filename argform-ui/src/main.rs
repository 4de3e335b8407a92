//! Argform UI server - HTTP and SSE host for a single argument form session.

mod routes;
mod sse;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use argform::core::types::ArgValues;
use argform::io::batch::load_batch;
use argform::io::config::load_config;
use argform::io::spec_store::load_args_spec;
use argform::io::validator::CommandValidator;
use argform::{ArgsSession, SessionOptions};
use axum::Router;
use axum::routing::get;
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{info, warn};

use crate::state::AppState;

#[derive(Parser)]
#[command(name = "argform-ui")]
#[command(about = "Serve an argument form over HTTP with live validation events")]
struct Args {
    /// Address to bind the server to
    #[arg(long, default_value = "127.0.0.1")]
    bind: String,

    /// Port to listen on
    #[arg(long, default_value = "3001")]
    port: u16,

    /// Args spec JSON file
    #[arg(long)]
    spec: PathBuf,

    /// Saved parameter set or run log to pre-fill the form with
    #[arg(long)]
    args: Option<PathBuf>,

    #[arg(long, default_value = "argform.toml")]
    config: PathBuf,

    /// Directory watched for dropped parameter sets
    #[arg(long)]
    drop_dir: Option<PathBuf>,

    /// Directory containing UI static files
    #[arg(long)]
    ui_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("argform_ui=info".parse()?)
                .add_directive("argform=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let spec = load_args_spec(&args.spec)?;
    let config = load_config(&args.config).context("load config")?;
    let initial = match &args.args {
        Some(path) => {
            let payload = load_batch(path)?;
            if payload.module == spec.module {
                payload.args
            } else {
                warn!(
                    path = %path.display(),
                    found = %payload.module,
                    expected = %spec.module,
                    "ignoring prefill for another module"
                );
                ArgValues::new()
            }
        }
        None => ArgValues::new(),
    };
    info!(module = %spec.module, spec = %args.spec.display(), "starting argform-ui");

    let validator = Arc::new(CommandValidator::new(config.validator.clone()));
    let session = ArgsSession::new(spec, initial, validator, SessionOptions::from(&config));
    let drop_dir = args.drop_dir.map(resolve_drop_dir);
    let state = AppState::new(session);

    if let Some(dir) = drop_dir {
        sse::start_drop_watcher(state.clone(), dir);
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new()
        .nest("/api", routes::api_router())
        .route("/events", get(sse::events_handler))
        .layer(cors)
        .with_state(state);

    match args.ui_dir {
        Some(ui_dir) if ui_dir.exists() => {
            info!(ui_dir = %ui_dir.display(), "serving static UI files");
            app = app
                .fallback_service(ServeDir::new(ui_dir).append_index_html_on_directories(true));
        }
        Some(ui_dir) => {
            info!(ui_dir = %ui_dir.display(), "UI directory not found, API-only mode");
        }
        None => {}
    }

    let addr: SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Canonical form of `dir`, so watcher event paths compare equal to it.
///
/// Falls back to `dir` as given, with a warning, when it cannot be resolved.
fn resolve_drop_dir(dir: PathBuf) -> PathBuf {
    match dir.canonicalize() {
        Ok(canonical) => canonical,
        Err(err) => {
            warn!(
                path = %dir.display(),
                error = %err,
                "cannot canonicalize drop directory, using as given"
            );
            dir
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_is_required() {
        assert!(Args::try_parse_from(["argform-ui"]).is_err());
    }

    #[test]
    fn defaults_bind_locally() {
        let args = Args::try_parse_from(["argform-ui", "--spec", "s.json"]).expect("parse");
        assert_eq!(args.bind, "127.0.0.1");
        assert_eq!(args.port, 3001);
        assert_eq!(args.config, PathBuf::from("argform.toml"));
        assert!(args.drop_dir.is_none());
    }

    #[test]
    fn drop_dir_is_canonicalized_when_it_exists() {
        let temp = tempfile::tempdir().expect("tempdir");
        let nested = temp.path().join("drop");
        std::fs::create_dir(&nested).expect("mkdir");

        let resolved = resolve_drop_dir(nested.join("..").join("drop"));
        assert_eq!(resolved, nested.canonicalize().expect("canonical"));
    }

    #[test]
    fn missing_drop_dir_is_kept_as_given() {
        let temp = tempfile::tempdir().expect("tempdir");
        let missing = temp.path().join("not-there");
        assert_eq!(resolve_drop_dir(missing.clone()), missing);
    }
}
