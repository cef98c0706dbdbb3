use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context};
use tokio::{net::TcpListener, sync::oneshot};
use tracing::{error, info};

use summariser::{
    api::{self, AppState},
    config::Settings,
    inference::{Summariser, T5Summariser},
    summary::{Dispatcher, Readiness},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // -----------------------------
    // Logging
    // -----------------------------
    summariser::setup_logging();

    let settings = Settings::from_env().context("loading settings")?;
    info!("🚀 Starting summariser ({})", settings.model.name);

    // -----------------------------
    // Shared state
    // -----------------------------
    let readiness = Readiness::new();
    let dispatcher = Arc::new(Dispatcher::new(
        readiness.clone(),
        settings.max_input_chars,
        settings.length.clone(),
    ));

    // -----------------------------
    // Model load (background; /summarise answers 503 until done)
    // -----------------------------
    let (load_failed_tx, load_failed_rx) = oneshot::channel::<anyhow::Error>();
    {
        let dispatcher = dispatcher.clone();
        let model_settings = settings.model.clone();
        tokio::spawn(async move {
            let loaded = tokio::task::spawn_blocking(move || T5Summariser::load(&model_settings))
                .await
                .map_err(|e| anyhow!("model load task panicked: {e}"))
                .and_then(|res| res);
            match loaded {
                Ok(model) => {
                    let model: Arc<dyn Summariser> = Arc::new(model);
                    if !dispatcher.install(model) {
                        info!("model loaded after shutdown began, discarding");
                    }
                }
                Err(err) => {
                    let _ = load_failed_tx.send(err);
                }
            }
        });
    }

    // -----------------------------
    // Router
    // -----------------------------
    let app = api::router(AppState { dispatcher });

    let addr = settings.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    info!("🌐 HTTP listening on http://{addr}");
    info!("📝 Summarise at http://{addr}/summarise");
    info!("🩺 Health at http://{addr}/health");

    let load_failure: Arc<Mutex<Option<anyhow::Error>>> = Arc::new(Mutex::new(None));
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal(
            readiness,
            load_failed_rx,
            load_failure.clone(),
        ))
        .await?;

    let failure = load_failure
        .lock()
        .map_err(|_| anyhow!("load failure slot poisoned"))?
        .take();
    match failure {
        Some(err) => Err(err.context("model failed to load")),
        None => {
            info!("👋 summariser stopped");
            Ok(())
        }
    }
}

/// Resolves on Ctrl-C, SIGTERM or a failed model load; marks the model
/// unloaded before connections drain.
async fn shutdown_signal(
    readiness: Readiness,
    load_failed: oneshot::Receiver<anyhow::Error>,
    failure_slot: Arc<Mutex<Option<anyhow::Error>>>,
) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("ctrl-c handler failed: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("SIGTERM handler failed: {e}");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    // A dropped sender means the load succeeded; keep waiting for a signal.
    let load_failed = async {
        match load_failed.await {
            Ok(err) => err,
            Err(_) => std::future::pending().await,
        }
    };

    tokio::select! {
        _ = ctrl_c => info!("ctrl-c received, shutting down"),
        _ = terminate => info!("SIGTERM received, shutting down"),
        err = load_failed => {
            error!("model load failed: {err:#}");
            if let Ok(mut slot) = failure_slot.lock() {
                *slot = Some(err);
            }
        }
    }

    readiness.mark_unloaded();
}
