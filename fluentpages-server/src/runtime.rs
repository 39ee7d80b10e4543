use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

use fluentpages_core::Settings;

use crate::error::{io_err, ServerError};
use crate::http::{read_request_within, write_response, Response};
use crate::routes::{handle, AppState};

/// Time a client gets to send its request head.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Start the HTTP server and block the current thread until it exits.
pub fn start_blocking(home: &Path, settings: Settings, listen: Option<String>) -> Result<(), ServerError> {
    init_tracing();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    let listen = listen.unwrap_or_else(|| settings.listen().to_string());
    runtime.block_on(run(home.to_path_buf(), settings, listen))
}

/// Bind `listen` and serve until ctrl-c.
pub async fn run(home: PathBuf, settings: Settings, listen: String) -> Result<(), ServerError> {
    let listener = TcpListener::bind(&listen)
        .await
        .map_err(|e| io_err(&listen, e))?;
    tracing::info!(
        listen = %listen,
        template_root = %settings.template_root(),
        relative = settings.relative_mode(),
        "serving layout metadata",
    );

    let state = Arc::new(AppState { home, settings });
    let (shutdown_tx, _) = broadcast::channel::<()>(16);

    let server_handle = {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            let result = serve(listener, state, shutdown.subscribe()).await;
            let _ = shutdown.send(());
            result
        })
    };

    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            let mut shutdown_rx = shutdown.subscribe();
            tokio::select! {
                _ = shutdown_rx.recv() => Ok(()),
                signal = tokio::signal::ctrl_c() => {
                    match signal {
                        Ok(()) => {
                            tracing::info!("received ctrl-c, shutting down server");
                            let _ = shutdown.send(());
                            Ok(())
                        }
                        Err(err) => Err(ServerError::Runtime(format!("ctrl-c handler failed: {err}"))),
                    }
                }
            }
        })
    };

    let (server_result, signal_result) = tokio::join!(server_handle, signal_handle);
    handle_join("http_server", server_result)?;
    handle_join("signal_handler", signal_result)?;
    Ok(())
}

/// Accept connections on `listener` until a shutdown signal arrives.
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), ServerError> {
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            accepted = listener.accept() => {
                let (stream, peer) = accepted.map_err(|e| io_err("http accept", e))?;
                let state = state.clone();
                tokio::spawn(async move {
                    if let Err(err) = handle_connection(stream, state).await {
                        tracing::error!(peer = %peer, error = %err, "http client error");
                    }
                });
            }
        }
    }
    Ok(())
}

async fn handle_connection(stream: TcpStream, state: Arc<AppState>) -> Result<(), ServerError> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    let request = match read_request_within(&mut reader, REQUEST_TIMEOUT).await {
        Ok(Some(request)) => request,
        Ok(None) => return Ok(()),
        Err(ServerError::BadRequest(message)) => {
            tracing::warn!(error = %message, "rejecting malformed request");
            return write_response(&mut writer, &Response::error(400, message)).await;
        }
        Err(err @ ServerError::Timeout(_)) => {
            tracing::warn!(error = %err, "closing stalled connection");
            return write_response(&mut writer, &Response::error(408, err.to_string())).await;
        }
        Err(err) => return Err(err),
    };

    tracing::debug!(method = %request.method, path = %request.path, "request");
    let response = tokio::task::spawn_blocking(move || handle(&state, &request))
        .await
        .map_err(|err| ServerError::Runtime(format!("request handler join failure: {err}")))?;
    write_response(&mut writer, &response).await
}

fn handle_join(
    task: &str,
    result: Result<Result<(), ServerError>, tokio::task::JoinError>,
) -> Result<(), ServerError> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(ServerError::Runtime(format!(
            "{task} task join failure: {err}"
        ))),
    }
}

/// Install the global subscriber; `RUST_LOG` overrides the `info` default.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
