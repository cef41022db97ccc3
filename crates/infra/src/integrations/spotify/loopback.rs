//! Loopback listener for the forwarded callback
//!
//! The relay redirects the browser to the client origin with `?code=` or
//! `?error=`. The CLI plays the part of that origin: it listens on the
//! origin's host and port just long enough to receive one redirect.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::Query;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use nowplaying_common::auth::{CallbackRelay, CallbackState};
use nowplaying_domain::{NowPlayingError, Result};
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use url::Url;

type CallbackSender = Arc<Mutex<Option<oneshot::Sender<CallbackState>>>>;

/// Loopback HTTP server that receives exactly one forwarded callback.
pub struct CallbackListener {
    local_addr: SocketAddr,
    path: String,
    receiver: Option<oneshot::Receiver<CallbackState>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl CallbackListener {
    /// Bind on the host and port of `client_origin`.
    ///
    /// Port `0` binds an ephemeral port; read it back with
    /// [`CallbackListener::origin`].
    pub async fn bind(client_origin: &str) -> Result<Self> {
        let url = Url::parse(client_origin).map_err(|e| {
            NowPlayingError::Config(format!("invalid client origin {client_origin}: {e}"))
        })?;
        let host = url.host_str().ok_or_else(|| {
            NowPlayingError::Config(format!("client origin {client_origin} has no host"))
        })?;
        let port = url.port_or_known_default().unwrap_or(80);
        let path = url.path().to_string();

        let listener = TcpListener::bind((host, port)).await.map_err(|err| {
            NowPlayingError::Network(format!(
                "failed to bind callback listener on {host}:{port}: {err}"
            ))
        })?;
        let local_addr = listener
            .local_addr()
            .map_err(|err| NowPlayingError::Network(format!("failed to determine port: {err}")))?;

        let (callback_tx, callback_rx) = oneshot::channel();
        let relay = Arc::new(Mutex::new(CallbackRelay::new()));
        let sender: CallbackSender = Arc::new(Mutex::new(Some(callback_tx)));

        let app = Router::new().route(
            &path,
            get(move |query: Query<HashMap<String, String>>| {
                handle_callback(query, relay.clone(), sender.clone())
            }),
        );

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
            {
                error!("Callback listener error: {}", err);
            }
        });

        info!(addr = %local_addr, path = %path, "Callback listener started");

        Ok(Self {
            local_addr,
            path,
            receiver: Some(callback_rx),
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Origin as actually bound (ephemeral port resolved).
    pub fn origin(&self) -> String {
        format!("http://{}{}", self.local_addr, self.path)
    }

    /// Wait for the forwarded callback.
    ///
    /// # Errors
    /// `Network` on timeout or when called a second time.
    pub async fn wait_for_callback(&mut self, timeout: Duration) -> Result<CallbackState> {
        let receiver = self.receiver.take().ok_or_else(|| {
            NowPlayingError::Internal("callback listener already consumed".to_string())
        })?;

        match tokio::time::timeout(timeout, receiver).await {
            Ok(Ok(state)) => Ok(state),
            Ok(Err(_)) => Err(NowPlayingError::Internal("callback listener stopped".to_string())),
            Err(_) => Err(NowPlayingError::Network(
                "timed out waiting for the authorization callback".to_string(),
            )),
        }
    }

    /// Shut down the listener gracefully.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                if err.is_panic() {
                    return Err(NowPlayingError::Internal(format!(
                        "callback listener panicked: {err}"
                    )));
                }
            }
        }

        Ok(())
    }
}

impl Drop for CallbackListener {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if !handle.is_finished() {
                handle.abort();
            }
        }
    }
}

async fn handle_callback(
    Query(params): Query<HashMap<String, String>>,
    relay: Arc<Mutex<CallbackRelay>>,
    sender: CallbackSender,
) -> Html<&'static str> {
    let state = {
        let mut relay = relay.lock().await;
        let code = params.get("code").map(String::as_str);
        let error = params.get("error").map(String::as_str);
        relay.receive(code, error).clone()
    };

    if let Some(tx) = sender.lock().await.take() {
        debug!("Forwarded callback received");
        let _ = tx.send(state.clone());
    }

    match state {
        CallbackState::CodeReceived(_) => Html(
            r#"<!DOCTYPE html>
<html>
<head><title>Login Complete</title></head>
<body><h1>Connected to Spotify</h1><p>You can close this window and return to the terminal.</p></body>
</html>"#,
        ),
        _ => Html(
            r#"<!DOCTYPE html>
<html>
<head><title>Login Failed</title></head>
<body><h1>Login Failed</h1><p>Spotify did not grant access. Check the terminal for details.</p></body>
</html>"#,
        ),
    }
}
