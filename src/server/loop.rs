// Server loop module
// Accepts connections until a shutdown signal, then drains in-flight requests

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::time::Instant;

use super::connection::accept_connection;
use super::signal::shutdown_signal;
use crate::config::AppState;
use crate::logger;

/// Interval between checks of the active connection counter while draining
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Run the accept loop until SIGINT/SIGTERM.
pub async fn run(listener: TcpListener, state: Arc<AppState>) {
    serve_until(listener, state, shutdown_signal()).await;
}

/// Run the accept loop until `shutdown` resolves with the name of the trigger.
///
/// After the trigger the listener is closed and the loop waits up to
/// `performance.shutdown_timeout` seconds for active connections to finish.
pub async fn serve_until<S>(listener: TcpListener, state: Arc<AppState>, shutdown: S)
where
    S: Future<Output = &'static str>,
{
    let active_connections = Arc::new(AtomicUsize::new(0));
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            signal = &mut shutdown => {
                logger::log_shutdown(signal, active_connections.load(Ordering::SeqCst));
                break;
            }
        }
    }

    drop(listener);

    let grace = Duration::from_secs(state.config.performance.shutdown_timeout);
    if wait_for_drain(&active_connections, grace).await {
        logger::log_info("[Shutdown] All connections closed");
    } else {
        logger::log_warning(&format!(
            "[Shutdown] {} connection(s) still active after {}s, exiting",
            active_connections.load(Ordering::SeqCst),
            grace.as_secs()
        ));
    }
}

/// Returns `true` if the counter reached zero before `grace` elapsed.
async fn wait_for_drain(active: &AtomicUsize, grace: Duration) -> bool {
    let deadline = Instant::now() + grace;
    while active.load(Ordering::SeqCst) > 0 {
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }
    true
}
