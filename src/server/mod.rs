//! HTTP surface of the simulator.
//!
//! - [`router`]: suffix route table and app assembly
//! - [`auth`]: provider API key check and 401 envelope
//! - [`openai_api`]: response types and handlers
//! - [`variability`]: randomness behind token counts and canned replies

pub mod auth;
pub mod openai_api;
pub mod router;
pub mod variability;

use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::Config;
use openai_api::AppState;

/// Serve the simulator on an already-bound listener until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    config: Arc<Config>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let app = router::build_router(Arc::new(AppState::new(config)));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}
