// Infrastructure: Server setup and lifecycle

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::application::router;
use crate::config::AppConfig;
use crate::solver::SolverFactory;

/// Serve the REST API until Ctrl-C.
pub async fn start_server(config: Arc<AppConfig>) -> std::io::Result<()> {
    let address = config.server.socket_addr();
    log_banner(&address, &config);

    let app = router(config).layer(TraceLayer::new_for_http());
    let listener = TcpListener::bind(address).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

fn log_banner(address: &SocketAddr, config: &AppConfig) {
    let available: Vec<&str> = SolverFactory::available()
        .into_iter()
        .map(|backend| backend.key())
        .collect();
    info!(%address, "campaign optimisation service listening");
    info!(
        solver = config.optimisation.solver.key(),
        available = %available.join(", "),
        output = ?config.output.destination,
        "solver configuration"
    );
}
