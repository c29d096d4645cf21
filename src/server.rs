use std::net::SocketAddr;

use axum::Router;
use tracing::{info, warn};

use crate::config::ServerConfig;

/// Serve `app`, moving to the next port while the configured one is taken
pub async fn serve(
    app: Router,
    config: &ServerConfig,
    name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut port = config.port;
    for attempt in 1..=config.port_attempts {
        let addr = SocketAddr::new(config.host, port);
        match axum::Server::try_bind(&addr) {
            Ok(server) => {
                info!("🚀 {} started at http://{}", name, addr);
                info!("📄 API Documentation: http://{}/docs", addr);
                return server
                    .serve(app.into_make_service())
                    .await
                    .map_err(|e| e.into());
            }
            Err(e) => {
                warn!("Port {} unavailable for {}: {}", port, name, e);
                if attempt == config.port_attempts {
                    break;
                }
                port = port.checked_add(1).ok_or("Port range exhausted")?;
            }
        }
    }

    Err("Failed to bind to any port".into())
}
