#![cfg_attr(not(test), deny(clippy::unwrap_used))]
use std::net::SocketAddr;
use std::sync::Arc;

use session_server::activity::TracingActivitySink;
use session_server::api::{AppState, router};
use session_server::auth::AuthError;
use session_server::config::ServerConfig;
use session_server::credentials::{MemoryCredentialStore, Role};
use session_server::gate::{GateConfig, RouteGate};
use session_server::time::SystemTimeSource;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "session_server=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment variables
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Loaded configuration: listen_port={}, cookie_secure={}",
        config.listen_port,
        config.cookie_secure
    );

    let state = AppState::new(
        Arc::new(MemoryCredentialStore::new()),
        config.signing_key.clone(),
        Arc::new(SystemTimeSource),
        Arc::new(TracingActivitySink),
        config.cookie_secure,
    );

    if let Some(admin) = &config.admin {
        let issuer = Arc::clone(&state.issuer);
        let admin = admin.clone();
        let seeded = tokio::task::spawn_blocking(move || {
            issuer.create(&admin.email, &admin.password, "Administrator", Role::Admin)
        })
        .await;
        match seeded {
            Ok(Ok(session)) => tracing::info!(user_id = %session.user.id, "seeded admin account"),
            Ok(Err(AuthError::Conflict)) => tracing::info!("admin account already exists"),
            Ok(Err(e)) => {
                tracing::error!("Failed to seed admin account: {e}");
                std::process::exit(1);
            }
            Err(e) => {
                tracing::error!("Admin seeding task failed: {e}");
                std::process::exit(1);
            }
        }
    }

    let gate = RouteGate::new(GateConfig {
        cookie_secure: config.cookie_secure,
        ..GateConfig::default()
    });
    let app = router(state, gate);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.listen_port));
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to bind: {e}");
            std::process::exit(1);
        });

    axum::serve(listener, app).await.unwrap_or_else(|e| {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    });
}
