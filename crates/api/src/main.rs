use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use studio_api::background;
use studio_api::config::ServerConfig;
use studio_api::middleware::rate_limit::RateLimiter;
use studio_api::router::build_app_router;
use studio_api::state::AppState;
use studio_assistant::{ChatModel, DisabledChatModel, GeminiClient, GeminiConfig};
use studio_events::{DisabledMailer, EmailConfig, Mailer, NotificationDispatcher, SmtpMailer};
use studio_payments::{DisabledGateway, PaymentGateway, PayPalConfig, PayPalGateway};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "studio_api=debug,tower_http=debug".into());
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = studio_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    studio_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    studio_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- External services ---
    let payments = build_payment_gateway();
    let notifier = NotificationDispatcher::new(build_mailer());
    let chat_model = build_chat_model();

    // --- Background tasks ---
    let cancel = CancellationToken::new();
    let retention_handle = tokio::spawn(background::conversation_retention::run(
        pool.clone(),
        cancel.clone(),
    ));

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        payments,
        notifier,
        chat_model,
        chat_limiter: Arc::new(RateLimiter::new(
            config.chat_rate_limit_per_min,
            Duration::from_secs(60),
        )),
        auth_limiter: Arc::new(RateLimiter::new(
            config.auth_rate_limit,
            Duration::from_secs(config.auth_rate_window_secs),
        )),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    // Peer addresses feed the rate limiter when no proxy header is present.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), retention_handle).await;
    tracing::info!("Background tasks stopped");

    tracing::info!("Graceful shutdown complete");
}

fn build_payment_gateway() -> Arc<dyn PaymentGateway> {
    match PayPalConfig::from_env() {
        Some(config) => {
            let mode = config.mode;
            let gateway = PayPalGateway::new(config).expect("Failed to build PayPal client");
            tracing::info!(?mode, "PayPal gateway configured");
            Arc::new(gateway)
        }
        None => {
            tracing::warn!("PAYPAL_CLIENT_ID/PAYPAL_CLIENT_SECRET not set; payments disabled");
            let currency = std::env::var("PAYPAL_CURRENCY").unwrap_or_else(|_| "USD".into());
            Arc::new(DisabledGateway::new(currency))
        }
    }
}

fn build_mailer() -> Arc<dyn Mailer> {
    match EmailConfig::from_env() {
        Some(config) => {
            let mailer = SmtpMailer::new(config).expect("Failed to build SMTP transport");
            tracing::info!("SMTP mailer configured");
            Arc::new(mailer)
        }
        None => {
            tracing::warn!("SMTP_HOST not set; outbound email disabled");
            Arc::new(DisabledMailer)
        }
    }
}

fn build_chat_model() -> Arc<dyn ChatModel> {
    match GeminiConfig::from_env() {
        Some(config) => {
            let model = config.model.clone();
            let client = GeminiClient::new(config).expect("Failed to build Gemini client");
            tracing::info!(%model, "Gemini chat model configured");
            Arc::new(client)
        }
        None => {
            tracing::warn!("GEMINI_API_KEY not set; chat assistant disabled");
            Arc::new(DisabledChatModel)
        }
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
