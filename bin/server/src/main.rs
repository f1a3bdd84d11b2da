use axum::{Router, middleware, routing::get};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use trailhead_access::{
    AuthorizationGate, CredentialRegistry, DomainWhitelist, SignInController,
};
use trailhead_server::{
    api,
    auth::{self, AppState, GoogleOidcClient, SessionTokenService},
    config::ServerConfig,
    db::{AccountRepository, AllowedDomainRepository},
};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!("Loaded configuration");

    // Create database connection pool
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("failed to run migrations");

    // Build the immutable credential registry
    let registry =
        CredentialRegistry::from_json(&config.gate.credentials).expect("invalid API credentials");
    if registry.is_empty() {
        tracing::warn!("no API credentials configured; every /api request will be denied");
    } else {
        tracing::info!(credentials = registry.len(), "loaded API credentials");
    }
    let gate = AuthorizationGate::new(Arc::new(registry), config.gate.strict_origin);

    // Assemble the domain whitelist and lifecycle controller
    let whitelist = DomainWhitelist::new(
        config.whitelist.domains(),
        Arc::new(AllowedDomainRepository::new(db_pool.clone())),
    );
    let controller = SignInController::new(
        Arc::new(AccountRepository::new(db_pool.clone())),
        whitelist,
    );

    // Session token service
    let tokens = SessionTokenService::new(
        &config.session.token_secret,
        config.session.duration_minutes,
    );

    // Initialize OIDC client
    tracing::info!("Discovering OIDC provider...");
    let oidc_client = GoogleOidcClient::discover(&config.google)
        .await
        .expect("failed to discover OIDC provider");

    // Create application state
    let state = Arc::new(AppState::new(
        db_pool,
        oidc_client,
        tokens,
        gate,
        controller,
        config.session,
    ));

    let app = Router::new()
        // Auth routes (outside both route classes)
        .route("/auth/login", get(auth::login))
        .route("/auth/callback", get(auth::callback))
        .route("/auth/logout", get(auth::logout))
        // Internal routes behind the internal gate
        .nest(
            "/api/internal",
            api::internal_router().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth::middleware::internal_gate,
            )),
        )
        // External routes behind the external gate
        .nest(
            "/api/external",
            api::external_router().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth::middleware::external_gate,
            )),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", config.listen_addr);

    axum::serve(listener, app.into_make_service())
        .await
        .expect("server error");
}
