use std::sync::Arc;

use clap::Parser;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::net::TcpListener;

// Error tracing
use anyhow::{Context, Result};
use tracing::{error, info};

use server::auth::blocklist::SqliteBlocklist;
use server::auth::codec::parse_algorithm;
use server::auth::issuer::TokenIssuer;
use server::database::create;
use server::handlers::http::routes::build_api_router;
use server::AppState;

use shared::config::LiveConfig;
use shared::load_config;

#[derive(Parser, Debug)]
#[command(about = "Book catalogue and review API server")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();

    let args = Args::parse();
    let config = load_config(&args.config).context("Failed to load configuration")?;

    // Startup snapshot — the issuer never re-reads the config, so the secret
    // and algorithm are fixed until restart.
    let secret = config
        .auth
        .resolved_jwt_secret()
        .context("JWT secret missing after validation")?;
    let algorithm = parse_algorithm(&config.auth.jwt_algorithm)
        .map_err(|e| anyhow::anyhow!("{}", e))
        .context("Unsupported signing algorithm")?;
    let issuer = Arc::new(TokenIssuer::new(
        secret,
        algorithm,
        config.auth.access_token_expiry_secs(),
        config.auth.refresh_token_expiry_secs(),
    ));

    let pool = create::open_pool(&config.database.url)
        .await
        .context("Failed to open database")?;
    create::create_tables(&pool)
        .await
        .context("Failed to initialize database schema")?;

    let blocklist = Arc::new(SqliteBlocklist::new(pool.clone()));

    // Membership checks already ignore expired rows; this keeps the table
    // from growing without bound.
    let purge = Arc::clone(&blocklist);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(3600));
        loop {
            interval.tick().await;
            match purge.purge_expired().await {
                Ok(n) if n > 0 => info!("Purged {} expired blocklist entries", n),
                Ok(_) => {}
                Err(e) => error!("Blocklist purge failed: {}", e),
            }
        }
    });

    let addr = config.server.addr();
    let state = AppState {
        db: pool.clone(),
        config: LiveConfig::new(config),
        issuer,
        blocklist,
    };

    let router = Arc::new(build_api_router());

    let listener = TcpListener::bind(&addr)
        .await
        .context(format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);

    loop {
        let (stream, peer) = listener.accept().await.context("Accept failed")?;
        let io = TokioIo::new(stream);
        let state = state.clone();
        let router = Arc::clone(&router);

        tokio::task::spawn(async move {
            // Handle the connection using HTTP1 and dispatch every request on
            // it through the shared router.
            let service = service_fn(move |req| {
                let state = state.clone();
                let router = Arc::clone(&router);
                async move { router.route(req, state).await }
            });

            if let Err(err) = http1::Builder::new()
                .timer(TokioTimer::new())
                .serve_connection(io, service)
                .await
            {
                error!("Error serving connection from {}: {:?}", peer, err);
            }
        });
    }
}
