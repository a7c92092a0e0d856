//! Application entry point.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use secrecy::SecretString;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use transaction_proof_relayer::api::{RateLimitConfig, RouterOptions, create_router_with_options};
use transaction_proof_relayer::app::{AppState, PipelineConfig};
use transaction_proof_relayer::domain::AttestationRoute;
use transaction_proof_relayer::infra::analytics::{DEFAULT_DUNE_API_URL, DEFAULT_QUERY_ID};
use transaction_proof_relayer::infra::{
    AttestationConfig, BrevisGatewayClient, BrevisProverClient, DuneAnalyticsClient,
    EvmRpcClient, RpcClientConfig,
};

const DEFAULT_BSC_RPC_URL: &str = "http://localhost:8545";

/// Application configuration
struct Config {
    host: String,
    port: u16,
    prover_url: String,
    gateway_url: String,
    rpc_url: String,
    dune_api_key: Option<SecretString>,
    dune_api_url: String,
    dune_query_id: u64,
    http_timeout: Duration,
    pipeline: PipelineConfig,
    attestation: AttestationConfig,
    enable_rate_limiting: bool,
    rate_limit_config: RateLimitConfig,
    static_dir: PathBuf,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    fn from_env() -> Result<Self> {
        let prover_url = env_opt("ENV_PROVER_URL").context("ENV_PROVER_URL not set")?;
        let gateway_url =
            env_opt("ENV_BREVIS_SERVICE_URL").context("ENV_BREVIS_SERVICE_URL not set")?;
        let rpc_url =
            env_opt("ENV_BSC_RPC_URL").unwrap_or_else(|| DEFAULT_BSC_RPC_URL.to_string());

        let dune_api_key = env_opt("ENV_DUNE_API_KEY").map(SecretString::from);
        let dune_api_url =
            env_opt("DUNE_API_URL").unwrap_or_else(|| DEFAULT_DUNE_API_URL.to_string());

        let route = AttestationRoute {
            source_chain_id: env_or("SOURCE_CHAIN_ID", 56),
            dest_chain_id: env_or("DEST_CHAIN_ID", 97),
            option: env_or("ATTESTATION_OPTION", 0),
            callback_address: env_opt("CALLBACK_ADDRESS"),
            refund_address: env_opt("REFUND_ADDRESS"),
        };

        let pipeline = PipelineConfig {
            poll_interval: Duration::from_millis(env_or("QUERY_POLL_INTERVAL_MS", 500)),
            query_timeout: Duration::from_secs(env_or("QUERY_TIMEOUT_SECS", 300)),
            route,
        };

        let attestation = AttestationConfig {
            poll_interval: Duration::from_secs(env_or("ATTESTATION_POLL_INTERVAL_SECS", 5)),
            timeout: Duration::from_secs(env_or("ATTESTATION_TIMEOUT_SECS", 600)),
        };

        let enable_rate_limiting = env::var("ENABLE_RATE_LIMITING")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_or("PORT", 8081),
            prover_url,
            gateway_url,
            rpc_url,
            dune_api_key,
            dune_api_url,
            dune_query_id: env_or("DUNE_QUERY_ID", DEFAULT_QUERY_ID),
            http_timeout: Duration::from_secs(env_or("HTTP_TIMEOUT_SECS", 30)),
            pipeline,
            attestation,
            enable_rate_limiting,
            rate_limit_config: RateLimitConfig::from_env(),
            static_dir: PathBuf::from(env_opt("STATIC_DIR").unwrap_or_else(|| "static".into())),
        })
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    let registry = tracing_subscriber::registry().with(env_filter);
    if env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing();

    info!("Transaction Proof Relayer v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;

    info!("Initializing infrastructure...");

    let analytics = DuneAnalyticsClient::new(
        config.dune_api_key.clone(),
        Some(config.dune_api_url.clone()),
        config.dune_query_id,
        config.http_timeout,
    )?;
    info!(query_id = config.dune_query_id, "   ✓ Analytics client created");

    let chain_reader = EvmRpcClient::new(
        &config.rpc_url,
        RpcClientConfig {
            timeout: config.http_timeout,
            ..RpcClientConfig::default()
        },
    )?;
    info!(rpc_url = %config.rpc_url, "   ✓ Chain reader created");

    let prover = BrevisProverClient::new(&config.prover_url, config.http_timeout)?;
    info!("   ✓ Prover client created");

    let gateway = BrevisGatewayClient::new(
        &config.gateway_url,
        config.http_timeout,
        config.attestation.clone(),
    )?;
    info!(
        src_chain_id = config.pipeline.route.source_chain_id,
        dst_chain_id = config.pipeline.route.dest_chain_id,
        "   ✓ Attestation client created"
    );

    let app_state = Arc::new(AppState::with_config(
        Arc::new(analytics),
        Arc::new(chain_reader),
        Arc::new(prover),
        Arc::new(gateway),
        config.pipeline.clone(),
    ));

    let rate_limit = if config.enable_rate_limiting {
        info!("   ✓ Rate limiting enabled");
        Some(config.rate_limit_config)
    } else {
        info!("   ○ Rate limiting disabled");
        None
    };
    let router = create_router_with_options(
        app_state,
        RouterOptions {
            rate_limit,
            static_dir: config.static_dir.clone(),
        },
    );

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Server starting on http://{}", addr);
    info!("Swagger UI available at http://{}/swagger-ui", addr);
    info!("OpenAPI spec at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
