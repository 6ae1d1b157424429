//! LumenPass API Server
//!
//! Off-chain companion to the LumenPass Stellar contracts: wallets, groups,
//! invoices, paylinks, payouts, savings goals and marketplace listings.
//! Uses hexagonal (ports & adapters) architecture for clean separation of concerns.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::State,
    middleware,
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use chrono::Duration;
use sea_orm::{Database, DatabaseConnection};
use serde::Serialize;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;
use tower_governor::GovernorLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod adapters;
mod app;
mod auth;
mod config;
mod domain;
mod entity;
mod error;
mod handlers;

#[cfg(test)]
mod test_utils;


use adapters::{
    HorizonClientImpl, PostgresGroupRepository, PostgresInvoiceRepository,
    PostgresMarketplaceRepository, PostgresPaylinkRepository, PostgresPayoutRepository,
    PostgresSavingsGoalRepository, PostgresUserRepository,
};
use app::{
    ExplorerLinks, GroupService, GroupTerms, InvoiceService, MarketplaceService, PaylinkService,
    PayoutService, SavingsService, SettlementService, SettlementTiming, UserService,
};
use config::Config;

type SharedSettlementService = SettlementService<
    PostgresInvoiceRepository,
    PostgresPaylinkRepository,
    PostgresUserRepository,
    HorizonClientImpl,
>;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService<PostgresUserRepository>>,
    pub group_service: Arc<GroupService<PostgresGroupRepository, PostgresUserRepository>>,
    pub invoice_service: Arc<InvoiceService<PostgresInvoiceRepository, PostgresPaylinkRepository>>,
    pub paylink_service: Arc<PaylinkService<PostgresPaylinkRepository>>,
    pub payout_service: Arc<PayoutService<PostgresPayoutRepository>>,
    pub savings_service: Arc<SavingsService<PostgresSavingsGoalRepository>>,
    pub marketplace_service: Arc<MarketplaceService<PostgresMarketplaceRepository>>,
    pub settlement_service: Arc<SharedSettlementService>,
    pub explorer: ExplorerLinks,
    pub config: Config,
}

impl AppState {
    /// Wire every service over one database connection and Horizon client
    pub fn new(config: Config, db: DatabaseConnection) -> Self {
        let user_repo = Arc::new(PostgresUserRepository::new(db.clone()));
        let group_repo = Arc::new(PostgresGroupRepository::new(db.clone()));
        let invoice_repo = Arc::new(PostgresInvoiceRepository::new(db.clone()));
        let paylink_repo = Arc::new(PostgresPaylinkRepository::new(db.clone()));
        let payout_repo = Arc::new(PostgresPayoutRepository::new(db.clone()));
        let savings_repo = Arc::new(PostgresSavingsGoalRepository::new(db.clone()));
        let market_repo = Arc::new(PostgresMarketplaceRepository::new(db));

        let horizon = Arc::new(HorizonClientImpl::new(config.horizon_url.clone()));

        let group_service = GroupService::new(
            group_repo,
            user_repo.clone(),
            GroupTerms {
                membership_duration: Duration::seconds(config.membership_duration_seconds),
                membership_price_stroops: config.membership_price_stroops,
                subscription_price_usd: config.subscription_price_usd.clone(),
            },
        );

        let settlement_service = SettlementService::new(
            invoice_repo.clone(),
            paylink_repo.clone(),
            user_repo.clone(),
            horizon,
            SettlementTiming::from_config(
                config.settlement_timeout_seconds,
                config.settlement_poll_millis,
            ),
        );

        Self {
            user_service: Arc::new(UserService::new(user_repo)),
            group_service: Arc::new(group_service),
            invoice_service: Arc::new(InvoiceService::new(invoice_repo, paylink_repo.clone())),
            paylink_service: Arc::new(PaylinkService::new(paylink_repo)),
            payout_service: Arc::new(PayoutService::new(payout_repo)),
            savings_service: Arc::new(SavingsService::new(savings_repo)),
            marketplace_service: Arc::new(MarketplaceService::new(
                market_repo,
                config.transfer_cooldown_seconds,
                config.platform_fee_bps,
            )),
            settlement_service: Arc::new(settlement_service),
            explorer: ExplorerLinks::from_config(&config),
            config,
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    network: String,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        network: state.config.network_passphrase.clone(),
    })
}

/// Build the HTTP router
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    // 2 req/sec sustained, burst of 5, keyed on the peer socket address
    let governor_config = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(PeerIpKeyExtractor)
            .per_second(2)
            .burst_size(5)
            .finish()
            .context("Failed to build governor config")?,
    );

    // Wallet registration issues API keys, so it is rate limited
    let rate_limited_routes = Router::new()
        .route("/users", post(handlers::store_user))
        .layer(GovernorLayer {
            config: governor_config,
        });

    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/network", get(handlers::get_network))
        .route("/users/:id", get(handlers::get_user))
        .route("/groups", get(handlers::list_groups))
        .route("/groups/fee-quote", get(handlers::fee_quote))
        .route("/groups/:id", get(handlers::get_group))
        .route("/groups/:id/members", get(handlers::list_members))
        .route("/invoices/:slug", get(handlers::get_invoice))
        .route("/invoices/:slug/settle", post(handlers::settle_invoice))
        .route("/paylinks/:handle", get(handlers::get_paylink))
        .route("/paylinks/:handle/verify", post(handlers::verify_payment))
        .route("/marketplace/listings", get(handlers::list_listings))
        .route("/marketplace/fees", get(handlers::fee_breakdown))
        .route("/accounts/:address/balance", get(handlers::get_balance));

    let protected_routes = Router::new()
        .route("/me", get(handlers::get_me).patch(handlers::update_me))
        // Groups
        .route("/groups", post(handlers::create_group))
        .route("/groups/mine", get(handlers::list_owned))
        .route("/groups/joined", get(handlers::list_joined))
        .route("/groups/:id/settings", patch(handlers::update_settings))
        .route("/groups/:id/description", patch(handlers::update_description))
        .route("/groups/:id/join", post(handlers::join_group))
        .route("/groups/:id/leave", post(handlers::leave_group))
        .route("/groups/:id/renew", post(handlers::renew_subscription))
        // Invoices
        .route(
            "/invoices",
            get(handlers::list_invoices).post(handlers::create_invoice),
        )
        .route("/invoices/:slug", delete(handlers::archive_invoice))
        .route("/invoices/:slug/register", post(handlers::register_invoice))
        .route("/invoices/:slug/notes", patch(handlers::update_notes))
        .route("/invoices/:slug/paylink", post(handlers::attach_paylink))
        .route("/invoices/:slug/paid", post(handlers::mark_paid))
        // Paylinks
        .route(
            "/paylinks",
            get(handlers::list_paylinks).post(handlers::create_paylink),
        )
        .route("/paylinks/:handle", delete(handlers::archive_paylink))
        // Payouts
        .route(
            "/payouts",
            get(handlers::list_schedules).post(handlers::create_schedule),
        )
        .route(
            "/payouts/:id",
            put(handlers::update_schedule).delete(handlers::delete_schedule),
        )
        .route(
            "/payouts/:id/executions",
            get(handlers::list_executions).post(handlers::record_execution),
        )
        .route("/payouts/:id/preview", get(handlers::preview_split))
        // Savings
        .route(
            "/savings",
            get(handlers::list_goals).post(handlers::create_goal),
        )
        .route(
            "/savings/:id",
            patch(handlers::update_goal).delete(handlers::archive_goal),
        )
        .route(
            "/savings/:id/movements",
            get(handlers::list_movements).post(handlers::record_movement),
        )
        // Marketplace
        .route("/marketplace/listings", post(handlers::create_listing))
        .route("/marketplace/listings/mine", get(handlers::list_my_listings))
        .route(
            "/marketplace/listings/:listing_id/cancel",
            post(handlers::cancel_listing),
        )
        .route(
            "/marketplace/listings/:listing_id/purchase",
            post(handlers::purchase_listing),
        )
        .route("/marketplace/stats", get(handlers::get_stats))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    Ok(Router::new()
        .merge(public_routes)
        .merge(rate_limited_routes)
        .merge(protected_routes)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,lumenpass_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting LumenPass API...");

    let config = Config::from_env()?;
    tracing::info!(
        horizon = %config.horizon_url,
        network = %config.network_passphrase,
        "Configuration loaded"
    );
    if config.platform_treasury_address.is_none() && config.platform_fee_bps > 0 {
        tracing::warn!("PLATFORM_FEE_BPS is set but PLATFORM_TREASURY_ADDRESS is not");
    }

    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = AppState::new(config, db);
    let app = build_router(state)?;

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
