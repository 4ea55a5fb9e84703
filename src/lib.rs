pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;
pub mod state;

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::middleware::{ErrorHandlers, Logger};
use actix_web::{web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::address_service::AddressService;
use application::cart_service::CartService;
use application::checkout_service::CheckoutService;
use application::follow_up::OrderFollowUp;
use config::{AppConfig, ConfigError};
use domain::estimate::{EstimateCalculator, PricingPolicy};
use domain::order::TimestampOrderNumbers;
use domain::ports::Notifier;
use infrastructure::{JsonQuotationWriter, LogNotifier, SlackNotifier, StorageBackend};
use state::AppState;

pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), String> {
    let mut conn = pool
        .get()
        .map_err(|e| format!("Failed to get DB connection for migrations: {e}"))?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| format!("Failed to run database migrations: {e}"))?;
    Ok(())
}

/// Wire the services over `storage` from the loaded configuration.
pub fn build_state(config: &AppConfig, storage: StorageBackend) -> Result<AppState, ConfigError> {
    let calculator = EstimateCalculator::new(
        PricingPolicy::default(),
        Arc::new(config.load_rate_table()?),
        Arc::new(config.converter()?),
    );

    let notifier: Arc<dyn Notifier> = match &config.slack_webhook_url {
        Some(url) => Arc::new(SlackNotifier::new(url.clone()).map_err(|e| {
            ConfigError::InvalidValue {
                key: "SLACK_WEBHOOK_URL",
                value: url.clone(),
                reason: e.to_string(),
            }
        })?),
        None => {
            log::warn!("SLACK_WEBHOOK_URL is not set; notifications go to the log only");
            Arc::new(LogNotifier)
        }
    };

    Ok(AppState {
        cart: CartService::new(storage.clone(), calculator),
        addresses: AddressService::new(storage.clone()),
        checkout: CheckoutService::new(
            storage,
            Arc::new(TimestampOrderNumbers::new(config.order_number_offset)),
            config.auto_confirm_payment,
        ),
        follow_up: OrderFollowUp::new(
            Arc::new(JsonQuotationWriter::new(config.quotation_dir.clone())),
            notifier,
        ),
    })
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    state: AppState,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let openapi = handlers::ApiDoc::openapi();
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(
                ErrorHandlers::new()
                    .handler(StatusCode::INTERNAL_SERVER_ERROR, handlers::alert_internal_error),
            )
            .wrap(Logger::default())
            .configure(handlers::routes)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
