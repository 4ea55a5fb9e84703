use std::io;

use dotenvy::dotenv;
use proxy_checkout::config::AppConfig;
use proxy_checkout::infrastructure::{InMemoryStorage, PgStorage, StorageBackend};
use proxy_checkout::{build_server, build_state, create_pool, run_migrations};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let storage = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url).map_err(io::Error::other)?;
            run_migrations(&pool).map_err(io::Error::other)?;
            StorageBackend::Postgres(PgStorage::new(pool))
        }
        None => StorageBackend::Memory(InMemoryStorage::new()),
    };
    log::info!("Using {} storage", storage.name());

    let state = build_state(&config, storage)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    build_server(state, &config.host, config.port)?.await
}
