use std::process;
use std::sync::Arc;

use conduit::auth::password::PasswordHasher;
use conduit::auth::token::TokenIssuer;
use conduit::config::{Config, StoreKind};
use conduit::db::{self, PgStore};
use conduit::logger;
use conduit::repo::Store;
use conduit::state::Conduit;
use conduit::wide::WideStore;
use dotenv::dotenv;

fn open_store(config: &Config) -> Result<Arc<dyn Store>, String> {
    match config.store {
        StoreKind::Memory => {
            log::warn!("using the in-process store; data is lost on exit");
            Ok(Arc::new(WideStore::new()))
        }
        StoreKind::Postgres => {
            let url = config.database_url.as_deref().ok_or("DATABASE_URL must be set")?;
            let pool = db::init_pool(url, config.store_timeout).map_err(|e| format!("database pool: {}", e))?;
            Ok(Arc::new(PgStore::new(pool)))
        }
    }
}

fn build(config: &Config) -> Result<Conduit, String> {
    let store = open_store(config)?;
    let tokens = TokenIssuer::new(config.jwt_secret.as_bytes(), config.token_ttl).map_err(|e| e.to_string())?;
    let passwords = PasswordHasher::new(config.bcrypt_cost);
    Ok(Conduit::new(store, tokens, passwords, config.store_timeout))
}

#[rocket::main]
async fn main() {
    dotenv().ok();
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {}", e);
            process::exit(1);
        }
    };
    if let Err(e) = logger::setup_logging(config.log_level) {
        eprintln!("failed to initialize logging: {}", e);
        process::exit(1);
    }

    let app = match build(&config) {
        Ok(app) => app,
        Err(e) => {
            log::error!("startup failed: {}", e);
            process::exit(1);
        }
    };
    log::info!("starting with {:?} store", config.store);

    let mut figment = rocket::Config::figment();
    if let Some(port) = config.port {
        figment = figment.merge(("port", port));
    }
    if let Err(e) = conduit::rocket(app).configure(figment).launch().await {
        log::error!("server stopped: {}", e);
        process::exit(1);
    }
}
