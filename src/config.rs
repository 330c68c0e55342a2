//! Process configuration, read once at startup.
//!
//! Parsing works over an arbitrary key lookup so it can be exercised without
//! touching the process environment; `Config::from_env` plugs in `std::env`.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use log::LevelFilter;

use crate::auth::token::DEFAULT_TTL_HOURS;

pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_BCRYPT_COST: u32 = 12;

error_chain! {
    errors {
        Missing(key: &'static str) {
            description("missing configuration value")
            display("{} must be set", key)
        }
        Invalid(key: &'static str, value: String) {
            description("invalid configuration value")
            display("{} has an invalid value: {:?}", key, value)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Postgres,
    Memory,
}

impl FromStr for StoreKind {
    type Err = ();

    fn from_str(s: &str) -> ::std::result::Result<StoreKind, ()> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreKind::Postgres),
            "memory" | "wide" => Ok(StoreKind::Memory),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub store: StoreKind,
    pub database_url: Option<String>,
    pub token_ttl: chrono::Duration,
    pub store_timeout: Duration,
    pub bcrypt_cost: u32,
    pub port: Option<u16>,
    pub log_level: LevelFilter,
}

impl Config {
    pub fn from_env() -> Result<Config> {
        Config::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let jwt_secret = get("JWT_SECRET").ok_or(ErrorKind::Missing("JWT_SECRET"))?;
        let store = parse(&get, "CONDUIT_STORE")?.unwrap_or(StoreKind::Postgres);
        let database_url = get("DATABASE_URL");
        if store == StoreKind::Postgres && database_url.is_none() {
            bail!(ErrorKind::Missing("DATABASE_URL"));
        }

        let ttl_hours: i64 = parse(&get, "TOKEN_TTL_HOURS")?.unwrap_or(DEFAULT_TTL_HOURS);
        if ttl_hours <= 0 {
            bail!(ErrorKind::Invalid("TOKEN_TTL_HOURS", ttl_hours.to_string()));
        }
        let timeout_ms: u64 = parse(&get, "STORE_TIMEOUT_MS")?.unwrap_or(DEFAULT_STORE_TIMEOUT_MS);
        if timeout_ms == 0 {
            bail!(ErrorKind::Invalid("STORE_TIMEOUT_MS", timeout_ms.to_string()));
        }
        let bcrypt_cost: u32 = parse(&get, "BCRYPT_COST")?.unwrap_or(DEFAULT_BCRYPT_COST);
        if !(4..=31).contains(&bcrypt_cost) {
            bail!(ErrorKind::Invalid("BCRYPT_COST", bcrypt_cost.to_string()));
        }

        Ok(Config {
            jwt_secret,
            store,
            database_url,
            token_ttl: chrono::Duration::hours(ttl_hours),
            store_timeout: Duration::from_millis(timeout_ms),
            bcrypt_cost,
            port: parse(&get, "PORT")?,
            log_level: parse(&get, "LOG_LEVEL")?.unwrap_or(LevelFilter::Info),
        })
    }
}

fn parse<T, G>(get: &G, key: &'static str) -> Result<Option<T>>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => match raw.parse() {
            Ok(value) => Ok(Some(value)),
            Err(_) => Err(ErrorKind::Invalid(key, raw).into()),
        },
        None => Ok(None),
    }
}
