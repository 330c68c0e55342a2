use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::{get, State};
use serde_json::{json, Value};

use crate::state::Conduit;

pub const SERVICE: &str = "conduit-api";

#[get("/health")]
pub async fn health(conduit: &State<Conduit>) -> status::Custom<Json<Value>> {
    let ping = conduit.run(|store| Ok(store.ping()?)).await;
    let (code, state, database) = match ping {
        Ok(()) => (Status::Ok, "ok", "connected"),
        Err(e) => {
            log::warn!("health check failed: {:?}", e);
            (Status::ServiceUnavailable, "unhealthy", "disconnected")
        }
    };
    status::Custom(
        code,
        Json(json!({
            "status": state,
            "service": SERVICE,
            "version": env!("CARGO_PKG_VERSION"),
            "database": database,
        })),
    )
}
