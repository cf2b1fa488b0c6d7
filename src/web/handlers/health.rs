use salvo::prelude::*;
use serde_json::json;

use crate::db::manager::DbType;
use crate::web::web_state;

#[handler]
pub async fn health_check(res: &mut Response) {
    res.render(Json(json!({ "status": "ok" })));
}

#[handler]
pub async fn get_status(res: &mut Response) {
    let state = web_state();
    let database = match state.db_manager.db_type() {
        DbType::Postgres => "postgres",
        DbType::Sqlite => "sqlite",
    };

    res.render(Json(json!({
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": state.started_at.elapsed().as_secs(),
        "database": database,
        "dictionary_terms": state.dictionary.loaded_terms(),
    })));
}
