use salvo::prelude::*;
use serde_json::json;
use tracing::info;

use super::render_error;
use crate::web::web_state;

#[handler]
pub async fn get_processed_event(req: &mut Request, res: &mut Response) {
    let event_id = match req.param::<String>("event_id") {
        Some(v) if !v.is_empty() => v,
        _ => {
            render_error(res, StatusCode::BAD_REQUEST, "missing event id");
            return;
        }
    };

    match web_state()
        .db_manager
        .event_store()
        .find_by_event_id(&event_id)
        .await
    {
        Ok(Some(event)) => res.render(Json(event)),
        Ok(None) => render_error(res, StatusCode::NOT_FOUND, "event not processed"),
        Err(err) => render_error(
            res,
            StatusCode::INTERNAL_SERVER_ERROR,
            &format!("database error: {}", err),
        ),
    }
}

#[handler]
pub async fn reload_dictionary(res: &mut Response) {
    let terms = web_state().dictionary.reload().await;
    info!("supplemental dictionary reloaded terms={}", terms);
    res.render(Json(json!({ "reloaded": true, "terms": terms })));
}
