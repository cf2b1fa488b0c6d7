use salvo::prelude::*;

use crate::web::handlers::{
    admin::{get_processed_event, reload_dictionary},
    events::slack_events,
    health::{get_status, health_check},
};
use crate::web::metrics::metrics_endpoint;

pub fn create_router(metrics_enabled: bool) -> Router {
    let mut router = Router::new()
        .push(Router::with_path("slack/events").post(slack_events))
        .push(Router::with_path("health").get(health_check))
        .push(Router::with_path("status").get(get_status))
        .push(
            Router::with_path("admin")
                .push(Router::with_path("events/{event_id}").get(get_processed_event))
                .push(Router::with_path("dictionary/reload").post(reload_dictionary)),
        );
    if metrics_enabled {
        router = router.push(Router::with_path("metrics").get(metrics_endpoint));
    }
    router
}
