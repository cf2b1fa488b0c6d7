//! Slack Events API intake.
use std::time::Duration;

use salvo::prelude::*;
use tracing::{debug, error, warn};

use super::render_error;
use crate::bot::{BotCore, BotError};
use crate::slack::{ChatEvent, EnvelopeDecoder, EnvelopeError};
use crate::web::metrics::Metrics;
use crate::web::web_state;

/// What to answer Slack with for one delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub status: StatusCode,
    pub body: String,
}

impl DeliveryOutcome {
    fn ok(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            body: body.into(),
        }
    }

    fn error(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Decodes one request body and drives the pipeline for the two
/// actionable shapes. Everything after decoding is bounded by `deadline`.
pub async fn process_delivery(
    decoder: &EnvelopeDecoder,
    bot: &BotCore,
    body: &[u8],
    deadline: Duration,
) -> DeliveryOutcome {
    let event = match decoder.decode(body) {
        Ok(event) => event,
        Err(EnvelopeError::Unverified) => {
            warn!("rejected event with bad verification token");
            return DeliveryOutcome::error(StatusCode::UNAUTHORIZED, "unverified");
        }
        Err(e @ EnvelopeError::Malformed(_)) => {
            debug!("{}", e);
            return DeliveryOutcome::error(StatusCode::BAD_REQUEST, "malformed envelope");
        }
    };

    let inbound = match event {
        ChatEvent::Handshake { challenge } => return DeliveryOutcome::ok(challenge),
        ChatEvent::Ignored { reason } => {
            debug!("ignoring event: {}", reason);
            return DeliveryOutcome::ok("ok");
        }
        ChatEvent::Mention(inbound) | ChatEvent::DirectMessage(inbound) => inbound,
    };

    Metrics::event_received();
    match tokio::time::timeout(deadline, bot.handle_event(&inbound)).await {
        Ok(Ok(disposition)) => {
            debug!(
                "event handled event_id={} disposition={:?}",
                inbound.event_id, disposition
            );
            DeliveryOutcome::ok("ok")
        }
        Ok(Err(BotError::Dedup(e))) => {
            error!("dedup store failed event_id={}: {}", inbound.event_id, e);
            DeliveryOutcome::error(StatusCode::SERVICE_UNAVAILABLE, "dedup store unavailable")
        }
        Ok(Err(e @ BotError::Delivery(_))) => {
            error!("event_id={}: {}", inbound.event_id, e);
            DeliveryOutcome::error(StatusCode::INTERNAL_SERVER_ERROR, "reply not delivered")
        }
        Err(_) => {
            error!(
                "event processing exceeded {:?} event_id={}",
                deadline, inbound.event_id
            );
            DeliveryOutcome::error(StatusCode::GATEWAY_TIMEOUT, "processing timed out")
        }
    }
}

#[handler]
pub async fn slack_events(req: &mut Request, res: &mut Response) {
    let body = match req.payload().await {
        Ok(bytes) => bytes.to_vec(),
        Err(e) => {
            render_error(
                res,
                StatusCode::BAD_REQUEST,
                &format!("failed to read body: {}", e),
            );
            return;
        }
    };

    let state = web_state();
    let outcome = process_delivery(&state.decoder, &state.bot, &body, state.request_timeout).await;
    res.status_code(outcome.status);
    res.render(Text::Plain(outcome.body));
}
