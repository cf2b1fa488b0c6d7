pub mod client;
pub mod events;

pub use self::client::SlackClient;
pub use self::events::{ChatEvent, EnvelopeDecoder, EnvelopeError, InboundEvent};
