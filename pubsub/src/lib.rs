// Thin typed publish/subscribe layer over an AMQP broker: topology
// declaration, serialize-and-send publishing, and handler-driven
// subscriptions with explicit acknowledgment.

mod connect;
mod error;
mod publish;
mod subscribe;
mod topology;

pub use connect::{connect, open_channel, redacted_amqp_url};
pub use error::PubsubError;
pub use publish::publish_json;
pub use subscribe::{AckDecision, Subscription, subscribe_json};
pub use topology::{QueueType, declare_and_bind, declare_exchange};

// Re-export the broker types callers hold, so the binaries only talk to
// this crate.
pub use lapin::{Channel, Connection, ExchangeKind, Queue};
