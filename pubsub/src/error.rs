use thiserror::Error;

// Everything that can go wrong in the pub/sub layer. Topology and
// connection errors propagate to the caller; serialization and handler
// failures stay contained in the publish call or delivery loop.
#[derive(Debug, Error)]
pub enum PubsubError {
    #[error("broker connection failure")]
    Connection {
        #[source]
        source: lapin::Error,
    },

    #[error("failed to declare {name}")]
    Declaration {
        name: String,
        #[source]
        source: lapin::Error,
    },

    #[error("{name} is already declared with conflicting parameters")]
    TopologyConflict {
        name: String,
        #[source]
        source: lapin::Error,
    },

    #[error("failed to bind queue {queue} to exchange {exchange} under key {routing_key}")]
    Binding {
        queue: String,
        exchange: String,
        routing_key: String,
        #[source]
        source: lapin::Error,
    },

    #[error("failed to encode payload for exchange {exchange} under key {routing_key}")]
    Serialization {
        exchange: String,
        routing_key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("broker rejected publish to exchange {exchange} under key {routing_key}")]
    Publish {
        exchange: String,
        routing_key: String,
        #[source]
        source: lapin::Error,
    },

    #[error("failed to decode payload delivered on queue {queue}")]
    Deserialization {
        queue: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to open the delivery stream for queue {queue}")]
    Consume {
        queue: String,
        #[source]
        source: lapin::Error,
    },
}
