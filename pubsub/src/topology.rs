use lapin::options::{ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions};
use lapin::types::FieldTable;
use lapin::{Channel, Connection, ExchangeKind, Queue};

use crate::error::PubsubError;

// Queue durability policy. The three low-level AMQP queue flags are derived
// from this value in exactly one place and never set independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueType {
    // Exclusive to its connection, cleaned up by the broker on disconnect.
    Transient,
    // Survives broker restarts, shared between consumers.
    Durable,
}

impl QueueType {
    fn declare_options(self) -> QueueDeclareOptions {
        let durable = matches!(self, QueueType::Durable);
        QueueDeclareOptions {
            durable,
            exclusive: !durable,
            auto_delete: !durable,
            ..QueueDeclareOptions::default()
        }
    }
}

// Open a fresh channel, declare `queue_name` under the given policy and
// bind it to `exchange` under `routing_key`. Declaration is idempotent:
// redeclaring with identical parameters is a no-op, while a conflicting
// redeclaration surfaces as `TopologyConflict`. Nothing is retried here.
pub async fn declare_and_bind(
    conn: &Connection,
    exchange: &str,
    queue_name: &str,
    routing_key: &str,
    queue_type: QueueType,
) -> Result<(Channel, Queue), PubsubError> {
    let channel = conn
        .create_channel()
        .await
        .map_err(|source| PubsubError::Connection { source })?;

    let queue = channel
        .queue_declare(
            queue_name,
            queue_type.declare_options(),
            FieldTable::default(),
        )
        .await
        .map_err(|source| classify_declare_error(queue_name, source))?;

    channel
        .queue_bind(
            queue_name,
            exchange,
            routing_key,
            QueueBindOptions::default(),
            FieldTable::default(),
        )
        .await
        .map_err(|source| PubsubError::Binding {
            queue: queue_name.to_string(),
            exchange: exchange.to_string(),
            routing_key: routing_key.to_string(),
            source,
        })?;

    tracing::debug!(
        queue = queue_name,
        exchange,
        routing_key,
        ?queue_type,
        "queue declared and bound"
    );
    Ok((channel, queue))
}

// Idempotently declare a durable exchange. Both peril processes declare the
// direct and topic exchanges at bootstrap, whichever starts first wins.
pub async fn declare_exchange(
    channel: &Channel,
    name: &str,
    kind: ExchangeKind,
) -> Result<(), PubsubError> {
    channel
        .exchange_declare(
            name,
            kind,
            ExchangeDeclareOptions {
                durable: true,
                ..ExchangeDeclareOptions::default()
            },
            FieldTable::default(),
        )
        .await
        .map_err(|source| classify_declare_error(name, source))?;
    tracing::debug!(exchange = name, "exchange declared");
    Ok(())
}

fn classify_declare_error(name: &str, source: lapin::Error) -> PubsubError {
    if is_conflict(&source) {
        PubsubError::TopologyConflict {
            name: name.to_string(),
            source,
        }
    } else {
        PubsubError::Declaration {
            name: name.to_string(),
            source,
        }
    }
}

// AMQP 405 RESOURCE_LOCKED and 406 PRECONDITION_FAILED mean the declaration
// conflicts with existing topology rather than indicating a transport fault.
fn is_conflict(error: &lapin::Error) -> bool {
    match error {
        lapin::Error::ProtocolError(amqp) => matches!(amqp.get_id(), 405 | 406),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lapin::protocol::AMQPError;

    fn protocol_error(code: u16) -> lapin::Error {
        let amqp = AMQPError::from_id(code, "broker refused".into())
            .expect("known AMQP error code");
        lapin::Error::ProtocolError(amqp)
    }

    #[test]
    fn when_policy_is_transient_then_queue_is_exclusive_and_auto_delete() {
        let options = QueueType::Transient.declare_options();
        assert!(!options.durable);
        assert!(options.exclusive);
        assert!(options.auto_delete);
    }

    #[test]
    fn when_policy_is_durable_then_queue_is_shared_and_persistent() {
        let options = QueueType::Durable.declare_options();
        assert!(options.durable);
        assert!(!options.exclusive);
        assert!(!options.auto_delete);
    }

    #[test]
    fn when_broker_reports_precondition_failed_then_error_is_topology_conflict() {
        let error = classify_declare_error("game_logs", protocol_error(406));
        assert!(matches!(error, PubsubError::TopologyConflict { .. }));
        assert!(error.to_string().contains("game_logs"));
    }

    #[test]
    fn when_broker_reports_resource_locked_then_error_is_topology_conflict() {
        let error = classify_declare_error("pause.alice", protocol_error(405));
        assert!(matches!(error, PubsubError::TopologyConflict { .. }));
    }

    #[test]
    fn when_declaration_fails_for_other_reasons_then_error_is_declaration() {
        let source = lapin::Error::InvalidChannelState(lapin::ChannelState::Closed);
        let error = classify_declare_error("pause.alice", source);
        assert!(matches!(error, PubsubError::Declaration { .. }));
        assert!(error.to_string().contains("pause.alice"));
    }
}
