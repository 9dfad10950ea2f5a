use lapin::options::BasicPublishOptions;
use lapin::{BasicProperties, Channel};
use serde::Serialize;

use crate::error::PubsubError;

const CONTENT_TYPE_JSON: &str = "application/json";

// Serialize `value` as JSON and publish it to `exchange` under
// `routing_key`. Delivery is advisory: the publish carries no mandatory or
// immediate flags, so the broker silently drops the message when no queue
// is bound under that key. Nothing is retried here.
pub async fn publish_json<T: Serialize>(
    channel: &Channel,
    exchange: &str,
    routing_key: &str,
    value: &T,
) -> Result<(), PubsubError> {
    let payload = encode_payload(exchange, routing_key, value)?;

    // The returned publisher confirm is dropped unawaited; confirms are not
    // enabled on any channel this crate opens.
    let _confirm = channel
        .basic_publish(
            exchange,
            routing_key,
            BasicPublishOptions::default(),
            &payload,
            BasicProperties::default().with_content_type(CONTENT_TYPE_JSON.into()),
        )
        .await
        .map_err(|source| PubsubError::Publish {
            exchange: exchange.to_string(),
            routing_key: routing_key.to_string(),
            source,
        })?;

    tracing::debug!(exchange, routing_key, bytes = payload.len(), "published");
    Ok(())
}

fn encode_payload<T: Serialize>(
    exchange: &str,
    routing_key: &str,
    value: &T,
) -> Result<Vec<u8>, PubsubError> {
    serde_json::to_vec(value).map_err(|source| PubsubError::Serialization {
        exchange: exchange.to_string(),
        routing_key: routing_key.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serializer;

    struct Unencodable;

    impl Serialize for Unencodable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("refuses to encode"))
        }
    }

    #[test]
    fn when_value_is_encodable_then_payload_is_json_bytes() {
        let payload =
            encode_payload("peril_direct", "pause", &true).expect("encode");
        assert_eq!(payload, b"true");
    }

    #[test]
    fn when_value_cannot_be_encoded_then_error_is_serialization_with_context() {
        let error = encode_payload("peril_direct", "pause", &Unencodable)
            .expect_err("must fail");
        assert!(matches!(error, PubsubError::Serialization { .. }));
        assert!(error.to_string().contains("peril_direct"));
        assert!(error.to_string().contains("pause"));
    }
}
