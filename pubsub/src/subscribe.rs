use std::panic::{AssertUnwindSafe, catch_unwind};

use futures_util::StreamExt;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicQosOptions,
};
use lapin::types::FieldTable;
use lapin::{Channel, Connection, Consumer};
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;

use crate::error::PubsubError;
use crate::topology::{QueueType, declare_and_bind};

// Upper bound on unacknowledged deliveries per consumer. Bounds memory use
// and applies backpressure against slow handlers.
const PREFETCH_COUNT: u16 = 10;

const REPLY_SUCCESS: u16 = 200;

// Handler verdict for one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckDecision {
    // Processed; permanently remove from the queue.
    Ack,
    // Transient failure; return to the queue for redelivery.
    NackRequeue,
    // Permanent failure; remove without redelivery.
    NackDiscard,
}

// A live (queue, handler) binding. Owns its channel and its consumption
// task for its whole lifetime.
pub struct Subscription {
    queue: String,
    channel: Channel,
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn queue_name(&self) -> &str {
        &self.queue
    }

    // Closing the channel is the single cancellation mechanism: the broker
    // requeues whatever is still in flight and the delivery stream ends,
    // letting the consumption task run off the end of its loop. Waits for
    // the current message at most, never for the rest of the queue.
    pub async fn cancel(self) {
        if let Err(error) = self.channel.close(REPLY_SUCCESS, "subscription cancelled").await {
            tracing::warn!(queue = %self.queue, %error, "failed to close subscription channel");
        }
        if let Err(error) = self.task.await {
            tracing::warn!(queue = %self.queue, %error, "subscription task ended abnormally");
        }
        tracing::info!(queue = %self.queue, "subscription cancelled");
    }
}

// Declare and bind `queue_name`, then consume it on a dedicated channel,
// feeding each decoded payload to `handler` and resolving the delivery
// according to the returned decision. Deliveries are handled strictly one
// at a time, so a handler never observes two messages from the same queue
// concurrently; create several subscriptions for parallel consumption.
pub async fn subscribe_json<T, F>(
    conn: &Connection,
    exchange: &str,
    queue_name: &str,
    routing_key: &str,
    queue_type: QueueType,
    handler: F,
) -> Result<Subscription, PubsubError>
where
    T: DeserializeOwned + Send + 'static,
    F: FnMut(T) -> AckDecision + Send + 'static,
{
    let (channel, queue) =
        declare_and_bind(conn, exchange, queue_name, routing_key, queue_type).await?;

    channel
        .basic_qos(PREFETCH_COUNT, BasicQosOptions::default())
        .await
        .map_err(|source| PubsubError::Consume {
            queue: queue_name.to_string(),
            source,
        })?;

    // Manual acknowledgment; the consumer tag is left to the broker.
    let consumer = channel
        .basic_consume(
            queue.name().as_str(),
            "",
            BasicConsumeOptions::default(),
            FieldTable::default(),
        )
        .await
        .map_err(|source| PubsubError::Consume {
            queue: queue_name.to_string(),
            source,
        })?;

    tracing::info!(queue = queue_name, exchange, routing_key, "subscription active");

    let task = tokio::spawn(consume_loop(queue_name.to_string(), consumer, handler));

    Ok(Subscription {
        queue: queue_name.to_string(),
        channel,
        task,
    })
}

async fn consume_loop<T, F>(queue: String, mut consumer: Consumer, mut handler: F)
where
    T: DeserializeOwned + Send + 'static,
    F: FnMut(T) -> AckDecision + Send + 'static,
{
    while let Some(next) = consumer.next().await {
        let delivery = match next {
            Ok(delivery) => delivery,
            Err(error) => {
                tracing::error!(queue = %queue, %error, "delivery stream failed");
                break;
            }
        };

        let decision = process_delivery(&queue, &delivery.data, &mut handler);
        let resolved = match decision {
            AckDecision::Ack => delivery.ack(BasicAckOptions::default()).await,
            AckDecision::NackRequeue => {
                delivery
                    .nack(BasicNackOptions {
                        requeue: true,
                        ..BasicNackOptions::default()
                    })
                    .await
            }
            AckDecision::NackDiscard => {
                delivery
                    .nack(BasicNackOptions {
                        requeue: false,
                        ..BasicNackOptions::default()
                    })
                    .await
            }
        };

        // A failed resolution usually means the channel is going away; the
        // next poll of the stream reports it, so only log here.
        if let Err(error) = resolved {
            tracing::error!(
                queue = %queue,
                delivery_tag = delivery.delivery_tag,
                %error,
                "failed to resolve delivery"
            );
        }
    }
    tracing::info!(queue = %queue, "delivery stream closed");
}

// Per-delivery step, kept free of broker types so it can be tested
// directly: decode the payload, run the handler, map failures to a
// resolution. A malformed payload is discarded outright since retrying
// cannot make it well formed; a panicking handler is treated as a
// transient failure and the delivery is requeued.
fn process_delivery<T, F>(queue: &str, payload: &[u8], handler: &mut F) -> AckDecision
where
    T: DeserializeOwned,
    F: FnMut(T) -> AckDecision,
{
    let value: T = match serde_json::from_slice(payload) {
        Ok(value) => value,
        Err(source) => {
            let error = PubsubError::Deserialization {
                queue: queue.to_string(),
                source,
            };
            tracing::warn!(queue = %queue, %error, "discarding malformed delivery");
            return AckDecision::NackDiscard;
        }
    };

    match catch_unwind(AssertUnwindSafe(|| handler(value))) {
        Ok(decision) => decision,
        Err(_) => {
            tracing::error!(queue = %queue, "handler panicked, requeueing delivery");
            AckDecision::NackRequeue
        }
    }
}
