use crate::config::AppConfig;
use crate::models::notification::Notification;
use crate::ports::NotificationSink;
use chrono::Utc;
use prost::Message;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use std::time::Duration;
use tracing::{debug, error, info};

/// Publishes push notifications to Kafka for the delivery service to pick up.
#[derive(Clone)]
pub struct KafkaNotifier {
    producer: FutureProducer,
    topic: String,
    send_timeout: Duration,
}

impl KafkaNotifier {
    /// Creates the producer with the same SASL/SCRAM settings the rest of the platform uses.
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        info!(
            "Initializing Kafka producer for topic: {}",
            config.kafka_notification_topic
        );

        let mut client_config = ClientConfig::new();
        client_config
            .set("bootstrap.servers", &config.kafka_bootstrap_servers)
            .set(
                "message.timeout.ms",
                config.kafka_message_timeout_ms.to_string(),
            )
            // SASL Configuration
            .set("security.protocol", &config.kafka_security_protocol)
            .set("sasl.mechanism", &config.kafka_sasl_mechanism)
            .set("sasl.username", &config.kafka_username)
            .set("sasl.password", &config.kafka_password);

        let producer: FutureProducer = client_config.create()?;

        Ok(Self {
            producer,
            topic: config.kafka_notification_topic.clone(),
            send_timeout: Duration::from_millis(config.kafka_message_timeout_ms),
        })
    }
}

impl KafkaNotifier {
    /// Waits for queued notifications to be delivered, e.g. before exiting.
    pub fn flush(&self) -> anyhow::Result<()> {
        self.producer.flush(Timeout::After(self.send_timeout))?;
        Ok(())
    }
}

impl NotificationSink for KafkaNotifier {
    fn send(&self, notification: Notification) {
        let key = notification.user_id.to_string();
        let payload = notification
            .to_wire(Utc::now().timestamp_millis())
            .encode_to_vec();
        let record = FutureRecord::to(&self.topic).key(&key).payload(&payload);

        // Enqueue now, observe delivery in the background; the engine never waits on the broker.
        let delivery = match self.producer.send_result(record) {
            Ok(delivery) => delivery,
            Err((e, _)) => {
                error!(user_id = %key, error = %e, "Failed to enqueue notification");
                return;
            }
        };

        tokio::spawn(async move {
            match delivery.await {
                Ok(Ok((partition, offset))) => {
                    debug!(user_id = %key, partition, offset, "Notification published");
                }
                Ok(Err((e, _))) => {
                    error!(user_id = %key, error = %e, "Failed to publish notification");
                }
                Err(_) => {
                    error!(user_id = %key, "Notification delivery cancelled");
                }
            }
        });
    }
}
