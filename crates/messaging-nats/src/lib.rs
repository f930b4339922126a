//! NATS JetStream implementation of the messaging crate.
//!
//! Every event subject lives on one stream. A queue group maps to a shared
//! pull consumer: members binding to the same consumer split its messages,
//! and a durable consumer keeps its position while no member is attached.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod consumer;
mod error;
mod subscription;

pub use consumer::{EPHEMERAL_INACTIVE_THRESHOLD, consumer_config, consumer_name};
pub use error::Error;
pub use subscription::NatsSubscription;

use std::sync::Arc;
use std::time::Duration;

use async_nats::Client;
use async_nats::jetstream::Context as JetStreamContext;
use async_nats::jetstream::consumer::PullConsumer;
use async_nats::jetstream::stream::{Config as NatsStreamConfig, Stream as NatsStream};
use async_trait::async_trait;
use ticketing_events::Subject;
use ticketing_messaging::{Connection, MessageHandler, SubscriptionOptions, SubscriptionState};
use tokio::sync::watch;
use tracing::{debug, info, instrument};

/// Configuration for the `NatsConnection`.
#[derive(Clone, Debug)]
pub struct NatsConnectionConfig {
    /// The NATS client to use. Must already be connected.
    pub client: Client,

    /// Name of the stream carrying every event subject.
    pub stream_name: String,

    /// Whether to create the stream if it does not exist yet. When false the
    /// stream must be provisioned out of band.
    pub create_stream: bool,

    /// Number of stream replicas when creating it. Defaults to 1 if not set.
    pub num_replicas: Option<usize>,

    /// Delay before reopening a failed message stream. Defaults to 1 second
    /// if not set.
    pub retry_delay: Option<Duration>,
}

/// A connection to NATS JetStream, shared by every listener in a process.
#[derive(Clone, Debug)]
pub struct NatsConnection {
    client: Client,
    create_stream: bool,
    jetstream_context: JetStreamContext,
    num_replicas: usize,
    retry_delay: Duration,
    stream_name: String,
}

impl NatsConnection {
    /// Creates a new `NatsConnection`. The stream is looked up, or created,
    /// on each subscribe.
    #[must_use]
    pub fn new(
        NatsConnectionConfig {
            client,
            stream_name,
            create_stream,
            num_replicas,
            retry_delay,
        }: NatsConnectionConfig,
    ) -> Self {
        let jetstream_context = async_nats::jetstream::new(client.clone());

        Self {
            client,
            create_stream,
            jetstream_context,
            num_replicas: num_replicas.unwrap_or(1),
            retry_delay: retry_delay.unwrap_or(Duration::from_secs(1)),
            stream_name,
        }
    }

    /// The underlying NATS client.
    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }

    /// Name of the stream carrying every event subject.
    #[must_use]
    pub fn stream_name(&self) -> &str {
        &self.stream_name
    }

    async fn stream(&self) -> Result<NatsStream, Error> {
        if self.create_stream {
            self.jetstream_context
                .get_or_create_stream(NatsStreamConfig {
                    name: self.stream_name.clone(),
                    subjects: Subject::ALL.iter().map(ToString::to_string).collect(),
                    num_replicas: self.num_replicas,
                    ..Default::default()
                })
                .await
                .map_err(|e| Error::CreateStream(e.kind()))
        } else {
            self.jetstream_context
                .get_stream(&self.stream_name)
                .await
                .map_err(|e| Error::GetStream(e.kind()))
        }
    }
}

#[async_trait]
impl Connection for NatsConnection {
    type Error = Error;

    type Subscription = NatsSubscription;

    #[instrument(skip(self, options, handler), fields(stream = %self.stream_name))]
    async fn subscribe<H>(
        &self,
        subject: Subject,
        queue_group: &str,
        options: SubscriptionOptions,
        handler: H,
    ) -> Result<Self::Subscription, Self::Error>
    where
        H: MessageHandler,
    {
        let stream = self.stream().await?;

        let config = consumer_config(subject, queue_group, &options);
        let consumer_name = config.name.clone().unwrap_or_default();

        // Creates the consumer, or updates an existing one to these options.
        let consumer: PullConsumer = self
            .jetstream_context
            .create_consumer_on_stream(config, &self.stream_name)
            .await
            .map_err(|e| Error::CreateConsumer(e.kind()))?;

        debug!(consumer = consumer_name, "Bound consumer");

        let (stop_sender, stop_receiver) = watch::channel(());
        let state = Arc::new(watch::channel(SubscriptionState::Subscribing).0);

        tokio::spawn(subscription::process_messages(
            consumer,
            handler,
            options.manual_ack_mode(),
            self.retry_delay,
            Arc::clone(&state),
            stop_receiver,
        ));

        info!(consumer = consumer_name, "Subscribed");

        Ok(NatsSubscription::new(
            consumer_name,
            queue_group.to_string(),
            state,
            stop_sender,
            stream,
            subject,
        ))
    }
}
