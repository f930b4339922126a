use std::time::Duration;

/// Ack-wait a listener uses unless it overrides [`Listener::ack_wait`](crate::Listener::ack_wait).
pub const DEFAULT_ACK_WAIT: Duration = Duration::from_millis(5000);

/// Ack-wait the broker applies when a subscription does not set one.
pub const BROKER_DEFAULT_ACK_WAIT: Duration = Duration::from_secs(30);

/// Options applied when registering a subscription.
///
/// Built from [`Connection::subscription_options`](crate::Connection::subscription_options)
/// and refined with the `set_*` methods. The setters are independent, so the
/// order they are called in does not change the result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscriptionOptions {
    ack_wait: Duration,
    deliver_all_available: bool,
    durable_name: Option<String>,
    manual_ack_mode: bool,
}

impl Default for SubscriptionOptions {
    fn default() -> Self {
        Self {
            ack_wait: BROKER_DEFAULT_ACK_WAIT,
            deliver_all_available: false,
            durable_name: None,
            manual_ack_mode: false,
        }
    }
}

impl SubscriptionOptions {
    /// Only an explicit [`Message::ack`](crate::Message::ack) settles a
    /// delivery when enabled. Otherwise the broker settles on delivery.
    #[must_use]
    pub const fn set_manual_ack_mode(mut self, manual: bool) -> Self {
        self.manual_ack_mode = manual;
        self
    }

    /// How long the broker waits for an acknowledgement before redelivering.
    #[must_use]
    pub const fn set_ack_wait(mut self, ack_wait: Duration) -> Self {
        self.ack_wait = ack_wait;
        self
    }

    /// Replay the whole channel when the subscription is first created.
    #[must_use]
    pub const fn set_deliver_all_available(mut self) -> Self {
        self.deliver_all_available = true;
        self
    }

    /// Keep broker-side state under this name across disconnects.
    #[must_use]
    pub fn set_durable_name(mut self, durable_name: impl Into<String>) -> Self {
        self.durable_name = Some(durable_name.into());
        self
    }

    /// The configured ack-wait.
    #[must_use]
    pub const fn ack_wait(&self) -> Duration {
        self.ack_wait
    }

    /// Whether a new subscription starts from the beginning of the channel.
    #[must_use]
    pub const fn deliver_all_available(&self) -> bool {
        self.deliver_all_available
    }

    /// The durable name, if the subscription is durable.
    #[must_use]
    pub fn durable_name(&self) -> Option<&str> {
        self.durable_name.as_deref()
    }

    /// Whether deliveries require an explicit acknowledgement.
    #[must_use]
    pub const fn manual_ack_mode(&self) -> bool {
        self.manual_ack_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_broker_defaults() {
        let options = SubscriptionOptions::default();

        assert!(!options.manual_ack_mode());
        assert!(!options.deliver_all_available());
        assert_eq!(options.durable_name(), None);
        assert_eq!(options.ack_wait(), BROKER_DEFAULT_ACK_WAIT);
    }

    #[test]
    fn test_setter_order_is_irrelevant() {
        let ack_wait = Duration::from_secs(12);

        let one = SubscriptionOptions::default()
            .set_manual_ack_mode(true)
            .set_deliver_all_available()
            .set_ack_wait(ack_wait)
            .set_durable_name("orders-service");

        let other = SubscriptionOptions::default()
            .set_manual_ack_mode(true)
            .set_ack_wait(ack_wait)
            .set_deliver_all_available()
            .set_durable_name("orders-service");

        let reversed = SubscriptionOptions::default()
            .set_durable_name("orders-service")
            .set_ack_wait(ack_wait)
            .set_deliver_all_available()
            .set_manual_ack_mode(true);

        assert_eq!(one, other);
        assert_eq!(one, reversed);
    }
}
