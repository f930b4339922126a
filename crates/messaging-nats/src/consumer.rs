use std::time::Duration;

use async_nats::jetstream::consumer::{AckPolicy, DeliverPolicy, pull};
use ticketing_events::Subject;
use ticketing_messaging::SubscriptionOptions;

/// How long JetStream keeps a non-durable consumer without any member
/// pulling from it.
pub const EPHEMERAL_INACTIVE_THRESHOLD: Duration = Duration::from_secs(60);

/// Name of the consumer backing `group` on `subject`.
///
/// Every member binding under the same group shares the consumer, which is
/// how JetStream spreads messages across them. Characters consumer names may
/// not carry are replaced with `-`.
#[must_use]
pub fn consumer_name(group: &str, subject: Subject) -> String {
    format!("{}_{}", sanitize(group), sanitize(subject.as_str()))
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Pull consumer configuration for a subscription.
///
/// With a durable name the consumer is durable and survives every member
/// leaving; without one it is removed once no member has pulled for
/// [`EPHEMERAL_INACTIVE_THRESHOLD`].
#[must_use]
pub fn consumer_config(
    subject: Subject,
    queue_group: &str,
    options: &SubscriptionOptions,
) -> pull::Config {
    let group = options.durable_name().unwrap_or(queue_group);
    let name = consumer_name(group, subject);

    let (durable_name, inactive_threshold) = match options.durable_name() {
        Some(_) => (Some(name.clone()), Duration::ZERO),
        None => (None, EPHEMERAL_INACTIVE_THRESHOLD),
    };

    pull::Config {
        name: Some(name),
        durable_name,
        inactive_threshold,
        filter_subject: subject.to_string(),
        ack_policy: if options.manual_ack_mode() {
            AckPolicy::Explicit
        } else {
            AckPolicy::None
        },
        ack_wait: options.ack_wait(),
        deliver_policy: if options.deliver_all_available() {
            DeliverPolicy::All
        } else {
            DeliverPolicy::New
        },
        ..Default::default()
    }
}
