use crate::connection::ConnectionError;

use thiserror::Error;
use ticketing_events::Subject;

/// Errors that can occur while starting listeners.
#[derive(Debug, Error)]
pub enum Error<CE>
where
    CE: ConnectionError,
{
    /// The broker refused or could not register the subscription.
    #[error("failed to subscribe to {subject} as {queue_group}: {source}")]
    Subscribe {
        /// The subject being subscribed to.
        subject: Subject,

        /// The queue group being joined.
        queue_group: String,

        /// The connection error.
        #[source]
        source: CE,
    },
}
