//! Side effects requested by the stream and sidecar state machines.

use std::time::Duration;

/// Work for the driver, keyed by a request ticket.
///
/// The state machines never perform I/O themselves. A completion is
/// delivered back with the same ticket and compared against the current one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<T> {
    /// Issue the fetch now.
    Fetch(T),
    /// Issue the fetch once the backoff delay has elapsed.
    FetchAfter(T, Duration),
    /// The ticket is superseded; its task may be aborted.
    Abandon(T),
}

