#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

//! Request/reply correlation for handlers that wait on an external event.
//!
//! A handler calls [`CorrelationBroker::begin_wait`], sends its request
//! carrying the generated token, then awaits [`CorrelatedWait::wait`]. The
//! event source hands every incoming reply to [`CorrelationBroker::publish`].
//! The registration is removed when the wait completes, times out, or is
//! dropped, so a reply arriving afterwards is ignored.

use crate::error::{BridgeError, Result};
use crate::types::{CorrelationToken, SensorReply};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// An external reply that embeds the token of the request it answers.
pub trait CorrelatedEvent: Send + 'static {
    fn correlation_token(&self) -> CorrelationToken;
}

impl CorrelatedEvent for SensorReply {
    fn correlation_token(&self) -> CorrelationToken {
        self.requestor
    }
}

type Predicate<E> = Box<dyn Fn(&E) -> bool + Send + Sync>;

struct Registration<E> {
    predicate: Predicate<E>,
    reply: oneshot::Sender<E>,
}

type Registry<E> = Arc<Mutex<HashMap<CorrelationToken, Registration<E>>>>;

fn lock<E>(registry: &Registry<E>) -> MutexGuard<'_, HashMap<CorrelationToken, Registration<E>>> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct CorrelationBroker<E> {
    pending: Registry<E>,
}

impl<E> Clone for CorrelationBroker<E> {
    fn clone(&self) -> Self {
        Self {
            pending: Arc::clone(&self.pending),
        }
    }
}

impl<E: CorrelatedEvent> Default for CorrelationBroker<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: CorrelatedEvent> CorrelationBroker<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Registers a wait completed by the first event carrying its token.
    #[must_use]
    pub fn begin_wait(&self) -> CorrelatedWait<E> {
        self.begin_wait_matching(|_| true)
    }

    /// Registers a wait completed by the first event carrying its token for
    /// which `predicate` also holds. Events failing the predicate leave the
    /// registration in place.
    #[must_use]
    pub fn begin_wait_matching<P>(&self, predicate: P) -> CorrelatedWait<E>
    where
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        let token = CorrelationToken::generate();
        let (reply, receiver) = oneshot::channel();
        lock(&self.pending).insert(
            token,
            Registration {
                predicate: Box::new(predicate),
                reply,
            },
        );
        debug!("Registered correlated wait {}", token);

        CorrelatedWait {
            token,
            receiver,
            registry: Arc::clone(&self.pending),
        }
    }

    /// Delivers `event` to the wait registered under its token.
    ///
    /// Returns `false` when no live wait accepted the event.
    pub fn publish(&self, event: E) -> bool {
        let token = event.correlation_token();
        let registration = {
            let mut pending = lock(&self.pending);
            let accepted = pending
                .get(&token)
                .is_some_and(|registration| (registration.predicate)(&event));
            if !accepted {
                debug!("Ignoring uncorrelated event for token {}", token);
                return false;
            }
            pending.remove(&token)
        };

        registration.is_some_and(|registration| registration.reply.send(event).is_ok())
    }

    #[must_use]
    pub fn is_pending(&self, token: &CorrelationToken) -> bool {
        lock(&self.pending).contains_key(token)
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        lock(&self.pending).len()
    }
}

/// Handle to one outstanding correlated wait.
///
/// Dropping the handle releases the registration.
pub struct CorrelatedWait<E> {
    token: CorrelationToken,
    receiver: oneshot::Receiver<E>,
    registry: Registry<E>,
}

impl<E> CorrelatedWait<E> {
    #[must_use]
    pub const fn token(&self) -> CorrelationToken {
        self.token
    }

    /// Waits for the correlated event for at most `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::Timeout` when no matching event arrived in time.
    pub async fn wait(mut self, timeout: Duration) -> Result<E> {
        match tokio::time::timeout(timeout, &mut self.receiver).await {
            Ok(Ok(event)) => Ok(event),
            Ok(Err(_)) => Err(BridgeError::Internal(format!(
                "correlated wait {} lost its registration",
                self.token
            ))),
            Err(_) => {
                warn!(
                    "Correlated wait {} timed out after {}ms",
                    self.token,
                    timeout.as_millis()
                );
                Err(BridgeError::Timeout(format!(
                    "no reply for request {} within {}ms",
                    self.token,
                    timeout.as_millis()
                )))
            }
        }
    }
}

impl<E> Drop for CorrelatedWait<E> {
    fn drop(&mut self) {
        let removed = self
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.token)
            .is_some();
        if removed {
            debug!("Released correlated wait {}", self.token);
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Reply {
        token: CorrelationToken,
        body: String,
    }

    impl CorrelatedEvent for Reply {
        fn correlation_token(&self) -> CorrelationToken {
            self.token
        }
    }

    fn reply(token: CorrelationToken, body: &str) -> Reply {
        Reply {
            token,
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn given_matching_reply_when_waiting_then_payload_is_returned() {
        let broker = CorrelationBroker::<Reply>::new();
        let wait = broker.begin_wait();
        let token = wait.token();

        let publisher = broker.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            assert!(publisher.publish(reply(token, "pong")));
        });

        let received = wait.wait(Duration::from_secs(2)).await.unwrap();

        assert_eq!(received.body, "pong");
        assert_eq!(broker.pending_count(), 0);
    }

    #[tokio::test]
    async fn given_no_reply_when_deadline_elapses_then_timeout_and_registration_removed() {
        let broker = CorrelationBroker::<Reply>::new();
        let wait = broker.begin_wait();
        let token = wait.token();
        assert!(broker.is_pending(&token));

        let result = wait.wait(Duration::from_millis(20)).await;

        assert!(matches!(result, Err(BridgeError::Timeout(_))));
        assert!(!broker.is_pending(&token));
        assert!(!broker.publish(reply(token, "late")));
        assert_eq!(broker.pending_count(), 0);
    }

    #[tokio::test]
    async fn given_unknown_token_when_publishing_then_pending_waits_are_untouched() {
        let broker = CorrelationBroker::<Reply>::new();
        let wait = broker.begin_wait();

        assert!(!broker.publish(reply(CorrelationToken::generate(), "stray")));
        assert!(broker.is_pending(&wait.token()));
    }

    #[tokio::test]
    async fn given_completed_wait_when_duplicate_arrives_then_it_is_ignored() {
        let broker = CorrelationBroker::<Reply>::new();
        let wait = broker.begin_wait();
        let token = wait.token();

        assert!(broker.publish(reply(token, "first")));
        assert!(!broker.publish(reply(token, "second")));

        let received = wait.wait(Duration::from_millis(100)).await.unwrap();
        assert_eq!(received.body, "first");
    }

    #[tokio::test]
    async fn given_predicate_when_event_fails_it_then_wait_stays_registered() {
        let broker = CorrelationBroker::<Reply>::new();
        let wait = broker.begin_wait_matching(|event: &Reply| event.body.starts_with("ok"));
        let token = wait.token();

        assert!(!broker.publish(reply(token, "nope")));
        assert!(broker.is_pending(&token));
        assert!(broker.publish(reply(token, "ok then")));

        let received = wait.wait(Duration::from_millis(100)).await.unwrap();
        assert_eq!(received.body, "ok then");
    }

    #[tokio::test]
    async fn given_dropped_wait_when_cancelled_then_registration_is_released() {
        let broker = CorrelationBroker::<Reply>::new();
        let wait = broker.begin_wait();
        let token = wait.token();

        let waiting = tokio::spawn(async move { wait.wait(Duration::from_secs(30)).await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        waiting.abort();
        let _ = waiting.await;

        assert!(!broker.is_pending(&token));
        assert!(!broker.publish(reply(token, "after cancel")));
    }

    #[tokio::test]
    async fn concurrent_waits_each_receive_their_own_reply() {
        let broker = CorrelationBroker::<Reply>::new();
        let waits = (0..5).map(|_| broker.begin_wait()).collect::<Vec<_>>();
        let tokens = waits.iter().map(CorrelatedWait::token).collect::<Vec<_>>();

        for token in tokens.iter().rev() {
            assert!(broker.publish(reply(*token, &token.to_string())));
        }

        for wait in waits {
            let token = wait.token();
            let received = wait.wait(Duration::from_millis(100)).await.unwrap();
            assert_eq!(received.body, token.to_string());
        }
        assert_eq!(broker.pending_count(), 0);
    }
}
