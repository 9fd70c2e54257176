//! In-process coordination of token refreshes.
//!
//! Several tasks sharing one credential set can observe a 401 at the same
//! moment. The coordinator ensures only one of them performs the refresh per
//! safety window; every other caller waits on the broadcast channel and
//! adopts the new pair when it lands.

use std::future::Future;
use std::time::{Duration, Instant};

use tokio::sync::{watch, Mutex};

use crate::auth::TokenPair;

/// How long a claimed refresh slot stays exclusive.
pub const DEFAULT_SAFETY_WINDOW: Duration = Duration::from_secs(10);

/// Shared credential state plus the single-refresh guarantee.
pub struct TokenCoordinator {
    credentials: watch::Sender<TokenPair>,
    refresh_started: Mutex<Option<Instant>>,
    safety_window: Duration,
}

impl TokenCoordinator {
    pub fn new(initial: TokenPair) -> Self {
        Self::with_safety_window(initial, DEFAULT_SAFETY_WINDOW)
    }

    pub fn with_safety_window(initial: TokenPair, safety_window: Duration) -> Self {
        let (credentials, _) = watch::channel(initial);
        Self {
            credentials,
            refresh_started: Mutex::new(None),
            safety_window,
        }
    }

    /// The pair requests should currently be signed with.
    pub fn current(&self) -> TokenPair {
        self.credentials.borrow().clone()
    }

    /// Watch credential changes. Receivers observe every published pair, so
    /// holders keep their local copy current by reading on change.
    pub fn subscribe(&self) -> watch::Receiver<TokenPair> {
        self.credentials.subscribe()
    }

    /// Replace the credentials outright, e.g. after a fresh login.
    pub fn publish(&self, pair: TokenPair) {
        self.credentials.send_replace(pair);
    }

    /// Refresh the credentials, running `refresh` at most once per safety
    /// window across all concurrent callers.
    ///
    /// `presented_access` is the access token the caller was rejected with.
    /// When it is already superseded the current pair is returned without
    /// refreshing. Otherwise the first caller in the window claims the
    /// refresh slot (a monotonic timestamp compared under the window) and
    /// runs `refresh` with the pair to renew; everyone else waits for the
    /// broadcast and returns the adopted pair. A failed refresh clears the
    /// slot immediately so the next caller can try again.
    pub async fn refresh_with<F, Fut, E>(
        &self,
        presented_access: &str,
        refresh: F,
    ) -> Result<TokenPair, E>
    where
        F: FnOnce(TokenPair) -> Fut,
        Fut: Future<Output = Result<TokenPair, E>>,
    {
        let mut rx = self.credentials.subscribe();

        loop {
            {
                let current = rx.borrow_and_update();
                if current.access_token != presented_access {
                    return Ok(current.clone());
                }
            }

            if self.claim_refresh_slot().await {
                let stale = self.current();
                return match refresh(stale).await {
                    Ok(pair) => {
                        self.credentials.send_replace(pair.clone());
                        Ok(pair)
                    }
                    Err(e) => {
                        self.release_refresh_slot().await;
                        Err(e)
                    }
                };
            }

            // Another caller holds the slot: adopt its broadcast, or loop
            // around and claim the slot ourselves once the window passes.
            let _ = tokio::time::timeout(self.safety_window, rx.changed()).await;
        }
    }

    async fn claim_refresh_slot(&self) -> bool {
        let mut slot = self.refresh_started.lock().await;
        match *slot {
            Some(started) if started.elapsed() < self.safety_window => false,
            _ => {
                *slot = Some(Instant::now());
                true
            }
        }
    }

    async fn release_refresh_slot(&self) {
        *self.refresh_started.lock().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn pair(tag: &str) -> TokenPair {
        TokenPair {
            access_token: format!("access-{tag}"),
            refresh_token: format!("refresh-{tag}"),
            token_type: "Bearer".to_string(),
            expires_in: 900,
            refresh_expires_in: 86_400,
        }
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_refresh() {
        let coordinator = Arc::new(TokenCoordinator::new(pair("stale")));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let coordinator = coordinator.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                coordinator
                    .refresh_with("access-stale", |_stale| {
                        let calls = calls.clone();
                        async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(25)).await;
                            Ok::<_, String>(pair("fresh"))
                        }
                    })
                    .await
            }));
        }

        for handle in handles {
            let refreshed = handle.await.unwrap().unwrap();
            assert_eq!(refreshed.access_token, "access-fresh");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn superseded_caller_adopts_without_refreshing() {
        let coordinator = TokenCoordinator::new(pair("fresh"));
        let calls = AtomicUsize::new(0);

        let adopted = coordinator
            .refresh_with("access-stale", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, String>(pair("never")) }
            })
            .await
            .unwrap();

        assert_eq!(adopted.access_token, "access-fresh");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_refresh_frees_the_slot_for_the_next_caller() {
        let coordinator = TokenCoordinator::new(pair("stale"));

        let denied: Result<TokenPair, String> = coordinator
            .refresh_with("access-stale", |_| async {
                Err("refresh endpoint said no".to_string())
            })
            .await;
        assert!(denied.is_err());

        let refreshed = coordinator
            .refresh_with("access-stale", |_| async { Ok::<_, String>(pair("fresh")) })
            .await
            .unwrap();
        assert_eq!(refreshed.access_token, "access-fresh");
    }

    #[tokio::test]
    async fn subscribers_see_published_pairs() {
        let coordinator = TokenCoordinator::new(pair("one"));
        let mut rx = coordinator.subscribe();

        coordinator.publish(pair("two"));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().access_token, "access-two");
        assert_eq!(coordinator.current().access_token, "access-two");
    }
}
