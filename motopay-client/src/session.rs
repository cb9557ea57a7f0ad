//! In-memory session storage
//!
//! Every change of the stored tokens bumps a generation counter. A request
//! that saw generation `n` and then got a 401 only refreshes if the session
//! is still at `n`; otherwise another task already refreshed (or cleared) it
//! and the request simply replays with whatever is stored now.

use tokio::sync::{Mutex, MutexGuard, RwLock};

/// Access and refresh token of a logged-in user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tokens {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Default)]
struct State {
    tokens: Option<Tokens>,
    generation: u64,
}

#[derive(Debug, Default)]
pub struct SessionStore {
    state: RwLock<State>,
    /// Held for the whole duration of a refresh request
    refresh_gate: Mutex<()>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn tokens(&self) -> Option<Tokens> {
        self.state.read().await.tokens.clone()
    }

    /// Current tokens with the generation they belong to
    pub async fn snapshot(&self) -> (Option<Tokens>, u64) {
        let state = self.state.read().await;
        (state.tokens.clone(), state.generation)
    }

    pub async fn replace(&self, tokens: Tokens) {
        let mut state = self.state.write().await;
        state.tokens = Some(tokens);
        state.generation += 1;
    }

    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.tokens = None;
        state.generation += 1;
    }

    /// Serializes refreshes; only one refresh request is in flight at a time
    pub async fn lock_refresh(&self) -> MutexGuard<'_, ()> {
        self.refresh_gate.lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(n: u32) -> Tokens {
        Tokens {
            access_token: format!("access-{n}"),
            refresh_token: format!("refresh-{n}"),
        }
    }

    #[tokio::test]
    async fn test_every_change_bumps_generation() {
        let session = SessionStore::new();
        assert_eq!(session.snapshot().await, (None, 0));

        session.replace(tokens(1)).await;
        assert_eq!(session.snapshot().await, (Some(tokens(1)), 1));

        session.replace(tokens(2)).await;
        session.clear().await;
        assert_eq!(session.snapshot().await, (None, 3));
        assert_eq!(session.tokens().await, None);
    }

    #[tokio::test]
    async fn test_refresh_gate_is_exclusive() {
        let session = SessionStore::new();

        let guard = session.lock_refresh().await;
        assert!(session.refresh_gate.try_lock().is_err());
        drop(guard);
        assert!(session.refresh_gate.try_lock().is_ok());
    }
}
