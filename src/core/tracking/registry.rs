use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::core::TrackerError;

/// Gate allowing one live session at a time.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    active: Arc<AtomicBool>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the gate, or fail with [`TrackerError::SessionBusy`] without
    /// touching the active session.
    pub fn try_acquire(&self) -> Result<SessionGuard, TrackerError> {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| TrackerError::SessionBusy)?;

        debug!("Live session gate acquired");
        Ok(SessionGuard {
            active: Arc::clone(&self.active),
        })
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

/// Releases the gate when dropped.
#[derive(Debug)]
pub struct SessionGuard {
    active: Arc<AtomicBool>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);
        debug!("Live session gate released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_holder() {
        let registry = SessionRegistry::new();
        assert!(!registry.is_active());

        let guard = registry.try_acquire().unwrap();
        assert!(registry.is_active());
        assert!(matches!(
            registry.try_acquire(),
            Err(TrackerError::SessionBusy)
        ));
        // refusal leaves the holder in place
        assert!(registry.is_active());

        drop(guard);
        assert!(!registry.is_active());
        assert!(registry.try_acquire().is_ok());
    }

    #[test]
    fn test_clones_share_the_gate() {
        let registry = SessionRegistry::new();
        let other = registry.clone();

        let _guard = registry.try_acquire().unwrap();
        assert!(other.is_active());
        assert!(other.try_acquire().is_err());
    }

    #[test]
    fn test_released_on_panic() {
        let registry = SessionRegistry::new();
        let inner = registry.clone();

        let result = std::panic::catch_unwind(move || {
            let _guard = inner.try_acquire().unwrap();
            panic!("session task panicked");
        });

        assert!(result.is_err());
        assert!(!registry.is_active());
    }

    #[tokio::test]
    async fn test_released_when_task_aborted() {
        let registry = SessionRegistry::new();
        let guard = registry.try_acquire().unwrap();

        let handle = tokio::spawn(async move {
            let _guard = guard;
            std::future::pending::<()>().await;
        });
        tokio::task::yield_now().await;
        assert!(registry.is_active());

        handle.abort();
        let _ = handle.await;
        assert!(!registry.is_active());
    }
}
