//! Active-session resolution with lazy provisioning.

use tracing::{error, info};
use wagate_core::{SessionRecord, SessionRegistry, first_session};

/// Returns the active session, creating the default one first when
/// `provision` is set and the registry is empty.
///
/// At most one creation attempt is made per call. A failed attempt is logged
/// and reported as "no session". Two concurrent calls may both create.
pub async fn resolve_session(
    registry: &dyn SessionRegistry,
    provision: bool,
) -> Option<SessionRecord> {
    if let Some(session) = first_session(registry).await {
        return Some(session);
    }
    if !provision {
        return None;
    }

    info!("No active session, creating default session");
    match registry.create_default_session().await {
        Ok(created) => {
            info!(session = %created.id, "Default session created");
            first_session(registry).await.or(Some(created))
        }
        Err(e) => {
            error!(error = %e, "Failed to create default session");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use wagate_core::{PairingResult, PairingSocket, RegistryError, RegistryResult};

    use super::*;

    struct NoopSocket;

    #[async_trait]
    impl PairingSocket for NoopSocket {
        async fn request_pairing_code(&self, _phone: &str) -> PairingResult<String> {
            Ok(String::new())
        }
    }

    #[derive(Default)]
    struct Registry {
        sessions: Mutex<Vec<SessionRecord>>,
        creates: AtomicUsize,
        fail: bool,
        store_created: bool,
    }

    #[async_trait]
    impl SessionRegistry for Registry {
        async fn list_sessions(&self) -> Vec<SessionRecord> {
            self.sessions.lock().clone()
        }

        async fn create_default_session(&self) -> RegistryResult<SessionRecord> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(RegistryError::creation("auth dir unreadable"));
            }
            let record = SessionRecord::new("default", Arc::new(NoopSocket));
            if self.store_created {
                self.sessions.lock().push(record.clone());
            }
            Ok(record)
        }
    }

    #[tokio::test]
    async fn test_existing_session_is_returned_without_create() {
        let registry = Registry::default();
        registry
            .sessions
            .lock()
            .push(SessionRecord::new("first", Arc::new(NoopSocket)));
        registry
            .sessions
            .lock()
            .push(SessionRecord::new("second", Arc::new(NoopSocket)));

        let session = resolve_session(&registry, true).await.unwrap();
        assert_eq!(session.id, "first");
        assert_eq!(registry.creates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_provision_means_no_create() {
        let registry = Registry::default();
        assert!(resolve_session(&registry, false).await.is_none());
        assert_eq!(registry.creates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_create_is_attempted_once() {
        let registry = Registry {
            fail: true,
            ..Default::default()
        };
        assert!(resolve_session(&registry, true).await.is_none());
        assert_eq!(registry.creates.load(Ordering::SeqCst), 1);
        assert!(registry.sessions.lock().is_empty());
    }

    #[tokio::test]
    async fn test_created_session_is_relisted() {
        let registry = Registry {
            store_created: true,
            ..Default::default()
        };
        let session = resolve_session(&registry, true).await.unwrap();
        assert_eq!(session.id, "default");
        assert_eq!(registry.creates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_created_session_used_when_not_listed_yet() {
        let registry = Registry::default();
        let session = resolve_session(&registry, true).await.unwrap();
        assert_eq!(session.id, "default");
    }
}
