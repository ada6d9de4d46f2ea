// At-most-once "viewed" reporting for a single playback session.
// Reports are fire-and-forget: failures are logged and dropped.

use log::{debug, warn};
use std::collections::HashSet;
use std::sync::Arc;

use crate::models::StatusId;
use crate::services::StatusService;

pub struct ViewRecorder {
    service: Arc<dyn StatusService>,
    recorded: HashSet<StatusId>,
}

impl ViewRecorder {
    pub fn new(service: Arc<dyn StatusService>) -> Self {
        Self { service, recorded: HashSet::new() }
    }

    /// Reports a view unless this status was already reported.
    /// Returns whether a report was dispatched.
    pub fn record(&mut self, status_id: StatusId) -> bool {
        if !self.recorded.insert(status_id) {
            debug!("Status {} already recorded this session", status_id);
            return false;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                warn!("Cannot report view of status {}: {}", status_id, e);
                return false;
            }
        };

        let service = self.service.clone();
        runtime.spawn(async move {
            match service.record_view(status_id).await {
                Ok(()) => debug!("Recorded view of status {}", status_id),
                Err(e) => warn!("Failed to record view of status {}: {}", status_id, e),
            }
        });
        true
    }

    pub fn has_recorded(&self, status_id: StatusId) -> bool {
        self.recorded.contains(&status_id)
    }

    pub fn recorded_count(&self) -> usize {
        self.recorded.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StatusCollection;
    use crate::services::{ServiceError, ServiceResult};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingService {
        calls: Mutex<Vec<StatusId>>,
        fail: bool,
    }

    #[async_trait]
    impl StatusService for CountingService {
        async fn fetch_feed(&self) -> ServiceResult<Vec<StatusCollection>> {
            Ok(Vec::new())
        }

        async fn record_view(&self, status_id: StatusId) -> ServiceResult<()> {
            self.calls.lock().unwrap().push(status_id);
            if self.fail {
                return Err(ServiceError::Network("offline".into()));
            }
            Ok(())
        }

        async fn delete_status(&self, _status_id: StatusId) -> ServiceResult<()> {
            Ok(())
        }
    }

    async fn settle() {
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_record_is_idempotent() {
        let service = Arc::new(CountingService::default());
        let mut recorder = ViewRecorder::new(service.clone());

        assert!(recorder.record(1));
        assert!(recorder.record(2));
        assert!(!recorder.record(1));
        settle().await;

        let mut calls = service.calls.lock().unwrap().clone();
        calls.sort();
        assert_eq!(calls, vec![1, 2]);
        assert_eq!(recorder.recorded_count(), 2);
        assert!(recorder.has_recorded(2));
    }

    #[tokio::test]
    async fn test_failures_are_swallowed() {
        let service = Arc::new(CountingService { fail: true, ..Default::default() });
        let mut recorder = ViewRecorder::new(service.clone());

        assert!(recorder.record(5));
        settle().await;
        assert!(!recorder.record(5));
        settle().await;

        assert_eq!(*service.calls.lock().unwrap(), vec![5]);
    }

    #[test]
    fn test_without_runtime_marks_but_does_not_dispatch() {
        let service = Arc::new(CountingService::default());
        let mut recorder = ViewRecorder::new(service.clone());
        assert!(!recorder.record(3));
        assert!(recorder.has_recorded(3));
        assert!(service.calls.lock().unwrap().is_empty());
    }
}
