use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared between the capture thread, detection tasks and the UI.
#[derive(Debug, Default)]
pub struct PipelineStats {
    frames_received: AtomicU64,
    frames_admitted: AtomicU64,
    frames_dropped: AtomicU64,
    detections_completed: AtomicU64,
    detections_failed: AtomicU64,
    payloads_decoded: AtomicU64,
    last_payload: Mutex<Option<String>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsSnapshot {
    pub frames_received: u64,
    pub frames_admitted: u64,
    pub frames_dropped: u64,
    pub detections_completed: u64,
    pub detections_failed: u64,
    pub payloads_decoded: u64,
    pub last_payload: Option<String>,
}

impl PipelineStats {
    pub fn record_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_admitted(&self) {
        self.frames_admitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_completed(&self) {
        self.detections_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.detections_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_payload(&self, payload: &str) {
        self.payloads_decoded.fetch_add(1, Ordering::Relaxed);
        match self.last_payload.lock() {
            Ok(mut last) => *last = Some(payload.to_string()),
            Err(poisoned) => *poisoned.into_inner() = Some(payload.to_string()),
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let last_payload = match self.last_payload.lock() {
            Ok(last) => last.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        StatsSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_admitted: self.frames_admitted.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            detections_completed: self.detections_completed.load(Ordering::Relaxed),
            detections_failed: self.detections_failed.load(Ordering::Relaxed),
            payloads_decoded: self.payloads_decoded.load(Ordering::Relaxed),
            last_payload,
        }
    }
}
