use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Admission control for detection: at most one frame is in flight at a time.
///
/// `try_acquire` is a non-blocking test-and-set. The returned [`GatePermit`]
/// releases the gate when it is dropped, so every exit path of a completion,
/// including errors, panics and dropped tasks, hands the gate back exactly once.
#[derive(Debug, Default)]
pub struct DetectionGate {
    busy: AtomicBool,
}

impl DetectionGate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Returns a permit if the gate was idle, `None` if a detection is already in flight.
    pub fn try_acquire(self: &Arc<Self>) -> Option<GatePermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| GatePermit {
                gate: Arc::clone(self),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn release(&self) {
        let was_busy = self.busy.swap(false, Ordering::AcqRel);
        debug_assert!(was_busy, "detection gate released while idle");
    }
}

/// Proof that the holder owns the single detection slot.
#[must_use = "dropping the permit releases the detection gate immediately"]
#[derive(Debug)]
pub struct GatePermit {
    gate: Arc<DetectionGate>,
}

impl GatePermit {
    /// Hands the slot back. Equivalent to dropping the permit.
    pub fn release(self) {}
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        self.gate.release();
        tracing::trace!("Detection gate released");
    }
}
