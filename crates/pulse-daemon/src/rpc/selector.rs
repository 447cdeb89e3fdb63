use pulse_types::{PulseError, PulseResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

/// Sticky round-robin choice among redundant endpoints.
///
/// The current endpoint stays selected across calls until a failure
/// rotates it. Rotation is keyed on the index the caller failed against,
/// so concurrent calls that all failed on the same endpoint advance it
/// once instead of skipping past healthy ones.
pub struct EndpointSelector {
    endpoints: Vec<String>,
    current: AtomicUsize,
}

impl EndpointSelector {
    pub fn new(endpoints: Vec<String>) -> PulseResult<Self> {
        if endpoints.is_empty() {
            return Err(PulseError::Config(
                "At least one RPC endpoint is required".into(),
            ));
        }

        Ok(Self {
            endpoints,
            current: AtomicUsize::new(0),
        })
    }

    pub fn current(&self) -> (usize, &str) {
        let idx = self.current.load(Ordering::Acquire) % self.endpoints.len();
        (idx, &self.endpoints[idx])
    }

    /// Advance past `failed`. Returns the index now selected, which is the
    /// one another caller already moved to if it got there first.
    pub fn rotate_from(&self, failed: usize) -> usize {
        let next = (failed + 1) % self.endpoints.len();

        match self
            .current
            .compare_exchange(failed, next, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => {
                info!("Switched to endpoint: {}", self.endpoints[next]);
                next
            }
            Err(actual) => actual,
        }
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }
}
