//! Mock lock output implementation for testing and development.

use crate::{Result, traits::LockDrive};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Mock door lock output.
///
/// Tracks the commanded state in shared atomics so tests can observe the
/// output through a [`MockLockProbe`] while the actuator owns the lock.
///
/// # Examples
///
/// ```
/// use doorlink_hardware::mock::MockLock;
/// use doorlink_hardware::traits::LockDrive;
///
/// #[tokio::main]
/// async fn main() -> doorlink_hardware::Result<()> {
///     let (mut lock, probe) = MockLock::new();
///
///     lock.assert_unlock().await?;
///     assert!(probe.is_asserted());
///
///     lock.release_unlock().await?;
///     assert!(!probe.is_asserted());
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockLock {
    asserted: Arc<AtomicBool>,
    assert_count: Arc<AtomicUsize>,
}

impl MockLock {
    /// Create a new mock lock in the released state.
    ///
    /// Returns a tuple of (MockLock, MockLockProbe) where the probe
    /// observes the output from outside.
    pub fn new() -> (Self, MockLockProbe) {
        let asserted = Arc::new(AtomicBool::new(false));
        let assert_count = Arc::new(AtomicUsize::new(0));

        let lock = Self {
            asserted: Arc::clone(&asserted),
            assert_count: Arc::clone(&assert_count),
        };

        let probe = MockLockProbe {
            asserted,
            assert_count,
        };

        (lock, probe)
    }
}

impl Default for MockLock {
    fn default() -> Self {
        Self::new().0
    }
}

impl LockDrive for MockLock {
    async fn assert_unlock(&mut self) -> Result<()> {
        if !self.asserted.swap(true, Ordering::SeqCst) {
            self.assert_count.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn release_unlock(&mut self) -> Result<()> {
        self.asserted.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_asserted(&self) -> bool {
        self.asserted.load(Ordering::SeqCst)
    }
}

/// Observation handle for a [`MockLock`].
///
/// Cloneable; all clones observe the same output.
#[derive(Debug, Clone)]
pub struct MockLockProbe {
    asserted: Arc<AtomicBool>,
    assert_count: Arc<AtomicUsize>,
}

impl MockLockProbe {
    /// Current commanded state of the output.
    pub fn is_asserted(&self) -> bool {
        self.asserted.load(Ordering::SeqCst)
    }

    /// How many times the output went from released to asserted.
    pub fn assert_count(&self) -> usize {
        self.assert_count.load(Ordering::SeqCst)
    }
}
