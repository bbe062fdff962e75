//! Scan debouncing.
//!
//! An RFID reader delivers the same tag several times while it sits on
//! the antenna, and a badge held against the reader re-reads every few
//! hundred milliseconds. Debouncing keeps those repeats from turning
//! into repeated submissions.
//!
//! Two windows apply, measured from the most recent **accepted** scan:
//!
//! - a global window: no scan of any credential is accepted until
//!   [`GLOBAL_SCAN_WINDOW_MS`] has passed
//! - a per-credential window: the same credential is not accepted again
//!   until [`SAME_CREDENTIAL_WINDOW_MS`] has passed
//!
//! Rejected scans extend neither window, so a badge held on the reader
//! does not lock itself out forever.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use doorlink_core::Credential;
use doorlink_core::constants::{GLOBAL_SCAN_WINDOW_MS, SAME_CREDENTIAL_WINDOW_MS};

/// Outcome of a debounce check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The scan passes and should be submitted.
    Accepted,
    /// Too soon after the last accepted scan of any credential.
    GlobalWindow,
    /// This credential was accepted recently.
    SameCredential,
}

impl Verdict {
    /// Returns `true` if the scan should be submitted.
    #[must_use]
    pub fn is_accepted(self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

/// Dual-window scan debouncer.
///
/// Tracks the acceptance time of each recently seen credential plus the
/// time of the most recent acceptance overall. The global window is
/// checked first, so back-to-back scans of two different badges report
/// [`Verdict::GlobalWindow`] rather than a per-credential rejection.
#[derive(Debug, Clone)]
pub struct ScanDebouncer {
    same_credential_window: Duration,
    global_window: Duration,
    last_accepted: Option<Instant>,
    seen: HashMap<Credential, Instant>,
}

impl ScanDebouncer {
    /// Create a debouncer with explicit windows.
    #[must_use]
    pub fn new(same_credential_window: Duration, global_window: Duration) -> Self {
        Self {
            same_credential_window,
            global_window,
            last_accepted: None,
            seen: HashMap::new(),
        }
    }

    /// Check one scan against both windows.
    ///
    /// On acceptance the scan becomes the reference point for both
    /// windows; on rejection no state changes.
    pub fn check(&mut self, credential: &Credential, now: Instant) -> Verdict {
        if let Some(last) = self.last_accepted
            && now.duration_since(last) < self.global_window
        {
            return Verdict::GlobalWindow;
        }

        if let Some(&accepted_at) = self.seen.get(credential)
            && now.duration_since(accepted_at) < self.same_credential_window
        {
            return Verdict::SameCredential;
        }

        self.prune(now);
        self.last_accepted = Some(now);
        self.seen.insert(credential.clone(), now);
        Verdict::Accepted
    }

    /// Number of credentials currently inside their per-credential window.
    #[must_use]
    pub fn tracked_credentials(&self) -> usize {
        self.seen.len()
    }

    fn prune(&mut self, now: Instant) {
        let window = self.same_credential_window;
        self.seen
            .retain(|_, accepted_at| now.duration_since(*accepted_at) < window);
    }
}

impl Default for ScanDebouncer {
    /// A debouncer with the standard windows.
    fn default() -> Self {
        Self::new(
            Duration::from_millis(SAME_CREDENTIAL_WINDOW_MS),
            Duration::from_millis(GLOBAL_SCAN_WINDOW_MS),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential(raw: &str) -> Credential {
        Credential::new(raw).unwrap()
    }

    fn at(base: Instant, ms: u64) -> Instant {
        base + Duration::from_millis(ms)
    }

    #[test]
    fn test_first_scan_is_accepted() {
        let mut debouncer = ScanDebouncer::default();
        let verdict = debouncer.check(&credential("080058DBB1"), Instant::now());

        assert_eq!(verdict, Verdict::Accepted);
        assert!(verdict.is_accepted());
    }

    #[test]
    fn test_repeats_of_one_badge_are_ignored_for_the_full_window() {
        let mut debouncer = ScanDebouncer::default();
        let badge = credential("080058DBB1");
        let t0 = Instant::now();

        assert_eq!(debouncer.check(&badge, t0), Verdict::Accepted);

        // A badge held on the reader re-reads about once a second.
        assert_eq!(debouncer.check(&badge, at(t0, 1000)), Verdict::GlobalWindow);
        assert_eq!(
            debouncer.check(&badge, at(t0, 2000)),
            Verdict::SameCredential
        );
        assert_eq!(
            debouncer.check(&badge, at(t0, 3000)),
            Verdict::SameCredential
        );
        assert_eq!(
            debouncer.check(&badge, at(t0, 4999)),
            Verdict::SameCredential
        );

        // The per-credential window is inclusive of its endpoint.
        assert_eq!(debouncer.check(&badge, at(t0, 5000)), Verdict::Accepted);
    }

    #[test]
    fn test_different_badge_waits_only_for_the_global_window() {
        let mut debouncer = ScanDebouncer::default();
        let first = credential("080058DBB1");
        let second = credential("A1B2C3D4");
        let t0 = Instant::now();

        assert_eq!(debouncer.check(&first, t0), Verdict::Accepted);
        assert_eq!(
            debouncer.check(&second, at(t0, 1999)),
            Verdict::GlobalWindow
        );
        assert_eq!(debouncer.check(&second, at(t0, 2000)), Verdict::Accepted);
    }

    #[test]
    fn test_rejected_scans_do_not_extend_the_windows() {
        let mut debouncer = ScanDebouncer::default();
        let first = credential("080058DBB1");
        let second = credential("A1B2C3D4");
        let t0 = Instant::now();

        assert_eq!(debouncer.check(&first, t0), Verdict::Accepted);

        // Rejected at 1900ms; must not push the global window forward.
        assert_eq!(
            debouncer.check(&first, at(t0, 1900)),
            Verdict::GlobalWindow
        );
        assert_eq!(debouncer.check(&second, at(t0, 2500)), Verdict::Accepted);

        // And must not refresh the first badge's own window either.
        assert_eq!(debouncer.check(&first, at(t0, 5000)), Verdict::Accepted);
    }

    #[test]
    fn test_each_badge_tracks_its_own_window() {
        let mut debouncer = ScanDebouncer::default();
        let first = credential("080058DBB1");
        let second = credential("A1B2C3D4");
        let t0 = Instant::now();

        assert_eq!(debouncer.check(&first, t0), Verdict::Accepted);
        assert_eq!(debouncer.check(&second, at(t0, 3000)), Verdict::Accepted);

        // First badge's window ran from t0 and has expired; the second
        // badge is still inside its own.
        assert_eq!(debouncer.check(&first, at(t0, 5500)), Verdict::Accepted);
        assert_eq!(
            debouncer.check(&second, at(t0, 7600)),
            Verdict::SameCredential
        );
    }

    #[test]
    fn test_expired_entries_are_pruned_on_acceptance() {
        let mut debouncer = ScanDebouncer::default();
        let first = credential("080058DBB1");
        let second = credential("A1B2C3D4");
        let t0 = Instant::now();

        debouncer.check(&first, t0);
        assert_eq!(debouncer.tracked_credentials(), 1);

        debouncer.check(&second, at(t0, 6000));
        assert_eq!(debouncer.tracked_credentials(), 1);
    }

    #[test]
    fn test_custom_windows() {
        let mut debouncer =
            ScanDebouncer::new(Duration::from_millis(100), Duration::from_millis(50));
        let badge = credential("080058DBB1");
        let t0 = Instant::now();

        assert_eq!(debouncer.check(&badge, t0), Verdict::Accepted);
        assert_eq!(debouncer.check(&badge, at(t0, 60)), Verdict::SameCredential);
        assert_eq!(debouncer.check(&badge, at(t0, 100)), Verdict::Accepted);
    }
}
