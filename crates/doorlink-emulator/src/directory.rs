//! In-memory user directory and access policy.
//!
//! Holds the enrolled users and who is currently inside, and decides
//! each scan the way the production access server does. The emulator
//! answers with the exact denial texts the real server uses, so a
//! scanner developed against the emulator reads the same messages in
//! production.
//!
//! # Policy
//!
//! An entry scan is granted when the credential is enrolled, active and
//! not already inside; it marks the person as inside. An exit scan is
//! granted when an entry is on record; it clears the inside mark. The
//! anti-passback pair ("already inside", "no entry found") keeps one
//! badge from letting two people through.

use std::collections::{HashMap, HashSet};

use doorlink_core::{Credential, NodeRole};

/// One enrolled user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub name: String,
    pub active: bool,
}

/// Verdict for one scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Granted { user_name: String, message: String },
    Denied { message: String },
}

impl ScanOutcome {
    fn granted(user_name: &str, message: &str) -> Self {
        ScanOutcome::Granted {
            user_name: user_name.to_string(),
            message: message.to_string(),
        }
    }

    fn denied(message: &str) -> Self {
        ScanOutcome::Denied {
            message: message.to_string(),
        }
    }
}

/// Enrolled users plus the set of people currently inside.
#[derive(Debug, Clone, Default)]
pub struct AccessDirectory {
    users: HashMap<Credential, UserRecord>,
    inside: HashSet<Credential>,
}

impl AccessDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enroll an active user.
    pub fn register(&mut self, credential: Credential, name: impl Into<String>) {
        self.users.insert(
            credential,
            UserRecord {
                name: name.into(),
                active: true,
            },
        );
    }

    /// Enroll a deactivated user, for testing the inactive denial.
    pub fn register_inactive(&mut self, credential: Credential, name: impl Into<String>) {
        self.users.insert(
            credential,
            UserRecord {
                name: name.into(),
                active: false,
            },
        );
    }

    /// Activate or deactivate an enrolled user.
    ///
    /// Returns `false` when the credential is not enrolled.
    pub fn set_active(&mut self, credential: &Credential, active: bool) -> bool {
        match self.users.get_mut(credential) {
            Some(user) => {
                user.active = active;
                true
            }
            None => false,
        }
    }

    /// Whether this credential is currently tracked as inside.
    #[must_use]
    pub fn is_inside(&self, credential: &Credential) -> bool {
        self.inside.contains(credential)
    }

    /// Number of enrolled users.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Decide one scan and update the inside set on a grant.
    pub fn evaluate(&mut self, credential: &Credential, action: NodeRole) -> ScanOutcome {
        let Some(user) = self.users.get(credential) else {
            return ScanOutcome::denied("User not registered");
        };

        if !user.active {
            return ScanOutcome::denied("User inactive");
        }

        let name = user.name.clone();
        match action {
            NodeRole::Entry => {
                if self.inside.contains(credential) {
                    ScanOutcome::denied("User already inside")
                } else {
                    self.inside.insert(credential.clone());
                    ScanOutcome::granted(&name, "Entry logged")
                }
            }
            NodeRole::Exit => {
                if self.inside.remove(credential) {
                    ScanOutcome::granted(&name, "Exit logged")
                } else {
                    ScanOutcome::denied("No entry found for exit")
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential(raw: &str) -> Credential {
        Credential::new(raw).unwrap()
    }

    #[test]
    fn test_unknown_credential_is_denied() {
        let mut directory = AccessDirectory::new();

        let outcome = directory.evaluate(&credential("080058DBB1"), NodeRole::Entry);
        assert_eq!(outcome, ScanOutcome::denied("User not registered"));
    }

    #[test]
    fn test_inactive_user_is_denied_on_both_sides() {
        let mut directory = AccessDirectory::new();
        let badge = credential("080058DBB1");
        directory.register_inactive(badge.clone(), "Alice Johnson");

        assert_eq!(
            directory.evaluate(&badge, NodeRole::Entry),
            ScanOutcome::denied("User inactive")
        );
        assert_eq!(
            directory.evaluate(&badge, NodeRole::Exit),
            ScanOutcome::denied("User inactive")
        );
    }

    #[test]
    fn test_entry_grant_marks_the_user_inside() {
        let mut directory = AccessDirectory::new();
        let badge = credential("080058DBB1");
        directory.register(badge.clone(), "Alice Johnson");

        let outcome = directory.evaluate(&badge, NodeRole::Entry);

        assert_eq!(outcome, ScanOutcome::granted("Alice Johnson", "Entry logged"));
        assert!(directory.is_inside(&badge));
    }

    #[test]
    fn test_second_entry_is_anti_passback_denied() {
        let mut directory = AccessDirectory::new();
        let badge = credential("080058DBB1");
        directory.register(badge.clone(), "Alice Johnson");

        directory.evaluate(&badge, NodeRole::Entry);
        let outcome = directory.evaluate(&badge, NodeRole::Entry);

        assert_eq!(outcome, ScanOutcome::denied("User already inside"));
        assert!(directory.is_inside(&badge));
    }

    #[test]
    fn test_exit_without_entry_is_denied() {
        let mut directory = AccessDirectory::new();
        let badge = credential("080058DBB1");
        directory.register(badge.clone(), "Alice Johnson");

        let outcome = directory.evaluate(&badge, NodeRole::Exit);
        assert_eq!(outcome, ScanOutcome::denied("No entry found for exit"));
    }

    #[test]
    fn test_entry_exit_cycle() {
        let mut directory = AccessDirectory::new();
        let badge = credential("080058DBB1");
        directory.register(badge.clone(), "Alice Johnson");

        assert_eq!(
            directory.evaluate(&badge, NodeRole::Entry),
            ScanOutcome::granted("Alice Johnson", "Entry logged")
        );
        assert_eq!(
            directory.evaluate(&badge, NodeRole::Exit),
            ScanOutcome::granted("Alice Johnson", "Exit logged")
        );
        assert!(!directory.is_inside(&badge));

        // A full cycle leaves the badge usable for the next entry.
        assert_eq!(
            directory.evaluate(&badge, NodeRole::Entry),
            ScanOutcome::granted("Alice Johnson", "Entry logged")
        );
    }

    #[test]
    fn test_set_active_toggles_access() {
        let mut directory = AccessDirectory::new();
        let badge = credential("080058DBB1");
        directory.register(badge.clone(), "Alice Johnson");

        assert!(directory.set_active(&badge, false));
        assert_eq!(
            directory.evaluate(&badge, NodeRole::Entry),
            ScanOutcome::denied("User inactive")
        );

        assert!(directory.set_active(&badge, true));
        assert_eq!(
            directory.evaluate(&badge, NodeRole::Entry),
            ScanOutcome::granted("Alice Johnson", "Entry logged")
        );
    }

    #[test]
    fn test_set_active_on_unknown_credential() {
        let mut directory = AccessDirectory::new();
        assert!(!directory.set_active(&credential("080058DBB1"), false));
    }

    #[test]
    fn test_users_are_isolated() {
        let mut directory = AccessDirectory::new();
        let alice = credential("080058DBB1");
        let bob = credential("A1B2C3D4");
        directory.register(alice.clone(), "Alice Johnson");
        directory.register(bob.clone(), "Bob Smith");

        directory.evaluate(&alice, NodeRole::Entry);

        assert!(directory.is_inside(&alice));
        assert!(!directory.is_inside(&bob));
        assert_eq!(
            directory.evaluate(&bob, NodeRole::Exit),
            ScanOutcome::denied("No entry found for exit")
        );
        assert_eq!(directory.user_count(), 2);
    }
}
