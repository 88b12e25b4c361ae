//! Cooperative lockout guarding annotation geometry and the active context.
//!
//! The lockout is advisory: every mutating entry point consults it before
//! touching shared state. Several independent reasons may hold it at once;
//! it returns to idle only when all of them are released.

use std::collections::BTreeSet;
use std::fmt;

use planmark_core::ConcurrencyConflict;

/// Why the lockout is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HoldReason {
    /// A resize gesture is in progress.
    Resize,
    /// A move gesture is in progress.
    Move,
    /// A committed gesture is waiting for its debounced save.
    PendingSave,
}

impl fmt::Display for HoldReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HoldReason::Resize => write!(f, "resize"),
            HoldReason::Move => write!(f, "move"),
            HoldReason::PendingSave => write!(f, "pending-save"),
        }
    }
}

/// Lockout state machine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LockoutState {
    #[default]
    Idle,
    /// Held for one or more reasons.
    Held(BTreeSet<HoldReason>),
    /// The debounced save is in flight; released once it resolves.
    Releasing,
}

#[derive(Debug, Clone, Default)]
pub struct Lockout {
    state: LockoutState,
}

impl Lockout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &LockoutState {
        &self.state
    }

    /// Whether mutations must be deferred.
    pub fn is_held(&self) -> bool {
        !matches!(self.state, LockoutState::Idle)
    }

    pub fn holds(&self, reason: HoldReason) -> bool {
        matches!(&self.state, LockoutState::Held(reasons) if reasons.contains(&reason))
    }

    /// Reasons currently holding the lockout.
    pub fn reasons(&self) -> Vec<HoldReason> {
        match &self.state {
            LockoutState::Held(reasons) => reasons.iter().copied().collect(),
            _ => Vec::new(),
        }
    }

    pub fn acquire(&mut self, reason: HoldReason) {
        match &mut self.state {
            LockoutState::Held(reasons) => {
                reasons.insert(reason);
            }
            LockoutState::Idle | LockoutState::Releasing => {
                self.state = LockoutState::Held(BTreeSet::from([reason]));
            }
        }
        tracing::debug!("Lockout acquired: {}", reason);
    }

    /// Releases one reason; the lockout goes idle once none remain.
    pub fn release(&mut self, reason: HoldReason) {
        if let LockoutState::Held(reasons) = &mut self.state {
            if reasons.remove(&reason) {
                tracing::debug!("Lockout released: {}", reason);
            }
            if reasons.is_empty() {
                self.state = LockoutState::Idle;
            }
        }
    }

    /// Moves a pending save into flight.
    ///
    /// Drops the pending-save reason; if nothing else holds the lockout it
    /// enters `Releasing` until [`finish_release`](Self::finish_release).
    pub fn begin_release(&mut self) {
        if let LockoutState::Held(reasons) = &mut self.state {
            reasons.remove(&HoldReason::PendingSave);
            if reasons.is_empty() {
                self.state = LockoutState::Releasing;
            }
        }
    }

    /// Called once the in-flight save has resolved, successfully or not.
    pub fn finish_release(&mut self) {
        if self.state == LockoutState::Releasing {
            self.state = LockoutState::Idle;
            tracing::debug!("Lockout idle");
        }
    }

    /// Refuses `operation` while the lockout is held.
    pub fn check(&self, operation: &str) -> Result<(), ConcurrencyConflict> {
        if !self.is_held() {
            return Ok(());
        }
        let reasons = match &self.state {
            LockoutState::Releasing => "save-in-flight".to_string(),
            _ => self
                .reasons()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        };
        Err(ConcurrencyConflict::LockoutHeld {
            operation: operation.to_string(),
            reasons,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_and_release() {
        let mut lockout = Lockout::new();
        assert!(!lockout.is_held());
        assert!(lockout.check("select").is_ok());

        lockout.acquire(HoldReason::Resize);
        assert!(lockout.is_held());
        assert!(lockout.holds(HoldReason::Resize));

        lockout.release(HoldReason::Resize);
        assert_eq!(lockout.state(), &LockoutState::Idle);
    }

    #[test]
    fn test_reasons_do_not_stomp_each_other() {
        let mut lockout = Lockout::new();
        lockout.acquire(HoldReason::PendingSave);
        lockout.acquire(HoldReason::Move);

        lockout.release(HoldReason::Move);
        assert!(lockout.is_held());
        assert_eq!(lockout.reasons(), vec![HoldReason::PendingSave]);
    }

    #[test]
    fn test_release_cycle_through_save() {
        let mut lockout = Lockout::new();
        lockout.acquire(HoldReason::Resize);
        lockout.acquire(HoldReason::PendingSave);
        lockout.release(HoldReason::Resize);

        lockout.begin_release();
        assert_eq!(lockout.state(), &LockoutState::Releasing);
        assert!(lockout.is_held());

        lockout.finish_release();
        assert!(!lockout.is_held());
    }

    #[test]
    fn test_check_reports_reasons() {
        let mut lockout = Lockout::new();
        lockout.acquire(HoldReason::PendingSave);
        lockout.acquire(HoldReason::Resize);

        let err = lockout.check("select_annotation").unwrap_err();
        assert_eq!(
            err.to_string(),
            "select_annotation deferred: lockout held (resize, pending-save)"
        );

        lockout.release(HoldReason::Resize);
        lockout.begin_release();
        let err = lockout.check("undo").unwrap_err();
        assert_eq!(err.to_string(), "undo deferred: lockout held (save-in-flight)");
    }

    #[test]
    fn test_finish_release_ignored_while_held() {
        let mut lockout = Lockout::new();
        lockout.acquire(HoldReason::Move);
        lockout.finish_release();
        assert!(lockout.holds(HoldReason::Move));
    }
}
