//! Bridge to the external undo/redo history.
//!
//! The bridge keeps no cursor of its own. It only decides whether a call may
//! be forwarded; bounds at either end of the history belong to the stack.

use serde::{Deserialize, Serialize};

/// Process-wide undo/redo history supplied by the host.
pub trait HistoryStack {
    /// Undo the most recent entry. Underflow is ignored.
    fn undo(&mut self);

    /// Redo the most recently undone entry. Overflow is ignored.
    fn redo(&mut self);
}

/// When history calls are forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HistoryGate {
    /// Only while some viewport displays an image
    #[default]
    AnyImageDisplayed,
    /// Always
    Always,
}

/// Whether a history call reached the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryOutcome {
    /// Call was passed to the history stack
    Forwarded,
    /// Gate was closed; nothing happened
    Gated,
}

/// Gated pass-through to a [`HistoryStack`].
#[derive(Debug, Clone)]
pub struct HistoryBridge<H> {
    history: H,
    gate: HistoryGate,
}

impl<H: HistoryStack> HistoryBridge<H> {
    /// Wrap a history stack.
    pub fn new(history: H, gate: HistoryGate) -> Self {
        Self { history, gate }
    }

    /// Change the gate.
    pub fn set_gate(&mut self, gate: HistoryGate) {
        self.gate = gate;
    }

    /// Whether undo may be called.
    pub fn can_undo(&self, image_displayed: bool) -> bool {
        self.is_open(image_displayed)
    }

    /// Whether redo may be called.
    pub fn can_redo(&self, image_displayed: bool) -> bool {
        self.is_open(image_displayed)
    }

    /// Forward an undo if the gate is open.
    pub fn undo(&mut self, image_displayed: bool) -> HistoryOutcome {
        if !self.is_open(image_displayed) {
            log::debug!("Undo gated, nothing displayed");
            return HistoryOutcome::Gated;
        }
        self.history.undo();
        HistoryOutcome::Forwarded
    }

    /// Forward a redo if the gate is open.
    pub fn redo(&mut self, image_displayed: bool) -> HistoryOutcome {
        if !self.is_open(image_displayed) {
            log::debug!("Redo gated, nothing displayed");
            return HistoryOutcome::Gated;
        }
        self.history.redo();
        HistoryOutcome::Forwarded
    }

    /// The wrapped history stack.
    pub fn history(&self) -> &H {
        &self.history
    }

    /// The wrapped history stack, mutably.
    pub fn history_mut(&mut self) -> &mut H {
        &mut self.history
    }

    fn is_open(&self, image_displayed: bool) -> bool {
        match self.gate {
            HistoryGate::AnyImageDisplayed => image_displayed,
            HistoryGate::Always => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingHistory {
        undos: usize,
        redos: usize,
    }

    impl HistoryStack for CountingHistory {
        fn undo(&mut self) {
            self.undos += 1;
        }

        fn redo(&mut self) {
            self.redos += 1;
        }
    }

    #[test]
    fn test_gated_without_image() {
        let mut bridge = HistoryBridge::new(CountingHistory::default(), HistoryGate::default());
        assert!(!bridge.can_undo(false));
        assert_eq!(bridge.undo(false), HistoryOutcome::Gated);
        assert_eq!(bridge.redo(false), HistoryOutcome::Gated);
        assert_eq!(bridge.history().undos, 0);
        assert_eq!(bridge.history().redos, 0);
    }

    #[test]
    fn test_forwarded_with_image() {
        let mut bridge = HistoryBridge::new(CountingHistory::default(), HistoryGate::default());
        assert!(bridge.can_redo(true));
        assert_eq!(bridge.undo(true), HistoryOutcome::Forwarded);
        assert_eq!(bridge.redo(true), HistoryOutcome::Forwarded);
        assert_eq!(bridge.history().undos, 1);
        assert_eq!(bridge.history().redos, 1);
    }

    #[test]
    fn test_always_gate() {
        let mut bridge = HistoryBridge::new(CountingHistory::default(), HistoryGate::Always);
        assert_eq!(bridge.redo(false), HistoryOutcome::Forwarded);
        assert_eq!(bridge.history().redos, 1);
    }
}
