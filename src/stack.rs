//! Stack assignment: which images each viewport holds and which one it shows.
//!
//! Planning is separated from applying. `plan_*` methods inspect the current
//! assignment and say what the engine has to do; the workspace carries the plan
//! out and reports back through `begin_load`, `complete_load` and friends.
//! This type is the only writer of stacks and displayed indices.

use std::collections::BTreeMap;

use crate::catalog::ImageId;
use crate::engine::RequestToken;
use crate::error::{Result, ViewerError};
use crate::registry::ViewportId;

/// A load issued to the engine but not yet completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLoad {
    /// Token the load was issued with
    pub token: RequestToken,
    /// Stack being loaded
    pub stack: Vec<ImageId>,
    /// Index to present once loaded
    pub displayed: Option<usize>,
}

/// Stack state of one viewport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackEntry {
    stack: Vec<ImageId>,
    displayed: Option<usize>,
    resident: bool,
    pending: Option<PendingLoad>,
}

impl StackEntry {
    /// The committed stack.
    pub fn stack(&self) -> &[ImageId] {
        &self.stack
    }

    /// Index of the presented image.
    pub fn displayed_index(&self) -> Option<usize> {
        self.displayed
    }

    /// The presented image.
    pub fn displayed_reference(&self) -> Option<&ImageId> {
        self.displayed.and_then(|i| self.stack.get(i))
    }

    /// Whether the committed stack is loaded in the engine.
    pub fn is_resident(&self) -> bool {
        self.resident
    }

    /// The in-flight load, if any.
    pub fn pending(&self) -> Option<&PendingLoad> {
        self.pending.as_ref()
    }

    /// Stack the viewport is heading towards: pending if any, else committed.
    pub fn intended_stack(&self) -> &[ImageId] {
        match &self.pending {
            Some(pending) => &pending.stack,
            None => &self.stack,
        }
    }

    /// Image the viewport is heading towards.
    fn intended_reference(&self) -> Option<&ImageId> {
        match &self.pending {
            Some(pending) => pending.displayed.and_then(|i| pending.stack.get(i)),
            None => self.displayed_reference(),
        }
    }

    /// Whether the index-change path can be used.
    fn accepts_index_change(&self) -> bool {
        self.resident && self.pending.is_none()
    }
}

/// What has to happen in the engine for a stack change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackPlan {
    /// Already in the requested state
    Unchanged,
    /// Present another image of the resident stack
    ChangeIndex(usize),
    /// Load a stack, presenting `displayed` once done
    Load {
        /// Stack to load
        stack: Vec<ImageId>,
        /// Index to present
        displayed: Option<usize>,
    },
}

/// Maps viewports to their stacks and displayed indices.
#[derive(Debug, Clone, Default)]
pub struct StackAssignment {
    entries: BTreeMap<ViewportId, StackEntry>,
}

impl StackAssignment {
    /// Create an empty assignment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stack entry of a viewport.
    pub fn entry(&self, id: &ViewportId) -> Option<&StackEntry> {
        self.entries.get(id)
    }

    /// Create an empty entry for a viewport if it has none.
    pub fn ensure(&mut self, id: &ViewportId) {
        self.entries.entry(id.clone()).or_default();
    }

    /// Give a new viewport a stack without presenting anything.
    pub fn seed(&mut self, id: &ViewportId, stack: Vec<ImageId>) {
        self.entries.insert(
            id.clone(),
            StackEntry {
                stack,
                ..StackEntry::default()
            },
        );
    }

    /// Drop a viewport's entry.
    pub fn remove(&mut self, id: &ViewportId) -> Option<StackEntry> {
        self.entries.remove(id)
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Whether any viewport presents an image.
    pub fn displayed_anywhere(&self) -> bool {
        self.entries
            .values()
            .any(|entry| entry.displayed_reference().is_some())
    }

    /// Ids of viewports presenting an image.
    pub fn displaying_viewports(&self) -> Vec<ViewportId> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.displayed_reference().is_some())
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Plan a wholesale stack replacement.
    ///
    /// The displayed reference survives if it appears anywhere in `stack`.
    pub fn plan_set_stack(&self, id: &ViewportId, stack: Vec<ImageId>) -> Result<StackPlan> {
        self.plan_replace(id, stack, None)
    }

    /// Plan a stack replacement, presenting `fallback` when the displayed
    /// reference does not survive.
    pub fn plan_replace(
        &self,
        id: &ViewportId,
        stack: Vec<ImageId>,
        fallback: Option<usize>,
    ) -> Result<StackPlan> {
        let entry = self.entry_or_err(id)?;

        let preserved = entry
            .intended_reference()
            .and_then(|current| stack.iter().position(|r| r == current));
        let displayed = preserved.or(fallback.filter(|i| *i < stack.len()));

        if entry.accepts_index_change() && entry.stack == stack && entry.displayed == displayed {
            return Ok(StackPlan::Unchanged);
        }
        Ok(StackPlan::Load { stack, displayed })
    }

    /// Plan presenting `reference` in a viewport.
    ///
    /// A reference already in the stack becomes an index change; anything else
    /// replaces the stack with just that reference.
    pub fn plan_select(&self, id: &ViewportId, reference: &ImageId) -> Result<StackPlan> {
        let entry = self.entry_or_err(id)?;
        let intended = entry.intended_stack();

        let Some(index) = intended.iter().position(|r| r == reference) else {
            return Ok(StackPlan::Load {
                stack: vec![reference.clone()],
                displayed: Some(0),
            });
        };

        if !entry.accepts_index_change() {
            return Ok(StackPlan::Load {
                stack: intended.to_vec(),
                displayed: Some(index),
            });
        }
        if entry.displayed == Some(index) {
            return Ok(StackPlan::Unchanged);
        }
        Ok(StackPlan::ChangeIndex(index))
    }

    /// Record an issued load. Supersedes any earlier pending load.
    pub fn begin_load(
        &mut self,
        id: &ViewportId,
        token: RequestToken,
        stack: Vec<ImageId>,
        displayed: Option<usize>,
    ) -> Result<()> {
        if displayed.is_some_and(|i| i >= stack.len()) {
            return Err(ViewerError::invariant(format!(
                "displayed index {:?} outside stack of {} for {}",
                displayed,
                stack.len(),
                id
            )));
        }
        let entry = self.entry_mut_or_err(id)?;
        entry.pending = Some(PendingLoad {
            token,
            stack,
            displayed,
        });
        Ok(())
    }

    /// Commit the pending load if `token` matches it.
    pub fn complete_load(&mut self, id: &ViewportId, token: RequestToken) -> Option<&StackEntry> {
        let entry = self.entries.get_mut(id)?;
        if entry.pending.as_ref().map(|p| p.token) != Some(token) {
            return None;
        }
        let pending = entry.pending.take()?;
        entry.stack = pending.stack;
        entry.displayed = pending.displayed;
        entry.resident = true;
        Some(&*entry)
    }

    /// Drop the pending load if `token` matches it.
    ///
    /// The committed stack and displayed index stay untouched, but the engine
    /// state is no longer trusted, so the next selection reloads.
    pub fn fail_load(&mut self, id: &ViewportId, token: RequestToken) -> bool {
        let Some(entry) = self.entries.get_mut(id) else {
            return false;
        };
        if entry.pending.as_ref().map(|p| p.token) != Some(token) {
            return false;
        }
        entry.pending = None;
        entry.resident = false;
        true
    }

    /// Commit an index change on the resident stack.
    pub fn commit_index(&mut self, id: &ViewportId, index: usize) -> Result<()> {
        let entry = self.entry_mut_or_err(id)?;
        if index >= entry.stack.len() {
            return Err(ViewerError::invariant(format!(
                "index {} outside stack of {} for {}",
                index,
                entry.stack.len(),
                id
            )));
        }
        entry.displayed = Some(index);
        Ok(())
    }

    fn entry_or_err(&self, id: &ViewportId) -> Result<&StackEntry> {
        self.entries
            .get(id)
            .ok_or_else(|| ViewerError::viewport_not_found(id))
    }

    fn entry_mut_or_err(&mut self, id: &ViewportId) -> Result<&mut StackEntry> {
        self.entries
            .get_mut(id)
            .ok_or_else(|| ViewerError::viewport_not_found(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs(list: &[&str]) -> Vec<ImageId> {
        list.iter().map(|r| ImageId::from(*r)).collect()
    }

    /// Assignment with `stack` committed and resident on viewport "v".
    fn resident(stack: &[&str], displayed: Option<usize>) -> (StackAssignment, ViewportId) {
        let id = ViewportId::from("v");
        let mut assignment = StackAssignment::new();
        assignment.ensure(&id);
        let token = RequestToken::new(1);
        assignment
            .begin_load(&id, token, refs(stack), displayed)
            .unwrap();
        assert!(assignment.complete_load(&id, token).is_some());
        (assignment, id)
    }

    #[test]
    fn test_select_present_reference_is_index_change() {
        let (assignment, id) = resident(&["A", "B", "C"], Some(0));
        let plan = assignment.plan_select(&id, &"B".into()).unwrap();
        assert_eq!(plan, StackPlan::ChangeIndex(1));
    }

    #[test]
    fn test_select_absent_reference_replaces_stack() {
        let (assignment, id) = resident(&["A", "B", "C"], Some(0));
        let plan = assignment.plan_select(&id, &"Z".into()).unwrap();
        assert_eq!(
            plan,
            StackPlan::Load {
                stack: refs(&["Z"]),
                displayed: Some(0)
            }
        );
    }

    #[test]
    fn test_select_current_reference_is_unchanged() {
        let (assignment, id) = resident(&["A", "B"], Some(1));
        assert_eq!(
            assignment.plan_select(&id, &"B".into()).unwrap(),
            StackPlan::Unchanged
        );
    }

    #[test]
    fn test_select_on_seeded_stack_reloads_at_index() {
        let id = ViewportId::from("secondary");
        let mut assignment = StackAssignment::new();
        assignment.seed(&id, refs(&["A", "B", "C"]));

        let plan = assignment.plan_select(&id, &"C".into()).unwrap();
        assert_eq!(
            plan,
            StackPlan::Load {
                stack: refs(&["A", "B", "C"]),
                displayed: Some(2)
            }
        );
    }

    #[test]
    fn test_set_stack_preserves_displayed_by_identity() {
        let (assignment, id) = resident(&["A", "B", "C"], Some(1));
        let plan = assignment.plan_set_stack(&id, refs(&["B", "C", "D"])).unwrap();
        assert_eq!(
            plan,
            StackPlan::Load {
                stack: refs(&["B", "C", "D"]),
                displayed: Some(0)
            }
        );
    }

    #[test]
    fn test_set_stack_clears_displayed_when_missing() {
        let (assignment, id) = resident(&["A", "B"], Some(0));
        let plan = assignment.plan_set_stack(&id, refs(&["C", "D"])).unwrap();
        assert_eq!(
            plan,
            StackPlan::Load {
                stack: refs(&["C", "D"]),
                displayed: None
            }
        );
    }

    #[test]
    fn test_set_identical_stack_is_unchanged() {
        let (assignment, id) = resident(&["A", "B"], Some(1));
        assert_eq!(
            assignment.plan_set_stack(&id, refs(&["A", "B"])).unwrap(),
            StackPlan::Unchanged
        );
    }

    #[test]
    fn test_replace_uses_fallback() {
        let id = ViewportId::from("v");
        let mut assignment = StackAssignment::new();
        assignment.ensure(&id);
        let plan = assignment
            .plan_replace(&id, refs(&["A", "B"]), Some(0))
            .unwrap();
        assert_eq!(
            plan,
            StackPlan::Load {
                stack: refs(&["A", "B"]),
                displayed: Some(0)
            }
        );
    }

    #[test]
    fn test_duplicates_resolve_to_first_occurrence() {
        let (assignment, id) = resident(&["A", "B"], Some(1));
        let plan = assignment
            .plan_set_stack(&id, refs(&["C", "B", "B"]))
            .unwrap();
        assert_eq!(
            plan,
            StackPlan::Load {
                stack: refs(&["C", "B", "B"]),
                displayed: Some(1)
            }
        );
    }

    #[test]
    fn test_stale_completion_is_ignored() {
        let (mut assignment, id) = resident(&["A"], Some(0));
        let old = RequestToken::new(2);
        let new = RequestToken::new(3);
        assignment.begin_load(&id, old, refs(&["B"]), Some(0)).unwrap();
        assignment.begin_load(&id, new, refs(&["C"]), Some(0)).unwrap();

        assert!(assignment.complete_load(&id, old).is_none());
        let entry = assignment.complete_load(&id, new).unwrap();
        assert_eq!(entry.displayed_reference(), Some(&"C".into()));
    }

    #[test]
    fn test_failed_load_keeps_displayed() {
        let (mut assignment, id) = resident(&["A", "B"], Some(1));
        let token = RequestToken::new(5);
        assignment.begin_load(&id, token, refs(&["X"]), Some(0)).unwrap();

        assert!(assignment.fail_load(&id, token));
        let entry = assignment.entry(&id).unwrap();
        assert_eq!(entry.displayed_reference(), Some(&"B".into()));
        assert!(!entry.is_resident());
        assert!(entry.pending().is_none());
    }

    #[test]
    fn test_unknown_viewport() {
        let assignment = StackAssignment::new();
        assert!(matches!(
            assignment.plan_select(&"nope".into(), &"A".into()),
            Err(ViewerError::ViewportNotFound { .. })
        ));
    }

    #[test]
    fn test_commit_index_checks_bounds() {
        let (mut assignment, id) = resident(&["A", "B"], None);
        assert!(!assignment.displayed_anywhere());
        assignment.commit_index(&id, 1).unwrap();
        assert!(assignment.displayed_anywhere());
        assert!(assignment.commit_index(&id, 2).is_err());
    }
}
