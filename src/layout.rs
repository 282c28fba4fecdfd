//! Comparison layouts and the viewport sets they require.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{PRIMARY_VIEWPORT_ID, SECONDARY_VIEWPORT_IDS};
use crate::error::ViewerError;
use crate::registry::ViewportId;

/// Role of a viewport within a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewportRole {
    /// The viewport the user works in; exactly one per layout
    Primary,
    /// Comparison viewport, inert until populated
    Secondary,
}

/// How many viewports are shown side by side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    /// Primary viewport only
    #[default]
    Single,
    /// Primary plus one comparison viewport
    Dual,
    /// Primary plus three comparison viewports
    Quad,
}

impl LayoutMode {
    /// Get the config/CLI name for this layout.
    pub fn name(&self) -> &'static str {
        match self {
            LayoutMode::Single => "single",
            LayoutMode::Dual => "dual",
            LayoutMode::Quad => "quad",
        }
    }

    /// Get all layouts in cycle order.
    pub fn all() -> &'static [LayoutMode] {
        &[LayoutMode::Single, LayoutMode::Dual, LayoutMode::Quad]
    }

    /// Number of viewports this layout shows.
    pub fn viewport_count(&self) -> usize {
        match self {
            LayoutMode::Single => 1,
            LayoutMode::Dual => 2,
            LayoutMode::Quad => 4,
        }
    }

    /// The layout after this one in the single → dual → quad cycle.
    pub fn next(&self) -> LayoutMode {
        match self {
            LayoutMode::Single => LayoutMode::Dual,
            LayoutMode::Dual => LayoutMode::Quad,
            LayoutMode::Quad => LayoutMode::Single,
        }
    }

    /// Viewport ids and roles this layout requires, primary first.
    pub fn required_viewports(&self) -> Vec<(ViewportId, ViewportRole)> {
        let mut viewports = vec![(ViewportId::from(PRIMARY_VIEWPORT_ID), ViewportRole::Primary)];
        viewports.extend(
            SECONDARY_VIEWPORT_IDS
                .iter()
                .take(self.viewport_count() - 1)
                .map(|id| (ViewportId::from(*id), ViewportRole::Secondary)),
        );
        viewports
    }
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LayoutMode {
    type Err = ViewerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "single" | "1" => Ok(LayoutMode::Single),
            "dual" | "dual-comparison" | "2" => Ok(LayoutMode::Dual),
            "quad" | "quad-comparison" | "4" => Ok(LayoutMode::Quad),
            _ => Err(ViewerError::UnknownLayout(s.to_string())),
        }
    }
}

/// Report of one layout transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutTransition {
    /// Layout before the transition
    pub from: LayoutMode,
    /// Layout after the transition
    pub to: LayoutMode,
    /// Viewports enabled by the transition, with their roles
    pub created: Vec<(ViewportId, ViewportRole)>,
    /// Viewports torn down by the transition
    pub removed: Vec<ViewportId>,
}

impl LayoutTransition {
    /// Whether the transition changed nothing.
    pub fn is_noop(&self) -> bool {
        self.created.is_empty() && self.removed.is_empty()
    }
}

/// Owns the current layout and computes viewport diffs.
#[derive(Debug, Clone, Default)]
pub struct LayoutController {
    mode: LayoutMode,
}

impl LayoutController {
    /// Create a controller starting in the given layout.
    pub fn new(mode: LayoutMode) -> Self {
        Self { mode }
    }

    /// The current layout.
    pub fn mode(&self) -> LayoutMode {
        self.mode
    }

    /// Diff `existing` viewports against what `target` requires.
    pub fn plan<'a>(
        &self,
        target: LayoutMode,
        existing: impl IntoIterator<Item = &'a ViewportId>,
    ) -> LayoutTransition {
        let existing: Vec<&ViewportId> = existing.into_iter().collect();
        let required = target.required_viewports();

        let created = required
            .iter()
            .filter(|(id, _)| !existing.contains(&id))
            .cloned()
            .collect();
        let removed = existing
            .into_iter()
            .filter(|id| !required.iter().any(|(required_id, _)| required_id == *id))
            .cloned()
            .collect();

        LayoutTransition {
            from: self.mode,
            to: target,
            created,
            removed,
        }
    }

    /// Record that the layout now is `mode`.
    pub fn commit(&mut self, mode: LayoutMode) {
        if self.mode != mode {
            log::info!("📐 Layout {} → {}", self.mode, mode);
        }
        self.mode = mode;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&str]) -> Vec<ViewportId> {
        list.iter().map(|id| ViewportId::from(*id)).collect()
    }

    #[test]
    fn test_required_viewports() {
        assert_eq!(LayoutMode::Single.required_viewports().len(), 1);
        let quad = LayoutMode::Quad.required_viewports();
        assert_eq!(quad.len(), 4);
        assert_eq!(quad[0].1, ViewportRole::Primary);
        assert!(quad[1..].iter().all(|(_, role)| *role == ViewportRole::Secondary));
    }

    #[test]
    fn test_plan_from_empty_creates_primary() {
        let controller = LayoutController::default();
        let transition = controller.plan(LayoutMode::Single, &[]);
        assert_eq!(
            transition.created,
            vec![(ViewportId::from(PRIMARY_VIEWPORT_ID), ViewportRole::Primary)]
        );
        assert!(transition.removed.is_empty());
    }

    #[test]
    fn test_plan_dual_to_quad_keeps_existing_secondary() {
        let controller = LayoutController::new(LayoutMode::Dual);
        let existing = ids(&[PRIMARY_VIEWPORT_ID, SECONDARY_VIEWPORT_IDS[0]]);
        let transition = controller.plan(LayoutMode::Quad, &existing);

        let created: Vec<_> = transition.created.iter().map(|(id, _)| id.clone()).collect();
        assert_eq!(created, ids(&SECONDARY_VIEWPORT_IDS[1..]));
        assert!(transition.removed.is_empty());
    }

    #[test]
    fn test_plan_quad_to_single_removes_secondaries() {
        let controller = LayoutController::new(LayoutMode::Quad);
        let existing = LayoutMode::Quad
            .required_viewports()
            .into_iter()
            .map(|(id, _)| id)
            .collect::<Vec<_>>();
        let transition = controller.plan(LayoutMode::Single, &existing);

        assert!(transition.created.is_empty());
        assert_eq!(transition.removed, ids(&SECONDARY_VIEWPORT_IDS));
    }

    #[test]
    fn test_same_layout_is_noop() {
        let controller = LayoutController::new(LayoutMode::Dual);
        let existing = ids(&[PRIMARY_VIEWPORT_ID, SECONDARY_VIEWPORT_IDS[0]]);
        assert!(controller.plan(LayoutMode::Dual, &existing).is_noop());
    }

    #[test]
    fn test_parse_and_cycle() {
        assert_eq!("dual".parse::<LayoutMode>().unwrap(), LayoutMode::Dual);
        assert_eq!("quad-comparison".parse::<LayoutMode>().unwrap(), LayoutMode::Quad);
        assert!("triple".parse::<LayoutMode>().is_err());
        assert_eq!(LayoutMode::Quad.next(), LayoutMode::Single);
    }
}
