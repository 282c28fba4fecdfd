//! In-memory tool group.

use std::collections::{BTreeMap, BTreeSet};

use crate::engine::{EngineError, MouseBinding, ToolGroupHandle};
use crate::registry::ViewportId;

/// Tool group that records its state and every activation change.
#[derive(Debug, Clone, Default)]
pub struct HeadlessToolGroup {
    /// Registered tools and the bindings they are active on (empty = passive)
    tools: BTreeMap<String, Vec<MouseBinding>>,
    viewports: BTreeSet<ViewportId>,
    calls: Vec<String>,
}

impl HeadlessToolGroup {
    /// Create an empty group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a tool name is registered.
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Names of tools bound to at least one input.
    pub fn active_tools(&self) -> Vec<&str> {
        self.tools
            .iter()
            .filter(|(_, bindings)| !bindings.is_empty())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Bindings a tool is active on.
    pub fn bindings_of(&self, name: &str) -> &[MouseBinding] {
        self.tools.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether the group governs a viewport.
    pub fn governs(&self, id: &ViewportId) -> bool {
        self.viewports.contains(id)
    }

    /// Governed viewports.
    pub fn viewports(&self) -> impl Iterator<Item = &ViewportId> {
        self.viewports.iter()
    }

    /// Recorded activation and membership changes, e.g. `active:Length`.
    pub fn calls(&self) -> &[String] {
        &self.calls
    }

    /// Forget recorded calls.
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    fn tool_mut(&mut self, name: &str) -> Result<&mut Vec<MouseBinding>, EngineError> {
        self.tools
            .get_mut(name)
            .ok_or_else(|| EngineError::UnknownTool(name.to_string()))
    }
}

impl ToolGroupHandle for HeadlessToolGroup {
    fn add_tool(&mut self, tool_name: &str) -> Result<(), EngineError> {
        self.tools.entry(tool_name.to_string()).or_default();
        Ok(())
    }

    fn add_viewport(&mut self, id: &ViewportId) -> Result<(), EngineError> {
        self.viewports.insert(id.clone());
        self.calls.push(format!("add_viewport:{}", id));
        Ok(())
    }

    fn remove_viewport(&mut self, id: &ViewportId) -> Result<(), EngineError> {
        self.calls.push(format!("remove_viewport:{}", id));
        if self.viewports.remove(id) {
            Ok(())
        } else {
            Err(EngineError::UnknownViewport(id.clone()))
        }
    }

    fn set_tool_active(
        &mut self,
        tool_name: &str,
        bindings: &[MouseBinding],
    ) -> Result<(), EngineError> {
        let active = self.tool_mut(tool_name)?;
        *active = bindings.to_vec();
        self.calls.push(format!("active:{}", tool_name));
        Ok(())
    }

    fn set_tool_passive(&mut self, tool_name: &str) -> Result<(), EngineError> {
        self.tool_mut(tool_name)?.clear();
        self.calls.push(format!("passive:{}", tool_name));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activation_tracking() {
        let mut group = HeadlessToolGroup::new();
        group.add_tool("Pan").unwrap();
        group.add_tool("Zoom").unwrap();
        assert!(group.calls().is_empty());

        group.set_tool_active("Pan", &[MouseBinding::Primary]).unwrap();
        assert_eq!(group.active_tools(), vec!["Pan"]);
        assert_eq!(group.bindings_of("Pan"), &[MouseBinding::Primary]);

        group.set_tool_passive("Pan").unwrap();
        assert!(group.active_tools().is_empty());
        assert_eq!(group.calls(), &["active:Pan", "passive:Pan"]);
    }

    #[test]
    fn test_unknown_tool() {
        let mut group = HeadlessToolGroup::new();
        assert_eq!(
            group.set_tool_passive("Probe"),
            Err(EngineError::UnknownTool("Probe".to_string()))
        );
    }
}
