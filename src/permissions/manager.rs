//! Permission manager implementation
//!
//! Tools named in the trust set run without asking. Tools in the block set
//! are refused without asking. Everything else goes to the user.

use std::collections::BTreeSet;

/// Result text sent to the model when a tool call is refused
pub const PERMISSION_DENIED: &str = "Permission denied by user";

/// A request for permission to execute a tool
#[derive(Debug, Clone)]
pub struct PermissionRequest {
    /// Name of the tool
    pub tool_name: String,
    /// Human-readable description of the action
    pub action_description: String,
    /// Optional details about the action
    pub details: Option<String>,
}

impl PermissionRequest {
    pub fn new(tool_name: impl Into<String>, action_description: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            action_description: action_description.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// The user's decision on a permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionDecision {
    /// Allow this call
    Allow,
    /// Deny this call
    Deny,
    /// Allow this tool for the rest of the session
    AlwaysAllow,
    /// Deny this tool for the rest of the session
    AlwaysDeny,
}

impl PermissionDecision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allow | Self::AlwaysAllow)
    }
}

/// Trust gate for tool execution
#[derive(Debug, Default, Clone)]
pub struct PermissionManager {
    trusted: BTreeSet<String>,
    blocked: BTreeSet<String>,
}

impl PermissionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a set of trusted tools
    pub fn with_trusted<I, S>(tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut manager = Self::new();
        for tool in tools {
            manager.trust(tool);
        }
        manager
    }

    /// Always allow a tool
    pub fn trust(&mut self, tool_name: impl Into<String>) {
        let name = tool_name.into();
        tracing::info!("Trusting tool: {}", name);
        self.blocked.remove(&name);
        self.trusted.insert(name);
    }

    /// Always deny a tool
    pub fn block(&mut self, tool_name: impl Into<String>) {
        let name = tool_name.into();
        tracing::info!("Blocking tool: {}", name);
        self.trusted.remove(&name);
        self.blocked.insert(name);
    }

    pub fn is_trusted(&self, tool_name: &str) -> bool {
        self.trusted.contains(tool_name)
    }

    /// Check if a tool should be automatically allowed or denied
    ///
    /// Returns:
    /// - Some(true) if the tool is trusted
    /// - Some(false) if the tool is blocked
    /// - None if the user should be asked
    pub fn check_auto_decision(&self, tool_name: &str) -> Option<bool> {
        if self.trusted.contains(tool_name) {
            return Some(true);
        }
        if self.blocked.contains(tool_name) {
            return Some(false);
        }
        None
    }

    /// Remember "always" answers
    pub fn process_decision(&mut self, tool_name: &str, decision: PermissionDecision) {
        match decision {
            PermissionDecision::AlwaysAllow => self.trust(tool_name),
            PermissionDecision::AlwaysDeny => self.block(tool_name),
            PermissionDecision::Allow | PermissionDecision::Deny => {}
        }
    }

    /// Trusted tool names, sorted
    pub fn trusted(&self) -> Vec<&str> {
        self.trusted.iter().map(|s| s.as_str()).collect()
    }

    pub fn blocked(&self) -> Vec<&str> {
        self.blocked.iter().map(|s| s.as_str()).collect()
    }
}
