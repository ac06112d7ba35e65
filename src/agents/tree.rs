//! Serializable snapshot of an agent tree.

use serde::{Deserialize, Serialize};

use super::{Agent, AgentId, AgentKind};

/// One node of the tree as seen from outside.
///
/// # Invariants
/// - Leaves have no children
/// - No cycles: children are owned, so the snapshot is a strict tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentTreeNode {
    pub id: AgentId,
    pub name: String,
    pub kind: AgentKind,
    pub capabilities: Vec<String>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<AgentTreeNode>,
}

impl AgentTreeNode {
    /// Walk `agent` and its descendants.
    pub fn snapshot(agent: &dyn Agent) -> Self {
        Self {
            id: *agent.id(),
            name: agent.name().to_string(),
            kind: agent.kind(),
            capabilities: agent
                .capabilities()
                .iter()
                .map(|c| c.to_string())
                .collect(),
            description: agent.description().to_string(),
            children: agent
                .children()
                .iter()
                .map(|child| Self::snapshot(child.as_ref()))
                .collect(),
        }
    }

    /// Number of nodes in this subtree.
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(Self::len).sum::<usize>()
    }

    /// Levels in this subtree (a lone leaf has depth 1).
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(Self::depth).max().unwrap_or(0)
    }

    /// Depth-first search by name.
    pub fn find(&self, name: &str) -> Option<&AgentTreeNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    /// Indented one-line-per-node rendering for logs.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    fn render_into(&self, out: &mut String, indent: usize) {
        out.push_str(&"  ".repeat(indent));
        out.push_str(&self.name);
        if !self.capabilities.is_empty() {
            out.push_str(&format!(" [{}]", self.capabilities.join(", ")));
        }
        out.push('\n');
        for child in &self.children {
            child.render_into(out, indent + 1);
        }
    }
}
