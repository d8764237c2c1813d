//! Named data bus.
//!
//! The bus is a tree of named slots addressed by slash-separated paths
//! (`input/controls/roll`, `controls/elevator`, ...). Nodes are stored in a
//! flat arena and refer to each other by [`NodeId`]; there are no
//! back-pointers other than a parent index.
//!
//! Paths are resolved once at initialization into [`DataRef`] handles. The
//! per-tick hot path reads and writes through those handles only.

use std::collections::BTreeMap;

use crate::error::{FdmError, FdmResult};
use crate::ids::NodeId;

/// Discriminates the two kinds of nodes in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Group,
    Value,
}

#[derive(Debug, Clone)]
enum NodeContent {
    Group { children: BTreeMap<String, NodeId> },
    Value(f64),
}

/// A single node of the data bus tree.
#[derive(Debug, Clone)]
pub struct DataNode {
    name: String,
    parent: Option<NodeId>,
    content: NodeContent,
}

impl DataNode {
    fn group(name: &str, parent: Option<NodeId>) -> Self {
        Self {
            name: name.to_string(),
            parent,
            content: NodeContent::Group {
                children: BTreeMap::new(),
            },
        }
    }

    fn new_value(name: &str, parent: NodeId) -> Self {
        Self {
            name: name.to_string(),
            parent: Some(parent),
            content: NodeContent::Value(0.0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn kind(&self) -> NodeKind {
        match self.content {
            NodeContent::Group { .. } => NodeKind::Group,
            NodeContent::Value(_) => NodeKind::Value,
        }
    }

    /// Scalar held by a Value node, `None` for a Group.
    pub fn value(&self) -> Option<f64> {
        match self.content {
            NodeContent::Value(v) => Some(v),
            NodeContent::Group { .. } => None,
        }
    }

    /// Child names of a Group node, in sorted order.
    pub fn child_names(&self) -> impl Iterator<Item = &str> {
        let children = match &self.content {
            NodeContent::Group { children } => Some(children),
            NodeContent::Value(_) => None,
        };
        children
            .into_iter()
            .flat_map(|c| c.keys().map(String::as_str))
    }

    fn child(&self, name: &str) -> Option<NodeId> {
        match &self.content {
            NodeContent::Group { children } => children.get(name).copied(),
            NodeContent::Value(_) => None,
        }
    }
}

/// Resolved handle to exactly one Value node.
///
/// A `DataRef` does not own the node; the [`DataBus`] that produced it does.
/// Handles are only meaningful for that bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataRef {
    id: NodeId,
}

impl DataRef {
    pub fn id(&self) -> NodeId {
        self.id
    }
}

/// Arena-backed tree of named value slots.
#[derive(Debug, Clone)]
pub struct DataBus {
    nodes: Vec<DataNode>,
}

impl Default for DataBus {
    fn default() -> Self {
        Self::new()
    }
}

impl DataBus {
    /// Create a bus containing only the root group.
    pub fn new() -> Self {
        Self {
            nodes: vec![DataNode::group("", None)],
        }
    }

    fn root() -> NodeId {
        NodeId::from_index(0)
    }

    /// Number of nodes, including the root group.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    fn segments(path: &str) -> FdmResult<Vec<&str>> {
        let trimmed = path.strip_prefix('/').unwrap_or(path);
        if trimmed.is_empty() {
            return Err(FdmError::invalid_arg("data bus path must not be empty"));
        }
        let segments: Vec<&str> = trimmed.split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(FdmError::invalid_arg(format!(
                "data bus path '{path}' contains an empty segment"
            )));
        }
        Ok(segments)
    }

    fn push(&mut self, node: DataNode) -> NodeId {
        let id = NodeId::from_index(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    fn attach(&mut self, parent: NodeId, name: &str, child: NodeId) {
        if let Some(DataNode {
            content: NodeContent::Group { children },
            ..
        }) = self.nodes.get_mut(parent.slot())
        {
            children.insert(name.to_string(), child);
        }
    }

    /// Create a node of `kind` at `path`, creating intermediate groups.
    ///
    /// Adding a node that already exists with the same kind returns the
    /// existing node. A segment that collides with a node of the other kind
    /// is an error.
    pub fn add_node(&mut self, path: &str, kind: NodeKind) -> FdmResult<NodeId> {
        let segments = Self::segments(path)?;
        let last = segments.len() - 1;
        let mut current = Self::root();

        for (i, segment) in segments.iter().enumerate() {
            let wanted = if i == last { kind } else { NodeKind::Group };
            match self.nodes[current.slot()].child(segment) {
                Some(existing) => {
                    let found = self.nodes[existing.slot()].kind();
                    if found != wanted {
                        return Err(FdmError::invalid_arg(format!(
                            "data bus path '{path}': segment '{segment}' is a {found:?} node, expected {wanted:?}"
                        )));
                    }
                    current = existing;
                }
                None => {
                    let node = match wanted {
                        NodeKind::Group => DataNode::group(segment, Some(current)),
                        NodeKind::Value => DataNode::new_value(segment, current),
                    };
                    let id = self.push(node);
                    self.attach(current, segment, id);
                    current = id;
                }
            }
        }

        Ok(current)
    }

    /// Create (or reuse) a Value node at `path` and return its handle.
    pub fn add_value(&mut self, path: &str) -> FdmResult<DataRef> {
        let id = self.add_node(path, NodeKind::Value)?;
        Ok(DataRef { id })
    }

    /// Resolve `path` to a node id.
    pub fn node_id(&self, path: &str) -> Option<NodeId> {
        let segments = Self::segments(path).ok()?;
        let mut current = Self::root();
        for segment in segments {
            current = self.nodes[current.slot()].child(segment)?;
        }
        Some(current)
    }

    /// Resolve `path` to a node.
    pub fn get_node(&self, path: &str) -> Option<&DataNode> {
        self.node_id(path).map(|id| &self.nodes[id.slot()])
    }

    pub fn node(&self, id: NodeId) -> Option<&DataNode> {
        self.nodes.get(id.slot())
    }

    /// Resolve `path` to a Value handle.
    ///
    /// Missing paths and Group nodes are reported as `NullPointer`.
    pub fn get_ref(&self, path: &str) -> FdmResult<DataRef> {
        match self.node_id(path) {
            Some(id) if self.nodes[id.slot()].kind() == NodeKind::Value => Ok(DataRef { id }),
            Some(_) => Err(FdmError::null_pointer(format!(
                "data bus path '{path}' is a group, not a value"
            ))),
            None => Err(FdmError::null_pointer(format!(
                "data bus path '{path}' does not exist"
            ))),
        }
    }

    /// Read through a handle. Handles from another bus read as NaN.
    #[inline]
    pub fn get(&self, r: DataRef) -> f64 {
        match self.nodes.get(r.id.slot()) {
            Some(DataNode {
                content: NodeContent::Value(v),
                ..
            }) => *v,
            _ => f64::NAN,
        }
    }

    /// Write through a handle. All holders of a handle to the same path see
    /// the new value.
    #[inline]
    pub fn set(&mut self, r: DataRef, value: f64) {
        if let Some(DataNode {
            content: NodeContent::Value(v),
            ..
        }) = self.nodes.get_mut(r.id.slot())
        {
            *v = value;
        }
    }

    /// Read by path. Initialization-time convenience; resolves the path.
    pub fn get_value(&self, path: &str) -> FdmResult<f64> {
        self.get_ref(path).map(|r| self.get(r))
    }

    /// Write by path. Initialization-time convenience; resolves the path.
    pub fn set_value(&mut self, path: &str, value: f64) -> FdmResult<()> {
        let r = self.get_ref(path)?;
        self.set(r, value);
        Ok(())
    }

    /// Full slash-separated path of a node.
    pub fn path_of(&self, id: NodeId) -> String {
        let mut parts = Vec::new();
        let mut current = self.nodes.get(id.slot());
        while let Some(node) = current {
            if node.parent.is_none() {
                break;
            }
            parts.push(node.name.as_str());
            current = node.parent.and_then(|p| self.nodes.get(p.slot()));
        }
        parts.reverse();
        parts.join("/")
    }

    /// Paths of every Value node, sorted.
    pub fn value_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.kind() == NodeKind::Value)
            .map(|(i, _)| self.path_of(NodeId::from_index(i as u32)))
            .collect();
        paths.sort();
        paths
    }

    /// Zero every Value node. The tree shape is untouched.
    pub fn reset_values(&mut self) {
        for node in &mut self.nodes {
            if let NodeContent::Value(v) = &mut node.content {
                *v = 0.0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_creates_intermediate_groups() {
        let mut bus = DataBus::new();
        bus.add_node("input/controls/roll", NodeKind::Value).unwrap();

        assert_eq!(bus.get_node("input").unwrap().kind(), NodeKind::Group);
        assert_eq!(
            bus.get_node("input/controls").unwrap().kind(),
            NodeKind::Group
        );
        let leaf = bus.get_node("input/controls/roll").unwrap();
        assert_eq!(leaf.kind(), NodeKind::Value);
        assert_eq!(leaf.value(), Some(0.0));
        assert_eq!(bus.len(), 4);
    }

    #[test]
    fn node_value_reads_slot_and_none_for_groups() {
        let mut bus = DataBus::new();
        let r = bus.add_value("output/gear/nose").unwrap();
        bus.set(r, 1.5);

        assert_eq!(bus.node(r.id()).unwrap().value(), Some(1.5));
        assert_eq!(bus.get_node("output/gear").unwrap().value(), None);
    }

    #[test]
    fn adding_existing_value_is_idempotent() {
        let mut bus = DataBus::new();
        let a = bus.add_node("controls/elevator", NodeKind::Value).unwrap();
        let b = bus.add_node("/controls/elevator", NodeKind::Value).unwrap();
        assert_eq!(a, b);
        assert_eq!(bus.len(), 3);
    }

    #[test]
    fn wrong_kind_collision_fails() {
        let mut bus = DataBus::new();
        bus.add_node("controls/elevator", NodeKind::Value).unwrap();

        // Value where a group is needed
        assert!(bus.add_node("controls/elevator/trim", NodeKind::Value).is_err());
        // Group where a value exists
        assert!(bus.add_node("controls/elevator", NodeKind::Group).is_err());
        // Value where a group exists
        assert!(bus.add_node("controls", NodeKind::Value).is_err());
    }

    #[test]
    fn malformed_paths_rejected() {
        let mut bus = DataBus::new();
        assert!(bus.add_node("", NodeKind::Value).is_err());
        assert!(bus.add_node("a//b", NodeKind::Value).is_err());
        assert!(bus.add_node("a/b/", NodeKind::Value).is_err());
    }

    #[test]
    fn get_ref_on_group_or_missing_is_null_pointer() {
        let mut bus = DataBus::new();
        bus.add_node("output/flight/altitude", NodeKind::Value)
            .unwrap();

        assert!(matches!(
            bus.get_ref("output/flight"),
            Err(FdmError::NullPointer { .. })
        ));
        assert!(matches!(
            bus.get_ref("output/flight/airspeed"),
            Err(FdmError::NullPointer { .. })
        ));
        assert!(bus.get_ref("output/flight/altitude").is_ok());
    }

    #[test]
    fn shared_value_seen_by_all_refs() {
        let mut bus = DataBus::new();
        let writer = bus.add_value("controls/brake_l").unwrap();
        let reader = bus.get_ref("controls/brake_l").unwrap();

        bus.set(writer, 0.75);
        assert_eq!(bus.get(reader), 0.75);
        assert_eq!(bus.get_value("controls/brake_l").unwrap(), 0.75);
    }

    #[test]
    fn paths_and_reset() {
        let mut bus = DataBus::new();
        bus.add_value("b/y").unwrap();
        let r = bus.add_value("a/x").unwrap();
        bus.set(r, 3.0);

        assert_eq!(bus.value_paths(), vec!["a/x".to_string(), "b/y".to_string()]);
        assert_eq!(bus.path_of(r.id()), "a/x");

        let names: Vec<&str> = bus.get_node("a").unwrap().child_names().collect();
        assert_eq!(names, vec!["x"]);

        bus.reset_values();
        assert_eq!(bus.get(r), 0.0);
        assert_eq!(bus.value_paths().len(), 2);
    }
}
