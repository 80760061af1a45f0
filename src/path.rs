//! Naming hierarchy for settings.
//!
//! Every setting is identified by a leaf [`Path`] hanging off a tree of
//! intermediate [`NodePath`]s. Children keep their parent alive; parents only
//! hold weak references to attached children, so a tree is dropped once no
//! leaf refers to it anymore.
//!
//! A node can be created *detached* (it knows its parent, but the parent cannot
//! find it) or *attached* (registered under its parent's name table). Attaching
//! a second child of the same kind under an existing name is a programming
//! error and panics. The tree remembers every attached path for as long as it
//! lives, whether or not the first handle is still around.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::{Rc, Weak};

const SEPARATOR: &str = "->";

struct Node {
    name: String,
    parent: Option<NodePath>,
    children: RefCell<BTreeMap<String, Child>>,
    registered: Rc<Registered>,
}

/// Elements of every node and leaf ever attached in one tree.
#[derive(Default)]
struct Registered {
    nodes: RefCell<BTreeSet<Vec<String>>>,
    leaves: RefCell<BTreeSet<Vec<String>>>,
}

struct Leaf {
    name: String,
    parent: NodePath,
}

#[derive(Default)]
struct Child {
    node: Option<Weak<Node>>,
    leaf: Option<Weak<Leaf>>,
}

/// An intermediate grouping in the naming hierarchy.
#[derive(Clone)]
pub struct NodePath(Rc<Node>);

/// The identity of a single setting.
#[derive(Clone)]
pub struct Path(Rc<Leaf>);

impl NodePath {
    /// Create a root node. An empty name makes an anonymous root, which never
    /// shows up in [`elements`](Self::elements).
    pub fn root(name: impl Into<String>) -> Self {
        NodePath(Rc::new(Node {
            name: name.into(),
            parent: None,
            children: RefCell::new(BTreeMap::new()),
            registered: Rc::default(),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn parent(&self) -> Option<&NodePath> {
        self.0.parent.as_ref()
    }

    pub fn elements(&self) -> Vec<String> {
        let mut elements = Vec::new();
        let mut current = Some(self);
        while let Some(node) = current {
            if node.0.parent.is_some() || !node.0.name.is_empty() {
                elements.push(node.0.name.clone());
            }
            current = node.0.parent.as_ref();
        }
        elements.reverse();
        elements
    }

    /// A child node that knows this node as its parent but is not findable
    /// from it.
    pub fn detached_node(&self, name: impl Into<String>) -> NodePath {
        NodePath(Rc::new(Node {
            name: name.into(),
            parent: Some(self.clone()),
            children: RefCell::new(BTreeMap::new()),
            registered: Rc::clone(&self.0.registered),
        }))
    }

    /// A leaf that knows this node as its parent but is not findable from it.
    pub fn detached_leaf(&self, name: impl Into<String>) -> Path {
        Path(Rc::new(Leaf {
            name: name.into(),
            parent: self.clone(),
        }))
    }

    /// Register `node` as a child of this node.
    ///
    /// A node detached from another parent is re-created under this one.
    ///
    /// # Panics
    ///
    /// Panics if a node with the same name was ever attached here.
    pub fn add_node(&self, node: NodePath) -> NodePath {
        let node = if node.parent().is_some_and(|p| Rc::ptr_eq(&p.0, &self.0)) {
            node
        } else {
            self.detached_node(node.name())
        };
        if !self.0.registered.nodes.borrow_mut().insert(node.elements()) {
            panic!("node path {node} already exists");
        }
        self.attach_node(&node);
        node
    }

    fn attach_node(&self, node: &NodePath) {
        let mut children = self.0.children.borrow_mut();
        let child = children.entry(node.name().to_string()).or_default();
        child.node = Some(Rc::downgrade(&node.0));
    }

    /// Register `leaf` as a child of this node.
    ///
    /// # Panics
    ///
    /// Panics if a leaf with the same name was ever attached here.
    pub fn add_leaf(&self, leaf: Path) -> Path {
        let leaf = if Rc::ptr_eq(&leaf.0.parent.0, &self.0) {
            leaf
        } else {
            self.detached_leaf(leaf.name())
        };
        if !self.0.registered.leaves.borrow_mut().insert(leaf.elements()) {
            panic!("path {leaf} already exists");
        }
        let mut children = self.0.children.borrow_mut();
        let child = children.entry(leaf.name().to_string()).or_default();
        child.leaf = Some(Rc::downgrade(&leaf.0));
        leaf
    }

    /// Find the attached child node `name`, attaching a new one if absent.
    ///
    /// A node whose handles were all dropped is attached again under its
    /// existing registration; leaves registered beneath it stay registered.
    pub fn node(&self, name: &str) -> NodePath {
        if let Some(node) = self.find_node(&[name]) {
            return node;
        }
        let node = self.detached_node(name);
        self.0.registered.nodes.borrow_mut().insert(node.elements());
        self.attach_node(&node);
        node
    }

    /// Attach a new leaf `name`.
    ///
    /// # Panics
    ///
    /// Panics if the leaf already exists.
    pub fn leaf(&self, name: &str) -> Path {
        self.add_leaf(self.detached_leaf(name))
    }

    /// Look up an attached node by the names leading to it.
    pub fn find_node(&self, names: &[&str]) -> Option<NodePath> {
        let mut current = self.clone();
        for name in names {
            current = current.child(name)?.node?;
        }
        Some(current)
    }

    /// Look up an attached leaf by the names leading to it.
    pub fn find_leaf(&self, names: &[&str]) -> Option<Path> {
        let (last, nodes) = names.split_last()?;
        self.find_node(nodes)?.child(last)?.leaf
    }

    fn child(&self, name: &str) -> Option<Found> {
        let children = self.0.children.borrow();
        let child = children.get(name)?;
        Some(Found {
            node: child.node.as_ref().and_then(Weak::upgrade).map(NodePath),
            leaf: child.leaf.as_ref().and_then(Weak::upgrade).map(Path),
        })
    }
}

struct Found {
    node: Option<NodePath>,
    leaf: Option<Path>,
}

impl Path {
    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn parent(&self) -> &NodePath {
        &self.0.parent
    }

    /// Names from the root (excluding an anonymous root) down to this leaf.
    pub fn elements(&self) -> Vec<String> {
        let mut elements = self.0.parent.elements();
        elements.push(self.0.name.clone());
        elements
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.elements().join(SEPARATOR))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.elements().join(SEPARATOR))
    }
}

impl fmt::Debug for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodePath({self})")
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({self})")
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Path {}

impl PartialOrd for Path {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Path {
    fn cmp(&self, other: &Self) -> Ordering {
        self.elements().cmp(&other.elements())
    }
}
