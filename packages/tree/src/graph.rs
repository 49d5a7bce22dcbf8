/// Rooted out-tree storage
///
/// Every tree in ordtree (MTT, MOT, prototype) is an arborescence: one root,
/// every other node has exactly one parent, no cycles. Node data lives in a
/// map keyed by integer id, the edge into a node is stored with its child,
/// and children keep insertion order.
use crate::error::{TreeError, TreeResult};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq)]
pub struct Arborescence<N, E> {
    nodes: BTreeMap<NodeId, N>,

    /// child -> (parent, edge into child)
    parents: BTreeMap<NodeId, (NodeId, E)>,

    /// parent -> children in insertion order
    children: BTreeMap<NodeId, Vec<NodeId>>,

    root: Option<NodeId>,
    next_id: NodeId,
}

impl<N, E> Default for Arborescence<N, E> {
    fn default() -> Self {
        Self {
            nodes: BTreeMap::new(),
            parents: BTreeMap::new(),
            children: BTreeMap::new(),
            root: None,
            next_id: 0,
        }
    }
}

impl<N, E> Arborescence<N, E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tree holding a single root node with id 0
    pub fn with_root(data: N) -> Self {
        let mut tree = Self::new();
        tree.nodes.insert(0, data);
        tree.root = Some(0);
        tree.next_id = 1;
        tree
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn root_id(&self) -> TreeResult<NodeId> {
        self.root.ok_or_else(|| TreeError::malformed("tree has no root"))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Id the next inserted node will get
    pub fn next_id(&self) -> NodeId {
        self.next_id
    }

    pub fn node(&self, id: NodeId) -> TreeResult<&N> {
        self.nodes.get(&id).ok_or(TreeError::NodeNotFound(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> TreeResult<&mut N> {
        self.nodes.get_mut(&id).ok_or(TreeError::NodeNotFound(id))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents.get(&id).map(|(parent, _)| *parent)
    }

    /// Edge pointing into `child`
    pub fn edge(&self, child: NodeId) -> Option<&E> {
        self.parents.get(&child).map(|(_, edge)| edge)
    }

    pub fn edge_mut(&mut self, child: NodeId) -> Option<&mut E> {
        self.parents.get_mut(&child).map(|(_, edge)| edge)
    }

    /// Edge `parent -> child`, if that edge exists
    pub fn edge_between(&self, parent: NodeId, child: NodeId) -> Option<&E> {
        match self.parents.get(&child) {
            Some((p, edge)) if *p == parent => Some(edge),
            _ => None,
        }
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.children(id).is_empty()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &N)> {
        self.nodes.iter().map(|(id, data)| (*id, data))
    }

    /// `(parent, child, edge)` for every edge, ordered by child id
    pub fn links(&self) -> impl Iterator<Item = (NodeId, NodeId, &E)> {
        self.parents
            .iter()
            .map(|(child, (parent, edge))| (*parent, *child, edge))
    }

    pub fn add_child(&mut self, parent: NodeId, edge: E, data: N) -> TreeResult<NodeId> {
        if !self.contains(parent) {
            return Err(TreeError::NodeNotFound(parent));
        }
        let id = self.next_id;
        self.next_id += 1;
        self.nodes.insert(id, data);
        self.parents.insert(id, (parent, edge));
        self.children.entry(parent).or_default().push(id);
        Ok(id)
    }

    /// `id` followed by all of its descendants, depth first, children in order
    pub fn preorder(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        if !self.contains(id) {
            return order;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            order.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        order
    }

    /// Ids from the root down to `id`, both included
    pub fn ancestry(&self, id: NodeId) -> TreeResult<Vec<NodeId>> {
        if !self.contains(id) {
            return Err(TreeError::NodeNotFound(id));
        }
        let mut chain = vec![id];
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            if chain.len() > self.nodes.len() {
                return Err(TreeError::malformed(format!("cycle above node {}", id)));
            }
            chain.push(parent);
            current = parent;
        }
        chain.reverse();
        Ok(chain)
    }

    pub fn depth(&self, id: NodeId) -> TreeResult<usize> {
        Ok(self.ancestry(id)?.len() - 1)
    }

    pub fn leaves(&self) -> Vec<NodeId> {
        self.nodes.keys().copied().filter(|id| self.is_leaf(*id)).collect()
    }

    /// Leaf farthest from the root; the smallest id wins ties
    pub fn deepest_leaf(&self) -> Option<NodeId> {
        let root = self.root?;
        let mut best: Option<(usize, NodeId)> = None;
        let mut queue = VecDeque::from([(root, 0usize)]);
        while let Some((id, depth)) = queue.pop_front() {
            let children = self.children(id);
            if children.is_empty() {
                let better = match best {
                    None => true,
                    Some((d, best_id)) => depth > d || (depth == d && id < best_id),
                };
                if better {
                    best = Some((depth, id));
                }
            }
            queue.extend(children.iter().map(|c| (*c, depth + 1)));
        }
        best.map(|(_, id)| id)
    }

    /// Remove `id` and its descendants, returning the removed ids in preorder
    pub fn remove_subtree(&mut self, id: NodeId) -> TreeResult<Vec<NodeId>> {
        if !self.contains(id) {
            return Err(TreeError::NodeNotFound(id));
        }
        let removed = self.preorder(id);
        if let Some((parent, _)) = self.parents.get(&id) {
            let parent = *parent;
            if let Some(siblings) = self.children.get_mut(&parent) {
                siblings.retain(|c| *c != id);
            }
        }
        for node in &removed {
            self.nodes.remove(node);
            self.parents.remove(node);
            self.children.remove(node);
        }
        if self.root == Some(id) {
            self.root = None;
        }
        Ok(removed)
    }

    /// Detach every child of `id`, which must all be leaves, returning their
    /// edges and data in child order.
    pub fn take_leaf_children(&mut self, id: NodeId) -> TreeResult<Vec<(E, N)>> {
        let children = self.children.remove(&id).unwrap_or_default();
        if let Some(inner) = children.iter().find(|c| !self.is_leaf(**c)) {
            let inner = *inner;
            self.children.insert(id, children);
            return Err(TreeError::malformed(format!("node {} is not a leaf", inner)));
        }
        let mut taken = Vec::with_capacity(children.len());
        for child in children {
            let data = self.nodes.remove(&child).ok_or(TreeError::NodeNotFound(child))?;
            let (_, edge) = self.parents.remove(&child).ok_or(TreeError::NodeNotFound(child))?;
            taken.push((edge, data));
        }
        Ok(taken)
    }

    /// Build from explicit ids, checking the result is an arborescence.
    ///
    /// Children keep the order in which their links are given.
    pub fn from_parts(
        nodes: impl IntoIterator<Item = (NodeId, N)>,
        links: impl IntoIterator<Item = (NodeId, NodeId, E)>,
    ) -> TreeResult<Self> {
        let mut tree = Self::new();
        for (id, data) in nodes {
            if tree.nodes.insert(id, data).is_some() {
                return Err(TreeError::malformed(format!("duplicate node id {}", id)));
            }
        }
        for (parent, child, edge) in links {
            if !tree.contains(parent) || !tree.contains(child) {
                return Err(TreeError::malformed(format!(
                    "edge {} -> {} references a missing node",
                    parent, child
                )));
            }
            if tree.parents.insert(child, (parent, edge)).is_some() {
                return Err(TreeError::malformed(format!("node {} has more than one parent", child)));
            }
            tree.children.entry(parent).or_default().push(child);
        }

        let roots: Vec<NodeId> = tree.node_ids().filter(|id| !tree.parents.contains_key(id)).collect();
        match roots.as_slice() {
            [root] => tree.root = Some(*root),
            [] if tree.nodes.is_empty() => {}
            _ => {
                return Err(TreeError::malformed(format!(
                    "expected exactly one root, found {}",
                    roots.len()
                )))
            }
        }
        tree.next_id = tree.nodes.keys().next_back().map(|id| id + 1).unwrap_or(0);
        tree.validate()?;
        Ok(tree)
    }

    /// Single root, unique parents, everything reachable from the root
    pub fn validate(&self) -> TreeResult<()> {
        let Some(root) = self.root else {
            return if self.nodes.is_empty() {
                Ok(())
            } else {
                Err(TreeError::malformed("nodes without a root"))
            };
        };
        if self.parents.contains_key(&root) {
            return Err(TreeError::malformed("root has a parent"));
        }

        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::from([root]);
        while let Some(id) = queue.pop_front() {
            if !seen.insert(id) {
                return Err(TreeError::malformed(format!("node {} reached twice", id)));
            }
            queue.extend(self.children(id).iter().copied());
        }
        if seen.len() != self.nodes.len() {
            return Err(TreeError::malformed(format!(
                "{} of {} nodes unreachable from the root (cycle)",
                self.nodes.len() - seen.len(),
                self.nodes.len()
            )));
        }
        Ok(())
    }
}

impl<N: Clone, E: Clone> Arborescence<N, E> {
    /// Copy of the subtree rooted at `id`, keeping node ids
    pub fn extract(&self, id: NodeId) -> TreeResult<Self> {
        if !self.contains(id) {
            return Err(TreeError::NodeNotFound(id));
        }
        let mut sub = Self::new();
        for node in self.preorder(id) {
            sub.nodes.insert(node, self.nodes[&node].clone());
            if node != id {
                if let Some(entry) = self.parents.get(&node) {
                    sub.parents.insert(node, entry.clone());
                }
            }
            if let Some(children) = self.children.get(&node) {
                sub.children.insert(node, children.clone());
            }
        }
        sub.root = Some(id);
        sub.next_id = self.next_id;
        Ok(sub)
    }

    /// Put `other` in place of the leaf `target`.
    ///
    /// `other`'s root data replaces `target`'s data; its other nodes get fresh
    /// ids. Returns the mapping from `other`'s ids to ids in `self`.
    pub fn splice(&mut self, target: NodeId, other: &Self) -> TreeResult<BTreeMap<NodeId, NodeId>> {
        if !self.contains(target) {
            return Err(TreeError::NodeNotFound(target));
        }
        if !self.is_leaf(target) {
            return Err(TreeError::malformed(format!("splice target {} has children", target)));
        }
        let other_root = other.root_id()?;

        let mut mapping = BTreeMap::new();
        mapping.insert(other_root, target);
        *self.node_mut(target)? = other.node(other_root)?.clone();

        for node in other.preorder(other_root).into_iter().skip(1) {
            let (parent, edge) = other
                .parents
                .get(&node)
                .ok_or_else(|| TreeError::malformed(format!("node {} has no parent", node)))?;
            let new_parent = *mapping
                .get(parent)
                .ok_or_else(|| TreeError::malformed(format!("parent {} not yet placed", parent)))?;
            let new_id = self.add_child(new_parent, edge.clone(), other.node(node)?.clone())?;
            mapping.insert(node, new_id);
        }
        Ok(mapping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Arborescence<&'static str, &'static str> {
        // r -> a -> c
        //   -> b
        let mut tree = Arborescence::with_root("r");
        let a = tree.add_child(0, "ra", "a").unwrap();
        tree.add_child(0, "rb", "b").unwrap();
        tree.add_child(a, "ac", "c").unwrap();
        tree
    }

    #[test]
    fn test_preorder_and_depth() {
        let tree = sample();
        assert_eq!(tree.preorder(0), vec![0, 1, 3, 2]);
        assert_eq!(tree.depth(3).unwrap(), 2);
        assert_eq!(tree.ancestry(3).unwrap(), vec![0, 1, 3]);
        assert_eq!(tree.deepest_leaf(), Some(3));
        assert_eq!(tree.edge_between(1, 3), Some(&"ac"));
        assert_eq!(tree.edge_between(0, 3), None);
    }

    #[test]
    fn test_remove_subtree() {
        let mut tree = sample();
        assert_eq!(tree.remove_subtree(1).unwrap(), vec![1, 3]);
        assert_eq!(tree.children(0), &[2]);
        assert_eq!(tree.len(), 2);
        assert!(tree.validate().is_ok());
        assert_eq!(tree.remove_subtree(1), Err(TreeError::NodeNotFound(1)));
    }

    #[test]
    fn test_take_leaf_children_requires_leaves() {
        let mut tree = sample();
        assert!(tree.take_leaf_children(0).is_err());
        assert_eq!(tree.children(0), &[1, 2]);

        let taken = tree.take_leaf_children(1).unwrap();
        assert_eq!(taken, vec![("ac", "c")]);
        assert!(tree.is_leaf(1));
    }

    #[test]
    fn test_from_parts_rejects_non_arborescence() {
        let two_roots = Arborescence::from_parts(vec![(0, "a"), (1, "b")], Vec::<(usize, usize, ())>::new());
        assert!(matches!(two_roots, Err(TreeError::MalformedTree(_))));

        let two_parents = Arborescence::from_parts(
            vec![(0, "r"), (1, "a"), (2, "b")],
            vec![(0, 1, ()), (0, 2, ()), (1, 2, ())],
        );
        assert!(matches!(two_parents, Err(TreeError::MalformedTree(_))));

        let cycle = Arborescence::from_parts(
            vec![(0, "r"), (1, "a"), (2, "b")],
            vec![(1, 2, ()), (2, 1, ())],
        );
        assert!(matches!(cycle, Err(TreeError::MalformedTree(_))));
    }

    #[test]
    fn test_extract_and_splice() {
        let tree = sample();
        let sub = tree.extract(1).unwrap();
        assert_eq!(sub.root(), Some(1));
        assert_eq!(sub.len(), 2);

        let mut target = Arborescence::with_root("x");
        let leaf = target.add_child(0, "xy", "y").unwrap();
        let mapping = target.splice(leaf, &sub).unwrap();
        assert_eq!(mapping[&1], leaf);
        assert_eq!(target.node(leaf).unwrap(), &"a");
        let grafted = mapping[&3];
        assert_eq!(target.parent(grafted), Some(leaf));
        assert_eq!(target.edge(grafted), Some(&"ac"));

        assert!(target.splice(0, &sub).is_err());
    }
}
