//! Building, navigating and releasing node trees.
use smol_str::SmolStr;

use crate::arena::{ArenaError, NodeArena, NodeId};
use crate::node::{Node, NodeKind, NodeValue, Resolve, Text};
use crate::source::Source;
use crate::span::Span;
use crate::token::is_valid_name;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error(transparent)]
    Arena(#[from] ArenaError),
    #[error("stale node handle {0}")]
    Stale(NodeId),
    #[error("expected a {expected} node, found a {found} node")]
    KindMismatch { expected: NodeKind, found: NodeKind },
    #[error("`{0}` is not a valid name")]
    InvalidName(SmolStr),
    #[error("cannot attach {0} below itself")]
    Cycle(NodeId),
    #[error("text span {0} does not resolve")]
    Unresolved(Span),
    #[error("tree would nest deeper than {limit} levels")]
    TooDeep { limit: usize },
}

impl NodeArena {
    /// The node behind `id`, or [`TreeError::Stale`].
    #[inline]
    pub fn node(&self, id: NodeId) -> Result<&Node, TreeError> {
        self.get(id).ok_or(TreeError::Stale(id))
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, TreeError> {
        self.get_mut(id).ok_or(TreeError::Stale(id))
    }

    /// Creates a detached node of `kind` holding the kind's zero value.
    pub fn create(&mut self, kind: NodeKind, name: Option<&str>) -> Result<NodeId, TreeError> {
        let name = name.map(owned_name).transpose()?;
        Ok(self.allocate(Node::new(name, NodeValue::empty(kind)))?)
    }

    pub fn new_list(&mut self, name: Option<&str>) -> Result<NodeId, TreeError> {
        self.create(NodeKind::List, name)
    }

    pub fn new_long(&mut self, name: Option<&str>, value: i64) -> Result<NodeId, TreeError> {
        let id = self.create(NodeKind::Long, name)?;
        self[id].value = NodeValue::Long(value);
        Ok(id)
    }

    pub fn new_real(&mut self, name: Option<&str>, value: f64) -> Result<NodeId, TreeError> {
        let id = self.create(NodeKind::Real, name)?;
        self[id].value = NodeValue::Real(value);
        Ok(id)
    }

    pub fn new_text(&mut self, name: Option<&str>, value: &str) -> Result<NodeId, TreeError> {
        let id = self.create(NodeKind::Text, name)?;
        self[id].value = NodeValue::Text(Text::from(value));
        Ok(id)
    }

    /// Detaches `id` from its parent and releases it with all its descendants.
    pub fn delete(&mut self, id: NodeId) -> Result<(), TreeError> {
        self.detach(id)?;
        self.release_tree(id);
        Ok(())
    }

    /// Releases a detached subtree.
    pub(crate) fn release_tree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let Some(node) = self.release(id) else {
                continue;
            };
            let mut child = node.first_child;
            while let Some(current) = child {
                child = self[current].next;
                stack.push(current);
            }
        }
    }

    /// Unlinks `id` from its parent and siblings. The node keeps its children.
    pub fn detach(&mut self, id: NodeId) -> Result<(), TreeError> {
        let node = self.node_mut(id)?;
        let (parent, prev, next) = (node.parent.take(), node.prev.take(), node.next.take());
        let Some(parent) = parent else {
            return Ok(());
        };

        match prev {
            Some(prev) => self[prev].next = next,
            None => self[parent].first_child = next,
        }
        match next {
            Some(next) => self[next].prev = prev,
            None => self[parent].last_child = prev,
        }
        Ok(())
    }

    /// Moves `child` to the end of `parent`'s children.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        let found = self.node(parent)?.kind();
        if found != NodeKind::List {
            return Err(TreeError::KindMismatch {
                expected: NodeKind::List,
                found,
            });
        }
        self.node(child)?;
        if self.ancestors(parent).any(|ancestor| ancestor == child) {
            return Err(TreeError::Cycle(child));
        }
        let limit = self.config().max_depth;
        if self.depth(parent) + 1 + self.height(child) > limit {
            return Err(TreeError::TooDeep { limit });
        }

        self.detach(child)?;
        self.append(parent, child);
        Ok(())
    }

    /// Links a detached `child` as the last child of the list `parent`.
    pub(crate) fn append(&mut self, parent: NodeId, child: NodeId) {
        let last = self[parent].last_child;

        let node = &mut self[child];
        node.parent = Some(parent);
        node.prev = last;
        node.next = None;
        if let NodeValue::List { is_root } = &mut node.value {
            *is_root = false;
        }

        match last {
            Some(last) => self[last].next = Some(child),
            None => self[parent].first_child = Some(child),
        }
        self[parent].last_child = Some(child);
    }

    /// `id` followed by its parent, grandparent and so on.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.contains(id).then_some(id), |&id| self[id].parent)
    }

    /// Number of ancestors of `id`.
    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).count().saturating_sub(1)
    }

    /// Number of levels below `id`; zero for atoms and empty lists.
    pub fn height(&self, id: NodeId) -> usize {
        let mut height = 0;
        let mut stack = vec![(id, 0)];
        while let Some((id, level)) = stack.pop() {
            height = height.max(level);
            stack.extend(self.children(id).map(|child| (child, level + 1)));
        }
        height
    }

    /// Children of `id` in document order; empty for stale handles and atoms.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            arena: self,
            next: self.get(id).and_then(Node::first_child),
        }
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).count()
    }

    pub fn kind(&self, id: NodeId) -> Result<NodeKind, TreeError> {
        Ok(self.node(id)?.kind())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.first_child
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.last_child
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.next
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.prev
    }

    /// Renames a node. Names must read back as names, see [`is_valid_name`].
    pub fn set_name(&mut self, id: NodeId, name: Option<&str>) -> Result<(), TreeError> {
        let name = name.map(owned_name).transpose()?;
        self.node_mut(id)?.name = name;
        Ok(())
    }

    /// Sets the name of a node to a span of the source it was parsed from.
    pub(crate) fn set_name_span(&mut self, id: NodeId, span: Span) {
        self[id].name = Some(Text::Span(span));
    }

    pub fn long(&self, id: NodeId) -> Result<i64, TreeError> {
        let node = self.node(id)?;
        node.as_long().ok_or(mismatch(NodeKind::Long, node))
    }

    pub fn real(&self, id: NodeId) -> Result<f64, TreeError> {
        let node = self.node(id)?;
        node.as_real().ok_or(mismatch(NodeKind::Real, node))
    }

    pub fn text(&self, id: NodeId) -> Result<&Text, TreeError> {
        let node = self.node(id)?;
        node.as_text().ok_or(mismatch(NodeKind::Text, node))
    }

    pub fn set_long(&mut self, id: NodeId, value: i64) -> Result<(), TreeError> {
        match &mut self.node_mut(id)?.value {
            NodeValue::Long(slot) => *slot = value,
            other => return Err(kind_mismatch(NodeKind::Long, other.kind())),
        }
        Ok(())
    }

    pub fn set_real(&mut self, id: NodeId, value: f64) -> Result<(), TreeError> {
        match &mut self.node_mut(id)?.value {
            NodeValue::Real(slot) => *slot = value,
            other => return Err(kind_mismatch(NodeKind::Real, other.kind())),
        }
        Ok(())
    }

    pub fn set_text(&mut self, id: NodeId, value: &str) -> Result<(), TreeError> {
        match &mut self.node_mut(id)?.value {
            NodeValue::Text(slot) => *slot = Text::from(value),
            other => return Err(kind_mismatch(NodeKind::Text, other.kind())),
        }
        Ok(())
    }

    /// The node's name, resolved against `resolver`.
    pub fn name_str<'a, R: Resolve + ?Sized>(
        &'a self,
        id: NodeId,
        resolver: &'a R,
    ) -> Result<Option<&'a str>, TreeError> {
        match self.node(id)?.name() {
            Some(name) => resolve(resolver, name).map(Some),
            None => Ok(None),
        }
    }

    /// The value of a Text node, resolved against `resolver`.
    pub fn text_str<'a, R: Resolve + ?Sized>(
        &'a self,
        id: NodeId,
        resolver: &'a R,
    ) -> Result<&'a str, TreeError> {
        resolve(resolver, self.text(id)?)
    }

    /// Whether the node is named `name`.
    pub fn name_eq<R: Resolve + ?Sized>(&self, id: NodeId, resolver: &R, name: &str) -> bool {
        matches!(self.name_str(id, resolver), Ok(Some(found)) if found == name)
    }

    /// The first child of `parent` named `name`.
    pub fn find_child<R: Resolve + ?Sized>(
        &self,
        parent: NodeId,
        resolver: &R,
        name: &str,
    ) -> Option<NodeId> {
        self.children(parent)
            .find(|&child| self.name_eq(child, resolver, name))
    }

    /// Copies every span in the subtree of `id` out of `source`, so the tree no
    /// longer depends on it.
    pub fn materialize(&mut self, id: NodeId, source: &Source) -> Result<(), TreeError> {
        self.node(id)?;
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let node = &mut self[id];
            if let Some(name) = &mut node.name {
                own(name, source)?;
            }
            if let NodeValue::Text(text) = &mut node.value {
                own(text, source)?;
            }
            stack.extend(self.children(id));
        }
        Ok(())
    }
}

/// Iterator over the children of a node.
#[derive(Debug, Clone)]
pub struct Children<'a> {
    arena: &'a NodeArena,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.arena[current].next;
        Some(current)
    }
}

fn owned_name(name: &str) -> Result<Text, TreeError> {
    if !is_valid_name(name) {
        return Err(TreeError::InvalidName(name.into()));
    }
    Ok(Text::from(name))
}

fn own(text: &mut Text, source: &Source) -> Result<(), TreeError> {
    if let Text::Span(span) = *text {
        let owned = source.try_slice(span).ok_or(TreeError::Unresolved(span))?;
        *text = Text::from(owned);
    }
    Ok(())
}

pub(crate) fn resolve<'a, R: Resolve + ?Sized>(
    resolver: &'a R,
    text: &'a Text,
) -> Result<&'a str, TreeError> {
    match text {
        Text::Span(span) => resolver.resolve(text).ok_or(TreeError::Unresolved(*span)),
        Text::Owned(owned) => Ok(owned.as_str()),
    }
}

fn mismatch(expected: NodeKind, node: &Node) -> TreeError {
    kind_mismatch(expected, node.kind())
}

fn kind_mismatch(expected: NodeKind, found: NodeKind) -> TreeError {
    TreeError::KindMismatch { expected, found }
}
