//! Tree nodes and the text they carry.
use std::fmt;

use smol_str::SmolStr;

use crate::arena::NodeId;
use crate::source::Source;
use crate::span::Span;

/// A name or text payload.
///
/// Parsed nodes refer back into their [`Source`] with a [`Span`]; nodes built by
/// hand, or materialized from a parse, own their text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Text {
    Span(Span),
    Owned(SmolStr),
}

impl From<Span> for Text {
    fn from(span: Span) -> Self {
        Text::Span(span)
    }
}

impl From<SmolStr> for Text {
    fn from(text: SmolStr) -> Self {
        Text::Owned(text)
    }
}

impl From<&str> for Text {
    fn from(text: &str) -> Self {
        Text::Owned(text.into())
    }
}

impl From<String> for Text {
    fn from(text: String) -> Self {
        Text::Owned(text.into())
    }
}

/// Turns [`Text`] payloads into string slices.
///
/// A [`Source`] resolves spans by slicing itself; [`Owned`] only resolves text
/// that is already materialized.
pub trait Resolve {
    fn resolve<'a>(&'a self, text: &'a Text) -> Option<&'a str>;
}

impl Resolve for Source {
    fn resolve<'a>(&'a self, text: &'a Text) -> Option<&'a str> {
        match text {
            Text::Span(span) => self.try_slice(*span),
            Text::Owned(text) => Some(text.as_str()),
        }
    }
}

/// Resolver for trees that do not refer to any source.
#[derive(Debug, Clone, Copy, Default)]
pub struct Owned;

impl Resolve for Owned {
    fn resolve<'a>(&'a self, text: &'a Text) -> Option<&'a str> {
        match text {
            Text::Span(_) => None,
            Text::Owned(text) => Some(text.as_str()),
        }
    }
}

impl<R: Resolve + ?Sized> Resolve for &R {
    #[inline]
    fn resolve<'a>(&'a self, text: &'a Text) -> Option<&'a str> {
        (**self).resolve(text)
    }
}

/// Kind of a node, without its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    List,
    Long,
    Real,
    Text,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NodeKind::List => "LIST",
            NodeKind::Long => "LONG",
            NodeKind::Real => "REAL",
            NodeKind::Text => "TEXT",
        })
    }
}

/// Value of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue {
    /// A list. Its children are linked through the node itself.
    ///
    /// `is_root` marks a list the parser synthesized to hold several top-level
    /// forms; lists written in brackets are never root.
    List { is_root: bool },
    Long(i64),
    Real(f64),
    Text(Text),
}

impl NodeValue {
    /// The zero value of a kind.
    pub fn empty(kind: NodeKind) -> Self {
        match kind {
            NodeKind::List => NodeValue::List { is_root: false },
            NodeKind::Long => NodeValue::Long(0),
            NodeKind::Real => NodeValue::Real(0.0),
            NodeKind::Text => NodeValue::Text(Text::Owned(SmolStr::default())),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            NodeValue::List { .. } => NodeKind::List,
            NodeValue::Long(_) => NodeKind::Long,
            NodeValue::Real(_) => NodeKind::Real,
            NodeValue::Text(_) => NodeKind::Text,
        }
    }
}

/// A node stored in a [`NodeArena`].
///
/// `parent` and `prev` are navigation links only; a node owns its children.
///
/// [`NodeArena`]: crate::arena::NodeArena
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) name: Option<Text>,
    pub(crate) value: NodeValue,
    pub(crate) parent: Option<NodeId>,
    pub(crate) prev: Option<NodeId>,
    pub(crate) next: Option<NodeId>,
    pub(crate) first_child: Option<NodeId>,
    pub(crate) last_child: Option<NodeId>,
}

impl Node {
    /// A detached node.
    pub fn new(name: Option<Text>, value: NodeValue) -> Self {
        Self {
            name,
            value,
            parent: None,
            prev: None,
            next: None,
            first_child: None,
            last_child: None,
        }
    }

    #[inline]
    pub fn kind(&self) -> NodeKind {
        self.value.kind()
    }

    #[inline]
    pub fn name(&self) -> Option<&Text> {
        self.name.as_ref()
    }

    #[inline]
    pub fn value(&self) -> &NodeValue {
        &self.value
    }

    #[inline]
    pub fn is_list(&self) -> bool {
        matches!(self.value, NodeValue::List { .. })
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        matches!(self.value, NodeValue::List { is_root: true })
    }

    pub fn as_long(&self) -> Option<i64> {
        match self.value {
            NodeValue::Long(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self.value {
            NodeValue::Real(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match &self.value {
            NodeValue::Text(text) => Some(text),
            _ => None,
        }
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[inline]
    pub fn first_child(&self) -> Option<NodeId> {
        self.first_child
    }

    #[inline]
    pub fn last_child(&self) -> Option<NodeId> {
        self.last_child
    }

    #[inline]
    pub fn next_sibling(&self) -> Option<NodeId> {
        self.next
    }

    #[inline]
    pub fn prev_sibling(&self) -> Option<NodeId> {
        self.prev
    }

    #[inline]
    pub fn has_children(&self) -> bool {
        self.first_child.is_some()
    }
}

#[cfg(test)]
mod test {
    use super::{NodeKind, NodeValue, Owned, Resolve, Text};
    use crate::source::Source;
    use crate::span::Span;
    use rstest::rstest;

    #[rstest]
    #[case(NodeKind::List)]
    #[case(NodeKind::Long)]
    #[case(NodeKind::Real)]
    #[case(NodeKind::Text)]
    fn empty_value_has_its_kind(#[case] kind: NodeKind) {
        assert_eq!(kind, NodeValue::empty(kind).kind());
    }

    #[test]
    fn owned_resolver_rejects_spans() {
        let owned = Text::from("abc");
        let span = Text::from(Span::new(0, 1));
        assert_eq!(Some("abc"), Owned.resolve(&owned));
        assert_eq!(None, Owned.resolve(&span));
    }

    #[test]
    fn source_resolves_both() {
        let source = Source::new("hello world").unwrap();
        assert_eq!(Some("world"), source.resolve(&Text::from(Span::new(6, 11))));
        assert_eq!(Some("x"), source.resolve(&Text::from("x")));
        assert_eq!(None, source.resolve(&Text::from(Span::new(6, 40))));
    }
}
