//! Write node trees back out as text.
//!
//! Printers are provided with a context that is passed down to all print
//! functions. Node trees use it to carry the [`Resolve`] implementation that
//! turns their spans back into text, so a tree parsed from a [`Source`] prints
//! with `&source` and a tree that owns its text prints with `&Owned`.
//!
//! [`Source`]: crate::source::Source
//! [`Owned`]: crate::node::Owned
use std::io::{self, Write};

use smol_str::SmolStr;
use tracing::debug;

use crate::arena::{NodeArena, NodeId};
use crate::node::{NodeValue, Resolve, Text};
use crate::span::Span;
use crate::token::is_valid_name;

mod pretty;
mod simple;
pub use pretty::to_string_pretty;
pub use simple::to_string;

/// Line width used by [`save_to_text`] and [`save_to_stream`].
pub const DEFAULT_WIDTH: usize = 80;

/// Error while writing a tree.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("stale node handle {0}")]
    Stale(NodeId),
    #[error("text span {0} is not part of the given source")]
    MissingSource(Span),
    #[error("`{0}` cannot be written as a name")]
    InvalidName(SmolStr),
    #[error("text {0:?} contains a double quote")]
    InvalidText(SmolStr),
    #[error("{0} cannot be written as a real")]
    NonFinite(f64),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Trait for types that can print node trees.
///
/// The printer carries a context `C` that is passed down to all print functions.
pub trait Printer<C = ()>: Sized {
    type Error: From<SaveError>;

    /// Print the name at the head of a list.
    fn name(&mut self, name: &str) -> Result<(), Self::Error>;

    /// Print an integer.
    fn long(&mut self, value: i64) -> Result<(), Self::Error>;

    /// Print a real with six decimals.
    fn real(&mut self, value: f64) -> Result<(), Self::Error>;

    /// Print quoted text.
    fn text(&mut self, text: &str) -> Result<(), Self::Error>;

    /// Print a list given a function that prints the contents.
    fn list<F>(&mut self, f: F) -> Result<(), Self::Error>
    where
        F: FnOnce(&mut Self) -> Result<(), Self::Error>;

    /// Print an atom as itself, or as `(name atom)` when it is named.
    fn atom<F>(&mut self, name: Option<&str>, f: F) -> Result<(), Self::Error>
    where
        F: FnOnce(&mut Self) -> Result<(), Self::Error>,
    {
        match name {
            Some(name) => self.list(|printer| {
                printer.name(name)?;
                f(printer)
            }),
            None => f(self),
        }
    }

    /// Print a printable value.
    fn print(&mut self, value: impl Print<C>) -> Result<(), Self::Error> {
        value.print(self)
    }

    /// Reference to the context.
    fn context(&self) -> &C;
}

/// Trait for types that can be printed as a tree of forms.
///
/// Types that do not need a context should implement this for every `C`.
pub trait Print<C> {
    fn print<P: Printer<C>>(&self, printer: &mut P) -> Result<(), P::Error>;
}

impl<T: Print<C> + Sized, C> Print<C> for &T {
    #[inline]
    fn print<P: Printer<C>>(&self, printer: &mut P) -> Result<(), P::Error> {
        (*self).print(printer)
    }
}

impl<T: Print<C>, C> Print<C> for Vec<T> {
    #[inline]
    fn print<P: Printer<C>>(&self, printer: &mut P) -> Result<(), P::Error> {
        for item in self {
            printer.print(item)?;
        }
        Ok(())
    }
}

pub(crate) fn check_name(name: &str) -> Result<(), SaveError> {
    if !is_valid_name(name) {
        return Err(SaveError::InvalidName(name.into()));
    }
    Ok(())
}

pub(crate) fn check_text(text: &str) -> Result<(), SaveError> {
    if text.contains('"') {
        return Err(SaveError::InvalidText(text.into()));
    }
    Ok(())
}

pub(crate) fn check_real(value: f64) -> Result<(), SaveError> {
    if !value.is_finite() {
        return Err(SaveError::NonFinite(value));
    }
    Ok(())
}

/// A node of an arena, ready to be printed.
///
/// The printer's context resolves the node's spans.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    arena: &'a NodeArena,
    id: NodeId,
}

impl NodeArena {
    pub fn view(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { arena: self, id }
    }
}

impl<'a, 'r, R: Resolve + ?Sized> Print<&'r R> for NodeRef<'a> {
    fn print<P: Printer<&'r R>>(&self, printer: &mut P) -> Result<(), P::Error> {
        let resolver: &'r R = *printer.context();
        let node = self.arena.get(self.id).ok_or(SaveError::Stale(self.id))?;
        let name = node
            .name()
            .map(|name| resolve(resolver, name))
            .transpose()?;
        let children = self.arena.children(self.id).map(|id| self.arena.view(id));

        match node.value() {
            NodeValue::List { is_root: true } if name.is_none() => {
                for child in children {
                    printer.print(child)?;
                }
                Ok(())
            }
            NodeValue::List { .. } => printer.list(|printer| {
                if let Some(name) = name {
                    printer.name(name)?;
                }
                for child in children {
                    printer.print(child)?;
                }
                Ok(())
            }),
            NodeValue::Long(value) => printer.atom(name, |printer| printer.long(*value)),
            NodeValue::Real(value) => printer.atom(name, |printer| printer.real(*value)),
            NodeValue::Text(text) => {
                let text = resolve(resolver, text)?;
                printer.atom(name, |printer| printer.text(text))
            }
        }
    }
}

fn resolve<'a, R: Resolve + ?Sized>(resolver: &'a R, text: &'a Text) -> Result<&'a str, SaveError> {
    match text {
        Text::Span(span) => resolver
            .resolve(text)
            .ok_or(SaveError::MissingSource(*span)),
        Text::Owned(owned) => Ok(owned.as_str()),
    }
}

/// Writes the tree below `id` as pretty text, [`DEFAULT_WIDTH`] columns wide.
pub fn save_to_text<R: Resolve + ?Sized>(
    arena: &NodeArena,
    id: NodeId,
    resolver: &R,
) -> Result<String, SaveError> {
    to_string_pretty(arena.view(id), DEFAULT_WIDTH, resolver)
}

/// Writes the tree below `id` to `writer` and returns the number of bytes
/// written.
pub fn save_to_stream<R: Resolve + ?Sized, W: Write>(
    arena: &NodeArena,
    id: NodeId,
    resolver: &R,
    mut writer: W,
) -> Result<usize, SaveError> {
    let text = save_to_text(arena, id, resolver)?;
    writer.write_all(text.as_bytes())?;
    writer.flush()?;
    debug!(node = %id, bytes = text.len(), "saved tree");
    Ok(text.len())
}

#[cfg(test)]
mod test {
    use super::{save_to_stream, save_to_text, to_string, to_string_pretty, SaveError};
    use crate::arena::NodeArena;
    use crate::node::Owned;
    use crate::parser::parse_source;
    use crate::source::Source;
    use rstest::rstest;

    #[rstest]
    #[case("42", "42")]
    #[case("(name 42)", "(name 42)")]
    #[case("(a 1 2)", "(a 1 2)")]
    #[case("(x)", "(x)")]
    #[case("()", "()")]
    #[case("1 2 3", "1 2 3")]
    #[case("(pi 3.5)", "(pi 3.500000)")]
    #[case("-0.25", "-0.250000")]
    #[case("[point {x 1} (y \"far away\")]", "(point (x 1) (y \"far away\"))")]
    #[case("(a ; comment\n 1\n\n 2)", "(a 1 2)")]
    #[case("(outer (a 1 2) (3 4))", "(outer (a 1 2) (3 4))")]
    #[case("(-x 1)", "(-x 1)")]
    #[case("(é 2.5)", "(é 2.500000)")]
    #[case("(+ 1 2)", "(+ 1 2)")]
    #[case("(. \"dot\")", "(. \"dot\")")]
    fn compact(#[case] input: &str, #[case] expected: &str) {
        let source = Source::new(input).unwrap();
        let mut arena = NodeArena::new();
        let root = parse_source(&source, &mut arena).unwrap().unwrap();
        assert_eq!(expected, to_string(arena.view(root), &source).unwrap());
    }

    #[test]
    fn pretty_breaks_long_lists() {
        let source = Source::new("(config (name \"server\") (ports 8080 8081 8082))").unwrap();
        let mut arena = NodeArena::new();
        let root = parse_source(&source, &mut arena).unwrap().unwrap();

        let narrow = to_string_pretty(arena.view(root), 20, &source).unwrap();
        assert_eq!(
            "(config\n  (name \"server\")\n  (ports\n    8080\n    8081\n    8082))",
            narrow
        );

        let wide = save_to_text(&arena, root, &source).unwrap();
        assert_eq!("(config (name \"server\") (ports 8080 8081 8082))", wide);
    }

    #[test]
    fn pretty_separates_top_level_forms() {
        let source = Source::new("(a 1) (b 2)").unwrap();
        let mut arena = NodeArena::new();
        let root = parse_source(&source, &mut arena).unwrap().unwrap();
        assert_eq!("(a 1)\n\n(b 2)", save_to_text(&arena, root, &source).unwrap());
    }

    #[test]
    fn hand_built_tree() {
        let mut arena = NodeArena::new();
        let list = arena.new_list(Some("point")).unwrap();
        let x = arena.new_real(Some("x"), 1.5).unwrap();
        let label = arena.new_text(None, "origin").unwrap();
        arena.add_child(list, x).unwrap();
        arena.add_child(list, label).unwrap();

        assert_eq!(
            "(point (x 1.500000) \"origin\")",
            to_string(arena.view(list), &Owned).unwrap()
        );
    }

    #[test]
    fn spans_need_their_source() {
        let source = Source::new("(a \"text\" 1)").unwrap();
        let mut arena = NodeArena::new();
        let root = parse_source(&source, &mut arena).unwrap().unwrap();

        let error = to_string(arena.view(root), &Owned).unwrap_err();
        assert!(matches!(error, SaveError::MissingSource(_)));

        arena.materialize(root, &source).unwrap();
        assert_eq!(
            "(a \"text\" 1)",
            to_string(arena.view(root), &Owned).unwrap()
        );
    }

    #[test]
    fn unprintable_values() {
        let mut arena = NodeArena::new();
        let quote = arena.new_text(None, "say \"hi\"").unwrap();
        let nan = arena.new_real(None, f64::NAN).unwrap();
        let infinity = arena.new_real(Some("big"), f64::INFINITY).unwrap();

        assert!(matches!(
            to_string(arena.view(quote), &Owned),
            Err(SaveError::InvalidText(_))
        ));
        assert!(matches!(
            to_string(arena.view(nan), &Owned),
            Err(SaveError::NonFinite(_))
        ));
        assert!(matches!(
            save_to_text(&arena, infinity, &Owned),
            Err(SaveError::NonFinite(_))
        ));

        arena.delete(quote).unwrap();
        assert!(matches!(
            to_string(arena.view(quote), &Owned),
            Err(SaveError::Stale(_))
        ));
    }

    #[test]
    fn stream_reports_bytes_written() {
        let source = Source::new("(greeting \"hello\")").unwrap();
        let mut arena = NodeArena::new();
        let root = parse_source(&source, &mut arena).unwrap().unwrap();

        let mut buffer = Vec::new();
        let written = save_to_stream(&arena, root, &source, &mut buffer).unwrap();
        assert_eq!(buffer.len(), written);
        assert_eq!(b"(greeting \"hello\")".as_slice(), buffer.as_slice());
    }
}
