//! A small tree-structured data format built on s-expressions.
//!
//! # Syntax
//!
//! - **Lists** are sequences of forms delimited by `(` and `)`, `[` and `]`
//!   or `{` and `}`, and separated by whitespace. A list may start with a bare
//!   name, which names the list: `(point 1 2)`. Names are not allowed anywhere
//!   else.
//!
//! - **Atoms** are integers (`42`, `-7`), reals (`2.5`, `.5`, `3.`) and text
//!   enclosed in double quotes (`"hello"`). Text has no escapes; it extends to
//!   the next `"`. Bare tokens that are neither integers nor reals are names.
//!
//! - **Comments** begin with a `;` and extend to the end of the line.
//!
//! A list with exactly one item is the item itself, so `(port 8080)` reads as
//! the integer `8080` named `port`. Several forms at the top level are
//! collected under a root list that prints without brackets.
//!
//! # Trees
//!
//! Parsed nodes live in a [`NodeArena`] and are addressed with [`NodeId`]
//! handles. Names and text of parsed nodes point back into their [`Source`];
//! [`NodeArena::materialize`] copies them out so the tree stands on its own.
//!
//! ```
//! use atom::{NodeArena, Source, parser::parse_source, to_string};
//!
//! let source = Source::new("(server (host \"localhost\") (port 8080))").unwrap();
//! let mut arena = NodeArena::new();
//! let root = parse_source(&source, &mut arena).unwrap().unwrap();
//!
//! let port = arena.find_child(root, &source, "port").unwrap();
//! assert_eq!(Ok(8080), arena.long(port));
//! arena.set_long(port, 8443).unwrap();
//!
//! let text = to_string(arena.view(root), &source).unwrap();
//! assert_eq!("(server (host \"localhost\") (port 8443))", text);
//! ```
pub mod arena;
pub mod lexer;
pub mod node;
pub mod parser;
pub mod printer;
pub mod source;
pub mod span;
pub(crate) mod token;
pub mod tree;
pub mod util;

pub use arena::{ArenaConfig, NodeArena, NodeId};
pub use node::{NodeKind, Owned, Resolve};
pub use printer::{save_to_stream, save_to_text, to_string, to_string_pretty};
pub use source::Source;
pub use token::is_valid_name;

use parser::ParseError;
use source::LoadError;
use tree::TreeError;

/// Any failure of [`from_str`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Parses `input` into a tree that owns all of its text.
pub fn from_str(input: &str, arena: &mut NodeArena) -> Result<Option<NodeId>, Error> {
    let source = Source::new(input)?;
    let Some(root) = parser::parse_source(&source, arena)? else {
        return Ok(None);
    };
    if let Err(error) = arena.materialize(root, &source) {
        arena.release_tree(root);
        return Err(error.into());
    }
    Ok(Some(root))
}
