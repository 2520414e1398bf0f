//! Read node trees from source text.
//!
//! The reader is a recursive descent over three productions: a form is either
//! an atom or a bracketed list, and a list is a sequence of forms. Bare names
//! are only meaningful as the first item of a list, where they name the list;
//! the reader carries them as a transient name item until the enclosing
//! list claims them, so they never reach the arena.
use crate::arena::{ArenaError, NodeArena, NodeId};
use crate::lexer::{is_punct, is_space, ErrorCode, LexError, Lexer};
use crate::node::{Node, NodeValue, Text};
use crate::source::Source;
use crate::span::Span;
use crate::token::{classify, Classified};

/// A parse error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Syntax(#[from] LexError),
    #[error(transparent)]
    Arena(#[from] ArenaError),
    #[error("lists nest deeper than {limit} levels at offset {cursor}")]
    TooDeep { limit: usize, cursor: usize },
}

impl ParseError {
    /// The format's error code, for syntax errors.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            ParseError::Syntax(error) => Some(error.code),
            ParseError::Arena(_) | ParseError::TooDeep { .. } => None,
        }
    }
}

/// Shorthand for a result specialised to parse errors.
pub type Result<T, E = ParseError> = std::result::Result<T, E>;

/// One form as read, before the enclosing list decides what it means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Item {
    Name(Span),
    Node(NodeId),
}

/// Parses every form of the lexer's source.
///
/// Returns `None` for input without forms, the form itself when there is one,
/// and a synthetic root list holding all of them otherwise. On error nothing
/// read so far is kept: every node allocated by this call is released.
pub fn parse(lexer: &mut Lexer<'_>, arena: &mut NodeArena) -> Result<Option<NodeId>> {
    let mut forms = Vec::new();
    if let Err(error) = read_forms(lexer, arena, &mut forms) {
        discard(arena, &forms);
        return Err(error);
    }

    match forms.as_slice() {
        [] => Ok(None),
        [form] => Ok(Some(*form)),
        _ => match finish_list(arena, None, &forms, true) {
            Ok(root) => Ok(Some(root)),
            Err(error) => {
                discard(arena, &forms);
                Err(error.into())
            }
        },
    }
}

/// Parses a whole source with a fresh lexer.
pub fn parse_source(source: &Source, arena: &mut NodeArena) -> Result<Option<NodeId>> {
    parse(&mut Lexer::new(source), arena)
}

fn read_forms(lexer: &mut Lexer<'_>, arena: &mut NodeArena, forms: &mut Vec<NodeId>) -> Result<()> {
    loop {
        match read(lexer, arena, 0)? {
            None => return Ok(()),
            Some(Item::Node(id)) => forms.push(id),
            Some(Item::Name(span)) => {
                return Err(lexer.error_at(ErrorCode::Unexpected, span.start as usize).into())
            }
        }
    }
}

/// Reads one form, skipping whitespace and comments before it.
///
/// Returns `None` at the end of input. `depth` counts the enclosing lists.
fn read(lexer: &mut Lexer<'_>, arena: &mut NodeArena, depth: usize) -> Result<Option<Item>> {
    loop {
        lexer.skip_space();
        match lexer.peek() {
            None => return Ok(None),
            Some(b';') => lexer.skip_comment(),
            Some(b'(' | b'[' | b'{') => {
                return read_list(lexer, arena, depth).map(|id| Some(Item::Node(id)))
            }
            Some(b')' | b']' | b'}' | b'\'' | b',') => {
                return Err(lexer.error(ErrorCode::Unexpected).into())
            }
            Some(_) => return read_atom(lexer, arena).map(Some),
        }
    }
}

/// Reads quoted text or a bare token.
fn read_atom(lexer: &mut Lexer<'_>, arena: &mut NodeArena) -> Result<Item> {
    let start = lexer.cursor();

    if lexer.peek() == Some(b'"') {
        let mut byte = lexer.advance();
        while byte.is_some_and(|byte| byte != b'"') {
            byte = lexer.advance();
        }
        if byte.is_none() {
            return Err(lexer.error_at(ErrorCode::Unterminated, start).into());
        }

        let span = Span::new(start as u32 + 1, lexer.cursor() as u32);
        lexer.advance();
        let text = Node::new(None, NodeValue::Text(Text::Span(span)));
        return Ok(Item::Node(arena.allocate(text)?));
    }

    while lexer.peek().is_some_and(|byte| !is_space(byte) && !is_punct(byte)) {
        lexer.advance();
    }

    let span = lexer.span_from(start);
    let value = match classify(lexer.source().slice(span)) {
        Some(Classified::Long(value)) => NodeValue::Long(value),
        Some(Classified::Real(value)) => NodeValue::Real(value),
        Some(Classified::Name) | None => return Ok(Item::Name(span)),
    };
    Ok(Item::Node(arena.allocate(Node::new(None, value))?))
}

/// Reads a bracketed list and finalizes it.
///
/// Children of the list may end up below a root list as well, so they must fit
/// in the arena's depth limit with one level to spare.
fn read_list(lexer: &mut Lexer<'_>, arena: &mut NodeArena, depth: usize) -> Result<NodeId> {
    let open = lexer.cursor();
    let limit = arena.config().max_depth;
    if depth + 1 >= limit {
        return Err(ParseError::TooDeep { limit, cursor: open });
    }
    let close = match lexer.peek() {
        Some(b'(') => b')',
        Some(b'[') => b']',
        Some(b'{') => b'}',
        _ => return Err(lexer.error(ErrorCode::Unexpected).into()),
    };
    lexer.advance();

    let mut name = None;
    let mut children = Vec::new();
    let items = read_items(lexer, arena, depth, (open, close), &mut name, &mut children);
    let list = items.and_then(|()| match children.as_slice() {
        [child] => {
            if let Some(name) = name {
                arena.set_name_span(*child, name);
            }
            Ok(*child)
        }
        _ => Ok(finish_list(arena, name.map(Text::Span), &children, false)?),
    });

    if list.is_err() {
        discard(arena, &children);
    }
    list
}

fn read_items(
    lexer: &mut Lexer<'_>,
    arena: &mut NodeArena,
    depth: usize,
    (open, close): (usize, u8),
    name: &mut Option<Span>,
    children: &mut Vec<NodeId>,
) -> Result<()> {
    let mut head = true;
    loop {
        lexer.skip_space();
        match lexer.peek() {
            None => return Err(lexer.error_at(ErrorCode::Unbalanced, open).into()),
            Some(b';') => {
                lexer.skip_comment();
                continue;
            }
            Some(byte) if byte == close => {
                lexer.advance();
                return Ok(());
            }
            Some(_) => {}
        }

        match read(lexer, arena, depth + 1)? {
            None => return Err(lexer.error_at(ErrorCode::Unbalanced, open).into()),
            Some(Item::Name(span)) if head => *name = Some(span),
            Some(Item::Name(span)) => {
                return Err(lexer.error_at(ErrorCode::Unexpected, span.start as usize).into())
            }
            Some(Item::Node(id)) => children.push(id),
        }
        head = false;
    }
}

/// Allocates a list and links `children` into it.
fn finish_list(
    arena: &mut NodeArena,
    name: Option<Text>,
    children: &[NodeId],
    is_root: bool,
) -> Result<NodeId, ArenaError> {
    let list = arena.allocate(Node::new(name, NodeValue::List { is_root }))?;
    for &child in children {
        arena.append(list, child);
    }
    Ok(list)
}

fn discard(arena: &mut NodeArena, nodes: &[NodeId]) {
    for &node in nodes {
        arena.release_tree(node);
    }
}
