use std::io::Cursor;

use atom::lexer::{ErrorCode, Lexer};
use atom::parser::{parse, parse_source, ParseError};
use atom::source::{Origin, Source};
use atom::util::Value;
use atom::{save_to_stream, save_to_text, NodeArena, NodeKind, Owned};

const CONFIG: &str = "\
; service configuration
(service
  (name \"gateway\")
  (port 8080)
  (ratio 0.75)
  [upstreams
    {upstream (host \"10.0.0.1\") (weight 3)}
    {upstream (host \"10.0.0.2\") (weight 1)}])
(debug 0)
";

#[test]
fn load_edit_and_save_through_streams() {
    let mut input = Cursor::new(CONFIG.as_bytes().to_vec());
    let source = Source::load(Origin::Stream(&mut input)).unwrap();
    let mut arena = NodeArena::new();
    let root = parse_source(&source, &mut arena).unwrap().unwrap();
    assert!(arena[root].is_root());

    let service = arena.find_child(root, &source, "service").unwrap();
    let port = arena.find_child(service, &source, "port").unwrap();
    arena.set_long(port, 9090).unwrap();

    let upstreams = arena.find_child(service, &source, "upstreams").unwrap();
    assert_eq!(2, arena.child_count(upstreams));
    let upstream = Value::list([
        Value::text("10.0.0.3").named("host"),
        Value::long(2).named("weight"),
    ])
    .named("upstream");
    let extra = arena.build(&upstream).unwrap();
    arena.add_child(upstreams, extra).unwrap();

    let mut output = Vec::new();
    let written = save_to_stream(&arena, root, &source, &mut output).unwrap();
    assert_eq!(output.len(), written);

    let mut reloaded = Cursor::new(output);
    let source = Source::open("stream", Origin::Stream(&mut reloaded)).unwrap();
    let mut arena = NodeArena::new();
    let root = parse_source(&source, &mut arena).unwrap().unwrap();

    let service = arena.find_child(root, &source, "service").unwrap();
    let port = arena.find_child(service, &source, "port").unwrap();
    assert_eq!(Ok(9090), arena.long(port));

    let upstreams = arena.find_child(service, &source, "upstreams").unwrap();
    let hosts: Vec<_> = arena
        .children(upstreams)
        .map(|upstream| {
            let host = arena.find_child(upstream, &source, "host").unwrap();
            arena.text_str(host, &source).unwrap().to_string()
        })
        .collect();
    assert_eq!(vec!["10.0.0.1", "10.0.0.2", "10.0.0.3"], hosts);

    let ratio = arena.find_child(service, &source, "ratio").unwrap();
    assert_eq!(Ok(NodeKind::Real), arena.kind(ratio));
    assert_eq!(Ok(0.75), arena.real(ratio));
}

#[test]
fn saved_text_reads_back_as_the_same_tree() {
    let source = Source::new(CONFIG).unwrap();
    let mut arena = NodeArena::new();
    let root = parse_source(&source, &mut arena).unwrap().unwrap();
    let before = arena.to_value(root, &source).unwrap();

    let text = save_to_text(&arena, root, &source).unwrap();
    let mut again = NodeArena::new();
    let root = atom::from_str(&text, &mut again).unwrap().unwrap();
    assert_eq!(before, again.to_value(root, &Owned).unwrap());
}

#[test]
fn detached_trees_outlive_their_source() {
    let mut arena = NodeArena::new();
    let root = {
        let source = Source::new("(user (name \"ada\") (id 7))").unwrap();
        let root = parse_source(&source, &mut arena).unwrap().unwrap();
        arena.materialize(root, &source).unwrap();
        root
    };

    let name = arena.find_child(root, &Owned, "name").unwrap();
    assert_eq!(Ok("ada"), arena.text_str(name, &Owned));
    assert_eq!(
        "(user (name \"ada\") (id 7))",
        save_to_text(&arena, root, &Owned).unwrap()
    );
}

#[test]
fn failed_parse_keeps_the_arena_usable() {
    let mut arena = NodeArena::new();
    let good = Source::new("(a 1 2)").unwrap();
    let kept = parse_source(&good, &mut arena).unwrap().unwrap();
    let live = arena.len();

    let bad = Source::new("(b 1 (c 2 3) \"open").unwrap();
    let mut lexer = Lexer::new(&bad);
    let error = parse(&mut lexer, &mut arena).unwrap_err();
    assert!(matches!(error, ParseError::Syntax(_)));
    assert_eq!(Some(ErrorCode::Unterminated), error.code());
    assert_eq!(Some(13), lexer.last_error().map(|error| error.cursor));

    assert_eq!(live, arena.len());
    assert_eq!(2, arena.child_count(kept));
}

#[test]
fn release_all_starts_over() {
    let source = Source::new("(a 1 2) (b 3 4)").unwrap();
    let mut arena = NodeArena::new();
    let first = parse_source(&source, &mut arena).unwrap().unwrap();

    arena.release_all();
    assert!(arena.is_empty());
    assert!(!arena.contains(first));

    let second = parse_source(&source, &mut arena).unwrap().unwrap();
    assert!(arena.contains(second));
    assert!(!arena.contains(first));
    assert_eq!(7, arena.len());
}
