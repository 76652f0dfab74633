//! A tiny s-expression notation for test trees.
//!
//! `(kind child...)` is an inner node, `kind` or `kind:value` a leaf, and
//! `(kind:value child...)` an inner node with a value:
//!
//! ```text
//! (module (func:main (param:argc) (block ret:0)))
//! ```

#![allow(dead_code)]

use gumnut::LabeledTree;
use gumnut::indextree::NodeId;

#[derive(Debug, PartialEq)]
enum Token<'a> {
    Open,
    Close,
    Atom(&'a str),
}

fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (i, c) in input.char_indices() {
        if c == '(' || c == ')' || c.is_whitespace() {
            if let Some(s) = start.take() {
                tokens.push(Token::Atom(&input[s..i]));
            }
            match c {
                '(' => tokens.push(Token::Open),
                ')' => tokens.push(Token::Close),
                _ => {}
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        tokens.push(Token::Atom(&input[s..]));
    }
    tokens
}

fn split_atom(atom: &str) -> (String, String) {
    match atom.split_once(':') {
        Some((kind, value)) => (kind.to_string(), value.to_string()),
        None => (atom.to_string(), String::new()),
    }
}

/// Parse one tree.
///
/// # Panics
///
/// Panics on malformed input.
pub fn parse(input: &str) -> LabeledTree<String> {
    let tokens = tokenize(input);
    let mut pos = 0;

    let (kind, value, is_open) = head(&tokens, &mut pos);
    let mut tree = LabeledTree::new(kind, value);
    if is_open {
        let root = tree.root;
        children(&tokens, &mut pos, &mut tree, root);
    }
    assert_eq!(pos, tokens.len(), "trailing input in {input:?}");
    tree
}

/// Read a node's label; returns whether the node was parenthesized.
fn head(tokens: &[Token<'_>], pos: &mut usize) -> (String, String, bool) {
    match tokens.get(*pos) {
        Some(Token::Atom(atom)) => {
            *pos += 1;
            let (kind, value) = split_atom(atom);
            (kind, value, false)
        }
        Some(Token::Open) => match tokens.get(*pos + 1) {
            Some(Token::Atom(atom)) => {
                *pos += 2;
                let (kind, value) = split_atom(atom);
                (kind, value, true)
            }
            other => panic!("expected a label after '(', got {other:?}"),
        },
        other => panic!("expected a node, got {other:?}"),
    }
}

/// Read children up to and including the closing paren.
fn children(tokens: &[Token<'_>], pos: &mut usize, tree: &mut LabeledTree<String>, parent: NodeId) {
    loop {
        if tokens.get(*pos) == Some(&Token::Close) {
            *pos += 1;
            return;
        }
        let (kind, value, is_open) = head(tokens, pos);
        let child = tree.add_child(parent, kind, value);
        if is_open {
            children(tokens, pos, tree, child);
        }
    }
}
