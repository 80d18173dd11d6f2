//! Spec parser.
//!
//! Builds an [`Ast`] from spec text. Nesting is decided by indentation: a
//! line indented deeper than the previous one starts a child, a line at the
//! same column is a sibling, and a shallower line closes blocks until a
//! column recorded earlier is matched exactly.

pub mod directives;
pub mod error;
pub mod tokenizer;

use std::cmp::Ordering;

use tracing::debug;

use crate::ast::{Ast, Node, NodeId, NodeKind, Token, TokenKind};
use crate::registry::Registry;

pub use directives::Directives;
pub use error::SpecError;
use tokenizer::Tokenizer;

const COMMAND_USAGE: &str = "@command must be followed by a command name (any string) \
     and optionally a label name (:name)";

/// Parse a spec, reading the optional directives line first.
///
/// # Errors
///
/// Returns a [`SpecError`] for the first malformed construct found.
pub fn parse_spec(spec: &str, registry: &Registry) -> Result<Ast, SpecError> {
    let directives = Directives::extract(spec)?;
    parse(spec, &directives, registry)
}

/// Parse a spec with explicit directives.
///
/// `@cand` and `@go_call` function names are resolved against `registry`
/// here, so an unknown function is a parse error.
///
/// # Errors
///
/// Returns a [`SpecError`] for the first malformed construct found,
/// enriched with the offending source line.
pub fn parse(spec: &str, directives: &Directives, registry: &Registry) -> Result<Ast, SpecError> {
    debug!(
        tab_width = directives.tab_width,
        start_line = directives.start_line,
        file = %directives.filename,
        "parsing spec"
    );
    let mut parser = SpecParser {
        tokenizer: Tokenizer::new(spec, directives),
        registry,
        ast: Ast::new(),
    };
    match parser.parse() {
        Ok(()) => {
            let ast = parser.ast;
            debug!("parsed spec:\n{}", ast.dump(ast.root(), true));
            Ok(ast)
        }
        Err(e) => Err(e.with_source(parser.tokenizer.source(), directives.start_line)),
    }
}

struct SpecParser<'a> {
    tokenizer: Tokenizer,
    registry: &'a Registry,
    ast: Ast,
}

impl SpecParser<'_> {
    fn parse(&mut self) -> Result<(), SpecError> {
        let mut last_column = 0;
        let mut columns: Vec<usize> = Vec::new();
        let mut depth = 0;
        let mut open: Vec<NodeId> = vec![self.ast.root()];

        while let Some(tok) = self.tokenizer.next_token()? {
            if tok.index_in_line != 0 {
                return Err(SpecError::at(&tok, format!("Unexpected token: {tok}")));
            }

            match tok.column.cmp(&last_column) {
                Ordering::Equal => {}
                Ordering::Greater => {
                    debug!(from = last_column, to = tok.column, "indent increased");
                    columns.push(last_column);
                    depth += 1;
                }
                Ordering::Less => {
                    debug!(from = last_column, to = tok.column, "indent decreased");
                    loop {
                        let prev = columns.pop().unwrap_or(0);
                        if tok.column > prev {
                            return Err(SpecError::at(
                                &tok,
                                format!(
                                    "inconsistent indent for token \"{}\", \
                                     expected column is {prev}",
                                    tok.raw_word
                                ),
                            ));
                        }
                        depth -= 1;
                        if tok.column == prev {
                            break;
                        }
                    }
                }
            }
            last_column = tok.column;

            let node = self.parse_line(&tok, depth)?;
            let id = self.ast.add_child(open[depth - 1], node)?;
            open.truncate(depth);
            open.push(id);
        }

        validate(&self.ast)
    }

    /// Build the node for a line starting with `tok`, consuming the rest of
    /// the line's tokens the directive takes.
    fn parse_line(&mut self, tok: &Token, depth: usize) -> Result<Node, SpecError> {
        let t = &mut self.tokenizer;
        match tok.kind {
            TokenKind::Command => match tok.word.as_str() {
                "command" => {
                    if depth != 1 {
                        return Err(SpecError::at(tok, "@command must be at the toplevel"));
                    }
                    let command = t.must_next_token_in_line(TokenKind::Literal, COMMAND_USAGE)?;
                    let label = t.maybe_label()?;
                    debug!(
                        command = %command.word,
                        label = label.as_ref().map(|l| l.word.as_str()),
                        "@command"
                    );
                    Ok(Node::command(tok.clone(), command, label))
                }
                "label" => {
                    if depth != 1 {
                        return Err(SpecError::at(tok, "@label must be at the toplevel"));
                    }
                    let label = t.must_next_token_in_line(
                        TokenKind::Label,
                        "@label must be followed by a label name (:name)",
                    )?;
                    Ok(Node::label(tok.clone(), label))
                }
                "call" => {
                    let label = t.must_next_token_in_line(
                        TokenKind::Label,
                        "@call must be followed by a label name (:name)",
                    )?;
                    Ok(Node::call(tok.clone(), label))
                }
                "finish" => Ok(Node::finish(tok.clone())),
                "loop" | "switch" | "switchloop" => {
                    let kind = match tok.word.as_str() {
                        "loop" => NodeKind::Loop,
                        "switch" => NodeKind::Switch,
                        _ => NodeKind::SwitchLoop,
                    };
                    let (pattern, label) = t.maybe_literal_and_label()?;
                    Node::switch_loop(kind, tok.clone(), pattern, label)
                }
                "break" | "continue" => {
                    let kind = if tok.word == "break" {
                        NodeKind::Break
                    } else {
                        NodeKind::Continue
                    };
                    let label = t.maybe_label()?;
                    Ok(Node::loop_control(kind, tok.clone(), label))
                }
                "any" => {
                    let help = t.maybe_help()?;
                    Ok(Node::any(tok.clone(), help))
                }
                "go_call" | "cand" => {
                    let kind = if tok.word == "cand" {
                        NodeKind::Candidate
                    } else {
                        NodeKind::GoCall
                    };
                    let func_name = t.must_next_token_in_line(
                        TokenKind::Literal,
                        &format!("{} must be followed by a function name", tok.raw_word),
                    )?;
                    if !self.registry.is_defined(&func_name.word) {
                        return Err(SpecError::at(
                            &func_name,
                            format!("function \"{}\" not defined", func_name.word),
                        ));
                    }
                    let (args, help) = t.maybe_args_and_help()?;
                    debug!(function = %func_name.word, args = args.len(), "{}", tok.raw_word);
                    Ok(Node::function_call(kind, tok.clone(), func_name, args, help))
                }
                _ => Err(SpecError::at(tok, format!("unexpected command {tok}"))),
            },
            TokenKind::Literal => {
                let help = t.maybe_help()?;
                Ok(Node::literal(tok.clone(), help))
            }
            _ => Err(SpecError::at(tok, format!("Unexpected token: {tok}"))),
        }
    }
}

/// Whole-tree checks that can only run once every label is known.
fn validate(ast: &Ast) -> Result<(), SpecError> {
    for id in ast.node_ids() {
        let node = ast.node(id);
        if matches!(node.kind(), NodeKind::Call | NodeKind::Command)
            && let Some(label) = node.label_token()
            && ast.labeled_node(&label.word).is_none()
        {
            return Err(SpecError::at(
                label,
                format!("label :{} doesn't exist", label.word),
            ));
        }
        if node.kind().is_switch_or_loop()
            && node.first_child().is_none()
            && let Some(tok) = node.self_token()
        {
            return Err(SpecError::at(
                tok,
                format!("{tok} must have at least one child"),
            ));
        }
    }
    Ok(())
}
