//! Control-flow results threaded through the interpreter.
//!
//! `@finish`, `@break`, `@continue` and reaching a `@label` abort the
//! enclosing frames until one of them catches the signal. Each `execute_*`
//! call returns an [`ExecResult`] and its caller either consumes the signal
//! or passes it up.

use crate::ast::{Ast, NodeId, NodeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// Stop completion for this command line.
    Finish,
    /// A `@label` was reached; returns from an `@call`.
    Label,
    Break,
    Continue,
}

impl SignalKind {
    fn from_node_kind(kind: NodeKind) -> Option<Self> {
        match kind {
            NodeKind::Finish => Some(SignalKind::Finish),
            NodeKind::Label => Some(SignalKind::Label),
            NodeKind::Break => Some(SignalKind::Break),
            NodeKind::Continue => Some(SignalKind::Continue),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signal {
    pub kind: SignalKind,
    /// The node that raised the signal. `None` for an implicit finish, such
    /// as a sequential chain failing to match.
    pub node: Option<NodeId>,
}

impl Signal {
    #[must_use]
    pub fn finish() -> Self {
        Signal {
            kind: SignalKind::Finish,
            node: None,
        }
    }

    /// The signal raised by a flow-control node, if `id` is one.
    #[must_use]
    pub fn raised_by(ast: &Ast, id: NodeId) -> Option<Self> {
        SignalKind::from_node_kind(ast.node(id).kind()).map(|kind| Signal {
            kind,
            node: Some(id),
        })
    }

    /// The label named by the raising node, or `""`.
    #[must_use]
    pub fn label<'a>(&self, ast: &'a Ast) -> &'a str {
        self.node.map_or("", |id| ast.node(id).label_word())
    }

    /// Whether a loop or switch labeled `label` catches this signal: an
    /// unlabeled break/continue, or one naming `label`.
    #[must_use]
    pub fn is_loop_control_for(&self, ast: &Ast, label: &str) -> bool {
        if !matches!(self.kind, SignalKind::Break | SignalKind::Continue) {
            return false;
        }
        let target = self.label(ast);
        target.is_empty() || target.eq_ignore_ascii_case(label)
    }

    /// Whether an `@call` catches this signal.
    #[must_use]
    pub fn is_return(&self) -> bool {
        self.kind == SignalKind::Label
    }
}

/// Outcome of executing a node or a chain of nodes.
///
/// `matched` reports whether anything executed matched the current word.
/// It is carried along while a signal unwinds so enclosing frames see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecResult {
    Completed { matched: bool },
    Unwinding { signal: Signal, matched: bool },
}

impl ExecResult {
    #[must_use]
    pub fn matched(self) -> bool {
        match self {
            ExecResult::Completed { matched } | ExecResult::Unwinding { matched, .. } => matched,
        }
    }

    #[must_use]
    pub fn signal(self) -> Option<Signal> {
        match self {
            ExecResult::Completed { .. } => None,
            ExecResult::Unwinding { signal, .. } => Some(signal),
        }
    }

    /// The same result with `matched` forced on.
    #[must_use]
    pub fn mark_matched(self) -> Self {
        match self {
            ExecResult::Completed { .. } => ExecResult::Completed { matched: true },
            ExecResult::Unwinding { signal, .. } => ExecResult::Unwinding {
                signal,
                matched: true,
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::parser::parse_spec;
    use crate::registry::Registry;

    fn nodes(ast: &Ast, kind: NodeKind) -> Vec<NodeId> {
        ast.node_ids().filter(|&id| ast.node(id).kind() == kind).collect()
    }

    #[test]
    fn test_loop_control_filter() {
        let spec = "@loop :outer\n  @loop\n    @break\n    @break :OUTER\n    @continue :other\n";
        let ast = parse_spec(spec, &Registry::new()).unwrap();
        let breaks = nodes(&ast, NodeKind::Break);
        let cont = nodes(&ast, NodeKind::Continue)[0];

        let unlabeled = Signal::raised_by(&ast, breaks[0]).unwrap();
        assert!(unlabeled.is_loop_control_for(&ast, ""));
        assert!(unlabeled.is_loop_control_for(&ast, "outer"));

        let labeled = Signal::raised_by(&ast, breaks[1]).unwrap();
        assert!(labeled.is_loop_control_for(&ast, "outer"));
        assert!(!labeled.is_loop_control_for(&ast, ""));
        assert_eq!(labeled.label(&ast), "OUTER");

        let other = Signal::raised_by(&ast, cont).unwrap();
        assert_eq!(other.kind, SignalKind::Continue);
        assert!(!other.is_loop_control_for(&ast, "outer"));

        assert!(!Signal::finish().is_loop_control_for(&ast, ""));
    }

    #[test]
    fn test_only_labels_are_returns() {
        let ast = parse_spec("@call :x\n@label :x\n  a\n", &Registry::new()).unwrap();
        let label = nodes(&ast, NodeKind::Label)[0];
        assert!(Signal::raised_by(&ast, label).unwrap().is_return());
        assert!(!Signal::finish().is_return());
        assert!(Signal::raised_by(&ast, nodes(&ast, NodeKind::Call)[0]).is_none());
    }

    #[test]
    fn test_mark_matched_keeps_signal() {
        let r = ExecResult::Unwinding {
            signal: Signal::finish(),
            matched: false,
        }
        .mark_matched();
        assert!(r.matched());
        assert_eq!(r.signal(), Some(Signal::finish()));
        assert!(ExecResult::Completed { matched: false }.mark_matched().matched());
    }
}
