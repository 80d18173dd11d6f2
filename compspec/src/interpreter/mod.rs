//! Interpreter to execute the AST against a command line
//!
//! Walks the spec tree while advancing a program counter over the typed
//! words. Nodes before the cursor only validate words; nodes at the cursor
//! emit candidates. Non-local exits (`@finish`, `@break`, `@continue`,
//! returning from `@call`) travel back up as [`ExecResult::Unwinding`].

pub mod command_line;
pub mod flow;

use tracing::debug;

use crate::ast::{Ast, NodeId, NodeKind};
use crate::candidate::{Candidate, CandidateList};
use crate::error::{Error, Result, SpecError};
use crate::matcher::MatchConfig;
use crate::registry::Registry;

pub use command_line::{CommandLine, CompleteContext};
use flow::{ExecResult, Signal, SignalKind};

pub struct Interpreter<'a> {
    ast: &'a Ast,
    registry: &'a Registry,
    config: MatchConfig,
    command_line: CommandLine,
    /// Collected output candidates
    candidates: Vec<Candidate>,
    /// Last pc each node was executed at, indexed by node id
    last_visited: Vec<Option<usize>>,
}

impl<'a> Interpreter<'a> {
    #[must_use]
    pub fn new(
        ast: &'a Ast,
        registry: &'a Registry,
        config: MatchConfig,
        command_line: CommandLine,
    ) -> Self {
        Self {
            ast,
            registry,
            config,
            command_line,
            candidates: Vec::new(),
            last_visited: vec![None; ast.len()],
        }
    }

    /// Execute the spec and return the candidates for the cursor word,
    /// sorted by value.
    ///
    /// # Errors
    ///
    /// A [`SpecError`] when a `@break`/`@continue` escapes every loop, and
    /// [`Error::Internal`] when an engine invariant is violated.
    pub fn run(mut self) -> Result<Vec<Candidate>> {
        let command = self.command_line.command();
        let start = self.ast.start_node_for_command(&command);
        self.command_line.set_pc(1);
        debug!(
            command = %command,
            cursor = self.command_line.cursor_index(),
            words = ?self.command_line.raw_words(),
            "completion start"
        );

        let result = self.execute_chain(start, false)?;
        if let Some(signal) = result.signal()
            && !matches!(signal.kind, SignalKind::Finish | SignalKind::Label)
        {
            return Err(self.stray_signal(signal).into());
        }

        let mut candidates = self.candidates;
        candidates.sort_by(|a, b| a.value.cmp(&b.value));
        debug!(count = candidates.len(), "completion done");
        Ok(candidates)
    }

    fn stray_signal(&self, signal: Signal) -> SpecError {
        let Some(id) = signal.node else {
            return SpecError::new(format!("unexpected flow control {:?}", signal.kind));
        };
        let node = self.ast.node(id);
        let message = format!(
            "unexpected flow control \"{}\" (with label \"{}\")",
            node.kind(),
            node.label_word()
        );
        match node.self_token() {
            Some(tok) => SpecError::at(tok, message),
            None => SpecError::new(message),
        }
    }

    fn add_candidates(&mut self, candidates: Vec<Candidate>) {
        let prefix = self.command_line.cursor_word(0);
        for c in candidates {
            let matched = c.matches(prefix, &self.config);
            debug!(candidate = %c, matched, "candidate");
            if matched {
                self.candidates.push(c);
            }
        }
    }

    fn visit(&mut self, id: NodeId) -> Result<()> {
        let pc = self.command_line.pc();
        let slot = &mut self.last_visited[id.index()];
        if *slot == Some(pc) {
            return Err(Error::internal(format!(
                "node {} visited twice at word index {pc}",
                self.ast.describe(id)
            )));
        }
        *slot = Some(pc);
        Ok(())
    }

    /// Execute a sibling chain starting at `start`.
    ///
    /// Outside a switch every node must match, otherwise the chain finishes.
    /// Inside a switch the first matching node ends the chain, except while
    /// collecting, where every alternative gets to contribute candidates.
    fn execute_chain(&mut self, start: Option<NodeId>, in_switch: bool) -> Result<ExecResult> {
        let ast = self.ast;
        let mut matched = false;
        let mut next = start;

        while let Some(id) = next
            && !self.command_line.is_after_cursor()
        {
            let node = ast.node(id);
            next = node.next_sibling();

            debug!(
                word = %self.command_line.raw_current_word(0),
                pc = self.command_line.pc(),
                cursor = self.command_line.cursor_index(),
                in_switch,
                "executing {}",
                ast.describe(id)
            );
            self.visit(id)?;

            if node.kind() == NodeKind::Command {
                continue;
            }
            let collecting = self.command_line.is_at_cursor();

            let result = match node.kind() {
                NodeKind::Label | NodeKind::Finish | NodeKind::Break | NodeKind::Continue => {
                    let signal = Signal::raised_by(ast, id)
                        .ok_or_else(|| Error::internal("flow control node raised no signal"))?;
                    ExecResult::Unwinding {
                        signal,
                        matched: false,
                    }
                }
                NodeKind::Switch => self.execute_switch_loop(id, in_switch, true, false)?,
                NodeKind::SwitchLoop => self.execute_switch_loop(id, in_switch, true, true)?,
                NodeKind::Loop => self.execute_switch_loop(id, in_switch, false, true)?,
                NodeKind::Any | NodeKind::Candidate | NodeKind::Literal => {
                    self.execute_candidate_node(id, in_switch)?
                }
                NodeKind::Call => self.execute_call(id, in_switch)?,
                NodeKind::GoCall => self.execute_go_call(id)?,
                NodeKind::Root | NodeKind::Command => {
                    return Err(Error::internal(format!(
                        "unexpected node {}",
                        ast.describe(id)
                    )));
                }
            };

            let m = result.matched();
            debug!(matched = m, "result");
            matched |= m;
            if let Some(signal) = result.signal() {
                return Ok(ExecResult::Unwinding { signal, matched });
            }

            if in_switch {
                if collecting || !m {
                    continue;
                }
                debug!("in switch and match found");
                break;
            }
            if !m {
                debug!("sequential and didn't match");
                return Ok(ExecResult::Unwinding {
                    signal: Signal::finish(),
                    matched,
                });
            }
        }
        Ok(ExecResult::Completed { matched })
    }

    /// `@switch`, `@switchloop` and `@loop`.
    fn execute_switch_loop(
        &mut self,
        id: NodeId,
        in_switch: bool,
        do_switch: bool,
        do_loop: bool,
    ) -> Result<ExecResult> {
        let ast = self.ast;
        let node = ast.node(id);
        let Some(first) = node.first_child() else {
            return Err(Error::internal(format!(
                "{} has no children",
                ast.describe(id)
            )));
        };
        let my_label = node.label_word();
        debug!(do_switch, do_loop, in_switch, "switch/loop {}", ast.describe(id));

        let mut matched = false;
        while !self.command_line.is_after_cursor() {
            if self.command_line.is_before_cursor()
                && !node.pattern_matches(self.command_line.current_word(0))
            {
                debug!(word = %self.command_line.current_word(0), "not accepted by pattern");
                matched = true;
                break;
            }

            let start_pc = self.command_line.pc();
            let collecting = self.command_line.is_at_cursor();

            let result = self.execute_chain(Some(first), do_switch)?;
            matched |= result.matched();
            let caught = match result.signal() {
                None => None,
                Some(signal) if signal.is_loop_control_for(ast, my_label) => {
                    debug!(kind = ?signal.kind, "loop control caught");
                    Some(signal.kind)
                }
                Some(signal) => return Ok(ExecResult::Unwinding { signal, matched }),
            };

            if collecting {
                if !in_switch && node.pattern_matches(self.command_line.current_word(0)) {
                    return Ok(ExecResult::Unwinding {
                        signal: Signal::finish(),
                        matched,
                    });
                }
                debug!("still collecting, returning to the caller");
                break;
            }
            if !do_loop || caught == Some(SignalKind::Break) {
                break;
            }
            if start_pc == self.command_line.pc() {
                self.command_line.advance_pc(1);
                debug!("forced advance in loop");
            }
        }
        Ok(ExecResult::Completed { matched })
    }

    /// `@any`, `@cand` and literals.
    fn execute_candidate_node(&mut self, id: NodeId, in_switch: bool) -> Result<ExecResult> {
        if self.command_line.is_after_cursor() {
            return Err(Error::internal("candidate node executed after the cursor"));
        }
        let ast = self.ast;
        let word = self.command_line.current_word(0).to_string();
        let list = self.candidate_list(id)?;

        if self.command_line.is_at_cursor() {
            let candidates = list.candidates(&word, &self.config);
            self.add_candidates(candidates);
            if !in_switch {
                debug!("cursor word consumed");
                return Ok(ExecResult::Unwinding {
                    signal: Signal::finish(),
                    matched: false,
                });
            }
            return Ok(ExecResult::Completed { matched: true });
        }

        if list.matches_fully(&word, &self.config) {
            self.command_line.advance_pc(1);
            debug!(word = %word, "matched, descending");
            let result = self.execute_chain(ast.node(id).first_child(), false)?;
            return Ok(result.mark_matched());
        }
        Ok(ExecResult::Completed { matched: false })
    }

    fn candidate_list(&self, id: NodeId) -> Result<CandidateList> {
        let node = self.ast.node(id);
        match node.kind() {
            NodeKind::Any => Ok(CandidateList::open(node.as_candidates())),
            NodeKind::Literal => Ok(CandidateList::strict(node.as_candidates())),
            NodeKind::Candidate => {
                let name = node.func_name().map_or("", |t| t.word.as_str());
                let list = self
                    .registry
                    .invoke(name, &self.command_line, &node.args())?
                    .ok_or_else(|| {
                        Error::internal(format!("@cand function {name} returned no candidates"))
                    })?;
                Ok(list.with_default_help(node.help_word()))
            }
            _ => Err(Error::internal(format!(
                "{} does not produce candidates",
                self.ast.describe(id)
            ))),
        }
    }

    /// Run the label's body in place; reaching a `@label` returns.
    fn execute_call(&mut self, id: NodeId, in_switch: bool) -> Result<ExecResult> {
        let ast = self.ast;
        let label = ast.node(id).label_word();
        let target = ast
            .labeled_node(label)
            .ok_or_else(|| Error::internal(format!("label :{label} doesn't exist")))?;

        Ok(match self.execute_chain(ast.node(target).first_child(), in_switch)? {
            ExecResult::Unwinding { signal, matched } if signal.is_return() => {
                ExecResult::Completed { matched }
            }
            other => other,
        })
    }

    /// Always matches without consuming a word.
    fn execute_go_call(&mut self, id: NodeId) -> Result<ExecResult> {
        let node = self.ast.node(id);
        let name = node.func_name().map_or("", |t| t.word.as_str());
        let ret = self.registry.invoke(name, &self.command_line, &node.args())?;
        if ret.is_some() {
            return Err(Error::Internal(format!(
                "@go_call function {name} must not return values"
            )));
        }
        Ok(ExecResult::Completed { matched: true })
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::parser::parse_spec;
    use crate::registry::{action, generator};

    fn complete_with(
        spec: &str,
        registry: &Registry,
        words: &[&str],
        cursor: usize,
    ) -> Result<Vec<Candidate>> {
        let ast = parse_spec(spec, registry).unwrap_or_else(|e| panic!("{e}"));
        let line = CommandLine::new(words.iter().map(ToString::to_string).collect(), cursor);
        Interpreter::new(&ast, registry, MatchConfig::default(), line).run()
    }

    fn complete(spec: &str, words: &[&str], cursor: usize) -> Vec<Candidate> {
        complete_with(spec, &Registry::new(), words, cursor).unwrap()
    }

    fn values(candidates: &[Candidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.value.as_str()).collect()
    }

    #[test]
    fn test_switch_collects_all_alternatives() {
        let got = complete("@switch\n\tstart\n\tstop\n", &["cmd", "st"], 1);
        assert_eq!(values(&got), vec!["start", "stop"]);
    }

    #[test]
    fn test_switch_descends_into_matched_branch() {
        let got = complete("@switch\n\tstart\n\t\t@any #DONE\n\tstop\n", &["cmd", "start", ""], 2);
        assert_eq!(got, vec![Candidate::any("DONE")]);
    }

    #[test]
    fn test_switch_selects_only_matching_branch() {
        let spec = "@switch\n  a\n    @any # A\n  b\n    @any # B\n  c\n    @any # C\n";
        let got = complete(spec, &["cmd", "b", ""], 2);
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].help, "B");
    }

    #[test]
    fn test_loop_terminates_when_child_never_consumes() {
        let seen = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&seen);
        let mut registry = Registry::new();
        registry
            .register(
                "count",
                action(move |_: &dyn CompleteContext, _: &[String]| {
                    *counter.lock().unwrap() += 1;
                }),
            )
            .unwrap();
        let words = ["cmd", "a", "b", "c", ""];
        let got = complete_with("@loop\n  @go_call count\n", &registry, &words, 4).unwrap();
        assert!(got.is_empty());
        assert_eq!(*seen.lock().unwrap(), 4);
    }

    #[test]
    fn test_loop_with_accept_all_child() {
        let mut registry = Registry::new();
        registry
            .register(
                "anything",
                generator(|_: &dyn CompleteContext, _: &[String]| {
                    CandidateList::open(vec![Candidate::any("<ARG>")])
                }),
            )
            .unwrap();
        let words = ["cmd", "x", "y", "z", ""];
        let got = complete_with("@loop\n  @cand anything\n", &registry, &words, 4).unwrap();
        assert_eq!(got, vec![Candidate::any("<ARG>")]);
    }

    #[test]
    fn test_literal_collects_at_cursor_and_descends_past_it() {
        let spec = "foo\n  bar\n";
        assert_eq!(values(&complete(spec, &["cmd", "fo"], 1)), vec!["foo"]);
        assert_eq!(values(&complete(spec, &["cmd", "foo", ""], 2)), vec!["bar"]);
    }

    #[test]
    fn test_sequential_mismatch_finishes() {
        let got = complete("foo\n  bar\n", &["cmd", "nope", ""], 2);
        assert!(got.is_empty());
    }

    #[test]
    fn test_alternatives_with_help() {
        let got = complete("start|stop|restart # lifecycle action\n", &["cmd", "re"], 1);
        assert_eq!(got, vec![Candidate::new("restart").help("lifecycle action")]);
    }

    #[test]
    fn test_call_returns_to_call_site() {
        let spec = "@call :shared\nafter\n@label :shared\n  @switch\n    -a\n    -b\n";
        assert_eq!(values(&complete(spec, &["cmd", "-"], 1)), vec!["-a", "-b"]);
        assert_eq!(values(&complete(spec, &["cmd", "-a", ""], 2)), vec!["after"]);
    }

    #[test]
    fn test_stray_break_is_spec_error() {
        let err = complete_with("@break\n", &Registry::new(), &["cmd", ""], 1).unwrap_err();
        let spec_err = err.as_spec_error().expect("spec error");
        assert_eq!(
            spec_err.message,
            "unexpected flow control \"Break\" (with label \"\")"
        );
        assert_eq!((spec_err.line, spec_err.column), (1, 1));
    }

    #[test]
    fn test_revisit_at_same_position_is_internal_error() {
        let spec = "@switch\n  @call :x\n  @call :x\n@label :x\n  foo\n";
        let err = complete_with(spec, &Registry::new(), &["cmd", ""], 1).unwrap_err();
        assert!(matches!(err, Error::Internal(_)), "{err}");
    }

    #[test]
    fn test_go_call_returning_values_is_internal_error() {
        let mut registry = Registry::new();
        registry
            .register(
                "oops",
                generator(|_: &dyn CompleteContext, _: &[String]| CandidateList::strict(vec![])),
            )
            .unwrap();
        let err = complete_with("@go_call oops\nfoo\n", &registry, &["cmd", ""], 1).unwrap_err();
        assert_eq!(
            err.to_string(),
            "internal error: @go_call function oops must not return values"
        );
    }

    #[test]
    fn test_cand_help_fills_missing_help() {
        let mut registry = Registry::new();
        registry
            .register(
                "colors",
                generator(|_: &dyn CompleteContext, _: &[String]| {
                    CandidateList::strict(vec![
                        Candidate::new("red"),
                        Candidate::new("green").help("go"),
                    ])
                }),
            )
            .unwrap();
        let got = complete_with("@cand colors # a color\n", &registry, &["cmd", ""], 1).unwrap();
        assert_eq!(
            got,
            vec![Candidate::new("green").help("go"), Candidate::new("red").help("a color")]
        );
    }

    #[test]
    fn test_unknown_command_uses_top_level() {
        let spec = "@command adb :adb\n@label :adb\n  shell\n";
        assert_eq!(values(&complete(spec, &["/usr/bin/adb", "sh"], 1)), vec!["shell"]);
        assert!(complete(spec, &["other", ""], 1).is_empty());
    }

    #[test]
    fn test_empty_spec_yields_nothing() {
        assert!(complete("", &["cmd", ""], 1).is_empty());
    }
}
