//! Tokens and the spec tree.
//!
//! The tree is stored as an arena: [`Ast`] owns every [`Node`] and nodes
//! refer to each other through [`NodeId`] indices. Children of a node form a
//! singly linked chain (`first_child` then `next_sibling`), which is the order
//! the interpreter walks them in.

use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Write as _};
use std::path::Path;

use regex::Regex;

use crate::candidate::Candidate;
use crate::parser::error::SpecError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `@word`
    Command,
    /// A bare word or a quoted string.
    Literal,
    /// `:word`
    Label,
    /// `# text` up to the end of the line.
    Help,
    /// Wildcard used only as an expected kind.
    Any,
}

impl TokenKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Command => "Command",
            TokenKind::Literal => "Literal",
            TokenKind::Label => "Label",
            TokenKind::Help => "Help",
            TokenKind::Any => "Any",
        }
    }
}

/// A lexical unit of the spec, with its source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Text with the sigil removed, strings unquoted, help trimmed.
    pub word: String,
    /// Text as written in the spec.
    pub raw_word: String,
    pub source_file: String,
    pub line: usize,
    pub column: usize,
    /// Position of the token among the tokens of its line, starting at 0.
    pub index_in_line: usize,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.raw_word)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Root,
    Command,
    Label,
    Call,
    Finish,
    Loop,
    Switch,
    SwitchLoop,
    Any,
    Break,
    Continue,
    GoCall,
    Candidate,
    Literal,
}

impl NodeKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Root => "Root",
            NodeKind::Command => "Command",
            NodeKind::Label => "Label",
            NodeKind::Call => "Call",
            NodeKind::Finish => "Finish",
            NodeKind::Loop => "Loop",
            NodeKind::Switch => "Switch",
            NodeKind::SwitchLoop => "SwitchLoop",
            NodeKind::Any => "Any",
            NodeKind::Break => "Break",
            NodeKind::Continue => "Continue",
            NodeKind::GoCall => "GoCall",
            NodeKind::Candidate => "Candidate",
            NodeKind::Literal => "Literal",
        }
    }

    /// Nodes that can never have children.
    fn is_leaf(self) -> bool {
        matches!(
            self,
            NodeKind::Command | NodeKind::Call | NodeKind::Finish | NodeKind::GoCall
        )
    }

    /// `@loop`, `@switch` and `@switchloop`.
    #[must_use]
    pub fn is_switch_or_loop(self) -> bool {
        matches!(self, NodeKind::Loop | NodeKind::Switch | NodeKind::SwitchLoop)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Index of a node inside its [`Ast`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// One node of the spec tree.
#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    self_token: Option<Token>,
    depth: usize,

    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    next_sibling: Option<NodeId>,

    literal: Option<Token>,
    command: Option<Token>,
    pattern: Option<Token>,
    regex: Option<Regex>,
    func_name: Option<Token>,
    label: Option<Token>,
    help: Option<Token>,
    args: Vec<Token>,
}

impl Node {
    fn new(kind: NodeKind, self_token: Option<Token>) -> Self {
        Node {
            kind,
            self_token,
            depth: 0,
            parent: None,
            first_child: None,
            last_child: None,
            next_sibling: None,
            literal: None,
            command: None,
            pattern: None,
            regex: None,
            func_name: None,
            label: None,
            help: None,
            args: Vec::new(),
        }
    }

    /// `@command <name> [:label]`
    #[must_use]
    pub fn command(this: Token, command: Token, label: Option<Token>) -> Self {
        let mut n = Node::new(NodeKind::Command, Some(this));
        n.command = Some(command);
        n.label = label;
        n
    }

    /// `@label :name`
    #[must_use]
    pub fn label(this: Token, label: Token) -> Self {
        let mut n = Node::new(NodeKind::Label, Some(this));
        n.label = Some(label);
        n
    }

    /// `@call :name`
    #[must_use]
    pub fn call(this: Token, label: Token) -> Self {
        let mut n = Node::new(NodeKind::Call, Some(this));
        n.label = Some(label);
        n
    }

    #[must_use]
    pub fn finish(this: Token) -> Self {
        Node::new(NodeKind::Finish, Some(this))
    }

    /// `@break [:label]` or `@continue [:label]`. `kind` is `Break` or
    /// `Continue`.
    #[must_use]
    pub(crate) fn loop_control(kind: NodeKind, this: Token, label: Option<Token>) -> Self {
        debug_assert!(matches!(kind, NodeKind::Break | NodeKind::Continue));
        let mut n = Node::new(kind, Some(this));
        n.label = label;
        n
    }

    /// `@loop`, `@switch` or `@switchloop`, each with an optional pattern
    /// and label. The pattern is compiled here so a bad regex is reported
    /// at parse time.
    ///
    /// # Errors
    ///
    /// Returns a [`SpecError`] at the pattern token if it isn't a valid
    /// regex.
    pub(crate) fn switch_loop(
        kind: NodeKind,
        this: Token,
        pattern: Option<Token>,
        label: Option<Token>,
    ) -> Result<Self, SpecError> {
        debug_assert!(kind.is_switch_or_loop());
        let mut n = Node::new(kind, Some(this));
        if let Some(pattern) = pattern {
            let regex = Regex::new(&pattern.word).map_err(|e| {
                SpecError::at(&pattern, format!("invalid regex {:?}: {e}", pattern.word))
            })?;
            n.regex = Some(regex);
            n.pattern = Some(pattern);
        }
        n.label = label;
        Ok(n)
    }

    /// `@any [# help]`
    #[must_use]
    pub fn any(this: Token, help: Option<Token>) -> Self {
        let mut n = Node::new(NodeKind::Any, Some(this));
        n.help = help;
        n
    }

    /// `@go_call` or `@cand`, naming a registered function.
    #[must_use]
    pub(crate) fn function_call(
        kind: NodeKind,
        this: Token,
        func_name: Token,
        args: Vec<Token>,
        help: Option<Token>,
    ) -> Self {
        debug_assert!(matches!(kind, NodeKind::GoCall | NodeKind::Candidate));
        let mut n = Node::new(kind, Some(this));
        n.func_name = Some(func_name);
        n.args = args;
        n.help = help;
        n
    }

    /// A literal word, optionally with help.
    #[must_use]
    pub fn literal(this: Token, help: Option<Token>) -> Self {
        let mut n = Node::new(NodeKind::Literal, Some(this.clone()));
        n.literal = Some(this);
        n.help = help;
        n
    }

    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// The directive or literal token that created this node. `None` for
    /// the root.
    #[must_use]
    pub fn self_token(&self) -> Option<&Token> {
        self.self_token.as_ref()
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[must_use]
    pub fn first_child(&self) -> Option<NodeId> {
        self.first_child
    }

    #[must_use]
    pub fn next_sibling(&self) -> Option<NodeId> {
        self.next_sibling
    }

    #[must_use]
    pub fn literal_token(&self) -> Option<&Token> {
        self.literal.as_ref()
    }

    #[must_use]
    pub fn func_name(&self) -> Option<&Token> {
        self.func_name.as_ref()
    }

    #[must_use]
    pub fn label_token(&self) -> Option<&Token> {
        self.label.as_ref()
    }

    /// The label name, or `""` when the node has none.
    #[must_use]
    pub fn label_word(&self) -> &str {
        self.label.as_ref().map_or("", |t| t.word.as_str())
    }

    /// The help text, or `""` when the node has none.
    #[must_use]
    pub fn help_word(&self) -> &str {
        self.help.as_ref().map_or("", |t| t.word.as_str())
    }

    /// Argument words for `@go_call`/`@cand`.
    #[must_use]
    pub fn args(&self) -> Vec<String> {
        self.args.iter().map(|a| a.word.clone()).collect()
    }

    /// Whether `s` is accepted by the node's pattern. A node without a
    /// pattern accepts everything.
    #[must_use]
    pub fn pattern_matches(&self, s: &str) -> bool {
        self.regex.as_ref().is_none_or(|re| re.is_match(s))
    }

    /// Candidates represented by an `@any` or literal node.
    ///
    /// An unquoted literal containing `|` expands to one candidate per
    /// alternative. Every candidate carries the node's help.
    #[must_use]
    pub fn as_candidates(&self) -> Vec<Candidate> {
        match self.kind {
            NodeKind::Any => vec![Candidate::any(self.help_word())],
            NodeKind::Literal => {
                let Some(literal) = &self.literal else {
                    return Vec::new();
                };
                // Backquoted literals count as quoted too.
                let quoted = literal.raw_word.starts_with(['"', '`']);
                if quoted || !literal.raw_word.contains('|') {
                    return vec![Candidate::new(literal.word.as_str()).help(self.help_word())];
                }
                literal
                    .word
                    .split('|')
                    .map(|alt| {
                        Candidate::new(alt.trim_matches([' ', '\t', '\r', '\n']))
                            .help(self.help_word())
                    })
                    .collect()
            }
            _ => Vec::new(),
        }
    }
}

/// The parsed spec tree.
#[derive(Debug, Clone)]
pub struct Ast {
    nodes: Vec<Node>,
    /// Lowercased label name to its `@label` node.
    labels: HashMap<String, NodeId>,
    /// Command name to its `@command` node.
    commands: BTreeMap<String, NodeId>,
}

impl Default for Ast {
    fn default() -> Self {
        Self::new()
    }
}

impl Ast {
    /// An empty tree holding only the root.
    #[must_use]
    pub fn new() -> Self {
        Ast {
            nodes: vec![Node::new(NodeKind::Root, None)],
            labels: HashMap::new(),
            commands: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the spec produced no nodes besides the root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Every node id, in the order nodes were added (document order).
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + use<> {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Iterate over `parent`'s children in order.
    pub fn children(&self, parent: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.node(parent).first_child, |&id| {
            self.node(id).next_sibling
        })
    }

    /// Append `node` as the last child of `parent`.
    ///
    /// Registers `@command` and `@label` nodes in the root's lookup tables.
    ///
    /// # Errors
    ///
    /// Returns a [`SpecError`] when `parent` is a leaf directive or the
    /// top-level label rules reject `node`.
    pub fn add_child(&mut self, parent: NodeId, mut node: Node) -> Result<NodeId, SpecError> {
        let parent_node = self.node(parent);
        if parent_node.kind.is_leaf() {
            let token = parent_node.self_token.as_ref();
            let name = token.map(ToString::to_string).unwrap_or_default();
            let message = format!("{name} takes no children");
            return Err(match token {
                Some(t) => SpecError::at(t, message),
                None => SpecError::new(message),
            });
        }

        if let Some(prev) = parent_node.last_child
            && self.node(prev).kind == NodeKind::Label
            && node.kind != NodeKind::Label
        {
            let message = "only @label can appear at the top level";
            return Err(match node.self_token.as_ref() {
                Some(t) => SpecError::at(t, message),
                None => SpecError::new(message),
            });
        }

        let id = NodeId(self.nodes.len());
        match node.kind {
            NodeKind::Command => {
                if let Some(command) = &node.command {
                    self.commands.insert(command.word.clone(), id);
                }
            }
            NodeKind::Label => {
                if let Some(label) = &node.label {
                    let key = label.word.to_lowercase();
                    if self.labels.contains_key(&key) {
                        return Err(SpecError::at(
                            label,
                            format!("label :{} already defined", label.word),
                        ));
                    }
                    self.labels.insert(key, id);
                }
            }
            _ => {}
        }

        node.parent = Some(parent);
        node.depth = self.node(parent).depth + 1;
        self.nodes.push(node);

        let parent_node = &mut self.nodes[parent.0];
        let prev = parent_node.last_child.replace(id);
        if parent_node.first_child.is_none() {
            parent_node.first_child = Some(id);
        }
        if let Some(prev) = prev {
            self.nodes[prev.0].next_sibling = Some(id);
        }
        Ok(id)
    }

    /// The `@label` node with the given name (case-insensitive).
    #[must_use]
    pub fn labeled_node(&self, label: &str) -> Option<NodeId> {
        self.labels.get(&label.to_lowercase()).copied()
    }

    /// The node execution starts at for `command`.
    ///
    /// When `command` (or its path basename) has an `@command` entry with a
    /// label, that's the label's first child. Otherwise it's the root's
    /// first child.
    #[must_use]
    pub fn start_node_for_command(&self, command: &str) -> Option<NodeId> {
        let entry = self.commands.get(command).or_else(|| {
            Path::new(command)
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(|base| self.commands.get(base))
        });
        if let Some(&entry) = entry
            && let Some(label) = self.node(entry).label_token()
            && let Some(target) = self.labeled_node(&label.word)
        {
            return self.node(target).first_child;
        }
        self.node(self.root()).first_child
    }

    /// Command names declared with `@command`, sorted.
    #[must_use]
    pub fn target_commands(&self) -> Vec<String> {
        self.commands.keys().cloned().collect()
    }

    /// A human readable dump of the tree starting at `id`.
    ///
    /// With `multi_line`, children follow on their own lines, indented by
    /// two spaces, and siblings follow at the same indent. Otherwise only
    /// the node itself is rendered.
    #[must_use]
    pub fn dump(&self, id: NodeId, multi_line: bool) -> String {
        let mut out = String::new();
        self.dump_inner(id, "", multi_line, &mut out);
        out
    }

    fn dump_inner(&self, id: NodeId, indent: &str, multi_line: bool, out: &mut String) {
        let mut next = Some(id);
        while let Some(id) = next {
            let n = self.node(id);
            let _ = write!(out, "{indent}#{} [{}] {}:", id.0, n.depth, n.kind);

            let fields = [
                (&n.literal, "literal"),
                (&n.command, "command"),
                (&n.pattern, "pattern"),
                (&n.func_name, "funcName"),
                (&n.label, "label"),
                (&n.help, "help"),
            ];
            for (token, name) in fields {
                if let Some(token) = token {
                    let _ = write!(out, " {name}={:?}", token.word);
                }
            }
            if !n.args.is_empty() {
                let args: Vec<String> = n.args.iter().map(|a| format!("{:?}", a.word)).collect();
                let _ = write!(out, " args=[{}]", args.join(", "));
            }

            if !multi_line {
                return;
            }
            out.push('\n');
            if let Some(child) = n.first_child {
                self.dump_inner(child, &format!("{indent}  "), multi_line, out);
            }
            next = n.next_sibling;
        }
    }

    /// Render a single node, used in log and error messages.
    #[must_use]
    pub fn describe(&self, id: NodeId) -> String {
        self.dump(id, false)
    }
}
