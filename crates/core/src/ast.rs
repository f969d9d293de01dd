//! Parsed template representation.
//!
//! Nodes are produced once per template source and may be rendered any
//! number of times against different data; they never carry evaluation
//! state.

use std::fmt;

use crate::value::Value;

// ──────────────────────────────────────────────
// Template and nodes
// ──────────────────────────────────────────────

/// A parsed template: the top-level node sequence.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Template {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Passthrough text.
    Literal(String),
    /// `{{path}}`
    Placeholder { path: PathExpr, offset: usize },
    /// `{{helper arg arg}}` -- renders the helper's result.
    Helper(InlineCall),
    /// `{{#kind args}} body {{else}} inverse {{/kind}}`
    Block(BlockNode),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockNode {
    pub kind: BlockKind,
    pub args: Vec<Arg>,
    pub body: Vec<Node>,
    /// Empty unless the block has an `{{else}}` section.
    pub inverse: Vec<Node>,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InlineCall {
    pub helper: InlineHelper,
    pub args: Vec<Arg>,
    pub offset: usize,
}

/// A helper or block argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Path(PathExpr),
    Literal(Value),
    /// `(helper args...)`
    SubExpr(InlineCall),
}

// ──────────────────────────────────────────────
// Directive names
// ──────────────────────────────────────────────

/// Block helpers. The set is closed: any other name after `#` is a
/// parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BlockKind {
    If,
    With,
    Each,
    Any,
    Or,
    And,
}

impl BlockKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "if" => Some(BlockKind::If),
            "with" => Some(BlockKind::With),
            "each" => Some(BlockKind::Each),
            "any" => Some(BlockKind::Any),
            "or" => Some(BlockKind::Or),
            "and" => Some(BlockKind::And),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BlockKind::If => "if",
            BlockKind::With => "with",
            BlockKind::Each => "each",
            BlockKind::Any => "any",
            BlockKind::Or => "or",
            BlockKind::And => "and",
        }
    }

    /// `with` and `each` push a new scope for their body; the boolean
    /// helpers render their body in the enclosing scope.
    pub fn opens_scope(self) -> bool {
        matches!(self, BlockKind::With | BlockKind::Each)
    }

    /// Whether the block takes a variable number of arguments (at least one).
    pub fn is_variadic(self) -> bool {
        matches!(self, BlockKind::Or | BlockKind::And)
    }
}

/// Inline (value-producing) helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InlineHelper {
    Eq,
    IsIn,
    AddDays,
    Lookup,
}

impl InlineHelper {
    pub const ALL: [InlineHelper; 4] = [
        InlineHelper::Eq,
        InlineHelper::IsIn,
        InlineHelper::AddDays,
        InlineHelper::Lookup,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "eq" => Some(InlineHelper::Eq),
            "is_in" => Some(InlineHelper::IsIn),
            "addDays" => Some(InlineHelper::AddDays),
            "lookup" => Some(InlineHelper::Lookup),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            InlineHelper::Eq => "eq",
            InlineHelper::IsIn => "is_in",
            InlineHelper::AddDays => "addDays",
            InlineHelper::Lookup => "lookup",
        }
    }

    pub fn arity(self) -> usize {
        2
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for InlineHelper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ──────────────────────────────────────────────
// Paths
// ──────────────────────────────────────────────

/// A data reference such as `general.date`, `../name`, `@root.officers`
/// or `@index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpr {
    /// Number of leading `../` segments.
    pub parents: usize,
    pub root: PathRoot,
    /// Dot-separated segments after the root. Integer-looking segments
    /// index lists; every segment keys maps.
    pub segments: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathRoot {
    /// The current scope (`this`, `.`, or an ordinary path).
    Scope,
    /// `@root`: the data context itself.
    Root,
    /// A loop binding such as `@index`.
    Binding(LoopBinding),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopBinding {
    /// `@index` -- 0-based
    Index,
    /// `@index_1` -- 1-based
    IndexOne,
    First,
    Last,
}

impl LoopBinding {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "index" => Some(LoopBinding::Index),
            "index_1" => Some(LoopBinding::IndexOne),
            "first" => Some(LoopBinding::First),
            "last" => Some(LoopBinding::Last),
            _ => None,
        }
    }
}

impl PathExpr {
    /// A path into the current scope.
    pub fn scope<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PathExpr {
            parents: 0,
            root: PathRoot::Scope,
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }
}
