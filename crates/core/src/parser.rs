//! Template parser: token stream to [`Template`].
//!
//! Block structure is parsed by recursive descent. Every block-opening tag
//! must name a known block helper, every close tag must match the innermost
//! open block, and argument counts are checked here so that a malformed
//! template is rejected before it is ever rendered.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::ast::{
    Arg, BlockKind, BlockNode, InlineCall, InlineHelper, LoopBinding, Node, PathExpr, PathRoot,
    Template,
};
use crate::error::ParseError;
use crate::lexer::{lex, Spanned, Token};
use crate::value::Value;

/// Parse template source into a reusable [`Template`].
pub fn parse(src: &str) -> Result<Template, ParseError> {
    let tokens = lex(src)?;
    let mut parser = Parser::new(&tokens, src);
    let (nodes, end) = parser.parse_nodes()?;
    match end {
        Terminator::Eof => Ok(Template { nodes }),
        Terminator::Else { offset, .. } => Err(parser.err_at(offset, "'else' outside of a block")),
        Terminator::Close { name, offset } => Err(parser.err_at(
            offset,
            format!("closing tag '{{{{/{}}}}}' has no open block", name),
        )),
    }
}

// ──────────────────────────────────────────────
// Parser
// ──────────────────────────────────────────────

/// What ended a node sequence.
enum Terminator {
    Eof,
    /// `{{else}}`, or `{{else if cond}}` style chains carrying the chained
    /// block's kind, arguments and offset.
    Else {
        chain: Option<(BlockKind, Vec<Arg>, usize)>,
        offset: usize,
    },
    Close {
        name: String,
        offset: usize,
    },
}

/// Deepest allowed nesting of blocks (each `else if` counts as one level)
/// and of subexpressions. Keeps parse and render recursion bounded.
pub const MAX_NESTING: usize = 256;

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    src: &'a str,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Spanned], src: &'a str) -> Self {
        Parser {
            tokens,
            pos: 0,
            src,
            depth: 0,
        }
    }

    fn cur(&self) -> &'a Spanned {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &'a Token {
        &self.cur().token
    }

    fn cur_offset(&self) -> usize {
        self.cur().offset
    }

    fn advance(&mut self) -> &'a Spanned {
        let t = self.cur();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    fn enter(&mut self, offset: usize, what: &str) -> Result<(), ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(self.err_at(offset, format!("{} nested too deeply", what)));
        }
        self.depth += 1;
        Ok(())
    }

    fn err(&self, msg: impl Into<String>) -> ParseError {
        self.err_at(self.cur_offset(), msg)
    }

    fn err_at(&self, offset: usize, msg: impl Into<String>) -> ParseError {
        ParseError::at(self.src, offset, msg)
    }

    fn take_word(&mut self) -> Result<&'a str, ParseError> {
        if let Token::Word(w) = self.peek() {
            self.advance();
            Ok(w)
        } else {
            Err(self.err(format!("expected name, got {}", describe(self.peek()))))
        }
    }

    fn expect_close(&mut self) -> Result<(), ParseError> {
        if self.peek() == &Token::Close {
            self.advance();
            Ok(())
        } else {
            Err(self.err(format!("expected '}}}}', got {}", describe(self.peek()))))
        }
    }

    // -- Node sequences -----------------------------------------

    fn parse_nodes(&mut self) -> Result<(Vec<Node>, Terminator), ParseError> {
        let mut nodes = Vec::new();
        loop {
            let offset = self.cur_offset();
            match self.peek() {
                Token::Eof => return Ok((nodes, Terminator::Eof)),
                Token::Text(t) => {
                    nodes.push(Node::Literal(t.clone()));
                    self.advance();
                }
                Token::Open => {
                    self.advance();
                    match self.peek() {
                        Token::Hash => {
                            self.advance();
                            let (kind, args) = self.parse_block_open(offset)?;
                            let block = self.parse_block(kind, args, offset, kind)?;
                            nodes.push(block);
                        }
                        Token::Slash => {
                            self.advance();
                            let name = self.take_word()?.to_owned();
                            self.expect_close()?;
                            return Ok((nodes, Terminator::Close { name, offset }));
                        }
                        Token::Word(w) if w == "else" => {
                            self.advance();
                            if self.peek() == &Token::Close {
                                self.advance();
                                return Ok((nodes, Terminator::Else { chain: None, offset }));
                            }
                            let (kind, args) = self.parse_block_open(offset)?;
                            return Ok((
                                nodes,
                                Terminator::Else {
                                    chain: Some((kind, args, offset)),
                                    offset,
                                },
                            ));
                        }
                        _ => nodes.push(self.parse_expression(offset)?),
                    }
                }
                other => return Err(self.err(format!("unexpected {}", describe(other)))),
            }
        }
    }

    /// Parses `name args }}` after `{{#` (or after `{{else`).
    fn parse_block_open(&mut self, offset: usize) -> Result<(BlockKind, Vec<Arg>), ParseError> {
        let name = self.take_word()?;
        let kind = BlockKind::from_name(name).ok_or_else(|| {
            self.err_at(offset, format!("unknown block helper '{}'", name))
        })?;
        let args = self.parse_args()?;
        self.expect_close()?;

        let arity_ok = if kind.is_variadic() {
            !args.is_empty()
        } else {
            args.len() == 1
        };
        if !arity_ok {
            let expected = if kind.is_variadic() {
                "at least 1 argument"
            } else {
                "1 argument"
            };
            return Err(self.err_at(
                offset,
                format!("'#{}' expects {}, got {}", kind, expected, args.len()),
            ));
        }
        Ok((kind, args))
    }

    /// Parses a block body (and optional inverse) up to the close tag for
    /// `close_as`. Chained `{{else if}}` blocks share their parent's close tag.
    fn parse_block(
        &mut self,
        kind: BlockKind,
        args: Vec<Arg>,
        offset: usize,
        close_as: BlockKind,
    ) -> Result<Node, ParseError> {
        self.enter(offset, "blocks")?;
        let node = self.parse_block_body(kind, args, offset, close_as);
        self.depth -= 1;
        node
    }

    fn parse_block_body(
        &mut self,
        kind: BlockKind,
        args: Vec<Arg>,
        offset: usize,
        close_as: BlockKind,
    ) -> Result<Node, ParseError> {
        let (body, end) = self.parse_nodes()?;
        let (inverse, end) = match end {
            Terminator::Else {
                chain: Some((chained_kind, chained_args, chained_offset)),
                ..
            } => {
                let chained =
                    self.parse_block(chained_kind, chained_args, chained_offset, close_as)?;
                return Ok(Node::Block(BlockNode {
                    kind,
                    args,
                    body,
                    inverse: vec![chained],
                    offset,
                }));
            }
            Terminator::Else { chain: None, .. } => self.parse_nodes()?,
            other => (Vec::new(), other),
        };

        match end {
            Terminator::Close { name, .. } if name == close_as.name() => {
                Ok(Node::Block(BlockNode {
                    kind,
                    args,
                    body,
                    inverse,
                    offset,
                }))
            }
            Terminator::Close { name, offset: at } => Err(self.err_at(
                at,
                format!(
                    "mismatched closing tag: expected '{{{{/{}}}}}', found '{{{{/{}}}}}'",
                    close_as, name
                ),
            )),
            Terminator::Else { offset: at, .. } => {
                Err(self.err_at(at, format!("duplicate 'else' in '#{}' block", close_as)))
            }
            Terminator::Eof => Err(self.err_at(
                offset,
                format!("unterminated '{{{{#{}}}}}' block", close_as),
            )),
        }
    }

    // -- Expressions --------------------------------------------

    /// Parses the inside of a plain `{{ ... }}` tag: a path or an inline
    /// helper call.
    fn parse_expression(&mut self, offset: usize) -> Result<Node, ParseError> {
        let word = match self.peek() {
            Token::Word(w) => w,
            Token::Close => return Err(self.err_at(offset, "empty directive")),
            other => {
                return Err(self.err(format!(
                    "expected path or helper name, got {}",
                    describe(other)
                )))
            }
        };
        let word_offset = self.cur_offset();
        self.advance();

        if let Some(helper) = InlineHelper::from_name(word) {
            let call = self.parse_call(helper, offset)?;
            self.expect_close()?;
            return Ok(Node::Helper(call));
        }

        let path = self.parse_path(word, word_offset)?;
        if self.peek() != &Token::Close {
            return Err(self.err_at(offset, format!("unknown helper '{}'", word)));
        }
        self.advance();
        Ok(Node::Placeholder { path, offset })
    }

    fn parse_call(&mut self, helper: InlineHelper, offset: usize) -> Result<InlineCall, ParseError> {
        let args = self.parse_args()?;
        if args.len() != helper.arity() {
            return Err(self.err_at(
                offset,
                format!(
                    "helper '{}' expects {} arguments, got {}",
                    helper,
                    helper.arity(),
                    args.len()
                ),
            ));
        }
        Ok(InlineCall {
            helper,
            args,
            offset,
        })
    }

    fn parse_args(&mut self) -> Result<Vec<Arg>, ParseError> {
        let mut args = Vec::new();
        while !matches!(self.peek(), Token::Close | Token::RParen | Token::Eof) {
            args.push(self.parse_arg()?);
        }
        Ok(args)
    }

    fn parse_arg(&mut self) -> Result<Arg, ParseError> {
        let offset = self.cur_offset();
        match self.peek() {
            Token::Word(w) => {
                self.advance();
                match w.as_str() {
                    "true" => Ok(Arg::Literal(Value::Bool(true))),
                    "false" => Ok(Arg::Literal(Value::Bool(false))),
                    "null" => Ok(Arg::Literal(Value::Null)),
                    _ => Ok(Arg::Path(self.parse_path(w, offset)?)),
                }
            }
            Token::Str(s) => {
                self.advance();
                Ok(Arg::Literal(Value::String(s.clone())))
            }
            Token::Number(n) => {
                self.advance();
                let d = Decimal::from_str(n)
                    .map_err(|_| self.err_at(offset, format!("invalid number '{}'", n)))?;
                Ok(Arg::Literal(Value::Number(d)))
            }
            Token::LParen => {
                self.advance();
                let name = self.take_word()?;
                let helper = InlineHelper::from_name(name)
                    .ok_or_else(|| self.err_at(offset, format!("unknown helper '{}'", name)))?;
                self.enter(offset, "subexpressions")?;
                let call = self.parse_call(helper, offset)?;
                self.depth -= 1;
                if self.peek() != &Token::RParen {
                    return Err(self.err(format!("expected ')', got {}", describe(self.peek()))));
                }
                self.advance();
                Ok(Arg::SubExpr(call))
            }
            other => Err(self.err(format!("unexpected {} in arguments", describe(other)))),
        }
    }

    /// Parses `this`, `.`, `../x`, `@root.x`, `@index`, `a.0.b` and friends.
    fn parse_path(&self, word: &str, offset: usize) -> Result<PathExpr, ParseError> {
        let malformed = || self.err_at(offset, format!("malformed path '{}'", word));

        let mut rest = word;
        let mut parents = 0usize;
        loop {
            if let Some(r) = rest.strip_prefix("../") {
                parents += 1;
                rest = r;
            } else if rest == ".." {
                parents += 1;
                rest = "";
            } else {
                break;
            }
        }
        if let Some(r) = rest.strip_prefix("./") {
            rest = r;
        }

        let mut root = PathRoot::Scope;
        if rest == "." || rest == "this" {
            rest = "";
        } else if let Some(r) = rest.strip_prefix("this.") {
            rest = r;
        } else if let Some(r) = rest.strip_prefix('@') {
            let (head, tail) = r.split_once('.').unwrap_or((r, ""));
            if head == "root" {
                if parents > 0 {
                    return Err(self.err_at(offset, "'@root' cannot follow '../'"));
                }
                if r.contains('.') && tail.is_empty() {
                    return Err(malformed());
                }
                root = PathRoot::Root;
                rest = tail;
            } else if let Some(binding) = LoopBinding::from_name(head) {
                if r.contains('.') {
                    return Err(self.err_at(offset, format!("loop binding '@{}' has no fields", head)));
                }
                return Ok(PathExpr {
                    parents,
                    root: PathRoot::Binding(binding),
                    segments: Vec::new(),
                });
            } else {
                return Err(self.err_at(offset, format!("unknown binding '@{}'", head)));
            }
        }

        let mut segments = Vec::new();
        if !rest.is_empty() {
            for segment in rest.split('.') {
                if segment.is_empty() || segment.contains('/') || segment.contains('@') {
                    return Err(malformed());
                }
                segments.push(segment.to_owned());
            }
        }
        Ok(PathExpr {
            parents,
            root,
            segments,
        })
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Text(_) => "text".to_owned(),
        Token::Open => "'{{'".to_owned(),
        Token::Close => "'}}'".to_owned(),
        Token::Hash => "'#'".to_owned(),
        Token::Slash => "'/'".to_owned(),
        Token::Word(w) => format!("'{}'", w),
        Token::Str(s) => format!("string \"{}\"", s),
        Token::Number(n) => format!("number {}", n),
        Token::LParen => "'('".to_owned(),
        Token::RParen => "')'".to_owned(),
        Token::Eof => "end of template".to_owned(),
    }
}
