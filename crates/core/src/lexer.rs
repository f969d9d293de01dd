//! Template lexer.
//!
//! Splits template source into literal text and the token stream of each
//! `{{ ... }}` directive. Comments are dropped here, whitespace-control
//! markers (`~`) are applied here, and `\{{` is unescaped here, so the
//! parser only ever sees text, tags and expression tokens.

use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Literal template text (escapes resolved, whitespace control applied)
    Text(String),
    /// `{{` or `{{{`
    Open,
    /// `}}` or `}}}`
    Close,
    /// `#` opening a block
    Hash,
    /// `/` closing a block
    Slash,
    /// Path, helper name or keyword -- distinguished in the parser
    Word(String),
    /// Quoted string literal (content without quotes, escapes resolved)
    Str(String),
    /// Numeric literal -- kept as text to preserve exact representation
    Number(String),
    LParen,
    RParen,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Spanned {
    pub token: Token,
    /// Byte offset of the token in the template source.
    pub offset: usize,
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    tokens: Vec<Spanned>,
    /// Set by `~}}`: strip leading whitespace from the next text run.
    trim_next: bool,
}

pub fn lex(src: &str) -> Result<Vec<Spanned>, ParseError> {
    let mut lexer = Lexer {
        src,
        pos: 0,
        tokens: Vec::new(),
        trim_next: false,
    };
    lexer.run()?;
    Ok(lexer.tokens)
}

impl<'a> Lexer<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn err(&self, offset: usize, reason: impl Into<String>) -> ParseError {
        ParseError::at(self.src, offset, reason)
    }

    fn push(&mut self, token: Token, offset: usize) {
        self.tokens.push(Spanned { token, offset });
    }

    fn run(&mut self) -> Result<(), ParseError> {
        let mut text = String::new();
        let mut text_start = 0usize;

        while self.pos < self.src.len() {
            let rest = self.rest();
            if rest.starts_with("\\{{") {
                text.push_str("{{");
                self.pos += 3;
                continue;
            }
            if rest.starts_with("{{") {
                self.flush_text(&mut text, text_start);
                self.lex_tag()?;
                text_start = self.pos;
                continue;
            }
            if let Some(c) = self.peek_char() {
                text.push(c);
                self.pos += c.len_utf8();
            }
        }
        self.flush_text(&mut text, text_start);
        self.push(Token::Eof, self.src.len());
        Ok(())
    }

    fn flush_text(&mut self, text: &mut String, start: usize) {
        if text.is_empty() {
            return;
        }
        let mut t = std::mem::take(text);
        if self.trim_next {
            t = t.trim_start().to_owned();
            self.trim_next = false;
        }
        if !t.is_empty() {
            self.push(Token::Text(t), start);
        }
    }

    /// `{{~` strips trailing whitespace from the text run just emitted.
    fn trim_previous_text(&mut self) {
        if let Some(Spanned {
            token: Token::Text(t),
            ..
        }) = self.tokens.last_mut()
        {
            let trimmed = t.trim_end().len();
            t.truncate(trimmed);
            if t.is_empty() {
                self.tokens.pop();
            }
        }
    }

    fn lex_tag(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        self.pos += 2;
        // A following text run is only trimmed by the tag directly before it.
        self.trim_next = false;

        let triple = self.rest().starts_with('{');
        if triple {
            self.pos += 1;
        }
        if self.rest().starts_with('~') {
            self.pos += 1;
            self.trim_previous_text();
        }

        if !triple && self.rest().starts_with('!') {
            return self.lex_comment(start);
        }

        self.push(Token::Open, start);
        self.skip_whitespace();
        match self.peek_char() {
            Some('#') => {
                self.push(Token::Hash, self.pos);
                self.pos += 1;
            }
            Some('/') => {
                self.push(Token::Slash, self.pos);
                self.pos += 1;
            }
            _ => {}
        }

        let close = if triple { "}}}" } else { "}}" };
        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.is_empty() {
                return Err(self.err(start, "unterminated directive"));
            }
            let tok_start = self.pos;

            if rest.starts_with('~') && rest[1..].starts_with(close) {
                self.pos += 1 + close.len();
                self.trim_next = true;
                self.push(Token::Close, tok_start);
                return Ok(());
            }
            if rest.starts_with(close) {
                self.pos += close.len();
                self.push(Token::Close, tok_start);
                return Ok(());
            }
            if rest.starts_with('}') {
                return Err(self.err(tok_start, format!("expected '{}'", close)));
            }

            let c = rest.chars().next().unwrap_or_default();
            match c {
                '(' => {
                    self.push(Token::LParen, tok_start);
                    self.pos += 1;
                }
                ')' => {
                    self.push(Token::RParen, tok_start);
                    self.pos += 1;
                }
                '"' | '\'' => {
                    let s = self.lex_string(c)?;
                    self.push(Token::Str(s), tok_start);
                }
                _ => {
                    let word = self.take_word();
                    if is_number(&word) {
                        self.push(Token::Number(word), tok_start);
                    } else {
                        self.push(Token::Word(word), tok_start);
                    }
                }
            }
        }
    }

    fn lex_comment(&mut self, start: usize) -> Result<(), ParseError> {
        let body_start = self.pos;
        let long = self.rest().starts_with("!--");
        let terminator = if long { "--" } else { "" };

        let mut search = body_start;
        loop {
            let Some(found) = self.src[search..].find("}}") else {
                return Err(self.err(start, "unterminated comment"));
            };
            let close_at = search + found;
            let mut body_end = close_at;
            let trim = self.src[..body_end].ends_with('~') && body_end > body_start + 1;
            if trim {
                body_end -= 1;
            }
            let body = &self.src[body_start..body_end];
            if !long || (body.len() >= 5 && body.ends_with(terminator)) {
                self.pos = close_at + 2;
                self.trim_next = trim;
                return Ok(());
            }
            search = close_at + 2;
        }
    }

    fn lex_string(&mut self, quote: char) -> Result<String, ParseError> {
        let start = self.pos;
        self.pos += 1;
        let mut s = String::new();
        loop {
            let Some(c) = self.peek_char() else {
                return Err(self.err(start, "unterminated string literal"));
            };
            self.pos += c.len_utf8();
            if c == quote {
                return Ok(s);
            }
            if c == '\\' {
                let Some(esc) = self.peek_char() else {
                    return Err(self.err(start, "unterminated string literal"));
                };
                self.pos += esc.len_utf8();
                match esc {
                    'n' => s.push('\n'),
                    't' => s.push('\t'),
                    '\\' | '"' | '\'' => s.push(esc),
                    other => {
                        s.push('\\');
                        s.push(other);
                    }
                }
                continue;
            }
            s.push(c);
        }
    }

    fn take_word(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() || matches!(c, '(' | ')' | '"' | '\'' | '}') {
                break;
            }
            if c == '~' && self.rest()[1..].starts_with('}') {
                break;
            }
            self.pos += c.len_utf8();
        }
        self.src[start..self.pos].to_owned()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }
}

/// `-?digits(.digits)?`
fn is_number(word: &str) -> bool {
    let digits = word.strip_prefix('-').unwrap_or(word);
    let (int, frac) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    all_digits(int) && frac.map_or(true, all_digits)
}
