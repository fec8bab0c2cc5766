// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nbtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Nbtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Cell source decomposition into a statement/token tree.
//!
//! Editor integrations with a real parser can build [`SyntaxNode`] trees themselves; the
//! built-in [`parse_code`] is a line-oriented splitter for Python-like cells that is good
//! enough to give every statement and token its own lineage.

use smol_str::SmolStr;

use crate::model::Pos;

/// One node of a parsed cell, before it is versioned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    pub kind: SmolStr,
    pub start: Pos,
    pub end: Pos,
    pub literal: Option<String>,
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    pub fn branch(kind: impl Into<SmolStr>, start: Pos, end: Pos, children: Vec<SyntaxNode>) -> Self {
        Self { kind: kind.into(), start, end, literal: None, children }
    }

    pub fn leaf(kind: impl Into<SmolStr>, start: Pos, end: Pos, literal: impl Into<String>) -> Self {
        Self { kind: kind.into(), start, end, literal: Some(literal.into()), children: Vec::new() }
    }
}

const KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

// Keywords that continue the compound statement above them instead of starting a new one.
const CONTINUATION_KEYWORDS: &[&str] = &["elif", "else", "except", "finally"];

const ASSIGN_OPS: &[&str] = &[
    "=", "+=", "-=", "*=", "/=", "//=", "%=", "**=", "&=", "|=", "^=", ">>=", "<<=", "@=",
];

const MULTI_CHAR_OPS: &[&str] = &[
    "**=", "//=", ">>=", "<<=", "...", "->", ":=", "==", "!=", "<=", ">=", "+=", "-=", "*=", "/=",
    "%=", "&=", "|=", "^=", "@=", "**", "//", "<<", ">>",
];

#[derive(Debug, Clone)]
struct Token {
    kind: &'static str,
    text: String,
    start: Pos,
    end: Pos,
    continued: bool,
}

/// Parse cell source into a `Module` node whose children are statements and whose
/// grandchildren are tokens.
pub fn parse_code(source: &str) -> SyntaxNode {
    let tokens = Scanner::new(source).scan();
    let end = end_of(source);

    let mut statements = Vec::new();
    let mut current: Vec<Token> = Vec::new();
    let mut depth = 0usize;
    let mut last_line = None;

    for token in tokens {
        let first_on_line = last_line != Some(token.start.line);
        let starts_statement = first_on_line
            && depth == 0
            && !token.continued
            && token.start.ch == 0
            && !CONTINUATION_KEYWORDS.contains(&token.text.as_str());

        if starts_statement && !current.is_empty() {
            statements.push(statement(std::mem::take(&mut current)));
        }

        match token.text.as_str() {
            "(" | "[" | "{" if token.kind == "op" => depth += 1,
            ")" | "]" | "}" if token.kind == "op" => depth = depth.saturating_sub(1),
            _ => {}
        }
        last_line = Some(token.end.line);
        current.push(token);
    }
    if !current.is_empty() {
        statements.push(statement(current));
    }

    SyntaxNode::branch("Module", Pos::default(), end, statements)
}

fn statement(tokens: Vec<Token>) -> SyntaxNode {
    let kind = statement_kind(&tokens);
    let start = tokens.first().map(|t| t.start).unwrap_or_default();
    let end = tokens.last().map(|t| t.end).unwrap_or_default();
    let children = tokens
        .into_iter()
        .map(|token| SyntaxNode::leaf(token.kind, token.start, token.end, token.text))
        .collect();
    SyntaxNode::branch(kind, start, end, children)
}

fn statement_kind(tokens: &[Token]) -> &'static str {
    let Some(first) = tokens.first() else {
        return "Expr";
    };
    let lead = match (first.text.as_str(), tokens.get(1)) {
        ("async", Some(next)) => next.text.as_str(),
        (text, _) => text,
    };

    match (first.kind, lead) {
        ("comment", _) => "Comment",
        (_, "def") => "FunctionDef",
        (_, "class") => "ClassDef",
        (_, "import" | "from") => "Import",
        (_, "if") => "If",
        (_, "for") => "For",
        (_, "while") => "While",
        (_, "with") => "With",
        (_, "try") => "Try",
        (_, "return") => "Return",
        (_, "@") => "Decorator",
        _ => {
            let mut depth = 0usize;
            for token in tokens.iter().filter(|t| t.kind == "op") {
                match token.text.as_str() {
                    "(" | "[" | "{" => depth += 1,
                    ")" | "]" | "}" => depth = depth.saturating_sub(1),
                    op if depth == 0 && ASSIGN_OPS.contains(&op) => return "Assign",
                    _ => {}
                }
            }
            "Expr"
        }
    }
}

fn end_of(source: &str) -> Pos {
    let mut line = 0u32;
    let mut last_start = 0usize;
    for idx in memchr::memchr_iter(b'\n', source.as_bytes()) {
        line += 1;
        last_start = idx + 1;
    }
    Pos::new(line, source[last_start..].chars().count() as u32)
}

/// Slice `source` by a `(line, ch)` span. `None` if the span falls outside the text.
pub fn slice(source: &str, start: Pos, end: Pos) -> Option<&str> {
    let from = byte_offset(source, start)?;
    let to = byte_offset(source, end)?;
    source.get(from..to.max(from))
}

fn byte_offset(source: &str, pos: Pos) -> Option<usize> {
    let line_start = if pos.line == 0 {
        0
    } else {
        memchr::memchr_iter(b'\n', source.as_bytes()).nth(pos.line as usize - 1)? + 1
    };
    let rest = &source[line_start..];
    let line_len = memchr::memchr(b'\n', rest.as_bytes()).unwrap_or(rest.len());
    let line = &rest[..line_len];

    if pos.ch as usize == line.chars().count() {
        return Some(line_start + line_len);
    }
    line.char_indices().nth(pos.ch as usize).map(|(offset, _)| line_start + offset)
}

struct Scanner<'a> {
    chars: Vec<char>,
    source: &'a str,
    idx: usize,
    line: u32,
    ch: u32,
    continued: bool,
    tokens: Vec<Token>,
}

impl<'a> Scanner<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().collect(),
            source,
            idx: 0,
            line: 0,
            ch: 0,
            continued: false,
            tokens: Vec::new(),
        }
    }

    fn pos(&self) -> Pos {
        Pos::new(self.line, self.ch)
    }

    fn peek(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.idx + ahead).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek(0)?;
        self.idx += 1;
        if c == '\n' {
            self.line += 1;
            self.ch = 0;
        } else {
            self.ch += 1;
        }
        Some(c)
    }

    fn scan(mut self) -> Vec<Token> {
        debug_assert_eq!(self.chars.len(), self.source.chars().count());
        while let Some(c) = self.peek(0) {
            match c {
                '\n' => {
                    self.bump();
                    self.continued = false;
                }
                '\\' if matches!(self.peek(1), Some('\n')) => {
                    self.bump();
                    self.bump();
                    self.continued = true;
                }
                c if c.is_whitespace() => {
                    self.bump();
                }
                '#' => self.comment(),
                '"' | '\'' => self.string(),
                c if c.is_ascii_digit() => self.number(),
                '.' if self.peek(1).is_some_and(|n| n.is_ascii_digit()) => self.number(),
                c if c == '_' || c.is_alphabetic() => self.word(),
                _ => self.op(),
            }
        }
        self.tokens
    }

    fn push(&mut self, kind: &'static str, start: Pos, text: String) {
        let continued = self.continued && self.tokens.last().map_or(true, |t| t.end.line != start.line);
        self.tokens.push(Token { kind, text, start, end: self.pos(), continued });
    }

    fn take_while(&mut self, mut keep: impl FnMut(char) -> bool) -> String {
        let mut text = String::new();
        while let Some(c) = self.peek(0) {
            if !keep(c) {
                break;
            }
            text.push(c);
            self.bump();
        }
        text
    }

    fn comment(&mut self) {
        let start = self.pos();
        let text = self.take_while(|c| c != '\n');
        self.push("comment", start, text.trim_end().to_owned());
    }

    fn number(&mut self) {
        let start = self.pos();
        let mut prev = ' ';
        let text = self.take_while(|c| {
            let keep = c.is_ascii_alphanumeric()
                || c == '.'
                || c == '_'
                || ((c == '+' || c == '-') && matches!(prev, 'e' | 'E'));
            prev = c;
            keep
        });
        self.push("number", start, text);
    }

    fn word(&mut self) {
        let start = self.pos();
        let text = self.take_while(|c| c == '_' || c.is_alphanumeric());

        let is_prefix = text.len() <= 2
            && text.chars().all(|c| matches!(c.to_ascii_lowercase(), 'r' | 'b' | 'f' | 'u'));
        if is_prefix && matches!(self.peek(0), Some('"' | '\'')) {
            let body = self.string_body();
            self.push("string", start, format!("{text}{body}"));
            return;
        }

        let kind = if KEYWORDS.contains(&text.as_str()) { "keyword" } else { "name" };
        self.push(kind, start, text);
    }

    fn string(&mut self) {
        let start = self.pos();
        let body = self.string_body();
        self.push("string", start, body);
    }

    fn string_body(&mut self) -> String {
        let Some(quote) = self.bump() else {
            return String::new();
        };
        let mut text = String::from(quote);
        let triple = self.peek(0) == Some(quote) && self.peek(1) == Some(quote);
        if triple {
            text.push(quote);
            text.push(quote);
            self.bump();
            self.bump();
        }

        while let Some(c) = self.peek(0) {
            if c == '\n' && !triple {
                break;
            }
            text.push(c);
            self.bump();
            if c == '\\' {
                if let Some(escaped) = self.bump() {
                    text.push(escaped);
                }
                continue;
            }
            if c == quote {
                if !triple {
                    break;
                }
                if self.peek(0) == Some(quote) && self.peek(1) == Some(quote) {
                    text.push(quote);
                    text.push(quote);
                    self.bump();
                    self.bump();
                    break;
                }
            }
        }
        text
    }

    fn op(&mut self) {
        let start = self.pos();
        for op in MULTI_CHAR_OPS {
            let matches = op.chars().enumerate().all(|(i, c)| self.peek(i) == Some(c));
            if matches {
                for _ in 0..op.chars().count() {
                    self.bump();
                }
                self.push("op", start, (*op).to_owned());
                return;
            }
        }
        if let Some(c) = self.bump() {
            self.push("op", start, c.to_string());
        }
    }
}
