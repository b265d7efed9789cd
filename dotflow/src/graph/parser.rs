//! DOT subset parser
//!
//! A hand-written lexer and recursive-descent parser for the slice of
//! DOT that pipeline definitions use: one `digraph` with attribute
//! statements (`goal="..."`), node statements (`id [k=v, ...]`), and
//! edge chains (`a -> b -> c [k=v]`). Subgraphs and undirected edges are
//! rejected as unsupported document shapes. The parser yields raw string
//! attributes; typed decoding happens in [`super::value`].

use crate::error::PipelineError;

pub(crate) type RawAttrs = Vec<(String, String)>;

/// Raw statements extracted from a DOT document.
#[derive(Debug, Default)]
pub(crate) struct ParsedDocument {
    pub graph_attrs: RawAttrs,
    pub nodes: Vec<(String, RawAttrs)>,
    pub edges: Vec<(String, String, RawAttrs)>,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Quoted(String),
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Equals,
    Semi,
    Comma,
    Arrow,
    UndirectedEdge,
}

#[derive(Debug)]
struct Spanned {
    token: Token,
    line: usize,
}

fn lex(text: &str) -> Result<Vec<Spanned>, PipelineError> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    let mut line = 1usize;

    while let Some(&c) = chars.peek() {
        match c {
            '\n' => {
                line += 1;
                chars.next();
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            '#' => {
                while let Some(&c) = chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '/' => {
                chars.next();
                match chars.peek() {
                    Some('/') => {
                        while let Some(&c) = chars.peek() {
                            if c == '\n' {
                                break;
                            }
                            chars.next();
                        }
                    }
                    Some('*') => {
                        chars.next();
                        let mut closed = false;
                        while let Some(c) = chars.next() {
                            if c == '\n' {
                                line += 1;
                            } else if c == '*' && chars.peek() == Some(&'/') {
                                chars.next();
                                closed = true;
                                break;
                            }
                        }
                        if !closed {
                            return Err(PipelineError::syntax(line, "unterminated block comment"));
                        }
                    }
                    _ => return Err(PipelineError::syntax(line, "unexpected character '/'")),
                }
            }
            '"' => {
                chars.next();
                let mut value = String::new();
                let mut closed = false;
                while let Some(c) = chars.next() {
                    match c {
                        '"' => {
                            closed = true;
                            break;
                        }
                        '\\' => match chars.next() {
                            Some('"') => value.push('"'),
                            Some('\\') => value.push('\\'),
                            Some('n') => value.push('\n'),
                            Some(other) => {
                                value.push('\\');
                                value.push(other);
                            }
                            None => break,
                        },
                        '\n' => {
                            line += 1;
                            value.push('\n');
                        }
                        other => value.push(other),
                    }
                }
                if !closed {
                    return Err(PipelineError::syntax(line, "unterminated string literal"));
                }
                tokens.push(Spanned {
                    token: Token::Quoted(value),
                    line,
                });
            }
            '-' => {
                chars.next();
                match chars.peek() {
                    Some('>') => {
                        chars.next();
                        tokens.push(Spanned {
                            token: Token::Arrow,
                            line,
                        });
                    }
                    Some('-') => {
                        chars.next();
                        tokens.push(Spanned {
                            token: Token::UndirectedEdge,
                            line,
                        });
                    }
                    Some(&d) if d.is_ascii_digit() || d == '.' => {
                        let mut word = String::from("-");
                        while let Some(&c) = chars.peek() {
                            if c.is_alphanumeric() || c == '_' || c == '.' {
                                word.push(c);
                                chars.next();
                            } else {
                                break;
                            }
                        }
                        tokens.push(Spanned {
                            token: Token::Word(word),
                            line,
                        });
                    }
                    _ => return Err(PipelineError::syntax(line, "unexpected character '-'")),
                }
            }
            '{' | '}' | '[' | ']' | '=' | ';' | ',' => {
                chars.next();
                let token = match c {
                    '{' => Token::LBrace,
                    '}' => Token::RBrace,
                    '[' => Token::LBracket,
                    ']' => Token::RBracket,
                    '=' => Token::Equals,
                    ';' => Token::Semi,
                    _ => Token::Comma,
                };
                tokens.push(Spanned { token, line });
            }
            c if c.is_alphanumeric() || c == '_' || c == '.' => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' || c == '.' {
                        word.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Spanned {
                    token: Token::Word(word),
                    line,
                });
            }
            other => {
                return Err(PipelineError::syntax(
                    line,
                    format!("unexpected character '{}'", other),
                ));
            }
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos.min(self.tokens.len().saturating_sub(1)))
            .map(|s| s.line)
            .unwrap_or(1)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos).map(|s| &s.token);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Next token as an identifier-like string (bare word or quoted)
    fn take_name(&mut self) -> Option<String> {
        match self.peek() {
            Some(Token::Word(w)) => {
                let name = w.clone();
                self.pos += 1;
                Some(name)
            }
            Some(Token::Quoted(q)) => {
                let name = q.clone();
                self.pos += 1;
                Some(name)
            }
            _ => None,
        }
    }

    fn expect_name(&mut self, what: &str) -> Result<String, PipelineError> {
        let line = self.line();
        self.take_name()
            .ok_or_else(|| PipelineError::syntax(line, format!("expected {}", what)))
    }

    /// Parse zero or more `[k=v, ...]` blocks, merging them in order
    fn attr_blocks(&mut self) -> Result<RawAttrs, PipelineError> {
        let mut attrs = Vec::new();
        while self.eat(&Token::LBracket) {
            loop {
                if self.eat(&Token::RBracket) {
                    break;
                }
                if self.eat(&Token::Comma) || self.eat(&Token::Semi) {
                    continue;
                }
                let key = self.expect_name("attribute name")?;
                let line = self.line();
                if !self.eat(&Token::Equals) {
                    return Err(PipelineError::syntax(
                        line,
                        format!("expected '=' after attribute '{}'", key),
                    ));
                }
                let value = self.expect_name("attribute value")?;
                attrs.push((key, value));
            }
        }
        Ok(attrs)
    }
}

/// Parse a DOT document into raw statements.
pub(crate) fn parse_document(text: &str) -> Result<ParsedDocument, PipelineError> {
    let tokens = lex(text)?;
    let mut parser = Parser { tokens, pos: 0 };

    if parser.peek().is_none() {
        return Err(PipelineError::EmptyDocument);
    }
    if let Some(Token::Word(w)) = parser.peek() {
        if w.eq_ignore_ascii_case("strict") {
            parser.advance();
        }
    }
    match parser.advance() {
        Some(Token::Word(w)) if w.eq_ignore_ascii_case("digraph") => {}
        Some(Token::Word(w)) if w.eq_ignore_ascii_case("graph") => {
            return Err(PipelineError::NotDirected);
        }
        _ => return Err(PipelineError::EmptyDocument),
    }
    // optional graph name
    if matches!(parser.peek(), Some(Token::Word(_)) | Some(Token::Quoted(_))) {
        let _ = parser.take_name();
    }
    let line = parser.line();
    if !parser.eat(&Token::LBrace) {
        return Err(PipelineError::syntax(line, "expected '{'"));
    }

    let mut doc = ParsedDocument::default();
    loop {
        let line = parser.line();
        match parser.peek() {
            None => return Err(PipelineError::syntax(line, "unexpected end of input")),
            Some(Token::RBrace) => {
                parser.advance();
                break;
            }
            Some(Token::Semi) | Some(Token::Comma) => {
                parser.advance();
            }
            Some(Token::LBrace) => {
                return Err(PipelineError::syntax(line, "subgraphs are not supported"));
            }
            Some(Token::UndirectedEdge) => {
                return Err(PipelineError::syntax(
                    line,
                    "undirected edges are not supported",
                ));
            }
            Some(Token::Word(_)) | Some(Token::Quoted(_)) => {
                let id = parser.expect_name("statement")?;
                if id.eq_ignore_ascii_case("subgraph") {
                    return Err(PipelineError::syntax(line, "subgraphs are not supported"));
                }
                match parser.peek() {
                    Some(Token::Equals) => {
                        parser.advance();
                        let value = parser.expect_name("attribute value")?;
                        doc.graph_attrs.push((id, value));
                    }
                    Some(Token::Arrow) => {
                        let mut chain = vec![id];
                        while parser.eat(&Token::Arrow) {
                            if parser.peek() == Some(&Token::UndirectedEdge) {
                                return Err(PipelineError::syntax(
                                    parser.line(),
                                    "undirected edges are not supported",
                                ));
                            }
                            chain.push(parser.expect_name("edge target")?);
                        }
                        let attrs = parser.attr_blocks()?;
                        for pair in chain.windows(2) {
                            doc.edges
                                .push((pair[0].clone(), pair[1].clone(), attrs.clone()));
                        }
                    }
                    Some(Token::LBracket) => {
                        let attrs = parser.attr_blocks()?;
                        match id.as_str() {
                            // graph-level defaults merge into graph attrs;
                            // node/edge defaults are not interpreted
                            "graph" => doc.graph_attrs.extend(attrs),
                            "node" | "edge" => {}
                            _ => doc.nodes.push((id, attrs)),
                        }
                    }
                    _ if matches!(id.as_str(), "graph" | "node" | "edge") => {}
                    _ => doc.nodes.push((id, Vec::new())),
                }
            }
            Some(other) => {
                return Err(PipelineError::syntax(
                    line,
                    format!("unexpected token {:?}", other),
                ));
            }
        }
    }
    if parser.peek().is_some() {
        return Err(PipelineError::syntax(
            parser.line(),
            "unexpected content after closing '}'",
        ));
    }
    Ok(doc)
}
