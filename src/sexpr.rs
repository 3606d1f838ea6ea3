//! S-expression reader for the WebAssembly text format
//!
//! Parsing is total and resilient: syntax problems become in-tree
//! [`Node::Error`] values carrying the source locus and message, so a
//! caller walking the tree sees every problem at once instead of stopping
//! at the first. The single fatal path is an input that ends in the
//! middle of a list, string, or block comment, where no useful tree
//! exists.

use std::fmt;
use thiserror::Error;

/// A position in the source text, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextLocus {
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for TextLocus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The fatal error for unterminated inputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at {locus}")]
pub struct FatalParseError {
    pub locus: TextLocus,
    pub message: String,
}

/// One node of the S-expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A keyword or `$`-identifier.
    Symbol { name: String, locus: TextLocus },
    /// A quoted string, unescaped to bytes.
    Str { bytes: Vec<u8>, locus: TextLocus },
    /// An unsigned integer literal.
    UInt { value: u64, locus: TextLocus },
    /// A negative integer literal.
    SInt { value: i64, locus: TextLocus },
    /// A float literal.
    Float { value: f64, locus: TextLocus },
    /// A parenthesised list.
    List { children: Vec<Node>, locus: TextLocus },
    /// A parse problem, kept in place of the malformed construct.
    Error { message: String, locus: TextLocus },
}

impl Node {
    pub fn locus(&self) -> TextLocus {
        match self {
            Node::Symbol { locus, .. }
            | Node::Str { locus, .. }
            | Node::UInt { locus, .. }
            | Node::SInt { locus, .. }
            | Node::Float { locus, .. }
            | Node::List { locus, .. }
            | Node::Error { locus, .. } => *locus,
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Node::Symbol { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Node]> {
        match self {
            Node::List { children, .. } => Some(children),
            _ => None,
        }
    }

    /// True if this is a list whose first child is the given symbol.
    pub fn is_list_headed_by(&self, symbol: &str) -> bool {
        self.as_list()
            .and_then(|children| children.first())
            .and_then(Node::as_symbol)
            == Some(symbol)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Node::Error { .. })
    }

    /// True if this node or any descendant is an error node.
    pub fn has_errors(&self) -> bool {
        match self {
            Node::Error { .. } => true,
            Node::List { children, .. } => children.iter().any(Node::has_errors),
            _ => false,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Symbol { name, .. } => write!(f, "{name}"),
            Node::Str { bytes, .. } => write!(f, "{:?}", String::from_utf8_lossy(bytes)),
            Node::UInt { value, .. } => write!(f, "{value}"),
            Node::SInt { value, .. } => write!(f, "{value}"),
            Node::Float { value, .. } => write!(f, "{value}"),
            Node::List { children, .. } => {
                write!(f, "(")?;
                for (index, child) in children.iter().enumerate() {
                    if index > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{child}")?;
                }
                write!(f, ")")
            }
            Node::Error { message, locus } => write!(f, "<error at {locus}: {message}>"),
        }
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
    line: u32,
    column: u32,
}

impl<'a> Reader<'a> {
    fn new(source: &'a str) -> Reader<'a> {
        Reader {
            bytes: source.as_bytes(),
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    fn locus(&self) -> TextLocus {
        TextLocus {
            line: self.line,
            column: self.column,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.offset).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.offset + ahead).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.offset += 1;
        if byte == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(byte)
    }

    fn fatal(&self, message: &str) -> FatalParseError {
        FatalParseError {
            locus: self.locus(),
            message: message.to_string(),
        }
    }

    /// Skip whitespace, line comments, and nested block comments.
    fn skip_trivia(&mut self) -> Result<(), FatalParseError> {
        loop {
            match self.peek() {
                Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n') => {
                    self.advance();
                }
                Some(b';') if self.peek_at(1) == Some(b';') => {
                    while let Some(byte) = self.peek() {
                        if byte == b'\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some(b'(') if self.peek_at(1) == Some(b';') => {
                    let start = self.locus();
                    self.advance();
                    self.advance();
                    let mut depth = 1usize;
                    loop {
                        match (self.peek(), self.peek_at(1)) {
                            (Some(b'('), Some(b';')) => {
                                self.advance();
                                self.advance();
                                depth += 1;
                            }
                            (Some(b';'), Some(b')')) => {
                                self.advance();
                                self.advance();
                                depth -= 1;
                                if depth == 0 {
                                    break;
                                }
                            }
                            (Some(_), _) => {
                                self.advance();
                            }
                            (None, _) => {
                                return Err(FatalParseError {
                                    locus: start,
                                    message: "unterminated block comment".to_string(),
                                });
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn read_string(&mut self) -> Result<Node, FatalParseError> {
        let locus = self.locus();
        self.advance(); // opening quote
        let mut bytes = Vec::new();
        loop {
            match self.advance() {
                None => return Err(self.fatal("unterminated string")),
                Some(b'"') => return Ok(Node::Str { bytes, locus }),
                Some(b'\\') => {
                    let escape_locus = self.locus();
                    match self.advance() {
                        None => return Err(self.fatal("unterminated string")),
                        Some(b'n') => bytes.push(b'\n'),
                        Some(b't') => bytes.push(b'\t'),
                        Some(b'r') => bytes.push(b'\r'),
                        Some(b'\\') => bytes.push(b'\\'),
                        Some(b'"') => bytes.push(b'"'),
                        Some(b'\'') => bytes.push(b'\''),
                        Some(first) => {
                            // Two-hexit byte escape.
                            let second = self.peek();
                            match (hexit(first), second.and_then(hexit)) {
                                (Some(high), Some(low)) => {
                                    self.advance();
                                    bytes.push(high << 4 | low);
                                }
                                _ => {
                                    // Consume the rest of the string so
                                    // parsing resumes after it, then
                                    // report the bad escape in place.
                                    loop {
                                        match self.advance() {
                                            None => return Err(self.fatal("unterminated string")),
                                            Some(b'"') => break,
                                            Some(b'\\') => {
                                                self.advance();
                                            }
                                            Some(_) => {}
                                        }
                                    }
                                    return Ok(Node::Error {
                                        message: format!("invalid escape '\\{}'", first as char),
                                        locus: escape_locus,
                                    });
                                }
                            }
                        }
                    }
                }
                Some(byte) => bytes.push(byte),
            }
        }
    }

    fn read_token(&mut self) -> String {
        let mut token = String::new();
        while let Some(byte) = self.peek() {
            if is_token_end(byte) {
                break;
            }
            token.push(byte as char);
            self.advance();
        }
        token
    }

    fn read_number_or_symbol(&mut self) -> Node {
        let locus = self.locus();
        let token = self.read_token();
        if token.is_empty() {
            // A lone token-terminating character (a stray ';'): consume
            // it so parsing makes progress.
            let byte = self.advance().unwrap_or(b'?');
            return Node::Error {
                message: format!("unexpected character '{}'", byte as char),
                locus,
            };
        }
        match classify_number(&token) {
            Some(Ok(node_value)) => match node_value {
                NumberValue::UInt(value) => Node::UInt { value, locus },
                NumberValue::SInt(value) => Node::SInt { value, locus },
                NumberValue::Float(value) => Node::Float { value, locus },
            },
            Some(Err(message)) => Node::Error { message, locus },
            None => Node::Symbol { name: token, locus },
        }
    }

    fn read_node(&mut self) -> Result<Node, FatalParseError> {
        let locus = self.locus();
        match self.peek() {
            Some(b'(') => {
                self.advance();
                let mut children = Vec::new();
                loop {
                    self.skip_trivia()?;
                    match self.peek() {
                        Some(b')') => {
                            self.advance();
                            return Ok(Node::List { children, locus });
                        }
                        Some(_) => children.push(self.read_node()?),
                        None => return Err(self.fatal("unexpected end of file in list")),
                    }
                }
            }
            Some(b')') => {
                self.advance();
                Ok(Node::Error {
                    message: "unexpected ')'".to_string(),
                    locus,
                })
            }
            Some(b'"') => self.read_string(),
            Some(_) => Ok(self.read_number_or_symbol()),
            None => Err(self.fatal("unexpected end of file")),
        }
    }
}

fn is_token_end(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r' | b'\n' | b'(' | b')' | b'"' | b';')
}

fn hexit(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

enum NumberValue {
    UInt(u64),
    SInt(i64),
    Float(f64),
}

/// Classify a token as a number. Returns `None` for symbols, `Some(Err)`
/// for things that look numeric but do not parse.
fn classify_number(token: &str) -> Option<Result<NumberValue, String>> {
    let mut rest = token;
    let negative = if let Some(stripped) = rest.strip_prefix('-') {
        rest = stripped;
        true
    } else {
        rest = rest.strip_prefix('+').unwrap_or(rest);
        false
    };
    if !rest.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return None;
    }

    if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        return Some(match u64::from_str_radix(hex, 16) {
            Ok(value) if negative => {
                if value == 1u64 << 63 {
                    Ok(NumberValue::SInt(i64::MIN))
                } else {
                    match i64::try_from(value) {
                        Ok(signed) => Ok(NumberValue::SInt(-signed)),
                        Err(_) => Err(format!("hexadecimal literal out of range: {token}")),
                    }
                }
            }
            Ok(value) => Ok(NumberValue::UInt(value)),
            Err(_) => Err(format!("invalid hexadecimal literal: {token}")),
        });
    }

    let is_float = rest.contains(['.', 'e', 'E']);
    if is_float {
        return Some(match token.parse::<f64>() {
            Ok(value) => Ok(NumberValue::Float(value)),
            Err(_) => Err(format!("invalid float literal: {token}")),
        });
    }

    Some(if negative {
        match token.parse::<i64>() {
            Ok(value) => Ok(NumberValue::SInt(value)),
            Err(_) => Err(format!("integer literal out of range: {token}")),
        }
    } else {
        match rest.parse::<u64>() {
            Ok(value) => Ok(NumberValue::UInt(value)),
            Err(_) => Err(format!("integer literal out of range: {token}")),
        }
    })
}

/// Read every top-level S-expression in `source`.
///
/// Malformed constructs become [`Node::Error`] children; only an input
/// that ends mid-construct is fatal.
pub fn parse(source: &str) -> Result<Vec<Node>, FatalParseError> {
    let mut reader = Reader::new(source);
    let mut nodes = Vec::new();
    loop {
        reader.skip_trivia()?;
        if reader.peek().is_none() {
            return Ok(nodes);
        }
        nodes.push(reader.read_node()?);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_a_module_skeleton() {
        let nodes = parse("(module (func $add (param i32 i32) (result i32)))").unwrap();
        assert_eq!(nodes.len(), 1);
        assert!(nodes[0].is_list_headed_by("module"));
        let module = nodes[0].as_list().unwrap();
        assert!(module[1].is_list_headed_by("func"));
    }

    #[test]
    fn reads_numbers() {
        let nodes = parse("42 -7 0xff 1.5 -0x10").unwrap();
        assert!(matches!(nodes[0], Node::UInt { value: 42, .. }));
        assert!(matches!(nodes[1], Node::SInt { value: -7, .. }));
        assert!(matches!(nodes[2], Node::UInt { value: 255, .. }));
        assert!(matches!(nodes[3], Node::Float { .. }));
        assert!(matches!(nodes[4], Node::SInt { value: -16, .. }));
    }

    #[test]
    fn symbols_and_identifiers() {
        let nodes = parse("i32.add $label nan").unwrap();
        assert_eq!(nodes[0].as_symbol(), Some("i32.add"));
        assert_eq!(nodes[1].as_symbol(), Some("$label"));
        assert_eq!(nodes[2].as_symbol(), Some("nan"));
    }

    #[test]
    fn strings_unescape() {
        let nodes = parse(r#""a\n\74""#).unwrap();
        match &nodes[0] {
            Node::Str { bytes, .. } => assert_eq!(bytes, &vec![b'a', b'\n', 0x74]),
            other => panic!("expected string, got {other:?}"),
        }
    }

    #[test]
    fn comments_are_trivia() {
        let nodes = parse(";; line\n(module (; inner (; nested ;) ;) )").unwrap();
        assert_eq!(nodes.len(), 1);
        assert!(nodes[0].is_list_headed_by("module"));
    }

    #[test]
    fn stray_close_paren_is_an_error_node() {
        let nodes = parse("(module) )").unwrap();
        assert_eq!(nodes.len(), 2);
        assert!(!nodes[0].has_errors());
        assert!(nodes[1].is_error());
    }

    #[test]
    fn malformed_number_is_an_error_node_in_place() {
        let nodes = parse("(i32.const 99999999999999999999999)").unwrap();
        let list = nodes[0].as_list().unwrap();
        assert!(list[1].is_error());
        assert!(nodes[0].has_errors());
    }

    #[test]
    fn unterminated_list_is_fatal() {
        let error = parse("(module (func").unwrap_err();
        assert!(error.message.contains("end of file"));
    }

    #[test]
    fn unterminated_string_is_fatal() {
        assert!(parse("\"abc").is_err());
    }

    #[test]
    fn unterminated_block_comment_is_fatal() {
        let error = parse("(; never closed").unwrap_err();
        assert!(error.message.contains("block comment"));
    }

    #[test]
    fn stray_semicolon_is_an_error_node() {
        let nodes = parse("(a ; b)").unwrap();
        let list = nodes[0].as_list().unwrap();
        assert!(list[1].is_error());
        assert_eq!(list[2].as_symbol(), Some("b"));
    }

    #[test]
    fn loci_track_lines_and_columns() {
        let nodes = parse("(a\n  (b))").unwrap();
        let outer = nodes[0].as_list().unwrap();
        let inner = &outer[1];
        assert_eq!(inner.locus().line, 2);
        assert_eq!(inner.locus().column, 3);
    }

    #[test]
    fn display_round_trips_structure() {
        let nodes = parse("(module (func $f (result i32) (i32.const 3)))").unwrap();
        let printed = nodes[0].to_string();
        assert!(printed.starts_with("(module"));
        assert!(printed.contains("$f"));
        assert!(printed.contains("i32.const 3"));
    }
}
