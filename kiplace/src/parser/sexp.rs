use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Unexpected end of input")]
    UnexpectedEof,
    #[error("Parse error at position {0}: {1}")]
    ParseError(usize, String),
}

/// S-expression node. Quoted strings are kept apart from bare symbols so a
/// document can be written back the way it was read.
#[derive(Debug, Clone, PartialEq)]
pub enum SExp {
    Atom(String),
    Str(String),
    List(Vec<SExp>),
}

impl SExp {
    pub fn atom(s: impl Into<String>) -> Self {
        SExp::Atom(s.into())
    }

    pub fn string(s: impl Into<String>) -> Self {
        SExp::Str(s.into())
    }

    /// `(key args...)`
    pub fn keyed(key: &str, args: Vec<SExp>) -> Self {
        let mut items = Vec::with_capacity(args.len() + 1);
        items.push(SExp::atom(key));
        items.extend(args);
        SExp::List(items)
    }

    /// Text of a symbol or quoted string.
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            SExp::Atom(s) | SExp::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[SExp]> {
        match self {
            SExp::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut Vec<SExp>> {
        match self {
            SExp::List(items) => Some(items),
            _ => None,
        }
    }

    /// Head symbol of a list, e.g. `footprint` for `(footprint ...)`.
    pub fn tag(&self) -> Option<&str> {
        self.as_list().and_then(|l| l.first()).and_then(|a| a.as_atom())
    }

    /// Value of a `(key value)` pair, or the whole list when `key` carries
    /// several arguments.
    pub fn get(&self, key: &str) -> Option<&SExp> {
        self.as_list()?.iter().find_map(|item| match item.as_list()? {
            [head, value] if head.as_atom() == Some(key) => Some(value),
            [head, _, _, ..] if head.as_atom() == Some(key) => Some(item),
            _ => None,
        })
    }

    pub fn get_all(&self, key: &str) -> Vec<&SExp> {
        self.as_list()
            .map(|items| items.iter().filter(|item| item.tag() == Some(key)).collect())
            .unwrap_or_default()
    }

    /// First child list tagged `key`, always as the whole list.
    pub fn child(&self, key: &str) -> Option<&SExp> {
        self.as_list()?.iter().find(|item| item.tag() == Some(key))
    }

    pub fn child_mut(&mut self, key: &str) -> Option<&mut SExp> {
        self.as_list_mut()?.iter_mut().find(|item| item.tag() == Some(key))
    }

    /// Whether a bare symbol appears directly in this list, e.g. `locked` in
    /// `(segment locked (start ...))`.
    pub fn has_flag(&self, flag: &str) -> bool {
        self.as_list()
            .map(|items| items.iter().skip(1).any(|i| matches!(i, SExp::Atom(a) if a == flag)))
            .unwrap_or(false)
    }

    /// Replace the first child list tagged like `node`, or append it.
    pub fn set_child(&mut self, node: SExp) {
        let Some(key) = node.tag().map(|k| k.to_string()) else {
            return;
        };
        if let Some(items) = self.as_list_mut() {
            match items.iter_mut().find(|item| item.tag() == Some(key.as_str())) {
                Some(existing) => *existing = node,
                None => items.push(node),
            }
        }
    }

    pub fn remove_children(&mut self, key: &str) {
        if let Some(items) = self.as_list_mut() {
            items.retain(|item| item.tag() != Some(key));
        }
    }

    /// Multi-line rendering: lists that contain lists are broken up, leaf
    /// lists stay on one line.
    pub fn to_pretty_string(&self) -> String {
        let mut out = String::new();
        self.write_pretty(&mut out, 0);
        out.push('\n');
        out
    }

    fn write_pretty(&self, out: &mut String, depth: usize) {
        match self {
            SExp::List(items) if items.iter().any(|i| matches!(i, SExp::List(_))) => {
                out.push('(');
                let mut first = true;
                for item in items {
                    match item {
                        SExp::List(_) => {
                            out.push('\n');
                            out.push_str(&"  ".repeat(depth + 1));
                            item.write_pretty(out, depth + 1);
                        }
                        _ => {
                            if !first {
                                out.push(' ');
                            }
                            out.push_str(&item.to_string());
                        }
                    }
                    first = false;
                }
                out.push('\n');
                out.push_str(&"  ".repeat(depth));
                out.push(')');
            }
            _ => out.push_str(&self.to_string()),
        }
    }
}

impl fmt::Display for SExp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SExp::Atom(s) => {
                if s.is_empty() || s.contains(|c: char| c.is_whitespace() || c == '(' || c == ')' || c == '"') {
                    write_quoted(f, s)
                } else {
                    write!(f, "{}", s)
                }
            }
            SExp::Str(s) => write_quoted(f, s),
            SExp::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    write!(f, "\"")?;
    for ch in s.chars() {
        match ch {
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            '\t' => write!(f, "\\t")?,
            '\r' => write!(f, "\\r")?,
            _ => write!(f, "{}", ch)?,
        }
    }
    write!(f, "\"")
}

/// Reads one top-level expression. Nesting is tracked on an explicit stack,
/// so deeply nested boards do not recurse.
pub struct SExpParser<'a> {
    input: &'a str,
    /// Byte offset into `input`.
    pos: usize,
}

impl<'a> SExpParser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    pub fn parse(&mut self) -> Result<SExp, ParseError> {
        let mut open: Vec<Vec<SExp>> = Vec::new();
        let mut root = None;

        loop {
            self.skip_whitespace();
            let Some(ch) = self.rest().chars().next() else {
                return match root {
                    Some(sexp) if open.is_empty() => Ok(sexp),
                    _ => Err(ParseError::UnexpectedEof),
                };
            };
            if root.is_some() {
                return Err(ParseError::ParseError(
                    self.pos,
                    "trailing content after top-level expression".to_string(),
                ));
            }

            let node = match ch {
                '(' => {
                    self.pos += 1;
                    open.push(Vec::new());
                    continue;
                }
                ')' => {
                    let Some(items) = open.pop() else {
                        return Err(ParseError::ParseError(self.pos, "unbalanced ')'".to_string()));
                    };
                    self.pos += 1;
                    SExp::List(items)
                }
                '"' => self.read_string()?,
                _ => self.read_symbol(),
            };

            match open.last_mut() {
                Some(parent) => parent.push(node),
                None => root = Some(node),
            }
        }
    }

    fn rest(&self) -> &'a str {
        let input: &'a str = self.input;
        &input[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    /// Called on the opening quote.
    fn read_string(&mut self) -> Result<SExp, ParseError> {
        let body = &self.rest()[1..];
        let mut text = String::new();
        let mut chars = body.char_indices();

        while let Some((offset, ch)) = chars.next() {
            match ch {
                '"' => {
                    self.pos += 1 + offset + 1;
                    return Ok(SExp::Str(text));
                }
                '\\' => match chars.next() {
                    Some((_, 'n')) => text.push('\n'),
                    Some((_, 't')) => text.push('\t'),
                    Some((_, 'r')) => text.push('\r'),
                    Some((_, other)) => text.push(other),
                    None => break,
                },
                _ => text.push(ch),
            }
        }
        Err(ParseError::UnexpectedEof)
    }

    /// Bare symbols run up to whitespace or a paren; never empty here.
    fn read_symbol(&mut self) -> SExp {
        let rest = self.rest();
        let end = rest
            .find(|c: char| c.is_whitespace() || c == '(' || c == ')')
            .unwrap_or(rest.len());
        self.pos += end;
        SExp::Atom(rest[..end].to_string())
    }
}
