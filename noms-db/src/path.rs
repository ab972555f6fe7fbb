// A hand-rolled recursive-descent parser over the path grammar:
//
//   Path       := Part+
//   Part       := '.' ident | '[' Index ']' Annotation? | '@' Annotation
//   Index      := '"' quoted '"' | 'true' | 'false' | number | '#' hash
//   Annotation := '@key' | '@type' | '@at(' int ')'
//
// Every rejection below is one of the enumerated messages in the path
// grammar's error list; callers match on the message text the way the
// grammar is documented, not on a finer-grained error enum.

use noms_base::{kind_err, Hash, Kind, Result};
use noms_types::Number;

#[derive(Clone, Debug, PartialEq)]
pub enum IndexValue {
    Str(String),
    Bool(bool),
    Number(Number),
    Hash(Hash),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Annotation {
    Key,
    Type,
    At(i64),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Part {
    Field(String),
    Index(IndexValue, Option<Annotation>),
    Bare(Annotation),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Path(pub Vec<Part>);

fn describe(part: &Part) -> &'static str {
    match part {
        Part::Field(_) => "field",
        Part::Index(_, _) => "index",
        Part::Bare(_) => "annotation",
    }
}

struct Parser<'a> {
    chars: Vec<char>,
    pos: usize,
    src: &'a str,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Parser { chars: src.chars().collect(), pos: 0, src }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn rest(&self) -> String {
        self.chars[self.pos..].iter().collect()
    }

    fn parse(mut self) -> Result<Path> {
        if self.src.is_empty() {
            return Err(kind_err(Kind::Syntax, "Empty path"));
        }
        let mut parts = Vec::new();
        while !self.at_end() {
            let part = self.parse_part(parts.last())?;
            parts.push(part);
        }
        Ok(Path(parts))
    }

    fn parse_part(&mut self, prev: Option<&Part>) -> Result<Part> {
        match self.bump().expect("checked not at_end") {
            '.' => self.parse_field(),
            '[' => self.parse_index(),
            '@' => self.parse_bare_annotation(prev),
            other => Err(kind_err(Kind::Syntax, format!("Invalid operator: {other}"))),
        }
    }

    fn parse_field(&mut self) -> Result<Part> {
        let start = self.pos;
        while !matches!(self.peek(), None | Some('.') | Some('[') | Some('@')) {
            self.pos += 1;
        }
        let ident: String = self.chars[start..self.pos].iter().collect();
        if ident.is_empty() {
            return Err(kind_err(Kind::Syntax, format!("Invalid field: {}", self.rest())));
        }
        Ok(Part::Field(ident))
    }

    fn parse_index(&mut self) -> Result<Part> {
        if self.at_end() {
            return Err(kind_err(Kind::Syntax, "Path ends in ["));
        }
        let value = if self.peek() == Some('"') {
            self.parse_quoted_index()?
        } else {
            self.parse_bare_index()?
        };
        match self.bump() {
            Some(']') => {}
            _ => return Err(kind_err(Kind::Syntax, "[ is missing closing ]")),
        }
        let anno = if self.peek() == Some('@') {
            self.pos += 1;
            Some(self.parse_annotation_name()?)
        } else {
            None
        };
        if let Some(Annotation::Key) = anno {
            // an index always validly precedes `@key`; nothing to reject
        }
        Ok(Part::Index(value, anno))
    }

    fn parse_quoted_index(&mut self) -> Result<IndexValue> {
        self.bump(); // opening quote
        let mut s = String::new();
        loop {
            match self.bump() {
                None => return Err(kind_err(Kind::Syntax, "[ is missing closing ]")),
                Some('"') => break,
                Some('\\') => match self.bump() {
                    Some(c @ ('"' | '\\')) => s.push(c),
                    _ => return Err(kind_err(Kind::Syntax, "Only \" and \\ can be escaped")),
                },
                Some(c) => s.push(c),
            }
        }
        Ok(IndexValue::Str(s))
    }

    fn parse_bare_index(&mut self) -> Result<IndexValue> {
        let start = self.pos;
        while !matches!(self.peek(), None | Some(']')) {
            self.pos += 1;
        }
        let raw: String = self.chars[start..self.pos].iter().collect();
        if raw.is_empty() {
            return Err(kind_err(Kind::Syntax, "Empty index value"));
        }
        if raw == "true" {
            return Ok(IndexValue::Bool(true));
        }
        if raw == "false" {
            return Ok(IndexValue::Bool(false));
        }
        if let Some(hex) = raw.strip_prefix('#') {
            return hex
                .parse::<Hash>()
                .map(IndexValue::Hash)
                .map_err(|_| kind_err(Kind::Syntax, format!("Invalid hash: {raw}")));
        }
        raw.parse::<i64>()
            .map(|n| IndexValue::Number(Number::from_i64(n)))
            .map_err(|_| kind_err(Kind::Syntax, format!("Invalid index: {raw}")))
    }

    fn parse_bare_annotation(&mut self, prev: Option<&Part>) -> Result<Part> {
        let anno = self.parse_annotation_name()?;
        if matches!(anno, Annotation::Key) {
            match prev {
                None => return Err(kind_err(Kind::Syntax, "Cannot use @key annotation at beginning of path")),
                Some(p @ Part::Field(_)) | Some(p @ Part::Bare(_)) => {
                    return Err(kind_err(Kind::Syntax, format!("Cannot use @key annotation on: {}", describe(p))));
                }
                Some(Part::Index(_, _)) => {
                    return Err(kind_err(Kind::Syntax, "Cannot use @key annotation on: index"));
                }
            }
        }
        Ok(Part::Bare(anno))
    }

    fn parse_annotation_name(&mut self) -> Result<Annotation> {
        let start = self.pos;
        while !matches!(self.peek(), None | Some('.') | Some('[') | Some('@')) {
            self.pos += 1;
        }
        let name: String = self.chars[start..self.pos].iter().collect();
        if name == "key" {
            return Ok(Annotation::Key);
        }
        if name == "type" {
            return Ok(Annotation::Type);
        }
        if let Some(rest) = name.strip_prefix("at(") {
            if let Some(inner) = rest.strip_suffix(')') {
                if let Ok(n) = inner.parse::<i64>() {
                    return Ok(Annotation::At(n));
                }
            }
        }
        Err(kind_err(Kind::Syntax, format!("Unsupported annotation: @{name}")))
    }
}

pub fn parse_path(src: &str) -> Result<Path> {
    Parser::new(src).parse()
}

#[cfg(test)]
mod test {
    use super::*;
    use test_log::test;

    #[test]
    fn empty_path_is_rejected() {
        assert_eq!(parse_path("").unwrap_err().kind(), Kind::Syntax);
    }

    #[test]
    fn field_access_parses() {
        let p = parse_path(".foo").unwrap();
        assert_eq!(p.0, vec![Part::Field("foo".to_string())]);
    }

    #[test]
    fn numeric_index_parses() {
        let p = parse_path("[2]").unwrap();
        assert_eq!(p.0, vec![Part::Index(IndexValue::Number(Number::from_i64(2)), None)]);
    }

    #[test]
    fn negative_index_parses() {
        let p = parse_path("[-1]").unwrap();
        assert_eq!(p.0, vec![Part::Index(IndexValue::Number(Number::from_i64(-1)), None)]);
    }

    #[test]
    fn quoted_string_index_parses() {
        let p = parse_path("[\"foo\"]").unwrap();
        assert_eq!(p.0, vec![Part::Index(IndexValue::Str("foo".to_string()), None)]);
    }

    #[test]
    fn unterminated_bracket_is_rejected() {
        assert_eq!(parse_path("[2").unwrap_err().kind(), Kind::Syntax);
    }

    #[test]
    fn bare_key_at_start_is_rejected() {
        let err = parse_path("@key").unwrap_err();
        assert_eq!(err.kind(), Kind::Syntax);
    }

    #[test]
    fn key_after_index_parses() {
        let p = parse_path("[\"a\"]@key").unwrap();
        assert_eq!(p.0, vec![Part::Index(IndexValue::Str("a".to_string()), Some(Annotation::Key))]);
    }

    #[test]
    fn unsupported_annotation_is_rejected() {
        assert_eq!(parse_path("@bogus").unwrap_err().kind(), Kind::Syntax);
    }
}
