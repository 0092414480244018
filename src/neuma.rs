// gdv.score -- differential decoding of musical commands onto a rational timeline
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Raw decoder input.
//!
//! A *neuma* is a loosely structured bag of attributes as it comes out of a
//! notation front end, e.g. `grade:+1 duration:1/8 velocity:-p`. Nothing in
//! here knows what the attributes mean, that is the job of the codec.

use std::collections::BTreeMap;
use std::fmt;

use snafu::Snafu;

use crate::rational::Rational;

/// A single raw attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Time(Rational),
    Text(String),
    Neuma(Neuma),
}

impl From<i64> for Value {
    fn from(int: i64) -> Self {
        Value::Int(int)
    }
}

impl From<Rational> for Value {
    fn from(time: Rational) -> Self {
        Value::Time(time)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_owned())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<Neuma> for Value {
    fn from(neuma: Neuma) -> Self {
        Value::Neuma(neuma)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(int) => write!(f, "{}", int),
            Value::Time(time) => write!(f, "{}", time),
            Value::Text(text) => write!(f, "{}", text),
            Value::Neuma(neuma) => write!(f, "({})", neuma),
        }
    }
}

/// String keyed attributes of one raw command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Neuma {
    fields: BTreeMap<String, Value>,
}

impl Neuma {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder style insertion.
    ///
    /// ```
    /// # use gdv_score::neuma::*;
    /// let neuma = Neuma::new().with("grade", "+1").with("velocity", "ff");
    /// assert_eq!(neuma.to_string(), "grade:+1 velocity:ff");
    /// ```
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.fields.insert(key.to_owned(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether the neuma only carries a comment.
    pub fn is_comment(&self) -> bool {
        !self.is_empty() && self.keys().all(|key| key == "comment")
    }
}

impl fmt::Display for Neuma {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}:{}", key, value)?;
        }
        Ok(())
    }
}

/// Errors in the textual neuma form. Positions are byte offsets into the whole input.
#[derive(Debug, PartialEq, Eq, Snafu)]
pub enum NeumaTextError {
    #[snafu(display("Expected ':' after the key at {}", pos))]
    ExpectedColon { pos: usize },
    #[snafu(display("Missing key at {}", pos))]
    EmptyKey { pos: usize },
    #[snafu(display("Missing value at {}", pos))]
    EmptyValue { pos: usize },
    #[snafu(display("Parenthesis opened at {} is never closed", pos))]
    UnclosedParen { pos: usize },
    #[snafu(display("Unexpected ')' at {}", pos))]
    UnexpectedParen { pos: usize },
}

/// Read a single neuma of the form `key:value key:(key:value ...)`.
///
/// Values are kept as text, interpreting them is up to the codec.
///
/// ```
/// # use gdv_score::neuma::*;
/// let neuma = parse_neuma("grade:2 modifiers:(appoggiatura:(grade:+1))").unwrap();
/// assert_eq!(neuma.get("grade"), Some(&Value::from("2")));
/// assert!(matches!(neuma.get("modifiers"), Some(Value::Neuma(_))));
/// ```
pub fn parse_neuma(input: &str) -> Result<Neuma, NeumaTextError> {
    Parser::new(input, 0).parse_fields(None)
}

/// Read one neuma per line. Empty lines are skipped, lines starting with `#`
/// become comment neumas.
pub fn parse_neumas(input: &str) -> Result<Vec<Neuma>, NeumaTextError> {
    let mut neumas = Vec::new();
    let mut offset = 0;
    for line in input.split('\n') {
        let trimmed = line.trim();
        if let Some(comment) = trimmed.strip_prefix('#') {
            neumas.push(Neuma::new().with("comment", comment.trim()));
        } else if !trimmed.is_empty() {
            neumas.push(Parser::new(line, offset).parse_fields(None)?);
        }
        offset += line.len() + 1;
    }
    Ok(neumas)
}

struct Parser<'a> {
    source: &'a str,
    stream: Scan<'a>,
    /// Offset of `source` in the complete input, for error positions.
    offset: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, offset: usize) -> Self {
        Self {
            source,
            stream: Scan::new(source),
            offset,
        }
    }

    fn pos(&mut self) -> usize {
        self.offset + self.stream.current().map_or(self.source.len(), |(pos, _)| pos)
    }

    /// Parse fields until the end of input, or until the closing parenthesis
    /// if `open` holds the position of an opening one.
    fn parse_fields(&mut self, open: Option<usize>) -> Result<Neuma, NeumaTextError> {
        let mut neuma = Neuma::new();
        loop {
            self.stream.skip_whitespace();
            match (self.stream.current(), open) {
                (None, None) => return Ok(neuma),
                (None, Some(pos)) => return Err(NeumaTextError::UnclosedParen { pos }),
                (Some((_, ')')), Some(_)) => {
                    self.stream.advance();
                    return Ok(neuma);
                }
                (Some((_, ')')), None) => {
                    return Err(NeumaTextError::UnexpectedParen { pos: self.pos() })
                }
                _ => {
                    let (key, value) = self.parse_field()?;
                    neuma.fields.insert(key, value);
                }
            }
        }
    }

    fn parse_field(&mut self) -> Result<(String, Value), NeumaTextError> {
        let key_pos = self.pos();
        let key = self.take_while(|ch| !ch.is_whitespace() && !"():".contains(ch));
        if key.is_empty() {
            return Err(NeumaTextError::EmptyKey { pos: key_pos });
        }
        match self.stream.current() {
            Some((_, ':')) => self.stream.advance(),
            _ => return Err(NeumaTextError::ExpectedColon { pos: self.pos() }),
        }

        let value_pos = self.pos();
        if let Some((_, '(')) = self.stream.current() {
            self.stream.advance();
            let nested = self.parse_fields(Some(value_pos))?;
            return Ok((key.to_owned(), Value::Neuma(nested)));
        }
        let value = self.take_while(|ch| !ch.is_whitespace() && !"()".contains(ch));
        if value.is_empty() {
            return Err(NeumaTextError::EmptyValue { pos: value_pos });
        }
        Ok((key.to_owned(), Value::from(value)))
    }

    fn take_while<F: Fn(char) -> bool>(&mut self, predicate: F) -> &'a str {
        let start = self.stream.current().map_or(self.source.len(), |(pos, _)| pos);
        while let Some((_, ch)) = self.stream.current() {
            if predicate(ch) {
                self.stream.advance();
            } else {
                break;
            }
        }
        let end = self.stream.current().map_or(self.source.len(), |(pos, _)| pos);
        &self.source[start..end]
    }
}

struct Scan<'a> {
    stream: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> Scan<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            stream: input.char_indices().peekable(),
        }
    }

    fn current(&mut self) -> Option<(usize, char)> {
        self.stream.peek().cloned()
    }

    fn advance(&mut self) {
        self.stream.next();
    }

    fn skip_whitespace(&mut self) {
        while let Some((_, ch)) = self.current() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }
}
