//! Reduction of arbitrary JSON values to field tokens
//!
//! Objects become one token of JSON text, arrays one token per element, and
//! scalars one token of plain text. [`collapse`] then turns the tokens into
//! an absent, single, or multivalue field.

use crate::types::FieldValue;
use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::Value;
use std::io;

/// Lazy token stream produced by [`flatten`]
pub enum Tokens<'a> {
    Whole(Option<String>),
    Elements(std::slice::Iter<'a, Value>),
}

impl Iterator for Tokens<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        match self {
            Tokens::Whole(token) => token.take(),
            Tokens::Elements(items) => items.next().map(|item| match item {
                Value::Array(_) | Value::Object(_) => json_text(item),
                scalar => scalar_text(scalar),
            }),
        }
    }
}

/// Tokenize a value for field output
pub fn flatten(value: &Value) -> Tokens<'_> {
    match value {
        Value::Object(_) => Tokens::Whole(Some(json_text(value))),
        Value::Array(items) => Tokens::Elements(items.iter()),
        scalar => Tokens::Whole(Some(scalar_text(scalar))),
    }
}

/// Zero tokens leave the field unset, one is a plain value, more is a multivalue
pub fn collapse(tokens: impl Iterator<Item = String>) -> Option<FieldValue> {
    let mut tokens = tokens.peekable();
    let first = tokens.next()?;

    if tokens.peek().is_none() {
        return Some(FieldValue::Single(first));
    }

    let mut values = vec![first];
    values.extend(tokens);
    Some(FieldValue::Multi(values))
}

/// Plain text of a value: strings unquoted, everything else as JSON
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::from("null"),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        composite => json_text(composite),
    }
}

/// JSON text with `", "` and `": "` separators, non-ASCII left as is
pub fn json_text(value: &Value) -> String {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    if value.serialize(&mut ser).is_err() {
        return value.to_string();
    }
    String::from_utf8(buf).unwrap_or_else(|_| value.to_string())
}

/// Single-line formatter with a space after each separator
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}
