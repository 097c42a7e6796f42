// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! src/core/settings.rs
//!
//! Settings block parser
//!
//! A keymap source may carry display settings in a comment placed before
//! the first invocation:
//!
//! ```text
//! /*---
//! keycaps:
//!   - match: KC_ESC
//!     bg: "#d33"
//!   - match: !regex /^KC_F\d+$/i
//!     text: Fn
//! ---*/
//! ```
//!
//! The content is a restricted YAML subset: block mappings, block
//! sequences, flow sequences of scalars, plain and quoted scalars, `#`
//! comments, and the `!regex` tag which turns a scalar into a compiled
//! `Regex`. No schema is enforced; `Settings::keycap_rules` offers a typed
//! view of the `keycaps` entry for consumers that want one.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, space0, space1},
    combinator::{map, rest},
    error::{Error as NomError, ErrorKind},
    multi::separated_list0,
    sequence::{delimited, preceded, terminated},
    IResult, Parser,
};
use regex::Regex;
use serde::{ser::SerializeMap, Serialize, Serializer};
use std::collections::BTreeMap;
use thiserror::Error;

/// Opening marker of the settings comment
pub const BLOCK_OPEN: &str = "/*---";

/// Closing marker of the settings comment
pub const BLOCK_CLOSE: &str = "---*/";

/// Tag marking a scalar as a regular expression
pub const REGEX_TAG: &str = "!regex";

/// Errors raised while reading a settings block
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Line {line}: tabs are not allowed in indentation")]
    TabIndentation { line: usize },

    #[error("Line {line}: unexpected indentation")]
    UnexpectedIndent { line: usize },

    #[error("Line {line}: {message}")]
    InvalidLine { line: usize, message: String },

    #[error("Line {line}: invalid regular expression: {source}")]
    InvalidRegex {
        line: usize,
        #[source]
        source: regex::Error,
    },

    #[error("Settings block must be a mapping")]
    NotAMapping,
}

/// A value inside the settings block
#[derive(Clone, Debug)]
pub enum SettingValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    /// Scalar tagged with `!regex`
    Regex(Regex),
    Sequence(Vec<SettingValue>),
    Mapping(BTreeMap<String, SettingValue>),
}

impl SettingValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_regex(&self) -> Option<&Regex> {
        match self {
            SettingValue::Regex(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[SettingValue]> {
        match self {
            SettingValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&BTreeMap<String, SettingValue>> {
        match self {
            SettingValue::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Looks up `key` when this value is a mapping
    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.as_mapping().and_then(|m| m.get(key))
    }
}

// Regex has no PartialEq; patterns compare by source text.
impl PartialEq for SettingValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (SettingValue::Null, SettingValue::Null) => true,
            (SettingValue::Bool(a), SettingValue::Bool(b)) => a == b,
            (SettingValue::Integer(a), SettingValue::Integer(b)) => a == b,
            (SettingValue::Float(a), SettingValue::Float(b)) => a == b,
            (SettingValue::String(a), SettingValue::String(b)) => a == b,
            (SettingValue::Regex(a), SettingValue::Regex(b)) => a.as_str() == b.as_str(),
            (SettingValue::Sequence(a), SettingValue::Sequence(b)) => a == b,
            (SettingValue::Mapping(a), SettingValue::Mapping(b)) => a == b,
            _ => false,
        }
    }
}

impl Serialize for SettingValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SettingValue::Null => serializer.serialize_unit(),
            SettingValue::Bool(b) => serializer.serialize_bool(*b),
            SettingValue::Integer(i) => serializer.serialize_i64(*i),
            SettingValue::Float(f) => serializer.serialize_f64(*f),
            SettingValue::String(s) => serializer.serialize_str(s),
            SettingValue::Regex(r) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("regex", r.as_str())?;
                map.end()
            }
            SettingValue::Sequence(items) => items.serialize(serializer),
            SettingValue::Mapping(m) => m.serialize(serializer),
        }
    }
}

/// Top-level settings mapping
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Settings {
    entries: BTreeMap<String, SettingValue>,
}

impl Settings {
    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.entries.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SettingValue)> {
        self.entries.iter()
    }

    /// Typed view of the `keycaps` sequence
    ///
    /// Entries without a usable `match` field are skipped.
    pub fn keycap_rules(&self) -> Vec<KeycapRule> {
        let Some(rules) = self.get("keycaps").and_then(SettingValue::as_sequence) else {
            return Vec::new();
        };

        rules
            .iter()
            .filter_map(|rule| {
                let matcher = match rule.get("match")? {
                    SettingValue::String(s) => KeycapMatch::Keycode(s.clone()),
                    SettingValue::Regex(r) => KeycapMatch::Pattern(r.clone()),
                    _ => return None,
                };
                Some(KeycapRule {
                    matcher,
                    text: rule.get("text").and_then(|v| v.as_str()).map(str::to_string),
                    bg: rule.get("bg").and_then(|v| v.as_str()).map(str::to_string),
                })
            })
            .collect()
    }
}

/// What a keycap rule applies to
#[derive(Clone, Debug)]
pub enum KeycapMatch {
    /// Exact keycode name
    Keycode(String),
    Pattern(Regex),
}

impl KeycapMatch {
    pub fn matches(&self, keycode: &str) -> bool {
        match self {
            KeycapMatch::Keycode(k) => k == keycode,
            KeycapMatch::Pattern(r) => r.is_match(keycode),
        }
    }
}

/// One entry of the `keycaps` sequence
#[derive(Clone, Debug)]
pub struct KeycapRule {
    pub matcher: KeycapMatch,
    pub text: Option<String>,
    pub bg: Option<String>,
}

/// Returns the content between `/*---` and `---*/`, if both are present
pub fn find_settings_block(text: &str) -> Option<&str> {
    let open = text.find(BLOCK_OPEN)?;
    let body_start = open + BLOCK_OPEN.len();
    let close = text[body_start..].find(BLOCK_CLOSE)?;
    Some(&text[body_start..body_start + close])
}

/// Parse the content of a settings block
///
/// An empty block yields empty settings. The top-level value must be a
/// mapping.
pub fn parse_settings(block: &str) -> Result<Settings, SettingsError> {
    let lines = split_lines(block)?;
    if lines.is_empty() {
        return Ok(Settings::default());
    }

    let mut parser = BlockParser { lines, pos: 0 };
    let root = parser.parse_node()?;

    if let Some(line) = parser.lines.get(parser.pos) {
        return Err(SettingsError::InvalidLine {
            line: line.number,
            message: format!("unexpected content '{}'", line.text),
        });
    }

    match root {
        SettingValue::Mapping(entries) => Ok(Settings { entries }),
        _ => Err(SettingsError::NotAMapping),
    }
}

/// A non-blank line with its comment removed
#[derive(Clone, Copy, Debug)]
struct Line<'a> {
    /// 1-based line number within the block
    number: usize,
    indent: usize,
    text: &'a str,
}

fn split_lines(block: &str) -> Result<Vec<Line<'_>>, SettingsError> {
    let mut lines = Vec::new();

    for (i, raw) in block.lines().enumerate() {
        let number = i + 1;
        let content = strip_comment(raw).trim_end();
        let text = content.trim_start();
        if text.is_empty() {
            continue;
        }

        let leading = &content[..content.len() - text.len()];
        if leading.contains('\t') {
            return Err(SettingsError::TabIndentation { line: number });
        }

        lines.push(Line {
            number,
            indent: leading.len(),
            text,
        });
    }

    Ok(lines)
}

/// Cuts a `#` comment that starts a line or follows whitespace outside quotes
fn strip_comment(line: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut prev_is_space = true;

    for (i, c) in line.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == '#' && prev_is_space => return &line[..i],
            None => {}
        }
        prev_is_space = c.is_whitespace();
    }

    line
}

fn is_sequence_item(text: &str) -> bool {
    text == "-" || text.starts_with("- ")
}

struct BlockParser<'a> {
    lines: Vec<Line<'a>>,
    pos: usize,
}

impl<'a> BlockParser<'a> {
    /// Parses the block starting at the current line
    fn parse_node(&mut self) -> Result<SettingValue, SettingsError> {
        let line = self.lines[self.pos];
        if is_sequence_item(line.text) {
            self.parse_sequence(line.indent)
        } else {
            self.parse_mapping(line.indent)
        }
    }

    fn parse_sequence(&mut self, indent: usize) -> Result<SettingValue, SettingsError> {
        let mut items = Vec::new();

        while let Some(line) = self.lines.get(self.pos).copied() {
            if line.indent != indent || !is_sequence_item(line.text) {
                break;
            }

            let body = line.text[1..].trim_start();
            let body_indent = indent + (line.text.len() - body.len());

            if body.is_empty() {
                self.pos += 1;
                items.push(self.parse_nested(indent)?);
            } else if split_key(body).is_some() {
                // `- key: value` opens a mapping aligned with `key`
                self.lines[self.pos] = Line {
                    number: line.number,
                    indent: body_indent,
                    text: body,
                };
                items.push(self.parse_mapping(body_indent)?);
            } else {
                self.pos += 1;
                items.push(parse_scalar(body, line.number)?);
            }
        }

        Ok(SettingValue::Sequence(items))
    }

    fn parse_mapping(&mut self, indent: usize) -> Result<SettingValue, SettingsError> {
        let mut entries = BTreeMap::new();

        while let Some(line) = self.lines.get(self.pos).copied() {
            if line.indent < indent || (line.indent == indent && is_sequence_item(line.text)) {
                break;
            }
            if line.indent > indent {
                return Err(SettingsError::UnexpectedIndent { line: line.number });
            }

            let (key, value_text) = split_key(line.text).ok_or_else(|| SettingsError::InvalidLine {
                line: line.number,
                message: format!("expected 'key: value', found '{}'", line.text),
            })?;
            self.pos += 1;

            let value = if value_text.is_empty() {
                match self.lines.get(self.pos) {
                    Some(next) if next.indent == indent && is_sequence_item(next.text) => {
                        self.parse_sequence(indent)?
                    }
                    _ => self.parse_nested(indent)?,
                }
            } else {
                parse_scalar(value_text, line.number)?
            };

            entries.insert(key, value);
        }

        Ok(SettingValue::Mapping(entries))
    }

    /// Value on the following, more indented lines, or null if there is none
    fn parse_nested(&mut self, parent_indent: usize) -> Result<SettingValue, SettingsError> {
        match self.lines.get(self.pos) {
            Some(next) if next.indent > parent_indent => self.parse_node(),
            _ => Ok(SettingValue::Null),
        }
    }
}

/// Splits `key: value` into the key and the trimmed value text
fn split_key(text: &str) -> Option<(String, &str)> {
    if text.starts_with('!') || text.starts_with('[') {
        return None;
    }

    let (remaining, key) = mapping_key(text).ok()?;
    if !(remaining.is_empty() || remaining.starts_with(' ')) {
        return None;
    }

    Some((key, remaining.trim()))
}

fn mapping_key(input: &str) -> IResult<&str, String> {
    terminated(alt((double_quoted, single_quoted, plain_key)), char(':')).parse(input)
}

fn plain_key(input: &str) -> IResult<&str, String> {
    map(
        take_while1(|c: char| c != ':' && c != '"' && c != '\''),
        |s: &str| s.trim_end().to_string(),
    )
    .parse(input)
}

fn nom_error(input: &str) -> nom::Err<NomError<&str>> {
    nom::Err::Error(NomError::new(input, ErrorKind::Char))
}

/// `"..."` with backslash escapes
fn double_quoted(input: &str) -> IResult<&str, String> {
    let Some(body) = input.strip_prefix('"') else {
        return Err(nom_error(input));
    };

    let mut out = String::new();
    let mut chars = body.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Ok((&body[i + 1..], out)),
            '\\' => match chars.next() {
                Some((_, 'n')) => out.push('\n'),
                Some((_, 't')) => out.push('\t'),
                Some((_, other)) => out.push(other),
                None => return Err(nom_error(input)),
            },
            other => out.push(other),
        }
    }

    Err(nom_error(input))
}

/// `'...'` where `''` stands for a single quote
fn single_quoted(input: &str) -> IResult<&str, String> {
    let Some(body) = input.strip_prefix('\'') else {
        return Err(nom_error(input));
    };

    let mut out = String::new();
    let mut chars = body.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c != '\'' {
            out.push(c);
            continue;
        }
        if matches!(chars.peek(), Some((_, '\''))) {
            chars.next();
            out.push('\'');
            continue;
        }
        return Ok((&body[i + 1..], out));
    }

    Err(nom_error(input))
}

fn regex_body(input: &str) -> IResult<&str, &str> {
    preceded((tag(REGEX_TAG), space1), rest).parse(input)
}

fn flow_item(input: &str) -> IResult<&str, SettingValue> {
    delimited(
        space0,
        alt((
            map(double_quoted, SettingValue::String),
            map(single_quoted, SettingValue::String),
            map(take_while1(|c: char| c != ',' && c != ']'), |s: &str| {
                plain_value(s.trim())
            }),
        )),
        space0,
    )
    .parse(input)
}

fn flow_sequence(input: &str) -> IResult<&str, Vec<SettingValue>> {
    delimited(
        char('['),
        separated_list0(char(','), flow_item),
        preceded(space0, char(']')),
    )
    .parse(input)
}

/// Parses the value part of a line
fn parse_scalar(input: &str, line: usize) -> Result<SettingValue, SettingsError> {
    let input = input.trim();
    let invalid = |message: &str| SettingsError::InvalidLine {
        line,
        message: message.to_string(),
    };

    if input == REGEX_TAG {
        return Err(invalid("missing pattern after !regex"));
    }
    if let Ok((_, body)) = regex_body(input) {
        return compile_pattern(body.trim(), line).map(SettingValue::Regex);
    }

    let (remaining, value) = if input.starts_with('[') {
        flow_sequence(input)
            .map(|(r, items)| (r, SettingValue::Sequence(items)))
            .map_err(|_| invalid("malformed flow sequence"))?
    } else if input.starts_with('"') {
        double_quoted(input)
            .map(|(r, s)| (r, SettingValue::String(s)))
            .map_err(|_| invalid("unterminated double-quoted string"))?
    } else if input.starts_with('\'') {
        single_quoted(input)
            .map(|(r, s)| (r, SettingValue::String(s)))
            .map_err(|_| invalid("unterminated single-quoted string"))?
    } else {
        ("", plain_value(input))
    };

    if !remaining.trim().is_empty() {
        return Err(invalid(&format!("unexpected text '{}'", remaining.trim())));
    }

    Ok(value)
}

/// Resolves an unquoted scalar to null, bool, number or string
fn plain_value(text: &str) -> SettingValue {
    match text {
        "" | "~" | "null" => return SettingValue::Null,
        "true" => return SettingValue::Bool(true),
        "false" => return SettingValue::Bool(false),
        _ => {}
    }

    if let Ok(i) = text.parse::<i64>() {
        return SettingValue::Integer(i);
    }
    if text.chars().any(|c| c.is_ascii_digit()) {
        if let Ok(f) = text.parse::<f64>() {
            return SettingValue::Float(f);
        }
    }

    SettingValue::String(text.to_string())
}

/// Compiles a `!regex` body: a bare or quoted pattern, or `/pattern/flags`
fn compile_pattern(body: &str, line: usize) -> Result<Regex, SettingsError> {
    let body = match body.chars().next() {
        Some('"') => double_quoted(body).map(|(_, s)| s).unwrap_or_else(|_| body.to_string()),
        Some('\'') => single_quoted(body).map(|(_, s)| s).unwrap_or_else(|_| body.to_string()),
        _ => body.to_string(),
    };

    let last_slash = if body.starts_with('/') {
        body.rfind('/').filter(|&i| i > 0)
    } else {
        None
    };

    let pattern = match last_slash {
        Some(last) => {
            let flags: String = body[last + 1..]
                .chars()
                .filter(|c| matches!(c, 'i' | 'm' | 's' | 'x'))
                .collect();
            let inner = &body[1..last];
            if flags.is_empty() {
                inner.to_string()
            } else {
                format!("(?{}){}", flags, inner)
            }
        }
        _ => body,
    };

    Regex::new(&pattern).map_err(|source| SettingsError::InvalidRegex { line, source })
}
