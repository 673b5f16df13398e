//! Manifest rendering
//!
//! Manifests are YAML templates containing placeholder tokens of the form
//! `__NAME__`, where `NAME` starts with an uppercase letter and continues
//! with uppercase letters, digits and underscores. Rendering replaces every
//! token with its value in a single left-to-right pass:
//!
//! - replacement values are emitted as-is and never scanned again, so a
//!   value that looks like a token does not trigger a second substitution
//! - values are not validated; an empty value is substituted lexically
//! - a token with no value fails the render with an error naming it
//! - a dunder name containing lowercase letters (`__image_tag__`,
//!   `__Image_Tag__`) is rejected as a mis-cased placeholder
//!
//! Other text, such as a bare `__` or a dunder starting with a digit,
//! passes through untouched.

use std::collections::BTreeMap;

use crate::error::RenderError;

/// Token holding the registry base path
pub const IMAGE_URL: &str = "IMAGE_URL";
/// Token holding the image tag
pub const IMAGE_TAG: &str = "IMAGE_TAG";
/// Token holding the fully qualified database instance connection name
pub const INSTANCE_CONNECTION_NAME: &str = "INSTANCE_CONNECTION_NAME";

/// Mapping from token name (without the surrounding underscores) to value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placeholders {
    values: BTreeMap<String, String>,
}

impl Placeholders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a token value
    pub fn with(mut self, token: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(token.into(), value.into());
        self
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.values.get(token).map(String::as_str)
    }

    /// Iterates over token names and values, sorted by token name
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A manifest template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Manifest name, used in error messages
    pub name: String,
    pub content: String,
}

impl Manifest {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Lists the placeholder tokens in this template, in order of appearance
    pub fn placeholders(&self) -> Vec<Placeholder> {
        let mut found = Vec::new();
        let mut cursor = 0;

        while let Some((start, token)) = next_token(&self.content, cursor) {
            found.push(Placeholder {
                name: token.name.to_string(),
                line: line_of(&self.content, start),
            });
            cursor = token.end;
        }

        found
    }

    /// Renders this template with the given values
    pub fn render(&self, placeholders: &Placeholders) -> Result<RenderedManifest, RenderError> {
        let template = self.content.as_str();
        let mut output = String::with_capacity(template.len());
        let mut copied_up_to = 0;
        let mut substitutions = 0;

        while let Some((start, token)) = next_token(template, copied_up_to) {
            if !token.well_formed {
                return Err(RenderError::MalformedPlaceholder {
                    manifest: self.name.clone(),
                    token: token.name.to_string(),
                    line: line_of(template, start),
                });
            }

            let value =
                placeholders
                    .get(token.name)
                    .ok_or_else(|| RenderError::UnresolvedPlaceholder {
                        manifest: self.name.clone(),
                        token: token.name.to_string(),
                        line: line_of(template, start),
                    })?;

            output.push_str(&template[copied_up_to..start]);
            output.push_str(value);
            copied_up_to = token.end;
            substitutions += 1;
        }

        output.push_str(&template[copied_up_to..]);

        Ok(RenderedManifest {
            name: self.name.clone(),
            content: output,
            substitutions,
        })
    }
}

/// A placeholder occurrence in a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub name: String,
    /// One-based line number
    pub line: usize,
}

/// A manifest with every placeholder substituted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedManifest {
    pub name: String,
    pub content: String,
    /// Number of tokens replaced
    pub substitutions: usize,
}

/// Joins rendered manifests into one multi-document YAML stream
pub fn join_documents(manifests: &[RenderedManifest]) -> String {
    let mut stream = String::new();

    for manifest in manifests {
        let content = manifest.content.trim_start_matches("---\n");
        if content.trim().is_empty() {
            continue;
        }
        if !stream.is_empty() {
            stream.push_str("---\n");
        }
        stream.push_str(content);
        if !content.ends_with('\n') {
            stream.push('\n');
        }
    }

    stream
}

struct Token<'a> {
    name: &'a str,
    /// False when the name contains lowercase letters
    well_formed: bool,
    /// Byte offset just past the closing underscores
    end: usize,
}

/// Finds the next token at or after `from`, returning its start offset
fn next_token(text: &str, from: usize) -> Option<(usize, Token<'_>)> {
    let bytes = text.as_bytes();
    let mut i = from;

    while i + 1 < bytes.len() {
        if bytes[i] == b'_' && bytes[i + 1] == b'_' {
            if let Some(token) = token_at(text, i) {
                return Some((i, token));
            }
        }
        i += 1;
    }

    None
}

/// Parses a token starting with the `__` at `start`
fn token_at(text: &str, start: usize) -> Option<Token<'_>> {
    let bytes = text.as_bytes();
    let name_start = start + 2;

    let first = *bytes.get(name_start)?;
    if !first.is_ascii_alphabetic() {
        return None;
    }

    let mut well_formed = first.is_ascii_uppercase();
    let mut i = name_start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'_' if bytes.get(i + 1) == Some(&b'_') => {
                return Some(Token {
                    name: &text[name_start..i],
                    well_formed,
                    end: i + 2,
                });
            }
            b'A'..=b'Z' | b'0'..=b'9' | b'_' => i += 1,
            b'a'..=b'z' => {
                well_formed = false;
                i += 1;
            }
            _ => return None,
        }
    }

    None
}

fn line_of(text: &str, offset: usize) -> usize {
    text[..offset].bytes().filter(|b| *b == b'\n').count() + 1
}
