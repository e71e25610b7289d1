// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Minimal deb822 control paragraph parsing.

APT `.sources` files use the deb822 format: paragraphs of `Field: value`
lines separated by blank lines, with indented continuation lines and `#`
comments. See `sources.list(5)`.
*/

use {
    crate::error::{CodenameError, Result},
    std::{borrow::Cow, io::BufRead},
};

/// A field in a control paragraph.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ControlField<'a> {
    name: Cow<'a, str>,
    value: Cow<'a, str>,
}

impl<'a> ControlField<'a> {
    /// Construct an instance from a field name and value.
    pub fn new(name: Cow<'a, str>, value: Cow<'a, str>) -> Self {
        Self { name, value }
    }

    /// The name of this field.
    pub fn name(&self) -> &str {
        self.name.as_ref()
    }

    /// Obtain the value as a [&str].
    pub fn value_str(&self) -> &str {
        self.value.as_ref()
    }

    /// Obtain an iterator of words in the value.
    ///
    /// Continuation lines are folded, so words may come from any line.
    pub fn iter_words(&self) -> impl Iterator<Item = &str> {
        self.value.as_ref().split_ascii_whitespace()
    }
}

/// A paragraph in a control file.
///
/// Field names are case insensitive on read and case preserving on set. A
/// field may only occur once; setting it again replaces the earlier value.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ControlParagraph<'a> {
    fields: Vec<ControlField<'a>>,
}

impl<'a> ControlParagraph<'a> {
    /// Whether the paragraph has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Set the value of a field.
    pub fn set_field(&mut self, field: ControlField<'a>) {
        self.fields
            .retain(|cf| !cf.name.eq_ignore_ascii_case(&field.name));
        self.fields.push(field);
    }

    /// Set the value of a field defined via strings.
    pub fn set_field_from_string(&mut self, name: Cow<'a, str>, value: Cow<'a, str>) {
        self.set_field(ControlField::new(name, value));
    }

    /// Iterate over fields in insertion order.
    pub fn iter_fields(&self) -> impl Iterator<Item = &ControlField<'a>> {
        self.fields.iter()
    }

    /// Obtain the field with a given name.
    pub fn field(&self, name: &str) -> Option<&ControlField<'a>> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Whether a named field is present.
    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Obtain the raw string value of the named field.
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.field(name).map(|f| f.value_str())
    }

    /// Obtain the value of a field evaluated as a deb822 boolean.
    ///
    /// `yes`/`true` and `no`/`false` are recognized case insensitively. Any other
    /// value is [None].
    pub fn field_bool(&self, name: &str) -> Option<bool> {
        self.field_str(name)
            .and_then(|v| match v.to_ascii_lowercase().as_str() {
                "yes" | "true" => Some(true),
                "no" | "false" => Some(false),
                _ => None,
            })
    }

    /// Obtain an iterator of words in the named field.
    pub fn field_words(&self, name: &str) -> Option<impl Iterator<Item = &str>> {
        self.field(name).map(|f| f.iter_words())
    }
}

/// A parsed paragraph and the 1-based line number it started on.
pub type NumberedParagraph = (usize, ControlParagraph<'static>);

/// Holds parsing state for deb822 files.
///
/// Instances are fed lines of text and emit [ControlParagraph] instances as
/// they are completed. Each emitted paragraph is paired with the 1-based line
/// number it started on.
#[derive(Clone, Debug, Default)]
pub struct ControlFileParser {
    paragraph: ControlParagraph<'static>,
    paragraph_line: Option<usize>,
    field: Option<String>,
    line_number: usize,
}

impl ControlFileParser {
    /// Write a line to the parser.
    ///
    /// If the line terminates an in-progress paragraph, that paragraph is returned.
    pub fn write_line(&mut self, line: &str) -> Result<Option<NumberedParagraph>> {
        self.line_number += 1;

        // Comments may appear anywhere and don't terminate paragraphs.
        if line.starts_with('#') {
            return Ok(None);
        }

        let is_empty_line = line.trim().is_empty();
        let is_indented = (line.starts_with(' ') || line.starts_with('\t')) && !is_empty_line;

        let current_field = self.field.take();

        if is_empty_line {
            if let Some(field) = current_field {
                self.flush_field(field)?;
            }

            return Ok(self.take_paragraph());
        }

        match (current_field, is_indented) {
            (Some(v), false) => {
                self.flush_field(v)?;
                self.start_field(line);
            }
            (None, false) => {
                self.start_field(line);
            }
            (Some(v), true) => {
                self.field = Some(format!("{}\n{}", v.trim_end(), line.trim()));
            }
            (None, true) => {
                return Err(CodenameError::ControlParseError(format!(
                    "line {}: continuation line without a field",
                    self.line_number
                )));
            }
        }

        Ok(None)
    }

    /// Finish parsing, consuming self.
    pub fn finish(mut self) -> Result<Option<NumberedParagraph>> {
        if let Some(field) = self.field.take() {
            self.flush_field(field)?;
        }

        Ok(self.take_paragraph())
    }

    fn start_field(&mut self, line: &str) {
        if self.paragraph_line.is_none() {
            self.paragraph_line = Some(self.line_number);
        }

        self.field = Some(line.trim_end().to_string());
    }

    fn take_paragraph(&mut self) -> Option<NumberedParagraph> {
        let line = self.paragraph_line.take().unwrap_or(self.line_number);

        if self.paragraph.is_empty() {
            None
        } else {
            Some((line, std::mem::take(&mut self.paragraph)))
        }
    }

    fn flush_field(&mut self, v: String) -> Result<()> {
        let (name, value) = v.split_once(':').ok_or_else(|| {
            CodenameError::ControlParseError(format!(
                "line {}: error parsing '{}'; missing colon",
                self.line_number, v
            ))
        })?;

        self.paragraph.set_field_from_string(
            Cow::Owned(name.trim().to_string()),
            Cow::Owned(value.trim().to_string()),
        );

        Ok(())
    }
}

/// Parse all paragraphs from a reader.
///
/// Paragraphs are returned with the line number they started on.
pub fn parse_paragraphs<R: BufRead>(reader: R) -> Result<Vec<NumberedParagraph>> {
    let mut paragraphs = vec![];
    let mut parser = ControlFileParser::default();

    for line in reader.lines() {
        if let Some(paragraph) = parser.write_line(&line?)? {
            paragraphs.push(paragraph);
        }
    }

    if let Some(paragraph) = parser.finish()? {
        paragraphs.push(paragraph);
    }

    Ok(paragraphs)
}

/// Parse all paragraphs from a string.
pub fn parse_paragraphs_str(s: &str) -> Result<Vec<NumberedParagraph>> {
    parse_paragraphs(std::io::BufReader::new(s.as_bytes()))
}
