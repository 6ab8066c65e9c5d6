//! Line classification
//!
//! Every document line is tagged before any field is decoded, so each kind
//! has exactly one decoder. Body lines take their kind from the enclosing
//! `###` section; the leading-character guess only applies outside one.

/// `###` section within a round block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Positions,
    Events,
}

/// A classified document line, borrowing the original text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    /// `# ...` header line, text after the `#`
    Pragma(&'a str),
    /// `## ...` round header, text after the `##`
    RoundHeader(&'a str),
    Section(Section),
    /// `P<idx> <tokens>`
    Positions(&'a str),
    /// `<tick>:<CODE>,... | ...`
    Events(&'a str),
    /// `###` line naming a section this codec does not know
    UnknownSection(&'a str),
    Blank,
    Unrecognized(&'a str),
}

impl<'a> Line<'a> {
    pub fn classify(raw: &'a str) -> Self {
        let line = raw.trim();
        if line.is_empty() {
            return Line::Blank;
        }

        if let Some(rest) = line.strip_prefix("###") {
            return match rest.trim() {
                "Positions" => Line::Section(Section::Positions),
                "Events" => Line::Section(Section::Events),
                _ => Line::UnknownSection(line),
            };
        }
        if let Some(rest) = line.strip_prefix("##") {
            return Line::RoundHeader(rest.trim());
        }
        if let Some(rest) = line.strip_prefix('#') {
            return Line::Pragma(rest.trim());
        }

        let mut chars = line.chars();
        match (chars.next(), chars.next()) {
            (Some('P'), Some(c)) if c.is_ascii_digit() => Line::Positions(line),
            (Some(c), _) if c.is_ascii_digit() => Line::Events(line),
            _ => Line::Unrecognized(line),
        }
    }

    /// Classify a line inside the given section.
    ///
    /// Under `### Events` or `### Positions` every non-blank, non-`#` line
    /// belongs to that section, so a corrupted leading token stays scoped to
    /// its own token.
    pub fn classify_in(raw: &'a str, section: Option<Section>) -> Self {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            return Self::classify(raw);
        }
        match section {
            Some(Section::Events) => Line::Events(line),
            Some(Section::Positions) => Line::Positions(line),
            None => Self::classify(raw),
        }
    }
}
