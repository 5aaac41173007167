//! Section parser: splits the model's rewrite into the three fixed sections.
//!
//! Line-driven state machine. A line starting with `## ` switches the current
//! section (known or not); any other line is appended to the current section
//! only when that section is one of the three canonical ones.

use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::warn;

/// Literal heading marker, including the single space.
pub const HEADING_MARKER: &str = "## ";

/// The three sections of a rewritten resume, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    ProfessionalSummary,
    KeyExperience,
    CoreSkills,
}

impl Section {
    pub const ALL: [Section; 3] = [
        Section::ProfessionalSummary,
        Section::KeyExperience,
        Section::CoreSkills,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Section::ProfessionalSummary => "Professional Summary",
            Section::KeyExperience => "Key Experience",
            Section::CoreSkills => "Core Skills",
        }
    }

    /// Exact, case-sensitive match against the canonical title.
    pub fn from_title(title: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.title() == title)
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Accumulated text per section. Always holds exactly the three keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionMap {
    content: [String; 3],
}

impl SectionMap {
    pub fn get(&self, section: Section) -> &str {
        &self.content[section.index()]
    }

    /// Sections in declaration order, regardless of the order they appeared in.
    pub fn iter(&self) -> impl Iterator<Item = (Section, &str)> + '_ {
        Section::ALL.into_iter().map(move |s| (s, self.get(s)))
    }

    fn append_line(&mut self, section: Section, line: &str) {
        let acc = &mut self.content[section.index()];
        acc.push_str(line);
        acc.push('\n');
    }
}

impl Serialize for SectionMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Section::ALL.len()))?;
        for (section, content) in self.iter() {
            map.serialize_entry(section.title(), content)?;
        }
        map.end()
    }
}

/// Where the parser currently attributes body lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParserState {
    /// Before any heading.
    None,
    Known(Section),
    /// Under a heading that is not one of the three; its lines are dropped.
    Unknown(String),
}

/// Deviations from the three-heading output contract. Informational only.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct SectionReport {
    /// Non-blank lines seen before the first heading.
    pub preamble_lines_dropped: usize,
    /// Titles of headings that matched none of the sections, in order.
    pub unknown_headings: Vec<String>,
    /// Canonical sections that never got a heading.
    pub missing_sections: Vec<&'static str>,
}

impl SectionReport {
    pub fn is_clean(&self) -> bool {
        self.preamble_lines_dropped == 0
            && self.unknown_headings.is_empty()
            && self.missing_sections.is_empty()
    }

    /// Human-readable warnings for the reviewer.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.preamble_lines_dropped > 0 {
            warnings.push(format!(
                "{} line(s) before the first section heading were ignored",
                self.preamble_lines_dropped
            ));
        }
        for title in &self.unknown_headings {
            warnings.push(format!("Unexpected section '{title}' was ignored"));
        }
        for title in &self.missing_sections {
            warnings.push(format!("The rewrite has no '{title}' section"));
        }
        warnings
    }
}

/// Characters that end a line: LF, CR, VT, FF, the file/group/record
/// separators, NEL and the Unicode line and paragraph separators.
const LINE_BREAKS: [char; 10] = [
    '\n', '\r', '\u{0b}', '\u{0c}', '\u{1c}', '\u{1d}', '\u{1e}', '\u{85}', '\u{2028}', '\u{2029}',
];

/// Splits on every line boundary in [`LINE_BREAKS`], with `\r\n` counting as one.
/// A trailing break does not produce a final empty line.
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> + '_ {
    let mut rest = text;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        match rest.find(&LINE_BREAKS[..]) {
            Some(at) => {
                let line = &rest[..at];
                let tail = &rest[at..];
                let width = if tail.starts_with("\r\n") {
                    2
                } else {
                    tail.chars().next().map_or(1, char::len_utf8)
                };
                rest = &tail[width..];
                Some(line)
            }
            None => Some(std::mem::take(&mut rest)),
        }
    })
}

/// One transition of the state machine. `line` is already trimmed.
fn step(state: ParserState, line: &str, sections: &mut SectionMap) -> ParserState {
    if let Some(rest) = line.strip_prefix(HEADING_MARKER) {
        let title = rest.trim();
        return match Section::from_title(title) {
            Some(section) => ParserState::Known(section),
            None => ParserState::Unknown(title.to_string()),
        };
    }

    if let ParserState::Known(section) = state {
        sections.append_line(section, line);
    }
    state
}

/// Splits `text` into the three sections. Never fails.
pub fn parse_sections(text: &str) -> SectionMap {
    let mut sections = SectionMap::default();
    let mut state = ParserState::None;
    for line in split_lines(text) {
        state = step(state, line.trim(), &mut sections);
    }
    sections
}

/// Checks `text` against the three-heading contract. Informational only:
/// the parse result is the same whatever this reports.
pub fn check_contract(text: &str) -> SectionReport {
    let mut report = SectionReport::default();
    let mut seen = [false; 3];
    let mut before_first_heading = true;

    for line in split_lines(text).map(str::trim) {
        match line.strip_prefix(HEADING_MARKER) {
            Some(rest) => {
                before_first_heading = false;
                let title = rest.trim();
                match Section::from_title(title) {
                    Some(section) => seen[section.index()] = true,
                    None => report.unknown_headings.push(title.to_string()),
                }
            }
            None if before_first_heading && !line.is_empty() => {
                report.preamble_lines_dropped += 1;
            }
            None => {}
        }
    }

    report.missing_sections = Section::ALL
        .into_iter()
        .filter(|s| !seen[s.index()])
        .map(Section::title)
        .collect();

    if !report.is_clean() {
        warn!(
            "Rewrite deviates from section contract: preamble_lines={}, unknown={:?}, missing={:?}",
            report.preamble_lines_dropped, report.unknown_headings, report.missing_sections
        );
    }

    report
}
