//! Section extraction for generated research reports
//!
//! Reports are LLM free text that is asked to follow a fixed layout of five
//! emoji-marked sections. Extraction is an ordered-marker scan: a section
//! starts right after its marker and stops at the earlier of the next
//! section's glyph or the first blank line. Highlights run to the end of the
//! report. Nothing here fails: a missing or malformed section is simply
//! absent from the result.

use crate::types::ResearchLink;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// First `[...]` or `(...)` token on a line
static LINK_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(.*?)\]|\((.*?)\)").expect("link token pattern is valid"));

const OVERVIEW_MARKER: &str = "🏢 COMPANY OVERVIEW";
const BULLET: char = '•';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    BusinessAnalysis,
    KeyPeople,
    RecentDevelopments,
    Links,
    Highlights,
}

impl Section {
    /// Sections in report order
    pub const ORDER: [Section; 5] = [
        Section::BusinessAnalysis,
        Section::KeyPeople,
        Section::RecentDevelopments,
        Section::Links,
        Section::Highlights,
    ];

    pub fn marker(&self) -> &'static str {
        match self {
            Section::BusinessAnalysis => "💼 BUSINESS ANALYSIS",
            Section::KeyPeople => "👥 KEY PEOPLE",
            Section::RecentDevelopments => "📈 RECENT DEVELOPMENTS",
            Section::Links => "🌎 Links:",
            Section::Highlights => "⭐ HIGHLIGHTS",
        }
    }

    /// Leading glyph of the marker
    pub fn glyph(&self) -> &'static str {
        match self {
            Section::BusinessAnalysis => "💼",
            Section::KeyPeople => "👥",
            Section::RecentDevelopments => "📈",
            Section::Links => "🌎",
            Section::Highlights => "⭐",
        }
    }

    /// The section that follows this one, if any
    pub fn next(&self) -> Option<Section> {
        match self {
            Section::BusinessAnalysis => Some(Section::KeyPeople),
            Section::KeyPeople => Some(Section::RecentDevelopments),
            Section::RecentDevelopments => Some(Section::Links),
            Section::Links => Some(Section::Highlights),
            Section::Highlights => None,
        }
    }
}

/// Sections found in one report
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedReport {
    pub sections: HashMap<Section, String>,
    pub links: Vec<ResearchLink>,
}

impl ExtractedReport {
    pub fn section(&self, section: Section) -> Option<&str> {
        self.sections.get(&section).map(String::as_str)
    }

    /// Section text, empty when absent
    pub fn text(&self, section: Section) -> String {
        self.section(section).unwrap_or_default().to_string()
    }

    /// One entry per non-empty line of the key-people section, bullets removed
    pub fn key_people(&self) -> Vec<String> {
        self.section(Section::KeyPeople)
            .map(|text| {
                text.lines()
                    .map(strip_bullet)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Split a report into its sections and links
pub fn extract(report: &str) -> ExtractedReport {
    let mut extracted = ExtractedReport::default();

    for section in Section::ORDER {
        if let Some(text) = section_text(report, section) {
            extracted.sections.insert(section, text.to_string());
        }
    }

    if let Some(links) = extracted.section(Section::Links) {
        extracted.links = parse_links(links);
    }

    extracted
}

fn section_text(report: &str, section: Section) -> Option<&str> {
    let start = report.find(section.marker())? + section.marker().len();
    let rest = &report[start..];

    let end = match section.next() {
        None => rest.len(),
        Some(next) => {
            let glyph = rest.find(next.glyph());
            let blank = rest.find("\n\n");
            match (glyph, blank) {
                (Some(g), Some(b)) => g.min(b),
                (Some(g), None) => g,
                (None, Some(b)) => b,
                (None, None) => rest.len(),
            }
        }
    };

    Some(rest[..end].trim())
}

fn strip_bullet(line: &str) -> &str {
    let line = line.trim();
    line.strip_prefix(BULLET).map(str::trim_start).unwrap_or(line)
}

fn parse_links(section: &str) -> Vec<ResearchLink> {
    section
        .lines()
        .filter_map(|line| {
            let captures = LINK_TOKEN.captures(line)?;
            let url = captures
                .get(1)
                .or_else(|| captures.get(2))
                .map(|m| m.as_str().trim())
                .filter(|url| !url.is_empty())?;

            Some(ResearchLink {
                title: strip_bullet(line).to_string(),
                url: url.to_string(),
            })
        })
        .collect()
}

/// Value of a `• Label: value` line in the company overview block
pub fn overview_field(report: &str, label: &str) -> Option<String> {
    let start = report.find(OVERVIEW_MARKER)? + OVERVIEW_MARKER.len();
    let rest = &report[start..];
    let end = [
        rest.find("\n\n"),
        rest.find(Section::BusinessAnalysis.glyph()),
    ]
    .into_iter()
    .flatten()
    .min()
    .unwrap_or(rest.len());

    rest[..end].lines().find_map(|line| {
        let value = strip_bullet(line).strip_prefix(label)?.strip_prefix(':')?.trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}

/// Value after the first `Label:` anywhere in the report
pub fn labeled_value(report: &str, label: &str) -> Option<String> {
    let label = format!("{}:", label);

    report.lines().find_map(|line| {
        let idx = line.find(&label)?;
        let value = line[idx + label.len()..].trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}

/// The `Total Raised:` figure from the funding details
pub fn funding(report: &str) -> Option<String> {
    labeled_value(report, "Total Raised")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const FULL_REPORT: &str = "🏢 COMPANY OVERVIEW
• Name: Acme Corp
• Industry: Robotics
• Founded: 2015
• Headquarters: San Francisco, CA

💼 BUSINESS ANALYSIS
• Core Business: Warehouse robots
  - Total Raised: $120M

👥 KEY PEOPLE
• Jane Doe, CEO
• John Roe, CTO

📈 RECENT DEVELOPMENTS
• Latest News: Series C announced

🌎 Links:
• Official Website [https://acme.example]
• Blog (https://acme.example/blog)
• Twitter [https://twitter.com/acme]

⭐ HIGHLIGHTS
• Strengths: Fast deployment
";

    #[test]
    fn test_full_report_yields_all_sections() {
        let report = extract(FULL_REPORT);

        for section in Section::ORDER {
            let text = report.section(section).unwrap_or_default();
            assert!(!text.is_empty(), "{:?} should be non-empty", section);
        }
        assert_eq!(report.links.len(), 3);
        assert_eq!(report.links[0].url, "https://acme.example");
        assert_eq!(report.links[0].title, "Official Website [https://acme.example]");
        assert_eq!(report.links[1].url, "https://acme.example/blog");
        assert_eq!(
            report.key_people(),
            vec!["Jane Doe, CEO".to_string(), "John Roe, CTO".to_string()]
        );
        assert_eq!(
            report.section(Section::Highlights),
            Some("• Strengths: Fast deployment")
        );
    }

    #[test]
    fn test_blank_line_terminates_section() {
        let report = extract("💼 BUSINESS ANALYSIS\nFoo\n\n👥 KEY PEOPLE\n• Alice\n• Bob\n\n");

        assert_eq!(report.section(Section::BusinessAnalysis), Some("Foo"));
        assert_eq!(
            report.key_people(),
            vec!["Alice".to_string(), "Bob".to_string()]
        );
        assert!(report.section(Section::Highlights).is_none());
    }

    #[test]
    fn test_missing_key_people_marker() {
        let report = extract("💼 BUSINESS ANALYSIS\nFoo\n\n📈 RECENT DEVELOPMENTS\nBar\n");

        assert!(report.section(Section::KeyPeople).is_none());
        assert!(report.key_people().is_empty());
        assert_eq!(report.section(Section::RecentDevelopments), Some("Bar"));
    }

    #[test]
    fn test_next_glyph_terminates_without_blank_line() {
        let report = extract("💼 BUSINESS ANALYSIS\nFoo\n👥 KEY PEOPLE\n• Alice\n");

        assert_eq!(report.section(Section::BusinessAnalysis), Some("Foo"));
        assert_eq!(report.key_people(), vec!["Alice".to_string()]);
    }

    #[rstest]
    #[case("", 0)]
    #[case("no markers at all", 0)]
    #[case("🌎 Links:\n• Plain text line\n• Site [https://a.example]\n", 1)]
    #[case("🌎 Links:\n• Empty []\n• Paren (https://b.example)\n", 1)]
    fn test_link_lines(#[case] report: &str, #[case] expected: usize) {
        assert_eq!(extract(report).links.len(), expected);
    }

    #[rstest]
    #[case("Industry", Some("Robotics"))]
    #[case("Founded", Some("2015"))]
    #[case("Headquarters", Some("San Francisco, CA"))]
    #[case("Revenue", None)]
    fn test_overview_field(#[case] label: &str, #[case] expected: Option<&str>) {
        assert_eq!(overview_field(FULL_REPORT, label).as_deref(), expected);
    }

    #[test]
    fn test_funding() {
        assert_eq!(funding(FULL_REPORT).as_deref(), Some("$120M"));
        assert_eq!(funding("nothing here"), None);
        assert_eq!(labeled_value("• Revenue:   \n", "Revenue"), None);
        assert_eq!(
            labeled_value(FULL_REPORT, "Latest News").as_deref(),
            Some("Series C announced")
        );
    }

    #[test]
    fn test_section_chain() {
        let mut walked = vec![Section::BusinessAnalysis];
        while let Some(next) = walked.last().and_then(Section::next) {
            walked.push(next);
        }
        assert_eq!(walked, Section::ORDER.to_vec());
    }
}
