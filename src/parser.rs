use crate::classifier;
use crate::error::FileError;
use crate::outline::Outline;
use crate::registry::{self, DEVICES};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Sections dropped from component documents.
pub const COMPONENT_EXCLUDED_SECTIONS: &[&str] = &[
    "Questions and Insights",
    "Questions",
    "Conclusion",
    "Recategorization Considerations",
];

/// Overview documents currently keep every section.
pub const OVERVIEW_EXCLUDED_SECTIONS: &[&str] = &[];

static PATTERNS_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(architectural|design|common) patterns\b").expect("pattern heading must compile")
});

static COMPONENTS_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(key|main|core) components\b").expect("component heading must compile")
});

// `- Name: description`, tolerating bold around the name.
static NAMED_BULLET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*[-*+][ \t]+\*{0,2}([^:*\n]+?)\*{0,2}[ \t]*:[ \t]*\*{0,2}[ \t]*(.+?)[ \t]*$")
        .expect("bullet pattern must compile")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedEntry {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewRecord {
    pub title: String,
    pub summary: String,
    pub filename: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub architectural_patterns: Vec<NamedEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_components: Vec<NamedEntry>,
    pub content: String,
    pub has_mermaid: bool,
    pub has_code: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentRecord {
    pub id: String,
    pub name: String,
    pub subsystem: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlapping_subsystems: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub content: String,
    pub has_mermaid: bool,
    pub has_code: bool,
}

fn read_source(path: &Path) -> Result<String, FileError> {
    fs::read_to_string(path).map_err(|source| FileError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub fn parse_overview_file(path: &Path) -> Result<OverviewRecord, FileError> {
    let source = read_source(path)?;
    Ok(parse_overview(&source, &file_name(path)))
}

pub fn parse_component_file(path: &Path, subsystem: &str) -> Result<ComponentRecord, FileError> {
    let source = read_source(path)?;
    Ok(parse_component(&source, &file_name(path), subsystem))
}

pub fn parse_overview(source: &str, filename: &str) -> OverviewRecord {
    let outline = Outline::parse(source);
    let content = outline.without_sections(OVERVIEW_EXCLUDED_SECTIONS);

    let entries_under = |heading: &Regex| {
        outline
            .find_section(|title| heading.is_match(title))
            .map(|section| named_entries(section.body))
            .unwrap_or_default()
    };

    OverviewRecord {
        title: outline.title().unwrap_or_default().to_string(),
        summary: outline.lead().unwrap_or_default().to_string(),
        filename: filename.to_string(),
        architectural_patterns: entries_under(&*PATTERNS_HEADING),
        key_components: entries_under(&*COMPONENTS_HEADING),
        has_mermaid: has_mermaid(&content),
        has_code: has_code(&content),
        content,
    }
}

pub fn parse_component(source: &str, filename: &str, subsystem: &str) -> ComponentRecord {
    let outline = Outline::parse(source);
    let id = classifier::extract_component_id(filename);

    let name = match outline.title() {
        Some(title) => title
            .split_once('(')
            .map(|(before, _)| before.trim())
            .filter(|n| !n.is_empty())
            .unwrap_or(title)
            .to_string(),
        None => id.clone(),
    };
    let name = if name.is_empty() { id.clone() } else { name };

    let category = (subsystem == DEVICES)
        .then(|| classifier::device_category(&id, source).to_string());

    let overlapping_subsystems = registry::overlapping_subsystems(&id)
        .map(|owners| owners.iter().map(|s| s.to_string()).collect());

    let description = outline
        .find_section(|title| title.eq_ignore_ascii_case("Overview"))
        .and_then(|section| first_line(section.body));

    let content = outline.without_sections(COMPONENT_EXCLUDED_SECTIONS);

    ComponentRecord {
        id,
        name,
        subsystem: subsystem.to_string(),
        category,
        overlapping_subsystems,
        description,
        has_mermaid: has_mermaid(&content),
        has_code: has_code(&content),
        content,
    }
}

fn named_entries(body: &str) -> Vec<NamedEntry> {
    NAMED_BULLET
        .captures_iter(body)
        .map(|caps| NamedEntry {
            name: caps[1].trim().to_string(),
            description: caps[2].trim().to_string(),
        })
        .filter(|e| !e.name.is_empty() && !e.description.is_empty())
        .collect()
}

fn first_line(body: &str) -> Option<String> {
    body.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}

fn has_mermaid(content: &str) -> bool {
    content.to_ascii_lowercase().contains("```mermaid")
}

fn has_code(content: &str) -> bool {
    content.contains("```")
}
