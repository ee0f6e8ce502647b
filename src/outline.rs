//! Heading outline of a markdown document.
//!
//! Section boundaries come from the mdast produced by the `markdown` crate, so
//! a `## ` line inside a fenced code block never splits a section. Only ATX
//! headings (`#`, `##`, ...) count; setext underlines are treated as text.
//!
//! A document is cut into a preamble (everything before the first level-2
//! heading) and one section per level-2 heading. Sections are byte slices of
//! the source, so rejoining the retained ones reproduces them verbatim.

use markdown::mdast::Node;
use markdown::ParseOptions;
use once_cell::sync::Lazy;
use regex::Regex;

static ATX_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^ {0,3}(#{1,6})(?:[ \t]+(.*?))?(?:[ \t]+#+)?[ \t]*$")
        .expect("heading pattern must compile")
});

static FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ {0,3}(```|~~~)").expect("fence pattern must compile"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub depth: u8,
    pub text: String,
    /// Byte offset of the heading line.
    pub start: usize,
    /// Byte offset just past the heading text (before the line break).
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section<'a> {
    /// `None` for the preamble.
    pub title: Option<String>,
    /// Heading line plus body.
    pub text: &'a str,
    /// Everything after the heading line.
    pub body: &'a str,
}

#[derive(Debug)]
pub struct Outline<'a> {
    source: &'a str,
    headings: Vec<Heading>,
}

impl<'a> Outline<'a> {
    pub fn parse(source: &'a str) -> Self {
        let headings = mdast_headings(source).unwrap_or_else(|| scan_headings(source));
        Self { source, headings }
    }

    pub fn headings(&self) -> &[Heading] {
        &self.headings
    }

    fn first_h1(&self) -> Option<&Heading> {
        self.headings.iter().find(|h| h.depth == 1)
    }

    /// Text of the first level-1 heading.
    pub fn title(&self) -> Option<&str> {
        self.first_h1().map(|h| h.text.as_str())
    }

    /// The block between the title and the next level-2 heading, trimmed.
    pub fn lead(&self) -> Option<&'a str> {
        let title = self.first_h1()?;
        let end = self
            .headings
            .iter()
            .find(|h| h.depth == 2 && h.start > title.start)
            .map(|h| h.start)
            .unwrap_or(self.source.len());
        let lead = self.source.get(title.end..end)?.trim();
        (!lead.is_empty()).then_some(lead)
    }

    pub fn sections(&self) -> Vec<Section<'a>> {
        let splits: Vec<&Heading> = self.headings.iter().filter(|h| h.depth == 2).collect();
        let mut sections = Vec::with_capacity(splits.len() + 1);

        let preamble_end = splits.first().map(|h| h.start).unwrap_or(self.source.len());
        let preamble = &self.source[..preamble_end];
        sections.push(Section {
            title: None,
            text: preamble,
            body: preamble,
        });

        for (i, heading) in splits.iter().enumerate() {
            let end = splits
                .get(i + 1)
                .map(|next| next.start)
                .unwrap_or(self.source.len());
            sections.push(Section {
                title: Some(heading.text.clone()),
                text: &self.source[heading.start..end],
                body: &self.source[heading.end..end],
            });
        }
        sections
    }

    /// First level-2 section whose title satisfies `matches`.
    pub fn find_section<F>(&self, matches: F) -> Option<Section<'a>>
    where
        F: Fn(&str) -> bool,
    {
        self.sections()
            .into_iter()
            .find(|s| s.title.as_deref().is_some_and(&matches))
    }

    /// Source with every level-2 section titled exactly one of `excluded`
    /// removed, heading and body. Retained text is untouched.
    pub fn without_sections(&self, excluded: &[&str]) -> String {
        if excluded.is_empty() {
            return self.source.to_string();
        }
        self.sections()
            .into_iter()
            .filter(|s| match s.title.as_deref() {
                Some(title) => !excluded.contains(&title),
                None => true,
            })
            .map(|s| s.text)
            .collect()
    }
}

fn mdast_headings(source: &str) -> Option<Vec<Heading>> {
    let root = markdown::to_mdast(source, &ParseOptions::default()).ok()?;
    let children = root.children()?;

    let mut headings = Vec::new();
    for node in children {
        let Node::Heading(heading) = node else { continue };
        let position = heading.position.as_ref()?;
        let (start, end) = (position.start.offset, position.end.offset);
        if !source.is_char_boundary(start) || !source.is_char_boundary(end) {
            return None;
        }
        let line = source[start..end].lines().next().unwrap_or("");
        // Setext headings are not section markers here.
        let Some(caps) = ATX_HEADING.captures(line) else { continue };
        headings.push(Heading {
            depth: heading.depth,
            text: caps.get(2).map(|m| m.as_str().trim()).unwrap_or("").to_string(),
            start,
            end: start + line.len(),
        });
    }
    Some(headings)
}

/// Line scanner used when the markdown parser rejects the input.
fn scan_headings(source: &str) -> Vec<Heading> {
    let mut headings = Vec::new();
    let mut in_fence = false;
    let mut offset = 0;

    for line in source.split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        let content = line.trim_end_matches(['\n', '\r']);

        if FENCE.is_match(content) {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        if let Some(caps) = ATX_HEADING.captures(content) {
            headings.push(Heading {
                depth: caps[1].len() as u8,
                text: caps.get(2).map(|m| m.as_str().trim()).unwrap_or("").to_string(),
                start,
                end: start + content.len(),
            });
        }
    }
    headings
}
