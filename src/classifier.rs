//! Filename and component classification.
//!
//! All functions here are pure lookups against the tables in [`crate::registry`].

use crate::registry::{self, DEVICES, DEVICE_PREFIX, OTHER_CATEGORY};
use once_cell::sync::Lazy;
use regex::Regex;

static COMPONENT_FILENAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d+_(.+?)(?:_analysis)?\.md$").expect("component filename pattern must compile")
});

/// `03_dev_stack_analysis.md` becomes `dev_stack`. Names that don't carry a
/// numeric prefix only lose the `.md` extension and an `_analysis` suffix.
pub fn extract_component_id(filename: &str) -> String {
    if let Some(caps) = COMPONENT_FILENAME.captures(filename) {
        return caps[1].to_string();
    }
    let stem = filename.strip_suffix(".md").unwrap_or(filename);
    stem.strip_suffix("_analysis").unwrap_or(stem).to_string()
}

/// Primary subsystem for a component id, or `None` when nothing claims it.
pub fn subsystem_for_component(component_id: &str) -> Option<&'static str> {
    if let Some(owners) = registry::overlapping_subsystems(component_id) {
        return owners.first().copied();
    }

    for (subsystem, patterns) in registry::subsystem_patterns() {
        if patterns.iter().any(|p| p.is_match(component_id)) {
            return Some(subsystem);
        }
    }

    if component_id.starts_with(DEVICE_PREFIX) {
        return Some(DEVICES);
    }

    None
}

/// Device category for a component already placed in the devices subsystem.
///
/// Resolution order: explicit map, then each category pattern in
/// declaration order (id first, then document text), then `other`. Never
/// returns an unknown id.
pub fn device_category(component_id: &str, content: &str) -> &'static str {
    if let Some(category) = registry::explicit_device_category(component_id) {
        return category;
    }

    registry::device_categories()
        .iter()
        .find(|c| c.pattern.is_match(component_id) || c.pattern.is_match(content))
        .map(|c| c.id)
        .unwrap_or(OTHER_CATEGORY)
}
