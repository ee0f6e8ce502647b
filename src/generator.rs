//! The generation run: parse every subsystem directory, write one JSON file per
//! document, then the per-subsystem indexes, the root index and the stats.
//!
//! Per-file problems are recorded in the [`RunReport`] and never abort the
//! run. Only an unusable source root, an uncreatable target root, or a source
//! directory that cannot be listed are fatal.

use crate::classifier;
use crate::config::PathsConfig;
use crate::error::{FileError, PipelineError};
use crate::parser::{self, ComponentRecord, NamedEntry, OverviewRecord};
use crate::registry::{self, OverviewTarget, SubsystemDefinition, OTHER_CATEGORY};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

pub const INDEX_FILE: &str = "index.json";
pub const OVERVIEW_FILE: &str = "overview.json";
pub const STATS_FILE: &str = "parsing_stats.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubsystemStats {
    #[serde(skip)]
    pub subsystem: &'static str,
    pub overviews: usize,
    pub components: usize,
}

impl SubsystemStats {
    fn new(subsystem: &'static str) -> Self {
        Self {
            subsystem,
            overviews: 0,
            components: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub path: PathBuf,
    pub message: String,
}

impl From<FileError> for FileFailure {
    fn from(err: FileError) -> Self {
        Self {
            path: err.path().to_path_buf(),
            message: err.to_string(),
        }
    }
}

/// A component found in one subsystem's directory that the classifier would
/// place elsewhere (or nowhere).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Misplaced {
    pub component: String,
    pub found_in: &'static str,
    pub classified_as: Option<&'static str>,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// In registry order; missing source directories appear with zero counts.
    pub stats: Vec<SubsystemStats>,
    pub failures: Vec<FileFailure>,
    pub misplaced: Vec<Misplaced>,
}

impl RunReport {
    pub fn total_overviews(&self) -> usize {
        self.stats.iter().map(|s| s.overviews).sum()
    }

    pub fn total_components(&self) -> usize {
        self.stats.iter().map(|s| s.components).sum()
    }

    pub fn stats_for(&self, subsystem: &str) -> Option<&SubsystemStats> {
        self.stats.iter().find(|s| s.subsystem == subsystem)
    }
}

/// Everything accumulated while walking the subsystems.
#[derive(Debug, Default)]
struct RunContext {
    overviews: HashMap<&'static str, OverviewRecord>,
    category_overviews: HashMap<(&'static str, &'static str), OverviewRecord>,
    components: HashMap<&'static str, Vec<ComponentRecord>>,
    report: RunReport,
}

impl RunContext {
    fn record(&mut self, err: FileError) {
        error!(path = %err.path().display(), "{err}");
        self.report.failures.push(err.into());
    }
}

/// Regenerate the whole data tree from the built-in registry.
pub fn parse_all_subsystems(paths: &PathsConfig) -> Result<RunReport, PipelineError> {
    run(paths, registry::subsystems())
}

pub fn run(
    paths: &PathsConfig,
    subsystems: &'static [SubsystemDefinition],
) -> Result<RunReport, PipelineError> {
    let PathsConfig {
        source_root,
        target_root,
    } = paths;

    if !source_root.is_dir() {
        return Err(PipelineError::MissingSourceRoot(source_root.clone()));
    }
    fs::create_dir_all(target_root).map_err(|source| PipelineError::CreateTargetRoot {
        path: target_root.clone(),
        source,
    })?;

    info!(source = %source_root.display(), target = %target_root.display(), "parsing subsystems");

    let mut ctx = RunContext::default();
    for def in subsystems {
        let stats = process_subsystem(&mut ctx, def, source_root, target_root)?;
        ctx.report.stats.push(stats);
    }

    write_subsystem_indexes(&mut ctx, subsystems, target_root);
    write_main_index(&mut ctx, subsystems, target_root);
    write_stats(&mut ctx, target_root);

    Ok(ctx.report)
}

fn process_subsystem(
    ctx: &mut RunContext,
    def: &'static SubsystemDefinition,
    source_root: &Path,
    target_root: &Path,
) -> Result<SubsystemStats, PipelineError> {
    let mut stats = SubsystemStats::new(def.id);
    let source_dir = source_root.join(def.source_path);
    if !source_dir.is_dir() {
        warn!(subsystem = def.id, dir = %source_dir.display(), "source directory not found, skipping");
        return Ok(stats);
    }

    let target_dir = target_root.join(def.target_path);
    if let Err(err) = ensure_dir(&target_dir) {
        ctx.record(err);
        return Ok(stats);
    }

    let files = list_markdown(&source_dir)?;
    info!(subsystem = def.id, files = files.len(), "processing {}", def.name);

    let mut overviews = Vec::new();
    let mut components = Vec::new();
    for path in files {
        let name = file_name(&path);
        match def.overview_target(&name) {
            Some(target) => overviews.push((path, target)),
            None => components.push(path),
        }
    }

    for (path, target) in overviews {
        let record = match parser::parse_overview_file(&path) {
            Ok(record) => record,
            Err(err) => {
                ctx.record(err);
                continue;
            }
        };
        let written = match target {
            OverviewTarget::Subsystem => write_json(&target_dir.join(OVERVIEW_FILE), &record),
            OverviewTarget::Category(category) => {
                let dir = target_dir.join(category);
                ensure_dir(&dir).and_then(|_| write_json(&dir.join(OVERVIEW_FILE), &record))
            }
        };
        if let Err(err) = written {
            ctx.record(err);
            continue;
        }
        debug!(subsystem = def.id, file = %record.filename, "parsed overview");
        stats.overviews += 1;
        match target {
            OverviewTarget::Subsystem => {
                ctx.overviews.insert(def.id, record);
            }
            OverviewTarget::Category(category) => {
                ctx.category_overviews.insert((def.id, category), record);
            }
        }
    }

    let mut written_ids = HashSet::new();
    for path in components {
        let record = match parser::parse_component_file(&path, def.id) {
            Ok(record) => record,
            Err(err) => {
                ctx.record(err);
                continue;
            }
        };
        if let Err(err) = claim_component_id(&mut written_ids, &path, &record.id) {
            ctx.record(err);
            continue;
        }

        let classified = classifier::subsystem_for_component(&record.id);
        if classified != Some(def.id) {
            debug!(component = %record.id, found_in = def.id, classified_as = ?classified, "component outside its classified subsystem");
            ctx.report.misplaced.push(Misplaced {
                component: record.id.clone(),
                found_in: def.id,
                classified_as: classified,
            });
        }

        let written = match record.category.as_deref() {
            Some(category) if def.is_devices() => {
                let dir = target_dir.join(category);
                ensure_dir(&dir)
                    .and_then(|_| write_json(&dir.join(format!("{}.json", record.id)), &record))
            }
            _ => write_json(&target_dir.join(format!("{}.json", record.id)), &record),
        };
        if let Err(err) = written {
            ctx.record(err);
            continue;
        }

        debug!(subsystem = def.id, component = %record.id, "parsed component");
        stats.components += 1;
        ctx.components.entry(def.id).or_default().push(record);
    }

    info!(
        subsystem = def.id,
        overviews = stats.overviews,
        components = stats.components,
        "subsystem done"
    );
    Ok(stats)
}

/// Component ids share a directory with the overview and index files, and
/// must be unique within their subsystem.
fn claim_component_id(
    written: &mut HashSet<String>,
    path: &Path,
    id: &str,
) -> Result<(), FileError> {
    let file = format!("{id}.json");
    if file == INDEX_FILE || file == OVERVIEW_FILE {
        return Err(FileError::ReservedComponentId {
            path: path.to_path_buf(),
            id: id.to_string(),
        });
    }
    if !written.insert(id.to_string()) {
        return Err(FileError::DuplicateComponentId {
            path: path.to_path_buf(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// `*.md` files directly inside `dir` (symlinks followed), in lexical order.
fn list_markdown(dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| PipelineError::ListSource {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.path().is_file()
            && entry.path().extension().and_then(|e| e.to_str()) == Some("md")
        {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn ensure_dir(dir: &Path) -> Result<(), FileError> {
    fs::create_dir_all(dir).map_err(|source| FileError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// Pretty-printed with two-space indentation, no trailing newline.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), FileError> {
    let json = serde_json::to_string_pretty(value).map_err(|source| FileError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(|source| FileError::Write {
        path: path.to_path_buf(),
        source,
    })
}

// --- index artifacts -------------------------------------------------------

trait Keyed {
    fn key(&self) -> &str;
}

/// Serialize a list as a JSON object keyed by each item's id, keeping order.
#[allow(clippy::ptr_arg)]
fn keyed<T, S>(items: &Vec<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Keyed + Serialize,
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(items.len()))?;
    for item in items {
        map.serialize_entry(item.key(), item)?;
    }
    map.end()
}

#[allow(clippy::ptr_arg)]
fn pairs<S: Serializer>(items: &Vec<(String, usize)>, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(items.len()))?;
    for (key, count) in items {
        map.serialize_entry(key, count)?;
    }
    map.end()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSummary {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl From<&ComponentRecord> for ComponentSummary {
    fn from(record: &ComponentRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            description: record.description.clone(),
            category: record.category.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryIndex {
    pub id: String,
    pub name: String,
    pub title: String,
    pub description: String,
    pub summary: String,
    pub has_overview: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub architectural_patterns: Vec<NamedEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub key_components: Vec<NamedEntry>,
    pub components: Vec<ComponentSummary>,
}

impl Keyed for CategoryIndex {
    fn key(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubsystemIndex {
    pub id: String,
    pub name: String,
    pub title: String,
    pub description: String,
    pub summary: String,
    pub has_overview: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub architectural_patterns: Vec<NamedEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub key_components: Vec<NamedEntry>,
    pub components: Vec<ComponentSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty", serialize_with = "keyed")]
    pub categories: Vec<CategoryIndex>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubsystemEntry {
    pub id: String,
    pub name: String,
    pub description: String,
    pub component_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty", serialize_with = "pairs")]
    pub categories: Vec<(String, usize)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MainIndex {
    pub subsystems: Vec<SubsystemEntry>,
}

/// Title, description and summary with the static text as fallback.
fn describe(overview: Option<&OverviewRecord>, name: &str, fallback: &str) -> (String, String, String) {
    let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
    let title = overview.and_then(|o| non_empty(&o.title));
    let summary = overview.and_then(|o| non_empty(&o.summary));
    let description = summary
        .as_deref()
        .and_then(|s| s.split("\n\n").next())
        .map(|s| s.trim().to_string());
    (
        title.unwrap_or_else(|| name.to_string()),
        description.unwrap_or_else(|| fallback.to_string()),
        summary.unwrap_or_else(|| fallback.to_string()),
    )
}

fn build_subsystem_index(
    def: &SubsystemDefinition,
    overview: Option<&OverviewRecord>,
    components: &[ComponentRecord],
    category_overviews: &HashMap<(&'static str, &'static str), OverviewRecord>,
) -> SubsystemIndex {
    let (title, description, summary) = describe(overview, def.name, def.description);

    let categories = if def.is_devices() {
        build_categories(def, components, category_overviews)
    } else {
        Vec::new()
    };

    SubsystemIndex {
        id: def.id.to_string(),
        name: def.name.to_string(),
        title,
        description,
        summary,
        has_overview: overview.is_some(),
        architectural_patterns: overview.map(|o| o.architectural_patterns.clone()).unwrap_or_default(),
        key_components: overview.map(|o| o.key_components.clone()).unwrap_or_default(),
        components: components.iter().map(ComponentSummary::from).collect(),
        categories,
    }
}

fn category_of(record: &ComponentRecord) -> &str {
    record.category.as_deref().unwrap_or(OTHER_CATEGORY)
}

fn build_categories(
    def: &SubsystemDefinition,
    components: &[ComponentRecord],
    category_overviews: &HashMap<(&'static str, &'static str), OverviewRecord>,
) -> Vec<CategoryIndex> {
    let mut categories = Vec::new();
    for category in registry::device_categories() {
        let members: Vec<ComponentSummary> = components
            .iter()
            .filter(|c| category_of(c) == category.id)
            .map(ComponentSummary::from)
            .collect();
        if members.is_empty() {
            continue;
        }

        let overview = category_overviews.get(&(def.id, category.id));
        let (title, description, summary) = describe(overview, category.name, category.description);
        categories.push(CategoryIndex {
            id: category.id.to_string(),
            name: category.name.to_string(),
            title,
            description,
            summary,
            has_overview: overview.is_some(),
            architectural_patterns: overview.map(|o| o.architectural_patterns.clone()).unwrap_or_default(),
            key_components: overview.map(|o| o.key_components.clone()).unwrap_or_default(),
            components: members,
        });
    }
    categories
}

fn write_subsystem_indexes(
    ctx: &mut RunContext,
    subsystems: &'static [SubsystemDefinition],
    target_root: &Path,
) {
    for def in subsystems {
        let Some(components) = ctx.components.get(def.id).filter(|c| !c.is_empty()) else {
            warn!(subsystem = def.id, "no components parsed, skipping index");
            continue;
        };
        let index = build_subsystem_index(
            def,
            ctx.overviews.get(def.id),
            components,
            &ctx.category_overviews,
        );
        let path = target_root.join(def.target_path).join(INDEX_FILE);
        match write_json(&path, &index) {
            Ok(()) => info!(subsystem = def.id, components = index.components.len(), "wrote index"),
            Err(err) => ctx.record(err),
        }
    }
}

fn build_main_index(
    subsystems: &[SubsystemDefinition],
    components: &HashMap<&'static str, Vec<ComponentRecord>>,
) -> MainIndex {
    let entries = subsystems
        .iter()
        .map(|def| {
            let members = components.get(def.id).map(Vec::as_slice).unwrap_or(&[]);
            let categories = if def.is_devices() {
                registry::device_categories()
                    .iter()
                    .map(|c| {
                        let count = members.iter().filter(|m| category_of(m) == c.id).count();
                        (c.id.to_string(), count)
                    })
                    .filter(|(_, count)| *count > 0)
                    .collect()
            } else {
                Vec::new()
            };
            SubsystemEntry {
                id: def.id.to_string(),
                name: def.name.to_string(),
                description: def.description.to_string(),
                component_count: members.len(),
                categories,
            }
        })
        .collect();
    MainIndex { subsystems: entries }
}

fn write_main_index(
    ctx: &mut RunContext,
    subsystems: &'static [SubsystemDefinition],
    target_root: &Path,
) {
    let index = build_main_index(subsystems, &ctx.components);
    if let Err(err) = write_json(&target_root.join(INDEX_FILE), &index) {
        ctx.record(err);
    }
}

struct ParsingStats<'a>(&'a [SubsystemStats]);

impl Serialize for ParsingStats<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for stats in self.0 {
            map.serialize_entry(stats.subsystem, stats)?;
        }
        map.end()
    }
}

fn write_stats(ctx: &mut RunContext, target_root: &Path) {
    let path = target_root.join(STATS_FILE);
    let written = write_json(&path, &ParsingStats(&ctx.report.stats));
    if let Err(err) = written {
        ctx.record(err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, body: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    fn read_json(path: &Path) -> Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    fn fixture() -> (TempDir, PathsConfig) {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("analysis");
        write(
            &source,
            "core_analysis/00_core_system_overview.md",
            "# Core System\n\nThe core.\n\n## Architectural Patterns\n- Layering: everything on hb_converge\n",
        );
        write(
            &source,
            "core_analysis/01_hb_converge_analysis.md",
            "# hb_converge (Resolution)\n\n## Overview\nResolves messages.\n\n## Conclusion\nDone.\n",
        );
        write(
            &source,
            "device_analysis/00_device_system_overview.md",
            "# Devices\n\nAll devices.\n",
        );
        write(
            &source,
            "device_analysis/01_compute_devices_overview.md",
            "# Compute Devices\n\nRun code.\n\n## Key Components\n- dev_wasm: WebAssembly host\n",
        );
        write(
            &source,
            "device_analysis/03_dev_stack_analysis.md",
            "# dev_stack\n\n## Overview\nManages device stacks.\n\n## Questions\nirrelevant\n",
        );
        write(
            &source,
            "device_analysis/04_dev_wasm_analysis.md",
            "# dev_wasm\n\n## Overview\nExecutes WASM.\n",
        );
        write(
            &source,
            "device_analysis/05_dev_greeting_analysis.md",
            "# dev_greeting\n\n## Overview\nSays hello.\n",
        );
        write(&source, "device_analysis/notes.txt", "ignored");
        let paths = PathsConfig {
            source_root: source,
            target_root: tmp.path().join("out"),
        };
        (tmp, paths)
    }

    #[test]
    fn writes_component_overview_and_index_files() {
        let (_tmp, paths) = fixture();
        let report = parse_all_subsystems(&paths).unwrap();
        let out = &paths.target_root;

        assert!(report.failures.is_empty(), "{:?}", report.failures);
        assert_eq!(report.stats_for("core").unwrap().components, 1);
        assert_eq!(report.stats_for("core").unwrap().overviews, 1);
        assert_eq!(report.stats_for("devices").unwrap().overviews, 2);
        assert_eq!(report.stats_for("devices").unwrap().components, 3);
        assert_eq!(report.stats_for("storage").unwrap().components, 0);

        let stack = read_json(&out.join("devices/core/dev_stack.json"));
        assert_eq!(stack["description"], "Manages device stacks.");
        assert_eq!(stack["category"], "core");
        assert!(!stack["content"].as_str().unwrap().contains("Questions"));

        assert!(out.join("devices/compute/dev_wasm.json").is_file());
        assert!(out.join("devices/other/dev_greeting.json").is_file());
        assert!(out.join("devices/compute/overview.json").is_file());
        assert!(out.join("devices/overview.json").is_file());
        assert!(out.join("core/hb_converge.json").is_file());
        assert!(!out.join("storage").exists());
    }

    #[test]
    fn devices_index_groups_by_category() {
        let (_tmp, paths) = fixture();
        parse_all_subsystems(&paths).unwrap();
        let index = read_json(&paths.target_root.join("devices/index.json"));

        let categories = index["categories"].as_object().unwrap();
        let keys: Vec<_> = categories.keys().cloned().collect();
        assert_eq!(keys.len(), 3);
        assert!(keys.contains(&"core".to_string()));
        assert_eq!(categories["compute"]["title"], "Compute Devices");
        assert_eq!(categories["compute"]["hasOverview"], true);
        assert_eq!(categories["compute"]["keyComponents"][0]["name"], "dev_wasm");
        assert_eq!(categories["other"]["hasOverview"], false);
        assert_eq!(categories["other"]["summary"], "Devices that do not fit a more specific category.");
        assert_eq!(index["components"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn subsystem_index_uses_overview_or_falls_back() {
        let (_tmp, paths) = fixture();
        parse_all_subsystems(&paths).unwrap();

        let core = read_json(&paths.target_root.join("core/index.json"));
        assert_eq!(core["title"], "Core System");
        assert_eq!(core["summary"], "The core.");
        assert_eq!(core["architecturalPatterns"][0]["name"], "Layering");
        assert_eq!(core["components"][0]["id"], "hb_converge");
        assert_eq!(core["components"][0]["name"], "hb_converge");
        assert!(core.get("categories").is_none());

        assert!(!paths.target_root.join("storage/index.json").exists());
    }

    #[test]
    fn main_index_and_stats_cover_every_subsystem() {
        let (_tmp, paths) = fixture();
        parse_all_subsystems(&paths).unwrap();

        let main = read_json(&paths.target_root.join(INDEX_FILE));
        let entries = main["subsystems"].as_array().unwrap();
        let ids: Vec<_> = entries.iter().map(|e| e["id"].as_str().unwrap()).collect();
        assert_eq!(ids, ["core", "storage", "network", "arweave", "devices"]);
        assert_eq!(entries[1]["componentCount"], 0);
        assert_eq!(entries[4]["componentCount"], 3);
        assert_eq!(entries[4]["categories"]["core"], 1);

        let stats = read_json(&paths.target_root.join(STATS_FILE));
        assert_eq!(stats["core"]["components"], 1);
        assert_eq!(stats["storage"]["overviews"], 0);
    }

    #[test]
    fn regeneration_is_byte_identical() {
        let (_tmp, paths) = fixture();
        parse_all_subsystems(&paths).unwrap();
        let first_index = fs::read(paths.target_root.join("devices/index.json")).unwrap();
        let first_component = fs::read(paths.target_root.join("core/hb_converge.json")).unwrap();

        parse_all_subsystems(&paths).unwrap();
        assert_eq!(fs::read(paths.target_root.join("devices/index.json")).unwrap(), first_index);
        assert_eq!(
            fs::read(paths.target_root.join("core/hb_converge.json")).unwrap(),
            first_component
        );
    }

    #[test]
    fn second_matching_overview_wins() {
        let (_tmp, paths) = fixture();
        write(
            &paths.source_root,
            "core_analysis/00_core_zz_overview.md",
            "# Core Again\n\nSecond.\n",
        );
        let report = parse_all_subsystems(&paths).unwrap();
        assert!(report.failures.is_empty());
        assert_eq!(report.stats_for("core").unwrap().overviews, 2);
        let overview = read_json(&paths.target_root.join("core/overview.json"));
        assert_eq!(overview["title"], "Core Again");
    }

    #[test]
    fn unreadable_file_is_reported_and_skipped() {
        let (_tmp, paths) = fixture();
        fs::write(
            paths.source_root.join("core_analysis/02_hb_opts_analysis.md"),
            [0xff, 0xfe, 0x00],
        )
        .unwrap();
        let report = parse_all_subsystems(&paths).unwrap();
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].path.ends_with("02_hb_opts_analysis.md"));
        assert_eq!(report.stats_for("core").unwrap().components, 1);
        assert!(!paths.target_root.join("core/hb_opts.json").exists());
    }

    #[test]
    fn misplaced_components_are_reported() {
        let (_tmp, paths) = fixture();
        write(
            &paths.source_root,
            "core_analysis/05_hb_store_fs_analysis.md",
            "# hb_store_fs\n",
        );
        let report = parse_all_subsystems(&paths).unwrap();
        assert!(report.misplaced.contains(&Misplaced {
            component: "hb_store_fs".into(),
            found_in: "core",
            classified_as: Some("storage"),
        }));
        assert!(paths.target_root.join("core/hb_store_fs.json").is_file());
    }

    #[test]
    fn reserved_and_duplicate_component_ids_are_failures() {
        let (_tmp, paths) = fixture();
        write(&paths.source_root, "core_analysis/05_overview_analysis.md", "# overview\n");
        write(&paths.source_root, "core_analysis/06_index_analysis.md", "# index\n");
        write(&paths.source_root, "core_analysis/07_hb_x_analysis.md", "# hb_x first\n");
        write(&paths.source_root, "core_analysis/08_hb_x.md", "# hb_x second\n");
        let report = parse_all_subsystems(&paths).unwrap();
        let out = &paths.target_root;

        let failed: Vec<_> = report
            .failures
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            failed,
            ["05_overview_analysis.md", "06_index_analysis.md", "08_hb_x.md"]
        );
        assert_eq!(report.stats_for("core").unwrap().components, 2);

        let overview = read_json(&out.join("core/overview.json"));
        assert_eq!(overview["title"], "Core System");
        let hb_x = read_json(&out.join("core/hb_x.json"));
        assert_eq!(hb_x["name"], "hb_x first");

        let index = read_json(&out.join("core/index.json"));
        let ids: Vec<_> = index["components"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, ["hb_converge", "hb_x"]);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_markdown_is_parsed_and_dangling_links_skipped() {
        let (tmp, paths) = fixture();
        let elsewhere = tmp.path().join("elsewhere/hb_opts.md");
        write(tmp.path(), "elsewhere/hb_opts.md", "# hb_opts\n");
        let core = paths.source_root.join("core_analysis");
        std::os::unix::fs::symlink(&elsewhere, core.join("02_hb_opts_analysis.md")).unwrap();
        std::os::unix::fs::symlink(tmp.path().join("gone.md"), core.join("03_hb_gone_analysis.md"))
            .unwrap();

        let report = parse_all_subsystems(&paths).unwrap();
        assert!(report.failures.is_empty(), "{:?}", report.failures);
        assert_eq!(report.stats_for("core").unwrap().components, 2);
        assert!(paths.target_root.join("core/hb_opts.json").is_file());
    }

    #[test]
    fn missing_source_root_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let paths = PathsConfig {
            source_root: tmp.path().join("nope"),
            target_root: tmp.path().join("out"),
        };
        let err = parse_all_subsystems(&paths).unwrap_err();
        assert!(matches!(err, PipelineError::MissingSourceRoot(_)));
    }

    #[test]
    fn empty_source_root_still_writes_root_index() {
        let tmp = TempDir::new().unwrap();
        let paths = PathsConfig {
            source_root: tmp.path().to_path_buf(),
            target_root: tmp.path().join("out"),
        };
        let report = parse_all_subsystems(&paths).unwrap();
        assert_eq!(report.total_components(), 0);
        assert_eq!(report.stats.len(), registry::subsystems().len());
        assert!(paths.target_root.join(INDEX_FILE).is_file());
        assert!(paths.target_root.join(STATS_FILE).is_file());
    }
}
