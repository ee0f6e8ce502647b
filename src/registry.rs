//! Static tables describing how the analysis tree is organised.
//!
//! Everything here is fixed for the lifetime of the process. Order matters:
//! subsystems are processed in declaration order, and device categories are
//! tried in declaration order with the catch-all `other` last.

use once_cell::sync::Lazy;
use regex::Regex;

pub const DEVICES: &str = "devices";
pub const OTHER_CATEGORY: &str = "other";
pub const DEVICE_PREFIX: &str = "dev_";

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("registry pattern must compile")
}

#[derive(Debug)]
pub struct SubsystemDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub source_path: &'static str,
    pub target_path: &'static str,
    pub description: &'static str,
    pub overview_pattern: Regex,
    /// Only populated for the devices subsystem.
    pub category_overviews: Vec<(&'static str, Regex)>,
}

/// Where an overview document belongs once parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverviewTarget {
    Subsystem,
    Category(&'static str),
}

impl SubsystemDefinition {
    pub fn is_devices(&self) -> bool {
        self.id == DEVICES
    }

    /// Returns `None` for component documents.
    pub fn overview_target(&self, filename: &str) -> Option<OverviewTarget> {
        if self.overview_pattern.is_match(filename) {
            return Some(OverviewTarget::Subsystem);
        }
        self.category_overviews
            .iter()
            .find(|(_, pattern)| pattern.is_match(filename))
            .map(|(category, _)| OverviewTarget::Category(category))
    }
}

#[derive(Debug)]
pub struct DeviceCategoryDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// Tested against the component id, then against the raw document.
    pub pattern: Regex,
}

static SUBSYSTEMS: Lazy<Vec<SubsystemDefinition>> = Lazy::new(|| {
    vec![
        SubsystemDefinition {
            id: "core",
            name: "Core System",
            source_path: "core_analysis",
            target_path: "core",
            description: "Message resolution, configuration and the utilities every other subsystem builds on.",
            overview_pattern: re(r"(?i)^\d+_core.*overview.*\.md$"),
            category_overviews: Vec::new(),
        },
        SubsystemDefinition {
            id: "storage",
            name: "Storage & Caching",
            source_path: "storage_analysis",
            target_path: "storage",
            description: "Pluggable stores and the content-addressed cache layered over them.",
            overview_pattern: re(r"(?i)^\d+_storage.*overview.*\.md$"),
            category_overviews: Vec::new(),
        },
        SubsystemDefinition {
            id: "network",
            name: "Network & HTTP",
            source_path: "network_analysis",
            target_path: "network",
            description: "HTTP server and client, gateway access, routing and name resolution.",
            overview_pattern: re(r"(?i)^\d+_network.*overview.*\.md$"),
            category_overviews: Vec::new(),
        },
        SubsystemDefinition {
            id: "arweave",
            name: "Arweave Integration",
            source_path: "arweave_analysis",
            target_path: "arweave",
            description: "Transaction formats, bundling and wallet handling for the Arweave network.",
            overview_pattern: re(r"(?i)^\d+_arweave.*overview.*\.md$"),
            category_overviews: Vec::new(),
        },
        SubsystemDefinition {
            id: DEVICES,
            name: "Device Ecosystem",
            source_path: "device_analysis",
            target_path: "devices",
            description: "Devices: the modular units of computation that messages are resolved against.",
            overview_pattern: re(r"(?i)^\d+_device_system_overview\.md$"),
            category_overviews: DEVICE_CATEGORY_IDS
                .iter()
                .map(|id| (*id, re(&format!(r"(?i)^\d+_{id}_devices_overview\.md$"))))
                .collect(),
        },
    ]
});

const DEVICE_CATEGORY_IDS: &[&str] = &[
    "core", "process", "compute", "security", "network", "data", OTHER_CATEGORY,
];

static DEVICE_CATEGORIES: Lazy<Vec<DeviceCategoryDefinition>> = Lazy::new(|| {
    vec![
        DeviceCategoryDefinition {
            id: "core",
            name: "Core Devices",
            description: "Fundamental devices for message handling, composition and patching.",
            pattern: re(r"(?i)^dev_(message|stack|meta|patch|multipass|dedup)$|core device"),
        },
        DeviceCategoryDefinition {
            id: "process",
            name: "Process Management",
            description: "Processes, scheduling, cron and result pushing.",
            pattern: re(r"(?i)^dev_(process|scheduler|cron|monitor|push)|process management|scheduler"),
        },
        DeviceCategoryDefinition {
            id: "compute",
            name: "Computation",
            description: "Execution environments such as WebAssembly and Lua.",
            pattern: re(r"(?i)^dev_(wasm|wasi|lua|json_iface|genesis_wasm|delegated_compute)|webassembly|\bwasm\b"),
        },
        DeviceCategoryDefinition {
            id: "security",
            name: "Security & Identity",
            description: "Attestation, trusted execution, signing and payment gating.",
            pattern: re(r"(?i)^dev_(snp|green_zone|hyperbuddy|simple_pay|p4|faff)|attestation|signature"),
        },
        DeviceCategoryDefinition {
            id: "network",
            name: "Communication",
            description: "Relaying, routing and remote compute units.",
            pattern: re(r"(?i)^dev_(relay|router|cu|name|lookup)(_|$)|\brouting\b|\brelay\b"),
        },
        DeviceCategoryDefinition {
            id: "data",
            name: "Data & Codecs",
            description: "Encodings, manifests and cached data access.",
            pattern: re(r"(?i)^dev_(codec_|json|structured|flat|manifest|cache)|codec|serializ"),
        },
        DeviceCategoryDefinition {
            id: OTHER_CATEGORY,
            name: "Other Devices",
            description: "Devices that do not fit a more specific category.",
            pattern: re(r""),
        },
    ]
});

static SUBSYSTEM_PATTERNS: Lazy<Vec<(&'static str, Vec<Regex>)>> = Lazy::new(|| {
    vec![
        (
            "core",
            vec![
                re(r"^hb$"),
                re(r"^hb_(ao|converge|message|path|util|opts|features|maps|singleton|private|json|structured_fields|escape|crypto|beamr|app|sup|event|format|keccak|link|process_monitor|tracer)"),
            ],
        ),
        ("storage", vec![re(r"^hb_(store|cache)"), re(r"^hb_persistent_cache")]),
        ("network", vec![re(r"^hb_(http|client|gateway|router|name)"), re(r"^hb_http_")]),
        ("arweave", vec![re(r"^ar_")]),
    ]
});

/// Components that conceptually belong to several subsystems. The first
/// entry is the primary placement.
const OVERLAPS: &[(&str, &[&str])] = &[
    ("hb_cache", &["storage", "core"]),
    ("hb_http_server", &["network", "core"]),
    ("hb_store_gateway", &["network", "storage"]),
    ("dev_cache", &["storage", DEVICES]),
    ("dev_router", &[DEVICES, "network"]),
    ("dev_message", &[DEVICES, "core"]),
    ("hb_gateway_client", &["network", "arweave"]),
];

const DEVICE_CATEGORY_MAP: &[(&str, &str)] = &[
    ("dev_stack", "core"),
    ("dev_message", "core"),
    ("dev_meta", "core"),
    ("dev_process", "process"),
    ("dev_scheduler", "process"),
    ("dev_wasm", "compute"),
    ("dev_snp", "security"),
    ("dev_green_zone", "security"),
    ("dev_codec_httpsig", "security"),
    ("dev_relay", "network"),
    ("dev_router", "network"),
    ("dev_codec_flat", "data"),
    ("dev_codec_structured", "data"),
];

pub fn subsystems() -> &'static [SubsystemDefinition] {
    &SUBSYSTEMS
}

pub fn subsystem(id: &str) -> Option<&'static SubsystemDefinition> {
    SUBSYSTEMS.iter().find(|s| s.id == id)
}

pub fn device_categories() -> &'static [DeviceCategoryDefinition] {
    &DEVICE_CATEGORIES
}

pub fn device_category_definition(id: &str) -> Option<&'static DeviceCategoryDefinition> {
    DEVICE_CATEGORIES.iter().find(|c| c.id == id)
}

pub fn subsystem_patterns() -> &'static [(&'static str, Vec<Regex>)] {
    &SUBSYSTEM_PATTERNS
}

pub fn overlapping_subsystems(component_id: &str) -> Option<&'static [&'static str]> {
    OVERLAPS
        .iter()
        .find(|(id, _)| *id == component_id)
        .map(|(_, subsystems)| *subsystems)
}

pub fn explicit_device_category(component_id: &str) -> Option<&'static str> {
    DEVICE_CATEGORY_MAP
        .iter()
        .find(|(id, _)| *id == component_id)
        .map(|(_, category)| *category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subsystem_ids_are_unique() {
        let mut ids: Vec<_> = subsystems().iter().map(|s| s.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), subsystems().len());
    }

    #[test]
    fn catch_all_category_is_last() {
        let last = device_categories().last().unwrap();
        assert_eq!(last.id, OTHER_CATEGORY);
        assert!(last.pattern.is_match(""));
        assert!(last.pattern.is_match("anything at all"));
    }

    #[test]
    fn explicit_map_and_overlaps_reference_known_ids() {
        for (_, category) in DEVICE_CATEGORY_MAP {
            assert!(device_category_definition(category).is_some(), "{category}");
        }
        for (_, owners) in OVERLAPS {
            for owner in *owners {
                assert!(subsystem(owner).is_some(), "{owner}");
            }
        }
    }

    #[test]
    fn devices_overview_targets() {
        let devices = subsystem(DEVICES).unwrap();
        assert_eq!(
            devices.overview_target("00_device_system_overview.md"),
            Some(OverviewTarget::Subsystem)
        );
        assert_eq!(
            devices.overview_target("01_compute_devices_overview.md"),
            Some(OverviewTarget::Category("compute"))
        );
        assert_eq!(devices.overview_target("03_dev_stack_analysis.md"), None);
    }

    #[test]
    fn core_overview_pattern_ignores_components() {
        let core = subsystem("core").unwrap();
        assert!(core.overview_target("00_core_system_overview.md").is_some());
        assert!(core.overview_target("04_hb_converge_analysis.md").is_none());
    }
}
