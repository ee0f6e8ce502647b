//! Re-run generation whenever an analysis markdown file changes.

use crate::config::PathsConfig;
use crate::generator::{parse_all_subsystems, RunReport};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Only content changes to `.md` files trigger a rebuild; our own JSON
/// output never does.
pub fn touches_markdown(event: &Event) -> bool {
    let relevant = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    );
    relevant
        && event
            .paths
            .iter()
            .any(|p| p.extension().and_then(|e| e.to_str()) == Some("md"))
}

/// Block forever, regenerating after each burst of markdown changes.
/// `on_run` sees every completed run.
pub fn watch<F>(paths: &PathsConfig, debounce: Duration, mut on_run: F) -> notify::Result<()>
where
    F: FnMut(&RunReport),
{
    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx)?;
    watcher.watch(Path::new(&paths.source_root), RecursiveMode::Recursive)?;
    info!(source = %paths.source_root.display(), "watching for changes");

    while let Ok(event) = rx.recv() {
        match event {
            Ok(event) if touches_markdown(&event) => {
                // Swallow the rest of the burst.
                while rx.recv_timeout(debounce).is_ok() {}
                info!("change detected, regenerating");
                match parse_all_subsystems(paths) {
                    Ok(report) => on_run(&report),
                    Err(err) => error!("regeneration failed: {err}"),
                }
            }
            Ok(_) => {}
            Err(err) => warn!("watch error: {err}"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, ModifyKind};
    use std::path::PathBuf;

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn markdown_edits_trigger() {
        assert!(touches_markdown(&event(
            EventKind::Modify(ModifyKind::Any),
            "device_analysis/03_dev_stack_analysis.md"
        )));
        assert!(touches_markdown(&event(
            EventKind::Create(CreateKind::File),
            "core_analysis/new.md"
        )));
    }

    #[test]
    fn json_output_and_reads_do_not_trigger() {
        assert!(!touches_markdown(&event(
            EventKind::Modify(ModifyKind::Any),
            "src/data/subsystems/index.json"
        )));
        assert!(!touches_markdown(&event(
            EventKind::Access(AccessKind::Any),
            "core_analysis/00_core_overview.md"
        )));
    }
}
