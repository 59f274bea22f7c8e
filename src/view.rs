//! Open a built artifact in a viewer.

use crate::{config::ViewConfig, debug, log, utils::exec::spawn_detached};
use std::path::Path;

/// Platform opener used when `[view] command` is empty.
fn default_opener() -> Vec<String> {
    let opener: &[&str] = if cfg!(target_os = "macos") {
        &["open"]
    } else if cfg!(windows) {
        &["cmd", "/C", "start", ""]
    } else {
        &["xdg-open"]
    };
    opener.iter().map(|s| (*s).to_owned()).collect()
}

fn viewer_command(config: &ViewConfig) -> Vec<String> {
    if config.command.is_empty() {
        default_opener()
    } else {
        config.command.clone()
    }
}

/// Launch the viewer without waiting for it. Failures are only logged.
pub fn open(path: &Path, config: &ViewConfig) {
    let command = viewer_command(config);
    let args = [path.to_string_lossy().into_owned()];
    debug!("view"; "{}", command.join(" "));

    if let Err(err) = spawn_detached(&command, &args) {
        log!("view"; "cannot open `{}`: {err:#}", path.display());
    }
}
