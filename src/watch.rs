//! Watch mode: rebuild the document whenever it is saved.
//!
//! The parent directory is watched rather than the file itself, since many
//! editors save by replacing the file. Events for other files are ignored.
//!
//! ```text
//! notify thread ──events──▶ channel ──▶ main loop ──▶ Builder::build
//!                                          ▲
//! Ctrl+C ──────────── stop flag ───────────┘ (polled)
//! ```

use crate::{
    build::{BuildRequest, Builder},
    log,
};
use anyhow::{Context, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::{
    ffi::OsString,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::{self, RecvTimeoutError},
    },
    time::{Duration, Instant},
};

/// How often the loop checks the stop flag
const POLL_INTERVAL: Duration = Duration::from_millis(100);

// =============================================================================
// Session State
// =============================================================================

/// Decides which events trigger a rebuild.
#[derive(Debug, Clone)]
pub struct WatchSession {
    target: OsString,
    debounce: Duration,
    last_rebuild: Option<Instant>,
}

impl WatchSession {
    pub fn new(document: &Path, debounce: Duration) -> Self {
        Self {
            target: document.file_name().unwrap_or_default().to_os_string(),
            debounce,
            last_rebuild: None,
        }
    }

    /// A modification of the watched file itself.
    pub fn is_target(&self, event: &Event) -> bool {
        matches!(event.kind, EventKind::Modify(_))
            && event
                .paths
                .iter()
                .any(|path| !path.is_dir() && path.file_name() == Some(self.target.as_os_str()))
    }

    /// Whether a change seen at `now` is outside the debounce window.
    ///
    /// Saving often emits several events, and a rebuild touches files beside
    /// the document; both land inside the window.
    pub fn accept(&self, now: Instant) -> bool {
        self.last_rebuild
            .is_none_or(|last| now.saturating_duration_since(last) >= self.debounce)
    }

    /// Record a completed rebuild.
    pub fn finish(&mut self, at: Instant) {
        self.last_rebuild = Some(at);
    }
}

// =============================================================================
// Event Loop
// =============================================================================

/// Rebuild after a change, logging a header caught mid-edit.
fn rebuild(builder: &Builder, request: &BuildRequest) -> Result<()> {
    match builder.build(request) {
        Ok(_) => Ok(()),
        Err(err) if err.is_recoverable() => {
            log!("error"; "{:#}", anyhow::Error::new(err));
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

/// Build once, then rebuild on every save until Ctrl+C.
pub fn watch(builder: &Builder, request: &BuildRequest, debounce: Duration) -> Result<()> {
    let document = &request.document;
    let dir = document
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = Arc::clone(&stop);
    ctrlc::set_handler(move || stop_flag.store(true, Ordering::SeqCst))
        .context("Failed to set Ctrl+C handler")?;

    let mut session = WatchSession::new(document, debounce);
    builder.build(request)?;
    session.finish(Instant::now());

    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx).context("Failed to create file watcher")?;
    watcher
        .watch(dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("Failed to watch {}", dir.display()))?;
    log!("watch"; "watching `{}` (Ctrl+C to stop)", document.display());

    while !stop.load(Ordering::SeqCst) {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(Ok(event)) if session.is_target(&event) && session.accept(Instant::now()) => {
                let now = chrono::Local::now().format("%I:%M:%S %p");
                log!("watch"; "{} changed at {now}", document.display());
                rebuild(builder, request)?;
                session.finish(Instant::now());
            }
            Ok(Err(e)) => log!("watch"; "error: {e}"),
            Err(RecvTimeoutError::Disconnected) => break,
            _ => {}
        }
    }

    drop(watcher);
    log!("watch"; "file monitor stopped");
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{build::engine::Engine, config::Settings, style::StyleStore};
    use notify::event::{CreateKind, DataChange, ModifyKind};
    use std::{fs, path::PathBuf};
    use tempfile::TempDir;

    fn modify(path: &str) -> Event {
        Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path(PathBuf::from(path))
    }

    fn session(debounce_ms: u64) -> WatchSession {
        WatchSession::new(Path::new("/docs/paper.md"), Duration::from_millis(debounce_ms))
    }

    #[test]
    fn test_is_target() {
        let session = session(100);
        assert!(session.is_target(&modify("/docs/paper.md")));
        assert!(!session.is_target(&modify("/docs/paper.yaml")));
        assert!(!session.is_target(&modify("/docs/paper.pdf")));

        let create = Event::new(EventKind::Create(CreateKind::File)).add_path("/docs/paper.md".into());
        assert!(!session.is_target(&create));
    }

    #[test]
    fn test_first_change_accepted() {
        assert!(session(100).accept(Instant::now()));
    }

    /// Two saves 50 ms apart rebuild once; 200 ms apart, twice.
    #[test]
    fn test_debounce() {
        let t0 = Instant::now();

        let mut near = session(100);
        let mut rebuilds = 0;
        for offset in [0, 50] {
            let at = t0 + Duration::from_millis(offset);
            if near.accept(at) {
                rebuilds += 1;
                near.finish(at);
            }
        }
        assert_eq!(rebuilds, 1);

        let mut far = session(100);
        let mut rebuilds = 0;
        for offset in [0, 200] {
            let at = t0 + Duration::from_millis(offset);
            if far.accept(at) {
                rebuilds += 1;
                far.finish(at);
            }
        }
        assert_eq!(rebuilds, 2);
    }

    #[test]
    fn test_window_starts_at_completion() {
        let t0 = Instant::now();
        let mut session = session(100);
        // A slow rebuild finishing at t0+1s; its own writes follow shortly
        session.finish(t0 + Duration::from_secs(1));
        assert!(!session.accept(t0 + Duration::from_millis(1050)));
        assert!(session.accept(t0 + Duration::from_millis(1100)));
    }

    /// Engine that writes whatever `--output` names.
    struct Touch;

    impl Engine for Touch {
        fn invoke(&self, args: &[String]) -> anyhow::Result<()> {
            if let Some(output) = args.iter().find_map(|a| a.strip_prefix("--output=")) {
                fs::write(output, "artifact")?;
            }
            Ok(())
        }

        fn describe(&self, args: &[String]) -> String {
            args.join(" ")
        }
    }

    fn rebuild_with(header: &str, tex: bool) -> Result<()> {
        let dir = TempDir::new().unwrap();
        let document = dir.path().join("paper.md");
        fs::write(&document, format!("{header}# Body\n")).unwrap();

        let settings = Settings::default();
        let store = StyleStore::parse("test", "default:\n").unwrap();
        let builder = Builder::new(&settings, &store).with_engine(Box::new(Touch));
        let request = BuildRequest {
            document,
            overrides: Default::default(),
            tex,
            latexmk: false,
            view: false,
            timeit: false,
            retry: false,
        };
        rebuild(&builder, &request)
    }

    #[test]
    fn test_rebuild_tolerates_malformed_header() {
        assert!(rebuild_with("---\ntitle: [unclosed\n---\n", false).is_ok());
    }

    #[test]
    fn test_rebuild_stops_on_strict_style_miss() {
        let err = rebuild_with("---\nstyle: nonexistent\n---\n", false).unwrap_err();
        assert!(err.to_string().contains("nonexistent"));
    }

    #[test]
    fn test_rebuild_succeeds() {
        assert!(rebuild_with("---\nstyle: default\n---\n", true).is_ok());
    }
}
