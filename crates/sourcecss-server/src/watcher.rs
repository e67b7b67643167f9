//! Watching recipes for changes.

use std::path::{Component, Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc as async_mpsc;

const DEBOUNCE: Duration = Duration::from_millis(100);

/// What a burst of file changes asks to regenerate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// Changes were confined to these component directories
    Components(Vec<String>),

    /// Something outside a component directory changed
    All,
}

/// Watches the source tree and configuration file.
pub struct RecipeWatcher {
    _watcher: RecommendedWatcher,
}

impl RecipeWatcher {
    /// Watch `source_dir` recursively and each of `files`.
    ///
    /// Events arriving within a short window are coalesced into one
    /// [`WatchEvent`].
    pub fn new(
        source_dir: &Path,
        files: &[PathBuf],
    ) -> Result<(Self, async_mpsc::Receiver<WatchEvent>), std::io::Error> {
        let (sync_tx, sync_rx) = mpsc::channel();
        let (async_tx, async_rx) = async_mpsc::channel(16);

        let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
            if let Ok(event) = res {
                let _ = sync_tx.send(event);
            }
        })
        .map_err(std::io::Error::other)?;

        let source_dir = source_dir
            .canonicalize()
            .unwrap_or_else(|_| source_dir.to_path_buf());
        if source_dir.exists() {
            watcher
                .watch(&source_dir, RecursiveMode::Recursive)
                .map_err(std::io::Error::other)?;
        }
        for file in files {
            if file.exists() {
                watcher
                    .watch(file, RecursiveMode::NonRecursive)
                    .map_err(std::io::Error::other)?;
            }
        }

        std::thread::spawn(move || {
            while let Ok(first) = sync_rx.recv() {
                let mut batch = vec![first];
                while let Ok(event) = sync_rx.recv_timeout(DEBOUNCE) {
                    batch.push(event);
                }

                let paths = batch
                    .iter()
                    .filter(|event| is_change(&event.kind))
                    .flat_map(|event| event.paths.iter());

                if let Some(event) = coalesce(paths, &source_dir) {
                    if async_tx.blocking_send(event).is_err() {
                        return;
                    }
                }
            }
        });

        Ok((Self { _watcher: watcher }, async_rx))
    }
}

fn is_change(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) | EventKind::Any
    )
}

/// Component directory a changed file belongs to, if any.
///
/// Only files inside `<source_dir>/<component>/` count; the component
/// directory itself or anything else regenerates everything.
pub fn component_for_path(path: &Path, source_dir: &Path) -> Option<String> {
    let relative = path.strip_prefix(source_dir).ok()?;
    let mut components = relative.components();

    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), Some(_)) => Some(name.to_string_lossy().into_owned()),
        _ => None,
    }
}

/// Reduce changed paths to one event; `None` when there were none.
pub fn coalesce<'a>(
    paths: impl IntoIterator<Item = &'a PathBuf>,
    source_dir: &Path,
) -> Option<WatchEvent> {
    let mut components: Vec<String> = Vec::new();
    let mut seen_any = false;

    for path in paths {
        seen_any = true;
        match component_for_path(path, source_dir) {
            Some(component) => {
                if !components.contains(&component) {
                    components.push(component);
                }
            }
            None => return Some(WatchEvent::All),
        }
    }

    seen_any.then_some(WatchEvent::Components(components))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn maps_files_to_component_directories() {
        let src = Path::new("/project/src");

        assert_eq!(
            component_for_path(Path::new("/project/src/button/recipe.toml"), src),
            Some("button".to_string())
        );
        assert_eq!(
            component_for_path(Path::new("/project/src/text-input/nested/x"), src),
            Some("text-input".to_string())
        );
        assert_eq!(component_for_path(Path::new("/project/src/button"), src), None);
        assert_eq!(component_for_path(Path::new("/project/src/utils.toml"), src), None);
        assert_eq!(component_for_path(Path::new("/project/sourcecss.toml"), src), None);
    }

    #[test]
    fn coalesces_bursts() {
        let src = Path::new("/p/src");
        let paths = [
            PathBuf::from("/p/src/button/recipe.toml"),
            PathBuf::from("/p/src/label/recipe.toml"),
            PathBuf::from("/p/src/button/recipe.toml"),
        ];

        assert_eq!(
            coalesce(&paths, src),
            Some(WatchEvent::Components(vec!["button".into(), "label".into()]))
        );

        let with_config = [
            PathBuf::from("/p/src/button/recipe.toml"),
            PathBuf::from("/p/sourcecss.toml"),
        ];
        assert_eq!(coalesce(&with_config, src), Some(WatchEvent::All));

        assert_eq!(coalesce(&Vec::<PathBuf>::new(), src), None);
    }

    #[tokio::test]
    async fn reports_component_changes() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(src.join("button")).unwrap();

        let (watcher, mut rx) = RecipeWatcher::new(&src, &[]).unwrap();

        // Give the backend time to set up
        tokio::time::sleep(Duration::from_millis(100)).await;

        fs::write(src.join("button/recipe.toml"), "kind = \"classes\"").unwrap();

        let event = tokio::time::timeout(Duration::from_secs(3), rx.recv()).await;

        drop(watcher);

        assert_eq!(
            event.expect("timeout waiting for file watch event"),
            Some(WatchEvent::Components(vec!["button".into()]))
        );
    }
}
