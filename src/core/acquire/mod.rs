// ─── Acquisition Engine ───
// Plans every file a profile chain needs and fetches what is missing or
// stale through the worker pool.

mod plan;

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use serde::Serialize;
use tracing::{debug, info};

use crate::core::assets::AssetIndex;
use crate::core::downloader::{
    part_path, run_pool, Downloader, ProgressEvent, ProgressPhase, ProgressSink, TaskCategory,
    PART_SUFFIX,
};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::resolver::{load_chain, MAX_INHERITANCE_DEPTH};
use crate::core::state::EngineState;
use crate::core::version::{Platform, ProfileStore};

pub use plan::{
    asset_index_task, asset_object_tasks, dedupe_by_destination, plan_chain_tasks, DownloadTask,
    PlanLayout,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AcquireReport {
    pub planned: usize,
    pub skipped: usize,
    pub downloaded: usize,
}

/// Running per-category counts behind the progress events.
struct Tracker<'a> {
    totals: HashMap<TaskCategory, u64>,
    done: Mutex<HashMap<TaskCategory, u64>>,
    sink: &'a ProgressSink<'a>,
}

impl<'a> Tracker<'a> {
    fn new(tasks: &[DownloadTask], sink: &'a ProgressSink<'a>) -> Self {
        let mut totals = HashMap::new();
        for task in tasks {
            *totals.entry(task.category).or_insert(0) += 1;
        }
        Self {
            totals,
            done: Mutex::new(HashMap::new()),
            sink,
        }
    }

    fn emit(&self, phase: ProgressPhase, task: &DownloadTask) {
        let total = self.totals.get(&task.category).copied().unwrap_or(0);
        let current = {
            let mut done = match self.done.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let count = done.entry(task.category).or_insert(0);
            if phase == ProgressPhase::Done {
                *count += 1;
            }
            *count
        };
        (self.sink)(ProgressEvent {
            phase,
            category: task.category,
            current,
            total,
            label: task.label.clone(),
        });
    }
}

/// Verify-first transfer of one task. `Ok(true)` when bytes were fetched.
async fn run_task(
    state: &EngineState,
    downloader: &Downloader,
    task: &DownloadTask,
    tracker: &Tracker<'_>,
) -> LauncherResult<bool> {
    if tokio::fs::try_exists(&task.dest).await.unwrap_or(false) {
        tracker.emit(ProgressPhase::Verify, task);
        let valid = match &task.expected_hash {
            Some(hash) => Downloader::validate(&task.dest, hash).await?,
            None => true,
        };
        if valid {
            tracker.emit(ProgressPhase::Done, task);
            return Ok(false);
        }
        debug!("Stale file {:?}, downloading again", task.dest);
    }

    tracker.emit(ProgressPhase::Download, task);
    let opts = state.fetch_options(&task.url, &task.label, task.expected_hash.clone());
    downloader
        .fetch_file(&task.url, &task.dest, &opts, &|_, _| {})
        .await?;
    tracker.emit(ProgressPhase::Done, task);
    Ok(true)
}

async fn run_batch(
    state: &EngineState,
    tasks: Vec<DownloadTask>,
    progress: &ProgressSink<'_>,
    report: &mut AcquireReport,
) -> LauncherResult<()> {
    if tasks.is_empty() {
        return Ok(());
    }
    let downloader = state.downloader();
    let tracker = Tracker::new(&tasks, progress);
    let downloaded = AtomicUsize::new(0);
    let planned = tasks.len();

    let (downloader, tracker, counter) = (&downloader, &tracker, &downloaded);
    run_pool(tasks, state.settings.worker_count(), move |task| async move {
        if run_task(state, downloader, &task, tracker).await? {
            counter.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    })
    .await?;

    let downloaded = downloaded.load(Ordering::SeqCst);
    report.planned += planned;
    report.downloaded += downloaded;
    report.skipped += planned - downloaded;
    Ok(())
}

/// Acquire the client archive, libraries, natives, asset index and asset
/// objects for `version_id` and its ancestors.
///
/// A second call over a complete tree transfers nothing. A hash mismatch
/// aborts the batch and leaves the offending `.part` file on disk.
pub async fn acquire_profile_artifacts(
    state: &EngineState,
    version_id: &str,
    progress: &ProgressSink<'_>,
) -> LauncherResult<AcquireReport> {
    let mut store = ProfileStore::new(&state.root_dir);
    let chain = load_chain(&mut store, version_id, MAX_INHERITANCE_DEPTH)?.ok_or_else(|| {
        LauncherError::ProfileResolution(format!(
            "cannot resolve the inheritance chain of {}",
            version_id
        ))
    })?;

    let platform = Platform::current();
    let libraries_dir = state.libraries_dir();
    let assets_dir = state.assets_dir();
    let layout = PlanLayout {
        store: &store,
        libraries_dir: &libraries_dir,
        assets_dir: &assets_dir,
        libraries_base: &state.settings.endpoints.libraries,
    };
    let mut tasks = plan_chain_tasks(&chain, &layout, &platform);
    let mut report = AcquireReport::default();

    if let Some(index_task) = asset_index_task(&chain, &assets_dir) {
        let index_path = index_task.dest.clone();
        run_batch(state, vec![index_task], progress, &mut report).await?;
        let index = AssetIndex::read(&index_path)?;
        tasks.extend(asset_object_tasks(
            &index,
            &assets_dir,
            &state.settings.endpoints.resources,
        ));
    }

    let tasks = dedupe_by_destination(tasks);
    info!(
        "Acquiring {} files for {} ({} workers)",
        tasks.len(),
        version_id,
        state.settings.worker_count()
    );
    run_batch(state, tasks, progress, &mut report).await?;

    info!(
        "Acquisition of {} complete: {} downloaded, {} already valid",
        version_id, report.downloaded, report.skipped
    );
    Ok(report)
}

/// Remove orphaned `.part` markers under `versions/`, `libraries/` and
/// `assets/`. Returns how many were deleted.
pub fn clean_partial_markers(root_dir: &Path) -> LauncherResult<usize> {
    let mut removed = 0;
    for sub in ["versions", "libraries", "assets"] {
        removed += clean_dir(&root_dir.join(sub))?;
    }
    if removed > 0 {
        info!("Removed {} partial download markers", removed);
    }
    Ok(removed)
}

fn clean_dir(dir: &Path) -> LauncherResult<usize> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => {
            return Err(LauncherError::Io {
                path: dir.to_path_buf(),
                source: e,
            })
        }
    };

    let mut removed = 0;
    for entry in entries.filter_map(Result::ok) {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            removed += clean_dir(&path)?;
        } else if path.to_string_lossy().ends_with(PART_SUFFIX) {
            std::fs::remove_file(&path).map_err(|e| LauncherError::Io {
                path: path.clone(),
                source: e,
            })?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Whether a partial marker exists for `dest`.
pub fn has_partial_marker(dest: &Path) -> bool {
    part_path(dest).exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::downloader::{silent_progress, ContentHash, ProgressAggregator};
    use crate::core::state::{DownloadSource, EngineSettings};
    use crate::core::version::{Artifact, AssetIndexInfo, Library, LibraryDownloads, Profile};
    use mockito::Server;

    fn sha1(bytes: &[u8]) -> String {
        ContentHash::new(&"0".repeat(40)).digest(bytes)
    }

    fn state_for(root: &Path, server_url: &str) -> EngineState {
        let mut settings = EngineSettings {
            download_source: DownloadSource::Mojang,
            mirrors_enabled: false,
            max_attempts: 1,
            ..EngineSettings::default()
        };
        settings.endpoints.resources = format!("{server_url}/objects");
        settings.endpoints.libraries = format!("{server_url}/libraries");
        EngineState::new(root.to_path_buf(), settings).unwrap()
    }

    fn seed_profile(root: &Path, server_url: &str, lib_sha1: &str, index_sha1: &str) {
        let mut profile = Profile {
            id: "1.20.1".into(),
            asset_index: Some(AssetIndexInfo {
                id: "5".into(),
                url: format!("{server_url}/indexes/5.json"),
                sha1: Some(index_sha1.into()),
                size: None,
                total_size: None,
            }),
            libraries: vec![Library {
                name: "org.ow2.asm:asm:9.6".into(),
                downloads: Some(LibraryDownloads {
                    artifact: Some(Artifact {
                        path: Some("org/ow2/asm/asm/9.6/asm-9.6.jar".into()),
                        url: Some(format!("{server_url}/libraries/org/ow2/asm/asm/9.6/asm-9.6.jar")),
                        sha1: Some(lib_sha1.into()),
                        size: None,
                    }),
                    classifiers: None,
                }),
                ..Default::default()
            }],
            ..Default::default()
        };
        profile.downloads.insert(
            "client".into(),
            Artifact {
                url: Some(format!("{server_url}/client.jar")),
                sha1: Some(sha1(b"client")),
                size: None,
                path: None,
            },
        );
        ProfileStore::new(root).save(&profile).unwrap();
    }

    #[tokio::test]
    async fn second_acquisition_transfers_nothing() {
        let mut server = Server::new_async().await;
        let url = server.url();
        let object = b"sound-bytes";
        let object_hash = sha1(object);
        let index = serde_json::json!({
            "objects": {"minecraft/sounds/a.ogg": {"hash": object_hash, "size": object.len()}}
        })
        .to_string();

        let mocks = vec![
            server
                .mock("GET", "/client.jar")
                .with_body("client")
                .expect(1)
                .create_async()
                .await,
            server
                .mock("GET", "/libraries/org/ow2/asm/asm/9.6/asm-9.6.jar")
                .with_body("asm")
                .expect(1)
                .create_async()
                .await,
            server
                .mock("GET", "/indexes/5.json")
                .with_body(&index)
                .expect(1)
                .create_async()
                .await,
            server
                .mock("GET", format!("/objects/{}/{}", &object_hash[..2], object_hash).as_str())
                .with_body(object)
                .expect(1)
                .create_async()
                .await,
        ];

        let dir = tempfile::tempdir().unwrap();
        seed_profile(dir.path(), &url, &sha1(b"asm"), &sha1(index.as_bytes()));
        let state = state_for(dir.path(), &url);

        let aggregator = std::sync::Mutex::new(ProgressAggregator::new());
        let progress = |event: ProgressEvent| aggregator.lock().unwrap().update(&event);
        let first = acquire_profile_artifacts(&state, "1.20.1", &progress)
            .await
            .unwrap();
        assert_eq!(first.downloaded, 4);
        assert_eq!(aggregator.lock().unwrap().totals(), (4, 4));

        let second = acquire_profile_artifacts(&state, "1.20.1", &silent_progress)
            .await
            .unwrap();
        assert_eq!(second.downloaded, 0);
        assert_eq!(second.skipped, 4);

        for mock in mocks {
            mock.assert_async().await;
        }
        assert!(dir.path().join("versions/1.20.1/1.20.1.jar").is_file());
        assert!(dir
            .path()
            .join(format!("assets/objects/{}/{}", &object_hash[..2], object_hash))
            .is_file());
    }

    #[tokio::test]
    async fn hash_mismatch_fails_the_batch() {
        let mut server = Server::new_async().await;
        let url = server.url();
        server
            .mock("GET", "/client.jar")
            .with_body("client")
            .create_async()
            .await;
        server
            .mock("GET", "/libraries/org/ow2/asm/asm/9.6/asm-9.6.jar")
            .with_body("not-what-was-declared")
            .create_async()
            .await;
        server
            .mock("GET", "/indexes/5.json")
            .with_body(r#"{"objects":{}}"#)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        seed_profile(dir.path(), &url, "abc123", &sha1(br#"{"objects":{}}"#));
        let state = state_for(dir.path(), &url);

        let err = acquire_profile_artifacts(&state, "1.20.1", &silent_progress)
            .await
            .unwrap_err();
        assert!(matches!(err, LauncherError::Integrity { .. }));

        let jar = dir.path().join("libraries/org/ow2/asm/asm/9.6/asm-9.6.jar");
        assert!(!jar.exists());
        assert!(has_partial_marker(&jar));
    }

    #[tokio::test]
    async fn unresolvable_chain_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(dir.path(), "http://127.0.0.1:1");
        let err = acquire_profile_artifacts(&state, "missing", &silent_progress)
            .await
            .unwrap_err();
        assert!(matches!(err, LauncherError::ProfileResolution(_)));
    }

    #[test]
    fn partial_markers_are_cleaned() {
        let dir = tempfile::tempdir().unwrap();
        let lib_dir = dir.path().join("libraries/a/b");
        std::fs::create_dir_all(&lib_dir).unwrap();
        std::fs::write(lib_dir.join("x.jar.part"), b"1").unwrap();
        std::fs::write(lib_dir.join("x.jar"), b"1").unwrap();
        let obj_dir = dir.path().join("assets/objects/aa");
        std::fs::create_dir_all(&obj_dir).unwrap();
        std::fs::write(obj_dir.join("aa11.part"), b"1").unwrap();

        assert_eq!(clean_partial_markers(dir.path()).unwrap(), 2);
        assert!(lib_dir.join("x.jar").exists());
        assert_eq!(clean_partial_markers(dir.path()).unwrap(), 0);
    }
}
