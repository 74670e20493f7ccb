use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::{Notify, Semaphore};

use crate::core::{gamesdb_platform, title_id, GameRecord, ImportOutcome};
use crate::error::{ImportError, Result};
use crate::providers::{ReleaseArt, ReleaseArtProvider, UrlTemplate};
use crate::store::ArtworkStore;

/// Upper bound on concurrently running import tasks
pub const MAX_CONCURRENT_IMPORTS: usize = 8;

/// Main artwork import coordinator
///
/// Spawns one background task per submitted game record. Each task looks the
/// game up on the metadata service, downloads whatever artwork is present,
/// hands it to the store, and reports completion exactly once through the
/// configured mode.
pub struct ImportEngine {
    provider: Arc<dyn ReleaseArtProvider>,
    store: Arc<dyn ArtworkStore>,
    mode: ImportMode,
    permits: Arc<Semaphore>,
}

/// Who gets told about finished imports, selected once at construction
#[derive(Clone)]
pub enum ImportMode {
    /// Many lookups grouped under one coordinating importer
    Batch(Arc<dyn BatchImporter>),
    /// Standalone lookups; failures surface through a modal notice
    Interactive(Arc<dyn DialogHost>),
}

impl ImportMode {
    fn is_interactive(&self) -> bool {
        matches!(self, ImportMode::Interactive(_))
    }
}

/// Batch-import collaborator
pub trait BatchImporter: Send + Sync {
    /// Called exactly once per game after its import task settles
    fn task_done(&self, outcome: &ImportOutcome);
}

/// Host surface for interactive error reporting
#[async_trait]
pub trait DialogHost: Send + Sync {
    /// Present a modal connection-error notice and return the user's choice
    async fn present_connection_error(&self, message: &str) -> ErrorChoice;

    /// Jump to the host's metadata preferences screen
    async fn open_preferences(&self);
}

/// User response to the interactive error notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorChoice {
    Dismiss,
    OpenPreferences,
}

impl ImportEngine {
    /// Create an engine with the default worker-pool bound
    pub fn new(
        provider: Arc<dyn ReleaseArtProvider>,
        store: Arc<dyn ArtworkStore>,
        mode: ImportMode,
    ) -> Self {
        Self::with_concurrency(provider, store, mode, MAX_CONCURRENT_IMPORTS)
    }

    /// Create an engine with an explicit worker-pool bound
    pub fn with_concurrency(
        provider: Arc<dyn ReleaseArtProvider>,
        store: Arc<dyn ArtworkStore>,
        mode: ImportMode,
        max_concurrent: usize,
    ) -> Self {
        Self {
            provider,
            store,
            mode,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Spawn one background import task per record
    ///
    /// Fire-and-forget: tasks run concurrently with no ordering guarantee and
    /// cannot be cancelled once submitted. Completion is reported through the
    /// engine's mode. Must be called from within a Tokio runtime.
    pub fn submit(&self, games: Vec<Arc<dyn GameRecord>>) {
        for game in games {
            let provider = Arc::clone(&self.provider);
            let store = Arc::clone(&self.store);
            let mode = self.mode.clone();
            let permits = Arc::clone(&self.permits);

            tokio::spawn(async move {
                if mode.is_interactive() {
                    game.set_loading(1);
                }

                let _permit = match permits.acquire_owned().await {
                    Ok(permit) => permit,
                    // The engine never closes its semaphore
                    Err(_) => return,
                };

                let outcome = run_import(provider.as_ref(), store.as_ref(), game.as_ref()).await;
                finish(&mode, game.as_ref(), outcome).await;
            });
        }
    }
}

/// One record's lookup + download + store sequence
///
/// Never fails: every error ends up as a recorded message on the outcome.
async fn run_import(
    provider: &dyn ReleaseArtProvider,
    store: &dyn ArtworkStore,
    game: &dyn GameRecord,
) -> ImportOutcome {
    let start = Instant::now();
    let mut outcome = ImportOutcome::new(game.source(), game.game_id());

    match lookup_art(provider, game).await {
        Ok(art) => {
            if let Some(cover) = &art.vertical_cover {
                match import_cover(provider, store, game.game_id(), cover).await {
                    Ok(()) => outcome.cover_saved = true,
                    Err(e) => tracing::warn!("Cover import failed for {}: {}", game.game_id(), e),
                }
            }

            if let Some(background) = &art.background {
                match import_background(provider, store, game.game_id(), background).await {
                    Ok(()) => outcome.background_saved = true,
                    Err(e) => {
                        tracing::warn!("Background import failed for {}: {}", game.game_id(), e)
                    }
                }
            }
        }
        Err(message) => outcome.error = Some(message),
    }

    outcome.latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    outcome
}

/// Resolve the platform and query the service
///
/// Unsupported tags short-circuit before any network traffic. Lookup failures
/// come back as the message to record, never as a panic or propagated error.
async fn lookup_art(
    provider: &dyn ReleaseArtProvider,
    game: &dyn GameRecord,
) -> std::result::Result<ReleaseArt, String> {
    let platform = gamesdb_platform(game.source())
        .ok_or_else(|| ImportError::UnsupportedPlatform(game.source().to_string()).to_string())?;

    match provider.release_art(platform, title_id(game.game_id())).await {
        Ok(Some(art)) => Ok(art),
        Ok(None) => Err(ImportError::MissingMetadata(game.game_id().to_string()).to_string()),
        Err(e) => {
            tracing::warn!("GamesDB lookup failed for {}: {}", game.game_id(), e);
            Err(format!(
                "Unable to reach GamesDB for game {}: {}",
                game.game_id(),
                e
            ))
        }
    }
}

/// Download, resize, and store one cover
async fn import_cover(
    provider: &dyn ReleaseArtProvider,
    store: &dyn ArtworkStore,
    game_id: &str,
    cover: &UrlTemplate,
) -> Result<()> {
    let tmp = download_to_temp(provider, &cover.resolve()).await?;
    let resized = store.resize_cover(tmp.path()).await?;
    store.save_cover(game_id, &resized).await?;
    Ok(())
}

/// Download and store one background, as-is
async fn import_background(
    provider: &dyn ReleaseArtProvider,
    store: &dyn ArtworkStore,
    game_id: &str,
    background: &UrlTemplate,
) -> Result<()> {
    let tmp = download_to_temp(provider, &background.resolve()).await?;
    store.save_background(game_id, tmp.path()).await?;
    Ok(())
}

/// Download an image into a temporary file
///
/// The file lives until the returned handle drops, which must outlast the
/// store handoff.
async fn download_to_temp(
    provider: &dyn ReleaseArtProvider,
    url: &str,
) -> Result<tempfile::NamedTempFile> {
    let bytes = provider.fetch_image(url).await?;
    // Keep the extension: the store picks the decoder from it
    let tmp = tempfile::Builder::new().suffix(".jpg").tempfile()?;
    tokio::fs::write(tmp.path(), &bytes).await?;
    Ok(tmp)
}

/// Completion dispatch; runs exactly once per record, whatever branch the
/// task took
async fn finish(mode: &ImportMode, game: &dyn GameRecord, outcome: ImportOutcome) {
    tracing::debug!("Import done: {}", outcome.display());
    game.set_loading(-1);

    match mode {
        ImportMode::Batch(importer) => {
            game.save();
            importer.task_done(&outcome);
        }
        ImportMode::Interactive(host) => {
            game.update();
            if let Some(message) = &outcome.error {
                if host.present_connection_error(message).await == ErrorChoice::OpenPreferences {
                    host.open_preferences().await;
                }
            }
        }
    }
}

/// Ready-made batch importer: pending counter plus aggregated last error
///
/// Hosts that only need "tell me when the batch is done" can use this instead
/// of implementing [`BatchImporter`] themselves.
pub struct BatchProgress {
    pending: AtomicUsize,
    last_error: Mutex<Option<String>>,
    idle: Notify,
}

impl BatchProgress {
    /// Create a progress tracker expecting `total` outcomes
    pub fn new(total: usize) -> Self {
        Self {
            pending: AtomicUsize::new(total),
            last_error: Mutex::new(None),
            idle: Notify::new(),
        }
    }

    /// Number of outcomes still outstanding
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Most recently recorded task error, if any
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().unwrap().clone()
    }

    /// Wait until every expected outcome has arrived
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            // Register before re-checking so a concurrent task_done cannot
            // slip between the check and the await
            notified.as_mut().enable();

            if self.pending.load(Ordering::Acquire) == 0 {
                return;
            }

            notified.await;
        }
    }
}

impl BatchImporter for BatchProgress {
    fn task_done(&self, outcome: &ImportOutcome) {
        if let Some(error) = &outcome.error {
            *self.last_error.lock().unwrap() = Some(error.clone());
        }

        let previous = self.pending.fetch_sub(1, Ordering::AcqRel);
        if previous <= 1 {
            self.idle.notify_waiters();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct MockGame {
        source: String,
        game_id: String,
        loading_deltas: Mutex<Vec<i32>>,
        saves: AtomicUsize,
        updates: AtomicUsize,
    }

    impl MockGame {
        fn new(source: &str, game_id: &str) -> Arc<Self> {
            Arc::new(Self {
                source: source.to_string(),
                game_id: game_id.to_string(),
                loading_deltas: Mutex::new(Vec::new()),
                saves: AtomicUsize::new(0),
                updates: AtomicUsize::new(0),
            })
        }
    }

    impl GameRecord for MockGame {
        fn source(&self) -> &str {
            &self.source
        }

        fn game_id(&self) -> &str {
            &self.game_id
        }

        fn set_loading(&self, delta: i32) {
            self.loading_deltas.lock().unwrap().push(delta);
        }

        fn save(&self) {
            self.saves.fetch_add(1, Ordering::SeqCst);
        }

        fn update(&self) {
            self.updates.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct MockProvider {
        art: Option<ReleaseArt>,
        fail_lookup: bool,
        lookups: Mutex<Vec<(String, String)>>,
        downloads: AtomicUsize,
    }

    impl MockProvider {
        fn lookup_count(&self) -> usize {
            self.lookups.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ReleaseArtProvider for MockProvider {
        async fn release_art(&self, platform: &str, title_id: &str) -> Result<Option<ReleaseArt>> {
            self.lookups
                .lock()
                .unwrap()
                .push((platform.to_string(), title_id.to_string()));

            if self.fail_lookup {
                return Err(ImportError::Other("connection reset".to_string()));
            }

            Ok(self.art.clone())
        }

        async fn fetch_image(&self, _url: &str) -> Result<Vec<u8>> {
            self.downloads.fetch_add(1, Ordering::SeqCst);
            Ok(b"image-bytes".to_vec())
        }

        fn name(&self) -> &str {
            "mock"
        }

        async fn is_available(&self) -> bool {
            true
        }
    }

    #[derive(Default)]
    struct MockStore {
        covers: Mutex<Vec<String>>,
        backgrounds: Mutex<Vec<String>>,
        resizes: AtomicUsize,
    }

    #[async_trait]
    impl ArtworkStore for MockStore {
        async fn resize_cover(&self, source: &Path) -> Result<PathBuf> {
            self.resizes.fetch_add(1, Ordering::SeqCst);
            Ok(source.to_path_buf())
        }

        async fn save_cover(&self, game_id: &str, _image: &Path) -> Result<()> {
            self.covers.lock().unwrap().push(game_id.to_string());
            Ok(())
        }

        async fn save_background(&self, game_id: &str, _image: &Path) -> Result<()> {
            self.backgrounds.lock().unwrap().push(game_id.to_string());
            Ok(())
        }
    }

    struct ChannelImporter {
        tx: mpsc::UnboundedSender<ImportOutcome>,
    }

    impl BatchImporter for ChannelImporter {
        fn task_done(&self, outcome: &ImportOutcome) {
            let _ = self.tx.send(outcome.clone());
        }
    }

    struct MockDialog {
        messages: Mutex<Vec<String>>,
        choice: ErrorChoice,
        preferences_opened: AtomicUsize,
    }

    impl MockDialog {
        fn new(choice: ErrorChoice) -> Arc<Self> {
            Arc::new(Self {
                messages: Mutex::new(Vec::new()),
                choice,
                preferences_opened: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl DialogHost for MockDialog {
        async fn present_connection_error(&self, message: &str) -> ErrorChoice {
            self.messages.lock().unwrap().push(message.to_string());
            self.choice
        }

        async fn open_preferences(&self) {
            self.preferences_opened.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn cover_only_art() -> ReleaseArt {
        ReleaseArt {
            vertical_cover: Some(UrlTemplate {
                url_format: "https://img/cover{formatter}.{ext}".to_string(),
            }),
            background: None,
        }
    }

    fn batch_engine(
        provider: Arc<MockProvider>,
        store: Arc<MockStore>,
    ) -> (ImportEngine, mpsc::UnboundedReceiver<ImportOutcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let engine = ImportEngine::new(
            provider,
            store,
            ImportMode::Batch(Arc::new(ChannelImporter { tx })),
        );
        (engine, rx)
    }

    async fn wait_for(condition: impl Fn() -> bool) {
        for _ in 0..400 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached in time");
    }

    #[tokio::test]
    async fn test_unsupported_source_skips_network() {
        let provider = Arc::new(MockProvider::default());
        let store = Arc::new(MockStore::default());
        let (engine, mut rx) = batch_engine(provider.clone(), store.clone());

        let game = MockGame::new("lutris", "lutris_123");
        engine.submit(vec![game.clone()]);

        let outcome = rx.recv().await.unwrap();
        assert_eq!(outcome.error.as_deref(), Some("Unsupported platform"));
        assert_eq!(provider.lookup_count(), 0);
        assert_eq!(provider.downloads.load(Ordering::SeqCst), 0);
        // Batch completion still persists the record
        assert_eq!(game.saves.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cover_only_payload() {
        let provider = Arc::new(MockProvider {
            art: Some(cover_only_art()),
            ..MockProvider::default()
        });
        let store = Arc::new(MockStore::default());
        let (engine, mut rx) = batch_engine(provider.clone(), store.clone());

        engine.submit(vec![MockGame::new("steam", "steam_730")]);

        let outcome = rx.recv().await.unwrap();
        assert!(outcome.is_success());
        assert!(outcome.cover_saved);
        assert!(!outcome.background_saved);

        assert_eq!(
            provider.lookups.lock().unwrap().as_slice(),
            &[("steam".to_string(), "730".to_string())]
        );
        assert_eq!(provider.downloads.load(Ordering::SeqCst), 1);
        assert_eq!(store.resizes.load(Ordering::SeqCst), 1);
        assert_eq!(store.covers.lock().unwrap().as_slice(), &["steam_730"]);
        assert!(store.backgrounds.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_payload_completes_without_downloads() {
        let provider = Arc::new(MockProvider {
            art: Some(ReleaseArt::default()),
            ..MockProvider::default()
        });
        let store = Arc::new(MockStore::default());
        let (engine, mut rx) = batch_engine(provider.clone(), store.clone());

        engine.submit(vec![MockGame::new("heroic_gog", "heroic_gog_1207658924")]);

        let outcome = rx.recv().await.unwrap();
        assert!(outcome.is_success());
        assert!(!outcome.cover_saved);
        assert!(!outcome.background_saved);
        assert_eq!(provider.downloads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_metadata_records_error() {
        // art: None models "the service has nothing for this release"
        let provider = Arc::new(MockProvider::default());
        let store = Arc::new(MockStore::default());
        let (engine, mut rx) = batch_engine(provider.clone(), store.clone());

        engine.submit(vec![MockGame::new("itch", "itch_99")]);

        let outcome = rx.recv().await.unwrap();
        assert_eq!(
            outcome.error.as_deref(),
            Some("Unable to get GamesDB data for game itch_99")
        );
        assert_eq!(provider.lookup_count(), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_records_error_and_completes_once() {
        let provider = Arc::new(MockProvider {
            fail_lookup: true,
            ..MockProvider::default()
        });
        let store = Arc::new(MockStore::default());
        let (engine, mut rx) = batch_engine(provider.clone(), store.clone());

        engine.submit(vec![MockGame::new("steam", "steam_730")]);

        let outcome = rx.recv().await.unwrap();
        let error = outcome.error.unwrap();
        assert!(error.contains("Unable to reach GamesDB"), "got: {}", error);
        assert!(error.contains("steam_730"), "got: {}", error);

        // The hook fired exactly once
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_batch_completion_fires_once_per_game() {
        let provider = Arc::new(MockProvider {
            art: Some(cover_only_art()),
            ..MockProvider::default()
        });
        let store = Arc::new(MockStore::default());
        let (engine, mut rx) = batch_engine(provider.clone(), store.clone());

        let ids: Vec<String> = (0..8).map(|i| format!("steam_{}", i)).collect();
        let games: Vec<Arc<dyn GameRecord>> = ids
            .iter()
            .map(|id| MockGame::new("steam", id) as Arc<dyn GameRecord>)
            .collect();
        engine.submit(games);

        let mut seen: Vec<String> = Vec::new();
        for _ in 0..ids.len() {
            seen.push(rx.recv().await.unwrap().game_id);
        }
        seen.sort();
        let mut expected = ids.clone();
        expected.sort();
        assert_eq!(seen, expected);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_interactive_success_marks_loading_and_updates() {
        let provider = Arc::new(MockProvider {
            art: Some(ReleaseArt::default()),
            ..MockProvider::default()
        });
        let store = Arc::new(MockStore::default());
        let dialog = MockDialog::new(ErrorChoice::Dismiss);
        let engine = ImportEngine::new(provider, store, ImportMode::Interactive(dialog.clone()));

        let game = MockGame::new("steam", "steam_730");
        engine.submit(vec![game.clone()]);

        let game_probe = game.clone();
        wait_for(move || game_probe.updates.load(Ordering::SeqCst) == 1).await;

        assert_eq!(game.loading_deltas.lock().unwrap().as_slice(), &[1, -1]);
        assert_eq!(game.saves.load(Ordering::SeqCst), 0);
        assert!(dialog.messages.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_interactive_failure_presents_dialog() {
        let provider = Arc::new(MockProvider {
            fail_lookup: true,
            ..MockProvider::default()
        });
        let store = Arc::new(MockStore::default());
        let dialog = MockDialog::new(ErrorChoice::OpenPreferences);
        let engine =
            ImportEngine::new(provider, store, ImportMode::Interactive(dialog.clone()));

        engine.submit(vec![MockGame::new("steam", "steam_730")]);

        let dialog_probe = dialog.clone();
        wait_for(move || dialog_probe.preferences_opened.load(Ordering::SeqCst) == 1).await;

        let messages = dialog.messages.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("Unable to reach GamesDB"));
    }

    #[tokio::test]
    async fn test_batch_progress_counts_down() {
        let progress = Arc::new(BatchProgress::new(2));

        let mut ok = ImportOutcome::new("steam", "steam_1");
        ok.cover_saved = true;
        let mut failed = ImportOutcome::new("itch", "itch_2");
        failed.error = Some("Unsupported platform".to_string());

        progress.task_done(&ok);
        assert_eq!(progress.pending(), 1);

        progress.task_done(&failed);
        assert_eq!(progress.pending(), 0);
        assert_eq!(progress.last_error().as_deref(), Some("Unsupported platform"));

        // Already idle: must return immediately
        progress.wait_idle().await;
    }

    #[tokio::test]
    async fn test_batch_progress_wait_idle_wakes() {
        let progress = Arc::new(BatchProgress::new(1));

        let worker = progress.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            worker.task_done(&ImportOutcome::new("steam", "steam_1"));
        });

        tokio::time::timeout(Duration::from_secs(2), progress.wait_idle())
            .await
            .expect("wait_idle did not wake");
        assert_eq!(progress.pending(), 0);
    }
}
