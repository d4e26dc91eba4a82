use std::collections::HashSet;
use std::path::Path;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn, Instrument};

use super::{Direction, ScriptLoader};
use crate::catalog::{Catalog, ScriptFile};
use crate::config::MigrateConfig;
use crate::error::{Error, Result};
use crate::metrics::Timer;
use crate::status::ScriptLogView;
use crate::store::{LogEntry, LogStore, MongoLogStore};
use crate::telemetry::{create_run_span, create_script_span};
use crate::timestamp::ScriptTimestamp;

/// Scaffold written by [`Migrator::create`] when no template is configured.
pub const DEFAULT_TEMPLATE: &str = include_str!("../../template/sample-migration.js");

const SCRIPT_WARN_MS: u64 = 10_000;
const SCRIPT_ERROR_MS: u64 = 60_000;

/// Applies and rolls back the scripts in `scripts_dir`, keeping the log in
/// `store` in step.
///
/// Operations must not run concurrently against the same log collection;
/// nothing here locks it.
pub struct Migrator<S, L> {
    config: MigrateConfig,
    store: S,
    loader: L,
}

impl<L> Migrator<MongoLogStore, L>
where
    L: ScriptLoader<mongodb::Database>,
{
    /// Builds a migrator over the MongoDB collection named in `config`.
    /// No connection is made until the first operation needs one.
    pub fn mongo(config: MigrateConfig, loader: L) -> Result<Self> {
        config.validate()?;
        let store = MongoLogStore::new(&config);
        Ok(Self::new(config, store, loader))
    }
}

impl<S, L> Migrator<S, L>
where
    S: LogStore,
    L: ScriptLoader<S::Db>,
{
    pub fn new(config: MigrateConfig, store: S, loader: L) -> Self {
        Self {
            config,
            store,
            loader,
        }
    }

    pub fn config(&self) -> &MigrateConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Applies every pending script, oldest first, and returns the names
    /// applied in this run.
    ///
    /// Stops at the first failing script: its log entry is not written and
    /// later scripts are not attempted. Entries written before the failure
    /// stay in place.
    pub async fn up(&self) -> Result<Vec<String>> {
        let span = create_run_span("up", &self.config.collection_name);
        async {
            self.config.require_absolute_scripts_dir()?;
            let applied = self.applied_names().await?;
            let catalog = self.catalog().await?;
            let db = self.store.db().await?;

            let mut ran = Vec::new();
            for script in catalog.ascending().filter(|s| !applied.contains(s.name())) {
                let loaded = self.loader.load(script).await?;
                if !loaded.migration.provides(Direction::Up) {
                    debug!(script = %script.name(), "[UP] Skip: no up routine");
                    continue;
                }

                info!(script = %script.name(), "[UP] Run");
                let timer = Timer::new(format!("script::up::{}", script.name()))
                    .with_thresholds(SCRIPT_WARN_MS, SCRIPT_ERROR_MS);
                loaded
                    .migration
                    .up(&db)
                    .instrument(create_script_span(script.name(), "up"))
                    .await
                    .map_err(|e| Error::script_execution(script.name(), Direction::Up, e))?;
                let time_consuming = timer.elapsed_ms();
                timer.log_elapsed(Some(script.name()));

                self.store
                    .insert(LogEntry::complete(script.name(), loaded.source, time_consuming))
                    .await?;
                ran.push(script.name().to_string());
            }

            info!(applied = ran.len(), "[UP] Finished");
            Ok(ran)
        }
        .instrument(span)
        .await
    }

    /// Rolls back the newest applied script and returns its name, or `None`
    /// when nothing is applied.
    ///
    /// The log entry is deleted only after the down routine succeeds.
    /// Applied scripts without a down routine are passed over.
    pub async fn down(&self) -> Result<Option<String>> {
        let span = create_run_span("down", &self.config.collection_name);
        async {
            self.config.require_absolute_scripts_dir()?;
            let applied = self.applied_names().await?;
            let catalog = self.catalog().await?;

            for script in catalog.descending().filter(|s| applied.contains(s.name())) {
                let loaded = self.loader.load(script).await?;
                if !loaded.migration.provides(Direction::Down) {
                    debug!(script = %script.name(), "[DOWN] Skip: no down routine");
                    continue;
                }

                info!(script = %script.name(), path = %script.path().display(), "[DOWN] Run");
                let db = self.store.db().await?;
                loaded
                    .migration
                    .down(&db)
                    .instrument(create_script_span(script.name(), "down"))
                    .await
                    .map_err(|e| Error::script_execution(script.name(), Direction::Down, e))?;
                self.store.delete_by_name(script.name()).await?;
                info!(script = %script.name(), "[DOWN] Finished");
                return Ok(Some(script.name().to_string()));
            }

            info!("[DOWN] Nothing to roll back");
            Ok(None)
        }
        .instrument(span)
        .await
    }

    /// Every log entry in identity order, in display form.
    pub async fn status(&self) -> Result<Vec<ScriptLogView>> {
        let span = create_run_span("status", &self.config.collection_name);
        async {
            let entries = self.store.find_all().await?;
            Ok(entries.iter().map(ScriptLogView::from).collect())
        }
        .instrument(span)
        .await
    }

    /// Scripts in the catalog that have no log entry, oldest first.
    pub async fn pending(&self) -> Result<Vec<ScriptFile>> {
        let span = create_run_span("pending", &self.config.collection_name);
        async {
            self.config.require_absolute_scripts_dir()?;
            let applied = self.applied_names().await?;
            let catalog = self.catalog().await?;
            Ok(catalog
                .into_scripts()
                .into_iter()
                .filter(|s| !applied.contains(s.name()))
                .collect())
        }
        .instrument(span)
        .await
    }

    /// Writes a new script named `<now>_<label>.js` into the scripts
    /// directory and returns the filename. Never overwrites an existing file.
    pub async fn create(&self, label: &str) -> Result<String> {
        self.config.require_absolute_scripts_dir()?;
        validate_label(label)?;

        let content = match &self.config.template_path {
            Some(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(|e| Error::filesystem(path, e))?,
            None => DEFAULT_TEMPLATE.to_string(),
        };

        let filename = format!("{}_{}.js", ScriptTimestamp::now(), label);
        let path = self.config.scripts_dir.join(&filename);
        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| Error::filesystem(&path, e))?;
        write_or_discard(file, &path, content.as_bytes()).await?;

        info!(
            script = %filename,
            dir = %self.config.scripts_dir.display(),
            "Created migration script"
        );
        Ok(filename)
    }

    /// Releases the store connection.
    pub async fn close(self) -> Result<()> {
        self.store.close().await
    }

    async fn applied_names(&self) -> Result<HashSet<String>> {
        Ok(self
            .store
            .find_all()
            .await?
            .into_iter()
            .map(|entry| entry.name)
            .collect())
    }

    async fn catalog(&self) -> Result<Catalog> {
        Catalog::scan(&self.config.scripts_dir).await
    }
}

/// Writes `content` through `out`, the freshly created file at `path`.
/// On failure the partial file is removed so it never shows up as a script.
async fn write_or_discard<W>(mut out: W, path: &Path, content: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let written = match out.write_all(content).await {
        Ok(()) => out.flush().await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        drop(out);
        if let Err(cleanup) = tokio::fs::remove_file(path).await {
            warn!(path = %path.display(), error = %cleanup, "could not remove partial script");
        }
        return Err(Error::filesystem(path, e));
    }
    Ok(())
}

fn validate_label(label: &str) -> Result<()> {
    if label.is_empty() {
        return Err(Error::InvalidLabel("label must not be empty".into()));
    }
    if label
        .chars()
        .any(|c| c == '/' || c == '\\' || c.is_control())
    {
        return Err(Error::InvalidLabel(format!(
            "label {label:?} must not contain path separators or control characters"
        )));
    }
    Ok(())
}
