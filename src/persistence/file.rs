use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;

use crate::io::{DocumentFormat, parse_document_str, serialize_document};

use super::{
    BackupResponse, ConfigResponse, ConfigStore, DeleteResponse, FetchResponse,
    ImageProfilesResponse, PersistenceClient, SaveResponse, UpsertResponse, payload_id, stamp_id,
};

const DOCUMENTS_DIR: &str = "documents";
const BACKUPS_DIR: &str = "backups";
const CONFIG_STEM: &str = "config";
const IMAGE_PROFILES_STEM: &str = "imageprofiles";

/// Store that keeps one file per document below a root directory:
///
/// ```text
/// <root>/documents/<id>.<ext>
/// <root>/config.<ext>
/// <root>/imageprofiles.<ext>
/// <root>/backups/<target>/...
/// ```
///
/// Writes go to a temporary sibling first and are renamed into place.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    format: DocumentFormat,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            format: DocumentFormat::Json,
        }
    }

    pub fn with_format(mut self, format: DocumentFormat) -> Self {
        self.format = format;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn documents_dir(&self) -> PathBuf {
        self.root.join(DOCUMENTS_DIR)
    }

    fn document_path(&self, id: &str) -> Result<PathBuf> {
        ensure_safe_name(id, "document id")?;
        Ok(self
            .documents_dir()
            .join(format!("{id}.{}", self.format.extension())))
    }

    fn singleton_path(&self, stem: &str) -> PathBuf {
        self.root.join(format!("{stem}.{}", self.format.extension()))
    }

    async fn read_value(&self, path: &Path) -> Result<Option<Value>> {
        match fs::read_to_string(path).await {
            Ok(contents) => parse_document_str(&contents, self.format)
                .with_context(|| format!("corrupt store file {}", path.display()))
                .map(Some),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("failed to read {}", path.display())),
        }
    }

    async fn write_value(&self, path: &Path, value: &Value) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let mut payload = serialize_document(value, self.format, true)?;
        payload.push('\n');
        let staging = path.with_extension(format!("{}.tmp", self.format.extension()));
        fs::write(&staging, payload)
            .await
            .with_context(|| format!("failed to write {}", staging.display()))?;
        fs::rename(&staging, path)
            .await
            .with_context(|| format!("failed to move {} into place", path.display()))
    }

    async fn next_id(&self) -> Result<String> {
        let mut highest = 0u64;
        let mut entries = match fs::read_dir(self.documents_dir()).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok("1".to_string()),
            Err(err) => return Err(err).context("failed to list documents"),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str())
                && let Ok(numeric) = stem.parse::<u64>()
            {
                highest = highest.max(numeric);
            }
        }
        Ok((highest + 1).to_string())
    }

    async fn copy_tree(&self, from: &Path, to: &Path, log: &mut Vec<String>) -> Result<()> {
        let mut entries = match fs::read_dir(from).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(err) => {
                return Err(err).with_context(|| format!("failed to list {}", from.display()));
            }
        };
        fs::create_dir_all(to).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name();
            fs::copy(&path, to.join(&name))
                .await
                .with_context(|| format!("failed to copy {}", path.display()))?;
            log.push(format!("copied {}", self.relative(&path)));
        }
        Ok(())
    }

    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

fn ensure_safe_name(name: &str, label: &str) -> Result<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.contains('\0')
    {
        bail!("{label} '{name}' cannot be used as a file name");
    }
    Ok(())
}

#[async_trait]
impl PersistenceClient for FileStore {
    async fn fetch_by_id(&self, id: &str) -> Result<FetchResponse> {
        let path = self.document_path(id)?;
        Ok(FetchResponse {
            item: self.read_value(&path).await?,
        })
    }

    async fn upsert(&self, mut document: Value) -> Result<UpsertResponse> {
        let id = match payload_id(&document) {
            Some(id) => id,
            None => self.next_id().await?,
        };
        stamp_id(&mut document, &id);
        let path = self.document_path(&id)?;
        self.write_value(&path, &document).await?;
        tracing::debug!(%id, path = %path.display(), "file store saved document");
        Ok(UpsertResponse {
            id,
            success: true,
            saved_id_changed: None,
        })
    }

    async fn delete_by_id(&self, id: &str) -> Result<DeleteResponse> {
        let path = self.document_path(id)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(DeleteResponse { success: true }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Ok(DeleteResponse { success: false })
            }
            Err(err) => Err(err).with_context(|| format!("failed to delete {}", path.display())),
        }
    }
}

#[async_trait]
impl ConfigStore for FileStore {
    async fn fetch_config(&self) -> Result<ConfigResponse> {
        let cfg = self.read_value(&self.singleton_path(CONFIG_STEM)).await?;
        Ok(ConfigResponse { cfg })
    }

    async fn save_config(&self, config: Value) -> Result<SaveResponse> {
        self.write_value(&self.singleton_path(CONFIG_STEM), &config)
            .await?;
        Ok(SaveResponse { success: true })
    }

    async fn fetch_image_profiles(&self) -> Result<ImageProfilesResponse> {
        let imgprofiles = self
            .read_value(&self.singleton_path(IMAGE_PROFILES_STEM))
            .await?;
        Ok(ImageProfilesResponse { imgprofiles })
    }

    async fn save_image_profiles(&self, profiles: Value) -> Result<SaveResponse> {
        self.write_value(&self.singleton_path(IMAGE_PROFILES_STEM), &profiles)
            .await?;
        Ok(SaveResponse { success: true })
    }

    async fn create_backup(&self, target: &str) -> Result<BackupResponse> {
        ensure_safe_name(target, "backup target")?;
        let destination = self.root.join(BACKUPS_DIR).join(target);
        fs::create_dir_all(&destination)
            .await
            .with_context(|| format!("failed to create {}", destination.display()))?;

        let mut log = Vec::new();
        self.copy_tree(
            &self.documents_dir(),
            &destination.join(DOCUMENTS_DIR),
            &mut log,
        )
        .await?;
        for stem in [CONFIG_STEM, IMAGE_PROFILES_STEM] {
            let source = self.singleton_path(stem);
            if fs::try_exists(&source).await? {
                let name = source.file_name().map(PathBuf::from).unwrap_or_default();
                fs::copy(&source, destination.join(&name)).await?;
                log.push(format!("copied {}", self.relative(&source)));
            }
        }
        log.push(format!("backup written to {}", self.relative(&destination)));
        tracing::info!(backup = target, files = log.len() - 1, "file store backup finished");
        Ok(BackupResponse {
            success: true,
            log: Some(log),
        })
    }
}
