//! Filesystem-backed repository: a directory of images plus a JSON sidecar.
//!
//! ```text
//! <library>/
//!   IMG_0001.jpg ...
//!   .photoswipe/library.json   # favorites, hidden, collections
//! ```
//!
//! Images are the non-hidden files directly inside the library directory whose
//! extension is a known image type. The asset id is the file name.

use super::{AssetRepository, Mutation, RepositoryError};
use crate::domain::{Asset, AssetId, CollectionId, CollectionSummary};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

const SIDECAR_DIR: &str = ".photoswipe";
const SIDECAR_FILE: &str = "library.json";

/// Returns true for extensions treated as photos
pub fn is_image_extension(ext: &str) -> bool {
    matches!(
        ext.to_lowercase().as_str(),
        "png" | "jpg" | "jpeg" | "gif" | "bmp" | "webp" | "heic" | "heif" | "tif" | "tiff"
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct StoredCollection {
    id: CollectionId,
    name: String,
    #[serde(default)]
    members: Vec<AssetId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
struct LibraryIndex {
    favorites: BTreeSet<AssetId>,
    hidden: BTreeSet<AssetId>,
    collections: Vec<StoredCollection>,
}

impl LibraryIndex {
    fn load(path: &Path) -> Result<Self, RepositoryError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn save(&self, path: &Path) -> Result<(), RepositoryError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(self)?)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    fn apply(&mut self, asset_id: &AssetId, mutation: &Mutation) -> Result<(), RepositoryError> {
        match mutation {
            Mutation::SetFavorite(true) => {
                self.favorites.insert(asset_id.clone());
            }
            Mutation::SetFavorite(false) => {
                self.favorites.remove(asset_id);
            }
            Mutation::SetHidden(true) => {
                self.hidden.insert(asset_id.clone());
            }
            Mutation::SetHidden(false) => {
                self.hidden.remove(asset_id);
            }
            Mutation::AddToCollection(id) => {
                let collection = self
                    .collections
                    .iter_mut()
                    .find(|c| &c.id == id)
                    .ok_or_else(|| RepositoryError::CollectionNotFound(id.clone()))?;
                if !collection.members.contains(asset_id) {
                    collection.members.push(asset_id.clone());
                }
            }
            Mutation::EnsureCollectionAndAdd(name) => {
                let index = match self.collections.iter().position(|c| &c.name == name) {
                    Some(index) => index,
                    None => {
                        self.collections.push(StoredCollection {
                            id: CollectionId::new(Uuid::new_v4().to_string()),
                            name: name.clone(),
                            members: Vec::new(),
                        });
                        self.collections.len() - 1
                    }
                };
                let members = &mut self.collections[index].members;
                if !members.contains(asset_id) {
                    members.push(asset_id.clone());
                }
            }
        }
        Ok(())
    }
}

/// Lists image files directly inside `dir`, newest first by modification time.
///
/// Hidden files, directories and unreadable entries are skipped.
pub fn discover_images(dir: &Path) -> io::Result<Vec<Asset>> {
    let mut assets = Vec::new();

    for entry_result in fs::read_dir(dir)? {
        let entry = match entry_result {
            Ok(e) => e,
            Err(_) => continue,
        };
        let path = entry.path();

        let file_name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };
        if file_name.starts_with('.') {
            continue;
        }

        let metadata = match fs::metadata(&path) {
            Ok(m) => m,
            Err(_) => continue,
        };
        if metadata.is_dir() {
            continue;
        }

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if !is_image_extension(extension) {
            continue;
        }

        let created_at: DateTime<Utc> = match metadata.modified() {
            Ok(modified) => modified.into(),
            Err(_) => continue,
        };

        assets.push(Asset::new(
            file_name,
            path.to_string_lossy().into_owned(),
            created_at,
        ));
    }

    assets.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    Ok(assets)
}

#[derive(Debug, Clone)]
pub struct FsRepository {
    root: PathBuf,
    index_path: PathBuf,
    // Serializes read-modify-write cycles on the sidecar
    write_lock: Arc<Mutex<()>>,
}

impl FsRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let index_path = root.join(SIDECAR_DIR).join(SIDECAR_FILE);
        Self {
            root,
            index_path,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates an empty collection and returns its id
    pub fn create_collection(&self, name: &str) -> Result<CollectionId, RepositoryError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut index = LibraryIndex::load(&self.index_path)?;
        let id = CollectionId::new(Uuid::new_v4().to_string());
        index.collections.push(StoredCollection {
            id: id.clone(),
            name: name.to_string(),
            members: Vec::new(),
        });
        index.save(&self.index_path)?;
        Ok(id)
    }

    fn list_sync(
        root: &Path,
        index_path: &Path,
        source_filter: &BTreeSet<CollectionId>,
    ) -> Result<Vec<Asset>, RepositoryError> {
        let assets = discover_images(root).map_err(|e| match e.kind() {
            io::ErrorKind::PermissionDenied => RepositoryError::AccessDenied,
            _ => RepositoryError::Io(e),
        })?;
        let index = LibraryIndex::load(index_path)?;

        let allowed: Option<HashSet<&AssetId>> = if source_filter.is_empty() {
            None
        } else {
            Some(
                index
                    .collections
                    .iter()
                    .filter(|c| source_filter.contains(&c.id))
                    .flat_map(|c| c.members.iter())
                    .collect(),
            )
        };

        Ok(assets
            .into_iter()
            .filter(|a| !index.hidden.contains(&a.id))
            .filter(|a| allowed.as_ref().map_or(true, |set| set.contains(&a.id)))
            .collect())
    }
}

fn join_error(e: tokio::task::JoinError) -> RepositoryError {
    RepositoryError::Io(io::Error::other(format!("blocking task failed: {}", e)))
}

#[async_trait]
impl AssetRepository for FsRepository {
    async fn list_eligible_assets(
        &self,
        source_filter: &BTreeSet<CollectionId>,
    ) -> Result<Vec<Asset>, RepositoryError> {
        let root = self.root.clone();
        let index_path = self.index_path.clone();
        let filter = source_filter.clone();
        tokio::task::spawn_blocking(move || Self::list_sync(&root, &index_path, &filter))
            .await
            .map_err(join_error)?
    }

    async fn list_collections(&self) -> Result<Vec<CollectionSummary>, RepositoryError> {
        let index_path = self.index_path.clone();
        let index = tokio::task::spawn_blocking(move || LibraryIndex::load(&index_path))
            .await
            .map_err(join_error)??;

        Ok(index
            .collections
            .iter()
            .map(|c| CollectionSummary {
                id: c.id.clone(),
                display_name: c.name.clone(),
                item_count: c.members.len(),
                accepts_content: true,
            })
            .collect())
    }

    async fn mutate(&self, asset_id: &AssetId, mutation: &Mutation) -> Result<(), RepositoryError> {
        let root = self.root.clone();
        let index_path = self.index_path.clone();
        let lock = Arc::clone(&self.write_lock);
        let asset_id = asset_id.clone();
        let mutation = mutation.clone();

        tokio::task::spawn_blocking(move || {
            if !root.join(asset_id.as_str()).is_file() {
                return Err(RepositoryError::AssetNotFound(asset_id));
            }
            let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
            let mut index = LibraryIndex::load(&index_path)?;
            index.apply(&asset_id, &mutation)?;
            index.save(&index_path)?;
            debug!(asset = %asset_id, ?mutation, "library index updated");
            Ok(())
        })
        .await
        .map_err(join_error)?
    }
}
