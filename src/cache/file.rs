//! JSON-file [`ResponseCache`] that survives process restarts.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	cache::{CacheError, CacheFuture, CacheKey, CachedResponse, ResponseCache},
};

type Snapshot = HashMap<CacheKey, CachedResponse>;

/// Persists cached responses to a JSON file after each mutation.
#[derive(Clone, Debug)]
pub struct FileCache {
	path: PathBuf,
	inner: Arc<RwLock<Snapshot>>,
}
impl FileCache {
	/// Opens (or creates) a cache at the provided path, eagerly loading existing entries.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, CacheError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = Self::load_snapshot(&path)?;

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	/// Snapshot location.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_snapshot(path: &Path) -> Result<Snapshot, CacheError> {
		if !path.exists() {
			return Ok(HashMap::new());
		}

		let bytes = fs::read(path).map_err(|e| CacheError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		if bytes.is_empty() {
			return Ok(HashMap::new());
		}

		let entries: Vec<(CacheKey, CachedResponse)> =
			serde_json::from_slice(&bytes).map_err(|e| CacheError::Serialization {
				message: format!("Failed to parse {}: {e}", path.display()),
			})?;

		Ok(entries.into_iter().collect())
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), CacheError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| CacheError::Backend {
				message: format!("Failed to create cache directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_locked(&self, contents: &Snapshot) -> Result<(), CacheError> {
		Self::ensure_parent_exists(&self.path)?;

		let snapshot: Vec<_> = contents.iter().collect();
		let serialized =
			serde_json::to_vec_pretty(&snapshot).map_err(|e| CacheError::Serialization {
				message: format!("Failed to serialize cache snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| CacheError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| CacheError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| CacheError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| CacheError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl ResponseCache for FileCache {
	fn get<'a>(
		&'a self,
		key: &'a CacheKey,
		now: OffsetDateTime,
	) -> CacheFuture<'a, Option<CachedResponse>> {
		Box::pin(async move {
			Ok(self.inner.read().get(key).filter(|entry| !entry.is_expired_at(now)).cloned())
		})
	}

	fn put(&self, key: CacheKey, response: CachedResponse) -> CacheFuture<'_, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			guard.retain(|_, entry| !entry.is_expired_at(response.stored_at));
			guard.insert(key, response);
			self.persist_locked(&guard)?;

			Ok(())
		})
	}

	fn purge_expired(&self, now: OffsetDateTime) -> CacheFuture<'_, usize> {
		Box::pin(async move {
			let mut guard = self.inner.write();
			let before = guard.len();

			guard.retain(|_, entry| !entry.is_expired_at(now));

			let removed = before - guard.len();

			if removed > 0 {
				self.persist_locked(&guard)?;
			}

			Ok(removed)
		})
	}

	fn clear(&self) -> CacheFuture<'_, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			guard.clear();
			self.persist_locked(&guard)?;

			Ok(())
		})
	}
}
