//! Disk persistence for [`SectionStore`].
//!
//! The whole store is written as one postcard-encoded [`Tag`] to
//! `<directory>/<save_key>.dat`. Writes go to a temporary file in the same
//! directory which is then renamed over the old file, so a crash mid-save
//! leaves the previous file intact.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use tempfile::NamedTempFile;
use tracing::debug;
use vigil_primitives::{Tag, TagError, TagKind};

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::section::WorldSection;
use crate::store::SectionStore;

impl<S: WorldSection> SectionStore<S> {
	/// Writes every section to the configured data file and clears the dirty
	/// set.
	///
	/// Returns the written path, or `None` when `config` has no directory. On
	/// failure the dirty set is restored.
	pub fn save(&self, config: &StoreConfig) -> Result<Option<PathBuf>, StoreError> {
		config.validate()?;
		let (Some(dir), Some(path)) = (config.directory.as_ref(), config.data_file()) else {
			return Ok(None);
		};

		let (root, dirty) = self.write(|sections| {
			let root = sections.to_tag();
			let dirty = std::mem::take(sections.dirty_mut());
			(root, dirty)
		});
		let count = dirty.len();

		let result = encode(Tag::Compound(root)).and_then(|bytes| {
			fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;
			let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
			tmp.write_all(&bytes)
				.and_then(|()| tmp.as_file().sync_all())
				.map_err(|e| StoreError::io(tmp.path(), e))?;
			tmp.persist(&path).map_err(|e| StoreError::io(&path, e.error))?;
			Ok(())
		});

		match result {
			Ok(()) => {
				debug!(path = %path.display(), dirty = count, "Saved section store");
				Ok(Some(path))
			}
			Err(error) => {
				self.write(|sections| sections.dirty_mut().extend(dirty));
				Err(error)
			}
		}
	}

	/// Replaces the store's contents with the configured data file.
	///
	/// Returns `false` without touching the store if persistence is disabled or
	/// the file does not exist yet.
	pub fn load(&self, config: &StoreConfig, cx: &S::Context) -> Result<bool, StoreError> {
		config.validate()?;
		let Some(path) = config.data_file() else {
			return Ok(false);
		};
		let bytes = match fs::read(&path) {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == io::ErrorKind::NotFound => {
				debug!(path = %path.display(), "No section store on disk");
				return Ok(false);
			}
			Err(e) => return Err(StoreError::io(path, e)),
		};

		let root = match postcard::from_bytes::<Tag>(&bytes).map_err(StoreError::Decode)? {
			Tag::Compound(root) => root,
			other => {
				return Err(StoreError::Malformed(TagError::WrongKind {
					field: "<root>".into(),
					expected: TagKind::Compound,
					found: other.kind(),
				}));
			}
		};
		self.read_from_tag(&root, cx)?;
		debug!(path = %path.display(), sections = self.section_count(), "Loaded section store");
		Ok(true)
	}
}

fn encode(tag: Tag) -> Result<Vec<u8>, StoreError> {
	postcard::to_allocvec(&tag).map_err(StoreError::Encode)
}
