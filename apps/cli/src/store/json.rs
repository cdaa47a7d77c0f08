//! One JSON document per list in a data directory.

use std::fs;
use std::path::{Path, PathBuf};

use glimmind_core::AssociationList;

use super::{ListStore, Result, StoreError};

/// Stores each list as `<dir>/<id>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open the store at `dir`, creating the directory if necessary.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> Result<PathBuf> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidId(id.to_string()));
        }
        Ok(self.dir.join(format!("{id}.json")))
    }
}

impl ListStore for JsonFileStore {
    fn load(&self, id: &str) -> Result<AssociationList> {
        let path = self.path_for(id)?;
        if !path.exists() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        let bytes = fs::read(&path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn save(&self, list: &AssociationList) -> Result<()> {
        let path = self.path_for(&list.id)?;
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(list)?;

        // Write then rename so a crash never leaves a torn document
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn list_all(&self, owner_id: &str) -> Result<Vec<AssociationList>> {
        let mut lists = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = fs::read(&path)?;
            match serde_json::from_slice::<AssociationList>(&bytes) {
                Ok(list) if list.owner_id == owner_id => lists.push(list),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable list");
                }
            }
        }

        lists.sort_by(|a, b| {
            let a_time = a.updated_at.unwrap_or(a.created_at);
            let b_time = b.updated_at.unwrap_or(b.created_at);
            b_time.cmp(&a_time).then_with(|| a.name.cmp(&b.name))
        });
        Ok(lists)
    }

    fn delete(&self, id: &str) -> Result<()> {
        let path = self.path_for(id)?;
        if !path.exists() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        fs::remove_file(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glimmind_core::Association;

    #[test]
    fn rejects_path_like_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        assert!(matches!(store.load("../etc/passwd"), Err(StoreError::InvalidId(_))));
        assert!(matches!(store.load(""), Err(StoreError::InvalidId(_))));
    }

    #[test]
    fn missing_list_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        assert!(matches!(store.load("nope"), Err(StoreError::NotFound(_))));
        assert!(matches!(store.delete("nope"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        let list = AssociationList::new("me", "L", "A / B", vec![Association::new("a", "b")]);
        store.save(&list).unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![format!("{}.json", list.id)]);
    }
}
