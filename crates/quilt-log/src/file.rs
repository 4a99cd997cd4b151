use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{LogError, LogResult};

/// A host-application file. The engine never interprets `data`; plugins do.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRow {
    pub id: String,
    pub path: String,
    pub data: Vec<u8>,
    pub metadata: BTreeMap<String, String>,
}

/// Registry of host files referenced by changes via `file_id`.
///
/// Changes point at files; they never duplicate file bytes. File data is
/// only rewritten through conflict resolution (`apply_changes`) or directly
/// by the host.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FileStore {
    files: BTreeMap<String, FileRow>,
}

impl FileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Insert or replace a file row.
    pub fn upsert(&mut self, file: FileRow) {
        self.files.insert(file.id.clone(), file);
    }

    pub fn get(&self, id: &str) -> LogResult<&FileRow> {
        self.files
            .get(id)
            .ok_or_else(|| LogError::UnknownFile(id.to_string()))
    }

    /// Replace a file's byte content, keeping path and metadata.
    pub fn set_data(&mut self, id: &str, data: Vec<u8>) -> LogResult<()> {
        let file = self
            .files
            .get_mut(id)
            .ok_or_else(|| LogError::UnknownFile(id.to_string()))?;
        file.data = data;
        Ok(())
    }

    /// All file ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        self.files.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(id: &str, data: &[u8]) -> FileRow {
        FileRow {
            id: id.into(),
            path: format!("/{id}"),
            data: data.to_vec(),
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn upsert_and_get() {
        let mut store = FileStore::new();
        store.upsert(file("doc.md", b"# hi"));
        assert_eq!(store.get("doc.md").unwrap().data, b"# hi");
    }

    #[test]
    fn unknown_file_is_an_error() {
        let store = FileStore::new();
        assert!(matches!(
            store.get("ghost"),
            Err(LogError::UnknownFile(_))
        ));
    }

    #[test]
    fn set_data_keeps_metadata() {
        let mut store = FileStore::new();
        let mut f = file("doc.md", b"old");
        f.metadata.insert("lang".into(), "en".into());
        store.upsert(f);

        store.set_data("doc.md", b"new".to_vec()).unwrap();
        let row = store.get("doc.md").unwrap();
        assert_eq!(row.data, b"new");
        assert_eq!(row.metadata.get("lang").map(String::as_str), Some("en"));
    }
}
