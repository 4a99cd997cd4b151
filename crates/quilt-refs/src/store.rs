use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use quilt_types::{ChangeSetId, VersionId};

use crate::error::{RefError, RefResult};
use crate::names::validate_version_name;
use crate::types::Version;

/// Store of version pointers plus the current-version context.
///
/// The "current" version is the application-side context that `switch_to`
/// moves between branches; it decides which version new changes derive
/// their lineage from. Switching never mutates change sets.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VersionStore {
    versions: BTreeMap<VersionId, Version>,
    by_name: BTreeMap<String, VersionId>,
    current: Option<VersionId>,
}

impl VersionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Insert a new version. Fails on invalid or duplicate names.
    pub fn insert(&mut self, version: Version) -> RefResult<()> {
        validate_version_name(&version.name)?;
        if self.by_name.contains_key(&version.name) {
            return Err(RefError::NameTaken(version.name));
        }
        debug!(version = %version.id.short_id(), name = %version.name, "created version");
        self.by_name.insert(version.name.clone(), version.id);
        self.versions.insert(version.id, version);
        Ok(())
    }

    /// Create a new version pointing where `from` points.
    ///
    /// Only the pointer is copied; no changes are duplicated.
    pub fn create_from(&mut self, from: &VersionId, name: &str) -> RefResult<Version> {
        let source = self.get(from)?.clone();
        let version = Version::new(name, source.change_set_id);
        self.insert(version.clone())?;
        Ok(version)
    }

    pub fn get(&self, id: &VersionId) -> RefResult<&Version> {
        self.versions.get(id).ok_or(RefError::UnknownVersion(*id))
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Version> {
        self.by_name.get(name).and_then(|id| self.versions.get(id))
    }

    /// All versions, sorted by name.
    pub fn list(&self) -> Vec<&Version> {
        self.by_name
            .values()
            .filter_map(|id| self.versions.get(id))
            .collect()
    }

    /// Move a version's pointer to a new change set.
    pub fn advance(&mut self, id: &VersionId, change_set: ChangeSetId) -> RefResult<()> {
        let version = self
            .versions
            .get_mut(id)
            .ok_or(RefError::UnknownVersion(*id))?;
        debug!(
            version = %version.name,
            change_set = %change_set.short_id(),
            "advanced version pointer"
        );
        version.change_set_id = change_set;
        Ok(())
    }

    /// The current version, if one has been selected.
    pub fn current(&self) -> Option<&Version> {
        self.current.and_then(|id| self.versions.get(&id))
    }

    /// Switch the current-version context.
    pub fn switch_to(&mut self, id: &VersionId) -> RefResult<()> {
        if !self.versions.contains_key(id) {
            return Err(RefError::UnknownVersion(*id));
        }
        self.current = Some(*id);
        Ok(())
    }

    /// Delete a version pointer. The change sets it pointed at survive.
    pub fn delete(&mut self, id: &VersionId) -> RefResult<bool> {
        if self.current == Some(*id) {
            let name = self
                .versions
                .get(id)
                .map(|v| v.name.clone())
                .unwrap_or_default();
            return Err(RefError::DeleteCurrentVersion(name));
        }
        match self.versions.remove(id) {
            Some(version) => {
                self.by_name.remove(&version.name);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed() -> (VersionStore, Version) {
        let mut store = VersionStore::new();
        let main = Version::new("main", ChangeSetId::new());
        store.insert(main.clone()).unwrap();
        store.switch_to(&main.id).unwrap();
        (store, main)
    }

    #[test]
    fn insert_and_lookup() {
        let (store, main) = seed();
        assert_eq!(store.get(&main.id).unwrap().name, "main");
        assert_eq!(store.get_by_name("main").unwrap().id, main.id);
        assert!(store.get_by_name("ghost").is_none());
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let (mut store, _) = seed();
        let err = store
            .insert(Version::new("main", ChangeSetId::new()))
            .unwrap_err();
        assert!(matches!(err, RefError::NameTaken(_)));
    }

    #[test]
    fn invalid_name_is_rejected() {
        let (mut store, _) = seed();
        let err = store
            .insert(Version::new("bad..name", ChangeSetId::new()))
            .unwrap_err();
        assert!(matches!(err, RefError::InvalidName { .. }));
    }

    #[test]
    fn create_from_copies_only_the_pointer() {
        let (mut store, main) = seed();
        let feature = store.create_from(&main.id, "feature").unwrap();
        assert_eq!(feature.change_set_id, main.change_set_id);
        assert_ne!(feature.id, main.id);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn advance_moves_the_pointer() {
        let (mut store, main) = seed();
        let tip = ChangeSetId::new();
        store.advance(&main.id, tip).unwrap();
        assert_eq!(store.get(&main.id).unwrap().change_set_id, tip);
    }

    #[test]
    fn advance_unknown_version_fails() {
        let (mut store, _) = seed();
        let err = store
            .advance(&VersionId::new(), ChangeSetId::new())
            .unwrap_err();
        assert!(matches!(err, RefError::UnknownVersion(_)));
    }

    #[test]
    fn switch_to_tracks_current() {
        let (mut store, main) = seed();
        let feature = store.create_from(&main.id, "feature").unwrap();
        store.switch_to(&feature.id).unwrap();
        assert_eq!(store.current().unwrap().id, feature.id);
    }

    #[test]
    fn switch_to_unknown_version_fails() {
        let (mut store, main) = seed();
        let err = store.switch_to(&VersionId::new()).unwrap_err();
        assert!(matches!(err, RefError::UnknownVersion(_)));
        // The context is unchanged after a failed switch.
        assert_eq!(store.current().unwrap().id, main.id);
    }

    #[test]
    fn cannot_delete_current_version() {
        let (mut store, main) = seed();
        let err = store.delete(&main.id).unwrap_err();
        assert!(matches!(err, RefError::DeleteCurrentVersion(_)));
    }

    #[test]
    fn delete_noncurrent_version() {
        let (mut store, main) = seed();
        let feature = store.create_from(&main.id, "feature").unwrap();
        assert!(store.delete(&feature.id).unwrap());
        assert!(!store.delete(&feature.id).unwrap());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn list_is_sorted_by_name() {
        let (mut store, main) = seed();
        store.create_from(&main.id, "alpha").unwrap();
        store.create_from(&main.id, "zeta").unwrap();
        let names: Vec<&str> = store.list().iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "main", "zeta"]);
    }
}
