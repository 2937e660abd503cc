//! In-memory application directory

use crate::auth::ApplicationId;
use crate::directory::{Application, ApplicationDirectory, DirectoryError};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Application records held in process memory
#[derive(Default)]
pub struct MemoryDirectory {
    applications: RwLock<HashMap<ApplicationId, Application>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a list of records; every record needs an identifier
    pub fn from_applications(
        applications: impl IntoIterator<Item = Application>,
    ) -> Result<Self, DirectoryError> {
        let directory = Self::new();
        for application in applications {
            directory.insert(application)?;
        }
        Ok(directory)
    }

    /// Load a JSON array of application records
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DirectoryError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| DirectoryError::Backend(format!("{}: {}", path.display(), e)))?;
        let applications: Vec<Application> = serde_json::from_str(&contents)
            .map_err(|e| DirectoryError::InvalidRecord(e.to_string()))?;

        debug!(path = %path.display(), count = applications.len(), "Loaded applications");
        Self::from_applications(applications)
    }

    /// Add or replace a record
    pub fn insert(&self, application: Application) -> Result<(), DirectoryError> {
        let id = application
            .id()
            .ok_or_else(|| DirectoryError::InvalidRecord("application has no id".to_string()))?;
        self.applications.write().insert(id, application);
        Ok(())
    }

    /// Remove a record, returning it if present
    pub fn remove(&self, id: ApplicationId) -> Option<Application> {
        self.applications.write().remove(&id)
    }

    pub fn len(&self) -> usize {
        self.applications.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.applications.read().is_empty()
    }
}

impl ApplicationDirectory for MemoryDirectory {
    fn find_by_api_key(&self, api_key: &str) -> Result<Option<Application>, DirectoryError> {
        Ok(self
            .applications
            .read()
            .values()
            .find(|app| app.api_key().matches(api_key))
            .cloned())
    }

    fn find_by_id(&self, id: ApplicationId) -> Result<Option<Application>, DirectoryError> {
        Ok(self.applications.read().get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::ApiKey;

    fn directory() -> MemoryDirectory {
        MemoryDirectory::from_applications([
            Application::new(ApplicationId(1), ApiKey::new("VALID")),
            Application::new(ApplicationId(2), ApiKey::new("OTHER")).with_name("second"),
        ])
        .unwrap()
    }

    #[test]
    fn test_find_by_api_key() {
        let dir = directory();

        let app = dir.find_by_api_key("VALID").unwrap().unwrap();
        assert_eq!(app.id(), Some(ApplicationId(1)));

        let app = dir.find_by_api_key("OTHER").unwrap().unwrap();
        assert_eq!(app.name(), Some("second"));

        assert!(dir.find_by_api_key("INVALID").unwrap().is_none());
    }

    #[test]
    fn test_find_by_id() {
        let dir = directory();
        assert!(dir.find_by_id(ApplicationId(2)).unwrap().is_some());
        assert!(dir.find_by_id(ApplicationId(99)).unwrap().is_none());
    }

    #[test]
    fn test_insert_requires_id() {
        let dir = MemoryDirectory::new();
        let result = dir.insert(Application::unsaved(ApiKey::new("k")));

        assert!(matches!(result, Err(DirectoryError::InvalidRecord(_))));
        assert!(dir.is_empty());
    }

    #[test]
    fn test_insert_replaces_and_remove() {
        let dir = directory();
        dir.insert(Application::new(ApplicationId(1), ApiKey::new("ROTATED")))
            .unwrap();

        assert_eq!(dir.len(), 2);
        assert!(dir.find_by_api_key("VALID").unwrap().is_none());
        assert!(dir.find_by_api_key("ROTATED").unwrap().is_some());

        assert!(dir.remove(ApplicationId(1)).is_some());
        assert!(dir.remove(ApplicationId(1)).is_none());
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn test_from_json_file() {
        let path = std::env::temp_dir().join(format!("apptoken-dir-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"[{"id": 10, "api_key": "ten"}, {"id": 11, "api_key": "eleven", "name": "n"}]"#,
        )
        .unwrap();

        let dir = MemoryDirectory::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(dir.len(), 2);
        assert!(dir.find_by_api_key("eleven").unwrap().is_some());
    }

    #[test]
    fn test_from_json_file_missing() {
        let result = MemoryDirectory::from_json_file("/nonexistent/apptoken/apps.json");
        assert!(matches!(result, Err(DirectoryError::Backend(_))));
    }
}
