//! Creation-tracking store.
//!
//! A single JSON file at a fixed workspace-relative path records used ports,
//! created applications, and installed shared packages. The store is an
//! explicit single-writer repository with read-merge-write semantics: every
//! registration re-reads the file, applies one change, and rewrites it.
//! Concurrent generator invocations against the same workspace are
//! unsupported and can race on this file.

use crate::config::PORT_BASE;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/// One generated application.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppRecord {
    pub name: String,
    pub port: u16,
    pub framework: String,
    /// Shared packages this application depends on.
    #[serde(default)]
    pub shared_packages: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// One installed shared package and the applications using it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedPackageRecord {
    /// Shared package name (without the namespace prefix).
    pub name: String,
    /// Add-on package this shared package was extracted from.
    pub base_package: String,
    #[serde(default)]
    pub used_by: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// On-disk shape of the tracking file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingData {
    #[serde(default)]
    pub used_ports: BTreeMap<String, u16>,
    #[serde(default)]
    pub last_assigned_port: u16,
    #[serde(default)]
    pub created_apps: Vec<AppRecord>,
    #[serde(default)]
    pub shared_packages: Vec<SharedPackageRecord>,
}

/// Repository over the tracking file.
#[derive(Debug, Clone)]
pub struct TrackingStore {
    path: PathBuf,
}

impl TrackingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current data. A missing file is an empty store.
    pub async fn load(&self) -> Result<TrackingData> {
        if !self.path.is_file() {
            return Ok(TrackingData::default());
        }
        let content = fs::read_to_string(&self.path).await?;
        serde_json::from_str(&content).map_err(|e| Error::Store {
            path: self.path.clone(),
            message: format!("corrupt JSON: {e}"),
        })
    }

    async fn save(&self, data: &TrackingData) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(data).map_err(|e| Error::Store {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        fs::write(&self.path, content).await?;
        Ok(())
    }

    /// Allocate a port for an application. An explicit request wins and is
    /// recorded; otherwise the next port after the last assigned one (or the
    /// base) is handed out.
    pub async fn allocate_port(&self, app_name: &str, requested: Option<u16>) -> Result<u16> {
        let mut data = self.load().await?;
        let port = match requested {
            Some(port) => port,
            None => {
                let base = if data.last_assigned_port == 0 {
                    PORT_BASE
                } else {
                    data.last_assigned_port
                };
                let mut candidate = self.next_port(base)?;
                while data.used_ports.values().any(|&p| p == candidate) {
                    candidate = self.next_port(candidate)?;
                }
                candidate
            }
        };
        data.used_ports.insert(app_name.to_string(), port);
        if port > data.last_assigned_port {
            data.last_assigned_port = port;
        }
        self.save(&data).await?;
        Ok(port)
    }

    fn next_port(&self, after: u16) -> Result<u16> {
        after.checked_add(1).ok_or_else(|| Error::Store {
            path: self.path.clone(),
            message: "port space exhausted".to_string(),
        })
    }

    /// Register a created application.
    pub async fn register_app(&self, record: AppRecord) -> Result<()> {
        let mut data = self.load().await?;
        data.used_ports.insert(record.name.clone(), record.port);
        if record.port > data.last_assigned_port {
            data.last_assigned_port = record.port;
        }
        // Re-running against the same name replaces the stale record
        data.created_apps.retain(|a| a.name != record.name);
        data.created_apps.push(record);
        self.save(&data).await
    }

    /// Register a freshly created shared package with its first user.
    pub async fn register_shared_package(
        &self,
        name: &str,
        base_package: &str,
        used_by: &str,
    ) -> Result<()> {
        let mut data = self.load().await?;
        let now = Utc::now();
        data.shared_packages.retain(|s| s.name != name);
        data.shared_packages.push(SharedPackageRecord {
            name: name.to_string(),
            base_package: base_package.to_string(),
            used_by: vec![used_by.to_string()],
            created_at: now,
            updated_at: now,
        });
        self.save(&data).await
    }

    /// Record that another application reuses an existing shared package.
    pub async fn mark_shared_used_by(&self, name: &str, app_name: &str) -> Result<()> {
        let mut data = self.load().await?;
        if let Some(record) = data.shared_packages.iter_mut().find(|s| s.name == name) {
            if !record.used_by.iter().any(|a| a == app_name) {
                record.used_by.push(app_name.to_string());
            }
            record.updated_at = Utc::now();
        }
        self.save(&data).await
    }

    /// Shared package previously created from the given add-on, if any.
    pub async fn find_shared_for_package(
        &self,
        base_package: &str,
    ) -> Result<Option<SharedPackageRecord>> {
        let data = self.load().await?;
        Ok(data
            .shared_packages
            .into_iter()
            .find(|s| s.base_package == base_package))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &Path) -> TrackingStore {
        TrackingStore::new(dir.join(".appsmith.json"))
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let data = store(tmp.path()).load().await.unwrap();
        assert!(data.created_apps.is_empty());
        assert_eq!(data.last_assigned_port, 0);
    }

    #[tokio::test]
    async fn ports_allocate_sequentially_and_respect_requests() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(tmp.path());

        let first = store.allocate_port("a", None).await.unwrap();
        assert_eq!(first, PORT_BASE + 1);

        let second = store.allocate_port("b", None).await.unwrap();
        assert_eq!(second, PORT_BASE + 2);

        let explicit = store.allocate_port("c", Some(9000)).await.unwrap();
        assert_eq!(explicit, 9000);

        let after = store.allocate_port("d", None).await.unwrap();
        assert_eq!(after, 9001);
    }

    #[tokio::test]
    async fn exhausted_port_space_is_a_store_error_not_a_panic() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(tmp.path());

        store.allocate_port("edge", Some(u16::MAX)).await.unwrap();
        let err = store.allocate_port("next", None).await.unwrap_err();
        assert!(matches!(err, Error::Store { .. }));
        assert!(err.to_string().contains("port space exhausted"));
    }

    #[tokio::test]
    async fn register_app_merges_on_write() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(tmp.path());

        store
            .register_shared_package("db", "db-access", "shop")
            .await
            .unwrap();
        store
            .register_app(AppRecord {
                name: "shop".into(),
                port: 3001,
                framework: "express".into(),
                shared_packages: vec!["db".into()],
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        let data = store.load().await.unwrap();
        assert_eq!(data.created_apps.len(), 1);
        assert_eq!(data.shared_packages.len(), 1);
        assert_eq!(data.used_ports.get("shop"), Some(&3001));
    }

    #[tokio::test]
    async fn used_by_grows_without_duplicates() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(tmp.path());

        store
            .register_shared_package("db", "db-access", "shop")
            .await
            .unwrap();
        store.mark_shared_used_by("db", "admin").await.unwrap();
        store.mark_shared_used_by("db", "admin").await.unwrap();

        let record = store
            .find_shared_for_package("db-access")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.used_by, vec!["shop", "admin"]);
        assert!(record.updated_at >= record.created_at);
    }

    #[tokio::test]
    async fn store_file_uses_camel_case_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(tmp.path());
        store.allocate_port("shop", Some(3001)).await.unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"usedPorts\""));
        assert!(raw.contains("\"lastAssignedPort\""));
    }
}
