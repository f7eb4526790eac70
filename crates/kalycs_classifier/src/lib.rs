//! File classification for Kalycs.
//!
//! The [`Classifier`] owns an immutable snapshot of compiled rules, sorted
//! ascending by priority. `classify` walks the snapshot in order; the first
//! matching rule's project owns the file, and files matching nothing land in
//! the sentinel "Incoming" project. `reload` swaps the whole snapshot
//! atomically, so in-flight classifications finish against the set they
//! captured.

mod compile;

pub use compile::{compile_rule, CompileError, CompiledRule};

use chrono::{DateTime, Utc};
use kalycs_catalog::{Catalog, CatalogError, FileRecord, Project};
use std::path::Path;
use std::sync::{Arc, OnceLock, RwLock};
use tracing::{info, warn};

/// Name of the sentinel project owning unmatched files.
pub const INCOMING_PROJECT_NAME: &str = "Incoming";

const INCOMING_PROJECT_DESCRIPTION: &str = "Default project for unclassified files.";

/// Stat metadata captured at classification time.
#[derive(Debug, Clone, Copy)]
pub struct FileMeta {
    pub size: i64,
    pub mtime: DateTime<Utc>,
}

impl FileMeta {
    pub fn from_metadata(metadata: &std::fs::Metadata) -> Self {
        let mtime = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        Self {
            size: metadata.len() as i64,
            mtime,
        }
    }
}

#[derive(Debug)]
pub struct Classifier {
    catalog: Catalog,
    rule_set: RwLock<Arc<[CompiledRule]>>,
    incoming_project_id: OnceLock<String>,
}

impl Classifier {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            rule_set: RwLock::new(Arc::from(Vec::new())),
            incoming_project_id: OnceLock::new(),
        }
    }

    /// Resolve the sentinel Incoming project, creating it on first boot, and
    /// cache its id. Must run before [`Classifier::classify`].
    pub async fn load_incoming_project(&self) -> Result<(), CatalogError> {
        let id = match self
            .catalog
            .get_project_by_name(INCOMING_PROJECT_NAME)
            .await?
        {
            Some(project) => project.id,
            None => {
                info!(project_name = INCOMING_PROJECT_NAME, "Incoming project not found, creating it");
                let mut project = Project::new(INCOMING_PROJECT_NAME);
                project.description = INCOMING_PROJECT_DESCRIPTION.to_string();
                self.catalog.create_project(&mut project).await?;
                project.id
            }
        };

        let _ = self.incoming_project_id.set(id.clone());
        info!(project_name = INCOMING_PROJECT_NAME, project_id = %id, "Incoming project loaded");
        Ok(())
    }

    /// Cached id of the Incoming project, once loaded.
    pub fn incoming_project_id(&self) -> Option<&str> {
        self.incoming_project_id.get().map(String::as_str)
    }

    /// Recompile the active rule-set and swap it in atomically.
    ///
    /// Rules that fail to compile are skipped with a warning; one bad rule
    /// never rejects the rest of the set.
    pub async fn reload(&self) -> Result<(), CatalogError> {
        let rules = self.catalog.list_active_rules().await?;

        let mut compiled = Vec::with_capacity(rules.len());
        for rule in &rules {
            match compile_rule(rule) {
                Ok(ready) => compiled.push(ready),
                Err(err) => {
                    warn!(rule_id = %rule.id, rule_name = %rule.name, error = %err, "Skipping invalid rule");
                }
            }
        }
        compiled.sort_by_key(|rule| rule.priority);

        let count = compiled.len();
        let snapshot: Arc<[CompiledRule]> = Arc::from(compiled);
        *self
            .rule_set
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = snapshot;

        info!(rule_count = count, "Classifier reloaded");
        Ok(())
    }

    /// The current snapshot; readers keep matching against it even if a
    /// reload swaps in a new one mid-call.
    pub fn rule_set(&self) -> Arc<[CompiledRule]> {
        self.rule_set
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Classify one absolute path and record it in the catalog.
    pub async fn classify(&self, path: &Path, meta: FileMeta) -> Result<FileRecord, CatalogError> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let incoming = self
            .incoming_project_id
            .get()
            .ok_or_else(|| CatalogError::invalid_state("incoming project not loaded"))?;

        let rules = self.rule_set();
        let project_id = match rules.iter().find(|rule| rule.matches(&name, &ext)) {
            Some(rule) => {
                info!(
                    file_path = %path.display(),
                    file_name = %name,
                    rule_id = %rule.rule_id,
                    project_id = %rule.project_id,
                    "File classified by rule"
                );
                rule.project_id.clone()
            }
            None => {
                info!(
                    file_path = %path.display(),
                    file_name = %name,
                    project_id = %incoming,
                    "File classified to incoming project"
                );
                incoming.clone()
            }
        };

        let mut file = FileRecord::new(
            path.to_string_lossy().into_owned(),
            name,
            ext,
            meta.size,
            meta.mtime,
        );
        file.project_id = Some(project_id);

        self.catalog.upsert_file(&mut file).await?;
        Ok(file)
    }
}
