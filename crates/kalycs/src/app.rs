//! Lifecycle façade consumed by the outer application shell.
//!
//! Thin delegation to the catalog repositories, plus the rule-mutation →
//! classifier-reload coupling and bulk folder import.

use ignore::WalkBuilder;
use kalycs_catalog::{Catalog, CatalogError, FileRecord, Project, Rule};
use kalycs_classifier::{Classifier, FileMeta};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

pub struct App {
    catalog: Catalog,
    classifier: Arc<Classifier>,
}

impl App {
    pub fn new(catalog: Catalog, classifier: Arc<Classifier>) -> Self {
        Self {
            catalog,
            classifier,
        }
    }

    pub fn classifier(&self) -> &Arc<Classifier> {
        &self.classifier
    }

    // ---------------- Project operations ----------------

    pub async fn list_projects(&self) -> Result<Vec<Project>, CatalogError> {
        self.catalog.list_projects().await
    }

    pub async fn create_project(&self, mut project: Project) -> Result<Project, CatalogError> {
        self.catalog.create_project(&mut project).await?;
        Ok(project)
    }

    pub async fn update_project(&self, mut project: Project) -> Result<Project, CatalogError> {
        self.catalog.update_project(&mut project).await?;
        Ok(project)
    }

    pub async fn delete_project(&self, id: &str) -> Result<(), CatalogError> {
        self.catalog.delete_project(id).await
    }

    // ---------------- Rule operations ----------------
    //
    // Every successful rule mutation reloads the classifier so the in-memory
    // set tracks the catalog. A failed reload is surfaced to the caller; the
    // persisted mutation stays, and the next successful reload converges.

    pub async fn list_rules(&self, project_id: &str) -> Result<Vec<Rule>, CatalogError> {
        self.catalog.list_rules_by_project(project_id).await
    }

    pub async fn create_rule(&self, mut rule: Rule) -> Result<Rule, CatalogError> {
        self.catalog.create_rule(&mut rule).await?;
        self.classifier.reload().await?;
        Ok(rule)
    }

    pub async fn update_rule(&self, mut rule: Rule) -> Result<Rule, CatalogError> {
        self.catalog.update_rule(&mut rule).await?;
        self.classifier.reload().await?;
        Ok(rule)
    }

    pub async fn delete_rule(&self, id: &str) -> Result<(), CatalogError> {
        self.catalog.delete_rule(id).await?;
        self.classifier.reload().await
    }

    // ---------------- Import ----------------

    /// Walk `dir` recursively, classifying every file entry. Errors on
    /// individual entries are logged and do not abort the walk.
    pub async fn import_folder(&self, dir: &Path) -> Result<Vec<FileRecord>, CatalogError> {
        info!(dir = %dir.display(), "Importing folder");

        let walker = WalkBuilder::new(dir)
            .hidden(false)
            .ignore(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .follow_links(false)
            .build();

        let mut imported = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    error!(error = %err, "Error accessing path during import");
                    continue;
                }
            };

            if entry.file_type().map_or(true, |kind| kind.is_dir()) {
                continue;
            }

            let path = entry.path();
            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(err) => {
                    error!(path = %path.display(), error = %err, "Failed to stat file during import");
                    continue;
                }
            };

            info!(path = %path.display(), "Importing and classifying file");
            match self
                .classifier
                .classify(path, FileMeta::from_metadata(&metadata))
                .await
            {
                Ok(file) => imported.push(file),
                Err(err) => {
                    error!(path = %path.display(), error = %err, "Failed to classify file during import");
                }
            }
        }

        Ok(imported)
    }
}
