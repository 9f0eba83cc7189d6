use crate::error::ApiError;
use crate::models::Project;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Trait for project session storage
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Store or replace a project
    async fn upsert(&self, project: Project) -> Result<(), ApiError>;

    /// Find project by ID
    async fn find_by_id(&self, id: &str) -> Result<Option<Project>, ApiError>;

    /// Number of stored projects
    async fn count(&self) -> Result<usize, ApiError>;
}

/// In-memory project storage, lost on restart
pub struct InMemoryProjectStore {
    projects: Arc<RwLock<HashMap<String, Project>>>,
}

impl InMemoryProjectStore {
    pub fn new() -> Self {
        Self {
            projects: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryProjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProjectStore for InMemoryProjectStore {
    async fn upsert(&self, project: Project) -> Result<(), ApiError> {
        let mut projects = self.projects.write().await;
        projects.insert(project.id.clone(), project);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Project>, ApiError> {
        let projects = self.projects.read().await;
        Ok(projects.get(id).cloned())
    }

    async fn count(&self) -> Result<usize, ApiError> {
        Ok(self.projects.read().await.len())
    }
}
