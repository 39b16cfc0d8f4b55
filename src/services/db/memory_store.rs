use crate::error::AppError;
use crate::models::project::Project;
use crate::services::db::project_store::ProjectStore;
use crate::services::project_services::models::{NewProject, ProjectChanges};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

/**
 * process local store keyed by id hex
 * used for PROJECT_STORE=memory and in tests
 */
#[derive(Default)]
pub struct MemoryProjectStore {
    projects: DashMap<String, Project>,
}

impl MemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProjectStore for MemoryProjectStore {
    async fn create(&self, input: NewProject) -> Result<Project, AppError> {
        let project = Project::new(input);
        self.projects.insert(project.id.to_hex(), project.clone());
        Ok(project)
    }

    async fn find_all(&self) -> Result<Vec<Project>, AppError> {
        let mut projects: Vec<Project> = self
            .projects
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        //ObjectId hex sorts by creation order
        projects.sort_by_key(|project| project.id.to_hex());
        Ok(projects)
    }

    async fn find_one(&self, id: &str) -> Result<Project, AppError> {
        self.projects
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::NotFound(id.to_string()))
    }

    async fn update(&self, id: &str, changes: ProjectChanges) -> Result<Project, AppError> {
        let mut entry = self
            .projects
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;
        entry.apply(changes, Utc::now());
        Ok(entry.value().clone())
    }

    async fn remove(&self, id: &str) -> Result<Project, AppError> {
        self.projects
            .remove(id)
            .map(|(_, project)| project)
            .ok_or_else(|| AppError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(title: &str) -> NewProject {
        NewProject {
            title: title.to_string(),
            description: format!("{title} description"),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_then_find() {
        let store = MemoryProjectStore::new();
        let first = store.create(input("one")).await.unwrap();
        let second = store.create(input("two")).await.unwrap();

        let found = store.find_one(&first.id.to_hex()).await.unwrap();
        assert_eq!(found.title, "one");

        let all = store.find_all().await.unwrap();
        let titles: Vec<_> = all.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["one", "two"]);
        assert_eq!(all[1].id, second.id);
    }

    #[tokio::test]
    async fn missing_ids_are_not_found() {
        let store = MemoryProjectStore::new();
        assert!(matches!(
            store.find_one("nope").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            store.update("nope", ProjectChanges::default()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(store.remove("nope").await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn update_and_remove() {
        let store = MemoryProjectStore::new();
        let id = store.create(input("one")).await.unwrap().id.to_hex();

        let updated = store
            .update(
                &id,
                ProjectChanges {
                    categories: Some(vec!["web".to_string()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.categories, vec!["web"]);
        assert_eq!(updated.title, "one");

        let removed = store.remove(&id).await.unwrap();
        assert_eq!(removed.categories, vec!["web"]);
        assert!(store.find_all().await.unwrap().is_empty());
    }
}
