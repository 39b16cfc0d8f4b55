use crate::error::AppError;
use crate::models::project::Project;
use crate::services::project_services::models::{NewProject, ProjectChanges};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, to_bson, Document},
    options::ReturnDocument,
    Collection, Database,
};
use tracing::info;

pub const PROJECTS_COLLECTION: &str = "projects";

/**
 * persistence seam for project records
 * ids are taken exactly as the client sent them
 */
#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn create(&self, input: NewProject) -> Result<Project, AppError>;
    async fn find_all(&self) -> Result<Vec<Project>, AppError>;
    async fn find_one(&self, id: &str) -> Result<Project, AppError>;
    async fn update(&self, id: &str, changes: ProjectChanges) -> Result<Project, AppError>;
    async fn remove(&self, id: &str) -> Result<Project, AppError>;
}

pub struct MongoProjectStore {
    collection: Collection<Project>,
}

impl MongoProjectStore {
    pub fn new(db: &Database) -> Self {
        MongoProjectStore {
            collection: db.collection::<Project>(PROJECTS_COLLECTION),
        }
    }
}

//an id that is not an ObjectId can never resolve to a record
fn parse_id(id: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(id).map_err(|_| AppError::NotFound(id.to_string()))
}

//ObjectIds start with their creation time, so `_id` order is insertion order
fn insertion_order() -> Document {
    doc! { "_id": 1 }
}

/**
 * build the `$set` update for a partial change
 * pass-through fields are merged one key at a time into `attributes`
 */
pub fn set_document(changes: &ProjectChanges, now: DateTime<Utc>) -> Result<Document, AppError> {
    let mut set = doc! { "updatedAt": to_bson(&now)? };

    if let Some(title) = &changes.title {
        set.insert("title", title.as_str());
    }
    if let Some(description) = &changes.description {
        set.insert("description", description.as_str());
    }
    if let Some(technologies) = &changes.technologies {
        set.insert("technologies", technologies.clone());
    }
    if let Some(categories) = &changes.categories {
        set.insert("categories", categories.clone());
    }
    if let Some(cover_image) = &changes.cover_image {
        set.insert("coverImage", cover_image.as_str());
    }
    for (key, value) in &changes.attributes {
        set.insert(format!("attributes.{key}"), to_bson(value)?);
    }

    Ok(doc! { "$set": set })
}

#[async_trait]
impl ProjectStore for MongoProjectStore {
    async fn create(&self, input: NewProject) -> Result<Project, AppError> {
        let project = Project::new(input);
        self.collection.insert_one(&project).await?;
        info!("Inserted project {}", project.id.to_hex());
        Ok(project)
    }

    async fn find_all(&self) -> Result<Vec<Project>, AppError> {
        let cursor = self
            .collection
            .find(doc! {})
            .sort(insertion_order())
            .await?;
        let projects: Vec<Project> = cursor.try_collect().await?;
        Ok(projects)
    }

    async fn find_one(&self, id: &str) -> Result<Project, AppError> {
        let oid = parse_id(id)?;
        self.collection
            .find_one(doc! { "_id": oid })
            .await?
            .ok_or_else(|| AppError::NotFound(id.to_string()))
    }

    async fn update(&self, id: &str, changes: ProjectChanges) -> Result<Project, AppError> {
        let oid = parse_id(id)?;
        let update = set_document(&changes, Utc::now())?;
        let project = self
            .collection
            .find_one_and_update(doc! { "_id": oid }, update)
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;
        info!("Updated project {}", id);
        Ok(project)
    }

    async fn remove(&self, id: &str) -> Result<Project, AppError> {
        let oid = parse_id(id)?;
        let project = self
            .collection
            .find_one_and_delete(doc! { "_id": oid })
            .await?
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;
        info!("Removed project {}", id);
        Ok(project)
    }
}
