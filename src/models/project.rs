use crate::services::project_services::models::{NewProject, ProjectChanges};
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    pub cover_image: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn new(input: NewProject) -> Self {
        let now = Utc::now();
        Project {
            id: ObjectId::new(),
            title: input.title,
            description: input.description,
            technologies: input.technologies,
            categories: input.categories,
            cover_image: input.cover_image,
            attributes: input.attributes,
            created_at: now,
            updated_at: now,
        }
    }

    /**
     * apply a partial update in place
     * absent fields keep their current value
     */
    pub fn apply(&mut self, changes: ProjectChanges, now: DateTime<Utc>) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(description) = changes.description {
            self.description = description;
        }
        if let Some(technologies) = changes.technologies {
            self.technologies = technologies;
        }
        if let Some(categories) = changes.categories {
            self.categories = categories;
        }
        if let Some(cover_image) = changes.cover_image {
            self.cover_image = Some(cover_image);
        }
        self.attributes.extend(changes.attributes);
        self.updated_at = now;
    }
}

/**
 * http shape of a project
 * id as hex string, pass-through attributes flattened to the top level
 */
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub technologies: Vec<String>,
    pub categories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Project> for ProjectResponse {
    fn from(project: Project) -> Self {
        ProjectResponse {
            id: project.id.to_hex(),
            title: project.title,
            description: project.description,
            technologies: project.technologies,
            categories: project.categories,
            cover_image: project.cover_image,
            attributes: project.attributes,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}
