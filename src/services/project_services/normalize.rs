use crate::error::AppError;
use crate::services::project_services::models::{
    ListField, NewProject, ProjectChanges, ProjectFields,
};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

//keys owned by the server, dropped from client input
const RESERVED_FIELDS: [&str; 4] = ["id", "_id", "createdAt", "updatedAt"];

/**
 * normalize a create payload
 * list fields are collapsed into real lists, then the uploaded image path
 * (if any) replaces whatever coverImage the client sent
 */
pub fn normalize_create(
    fields: ProjectFields,
    cover_image_path: Option<String>,
) -> Result<NewProject, AppError> {
    let technologies = coerce_list(fields.technologies, "technologies")?;
    let categories = coerce_list(fields.categories, "categories")?;
    let attributes = pass_through(fields.extra)?;

    let title = fields
        .title
        .ok_or_else(|| AppError::invalid_input("Field `title` is required"))?;
    let description = fields
        .description
        .ok_or_else(|| AppError::invalid_input("Field `description` is required"))?;

    let cover_image = match cover_image_path {
        Some(path) => Some(path),
        None => fields.cover_image,
    };

    Ok(NewProject {
        title,
        description,
        technologies: technologies.unwrap_or_default(),
        categories: categories.unwrap_or_default(),
        cover_image,
        attributes,
    })
}

/**
 * normalize a partial update
 * only present fields are coerced, coverImage is never rewritten
 */
pub fn normalize_update(fields: ProjectFields) -> Result<ProjectChanges, AppError> {
    Ok(ProjectChanges {
        technologies: coerce_list(fields.technologies, "technologies")?,
        categories: coerce_list(fields.categories, "categories")?,
        attributes: pass_through(fields.extra)?,
        title: fields.title,
        description: fields.description,
        cover_image: fields.cover_image,
    })
}

fn coerce_list(
    field: Option<ListField>,
    name: &'static str,
) -> Result<Option<Vec<String>>, AppError> {
    field.map(|list| list.into_items(name)).transpose()
}

fn pass_through(extra: BTreeMap<String, Value>) -> Result<BTreeMap<String, Value>, AppError> {
    let mut attributes = BTreeMap::new();
    for (key, value) in extra {
        if RESERVED_FIELDS.contains(&key.as_str()) {
            debug!("Dropping server managed field {}", key);
            continue;
        }
        check_key(&key)?;
        check_nested_keys(&value)?;
        attributes.insert(key, value);
    }
    Ok(attributes)
}

//document keys cannot be empty, contain '.' or start with '$'
fn check_key(key: &str) -> Result<(), AppError> {
    if key.is_empty() || key.contains('.') || key.starts_with('$') {
        return Err(AppError::invalid_input(format!(
            "Field name `{key}` is not allowed"
        )));
    }
    Ok(())
}

fn check_nested_keys(value: &Value) -> Result<(), AppError> {
    match value {
        Value::Object(map) => map.iter().try_for_each(|(key, inner)| {
            check_key(key)?;
            check_nested_keys(inner)
        }),
        Value::Array(items) => items.iter().try_for_each(check_nested_keys),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields() -> ProjectFields {
        ProjectFields {
            title: Some("Site".into()),
            description: Some("My site".into()),
            ..Default::default()
        }
    }

    #[test]
    fn create_parses_stringified_lists() {
        let input = ProjectFields {
            technologies: Some(ListField::Encoded("[\"rust\",\"axum\"]".into())),
            categories: Some(ListField::Items(vec!["web".into()])),
            ..fields()
        };

        let project = normalize_create(input, None).unwrap();
        assert_eq!(project.technologies, vec!["rust", "axum"]);
        assert_eq!(project.categories, vec!["web"]);
    }

    #[test]
    fn create_defaults_missing_lists_to_empty() {
        let project = normalize_create(fields(), None).unwrap();
        assert!(project.technologies.is_empty());
        assert!(project.categories.is_empty());
        assert!(project.cover_image.is_none());
    }

    #[test]
    fn uploaded_path_overrides_client_cover_image() {
        let input = ProjectFields {
            cover_image: Some("https://evil.example/x.png".into()),
            ..fields()
        };
        let project =
            normalize_create(input, Some("/uploads/projects/abc.png".into())).unwrap();
        assert_eq!(project.cover_image.as_deref(), Some("/uploads/projects/abc.png"));
    }

    #[test]
    fn client_cover_image_kept_without_upload() {
        let input = ProjectFields {
            cover_image: Some("/uploads/projects/old.png".into()),
            ..fields()
        };
        let project = normalize_create(input, None).unwrap();
        assert_eq!(project.cover_image.as_deref(), Some("/uploads/projects/old.png"));
    }

    #[test]
    fn create_requires_title_and_description() {
        let input = ProjectFields {
            title: None,
            ..fields()
        };
        assert!(matches!(
            normalize_create(input, None),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn malformed_categories_fail_before_anything_else() {
        let input = ProjectFields {
            title: None,
            categories: Some(ListField::Encoded("[abc".into())),
            ..fields()
        };
        assert!(matches!(
            normalize_create(input, None),
            Err(AppError::Parse { field: "categories", .. })
        ));
    }

    #[test]
    fn update_only_touches_present_fields() {
        let changes = normalize_update(ProjectFields {
            technologies: Some(ListField::Encoded("[\"go\"]".into())),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(changes.technologies, Some(vec!["go".to_string()]));
        assert_eq!(changes.categories, None);
        assert_eq!(changes.title, None);
        assert_eq!(changes.cover_image, None);
    }

    #[test]
    fn reserved_fields_are_dropped_and_bad_keys_rejected() {
        let mut extra = BTreeMap::new();
        extra.insert("_id".to_string(), json!("x"));
        extra.insert("createdAt".to_string(), json!("yesterday"));
        extra.insert("githubUrl".to_string(), json!("https://github.com/a/b"));
        let changes = normalize_update(ProjectFields {
            extra,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(changes.attributes.len(), 1);
        assert_eq!(changes.attributes["githubUrl"], json!("https://github.com/a/b"));

        let mut extra = BTreeMap::new();
        extra.insert("$where".to_string(), json!("1"));
        let err = normalize_update(ProjectFields {
            extra,
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn nested_keys_follow_the_same_rules() {
        let attributes_of = |value: Value| {
            normalize_create(
                ProjectFields {
                    extra: BTreeMap::from([("meta".to_string(), value)]),
                    ..fields()
                },
                None,
            )
        };

        for bad in [
            json!({ "$where": "1" }),
            json!({ "a.b": 2 }),
            json!({ "links": [{ "ok": 1 }, { "$ref": "x" }] }),
            json!([[{ "": true }]]),
        ] {
            assert!(
                matches!(attributes_of(bad.clone()), Err(AppError::InvalidInput(_))),
                "{bad} should be rejected"
            );
        }

        let project = attributes_of(json!({ "links": [{ "repo": "github" }], "stars": 3 })).unwrap();
        assert_eq!(project.attributes["meta"]["links"][0]["repo"], json!("github"));
    }
}
