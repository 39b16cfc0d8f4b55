use crate::error::AppError;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/**
 * a list field as it reaches us
 * form encodings can only send text, so a single value holds JSON array text
 */
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum ListField {
    Items(Vec<String>),
    Encoded(String),
}

impl ListField {
    //one form value is JSON text, repeated values are already a list
    pub fn from_form(mut values: Vec<String>) -> Self {
        if values.len() == 1 {
            ListField::Encoded(values.remove(0))
        } else {
            ListField::Items(values)
        }
    }

    pub fn into_items(self, field: &'static str) -> Result<Vec<String>, AppError> {
        match self {
            ListField::Items(items) => Ok(items),
            ListField::Encoded(text) => serde_json::from_str::<Vec<String>>(&text)
                .map_err(|source| AppError::Parse { field, source }),
        }
    }
}

/**
 * raw create/update payload before normalization
 * every field optional, unknown fields collected into `extra`
 */
#[derive(Deserialize, Default, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFields {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub technologies: Option<ListField>,
    #[serde(default)]
    pub categories: Option<ListField>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ProjectFields {
    /**
     * build the payload from text form fields (multipart or urlencoded)
     */
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Result<Self, AppError> {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, value) in pairs {
            grouped.entry(name).or_default().push(value);
        }

        let mut fields = ProjectFields::default();
        for (name, mut values) in grouped {
            match name.as_str() {
                "technologies" => fields.technologies = Some(ListField::from_form(values)),
                "categories" => fields.categories = Some(ListField::from_form(values)),
                "title" => fields.title = Some(single_value(&name, values)?),
                "description" => fields.description = Some(single_value(&name, values)?),
                "coverImage" => fields.cover_image = Some(single_value(&name, values)?),
                _ => {
                    let value = if values.len() == 1 {
                        Value::String(values.remove(0))
                    } else {
                        Value::Array(values.into_iter().map(Value::String).collect())
                    };
                    fields.extra.insert(name, value);
                }
            }
        }
        Ok(fields)
    }
}

fn single_value(name: &str, mut values: Vec<String>) -> Result<String, AppError> {
    if values.len() > 1 {
        return Err(AppError::invalid_input(format!(
            "Field `{name}` must be sent only once"
        )));
    }
    Ok(values.remove(0))
}

/**
 * normalized payload handed to ProjectStore::create
 */
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewProject {
    pub title: String,
    pub description: String,
    pub technologies: Vec<String>,
    pub categories: Vec<String>,
    pub cover_image: Option<String>,
    pub attributes: BTreeMap<String, Value>,
}

/**
 * normalized partial update handed to ProjectStore::update
 */
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProjectChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub technologies: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
    pub cover_image: Option<String>,
    pub attributes: BTreeMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn json_accepts_both_list_shapes() {
        let fields: ProjectFields = serde_json::from_value(json!({
            "title": "A",
            "technologies": ["rust", "axum"],
            "categories": "[\"web\"]",
            "githubUrl": "https://github.com/x/y",
        }))
        .unwrap();

        assert_eq!(
            fields.technologies,
            Some(ListField::Items(vec!["rust".into(), "axum".into()]))
        );
        assert_eq!(
            fields.categories,
            Some(ListField::Encoded("[\"web\"]".into()))
        );
        assert_eq!(fields.extra["githubUrl"], json!("https://github.com/x/y"));
        assert!(fields.description.is_none());
    }

    #[test]
    fn encoded_list_is_parsed() {
        let items = ListField::Encoded("[\"rust\",\"tokio\"]".into())
            .into_items("technologies")
            .unwrap();
        assert_eq!(items, vec!["rust", "tokio"]);
    }

    #[test]
    fn malformed_list_is_a_parse_error() {
        let err = ListField::Encoded("[abc".into())
            .into_items("categories")
            .unwrap_err();
        assert!(matches!(err, AppError::Parse { field: "categories", .. }));

        //valid json but not a list of strings
        let err = ListField::Encoded("42".into())
            .into_items("categories")
            .unwrap_err();
        assert!(matches!(err, AppError::Parse { .. }));
    }

    #[test]
    fn form_pairs_group_repeated_fields() {
        let fields = ProjectFields::from_pairs(pairs(&[
            ("title", "Site"),
            ("technologies", "[\"rust\"]"),
            ("categories", "web"),
            ("categories", "cli"),
            ("tag", "a"),
            ("tag", "b"),
            ("featured", "true"),
        ]))
        .unwrap();

        assert_eq!(fields.title.as_deref(), Some("Site"));
        assert_eq!(
            fields.technologies,
            Some(ListField::Encoded("[\"rust\"]".into()))
        );
        assert_eq!(
            fields.categories,
            Some(ListField::Items(vec!["web".into(), "cli".into()]))
        );
        assert_eq!(fields.extra["tag"], json!(["a", "b"]));
        assert_eq!(fields.extra["featured"], json!("true"));
    }

    #[test]
    fn repeated_scalar_is_rejected() {
        let err = ProjectFields::from_pairs(pairs(&[("title", "a"), ("title", "b")])).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
