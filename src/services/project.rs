use crate::error::AppError;
use crate::models::project::ProjectResponse;
use crate::services::project_services::{
    models::ProjectFields,
    normalize::{normalize_create, normalize_update},
    upload::{read_create_form, StoredImage},
};
use crate::AppState;
use axum::{
    extract::{FromRequest, Multipart, Path, Request, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    routing::get,
    Form, Json, Router,
};
use tracing::{debug, info};

#[derive(Debug, PartialEq)]
enum BodyKind {
    Json,
    UrlEncoded,
    Multipart,
}

fn body_kind(headers: &HeaderMap) -> Result<BodyKind, AppError> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match mime.as_str() {
        "application/json" => Ok(BodyKind::Json),
        "application/x-www-form-urlencoded" => Ok(BodyKind::UrlEncoded),
        "multipart/form-data" => Ok(BodyKind::Multipart),
        m if m.ends_with("+json") => Ok(BodyKind::Json),
        "" => Err(AppError::UnsupportedMediaType("missing".to_string())),
        other => Err(AppError::UnsupportedMediaType(other.to_string())),
    }
}

/**
 * decode a json or urlencoded body into raw project fields
 */
async fn read_fields(kind: BodyKind, request: Request) -> Result<ProjectFields, AppError> {
    match kind {
        BodyKind::Json => {
            let Json(fields) = Json::<ProjectFields>::from_request(request, &()).await?;
            Ok(fields)
        }
        BodyKind::UrlEncoded => {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(request, &()).await?;
            ProjectFields::from_pairs(pairs)
        }
        BodyKind::Multipart => Err(AppError::UnsupportedMediaType(
            "multipart/form-data".to_string(),
        )),
    }
}

/**
 * routes for the projects resource
 */
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route(
            "/projects/{id}",
            get(get_project).patch(update_project).delete(delete_project),
        )
}

/**
 * api endpoint to create a project
 * multipart bodies may carry one image in `coverImage`
 */
pub async fn create_project(
    State(state): State<AppState>,
    request: Request,
) -> Result<(StatusCode, Json<ProjectResponse>), AppError> {
    let kind = body_kind(request.headers())?;

    let (fields, mut image) = if kind == BodyKind::Multipart {
        let multipart = Multipart::from_request(request, &()).await?;
        let form = read_create_form(multipart, &state.images).await?;
        (ProjectFields::from_pairs(form.pairs), form.image)
    } else {
        (read_fields(kind, request).await, None)
    };

    //on any error, or if this future is dropped, `image` removes its file
    let input = normalize_create(fields?, image.as_ref().map(StoredImage::public_path))?;
    let project = state.store.create(input).await?;

    match image.as_mut() {
        Some(image) => {
            image.keep();
            info!(
                "Created project {} with cover image {} ({} bytes)",
                project.id.to_hex(),
                image.original_name,
                image.size
            );
        }
        None => info!("Created project {}", project.id.to_hex()),
    }
    Ok((StatusCode::CREATED, Json(project.into())))
}

pub async fn list_projects(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProjectResponse>>, AppError> {
    let projects = state.store.find_all().await?;
    debug!("Listing {} projects", projects.len());
    Ok(Json(projects.into_iter().map(Into::into).collect()))
}

pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProjectResponse>, AppError> {
    let project = state.store.find_one(&id).await?;
    Ok(Json(project.into()))
}

/**
 * api endpoint to update a project
 * same list coercion as create, no upload and no coverImage rewrite
 */
pub async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
    request: Request,
) -> Result<Json<ProjectResponse>, AppError> {
    let kind = body_kind(request.headers())?;
    let fields = read_fields(kind, request).await?;
    let changes = normalize_update(fields)?;
    let project = state.store.update(&id, changes).await?;
    Ok(Json(project.into()))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProjectResponse>, AppError> {
    let project = state.store.remove(&id).await?;
    Ok(Json(project.into()))
}
