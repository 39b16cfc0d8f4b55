use crate::error::AppError;
use axum::extract::multipart::{Field, Multipart};
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tokio::{fs, io::AsyncWriteExt};
use tracing::{info, warn};
use uuid::Uuid;

pub const COVER_IMAGE_FIELD: &str = "coverImage";
pub const PUBLIC_PREFIX: &str = "/uploads/projects";

const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/**
 * image accepted from the coverImage field and already written to disk
 * the file is removed when this is dropped unless `keep` was called
 */
#[derive(Debug)]
pub struct StoredImage {
    pub file_name: String,
    pub original_name: String,
    pub path: PathBuf,
    pub size: u64,
    kept: bool,
}

impl StoredImage {
    fn pending(file_name: String, original_name: &str, path: PathBuf) -> Self {
        StoredImage {
            file_name,
            original_name: original_name.to_string(),
            path,
            size: 0,
            kept: false,
        }
    }

    pub fn public_path(&self) -> String {
        format!("{}/{}", PUBLIC_PREFIX, self.file_name)
    }

    //call once a record points at the file
    pub fn keep(&mut self) {
        self.kept = true;
    }
}

impl Drop for StoredImage {
    fn drop(&mut self) {
        if self.kept {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => info!("Removed unreferenced image {}", self.file_name),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => warn!("Failed to remove {}: {}", self.path.display(), err),
        }
    }
}

/**
 * disk storage for project images under <upload_root>/projects
 */
#[derive(Clone, Debug)]
pub struct ImageStorage {
    dir: PathBuf,
}

impl ImageStorage {
    pub fn new(upload_root: impl AsRef<Path>) -> Self {
        ImageStorage {
            dir: upload_root.as_ref().join("projects"),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /**
     * stream one file field to disk under a random name
     * the extension check runs before anything is written
     */
    pub async fn store(
        &self,
        original_name: &str,
        mut field: Field<'_>,
    ) -> Result<StoredImage, AppError> {
        if !is_allowed_image(original_name) {
            return Err(AppError::InvalidFileType {
                file_name: original_name.to_string(),
            });
        }

        fs::create_dir_all(&self.dir).await?;
        let file_name = random_file_name(original_name);
        let path = self.dir.join(&file_name);

        //declared before the handle so the handle is closed first on drop
        let mut image = StoredImage::pending(file_name, original_name, path);
        let mut file = fs::File::create(&image.path).await?;
        while let Some(chunk) = field.chunk().await? {
            image.size += chunk.len() as u64;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        info!(
            "Stored cover image {} ({} bytes) as {}",
            original_name, image.size, image.file_name
        );
        Ok(image)
    }
}

/**
 * text fields of a create form plus the optional stored cover image
 */
#[derive(Debug, Default)]
pub struct CreateForm {
    pub pairs: Vec<(String, String)>,
    pub image: Option<StoredImage>,
}

/**
 * read a multipart create request
 * at most one file, only in the coverImage field
 * on failure the form is dropped and any image already written with it
 */
pub async fn read_create_form(
    mut multipart: Multipart,
    storage: &ImageStorage,
) -> Result<CreateForm, AppError> {
    let mut form = CreateForm::default();
    collect_fields(&mut multipart, storage, &mut form).await?;
    Ok(form)
}

async fn collect_fields(
    multipart: &mut Multipart,
    storage: &ImageStorage,
    form: &mut CreateForm,
) -> Result<(), AppError> {
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        let Some(original_name) = field.file_name().map(str::to_string) else {
            let value = field.text().await?;
            form.pairs.push((name, value));
            continue;
        };

        if name != COVER_IMAGE_FIELD {
            return Err(AppError::invalid_input(format!(
                "Unexpected field `{name}`, files are only accepted in `{COVER_IMAGE_FIELD}`"
            )));
        }
        if form.image.is_some() {
            return Err(AppError::invalid_input(format!(
                "Only one file may be sent in `{COVER_IMAGE_FIELD}`"
            )));
        }

        form.image = Some(storage.store(&original_name, field).await?);
    }
    Ok(())
}

/**
 * name must end in one of the image extensions (case-sensitive)
 */
pub fn is_allowed_image(original_name: &str) -> bool {
    original_name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext))
}

/**
 * 32 lowercase hex chars from a v4 uuid plus the original extension
 */
pub fn random_file_name(original_name: &str) -> String {
    let token = Uuid::new_v4().simple().to_string();
    match original_name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => format!("{token}.{ext}"),
        _ => token,
    }
}
