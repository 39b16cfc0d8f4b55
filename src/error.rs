use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{FormRejection, JsonRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

/**
 * error type shared by handlers, the normalizer and the stores
 * every variant maps to one http status
 */
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Only image files are allowed!")]
    InvalidFileType { file_name: String },

    #[error("{0}")]
    InvalidInput(String),

    #[error("Field `{field}` is not a valid JSON array of strings: {source}")]
    Parse {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Project with id {0} not found")]
    NotFound(String),

    #[error("Unsupported content type: {0}")]
    UnsupportedMediaType(String),

    //body could not be extracted at all (wrong boundary, bad json, over the limit)
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error("Invalid multipart data: {0}")]
    Multipart(#[from] MultipartError),

    #[error("File storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Document encoding error: {0}")]
    Encoding(#[from] mongodb::bson::ser::Error),
}

impl AppError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        AppError::InvalidInput(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidFileType { .. } | AppError::InvalidInput(_) | AppError::Parse { .. } => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::Rejected { status, .. } => *status,
            AppError::Multipart(err) => err.status(),
            AppError::Storage(_) | AppError::Database(_) | AppError::Encoding(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        AppError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    status_code: u16,
    message: String,
    error: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        //never leak driver or io details to the client
        let message = if status.is_server_error() {
            error!("Request failed: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorBody {
            status_code: status.as_u16(),
            message,
            error: status.canonical_reason().unwrap_or("Error"),
        };
        (status, Json(body)).into_response()
    }
}
