use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bead_pattern::PatternError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Could not decode image: {0}")]
    Decode(String),

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Pattern error: {0}")]
    Pattern(#[from] PatternError),

    #[error("Rendering error: {0}")]
    Render(#[from] RenderError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Rejected input, reported before any state is touched.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Unsupported media type: {0} (expected image/*)")]
    UnsupportedMediaType(String),

    #[error("Upload too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },

    #[error("Invalid {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

impl ValidationError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("SVG parse error: {0}")]
    SvgParse(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Unsupported dimensions: {width}x{height}")]
    UnsupportedDimensions { width: u32, height: u32 },

    #[error("Failed to allocate pixmap")]
    PixmapAllocation,

    #[error("PNG encode error: {0}")]
    PngEncode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Status for core errors: caller mistakes are 400, broken state is 500.
fn pattern_status(error: &PatternError) -> StatusCode {
    match error {
        PatternError::InvalidHex { .. }
        | PatternError::DimensionMismatch { .. }
        | PatternError::InvalidCellSize { .. }
        | PatternError::InvalidBoardUnit(_)
        | PatternError::UnknownBeadId(_)
        | PatternError::UnknownPalette(_) => StatusCode::BAD_REQUEST,
        PatternError::NoPaletteColors | PatternError::DuplicateColorId { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(ValidationError::UnsupportedMediaType(_)) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            ApiError::Validation(ValidationError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Validation(ValidationError::InvalidParameter { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Decode(_) => StatusCode::BAD_REQUEST,
            ApiError::ProjectNotFound(_) | ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Pattern(e) => pattern_status(e),
            ApiError::Render(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let body = Json(json!({
            "status": status.as_u16(),
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
