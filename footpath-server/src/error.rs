use std::path::PathBuf;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Startup failures
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Cannot read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config file: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("No footpath file given, set `footpaths` in the config or pass --footpaths")]
    MissingFootpaths,
    #[error(transparent)]
    Engine(#[from] footpath_core::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Graph build task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Request failures, rendered as JSON bodies
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Routing(#[from] footpath_core::Error),
    #[error("Routing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Routing(
                footpath_core::Error::InvalidCoordinate { .. }
                | footpath_core::Error::InvalidQuery(_)
                | footpath_core::Error::InvalidConfig(_),
            ) => StatusCode::BAD_REQUEST,
            ApiError::Routing(_) | ApiError::Join(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {self}");
        }
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
