use axum::extract::{FromRequest, FromRequestParts, Json, Path};

use crate::ApiError;

/// `Json` whose rejections answer with the usual `{"detail": ...}` body.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Path` whose rejections answer with the usual `{"detail": ...}` body.
#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);
