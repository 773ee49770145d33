use axum::{
    debug_handler,
    extract::{FromRequest, FromRequestParts},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::AppError;

/// The `{success, message, data}` shape every response is wrapped in.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

pub struct Res<T>(pub StatusCode, pub &'static str, pub T);

impl<T> IntoResponse for Res<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        let Res(status, message, data) = self;
        (
            status,
            axum::Json(Envelope {
                success: true,
                message: message.to_owned(),
                data: Some(data),
            }),
        )
            .into_response()
    }
}

pub fn ok<T: Serialize>(message: &'static str, data: T) -> Res<T> {
    Res(StatusCode::OK, message, data)
}

pub fn created<T: Serialize>(message: &'static str, data: T) -> Res<T> {
    Res(StatusCode::CREATED, message, data)
}

pub fn failure(status: StatusCode, message: String) -> Response {
    (
        status,
        axum::Json(Envelope::<()> {
            success: false,
            message,
            data: None,
        }),
    )
        .into_response()
}

#[debug_handler]
pub async fn route_not_found() -> Response {
    failure(StatusCode::NOT_FOUND, "Route not found".to_owned())
}

// extractor rejections come back in the envelope too
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Json<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct Path<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct Query<T>(pub T);
