// src/common/extract.rs

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};

use crate::common::error::AppError;

// Mesmo que `Json`, mas corpo malformado vira `AppError` (400 com `{"error"}`)
// em vez da resposta em texto puro do axum.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(valor) = Json::<T>::from_request(req, state).await?;
        Ok(JsonBody(valor))
    }
}
