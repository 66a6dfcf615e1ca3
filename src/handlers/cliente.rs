// src/handlers/cliente.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    common::{error::AppError, extract::JsonBody},
    config::AppState,
    middleware::auth::verificar_senha,
    models::cliente::SaldoConvenio,
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConvenioPayload {
    pub search_term: String,
    pub password: String,
}

// POST /cliente/convenio
#[utoipa::path(
    post,
    path = "/cliente/convenio",
    tag = "Clientes",
    request_body = ConvenioPayload,
    responses(
        (status = 200, description = "Saldo e histórico por cliente", body = [SaldoConvenio]),
        (status = 401, description = "Senha incorreta"),
        (status = 404, description = "Cliente não encontrado")
    )
)]
pub async fn saldo_convenio(
    State(app_state): State<AppState>,
    JsonBody(payload): JsonBody<ConvenioPayload>,
) -> Result<impl IntoResponse, AppError> {
    verificar_senha(&app_state.config.shared_password, &payload.password)?;

    let saldos = app_state.produto_service.saldo_convenio(&payload.search_term).await?;
    Ok((StatusCode::OK, Json(saldos)))
}
