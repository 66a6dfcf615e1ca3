// src/handlers/transfer.rs
//
// Rotas de transferência chamadas por outras lojas.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::{
    common::{error::AppError, extract::JsonBody},
    config::AppState,
    middleware::auth::verificar_senha,
    models::{
        produto::Produto,
        transfer::{PendingTransfer, TransferPayload, TransferRequest, TransferResponse},
    },
};

// POST /request
#[utoipa::path(
    post,
    path = "/request",
    tag = "Transferências",
    request_body = TransferRequest,
    responses(
        (status = 202, description = "Pedido entregue ao operador", body = PendingTransfer),
        (status = 401, description = "Senha incorreta")
    )
)]
pub async fn receber_solicitacao(
    State(app_state): State<AppState>,
    JsonBody(payload): JsonBody<TransferRequest>,
) -> Result<impl IntoResponse, AppError> {
    verificar_senha(&app_state.config.shared_password, &payload.password)?;

    let pendente = app_state.transfer.receber_solicitacao(payload)?;
    Ok((StatusCode::ACCEPTED, Json(pendente)))
}

// POST /request/response
#[utoipa::path(
    post,
    path = "/request/response",
    tag = "Transferências",
    request_body = TransferResponse,
    responses(
        (status = 200, description = "Resposta entregue à interface"),
        (status = 401, description = "Senha incorreta")
    )
)]
pub async fn receber_resposta(
    State(app_state): State<AppState>,
    JsonBody(payload): JsonBody<TransferResponse>,
) -> Result<impl IntoResponse, AppError> {
    verificar_senha(&app_state.config.shared_password, &payload.password)?;

    app_state.transfer.receber_resposta(payload);
    Ok((StatusCode::OK, Json(json!({ "message": "Resposta recebida." }))))
}

// POST /transfer
#[utoipa::path(
    post,
    path = "/transfer",
    tag = "Transferências",
    request_body = TransferPayload,
    responses(
        (status = 200, description = "Estoque somado (produto cadastrado se necessário)", body = Produto),
        (status = 400, description = "Quantidade não positiva ou acima do limite"),
        (status = 401, description = "Senha incorreta")
    )
)]
pub async fn receber_transferencia(
    State(app_state): State<AppState>,
    JsonBody(payload): JsonBody<TransferPayload>,
) -> Result<impl IntoResponse, AppError> {
    verificar_senha(&app_state.config.shared_password, &payload.password)?;

    let produto = app_state
        .produto_service
        .receber_transferencia(&payload.product, payload.amount, &app_state.config.user_code)
        .await?;

    tracing::info!(
        codigo = %produto.codigo, quantidade = %payload.amount, de = %payload.store_id,
        "📦 Estoque recebido por transferência"
    );
    Ok((StatusCode::OK, Json(produto)))
}
