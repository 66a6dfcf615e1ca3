// src/handlers/local.rs
//
// Interface da janela desta loja (só loopback; ver middleware::auth::local_guard).

use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Json,
};
use futures::{stream, Stream};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, extract::JsonBody},
    config::AppState,
    db::ConsultaGenerica,
    models::{
        chat::{MensagemChat, NovaMensagemPayload},
        remote::BuscaEstoque,
    },
};

// --- LOJAS ---

pub async fn lojas_online(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let lojas = app_state.presenca.online().await?;
    Ok((StatusCode::OK, Json(json!({ "loja": app_state.config.store_id, "online": lojas }))))
}

// --- BUSCAS ---

// GET /local/estoque/{search_term}: pergunta a todas as lojas online.
pub async fn buscar_estoque_remoto(
    State(app_state): State<AppState>,
    Path(search_term): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let resultados = app_state.busca.buscar(&BuscaEstoque { search_term }).await?;
    Ok((StatusCode::OK, Json(resultados)))
}

pub async fn consulta_remota(
    State(app_state): State<AppState>,
    JsonBody(payload): JsonBody<ConsultaGenerica>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    // Campo fora da lista nem chega às outras lojas.
    payload.campo()?;
    let resultados = app_state.consulta.buscar(&payload).await?;
    Ok((StatusCode::OK, Json(resultados)))
}

pub async fn consulta_local(
    State(app_state): State<AppState>,
    JsonBody(payload): JsonBody<ConsultaGenerica>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let linhas = app_state.produto_service.consulta(payload.campo()?, &payload.valor).await?;
    Ok((StatusCode::OK, Json(linhas)))
}

// --- TRANSFERÊNCIAS ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SolicitarTransferenciaPayload {
    #[validate(length(min = 1, message = "A loja é obrigatória."))]
    pub store_id: String,
    #[validate(length(min = 1, message = "O código é obrigatório."))]
    pub code: String,
    pub name: String,
    pub amount: Decimal,
}

pub async fn solicitar_transferencia(
    State(app_state): State<AppState>,
    JsonBody(payload): JsonBody<SolicitarTransferenciaPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    if payload.amount <= Decimal::ZERO {
        let mut erros = validator::ValidationErrors::new();
        let mut erro = validator::ValidationError::new("range");
        erro.message = Some("A quantidade deve ser maior que zero.".into());
        erros.add("amount", erro);
        return Err(AppError::ValidationError(erros));
    }

    app_state
        .transfer
        .solicitar(&payload.store_id, &payload.code, &payload.name, payload.amount)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(json!({ "message": "Solicitação enviada." }))))
}

pub async fn transferencias_pendentes(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok((StatusCode::OK, Json(app_state.transfer.listar_pendentes()?)))
}

pub async fn aceitar_transferencia(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let desfecho = app_state.transfer.aceitar(id).await?;
    Ok((StatusCode::OK, Json(desfecho)))
}

pub async fn rejeitar_transferencia(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let desfecho = app_state.transfer.rejeitar(id).await?;
    Ok((StatusCode::OK, Json(desfecho)))
}

// --- CHAT ---

pub async fn enviar_mensagem(
    State(app_state): State<AppState>,
    Path(chat_id): Path<String>,
    JsonBody(payload): JsonBody<NovaMensagemPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let mensagem: MensagemChat = app_state
        .chat
        .enviar(&chat_id, &payload.texto, payload.urgente)
        .await?;
    Ok((StatusCode::CREATED, Json(mensagem)))
}

pub async fn historico_chat(
    State(app_state): State<AppState>,
    Path(chat_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok((StatusCode::OK, Json(app_state.chat.historico(&chat_id).await?)))
}

pub async fn abrir_chat(
    State(app_state): State<AppState>,
    Path(chat_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    app_state.chat.abrir(app_state.sessao.chat_ativo(), &chat_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- ALERTA ---

pub async fn estado_alerta(State(app_state): State<AppState>) -> impl IntoResponse {
    Json(app_state.alerta.estado())
}

pub async fn parar_alerta(State(app_state): State<AppState>) -> impl IntoResponse {
    app_state.alerta.parar();
    StatusCode::NO_CONTENT
}

// --- EVENTOS (SSE) ---

pub async fn eventos(
    State(app_state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = app_state.eventos.assinar();

    let fluxo = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(evento) => match Event::default().json_data(&evento) {
                    Ok(ev) => return Some((Ok(ev), rx)),
                    Err(e) => tracing::warn!(error = %e, "Evento não serializável"),
                },
                Err(RecvError::Lagged(perdidos)) => {
                    tracing::warn!(perdidos, "Interface atrasada; eventos descartados");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(fluxo).keep_alive(KeepAlive::default())
}
