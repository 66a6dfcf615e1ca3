// src/handlers/produto.rs
//
// Rotas de produto consumidas pelas outras lojas.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::{
    common::{error::AppError, extract::JsonBody},
    config::AppState,
    middleware::auth::verificar_senha,
    models::{
        produto::{ListaProdutos, Produto},
        transfer::{AtualizarProdutoPayload, CadastroProdutoPayload},
    },
};

// GET /produto/info/{search_term}
#[utoipa::path(
    get,
    path = "/produto/info/{search_term}",
    tag = "Produtos",
    responses(
        (status = 200, description = "Produtos encontrados (com ou sem estoque)", body = ListaProdutos),
        (status = 404, description = "Nenhum produto encontrado")
    ),
    params(("search_term" = String, Path, description = "Nome, código ou código de barras"))
)]
pub async fn produto_info(
    State(app_state): State<AppState>,
    Path(search_term): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let data = app_state.produto_service.buscar(&search_term, false).await?;
    Ok((StatusCode::OK, Json(ListaProdutos { data })))
}

// GET /produto/{search_term}
#[utoipa::path(
    get,
    path = "/produto/{search_term}",
    tag = "Produtos",
    responses(
        (status = 200, description = "Produtos com estoque positivo", body = ListaProdutos),
        (status = 404, description = "Nenhum produto com estoque")
    ),
    params(("search_term" = String, Path, description = "Nome, código ou código de barras"))
)]
pub async fn produto_com_estoque(
    State(app_state): State<AppState>,
    Path(search_term): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let data = app_state.produto_service.buscar(&search_term, true).await?;
    Ok((StatusCode::OK, Json(ListaProdutos { data })))
}

// POST /update/produto
#[utoipa::path(
    post,
    path = "/update/produto",
    tag = "Produtos",
    request_body = AtualizarProdutoPayload,
    responses(
        (status = 200, description = "Estoque atualizado", body = Produto),
        (status = 401, description = "Senha incorreta"),
        (status = 404, description = "Produto não encontrado"),
        (status = 409, description = "Estoque já está nesta quantidade")
    )
)]
pub async fn atualizar_produto(
    State(app_state): State<AppState>,
    JsonBody(payload): JsonBody<AtualizarProdutoPayload>,
) -> Result<impl IntoResponse, AppError> {
    verificar_senha(&app_state.config.shared_password, &payload.password)?;

    let produto = app_state
        .produto_service
        .definir_estoque(&payload.barcode, payload.quantity, &payload.user_code)
        .await?;

    tracing::info!(codigo = %produto.codigo, quantidade = %payload.quantity, "Estoque definido");
    Ok((StatusCode::OK, Json(produto)))
}

// POST /produto/cadastro
#[utoipa::path(
    post,
    path = "/produto/cadastro",
    tag = "Produtos",
    request_body = CadastroProdutoPayload,
    responses(
        (status = 201, description = "Produto cadastrado"),
        (status = 401, description = "Senha incorreta"),
        (status = 409, description = "Código já cadastrado")
    )
)]
pub async fn cadastrar_produto(
    State(app_state): State<AppState>,
    JsonBody(payload): JsonBody<CadastroProdutoPayload>,
) -> Result<impl IntoResponse, AppError> {
    verificar_senha(&app_state.config.shared_password, &payload.password)?;

    app_state
        .produto_service
        .cadastrar(&payload.product, &payload.user_code)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Produto cadastrado com sucesso.", "codigo": payload.product.codigo })),
    ))
}
