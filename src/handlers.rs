// src/handlers.rs

pub mod cliente;
pub mod local;
pub mod produto;
pub mod transfer;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, middleware::auth::local_guard};

pub fn router(app_state: AppState) -> Router {
    // Rotas chamadas pelas outras lojas
    let lojas_routes = Router::new()
        .route("/produto/info/{search_term}", get(produto::produto_info))
        .route("/produto/cadastro", post(produto::cadastrar_produto))
        .route("/produto/{search_term}", get(produto::produto_com_estoque))
        .route("/update/produto", post(produto::atualizar_produto))
        .route("/cliente/convenio", post(cliente::saldo_convenio))
        .route("/request", post(transfer::receber_solicitacao))
        .route("/request/response", post(transfer::receber_resposta))
        .route("/transfer", post(transfer::receber_transferencia));

    // Rotas da janela local (só loopback)
    let local_routes = Router::new()
        .route("/lojas", get(local::lojas_online))
        .route("/estoque/{search_term}", get(local::buscar_estoque_remoto))
        .route("/consulta", post(local::consulta_remota))
        .route("/consulta/local", post(local::consulta_local))
        .route(
            "/transferencias",
            post(local::solicitar_transferencia).get(local::transferencias_pendentes),
        )
        .route("/transferencias/{id}/aceitar", post(local::aceitar_transferencia))
        .route("/transferencias/{id}/rejeitar", post(local::rejeitar_transferencia))
        .route(
            "/chat/{chat_id}/mensagens",
            post(local::enviar_mensagem).get(local::historico_chat),
        )
        .route("/chat/{chat_id}/abrir", post(local::abrir_chat))
        .route("/alerta", get(local::estado_alerta))
        .route("/alerta/parar", post(local::parar_alerta))
        .route("/eventos", get(local::eventos))
        .layer(axum_middleware::from_fn(local_guard));

    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(|| async { "OK" }))
        .merge(lojas_routes)
        .nest("/local", local_routes)
        .with_state(app_state)
}
