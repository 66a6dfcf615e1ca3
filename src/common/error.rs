// src/common/error.rs

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Corpo que não é o JSON esperado (sintaxe, tipo ou campo faltando)
    #[error("Corpo da requisição inválido: {0}")]
    InvalidBody(#[from] JsonRejection),

    #[error("Quantidade inválida: {0}")]
    InvalidAmount(String),

    #[error("Senha incorreta")]
    InvalidPassword,

    #[error("Acesso permitido apenas a partir desta máquina")]
    LocalOnly,

    #[error("Produto não encontrado")]
    ProductNotFound,

    #[error("Cliente não encontrado")]
    ClientNotFound,

    #[error("Loja não encontrada: {0}")]
    StoreNotFound(String),

    #[error("Solicitação de transferência não encontrada")]
    TransferNotFound,

    #[error("Estoque já está nesta quantidade")]
    StockUnchanged,

    #[error("Produto já cadastrado: {0}")]
    ProductAlreadyExists(String),

    #[error("Campo de consulta não permitido: {0}")]
    FieldNotAllowed(String),

    #[error("Chat inválido: {0}")]
    InvalidChat(String),

    // Falhas de comunicação com o banco remoto compartilhado
    #[error("Erro no banco remoto: {0}")]
    RemoteStore(String),

    // Resposta não-2xx de outra loja
    #[error("Loja respondeu {status}: {message}")]
    Peer { status: u16, message: String },

    #[error("Falha de comunicação: {0}")]
    Http(#[from] reqwest::Error),

    // Variante para erros de banco de dados. Nunca expomos o detalhe ao cliente.
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidBody(_)
            | AppError::InvalidAmount(_)
            | AppError::FieldNotAllowed(_)
            | AppError::InvalidChat(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidPassword => StatusCode::UNAUTHORIZED,
            AppError::LocalOnly => StatusCode::FORBIDDEN,
            AppError::ProductNotFound
            | AppError::ClientNotFound
            | AppError::StoreNotFound(_)
            | AppError::TransferNotFound => StatusCode::NOT_FOUND,
            AppError::StockUnchanged | AppError::ProductAlreadyExists(_) => StatusCode::CONFLICT,
            AppError::RemoteStore(_) | AppError::Peer { .. } | AppError::Http(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match self {
            // Retorna todos os detalhes da validação.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (status, body).into_response();
            }
            AppError::InvalidPassword => "Senha incorreta.".to_string(),

            // Erros de banco e internos viram 500 genérico; o detalhe fica só no log.
            ref e @ (AppError::DatabaseError(_) | AppError::InternalServerError(_)) => {
                tracing::error!("Erro Interno do Servidor: {:?}", e);
                "A operação falhou.".to_string()
            }
            ref e @ (AppError::RemoteStore(_) | AppError::Http(_) | AppError::Peer { .. }) => {
                tracing::warn!("Falha de comunicação: {}", e);
                e.to_string()
            }
            e => e.to_string(),
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_error_taxonomy() {
        assert_eq!(AppError::InvalidPassword.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::FieldNotAllowed("senha".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::InvalidAmount("10".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::ProductNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::StockUnchanged.status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::ProductAlreadyExists("7891".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::DatabaseError(sqlx::Error::PoolTimedOut).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn database_errors_never_leak_driver_detail() {
        let response = AppError::DatabaseError(sqlx::Error::Protocol("segredo do driver".into()))
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(!body.contains("segredo"));
        assert!(body.contains("A operação falhou."));
    }
}
