// src/middleware/auth.rs

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

use crate::common::error::AppError;

/// Senha compartilhada entre as lojas, comparada por igualdade.
/// Precisa rodar antes de qualquer leitura de estoque.
pub fn verificar_senha(esperada: &str, recebida: &str) -> Result<(), AppError> {
    if esperada != recebida {
        tracing::warn!("Senha incorreta em chamada entre lojas");
        return Err(AppError::InvalidPassword);
    }
    Ok(())
}

// Extrator: só aceita chamadas vindas desta máquina (a janela local).
#[derive(Debug, Clone, Copy)]
pub struct OrigemLocal(pub SocketAddr);

impl<S> FromRequestParts<S> for OrigemLocal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ConnectInfo(endereco) = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .copied()
            .ok_or(AppError::LocalOnly)?;

        if !endereco.ip().is_loopback() {
            tracing::warn!(%endereco, "Chamada à interface local vinda de fora");
            return Err(AppError::LocalOnly);
        }
        Ok(OrigemLocal(endereco))
    }
}

// O middleware das rotas /local
pub async fn local_guard(_origem: OrigemLocal, request: Request, next: Next) -> Response {
    next.run(request).await
}
