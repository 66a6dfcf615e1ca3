// src/services/peer_client.rs
//
// Chamadas HTTP diretas entre lojas (POST com JSON).

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::{
    common::error::AppError,
    models::transfer::{AtualizarProdutoPayload, TransferPayload, TransferRequest, TransferResponse},
};

pub const ROTA_SOLICITACAO: &str = "/request";
pub const ROTA_RESPOSTA: &str = "/request/response";
pub const ROTA_TRANSFERENCIA: &str = "/transfer";
pub const ROTA_ATUALIZAR_PRODUTO: &str = "/update/produto";

#[derive(Debug, Clone)]
pub struct PeerReply {
    pub status: u16,
    pub body: Value,
}

/// Transporte usado para falar com outras lojas.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    async fn post(&self, url: &str, body: Value) -> Result<PeerReply, AppError>;
}

#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PeerTransport for HttpTransport {
    async fn post(&self, url: &str, body: Value) -> Result<PeerReply, AppError> {
        let resposta = self.client.post(url).json(&body).send().await?;
        let status = resposta.status().as_u16();
        // Corpo vazio ou não-JSON não é erro por si só.
        let texto = resposta.text().await?;
        let body = serde_json::from_str(&texto).unwrap_or(Value::Null);
        Ok(PeerReply { status, body })
    }
}

#[derive(Clone)]
pub struct PeerClient {
    transport: Arc<dyn PeerTransport>,
}

impl PeerClient {
    pub fn new(transport: Arc<dyn PeerTransport>) -> Self {
        Self { transport }
    }

    async fn enviar<T: Serialize>(
        &self,
        base: &str,
        rota: &str,
        corpo: &T,
    ) -> Result<Value, AppError> {
        let url = format!("{}{}", base.trim_end_matches('/'), rota);
        let corpo = serde_json::to_value(corpo).map_err(anyhow::Error::from)?;

        let resposta = self.transport.post(&url, corpo).await?;
        if (200..300).contains(&resposta.status) {
            return Ok(resposta.body);
        }

        let message = resposta
            .body
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| resposta.body.to_string());
        tracing::warn!(url = %url, status = resposta.status, %message, "Loja recusou a chamada");
        Err(AppError::Peer { status: resposta.status, message })
    }

    pub async fn solicitar_transferencia(
        &self,
        base: &str,
        pedido: &TransferRequest,
    ) -> Result<(), AppError> {
        self.enviar(base, ROTA_SOLICITACAO, pedido).await.map(|_| ())
    }

    pub async fn responder_transferencia(
        &self,
        base: &str,
        resposta: &TransferResponse,
    ) -> Result<(), AppError> {
        self.enviar(base, ROTA_RESPOSTA, resposta).await.map(|_| ())
    }

    pub async fn transferir(&self, base: &str, payload: &TransferPayload) -> Result<(), AppError> {
        self.enviar(base, ROTA_TRANSFERENCIA, payload).await.map(|_| ())
    }

    pub async fn atualizar_produto(
        &self,
        base: &str,
        payload: &AtualizarProdutoPayload,
    ) -> Result<(), AppError> {
        self.enviar(base, ROTA_ATUALIZAR_PRODUTO, payload).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn cliente() -> PeerClient {
        PeerClient::new(Arc::new(HttpTransport::new(Duration::from_secs(5)).unwrap()))
    }

    fn pedido() -> TransferRequest {
        TransferRequest {
            code: "1".into(),
            name: "GAZE".into(),
            amount: Decimal::from(3),
            store_id: "A".into(),
            password: "segredo".into(),
        }
    }

    #[tokio::test]
    async fn posts_json_to_the_peer_route() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/request"))
            .and(body_partial_json(json!({"code": "1", "storeId": "A"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
            .expect(1)
            .mount(&server)
            .await;

        cliente().solicitar_transferencia(&server.uri(), &pedido()).await.unwrap();
    }

    #[tokio::test]
    async fn non_success_status_becomes_peer_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/request"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "Senha incorreta."})))
            .mount(&server)
            .await;

        let err = cliente()
            .solicitar_transferencia(&format!("{}/", server.uri()), &pedido())
            .await
            .unwrap_err();
        match err {
            AppError::Peer { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Senha incorreta.");
            }
            outro => panic!("erro inesperado: {outro:?}"),
        }
    }
}
