// src/models/transfer.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::produto::Produto;

// --- Estado final de uma transferência ---
// Não existe estado intermediário visível para quem pediu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum TransferStatus {
    Aceito,
    Rejeitado,
    Erro,
}

// "Loja A quer N unidades do produto P da loja B."
// Chega por POST /request e vive só na memória da janela que recebeu.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub code: String,
    pub name: String,
    pub amount: Decimal,
    // Loja que está pedindo (origem do pedido, destino do estoque)
    pub store_id: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponse {
    pub code: String,
    pub name: String,
    pub amount: Decimal,
    // Loja que respondeu
    pub store_id: String,
    pub password: String,
    pub status: TransferStatus,
    pub message: String,
}

// POST /transfer: incremento de estoque no destino.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferPayload {
    pub product: Produto,
    pub amount: Decimal,
    pub store_id: String,
    pub password: String,
}

// POST /update/produto: define o estoque absoluto.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AtualizarProdutoPayload {
    #[serde(rename = "BARCODE")]
    pub barcode: String,
    #[serde(rename = "QUANTITY")]
    pub quantity: Decimal,
    #[serde(rename = "PASSWORD")]
    pub password: String,
    #[serde(rename = "USERCODE")]
    pub user_code: String,
}

// POST /produto/cadastro
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CadastroProdutoPayload {
    #[serde(rename = "PRODUCT")]
    pub product: Produto,
    #[serde(rename = "PASSWORD")]
    pub password: String,
    #[serde(rename = "USERCODE")]
    pub user_code: String,
}

// Pedido recebido aguardando decisão do operador (sem a senha).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PendingTransfer {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub amount: Decimal,
    pub store_id: String,
}

// O que o operador vê depois de aceitar/rejeitar.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferOutcome {
    pub status: TransferStatus,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn response_status_uses_portuguese_labels() {
        let resp = TransferResponse {
            code: "1".into(),
            name: "GAZE".into(),
            amount: Decimal::from(3),
            store_id: "B".into(),
            password: "x".into(),
            status: TransferStatus::Rejeitado,
            message: "Recusado".into(),
        };
        let v = serde_json::to_value(&resp).unwrap();
        assert_eq!(v["status"], "Rejeitado");
        assert_eq!(v["storeId"], "B");
    }

    #[test]
    fn update_payload_uses_uppercase_keys() {
        let p: AtualizarProdutoPayload = serde_json::from_value(json!({
            "BARCODE": "789", "QUANTITY": 0, "PASSWORD": "s", "USERCODE": "1"
        }))
        .unwrap();
        assert_eq!(p.quantity, Decimal::ZERO);
        assert_eq!(p.barcode, "789");
    }
}
