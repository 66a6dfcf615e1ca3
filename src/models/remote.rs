// src/models/remote.rs
//
// Registros do banco remoto compartilhado. Nenhum schema é imposto do outro
// lado, então tudo aqui é tolerante a campos ausentes.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EstadoPresenca {
    Online,
    Offline,
}

// status/{loja}
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PresenceRecord {
    pub state: EstadoPresenca,
    // Epoch em milissegundos
    pub last_changed: i64,
}

// stores/{loja}: identidade da loja, "último que escreve vence".
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoreIdentity {
    pub address: String,
    pub updated_at: i64,
}

// unreadUrgentNotifications/{usuario}/{chatId}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UrgentNotification {
    pub has_unread: bool,
    pub from: String,
}

// {solicitacoes}/{destino}/{id}: o envelope comum a todo pedido entre lojas.
// A consulta específica (searchTerm, campo/valor...) vai achatada no mesmo nível.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRequest<Q> {
    pub requester_id: String,
    #[serde(flatten)]
    pub consulta: Q,
    pub timestamp: i64,
}

// {respostas}/{solicitante}/{id}
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteAnswer {
    pub store_id: String,
    #[serde(default)]
    pub results: Vec<Value>,
    #[serde(default)]
    pub error: Option<String>,
    pub timestamp: i64,
}

// Consulta de estoque entre lojas: { searchTerm }
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BuscaEstoque {
    pub search_term: String,
}
