// src/services/eventos.rs
//
// Canal de eventos empurrados para a interface (consumido via SSE em
// GET /local/eventos). Substitui os disparos diretos para a janela.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::models::transfer::{PendingTransfer, TransferStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "tipo", content = "dados", rename_all = "snake_case")]
pub enum UiEvent {
    /// Outra loja pediu estoque desta.
    TransferenciaSolicitada(PendingTransfer),

    /// Resposta de uma loja a um pedido feito por esta.
    #[serde(rename_all = "camelCase")]
    TransferenciaRespondida {
        store_id: String,
        code: String,
        name: String,
        status: TransferStatus,
        message: String,
    },

    /// Início do alerta intrusivo (som + tremer janela + sempre no topo).
    #[serde(rename_all = "camelCase")]
    AlertaUrgente { de: String, origem: String, som: String },

    AlertaEncerrado,

    /// Transferência parcialmente aplicada: o operador precisa corrigir à mão.
    #[serde(rename_all = "camelCase")]
    ReconciliacaoManual {
        code: String,
        amount: String,
        store_id: String,
        instrucao: String,
    },
}

#[derive(Clone)]
pub struct EventHub {
    tx: broadcast::Sender<UiEvent>,
}

impl EventHub {
    pub fn new(capacidade: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacidade);
        Self { tx }
    }

    pub fn publicar(&self, evento: UiEvent) {
        // Sem janela conectada o evento se perde, como no app original.
        if self.tx.send(evento).is_err() {
            tracing::debug!("Nenhuma interface conectada para receber o evento");
        }
    }

    pub fn assinar(&self) -> broadcast::Receiver<UiEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(64)
    }
}
