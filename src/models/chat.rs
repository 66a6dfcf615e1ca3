// src/models/chat.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::remote::caminhos::chave_valida;

// Chat aberto a todas as lojas.
pub const CHAT_GERAL: &str = "geral";

// messages/{chatId}/{id}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MensagemChat {
    #[serde(default)]
    pub id: String,
    pub from: String,
    pub text: String,
    #[serde(default)]
    pub urgent: bool,
    pub timestamp: i64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct NovaMensagemPayload {
    #[validate(length(min = 1, message = "A mensagem não pode ser vazia."))]
    pub texto: String,
    #[serde(default)]
    pub urgente: bool,
}

/// Id do chat privado entre duas lojas, independente da ordem.
pub fn chat_privado(a: &str, b: &str) -> String {
    if a <= b {
        format!("{}__{}", a, b)
    } else {
        format!("{}__{}", b, a)
    }
}

/// Participantes de um chat privado; `None` para o chat geral ou ids inválidos.
pub fn participantes(chat_id: &str) -> Option<(&str, &str)> {
    if !chave_valida(chat_id) {
        return None;
    }
    chat_id
        .split_once("__")
        .filter(|(a, b)| !a.is_empty() && !b.is_empty())
}

/// O chat geral ou um chat privado bem formado.
pub fn chat_valido(chat_id: &str) -> bool {
    chat_id == CHAT_GERAL || participantes(chat_id).is_some()
}
