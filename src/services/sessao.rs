// src/services/sessao.rs
//
// Contexto da loja em execução: chat aberto e todas as escutas do banco
// remoto. Ativar assina tudo; encerrar solta as escutas e marca offline.

use std::sync::{Arc, Mutex, PoisonError};

use crate::{common::error::AppError, config::AppState, remote::Escuta};

/// Chat aberto na janela. Compartilhado com a escuta de notificações.
#[derive(Debug, Clone, Default)]
pub struct ChatAtivo(Arc<Mutex<Option<String>>>);

impl ChatAtivo {
    pub fn definir(&self, chat_id: Option<String>) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = chat_id;
    }

    pub fn atual(&self) -> Option<String> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[derive(Default)]
pub struct Sessao {
    chat_ativo: ChatAtivo,
    escutas: Mutex<Vec<Escuta>>,
}

impl Sessao {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chat_ativo(&self) -> &ChatAtivo {
        &self.chat_ativo
    }

    fn guardar(&self, novas: Vec<Escuta>) {
        let mut escutas = self.escutas.lock().unwrap_or_else(PoisonError::into_inner);
        escutas.clear();
        escutas.extend(novas);
    }

    fn soltar(&self) -> usize {
        let mut escutas = self.escutas.lock().unwrap_or_else(PoisonError::into_inner);
        let total = escutas.len();
        escutas.clear();
        total
    }

    pub fn escutas_ativas(&self) -> usize {
        self.escutas
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| e.ativa())
            .count()
    }
}

pub async fn ativar_sessao(state: &AppState) -> Result<(), AppError> {
    state.presenca.conectar().await?;

    let escutas = vec![
        state.busca.atender(state.db.clone()).await?,
        state.consulta.atender(state.db.clone()).await?,
        state.chat.escutar_notificacoes(state.sessao.chat_ativo().clone()).await?,
    ];
    state.sessao.guardar(escutas);

    tracing::info!(loja = %state.config.store_id, "Sessão ativa");
    Ok(())
}

pub async fn encerrar_sessao(state: &AppState) -> Result<(), AppError> {
    let soltas = state.sessao.soltar();
    state.presenca.desconectar().await?;
    tracing::info!(loja = %state.config.store_id, escutas = soltas, "Sessão encerrada");
    Ok(())
}
