// src/services/chat_service.rs

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        chat::{chat_valido, participantes, MensagemChat, CHAT_GERAL},
        remote::UrgentNotification,
    },
    remote::{caminhos, Caminhos, Escuta, RemoteStore},
    services::{alerta::AlertaService, presenca_service::PresencaService, sessao::ChatAtivo},
};

// Id de chat que vira um único segmento do caminho remoto.
fn conferir(chat_id: &str) -> Result<(), AppError> {
    if chat_valido(chat_id) {
        Ok(())
    } else {
        Err(AppError::InvalidChat(chat_id.to_string()))
    }
}

#[derive(Clone)]
pub struct ChatService {
    remoto: Arc<dyn RemoteStore>,
    caminhos: Caminhos,
    presenca: PresencaService,
    alerta: AlertaService,
}

impl ChatService {
    pub fn new(
        remoto: Arc<dyn RemoteStore>,
        caminhos: Caminhos,
        presenca: PresencaService,
        alerta: AlertaService,
    ) -> Self {
        Self { remoto, caminhos, presenca, alerta }
    }

    fn loja(&self) -> &str {
        self.presenca.loja()
    }

    // Quem recebe a notificação urgente de uma mensagem neste chat.
    async fn destinatarios(&self, chat_id: &str) -> Result<Vec<String>, AppError> {
        if chat_id == CHAT_GERAL {
            let todas = self.presenca.conhecidas().await?;
            return Ok(todas.into_iter().filter(|l| l != self.loja()).collect());
        }

        let (a, b) = participantes(chat_id).ok_or_else(|| AppError::InvalidChat(chat_id.to_string()))?;
        match self.loja() {
            eu if eu == a => Ok(vec![b.to_string()]),
            eu if eu == b => Ok(vec![a.to_string()]),
            _ => Err(AppError::InvalidChat(chat_id.to_string())),
        }
    }

    /// Grava a mensagem; se urgente, marca uma notificação por destinatário.
    /// Cada notificação nova sobrescreve a anterior do mesmo chat.
    pub async fn enviar(&self, chat_id: &str, texto: &str, urgente: bool) -> Result<MensagemChat, AppError> {
        let destinatarios = self.destinatarios(chat_id).await?;

        let mensagem = MensagemChat {
            id: Uuid::new_v4().to_string(),
            from: self.loja().to_string(),
            text: texto.to_string(),
            urgent: urgente,
            timestamp: Utc::now().timestamp_millis(),
        };
        let valor = serde_json::to_value(&mensagem).map_err(anyhow::Error::from)?;
        self.remoto.set(&self.caminhos.mensagem(chat_id, &mensagem.id), valor).await?;

        if urgente {
            let aviso = UrgentNotification { has_unread: true, from: self.loja().to_string() };
            let aviso = serde_json::to_value(aviso).map_err(anyhow::Error::from)?;
            for destino in &destinatarios {
                self.remoto
                    .set(&self.caminhos.notificacao(destino, chat_id), aviso.clone())
                    .await?;
            }
            tracing::info!(chat = chat_id, destinatarios = ?destinatarios, "📣 Mensagem urgente enviada");
        }
        Ok(mensagem)
    }

    pub async fn historico(&self, chat_id: &str) -> Result<Vec<MensagemChat>, AppError> {
        conferir(chat_id)?;
        let no = self.remoto.get(&self.caminhos.no(&[caminhos::MENSAGENS, chat_id])).await?;
        let Value::Object(mapa) = no else {
            return Ok(Vec::new());
        };

        let mut mensagens: Vec<MensagemChat> = mapa
            .into_iter()
            .filter_map(|(id, valor)| {
                let mut m: MensagemChat = serde_json::from_value(valor).ok()?;
                m.id = id;
                Some(m)
            })
            .collect();
        mensagens.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
        Ok(mensagens)
    }

    /// Abre o chat: vira o chat ativo, limpa a notificação pendente e para o alerta.
    pub async fn abrir(&self, ativo: &ChatAtivo, chat_id: &str) -> Result<(), AppError> {
        conferir(chat_id)?;
        ativo.definir(Some(chat_id.to_string()));
        self.remoto.remove(&self.caminhos.notificacao(self.loja(), chat_id)).await?;
        self.alerta.parar();
        Ok(())
    }

    /// Escuta as notificações urgentes desta loja. Notificação do chat aberto
    /// é apagada na hora; de qualquer outro chat dispara o alerta.
    pub async fn escutar_notificacoes(&self, ativo: ChatAtivo) -> Result<Escuta, AppError> {
        let caminho = self.caminhos.no(&[caminhos::NOTIFICACOES_URGENTES, self.loja()]);
        let mut assinatura = self.remoto.listen(&caminho).await?;
        let servico = self.clone();

        Ok(Escuta::iniciar(async move {
            while let Some(evento) = assinatura.next().await {
                for (chat_id, valor) in evento.filhos() {
                    let Ok(aviso) = serde_json::from_value::<UrgentNotification>(valor) else {
                        continue;
                    };
                    if !aviso.has_unread {
                        continue;
                    }

                    if ativo.atual().as_deref() == Some(chat_id.as_str()) {
                        let caminho = servico.caminhos.notificacao(servico.loja(), &chat_id);
                        if let Err(e) = servico.remoto.remove(&caminho).await {
                            tracing::warn!(chat = %chat_id, error = %e, "Falha ao limpar notificação do chat aberto");
                        }
                    } else {
                        servico.alerta.disparar(&aviso.from, &chat_id);
                    }
                }
            }
            tracing::debug!("Escuta de notificações encerrada");
        }))
    }
}
