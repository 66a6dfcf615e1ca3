// src/services/transfer_service.rs
//
// Transferência de estoque entre lojas:
//
//   Solicitada -> Aceito | Rejeitado | Erro   (todos finais)
//
// O aceite faz até três passos em sequência (conferir estoque local, somar
// na loja que pediu, baixar aqui). Não há compensação: se a soma remota deu
// certo e a baixa local falhou, o resultado é Erro e o operador corrige à mão.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::transfer::{
        AtualizarProdutoPayload, PendingTransfer, TransferOutcome, TransferPayload,
        TransferRequest, TransferResponse, TransferStatus,
    },
    services::{
        alerta::AlertaService,
        eventos::{EventHub, UiEvent},
        peer_client::PeerClient,
        presenca_service::PresencaService,
        produto_service::ProdutoService,
    },
};

const INSTRUCAO_RECONCILIACAO: &str = "O estoque foi somado na loja solicitante, mas a baixa local falhou. \
     Ajuste o estoque deste produto manualmente.";

#[derive(Clone)]
pub struct TransferService {
    loja: String,
    senha: String,
    usuario: String,
    endereco_proprio: String,
    produtos: ProdutoService,
    presenca: PresencaService,
    peers: PeerClient,
    alerta: AlertaService,
    eventos: EventHub,
    // Pedidos recebidos aguardando o operador. Só em memória: reiniciar perde tudo.
    pendentes: Arc<Mutex<HashMap<Uuid, TransferRequest>>>,
}

// Por que o aceite parou antes de completar.
enum FalhaAceite {
    SemEstoque(String),
    SomaRemota(AppError),
    BaixaLocal(AppError),
}

pub struct TransferDeps {
    pub produtos: ProdutoService,
    pub presenca: PresencaService,
    pub peers: PeerClient,
    pub alerta: AlertaService,
    pub eventos: EventHub,
}

impl TransferService {
    pub fn new(
        loja: impl Into<String>,
        senha: impl Into<String>,
        usuario: impl Into<String>,
        endereco_proprio: impl Into<String>,
        deps: TransferDeps,
    ) -> Self {
        Self {
            loja: loja.into(),
            senha: senha.into(),
            usuario: usuario.into(),
            endereco_proprio: endereco_proprio.into(),
            produtos: deps.produtos,
            presenca: deps.presenca,
            peers: deps.peers,
            alerta: deps.alerta,
            eventos: deps.eventos,
            pendentes: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn pendentes(&self) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, TransferRequest>>, AppError> {
        self.pendentes
            .lock()
            .map_err(|_| AppError::InternalServerError(anyhow::anyhow!("fila de transferências envenenada")))
    }

    // --- LADO QUE PEDE ---

    /// Pede `amount` unidades do produto à loja `destino`.
    pub async fn solicitar(
        &self,
        destino: &str,
        code: &str,
        name: &str,
        amount: Decimal,
    ) -> Result<(), AppError> {
        let endereco = self.presenca.endereco(destino).await?;
        let pedido = TransferRequest {
            code: code.to_string(),
            name: name.to_string(),
            amount,
            store_id: self.loja.clone(),
            password: self.senha.clone(),
        };
        self.peers.solicitar_transferencia(&endereco, &pedido).await?;
        tracing::info!(destino, code, %amount, "📤 Transferência solicitada");
        Ok(())
    }

    pub fn receber_resposta(&self, resposta: TransferResponse) {
        tracing::info!(
            loja = %resposta.store_id, code = %resposta.code, status = ?resposta.status,
            "📥 Resposta de transferência recebida"
        );
        self.eventos.publicar(UiEvent::TransferenciaRespondida {
            store_id: resposta.store_id,
            code: resposta.code,
            name: resposta.name,
            status: resposta.status,
            message: resposta.message,
        });
    }

    // --- LADO QUE ATENDE ---

    /// Guarda o pedido para o operador decidir e dispara o alerta.
    pub fn receber_solicitacao(&self, pedido: TransferRequest) -> Result<PendingTransfer, AppError> {
        let id = Uuid::new_v4();
        let pendente = PendingTransfer {
            id,
            code: pedido.code.clone(),
            name: pedido.name.clone(),
            amount: pedido.amount,
            store_id: pedido.store_id.clone(),
        };
        self.pendentes()?.insert(id, pedido);

        tracing::info!(%id, loja = %pendente.store_id, code = %pendente.code, "📨 Pedido de transferência recebido");
        self.eventos.publicar(UiEvent::TransferenciaSolicitada(pendente.clone()));
        self.alerta.disparar(&pendente.store_id, "transferencia");
        Ok(pendente)
    }

    pub fn listar_pendentes(&self) -> Result<Vec<PendingTransfer>, AppError> {
        Ok(self
            .pendentes()?
            .iter()
            .map(|(id, p)| PendingTransfer {
                id: *id,
                code: p.code.clone(),
                name: p.name.clone(),
                amount: p.amount,
                store_id: p.store_id.clone(),
            })
            .collect())
    }

    fn retirar(&self, id: Uuid) -> Result<TransferRequest, AppError> {
        self.pendentes()?.remove(&id).ok_or(AppError::TransferNotFound)
    }

    pub async fn rejeitar(&self, id: Uuid) -> Result<TransferOutcome, AppError> {
        let pedido = self.retirar(id)?;
        self.alerta.parar();
        let desfecho = TransferOutcome {
            status: TransferStatus::Rejeitado,
            message: format!("A loja {} recusou a transferência.", self.loja),
        };
        self.responder(&pedido, &desfecho).await;
        Ok(desfecho)
    }

    pub async fn aceitar(&self, id: Uuid) -> Result<TransferOutcome, AppError> {
        let pedido = self.retirar(id)?;
        self.alerta.parar();

        let desfecho = match self.executar_aceite(&pedido).await {
            Ok(()) => TransferOutcome {
                status: TransferStatus::Aceito,
                message: format!(
                    "{} unidade(s) de {} transferida(s) pela loja {}.",
                    pedido.amount, pedido.name, self.loja
                ),
            },
            Err(FalhaAceite::SemEstoque(motivo)) => {
                tracing::warn!(code = %pedido.code, motivo = %motivo, "Transferência negada por estoque");
                TransferOutcome { status: TransferStatus::Erro, message: motivo }
            }
            Err(FalhaAceite::SomaRemota(e)) => {
                tracing::warn!(code = %pedido.code, error = %e, "Falha ao somar estoque na loja solicitante");
                TransferOutcome {
                    status: TransferStatus::Erro,
                    message: "Não foi possível transferir o estoque.".to_string(),
                }
            }
            Err(FalhaAceite::BaixaLocal(e)) => {
                tracing::error!(
                    code = %pedido.code, amount = %pedido.amount, loja = %pedido.store_id, error = %e,
                    "⚠️ Estoque somado na loja solicitante mas não baixado aqui: reconciliação manual"
                );
                self.eventos.publicar(UiEvent::ReconciliacaoManual {
                    code: pedido.code.clone(),
                    amount: pedido.amount.to_string(),
                    store_id: pedido.store_id.clone(),
                    instrucao: INSTRUCAO_RECONCILIACAO.to_string(),
                });
                TransferOutcome {
                    status: TransferStatus::Erro,
                    message: "Erro ao concluir a transferência.".to_string(),
                }
            }
        };

        self.responder(&pedido, &desfecho).await;
        Ok(desfecho)
    }

    async fn executar_aceite(&self, pedido: &TransferRequest) -> Result<(), FalhaAceite> {
        if pedido.amount <= Decimal::ZERO {
            return Err(FalhaAceite::SemEstoque("Quantidade inválida.".to_string()));
        }

        // 1. Confere estoque local
        let produto = self
            .produtos
            .por_codigo(&pedido.code)
            .await
            .map_err(|e| FalhaAceite::SemEstoque(format!("Falha ao consultar estoque: {}", e)))?
            .ok_or_else(|| FalhaAceite::SemEstoque("Produto não encontrado nesta loja.".to_string()))?;

        if produto.estoque_atual < pedido.amount {
            return Err(FalhaAceite::SemEstoque(format!(
                "Estoque insuficiente: disponível {}, pedido {}.",
                produto.estoque_atual, pedido.amount
            )));
        }
        let restante = produto.estoque_atual - pedido.amount;

        // 2. Soma na loja que pediu (cadastra lá se precisar)
        let origem = self.presenca.endereco(&pedido.store_id).await.map_err(FalhaAceite::SomaRemota)?;
        let payload = TransferPayload {
            product: produto.clone(),
            amount: pedido.amount,
            store_id: self.loja.clone(),
            password: self.senha.clone(),
        };
        self.peers.transferir(&origem, &payload).await.map_err(FalhaAceite::SomaRemota)?;

        // 3. Baixa aqui, pela própria rota HTTP desta loja
        let baixa = AtualizarProdutoPayload {
            barcode: produto.codigo.clone(),
            quantity: restante,
            password: self.senha.clone(),
            user_code: self.usuario.clone(),
        };
        self.peers
            .atualizar_produto(&self.endereco_proprio, &baixa)
            .await
            .map_err(FalhaAceite::BaixaLocal)?;

        tracing::info!(code = %pedido.code, amount = %pedido.amount, destino = %pedido.store_id, "✅ Transferência concluída");
        Ok(())
    }

    // Exatamente uma resposta por pedido decidido. Falha ao entregar só é logada.
    async fn responder(&self, pedido: &TransferRequest, desfecho: &TransferOutcome) {
        let resposta = TransferResponse {
            code: pedido.code.clone(),
            name: pedido.name.clone(),
            amount: pedido.amount,
            store_id: self.loja.clone(),
            password: self.senha.clone(),
            status: desfecho.status,
            message: desfecho.message.clone(),
        };

        let entregue = match self.presenca.endereco(&pedido.store_id).await {
            Ok(endereco) => self.peers.responder_transferencia(&endereco, &resposta).await,
            Err(e) => Err(e),
        };
        if let Err(e) = entregue {
            tracing::warn!(loja = %pedido.store_id, error = %e, "Resposta de transferência não entregue");
        }
    }
}
