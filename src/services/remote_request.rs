// src/services/remote_request.rs
//
// Pedido/resposta entre lojas pelo banco remoto, implementado uma vez e
// reutilizado por todo tipo de consulta (estoque, tabelas...).
//
//   solicitante grava  {solicitacoes}/{destino}/{id}
//   destino responde   {respostas}/{solicitante}/{id}
//   cada lado apaga o que consumiu.
//
// Sem confirmação de entrega, sem nova tentativa: o que não responder até o
// prazo simplesmente não aparece no resultado.

use std::{
    collections::HashMap,
    future::Future,
    marker::PhantomData,
    sync::Arc,
    time::Duration,
};

use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::ConsultaGenerica,
    models::remote::{BuscaEstoque, RemoteAnswer, RemoteRequest},
    remote::{Caminhos, Escuta, RemoteStore},
};

/// Um tipo de pedido: onde ficam as caixas de entrada e qual é a consulta.
pub trait TipoSolicitacao: Send + Sync + 'static {
    const SOLICITACOES: &'static str;
    const RESPOSTAS: &'static str;
    type Consulta: Serialize + DeserializeOwned + Clone + Send + Sync + 'static;
}

pub struct ConsultaEstoque;

impl TipoSolicitacao for ConsultaEstoque {
    const SOLICITACOES: &'static str = "stockRequests";
    const RESPOSTAS: &'static str = "stockRequestAnswers";
    type Consulta = BuscaEstoque;
}

pub struct ConsultaTabela;

impl TipoSolicitacao for ConsultaTabela {
    const SOLICITACOES: &'static str = "tableRequests";
    const RESPOSTAS: &'static str = "tableRequestAnswers";
    type Consulta = ConsultaGenerica;
}

/// Resultado agregado: loja -> linhas recebidas.
pub type Resultados = HashMap<String, Vec<Value>>;

pub struct CanalRemoto<K: TipoSolicitacao> {
    remoto: Arc<dyn RemoteStore>,
    caminhos: Caminhos,
    loja: String,
    _tipo: PhantomData<K>,
}

impl<K: TipoSolicitacao> Clone for CanalRemoto<K> {
    fn clone(&self) -> Self {
        Self {
            remoto: self.remoto.clone(),
            caminhos: self.caminhos.clone(),
            loja: self.loja.clone(),
            _tipo: PhantomData,
        }
    }
}

fn para_json<T: Serialize>(valor: &T) -> Result<Value, AppError> {
    serde_json::to_value(valor).map_err(|e| AppError::InternalServerError(e.into()))
}

impl<K: TipoSolicitacao> CanalRemoto<K> {
    pub fn new(remoto: Arc<dyn RemoteStore>, caminhos: Caminhos, loja: impl Into<String>) -> Self {
        Self { remoto, caminhos, loja: loja.into(), _tipo: PhantomData }
    }

    fn solicitacao(&self, destino: &str, id: &str) -> String {
        self.caminhos.no(&[K::SOLICITACOES, destino, id])
    }

    fn resposta(&self, solicitante: &str, id: &str) -> String {
        self.caminhos.no(&[K::RESPOSTAS, solicitante, id])
    }

    /// Grava um pedido na caixa de entrada do destino e devolve o id gerado.
    pub async fn enviar(&self, destino: &str, consulta: &K::Consulta) -> Result<String, AppError> {
        let id = Uuid::new_v4().simple().to_string();
        let pedido = RemoteRequest {
            requester_id: self.loja.clone(),
            consulta: consulta.clone(),
            timestamp: Utc::now().timestamp_millis(),
        };
        self.remoto.set(&self.solicitacao(destino, &id), para_json(&pedido)?).await?;
        Ok(id)
    }

    /// Espalha a consulta para os destinos e junta as respostas até todos
    /// responderem ou o prazo acabar.
    pub async fn coletar(
        &self,
        destinos: &[String],
        consulta: &K::Consulta,
        prazo: Duration,
    ) -> Result<Resultados, AppError> {
        let mut resultados = Resultados::new();
        if destinos.is_empty() {
            return Ok(resultados);
        }

        // Escuta antes de enviar: nenhuma resposta chega antes do ouvinte.
        let caixa = self.caminhos.no(&[K::RESPOSTAS, &self.loja]);
        let mut assinatura = self.remoto.listen(&caixa).await?;

        let envios = destinos.iter().map(|destino| async move {
            (destino.clone(), self.enviar(destino, consulta).await)
        });
        let mut pendentes: HashMap<String, String> = HashMap::new();
        for (destino, enviado) in futures::future::join_all(envios).await {
            match enviado {
                Ok(id) => {
                    pendentes.insert(id, destino);
                }
                Err(e) => tracing::warn!(destino = %destino, error = %e, "Pedido não enviado"),
            }
        }

        let inicio = Utc::now().timestamp_millis();
        let limite = tokio::time::Instant::now() + prazo;
        while !pendentes.is_empty() {
            let evento = match tokio::time::timeout_at(limite, assinatura.next()).await {
                Ok(Some(evento)) => evento,
                Ok(None) => {
                    tracing::warn!(caixa = %caixa, "Escuta de respostas encerrada antes do prazo");
                    break;
                }
                Err(_) => break,
            };

            for (id, valor) in evento.filhos() {
                if valor.is_null() {
                    continue;
                }
                let Some(destino) = pendentes.remove(&id) else {
                    self.descartar_resposta_alheia(&id, &valor, inicio, prazo).await;
                    continue;
                };
                // Consumida: apaga da caixa de entrada.
                if let Err(e) = self.remoto.remove(&self.resposta(&self.loja, &id)).await {
                    tracing::warn!(id = %id, error = %e, "Resposta não removida");
                }

                match serde_json::from_value::<RemoteAnswer>(valor) {
                    Ok(resposta) => {
                        if let Some(erro) = resposta.error {
                            tracing::warn!(loja = %destino, erro = %erro, "Loja respondeu com erro");
                        } else if !resposta.results.is_empty() {
                            resultados.entry(destino).or_default().extend(resposta.results);
                        }
                    }
                    Err(e) => tracing::warn!(loja = %destino, error = %e, "Resposta ilegível"),
                }
            }
        }

        drop(assinatura);

        // Quem não respondeu: o pedido some da caixa do destino.
        for (id, destino) in pendentes {
            tracing::info!(loja = %destino, id = %id, "Sem resposta dentro do prazo");
            if let Err(e) = self.remoto.remove(&self.solicitacao(&destino, &id)).await {
                tracing::warn!(id = %id, error = %e, "Pedido sem resposta não removido");
            }
        }

        Ok(resultados)
    }

    // Respostas de outra busca (concorrente ou antiga). Só as antigas, que
    // ninguém mais espera, são apagadas.
    async fn descartar_resposta_alheia(&self, id: &str, valor: &Value, inicio: i64, prazo: Duration) {
        let timestamp = valor.get("timestamp").and_then(Value::as_i64).unwrap_or(0);
        let prazo_ms = i64::try_from(prazo.as_millis()).unwrap_or(i64::MAX);
        if timestamp < inicio.saturating_sub(prazo_ms) {
            tracing::debug!(id = %id, "Removendo resposta antiga sem dono");
            if let Err(e) = self.remoto.remove(&self.resposta(&self.loja, id)).await {
                tracing::warn!(id = %id, error = %e, "Resposta antiga não removida");
            }
        }
    }

    /// Atende os pedidos que chegam na caixa de entrada desta loja enquanto
    /// a `Escuta` devolvida existir.
    pub async fn responder<F, Fut>(&self, atender: F) -> Result<Escuta, AppError>
    where
        F: Fn(K::Consulta) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<Value>, AppError>> + Send + 'static,
    {
        let caixa = self.caminhos.no(&[K::SOLICITACOES, &self.loja]);
        let mut assinatura = self.remoto.listen(&caixa).await?;
        let canal = self.clone();

        tracing::info!(caixa = %caixa, "👂 Atendendo pedidos remotos");
        Ok(Escuta::iniciar(async move {
            while let Some(evento) = assinatura.next().await {
                for (id, valor) in evento.filhos() {
                    if valor.is_null() {
                        continue;
                    }
                    canal.atender_um(&id, valor, &atender).await;
                }
            }
            tracing::warn!(caixa = %caixa, "Escuta de pedidos encerrada");
        }))
    }

    async fn atender_um<F, Fut>(&self, id: &str, valor: Value, atender: &F)
    where
        F: Fn(K::Consulta) -> Fut,
        Fut: Future<Output = Result<Vec<Value>, AppError>>,
    {
        let pedido: RemoteRequest<K::Consulta> = match serde_json::from_value(valor) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "Pedido ilegível descartado");
                if let Err(e) = self.remoto.remove(&self.solicitacao(&self.loja, id)).await {
                    tracing::warn!(id = %id, error = %e, "Pedido ilegível não removido");
                }
                return;
            }
        };

        let (results, error) = match atender(pedido.consulta).await {
            Ok(linhas) => (linhas, None),
            Err(e) => {
                tracing::error!(id = %id, solicitante = %pedido.requester_id, error = %e, "Falha ao atender pedido");
                (Vec::new(), Some(e.to_string()))
            }
        };
        let resposta = RemoteAnswer {
            store_id: self.loja.clone(),
            results,
            error,
            timestamp: Utc::now().timestamp_millis(),
        };

        let gravada = match para_json(&resposta) {
            Ok(v) => self.remoto.set(&self.resposta(&pedido.requester_id, id), v).await,
            Err(e) => Err(e),
        };
        if let Err(e) = gravada {
            tracing::warn!(id = %id, error = %e, "Resposta não entregue");
        }
        if let Err(e) = self.remoto.remove(&self.solicitacao(&self.loja, id)).await {
            tracing::warn!(id = %id, error = %e, "Pedido atendido não removido");
        }
    }
}
