// src/services/busca_service.rs

use std::{sync::Arc, time::Duration};

use serde_json::Value;

use crate::{
    common::error::AppError,
    db::LocalDatabase,
    remote::Escuta,
    services::{
        presenca_service::PresencaService,
        remote_request::{CanalRemoto, ConsultaEstoque, ConsultaTabela, Resultados, TipoSolicitacao},
    },
};

/// Consulta espalhada para todas as lojas online.
pub struct BuscaRemotaService<K: TipoSolicitacao> {
    canal: CanalRemoto<K>,
    presenca: PresencaService,
    prazo: Duration,
}

impl<K: TipoSolicitacao> Clone for BuscaRemotaService<K> {
    fn clone(&self) -> Self {
        Self { canal: self.canal.clone(), presenca: self.presenca.clone(), prazo: self.prazo }
    }
}

pub type BuscaEstoqueService = BuscaRemotaService<ConsultaEstoque>;
pub type ConsultaTabelaService = BuscaRemotaService<ConsultaTabela>;

impl<K: TipoSolicitacao> BuscaRemotaService<K> {
    pub fn new(canal: CanalRemoto<K>, presenca: PresencaService, prazo: Duration) -> Self {
        Self { canal, presenca, prazo }
    }

    pub async fn buscar(&self, consulta: &K::Consulta) -> Result<Resultados, AppError> {
        let online = self.presenca.online().await?;
        if online.is_empty() {
            tracing::info!("Nenhuma outra loja online; busca remota vazia");
            return Ok(Resultados::new());
        }

        tracing::info!(lojas = ?online, "🔎 Consulta enviada para lojas online");
        let resultados = self.canal.coletar(&online, consulta, self.prazo).await?;
        tracing::info!(responderam = resultados.len(), consultadas = online.len(), "Consulta remota concluída");
        Ok(resultados)
    }
}

fn linhas<T: serde::Serialize>(itens: Vec<T>) -> Vec<Value> {
    itens.into_iter().filter_map(|i| serde_json::to_value(i).ok()).collect()
}

impl BuscaEstoqueService {
    /// Responde buscas de outras lojas com os produtos que têm estoque aqui.
    pub async fn atender(&self, db: Arc<dyn LocalDatabase>) -> Result<Escuta, AppError> {
        self.canal
            .responder(move |consulta| {
                let db = db.clone();
                async move {
                    let produtos = db.buscar_produtos(&consulta.search_term, true).await?;
                    Ok(linhas(produtos))
                }
            })
            .await
    }
}

impl ConsultaTabelaService {
    /// Responde consultas genéricas (campo da lista permitida) de outras lojas.
    pub async fn atender(&self, db: Arc<dyn LocalDatabase>) -> Result<Escuta, AppError> {
        self.canal
            .responder(move |consulta| {
                let db = db.clone();
                async move {
                    let campo = consulta.campo()?;
                    db.consulta_generica(campo, &consulta.valor).await
                }
            })
            .await
    }
}
