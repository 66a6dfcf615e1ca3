// src/services/presenca_service.rs

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use crate::{
    common::error::AppError,
    models::remote::{EstadoPresenca, PresenceRecord, StoreIdentity},
    remote::{caminhos, Caminhos, RemoteStore},
};

#[derive(Clone)]
pub struct PresencaService {
    remoto: Arc<dyn RemoteStore>,
    caminhos: Caminhos,
    loja: String,
    endereco: String,
}

impl PresencaService {
    pub fn new(
        remoto: Arc<dyn RemoteStore>,
        caminhos: Caminhos,
        loja: impl Into<String>,
        endereco: impl Into<String>,
    ) -> Self {
        Self { remoto, caminhos, loja: loja.into(), endereco: endereco.into() }
    }

    pub fn loja(&self) -> &str {
        &self.loja
    }

    /// Grava a identidade (último que escreve vence) e marca a loja como online.
    pub async fn conectar(&self) -> Result<(), AppError> {
        let agora = Utc::now().timestamp_millis();
        let identidade = StoreIdentity { address: self.endereco.clone(), updated_at: agora };
        self.remoto
            .set(&self.caminhos.loja(&self.loja), serde_json::to_value(identidade).map_err(anyhow::Error::from)?)
            .await?;
        self.marcar(EstadoPresenca::Online).await?;
        tracing::info!(loja = %self.loja, endereco = %self.endereco, "🟢 Loja online");
        Ok(())
    }

    pub async fn desconectar(&self) -> Result<(), AppError> {
        self.marcar(EstadoPresenca::Offline).await?;
        tracing::info!(loja = %self.loja, "🔴 Loja offline");
        Ok(())
    }

    async fn marcar(&self, state: EstadoPresenca) -> Result<(), AppError> {
        let registro = PresenceRecord { state, last_changed: Utc::now().timestamp_millis() };
        self.remoto
            .set(&self.caminhos.status(&self.loja), serde_json::to_value(registro).map_err(anyhow::Error::from)?)
            .await
    }

    /// Lojas online agora, sem incluir esta. Lido uma única vez.
    pub async fn online(&self) -> Result<Vec<String>, AppError> {
        let todos = self.remoto.get(&self.caminhos.no(&[caminhos::STATUS])).await?;
        let Value::Object(mapa) = todos else {
            return Ok(Vec::new());
        };

        let mut lojas: Vec<String> = mapa
            .into_iter()
            .filter(|(loja, _)| *loja != self.loja)
            .filter_map(|(loja, registro)| {
                let registro: PresenceRecord = serde_json::from_value(registro).ok()?;
                (registro.state == EstadoPresenca::Online).then_some(loja)
            })
            .collect();
        lojas.sort();
        Ok(lojas)
    }

    /// Todas as lojas que já se identificaram, online ou não.
    pub async fn conhecidas(&self) -> Result<Vec<String>, AppError> {
        let todas = self.remoto.get(&self.caminhos.no(&[caminhos::LOJAS])).await?;
        let mut lojas: Vec<String> = match todas {
            Value::Object(mapa) => mapa.into_iter().map(|(loja, _)| loja).collect(),
            _ => Vec::new(),
        };
        lojas.sort();
        Ok(lojas)
    }

    /// Endereço HTTP publicado pela loja.
    pub async fn endereco(&self, loja: &str) -> Result<String, AppError> {
        if !caminhos::chave_valida(loja) {
            return Err(AppError::StoreNotFound(loja.to_string()));
        }
        let registro = self.remoto.get(&self.caminhos.loja(loja)).await?;
        serde_json::from_value::<StoreIdentity>(registro)
            .map(|identidade| identidade.address)
            .map_err(|_| AppError::StoreNotFound(loja.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn online_excludes_self_and_offline_stores() {
        let remoto = Arc::new(MemoryStore::new());
        let caminhos = Caminhos::new("rede");
        let a = PresencaService::new(remoto.clone(), caminhos.clone(), "A", "http://a");
        let b = PresencaService::new(remoto.clone(), caminhos.clone(), "B", "http://b");
        let c = PresencaService::new(remoto.clone(), caminhos.clone(), "C", "http://c");

        a.conectar().await.unwrap();
        b.conectar().await.unwrap();
        c.conectar().await.unwrap();
        c.desconectar().await.unwrap();
        // Registro malformado não derruba a leitura
        remoto.set("rede/status/D", json!("online")).await.unwrap();

        assert_eq!(a.online().await.unwrap(), vec!["B".to_string()]);
        assert_eq!(a.conhecidas().await.unwrap(), vec!["A", "B", "C"]);
        assert_eq!(a.endereco("B").await.unwrap(), "http://b");
        assert!(matches!(a.endereco("Z").await, Err(AppError::StoreNotFound(_))));
        // Id que desceria para dentro do registro de outra loja
        remoto.set("rede/stores/B/x", json!({"address": "http://intrusa"})).await.unwrap();
        assert!(matches!(a.endereco("B/x").await, Err(AppError::StoreNotFound(_))));
    }
}
