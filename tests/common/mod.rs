// tests/common/mod.rs
//
// Rede simulada: várias lojas compartilhando um banco remoto em memória.
// As chamadas HTTP entre lojas vão direto para o Router de cada uma.
#![allow(dead_code)]

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    extract::ConnectInfo,
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt;

use rede_lojas::{
    common::error::AppError,
    config::{AppState, Config},
    db::MemoryDatabase,
    models::produto::Produto,
    remote::MemoryStore,
    services::{
        peer_client::{PeerReply, PeerTransport},
        sessao::ativar_sessao,
    },
};

pub const SENHA: &str = "senha-da-rede";
pub const NAMESPACE: &str = "rede";

#[derive(Default)]
pub struct LoopbackTransport {
    lojas: Mutex<HashMap<String, Router>>,
    chamadas: Mutex<Vec<String>>,
}

impl LoopbackTransport {
    pub fn registrar(&self, loja: &str, app: Router) {
        self.lojas.lock().unwrap().insert(loja.to_string(), app);
    }

    pub fn chamadas(&self) -> Vec<String> {
        self.chamadas.lock().unwrap().clone()
    }

    pub fn chamadas_para(&self, url: &str) -> usize {
        self.chamadas().iter().filter(|c| *c == url).count()
    }
}

#[async_trait]
impl PeerTransport for LoopbackTransport {
    async fn post(&self, url: &str, body: Value) -> Result<PeerReply, AppError> {
        self.chamadas.lock().unwrap().push(url.to_string());

        let resto = url.strip_prefix("http://").unwrap_or(url);
        let (host, caminho) = match resto.split_once('/') {
            Some((host, caminho)) => (host, format!("/{}", caminho)),
            None => (resto, "/".to_string()),
        };
        let app = self.lojas.lock().unwrap().get(host).cloned().ok_or(AppError::Peer {
            status: 503,
            message: format!("loja {} inalcançável", host),
        })?;

        let req = Request::builder()
            .method(Method::POST)
            .uri(caminho)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status().as_u16();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Ok(PeerReply { status, body })
    }
}

pub struct Rede {
    pub remoto: Arc<MemoryStore>,
    pub transporte: Arc<LoopbackTransport>,
    pub prazo_busca: Duration,
}

pub struct Loja {
    pub id: String,
    pub state: AppState,
    pub db: Arc<MemoryDatabase>,
    pub app: Router,
}

pub fn config(loja: &str, prazo_busca: Duration) -> Config {
    Config {
        database_url: "postgres://nao-usado".to_string(),
        store_id: loja.to_string(),
        shared_password: SENHA.to_string(),
        user_code: "1".to_string(),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        public_url: format!("http://{}", loja),
        remote_store_url: None,
        remote_store_auth: None,
        remote_namespace: NAMESPACE.to_string(),
        stock_search_timeout: prazo_busca,
        peer_timeout: Duration::from_secs(5),
        db_max_connections: 5,
        db_acquire_timeout: Duration::from_secs(5),
        run_migrations: false,
    }
}

pub fn produto(codigo: &str, nome: &str, estoque: i64) -> Produto {
    Produto {
        codigo: codigo.to_string(),
        produto: nome.to_string(),
        codbarra: Some(format!("789{}", codigo)),
        unidade: Some("UN".to_string()),
        estoque_atual: Decimal::from(estoque),
        preco_custo: Decimal::new(250, 2),
        preco_venda: Decimal::new(499, 2),
    }
}

impl Rede {
    pub fn new() -> Self {
        Self::com_prazo(Duration::from_millis(800))
    }

    pub fn com_prazo(prazo_busca: Duration) -> Self {
        Self {
            remoto: Arc::new(MemoryStore::new()),
            transporte: Arc::new(LoopbackTransport::default()),
            prazo_busca,
        }
    }

    /// Sobe uma loja completa (sessão ativa: online + escutas).
    pub async fn loja(&self, id: &str, produtos: Vec<Produto>) -> Loja {
        let loja = self.loja_parada(id, produtos);
        ativar_sessao(&loja.state).await.unwrap();
        loja
    }

    /// Loja montada e alcançável por HTTP, mas sem sessão (não responde buscas).
    pub fn loja_parada(&self, id: &str, produtos: Vec<Produto>) -> Loja {
        let db = Arc::new(MemoryDatabase::com_produtos(produtos));
        let state = AppState::montar(
            config(id, self.prazo_busca),
            db.clone(),
            self.remoto.clone(),
            self.transporte.clone(),
        );
        let app = rede_lojas::router(state.clone());
        self.transporte.registrar(id, app.clone());
        Loja { id: id.to_string(), state, db, app }
    }
}

impl Loja {
    pub fn estoque(&self, codigo: &str) -> Option<Decimal> {
        self.db.produto(codigo).map(|p| p.estoque_atual)
    }

    pub async fn chamar(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        origem: &str,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if body.is_some() {
            req = req.header(CONTENT_TYPE, "application/json");
        }
        let mut req = req
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(origem.parse::<SocketAddr>().unwrap()));

        let resp = self.app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    /// Chamada da janela local (loopback).
    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.chamar(Method::GET, uri, None, "127.0.0.1:40000").await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.chamar(Method::POST, uri, Some(body), "127.0.0.1:40000").await
    }
}

/// Espera a condição ficar verdadeira (escutas rodam em outras tarefas).
pub async fn esperar<F, Fut>(mut condicao: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if condicao().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}
