// src/config.rs

use std::{env, net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{LocalDatabase, PgDatabase},
    remote::{caminhos::chave_valida, Caminhos, FirebaseStore, MemoryStore, RemoteStore},
    services::{
        alerta::AlertaService,
        busca_service::{BuscaEstoqueService, ConsultaTabelaService},
        chat_service::ChatService,
        eventos::EventHub,
        peer_client::{HttpTransport, PeerClient, PeerTransport},
        presenca_service::PresencaService,
        produto_service::ProdutoService,
        remote_request::CanalRemoto,
        sessao::Sessao,
        transfer_service::{TransferDeps, TransferService},
    },
};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub store_id: String,
    pub shared_password: String,
    pub user_code: String,
    pub bind_addr: SocketAddr,
    pub public_url: String,
    pub remote_store_url: Option<String>,
    pub remote_store_auth: Option<String>,
    pub remote_namespace: String,
    pub stock_search_timeout: Duration,
    pub peer_timeout: Duration,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub run_migrations: bool,
}

fn obrigatoria(nome: &str) -> anyhow::Result<String> {
    env::var(nome).with_context(|| format!("{} deve ser definida", nome))
}

// O id da loja vira chave no banco remoto; não pode carregar separadores.
fn id_da_loja(valor: String) -> anyhow::Result<String> {
    let valor = valor.trim().to_string();
    if !chave_valida(&valor) {
        anyhow::bail!("STORE_ID inválido: {:?} (não pode ser vazio nem conter / . # $ [ ])", valor);
    }
    Ok(valor)
}

fn opcional(nome: &str) -> Option<String> {
    env::var(nome).ok().filter(|v| !v.trim().is_empty())
}

fn numero<T: std::str::FromStr>(nome: &str, padrao: T) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match opcional(nome) {
        Some(v) => v.trim().parse().with_context(|| format!("{} inválida: {}", nome, v)),
        None => Ok(padrao),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let bind_addr: SocketAddr = opcional("BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0:3000".to_string())
            .parse()
            .context("BIND_ADDR inválido")?;
        let public_url = opcional("PUBLIC_URL")
            .unwrap_or_else(|| format!("http://127.0.0.1:{}", bind_addr.port()));

        Ok(Self {
            database_url: obrigatoria("DATABASE_URL")?,
            store_id: id_da_loja(obrigatoria("STORE_ID")?)?,
            shared_password: obrigatoria("SHARED_PASSWORD")?,
            user_code: opcional("USER_CODE").unwrap_or_else(|| "1".to_string()),
            bind_addr,
            public_url: public_url.trim_end_matches('/').to_string(),
            remote_store_url: opcional("REMOTE_STORE_URL"),
            remote_store_auth: opcional("REMOTE_STORE_AUTH"),
            remote_namespace: opcional("REMOTE_NAMESPACE").unwrap_or_else(|| "default".to_string()),
            stock_search_timeout: Duration::from_secs(numero("STOCK_SEARCH_TIMEOUT_SECS", 30)?),
            peer_timeout: Duration::from_secs(numero("PEER_TIMEOUT_SECS", 10)?),
            db_max_connections: numero("DB_MAX_CONNECTIONS", 5)?,
            db_acquire_timeout: Duration::from_secs(numero("DB_ACQUIRE_TIMEOUT_SECS", 30)?),
            run_migrations: numero("RUN_MIGRATIONS", false)?,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<dyn LocalDatabase>,
    pub produto_service: ProdutoService,
    pub busca: BuscaEstoqueService,
    pub consulta: ConsultaTabelaService,
    pub transfer: TransferService,
    pub chat: ChatService,
    pub presenca: PresencaService,
    pub alerta: AlertaService,
    pub eventos: EventHub,
    pub sessao: Arc<Sessao>,
}

impl AppState {
    /// Monta o estado real: Postgres local, banco remoto e HTTP entre lojas.
    /// Devolve também o pool, para as migrações.
    pub async fn new(config: Config) -> anyhow::Result<(Self, PgPool)> {
        // Pool limitado: quando esgota, novas consultas esperam na fila até o timeout.
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(config.db_acquire_timeout)
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados local")?;
        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let remoto: Arc<dyn RemoteStore> = match &config.remote_store_url {
            Some(url) => {
                tracing::info!(%url, "Banco remoto compartilhado");
                Arc::new(FirebaseStore::new(url.clone(), config.remote_store_auth.clone(), config.peer_timeout))
            }
            None => {
                tracing::warn!("REMOTE_STORE_URL não definida: usando banco remoto em memória (só esta instância)");
                Arc::new(MemoryStore::new())
            }
        };

        let transporte = Arc::new(HttpTransport::new(config.peer_timeout)?);
        let db = Arc::new(PgDatabase::new(pool.clone()));

        Ok((Self::montar(config, db, remoto, transporte), pool))
    }

    // --- Monta o gráfico de dependências ---
    pub fn montar(
        config: Config,
        db: Arc<dyn LocalDatabase>,
        remoto: Arc<dyn RemoteStore>,
        transporte: Arc<dyn PeerTransport>,
    ) -> Self {
        let caminhos = Caminhos::new(config.remote_namespace.clone());
        let eventos = EventHub::default();
        let alerta = AlertaService::new(eventos.clone());
        let produto_service = ProdutoService::new(db.clone());
        let presenca = PresencaService::new(
            remoto.clone(),
            caminhos.clone(),
            config.store_id.clone(),
            config.public_url.clone(),
        );

        let busca = BuscaEstoqueService::new(
            CanalRemoto::new(remoto.clone(), caminhos.clone(), config.store_id.clone()),
            presenca.clone(),
            config.stock_search_timeout,
        );
        let consulta = ConsultaTabelaService::new(
            CanalRemoto::new(remoto.clone(), caminhos.clone(), config.store_id.clone()),
            presenca.clone(),
            config.stock_search_timeout,
        );

        let transfer = TransferService::new(
            config.store_id.clone(),
            config.shared_password.clone(),
            config.user_code.clone(),
            config.public_url.clone(),
            TransferDeps {
                produtos: produto_service.clone(),
                presenca: presenca.clone(),
                peers: PeerClient::new(transporte),
                alerta: alerta.clone(),
                eventos: eventos.clone(),
            },
        );
        let chat = ChatService::new(remoto, caminhos, presenca.clone(), alerta.clone());

        Self {
            config: Arc::new(config),
            db,
            produto_service,
            busca,
            consulta,
            transfer,
            chat,
            presenca,
            alerta,
            eventos,
            sessao: Arc::new(Sessao::new()),
        }
    }
}
