//src/main.rs

use std::net::SocketAddr;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use rede_lojas::{
    config::{AppState, Config},
    handlers,
    services::sessao::{ativar_sessao, encerrar_sessao},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;
    let bind_addr = config.bind_addr;
    let run_migrations = config.run_migrations;

    let (app_state, pool) = AppState::new(config)
        .await
        .context("Falha ao inicializar o estado da aplicação.")?;

    // O schema de referência só roda quando pedido; em produção o banco da loja já existe.
    if run_migrations {
        sqlx::migrate!()
            .run(&pool)
            .await
            .context("Falha ao rodar as migrações do banco de dados.")?;
        tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");
    }

    ativar_sessao(&app_state)
        .await
        .context("Falha ao registrar a loja no banco remoto.")?;

    let app = handlers::router(app_state.clone());

    let listener = TcpListener::bind(bind_addr)
        .await
        .context("Falha ao iniciar o listener TCP")?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    // ConnectInfo é o que separa a janela local das outras lojas.
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Falha ao escutar ctrl-c: {}", e);
            }
        })
        .await
        .context("Erro no servidor Axum")?;

    if let Err(e) = encerrar_sessao(&app_state).await {
        tracing::warn!("Falha ao marcar a loja como offline: {}", e);
    }
    Ok(())
}
