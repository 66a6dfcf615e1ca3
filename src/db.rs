// src/db.rs
//
// Gateway do banco SQL local da loja. A interface só expõe operações com
// nome; não existe caminho para SQL livre vindo da interface.

pub mod consulta;
pub mod memory;
pub mod produto_repo;

pub use consulta::{CampoConsulta, ConsultaGenerica};
pub use memory::MemoryDatabase;
pub use produto_repo::PgDatabase;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::{
    common::error::AppError,
    models::{cliente::SaldoConvenio, produto::Produto},
};

#[async_trait]
pub trait LocalDatabase: Send + Sync {
    /// Busca por nome (parcial), código ou código de barras.
    async fn buscar_produtos(
        &self,
        termo: &str,
        somente_com_estoque: bool,
    ) -> Result<Vec<Produto>, AppError>;

    async fn buscar_produto(&self, codigo: &str) -> Result<Option<Produto>, AppError>;

    async fn produto_existe(&self, codigo: &str) -> Result<bool, AppError>;

    /// Define o estoque absoluto através da procedure do banco.
    async fn atualizar_estoque(
        &self,
        codigo: &str,
        quantidade: Decimal,
        usuario: &str,
    ) -> Result<(), AppError>;

    async fn inserir_produto(&self, produto: &Produto, usuario: &str) -> Result<(), AppError>;

    async fn saldo_convenio(&self, termo: &str) -> Result<Vec<SaldoConvenio>, AppError>;

    async fn consulta_generica(
        &self,
        campo: CampoConsulta,
        valor: &str,
    ) -> Result<Vec<Value>, AppError>;
}
