// src/services/produto_service.rs

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    db::{CampoConsulta, LocalDatabase},
    models::{cliente::SaldoConvenio, produto::Produto},
};

// Regras em cima das operações do banco local: o que é "não encontrado",
// o que é conflito, e como uma transferência entra no estoque.
#[derive(Clone)]
pub struct ProdutoService {
    db: Arc<dyn LocalDatabase>,
}

impl ProdutoService {
    pub fn new(db: Arc<dyn LocalDatabase>) -> Self {
        Self { db }
    }

    // --- BUSCA ---
    pub async fn buscar(
        &self,
        termo: &str,
        somente_com_estoque: bool,
    ) -> Result<Vec<Produto>, AppError> {
        let produtos = self.db.buscar_produtos(termo, somente_com_estoque).await?;
        if produtos.is_empty() {
            return Err(AppError::ProductNotFound);
        }
        Ok(produtos)
    }

    pub async fn por_codigo(&self, codigo: &str) -> Result<Option<Produto>, AppError> {
        self.db.buscar_produto(codigo).await
    }

    // --- ESTOQUE ABSOLUTO ---
    pub async fn definir_estoque(
        &self,
        codigo: &str,
        quantidade: Decimal,
        usuario: &str,
    ) -> Result<Produto, AppError> {
        let mut produto = self
            .db
            .buscar_produto(codigo)
            .await?
            .ok_or(AppError::ProductNotFound)?;

        if produto.estoque_atual == quantidade {
            return Err(AppError::StockUnchanged);
        }

        self.db.atualizar_estoque(codigo, quantidade, usuario).await?;
        produto.estoque_atual = quantidade;
        Ok(produto)
    }

    // --- CADASTRO ---
    pub async fn cadastrar(&self, produto: &Produto, usuario: &str) -> Result<(), AppError> {
        if self.db.produto_existe(&produto.codigo).await? {
            return Err(AppError::ProductAlreadyExists(produto.codigo.clone()));
        }
        self.db.inserir_produto(produto, usuario).await
    }

    // --- ENTRADA POR TRANSFERÊNCIA ---
    /// Soma `quantidade` ao estoque local; cadastra o produto se ainda não existir.
    pub async fn receber_transferencia(
        &self,
        produto: &Produto,
        quantidade: Decimal,
        usuario: &str,
    ) -> Result<Produto, AppError> {
        if quantidade <= Decimal::ZERO {
            return Err(AppError::InvalidAmount(quantidade.to_string()));
        }

        match self.db.buscar_produto(&produto.codigo).await? {
            Some(mut atual) => {
                let novo = atual
                    .estoque_atual
                    .checked_add(quantidade)
                    .ok_or_else(|| AppError::InvalidAmount(quantidade.to_string()))?;
                self.db.atualizar_estoque(&atual.codigo, novo, usuario).await?;
                atual.estoque_atual = novo;
                Ok(atual)
            }
            None => {
                let novo = Produto { estoque_atual: quantidade, ..produto.clone() };
                self.db.inserir_produto(&novo, usuario).await?;
                tracing::info!(codigo = %novo.codigo, "Produto cadastrado automaticamente na transferência");
                Ok(novo)
            }
        }
    }

    // --- CONVÊNIO ---
    pub async fn saldo_convenio(&self, termo: &str) -> Result<Vec<SaldoConvenio>, AppError> {
        let linhas = self.db.saldo_convenio(termo).await?;
        if linhas.is_empty() {
            return Err(AppError::ClientNotFound);
        }
        Ok(linhas)
    }

    // --- CONSULTA GENÉRICA (lista permitida) ---
    pub async fn consulta(
        &self,
        campo: CampoConsulta,
        valor: &str,
    ) -> Result<Vec<serde_json::Value>, AppError> {
        self.db.consulta_generica(campo, valor).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDatabase;

    fn produto(codigo: &str, estoque: i64) -> Produto {
        Produto {
            codigo: codigo.into(),
            produto: format!("PRODUTO {}", codigo),
            codbarra: None,
            unidade: None,
            estoque_atual: Decimal::from(estoque),
            preco_custo: Decimal::ONE,
            preco_venda: Decimal::TWO,
        }
    }

    fn servico(db: &Arc<MemoryDatabase>) -> ProdutoService {
        ProdutoService::new(db.clone())
    }

    #[tokio::test]
    async fn set_stock_rejects_unknown_and_unchanged() {
        let db = Arc::new(MemoryDatabase::com_produtos([produto("1", 4)]));
        let s = servico(&db);

        assert!(matches!(
            s.definir_estoque("9", Decimal::ONE, "1").await,
            Err(AppError::ProductNotFound)
        ));
        assert!(matches!(
            s.definir_estoque("1", Decimal::from(4), "1").await,
            Err(AppError::StockUnchanged)
        ));
        let p = s.definir_estoque("1", Decimal::ZERO, "1").await.unwrap();
        assert_eq!(p.estoque_atual, Decimal::ZERO);
        assert_eq!(db.produto("1").unwrap().estoque_atual, Decimal::ZERO);
    }

    #[tokio::test]
    async fn incoming_transfer_increments_or_registers() {
        let db = Arc::new(MemoryDatabase::com_produtos([produto("1", 2)]));
        let s = servico(&db);

        s.receber_transferencia(&produto("1", 99), Decimal::from(3), "1").await.unwrap();
        assert_eq!(db.produto("1").unwrap().estoque_atual, Decimal::from(5));

        s.receber_transferencia(&produto("2", 99), Decimal::from(3), "1").await.unwrap();
        let novo = db.produto("2").unwrap();
        assert_eq!(novo.estoque_atual, Decimal::from(3));
        assert_eq!(novo.preco_venda, Decimal::TWO);
    }

    #[tokio::test]
    async fn incoming_transfer_rejects_overflow_and_non_positive_amounts() {
        let db = Arc::new(MemoryDatabase::com_produtos([produto("1", 2)]));
        let s = servico(&db);

        assert!(matches!(
            s.receber_transferencia(&produto("1", 0), Decimal::MAX, "1").await,
            Err(AppError::InvalidAmount(_))
        ));
        assert!(matches!(
            s.receber_transferencia(&produto("1", 0), Decimal::ZERO, "1").await,
            Err(AppError::InvalidAmount(_))
        ));
        assert_eq!(db.produto("1").unwrap().estoque_atual, Decimal::from(2));
    }

    #[tokio::test]
    async fn register_conflicts_on_existing_code() {
        let db = Arc::new(MemoryDatabase::com_produtos([produto("1", 2)]));
        assert!(matches!(
            servico(&db).cadastrar(&produto("1", 0), "1").await,
            Err(AppError::ProductAlreadyExists(c)) if c == "1"
        ));
    }
}
