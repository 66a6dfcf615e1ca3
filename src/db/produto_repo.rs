// src/db/produto_repo.rs

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::PgPool;

use crate::{
    common::{
        db_utils::{falha_sql, padrao_like},
        error::AppError,
    },
    db::{CampoConsulta, LocalDatabase},
    models::{cliente::SaldoConvenio, produto::Produto},
};

const BUSCAR_PRODUTOS: &str = r#"
    SELECT codigo, produto, codbarra, unidade, estoqueatual, precocusto, precovenda
    FROM produtos
    WHERE (produto ILIKE $1 OR codigo = $2 OR codbarra = $2)
      AND ($3 = FALSE OR estoqueatual > 0)
    ORDER BY produto ASC
    LIMIT 200
"#;

const BUSCAR_PRODUTO: &str = r#"
    SELECT codigo, produto, codbarra, unidade, estoqueatual, precocusto, precovenda
    FROM produtos
    WHERE codigo = $1
"#;

const PRODUTO_EXISTE: &str = "SELECT EXISTS(SELECT 1 FROM produtos WHERE codigo = $1)";

// A procedure grava o novo saldo e o histórico da movimentação.
const ATUALIZAR_ESTOQUE: &str = "SELECT atualizar_estoque($1, $2, $3)";

const INSERIR_PRODUTO: &str = r#"
    INSERT INTO produtos (codigo, produto, codbarra, unidade, estoqueatual, precocusto, precovenda, usuario_cadastro)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
"#;

const SALDO_CONVENIO: &str = r#"
    SELECT c.codigo,
           c.nome,
           c.convenio,
           COALESCE(SUM(v.valor), 0)                AS totalcompras,
           COALESCE(SUM(v.valor_pago), 0)           AS totalpago,
           COALESCE(SUM(v.valor - v.valor_pago), 0) AS saldo,
           MAX(v.data)::date                        AS ultimacompra
    FROM clientes c
    LEFT JOIN vendas_convenio v ON v.cliente_codigo = c.codigo
    WHERE c.nome ILIKE $1 OR c.codigo = $2 OR c.cpf = $2
    GROUP BY c.codigo, c.nome, c.convenio
    ORDER BY c.nome ASC
"#;

// O gateway SQL de produção. Cada operação pega uma conexão da pool, roda
// um único comando parametrizado e devolve a conexão ao sair do escopo,
// com ou sem erro.
#[derive(Clone)]
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LocalDatabase for PgDatabase {
    async fn buscar_produtos(
        &self,
        termo: &str,
        somente_com_estoque: bool,
    ) -> Result<Vec<Produto>, AppError> {
        let mut conn = self.pool.acquire().await.map_err(falha_sql(BUSCAR_PRODUTOS))?;

        sqlx::query_as::<_, Produto>(BUSCAR_PRODUTOS)
            .bind(padrao_like(termo))
            .bind(termo.trim())
            .bind(somente_com_estoque)
            .fetch_all(&mut *conn)
            .await
            .map_err(falha_sql(BUSCAR_PRODUTOS))
    }

    async fn buscar_produto(&self, codigo: &str) -> Result<Option<Produto>, AppError> {
        let mut conn = self.pool.acquire().await.map_err(falha_sql(BUSCAR_PRODUTO))?;

        sqlx::query_as::<_, Produto>(BUSCAR_PRODUTO)
            .bind(codigo)
            .fetch_optional(&mut *conn)
            .await
            .map_err(falha_sql(BUSCAR_PRODUTO))
    }

    async fn produto_existe(&self, codigo: &str) -> Result<bool, AppError> {
        let mut conn = self.pool.acquire().await.map_err(falha_sql(PRODUTO_EXISTE))?;

        sqlx::query_scalar::<_, bool>(PRODUTO_EXISTE)
            .bind(codigo)
            .fetch_one(&mut *conn)
            .await
            .map_err(falha_sql(PRODUTO_EXISTE))
    }

    async fn atualizar_estoque(
        &self,
        codigo: &str,
        quantidade: Decimal,
        usuario: &str,
    ) -> Result<(), AppError> {
        let mut conn = self.pool.acquire().await.map_err(falha_sql(ATUALIZAR_ESTOQUE))?;

        sqlx::query(ATUALIZAR_ESTOQUE)
            .bind(codigo)
            .bind(quantidade)
            .bind(usuario)
            .execute(&mut *conn)
            .await
            .map_err(falha_sql(ATUALIZAR_ESTOQUE))?;

        tracing::info!(codigo, %quantidade, usuario, "📦 Estoque atualizado");
        Ok(())
    }

    async fn inserir_produto(&self, produto: &Produto, usuario: &str) -> Result<(), AppError> {
        let mut conn = self.pool.acquire().await.map_err(falha_sql(INSERIR_PRODUTO))?;

        let resultado = sqlx::query(INSERIR_PRODUTO)
            .bind(&produto.codigo)
            .bind(&produto.produto)
            .bind(&produto.codbarra)
            .bind(&produto.unidade)
            .bind(produto.estoque_atual)
            .bind(produto.preco_custo)
            .bind(produto.preco_venda)
            .bind(usuario)
            .execute(&mut *conn)
            .await;

        match resultado {
            Ok(_) => {
                tracing::info!(codigo = %produto.codigo, usuario, "🆕 Produto cadastrado");
                Ok(())
            }
            // Converte erro de violação de chave única em um erro mais amigável
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(AppError::ProductAlreadyExists(produto.codigo.clone()))
            }
            Err(e) => Err(falha_sql(INSERIR_PRODUTO)(e)),
        }
    }

    async fn saldo_convenio(&self, termo: &str) -> Result<Vec<SaldoConvenio>, AppError> {
        let mut conn = self.pool.acquire().await.map_err(falha_sql(SALDO_CONVENIO))?;

        sqlx::query_as::<_, SaldoConvenio>(SALDO_CONVENIO)
            .bind(padrao_like(termo))
            .bind(termo.trim())
            .fetch_all(&mut *conn)
            .await
            .map_err(falha_sql(SALDO_CONVENIO))
    }

    async fn consulta_generica(
        &self,
        campo: CampoConsulta,
        valor: &str,
    ) -> Result<Vec<Value>, AppError> {
        let sql = campo.sql();
        let parametro = if campo.parcial() {
            padrao_like(valor)
        } else {
            valor.trim().to_string()
        };

        let mut conn = self.pool.acquire().await.map_err(falha_sql(&sql))?;

        sqlx::query_scalar::<_, Value>(&sql)
            .bind(parametro)
            .fetch_all(&mut *conn)
            .await
            .map_err(falha_sql(&sql))
    }
}
