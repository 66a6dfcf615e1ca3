// src/db/memory.rs
//
// Banco local em memória: mesmas operações do gateway SQL, sem servidor.
// Usado para simular lojas inteiras nos testes de ponta a ponta.

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::{
    common::error::AppError,
    db::{consulta::TabelaConsulta, CampoConsulta, LocalDatabase},
    models::{cliente::SaldoConvenio, produto::Produto},
};

#[derive(Default)]
pub struct MemoryDatabase {
    produtos: Mutex<BTreeMap<String, Produto>>,
    convenios: Mutex<Vec<SaldoConvenio>>,
    leituras: AtomicUsize,
    falhar_escritas: AtomicBool,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn com_produtos(produtos: impl IntoIterator<Item = Produto>) -> Self {
        let db = Self::default();
        if let Ok(mut mapa) = db.produtos.lock() {
            for p in produtos {
                mapa.insert(p.codigo.clone(), p);
            }
        }
        db
    }

    pub fn adicionar_convenio(&self, saldo: SaldoConvenio) {
        if let Ok(mut lista) = self.convenios.lock() {
            lista.push(saldo);
        }
    }

    /// Leitura direta, sem contar como operação do gateway.
    pub fn produto(&self, codigo: &str) -> Option<Produto> {
        self.produtos.lock().ok()?.get(codigo).cloned()
    }

    /// Quantas leituras passaram pelo gateway.
    pub fn leituras(&self) -> usize {
        self.leituras.load(Ordering::SeqCst)
    }

    /// Faz toda escrita seguinte falhar como se o driver tivesse caído.
    pub fn falhar_escritas(&self, falhar: bool) {
        self.falhar_escritas.store(falhar, Ordering::SeqCst);
    }

    fn ler(&self) {
        self.leituras.fetch_add(1, Ordering::SeqCst);
    }

    fn escrever(&self) -> Result<(), AppError> {
        if self.falhar_escritas.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    fn trava_produtos(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, Produto>>, AppError> {
        self.produtos
            .lock()
            .map_err(|_| AppError::InternalServerError(anyhow::anyhow!("banco em memória envenenado")))
    }
}

fn contem(texto: &str, termo: &str) -> bool {
    texto.to_lowercase().contains(&termo.trim().to_lowercase())
}

#[async_trait]
impl LocalDatabase for MemoryDatabase {
    async fn buscar_produtos(
        &self,
        termo: &str,
        somente_com_estoque: bool,
    ) -> Result<Vec<Produto>, AppError> {
        self.ler();
        let termo_exato = termo.trim();
        let mut encontrados: Vec<Produto> = self
            .trava_produtos()?
            .values()
            .filter(|p| {
                contem(&p.produto, termo)
                    || p.codigo == termo_exato
                    || p.codbarra.as_deref() == Some(termo_exato)
            })
            .filter(|p| !somente_com_estoque || p.estoque_atual > Decimal::ZERO)
            .cloned()
            .collect();
        encontrados.sort_by(|a, b| a.produto.cmp(&b.produto));
        Ok(encontrados)
    }

    async fn buscar_produto(&self, codigo: &str) -> Result<Option<Produto>, AppError> {
        self.ler();
        Ok(self.trava_produtos()?.get(codigo).cloned())
    }

    async fn produto_existe(&self, codigo: &str) -> Result<bool, AppError> {
        self.ler();
        Ok(self.trava_produtos()?.contains_key(codigo))
    }

    async fn atualizar_estoque(
        &self,
        codigo: &str,
        quantidade: Decimal,
        _usuario: &str,
    ) -> Result<(), AppError> {
        self.escrever()?;
        let mut produtos = self.trava_produtos()?;
        let produto = produtos.get_mut(codigo).ok_or(AppError::ProductNotFound)?;
        produto.estoque_atual = quantidade;
        Ok(())
    }

    async fn inserir_produto(&self, produto: &Produto, _usuario: &str) -> Result<(), AppError> {
        self.escrever()?;
        let mut produtos = self.trava_produtos()?;
        if produtos.contains_key(&produto.codigo) {
            return Err(AppError::ProductAlreadyExists(produto.codigo.clone()));
        }
        produtos.insert(produto.codigo.clone(), produto.clone());
        Ok(())
    }

    async fn saldo_convenio(&self, termo: &str) -> Result<Vec<SaldoConvenio>, AppError> {
        self.ler();
        let lista = self
            .convenios
            .lock()
            .map_err(|_| AppError::InternalServerError(anyhow::anyhow!("banco em memória envenenado")))?;
        Ok(lista
            .iter()
            .filter(|c| contem(&c.nome, termo) || c.codigo == termo.trim())
            .cloned()
            .collect())
    }

    async fn consulta_generica(
        &self,
        campo: CampoConsulta,
        valor: &str,
    ) -> Result<Vec<Value>, AppError> {
        self.ler();
        let valor = valor.trim();
        let linhas: Vec<Value> = match campo.tabela() {
            TabelaConsulta::Produtos => self
                .trava_produtos()?
                .values()
                .filter(|p| match campo {
                    CampoConsulta::ProdutoCodigo => p.codigo == valor,
                    CampoConsulta::ProdutoNome => contem(&p.produto, valor),
                    _ => p.codbarra.as_deref() == Some(valor),
                })
                .filter_map(|p| serde_json::to_value(p).ok())
                .collect(),
            TabelaConsulta::Clientes => self
                .convenios
                .lock()
                .map_err(|_| {
                    AppError::InternalServerError(anyhow::anyhow!("banco em memória envenenado"))
                })?
                .iter()
                .filter(|c| match campo {
                    CampoConsulta::ClienteCodigo => c.codigo == valor,
                    CampoConsulta::ClienteNome => contem(&c.nome, valor),
                    // O saldo agregado não carrega CPF.
                    _ => false,
                })
                .filter_map(|c| serde_json::to_value(c).ok())
                .collect(),
        };
        Ok(linhas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn produto(codigo: &str, nome: &str, estoque: i64) -> Produto {
        Produto {
            codigo: codigo.into(),
            produto: nome.into(),
            codbarra: Some(format!("789{}", codigo)),
            unidade: None,
            estoque_atual: Decimal::from(estoque),
            preco_custo: Decimal::ZERO,
            preco_venda: Decimal::ZERO,
        }
    }

    #[tokio::test]
    async fn search_matches_name_code_and_barcode() {
        let db = MemoryDatabase::com_produtos([
            produto("1", "ASPIRINA 500MG", 5),
            produto("2", "ASPIRINA INFANTIL", 0),
            produto("3", "GAZE", 10),
        ]);

        assert_eq!(db.buscar_produtos("aspirina", false).await.unwrap().len(), 2);
        assert_eq!(db.buscar_produtos("aspirina", true).await.unwrap().len(), 1);
        assert_eq!(db.buscar_produtos("3", false).await.unwrap()[0].produto, "GAZE");
        assert_eq!(db.buscar_produtos("7893", false).await.unwrap()[0].codigo, "3");
        assert_eq!(db.leituras(), 4);
    }

    #[tokio::test]
    async fn failing_writes_surface_as_database_errors() {
        let db = MemoryDatabase::com_produtos([produto("1", "GAZE", 1)]);
        db.falhar_escritas(true);

        let err = db.atualizar_estoque("1", Decimal::ZERO, "1").await.unwrap_err();
        assert!(matches!(err, AppError::DatabaseError(_)));
        assert_eq!(db.produto("1").unwrap().estoque_atual, Decimal::ONE);
    }
}
