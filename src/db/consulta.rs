// src/db/consulta.rs
//
// Consulta genérica do painel de gestão. O campo chega do usuário como texto,
// mas só é aceito se for uma das variantes abaixo; tabela e coluna saem
// sempre das constantes, nunca da entrada.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::common::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CampoConsulta {
    ProdutoCodigo,
    ProdutoNome,
    ProdutoCodBarra,
    ClienteCodigo,
    ClienteNome,
    ClienteCpf,
}

// Tabelas alcançáveis pela consulta genérica.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabelaConsulta {
    Produtos,
    Clientes,
}

impl TabelaConsulta {
    pub fn nome(self) -> &'static str {
        match self {
            TabelaConsulta::Produtos => "produtos",
            TabelaConsulta::Clientes => "clientes",
        }
    }
}

impl CampoConsulta {
    pub fn tabela(self) -> TabelaConsulta {
        match self {
            CampoConsulta::ProdutoCodigo
            | CampoConsulta::ProdutoNome
            | CampoConsulta::ProdutoCodBarra => TabelaConsulta::Produtos,
            CampoConsulta::ClienteCodigo | CampoConsulta::ClienteNome | CampoConsulta::ClienteCpf => {
                TabelaConsulta::Clientes
            }
        }
    }

    pub fn coluna(self) -> &'static str {
        match self {
            CampoConsulta::ProdutoCodigo | CampoConsulta::ClienteCodigo => "codigo",
            CampoConsulta::ProdutoNome => "produto",
            CampoConsulta::ProdutoCodBarra => "codbarra",
            CampoConsulta::ClienteNome => "nome",
            CampoConsulta::ClienteCpf => "cpf",
        }
    }

    // Campos de nome usam busca parcial; os demais, igualdade.
    pub fn parcial(self) -> bool {
        matches!(self, CampoConsulta::ProdutoNome | CampoConsulta::ClienteNome)
    }

    /// Comando completo para este campo. Tabela e coluna vêm das constantes
    /// acima; o valor do usuário só entra como parâmetro `$1`.
    pub fn sql(self) -> String {
        let operador = if self.parcial() { "ILIKE" } else { "=" };
        format!(
            "SELECT row_to_json(t) FROM {} t WHERE {} {} $1 LIMIT 100",
            self.tabela().nome(),
            self.coluna(),
            operador
        )
    }
}

impl TryFrom<&str> for CampoConsulta {
    type Error = AppError;

    fn try_from(campo: &str) -> Result<Self, Self::Error> {
        match campo {
            "PRODUTO_CODIGO" => Ok(CampoConsulta::ProdutoCodigo),
            "PRODUTO_NOME" => Ok(CampoConsulta::ProdutoNome),
            "PRODUTO_COD_BARRA" => Ok(CampoConsulta::ProdutoCodBarra),
            "CLIENTE_CODIGO" => Ok(CampoConsulta::ClienteCodigo),
            "CLIENTE_NOME" => Ok(CampoConsulta::ClienteNome),
            "CLIENTE_CPF" => Ok(CampoConsulta::ClienteCpf),
            outro => Err(AppError::FieldNotAllowed(outro.to_string())),
        }
    }
}

// Pedido de consulta genérica: { campo, valor }
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ConsultaGenerica {
    #[validate(length(min = 1, message = "O campo da consulta é obrigatório."))]
    pub campo: String,
    #[validate(length(min = 1, message = "O valor da consulta é obrigatório."))]
    pub valor: String,
}

impl ConsultaGenerica {
    /// Campo da lista permitida; qualquer outro texto é recusado.
    pub fn campo(&self) -> Result<CampoConsulta, AppError> {
        CampoConsulta::try_from(self.campo.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_fields_are_rejected_before_any_sql() {
        let consulta: ConsultaGenerica =
            serde_json::from_value(json!({"campo": "SENHA; DROP TABLE produtos", "valor": "x"})).unwrap();
        assert!(matches!(consulta.campo(), Err(AppError::FieldNotAllowed(c)) if c.starts_with("SENHA")));

        let consulta: ConsultaGenerica =
            serde_json::from_value(json!({"campo": "CLIENTE_CPF", "valor": "123"})).unwrap();
        assert_eq!(consulta.campo().unwrap(), CampoConsulta::ClienteCpf);
    }

    #[test]
    fn wire_names_match_the_serde_names() {
        for campo in [CampoConsulta::ProdutoCodBarra, CampoConsulta::ClienteNome] {
            let nome = serde_json::to_value(campo).unwrap();
            assert_eq!(CampoConsulta::try_from(nome.as_str().unwrap()).unwrap(), campo);
        }
    }

    #[test]
    fn every_field_sql_matches_its_table_and_column() {
        let campos = [
            CampoConsulta::ProdutoCodigo,
            CampoConsulta::ProdutoNome,
            CampoConsulta::ProdutoCodBarra,
            CampoConsulta::ClienteCodigo,
            CampoConsulta::ClienteNome,
            CampoConsulta::ClienteCpf,
        ];
        for campo in campos {
            let sql = campo.sql();
            assert!(sql.starts_with("SELECT row_to_json(t) FROM "));
            assert!(sql.ends_with("$1 LIMIT 100"));
            assert_eq!(sql.contains("ILIKE"), campo.parcial());
        }
        assert_eq!(
            CampoConsulta::ProdutoNome.sql(),
            "SELECT row_to_json(t) FROM produtos t WHERE produto ILIKE $1 LIMIT 100"
        );
        assert_eq!(
            CampoConsulta::ClienteCpf.sql(),
            "SELECT row_to_json(t) FROM clientes t WHERE cpf = $1 LIMIT 100"
        );
    }
}
