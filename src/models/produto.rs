// src/models/produto.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

// --- Produto ---
// Espelha a tabela de produtos do banco local da loja. Os nomes no JSON são
// os mesmos das colunas (CODIGO, PRODUTO, ESTOQUEATUAL...), que é o formato
// que as outras lojas já esperam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Produto {
    #[serde(rename = "CODIGO")]
    pub codigo: String,

    #[serde(rename = "PRODUTO")]
    pub produto: String,

    #[serde(rename = "CODBARRA", default)]
    pub codbarra: Option<String>,

    #[serde(rename = "UNIDADE", default)]
    pub unidade: Option<String>,

    #[serde(rename = "ESTOQUEATUAL")]
    #[sqlx(rename = "estoqueatual")]
    pub estoque_atual: Decimal,

    #[serde(rename = "PRECOCUSTO", default)]
    #[sqlx(rename = "precocusto")]
    pub preco_custo: Decimal,

    #[serde(rename = "PRECOVENDA", default)]
    #[sqlx(rename = "precovenda")]
    pub preco_venda: Decimal,
}

// Resposta padrão das buscas: { "data": [...] }
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListaProdutos {
    pub data: Vec<Produto>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_with_column_names() {
        let p = Produto {
            codigo: "123".into(),
            produto: "ASPIRINA 500MG".into(),
            codbarra: None,
            unidade: Some("CX".into()),
            estoque_atual: Decimal::from(5),
            preco_custo: Decimal::new(250, 2),
            preco_venda: Decimal::new(499, 2),
        };
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["CODIGO"], "123");
        assert_eq!(v["ESTOQUEATUAL"], json!(5.0));
        assert_eq!(v["UNIDADE"], "CX");
    }

    #[test]
    fn prices_are_optional_on_input() {
        let p: Produto = serde_json::from_value(json!({
            "CODIGO": "9", "PRODUTO": "GAZE", "ESTOQUEATUAL": 2
        }))
        .unwrap();
        assert_eq!(p.estoque_atual, Decimal::from(2));
        assert_eq!(p.preco_venda, Decimal::ZERO);
    }
}
