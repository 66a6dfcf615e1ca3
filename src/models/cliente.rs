// src/models/cliente.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

// --- Saldo de Convênio ---
// Linha agregada por cliente: total comprado, total pago e saldo devedor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SaldoConvenio {
    #[serde(rename = "CODIGO")]
    pub codigo: String,

    #[serde(rename = "NOME")]
    pub nome: String,

    #[serde(rename = "CONVENIO")]
    pub convenio: Option<String>,

    #[serde(rename = "TOTALCOMPRAS")]
    #[sqlx(rename = "totalcompras")]
    pub total_compras: Decimal,

    #[serde(rename = "TOTALPAGO")]
    #[sqlx(rename = "totalpago")]
    pub total_pago: Decimal,

    #[serde(rename = "SALDO")]
    pub saldo: Decimal,

    #[serde(rename = "ULTIMACOMPRA")]
    #[sqlx(rename = "ultimacompra")]
    pub ultima_compra: Option<NaiveDate>,
}
