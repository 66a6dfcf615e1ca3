// src/common/db_utils.rs

use crate::common::error::AppError;

// ---
// Helper de falha: loga o SQL que falhou e devolve o erro genérico
// ---
/// Usado em todo `map_err` do gateway SQL: o detalhe do driver vai para o log
/// junto com o comando, o chamador recebe apenas `AppError::DatabaseError`.
pub(crate) fn falha_sql<S: AsRef<str>>(sql: S) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| {
        tracing::error!(statement = sql.as_ref(), error = %e, "🔥 Falha ao executar comando no banco local");
        AppError::DatabaseError(e)
    }
}

/// Termo de busca no formato aceito pelo `ILIKE`.
pub(crate) fn padrao_like(termo: &str) -> String {
    let escapado = termo
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escapado)
}
