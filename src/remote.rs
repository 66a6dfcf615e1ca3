// src/remote.rs
//
// Cliente do banco remoto em tempo real compartilhado entre as lojas.
// Primitivas por caminho (texto): ler, gravar, apagar e escutar.

pub mod caminhos;
pub mod firebase;
pub mod memory;

pub use caminhos::Caminhos;
pub use firebase::FirebaseStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde_json::Value;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::common::error::AppError;

/// Mudança observada em um caminho escutado.
///
/// `path` é relativo ao caminho da assinatura ("" = o próprio nó) e
/// `value == Null` significa que o nó foi apagado.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteEvent {
    Put { path: String, value: Value },
}

impl RemoteEvent {
    /// Normaliza o evento em pares (filho direto, valor).
    ///
    /// Um `Put` na raiz com um objeto vira um par por filho; um `Put` em um
    /// filho direto vira um único par. Escritas mais profundas (um campo
    /// dentro de um filho) são ignoradas: os registros sempre são gravados
    /// inteiros.
    pub fn filhos(self) -> Vec<(String, Value)> {
        let RemoteEvent::Put { path, value } = self;
        let path = path.trim_matches('/');

        if path.is_empty() {
            return match value {
                Value::Object(mapa) => mapa.into_iter().collect(),
                _ => Vec::new(),
            };
        }
        if path.contains('/') {
            return Vec::new();
        }
        vec![(path.to_string(), value)]
    }
}

type AoCancelar = Box<dyn FnOnce() + Send + 'static>;

/// Assinatura de um `listen`. Soltar a assinatura cancela a escuta.
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<RemoteEvent>,
    ao_cancelar: Option<AoCancelar>,
}

impl Subscription {
    pub fn new(
        rx: mpsc::UnboundedReceiver<RemoteEvent>,
        ao_cancelar: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self { rx, ao_cancelar: Some(Box::new(ao_cancelar)) }
    }

    /// Próximo evento; `None` quando o lado remoto encerrou a escuta.
    pub async fn next(&mut self) -> Option<RemoteEvent> {
        self.rx.recv().await
    }

    fn executar_cancelamento(&mut self) {
        if let Some(f) = self.ao_cancelar.take() {
            f();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.executar_cancelamento();
    }
}

/// Tarefa de escuta em segundo plano. Soltar o handle aborta a tarefa
/// (e com ela a `Subscription` que ela possui).
pub struct Escuta(JoinHandle<()>);

impl Escuta {
    pub fn iniciar<F>(tarefa: F) -> Self
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        Self(tokio::spawn(tarefa))
    }

    pub fn ativa(&self) -> bool {
        !self.0.is_finished()
    }
}

impl Drop for Escuta {
    fn drop(&mut self) {
        self.0.abort();
    }
}

#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Valor do nó (`Null` se não existir).
    async fn get(&self, path: &str) -> Result<Value, AppError>;

    /// Substitui o nó inteiro. Gravar `Null` apaga.
    async fn set(&self, path: &str, value: Value) -> Result<(), AppError>;

    async fn remove(&self, path: &str) -> Result<(), AppError>;

    /// Começa com um `Put` na raiz contendo o valor atual (se houver) e depois
    /// entrega toda mudança no nó ou abaixo dele.
    async fn listen(&self, path: &str) -> Result<Subscription, AppError>;
}

/// Divide um caminho em segmentos, ignorando barras extras.
pub(crate) fn segmentos(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn root_put_expands_into_children() {
        let ev = RemoteEvent::Put {
            path: "".into(),
            value: json!({"r1": {"a": 1}, "r2": {"a": 2}}),
        };
        let filhos = ev.filhos();
        assert_eq!(filhos.len(), 2);
        assert!(filhos.iter().any(|(k, v)| k == "r1" && v["a"] == 1));
    }

    #[test]
    fn child_put_and_deep_put() {
        let ev = RemoteEvent::Put { path: "/r1".into(), value: Value::Null };
        assert_eq!(ev.filhos(), vec![("r1".to_string(), Value::Null)]);

        let ev = RemoteEvent::Put { path: "r1/a".into(), value: json!(3) };
        assert!(ev.filhos().is_empty());
    }
}
