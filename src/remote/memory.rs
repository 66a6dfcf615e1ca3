// src/remote/memory.rs
//
// Banco remoto dentro do próprio processo: uma árvore JSON com ouvintes.
// Serve para rodar uma loja isolada (sem REMOTE_STORE_URL) e para simular
// várias lojas compartilhando o mesmo banco nos testes.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::mpsc;

use crate::{
    common::error::AppError,
    remote::{segmentos, RemoteEvent, RemoteStore, Subscription},
};

struct Ouvinte {
    id: u64,
    caminho: Vec<String>,
    tx: mpsc::UnboundedSender<RemoteEvent>,
}

#[derive(Default)]
struct Estado {
    raiz: Value,
    ouvintes: Vec<Ouvinte>,
    proximo_id: u64,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    estado: Arc<Mutex<Estado>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Quantas escutas estão registradas agora.
    pub fn ouvintes(&self) -> usize {
        self.estado.lock().map(|e| e.ouvintes.len()).unwrap_or(0)
    }

    fn travar(&self) -> Result<std::sync::MutexGuard<'_, Estado>, AppError> {
        self.estado
            .lock()
            .map_err(|_| AppError::RemoteStore("banco em memória envenenado".into()))
    }
}

fn ler<'a>(raiz: &'a Value, caminho: &[String]) -> Option<&'a Value> {
    caminho.iter().try_fold(raiz, |no, seg| no.get(seg))
}

fn gravar(raiz: &mut Value, caminho: &[String], valor: Value) {
    let Some((ultimo, pais)) = caminho.split_last() else {
        *raiz = valor;
        return;
    };

    let mut no = raiz;
    for seg in pais {
        if !no.is_object() {
            *no = Value::Object(Map::new());
        }
        // is_object garantido logo acima
        let Some(mapa) = no.as_object_mut() else { return };
        no = mapa.entry(seg.clone()).or_insert(Value::Null);
    }
    if !no.is_object() {
        *no = Value::Object(Map::new());
    }
    if let Some(mapa) = no.as_object_mut() {
        mapa.insert(ultimo.clone(), valor);
    }
}

fn apagar(raiz: &mut Value, caminho: &[String]) {
    let Some((primeiro, resto)) = caminho.split_first() else {
        *raiz = Value::Null;
        return;
    };
    let Some(mapa) = raiz.as_object_mut() else { return };

    if resto.is_empty() {
        mapa.remove(primeiro);
    } else if let Some(filho) = mapa.get_mut(primeiro) {
        apagar(filho, resto);
        // Nós vazios deixam de existir, como no banco de verdade.
        let vazio = match filho {
            Value::Object(m) => m.is_empty(),
            Value::Null => true,
            _ => false,
        };
        if vazio {
            mapa.remove(primeiro);
        }
    }
}

fn comeca_com(caminho: &[String], prefixo: &[String]) -> bool {
    caminho.len() >= prefixo.len() && caminho[..prefixo.len()] == *prefixo
}

impl Estado {
    fn escrever(&mut self, caminho: &[String], valor: Value) {
        if valor.is_null() {
            apagar(&mut self.raiz, caminho);
        } else {
            gravar(&mut self.raiz, caminho, valor.clone());
        }

        let raiz = &self.raiz;
        self.ouvintes.retain(|ouvinte| {
            let evento = if comeca_com(caminho, &ouvinte.caminho) {
                // Escrita no nó escutado ou abaixo dele
                RemoteEvent::Put {
                    path: caminho[ouvinte.caminho.len()..].join("/"),
                    value: valor.clone(),
                }
            } else if comeca_com(&ouvinte.caminho, caminho) {
                // Escrita acima: o nó escutado foi substituído por inteiro
                RemoteEvent::Put {
                    path: String::new(),
                    value: ler(raiz, &ouvinte.caminho).cloned().unwrap_or(Value::Null),
                }
            } else {
                return true;
            };
            ouvinte.tx.send(evento).is_ok()
        });
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn get(&self, path: &str) -> Result<Value, AppError> {
        let estado = self.travar()?;
        Ok(ler(&estado.raiz, &segmentos(path)).cloned().unwrap_or(Value::Null))
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), AppError> {
        self.travar()?.escrever(&segmentos(path), value);
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), AppError> {
        self.travar()?.escrever(&segmentos(path), Value::Null);
        Ok(())
    }

    async fn listen(&self, path: &str) -> Result<Subscription, AppError> {
        let caminho = segmentos(path);
        let (tx, rx) = mpsc::unbounded_channel();

        let id = {
            let mut estado = self.travar()?;
            let id = estado.proximo_id;
            estado.proximo_id += 1;

            // Fotografia inicial e registro sob a mesma trava: nada se perde no meio.
            if let Some(atual) = ler(&estado.raiz, &caminho).filter(|v| !v.is_null()) {
                let _ = tx.send(RemoteEvent::Put { path: String::new(), value: atual.clone() });
            }
            estado.ouvintes.push(Ouvinte { id, caminho, tx });
            id
        };

        let estado = Arc::downgrade(&self.estado);
        Ok(Subscription::new(rx, move || {
            if let Some(estado) = estado.upgrade() {
                if let Ok(mut estado) = estado.lock() {
                    estado.ouvintes.retain(|o| o.id != id);
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn set_get_remove_prunes_empty_parents() {
        let store = MemoryStore::new();
        store.set("ns/stockRequests/B/r1", json!({"searchTerm": "gaze"})).await.unwrap();
        assert_eq!(store.get("ns/stockRequests/B/r1/searchTerm").await.unwrap(), "gaze");

        store.remove("ns/stockRequests/B/r1").await.unwrap();
        assert_eq!(store.get("ns/stockRequests/B").await.unwrap(), Value::Null);
        assert_eq!(store.get("ns").await.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn listen_delivers_snapshot_then_changes() {
        let store = MemoryStore::new();
        store.set("inbox/B/r1", json!({"n": 1})).await.unwrap();

        let mut sub = store.listen("inbox/B").await.unwrap();
        assert_eq!(
            sub.next().await,
            Some(RemoteEvent::Put { path: "".into(), value: json!({"r1": {"n": 1}}) })
        );

        store.set("inbox/B/r2", json!({"n": 2})).await.unwrap();
        store.remove("inbox/B/r1").await.unwrap();
        store.set("inbox/C/r9", json!({"n": 9})).await.unwrap();

        assert_eq!(
            sub.next().await,
            Some(RemoteEvent::Put { path: "r2".into(), value: json!({"n": 2}) })
        );
        assert_eq!(
            sub.next().await,
            Some(RemoteEvent::Put { path: "r1".into(), value: Value::Null })
        );
        assert!(sub.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn writes_above_the_listened_node_replace_it() {
        let store = MemoryStore::new();
        let mut sub = store.listen("a/b").await.unwrap();
        store.set("a", json!({"b": {"x": 1}})).await.unwrap();
        assert_eq!(
            sub.next().await,
            Some(RemoteEvent::Put { path: "".into(), value: json!({"x": 1}) })
        );
    }

    #[tokio::test]
    async fn dropping_the_subscription_unregisters_it() {
        let store = MemoryStore::new();
        let sub = store.listen("a").await.unwrap();
        let outra = store.listen("b").await.unwrap();
        assert_eq!(store.ouvintes(), 2);

        drop(sub);
        assert_eq!(store.ouvintes(), 1);
        drop(outra);
        assert_eq!(store.ouvintes(), 0);
    }
}
