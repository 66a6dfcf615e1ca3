// src/remote/firebase.rs
//
// Cliente REST do Firebase Realtime Database.
// Leitura/escrita: GET/PUT/DELETE em `{base}/{caminho}.json`.
// Escuta: o mesmo GET com `Accept: text/event-stream` (eventos `put`/`patch`).

use std::time::Duration;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::{
    common::error::AppError,
    remote::{RemoteEvent, RemoteStore, Subscription},
};

#[derive(Clone)]
pub struct FirebaseStore {
    client: reqwest::Client,
    base_url: String,
    auth: Option<String>,
    timeout: Duration,
}

// Corpo dos eventos `put` e `patch`.
#[derive(Debug, Deserialize)]
struct CorpoEvento {
    path: String,
    data: Value,
}

impl FirebaseStore {
    pub fn new(base_url: impl Into<String>, auth: Option<String>, timeout: Duration) -> Self {
        Self {
            // Sem timeout global: o stream de escuta fica aberto indefinidamente.
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
            timeout,
        }
    }

    fn url(&self, path: &str) -> String {
        let mut url = format!("{}/{}.json", self.base_url, path.trim_matches('/'));
        if let Some(auth) = &self.auth {
            url.push_str("?auth=");
            url.push_str(auth);
        }
        url
    }

    async fn checar(resposta: reqwest::Response) -> Result<reqwest::Response, AppError> {
        let status = resposta.status();
        if status.is_success() {
            return Ok(resposta);
        }
        let corpo = resposta.text().await.unwrap_or_default();
        Err(AppError::RemoteStore(format!("{}: {}", status, corpo)))
    }
}

/// Converte um evento SSE do Firebase em eventos de escuta.
/// `None` quando o servidor encerrou a escuta.
fn traduzir(tipo: &str, dados: &str) -> Option<Vec<RemoteEvent>> {
    match tipo {
        "put" | "patch" => {
            let corpo: CorpoEvento = match serde_json::from_str(dados) {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!(error = %e, "Evento remoto ilegível ignorado");
                    return Some(Vec::new());
                }
            };
            let base = corpo.path.trim_matches('/').to_string();
            if tipo == "put" {
                return Some(vec![RemoteEvent::Put { path: base, value: corpo.data }]);
            }
            // patch = vários puts nos filhos indicados
            let eventos = match corpo.data {
                Value::Object(mapa) => mapa
                    .into_iter()
                    .map(|(chave, valor)| RemoteEvent::Put {
                        path: if base.is_empty() { chave } else { format!("{}/{}", base, chave) },
                        value: valor,
                    })
                    .collect(),
                _ => Vec::new(),
            };
            Some(eventos)
        }
        "keep-alive" => Some(Vec::new()),
        "cancel" | "auth_revoked" => None,
        outro => {
            tracing::debug!(evento = outro, "Evento remoto desconhecido ignorado");
            Some(Vec::new())
        }
    }
}

#[async_trait]
impl RemoteStore for FirebaseStore {
    async fn get(&self, path: &str) -> Result<Value, AppError> {
        let resposta = self.client.get(self.url(path)).timeout(self.timeout).send().await?;
        Ok(Self::checar(resposta).await?.json::<Value>().await?)
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), AppError> {
        let resposta = self
            .client
            .put(self.url(path))
            .timeout(self.timeout)
            .json(&value)
            .send()
            .await?;
        Self::checar(resposta).await?;
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), AppError> {
        let resposta = self.client.delete(self.url(path)).timeout(self.timeout).send().await?;
        Self::checar(resposta).await?;
        Ok(())
    }

    async fn listen(&self, path: &str) -> Result<Subscription, AppError> {
        let resposta = self
            .client
            .get(self.url(path))
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await?;
        let resposta = Self::checar(resposta).await?;

        let (tx, rx) = mpsc::unbounded_channel();
        let caminho = path.to_string();
        let tarefa = tokio::spawn(async move {
            let mut eventos = resposta.bytes_stream().eventsource();
            while let Some(evento) = eventos.next().await {
                let evento = match evento {
                    Ok(e) => e,
                    Err(e) => {
                        // Sem reconexão: quem escuta percebe o fim do stream.
                        tracing::warn!(caminho = %caminho, error = %e, "Escuta remota interrompida");
                        break;
                    }
                };
                let Some(traduzidos) = traduzir(&evento.event, &evento.data) else {
                    tracing::warn!(caminho = %caminho, "Escuta remota cancelada pelo servidor");
                    break;
                };
                for ev in traduzidos {
                    if tx.send(ev).is_err() {
                        return;
                    }
                }
            }
        });

        Ok(Subscription::new(rx, move || tarefa.abort()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn patch_events_become_child_puts() {
        let eventos = traduzir("patch", r#"{"path":"/","data":{"r1":{"a":1},"r2":null}}"#).unwrap();
        assert_eq!(eventos.len(), 2);
        assert!(eventos.contains(&RemoteEvent::Put { path: "r2".into(), value: Value::Null }));

        let eventos = traduzir("put", r#"{"path":"/r1","data":{"a":1}}"#).unwrap();
        assert_eq!(eventos, vec![RemoteEvent::Put { path: "r1".into(), value: json!({"a": 1}) }]);

        assert!(traduzir("keep-alive", "null").unwrap().is_empty());
        assert!(traduzir("auth_revoked", "credential is no longer valid").is_none());
    }

    #[tokio::test]
    async fn set_puts_json_at_the_node_url() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/rede/status/loja1.json"))
            .and(query_param("auth", "segredo"))
            .and(body_json(json!({"state": "online", "last_changed": 1})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"state": "online"})))
            .expect(1)
            .mount(&server)
            .await;

        let store = FirebaseStore::new(server.uri(), Some("segredo".into()), Duration::from_secs(5));
        store
            .set("rede/status/loja1", json!({"state": "online", "last_changed": 1}))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn get_maps_http_errors_to_remote_store_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rede/stores.json"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Permission denied"))
            .mount(&server)
            .await;

        let store = FirebaseStore::new(server.uri(), None, Duration::from_secs(5));
        let err = store.get("rede/stores").await.unwrap_err();
        assert!(matches!(err, AppError::RemoteStore(m) if m.contains("Permission denied")));
    }

    #[tokio::test]
    async fn listen_parses_the_event_stream() {
        let server = MockServer::start().await;
        let sse = concat!(
            "event: put\ndata: {\"path\":\"/\",\"data\":{\"r1\":{\"searchTerm\":\"gaze\"}}}\n\n",
            "event: keep-alive\ndata: null\n\n",
            "event: put\ndata: {\"path\":\"/r1\",\"data\":null}\n\n",
        );
        Mock::given(method("GET"))
            .and(path("/rede/stockRequests/B.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse),
            )
            .mount(&server)
            .await;

        let store = FirebaseStore::new(server.uri(), None, Duration::from_secs(5));
        let mut sub = store.listen("rede/stockRequests/B").await.unwrap();

        assert_eq!(
            sub.next().await,
            Some(RemoteEvent::Put { path: "".into(), value: json!({"r1": {"searchTerm": "gaze"}}) })
        );
        assert_eq!(
            sub.next().await,
            Some(RemoteEvent::Put { path: "r1".into(), value: Value::Null })
        );
        // Corpo terminou: a escuta acaba.
        assert_eq!(sub.next().await, None);
    }
}
