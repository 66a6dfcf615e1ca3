mod common;

use std::time::{Duration, Instant};

use axum::http::StatusCode;
use rede_lojas::{
    remote::{Caminhos, RemoteStore},
    services::presenca_service::PresencaService,
};
use serde_json::{json, Value};

use common::{esperar, produto, Rede, NAMESPACE};

#[tokio::test]
async fn search_returns_only_stores_with_stock() {
    let rede = Rede::new();
    let a = rede.loja("A", vec![]).await;
    rede.loja("B", vec![produto("10", "ASPIRINA 500MG", 5)]).await;
    rede.loja("C", vec![produto("10", "ASPIRINA 500MG", 0)]).await;

    let (status, corpo) = a.get("/local/estoque/aspirin").await;
    assert_eq!(status, StatusCode::OK);

    let mapa = corpo.as_object().unwrap();
    assert_eq!(mapa.len(), 1, "resultado: {}", corpo);
    let linhas = mapa["B"].as_array().unwrap();
    assert_eq!(linhas.len(), 1);
    assert_eq!(linhas[0]["ESTOQUEATUAL"].as_f64(), Some(5.0));
    assert_eq!(linhas[0]["CODIGO"], "10");
    assert!(!mapa.contains_key("C"));
}

#[tokio::test]
async fn silent_store_is_left_out_at_the_deadline() {
    let rede = Rede::com_prazo(Duration::from_millis(300));
    let a = rede.loja("A", vec![]).await;
    rede.loja("B", vec![produto("10", "DIPIRONA", 7)]).await;

    // D aparece online mas nunca atende
    let d = PresencaService::new(rede.remoto.clone(), Caminhos::new(NAMESPACE), "D", "http://D");
    d.conectar().await.unwrap();

    let inicio = Instant::now();
    let (status, corpo) = a.get("/local/estoque/dipirona").await;
    assert_eq!(status, StatusCode::OK);
    assert!(inicio.elapsed() >= Duration::from_millis(300));

    let mapa = corpo.as_object().unwrap();
    assert!(mapa.contains_key("B"));
    assert!(!mapa.contains_key("D"));

    // O pedido sem resposta não fica parado na caixa de D
    assert_eq!(rede.remoto.get("rede/stockRequests/D").await.unwrap(), Value::Null);
}

#[tokio::test]
async fn consumed_requests_and_answers_are_deleted() {
    let rede = Rede::new();
    let a = rede.loja("A", vec![]).await;
    rede.loja("B", vec![produto("10", "GAZE", 2)]).await;

    let (status, _) = a.get("/local/estoque/gaze").await;
    assert_eq!(status, StatusCode::OK);

    let remoto = rede.remoto.clone();
    assert!(
        esperar(|| {
            let remoto = remoto.clone();
            async move {
                remoto.get("rede/stockRequests/B").await.unwrap().is_null()
                    && remoto.get("rede/stockRequestAnswers/A").await.unwrap().is_null()
            }
        })
        .await
    );
}

#[tokio::test]
async fn no_online_stores_means_empty_result_and_no_writes() {
    let rede = Rede::new();
    let a = rede.loja("A", vec![produto("10", "GAZE", 2)]).await;

    let (status, corpo) = a.get("/local/estoque/gaze").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(corpo, json!({}));
    assert_eq!(rede.remoto.get("rede/stockRequests").await.unwrap(), Value::Null);
}

#[tokio::test]
async fn table_query_fans_out_with_allow_listed_field() {
    let rede = Rede::new();
    let a = rede.loja("A", vec![]).await;
    rede.loja("B", vec![produto("10", "GAZE", 2)]).await;

    let (status, corpo) = a
        .post("/local/consulta", json!({ "campo": "PRODUTO_CODIGO", "valor": "10" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(corpo["B"][0]["PRODUTO"], "GAZE");

    let (status, corpo) = a
        .post("/local/consulta", json!({ "campo": "senha", "valor": "10" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(corpo["error"], "Campo de consulta não permitido: senha");
    // Nada foi espalhado para as outras lojas
    assert_eq!(rede.remoto.get("rede/tableRequests/B").await.unwrap(), Value::Null);
}
