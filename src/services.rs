// src/services.rs

pub mod alerta;
pub mod busca_service;
pub mod chat_service;
pub mod eventos;
pub mod peer_client;
pub mod presenca_service;
pub mod produto_service;
pub mod remote_request;
pub mod sessao;
pub mod transfer_service;
