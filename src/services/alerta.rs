// src/services/alerta.rs

use serde::Serialize;
use tokio::sync::watch;
use utoipa::ToSchema;

use crate::services::eventos::{EventHub, UiEvent};

// Asset de áudio tocado pela janela durante o alerta.
pub const SOM_ALERTA: &str = "alerta-urgente.mp3";

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "estado", rename_all = "snake_case")]
pub enum EstadoAlerta {
    Inativo,
    Ativo { de: String, origem: String },
}

#[derive(Clone)]
pub struct AlertaService {
    estado: watch::Sender<EstadoAlerta>,
    eventos: EventHub,
}

impl AlertaService {
    pub fn new(eventos: EventHub) -> Self {
        let (estado, _rx) = watch::channel(EstadoAlerta::Inativo);
        Self { estado, eventos }
    }

    /// Liga o alerta. Um novo disparo substitui o anterior (sem fila).
    pub fn disparar(&self, de: &str, origem: &str) {
        tracing::info!(de, origem, "🚨 Alerta urgente");
        self.estado.send_replace(EstadoAlerta::Ativo {
            de: de.to_string(),
            origem: origem.to_string(),
        });
        self.eventos.publicar(UiEvent::AlertaUrgente {
            de: de.to_string(),
            origem: origem.to_string(),
            som: SOM_ALERTA.to_string(),
        });
    }

    pub fn parar(&self) {
        let anterior = self.estado.send_replace(EstadoAlerta::Inativo);
        if anterior != EstadoAlerta::Inativo {
            self.eventos.publicar(UiEvent::AlertaEncerrado);
        }
    }

    pub fn estado(&self) -> EstadoAlerta {
        self.estado.borrow().clone()
    }

    pub fn observar(&self) -> watch::Receiver<EstadoAlerta> {
        self.estado.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_and_stop_publish_events_once() {
        let eventos = EventHub::default();
        let mut rx = eventos.assinar();
        let alerta = AlertaService::new(eventos);

        alerta.disparar("loja2", "geral");
        assert!(matches!(alerta.estado(), EstadoAlerta::Ativo { ref de, .. } if de == "loja2"));

        alerta.parar();
        alerta.parar();
        assert_eq!(alerta.estado(), EstadoAlerta::Inativo);

        assert!(matches!(rx.try_recv(), Ok(UiEvent::AlertaUrgente { .. })));
        assert_eq!(rx.try_recv().ok(), Some(UiEvent::AlertaEncerrado));
        assert!(rx.try_recv().is_err());
    }
}
