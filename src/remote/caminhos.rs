// src/remote/caminhos.rs

// Coleções do banco remoto.
pub const STATUS: &str = "status";
pub const LOJAS: &str = "stores";
pub const MENSAGENS: &str = "messages";
pub const NOTIFICACOES_URGENTES: &str = "unreadUrgentNotifications";

// Caracteres que o Firebase não aceita em chaves.
const PROIBIDOS_EM_CHAVE: [char; 6] = ['/', '.', '#', '$', '[', ']'];

/// Uma chave vira exatamente um segmento de caminho: não vazia, sem
/// separador nem caracteres reservados.
pub fn chave_valida(chave: &str) -> bool {
    !chave.is_empty()
        && !chave
            .chars()
            .any(|c| PROIBIDOS_EM_CHAVE.contains(&c) || c.is_control())
}

/// Monta caminhos dentro do namespace desta instalação.
#[derive(Debug, Clone)]
pub struct Caminhos {
    namespace: String,
}

impl Caminhos {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self { namespace: namespace.into().trim_matches('/').to_string() }
    }

    pub fn no(&self, partes: &[&str]) -> String {
        let mut caminho = self.namespace.clone();
        for parte in partes {
            let parte = parte.trim_matches('/');
            if parte.is_empty() {
                continue;
            }
            if !caminho.is_empty() {
                caminho.push('/');
            }
            caminho.push_str(parte);
        }
        caminho
    }

    pub fn status(&self, loja: &str) -> String {
        self.no(&[STATUS, loja])
    }

    pub fn loja(&self, loja: &str) -> String {
        self.no(&[LOJAS, loja])
    }

    pub fn notificacao(&self, usuario: &str, chat_id: &str) -> String {
        self.no(&[NOTIFICACOES_URGENTES, usuario, chat_id])
    }

    pub fn mensagem(&self, chat_id: &str, id: &str) -> String {
        self.no(&[MENSAGENS, chat_id, id])
    }
}
