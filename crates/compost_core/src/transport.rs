//! Interface do transporte publish/subscribe.
//!
//! A implementação concreta (cliente MQTT, política de retry/backoff) fica
//! fora do núcleo. Ela recebe chamadas pelo trait [`Transport`] e devolve
//! o que acontece no link como [`TransportEvent`]s, que o dono da sessão
//! repassa para [`crate::session::TelemetrySession::handle_transport_event`].

use crate::config::TransportConfig;
use crate::connection::ConnectionEvent;

/// Erros do transporte.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("Endereço do broker inválido: {0:?}")]
    InvalidAddress(String),

    #[error("Transporte não está aberto")]
    NotOpen,

    #[error("Erro do cliente: {0}")]
    Client(String),
}

/// Capacidades que o núcleo consome do transporte.
pub trait Transport {
    /// Abre o link e inicia o handshake. O resultado chega depois como
    /// [`TransportEvent::Acknowledged`] ou [`TransportEvent::Rejected`].
    fn connect(&mut self, config: &TransportConfig) -> Result<(), TransportError>;

    /// Fecha o link deliberadamente. Pode terminar de forma assíncrona.
    /// Deve ser idempotente: pode ser chamado sem link aberto.
    fn disconnect(&mut self);

    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError>;

    /// Publica sem garantia de entrega.
    fn publish(&mut self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError>;
}

/// O que o transporte reporta sobre o link.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Handshake aceito pelo broker
    Acknowledged,
    /// Conexão recusada durante o handshake
    Rejected(String),
    /// Handshake sem resposta
    TimedOut,
    /// Link encerrado normalmente
    Closed,
    /// Queda no meio da sessão
    Error(String),
    /// O cliente está tentando reconectar por conta própria
    AutoRetry,
    /// Mensagem recebida em um tópico assinado
    Message { topic: String, payload: Vec<u8> },
}

impl TransportEvent {
    /// Evento de ciclo de vida correspondente. `None` para mensagens.
    pub fn connection_event(&self) -> Option<ConnectionEvent> {
        match self {
            TransportEvent::Acknowledged => Some(ConnectionEvent::TransportAcknowledged),
            TransportEvent::Rejected(_) => Some(ConnectionEvent::TransportRejected),
            TransportEvent::TimedOut => Some(ConnectionEvent::Timeout),
            TransportEvent::Closed => Some(ConnectionEvent::TransportClosed),
            TransportEvent::Error(_) => Some(ConnectionEvent::TransportError),
            TransportEvent::AutoRetry => Some(ConnectionEvent::TransportAutoRetry),
            TransportEvent::Message { .. } => None,
        }
    }
}
