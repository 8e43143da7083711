//! Máquina de estados da conexão com o broker.
//!
//! ```text
//! ┌────────────────────────┬───────────────────────┬────────────┬───────────────┐
//! │ De                     │ Evento                │ Para       │ Efeito        │
//! ├────────────────────────┼───────────────────────┼────────────┼───────────────┤
//! │ Idle, Failed           │ ConnectRequested      │ Connecting │ abre link     │
//! │ Connecting             │ TransportAcknowledged │ Live       │ assina tópico │
//! │ Connecting             │ Rejected / Timeout    │ Failed     │ –             │
//! │ Live                   │ TransportClosed       │ Idle       │ –             │
//! │ Live                   │ TransportError        │ Failed     │ –             │
//! │ Idle, Connecting, Fail │ TransportAutoRetry    │ Connecting │ – (cliente)   │
//! │ qualquer               │ DisconnectRequested   │ Idle       │ fecha link    │
//! └────────────────────────┴───────────────────────┴────────────┴───────────────┘
//! ```
//!
//! O retry automático é reaberto pelo próprio cliente MQTT; a máquina só
//! acompanha. Em Idle o cliente pode continuar vivo (o broker fechou o
//! link), por isso o disconnect fecha o transporte em qualquer estado.
//!
//! Comandos só passam com o estado em [`ConnectionState::Live`].
//! Eventos sem transição definida para o estado atual são ignorados.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// Estado do link com o broker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionState {
    #[default]
    Idle,
    Connecting,
    Live,
    Failed,
}

impl ConnectionState {
    /// Controles de atuador só ficam habilitados com o link ativo.
    pub fn controls_enabled(self) -> bool {
        self == ConnectionState::Live
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionState::Idle => "desconectado",
            ConnectionState::Connecting => "conectando",
            ConnectionState::Live => "conectado",
            ConnectionState::Failed => "falha",
        };
        f.write_str(label)
    }
}

/// Eventos que movem a máquina.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionEvent {
    ConnectRequested,
    TransportAcknowledged,
    TransportRejected,
    Timeout,
    TransportClosed,
    TransportError,
    TransportAutoRetry,
    DisconnectRequested,
}

/// Ação que o dono da máquina deve executar após a transição.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideEffect {
    None,
    /// Abrir o transporte e iniciar o handshake
    OpenTransport,
    /// Assinar o tópico de leituras
    Subscribe,
    /// Fechar o transporte deliberadamente
    CloseTransport,
}

/// Resultado de um evento aceito.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: ConnectionState,
    pub to: ConnectionState,
    pub event: ConnectionEvent,
    pub effect: SideEffect,
}

impl Transition {
    /// `false` para transições que não mudam o estado (ex.: retry durante Connecting).
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// Tabela de transições. `None` = evento ignorado no estado atual.
fn next(state: ConnectionState, event: ConnectionEvent) -> Option<(ConnectionState, SideEffect)> {
    use ConnectionEvent as E;
    use ConnectionState as S;

    match (state, event) {
        (S::Idle | S::Failed, E::ConnectRequested) => Some((S::Connecting, SideEffect::OpenTransport)),
        (S::Connecting, E::TransportAcknowledged) => Some((S::Live, SideEffect::Subscribe)),
        (S::Connecting, E::TransportRejected | E::Timeout) => Some((S::Failed, SideEffect::None)),
        (S::Live, E::TransportClosed) => Some((S::Idle, SideEffect::None)),
        (S::Live, E::TransportError) => Some((S::Failed, SideEffect::None)),
        // Reabertura feita pelo cliente (backoff próprio), nada a executar
        (S::Failed | S::Idle | S::Connecting, E::TransportAutoRetry) => {
            Some((S::Connecting, SideEffect::None))
        }
        (_, E::DisconnectRequested) => Some((S::Idle, SideEffect::CloseTransport)),
        _ => None,
    }
}

/// Máquina de estados da conexão. Uma instância por sessão.
#[derive(Debug, Default)]
pub struct ConnectionMachine {
    state: ConnectionState,
}

impl ConnectionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_live(&self) -> bool {
        self.state == ConnectionState::Live
    }

    /// Aplica um evento. Retorna a transição, ou `None` se foi ignorado.
    pub fn handle(&mut self, event: ConnectionEvent) -> Option<Transition> {
        let Some((to, effect)) = next(self.state, event) else {
            debug!("Evento {event:?} ignorado no estado {:?}", self.state);
            return None;
        };

        let transition = Transition {
            from: self.state,
            to,
            event,
            effect,
        };
        self.state = to;

        if transition.changed() {
            info!("Conexão: {:?} → {:?} ({event:?})", transition.from, to);
        }
        Some(transition)
    }

    /// Porta de saída de comandos: `Err` com o estado atual se não estiver Live.
    pub fn gate(&self) -> Result<(), ConnectionState> {
        if self.is_live() {
            Ok(())
        } else {
            Err(self.state)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::{ConnectionEvent as E, ConnectionState as S};

    const ALL_STATES: [S; 4] = [S::Idle, S::Connecting, S::Live, S::Failed];

    fn machine_in(state: S) -> ConnectionMachine {
        ConnectionMachine { state }
    }

    #[test]
    fn starts_idle_and_gated() {
        let m = ConnectionMachine::new();
        assert_eq!(m.state(), S::Idle);
        assert_eq!(m.gate(), Err(S::Idle));
    }

    #[test]
    fn happy_path_connect() {
        let mut m = ConnectionMachine::new();
        let t = m.handle(E::ConnectRequested).unwrap();
        assert_eq!(t.effect, SideEffect::OpenTransport);
        assert_eq!(m.state(), S::Connecting);

        let t = m.handle(E::TransportAcknowledged).unwrap();
        assert_eq!(t.effect, SideEffect::Subscribe);
        assert_eq!(m.state(), S::Live);
        assert!(m.gate().is_ok());
    }

    #[test]
    fn closed_from_live_goes_idle_not_failed() {
        let mut m = machine_in(S::Live);
        m.handle(E::TransportClosed);
        assert_eq!(m.state(), S::Idle);
    }

    #[test]
    fn error_from_live_goes_failed() {
        let mut m = machine_in(S::Live);
        m.handle(E::TransportError);
        assert_eq!(m.state(), S::Failed);
    }

    #[test]
    fn rejection_and_timeout_while_connecting_fail() {
        for event in [E::TransportRejected, E::Timeout] {
            let mut m = machine_in(S::Connecting);
            m.handle(event);
            assert_eq!(m.state(), S::Failed);
        }
    }

    #[test]
    fn auto_retry_reconnects_from_non_live_states() {
        for state in [S::Failed, S::Idle, S::Connecting] {
            let mut m = machine_in(state);
            let t = m.handle(E::TransportAutoRetry).unwrap();
            assert_eq!(t.to, S::Connecting);
            assert_eq!(t.effect, SideEffect::None);
        }
        assert!(machine_in(S::Live).handle(E::TransportAutoRetry).is_none());
    }

    #[test]
    fn disconnect_always_ends_idle() {
        for state in ALL_STATES {
            let mut m = machine_in(state);
            let t = m.handle(E::DisconnectRequested).unwrap();
            assert_eq!(m.state(), S::Idle);
            assert_eq!(t.effect, SideEffect::CloseTransport);
            assert_eq!(t.changed(), state != S::Idle);
        }
    }

    #[test]
    fn undefined_events_leave_state_untouched() {
        let mut m = machine_in(S::Idle);
        assert!(m.handle(E::TransportAcknowledged).is_none());
        assert!(m.handle(E::TransportClosed).is_none());
        assert_eq!(m.state(), S::Idle);

        let mut live = machine_in(S::Live);
        assert!(live.handle(E::ConnectRequested).is_none());
        assert_eq!(live.state(), S::Live);
    }

    #[test]
    fn only_live_enables_controls() {
        for state in ALL_STATES {
            assert_eq!(state.controls_enabled(), state == S::Live);
        }
    }
}
