//! Sessão de telemetria – junta conexão, histórico e alertas.
//!
//! Fluxo de entrada:
//!
//! ```text
//! transporte ─▶ decode ─▶ última leitura ─▶ histórico ─▶ alertas ─▶ observers
//! ```
//!
//! Fluxo de saída: `send_command` ─▶ gate da conexão ─▶ transporte.
//!
//! A sessão não é thread-safe: eventos de entrada e comandos devem ser
//! serializados por quem a possui.

use crate::alerts::{AlertCondition, evaluate};
use crate::config::{AppConfig, ThresholdConfig, ThresholdUpdate, TransportConfig};
use crate::connection::{ConnectionEvent, ConnectionMachine, ConnectionState, SideEffect};
use crate::history::HistoryBuffer;
use crate::protocol::{ProtocolError, decode_reading, encode_command};
use crate::transport::{Transport, TransportError, TransportEvent};
use crate::types::{ActuatorState, HistoryPoint, PendingCommand, Reading};
use chrono::{DateTime, Local};
use crossbeam_channel::Sender;
use tracing::{debug, info, warn};

/// Motivos de um comando não ter sido publicado.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Esperado fora do estado Live; o chamador pode tentar após reconectar.
    #[error("Comando rejeitado: não conectado (estado: {0})")]
    NotConnected(ConnectionState),

    #[error("Falha ao codificar comando: {0}")]
    Encode(#[from] ProtocolError),

    #[error("Falha ao publicar comando: {0}")]
    Transport(#[from] TransportError),
}

impl CommandError {
    pub fn is_not_connected(&self) -> bool {
        matches!(self, CommandError::NotConnected(_))
    }
}

/// Eventos emitidos para os observers.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Nova leitura aceita e avaliada. `conditions` vazio = tudo nominal.
    ReadingEvaluated {
        reading: Reading,
        conditions: Vec<AlertCondition>,
    },
    StateChanged {
        from: ConnectionState,
        to: ConnectionState,
    },
    /// Mensagem descartada por payload inválido.
    DecodeFailed { error: String },
}

/// Recebe os eventos da sessão.
pub trait SessionObserver {
    fn notify(&mut self, event: &SessionEvent);
}

impl SessionObserver for Sender<SessionEvent> {
    fn notify(&mut self, event: &SessionEvent) {
        // Non-blocking: se o consumidor está lento, descarta
        if self.try_send(event.clone()).is_err() {
            debug!("Channel de eventos cheio, descartando {event:?}");
        }
    }
}

/// Sessão de telemetria sobre um transporte `T`.
pub struct TelemetrySession<T: Transport> {
    transport: T,
    transport_config: TransportConfig,
    thresholds: ThresholdConfig,
    connection: ConnectionMachine,
    history: HistoryBuffer,
    latest: Option<Reading>,
    intended: Option<PendingCommand>,
    /// `true` se o último dado de atuador foi o comando enviado, `false`
    /// se foi uma leitura do dispositivo.
    intended_is_newer: bool,
    /// Cliente aberto por `connect` e ainda não fechado por `disconnect`.
    link_open: bool,
    observers: Vec<Box<dyn SessionObserver>>,
}

impl<T: Transport> TelemetrySession<T> {
    /// Cria a sessão com cópias explícitas da configuração.
    pub fn new(transport: T, config: &AppConfig) -> Self {
        Self {
            transport,
            transport_config: config.transport.clone(),
            thresholds: config.thresholds.clone(),
            connection: ConnectionMachine::new(),
            history: HistoryBuffer::new(config.history.capacity),
            latest: None,
            intended: None,
            intended_is_newer: false,
            link_open: false,
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: impl SessionObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    // ──────────────────────────────────────────────
    // Conexão
    // ──────────────────────────────────────────────

    /// Solicita conexão. Retorna o estado resultante.
    pub fn connect(&mut self) -> ConnectionState {
        self.drive(ConnectionEvent::ConnectRequested);
        self.state()
    }

    /// Solicita desconexão. Vale imediatamente: mensagens que ainda
    /// chegarem serão descartadas.
    pub fn disconnect(&mut self) -> ConnectionState {
        self.drive(ConnectionEvent::DisconnectRequested);
        self.state()
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Ponto de entrada para tudo que o transporte reporta.
    ///
    /// Eventos que chegam com o link fechado vêm de um cliente já
    /// encerrado e são descartados.
    pub fn handle_transport_event(&mut self, event: TransportEvent) {
        if !self.link_open {
            debug!("Evento {event:?} descartado: transporte fechado");
            return;
        }

        match event {
            TransportEvent::Message { topic, payload } => {
                debug!("Mensagem em {topic} ({} bytes)", payload.len());
                self.on_inbound_message(&payload);
            }
            TransportEvent::Rejected(ref reason) | TransportEvent::Error(ref reason) => {
                warn!("Transporte: {reason}");
                if let Some(ev) = event.connection_event() {
                    self.drive(ev);
                }
            }
            other => {
                if let Some(ev) = other.connection_event() {
                    self.drive(ev);
                }
            }
        }
    }

    fn drive(&mut self, event: ConnectionEvent) {
        let Some(transition) = self.connection.handle(event) else {
            return;
        };

        if transition.changed() {
            self.emit(&SessionEvent::StateChanged {
                from: transition.from,
                to: transition.to,
            });
        }

        match transition.effect {
            SideEffect::None => {}
            SideEffect::OpenTransport => {
                let cfg = &self.transport_config;
                info!("Conectando a {}:{}", cfg.broker_address, cfg.port);
                match self.transport.connect(cfg) {
                    Ok(()) => self.link_open = true,
                    Err(e) => {
                        warn!("Falha ao abrir transporte: {e}");
                        self.link_open = false;
                        self.drive(ConnectionEvent::TransportRejected);
                    }
                }
            }
            SideEffect::Subscribe => {
                let topic = self.transport_config.subscribe_topic.clone();
                match self.transport.subscribe(&topic) {
                    Ok(()) => info!("Assinado: {topic}"),
                    Err(e) => {
                        warn!("Falha ao assinar {topic}: {e}");
                        self.drive(ConnectionEvent::TransportError);
                    }
                }
            }
            SideEffect::CloseTransport => {
                self.transport.disconnect();
                self.link_open = false;
            }
        }
    }

    // ──────────────────────────────────────────────
    // Entrada
    // ──────────────────────────────────────────────

    /// Processa uma mensagem bruta do dispositivo.
    pub fn on_inbound_message(&mut self, raw: &[u8]) {
        self.on_inbound_message_at(raw, Local::now());
    }

    /// Como [`Self::on_inbound_message`], com o instante de chegada explícito.
    pub fn on_inbound_message_at(&mut self, raw: &[u8], captured_at: DateTime<Local>) {
        if !self.connection.is_live() {
            debug!("Mensagem descartada: estado {:?}", self.state());
            return;
        }

        let reading = match decode_reading(raw, captured_at) {
            Ok(reading) => reading,
            Err(e) => {
                warn!("Payload inválido: {e}");
                self.emit(&SessionEvent::DecodeFailed {
                    error: e.to_string(),
                });
                return;
            }
        };

        self.history.append(&reading);
        let conditions = evaluate(&reading, &self.thresholds);
        self.latest = Some(reading.clone());
        self.intended_is_newer = false;

        self.emit(&SessionEvent::ReadingEvaluated {
            reading,
            conditions,
        });
    }

    // ──────────────────────────────────────────────
    // Saída
    // ──────────────────────────────────────────────

    /// Publica um comando se o link estiver Live. Não enfileira nem reenvia.
    pub fn send_command(&mut self, command: PendingCommand) -> Result<(), CommandError> {
        if let Err(state) = self.connection.gate() {
            warn!("Comando rejeitado (estado: {state})");
            return Err(CommandError::NotConnected(state));
        }

        let payload = encode_command(&command)?;
        self.transport
            .publish(&self.transport_config.publish_topic, payload)?;

        info!(
            "→ comando: fan={} motor={} sw={}",
            command.fan, command.motor_speed, command.motor_safety
        );
        self.intended = Some(command);
        self.intended_is_newer = true;
        Ok(())
    }

    // ──────────────────────────────────────────────
    // Consulta
    // ──────────────────────────────────────────────

    pub fn latest_reading(&self) -> Option<&Reading> {
        self.latest.as_ref()
    }

    /// Estado dos atuadores segundo a última leitura do dispositivo.
    pub fn confirmed_state(&self) -> Option<ActuatorState> {
        self.latest.as_ref().map(Reading::actuators)
    }

    /// Último comando efetivamente publicado.
    pub fn intended_command(&self) -> Option<PendingCommand> {
        self.intended
    }

    /// Base para o próximo comando: o dado de atuador mais recente, seja o
    /// último comando enviado ou o estado reportado pelo dispositivo.
    pub fn command_base(&self) -> PendingCommand {
        match (&self.latest, self.intended) {
            (_, Some(command)) if self.intended_is_newer => command,
            (Some(reading), _) => PendingCommand::from_state(reading.actuators()),
            (None, Some(command)) => command,
            (None, None) => PendingCommand::default(),
        }
    }

    /// Alertas da última leitura contra os thresholds atuais.
    pub fn current_conditions(&self) -> Vec<AlertCondition> {
        self.latest
            .as_ref()
            .map(|r| evaluate(r, &self.thresholds))
            .unwrap_or_default()
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn history_snapshot(&self) -> Vec<HistoryPoint> {
        self.history.snapshot()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        info!("Histórico limpo");
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // ──────────────────────────────────────────────
    // Configuração
    // ──────────────────────────────────────────────

    pub fn thresholds(&self) -> &ThresholdConfig {
        &self.thresholds
    }

    pub fn update_thresholds(&mut self, thresholds: ThresholdConfig) {
        info!("Thresholds atualizados: {thresholds:?}");
        self.thresholds = thresholds;
    }

    pub fn apply_threshold_update(&mut self, update: &ThresholdUpdate) {
        let mut thresholds = self.thresholds.clone();
        thresholds.apply(update);
        self.update_thresholds(thresholds);
    }

    pub fn transport_config(&self) -> &TransportConfig {
        &self.transport_config
    }

    /// Vale a partir da próxima conexão.
    pub fn update_transport_config(&mut self, config: TransportConfig) {
        info!(
            "Transporte atualizado: {}:{} (aplica na próxima conexão)",
            config.broker_address, config.port
        );
        self.transport_config = config;
    }

    fn emit(&mut self, event: &SessionEvent) {
        for observer in &mut self.observers {
            observer.notify(event);
        }
    }
}
