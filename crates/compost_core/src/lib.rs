//! # Compost Core
//!
//! Núcleo do monitor de compostagem: decodifica a telemetria do
//! dispositivo, avalia thresholds de segurança, mantém o histórico da
//! sessão e controla quando comandos podem ser enviados.
//!
//! ## Módulos
//! - [`types`] – Leitura, ponto de histórico, comandos de atuador
//! - [`protocol`] – Decode/encode JSON do dispositivo
//! - [`config`] – Configuração unificada via TOML
//! - [`alerts`] – Avaliação de thresholds e status por sensor
//! - [`history`] – Histórico limitado (FIFO)
//! - [`connection`] – Máquina de estados do link
//! - [`transport`] – Interface do transporte publish/subscribe
//! - [`session`] – Orquestração de tudo acima

pub mod types;
pub mod protocol;
pub mod config;
pub mod alerts;
pub mod history;
pub mod connection;
pub mod transport;
pub mod session;

// Re-exports convenientes
pub use types::{ActuatorState, HistoryPoint, PendingCommand, Reading};
pub use alerts::{AlertCondition, Metric, Severity, evaluate};
pub use config::{AppConfig, ThresholdConfig, TransportConfig};
pub use connection::ConnectionState;
pub use session::{CommandError, SessionEvent, SessionObserver, TelemetrySession};
pub use transport::{Transport, TransportError, TransportEvent};
