//! Protocolo JSON entre o painel e o dispositivo.
//!
//! Mensagem de entrada (tópico de dados):
//!
//! ```text
//! { "temp": 32.5, "hum": 60.0, "gas": 450, "fan": 1,
//!   "motor_speed": 100, "motor_sw": true }
//! ```
//!
//! - `temp`, `hum`, `gas` e `fan` são obrigatórios e numéricos
//! - `motor_speed` tem prioridade sobre o legado `motor`; sem nenhum dos dois, 0
//! - `motor_sw` aceita booleano ou número (≠ 0 = ligado); ausente = desligado
//!
//! Comando de saída (tópico de controle):
//!
//! ```text
//! { "fan": 0|1, "motor_speed": 0..255, "motor_sw": bool }
//! ```

use crate::types::{ActuatorState, PendingCommand, Reading, clamp_motor_speed};
use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::{Map, Value};

/// Erros do protocolo.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("JSON inválido: {0}")]
    InvalidJson(String),

    #[error("Payload não é um objeto JSON")]
    NotAnObject,

    #[error("Campo obrigatório ausente: {0}")]
    MissingField(&'static str),

    #[error("Campo não numérico: {0}")]
    NotNumeric(&'static str),

    #[error("Campo não booleano: {0}")]
    NotBoolean(&'static str),

    #[error("Erro de serialização: {0}")]
    Serialize(String),
}

/// Comando no formato do firmware.
#[derive(Debug, Serialize)]
struct OutboundCommand {
    fan: u8,
    motor_speed: u8,
    motor_sw: bool,
}

/// Decodifica uma mensagem do dispositivo em [`Reading`].
///
/// `captured_at` é o instante de chegada; o firmware não envia timestamp.
pub fn decode_reading(data: &[u8], captured_at: DateTime<Local>) -> Result<Reading, ProtocolError> {
    let value: Value =
        serde_json::from_slice(data).map_err(|e| ProtocolError::InvalidJson(e.to_string()))?;
    let Value::Object(fields) = value else {
        return Err(ProtocolError::NotAnObject);
    };

    let temperature = required_number(&fields, "temp")?;
    let humidity = required_number(&fields, "hum")?;
    let gas_level = required_number(&fields, "gas")?;
    let fan_on = required_number(&fields, "fan")? != 0.0;

    // Firmware novo manda `motor_speed`, o antigo `motor`
    let motor_speed = match optional_number(&fields, "motor_speed")? {
        Some(speed) => speed,
        None => optional_number(&fields, "motor")?.unwrap_or(0.0),
    };
    let motor_safety = optional_flag(&fields, "motor_sw")?.unwrap_or(false);

    Ok(Reading::new(
        temperature,
        humidity,
        gas_level,
        ActuatorState {
            fan_on,
            motor_speed: clamp_motor_speed(motor_speed),
            motor_safety,
        },
        captured_at,
    ))
}

/// Codifica um comando para publicação no tópico de controle.
pub fn encode_command(command: &PendingCommand) -> Result<Vec<u8>, ProtocolError> {
    let wire = OutboundCommand {
        fan: u8::from(command.fan),
        motor_speed: command.motor_speed,
        motor_sw: command.motor_safety,
    };
    serde_json::to_vec(&wire).map_err(|e| ProtocolError::Serialize(e.to_string()))
}

fn required_number(fields: &Map<String, Value>, key: &'static str) -> Result<f64, ProtocolError> {
    optional_number(fields, key)?.ok_or(ProtocolError::MissingField(key))
}

fn optional_number(
    fields: &Map<String, Value>,
    key: &'static str,
) -> Result<Option<f64>, ProtocolError> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_f64()
            .map(Some)
            .ok_or(ProtocolError::NotNumeric(key)),
    }
}

fn optional_flag(
    fields: &Map<String, Value>,
    key: &'static str,
) -> Result<Option<bool>, ProtocolError> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(flag)) => Ok(Some(*flag)),
        Some(Value::Number(n)) => Ok(Some(n.as_f64().is_some_and(|v| v != 0.0))),
        Some(_) => Err(ProtocolError::NotBoolean(key)),
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
