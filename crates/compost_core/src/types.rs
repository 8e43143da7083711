//! Definição de tipos/structs para a telemetria do compostor.
//!
//! Uma [`Reading`] só nasce da decodificação de uma mensagem do dispositivo
//! (ver [`crate::protocol`]) e não muda depois de criada. O
//! [`HistoryPoint`] é a projeção dela que fica no histórico.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Velocidade máxima do motor de revolvimento (PWM de 8 bits).
pub const MOTOR_SPEED_MAX: u8 = 255;

/// Formato do rótulo de tempo usado no histórico.
pub const TIME_LABEL_FORMAT: &str = "%H:%M:%S";

/// Converte um valor arbitrário para a faixa `0..=MOTOR_SPEED_MAX`.
///
/// Arredonda para o inteiro mais próximo; NaN vira 0.
pub fn clamp_motor_speed(value: f64) -> u8 {
    if value.is_nan() || value <= 0.0 {
        0
    } else if value >= f64::from(MOTOR_SPEED_MAX) {
        MOTOR_SPEED_MAX
    } else {
        value.round() as u8
    }
}

// ──────────────────────────────────────────────
// Atuadores
// ──────────────────────────────────────────────

/// Estado dos atuadores confirmado pelo dispositivo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuatorState {
    /// Ventilador ligado
    pub fan_on: bool,
    /// Velocidade do motor (0–255)
    pub motor_speed: u8,
    /// Chave de segurança do motor
    pub motor_safety: bool,
}

/// Comando do operador para os atuadores.
///
/// Enviado no máximo uma vez por chamada; o núcleo nunca enfileira nem
/// reenvia.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCommand {
    pub fan: bool,
    pub motor_speed: u8,
    pub motor_safety: bool,
}

impl PendingCommand {
    pub fn new(fan: bool, motor_speed: u8, motor_safety: bool) -> Self {
        Self {
            fan,
            motor_speed,
            motor_safety,
        }
    }

    /// Comando que reproduz um estado já confirmado pelo dispositivo.
    pub fn from_state(state: ActuatorState) -> Self {
        Self::new(state.fan_on, state.motor_speed, state.motor_safety)
    }

    pub fn with_fan(self, fan: bool) -> Self {
        Self { fan, ..self }
    }

    pub fn with_motor_speed(self, motor_speed: u8) -> Self {
        Self {
            motor_speed,
            ..self
        }
    }

    pub fn with_motor_safety(self, motor_safety: bool) -> Self {
        Self {
            motor_safety,
            ..self
        }
    }
}

// ──────────────────────────────────────────────
// Leitura
// ──────────────────────────────────────────────

/// Amostra de telemetria decodificada do dispositivo.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    temperature: f64,
    humidity: f64,
    gas_level: f64,
    actuators: ActuatorState,
    captured_at: DateTime<Local>,
}

impl Reading {
    pub(crate) fn new(
        temperature: f64,
        humidity: f64,
        gas_level: f64,
        actuators: ActuatorState,
        captured_at: DateTime<Local>,
    ) -> Self {
        Self {
            temperature,
            humidity,
            gas_level,
            actuators,
            captured_at,
        }
    }

    /// Temperatura do composto (°C)
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Umidade relativa (%)
    pub fn humidity(&self) -> f64 {
        self.humidity
    }

    /// Concentração de gás (unidade bruta do sensor)
    pub fn gas_level(&self) -> f64 {
        self.gas_level
    }

    pub fn fan_on(&self) -> bool {
        self.actuators.fan_on
    }

    pub fn motor_speed(&self) -> u8 {
        self.actuators.motor_speed
    }

    pub fn motor_safety(&self) -> bool {
        self.actuators.motor_safety
    }

    /// Estado dos atuadores reportado nesta leitura.
    pub fn actuators(&self) -> ActuatorState {
        self.actuators
    }

    pub fn captured_at(&self) -> DateTime<Local> {
        self.captured_at
    }

    /// Projeção para o histórico de tendência.
    pub fn history_point(&self) -> HistoryPoint {
        HistoryPoint {
            time: self.captured_at.format(TIME_LABEL_FORMAT).to_string(),
            temperature: self.temperature,
            gas_level: self.gas_level,
            humidity: self.humidity,
        }
    }
}

// ──────────────────────────────────────────────
// Histórico
// ──────────────────────────────────────────────

/// Ponto do gráfico de tendência.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    /// Hora local `HH:MM:SS`
    pub time: String,
    #[serde(rename = "temp")]
    pub temperature: f64,
    #[serde(rename = "gas")]
    pub gas_level: f64,
    #[serde(rename = "hum")]
    pub humidity: f64,
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
