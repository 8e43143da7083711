//! Sistema de alertas – severidades e avaliação de thresholds.
//!
//! Ordem de avaliação fixa: risco combinado (curto-circuito), depois
//! temperatura, gás e umidade. A saída sai sempre nessa ordem.

use crate::config::ThresholdConfig;
use crate::types::Reading;
use serde::{Deserialize, Serialize};

/// Limite físico de temperatura (°C), independente do `temp_max` configurado.
pub const TEMP_CRITICAL_LINE: f64 = 65.0;

/// Limite físico de gás, independente do `gas_max` configurado.
pub const GAS_CRITICAL_LINE: f64 = 60.0;

/// Linha de aviso do card de temperatura (°C). Fixa, não segue `temp_max`.
pub const TEMP_CARD_WARNING_LINE: f64 = 45.0;

/// Linha de aviso do card de gás. Fixa, não segue `gas_max`.
pub const GAS_CARD_WARNING_LINE: f64 = 30.0;

/// Severidade de um alerta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Danger,
    Critical,
}

/// Grandeza que disparou o alerta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    Temperature,
    Gas,
    Humidity,
    /// Gás e temperatura acima das linhas críticas ao mesmo tempo
    Combined,
}

/// Uma condição de alerta. Recalculada a cada leitura, nunca armazenada.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertCondition {
    pub severity: Severity,
    pub metric: Metric,
    pub message: String,
}

impl AlertCondition {
    fn new(severity: Severity, metric: Metric, message: String) -> Self {
        Self {
            severity,
            metric,
            message,
        }
    }
}

/// Avalia uma leitura contra os thresholds e retorna os alertas em ordem.
///
/// Lista vazia = leitura totalmente nominal.
pub fn evaluate(reading: &Reading, thresholds: &ThresholdConfig) -> Vec<AlertCondition> {
    let temp = reading.temperature();
    let gas = reading.gas_level();
    let hum = reading.humidity();

    // Risco combinado substitui os alertas individuais
    if gas > GAS_CRITICAL_LINE && temp > TEMP_CRITICAL_LINE {
        return vec![AlertCondition::new(
            Severity::Critical,
            Metric::Combined,
            format!(
                "Risco combinado: {temp:.1}°C e gás {gas:.0} acima das linhas críticas ({TEMP_CRITICAL_LINE}°C / {GAS_CRITICAL_LINE})"
            ),
        )];
    }

    let mut alerts = Vec::new();

    // Temperatura
    if temp > TEMP_CRITICAL_LINE {
        alerts.push(AlertCondition::new(
            Severity::Danger,
            Metric::Temperature,
            format!("Temperatura {temp:.1}°C acima da linha crítica {TEMP_CRITICAL_LINE}°C"),
        ));
    } else if temp > thresholds.temp_max {
        alerts.push(AlertCondition::new(
            Severity::Warning,
            Metric::Temperature,
            format!("Temperatura {temp:.1}°C acima do limite {}°C", thresholds.temp_max),
        ));
    }

    // Gás
    if gas > GAS_CRITICAL_LINE {
        alerts.push(AlertCondition::new(
            Severity::Danger,
            Metric::Gas,
            format!("Gás {gas:.0} acima da linha crítica {GAS_CRITICAL_LINE}"),
        ));
    } else if gas > thresholds.gas_max {
        alerts.push(AlertCondition::new(
            Severity::Warning,
            Metric::Gas,
            format!("Gás {gas:.0} acima do limite {}", thresholds.gas_max),
        ));
    }

    // Umidade
    if hum < thresholds.hum_min {
        alerts.push(AlertCondition::new(
            Severity::Warning,
            Metric::Humidity,
            format!("Umidade baixa: {hum:.1}% abaixo de {}%", thresholds.hum_min),
        ));
    } else if hum > thresholds.hum_max {
        alerts.push(AlertCondition::new(
            Severity::Warning,
            Metric::Humidity,
            format!("Umidade alta: {hum:.1}% acima de {}%", thresholds.hum_max),
        ));
    }

    alerts
}

// ──────────────────────────────────────────────
// Status por sensor (cards do painel)
// ──────────────────────────────────────────────

/// Classificação de um único sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SensorStatus {
    /// Nenhuma leitura recebida ainda
    Inactive,
    Safe,
    Warning,
    Danger,
}

/// Retorna o [`SensorStatus`] de uma grandeza da leitura mais recente.
///
/// Temperatura e gás usam as linhas fixas dos cards; só a umidade segue
/// a faixa configurada.
pub fn sensor_status(
    metric: Metric,
    reading: Option<&Reading>,
    thresholds: &ThresholdConfig,
) -> SensorStatus {
    let Some(r) = reading else {
        return SensorStatus::Inactive;
    };

    match metric {
        Metric::Temperature => {
            level_for_value(r.temperature(), TEMP_CARD_WARNING_LINE, TEMP_CRITICAL_LINE)
        }
        Metric::Gas => level_for_value(r.gas_level(), GAS_CARD_WARNING_LINE, GAS_CRITICAL_LINE),
        Metric::Humidity => {
            if r.humidity() < thresholds.hum_min || r.humidity() > thresholds.hum_max {
                SensorStatus::Warning
            } else {
                SensorStatus::Safe
            }
        }
        Metric::Combined => {
            if r.gas_level() > GAS_CRITICAL_LINE && r.temperature() > TEMP_CRITICAL_LINE {
                SensorStatus::Danger
            } else {
                SensorStatus::Safe
            }
        }
    }
}

fn level_for_value(value: f64, warn: f64, crit: f64) -> SensorStatus {
    if value > crit {
        SensorStatus::Danger
    } else if value > warn {
        SensorStatus::Warning
    } else {
        SensorStatus::Safe
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ActuatorState;
    use chrono::Local;

    fn reading(temp: f64, hum: f64, gas: f64) -> Reading {
        Reading::new(temp, hum, gas, ActuatorState::default(), Local::now())
    }

    fn kinds(alerts: &[AlertCondition]) -> Vec<(Severity, Metric)> {
        alerts.iter().map(|a| (a.severity, a.metric)).collect()
    }

    #[test]
    fn combined_hazard_suppresses_single_alerts() {
        let alerts = evaluate(&reading(80.0, 10.0, 90.0), &ThresholdConfig::default());
        assert_eq!(kinds(&alerts), vec![(Severity::Critical, Metric::Combined)]);
    }

    #[test]
    fn hot_reading_only_raises_temperature_danger() {
        let alerts = evaluate(&reading(70.0, 50.0, 20.0), &ThresholdConfig::default());
        assert_eq!(kinds(&alerts), vec![(Severity::Danger, Metric::Temperature)]);
    }

    #[test]
    fn configured_limits_raise_warnings() {
        let alerts = evaluate(&reading(50.0, 50.0, 40.0), &ThresholdConfig::caution());
        assert_eq!(
            kinds(&alerts),
            vec![
                (Severity::Warning, Metric::Temperature),
                (Severity::Warning, Metric::Gas),
            ]
        );
    }

    #[test]
    fn output_order_is_temperature_gas_humidity() {
        let alerts = evaluate(&reading(66.0, 95.0, 45.0), &ThresholdConfig::caution());
        assert_eq!(
            kinds(&alerts),
            vec![
                (Severity::Danger, Metric::Temperature),
                (Severity::Warning, Metric::Gas),
                (Severity::Warning, Metric::Humidity),
            ]
        );
        assert!(alerts[2].message.contains("alta"));
    }

    #[test]
    fn low_humidity_warning() {
        let alerts = evaluate(&reading(30.0, 30.0, 10.0), &ThresholdConfig::default());
        assert_eq!(kinds(&alerts), vec![(Severity::Warning, Metric::Humidity)]);
        assert!(alerts[0].message.contains("baixa"));
    }

    #[test]
    fn values_on_the_line_do_not_fire() {
        let alerts = evaluate(&reading(65.0, 80.0, 60.0), &ThresholdConfig::default());
        assert!(alerts.is_empty());
    }

    #[test]
    fn inverted_humidity_range_is_not_corrected() {
        // hum_min > hum_max: avaliado como veio, "baixa" tem precedência
        let thresholds = ThresholdConfig {
            hum_min: 80.0,
            hum_max: 40.0,
            ..ThresholdConfig::default()
        };
        let alerts = evaluate(&reading(30.0, 60.0, 10.0), &thresholds);
        assert_eq!(kinds(&alerts), vec![(Severity::Warning, Metric::Humidity)]);
        assert!(alerts[0].message.contains("baixa"));
    }

    #[test]
    fn sensor_status_levels() {
        let th = ThresholdConfig::caution();
        assert_eq!(sensor_status(Metric::Gas, None, &th), SensorStatus::Inactive);

        let r = reading(50.0, 85.0, 10.0);
        assert_eq!(sensor_status(Metric::Temperature, Some(&r), &th), SensorStatus::Warning);
        assert_eq!(sensor_status(Metric::Gas, Some(&r), &th), SensorStatus::Safe);
        assert_eq!(sensor_status(Metric::Humidity, Some(&r), &th), SensorStatus::Warning);

        let hazard = reading(70.0, 50.0, 61.0);
        assert_eq!(sensor_status(Metric::Combined, Some(&hazard), &th), SensorStatus::Danger);
        assert_eq!(sensor_status(Metric::Temperature, Some(&hazard), &th), SensorStatus::Danger);
    }

    #[test]
    fn card_warning_lines_ignore_configured_maxima() {
        let th = ThresholdConfig::default();
        let r = reading(50.0, 55.0, 45.0);
        assert_eq!(sensor_status(Metric::Temperature, Some(&r), &th), SensorStatus::Warning);
        assert_eq!(sensor_status(Metric::Gas, Some(&r), &th), SensorStatus::Warning);
        // Mesma leitura não gera alerta com os thresholds padrão
        assert!(evaluate(&r, &th).is_empty());

        let calm = reading(45.0, 55.0, 30.0);
        assert_eq!(sensor_status(Metric::Temperature, Some(&calm), &th), SensorStatus::Safe);
        assert_eq!(sensor_status(Metric::Gas, Some(&calm), &th), SensorStatus::Safe);

        let loose = ThresholdConfig {
            temp_max: 90.0,
            gas_max: 90.0,
            ..ThresholdConfig::default()
        };
        assert_eq!(sensor_status(Metric::Gas, Some(&r), &loose), SensorStatus::Warning);
    }
}
