//! Console do operador: lê comandos do stdin e reporta eventos da sessão.
//!
//! ## Comandos
//! - `connect` / `disconnect`
//! - `fan on|off`, `motor <0-255>`, `safety on|off`
//! - `status`, `history`, `clear`
//! - `set <temp_max|gas_max|hum_min|hum_max> <valor>`
//! - `help`, `quit`

use compost_core::alerts::{Metric, SensorStatus, Severity, sensor_status};
use compost_core::config::ThresholdUpdate;
use compost_core::session::{SessionEvent, TelemetrySession};
use compost_core::transport::Transport;
use compost_core::types::{PendingCommand, clamp_motor_speed};
use crossbeam_channel::{Receiver, unbounded};
use std::io::BufRead;
use tracing::{debug, error, info, warn};

const HELP: &str = "\
connect | disconnect
fan on|off | motor <0-255> | safety on|off
status | history | clear
set <temp_max|gas_max|hum_min|hum_max> <valor>
help | quit";

/// Comando digitado pelo operador.
#[derive(Debug, Clone, PartialEq)]
pub enum OperatorCommand {
    Connect,
    Disconnect,
    Fan(bool),
    Motor(u8),
    Safety(bool),
    Status,
    History,
    Clear,
    SetThreshold(ThresholdUpdate),
    Help,
    Quit,
}

/// Se o loop principal deve continuar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Inicia a thread que lê linhas do stdin. O channel fecha no EOF.
pub fn spawn_stdin_thread() -> std::io::Result<Receiver<String>> {
    let (tx, rx) = unbounded::<String>();

    std::thread::Builder::new()
        .name("stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Erro ao ler stdin: {e}");
                        break;
                    }
                }
            }
        })?;

    Ok(rx)
}

/// Interpreta uma linha digitada.
pub fn parse(line: &str) -> Result<OperatorCommand, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let command = match words.as_slice() {
        ["connect"] => OperatorCommand::Connect,
        ["disconnect"] => OperatorCommand::Disconnect,
        ["fan", state] => OperatorCommand::Fan(parse_switch(state)?),
        ["safety", state] => OperatorCommand::Safety(parse_switch(state)?),
        ["motor", speed] => {
            let speed: f64 = speed
                .parse()
                .map_err(|_| format!("Velocidade inválida: {speed}"))?;
            OperatorCommand::Motor(clamp_motor_speed(speed))
        }
        ["status"] => OperatorCommand::Status,
        ["history"] => OperatorCommand::History,
        ["clear"] => OperatorCommand::Clear,
        ["set", field, value] => OperatorCommand::SetThreshold(parse_threshold(field, value)?),
        ["help" | "?"] => OperatorCommand::Help,
        ["quit" | "exit" | "q"] => OperatorCommand::Quit,
        [] => return Err("Comando vazio".into()),
        _ => return Err(format!("Comando desconhecido: {line}")),
    };
    Ok(command)
}

fn parse_switch(word: &str) -> Result<bool, String> {
    match word {
        "on" | "1" => Ok(true),
        "off" | "0" => Ok(false),
        other => Err(format!("Esperado on/off, recebido {other}")),
    }
}

fn parse_threshold(field: &str, value: &str) -> Result<ThresholdUpdate, String> {
    let value: f64 = value
        .parse()
        .map_err(|_| format!("Valor inválido: {value}"))?;
    let mut update = ThresholdUpdate::default();
    match field {
        "temp_max" => update.temp_max = Some(value),
        "gas_max" => update.gas_max = Some(value),
        "hum_min" => update.hum_min = Some(value),
        "hum_max" => update.hum_max = Some(value),
        other => return Err(format!("Threshold desconhecido: {other}")),
    }
    Ok(update)
}

/// Executa um comando contra a sessão.
pub fn execute<T: Transport>(session: &mut TelemetrySession<T>, command: OperatorCommand) -> Flow {
    match command {
        OperatorCommand::Connect => {
            session.connect();
        }
        OperatorCommand::Disconnect => {
            session.disconnect();
        }
        OperatorCommand::Fan(on) => send(session, |c| c.with_fan(on)),
        OperatorCommand::Motor(speed) => send(session, |c| c.with_motor_speed(speed)),
        OperatorCommand::Safety(on) => send(session, |c| c.with_motor_safety(on)),
        OperatorCommand::Status => print_status(session),
        OperatorCommand::History => print_history(session),
        OperatorCommand::Clear => session.clear_history(),
        OperatorCommand::SetThreshold(update) => session.apply_threshold_update(&update),
        OperatorCommand::Help => println!("{HELP}"),
        OperatorCommand::Quit => return Flow::Quit,
    }
    Flow::Continue
}

/// Altera um único campo sobre o dado de atuador mais recente.
fn send<T: Transport>(
    session: &mut TelemetrySession<T>,
    change: impl FnOnce(PendingCommand) -> PendingCommand,
) {
    let base = session.command_base();
    if let Err(e) = session.send_command(change(base)) {
        println!("✗ {e}");
    }
}

fn print_status<T: Transport>(session: &TelemetrySession<T>) {
    let h = session.history();
    println!("Conexão:   {}", session.state());
    println!("Histórico: {}/{} pontos", h.len(), h.capacity());

    let th = session.thresholds();
    match session.latest_reading() {
        Some(r) => {
            let latest = Some(r);
            println!(
                "Temp {:.1}°C [{:?}] | Umid {:.1}% [{:?}] | Gás {:.0} [{:?}]",
                r.temperature(),
                sensor_status(Metric::Temperature, latest, th),
                r.humidity(),
                sensor_status(Metric::Humidity, latest, th),
                r.gas_level(),
                sensor_status(Metric::Gas, latest, th),
            );
            if sensor_status(Metric::Combined, latest, th) == SensorStatus::Danger {
                println!("!!! RISCO COMBINADO !!!");
            }
            let a = r.actuators();
            println!(
                "Dispositivo: fan={} motor={} sw={}",
                a.fan_on, a.motor_speed, a.motor_safety
            );
        }
        None => println!("Aguardando dados..."),
    }

    if let Some(c) = session.intended_command() {
        println!(
            "Último comando: fan={} motor={} sw={}",
            c.fan, c.motor_speed, c.motor_safety
        );
    }
}

fn print_history<T: Transport>(session: &TelemetrySession<T>) {
    if session.history().is_empty() {
        println!("Sem dados no histórico.");
        return;
    }
    println!("{:<10} {:>8} {:>8} {:>8}", "hora", "°C", "gás", "umid%");
    for p in session.history().iter() {
        println!(
            "{:<10} {:>8.1} {:>8.0} {:>8.1}",
            p.time, p.temperature, p.gas_level, p.humidity
        );
    }
}

/// Loga um evento da sessão.
pub fn report(event: &SessionEvent) {
    match event {
        SessionEvent::StateChanged { to, .. } => {
            let mark = if to.controls_enabled() { "●" } else { "○" };
            info!("{mark} Conexão: {to}");
        }
        SessionEvent::ReadingEvaluated {
            reading,
            conditions,
        } => {
            info!(
                "← Temp {:.1}°C | Umid {:.1}% | Gás {:.0} | fan={} motor={}",
                reading.temperature(),
                reading.humidity(),
                reading.gas_level(),
                reading.fan_on(),
                reading.motor_speed()
            );
            if conditions.is_empty() {
                debug!("Todos os parâmetros normais");
            }
            for c in conditions {
                match c.severity {
                    Severity::Warning => warn!("⚠ {}", c.message),
                    Severity::Danger | Severity::Critical => error!("✖ {}", c.message),
                }
            }
        }
        SessionEvent::DecodeFailed { error } => {
            debug!("Leitura descartada: {error}");
        }
    }
}
