//! # Compost Monitor
//!
//! Console do operador do compostor. Recebe a telemetria do dispositivo
//! via MQTT, loga alertas e mudanças de conexão e envia comandos para
//! ventilador e motor.
//!
//! ## Uso
//! ```bash
//! compost_monitor                          # config.toml ao lado do executável
//! compost_monitor --broker 192.168.0.10    # sobrescreve o broker
//! compost_monitor --no-autoconnect         # conecta só com `connect`
//! ```

mod args;
mod console;
mod net_thread;

use anyhow::Context as _;
use args::Args;
use clap::Parser as _;
use compost_core::config::AppConfig;
use compost_core::session::{SessionEvent, TelemetrySession};
use console::Flow;
use crossbeam_channel::{bounded, never, select, unbounded};
use net_thread::{MqttTransport, NetMessage, NetSenders};
use std::process::ExitCode;
use tracing::{debug, error, info, warn};

fn main() -> ExitCode {
    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    if let Err(e) = run() {
        error!("{e:#}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    // ── Config ──
    let config_path = args.config_path();
    let mut config = AppConfig::load(&config_path);

    // Salva config padrão se não existir
    if !config_path.exists() {
        if let Err(e) = config.save(&config_path) {
            warn!("Não foi possível salvar config padrão: {e}");
        }
    }

    args.apply(&mut config);
    for problem in config.validate() {
        warn!("Configuração: {problem}");
    }

    // ── Sessão ──
    let (readings_tx, readings_rx) = bounded::<NetMessage>(64);
    let (lifecycle_tx, lifecycle_rx) = unbounded::<NetMessage>();
    let senders = NetSenders {
        readings: readings_tx,
        lifecycle: lifecycle_tx,
    };
    let mut session = TelemetrySession::new(MqttTransport::new(senders), &config);

    let (events_tx, events_rx) = bounded::<SessionEvent>(256);
    session.subscribe(events_tx);

    let mut input_rx = console::spawn_stdin_thread().context("falha ao iniciar leitura do stdin")?;

    // ── Banner ──
    let t = &config.transport;
    println!();
    println!("══════════════════════════════════════════════");
    println!("   🌿 COMPOST MONITOR");
    println!("══════════════════════════════════════════════");
    println!("  Broker:   {}:{}", t.broker_address, t.port);
    println!("  Leituras: {}", t.subscribe_topic);
    println!("  Controle: {}", t.publish_topic);
    println!("  Digite `help` para os comandos");
    println!("══════════════════════════════════════════════");
    println!();

    if !args.no_autoconnect {
        session.connect();
    }

    // ── Loop principal ──
    loop {
        let mut stdin_closed = false;
        select! {
            recv(lifecycle_rx) -> msg => {
                let Ok(msg) = msg else { break };
                dispatch(&mut session, msg);
            }
            recv(readings_rx) -> msg => {
                let Ok(msg) = msg else { break };
                dispatch(&mut session, msg);
            }
            recv(input_rx) -> line => match line {
                Ok(line) => match console::parse(&line) {
                    Ok(command) => {
                        if console::execute(&mut session, command) == Flow::Quit {
                            break;
                        }
                    }
                    Err(e) => println!("{e}"),
                },
                Err(_) => stdin_closed = true,
            },
        }

        if stdin_closed {
            info!("stdin encerrado, seguindo só com a telemetria");
            input_rx = never();
        }

        while let Ok(event) = events_rx.try_recv() {
            console::report(&event);
        }
    }

    session.disconnect();
    info!("Encerrado");
    Ok(())
}

/// Repassa à sessão só eventos do cliente atual.
fn dispatch(session: &mut TelemetrySession<MqttTransport>, msg: NetMessage) {
    if session.transport().is_current(msg.generation) {
        session.handle_transport_event(msg.event);
    } else {
        debug!("Evento de conexão antiga #{} descartado", msg.generation);
    }
}
