use clap::Parser;
use compost_core::config::AppConfig;
use std::path::PathBuf;

/// Console do operador do compostor.
#[derive(Debug, Parser)]
#[command(name = "compost_monitor", version, about)]
pub struct Args {
    /// Caminho do config.toml (padrão: ao lado do executável)
    #[arg(long, env = "COMPOST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Sobrescreve o host do broker
    #[arg(long, env = "COMPOST_BROKER")]
    pub broker: Option<String>,

    /// Sobrescreve a porta do broker
    #[arg(long, env = "COMPOST_PORT")]
    pub port: Option<u16>,

    /// Não conecta ao iniciar
    #[arg(long)]
    pub no_autoconnect: bool,
}

impl Args {
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(AppConfig::default_path)
    }

    /// Aplica os overrides da linha de comando sobre o arquivo.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(broker) = &self.broker {
            config.transport.broker_address = broker.clone();
        }
        if let Some(port) = self.port {
            config.transport.port = port;
        }
    }
}
