//! Configuração unificada via TOML.
//!
//! O núcleo recebe cópias explícitas destas structs; não existe acesso
//! global à configuração. Validação é responsabilidade de quem carrega.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Capacidade padrão do histórico de tendência.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Erros de leitura/gravação do arquivo de configuração.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Erro de I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("Erro ao parsear TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Erro ao serializar TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Thresholds configuráveis pelo operador.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub temp_max: f64,
    pub gas_max: f64,
    pub hum_min: f64,
    pub hum_max: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            temp_max: 65.0,
            gas_max: 60.0,
            hum_min: 40.0,
            hum_max: 80.0,
        }
    }
}

impl ThresholdConfig {
    /// Perfil de atenção: avisa cedo (45 °C / gás 30), bem antes das
    /// linhas críticas.
    pub fn caution() -> Self {
        Self {
            temp_max: 45.0,
            gas_max: 30.0,
            ..Self::default()
        }
    }

    /// Aplica uma atualização parcial.
    pub fn apply(&mut self, update: &ThresholdUpdate) {
        if let Some(v) = update.temp_max {
            self.temp_max = v;
        }
        if let Some(v) = update.gas_max {
            self.gas_max = v;
        }
        if let Some(v) = update.hum_min {
            self.hum_min = v;
        }
        if let Some(v) = update.hum_max {
            self.hum_max = v;
        }
    }
}

/// Atualização parcial de thresholds (campos `None` ficam como estão).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdUpdate {
    pub temp_max: Option<f64>,
    pub gas_max: Option<f64>,
    pub hum_min: Option<f64>,
    pub hum_max: Option<f64>,
}

/// Parâmetros de conexão com o broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Host do broker MQTT
    pub broker_address: String,
    /// Porta TCP do broker
    pub port: u16,
    /// Tópico onde o dispositivo publica as leituras
    pub subscribe_topic: String,
    /// Tópico onde o painel publica os comandos
    pub publish_topic: String,
    /// Prefixo do client id (sufixo aleatório por conexão)
    pub client_id_prefix: String,
    /// Keep-alive MQTT (segundos)
    pub keep_alive_secs: u64,
    /// Espera entre tentativas de reconexão do cliente (segundos)
    pub reconnect_secs: f64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            broker_address: "broker.emqx.io".into(),
            port: 1883,
            subscribe_topic: "project/smart_compost/data".into(),
            publish_topic: "project/smart_compost/control".into(),
            client_id_prefix: "smart_compost_".into(),
            keep_alive_secs: 30,
            reconnect_secs: 5.0,
        }
    }
}

impl TransportConfig {
    /// Gera um client id novo: prefixo + 8 dígitos hex aleatórios.
    pub fn client_id(&self) -> String {
        format!("{}{:08x}", self.client_id_prefix, rand::random::<u32>())
    }
}

/// Configuração de histórico.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

/// Configuração raiz do aplicativo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub transport: TransportConfig,
    pub thresholds: ThresholdConfig,
    pub history: HistoryConfig,
}

impl AppConfig {
    /// Carrega configuração de um arquivo TOML.
    ///
    /// Arquivo ausente ou inválido resulta na configuração padrão.
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match Self::try_load(path) {
                Ok(config) => {
                    info!("Configuração carregada de {}", path.display());
                    return config;
                }
                Err(e) => warn!("Erro ao carregar {}: {}", path.display(), e),
            }
        }

        info!("Usando configuração padrão");
        AppConfig::default()
    }

    /// Como [`AppConfig::load`], mas propaga o erro.
    pub fn try_load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Salva configuração em arquivo TOML.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuração salva em {}", path.display());
        Ok(())
    }

    /// Retorna o caminho padrão do config.toml.
    pub fn default_path() -> PathBuf {
        let exe_dir = std::env::current_exe()
            .map(|p| p.parent().unwrap_or(Path::new(".")).to_path_buf())
            .unwrap_or_else(|_| PathBuf::from("."));
        exe_dir.join("config.toml")
    }

    pub fn reset_to_defaults(&mut self) {
        *self = AppConfig::default();
        info!("Configuração restaurada para o padrão");
    }

    /// Valida a configuração e retorna lista de erros.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.transport.broker_address.trim().is_empty() {
            errors.push("Endereço do broker não pode ser vazio".into());
        }
        if self.transport.port == 0 {
            errors.push("Porta do broker não pode ser 0".into());
        }
        if self.transport.subscribe_topic.trim().is_empty() {
            errors.push("Tópico de leitura não pode ser vazio".into());
        }
        if self.transport.publish_topic.trim().is_empty() {
            errors.push("Tópico de controle não pode ser vazio".into());
        }
        if self.thresholds.hum_min > self.thresholds.hum_max {
            errors.push(format!(
                "Faixa de umidade invertida: mínimo {} > máximo {}",
                self.thresholds.hum_min, self.thresholds.hum_max
            ));
        }
        if self.history.capacity == 0 {
            errors.push("Capacidade do histórico deve ser ≥ 1".into());
        }

        errors
    }
}
