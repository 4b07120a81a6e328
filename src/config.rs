//! Configuração do brigade carregada a partir de `brigade.toml`.
//!
//! A struct [`KitchenConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! A variável de ambiente `BRIGADE_LOG_FILE` tem precedência sobre o arquivo
//! para o caminho do log.

use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use brigade::log::LogFormat;
use brigade::worker::PrepTime;

/// Nome do arquivo de configuração procurado no diretório atual.
pub const CONFIG_FILE: &str = "brigade.toml";

/// Variável de ambiente que sobrescreve `log_path`.
pub const LOG_FILE_ENV: &str = "BRIGADE_LOG_FILE";

/// Configuração de nível superior carregada de `brigade.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct KitchenConfig {
    /// Número de cozinheiros (threads) por serviço.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Caminho do log de pedidos concluídos.
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,

    /// Formato do log: `text` ou `json`.
    #[serde(default)]
    pub log_format: LogFormat,

    /// Tempo base de preparo de cada pedido, em milissegundos.
    #[serde(default = "default_prep_time_ms")]
    pub prep_time_ms: u64,

    /// Variação aleatória máxima somada ao tempo base.
    #[serde(default)]
    pub prep_jitter_ms: u64,

    /// Mínimo de pedidos gerados quando nenhum número é informado.
    #[serde(default = "default_min_orders")]
    pub min_orders: usize,

    /// Máximo de pedidos gerados quando nenhum número é informado.
    #[serde(default = "default_max_orders")]
    pub max_orders: usize,
}

// Valor padrão de cozinheiros: 3.
fn default_workers() -> usize {
    3
}

fn default_log_path() -> PathBuf {
    PathBuf::from("log_pedidos.txt")
}

// Valor padrão do preparo: 2000ms.
fn default_prep_time_ms() -> u64 {
    2000
}

fn default_min_orders() -> usize {
    6
}

fn default_max_orders() -> usize {
    10
}

impl Default for KitchenConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            log_path: default_log_path(),
            log_format: LogFormat::default(),
            prep_time_ms: default_prep_time_ms(),
            prep_jitter_ms: 0,
            min_orders: default_min_orders(),
            max_orders: default_max_orders(),
        }
    }
}

impl KitchenConfig {
    /// Carrega a configuração de `brigade.toml` no diretório atual.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(Path::new(CONFIG_FILE))?;
        config.apply_log_override(std::env::var(LOG_FILE_ENV).ok());
        Ok(config)
    }

    /// Carrega a configuração de um caminho explícito, sem consultar o ambiente.
    pub fn load_from(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            toml::from_str::<KitchenConfig>(&contents)
                .with_context(|| format!("invalid config in {}", path.display()))?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    // Valor vazio na variável de ambiente é ignorado.
    fn apply_log_override(&mut self, value: Option<String>) {
        if let Some(path) = value
            && !path.is_empty()
        {
            self.log_path = PathBuf::from(path);
        }
    }

    fn validate(&self) -> Result<()> {
        ensure!(self.workers >= 1, "workers must be at least 1");
        ensure!(
            self.min_orders <= self.max_orders,
            "min_orders ({}) is greater than max_orders ({})",
            self.min_orders,
            self.max_orders
        );
        Ok(())
    }

    /// Tempo de preparo configurado.
    pub fn prep_time(&self) -> PrepTime {
        PrepTime::fixed(self.prep_time_ms).with_jitter(self.prep_jitter_ms)
    }
}
