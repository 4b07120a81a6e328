//! Interface de linha de comando do brigade baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (run, show, menu)
//! e flags globais (--workers, --log-file, --verbose).

use std::path::PathBuf;

use brigade::log::LogFormat;
use clap::{Parser, Subcommand, ValueEnum};

/// brigade — cozinheiros concorrentes esvaziando uma fila de pedidos.
#[derive(Debug, Parser)]
#[command(name = "brigade", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Número de cozinheiros (threads) no serviço.
    #[arg(long, short, global = true)]
    pub workers: Option<usize>,

    /// Caminho do log de pedidos concluídos.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

/// Formato de log aceito pela CLI, mapeado para [`LogFormat`] internamente.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FormatArg {
    /// Texto legível, uma linha por pedido.
    Text,
    /// Um objeto JSON por linha.
    Json,
}

impl From<FormatArg> for LogFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => LogFormat::Text,
            FormatArg::Json => LogFormat::Json,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Executa um serviço de cozinha completo.
    Run {
        /// Quantidade de pedidos aleatórios a gerar.
        #[arg(long, short)]
        orders: Option<usize>,

        /// Caminho para um arquivo JSON ou TOML com os pedidos.
        #[arg(long, conflicts_with = "orders")]
        orders_file: Option<PathBuf>,

        /// Tempo base de preparo de cada pedido, em milissegundos.
        #[arg(long)]
        prep_ms: Option<u64>,

        /// Variação aleatória máxima somada ao preparo, em milissegundos.
        #[arg(long)]
        jitter_ms: Option<u64>,

        /// Formato do log gerado.
        #[arg(long)]
        format: Option<FormatArg>,

        /// Semente do gerador de pedidos, para execuções reproduzíveis.
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Lê um log existente, valida sua estrutura e mostra um resumo.
    Show {
        /// Caminho do log; usa o configurado quando omitido.
        path: Option<PathBuf>,
    },

    /// Lista os pratos usados na geração de pedidos.
    Menu,
}
