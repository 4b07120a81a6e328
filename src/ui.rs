//! Interface de terminal do brigade — spinners e saída colorida.
//!
//! Usa as crates `indicatif` para spinners de progresso e `console` para
//! estilização com cores. O [`ConsoleObserver`] acompanha visualmente
//! cada cozinheiro durante o serviço.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::Duration;

use console::Style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use brigade::kitchen::RunSummary;
use brigade::log::ParsedLog;
use brigade::observer::KitchenObserver;
use brigade::order::WorkItem;

/// Observador que mostra um spinner por cozinheiro no terminal.
///
/// Linhas de início/fim de cada pedido são impressas acima dos spinners,
/// em verde para pedidos concluídos.
pub struct ConsoleObserver {
    // Agrupa os spinners de todos os cozinheiros.
    multi: MultiProgress,
    // Spinner de cada cozinheiro ativo, indexado pelo nome.
    bars: Mutex<HashMap<String, ProgressBar>>,
    green: Style,
    cyan: Style,
    bold: Style,
}

impl ConsoleObserver {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            bars: Mutex::new(HashMap::new()),
            green: Style::new().green().bold(),
            cyan: Style::new().cyan(),
            bold: Style::new().bold(),
        }
    }

    // Saída é apenas informativa; falhas de escrita no terminal são ignoradas.
    fn line(&self, msg: String) {
        let _ = self.multi.println(msg);
    }

    fn with_bar(&self, worker_id: &str, f: impl FnOnce(&ProgressBar)) {
        if let Ok(bars) = self.bars.lock()
            && let Some(pb) = bars.get(worker_id)
        {
            f(pb);
        }
    }
}

impl Default for ConsoleObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl KitchenObserver for ConsoleObserver {
    fn service_started(&self, workers: usize, queued: usize) {
        self.line(format!(
            "{}\n  {queued} pedidos, {workers} cocineros\n",
            self.bold.apply_to("=== INICIANDO SERVICIO DE COCINA ===")
        ));
    }

    fn worker_started(&self, worker_id: &str) {
        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {prefix:.bold} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_prefix(worker_id.to_string());
        pb.set_message("esperando pedido");
        pb.enable_steady_tick(Duration::from_millis(100));
        if let Ok(mut bars) = self.bars.lock() {
            bars.insert(worker_id.to_string(), pb);
        }
    }

    fn item_started(&self, worker_id: &str, item: &WorkItem) {
        self.with_bar(worker_id, |pb| pb.set_message(format!("Preparando {item}...")));
        self.line(format!(
            "[{}] Preparando {item}...",
            self.cyan.apply_to(worker_id)
        ));
    }

    fn item_finished(&self, worker_id: &str, item: &WorkItem) {
        self.with_bar(worker_id, |pb| pb.set_message("esperando pedido"));
        self.line(format!(
            "[{}] {item} completado {}",
            self.cyan.apply_to(worker_id),
            self.green.apply_to("✓")
        ));
    }

    fn worker_finished(&self, worker_id: &str, _completed: usize) {
        let bar = self.bars.lock().ok().and_then(|mut bars| bars.remove(worker_id));
        if let Some(pb) = bar {
            pb.finish_and_clear();
        }
    }

    fn service_finished(&self, summary: &RunSummary) {
        self.line(format!(
            "\n{}\n  {} pedidos procesados en {} ms.",
            self.bold.apply_to("=== SERVICIO FINALIZADO ==="),
            summary.records,
            summary.duration_ms
        ));
    }
}

/// Lista os pedidos que entram na fila antes do serviço.
pub fn print_queue(orders: &[WorkItem]) {
    println!("Pedidos en cola:");
    for order in orders {
        println!("  - {order}");
    }
    println!();
}

/// Imprime o resumo do serviço formatado em JSON com estilo colorido.
pub fn print_summary(summary: &RunSummary) {
    let style = if summary.cancelled || summary.remaining > 0 {
        Style::new().yellow()
    } else {
        Style::new().green()
    };
    println!();
    println!("{}", style.apply_to("─── Run Summary ───"));
    println!(
        "{}",
        serde_json::to_string_pretty(summary).unwrap_or_default()
    );
}

/// Mostra um log lido do disco: contagem por cozinheiro e problemas encontrados.
pub fn print_parsed_log(parsed: &ParsedLog) {
    let bold = Style::new().bold();
    let red = Style::new().red().bold();
    let green = Style::new().green().bold();

    println!("{} ({})", bold.apply_to("Log de pedidos"), parsed.format);
    match parsed.started_at {
        Some(ts) => println!("  Inicio: {ts}"),
        None => println!("  Inicio: -"),
    }
    match parsed.finished_at {
        Some(ts) => println!("  Fin:    {ts}"),
        None => println!("  Fin:    -"),
    }
    println!("  Pedidos completados: {}", parsed.records.len());

    let mut per_worker: BTreeMap<&str, usize> = BTreeMap::new();
    for record in &parsed.records {
        *per_worker.entry(record.worker_id.as_str()).or_default() += 1;
    }
    for (worker, count) in per_worker {
        println!("    {worker}: {count}");
    }

    let issues = parsed.issues();
    if issues.is_empty() {
        println!("  {} log completo", green.apply_to("✓"));
    } else {
        for issue in issues {
            println!("  {} {issue}", red.apply_to("✗"));
        }
    }
}
