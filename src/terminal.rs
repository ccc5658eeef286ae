//! 端末への描画とフィードバック
//!
//! コントローラから届く描画要求を標準出力へ書き出す。

use indicatif::{ProgressBar, ProgressStyle};
use label_validator_common::{
    Cue, Feedback, GroupSummary, LabelRecord, ListView, Listing, View, ViewUpdate,
};
use std::io::Write;
use std::time::Duration;

/// 一つ上のレベルへ戻る項目
pub const BACK_LABEL: &str = "← Volver";

/// グループ1行の表示
pub fn group_line(group: &GroupSummary) -> String {
    let mark = if group.is_complete() { "✔" } else { " " };
    format!(
        "{} {:<28} {:>4} etiquetas  [{}]",
        mark,
        group.value,
        group.total,
        group.badge()
    )
}

/// ラベル1行の表示
pub fn label_line(label: &LabelRecord) -> String {
    let check = if label.validated { "[x]" } else { "[ ]" };
    format!("{} {:<16} {}", check, label.code, label.destination)
}

/// 一覧の見出し（レベル名とパンくず）
pub fn list_title(view: &ListView) -> String {
    if view.breadcrumb.is_empty() {
        view.level().title().to_string()
    } else {
        format!("{}: {}", view.level().title(), view.breadcrumb.join(" › "))
    }
}

/// 一覧本体の各行（戻る項目を含む）
pub fn list_lines(view: &ListView) -> Vec<String> {
    let mut lines: Vec<String> = match &view.listing {
        Listing::Groups { groups, .. } if groups.is_empty() => vec!["(sin elementos)".to_string()],
        Listing::Groups { groups, .. } => groups.iter().map(group_line).collect(),
        Listing::Labels(labels) => labels.iter().map(label_line).collect(),
    };
    if view.can_go_back {
        lines.push(BACK_LABEL.to_string());
    }
    lines
}

/// 標準出力への描画
#[derive(Default)]
pub struct TerminalView {
    muted: bool,
    spinner: Option<ProgressBar>,
}

impl TerminalView {
    pub fn new() -> Self {
        Self::default()
    }

    /// trueの間は描画しない（通知とローディングは除く）
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn print_list(&self, view: &ListView) {
        println!("\n📋 {}", list_title(view));
        for line in list_lines(view) {
            println!("  {}", line);
        }
    }

    fn print_search_result(label: &LabelRecord) {
        println!("\n🔍 {}", label.code);
        println!("  Referencia: {}", label.reference);
        println!("  Destino:    {}", label.destination);
        println!("  Ciudad:     {}", label.city);
        println!("  Ruta:       {}", label.route);
        println!("  Validada:   {}", if label.validated { "sí" } else { "no" });
    }

    fn start_spinner(&mut self) {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message("Cargando...");
        spinner.enable_steady_tick(Duration::from_millis(100));
        self.spinner = Some(spinner);
    }
}

impl View for TerminalView {
    fn render(&mut self, update: ViewUpdate) {
        match update {
            ViewUpdate::Alert(message) => eprintln!("⚠ {}", message),
            ViewUpdate::Loading(true) => self.start_spinner(),
            ViewUpdate::Loading(false) => {
                if let Some(spinner) = self.spinner.take() {
                    spinner.finish_and_clear();
                }
            }
            _ if self.muted => {}
            ViewUpdate::Welcome => {
                println!("\n👋 No hay etiquetas cargadas.");
                println!("   Importa un archivo con: label-validator import <archivo.xlsx>");
            }
            ViewUpdate::List(view) => self.print_list(&view),
            ViewUpdate::Footer(Some(footer)) => println!("── {} ──", footer),
            ViewUpdate::Footer(None) => {}
            ViewUpdate::SearchResult(label) => Self::print_search_result(&label),
            ViewUpdate::ClearSearchInput => {}
        }
    }
}

/// 端末ベルによるフィードバック（エラー時のみ鳴らす）
#[derive(Debug, Default)]
pub struct Bell;

impl Feedback for Bell {
    fn play(&mut self, cue: Cue) {
        match cue {
            Cue::Success => println!("✔ OK"),
            Cue::Error => {
                let mut stderr = std::io::stderr();
                let _ = write!(stderr, "\x07");
                let _ = stderr.flush();
            }
        }
    }
}
