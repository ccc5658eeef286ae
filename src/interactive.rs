//! 対話モジュール
//!
//! 一覧画面（ドリルダウン）、スキャン画面、確認付きの消去/終了。
//! 画面の操作はすべてCommandとしてコントローラへ送る。

use crate::config::Config;
use crate::error::{LabelValidatorError, Result};
use crate::session::{self, Session};
use crate::terminal::{group_line, label_line, BACK_LABEL};
use dialoguer::console::{Key, Term};
use dialoguer::{Confirm, Select};
use label_validator_common::{
    navigation, Command, Controller, Feedback, Listing, Outcome, ScanInput, ScanOutcome,
    SnapshotStore, View, ViewUpdate,
};
use std::io;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::debug;

/// 一覧画面のメニュー項目
#[derive(Debug, Clone, PartialEq, Eq)]
enum MenuItem {
    Run(Command),
    Search,
    Quit,
}

/// 1キーずつ読む入力元
pub trait KeySource: Send + 'static {
    fn read_key(&mut self) -> io::Result<Key>;
}

impl KeySource for Term {
    fn read_key(&mut self) -> io::Result<Key> {
        match Term::read_key(self) {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(Key::Escape),
            other => other,
        }
    }
}

/// ブロッキングなキー読み込みを別スレッドで待つ
///
/// 待ち時間切れでも読み込み中のタスクは保持し、次の呼び出しで続きを待つ
struct KeyReader<K> {
    source: Option<K>,
    pending: Option<JoinHandle<(K, io::Result<Key>)>>,
}

impl<K: KeySource> KeyReader<K> {
    fn new(source: K) -> Self {
        Self {
            source: Some(source),
            pending: None,
        }
    }

    /// 次のキー。waitを過ぎたらNone
    async fn next(&mut self, wait: Option<Duration>) -> Result<Option<Key>> {
        if self.pending.is_none() {
            if let Some(mut source) = self.source.take() {
                self.pending = Some(tokio::task::spawn_blocking(move || {
                    let key = source.read_key();
                    (source, key)
                }));
            }
        }
        let Some(handle) = self.pending.as_mut() else {
            return Err(LabelValidatorError::Prompt("entrada de teclado no disponible".into()));
        };

        let joined = match wait {
            Some(wait) => match tokio::time::timeout(wait, handle).await {
                Ok(joined) => joined,
                Err(_) => return Ok(None),
            },
            None => handle.await,
        };
        self.pending = None;

        let (source, key) = joined.map_err(io::Error::other)?;
        self.source = Some(source);
        Ok(Some(key?))
    }
}

/// 確認プロンプト（assume_yesなら聞かずにtrue）
pub fn confirm(prompt: &str, default: bool, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    Ok(Confirm::new().with_prompt(prompt).default(default).interact()?)
}

/// スキャン結果の説明（見つかった場合はNone）
pub fn describe_scan(code: &str, outcome: &ScanOutcome) -> Option<String> {
    match outcome {
        ScanOutcome::Duplicate => Some(format!("✖ Etiqueta ya escaneada: {}", code.trim().to_uppercase())),
        ScanOutcome::NotFound => Some(format!("✖ Etiqueta no encontrada: {}", code.trim().to_uppercase())),
        ScanOutcome::Empty | ScanOutcome::Found(_) => None,
    }
}

/// 一覧画面を対話的に操作
pub async fn run_browse(session: &mut Session, config: &Config) -> Result<()> {
    if !session.has_data() {
        session.view_mut().render(ViewUpdate::Welcome);
        return Ok(());
    }

    // 一覧はSelectで表示するので、遷移ごとの描画は止める
    session.view_mut().set_muted(true);

    loop {
        let listing = navigation::listing(session.state());
        let mut items = Vec::new();
        let mut entries = Vec::new();

        match &listing {
            Listing::Groups { groups, .. } => {
                for group in groups {
                    items.push(group_line(group));
                    entries.push(MenuItem::Run(Command::Enter(group.value.clone())));
                }
            }
            Listing::Labels(labels) => {
                for label in labels {
                    items.push(label_line(label));
                    entries.push(MenuItem::Run(Command::Toggle(label.code.clone())));
                }
            }
        }

        if !session.state().navigation_stack.is_empty() {
            items.push(BACK_LABEL.to_string());
            entries.push(MenuItem::Run(Command::Back));
        }
        items.push("🔍 Buscar".to_string());
        entries.push(MenuItem::Search);
        items.push("Salir".to_string());
        entries.push(MenuItem::Quit);

        let breadcrumb = session.state().current_filter.breadcrumb().join(" › ");
        let prompt = format!(
            "{} {} ({})",
            listing.level().title(),
            breadcrumb,
            session.footer_summary()
        );

        let choice = Select::new()
            .with_prompt(prompt)
            .items(&items)
            .default(0)
            .interact_opt()?;

        match choice.and_then(|i| entries.get(i).cloned()) {
            None | Some(MenuItem::Quit) => break,
            Some(MenuItem::Run(command)) => {
                session.dispatch(command)?;
            }
            Some(MenuItem::Search) => {
                session.view_mut().set_muted(false);
                run_scan(session, config, false).await?;
                session.view_mut().set_muted(true);
            }
        }
    }

    session.view_mut().set_muted(false);
    Ok(())
}

/// スキャン画面
///
/// 端末からキーを直接読むので、Enterを送らないスキャナーでも設定長で送信される
pub async fn run_scan(session: &mut Session, config: &Config, auto_validate: bool) -> Result<()> {
    if !session.has_data() {
        session.view_mut().render(ViewUpdate::Welcome);
        return Ok(());
    }

    let term = Term::stdout();
    if !term.is_term() {
        return Err(LabelValidatorError::Prompt(
            "la pantalla de escaneo necesita un terminal; usa: label-validator scan <códigos>".into(),
        ));
    }

    println!("🔍 Escanea o escribe una etiqueta");
    println!("   Enter envía · Tab cambia la validación · Esc o Enter vacío sale");
    let input = ScanInput::new(config.auto_submit_length, config.debounce());
    scan_keys(session, term, input, auto_validate).await
}

/// キー入力で動くスキャン画面の本体
///
/// 閾値に達した入力はdebounce後にEnter無しで送信する。
/// 入力が空のときTabで最後に見つかったラベルの検証を切り替える。
pub async fn scan_keys<S, V, F, K>(
    session: &mut Controller<S, V, F>,
    keys: K,
    mut input: ScanInput,
    auto_validate: bool,
) -> Result<()>
where
    S: SnapshotStore,
    V: View,
    F: Feedback,
    K: KeySource,
{
    let mut reader = KeyReader::new(keys);
    let mut last_found: Option<String> = None;
    echo_input(input.text());

    loop {
        let Some(key) = reader.next(input.due_in(Instant::now())).await? else {
            if let Some(code) = input.poll(Instant::now()) {
                debug!(code, "auto-submit");
                println!();
                if let Some(found) = scan_code(session, &code, auto_validate)? {
                    last_found = Some(found);
                }
                echo_input(input.text());
            }
            continue;
        };

        match key {
            Key::Escape => break,
            Key::Enter => match input.submit() {
                Some(code) => {
                    println!();
                    if let Some(found) = scan_code(session, &code, auto_validate)? {
                        last_found = Some(found);
                    }
                }
                None => break,
            },
            Key::Tab if input.text().is_empty() => {
                if let Some(code) = &last_found {
                    println!();
                    session.dispatch(Command::Toggle(code.clone()))?;
                }
            }
            Key::Backspace => {
                let mut text = input.text().to_string();
                text.pop();
                input.update(&text, Instant::now());
            }
            Key::Char(c) if !c.is_control() => {
                let mut text = input.text().to_string();
                text.push(c);
                input.update(&text, Instant::now());
            }
            _ => {}
        }
        echo_input(input.text());
    }

    println!();
    session.dispatch(Command::CloseSearch)?;
    Ok(())
}

/// コードを1件送信。見つかったラベルのコードを返す
///
/// auto_validateなら未検証のラベルをその場で検証済みにする
pub fn scan_code<S, V, F>(
    session: &mut Controller<S, V, F>,
    code: &str,
    auto_validate: bool,
) -> Result<Option<String>>
where
    S: SnapshotStore,
    V: View,
    F: Feedback,
{
    let outcome = match session.dispatch(Command::Scan(code.to_string()))? {
        Outcome::Scanned(outcome) => outcome,
        _ => ScanOutcome::Empty,
    };

    match outcome {
        ScanOutcome::Found(label) => {
            if auto_validate && !label.validated {
                session.dispatch(Command::Toggle(label.code.clone()))?;
            }
            Ok(Some(label.code))
        }
        other => {
            if let Some(message) = describe_scan(code, &other) {
                eprintln!("{}", message);
            }
            Ok(None)
        }
    }
}

/// 入力行を書き直す
fn echo_input(text: &str) {
    let term = Term::stdout();
    let _ = term.clear_line();
    let _ = term.write_str(&format!("Etiqueta: {}", text));
}

/// 確認してから全データを消去。消去したらtrue
pub fn run_clear<S, V, F>(session: &mut Controller<S, V, F>, assume_yes: bool) -> Result<bool>
where
    S: SnapshotStore,
    V: View,
    F: Feedback,
{
    if !session.has_data() {
        println!("No hay datos cargados");
        return Ok(false);
    }

    if confirm("¿Estás seguro de que quieres limpiar todos los datos?", false, assume_yes)? {
        session.dispatch(Command::Clear)?;
        println!("✔ Datos eliminados");
        Ok(true)
    } else {
        Ok(false)
    }
}

/// 終了処理
///
/// 検証済みラベルがあれば先にエクスポートを勧め、確認後に全データを消去する
pub fn run_exit<S, V, F>(
    session: &mut Controller<S, V, F>,
    export_dir: &Path,
    assume_yes: bool,
) -> Result<bool>
where
    S: SnapshotStore,
    V: View,
    F: Feedback,
{
    if session.should_offer_export()
        && confirm(
            "Tienes etiquetas validadas. ¿Deseas exportar antes de salir?",
            true,
            assume_yes,
        )?
    {
        let path = session::export_to_dir(session, export_dir)?;
        println!("✔ Exportado: {}", path.display());
    }

    if confirm(
        "¿Estás seguro de que quieres salir? Se limpiarán todos los datos.",
        false,
        assume_yes,
    )? {
        session.dispatch(Command::Clear)?;
        Ok(true)
    } else {
        Ok(false)
    }
}
