//! アプリケーションコントローラ
//!
//! AppStateとセッション限りの状態（スキャン済み集合、インポート中フラグ）を
//! ひとつの所有者にまとめる。画面はViewトレイトへ描画データを送るだけで、
//! 表示の仕組みには依存しない。すべての変更操作の最後に状態を保存する。

use crate::error::{Error, Result};
use crate::export::{self, ExportRow};
use crate::hierarchy::{FooterSummary, Listing, RecordStore};
use crate::import::{self, TableRow};
use crate::navigation;
use crate::persistence::{Persistence, SnapshotStore};
use crate::scan::{normalize_code, ScanCheck, ScanGuard};
use crate::types::{AppState, LabelRecord, Level, Screen};
use tracing::{debug, info, warn};

/// 音によるフィードバック
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Success,
    Error,
}

/// フィードバックの出力先（戻り値なし）
pub trait Feedback {
    fn play(&mut self, cue: Cue);
}

/// 何もしないフィードバック
#[derive(Debug, Default)]
pub struct Silent;

impl Feedback for Silent {
    fn play(&mut self, _cue: Cue) {}
}

/// 一覧画面の描画データ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListView {
    pub listing: Listing,
    /// 上位レベルで選んだ値（ルート側から）
    pub breadcrumb: Vec<String>,
    /// 戻るボタンを表示するか
    pub can_go_back: bool,
}

impl ListView {
    pub fn level(&self) -> Level {
        self.listing.level()
    }
}

/// Viewへ送る描画要求
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewUpdate {
    /// データ無しのウェルカム画面
    Welcome,
    /// 現在レベルの一覧
    List(ListView),
    /// フッター（Noneなら非表示）
    Footer(Option<FooterSummary>),
    /// 検索結果
    SearchResult(LabelRecord),
    /// 検索入力欄をクリア
    ClearSearchInput,
    /// ユーザーへの通知
    Alert(String),
    /// 読み込み中表示
    Loading(bool),
}

/// 画面への出力先
pub trait View {
    fn render(&mut self, update: ViewUpdate);
}

/// スキャン送信の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// 空入力（何もしない）
    Empty,
    /// このセッションでスキャン済み
    Duplicate,
    /// 該当ラベル無し
    NotFound,
    Found(LabelRecord),
}

/// 画面から送られる操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Restore,
    Enter(String),
    Back,
    Scan(String),
    Toggle(String),
    CloseSearch,
    Import(Vec<TableRow>),
    Export,
    Clear,
}

/// 操作の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// 状態は変わらなかった
    Unchanged,
    /// 一覧を描画し直した
    Rendered,
    Scanned(ScanOutcome),
    Toggled { code: String, validated: bool },
    Imported(usize),
    Exported(Vec<ExportRow>),
    Cleared,
}

/// アプリケーションの唯一の状態所有者
pub struct Controller<S, V, F> {
    state: AppState,
    guard: ScanGuard,
    import_in_progress: bool,
    /// 表示中の検索結果のコード
    search_result: Option<String>,
    persistence: Persistence<S>,
    view: V,
    feedback: F,
}

impl<S, V, F> Controller<S, V, F>
where
    S: SnapshotStore,
    V: View,
    F: Feedback,
{
    pub fn new(persistence: Persistence<S>, view: V, feedback: F) -> Self {
        Self {
            state: AppState::default(),
            guard: ScanGuard::new(),
            import_in_progress: false,
            search_result: None,
            persistence,
            view,
            feedback,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn feedback(&self) -> &F {
        &self.feedback
    }

    pub fn persistence(&self) -> &Persistence<S> {
        &self.persistence
    }

    pub fn has_data(&self) -> bool {
        !self.state.records.is_empty()
    }

    /// 終了前にエクスポートを勧めるべきか
    pub fn should_offer_export(&self) -> bool {
        self.state.has_validated()
    }

    pub fn current_level(&self) -> Level {
        navigation::current_level(&self.state)
    }

    pub fn footer_summary(&self) -> FooterSummary {
        RecordStore::new(&self.state.records).footer_summary()
    }

    /// 操作を対応するメソッドへ振り分ける
    pub fn dispatch(&mut self, command: Command) -> Result<Outcome> {
        debug!(?command, "dispatch");
        match command {
            Command::Restore => {
                self.restore();
                Ok(Outcome::Rendered)
            }
            Command::Enter(value) => Ok(rendered_if(self.enter(&value))),
            Command::Back => Ok(rendered_if(self.back())),
            Command::Scan(raw) => Ok(Outcome::Scanned(self.submit_scan(&raw))),
            Command::Toggle(code) => Ok(match self.toggle(&code) {
                Some(validated) => Outcome::Toggled { code, validated },
                None => Outcome::Unchanged,
            }),
            Command::CloseSearch => {
                self.close_search();
                Ok(Outcome::Unchanged)
            }
            Command::Import(rows) => {
                self.begin_import()?;
                self.finish_import(Ok(rows)).map(Outcome::Imported)
            }
            Command::Export => self.export().map(Outcome::Exported),
            Command::Clear => {
                self.clear();
                Ok(Outcome::Cleared)
            }
        }
    }

    /// 起動時のセッション復元
    ///
    /// レコードのあるスナップショットがあれば一覧画面を最後のレベルで再表示し、
    /// 無ければウェルカム画面を出す。復元したらtrue
    pub fn start(&mut self) -> bool {
        let loaded = self.persistence.load();
        let restored = loaded.as_ref().is_some_and(|s| !s.records.is_empty());
        self.state = loaded.unwrap_or_default();

        if restored {
            info!(
                records = self.state.records.len(),
                level = ?self.current_level(),
                "session restored"
            );
            self.state.current_view = Screen::List;
            self.restore();
        } else {
            self.view.render(ViewUpdate::Welcome);
        }
        restored
    }

    /// 現在のフィルタから一覧を再表示（スタックは変更しない）
    pub fn restore(&mut self) {
        self.refresh();
    }

    /// 値を選んで一段深いレベルへ
    pub fn enter(&mut self, value: &str) -> bool {
        if !navigation::enter(&mut self.state, value) {
            return false;
        }
        self.refresh();
        true
    }

    /// 一段戻る。スタックが空なら何もしない
    pub fn back(&mut self) -> bool {
        if !navigation::back(&mut self.state) {
            return false;
        }
        self.refresh();
        true
    }

    /// スキャン/手入力コードの送信
    pub fn submit_scan(&mut self, raw: &str) -> ScanOutcome {
        let code = normalize_code(raw);
        if code.is_empty() {
            return ScanOutcome::Empty;
        }

        if self.guard.check(&code) == ScanCheck::Duplicate {
            debug!(code, "duplicate scan");
            self.feedback.play(Cue::Error);
            self.view.render(ViewUpdate::ClearSearchInput);
            return ScanOutcome::Duplicate;
        }

        let found = RecordStore::new(&self.state.records)
            .find_by_code_ignore_case(&code)
            .cloned();

        match found {
            Some(record) => {
                self.feedback.play(Cue::Success);
                self.search_result = Some(record.code.clone());
                self.view.render(ViewUpdate::SearchResult(record.clone()));
                self.view.render(ViewUpdate::ClearSearchInput);
                ScanOutcome::Found(record)
            }
            None => {
                debug!(code, "scan not found");
                self.feedback.play(Cue::Error);
                self.view.render(ViewUpdate::ClearSearchInput);
                ScanOutcome::NotFound
            }
        }
    }

    /// 検索オーバーレイを閉じる
    pub fn close_search(&mut self) {
        self.search_result = None;
        self.view.render(ViewUpdate::ClearSearchInput);
    }

    /// 検証済みフラグを反転（コード完全一致の最初のレコード）
    ///
    /// 該当なしは何もしない。反転後の値を返す
    pub fn toggle(&mut self, code: &str) -> Option<bool> {
        let record = self.state.records.iter_mut().find(|r| r.code == code)?;
        record.validated = !record.validated;
        let validated = record.validated;
        let snapshot = record.clone();
        debug!(code, validated, "toggled");

        self.save();

        if self.state.current_view == Screen::List {
            self.render_list();
        }

        if self.search_result.as_deref() == Some(code) {
            self.view.render(ViewUpdate::SearchResult(snapshot));
        }

        Some(validated)
    }

    /// ファイル読み込み開始（同時インポートは拒否）
    pub fn begin_import(&mut self) -> Result<()> {
        if self.import_in_progress {
            warn!("import rejected: another import is in progress");
            return Err(Error::ImportInProgress);
        }
        self.import_in_progress = true;
        self.view.render(ViewUpdate::Loading(true));
        Ok(())
    }

    pub fn import_in_progress(&self) -> bool {
        self.import_in_progress
    }

    /// 読み込み完了。成功なら全レコードを置き換えてルート一覧を表示
    ///
    /// 失敗時は状態を変えずに通知してエラーを返す
    pub fn finish_import(&mut self, rows: Result<Vec<TableRow>>) -> Result<usize> {
        self.import_in_progress = false;
        self.view.render(ViewUpdate::Loading(false));

        let rows = match rows {
            Ok(rows) => rows,
            Err(e) => {
                warn!("import failed: {}", e);
                self.view.render(ViewUpdate::Alert(invalid_format_message(&e)));
                return Err(e);
            }
        };

        self.state.records = import::records_from_rows(&rows);
        navigation::reset(&mut self.state);
        self.state.current_view = Screen::List;
        self.guard.reset();
        self.search_result = None;

        let count = self.state.records.len();
        info!(count, "labels imported");
        self.refresh();
        Ok(count)
    }

    /// エクスポート行を生成（データが無ければ通知してエラー）
    pub fn export(&mut self) -> Result<Vec<ExportRow>> {
        match export::export_rows(&self.state.records) {
            Ok(rows) => {
                info!(rows = rows.len(), "export prepared");
                Ok(rows)
            }
            Err(e) => {
                self.view.render(ViewUpdate::Alert(e.to_string()));
                Err(e)
            }
        }
    }

    /// 全データを消去して初期状態へ
    pub fn clear(&mut self) {
        self.state = AppState::default();
        self.guard.reset();
        self.search_result = None;
        self.save();
        info!("data cleared");

        self.view.render(ViewUpdate::Welcome);
        self.view.render(ViewUpdate::Footer(None));
    }

    fn save(&mut self) {
        self.persistence.save(&mut self.state);
    }

    /// 一覧とフッターを描画して保存
    fn refresh(&mut self) {
        self.render_list();
        self.save();
    }

    fn render_list(&mut self) {
        let listing = navigation::listing(&self.state);
        let breadcrumb = self
            .state
            .current_filter
            .breadcrumb()
            .into_iter()
            .map(str::to_string)
            .collect();

        self.view.render(ViewUpdate::List(ListView {
            listing,
            breadcrumb,
            can_go_back: !self.state.navigation_stack.is_empty(),
        }));

        let footer = self.has_data().then(|| self.footer_summary());
        self.view.render(ViewUpdate::Footer(footer));
    }
}

fn rendered_if(changed: bool) -> Outcome {
    if changed {
        Outcome::Rendered
    } else {
        Outcome::Unchanged
    }
}

fn invalid_format_message(error: &Error) -> String {
    match error {
        Error::InvalidFormat(_) => error.to_string(),
        other => Error::InvalidFormat(other.to_string()).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{MemoryStore, STORAGE_KEY};

    /// 描画要求を記録するView
    #[derive(Default)]
    struct RecordingView {
        updates: Vec<ViewUpdate>,
    }

    impl View for RecordingView {
        fn render(&mut self, update: ViewUpdate) {
            self.updates.push(update);
        }
    }

    impl RecordingView {
        fn last_list(&self) -> &ListView {
            self.updates
                .iter()
                .rev()
                .find_map(|u| match u {
                    ViewUpdate::List(l) => Some(l),
                    _ => None,
                })
                .expect("no list rendered")
        }

        fn last_footer(&self) -> Option<FooterSummary> {
            self.updates
                .iter()
                .rev()
                .find_map(|u| match u {
                    ViewUpdate::Footer(f) => Some(*f),
                    _ => None,
                })
                .flatten()
        }

        fn search_results(&self) -> Vec<&LabelRecord> {
            self.updates
                .iter()
                .filter_map(|u| match u {
                    ViewUpdate::SearchResult(r) => Some(r),
                    _ => None,
                })
                .collect()
        }
    }

    #[derive(Default)]
    struct RecordingFeedback {
        cues: Vec<Cue>,
    }

    impl Feedback for RecordingFeedback {
        fn play(&mut self, cue: Cue) {
            self.cues.push(cue);
        }
    }

    type TestController = Controller<MemoryStore, RecordingView, RecordingFeedback>;

    fn controller() -> TestController {
        Controller::new(
            Persistence::new(MemoryStore::new()),
            RecordingView::default(),
            RecordingFeedback::default(),
        )
    }

    fn row(code: &str, route: &str, city: &str, dest: &str, reference: &str) -> TableRow {
        [
            ("Etiqueta", code),
            ("Ruta", route),
            ("Ciudad", city),
            ("Destino", dest),
            ("Referencia", reference),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn scenario_rows() -> Vec<TableRow> {
        vec![
            row("A1", "R1", "C1", "D1", "Ref1"),
            row("A2", "R1", "C1", "D1", "Ref1"),
            row("B1", "R2", "C2", "D2", "Ref2"),
        ]
    }

    fn imported() -> TestController {
        let mut c = controller();
        c.dispatch(Command::Import(scenario_rows())).unwrap();
        c
    }

    fn groups(view: &ListView) -> &[crate::hierarchy::GroupSummary] {
        match &view.listing {
            Listing::Groups { groups, .. } => groups,
            other => panic!("unexpected listing: {:?}", other),
        }
    }

    #[test]
    fn test_import_renders_root_listing() {
        let c = imported();
        let list = c.view().last_list();

        assert_eq!(list.level(), Level::Routes);
        assert!(!list.can_go_back);
        let g = groups(list);
        assert_eq!(g.len(), 2);
        assert_eq!((g[0].value.as_str(), g[0].validated, g[0].total), ("R1", 0, 2));
        assert_eq!((g[1].value.as_str(), g[1].validated, g[1].total), ("R2", 0, 1));
        assert!(!g[0].is_complete() && !g[1].is_complete());

        assert_eq!(c.state().current_view, Screen::List);
        assert_eq!(c.view().last_footer(), Some(FooterSummary { validated: 0, total: 3 }));
        assert!(c.persistence().store().get(STORAGE_KEY).unwrap().is_some());
    }

    #[test]
    fn test_scan_found_then_duplicate() {
        let mut c = imported();

        match c.submit_scan("a1") {
            ScanOutcome::Found(r) => {
                assert_eq!(r.code, "A1");
                assert!(!r.validated);
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(c.submit_scan("A1"), ScanOutcome::Duplicate);

        assert_eq!(c.feedback().cues, vec![Cue::Success, Cue::Error]);
        assert_eq!(c.view().search_results().len(), 1);
    }

    #[test]
    fn test_scan_not_found_and_empty() {
        let mut c = imported();
        assert_eq!(c.submit_scan("zzz"), ScanOutcome::NotFound);
        assert_eq!(c.submit_scan("   "), ScanOutcome::Empty);
        assert_eq!(c.feedback().cues, vec![Cue::Error]);
        // 未登録コードも重複扱いになる
        assert_eq!(c.submit_scan("ZZZ"), ScanOutcome::Duplicate);
    }

    #[test]
    fn test_toggle_updates_badges() {
        let mut c = imported();

        assert_eq!(c.toggle("A1"), Some(true));
        assert!(c.enter("R1"));
        assert!(c.back());
        let g = groups(c.view().last_list());
        assert_eq!(g[0].badge(), "1/2");
        assert!(!g[0].is_complete());

        assert_eq!(c.toggle("A2"), Some(true));
        let g = groups(c.view().last_list());
        assert_eq!(g[0].badge(), "2/2");
        assert!(g[0].is_complete());
        assert_eq!(c.view().last_footer(), Some(FooterSummary { validated: 2, total: 3 }));
    }

    #[test]
    fn test_toggle_twice_restores_value() {
        let mut c = imported();
        let before = c.state().records[0].validated;
        c.toggle("A1");
        c.toggle("A1");
        assert_eq!(c.state().records[0].validated, before);
    }

    #[test]
    fn test_toggle_is_exact_match_and_unknown_is_noop() {
        let mut c = imported();
        let before = c.state().clone();
        let rendered = c.view().updates.len();

        assert_eq!(c.toggle("a1"), None);
        assert_eq!(c.toggle("nope"), None);
        assert_eq!(c.state(), &before);
        assert_eq!(c.view().updates.len(), rendered);
    }

    #[test]
    fn test_toggle_refreshes_displayed_search_result() {
        let mut c = imported();
        c.submit_scan("A2");
        c.toggle("A2");

        let results = c.view().search_results();
        assert_eq!(results.len(), 2);
        assert!(results[1].validated);

        c.close_search();
        c.toggle("A2");
        assert_eq!(c.view().search_results().len(), 2);
    }

    #[test]
    fn test_toggle_refreshes_label_level() {
        let mut c = imported();
        for v in ["R1", "C1", "D1", "Ref1"] {
            assert!(c.enter(v));
        }
        c.toggle("A2");

        match &c.view().last_list().listing {
            Listing::Labels(labels) => {
                assert_eq!(labels.len(), 2);
                assert!(!labels[0].validated);
                assert!(labels[1].validated);
            }
            other => panic!("unexpected listing: {:?}", other),
        }
        assert_eq!(c.state().navigation_stack.len(), 4);
    }

    #[test]
    fn test_back_at_root_is_noop() {
        let mut c = imported();
        let before = c.state().clone();
        assert_eq!(c.dispatch(Command::Back).unwrap(), Outcome::Unchanged);
        assert_eq!(c.state(), &before);
    }

    #[test]
    fn test_back_renders_shallower_level() {
        let mut c = imported();
        c.enter("R1");
        c.enter("C1");
        assert_eq!(c.view().last_list().breadcrumb, vec!["R1", "C1"]);

        c.back();
        let list = c.view().last_list();
        assert_eq!(list.level(), Level::Cities);
        assert!(list.can_go_back);
        assert_eq!(list.breadcrumb, vec!["R1"]);
    }

    #[test]
    fn test_reimport_resets_validation_navigation_and_guard() {
        let mut c = imported();
        c.toggle("A1");
        c.enter("R1");
        c.submit_scan("A1");

        c.dispatch(Command::Import(scenario_rows())).unwrap();

        assert!(c.state().records.iter().all(|r| !r.validated));
        assert!(c.state().navigation_stack.is_empty());
        assert!(c.state().current_filter.is_empty());
        assert!(matches!(c.submit_scan("A1"), ScanOutcome::Found(_)));
    }

    #[test]
    fn test_failed_import_leaves_state_unchanged() {
        let mut c = imported();
        c.toggle("B1");
        let before = c.state().clone();

        c.begin_import().unwrap();
        let result = c.finish_import(Err(Error::InvalidFormat("not a workbook".into())));

        assert!(matches!(result, Err(Error::InvalidFormat(_))));
        assert_eq!(c.state(), &before);
        assert!(!c.import_in_progress());
        assert!(c
            .view()
            .updates
            .iter()
            .any(|u| matches!(u, ViewUpdate::Alert(m) if m.contains("verifica el formato"))));
    }

    #[test]
    fn test_concurrent_import_is_rejected() {
        let mut c = controller();
        c.begin_import().unwrap();
        assert!(matches!(c.begin_import(), Err(Error::ImportInProgress)));
        assert!(matches!(
            c.dispatch(Command::Import(scenario_rows())),
            Err(Error::ImportInProgress)
        ));

        c.finish_import(Ok(scenario_rows())).unwrap();
        assert_eq!(c.state().records.len(), 3);
        assert!(c.begin_import().is_ok());
    }

    #[test]
    fn test_export() {
        let mut c = controller();
        assert!(matches!(c.dispatch(Command::Export), Err(Error::NothingToExport)));

        let mut c = imported();
        c.toggle("A2");
        match c.dispatch(Command::Export).unwrap() {
            Outcome::Exported(rows) => {
                assert_eq!(rows.len(), 3);
                let statuses: Vec<_> = rows.iter().map(|r| r.status.as_str()).collect();
                assert_eq!(statuses, vec!["", "OK", ""]);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut c = imported();
        c.enter("R1");
        c.toggle("A1");
        c.submit_scan("A1");

        assert_eq!(c.dispatch(Command::Clear).unwrap(), Outcome::Cleared);
        assert!(c.state().records.is_empty());
        assert!(c.state().navigation_stack.is_empty());
        assert_eq!(c.state().current_view, Screen::Welcome);
        assert_eq!(c.view().updates.last(), Some(&ViewUpdate::Footer(None)));
        assert_eq!(c.submit_scan("A1"), ScanOutcome::NotFound);
    }

    #[test]
    fn test_session_restore_at_last_level() {
        let mut c = imported();
        c.enter("R1");
        c.enter("C1");
        c.toggle("A1");

        let store = c.persistence().store().clone();
        let mut resumed = Controller::new(
            Persistence::new(store),
            RecordingView::default(),
            RecordingFeedback::default(),
        );

        assert!(resumed.start());
        assert_eq!(resumed.current_level(), Level::Destinations);
        assert_eq!(resumed.state().navigation_stack.len(), 2);
        assert!(resumed.state().records[0].validated);
        assert_eq!(resumed.view().last_list().level(), Level::Destinations);

        // 復元後もスタックを使って戻れる
        assert!(resumed.back());
        assert!(resumed.back());
        assert!(!resumed.back());
    }

    #[test]
    fn test_start_without_snapshot_shows_welcome() {
        let mut c = controller();
        assert!(!c.start());
        assert_eq!(c.view().updates, vec![ViewUpdate::Welcome]);
    }

    #[test]
    fn test_restore_does_not_touch_stack() {
        let mut c = imported();
        c.enter("R1");
        let stack = c.state().navigation_stack.clone();
        c.dispatch(Command::Restore).unwrap();
        c.dispatch(Command::Restore).unwrap();
        assert_eq!(c.state().navigation_stack, stack);
    }

    #[test]
    fn test_offer_export_only_with_validated_labels() {
        let mut c = imported();
        assert!(!c.should_offer_export());
        c.toggle("B1");
        assert!(c.should_offer_export());
    }
}
