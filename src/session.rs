//! セッションの組み立てと、端末以外に依存しない操作
//!
//! コントローラに実ファイルのストア・端末View・ベルを差し込む。

use crate::codec;
use crate::config::Config;
use crate::error::{LabelValidatorError, Result};
use crate::storage::FileStore;
use crate::terminal::{Bell, TerminalView};
use chrono::Utc;
use label_validator_common::{
    Command, Controller, Error, Feedback, Outcome, Persistence, RecordStore, SnapshotStore,
    TableCodec, View, ViewUpdate,
};
use std::path::{Path, PathBuf};
use tracing::debug;

/// CLIで使うコントローラ
pub type Session = Controller<FileStore, TerminalView, Bell>;

/// 保存済みスナップショットからセッションを開く
///
/// showがfalseなら復元時の一覧表示を抑える
pub fn open(config: &Config, show: bool) -> Result<Session> {
    let dir = config.storage_dir()?;
    debug!(dir = %dir.display(), "opening session");

    let mut session = Controller::new(Persistence::new(FileStore::new(dir)), TerminalView::new(), Bell);
    session.view_mut().set_muted(!show);
    session.start();
    session.view_mut().set_muted(false);
    Ok(session)
}

/// ファイルを非同期に読み込んでインポート
///
/// 読み込み中の二重インポートはコントローラが拒否する
pub async fn import_file<S, V, F, C>(
    session: &mut Controller<S, V, F>,
    codec: &C,
    path: &Path,
) -> Result<usize>
where
    S: SnapshotStore,
    V: View,
    F: Feedback,
    C: TableCodec,
{
    if !path.exists() {
        return Err(LabelValidatorError::FileNotFound(path.display().to_string()));
    }

    session.begin_import()?;
    let rows = match tokio::fs::read(path).await {
        Ok(bytes) => codec.read_rows(&bytes),
        Err(e) => Err(Error::InvalidFormat(e.to_string())),
    };
    Ok(session.finish_import(rows)?)
}

/// 結果をディレクトリへエクスポートしてファイルパスを返す
pub fn export_to_dir<S, V, F>(session: &mut Controller<S, V, F>, dir: &Path) -> Result<PathBuf>
where
    S: SnapshotStore,
    V: View,
    F: Feedback,
{
    let rows = match session.dispatch(Command::Export)? {
        Outcome::Exported(rows) => rows,
        _ => return Err(Error::NothingToExport.into()),
    };

    session.view_mut().render(ViewUpdate::Loading(true));
    let result = codec::write_export(&rows, dir, Utc::now());
    session.view_mut().render(ViewUpdate::Loading(false));
    result
}

/// 現在の一覧にある値か確認してから一段進む
pub fn enter_value<S, V, F>(session: &mut Controller<S, V, F>, value: &str) -> Result<()>
where
    S: SnapshotStore,
    V: View,
    F: Feedback,
{
    let state = session.state();
    let available = RecordStore::new(&state.records).distinct_values(&state.current_filter);

    if !available.contains(&value) {
        let hint = if available.is_empty() {
            "ninguno".to_string()
        } else {
            available.join(", ")
        };
        return Err(LabelValidatorError::UnknownValue(format!(
            "{} (disponibles: {})",
            value, hint
        )));
    }

    session.dispatch(Command::Enter(value.to_string()))?;
    Ok(())
}
