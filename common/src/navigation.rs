//! 階層ナビゲーションモジュール
//!
//! Routes → Cities → Destinations → References → Labels の状態遷移。
//! 状態はAppStateのcurrent_filterとnavigation_stackだけで表現し、
//! 一覧はその都度RecordStoreから再計算する。

use crate::hierarchy::{Listing, RecordStore};
use crate::types::{AppState, Level, NavFrame};
use tracing::{debug, warn};

/// 現在のレベル
pub fn current_level(state: &AppState) -> Level {
    state.current_filter.level()
}

/// 現在のレベルの一覧を計算（状態は変更しない）
pub fn listing(state: &AppState) -> Listing {
    RecordStore::new(&state.records).listing(&state.current_filter)
}

/// 一段深いレベルへ進む
///
/// 現在のフィルタをフレームとして積んでから値を追加する。
/// Labelsレベルでは何もしない（false）。
pub fn enter(state: &mut AppState, value: &str) -> bool {
    let Some(next) = state.current_filter.extended(value) else {
        debug!(value, "enter ignored at label level");
        return false;
    };

    state.navigation_stack.push(NavFrame {
        level: current_level(state),
        filter: state.current_filter.clone(),
    });
    state.current_filter = next;
    debug!(level = ?current_level(state), value, "entered");
    true
}

/// 一段戻る
///
/// スタックが空なら何もしない（false）。フレームを再度積むことはない。
pub fn back(state: &mut AppState) -> bool {
    let Some(frame) = state.navigation_stack.pop() else {
        return false;
    };

    state.current_filter = frame.filter;
    debug!(level = ?frame.level, "navigated back");
    true
}

/// ルートへ戻す（フィルタとスタックを空にする）
pub fn reset(state: &mut AppState) {
    state.navigation_stack.clear();
    state.current_filter = Default::default();
}

/// 読み込んだスナップショットの整合性を確認し、壊れていればルートへ戻す
pub fn repair(state: &mut AppState) -> bool {
    if state.navigation_is_consistent() {
        return false;
    }

    warn!(
        depth = state.current_filter.depth(),
        stack = state.navigation_stack.len(),
        "inconsistent navigation in snapshot, resetting to routes"
    );
    reset(state);
    true
}
