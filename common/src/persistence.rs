//! 状態の永続化モジュール
//!
//! AppStateをJSONにシリアライズしてキーバリューストアへ書き込む。
//! 書き込みはベストエフォートで、失敗はログに残して処理を続ける。
//! 直近のスナップショットはメモリ上にも保持し、ストアが読めない時に使う。

use crate::error::{Error, Result};
use crate::navigation;
use crate::types::AppState;
use chrono::{SecondsFormat, Utc};
use std::collections::HashMap;
use tracing::{debug, error, warn};

/// スナップショットを保存するキー
pub const STORAGE_KEY: &str = "appState_etiquetas";

/// 文字列を保存するキーバリューストア
pub trait SnapshotStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// メモリ上のストア
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// 永続化アダプタ
#[derive(Debug)]
pub struct Persistence<S> {
    store: S,
    mirror: Option<String>,
}

impl<S: SnapshotStore> Persistence<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            mirror: None,
        }
    }

    /// lastSavedを更新して保存。ストアへの書き込みに成功したらtrue
    pub fn save(&mut self, state: &mut AppState) -> bool {
        state.last_saved = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));

        let json = match serde_json::to_string(state) {
            Ok(json) => json,
            Err(e) => {
                error!("Error saving state: {}", e);
                return false;
            }
        };

        self.mirror = Some(json.clone());

        match self.store.set(STORAGE_KEY, &json) {
            Ok(()) => {
                debug!(bytes = json.len(), "state saved");
                true
            }
            Err(e) => {
                error!("Error saving state: {}", e);
                false
            }
        }
    }

    /// スナップショットを読み込む
    ///
    /// ストアに無い（または読めない）場合はメモリ上の控えを使う。
    /// ナビゲーションが壊れていればルートへ戻して返す。
    pub fn load(&self) -> Option<AppState> {
        let stored = match self.store.get(STORAGE_KEY) {
            Ok(Some(json)) => Some(json),
            Ok(None) => None,
            Err(e) => {
                warn!("Error loading state: {}", e);
                None
            }
        };

        let json = stored.or_else(|| self.mirror.clone())?;

        match parse_snapshot(&json) {
            Ok(state) => Some(state),
            Err(e) => {
                error!("Error loading state: {}", e);
                None
            }
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

/// JSONからAppStateを復元
pub fn parse_snapshot(json: &str) -> Result<AppState> {
    let mut state: AppState = serde_json::from_str(json).map_err(Error::Json)?;
    navigation::repair(&mut state);
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LabelRecord, Screen};

    /// 常に失敗するストア
    #[derive(Default)]
    struct BrokenStore;

    impl SnapshotStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(Error::Storage("quota exceeded".into()))
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
            Err(Error::Storage("quota exceeded".into()))
        }
    }

    fn sample_state() -> AppState {
        AppState {
            records: vec![LabelRecord {
                code: "A1".into(),
                route: "R1".into(),
                ..Default::default()
            }],
            current_view: Screen::List,
            ..Default::default()
        }
    }

    #[test]
    fn test_save_and_load() {
        let mut p = Persistence::new(MemoryStore::new());
        let mut state = sample_state();
        assert!(p.save(&mut state));
        assert!(state.last_saved.is_some());

        let loaded = p.load().expect("snapshot");
        assert_eq!(loaded, state);
    }

    #[test]
    fn test_load_without_snapshot() {
        let p = Persistence::new(MemoryStore::new());
        assert!(p.load().is_none());
    }

    #[test]
    fn test_broken_store_falls_back_to_mirror() {
        let mut p = Persistence::new(BrokenStore);
        let mut state = sample_state();
        assert!(!p.save(&mut state));

        let loaded = p.load().expect("mirror snapshot");
        assert_eq!(loaded.records, state.records);
    }

    #[test]
    fn test_corrupted_snapshot_is_ignored() {
        let mut store = MemoryStore::new();
        store.set(STORAGE_KEY, "{ invalid json }").unwrap();
        let p = Persistence::new(store);
        assert!(p.load().is_none());
    }

    #[test]
    fn test_snapshot_layout() {
        let mut p = Persistence::new(MemoryStore::new());
        let mut state = sample_state();
        p.save(&mut state);

        let raw = p.store().get(STORAGE_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value.get("etiquetas").unwrap().is_array());
        assert!(value.get("navigationStack").unwrap().is_array());
        assert!(value.get("currentFilter").unwrap().is_object());
        assert_eq!(value.get("currentView").unwrap(), "list");
        assert!(value.get("lastSaved").unwrap().is_string());
    }

    #[test]
    fn test_inconsistent_navigation_is_reset_on_load() {
        let json = r#"{"etiquetas":[],"navigationStack":[],"currentFilter":{"Ruta":"R1"},"currentView":"list"}"#;
        let state = parse_snapshot(json).unwrap();
        assert!(state.current_filter.is_empty());
        assert_eq!(state.current_view, Screen::List);
    }
}
