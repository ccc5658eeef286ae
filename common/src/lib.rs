//! Label Validator Common Library
//!
//! CLIと将来のフロントエンドで共有されるラベル検証のコア:
//! レコードストア、階層ナビゲーション、スキャン重複チェック、
//! インポート/エクスポート行、永続化アダプタ、コントローラ

pub mod types;
pub mod error;
pub mod hierarchy;
pub mod navigation;
pub mod scan;
pub mod import;
pub mod export;
pub mod persistence;
pub mod controller;

pub use types::{AppState, Field, Filter, LabelRecord, Level, NavFrame, Screen};
pub use error::{Error, Result};
pub use hierarchy::{FooterSummary, GroupSummary, Listing, RecordStore};
pub use scan::{normalize_code, ScanCheck, ScanGuard, ScanInput};
pub use import::{records_from_rows, TableCodec, TableRow};
pub use export::{export_file_name, export_rows, ExportRow};
pub use persistence::{MemoryStore, Persistence, SnapshotStore, STORAGE_KEY};
pub use controller::{
    Command, Controller, Cue, Feedback, ListView, Outcome, ScanOutcome, Silent, View, ViewUpdate,
};
