//! スキャン入力モジュール
//!
//! - ScanGuard: セッション内で同じコードの二重スキャンを弾く
//! - ScanInput: 固定長バーコードスキャナ向けの自動送信バッファ

use std::collections::HashSet;
use std::time::{Duration, Instant};

/// 自動送信する入力長の既定値
pub const DEFAULT_AUTO_SUBMIT_LENGTH: usize = 8;

/// 自動送信までの待ち時間の既定値
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// 前後の空白を除去して大文字化
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// 重複チェック結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanCheck {
    New,
    Duplicate,
}

/// セッション内でスキャン済みのコード集合（永続化しない）
#[derive(Debug, Clone, Default)]
pub struct ScanGuard {
    seen: HashSet<String>,
}

impl ScanGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// 未スキャンなら登録してNew、スキャン済みならDuplicate（集合は変えない）
    pub fn check(&mut self, code: &str) -> ScanCheck {
        if self.seen.insert(normalize_code(code)) {
            ScanCheck::New
        } else {
            ScanCheck::Duplicate
        }
    }

    pub fn reset(&mut self) {
        self.seen.clear();
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// 自動送信付きの入力バッファ
///
/// 入力が閾値の長さに達するとdebounce後の送信を予約する。
/// 入力が更新されるたびに予約し直す。
#[derive(Debug, Clone)]
pub struct ScanInput {
    text: String,
    auto_submit_length: usize,
    debounce: Duration,
    due: Option<Instant>,
}

impl Default for ScanInput {
    fn default() -> Self {
        Self::new(DEFAULT_AUTO_SUBMIT_LENGTH, DEFAULT_DEBOUNCE)
    }
}

impl ScanInput {
    pub fn new(auto_submit_length: usize, debounce: Duration) -> Self {
        Self {
            text: String::new(),
            auto_submit_length,
            debounce,
            due: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// 入力内容を更新。自動送信が予約されたらtrue
    pub fn update(&mut self, raw: &str, now: Instant) -> bool {
        self.text = raw.to_string();
        if raw.trim().chars().count() >= self.auto_submit_length {
            self.due = Some(now + self.debounce);
            true
        } else {
            self.due = None;
            false
        }
    }

    /// 予約済みの送信までの残り時間（予約が無ければNone）
    pub fn due_in(&self, now: Instant) -> Option<Duration> {
        self.due.map(|due| due.saturating_duration_since(now))
    }

    /// 予約時刻を過ぎていれば入力を取り出す
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        match self.due {
            Some(due) if now >= due => self.submit(),
            _ => None,
        }
    }

    /// 明示的な送信（Enter）。予約は取り消す
    pub fn submit(&mut self) -> Option<String> {
        self.due = None;
        let text = std::mem::take(&mut self.text);
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.due = None;
    }
}
