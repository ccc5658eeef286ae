//! ラベル検証の型定義
//!
//! CLIと将来のフロントエンドで共有される型:
//! - LabelRecord: インポートした1行（ラベル1枚）
//! - Field / Level: ルート→都市→配送先→参照→ラベルの階層
//! - Filter / NavFrame: ドリルダウン状態と戻りスタック
//! - AppState: スナップショットとして永続化される単位

use serde::{Deserialize, Serialize};

/// ラベル1枚分のレコード
///
/// シリアライズ時のフィールド順は宣言順で固定（差分比較のため）。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelRecord {
    #[serde(rename = "Referencia")]
    pub reference: String,

    /// スキャン対象のコード（自然キー）
    #[serde(rename = "Etiqueta")]
    pub code: String,

    #[serde(rename = "Destino")]
    pub destination: String,

    #[serde(rename = "Ciudad")]
    pub city: String,

    #[serde(rename = "Ruta")]
    pub route: String,

    #[serde(rename = "validado")]
    pub validated: bool,
}

impl LabelRecord {
    /// 階層フィールドの値を取得
    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::Route => &self.route,
            Field::City => &self.city,
            Field::Destination => &self.destination,
            Field::Reference => &self.reference,
        }
    }
}

/// 階層のグルーピングキー（固定順）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Route,
    City,
    Destination,
    Reference,
}

impl Field {
    /// ドリルダウン順
    pub const ALL: [Field; 4] = [Field::Route, Field::City, Field::Destination, Field::Reference];

    /// スプレッドシートの列名
    pub fn column_name(&self) -> &'static str {
        match self {
            Field::Route => "Ruta",
            Field::City => "Ciudad",
            Field::Destination => "Destino",
            Field::Reference => "Referencia",
        }
    }
}

/// ナビゲーションの階層レベル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[default]
    Routes,
    Cities,
    Destinations,
    References,
    Labels,
}

impl Level {
    /// フィルタに設定済みのフィールド数からレベルを決定
    pub fn from_depth(depth: usize) -> Self {
        match depth {
            0 => Level::Routes,
            1 => Level::Cities,
            2 => Level::Destinations,
            3 => Level::References,
            _ => Level::Labels,
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            Level::Routes => 0,
            Level::Cities => 1,
            Level::Destinations => 2,
            Level::References => 3,
            Level::Labels => 4,
        }
    }

    /// このレベルで一覧表示するフィールド（Labelsはレコードそのもの）
    pub fn grouping_field(&self) -> Option<Field> {
        Field::ALL.get(self.depth()).copied()
    }

    /// 画面見出し
    pub fn title(&self) -> &'static str {
        match self {
            Level::Routes => "Rutas",
            Level::Cities => "Ciudades",
            Level::Destinations => "Destinos",
            Level::References => "Referencias",
            Level::Labels => "Etiquetas",
        }
    }
}

/// ドリルダウン中の絞り込み条件
///
/// route → city → destination → reference の順に前方から埋まる。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(rename = "Ruta", default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,

    #[serde(rename = "Ciudad", default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(rename = "Destino", default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,

    #[serde(rename = "Referencia", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl Filter {
    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Route => self.route.as_deref(),
            Field::City => self.city.as_deref(),
            Field::Destination => self.destination.as_deref(),
            Field::Reference => self.reference.as_deref(),
        }
    }

    fn slot(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Route => &mut self.route,
            Field::City => &mut self.city,
            Field::Destination => &mut self.destination,
            Field::Reference => &mut self.reference,
        }
    }

    /// 設定済みフィールド数
    pub fn depth(&self) -> usize {
        Field::ALL.iter().filter(|f| self.get(**f).is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.depth() == 0
    }

    /// 未設定フィールドの後ろに設定済みフィールドが無いこと
    pub fn is_prefix_consistent(&self) -> bool {
        let mut seen_unset = false;
        for field in Field::ALL {
            match self.get(field) {
                Some(_) if seen_unset => return false,
                Some(_) => {}
                None => seen_unset = true,
            }
        }
        true
    }

    pub fn level(&self) -> Level {
        Level::from_depth(self.depth())
    }

    /// 次に絞り込むフィールド（全て設定済みならNone）
    pub fn next_field(&self) -> Option<Field> {
        self.level().grouping_field()
    }

    /// 次のフィールドに値を設定したフィルタを返す
    pub fn extended(&self, value: &str) -> Option<Filter> {
        let field = self.next_field()?;
        let mut next = self.clone();
        *next.slot(field) = Some(value.to_string());
        Some(next)
    }

    /// 先頭からdepth個のフィールドだけを残す
    pub fn truncated(&self, depth: usize) -> Filter {
        let mut out = Filter::default();
        for field in Field::ALL.iter().take(depth) {
            *out.slot(*field) = self.get(*field).map(str::to_string);
        }
        out
    }

    /// 設定済みフィールドが全て一致するか
    pub fn matches(&self, record: &LabelRecord) -> bool {
        Field::ALL
            .iter()
            .all(|f| self.get(*f).map_or(true, |v| record.field(*f) == v))
    }

    /// パンくず表示用の値一覧
    pub fn breadcrumb(&self) -> Vec<&str> {
        Field::ALL.iter().filter_map(|f| self.get(*f)).collect()
    }
}

/// 戻りスタックの1フレーム
///
/// 離れたレベルと、そのレベルを再構成するためのフィルタを保持する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavFrame {
    #[serde(rename = "type")]
    pub level: Level,
    #[serde(default)]
    pub filter: Filter,
}

/// トップレベル画面
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Screen {
    #[default]
    Welcome,
    List,
}

/// アプリケーション状態（永続化の単位）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppState {
    #[serde(rename = "etiquetas")]
    pub records: Vec<LabelRecord>,
    pub navigation_stack: Vec<NavFrame>,
    pub current_filter: Filter,
    pub current_view: Screen,
    pub last_saved: Option<String>,
}

impl AppState {
    /// スタック深さとフィルタの整合性
    pub fn navigation_is_consistent(&self) -> bool {
        self.current_filter.is_prefix_consistent()
            && self.navigation_stack.len() == self.current_filter.depth()
    }

    /// 1件でも検証済みがあるか
    pub fn has_validated(&self) -> bool {
        self.records.iter().any(|r| r.validated)
    }
}
