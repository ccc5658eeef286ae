use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "label-validator")]
#[command(about = "Validación de etiquetas: importar, recorrer, escanear y exportar", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Excelファイルからラベルを読み込む（既存データは置き換え）
    Import {
        /// 入力ファイル (xlsx/xls/ods)
        #[arg(required = true)]
        file: PathBuf,
    },

    /// 検証結果をExcelに出力
    Export {
        /// 出力ディレクトリ（省略時は設定値またはカレント）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 一覧画面を対話的に操作
    Browse,

    /// ラベルコードをスキャン（コード省略時は対話モード）
    Scan {
        /// スキャンするコード
        codes: Vec<String>,

        /// 見つかった未検証ラベルを自動で検証済みにする
        #[arg(long)]
        validate: bool,
    },

    /// 検証済みフラグを切り替える
    Toggle {
        /// ラベルコード（完全一致）
        #[arg(required = true)]
        code: String,
    },

    /// 一段深いレベルへ進む
    Enter {
        /// 現在の一覧にある値
        #[arg(required = true)]
        value: String,
    },

    /// 一段戻る
    Back,

    /// 現在のレベルと集計を表示
    Status,

    /// 全データを消去
    Clear {
        /// 確認をスキップ
        #[arg(short, long)]
        yes: bool,
    },

    /// 終了（必要ならエクスポートしてから全データを消去）
    Exit {
        /// 確認をスキップ（エクスポートも行う）
        #[arg(short, long)]
        yes: bool,

        /// エクスポート先ディレクトリ
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 設定を表示/編集
    Config {
        /// 保存先ディレクトリを設定
        #[arg(long)]
        set_storage_dir: Option<PathBuf>,

        /// エクスポート先ディレクトリを設定
        #[arg(long)]
        set_export_dir: Option<PathBuf>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
