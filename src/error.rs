use thiserror::Error;

use crate::tracking::TrackingError;

/// エラー型の定義
///
/// 評価ステージのエラーは4系統に分かれます。入力データの読み込み失敗、
/// モデルアーティファクトの読み込み失敗、メトリクス計算の失敗、
/// そしてトラッキングサービスの失敗（[`TrackingError`]として保持）です。
#[derive(Error, Debug)]
pub enum Error {
    #[error("入出力エラー")]
    Io(#[source] std::io::Error),

    #[error("CSVエラー")]
    Csv(#[source] csv::Error),

    #[error("JSONエラー")]
    Json(#[source] serde_json::Error),

    #[error("YAMLエラー")]
    Yaml(#[source] serde_yaml::Error),

    #[error("列が見つかりません: {0}")]
    ColumnNotFound(String),

    #[error("列名が重複しています: {0}")]
    DuplicateColumnName(String),

    #[error("データがありません: {0}")]
    EmptyData(String),

    #[error("次元不一致エラー: {0}")]
    DimensionMismatch(String),

    #[error("目的変数の分散がゼロのためR^2を定義できません: {0}")]
    ZeroVariance(String),

    #[error("モデル読み込みエラー: {0}")]
    ModelLoad(String),

    #[error("データ形式エラー: {0}")]
    Format(String),

    #[error("設定エラー: {0}")]
    Config(String),

    #[error("無効な操作です: {0}")]
    InvalidOperation(String),

    #[error("トラッキングエラー: {0}")]
    Tracking(#[from] TrackingError),
}

/// Resultの型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Csv(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Yaml(err)
    }
}
