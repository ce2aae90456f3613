//! 評価ステージの設定モジュール
//!
//! ステージ設定はYAMLファイルから一度だけ読み込まれ、以降は不変です。
//! トラッキングサービスの認証情報は設定ファイルには置かず、リモート
//! バックエンドへ接続する直前に環境変数から明示的に取得します。

use std::collections::BTreeMap;
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::tracking::TrackingError;

/// トラッキング認証情報のユーザー名を保持する環境変数
pub const TRACKING_USERNAME_VAR: &str = "MLEVAL_TRACKING_USERNAME";
/// トラッキング認証情報のパスワードを保持する環境変数
pub const TRACKING_PASSWORD_VAR: &str = "MLEVAL_TRACKING_PASSWORD";

fn default_experiment_name() -> String {
    "default".to_string()
}

fn default_registered_model_name() -> String {
    "regression-model".to_string()
}

/// 評価ステージの不変設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// テストデータ(CSV)のパス
    pub test_data_path: PathBuf,
    /// 学習済みモデルアーティファクトのパス
    pub model_path: PathBuf,
    /// メトリクスを書き出すローカルファイルのパス
    pub metrics_path: PathBuf,
    /// 目的変数の列名
    pub target_column: String,
    /// トラッキングサービスのURI（スキームでバックエンドを選択）
    pub tracking_uri: String,
    /// 記録先のエクスペリメント名
    #[serde(default = "default_experiment_name")]
    pub experiment_name: String,
    /// リモートバックエンドでモデルを登録する際の名前
    #[serde(default = "default_registered_model_name")]
    pub registered_model_name: String,
    /// トラッキングに記録するハイパーパラメータ
    #[serde(default)]
    pub params: BTreeMap<String, serde_json::Value>,
}

impl EvaluationConfig {
    /// YAMLファイルから設定を読み込む
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref()).map_err(Error::Io)?;
        let config: EvaluationConfig = serde_yaml::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// 設定値の妥当性を検証する
    pub fn validate(&self) -> Result<()> {
        if self.target_column.trim().is_empty() {
            return Err(Error::Config("target_columnが指定されていません".to_string()));
        }
        if self.tracking_uri.trim().is_empty() {
            return Err(Error::Config("tracking_uriが指定されていません".to_string()));
        }
        Ok(())
    }
}

/// トラッキングサービスの認証情報
///
/// モジュール初期化時の暗黙的な環境変数参照は行いません。リモート
/// バックエンドが必要とする時点で[`TrackingCredentials::from_env`]を
/// 呼び、欠落していればネットワーク呼び出しの前に明示的に失敗します。
#[derive(Clone)]
pub struct TrackingCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for TrackingCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // パスワードはログに出さない
        f.debug_struct("TrackingCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl TrackingCredentials {
    /// 環境変数から認証情報を取得する
    pub fn from_env() -> std::result::Result<Self, TrackingError> {
        let username = read_var(TRACKING_USERNAME_VAR)?;
        let password = read_var(TRACKING_PASSWORD_VAR)?;
        Ok(TrackingCredentials { username, password })
    }
}

fn read_var(name: &'static str) -> std::result::Result<String, TrackingError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(TrackingError::MissingCredentials(name)),
    }
}
