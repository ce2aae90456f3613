//! モデル評価パイプラインステージ
//!
//! 学習済みモデルとテストデータから回帰メトリクスを計算し、ローカル
//! ファイルへ保存した上でトラッキングサービスに記録します。1プロセス
//! につき1回の評価を逐次実行するだけで、並行処理やリトライはありません。

use crate::config::{EvaluationConfig, TrackingCredentials};
use crate::dataset::TestDataset;
use crate::error::{Error, Result};
use crate::metrics::{evaluate_regression, MetricsReport};
use crate::model::LinearModel;
use crate::tracking::{TrackingClient, TrackingError};

/// 評価ステージ本体
pub struct ModelEvaluator {
    config: EvaluationConfig,
}

impl ModelEvaluator {
    pub fn new(config: EvaluationConfig) -> Self {
        ModelEvaluator { config }
    }

    /// 評価を実行する
    ///
    /// 処理は次の順序で行われます。
    ///
    /// 1. テストデータの読み込み
    /// 2. モデルアーティファクトの読み込み
    /// 3. 目的変数列による特徴量/ラベルの分割（目的変数は特徴量から除外）
    /// 4. 予測
    /// 5. メトリクス計算
    /// 6. メトリクスのローカル保存（トラッキング呼び出しより必ず先）
    /// 7. トラッキングサービスへの記録
    ///
    /// 手順1〜6の失敗は致命的でそのまま伝播し、メトリクスファイルは
    /// 書き込まれません。手順7の失敗は種別で分岐します。
    /// [`TrackingError::Rejected`]のみ警告ログを出して握りつぶし、
    /// 評価自体は成功として扱います（ローカルのメトリクスファイルが
    /// 成功の記録になります）。それ以外は再送出します。
    pub fn run(&self) -> Result<MetricsReport> {
        let cfg = &self.config;

        log::info!("テストデータを読み込みます: {}", cfg.test_data_path.display());
        let dataset = TestDataset::from_csv(&cfg.test_data_path)?;

        log::info!("モデルを読み込みます: {}", cfg.model_path.display());
        let model = LinearModel::load(&cfg.model_path)?;

        let (features, actual) = dataset.split_target(&cfg.target_column)?;
        let predicted = model.predict(&features)?;

        let report = evaluate_regression(&actual, &predicted)?;
        report.write_json(&cfg.metrics_path)?;
        log::info!(
            "メトリクスを保存しました: {} (rmse={:.6}, mae={:.6}, r2={:.6})",
            cfg.metrics_path.display(),
            report.rmse,
            report.mae,
            report.r2
        );

        match self.track(&model, &report) {
            Ok(()) => {
                log::info!("トラッキングサービスへの記録が完了しました");
            }
            Err(e) if !tracking_failure_is_fatal(&e) => {
                log::warn!("トラッキングサービスがリクエストを拒否しました: {}", e);
            }
            Err(e) => {
                log::error!("トラッキングサービスへの記録に失敗しました: {}", e);
                return Err(Error::Tracking(e));
            }
        }

        Ok(report)
    }

    /// パラメータ・メトリクス・モデルをトラッキングサービスに記録する
    fn track(
        &self,
        model: &LinearModel,
        report: &MetricsReport,
    ) -> std::result::Result<(), TrackingError> {
        let cfg = &self.config;

        // リモートバックエンドの場合のみ認証情報が必要。欠落していれば
        // ネットワーク呼び出しの前にここで失敗する
        let credentials = if TrackingClient::is_remote_uri(&cfg.tracking_uri)? {
            Some(TrackingCredentials::from_env()?)
        } else {
            None
        };

        let client = TrackingClient::connect(&cfg.tracking_uri, credentials)?;
        let mut run = client.start_run(&cfg.experiment_name)?;

        for (name, value) in &cfg.params {
            run.log_param(name, &param_value_string(value))?;
        }

        run.log_metric("rmse", report.rmse)?;
        run.log_metric("r2", report.r2)?;
        run.log_metric("mae", report.mae)?;

        if client.is_remote() {
            run.register_model(model, &cfg.registered_model_name)?;
        } else {
            run.log_model(model)?;
        }

        run.finish()
    }
}

/// トラッキングの失敗が致命的かどうかを種別で判定する
///
/// 拒否応答（Rejected）だけが回復可能です。ローカルのメトリクス保存は
/// 既に完了しているため、評価の成功記録は失われません。
fn tracking_failure_is_fatal(err: &TrackingError) -> bool {
    !matches!(err, TrackingError::Rejected { .. })
}

fn param_value_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
