//! 回帰モデル評価パイプラインステージ
//!
//! 学習済み回帰モデルとホールドアウトしたテストデータを読み込み、
//! RMSE・MAE・R^2を計算してローカルファイルに保存し、パラメータ・
//! メトリクス・モデルアーティファクトを実験トラッキングサービスに
//! 記録します。

pub mod config;
pub mod dataset;
pub mod error;
pub mod evaluation;
pub mod metrics;
pub mod model;
pub mod tracking;

// Re-export commonly used types
pub use config::{EvaluationConfig, TrackingCredentials};
pub use dataset::{FeatureMatrix, TestDataset};
pub use error::{Error, Result};
pub use evaluation::ModelEvaluator;
pub use metrics::MetricsReport;
pub use model::LinearModel;
pub use tracking::{TrackingClient, TrackingError};

// Export version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
