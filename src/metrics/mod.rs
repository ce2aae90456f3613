//! 評価指標モジュール
//!
//! 回帰モデルの評価指標と、メトリクスレポートのローカル保存を提供します。

pub mod regression;

pub use regression::{
    evaluate_regression, mean_absolute_error, mean_squared_error, r2_score,
    root_mean_squared_error,
};

use std::fs;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// 回帰評価のメトリクスレポート
///
/// 1回の評価で一度だけ計算され、ローカルファイルへ保存された上で
/// トラッキングサービスへ転送されます。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
}

impl MetricsReport {
    /// レポートをJSONファイルとして書き出す
    ///
    /// 親ディレクトリが存在しない場合は作成します。
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(Error::Io)?;
            }
        }
        let file = File::create(path).map_err(Error::Io)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }
}
