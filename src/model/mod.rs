//! 回帰モデルアーティファクトモジュール
//!
//! 学習ステージが書き出した線形回帰モデルのアーティファクトを読み込み、
//! 予測に使用します。学習そのものはこのステージの範囲外です。

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dataset::FeatureMatrix;
use crate::error::{Error, Result};

/// 学習済み線形回帰モデルのアーティファクト
///
/// 係数の並びは `feature_names` の並びに対応します。予測時の特徴量の
/// 順序はアーティファクト側が決定します。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModel {
    /// モデルの種類（例: "elastic_net"）
    pub family: String,
    /// 特徴量名（係数と同じ並び）
    pub feature_names: Vec<String>,
    /// 回帰係数
    pub coefficients: Vec<f64>,
    /// 切片
    pub intercept: f64,
    /// 学習時刻
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trained_at: Option<DateTime<Utc>>,
}

impl LinearModel {
    /// アーティファクトファイルからモデルを読み込む
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            Error::ModelLoad(format!(
                "アーティファクト '{}' を開けません: {}",
                path.display(),
                e
            ))
        })?;
        let model: LinearModel =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| {
                Error::ModelLoad(format!(
                    "アーティファクト '{}' を解釈できません: {}",
                    path.display(),
                    e
                ))
            })?;

        if model.coefficients.len() != model.feature_names.len() {
            return Err(Error::ModelLoad(format!(
                "係数と特徴量名の数が一致しません: {} vs {}",
                model.coefficients.len(),
                model.feature_names.len()
            )));
        }

        Ok(model)
    }

    /// モデルをアーティファクトファイルに書き出す
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref()).map_err(Error::Io)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    /// 特徴量行列に対する予測値を返す
    ///
    /// 特徴量の列はアーティファクトの `feature_names` の並びで参照されます。
    /// モデルが要求する特徴量がデータセットに存在しない場合はエラーです。
    pub fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>> {
        let indices: Vec<usize> = self
            .feature_names
            .iter()
            .map(|name| {
                features
                    .feature_names
                    .iter()
                    .position(|f| f == name)
                    .ok_or_else(|| {
                        Error::ColumnNotFound(format!(
                            "モデルが要求する特徴量 '{}' がデータセットにありません",
                            name
                        ))
                    })
            })
            .collect::<Result<_>>()?;

        let mut predictions = Vec::with_capacity(features.rows.len());
        for row in &features.rows {
            let mut pred = self.intercept;
            for (coef, &idx) in self.coefficients.iter().zip(indices.iter()) {
                pred += coef * row[idx];
            }
            predictions.push(pred);
        }

        Ok(predictions)
    }
}
