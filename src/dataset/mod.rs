//! テストデータセットモジュール
//!
//! 区切りテキスト形式のテストデータを列指向の数値テーブルとして読み込み、
//! 特徴量と目的変数に分割します。

use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use csv::ReaderBuilder;

use crate::error::{Error, Result};

/// 列指向の数値テーブル
#[derive(Debug, Clone)]
pub struct TestDataset {
    column_names: Vec<String>,
    columns: Vec<Vec<f64>>,
    row_count: usize,
}

/// 行指向の特徴量行列
///
/// 目的変数の列は含まれません。行の順序はデータセットの行順序と同じです。
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    pub feature_names: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    /// 行数を返す
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

impl TestDataset {
    /// CSVファイルからテストデータセットを読み込む
    ///
    /// ヘッダー行は必須で、全ての値は数値として解釈できる必要があります。
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            Error::Format(format!(
                "テストデータ '{}' を開けません: {}",
                path.display(),
                e
            ))
        })?;

        // CSVリーダーを設定
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        // ヘッダー行を取得
        let column_names: Vec<String> = rdr
            .headers()
            .map_err(Error::Csv)?
            .iter()
            .map(|h| h.to_string())
            .collect();

        if column_names.is_empty() || column_names.iter().all(String::is_empty) {
            return Err(Error::Format(format!(
                "CSV '{}' にヘッダー行がありません",
                path.display()
            )));
        }

        let mut seen = HashSet::new();
        for name in &column_names {
            if !seen.insert(name) {
                return Err(Error::DuplicateColumnName(name.clone()));
            }
        }

        // データを列ごとに収集
        let mut columns: Vec<Vec<f64>> = vec![Vec::new(); column_names.len()];
        let mut row_count = 0;

        for (row_idx, result) in rdr.records().enumerate() {
            let record = result.map_err(Error::Csv)?;
            if record.len() != column_names.len() {
                return Err(Error::Format(format!(
                    "行 {} の列数が一致しません: 期待値 {}, 実際 {}",
                    row_idx + 1,
                    column_names.len(),
                    record.len()
                )));
            }
            for (col_idx, value) in record.iter().enumerate() {
                let parsed = value.parse::<f64>().map_err(|_| {
                    Error::Format(format!(
                        "値 '{}' (行 {}, 列 '{}') を数値として解釈できません",
                        value,
                        row_idx + 1,
                        column_names[col_idx]
                    ))
                })?;
                columns[col_idx].push(parsed);
            }
            row_count += 1;
        }

        if row_count == 0 {
            return Err(Error::EmptyData(format!(
                "テストデータ '{}' にデータ行がありません",
                path.display()
            )));
        }

        Ok(TestDataset {
            column_names,
            columns,
            row_count,
        })
    }

    /// 列名の一覧を返す
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// 行数を返す
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// 指定した列のデータを返す
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.column_names
            .iter()
            .position(|c| c == name)
            .map(|idx| self.columns[idx].as_slice())
    }

    /// 目的変数列を基準にデータセットを特徴量と目的変数に分割する
    ///
    /// 目的変数の列は特徴量行列から必ず除外されます。
    pub fn split_target(&self, target: &str) -> Result<(FeatureMatrix, Vec<f64>)> {
        let target_idx = self
            .column_names
            .iter()
            .position(|c| c == target)
            .ok_or_else(|| {
                Error::ColumnNotFound(format!(
                    "目的変数列 '{}' がありません。利用可能な列: {:?}",
                    target, self.column_names
                ))
            })?;

        let labels = self.columns[target_idx].clone();

        let feature_names: Vec<String> = self
            .column_names
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != target_idx)
            .map(|(_, name)| name.clone())
            .collect();

        let mut rows = Vec::with_capacity(self.row_count);
        for row_idx in 0..self.row_count {
            let row: Vec<f64> = self
                .columns
                .iter()
                .enumerate()
                .filter(|(idx, _)| *idx != target_idx)
                .map(|(_, col)| col[row_idx])
                .collect();
            rows.push(row);
        }

        Ok((
            FeatureMatrix {
                feature_names,
                rows,
            },
            labels,
        ))
    }
}
