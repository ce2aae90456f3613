//! 回帰モデル評価のためのメトリクス

use crate::error::{Error, Result};
use crate::metrics::MetricsReport;

/// 平均二乗誤差（Mean Squared Error）を計算
pub fn mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    validate_pair(y_true, y_pred)?;

    let sum_squared_error = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(&true_val, &pred_val)| {
            let error = true_val - pred_val;
            error * error
        })
        .sum::<f64>();

    Ok(sum_squared_error / y_true.len() as f64)
}

/// 平均絶対誤差（Mean Absolute Error）を計算
pub fn mean_absolute_error(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    validate_pair(y_true, y_pred)?;

    let sum_absolute_error = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(&true_val, &pred_val)| (true_val - pred_val).abs())
        .sum::<f64>();

    Ok(sum_absolute_error / y_true.len() as f64)
}

/// 平均二乗誤差の平方根（Root Mean Squared Error）を計算
pub fn root_mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    let mse = mean_squared_error(y_true, y_pred)?;
    Ok(mse.sqrt())
}

/// 決定係数（R^2 score）を計算
///
/// 全変動（total sum of squares）がゼロの場合、つまり真の値が全て同じ
/// 値の場合、R^2は定義できません。このときNaNを返すのではなく
/// [`Error::ZeroVariance`]で明示的に失敗します。
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    validate_pair(y_true, y_pred)?;

    // 真の値の平均を計算
    let y_mean = y_true.iter().sum::<f64>() / y_true.len() as f64;

    // 全変動（total sum of squares）を計算
    let ss_tot = y_true
        .iter()
        .map(|&true_val| {
            let diff = true_val - y_mean;
            diff * diff
        })
        .sum::<f64>();

    // 残差平方和（residual sum of squares）を計算
    let ss_res = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(&true_val, &pred_val)| {
            let error = true_val - pred_val;
            error * error
        })
        .sum::<f64>();

    if ss_tot == 0.0 {
        return Err(Error::ZeroVariance(format!(
            "真の値が全て {} です",
            y_true[0]
        )));
    }

    Ok(1.0 - (ss_res / ss_tot))
}

/// rmse・mae・r2をまとめて計算しレポートを返す
pub fn evaluate_regression(actual: &[f64], predicted: &[f64]) -> Result<MetricsReport> {
    let rmse = root_mean_squared_error(actual, predicted)?;
    let mae = mean_absolute_error(actual, predicted)?;
    let r2 = r2_score(actual, predicted)?;
    Ok(MetricsReport { rmse, mae, r2 })
}

fn validate_pair(y_true: &[f64], y_pred: &[f64]) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(Error::DimensionMismatch(format!(
            "真の値と予測値の長さが一致しません: {} vs {}",
            y_true.len(),
            y_pred.len()
        )));
    }

    if y_true.is_empty() {
        return Err(Error::EmptyData(
            "空のデータで計算することはできません".to_string(),
        ));
    }

    Ok(())
}
