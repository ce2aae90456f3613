use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use mleval::{Error, EvaluationConfig, LinearModel, ModelEvaluator};
use serde_json::{json, Value};
use tempfile::tempdir;

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

// y=2xのモデルとそれに完全に一致するテストデータを用意する
fn write_fixtures(dir: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let data_path = dir.join("test.csv");
    fs::write(&data_path, "x,y\n1,2\n2,4\n3,6\n").unwrap();

    let model_path = dir.join("model.json");
    let model = LinearModel {
        family: "elastic_net".to_string(),
        feature_names: vec!["x".to_string()],
        coefficients: vec![2.0],
        intercept: 0.0,
        trained_at: None,
    };
    model.save(&model_path).unwrap();

    (data_path, model_path)
}

// エンドツーエンド: メトリクスファイルとトラッキング記録の両方を確認
#[test]
fn test_end_to_end_perfect_model() {
    let dir = tempdir().unwrap();
    let (data_path, model_path) = write_fixtures(dir.path());
    let metrics_path = dir.path().join("out").join("metrics.json");
    let tracking_root = dir.path().join("mlruns");

    let mut params = BTreeMap::new();
    params.insert("alpha".to_string(), json!(0.5));
    params.insert("l1_ratio".to_string(), json!(0.7));

    let config = EvaluationConfig {
        test_data_path: data_path,
        model_path,
        metrics_path: metrics_path.clone(),
        target_column: "y".to_string(),
        tracking_uri: tracking_root.to_str().unwrap().to_string(),
        experiment_name: "wine-quality".to_string(),
        registered_model_name: "ElasticnetModel".to_string(),
        params,
    };

    let report = ModelEvaluator::new(config).run().unwrap();
    assert_eq!(report.rmse, 0.0);
    assert_eq!(report.mae, 0.0);
    assert_eq!(report.r2, 1.0);

    // ローカルのメトリクスファイル
    let metrics = read_json(&metrics_path);
    assert_eq!(metrics["rmse"], 0.0);
    assert_eq!(metrics["mae"], 0.0);
    assert_eq!(metrics["r2"], 1.0);

    // トラッキング側の記録
    let experiment_dir = tracking_root.join("wine-quality");
    let run_dirs: Vec<_> = fs::read_dir(&experiment_dir).unwrap().collect();
    assert_eq!(run_dirs.len(), 1);
    let run_dir = run_dirs[0].as_ref().unwrap().path();

    let meta = read_json(&run_dir.join("meta.json"));
    assert_eq!(meta["status"], "FINISHED");

    let params = read_json(&run_dir.join("params.json"));
    assert_eq!(params["alpha"], "0.5");

    let metrics = read_json(&run_dir.join("metrics.json"));
    assert_eq!(metrics["rmse"][0]["value"], 0.0);
    assert_eq!(metrics["r2"][0]["value"], 1.0);
    assert_eq!(metrics["mae"][0]["value"], 0.0);

    // ファイルストアでは登録なしでモデルを記録する
    assert!(run_dir.join("artifacts").join("model").join("model.json").exists());
    assert!(!tracking_root.join("registry.json").exists());
}

// メトリクスファイルはトラッキング呼び出しより先に書かれる:
// トラッキングが致命的に失敗してもファイルは残り、内容は完全なまま
#[test]
fn test_metrics_written_before_tracking_failure() {
    let dir = tempdir().unwrap();
    let (data_path, model_path) = write_fixtures(dir.path());
    let metrics_path = dir.path().join("metrics.json");

    let config = EvaluationConfig {
        test_data_path: data_path,
        model_path,
        metrics_path: metrics_path.clone(),
        target_column: "y".to_string(),
        // 未対応スキームはトラッキング接続時の致命的エラーになる
        tracking_uri: "ftp://tracker.example.com".to_string(),
        experiment_name: "wine-quality".to_string(),
        registered_model_name: "ElasticnetModel".to_string(),
        params: BTreeMap::new(),
    };

    let result = ModelEvaluator::new(config).run();
    assert!(matches!(result, Err(Error::Tracking(_))));

    // ローカルのメトリクスファイルは書き込み済みで内容も完全
    let metrics = read_json(&metrics_path);
    assert_eq!(metrics["rmse"], 0.0);
    assert_eq!(metrics["r2"], 1.0);
}

// データ読み込みに失敗した場合はメトリクスファイルを一切書かない
#[test]
fn test_no_partial_metrics_on_data_error() {
    let dir = tempdir().unwrap();
    let (_, model_path) = write_fixtures(dir.path());
    let metrics_path = dir.path().join("metrics.json");

    let config = EvaluationConfig {
        test_data_path: dir.path().join("no_such.csv"),
        model_path,
        metrics_path: metrics_path.clone(),
        target_column: "y".to_string(),
        tracking_uri: dir.path().join("mlruns").to_str().unwrap().to_string(),
        experiment_name: "wine-quality".to_string(),
        registered_model_name: "ElasticnetModel".to_string(),
        params: BTreeMap::new(),
    };

    assert!(ModelEvaluator::new(config).run().is_err());
    assert!(!metrics_path.exists());
}

// 定数ラベルのテストデータは明示的に失敗し、メトリクスファイルも書かれない
#[test]
fn test_constant_label_aborts_run() {
    let dir = tempdir().unwrap();
    let (_, model_path) = write_fixtures(dir.path());

    let data_path = dir.path().join("constant.csv");
    fs::write(&data_path, "x,y\n1,5\n2,5\n3,5\n").unwrap();
    let metrics_path = dir.path().join("metrics.json");

    let config = EvaluationConfig {
        test_data_path: data_path,
        model_path,
        metrics_path: metrics_path.clone(),
        target_column: "y".to_string(),
        tracking_uri: dir.path().join("mlruns").to_str().unwrap().to_string(),
        experiment_name: "wine-quality".to_string(),
        registered_model_name: "ElasticnetModel".to_string(),
        params: BTreeMap::new(),
    };

    assert!(matches!(
        ModelEvaluator::new(config).run(),
        Err(Error::ZeroVariance(_))
    ));
    assert!(!metrics_path.exists());
}

// YAML設定ファイルの読み込みとデフォルト値
#[test]
fn test_config_from_yaml() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("evaluation.yaml");
    fs::write(
        &path,
        concat!(
            "test_data_path: data/test.csv\n",
            "model_path: artifacts/model.json\n",
            "metrics_path: artifacts/metrics.json\n",
            "target_column: quality\n",
            "tracking_uri: mlruns\n",
            "params:\n",
            "  alpha: 0.5\n",
            "  l1_ratio: 0.7\n",
        ),
    )
    .unwrap();

    let config = EvaluationConfig::from_yaml(&path).unwrap();
    assert_eq!(config.target_column, "quality");
    assert_eq!(config.experiment_name, "default");
    assert_eq!(config.registered_model_name, "regression-model");
    assert_eq!(config.params["alpha"], json!(0.5));

    // 必須項目が空ならエラー
    fs::write(
        &path,
        concat!(
            "test_data_path: data/test.csv\n",
            "model_path: artifacts/model.json\n",
            "metrics_path: artifacts/metrics.json\n",
            "target_column: \"\"\n",
            "tracking_uri: mlruns\n",
        ),
    )
    .unwrap();
    assert!(matches!(
        EvaluationConfig::from_yaml(&path),
        Err(Error::Config(_))
    ));
}
