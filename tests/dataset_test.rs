use std::fs;

use mleval::{Error, TestDataset};
use tempfile::tempdir;

// CSV読み込みと特徴量/目的変数の分割
#[test]
fn test_from_csv_and_split() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.csv");
    fs::write(
        &path,
        "alcohol,ph,quality\n12.8,3.2,6\n11.2,3.5,5\n13.0,3.1,7\n",
    )
    .unwrap();

    let dataset = TestDataset::from_csv(&path).unwrap();
    assert_eq!(dataset.row_count(), 3);
    assert_eq!(dataset.column_names(), &["alcohol", "ph", "quality"]);
    assert_eq!(dataset.column("quality").unwrap(), &[6.0, 5.0, 7.0]);

    let (features, labels) = dataset.split_target("quality").unwrap();

    // 目的変数列は特徴量から除外される
    assert_eq!(features.feature_names, vec!["alcohol", "ph"]);
    assert_eq!(features.row_count(), 3);
    assert_eq!(features.rows[0], vec![12.8, 3.2]);
    assert_eq!(labels, vec![6.0, 5.0, 7.0]);
}

// 存在しない目的変数列はエラー
#[test]
fn test_missing_target_column() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.csv");
    fs::write(&path, "a,b\n1,2\n").unwrap();

    let dataset = TestDataset::from_csv(&path).unwrap();
    assert!(matches!(
        dataset.split_target("quality"),
        Err(Error::ColumnNotFound(_))
    ));
}

// 数値でないセルはエラー
#[test]
fn test_non_numeric_cell() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.csv");
    fs::write(&path, "a,b\n1,apple\n").unwrap();

    assert!(matches!(
        TestDataset::from_csv(&path),
        Err(Error::Format(_))
    ));
}

// ヘッダーのみのファイルはデータなしエラー
#[test]
fn test_header_only() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.csv");
    fs::write(&path, "a,b\n").unwrap();

    assert!(matches!(
        TestDataset::from_csv(&path),
        Err(Error::EmptyData(_))
    ));
}

// 存在しないファイルはエラー
#[test]
fn test_missing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("no_such.csv");

    assert!(TestDataset::from_csv(&path).is_err());
}

// 列名の重複はエラー
#[test]
fn test_duplicate_column_name() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.csv");
    fs::write(&path, "a,a\n1,2\n").unwrap();

    assert!(matches!(
        TestDataset::from_csv(&path),
        Err(Error::DuplicateColumnName(_))
    ));
}

// 列数が揃っていない行はエラー
#[test]
fn test_ragged_row() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.csv");
    fs::write(&path, "a,b\n1,2\n3\n").unwrap();

    assert!(TestDataset::from_csv(&path).is_err());
}
