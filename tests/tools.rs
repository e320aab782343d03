use anyhow::{bail, Result};
use async_trait::async_trait;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use grading_toolkit::error::{AppError, InputError};
use grading_toolkit::infrastructure::DocumentConverter;
use grading_toolkit::tools::{convert_directory, reshape_scores};

/// 把输入内容原样写成 "PDF"，文件名含 `broken` 时失败
#[derive(Default)]
struct FakeConverter {
    calls: Mutex<Vec<String>>,
}

#[async_trait]
impl DocumentConverter for FakeConverter {
    async fn convert(&self, input: &Path, output: &Path) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(input.file_name().unwrap().to_string_lossy().into_owned());
        if input.to_string_lossy().contains("broken") {
            bail!("corrupt document");
        }
        fs::copy(input, output)?;
        Ok(())
    }
}

#[test]
fn test_convert_directory_mirrors_structure() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in");
    let output = dir.path().join("out");
    fs::create_dir_all(input.join("Nhóm 1")).unwrap();
    fs::write(input.join("Nhóm 1").join("Bài làm Đỗ.docx"), b"doc").unwrap();
    fs::write(input.join("broken.DOCX"), b"doc").unwrap();
    fs::write(input.join("readme.txt"), b"skip").unwrap();

    let converter = FakeConverter::default();
    let stats = tokio_test::block_on(convert_directory(&input, &output, &converter)).unwrap();

    assert_eq!((stats.found, stats.converted, stats.failed), (2, 1, 1));
    assert!(output.join("Nhom_1").join("Bai_lam_Do.pdf").exists());
    assert!(!output.join("broken.pdf").exists());
    assert_eq!(converter.calls.lock().unwrap().len(), 2);
}

#[test]
fn test_convert_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let converter = FakeConverter::default();

    let err = tokio_test::block_on(convert_directory(
        &dir.path().join("missing"),
        &dir.path().join("out"),
        &converter,
    ))
    .unwrap_err();

    assert!(matches!(
        err,
        AppError::InvalidInput(InputError::InvalidDirectory { .. })
    ));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_reshape_scores_writes_score_sheet() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("grading_results.csv");
    fs::write(
        &input,
        "\u{feff}file_path,file_name,status,grade,total_grade,max_score,is_complete,error,timestamp\n\
/subs/Le Van C_2201111_assignsubmission_file/main.py,main.py,success,2 / 3,2,3,false,,2025-11-07 22:58:08\n",
    )
    .unwrap();

    let output = reshape_scores(&input, dir.path(), &["grade".to_string()]).unwrap();

    let name = output.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("only_score_results_"));
    let content = fs::read_to_string(output).unwrap();
    assert_eq!(content, "name,score,max_score,grade\n2201111,2,3,2 / 3\n");
}
