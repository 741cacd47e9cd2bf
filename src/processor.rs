//! 변환 작업 모듈
//!
//! `--from-json`/`--to-json` 각각의 입출력(디렉토리 생성, JSON 읽기/쓰기)을 담당하고
//! 실제 변환은 `convert` 모듈에 맡깁니다.

use memmap2::Mmap;
use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

use crate::convert::{convert2dat, convert2json};
use crate::error::{DatError, Result};
use crate::stats::Statistics;

/// 변환 옵션
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// `--from-json`이 쓰는 hex 파일 확장자
    pub dat_extension: String,
    /// `--to-json`이 읽는 hex 파일 확장자
    pub out_extension: String,
    /// 고정소수점 반올림 허용 여부
    pub round_float_to_fixed: bool,
    /// 대용량 파일 임계값 (이상이면 메모리 매핑 사용)
    pub mmap_threshold: u64,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            dat_extension: "dat".to_string(),
            out_extension: "out".to_string(),
            round_float_to_fixed: true,
            mmap_threshold: 10 * 1024 * 1024, // 10MB
        }
    }
}

impl ConvertOptions {
    /// 기본 옵션 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// hex 출력 확장자 설정
    pub fn with_dat_extension(mut self, extension: impl Into<String>) -> Self {
        self.dat_extension = extension.into();
        self
    }

    /// hex 입력 확장자 설정
    pub fn with_out_extension(mut self, extension: impl Into<String>) -> Self {
        self.out_extension = extension.into();
        self
    }

    /// 반올림 허용 설정
    pub fn with_round(mut self, round_float_to_fixed: bool) -> Self {
        self.round_float_to_fixed = round_float_to_fixed;
        self
    }
}

/// JSON 파일을 hex 파일 디렉토리로 변환
///
/// `out_dir`이 없으면 상위 폴더까지 만들며, 이미 있어도 에러가 아닙니다.
///
/// # Arguments
/// * `in_file` - 입력 JSON 파일
/// * `out_dir` - hex 파일을 쓸 디렉토리
/// * `options` - 변환 옵션
pub fn json2dat(in_file: &Path, out_dir: &Path, options: &ConvertOptions) -> Result<Statistics> {
    let mut stats = Statistics::new();

    fs::create_dir_all(out_dir).map_err(|e| DatError::io(out_dir, e))?;

    let data = read_json(in_file, options.mmap_threshold, &mut stats)?;
    info!("입력 JSON 읽음: {:?}", in_file);

    convert2dat(
        out_dir,
        &data,
        &options.dat_extension,
        options.round_float_to_fixed,
        &mut stats,
    )?;
    info!("hex 파일 {}개 기록: {:?}", stats.memories(), out_dir);

    Ok(stats)
}

/// hex 파일 디렉토리를 JSON 파일로 변환
///
/// 출력은 2칸 들여쓰기, 키 정렬이며 숫자는 십진수 원문 그대로 기록합니다.
pub fn dat2json(in_dir: &Path, out_file: &Path, options: &ConvertOptions) -> Result<Statistics> {
    let mut stats = Statistics::new();

    let memories = convert2json(in_dir, &options.out_extension, &mut stats)?;
    // TODO: 시뮬레이터가 사이클 수를 메모리 덤프 옆에 남기면 출력 JSON에 포함할 것

    let text = serde_json::to_string_pretty(&Value::Object(memories)).map_err(|e| {
        DatError::SerializeError {
            file: out_file.to_path_buf(),
            reason: e.to_string(),
        }
    })?;

    let file = File::create(out_file).map_err(|e| DatError::io(out_file, e))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(text.as_bytes())
        .and_then(|_| writer.flush())
        .map_err(|e| DatError::io(out_file, e))?;
    stats.add_bytes_written(text.len() as u64);

    info!("출력 JSON 기록: {:?}", out_file);
    Ok(stats)
}

/// 입력 JSON 읽기 (크기에 따라 버퍼 리더 또는 메모리 매핑)
fn read_json(path: &Path, mmap_threshold: u64, stats: &mut Statistics) -> Result<Value> {
    let file_size = fs::metadata(path)
        .map_err(|e| DatError::io(path, e))?
        .len();
    stats.add_bytes_read(file_size);

    if file_size >= mmap_threshold {
        debug!(bytes = file_size, "메모리 매핑으로 JSON 읽기");
        parse_with_mmap(path)
    } else {
        parse_with_reader(path)
    }
}

/// 버퍼 리더를 사용한 JSON 파싱
fn parse_with_reader(path: &Path) -> Result<Value> {
    let file = File::open(path).map_err(|e| DatError::io(path, e))?;

    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|e| DatError::ParseError {
        file: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// 메모리 매핑을 사용한 JSON 파싱 (대용량 파일용)
fn parse_with_mmap(path: &Path) -> Result<Value> {
    let file = File::open(path).map_err(|e| DatError::io(path, e))?;

    let mmap = unsafe { Mmap::map(&file).map_err(|e| DatError::io(path, e))? };

    serde_json::from_slice(&mmap).map_err(|e| DatError::ParseError {
        file: path.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_options_builder() {
        let options = ConvertOptions::new()
            .with_dat_extension("hex")
            .with_out_extension("mem")
            .with_round(false);

        assert_eq!(options.dat_extension, "hex");
        assert_eq!(options.out_extension, "mem");
        assert!(!options.round_float_to_fixed);
    }

    #[test]
    fn test_parse_paths_agree() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("in.json");
        fs::write(&path, r#"{"m": {"data": [0.1], "format": {}}}"#).unwrap();

        let by_reader = parse_with_reader(&path).unwrap();
        let by_mmap = parse_with_mmap(&path).unwrap();
        assert_eq!(by_reader, by_mmap);
        assert_eq!(by_reader["m"]["data"][0].to_string(), "0.1");
    }

    #[test]
    fn test_read_json_malformed() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.json");
        fs::write(&path, r#"{"m": "#).unwrap();

        let mut stats = Statistics::new();
        let err = read_json(&path, 0, &mut stats).unwrap_err();
        assert!(matches!(err, DatError::ParseError { .. }));
    }

    #[test]
    fn test_json2dat_missing_input() {
        let temp_dir = TempDir::new().unwrap();
        let err = json2dat(
            &temp_dir.path().join("missing.json"),
            &temp_dir.path().join("out"),
            &ConvertOptions::new(),
        )
        .unwrap_err();
        assert!(matches!(err, DatError::Io { .. }));
    }
}
