//! shape.json 매니페스트 모듈
//!
//! hex 파일만으로는 알 수 없는 포맷과 배열 모양을 hex 파일 옆에 기록합니다.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{DatError, Result};
use crate::format::FormatSpec;

/// 매니페스트 파일 이름
pub const MANIFEST_NAME: &str = "shape.json";

/// 워드가 없는 모양에서 허용하는 빈 배열의 최대 개수
const MAX_EMPTY_CONTAINERS: usize = 1 << 20;

/// 메모리 하나의 매니페스트 항목
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeEntry {
    /// 원본 포맷 정보
    pub format: FormatSpec,
    /// 각 차원의 길이 (스칼라는 빈 배열)
    pub shape: Vec<usize>,
    /// `--from-json`이 기록한 hex 파일 확장자
    pub extension: String,
}

impl ShapeEntry {
    /// 전체 워드 수 검증 후 반환
    ///
    /// 곱이 넘치거나, 워드가 0개인데 빈 배열을 지나치게 많이 만들어야 하는
    /// 모양은 손상된 매니페스트로 보고 에러를 반환합니다.
    pub fn word_count(&self, memory: &str) -> Result<usize> {
        let invalid = || DatError::InvalidFormat {
            memory: memory.to_string(),
            reason: format!("shape.json의 모양이 잘못되었습니다: {:?}", self.shape),
        };

        let mut containers: usize = 1;
        for &dim in &self.shape {
            if dim == 0 {
                return if containers <= MAX_EMPTY_CONTAINERS {
                    Ok(0)
                } else {
                    Err(invalid())
                };
            }
            containers = containers.checked_mul(dim).ok_or_else(invalid)?;
        }
        Ok(containers)
    }
}

/// 메모리 이름이 출력 디렉토리 안의 파일 이름으로 쓸 수 있는지 검사
///
/// 경로 구분자, `.`/`..`, 매니페스트와 겹치는 파일 이름은 거부합니다.
pub fn check_memory_name(name: &str, extension: &str) -> Result<()> {
    let reason = if name.is_empty() {
        Some("빈 이름")
    } else if name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        Some("경로 구분자나 상대 경로는 쓸 수 없습니다")
    } else if format!("{}.{}", name, extension) == MANIFEST_NAME {
        Some("shape.json 매니페스트와 파일 이름이 겹칩니다")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(DatError::InvalidMemoryName {
            name: name.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

/// 메모리 이름 → 항목 (이름 순 정렬)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    pub memories: BTreeMap<String, ShapeEntry>,
}

impl Manifest {
    /// 디렉토리 안의 매니페스트 경로
    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(MANIFEST_NAME)
    }

    /// 매니페스트 읽기
    pub fn read(dir: &Path) -> Result<Self> {
        let path = Self::path_in(dir);
        if !path.is_file() {
            return Err(DatError::ManifestNotFound { path });
        }
        let file = File::open(&path).map_err(|e| DatError::io(&path, e))?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| DatError::ParseError {
            file: path.clone(),
            reason: e.to_string(),
        })
    }

    /// 매니페스트 쓰기 (2칸 들여쓰기)
    ///
    /// # Returns
    /// 기록한 바이트 수
    pub fn write(&self, dir: &Path) -> Result<u64> {
        let path = Self::path_in(dir);
        let text = serde_json::to_string_pretty(self).map_err(|e| DatError::SerializeError {
            file: path.clone(),
            reason: e.to_string(),
        })?;
        let file = File::create(&path).map_err(|e| DatError::io(&path, e))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(text.as_bytes())
            .and_then(|_| writer.flush())
            .map_err(|e| DatError::io(&path, e))?;
        Ok(text.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(shape: Vec<usize>) -> ShapeEntry {
        ShapeEntry {
            format: FormatSpec {
                numeric_type: "bitnum".to_string(),
                is_signed: false,
                width: 32,
                int_width: None,
                frac_width: None,
            },
            shape,
            extension: "dat".to_string(),
        }
    }

    #[test]
    fn test_word_count() {
        assert_eq!(entry(vec![2, 3]).word_count("m").unwrap(), 6);
        assert_eq!(entry(vec![]).word_count("m").unwrap(), 1);
        assert_eq!(entry(vec![4, 0]).word_count("m").unwrap(), 0);
        assert_eq!(entry(vec![0, usize::MAX]).word_count("m").unwrap(), 0);
    }

    #[test]
    fn test_word_count_rejects_corrupted_shapes() {
        let err = entry(vec![usize::MAX, 2]).word_count("m").unwrap_err();
        assert!(matches!(err, DatError::InvalidFormat { .. }));
        assert!(entry(vec![usize::MAX / 2, 3]).word_count("m").is_err());
        assert!(entry(vec![usize::MAX, 0]).word_count("m").is_err());
    }

    #[test]
    fn test_check_memory_name() {
        assert!(check_memory_name("mem0", "dat").is_ok());
        assert!(check_memory_name("weights.layer1", "dat").is_ok());
        assert!(check_memory_name("shape", "dat").is_ok());

        for bad in ["", ".", "..", "../x", "a/b", "a\\b"] {
            let err = check_memory_name(bad, "dat").unwrap_err();
            assert!(matches!(err, DatError::InvalidMemoryName { .. }), "{:?}", bad);
        }
        assert!(check_memory_name("shape", "json").is_err());
    }

    #[test]
    fn test_manifest_write_then_read() {
        let temp_dir = TempDir::new().unwrap();
        let mut manifest = Manifest::default();
        manifest.memories.insert("b".to_string(), entry(vec![1]));
        manifest.memories.insert("a".to_string(), entry(vec![2, 2]));

        let written = manifest.write(temp_dir.path()).unwrap();
        assert!(written > 0);

        let text = std::fs::read_to_string(Manifest::path_in(temp_dir.path())).unwrap();
        assert!(text.find("\"a\"").unwrap() < text.find("\"b\"").unwrap());
        assert!(text.contains("\n  \"a\""));

        assert_eq!(Manifest::read(temp_dir.path()).unwrap(), manifest);
    }

    #[test]
    fn test_missing_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let err = Manifest::read(temp_dir.path()).unwrap_err();
        assert!(matches!(err, DatError::ManifestNotFound { .. }));
    }
}
