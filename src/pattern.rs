//! 패턴 매칭 모듈
//!
//! glob 패턴으로 디렉토리 안의 hex 파일을 골라냅니다.

use glob::Pattern;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{DatError, Result};

/// 컴파일된 패턴 매처
pub struct PatternMatcher {
    pattern: Pattern,
}

impl PatternMatcher {
    fn new(pattern: &str) -> Result<Self> {
        let pattern = Pattern::new(pattern).map_err(|_| DatError::InvalidPattern {
            pattern: pattern.to_string(),
        })?;
        Ok(Self { pattern })
    }

    /// 확장자 하나에 대한 매처 (`*.<ext>`)
    ///
    /// 확장자 안의 glob 특수문자는 그대로의 문자로 취급합니다.
    ///
    /// # Examples
    /// ```
    /// use json_dat::pattern::PatternMatcher;
    ///
    /// let matcher = PatternMatcher::for_extension("out").unwrap();
    /// assert!(matcher.matches("mem0.out"));
    /// assert!(!matcher.matches("mem0.dat"));
    /// ```
    pub fn for_extension(extension: &str) -> Result<Self> {
        Self::new(&format!("*.{}", Pattern::escape(extension)))
    }

    /// 파일 이름이 패턴과 일치하는지 확인
    pub fn matches(&self, file_name: &str) -> bool {
        self.pattern.matches(file_name)
    }
}

/// 디렉토리 바로 아래에서 확장자가 일치하는 파일을 찾아 `메모리 이름 → 경로`로 반환
///
/// 메모리 이름은 파일 이름에서 `.<extension>` 전체를 떼어낸 부분이므로
/// `out.txt`처럼 점이 들어간 확장자도 그대로 다룹니다. 하위 디렉토리는 탐색하지 않습니다.
pub fn scan_hex_files(dir: &Path, extension: &str) -> Result<BTreeMap<String, PathBuf>> {
    let matcher = PatternMatcher::for_extension(extension)?;
    let suffix = format!(".{}", extension);
    let mut found = BTreeMap::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            DatError::io(path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(file_name) = entry.file_name().to_str() else {
            continue;
        };
        if !matcher.matches(file_name) {
            continue;
        }
        match file_name.strip_suffix(suffix.as_str()) {
            Some(name) if !name.is_empty() => {
                found.insert(name.to_string(), entry.path().to_path_buf());
            }
            _ => {}
        }
    }

    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_matcher_for_extension() {
        let matcher = PatternMatcher::for_extension("dat").unwrap();
        assert!(matcher.matches("mem0.dat"));
        assert!(matcher.matches("weights.layer1.dat"));
        assert!(!matcher.matches("mem0.out"));
        assert!(!matcher.matches("mem0.dat.bak"));
    }

    #[test]
    fn test_extension_is_escaped() {
        let matcher = PatternMatcher::for_extension("[x]").unwrap();
        assert!(matcher.matches("a.[x]"));
        assert!(!matcher.matches("a.x"));
    }

    #[test]
    fn test_scan_hex_files() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.out"), "01\n").unwrap();
        fs::write(temp_dir.path().join("b.out"), "02\n").unwrap();
        fs::write(temp_dir.path().join("a.dat"), "03\n").unwrap();
        fs::write(temp_dir.path().join("shape.json"), "{}").unwrap();
        let sub = temp_dir.path().join("nested");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("c.out"), "04\n").unwrap();

        let found = scan_hex_files(temp_dir.path(), "out").unwrap();
        assert_eq!(found.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(found["a"], temp_dir.path().join("a.out"));
    }

    #[test]
    fn test_scan_multi_dot_extension() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("mem0.out.txt"), "2a\n").unwrap();
        fs::write(temp_dir.path().join("w.layer1.out.txt"), "01\n").unwrap();
        fs::write(temp_dir.path().join("mem0.txt"), "00\n").unwrap();

        let found = scan_hex_files(temp_dir.path(), "out.txt").unwrap();
        assert_eq!(found.keys().collect::<Vec<_>>(), vec!["mem0", "w.layer1"]);
        assert_eq!(found["mem0"], temp_dir.path().join("mem0.out.txt"));
    }
}
