//! 에러 타입 정의 모듈
//!
//! json-dat에서 발생할 수 있는 모든 에러 타입을 정의합니다.

use std::path::PathBuf;
use thiserror::Error;

/// json-dat에서 발생할 수 있는 에러 타입
#[derive(Error, Debug)]
pub enum DatError {
    /// 파일/폴더 입출력 실패
    #[error("입출력 실패 ({path}): {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON 파싱 실패
    #[error("JSON 파싱 실패 ({file}): {reason}")]
    ParseError { file: PathBuf, reason: String },

    /// JSON 직렬화 실패
    #[error("JSON 직렬화 실패 ({file}): {reason}")]
    SerializeError { file: PathBuf, reason: String },

    /// 최상위 값이 메모리 이름 → 항목 객체가 아님
    #[error("메모리 컬렉션 형식이 잘못되었습니다: {reason}")]
    InvalidCollection { reason: String },

    /// 파일 이름으로 쓸 수 없는 메모리 이름
    #[error("사용할 수 없는 메모리 이름입니다 ({name:?}): {reason}")]
    InvalidMemoryName { name: String, reason: String },

    /// 지원하지 않는 숫자 타입
    #[error("지원하지 않는 숫자 타입입니다 ({memory}): {numeric_type} (\"bitnum\" 또는 \"fixed_point\"만 지원)")]
    UnsupportedNumericType {
        memory: String,
        numeric_type: String,
    },

    /// 포맷 메타데이터 오류 (폭 등)
    #[error("포맷 정보가 잘못되었습니다 ({memory}): {reason}")]
    InvalidFormat { memory: String, reason: String },

    /// 중첩 배열의 모양이 고르지 않음
    #[error("데이터 배열 모양이 고르지 않습니다 ({memory})")]
    RaggedShape { memory: String },

    /// 숫자가 아닌 데이터 원소
    #[error("숫자가 아닌 값이 있습니다 ({memory}): {value}")]
    NotANumber { memory: String, value: String },

    /// 고정소수점으로 정확히 표현할 수 없는 값 (반올림 비활성화 시)
    #[error("고정소수점으로 정확히 표현할 수 없는 값입니다 ({memory}): {value}")]
    InexactValue { memory: String, value: String },

    /// 비트 폭을 넘는 값
    #[error("{width}비트 범위를 벗어난 값입니다 ({memory}): {value}")]
    OutOfRange {
        memory: String,
        value: String,
        width: u32,
    },

    /// shape.json 매니페스트 없음
    #[error("shape.json 매니페스트를 찾을 수 없습니다: {path}")]
    ManifestNotFound { path: PathBuf },

    /// 메모리에 해당하는 hex 파일 없음
    #[error("메모리 '{memory}'의 hex 파일을 찾을 수 없습니다: {path}")]
    HexFileNotFound { memory: String, path: PathBuf },

    /// 잘못된 hex 워드
    #[error("잘못된 hex 워드입니다 ({file}:{line}): {word}")]
    MalformedWord {
        file: PathBuf,
        line: usize,
        word: String,
    },

    /// 워드 수가 shape과 다름
    #[error("워드 수가 맞지 않습니다 ({file}): {expected}개 예상, {actual}개 발견")]
    WordCountMismatch {
        file: PathBuf,
        expected: usize,
        actual: usize,
    },

    /// 유효하지 않은 패턴
    #[error("유효하지 않은 패턴: {pattern}")]
    InvalidPattern { pattern: String },
}

impl DatError {
    /// 경로가 붙은 입출력 에러 생성
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DatError::Io {
            path: path.into(),
            source,
        }
    }
}

/// json-dat 결과 타입 별칭
pub type Result<T> = std::result::Result<T, DatError>;
