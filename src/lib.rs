//! json-dat - JSON <-> HEX DATA CONVERTER
//!
//! 하드웨어 시뮬레이터에 값을 넣고 빼기 위해, 메모리 JSON 파일과
//! 메모리마다 하나씩인 hex 데이터 파일 디렉토리를 상호 변환하는 CLI 도구입니다.
//!
//! # 주요 기능
//!
//! - **`--from-json`**: `{이름: {"data": ..., "format": ...}}` JSON을 `<이름>.dat` 파일들과
//!   `shape.json` 매니페스트로 변환
//! - **`--to-json`**: 시뮬레이터가 남긴 `<이름>.out` 파일들을 다시 JSON으로 변환
//! - **십진수 보존**: 숫자를 부동소수점으로 바꾸지 않고 원문 그대로 처리
//! - **고정소수점**: `bitnum`/`fixed_point`, 부호 유무, 1~64비트 폭 지원
//!
//! # 예제
//!
//! ```bash
//! json-dat --from-json data.json build/
//! json-dat --to-json build/ result.json
//! ```

pub mod cli;
pub mod convert;
pub mod error;
pub mod format;
pub mod number;
pub mod pattern;
pub mod processor;
pub mod shape;
pub mod stats;

// Re-exports for convenient access
pub use cli::{Args, Command, USAGE_HINT};
pub use convert::{convert2dat, convert2json};
pub use error::{DatError, Result};
pub use format::{FormatSpec, NumericType, WordFormat};
pub use processor::{dat2json, json2dat, ConvertOptions};
pub use shape::{check_memory_name, Manifest, ShapeEntry};
pub use stats::{format_bytes, Statistics};
