//! 메모리 포맷 모듈
//!
//! JSON의 `format` 객체와, 검증을 마친 워드 포맷을 정의합니다.

use serde::{Deserialize, Serialize};

use crate::error::{DatError, Result};

/// 지원하는 최대 워드 폭 (비트)
pub const MAX_WIDTH: u32 = 64;

/// 숫자 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericType {
    /// 정수 비트 벡터
    Bitnum,
    /// 고정소수점
    FixedPoint,
}

impl NumericType {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "bitnum" => Some(NumericType::Bitnum),
            "fixed_point" => Some(NumericType::FixedPoint),
            _ => None,
        }
    }
}

impl std::fmt::Display for NumericType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NumericType::Bitnum => write!(f, "bitnum"),
            NumericType::FixedPoint => write!(f, "fixed_point"),
        }
    }
}

/// JSON에 기록되는 그대로의 포맷 정보
///
/// `shape.json`과 `--to-json` 출력에 원문 그대로 되돌려 쓰기 위해
/// 검증 전 형태를 보관합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatSpec {
    pub numeric_type: String,
    pub is_signed: bool,
    pub width: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub int_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frac_width: Option<u32>,
}

/// 검증된 워드 포맷
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordFormat {
    pub numeric_type: NumericType,
    pub is_signed: bool,
    pub width: u32,
    pub frac_width: u32,
}

impl FormatSpec {
    /// 포맷 정보를 검증하여 `WordFormat`으로 변환
    ///
    /// # Arguments
    /// * `memory` - 에러 메시지에 쓸 메모리 이름
    pub fn resolve(&self, memory: &str) -> Result<WordFormat> {
        let numeric_type = NumericType::parse(&self.numeric_type).ok_or_else(|| {
            DatError::UnsupportedNumericType {
                memory: memory.to_string(),
                numeric_type: self.numeric_type.clone(),
            }
        })?;

        let invalid = |reason: String| DatError::InvalidFormat {
            memory: memory.to_string(),
            reason,
        };

        if self.width == 0 || self.width > MAX_WIDTH {
            return Err(invalid(format!(
                "width는 1..={} 범위여야 합니다 (입력: {})",
                MAX_WIDTH, self.width
            )));
        }

        let frac_width = match numeric_type {
            NumericType::Bitnum => 0,
            NumericType::FixedPoint => match (self.int_width, self.frac_width) {
                (Some(int_width), Some(frac_width)) => {
                    if int_width.checked_add(frac_width) != Some(self.width) {
                        return Err(invalid(format!(
                            "int_width({}) + frac_width({}) != width({})",
                            int_width, frac_width, self.width
                        )));
                    }
                    frac_width
                }
                (Some(int_width), None) => {
                    if int_width > self.width {
                        return Err(invalid(format!(
                            "int_width({})가 width({})보다 큽니다",
                            int_width, self.width
                        )));
                    }
                    self.width - int_width
                }
                (None, Some(frac_width)) => {
                    if frac_width > self.width {
                        return Err(invalid(format!(
                            "frac_width({})가 width({})보다 큽니다",
                            frac_width, self.width
                        )));
                    }
                    frac_width
                }
                (None, None) => {
                    return Err(invalid(
                        "fixed_point에는 int_width 또는 frac_width가 필요합니다".to_string(),
                    ))
                }
            },
        };

        Ok(WordFormat {
            numeric_type,
            is_signed: self.is_signed,
            width: self.width,
            frac_width,
        })
    }
}

impl WordFormat {
    /// 한 워드를 표현하는 hex 자릿수
    pub fn hex_digits(&self) -> usize {
        self.width.div_ceil(4) as usize
    }
}
