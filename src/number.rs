//! 숫자 코덱 모듈
//!
//! 십진수 원문과 고정 폭 워드 사이를 부동소수점을 거치지 않고 변환합니다.
//! 모든 연산은 십진 자릿수 배열과 `u128` 정수로만 수행합니다.

use crate::format::{NumericType, WordFormat};

/// 지수 표기의 허용 범위
const MAX_EXPONENT: i64 = 4096;

/// 단일 값 변환 실패 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordError {
    /// 숫자 문법이 아님
    NotANumber,
    /// 반올림 없이는 표현 불가
    Inexact,
    /// 비트 폭 초과
    OutOfRange,
}

/// 부호와 십진 자릿수로 분해된 숫자
#[derive(Debug, PartialEq, Eq)]
struct DecimalParts {
    negative: bool,
    /// 정수부 자릿수 (선행 0 제거)
    int_digits: Vec<u8>,
    /// 소수부 자릿수 (후행 0 제거)
    frac_digits: Vec<u8>,
}

/// JSON 숫자 문법의 문자열을 정수부/소수부로 분해
fn parse_decimal(text: &str) -> Result<DecimalParts, WordError> {
    let text = text.trim();
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let (mantissa, exponent) = match rest.find(['e', 'E']) {
        Some(pos) => {
            let exp_text = &rest[pos + 1..];
            let exp_text = exp_text.strip_prefix('+').unwrap_or(exp_text);
            let exp_digits = exp_text.strip_prefix('-').unwrap_or(exp_text);
            if exp_digits.is_empty() || !exp_digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(WordError::NotANumber);
            }
            let exp: i64 = exp_text.parse().map_err(|_| WordError::OutOfRange)?;
            if exp.abs() > MAX_EXPONENT {
                return Err(WordError::OutOfRange);
            }
            (&rest[..pos], exp)
        }
        None => (rest, 0),
    };

    let (int_text, frac_text) = match mantissa.split_once('.') {
        Some((i, f)) => (i, f),
        None => (mantissa, ""),
    };
    if int_text.is_empty()
        || !int_text.bytes().all(|b| b.is_ascii_digit())
        || !frac_text.bytes().all(|b| b.is_ascii_digit())
        || (mantissa.contains('.') && frac_text.is_empty())
    {
        return Err(WordError::NotANumber);
    }

    // value = digits * 10^(exponent - frac_len)
    let digits: Vec<u8> = int_text
        .bytes()
        .chain(frac_text.bytes())
        .map(|b| b - b'0')
        .collect();
    let point = int_text.len() as i64 + exponent;

    let (int_digits, frac_digits) = if point <= 0 {
        let mut frac = vec![0u8; (-point) as usize];
        frac.extend_from_slice(&digits);
        (Vec::new(), frac)
    } else if point as usize >= digits.len() {
        let mut int = digits;
        int.resize(point as usize, 0);
        (int, Vec::new())
    } else {
        let (i, f) = digits.split_at(point as usize);
        (i.to_vec(), f.to_vec())
    };

    let first_nonzero = int_digits
        .iter()
        .position(|&d| d != 0)
        .unwrap_or(int_digits.len());
    let last_nonzero = frac_digits
        .iter()
        .rposition(|&d| d != 0)
        .map_or(0, |p| p + 1);

    Ok(DecimalParts {
        negative,
        int_digits: int_digits[first_nonzero..].to_vec(),
        frac_digits: frac_digits[..last_nonzero].to_vec(),
    })
}

/// 소수부 자릿수를 2배 하고 정수부로 넘어간 비트를 반환
fn double_fraction(digits: &mut [u8]) -> u8 {
    let mut carry = 0;
    for d in digits.iter_mut().rev() {
        let v = *d * 2 + carry;
        *d = v % 10;
        carry = v / 10;
    }
    carry
}

/// 십진수 원문을 워드로 인코딩
///
/// 고정소수점 값은 `2^frac_width`를 곱한 뒤 정수여야 하며, `round`가 켜져
/// 있으면 가장 가까운 짝수 쪽으로 반올림합니다. bitnum은 항상 정수여야 합니다.
///
/// # Returns
/// 2의 보수로 표현된 `width` 비트 워드
pub fn encode_value(text: &str, fmt: &WordFormat, round: bool) -> Result<u64, WordError> {
    let parts = parse_decimal(text)?;

    if parts.int_digits.len() > 20 {
        return Err(WordError::OutOfRange);
    }
    let int_value = parts
        .int_digits
        .iter()
        .fold(0u128, |acc, &d| acc * 10 + d as u128);
    if int_value > u64::MAX as u128 {
        return Err(WordError::OutOfRange);
    }

    let mut frac = parts.frac_digits;
    let mut frac_bits: u128 = 0;
    for _ in 0..fmt.frac_width {
        frac_bits = (frac_bits << 1) | double_fraction(&mut frac) as u128;
    }
    let mut magnitude = (int_value << fmt.frac_width) | frac_bits;

    if frac.iter().any(|&d| d != 0) {
        if !round || fmt.numeric_type == NumericType::Bitnum {
            return Err(WordError::Inexact);
        }
        let half_bit = double_fraction(&mut frac);
        let above_half = frac.iter().any(|&d| d != 0);
        if half_bit == 1 && (above_half || magnitude & 1 == 1) {
            magnitude = magnitude.checked_add(1).ok_or(WordError::OutOfRange)?;
        }
    }

    let negative = parts.negative && magnitude != 0;
    let width = fmt.width;
    let limit = if fmt.is_signed {
        if negative {
            1u128 << (width - 1)
        } else {
            (1u128 << (width - 1)) - 1
        }
    } else if negative {
        return Err(WordError::OutOfRange);
    } else {
        (1u128 << width) - 1
    };
    if magnitude > limit {
        return Err(WordError::OutOfRange);
    }

    let mask = (1u128 << width) - 1;
    let word = if negative {
        magnitude.wrapping_neg() & mask
    } else {
        magnitude
    };
    Ok(word as u64)
}

/// 워드를 십진수 원문으로 디코딩
///
/// 고정소수점의 소수부는 항상 유한한 십진수이므로 정확히 표현됩니다.
pub fn decode_word(word: u64, fmt: &WordFormat) -> Result<String, WordError> {
    let width = fmt.width;
    let word = word as u128;
    if word >> width != 0 {
        return Err(WordError::OutOfRange);
    }

    let sign_bit = 1u128 << (width - 1);
    let (negative, magnitude) = if fmt.is_signed && word & sign_bit != 0 {
        (true, (1u128 << width) - word)
    } else {
        (false, word)
    };

    let frac_width = fmt.frac_width;
    let frac_mask = (1u128 << frac_width) - 1;
    let int_part = magnitude >> frac_width;
    let mut frac = magnitude & frac_mask;

    let mut text = String::new();
    if negative {
        text.push('-');
    }
    text.push_str(&int_part.to_string());
    if frac != 0 {
        text.push('.');
        while frac != 0 {
            frac *= 10;
            let digit = (frac >> frac_width) as u8;
            frac &= frac_mask;
            text.push((b'0' + digit) as char);
        }
    }
    Ok(text)
}

/// 워드를 고정 자릿수 소문자 hex로 표현
pub fn format_hex(word: u64, fmt: &WordFormat) -> String {
    format!("{:0width$x}", word, width = fmt.hex_digits())
}

/// hex 워드 파싱 (선행 0 허용, 폭 초과는 에러)
pub fn parse_hex(text: &str, fmt: &WordFormat) -> Result<u64, WordError> {
    let text = text.trim();
    let text = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(WordError::NotANumber);
    }

    let significant = text.trim_start_matches('0');
    if significant.len() > 16 {
        return Err(WordError::OutOfRange);
    }
    let word = if significant.is_empty() {
        0
    } else {
        u64::from_str_radix(significant, 16).map_err(|_| WordError::NotANumber)?
    };
    if fmt.width < 64 && word >> fmt.width != 0 {
        return Err(WordError::OutOfRange);
    }
    Ok(word)
}
