//! 변환 모듈
//!
//! 메모리 컬렉션(JSON 값)과 hex 디렉토리 사이의 변환을 담당합니다.
//! 파일 열기/쓰기 외의 I/O(입력 JSON 읽기, 출력 JSON 쓰기)는 `processor`가 맡습니다.

use serde_json::{Map, Number, Value};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

use crate::error::{DatError, Result};
use crate::format::{FormatSpec, WordFormat};
use crate::number::{decode_word, encode_value, format_hex, parse_hex, WordError};
use crate::pattern::scan_hex_files;
use crate::shape::{check_memory_name, Manifest, ShapeEntry};
use crate::stats::Statistics;

/// 메모리 컬렉션을 hex 파일 디렉토리로 변환
///
/// 메모리마다 `<out_dir>/<이름>.<extension>` 파일을 만들고, 마지막에
/// `shape.json` 매니페스트를 기록합니다. `out_dir`은 이미 있어야 합니다.
///
/// # Arguments
/// * `out_dir` - 출력 디렉토리
/// * `data` - `{이름: {"data": ..., "format": ...}}` 형태의 JSON 값
/// * `extension` - hex 파일 확장자
/// * `round_float_to_fixed` - 고정소수점으로 정확히 표현되지 않는 값을 반올림할지 여부
/// * `stats` - 통계 누적 대상
pub fn convert2dat(
    out_dir: &Path,
    data: &Value,
    extension: &str,
    round_float_to_fixed: bool,
    stats: &mut Statistics,
) -> Result<Manifest> {
    let memories = data.as_object().ok_or_else(|| DatError::InvalidCollection {
        reason: "최상위 값은 객체여야 합니다".to_string(),
    })?;

    let mut manifest = Manifest::default();

    for (name, item) in memories {
        check_memory_name(name, extension)?;
        let (format, fmt) = read_format(name, item)?;
        let payload = item.get("data").ok_or_else(|| DatError::InvalidCollection {
            reason: format!("메모리 '{}'에 data 필드가 없습니다", name),
        })?;

        let mut numbers = Vec::new();
        let shape = flatten(name, payload, &mut numbers)?;

        let path = out_dir.join(format!("{}.{}", name, extension));
        let file = File::create(&path).map_err(|e| DatError::io(&path, e))?;
        let mut writer = BufWriter::new(file);
        let mut written = 0u64;

        for number in &numbers {
            let text = number.to_string();
            let word = encode_value(&text, &fmt, round_float_to_fixed)
                .map_err(|e| word_error(e, name, &text, fmt.width))?;
            let line = format_hex(word, &fmt);
            writeln!(writer, "{}", line).map_err(|e| DatError::io(&path, e))?;
            written += line.len() as u64 + 1;
        }
        writer.flush().map_err(|e| DatError::io(&path, e))?;

        debug!(
            memory = %name,
            words = numbers.len(),
            shape = ?shape,
            "hex 파일 기록: {:?}",
            path
        );

        stats.increment_memories();
        stats.add_words(numbers.len());
        stats.add_bytes_written(written);

        manifest.memories.insert(
            name.clone(),
            ShapeEntry {
                format,
                shape,
                extension: extension.to_string(),
            },
        );
    }

    let manifest_bytes = manifest.write(out_dir)?;
    stats.add_bytes_written(manifest_bytes);

    Ok(manifest)
}

/// hex 파일 디렉토리를 메모리 컬렉션으로 변환
///
/// `shape.json`에 적힌 메모리마다 `<이름>.<extension>` 파일을 읽습니다.
/// 그 파일이 없으면 `--from-json`이 기록한 원래 확장자의 파일을 대신 읽습니다.
///
/// # Returns
/// `{이름: {"data": ..., "format": ...}}` 형태의 객체 (이름 순 정렬)
pub fn convert2json(
    in_dir: &Path,
    extension: &str,
    stats: &mut Statistics,
) -> Result<Map<String, Value>> {
    if !in_dir.is_dir() {
        return Err(DatError::io(
            in_dir,
            std::io::Error::new(std::io::ErrorKind::NotFound, "입력 폴더가 없습니다"),
        ));
    }

    let manifest = Manifest::read(in_dir)?;
    let hex_files = scan_hex_files(in_dir, extension)?;

    for stray in hex_files
        .keys()
        .filter(|name| !manifest.memories.contains_key(*name))
    {
        debug!(memory = %stray, "shape.json에 없는 hex 파일 무시");
    }

    let mut result = Map::new();

    for (name, entry) in &manifest.memories {
        check_memory_name(name, extension)?;
        let fmt = entry.format.resolve(name)?;
        let expected = entry.word_count(name)?;

        let path = match hex_files.get(name) {
            Some(path) => path.clone(),
            None => {
                let fallback = in_dir.join(format!("{}.{}", name, entry.extension));
                if !fallback.is_file() {
                    return Err(DatError::HexFileNotFound {
                        memory: name.clone(),
                        path: in_dir.join(format!("{}.{}", name, extension)),
                    });
                }
                debug!(memory = %name, "'{}' 파일이 없어 {:?}를 읽습니다", extension, fallback);
                fallback
            }
        };

        let text = fs::read_to_string(&path).map_err(|e| DatError::io(&path, e))?;
        stats.add_bytes_read(text.len() as u64);

        let mut values = Vec::new();
        for (index, line) in text.lines().enumerate() {
            let word_text = line.trim();
            if word_text.is_empty() {
                continue;
            }
            let malformed = || DatError::MalformedWord {
                file: path.clone(),
                line: index + 1,
                word: word_text.to_string(),
            };
            let word = parse_hex(word_text, &fmt).map_err(|_| malformed())?;
            let decimal = decode_word(word, &fmt).map_err(|_| malformed())?;
            let number: Number = decimal.parse().map_err(|_| malformed())?;
            values.push(Value::Number(number));
        }

        if values.len() != expected {
            return Err(DatError::WordCountMismatch {
                file: path,
                expected,
                actual: values.len(),
            });
        }

        debug!(memory = %name, words = values.len(), "hex 파일 읽음: {:?}", path);
        stats.increment_memories();
        stats.add_words(values.len());

        let format = serde_json::to_value(&entry.format).map_err(|e| DatError::SerializeError {
            file: Manifest::path_in(in_dir),
            reason: e.to_string(),
        })?;

        let mut memory = Map::new();
        memory.insert("data".to_string(), nest(&values, &entry.shape));
        memory.insert("format".to_string(), format);
        result.insert(name.clone(), Value::Object(memory));
    }

    Ok(result)
}

/// 메모리 항목의 format 필드를 읽고 검증
fn read_format(name: &str, item: &Value) -> Result<(FormatSpec, WordFormat)> {
    let raw = item
        .as_object()
        .and_then(|obj| obj.get("format"))
        .ok_or_else(|| DatError::InvalidCollection {
            reason: format!("메모리 '{}'에 format 필드가 없습니다", name),
        })?;
    let format: FormatSpec =
        serde_json::from_value(raw.clone()).map_err(|e| DatError::InvalidFormat {
            memory: name.to_string(),
            reason: e.to_string(),
        })?;
    let fmt = format.resolve(name)?;
    Ok((format, fmt))
}

/// 중첩 배열을 행 우선 순서로 펼치고 모양을 반환
fn flatten<'a>(memory: &str, value: &'a Value, out: &mut Vec<&'a Number>) -> Result<Vec<usize>> {
    match value {
        Value::Number(n) => {
            out.push(n);
            Ok(Vec::new())
        }
        Value::Array(items) => {
            let mut inner: Option<Vec<usize>> = None;
            for item in items {
                let shape = flatten(memory, item, out)?;
                match &inner {
                    Some(expected) if *expected != shape => {
                        return Err(DatError::RaggedShape {
                            memory: memory.to_string(),
                        })
                    }
                    Some(_) => {}
                    None => inner = Some(shape),
                }
            }
            let mut shape = vec![items.len()];
            shape.extend(inner.unwrap_or_default());
            Ok(shape)
        }
        other => Err(DatError::NotANumber {
            memory: memory.to_string(),
            value: other.to_string(),
        }),
    }
}

/// 펼쳐진 값을 모양대로 다시 중첩
fn nest(values: &[Value], shape: &[usize]) -> Value {
    match shape.split_first() {
        None => values.first().cloned().unwrap_or(Value::Null),
        Some((&len, rest)) => {
            let stride: usize = rest.iter().product();
            Value::Array(
                (0..len)
                    .map(|i| nest(&values[i * stride..(i + 1) * stride], rest))
                    .collect(),
            )
        }
    }
}

fn word_error(error: WordError, memory: &str, value: &str, width: u32) -> DatError {
    let memory = memory.to_string();
    let value = value.to_string();
    match error {
        WordError::NotANumber => DatError::NotANumber { memory, value },
        WordError::Inexact => DatError::InexactValue { memory, value },
        WordError::OutOfRange => DatError::OutOfRange {
            memory,
            value,
            width,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn collection() -> Value {
        serde_json::from_str(
            r#"{
                "mem0": {"data": [[1], [2]], "format": {"numeric_type": "fixed_point", "is_signed": false, "width": 8, "frac_width": 0}},
                "mem1": {"data": [-1.5, 0.25, 3], "format": {"numeric_type": "fixed_point", "is_signed": true, "width": 16, "int_width": 8}},
                "mem2": {"data": 7, "format": {"numeric_type": "bitnum", "is_signed": false, "width": 4}}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_flatten_shapes() {
        let matrix = json!([[1, 2, 3], [4, 5, 6]]);
        let mut out = Vec::new();
        assert_eq!(flatten("m", &matrix, &mut out).unwrap(), vec![2, 3]);
        assert_eq!(out.len(), 6);
        assert_eq!(out[3].to_string(), "4");

        let shape_of = |value: Value| {
            let mut out = Vec::new();
            flatten("m", &value, &mut out).unwrap()
        };
        assert_eq!(shape_of(json!([])), vec![0]);
        assert_eq!(shape_of(json!([[], []])), vec![2, 0]);
        assert_eq!(shape_of(json!(5)), Vec::<usize>::new());
    }

    #[test]
    fn test_flatten_rejects_ragged_and_non_numbers() {
        let ragged = json!([[1, 2], [3]]);
        let mut out = Vec::new();
        assert!(matches!(
            flatten("m", &ragged, &mut out),
            Err(DatError::RaggedShape { .. })
        ));

        let mixed = json!([1, "two"]);
        let mut out = Vec::new();
        assert!(matches!(
            flatten("m", &mixed, &mut out),
            Err(DatError::NotANumber { .. })
        ));
    }

    #[test]
    fn test_nest_restores_shape() {
        let values: Vec<Value> = (1..=6).map(|i| json!(i)).collect();
        assert_eq!(nest(&values, &[2, 3]), json!([[1, 2, 3], [4, 5, 6]]));
        assert_eq!(nest(&[], &[3, 0]), json!([[], [], []]));
        assert_eq!(nest(&values[..1], &[]), json!(1));
    }

    #[test]
    fn test_convert2dat_writes_files_and_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let mut stats = Statistics::new();
        let manifest =
            convert2dat(temp_dir.path(), &collection(), "dat", true, &mut stats).unwrap();

        let mem0 = fs::read_to_string(temp_dir.path().join("mem0.dat")).unwrap();
        assert_eq!(mem0, "01\n02\n");
        let mem1 = fs::read_to_string(temp_dir.path().join("mem1.dat")).unwrap();
        assert_eq!(mem1, "fe80\n0040\n0300\n");
        let mem2 = fs::read_to_string(temp_dir.path().join("mem2.dat")).unwrap();
        assert_eq!(mem2, "7\n");

        assert_eq!(manifest.memories["mem0"].shape, vec![2, 1]);
        assert_eq!(manifest.memories["mem2"].shape, Vec::<usize>::new());
        assert!(temp_dir.path().join("shape.json").is_file());
        assert_eq!(stats.memories(), 3);
        assert_eq!(stats.words(), 6);
    }

    #[test]
    fn test_round_trip_through_dat_dir() {
        let temp_dir = TempDir::new().unwrap();
        let mut stats = Statistics::new();
        let original = collection();
        convert2dat(temp_dir.path(), &original, "dat", true, &mut stats).unwrap();

        let restored = convert2json(temp_dir.path(), "out", &mut stats).unwrap();
        assert_eq!(Value::Object(restored), original);
    }

    #[test]
    fn test_convert2json_prefers_simulator_output() {
        let temp_dir = TempDir::new().unwrap();
        let mut stats = Statistics::new();
        convert2dat(temp_dir.path(), &collection(), "dat", true, &mut stats).unwrap();
        fs::write(temp_dir.path().join("mem0.out"), "0a\n0b\n").unwrap();

        let restored = convert2json(temp_dir.path(), "out", &mut stats).unwrap();
        assert_eq!(restored["mem0"]["data"], json!([[10], [11]]));
    }

    #[test]
    fn test_convert2json_word_count_mismatch() {
        let temp_dir = TempDir::new().unwrap();
        let mut stats = Statistics::new();
        convert2dat(temp_dir.path(), &collection(), "dat", true, &mut stats).unwrap();
        fs::write(temp_dir.path().join("mem0.out"), "0a\n").unwrap();

        let err = convert2json(temp_dir.path(), "out", &mut stats).unwrap_err();
        assert!(matches!(
            err,
            DatError::WordCountMismatch {
                expected: 2,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_convert2json_malformed_word() {
        let temp_dir = TempDir::new().unwrap();
        let mut stats = Statistics::new();
        convert2dat(temp_dir.path(), &collection(), "dat", true, &mut stats).unwrap();
        fs::write(temp_dir.path().join("mem0.out"), "0a\nxx\n").unwrap();

        let err = convert2json(temp_dir.path(), "out", &mut stats).unwrap_err();
        assert!(matches!(err, DatError::MalformedWord { line: 2, .. }));
    }

    #[test]
    fn test_convert2json_missing_hex_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut stats = Statistics::new();
        convert2dat(temp_dir.path(), &collection(), "dat", true, &mut stats).unwrap();
        fs::remove_file(temp_dir.path().join("mem2.dat")).unwrap();

        let err = convert2json(temp_dir.path(), "out", &mut stats).unwrap_err();
        assert!(matches!(err, DatError::HexFileNotFound { .. }));
    }

    #[test]
    fn test_convert2json_corrupted_shape_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("shape.json"),
            r#"{"m": {"format": {"numeric_type": "bitnum", "is_signed": false, "width": 8}, "shape": [18446744073709551615, 2], "extension": "dat"}}"#,
        )
        .unwrap();
        fs::write(temp_dir.path().join("m.dat"), "01\n").unwrap();

        let mut stats = Statistics::new();
        let err = convert2json(temp_dir.path(), "out", &mut stats).unwrap_err();
        assert!(matches!(err, DatError::InvalidFormat { .. }));
    }

    #[test]
    fn test_convert2json_huge_single_dimension() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("shape.json"),
            r#"{"m": {"format": {"numeric_type": "bitnum", "is_signed": false, "width": 8}, "shape": [18446744073709551615], "extension": "dat"}}"#,
        )
        .unwrap();
        fs::write(temp_dir.path().join("m.dat"), "01\n").unwrap();

        let mut stats = Statistics::new();
        let err = convert2json(temp_dir.path(), "out", &mut stats).unwrap_err();
        assert!(matches!(err, DatError::WordCountMismatch { actual: 1, .. }));
    }

    #[test]
    fn test_convert2json_multi_dot_extension() {
        let temp_dir = TempDir::new().unwrap();
        let mut stats = Statistics::new();
        convert2dat(temp_dir.path(), &collection(), "dat", true, &mut stats).unwrap();
        fs::write(temp_dir.path().join("mem0.out.txt"), "2a\n2b\n").unwrap();

        let restored = convert2json(temp_dir.path(), "out.txt", &mut stats).unwrap();
        assert_eq!(restored["mem0"]["data"], json!([[42], [43]]));
    }

    #[test]
    fn test_convert2dat_rejects_unsafe_names() {
        let temp_dir = TempDir::new().unwrap();
        let out_dir = temp_dir.path().join("out");
        fs::create_dir(&out_dir).unwrap();
        let mut stats = Statistics::new();
        let format = json!({"numeric_type": "bitnum", "is_signed": false, "width": 8});

        let escape = json!({"../x": {"data": [1], "format": format.clone()}});
        let err = convert2dat(&out_dir, &escape, "dat", true, &mut stats).unwrap_err();
        assert!(matches!(err, DatError::InvalidMemoryName { .. }));
        assert!(!temp_dir.path().join("x.dat").exists());

        let clash = json!({"shape": {"data": [1], "format": format}});
        let err = convert2dat(&out_dir, &clash, "json", true, &mut stats).unwrap_err();
        assert!(matches!(err, DatError::InvalidMemoryName { .. }));
    }

    #[test]
    fn test_convert2dat_rejects_bad_collections() {
        let temp_dir = TempDir::new().unwrap();
        let mut stats = Statistics::new();

        let err = convert2dat(temp_dir.path(), &json!([1, 2]), "dat", true, &mut stats);
        assert!(matches!(err, Err(DatError::InvalidCollection { .. })));

        let float = json!({"m": {"data": [1], "format": {"numeric_type": "floating_point", "is_signed": true, "width": 32}}});
        let err = convert2dat(temp_dir.path(), &float, "dat", true, &mut stats);
        assert!(matches!(err, Err(DatError::UnsupportedNumericType { .. })));

        let overflow = json!({"m": {"data": [300], "format": {"numeric_type": "bitnum", "is_signed": false, "width": 8}}});
        let err = convert2dat(temp_dir.path(), &overflow, "dat", true, &mut stats);
        assert!(matches!(err, Err(DatError::OutOfRange { width: 8, .. })));
    }

    #[test]
    fn test_convert2dat_rounding_flag() {
        let temp_dir = TempDir::new().unwrap();
        let mut stats = Statistics::new();
        let data: Value = serde_json::from_str(
            r#"{"m": {"data": [0.1], "format": {"numeric_type": "fixed_point", "is_signed": false, "width": 8, "frac_width": 4}}}"#,
        )
        .unwrap();

        let err = convert2dat(temp_dir.path(), &data, "dat", false, &mut stats);
        assert!(matches!(err, Err(DatError::InexactValue { .. })));

        convert2dat(temp_dir.path(), &data, "dat", true, &mut stats).unwrap();
        assert_eq!(fs::read_to_string(temp_dir.path().join("m.dat")).unwrap(), "02\n");
    }
}
