//! CLI 인자 파싱 모듈
//!
//! clap을 사용한 명령줄 인자 정의 및 변환 방향 판별을 담당합니다.

use clap::Parser;
use std::ffi::OsStr;
use std::path::PathBuf;

use crate::processor::ConvertOptions;

/// 변환 방향 플래그가 없을 때 출력하는 안내 문구
pub const USAGE_HINT: &str = "specify --from-json or --to-json";

/// 변환 방향 플래그 이름
const MODE_FLAGS: [&str; 2] = ["--from-json", "--to-json"];

/// 선택된 변환 작업
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// JSON 파일 → hex 디렉토리
    FromJson { in_file: PathBuf, out_dir: PathBuf },
    /// hex 디렉토리 → JSON 파일
    ToJson { in_dir: PathBuf, out_file: PathBuf },
}

/// json-dat CLI 인자 구조체
#[derive(Parser, Debug)]
#[command(
    name = "json-dat",
    version,
    about = "JSON <-> HEX DATA CONVERTER - 메모리 JSON과 시뮬레이터용 hex 데이터 파일을 상호 변환",
    long_about = r#"
JSON <-> HEX DATA CONVERTER
===========================

메모리 이름 → {data, format} 형태의 JSON 파일을 메모리마다 하나의
hex 데이터 파일로 풀어 쓰고, 시뮬레이터가 남긴 hex 파일을 다시 JSON으로 모읍니다.

예제:
  json-dat --from-json data.json build/
  json-dat --to-json build/ result.json
  json-dat --from-json data.json build/ --no-round --stats
"#
)]
pub struct Args {
    /// JSON 파일을 hex 파일 디렉토리로 변환
    #[arg(
        long = "from-json",
        num_args = 2,
        value_names = ["IN_FILE", "OUT_DIR"],
        conflicts_with = "to_json"
    )]
    pub from_json: Option<Vec<PathBuf>>,

    /// hex 파일 디렉토리를 JSON 파일로 변환
    #[arg(long = "to-json", num_args = 2, value_names = ["IN_DIR", "OUT_FILE"])]
    pub to_json: Option<Vec<PathBuf>>,

    /// --from-json이 기록할 hex 파일 확장자
    #[arg(long, default_value = "dat")]
    pub dat_ext: String,

    /// --to-json이 읽을 hex 파일 확장자
    #[arg(long, default_value = "out")]
    pub out_ext: String,

    /// 고정소수점으로 정확히 표현되지 않는 값을 반올림하지 않고 에러 처리
    #[arg(long)]
    pub no_round: bool,

    /// 상세 로그 출력
    #[arg(short, long)]
    pub verbose: bool,

    /// 변환 통계 요약 출력
    #[arg(long)]
    pub stats: bool,
}

impl Args {
    /// 선택된 변환 작업 반환 (방향 플래그가 없으면 None)
    pub fn command(&self) -> Option<Command> {
        if let Some([in_file, out_dir]) = self.from_json.as_deref() {
            return Some(Command::FromJson {
                in_file: in_file.clone(),
                out_dir: out_dir.clone(),
            });
        }
        if let Some([in_dir, out_file]) = self.to_json.as_deref() {
            return Some(Command::ToJson {
                in_dir: in_dir.clone(),
                out_file: out_file.clone(),
            });
        }
        None
    }

    /// 인자로부터 변환 옵션 생성
    pub fn convert_options(&self) -> ConvertOptions {
        ConvertOptions::new()
            .with_dat_extension(self.dat_ext.clone())
            .with_out_extension(self.out_ext.clone())
            .with_round(!self.no_round)
    }
}

/// 첫 번째 인자가 변환 방향 플래그인지 확인
///
/// clap 파싱이 실패했을 때 안내 문구를 낼지 판단하는 데 씁니다.
/// `argv`는 프로그램 이름을 뺀 인자 목록이며, UTF-8이 아닌 인자도 받습니다.
pub fn leads_with_mode<I, S>(argv: I) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let Some(first) = argv.into_iter().next() else {
        return false;
    };
    let Some(first) = first.as_ref().to_str() else {
        return false;
    };
    MODE_FLAGS.iter().any(|flag| {
        first == *flag
            || first
                .strip_prefix(*flag)
                .is_some_and(|rest| rest.starts_with('='))
    })
}
