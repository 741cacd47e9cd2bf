//! json-dat - JSON <-> HEX DATA CONVERTER
//!
//! 메인 엔트리포인트

use anyhow::{Context, Result};
use clap::Parser;
use std::process;
use tracing_subscriber::EnvFilter;

use json_dat::{
    cli::{leads_with_mode, Args, Command, USAGE_HINT},
    processor::{dat2json, json2dat},
};

/// 사용법 오류 종료 코드
const USAGE_EXIT_CODE: i32 = 2;

fn main() -> Result<()> {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // 첫 인자가 방향 플래그가 아니면 안내 문구만 출력
            if e.use_stderr() && !leads_with_mode(std::env::args_os().skip(1)) {
                eprintln!("{}", USAGE_HINT);
                process::exit(USAGE_EXIT_CODE);
            }
            e.exit()
        }
    };

    init_logging(args.verbose);

    let Some(command) = args.command() else {
        eprintln!("{}", USAGE_HINT);
        process::exit(USAGE_EXIT_CODE);
    };

    let options = args.convert_options();

    let (direction, stats) = match command {
        Command::FromJson { in_file, out_dir } => {
            let stats = json2dat(&in_file, &out_dir, &options).with_context(|| {
                format!("JSON → hex 변환 실패: {:?} → {:?}", in_file, out_dir)
            })?;
            ("JSON → DAT", stats)
        }
        Command::ToJson { in_dir, out_file } => {
            let stats = dat2json(&in_dir, &out_file, &options).with_context(|| {
                format!("hex → JSON 변환 실패: {:?} → {:?}", in_dir, out_file)
            })?;
            ("DAT → JSON", stats)
        }
    };

    if args.stats {
        stats.print_summary(direction);
    }

    Ok(())
}

/// 로깅 초기화 (RUST_LOG 우선, 없으면 --verbose에 따라 debug/warn)
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
