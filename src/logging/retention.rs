//! 历史日志保留策略: 超过保留天数的文件删除, 早于当天的未压缩文件转为 `.log.gz`.

use super::LoggingConfig;
use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

/// 一次保留策略执行的结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetentionReport {
    pub removed: usize,
    pub compressed: usize,
}

/// 目录中一个可识别的日志文件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DatedLogName {
    date: NaiveDate,
    compressed: bool,
}

impl DatedLogName {
    /// 识别 `<prefix>.<YYYY-MM-DD>.log` 与 `<prefix>.<YYYY-MM-DD>.log.gz`
    fn parse(file_name: &str, prefix: &str) -> Option<Self> {
        let rest = file_name.strip_prefix(prefix)?.strip_prefix('.')?;
        let (date_part, compressed) = match rest.strip_suffix(".log.gz") {
            Some(date_part) => (date_part, true),
            None => (rest.strip_suffix(".log")?, false),
        };
        if date_part.len() != 10 {
            return None;
        }
        let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()?;
        Some(Self { date, compressed })
    }
}

/// 以 `today` 为基准执行一次保留策略
pub fn apply_retention(config: &LoggingConfig, today: NaiveDate) -> Result<RetentionReport> {
    let directory = Path::new(&config.directory);
    let mut report = RetentionReport::default();
    if !directory.exists() {
        return Ok(report);
    }
    let cutoff = today - Duration::days(config.retention_days);

    let entries = fs::read_dir(directory)
        .with_context(|| format!("读取日志目录失败, path={}", directory.display()))?;
    for entry in entries {
        let path = entry?.path();
        let Some(name) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| DatedLogName::parse(n, &config.file_prefix))
        else {
            continue;
        };

        if name.date < cutoff {
            fs::remove_file(&path)
                .with_context(|| format!("删除过期日志失败, path={}", path.display()))?;
            report.removed += 1;
        } else if config.compress_history && !name.compressed && name.date < today {
            compress_to_gz(&path)?;
            report.compressed += 1;
        }
    }
    Ok(report)
}

fn compress_to_gz(path: &Path) -> Result<()> {
    let gz_path = PathBuf::from(format!("{}.gz", path.display()));
    if !gz_path.exists() {
        let mut input = File::open(path)
            .with_context(|| format!("打开待压缩日志失败, path={}", path.display()))?;
        let output = File::create(&gz_path)
            .with_context(|| format!("创建压缩日志失败, path={}", gz_path.display()))?;
        let mut encoder = GzEncoder::new(output, Compression::default());
        io::copy(&mut input, &mut encoder)?;
        encoder.finish()?;
    }
    fs::remove_file(path).with_context(|| format!("删除已压缩日志失败, path={}", path.display()))
}
