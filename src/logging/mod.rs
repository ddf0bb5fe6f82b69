//! 日志初始化.
//!
//! 库 crate 通过 `log` 门面输出, 这里安装 tracing 订阅器:
//! 控制台层 (可关闭) 与按日期命名的文件层, 各自由 `EnvFilter` 过滤.
//! 初始化时顺带执行一次历史日志保留策略 (过期删除, 旧文件 gzip 压缩).

use anyhow::{Context, Result};
use chrono::{Datelike, Local, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self, FormatEvent, FormatFields, format::Writer},
    layer::{Layer, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
};

mod retention;

pub use retention::{RetentionReport, apply_retention};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 文件层过滤表达式, 如 `info` 或 `avc_codec=debug`
    pub level: String,
    pub directory: String,
    pub file_prefix: String,
    /// 是否输出到控制台
    #[serde(default = "default_true")]
    pub console: bool,
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
    #[serde(default = "default_true")]
    pub compress_history: bool,
}

fn default_true() -> bool {
    true
}

fn default_retention_days() -> i64 {
    30
}

impl LoggingConfig {
    /// 从 JSON 文本读取
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("解析日志配置失败")
    }
}

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// 安装全局订阅器 (进程内只能成功一次)
pub fn init(config: LoggingConfig) -> Result<()> {
    std::fs::create_dir_all(&config.directory)
        .with_context(|| format!("创建日志目录失败, path={}", config.directory))?;

    let report = apply_retention(&config, Local::now().date_naive())?;

    let file_appender = DatedFileWriter::new(Path::new(&config.directory), &config.file_prefix)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    LOG_GUARD.set(guard).ok();

    let file_layer = fmt::Layer::default()
        .with_writer(non_blocking)
        .with_ansi(false)
        .event_format(FileFormatter)
        .with_filter(EnvFilter::new(&config.level));

    let console_layer = config.console.then(|| {
        fmt::Layer::default()
            .with_writer(std::io::stdout)
            .with_ansi(true)
            .event_format(ConsoleFormatter)
            .with_filter(EnvFilter::new(&config.level))
    });

    Registry::default()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("安装日志订阅器失败")?;

    tracing::debug!(
        "日志已初始化, 目录={}, 删除 {} 个过期文件, 压缩 {} 个历史文件",
        config.directory,
        report.removed,
        report.compressed
    );
    Ok(())
}

/// 按当天日期命名的追加写文件, 跨日后首次写入时切换到新文件
struct DatedFileWriter {
    directory: PathBuf,
    prefix: String,
    date: NaiveDate,
    file: File,
}

impl DatedFileWriter {
    fn new(directory: &Path, prefix: &str) -> Result<Self> {
        let date = Local::now().date_naive();
        let file = open_append_file(&build_current_log_path(directory, prefix, date))?;
        Ok(Self {
            directory: directory.to_path_buf(),
            prefix: prefix.to_string(),
            date,
            file,
        })
    }

    fn roll_if_needed(&mut self) -> std::io::Result<()> {
        let today = Local::now().date_naive();
        if today == self.date {
            return Ok(());
        }
        let path = build_current_log_path(&self.directory, &self.prefix, today);
        self.file = open_append_file(&path).map_err(std::io::Error::other)?;
        self.date = today;
        Ok(())
    }
}

impl Write for DatedFileWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.roll_if_needed()?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.file.flush()
    }
}

fn open_append_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("打开日志文件失败, path={}", path.display()))
}

/// 指定日期的日志文件路径: `<dir>/<prefix>.<YYYY-MM-DD>.log`
pub fn build_current_log_path(directory: &Path, prefix: &str, date: NaiveDate) -> PathBuf {
    directory.join(format!("{}.{}.log", prefix, date.format("%Y-%m-%d")))
}

fn write_timestamp(writer: &mut Writer<'_>) -> std::fmt::Result {
    let now = Local::now();
    write!(
        writer,
        "[{:02}-{:02} {:02}:{:02}:{:02}.{:03}] ",
        now.month(),
        now.day(),
        now.hour(),
        now.minute(),
        now.second(),
        now.timestamp_subsec_millis()
    )
}

struct ConsoleFormatter;

impl<S, N> FormatEvent<S, N> for ConsoleFormatter
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &fmt::FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        write_timestamp(&mut writer)?;
        let color = match *meta.level() {
            tracing::Level::ERROR => "\x1b[31m",
            tracing::Level::WARN => "\x1b[33m",
            tracing::Level::INFO => "\x1b[32m",
            _ => "\x1b[34m",
        };
        write!(
            writer,
            "{}{:5}\x1b[0m {} > ",
            color,
            meta.level().to_string(),
            meta.target()
        )?;
        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

struct FileFormatter;

impl<S, N> FormatEvent<S, N> for FileFormatter
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &fmt::FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        write_timestamp(&mut writer)?;
        write!(writer, "{:5} {} > ", meta.level().to_string(), meta.target())?;
        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_current_log_path() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 6);
        match date {
            Some(date) => {
                let path = build_current_log_path(Path::new("logs"), "avc", date);
                assert_eq!(path, PathBuf::from("logs/avc.2026-02-06.log"));
            }
            None => panic!("测试日期初始化失败"),
        }
    }

    #[test]
    fn test_config_defaults_from_json() {
        let config =
            LoggingConfig::from_json(r#"{"level":"debug","directory":"logs","file_prefix":"avc"}"#)
                .unwrap();
        assert!(config.console);
        assert!(config.compress_history);
        assert_eq!(config.retention_days, 30);
        assert!(LoggingConfig::from_json("{}").is_err(), "缺少必填字段应报错");
    }
}
