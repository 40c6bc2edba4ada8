use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dxfpreview_config::{AppConfig, ConfigError, OutputFormat};
use dxfpreview_engine::session::{PreviewSession, PreviewState};
use dxfpreview_frontend::report::{failure_report, json_report, text_report};
use dxfpreview_frontend::svg::{SvgStyle, render_svg};
use dxfpreview_frontend::{CurrentPreview, FrontendError, preview_files};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

const USAGE: &str = "用法：dxfpreview [--config PATH] [--format text|json|svg] [--output PATH] FILE...";

fn main() {
    let mut args = std::env::args().skip(1);
    let mut config_override: Option<PathBuf> = None;
    let mut format_override: Option<OutputFormat> = None;
    let mut output: Option<PathBuf> = None;
    let mut files: Vec<PathBuf> = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let Some(path) = args.next() else {
                    eprintln!("`--config` 需要提供配置文件路径");
                    std::process::exit(1);
                };
                config_override = Some(PathBuf::from(path));
            }
            "--format" => {
                let Some(value) = args.next() else {
                    eprintln!("`--format` 需要提供 text/json/svg");
                    std::process::exit(1);
                };
                match value.parse() {
                    Ok(format) => format_override = Some(format),
                    Err(message) => {
                        eprintln!("{message}");
                        std::process::exit(1);
                    }
                }
            }
            "--output" => {
                let Some(path) = args.next() else {
                    eprintln!("`--output` 需要提供输出文件路径");
                    std::process::exit(1);
                };
                output = Some(PathBuf::from(path));
            }
            "-h" | "--help" => {
                println!("{USAGE}");
                return;
            }
            other if other.starts_with("--") => {
                eprintln!("未知参数：{other}");
                std::process::exit(1);
            }
            file => files.push(PathBuf::from(file)),
        }
    }

    if files.is_empty() {
        eprintln!("{USAGE}");
        std::process::exit(1);
    }

    let (config, fallback) = load_configuration(config_override);
    init_logging(&config);
    if let Some(fallback) = &fallback {
        report_config_fallback(fallback);
    }
    info!(files = files.len(), "启动 DXF 预览");

    let format = format_override.unwrap_or(config.output.format);
    let session = Arc::new(PreviewSession::new());
    let Some(current) = preview_files(&session, &files) else {
        eprintln!("{USAGE}");
        std::process::exit(1);
    };

    match render_output(&current, format, &config) {
        Ok(Rendered { body, success }) => {
            if let Err(err) = write_output(output.as_deref(), &body) {
                error!(error = %err, "写出预览结果失败");
                std::process::exit(1);
            }
            if !success {
                std::process::exit(1);
            }
        }
        Err(err) => {
            error!(error = %err, "生成预览结果失败");
            std::process::exit(1);
        }
    }
}

struct Rendered {
    body: String,
    success: bool,
}

fn render_output(
    current: &CurrentPreview,
    format: OutputFormat,
    config: &AppConfig,
) -> Result<Rendered, FrontendError> {
    let limit = config.preview.unsupported_preview_limit;
    match &current.state {
        PreviewState::Ready(scene) => {
            let body = match format {
                OutputFormat::Text => text_report(&current.path, scene, limit),
                OutputFormat::Json => json_report(&current.path, current.byte_len, scene, limit)?,
                OutputFormat::Svg => render_svg(Some(scene.as_ref()), &SvgStyle::from(&config.preview)),
            };
            Ok(Rendered {
                body,
                success: true,
            })
        }
        PreviewState::Failed(message) => {
            let file_len = fs::metadata(&current.path)
                .map(|meta| meta.len())
                .unwrap_or(0);
            warn!(path = %current.path.display(), error = %message, "当前文件没有可用的预览");
            let body = match format {
                OutputFormat::Svg => render_svg(None, &SvgStyle::from(&config.preview)),
                _ => failure_report(&current.path, file_len, message),
            };
            Ok(Rendered {
                body,
                success: false,
            })
        }
        PreviewState::Idle | PreviewState::Loading => Err(FrontendError::Unfinished {
            path: current.path.clone(),
        }),
    }
}

fn write_output(path: Option<&Path>, body: &str) -> Result<(), FrontendError> {
    match path {
        Some(path) => {
            fs::write(path, body).map_err(|source| FrontendError::Write {
                path: path.to_path_buf(),
                source,
            })?;
            info!(path = %path.display(), "预览结果已写出");
            Ok(())
        }
        None => {
            println!("{body}");
            Ok(())
        }
    }
}

/// 加载配置；失败时回退到内建默认值，并把失败原因带回，待日志初始化后再报告。
fn load_configuration(override_path: Option<PathBuf>) -> (AppConfig, Option<ConfigFallback>) {
    let result = match override_path {
        Some(path) => AppConfig::from_file(path).map_err(ConfigFallback::Explicit),
        None => AppConfig::discover().map_err(ConfigFallback::Discovered),
    };
    match result {
        Ok(config) => (config, None),
        Err(fallback) => (AppConfig::default(), Some(fallback)),
    }
}

#[derive(Debug)]
enum ConfigFallback {
    /// `--config` 指定的文件不可用。
    Explicit(ConfigError),
    Discovered(ConfigError),
}

fn report_config_fallback(fallback: &ConfigFallback) {
    match fallback {
        ConfigFallback::Explicit(err) => {
            warn!(error = %err, "加载指定配置失败，使用默认配置");
        }
        ConfigFallback::Discovered(err) => match err {
            ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                warn!(path = %path.display(), error = %err, "加载默认配置失败，使用内建默认值");
            }
            ConfigError::Context { .. } => {
                warn!(error = %err, "加载默认配置失败，使用内建默认值");
            }
        },
    }
}

/// 日志输出到 stderr，stdout 留给报告本身。
fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
