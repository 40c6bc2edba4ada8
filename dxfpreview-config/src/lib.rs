use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub preview: PreviewConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 自动发现配置文件：优先读取环境变量 `DXFPREVIEW_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os("DXFPREVIEW_CONFIG") {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// 预览渲染与摘要展示。
#[derive(Debug, Clone, Deserialize)]
pub struct PreviewConfig {
    /// 摘要行中最多列出的不支持类型数量。
    #[serde(default = "PreviewConfig::default_unsupported_limit")]
    pub unsupported_preview_limit: usize,
    #[serde(default = "PreviewConfig::default_stroke")]
    pub stroke: String,
    #[serde(default = "PreviewConfig::default_stroke_width")]
    pub stroke_width: f64,
    #[serde(default = "PreviewConfig::default_background")]
    pub background: String,
    #[serde(default = "PreviewConfig::default_grid")]
    pub grid: bool,
    #[serde(default = "PreviewConfig::default_grid_spacing")]
    pub grid_spacing: f64,
}

impl PreviewConfig {
    fn default_unsupported_limit() -> usize {
        5
    }

    fn default_stroke() -> String {
        "#67e8f9".to_string()
    }

    fn default_stroke_width() -> f64 {
        0.7
    }

    fn default_background() -> String {
        "#0b0f14".to_string()
    }

    fn default_grid() -> bool {
        true
    }

    fn default_grid_spacing() -> f64 {
        10.0
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            unsupported_preview_limit: Self::default_unsupported_limit(),
            stroke: Self::default_stroke(),
            stroke_width: Self::default_stroke_width(),
            background: Self::default_background(),
            grid: Self::default_grid(),
            grid_spacing: Self::default_grid_spacing(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Svg,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "svg" => Ok(OutputFormat::Svg),
            other => Err(format!("未知输出格式：{other}（可选 text/json/svg）")),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}
