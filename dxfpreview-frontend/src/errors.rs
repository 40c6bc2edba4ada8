use std::path::PathBuf;

use dxfpreview_engine::errors::SceneError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error("序列化报告失败: {0}")]
    Json(#[from] serde_json::Error),
    #[error("写出 {path:?} 失败: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 最后一个文件的解析线程异常退出，没有可展示的结果。
    #[error("文件 {path:?} 的预览未完成")]
    Unfinished { path: PathBuf },
}
