use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use dxfpreview_core::shape::ParsedScene;
use dxfpreview_engine::errors::SceneError;
use dxfpreview_engine::scene::parse_with;
use dxfpreview_engine::session::{Generation, PreviewSession, PreviewState};
use dxfpreview_io::{DocumentParser, DxfTextParser, IoError, JsonEntityParser};
use tracing::{debug, info, warn};

/// 单个文件的解析结果与元信息。
#[derive(Debug)]
pub struct LoadedPreview {
    pub path: PathBuf,
    pub byte_len: u64,
    pub scene: ParsedScene,
}

/// 按扩展名选择解析器：`.json` 视为已解析的实体列表，其余按 ASCII DXF 处理。
fn parser_for(path: &Path) -> Box<dyn DocumentParser> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        Box::new(JsonEntityParser::new())
    } else {
        Box::new(DxfTextParser::new())
    }
}

pub fn load_preview(path: &Path) -> Result<LoadedPreview, SceneError> {
    let text = fs::read_to_string(path).map_err(|source| IoError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    let byte_len = text.len() as u64;

    match parse_with(parser_for(path).as_ref(), &text) {
        Ok(scene) => {
            info!(
                path = %path.display(),
                shapes = scene.shapes().len(),
                unsupported = scene.unsupported_types().len(),
                "DXF 预览解析成功"
            );
            Ok(LoadedPreview {
                path: path.to_path_buf(),
                byte_len,
                scene,
            })
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "DXF 预览解析失败");
            Err(err)
        }
    }
}

/// 一批文件中最后（当前）一个文件的会话状态。
#[derive(Debug, Clone)]
pub struct CurrentPreview {
    pub path: PathBuf,
    /// 解析成功时的文件字节数。
    pub byte_len: Option<u64>,
    pub state: PreviewState,
}

/// 依次选择多个文件：每个文件在独立线程中解析，结果经同一个会话仲裁，
/// 只有最后一个文件的结果被接受。
pub fn preview_files(session: &Arc<PreviewSession>, paths: &[PathBuf]) -> Option<CurrentPreview> {
    let last = paths.last()?.clone();

    let handles: Vec<(Generation, thread::JoinHandle<Option<u64>>)> = paths
        .iter()
        .cloned()
        .map(|path| {
            let generation = session.begin();
            let session = Arc::clone(session);
            let handle = thread::spawn(move || {
                let result = load_preview(&path);
                let byte_len = result.as_ref().ok().map(|loaded| loaded.byte_len);
                if session.complete(generation, result.map(|loaded| loaded.scene)) {
                    byte_len
                } else {
                    debug!(path = %path.display(), generation = generation.get(), "忽略过期的预览结果");
                    None
                }
            });
            (generation, handle)
        })
        .collect();

    let mut current_len = None;
    for (generation, handle) in handles {
        match handle.join() {
            Ok(byte_len) if session.is_current(generation) => current_len = byte_len,
            Ok(_) => {}
            Err(_) => warn!(generation = generation.get(), "预览解析线程异常退出"),
        }
    }

    Some(CurrentPreview {
        path: last,
        byte_len: current_len,
        state: session.state(),
    })
}
