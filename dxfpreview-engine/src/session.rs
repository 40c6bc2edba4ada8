//! 预览会话：用代次计数器丢弃过期的解析结果。
//!
//! 每次选择新文件调用 `begin` 领取一个 `Generation`；解析完成后携带该票据提交，
//! 只有仍为最新一代的结果才会被接受。核心解析本身无取消原语。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dxfpreview_core::shape::ParsedScene;
use tracing::debug;

use crate::errors::SceneError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Default)]
pub enum PreviewState {
    #[default]
    Idle,
    Loading,
    Ready(Arc<ParsedScene>),
    /// 失败时不保留上一份场景，只保留可展示的错误信息。
    Failed(String),
}

impl PreviewState {
    pub fn scene(&self) -> Option<&ParsedScene> {
        match self {
            PreviewState::Ready(scene) => Some(scene.as_ref()),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            PreviewState::Failed(message) => Some(message.as_str()),
            _ => None,
        }
    }

    #[inline]
    pub fn is_loading(&self) -> bool {
        matches!(self, PreviewState::Loading)
    }
}

#[derive(Debug, Default)]
pub struct PreviewSession {
    current: AtomicU64,
    state: Mutex<PreviewState>,
}

impl PreviewSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// 开始新一代解析，之前领取的票据全部失效。
    pub fn begin(&self) -> Generation {
        let mut state = self.lock_state();
        let generation = Generation(self.current.fetch_add(1, Ordering::SeqCst) + 1);
        *state = PreviewState::Loading;
        debug!(generation = generation.get(), "开始新的预览解析");
        generation
    }

    /// 提交解析结果；返回 `false` 表示票据已过期、结果被丢弃。
    pub fn complete(
        &self,
        generation: Generation,
        result: Result<ParsedScene, SceneError>,
    ) -> bool {
        let mut state = self.lock_state();
        if !self.is_current(generation) {
            debug!(generation = generation.get(), "丢弃过期的解析结果");
            return false;
        }
        *state = match result {
            Ok(scene) => PreviewState::Ready(Arc::new(scene)),
            Err(err) => PreviewState::Failed(err.to_string()),
        };
        true
    }

    /// 清除当前文件：作废所有票据并回到空闲状态。
    pub fn clear(&self) {
        let mut state = self.lock_state();
        self.current.fetch_add(1, Ordering::SeqCst);
        *state = PreviewState::Idle;
    }

    #[inline]
    pub fn is_current(&self, generation: Generation) -> bool {
        self.current.load(Ordering::SeqCst) == generation.0
    }

    pub fn state(&self) -> PreviewState {
        self.lock_state().clone()
    }

    fn lock_state(&self) -> MutexGuard<'_, PreviewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
