pub mod estimate;
pub mod normalize;
pub mod path;
pub mod session;
pub mod viewport;

pub mod errors {
    use dxfpreview_io::IoError;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum SceneError {
        #[error("failed to parse DXF: {0}")]
        Parse(#[from] IoError),
        /// 文件解析成功但没有任何可预览的几何；保留不支持的类型名便于诊断。
        #[error("no previewable entities found in DXF")]
        NoPreviewableEntities { unsupported_types: Vec<String> },
    }
}

pub mod scene {
    use dxfpreview_core::geometry::Bounds2D;
    use dxfpreview_core::shape::{ParsedScene, Shape};
    use dxfpreview_io::{DocumentParser, DxfTextParser};
    use tracing::debug;

    use crate::errors::SceneError;
    use crate::normalize::{Normalized, normalize};

    /// 汇总所有图元的候选点并求包围盒；没有任何候选点时返回 `None`。
    pub fn scene_bounds(shapes: &[Shape]) -> Option<Bounds2D> {
        Bounds2D::from_points(shapes.iter().flat_map(Shape::bounding_points))
    }

    /// 由归一化结果构造最终场景。
    pub fn build_scene(normalized: Normalized) -> Result<ParsedScene, SceneError> {
        let Normalized {
            shapes,
            unsupported_types,
        } = normalized;
        let Some(bounds) = scene_bounds(&shapes) else {
            debug!(
                unsupported = unsupported_types.len(),
                "没有可预览的几何图元"
            );
            return Err(SceneError::NoPreviewableEntities { unsupported_types });
        };
        Ok(ParsedScene::new(bounds, shapes, unsupported_types))
    }

    /// 使用指定解析器完成 文本 → 实体 → 图元 → 场景 的单次转换。
    pub fn parse_with<P>(parser: &P, text: &str) -> Result<ParsedScene, SceneError>
    where
        P: DocumentParser + ?Sized,
    {
        let document = parser.parse(text)?;
        let normalized = normalize(&document.entities);
        debug!(
            entities = document.entities.len(),
            shapes = normalized.shapes.len(),
            unsupported = normalized.unsupported_types.len(),
            "实体归一化完成"
        );
        build_scene(normalized)
    }

    /// 以 ASCII DXF 文本为输入的默认入口。
    pub fn parse_dxf_text(text: &str) -> Result<ParsedScene, SceneError> {
        parse_with(&DxfTextParser::new(), text)
    }

}
