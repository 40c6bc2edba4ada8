//! 把解析结果渲染为独立的 SVG 文档。

use std::fmt::Write;

use dxfpreview_config::PreviewConfig;
use dxfpreview_core::shape::ParsedScene;
use dxfpreview_engine::path::{SvgPrimitive, display_primitive};
use dxfpreview_engine::viewport::ViewBox;

const GRID_STROKE: &str = "rgba(255,255,255,0.06)";
const GRID_STROKE_WIDTH: f64 = 0.2;
/// 网格背景覆盖的范围，远大于常见图纸。
const GRID_EXTENT: f64 = 100_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SvgStyle {
    pub stroke: String,
    pub stroke_width: f64,
    pub background: String,
    /// 网格间距；`None` 表示不绘制网格。
    pub grid_spacing: Option<f64>,
}

impl From<&PreviewConfig> for SvgStyle {
    fn from(config: &PreviewConfig) -> Self {
        Self {
            stroke: config.stroke.clone(),
            stroke_width: config.stroke_width,
            background: config.background.clone(),
            grid_spacing: config.grid.then_some(config.grid_spacing),
        }
    }
}

impl Default for SvgStyle {
    fn default() -> Self {
        Self::from(&PreviewConfig::default())
    }
}

/// 渲染完整的 SVG 文档；`scene` 为空时只输出占位视口与背景。
pub fn render_svg(scene: Option<&ParsedScene>, style: &SvgStyle) -> String {
    let view = scene
        .map(|scene| ViewBox::fit(&scene.bounds()))
        .unwrap_or_default();

    let mut out = String::new();
    // 写入 String 不会失败
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{view}" preserveAspectRatio="xMidYMid meet" style="background:{}">"#,
        escape_attr(&style.background)
    );

    if let Some(spacing) = style.grid_spacing.filter(|s| s.is_finite() && *s > 0.0) {
        let _ = writeln!(out, "  <defs>");
        let _ = writeln!(
            out,
            r#"    <pattern id="grid" width="{spacing}" height="{spacing}" patternUnits="userSpaceOnUse">"#
        );
        let _ = writeln!(
            out,
            r#"      <path d="M {spacing} 0 L 0 0 0 {spacing}" fill="none" stroke="{GRID_STROKE}" stroke-width="{GRID_STROKE_WIDTH}"/>"#
        );
        let _ = writeln!(out, "    </pattern>");
        let _ = writeln!(out, "  </defs>");
        let _ = writeln!(
            out,
            r#"  <rect x="{}" y="{}" width="{}" height="{}" fill="url(#grid)"/>"#,
            -GRID_EXTENT,
            -GRID_EXTENT,
            GRID_EXTENT * 2.0,
            GRID_EXTENT * 2.0
        );
    }

    if let Some(scene) = scene {
        let _ = writeln!(
            out,
            r#"  <g stroke="{}" stroke-width="{}" fill="none">"#,
            escape_attr(&style.stroke),
            style.stroke_width
        );
        for shape in scene.shapes() {
            match display_primitive(shape) {
                SvgPrimitive::Path { d } => {
                    let _ = writeln!(
                        out,
                        r#"    <path d="{d}" vector-effect="non-scaling-stroke"/>"#
                    );
                }
                SvgPrimitive::Circle { cx, cy, r } => {
                    let _ = writeln!(
                        out,
                        r#"    <circle cx="{cx}" cy="{cy}" r="{r}" vector-effect="non-scaling-stroke"/>"#
                    );
                }
            }
        }
        let _ = writeln!(out, "  </g>");
    }

    out.push_str("</svg>\n");
    out
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}

#[cfg(test)]
mod tests {
    use dxfpreview_core::geometry::{Bounds2D, Point2};
    use dxfpreview_core::shape::Shape;

    use super::*;

    fn sample_scene() -> ParsedScene {
        ParsedScene::new(
            Bounds2D::new(Point2::new(-10.0, -10.0), Point2::new(10.0, 10.0)),
            vec![
                Shape::circle(Point2::new(0.0, 0.0), 10.0),
                Shape::polyline(vec![Point2::new(0.0, 0.0), Point2::new(10.0, 5.0)], false)
                    .unwrap(),
                Shape::arc(Point2::new(0.0, 0.0), 5.0, 0.0, 90.0),
            ],
            vec!["TEXT".to_string()],
        )
    }

    #[test]
    fn scene_is_rendered_in_input_order() {
        let svg = render_svg(Some(&sample_scene()), &SvgStyle::default());
        assert!(svg.starts_with("<svg "));
        assert!(svg.contains(r#"viewBox="-11 -11 22 22""#), "{svg}");
        assert!(svg.contains(r##"stroke="#67e8f9" stroke-width="0.7""##));

        let circle = svg.find("<circle").expect("circle element");
        let line = svg.find(r#"<path d="M 0 0 L 10 -5""#).expect("line element");
        let arc = svg.find(" A 5 5 0 0 1 ").expect("arc element");
        assert!(circle < line && line < arc);
        assert!(svg.contains(r#"<circle cx="0" cy="0" r="10" vector-effect="non-scaling-stroke"/>"#));
        assert_eq!(svg.matches("non-scaling-stroke").count(), 3);
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn empty_preview_uses_placeholder_view_box() {
        let svg = render_svg(None, &SvgStyle::default());
        assert!(svg.contains(r#"viewBox="0 0 100 100""#));
        assert!(svg.contains(r#"<pattern id="grid""#));
        assert!(!svg.contains("<g "));
    }

    #[test]
    fn grid_can_be_disabled() {
        let config = PreviewConfig {
            grid: false,
            ..PreviewConfig::default()
        };
        let svg = render_svg(Some(&sample_scene()), &SvgStyle::from(&config));
        assert!(!svg.contains("<pattern"));
        assert!(!svg.contains("url(#grid)"));
    }
}
