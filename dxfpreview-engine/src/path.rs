//! 图元到 SVG 路径数据的转换。
//!
//! `arc_path`/`polyline_path` 工作在图纸坐标系（y 轴向上）；
//! `display_primitive` 额外应用显示约定：y 取反，圆弧角度随之取反并交换起止，
//! 使固定的 sweep 标志 1 在 y 轴向下的屏幕上仍沿原方向绘制。

use std::fmt;

use dxfpreview_core::geometry::Point2;
use dxfpreview_core::shape::Shape;

/// 圆弧扫掠角（度），恒在 `[0, 360)` 内。
#[inline]
pub fn arc_sweep_degrees(start_deg: f64, end_deg: f64) -> f64 {
    ((end_deg - start_deg) % 360.0 + 360.0) % 360.0
}

#[inline]
fn point_on_circle(center: Point2, radius: f64, angle_deg: f64) -> Point2 {
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    Point2::new(center.x() + radius * cos, center.y() + radius * sin)
}

/// 一段圆弧的 `M … A …` 路径指令。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcPath {
    pub start: Point2,
    pub end: Point2,
    pub radius: f64,
    pub sweep_degrees: f64,
    pub large_arc: bool,
    pub sweep: bool,
}

pub fn arc_path(center: Point2, radius: f64, start_deg: f64, end_deg: f64) -> ArcPath {
    let sweep_degrees = arc_sweep_degrees(start_deg, end_deg);
    ArcPath {
        start: point_on_circle(center, radius, start_deg),
        end: point_on_circle(center, radius, end_deg),
        radius,
        sweep_degrees,
        large_arc: sweep_degrees > 180.0,
        sweep: true,
    }
}

impl fmt::Display for ArcPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "M {} {} A {} {} 0 {} {} {} {}",
            num(self.start.x()),
            num(self.start.y()),
            num(self.radius),
            num(self.radius),
            u8::from(self.large_arc),
            u8::from(self.sweep),
            num(self.end.x()),
            num(self.end.y()),
        )
    }
}

/// `M x y L x y …`，闭合时追加 `Z`。
pub fn polyline_path(points: &[Point2], closed: bool) -> String {
    let mut d = points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let command = if i == 0 { 'M' } else { 'L' };
            format!("{command} {} {}", num(p.x()), num(p.y()))
        })
        .collect::<Vec<_>>()
        .join(" ");
    if closed {
        d.push_str(" Z");
    }
    d
}

/// 屏幕坐标系下的可绘制元素。
#[derive(Debug, Clone, PartialEq)]
pub enum SvgPrimitive {
    Path { d: String },
    Circle { cx: f64, cy: f64, r: f64 },
}

pub fn display_primitive(shape: &Shape) -> SvgPrimitive {
    match shape {
        Shape::Polyline { points, closed } => {
            let flipped: Vec<Point2> = points.iter().map(|p| p.flip_y()).collect();
            SvgPrimitive::Path {
                d: polyline_path(&flipped, *closed),
            }
        }
        Shape::Circle { center, radius } => SvgPrimitive::Circle {
            cx: num(center.x()),
            cy: num(-center.y()),
            r: *radius,
        },
        Shape::Arc {
            center,
            radius,
            start_angle,
            end_angle,
        } => SvgPrimitive::Path {
            d: display_arc(*center, *radius, *start_angle, *end_angle).to_string(),
        },
    }
}

/// 翻转 y 轴后的圆弧：逆时针的 `start → end` 在屏幕上等价于
/// 正方向的 `-end → -start`。
pub fn display_arc(center: Point2, radius: f64, start_deg: f64, end_deg: f64) -> ArcPath {
    arc_path(center.flip_y(), radius, -end_deg, -start_deg)
}

/// 去掉 `-0`，避免输出 `M -0 …`。
#[inline]
fn num(value: f64) -> f64 {
    if value == 0.0 { 0.0 } else { value }
}
