//! 实体归一化：把松散类型的实体记录转换为少量封闭的图元类型。
//!
//! 已识别类型但字段不完整的实体直接丢弃，不计入 `unsupported_types`；
//! 只有未识别的类型名才会作为诊断信息返回。

use std::f64::consts::TAU;

use dxfpreview_core::geometry::Point2;
use dxfpreview_core::shape::Shape;
use dxfpreview_io::{RawEntity, RawPoint};
use tracing::trace;

/// 椭圆离散化的分段数，输出点数为分段数 + 1。
pub const ELLIPSE_SEGMENTS: usize = 72;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Line,
    LwPolyline,
    Polyline,
    Spline,
    Circle,
    Ellipse,
    Arc,
}

impl EntityKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "LINE" => Some(Self::Line),
            "LWPOLYLINE" => Some(Self::LwPolyline),
            "POLYLINE" => Some(Self::Polyline),
            "SPLINE" => Some(Self::Spline),
            "CIRCLE" => Some(Self::Circle),
            "ELLIPSE" => Some(Self::Ellipse),
            "ARC" => Some(Self::Arc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub shapes: Vec<Shape>,
    /// 去重后的未识别类型名，按首次出现顺序排列。
    pub unsupported_types: Vec<String>,
}

pub fn normalize(entities: &[RawEntity]) -> Normalized {
    let mut shapes = Vec::new();
    let mut unsupported_types: Vec<String> = Vec::new();

    for (index, entity) in entities.iter().enumerate() {
        let Some(tag) = entity.kind.as_deref().filter(|tag| !tag.is_empty()) else {
            continue;
        };
        match EntityKind::from_tag(tag) {
            Some(kind) => match convert(kind, entity) {
                Some(shape) => shapes.push(shape),
                None => trace!(index, kind = tag, "实体字段不完整，已丢弃"),
            },
            None => {
                if !unsupported_types.iter().any(|name| name == tag) {
                    unsupported_types.push(tag.to_string());
                }
            }
        }
    }

    Normalized {
        shapes,
        unsupported_types,
    }
}

fn convert(kind: EntityKind, entity: &RawEntity) -> Option<Shape> {
    match kind {
        EntityKind::Line => line(entity),
        EntityKind::LwPolyline | EntityKind::Polyline => polyline(entity),
        EntityKind::Spline => spline(entity),
        EntityKind::Circle => circle(entity),
        EntityKind::Ellipse => ellipse(entity),
        EntityKind::Arc => arc(entity),
    }
}

/// 仅当值存在且为有限数时返回。
#[inline]
pub fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn finite_point(point: &RawPoint) -> Option<Point2> {
    Some(Point2::new(finite(point.x)?, finite(point.y)?))
}

fn finite_points(points: &[RawPoint]) -> Vec<Point2> {
    points.iter().filter_map(finite_point).collect()
}

fn line(entity: &RawEntity) -> Option<Shape> {
    let [a, b, ..] = entity.vertices.as_slice() else {
        return None;
    };
    Shape::polyline(vec![finite_point(a)?, finite_point(b)?], false)
}

fn polyline(entity: &RawEntity) -> Option<Shape> {
    let closed = entity.shape.unwrap_or(false) || entity.closed.unwrap_or(false);
    Shape::polyline(finite_points(&entity.vertices), closed)
}

/// 以控制多边形近似样条，不做曲线求值。
fn spline(entity: &RawEntity) -> Option<Shape> {
    Shape::polyline(finite_points(&entity.control_points), false)
}

fn circle(entity: &RawEntity) -> Option<Shape> {
    let center = finite_point(entity.center.as_ref()?)?;
    let radius = finite(entity.radius)?;
    Some(Shape::circle(center, radius))
}

fn arc(entity: &RawEntity) -> Option<Shape> {
    let center = finite_point(entity.center.as_ref()?)?;
    let radius = finite(entity.radius)?;
    let start_angle = finite(entity.start_angle)?;
    let end_angle = finite(entity.end_angle)?;
    Some(Shape::arc(center, radius, start_angle, end_angle))
}

fn ellipse(entity: &RawEntity) -> Option<Shape> {
    let center = finite_point(entity.center.as_ref()?)?;
    let major = finite_point(entity.major_axis_end_point.as_ref()?)?;
    let ratio = finite(entity.axis_ratio)?;
    let start = finite(entity.start_angle).unwrap_or(0.0);
    let end = finite(entity.end_angle).unwrap_or(TAU);
    Shape::polyline(sample_ellipse(center, major, ratio, start, end), false)
}

/// 在参数区间 `[start, end]` 上均匀采样椭圆，返回 `ELLIPSE_SEGMENTS + 1` 个点。
pub fn sample_ellipse(
    center: Point2,
    major_axis: Point2,
    axis_ratio: f64,
    start: f64,
    end: f64,
) -> Vec<Point2> {
    let semi_major = major_axis.as_vec2().length();
    let semi_minor = semi_major * axis_ratio;
    let rotation = major_axis.y().atan2(major_axis.x());
    let (sin_r, cos_r) = rotation.sin_cos();
    let delta = end - start;

    (0..=ELLIPSE_SEGMENTS)
        .map(|i| {
            let t = start + delta * i as f64 / ELLIPSE_SEGMENTS as f64;
            let x = semi_major * t.cos();
            let y = semi_minor * t.sin();
            Point2::new(
                center.x() + x * cos_r - y * sin_r,
                center.y() + x * sin_r + y * cos_r,
            )
        })
        .collect()
}
