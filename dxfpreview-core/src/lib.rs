pub mod geometry {
    use glam::DVec2;
    use serde::{Deserialize, Serialize};

    /// 二维点，内部以 `glam::DVec2` 表示；序列化为 `{x, y}` 以便前端直接消费。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    #[serde(from = "PointRepr", into = "PointRepr")]
    pub struct Point2(pub DVec2);

    #[derive(Serialize, Deserialize)]
    struct PointRepr {
        x: f64,
        y: f64,
    }

    impl From<PointRepr> for Point2 {
        fn from(value: PointRepr) -> Self {
            Self::new(value.x, value.y)
        }
    }

    impl From<Point2> for PointRepr {
        fn from(value: Point2) -> Self {
            Self {
                x: value.x(),
                y: value.y(),
            }
        }
    }

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_vec(vec: DVec2) -> Self {
            Self(vec)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }

        /// 两个坐标分量均为有限值。
        #[inline]
        pub fn is_finite(self) -> bool {
            self.0.is_finite()
        }

        /// 以 x 轴为镜像翻转，用于 y 轴向下的显示坐标系。
        #[inline]
        pub fn flip_y(self) -> Self {
            Self::new(self.0.x, -self.0.y)
        }
    }

    impl From<DVec2> for Point2 {
        fn from(value: DVec2) -> Self {
            Self::from_vec(value)
        }
    }

    /// 轴对齐边界框，序列化字段与预览层约定一致（`minX`/`minY`/`maxX`/`maxY`）。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    #[serde(from = "BoundsRepr", into = "BoundsRepr")]
    pub struct Bounds2D {
        min: Point2,
        max: Point2,
    }

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct BoundsRepr {
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    }

    impl From<BoundsRepr> for Bounds2D {
        fn from(value: BoundsRepr) -> Self {
            Self::new(
                Point2::new(value.min_x, value.min_y),
                Point2::new(value.max_x, value.max_y),
            )
        }
    }

    impl From<Bounds2D> for BoundsRepr {
        fn from(value: Bounds2D) -> Self {
            Self {
                min_x: value.min_x(),
                min_y: value.min_y(),
                max_x: value.max_x(),
                max_y: value.max_y(),
            }
        }
    }

    impl Bounds2D {
        #[inline]
        pub fn new(min: Point2, max: Point2) -> Self {
            Self { min, max }
        }

        #[inline]
        pub fn empty() -> Self {
            Self {
                min: Point2::new(f64::INFINITY, f64::INFINITY),
                max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
            }
        }

        /// 对点集求分量最小/最大值；点集为空时返回 `None`。
        pub fn from_points<I>(points: I) -> Option<Self>
        where
            I: IntoIterator<Item = Point2>,
        {
            let mut bounds = Self::empty();
            for point in points {
                bounds.include_point(point);
            }
            if bounds.is_empty() { None } else { Some(bounds) }
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.min.x() > self.max.x() || self.min.y() > self.max.y()
        }

        #[inline]
        pub fn min(&self) -> Point2 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> Point2 {
            self.max
        }

        #[inline]
        pub fn min_x(&self) -> f64 {
            self.min.x()
        }

        #[inline]
        pub fn min_y(&self) -> f64 {
            self.min.y()
        }

        #[inline]
        pub fn max_x(&self) -> f64 {
            self.max.x()
        }

        #[inline]
        pub fn max_y(&self) -> f64 {
            self.max.y()
        }

        #[inline]
        pub fn width(&self) -> f64 {
            self.max.x() - self.min.x()
        }

        #[inline]
        pub fn height(&self) -> f64 {
            self.max.y() - self.min.y()
        }

        pub fn include_point(&mut self, point: Point2) {
            if self.is_empty() {
                self.min = point;
                self.max = point;
                return;
            }
            let min_vec = self.min.as_vec2().min(point.as_vec2());
            let max_vec = self.max.as_vec2().max(point.as_vec2());
            self.min = Point2::from_vec(min_vec);
            self.max = Point2::from_vec(max_vec);
        }

        #[inline]
        pub fn center(&self) -> Point2 {
            debug_assert!(!self.is_empty());
            let center = (self.min.as_vec2() + self.max.as_vec2()) * 0.5;
            Point2::from_vec(center)
        }
    }

}

pub mod shape {
    use serde::{Deserialize, Serialize};

    use crate::geometry::{Bounds2D, Point2};

    /// 归一化后的二维图元。所有坐标与半径均已通过有限值校验。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(tag = "kind", rename_all = "lowercase")]
    pub enum Shape {
        /// `closed` 为真时末点隐式连接回首点。
        Polyline { points: Vec<Point2>, closed: bool },
        Circle { center: Point2, radius: f64 },
        /// 角度单位为度，逆时针。
        #[serde(rename_all = "camelCase")]
        Arc {
            center: Point2,
            radius: f64,
            start_angle: f64,
            end_angle: f64,
        },
    }

    impl Shape {
        /// 构造多段线；少于两个点时不构成图元。
        pub fn polyline(points: Vec<Point2>, closed: bool) -> Option<Self> {
            if points.len() < 2 {
                return None;
            }
            Some(Shape::Polyline { points, closed })
        }

        #[inline]
        pub fn circle(center: Point2, radius: f64) -> Self {
            Shape::Circle { center, radius }
        }

        #[inline]
        pub fn arc(center: Point2, radius: f64, start_angle: f64, end_angle: f64) -> Self {
            Shape::Arc {
                center,
                radius,
                start_angle,
                end_angle,
            }
        }

        #[inline]
        pub fn kind_name(&self) -> &'static str {
            match self {
                Shape::Polyline { .. } => "polyline",
                Shape::Circle { .. } => "circle",
                Shape::Arc { .. } => "arc",
            }
        }

        /// 参与场景包围盒计算的候选点。
        ///
        /// 圆与圆弧均贡献整圆的外接正方形两角点，圆弧不做精确包围。
        pub fn bounding_points(&self) -> Vec<Point2> {
            match self {
                Shape::Polyline { points, .. } => points.clone(),
                Shape::Circle { center, radius } | Shape::Arc { center, radius, .. } => vec![
                    Point2::new(center.x() - radius, center.y() - radius),
                    Point2::new(center.x() + radius, center.y() + radius),
                ],
            }
        }
    }

    /// 一次解析调用的完整结果，构造后不可变。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ParsedScene {
        bounds: Bounds2D,
        shapes: Vec<Shape>,
        unsupported_types: Vec<String>,
    }

    impl ParsedScene {
        pub fn new(bounds: Bounds2D, shapes: Vec<Shape>, unsupported_types: Vec<String>) -> Self {
            Self {
                bounds,
                shapes,
                unsupported_types,
            }
        }

        #[inline]
        pub fn bounds(&self) -> Bounds2D {
            self.bounds
        }

        #[inline]
        pub fn shapes(&self) -> &[Shape] {
            &self.shapes
        }

        #[inline]
        pub fn unsupported_types(&self) -> &[String] {
            &self.unsupported_types
        }
    }

}
