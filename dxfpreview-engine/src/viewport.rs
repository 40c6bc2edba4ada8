use std::fmt;

use dxfpreview_core::geometry::Bounds2D;

/// 四周留白占较大边长的比例。
pub const PADDING_RATIO: f64 = 0.05;
/// 退化尺寸（单点、水平/竖直线）的最小边长。
const MIN_EXTENT: f64 = 1.0;

/// SVG `viewBox`，已处于 y 轴向下的显示坐标系。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewBox {
    /// 按场景包围盒适配视口：翻转 y 轴并在四周留出 5% 的边距。
    pub fn fit(bounds: &Bounds2D) -> Self {
        let w = bounds.width().max(MIN_EXTENT);
        let h = bounds.height().max(MIN_EXTENT);
        let pad = w.max(h) * PADDING_RATIO;
        Self {
            min_x: bounds.min_x() - pad,
            min_y: -(bounds.max_y() + pad),
            width: w + pad * 2.0,
            height: h + pad * 2.0,
        }
    }
}

/// 未加载场景时的占位视口。
impl Default for ViewBox {
    fn default() -> Self {
        Self {
            min_x: 0.0,
            min_y: 0.0,
            width: 100.0,
            height: 100.0,
        }
    }
}

impl fmt::Display for ViewBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.min_x, self.min_y, self.width, self.height
        )
    }
}

#[cfg(test)]
mod tests {
    use dxfpreview_core::geometry::Point2;

    use super::*;

    #[test]
    fn fit_pads_and_flips() {
        let bounds = Bounds2D::new(Point2::new(-10.0, -10.0), Point2::new(10.0, 10.0));
        let view = ViewBox::fit(&bounds);
        assert_eq!(
            view,
            ViewBox {
                min_x: -11.0,
                min_y: -11.0,
                width: 22.0,
                height: 22.0,
            }
        );
        assert_eq!(view.to_string(), "-11 -11 22 22");
    }

    #[test]
    fn padding_uses_the_larger_dimension() {
        let bounds = Bounds2D::new(Point2::new(0.0, 0.0), Point2::new(100.0, 20.0));
        let view = ViewBox::fit(&bounds);
        assert_eq!(view.min_x, -5.0);
        assert_eq!(view.min_y, -25.0);
        assert_eq!(view.width, 110.0);
        assert_eq!(view.height, 30.0);
    }

    #[test]
    fn degenerate_bounds_get_a_minimum_extent() {
        let bounds = Bounds2D::new(Point2::new(3.0, 4.0), Point2::new(3.0, 4.0));
        let view = ViewBox::fit(&bounds);
        assert!((view.width - 1.1).abs() < 1e-12);
        assert!((view.height - 1.1).abs() < 1e-12);
        assert!((view.min_x - 2.95).abs() < 1e-12);
        assert!((view.min_y + 4.05).abs() < 1e-12);
    }

    #[test]
    fn default_is_placeholder_box() {
        assert_eq!(ViewBox::default().to_string(), "0 0 100 100");
    }
}
