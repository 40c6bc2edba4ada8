//! 报价用的面积估算。

use dxfpreview_core::geometry::Bounds2D;
use serde::Serialize;

/// 文件体积为 0（未知）时按此字节数估算。
const FALLBACK_BYTES: u64 = 50_000;
const BYTES_PER_STEP: u64 = 20_000;
const MAX_STEPS: u64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaEstimate {
    pub width: f64,
    pub height: f64,
    pub area_mm2: f64,
}

impl AreaEstimate {
    fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            area_mm2: width * height,
        }
    }

    /// 以场景包围盒的宽高估算板材面积（图纸单位视为毫米）。
    pub fn from_bounds(bounds: &Bounds2D) -> Self {
        Self::new(bounds.width(), bounds.height())
    }

    /// 没有几何信息时，按文件体积粗估尺寸。
    pub fn from_file_size(bytes: u64) -> Self {
        let bytes = if bytes == 0 { FALLBACK_BYTES } else { bytes };
        let steps = bytes.div_ceil(BYTES_PER_STEP).clamp(1, MAX_STEPS) as f64;
        Self::new(80.0 + steps * 15.0, 60.0 + steps * 12.0)
    }
}

#[cfg(test)]
mod tests {
    use dxfpreview_core::geometry::Point2;

    use super::*;

    #[test]
    fn bounds_estimate_is_width_times_height() {
        let bounds = Bounds2D::new(Point2::new(-10.0, 0.0), Point2::new(30.0, 25.0));
        let estimate = AreaEstimate::from_bounds(&bounds);
        assert_eq!(estimate.width, 40.0);
        assert_eq!(estimate.height, 25.0);
        assert_eq!(estimate.area_mm2, 1000.0);
    }

    #[test]
    fn file_size_estimate_steps_every_20k() {
        let small = AreaEstimate::from_file_size(1);
        assert_eq!((small.width, small.height), (95.0, 72.0));

        let unknown = AreaEstimate::from_file_size(0);
        assert_eq!((unknown.width, unknown.height), (125.0, 96.0));
        assert_eq!(unknown.area_mm2, 12_000.0);

        let huge = AreaEstimate::from_file_size(10_000_000);
        assert_eq!((huge.width, huge.height), (380.0, 300.0));
    }
}
