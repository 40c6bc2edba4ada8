//! 文本与 JSON 形式的预览报告。

use std::collections::BTreeMap;
use std::path::Path;

use dxfpreview_core::shape::ParsedScene;
use dxfpreview_engine::estimate::AreaEstimate;
use serde::Serialize;

/// `Rendered entities: N`，存在不支持的类型时追加前 `limit` 个类型名。
pub fn summary_line(scene: &ParsedScene, limit: usize) -> String {
    let mut line = format!("Rendered entities: {}", scene.shapes().len());
    let unsupported = scene.unsupported_types();
    if !unsupported.is_empty() {
        let shown: Vec<&str> = unsupported
            .iter()
            .take(limit)
            .map(String::as_str)
            .collect();
        line.push_str(" | Unsupported: ");
        line.push_str(&shown.join(", "));
    }
    line
}

fn shape_counts(scene: &ParsedScene) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for shape in scene.shapes() {
        *counts.entry(shape.kind_name()).or_insert(0) += 1;
    }
    counts
}

pub fn text_report(path: &Path, scene: &ParsedScene, limit: usize) -> String {
    let bounds = scene.bounds();
    let estimate = AreaEstimate::from_bounds(&bounds);
    let counts = shape_counts(scene)
        .into_iter()
        .map(|(kind, count)| format!("{kind}={count}"))
        .collect::<Vec<_>>()
        .join(", ");

    let mut lines = vec![
        format!("文件: {}", path.display()),
        summary_line(scene, limit),
        format!("图元: {counts}"),
        format!(
            "包围盒: min=({:.3}, {:.3}), max=({:.3}, {:.3})",
            bounds.min_x(),
            bounds.min_y(),
            bounds.max_x(),
            bounds.max_y()
        ),
        format!(
            "估算尺寸: {:.2} x {:.2} mm, 面积 {:.2} mm²",
            estimate.width, estimate.height, estimate.area_mm2
        ),
    ];
    if scene.unsupported_types().len() > limit {
        lines.push(format!(
            "另有 {} 种不支持的类型未列出",
            scene.unsupported_types().len() - limit
        ));
    }
    lines.join("\n")
}

/// 没有可用几何时的报告：给出错误信息与按文件体积的粗略估算。
pub fn failure_report(path: &Path, file_len: u64, message: &str) -> String {
    let estimate = AreaEstimate::from_file_size(file_len);
    format!(
        "文件: {}\n错误: {message}\n按文件体积估算: {:.0} x {:.0} mm, 面积 {:.0} mm²",
        path.display(),
        estimate.width,
        estimate.height,
        estimate.area_mm2
    )
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    file: &'a Path,
    byte_len: Option<u64>,
    summary: String,
    #[serde(flatten)]
    scene: &'a ParsedScene,
    estimate: AreaEstimate,
}

pub fn json_report(
    path: &Path,
    byte_len: Option<u64>,
    scene: &ParsedScene,
    limit: usize,
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&JsonReport {
        file: path,
        byte_len,
        summary: summary_line(scene, limit),
        scene,
        estimate: AreaEstimate::from_bounds(&scene.bounds()),
    })
}
