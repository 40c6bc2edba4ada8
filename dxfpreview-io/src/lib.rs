//! DXF 文档解析层：把文件文本转换为松散类型的实体记录。
//!
//! 这里只负责“读出”字段，不做任何几何校验；所有数值字段都可能缺失或为非有限值，
//! 由上层的归一化逻辑决定取舍。

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, trace};

pub mod json;

pub use json::JsonEntityParser;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
    #[error("invalid entity JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl IoError {
    fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            message: message.into(),
        }
    }
}

/// 实体中的一个坐标记录，任一分量都可能缺失。
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawPoint {
    #[serde(deserialize_with = "json::lenient_number")]
    pub x: Option<f64>,
    #[serde(deserialize_with = "json::lenient_number")]
    pub y: Option<f64>,
    #[serde(deserialize_with = "json::lenient_number")]
    pub z: Option<f64>,
}

impl RawPoint {
    pub fn xy(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            z: None,
        }
    }
}

/// 解析器输出的通用实体记录。字段含义随 `kind` 变化。
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawEntity {
    #[serde(rename = "type", deserialize_with = "json::lenient_string")]
    pub kind: Option<String>,
    #[serde(deserialize_with = "json::lenient_string")]
    pub layer: Option<String>,
    #[serde(deserialize_with = "json::lenient_string")]
    pub handle: Option<String>,
    #[serde(deserialize_with = "json::lenient_points")]
    pub vertices: Vec<RawPoint>,
    #[serde(deserialize_with = "json::lenient_points")]
    pub control_points: Vec<RawPoint>,
    #[serde(deserialize_with = "json::lenient_points")]
    pub fit_points: Vec<RawPoint>,
    #[serde(deserialize_with = "json::lenient_point")]
    pub center: Option<RawPoint>,
    #[serde(deserialize_with = "json::lenient_number")]
    pub radius: Option<f64>,
    /// ARC 为角度（度），ELLIPSE 为参数（弧度）。
    #[serde(deserialize_with = "json::lenient_number")]
    pub start_angle: Option<f64>,
    #[serde(deserialize_with = "json::lenient_number")]
    pub end_angle: Option<f64>,
    #[serde(deserialize_with = "json::lenient_point")]
    pub major_axis_end_point: Option<RawPoint>,
    #[serde(deserialize_with = "json::lenient_number")]
    pub axis_ratio: Option<f64>,
    #[serde(deserialize_with = "json::lenient_flag")]
    pub shape: Option<bool>,
    #[serde(deserialize_with = "json::lenient_flag")]
    pub closed: Option<bool>,
}

impl RawEntity {
    pub fn with_kind(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawDocument {
    #[serde(deserialize_with = "json::lenient_entities")]
    pub entities: Vec<RawEntity>,
}

/// 文档解析器契约：文本进，实体列表出。语法错误是唯一的失败路径。
pub trait DocumentParser {
    fn parse(&self, text: &str) -> Result<RawDocument, IoError>;

    fn load(&self, path: &Path) -> Result<RawDocument, IoError> {
        let data = fs::read_to_string(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse(&data)
    }
}

/// ASCII DXF 组码/值对解析器。
#[derive(Debug, Clone, Copy, Default)]
pub struct DxfTextParser;

impl DxfTextParser {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentParser for DxfTextParser {
    fn parse(&self, text: &str) -> Result<RawDocument, IoError> {
        let document = DxfParser::new(text).parse()?;
        debug!(entity_count = document.entities.len(), "DXF 文本解析完成");
        Ok(document)
    }
}

type Group = (i32, String);

struct DxfParser<'a> {
    reader: DxfReader<'a>,
}

impl<'a> DxfParser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            reader: DxfReader::new(source),
        }
    }

    fn parse(mut self) -> Result<RawDocument, IoError> {
        let mut document = RawDocument::default();
        while let Some((code, value)) = self.reader.next_pair()? {
            if code != 0 {
                return Err(self.error(format!(
                    "unexpected group code {code} (expected 0 for SECTION/EOF)"
                )));
            }
            match value.trim() {
                "SECTION" => {
                    let (name_code, name) = self
                        .reader
                        .next_pair()?
                        .ok_or_else(|| self.error("SECTION is missing its name (group 2)"))?;
                    if name_code != 2 {
                        return Err(self.error(format!(
                            "SECTION name uses group code {name_code} (expected 2)"
                        )));
                    }
                    match name.trim() {
                        "ENTITIES" => self.parse_entities(&mut document)?,
                        other => {
                            trace!(section = other, "跳过非 ENTITIES 段");
                            self.skip_section()?;
                        }
                    }
                }
                "EOF" => break,
                unexpected => {
                    return Err(self.error(format!(
                        "unexpected marker {unexpected}, expected SECTION or EOF"
                    )));
                }
            }
        }
        Ok(document)
    }

    fn error(&self, message: impl Into<String>) -> IoError {
        IoError::syntax(self.reader.line_number, message)
    }

    fn skip_section(&mut self) -> Result<(), IoError> {
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) if value.trim() == "ENDSEC" => break,
                Some(_) => continue,
                None => return Err(self.error("SECTION has no ENDSEC terminator")),
            }
        }
        Ok(())
    }

    fn parse_entities(&mut self, document: &mut RawDocument) -> Result<(), IoError> {
        loop {
            let (code, value) = match self.reader.next_pair()? {
                Some(pair) => pair,
                None => return Err(self.error("ENTITIES section ended prematurely")),
            };
            if code != 0 {
                return Err(self.error(format!(
                    "ENTITIES section hit group code {code} (expected 0 to start an entity)"
                )));
            }

            match value.trim() {
                "ENDSEC" => break,
                "POLYLINE" => {
                    let entity = self.parse_polyline_sequence()?;
                    document.entities.push(entity);
                }
                // 游离的 VERTEX/SEQEND 不构成独立实体
                "VERTEX" | "SEQEND" => {
                    self.collect_groups()?;
                }
                kind => {
                    let groups = self.collect_groups()?;
                    document.entities.push(build_entity(kind, &groups));
                }
            }
        }
        Ok(())
    }

    /// POLYLINE 头之后跟随若干 VERTEX，直到 SEQEND。
    fn parse_polyline_sequence(&mut self) -> Result<RawEntity, IoError> {
        let header = self.collect_groups()?;
        let mut entity = build_entity("POLYLINE", &header);

        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => match value.trim() {
                    "VERTEX" => {
                        let groups = self.collect_groups()?;
                        let flags = first_flags(&groups);
                        // 多面网格的面记录只包含顶点索引
                        if flags & 0x80 != 0 && flags & 0x40 == 0 {
                            continue;
                        }
                        if let Some(point) = first_point(&groups, 10) {
                            entity.vertices.push(point);
                        }
                    }
                    "SEQEND" => {
                        self.collect_groups()?;
                        break;
                    }
                    _ => {
                        // 缺少 SEQEND 时以下一个实体作为序列终点
                        self.reader.put_back((0, value));
                        break;
                    }
                },
                Some((code, _)) => {
                    return Err(self.error(format!(
                        "POLYLINE sequence hit group code {code} (expected 0)"
                    )));
                }
                None => return Err(self.error("POLYLINE sequence has no SEQEND terminator")),
            }
        }

        Ok(entity)
    }

    fn collect_groups(&mut self) -> Result<Vec<Group>, IoError> {
        let mut groups = Vec::new();
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some(pair) => groups.push(pair),
                None => break,
            }
        }
        Ok(groups)
    }
}

fn build_entity(kind: &str, groups: &[Group]) -> RawEntity {
    let mut entity = RawEntity::with_kind(kind);
    entity.layer = first_value(groups, 8).map(|value| value.trim().to_string());
    entity.handle = first_value(groups, 5).map(|value| value.trim().to_string());

    match kind {
        "LINE" => {
            entity.vertices = [first_point(groups, 10), first_point(groups, 11)]
                .into_iter()
                .flatten()
                .collect();
        }
        "LWPOLYLINE" => {
            entity.vertices = point_sequence(groups, 10);
            entity.shape = Some(first_flags(groups) & 0x01 != 0);
        }
        "POLYLINE" => {
            entity.shape = Some(first_flags(groups) & 0x01 != 0);
        }
        "SPLINE" => {
            entity.control_points = point_sequence(groups, 10);
            entity.fit_points = point_sequence(groups, 11);
            entity.closed = Some(first_flags(groups) & 0x01 != 0);
        }
        "CIRCLE" => {
            entity.center = first_point(groups, 10);
            entity.radius = first_number(groups, 40);
        }
        "ARC" => {
            entity.center = first_point(groups, 10);
            entity.radius = first_number(groups, 40);
            entity.start_angle = first_number(groups, 50);
            entity.end_angle = first_number(groups, 51);
        }
        "ELLIPSE" => {
            entity.center = first_point(groups, 10);
            entity.major_axis_end_point = first_point(groups, 11);
            entity.axis_ratio = first_number(groups, 40);
            entity.start_angle = first_number(groups, 41);
            entity.end_angle = first_number(groups, 42);
        }
        _ => {}
    }

    entity
}

fn first_value(groups: &[Group], code: i32) -> Option<&str> {
    groups
        .iter()
        .find(|(group_code, _)| *group_code == code)
        .map(|(_, value)| value.as_str())
}

fn first_number(groups: &[Group], code: i32) -> Option<f64> {
    first_value(groups, code).map(parse_number)
}

fn first_flags(groups: &[Group]) -> i32 {
    first_value(groups, 70)
        .and_then(|value| value.trim().parse::<i32>().ok())
        .unwrap_or(0)
}

/// 读取 `x_code`/`x_code + 10`/`x_code + 20` 组成的首个坐标。
fn first_point(groups: &[Group], x_code: i32) -> Option<RawPoint> {
    let x = first_number(groups, x_code);
    let y = first_number(groups, x_code + 10);
    if x.is_none() && y.is_none() {
        return None;
    }
    Some(RawPoint {
        x,
        y,
        z: first_number(groups, x_code + 20),
    })
}

/// 按出现顺序收集重复的坐标组（LWPOLYLINE 顶点、SPLINE 控制点）。
fn point_sequence(groups: &[Group], x_code: i32) -> Vec<RawPoint> {
    let y_code = x_code + 10;
    let z_code = x_code + 20;
    let mut points: Vec<RawPoint> = Vec::new();
    for (code, value) in groups {
        if *code == x_code {
            points.push(RawPoint {
                x: Some(parse_number(value)),
                ..RawPoint::default()
            });
        } else if *code == y_code {
            match points.last_mut() {
                Some(point) if point.y.is_none() => point.y = Some(parse_number(value)),
                _ => points.push(RawPoint {
                    y: Some(parse_number(value)),
                    ..RawPoint::default()
                }),
            }
        } else if *code == z_code {
            if let Some(point) = points.last_mut() {
                point.z = Some(parse_number(value));
            }
        }
    }
    points
}

/// 无法解析的数值记为 NaN，交由有限值校验剔除。
fn parse_number(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(value) => value,
        Err(_) => {
            trace!(raw, "数值字段无法解析");
            f64::NAN
        }
    }
}

/// 可出现在任意位置的注释组码。
const COMMENT_CODE: i32 = 999;

struct DxfReader<'a> {
    lines: std::str::Lines<'a>,
    buffer: Option<Group>,
    line_number: usize,
}

impl<'a> DxfReader<'a> {
    fn new(source: &'a str) -> Self {
        let source = source.strip_prefix('\u{feff}').unwrap_or(source);
        Self {
            lines: source.lines(),
            buffer: None,
            line_number: 0,
        }
    }

    /// 读取下一组有效的组码/值；999 注释组在此直接跳过。
    fn next_pair(&mut self) -> Result<Option<Group>, IoError> {
        if let Some(pair) = self.buffer.take() {
            return Ok(Some(pair));
        }

        loop {
            match self.read_raw_pair()? {
                Some((COMMENT_CODE, comment)) => trace!(comment = %comment, "跳过 DXF 注释组"),
                other => return Ok(other),
            }
        }
    }

    fn read_raw_pair(&mut self) -> Result<Option<Group>, IoError> {
        let code_line = match self.lines.next() {
            Some(line) => {
                self.line_number += 1;
                line
            }
            None => return Ok(None),
        };

        let value_line = match self.lines.next() {
            Some(line) => {
                self.line_number += 1;
                line
            }
            None => {
                return Err(IoError::syntax(
                    self.line_number,
                    "file ended without the value line for a group code",
                ));
            }
        };

        let code = code_line.trim().parse::<i32>().map_err(|_| {
            IoError::syntax(
                self.line_number - 1,
                format!("group code \"{}\" is not an integer", code_line.trim()),
            )
        })?;
        let value = value_line.trim_end_matches('\r').to_string();
        Ok(Some((code, value)))
    }

    /// 单槽回退缓冲；调用方保证每次读取后至多回退一次。
    fn put_back(&mut self, pair: Group) {
        debug_assert!(self.buffer.is_none(), "DXF pair pushed back twice");
        self.buffer = Some(pair);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dxf(body: &[(&str, &str)]) -> String {
        let mut out = String::from("0\nSECTION\n2\nENTITIES\n");
        for (code, value) in body {
            out.push_str(code);
            out.push('\n');
            out.push_str(value);
            out.push('\n');
        }
        out.push_str("0\nENDSEC\n0\nEOF\n");
        out
    }

    #[test]
    fn line_yields_start_and_end_vertices() {
        let text = dxf(&[
            ("0", "LINE"),
            ("8", "CUT"),
            ("10", "1.5"),
            ("20", "2"),
            ("30", "0"),
            ("11", "4"),
            ("21", "-3"),
        ]);
        let doc = DxfTextParser::new().parse(&text).expect("parse");
        assert_eq!(doc.entities.len(), 1);
        let line = &doc.entities[0];
        assert_eq!(line.kind.as_deref(), Some("LINE"));
        assert_eq!(line.layer.as_deref(), Some("CUT"));
        assert_eq!(line.vertices.len(), 2);
        assert_eq!(line.vertices[0].x, Some(1.5));
        assert_eq!(line.vertices[0].z, Some(0.0));
        assert_eq!(line.vertices[1].y, Some(-3.0));
    }

    #[test]
    fn lwpolyline_vertices_and_closed_flag() {
        let text = dxf(&[
            ("0", "LWPOLYLINE"),
            ("90", "3"),
            ("70", "1"),
            ("10", "0"),
            ("20", "0"),
            ("10", "5"),
            ("20", "0"),
            ("42", "0.5"),
            ("10", "5"),
            ("20", "5"),
        ]);
        let doc = DxfTextParser::new().parse(&text).expect("parse");
        let poly = &doc.entities[0];
        assert_eq!(poly.shape, Some(true));
        assert_eq!(
            poly.vertices,
            vec![
                RawPoint::xy(0.0, 0.0),
                RawPoint::xy(5.0, 0.0),
                RawPoint::xy(5.0, 5.0)
            ]
        );
    }

    #[test]
    fn non_numeric_values_become_nan() {
        let text = dxf(&[("0", "CIRCLE"), ("10", "abc"), ("20", "1"), ("40", "2")]);
        let doc = DxfTextParser::new().parse(&text).expect("parse");
        let circle = &doc.entities[0];
        let center = circle.center.expect("center is recorded");
        assert!(center.x.is_some_and(f64::is_nan));
        assert_eq!(center.y, Some(1.0));
        assert_eq!(circle.radius, Some(2.0));
    }

    #[test]
    fn polyline_collects_vertex_records_until_seqend() {
        let text = dxf(&[
            ("0", "POLYLINE"),
            ("66", "1"),
            ("70", "1"),
            ("0", "VERTEX"),
            ("10", "0"),
            ("20", "0"),
            ("0", "VERTEX"),
            ("10", "10"),
            ("20", "0"),
            ("0", "VERTEX"),
            ("10", "10"),
            ("20", "10"),
            ("0", "SEQEND"),
            ("0", "CIRCLE"),
            ("10", "0"),
            ("20", "0"),
            ("40", "1"),
        ]);
        let doc = DxfTextParser::new().parse(&text).expect("parse");
        assert_eq!(doc.entities.len(), 2);
        let poly = &doc.entities[0];
        assert_eq!(poly.kind.as_deref(), Some("POLYLINE"));
        assert_eq!(poly.shape, Some(true));
        assert_eq!(poly.vertices.len(), 3);
        assert_eq!(doc.entities[1].kind.as_deref(), Some("CIRCLE"));
    }

    #[test]
    fn other_sections_are_skipped() {
        let text = "0\nSECTION\n2\nHEADER\n9\n$ACADVER\n1\nAC1015\n0\nENDSEC\n\
                    0\nSECTION\n2\nENTITIES\n0\nTEXT\n1\nhello\n0\nENDSEC\n0\nEOF\n";
        let doc = DxfTextParser::new().parse(text).expect("parse");
        assert_eq!(doc.entities.len(), 1);
        assert_eq!(doc.entities[0].kind.as_deref(), Some("TEXT"));
    }

    #[test]
    fn odd_line_count_is_a_syntax_error() {
        let err = DxfTextParser::new()
            .parse("0\nSECTION\n2")
            .expect_err("missing value line");
        assert!(matches!(err, IoError::Syntax { line: 3, .. }), "{err}");
    }

    #[test]
    fn non_integer_group_code_is_a_syntax_error() {
        let err = DxfTextParser::new()
            .parse("zero\nSECTION\n")
            .expect_err("bad group code");
        assert!(matches!(err, IoError::Syntax { line: 1, .. }), "{err}");
    }

    #[test]
    fn unterminated_section_is_a_syntax_error() {
        let err = DxfTextParser::new()
            .parse("0\nSECTION\n2\nHEADER\n9\n$ACADVER\n")
            .expect_err("missing ENDSEC");
        assert!(err.to_string().contains("ENDSEC"));
    }

    #[test]
    fn comment_groups_are_ignored_everywhere() {
        let text = "999\ndxfrw 0.6.3\n0\nSECTION\n2\nENTITIES\n\
                    999\nbefore entity\n0\nCIRCLE\n999\ninside entity\n10\n1\n20\n2\n40\n3\n\
                    0\nPOLYLINE\n70\n0\n999\nheader note\n0\nVERTEX\n10\n0\n20\n0\n\
                    999\nbetween vertices\n0\nVERTEX\n10\n5\n20\n0\n0\nSEQEND\n\
                    0\nENDSEC\n999\ntrailer\n0\nEOF\n";
        let doc = DxfTextParser::new().parse(text).expect("parse");
        assert_eq!(doc.entities.len(), 2);
        let circle = &doc.entities[0];
        assert_eq!(circle.kind.as_deref(), Some("CIRCLE"));
        assert_eq!(circle.center, Some(RawPoint::xy(1.0, 2.0)));
        assert_eq!(circle.radius, Some(3.0));
        assert_eq!(
            doc.entities[1].vertices,
            vec![RawPoint::xy(0.0, 0.0), RawPoint::xy(5.0, 0.0)]
        );
    }

    #[test]
    fn syntax_errors_after_comments_keep_line_numbers() {
        let err = DxfTextParser::new()
            .parse("999\nnote\n0\nSECTION\n2\nENTITIES\nbad\nCIRCLE\n")
            .expect_err("bad group code");
        assert!(matches!(err, IoError::Syntax { line: 7, .. }), "{err}");
    }

    #[test]
    fn leading_byte_order_mark_is_skipped() {
        let text = "\u{feff}0\nSECTION\n2\nENTITIES\n0\nLINE\n10\n0\n20\n0\n11\n1\n21\n1\n0\nENDSEC\n0\nEOF\n";
        let doc = DxfTextParser::new().parse(text).expect("parse");
        assert_eq!(doc.entities.len(), 1);
        assert_eq!(doc.entities[0].vertices.len(), 2);
    }

    #[test]
    fn empty_text_has_no_entities() {
        let doc = DxfTextParser::new().parse("").expect("parse");
        assert!(doc.entities.is_empty());
    }
}
