//! 读取 JavaScript DXF 库导出的实体 JSON（`{"entities": [...]}`）。
//!
//! 字段类型一律宽松处理：类型不符的值视为缺失，而不是整份文档解析失败。

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use crate::{DocumentParser, IoError, RawDocument, RawEntity, RawPoint};

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEntityParser;

impl JsonEntityParser {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentParser for JsonEntityParser {
    fn parse(&self, text: &str) -> Result<RawDocument, IoError> {
        let document: RawDocument = serde_json::from_str(text)?;
        debug!(entity_count = document.entities.len(), "实体 JSON 解析完成");
        Ok(document)
    }
}

pub(crate) fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_f64())
}

pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(text) => Some(text),
        _ => None,
    })
}

/// JS 侧的真值语义：`true` 或非零数字。
pub(crate) fn lenient_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Bool(flag) => Some(flag),
        Value::Number(number) => Some(number.as_f64().is_some_and(|n| n != 0.0)),
        _ => None,
    })
}

pub(crate) fn lenient_point<'de, D>(deserializer: D) -> Result<Option<RawPoint>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(point_from_value(value))
}

/// 数组中无法识别的元素保留为空坐标，维持顶点序号不变。
pub(crate) fn lenient_points<'de, D>(deserializer: D) -> Result<Vec<RawPoint>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| point_from_value(item).unwrap_or_default())
            .collect(),
        _ => Vec::new(),
    })
}

/// `entities` 缺失或不是数组时视为空列表；数组中的非对象元素记为无类型实体。
pub(crate) fn lenient_entities<'de, D>(deserializer: D) -> Result<Vec<RawEntity>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(_) => serde_json::from_value(item).unwrap_or_default(),
                _ => RawEntity::default(),
            })
            .collect(),
        _ => Vec::new(),
    })
}

fn point_from_value(value: Value) -> Option<RawPoint> {
    match value {
        Value::Object(_) => serde_json::from_value(value).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_js_style_entities() {
        let text = r#"{
            "entities": [
                {"type": "LINE", "vertices": [{"x": 0, "y": 0}, {"x": 10, "y": 0}]},
                {"type": "LWPOLYLINE", "shape": true, "vertices": [{"x": 1, "y": 1}]},
                {"type": "ELLIPSE", "center": {"x": 0, "y": 0},
                 "majorAxisEndPoint": {"x": 4, "y": 0}, "axisRatio": 0.5}
            ]
        }"#;
        let doc = JsonEntityParser::new().parse(text).expect("parse");
        assert_eq!(doc.entities.len(), 3);
        assert_eq!(doc.entities[0].vertices[1], RawPoint::xy(10.0, 0.0));
        assert_eq!(doc.entities[1].shape, Some(true));
        let ellipse = &doc.entities[2];
        assert_eq!(ellipse.axis_ratio, Some(0.5));
        assert_eq!(ellipse.major_axis_end_point, Some(RawPoint::xy(4.0, 0.0)));
        assert_eq!(ellipse.start_angle, None);
    }

    #[test]
    fn wrongly_typed_fields_are_treated_as_absent() {
        let text = r#"{
            "entities": [
                {"type": 42, "radius": "ten", "center": [1, 2], "closed": "yes",
                 "vertices": [{"x": "1", "y": 2}, 7, {"x": 3, "y": null}]}
            ]
        }"#;
        let doc = JsonEntityParser::new().parse(text).expect("parse");
        let entity = &doc.entities[0];
        assert_eq!(entity.kind, None);
        assert_eq!(entity.radius, None);
        assert_eq!(entity.center, None);
        assert_eq!(entity.closed, None);
        assert_eq!(entity.vertices.len(), 3);
        assert_eq!(entity.vertices[0].x, None);
        assert_eq!(entity.vertices[0].y, Some(2.0));
        assert_eq!(entity.vertices[1], RawPoint::default());
        assert_eq!(entity.vertices[2].y, None);
    }

    #[test]
    fn missing_entities_key_is_an_empty_document() {
        let doc = JsonEntityParser::new().parse("{}").expect("parse");
        assert!(doc.entities.is_empty());
    }

    #[test]
    fn non_array_entities_are_an_empty_document() {
        for text in [r#"{"entities": null}"#, r#"{"entities": {"type": "LINE"}}"#] {
            let doc = JsonEntityParser::new().parse(text).expect("parse");
            assert!(doc.entities.is_empty(), "{text}");
        }
    }

    #[test]
    fn non_object_entities_have_no_type() {
        let doc = JsonEntityParser::new()
            .parse(r#"{"entities": [null, "LINE", {"type": "CIRCLE"}]}"#)
            .expect("parse");
        assert_eq!(doc.entities.len(), 3);
        assert_eq!(doc.entities[0], RawEntity::default());
        assert_eq!(doc.entities[1].kind, None);
        assert_eq!(doc.entities[2].kind.as_deref(), Some("CIRCLE"));
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = JsonEntityParser::new()
            .parse("{\"entities\": [")
            .expect_err("truncated JSON");
        assert!(matches!(err, IoError::InvalidJson(_)));
    }
}
