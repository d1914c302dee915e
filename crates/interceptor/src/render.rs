//! 把消息渲染为结构化文本
//!
//! 消息输出为 JSON（字段名为 protobuf JSON 的小驼峰形式，按声明顺序，全部字段都输出），
//! 初始元数据输出为 JSON 对象

use http::HeaderMap;
use serde_json::{Map, Value};

use crate::error::{InterceptError, InterceptResult};
use crate::message::ProtoMessage;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RenderStyle {
    #[default]
    Compact,
    Pretty,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Renderer {
    style: RenderStyle,
}

impl Renderer {
    pub fn new(style: RenderStyle) -> Self {
        Self { style }
    }

    /// 渲染消息，失败时返回错误而不是中断事件
    pub fn render(&self, message: &dyn ProtoMessage) -> InterceptResult<String> {
        message
            .to_json(self.style == RenderStyle::Pretty)
            .map_err(|e| InterceptError::render(format!("{}: {}", message.type_name(), e)))
    }

    /// 渲染元数据，二进制值只输出长度
    pub fn render_metadata(&self, headers: &HeaderMap) -> String {
        let mut map = Map::new();
        for key in headers.keys() {
            let binary = key.as_str().ends_with("-bin");
            let mut values: Vec<Value> = headers
                .get_all(key)
                .iter()
                .map(|value| match value.to_str() {
                    Ok(text) if !binary => Value::String(text.to_string()),
                    _ => Value::String(format!("<{} bytes>", value.len())),
                })
                .collect();

            let value = if values.len() == 1 {
                values.remove(0)
            } else {
                Value::Array(values)
            };
            map.insert(key.as_str().to_string(), value);
        }

        let value = Value::Object(map);
        let rendered = match self.style {
            RenderStyle::Pretty => serde_json::to_string_pretty(&value),
            RenderStyle::Compact => serde_json::to_string(&value),
        };
        // Value 序列化不会失败
        rendered.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Envelope, Ping};
    use http::HeaderValue;

    #[test]
    fn test_render_nested_message_roundtrips_field_tree() {
        let envelope = Envelope {
            ping: Some(Ping {
                seq: 9,
                text: "nested".into(),
            }),
            label: "outer".into(),
        };

        let text = Renderer::default().render(&envelope).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            parsed,
            serde_json::json!({
                "ping": { "seq": 9, "text": "nested" },
                "label": "outer",
            })
        );

        let back: Envelope = serde_json::from_str(&text).unwrap();
        assert_eq!(back, envelope);
    }

    #[test]
    fn test_render_is_order_stable() {
        let ping = Ping {
            seq: 1,
            text: "a".into(),
        };
        let renderer = Renderer::default();
        assert_eq!(renderer.render(&ping).unwrap(), r#"{"seq":1,"text":"a"}"#);
        assert_eq!(
            renderer.render(&ping).unwrap(),
            renderer.render(&ping.clone()).unwrap()
        );
    }

    #[test]
    fn test_render_keeps_default_fields() {
        let text = Renderer::default().render(&Envelope::default()).unwrap();
        assert_eq!(text, r#"{"ping":null,"label":""}"#);
    }

    #[test]
    fn test_pretty_style() {
        let ping = Ping {
            seq: 1,
            text: "a".into(),
        };
        let text = Renderer::new(RenderStyle::Pretty).render(&ping).unwrap();
        assert!(text.contains('\n'));
    }

    #[test]
    fn test_render_metadata() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/grpc"));
        headers.append("x-tag", HeaderValue::from_static("a"));
        headers.append("x-tag", HeaderValue::from_static("b"));
        headers.insert("trace-bin", HeaderValue::from_static("AAEC"));

        let text = Renderer::default().render_metadata(&headers);
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["content-type"], "application/grpc");
        assert_eq!(parsed["x-tag"], serde_json::json!(["a", "b"]));
        assert_eq!(parsed["trace-bin"], "<4 bytes>");
    }
}
