//! routeguide 协议
//!
//! 消息类型手写，字段与标签同 `routeguide.proto`；服务桩由 build.rs 生成

use guide_interceptor::MethodSpec;
use serde::{Deserialize, Serialize};

/// 经纬度，单位为 1e-7 度
#[derive(Clone, Copy, PartialEq, Eq, Hash, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Point {
    #[prost(int32, tag = "1")]
    pub latitude: i32,
    #[prost(int32, tag = "2")]
    pub longitude: i32,
}

/// 由两个对角点确定的矩形
#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Rectangle {
    #[prost(message, optional, tag = "1")]
    pub lo: Option<Point>,
    #[prost(message, optional, tag = "2")]
    pub hi: Option<Point>,
}

/// 某个位置上的地点，名称为空表示没有地点
#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Feature {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(message, optional, tag = "2")]
    pub location: Option<Point>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouteNote {
    #[prost(message, optional, tag = "1")]
    pub location: Option<Point>,
    #[prost(string, tag = "2")]
    pub message: String,
}

/// RecordRoute 的结果
#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouteSummary {
    #[prost(int32, tag = "1")]
    pub point_count: i32,
    #[prost(int32, tag = "2")]
    pub feature_count: i32,
    /// 米
    #[prost(int32, tag = "3")]
    pub distance: i32,
    /// 秒
    #[prost(int32, tag = "4")]
    pub elapsed_time: i32,
}

macro_rules! proto_name {
    ($($ty:ident),* $(,)?) => {
        $(
            impl prost::Name for $ty {
                const NAME: &'static str = stringify!($ty);
                const PACKAGE: &'static str = "routeguide";
            }
        )*
    };
}

proto_name!(Point, Rectangle, Feature, RouteNote, RouteSummary);

include!(concat!(env!("OUT_DIR"), "/routeguide.RouteGuide.rs"));

pub const GET_FEATURE: &str = "/routeguide.RouteGuide/GetFeature";
pub const LIST_FEATURES: &str = "/routeguide.RouteGuide/ListFeatures";
pub const RECORD_ROUTE: &str = "/routeguide.RouteGuide/RecordRoute";
pub const ROUTE_CHAT: &str = "/routeguide.RouteGuide/RouteChat";

/// 服务暴露的全部方法
pub const METHOD_PATHS: [&str; 4] = [GET_FEATURE, LIST_FEATURES, RECORD_ROUTE, ROUTE_CHAT];

/// 拦截器注册表使用的方法清单
pub fn method_inventory() -> Vec<MethodSpec> {
    vec![
        MethodSpec::unary::<Point, Feature>(GET_FEATURE),
        MethodSpec::server_streaming::<Rectangle, Feature>(LIST_FEATURES),
        MethodSpec::client_streaming::<Point, RouteSummary>(RECORD_ROUTE),
        MethodSpec::bidi_streaming::<RouteNote, RouteNote>(ROUTE_CHAT),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use guide_interceptor::{Cardinality, MethodTypeRegistry, Role};
    use tonic::server::NamedService;

    #[test]
    fn test_inventory_covers_served_methods() {
        let registry = MethodTypeRegistry::from_inventory(method_inventory()).unwrap();
        registry.validate(METHOD_PATHS).unwrap();

        let service = <route_guide_server::RouteGuideServer<crate::RouteGuideService> as NamedService>::NAME;
        for path in METHOD_PATHS {
            assert!(path.starts_with(&format!("/{service}/")), "{path}");
        }

        let id = registry.lookup(RECORD_ROUTE).unwrap();
        assert_eq!(registry.cardinality(id), Cardinality::ClientStreaming);
        assert_eq!(registry.types(id, Role::Callee).recv().type_name(), "routeguide.Point");
        assert_eq!(
            registry.types(id, Role::Callee).send().type_name(),
            "routeguide.RouteSummary"
        );
    }

    #[test]
    fn test_json_field_names_are_camel_case() {
        let summary = RouteSummary {
            point_count: 3,
            feature_count: 1,
            distance: 120,
            elapsed_time: 0,
        };
        assert_eq!(
            serde_json::to_string(&summary).unwrap(),
            r#"{"pointCount":3,"featureCount":1,"distance":120,"elapsedTime":0}"#
        );
    }
}
