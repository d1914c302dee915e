use tonic_build::manual::{Builder, Method, Service};

fn method(name: &str, route_name: &str, input: &str, output: &str) -> tonic_build::manual::MethodBuilder {
    Method::builder()
        .name(name)
        .route_name(route_name)
        .input_type(format!("crate::proto::{input}"))
        .output_type(format!("crate::proto::{output}"))
        .codec_path("tonic::codec::ProstCodec")
}

fn main() {
    // 消息类型在 src/proto.rs 中手写，这里只生成服务桩代码
    let service = Service::builder()
        .name("RouteGuide")
        .package("routeguide")
        .method(method("get_feature", "GetFeature", "Point", "Feature").build())
        .method(
            method("list_features", "ListFeatures", "Rectangle", "Feature")
                .server_streaming()
                .build(),
        )
        .method(
            method("record_route", "RecordRoute", "Point", "RouteSummary")
                .client_streaming()
                .build(),
        )
        .method(
            method("route_chat", "RouteChat", "RouteNote", "RouteNote")
                .client_streaming()
                .server_streaming()
                .build(),
        )
        .build();

    Builder::new().compile(&[service]);

    println!("cargo:rerun-if-changed=build.rs");
}
