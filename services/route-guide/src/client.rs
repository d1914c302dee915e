//! 客户端调用流程

use guide_interceptor::InterceptedService;
use rand::Rng;
use rand::seq::SliceRandom;
use tonic::Status;
use tonic::transport::Channel;
use tracing::info;

use crate::db::FeatureDb;
use crate::proto::route_guide_client::RouteGuideClient;
use crate::proto::{Feature, Point, Rectangle, RouteNote, RouteSummary};

/// 装有客户端日志拦截器的 RouteGuide 客户端
pub type GuideClient = RouteGuideClient<InterceptedService<Channel>>;

pub async fn get_feature(client: &mut GuideClient, point: Point) -> Result<Feature, Status> {
    let feature = client.get_feature(point).await?.into_inner();
    if feature.name.is_empty() {
        info!(latitude = point.latitude, longitude = point.longitude, "Found no feature");
    } else {
        info!(name = %feature.name, "Found feature");
    }
    Ok(feature)
}

pub async fn list_features(client: &mut GuideClient, rect: Rectangle) -> Result<Vec<Feature>, Status> {
    let mut stream = client.list_features(rect).await?.into_inner();
    let mut features = Vec::new();
    while let Some(feature) = stream.message().await? {
        info!(name = %feature.name, "Listed feature");
        features.push(feature);
    }
    Ok(features)
}

pub async fn record_route(client: &mut GuideClient, points: Vec<Point>) -> Result<RouteSummary, Status> {
    let summary = client
        .record_route(tokio_stream::iter(points))
        .await?
        .into_inner();
    info!(
        point_count = summary.point_count,
        feature_count = summary.feature_count,
        distance = summary.distance,
        elapsed_time = summary.elapsed_time,
        "Route summary"
    );
    Ok(summary)
}

/// 发送全部留言，返回服务端回送的之前的留言
pub async fn route_chat(client: &mut GuideClient, notes: Vec<RouteNote>) -> Result<Vec<RouteNote>, Status> {
    let mut stream = client.route_chat(tokio_stream::iter(notes)).await?.into_inner();
    let mut received = Vec::new();
    while let Some(note) = stream.message().await? {
        info!(message = %note.message, "Got message");
        received.push(note);
    }
    Ok(received)
}

/// 从数据库中随机取点
pub fn random_points(db: &FeatureDb, count: usize) -> Vec<Point> {
    let mut rng = rand::thread_rng();
    let locations: Vec<Point> = db.features().iter().filter_map(|f| f.location).collect();
    if locations.is_empty() {
        return (0..count)
            .map(|_| Point {
                latitude: rng.gen_range(-900_000_000..=900_000_000),
                longitude: rng.gen_range(-1_800_000_000..=1_800_000_000),
            })
            .collect();
    }
    (0..count)
        .filter_map(|_| locations.choose(&mut rng).copied())
        .collect()
}

pub fn note(latitude: i32, longitude: i32, message: &str) -> RouteNote {
    RouteNote {
        location: Some(Point {
            latitude,
            longitude,
        }),
        message: message.to_string(),
    }
}

/// 完整演示：两次 GetFeature、一次 ListFeatures、一次 RecordRoute、一次 RouteChat
pub async fn run_demo(client: &mut GuideClient, db: &FeatureDb) -> Result<(), Status> {
    get_feature(
        client,
        Point {
            latitude: 409146138,
            longitude: -746188906,
        },
    )
    .await?;
    get_feature(client, Point::default()).await?;

    list_features(
        client,
        Rectangle {
            lo: Some(Point {
                latitude: 400000000,
                longitude: -750000000,
            }),
            hi: Some(Point {
                latitude: 420000000,
                longitude: -730000000,
            }),
        },
    )
    .await?;

    record_route(client, random_points(db, 10)).await?;

    route_chat(
        client,
        vec![
            note(0, 0, "First message"),
            note(0, 1, "Second message"),
            note(1, 0, "Third message"),
            note(0, 0, "Fourth message"),
        ],
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_points_come_from_db() {
        let db = FeatureDb::new(vec![Feature {
            name: "only".into(),
            location: Some(Point {
                latitude: 1,
                longitude: 2,
            }),
        }]);
        let points = random_points(&db, 10);
        assert_eq!(points.len(), 10);
        assert!(points.iter().all(|p| p.latitude == 1 && p.longitude == 2));
    }

    #[test]
    fn test_random_points_without_db_stay_in_range() {
        let points = random_points(&FeatureDb::default(), 20);
        assert_eq!(points.len(), 20);
        assert!(points.iter().all(|p| crate::geo::validate_point(p).is_ok()));
    }
}
