//! RouteGuide gRPC 实现

use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::sync::mpsc;
use tokio_stream::Stream;
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Request, Response, Status, Streaming};
use tracing::{debug, info, warn};

use crate::db::FeatureDb;
use crate::geo::{self, BoundingBox};
use crate::proto::route_guide_server::RouteGuide;
use crate::proto::{Feature, Point, Rectangle, RouteNote, RouteSummary};

type FeatureStream = Pin<Box<dyn Stream<Item = Result<Feature, Status>> + Send>>;
type NoteStream = Pin<Box<dyn Stream<Item = Result<RouteNote, Status>> + Send>>;

/// RouteGuide 服务
///
/// 地点数据只读；RouteChat 收到的留言在所有调用之间共享
#[derive(Clone)]
pub struct RouteGuideService {
    db: Arc<FeatureDb>,
    notes: Arc<Mutex<Vec<RouteNote>>>,
}

impl RouteGuideService {
    pub fn new(db: FeatureDb) -> Self {
        Self {
            db: Arc::new(db),
            notes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// 返回同一位置上之前的留言，再保存这条留言
    fn exchange_note(notes: &Mutex<Vec<RouteNote>>, note: RouteNote) -> Vec<RouteNote> {
        let mut notes = notes.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let earlier = notes
            .iter()
            .filter(|n| n.location == note.location)
            .cloned()
            .collect();
        notes.push(note);
        earlier
    }
}

#[tonic::async_trait]
impl RouteGuide for RouteGuideService {
    async fn get_feature(&self, request: Request<Point>) -> Result<Response<Feature>, Status> {
        let point = request.into_inner();
        geo::validate_point(&point)?;
        info!(latitude = point.latitude, longitude = point.longitude, "Get feature");

        let feature = match self.db.find(&point) {
            Some(feature) => feature.clone(),
            None => Feature {
                name: String::new(),
                location: Some(point),
            },
        };
        Ok(Response::new(feature))
    }

    type ListFeaturesStream = FeatureStream;

    async fn list_features(
        &self,
        request: Request<Rectangle>,
    ) -> Result<Response<Self::ListFeaturesStream>, Status> {
        let bbox = BoundingBox::from_rectangle(request.get_ref())?;
        let features: Vec<_> = self.db.within(&bbox).cloned().collect();
        info!(matched = features.len(), "List features");

        let stream = tokio_stream::iter(features.into_iter().map(Ok));
        Ok(Response::new(Box::pin(stream)))
    }

    async fn record_route(
        &self,
        request: Request<Streaming<Point>>,
    ) -> Result<Response<RouteSummary>, Status> {
        let mut stream = request.into_inner();
        let started = Instant::now();

        let mut point_count = 0;
        let mut feature_count = 0;
        let mut distance = 0.0;
        let mut previous: Option<Point> = None;

        while let Some(point) = stream.message().await? {
            geo::validate_point(&point)?;
            point_count += 1;
            if self.db.find(&point).is_some() {
                feature_count += 1;
            }
            if let Some(previous) = previous {
                distance += geo::distance(&previous, &point);
            }
            previous = Some(point);
        }

        let summary = RouteSummary {
            point_count,
            feature_count,
            distance: distance as i32,
            elapsed_time: started.elapsed().as_secs() as i32,
        };
        info!(
            point_count,
            feature_count,
            distance = summary.distance,
            "Route recorded"
        );
        Ok(Response::new(summary))
    }

    type RouteChatStream = NoteStream;

    async fn route_chat(
        &self,
        request: Request<Streaming<RouteNote>>,
    ) -> Result<Response<Self::RouteChatStream>, Status> {
        let mut inbound = request.into_inner();
        let notes = self.notes.clone();
        let (tx, rx) = mpsc::channel(16);

        tokio::spawn(async move {
            loop {
                let note = match inbound.message().await {
                    Ok(Some(note)) => note,
                    Ok(None) => break,
                    Err(status) => {
                        warn!(error = %status, "Route chat inbound stream failed");
                        let _ = tx.send(Err(status)).await;
                        break;
                    }
                };

                let location = note.location.unwrap_or_default();
                if let Err(e) = geo::validate_point(&location) {
                    let _ = tx.send(Err(Status::from(e))).await;
                    break;
                }

                for earlier in Self::exchange_note(&notes, note) {
                    if tx.send(Ok(earlier)).await.is_err() {
                        debug!("Route chat receiver dropped");
                        return;
                    }
                }
            }
        });

        Ok(Response::new(Box::pin(ReceiverStream::new(rx))))
    }
}
