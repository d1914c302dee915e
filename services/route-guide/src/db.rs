//! 地点数据库
//!
//! 启动时从 JSON 文件加载一次，之后只读。文件内容为地点数组：
//! `[{"location": {"latitude": 407838351, "longitude": -746143763}, "name": "..."}]`

use std::path::Path;

use guide_errors::{AppError, AppResult};

use crate::geo::BoundingBox;
use crate::proto::{Feature, Point};

#[derive(Debug, Clone, Default)]
pub struct FeatureDb {
    features: Vec<Feature>,
}

impl FeatureDb {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::config(format!("Failed to read feature db {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> AppResult<Self> {
        let features: Vec<Feature> = serde_json::from_str(content)
            .map_err(|e| AppError::config(format!("Invalid feature db: {}", e)))?;
        Ok(Self::new(features))
    }

    /// 位置上有名字的地点
    pub fn find(&self, point: &Point) -> Option<&Feature> {
        self.features
            .iter()
            .find(|f| f.location.as_ref() == Some(point) && !f.name.is_empty())
    }

    pub fn within<'a>(&'a self, bbox: &'a BoundingBox) -> impl Iterator<Item = &'a Feature> + 'a {
        self.features
            .iter()
            .filter(move |f| f.location.as_ref().is_some_and(|p| bbox.contains(p)))
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
