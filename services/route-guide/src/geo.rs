//! 坐标计算

use guide_errors::{AppError, AppResult};

use crate::proto::{Point, Rectangle};

/// 坐标整数值与度的换算系数
pub const COORD_FACTOR: f64 = 1e7;

/// 地球半径（米）
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

const MAX_LATITUDE: i32 = 90 * COORD_FACTOR as i32;
const MAX_LONGITUDE: i32 = 180 * COORD_FACTOR as i32;

/// 校验坐标是否在 ±90° / ±180° 范围内
pub fn validate_point(point: &Point) -> AppResult<()> {
    if !(-MAX_LATITUDE..=MAX_LATITUDE).contains(&point.latitude) {
        return Err(AppError::validation(format!(
            "latitude {} out of range [-90, 90]",
            point.latitude as f64 / COORD_FACTOR
        )));
    }
    if !(-MAX_LONGITUDE..=MAX_LONGITUDE).contains(&point.longitude) {
        return Err(AppError::validation(format!(
            "longitude {} out of range [-180, 180]",
            point.longitude as f64 / COORD_FACTOR
        )));
    }
    Ok(())
}

/// 两点间的大圆距离（米），haversine 公式
pub fn distance(start: &Point, end: &Point) -> f64 {
    let lat1 = (start.latitude as f64 / COORD_FACTOR).to_radians();
    let lat2 = (end.latitude as f64 / COORD_FACTOR).to_radians();
    let delta_lat = lat2 - lat1;
    let lon1 = start.longitude as f64 / COORD_FACTOR;
    let lon2 = end.longitude as f64 / COORD_FACTOR;
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// 矩形范围，边界包含在内
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

impl BoundingBox {
    /// 两个角点可以任意顺序给出
    pub fn from_rectangle(rect: &Rectangle) -> AppResult<Self> {
        let (Some(lo), Some(hi)) = (rect.lo, rect.hi) else {
            return Err(AppError::validation("rectangle requires both lo and hi"));
        };
        validate_point(&lo)?;
        validate_point(&hi)?;

        Ok(Self {
            left: lo.longitude.min(hi.longitude),
            right: lo.longitude.max(hi.longitude),
            top: lo.latitude.max(hi.latitude),
            bottom: lo.latitude.min(hi.latitude),
        })
    }

    pub fn contains(&self, point: &Point) -> bool {
        (self.left..=self.right).contains(&point.longitude)
            && (self.bottom..=self.top).contains(&point.latitude)
    }
}
