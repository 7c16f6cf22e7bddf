//! Taproom location and local clock: the static map tile shown on the taproom
//! page, and the wall-clock time reservations are checked against.
//!
//! Tiles use the standard slippy-map (Web Mercator) numbering.

use std::f64::consts::PI;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::config::TaproomConfig;

/// Tile edge in pixels.
pub const TILE_SIZE: u32 = 256;

/// A single map tile, plus where the taproom falls inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct MapTile {
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
    /// Marker offset inside the tile, in pixels from the left.
    pub marker_left: u32,
    /// Marker offset inside the tile, in pixels from the top.
    pub marker_top: u32,
}

impl MapTile {
    /// Tile containing `latitude`/`longitude` at `zoom`.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn containing(latitude: f64, longitude: f64, zoom: u8) -> Self {
        // Web Mercator is undefined at the poles.
        let latitude = latitude.clamp(-85.051_128_78, 85.051_128_78);
        let n = f64::from(1_u32 << zoom.min(19));
        let lat_rad = latitude.to_radians();

        let fx = ((longitude + 180.0) / 360.0 * n).clamp(0.0, n - f64::EPSILON);
        let fy = ((1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n)
            .clamp(0.0, n - f64::EPSILON);

        let size = f64::from(TILE_SIZE);
        Self {
            zoom: zoom.min(19),
            x: fx.floor() as u32,
            y: fy.floor() as u32,
            marker_left: (fx.fract() * size) as u32,
            marker_top: (fy.fract() * size) as u32,
        }
    }

    /// Fill a `{z}/{x}/{y}` tile URL template.
    #[must_use]
    pub fn url(&self, template: &str) -> String {
        template
            .replace("{z}", &self.zoom.to_string())
            .replace("{x}", &self.x.to_string())
            .replace("{y}", &self.y.to_string())
    }
}

/// Tile for the configured taproom.
#[must_use]
pub fn taproom_tile(config: &TaproomConfig) -> MapTile {
    MapTile::containing(config.latitude, config.longitude, config.map_zoom)
}

/// Directions link for the taproom address.
#[must_use]
pub fn directions_url(config: &TaproomConfig) -> String {
    format!(
        "https://www.openstreetmap.org/directions?to={}%2C{}",
        config.latitude, config.longitude
    )
}

/// Wall-clock time at the taproom for the instant `at`.
#[must_use]
pub fn local_time(config: &TaproomConfig, at: DateTime<Utc>) -> NaiveDateTime {
    at.with_timezone(&config.timezone).naive_local()
}

/// Current wall-clock time at the taproom.
#[must_use]
pub fn local_now(config: &TaproomConfig) -> NaiveDateTime {
    local_time(config, Utc::now())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{NaiveDate, NaiveTime, TimeZone};

    use super::*;
    use crate::services::reservations::{OpeningHours, ReservationError, ReservationRequest};

    fn evening_utc() -> DateTime<Utc> {
        // 17:30 on July 1st in Portland (PDT, UTC-7)
        Utc.with_ymd_and_hms(2026, 7, 2, 0, 30, 0).unwrap()
    }

    #[test]
    fn test_local_time_uses_taproom_zone() {
        let config = TaproomConfig::default();
        let local = local_time(&config, evening_utc());
        assert_eq!(local.date(), NaiveDate::from_ymd_opt(2026, 7, 1).unwrap());
        assert_eq!(local.time(), NaiveTime::from_hms_opt(17, 30, 0).unwrap());

        let berlin = TaproomConfig {
            timezone: chrono_tz::Europe::Berlin,
            ..TaproomConfig::default()
        };
        let local = local_time(&berlin, evening_utc());
        assert_eq!(local.date(), NaiveDate::from_ymd_opt(2026, 7, 2).unwrap());
        assert_eq!(local.time(), NaiveTime::from_hms_opt(2, 30, 0).unwrap());
    }

    #[test]
    fn test_same_evening_booking_after_utc_midnight() {
        let config = TaproomConfig::default();
        let hours = OpeningHours {
            opens: config.opens,
            closes: config.closes,
        };
        let tonight = ReservationRequest {
            date: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
            time: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
            party_size: 2,
            notes: None,
        };
        let now = local_time(&config, evening_utc());
        assert!(tonight.clone().validate(now, hours).is_ok());

        // The same booking judged on the UTC calendar would look a day old.
        let utc_now = evening_utc().naive_utc();
        assert_eq!(
            tonight.validate(utc_now, hours).unwrap_err(),
            ReservationError::InPast
        );
    }

    #[test]
    fn test_origin_tile() {
        let tile = MapTile::containing(0.0, 0.0, 1);
        assert_eq!((tile.x, tile.y), (1, 1));
        assert_eq!((tile.marker_left, tile.marker_top), (0, 0));
    }

    #[test]
    fn test_known_tile() {
        // Portland, OR at zoom 15
        let tile = MapTile::containing(45.5266, -122.6847, 15);
        assert_eq!(tile.x, 5216);
        assert_eq!(tile.y, 11_719);
        assert!(tile.marker_left < TILE_SIZE);
        assert!(tile.marker_top < TILE_SIZE);
    }

    #[test]
    fn test_zoom_zero_is_single_tile() {
        let tile = MapTile::containing(45.0, -122.0, 0);
        assert_eq!((tile.x, tile.y), (0, 0));
    }

    #[test]
    fn test_url_template() {
        let tile = MapTile {
            zoom: 15,
            x: 5216,
            y: 11_716,
            marker_left: 0,
            marker_top: 0,
        };
        assert_eq!(
            tile.url("https://tile.openstreetmap.org/{z}/{x}/{y}.png"),
            "https://tile.openstreetmap.org/15/5216/11716.png"
        );
    }
}
