use crate::format::format_count;
use crate::models::{Coordinate, MetricKind, RegionRecord, Viewport, WORLD_ZOOM};

pub const MAP_WIDTH: f64 = 800.0;
pub const MAP_HEIGHT: f64 = 400.0;
/// Smallest marker radius; regions with no cases still get a visible dot.
pub const MIN_RADIUS: f64 = 1.5;

#[derive(Clone, PartialEq, Debug)]
pub struct MarkerTooltip {
    pub name: String,
    pub cases: String,
    pub recovered: String,
    pub deaths: String,
}

#[derive(Clone, PartialEq, Debug)]
pub struct MapMarker {
    pub code: Option<String>,
    pub coordinate: Coordinate,
    pub radius: f64,
    pub color: &'static str,
    pub tooltip: MarkerTooltip,
}

fn radius_scale(metric: MetricKind) -> f64 {
    match metric {
        MetricKind::Cases => 0.0028,
        MetricKind::Recovered => 0.0042,
        MetricKind::Deaths => 0.007,
    }
}

/// Square-root scaled radius, floored at `MIN_RADIUS`. Negative totals
/// (data corrections) are treated as zero.
pub fn marker_radius(total: Option<i64>, metric: MetricKind) -> f64 {
    let value = total.unwrap_or(0).max(0) as f64;
    MIN_RADIUS + value.sqrt() * radius_scale(metric)
}

/// One marker per record, in input order.
pub fn project_markers(records: &[RegionRecord], metric: MetricKind) -> Vec<MapMarker> {
    records
        .iter()
        .map(|record| MapMarker {
            code: record.code().map(str::to_string),
            coordinate: record.coordinate(),
            radius: marker_radius(record.total(metric), metric),
            color: metric.color(),
            tooltip: MarkerTooltip {
                name: record.country.clone(),
                cases: format_count(record.total(MetricKind::Cases)),
                recovered: format_count(record.total(MetricKind::Recovered)),
                deaths: format_count(record.total(MetricKind::Deaths)),
            },
        })
        .collect()
}

/// Equirectangular position on the `MAP_WIDTH` x `MAP_HEIGHT` canvas.
pub fn to_canvas(coordinate: Coordinate) -> (f64, f64) {
    let lng = coordinate.lng.clamp(-180.0, 180.0);
    let lat = coordinate.lat.clamp(-90.0, 90.0);
    let x = (lng + 180.0) / 360.0 * MAP_WIDTH;
    let y = (90.0 - lat) / 180.0 * MAP_HEIGHT;
    (x, y)
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ViewBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewBox {
    pub fn full() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: MAP_WIDTH,
            height: MAP_HEIGHT,
        }
    }

    pub fn to_attr(&self) -> String {
        format!(
            "{:.2} {:.2} {:.2} {:.2}",
            self.x, self.y, self.width, self.height
        )
    }
}

/// Visible canvas window for a viewport. Each zoom step above the world
/// level halves the visible span; the window never leaves the canvas.
pub fn view_box(viewport: &Viewport) -> ViewBox {
    let steps = viewport.zoom.saturating_sub(WORLD_ZOOM) as i32;
    if steps == 0 {
        return ViewBox::full();
    }
    let factor = 2f64.powi(steps);
    let width = MAP_WIDTH / factor;
    let height = MAP_HEIGHT / factor;
    let (cx, cy) = to_canvas(viewport.center);
    ViewBox {
        x: (cx - width / 2.0).clamp(0.0, MAP_WIDTH - width),
        y: (cy - height / 2.0).clamp(0.0, MAP_HEIGHT - height),
        width,
        height,
    }
}
