use std::f64::consts::PI;

use eframe::egui::{
    pos2, vec2, Color32, CornerRadius, FontId, Pos2, Rect, Sense, Stroke, Ui,
};

use crate::models::Coords;

pub const INITIAL_ZOOM: f64 = 13.0;
const MIN_ZOOM: f64 = 3.0;
const MAX_ZOOM: f64 = 18.0;
const TILE_SIZE: f64 = 256.0;

/// Handle for a placed marker, returned on creation and required for
/// removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerId(u64);

struct Marker {
    id: MarkerId,
    coords: Coords,
    popup: String,
    accent: Color32,
}

/// Pannable, zoomable map canvas. Stands in for an external map widget:
/// it owns the viewport and the marker layer, reports clicks back as
/// geographic coordinates, and knows nothing about workouts.
pub struct MapPanel {
    center: Coords,
    zoom: f64,
    markers: Vec<Marker>,
    next_marker: u64,
}

impl MapPanel {
    pub fn new(center: Coords, zoom: f64) -> Self {
        Self {
            center,
            zoom,
            markers: Vec::new(),
            next_marker: 0,
        }
    }

    pub fn set_view(&mut self, coords: Coords, zoom: f64) {
        self.center = coords;
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Places a marker with an always-open popup bubble.
    pub fn add_marker(&mut self, coords: Coords, popup: String, accent: Color32) -> MarkerId {
        let id = MarkerId(self.next_marker);
        self.next_marker += 1;
        self.markers.push(Marker {
            id,
            coords,
            popup,
            accent,
        });
        id
    }

    /// Detaches a marker. Unknown handles are ignored.
    pub fn remove_marker(&mut self, id: MarkerId) {
        self.markers.retain(|m| m.id != id);
    }

    /// Draws the map into the available space and handles panning,
    /// zooming and clicks. Returns the geographic coordinates of a click,
    /// if one happened this frame.
    pub fn show(&mut self, ui: &mut Ui) -> Option<Coords> {
        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        let rect = response.rect;

        if response.dragged() {
            let delta = response.drag_delta();
            let (cx, cy) = project(self.center, self.zoom);
            self.center = unproject(cx - f64::from(delta.x), cy - f64::from(delta.y), self.zoom);
        }
        if response.hovered() {
            let scroll = ui.input(|i| i.smooth_scroll_delta.y);
            if scroll != 0.0 {
                self.zoom = (self.zoom + f64::from(scroll) * 0.005).clamp(MIN_ZOOM, MAX_ZOOM);
            }
        }

        painter.rect_filled(rect, CornerRadius::ZERO, Color32::from_rgb(40, 46, 54));

        // World-anchored graticule so panning gives spatial feedback.
        let (cx, cy) = project(self.center, self.zoom);
        let origin = rect.center() - vec2(cx as f32, cy as f32);
        let step = TILE_SIZE as f32;
        let grid = Stroke::new(1.0, Color32::from_gray(58));
        let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
        while x < rect.right() {
            painter.line_segment([pos2(x, rect.top()), pos2(x, rect.bottom())], grid);
            x += step;
        }
        let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
        while y < rect.bottom() {
            painter.line_segment([pos2(rect.left(), y), pos2(rect.right(), y)], grid);
            y += step;
        }

        for marker in &self.markers {
            let pos = self.to_screen(rect, marker.coords);
            if !rect.expand(200.0).contains(pos) {
                continue;
            }

            painter.circle_filled(pos, 7.0, marker.accent);
            painter.circle_stroke(pos, 7.0, Stroke::new(2.0, Color32::WHITE));

            let galley = painter.layout_no_wrap(
                marker.popup.clone(),
                FontId::proportional(13.0),
                Color32::from_gray(235),
            );
            let bubble = Rect::from_center_size(
                pos - vec2(0.0, 30.0),
                galley.size() + vec2(14.0, 10.0),
            );
            painter.line_segment(
                [pos - vec2(0.0, 8.0), pos2(bubble.center().x, bubble.bottom())],
                Stroke::new(2.0, marker.accent),
            );
            painter.rect_filled(
                bubble,
                CornerRadius::same(6),
                Color32::from_rgba_unmultiplied(28, 28, 32, 235),
            );
            painter.galley(bubble.min + vec2(7.0, 5.0), galley, Color32::from_gray(235));
        }

        if response.clicked() {
            if let Some(pointer) = response.interact_pointer_pos() {
                return Some(self.from_screen(rect, pointer));
            }
        }
        None
    }

    fn to_screen(&self, rect: Rect, coords: Coords) -> Pos2 {
        let (cx, cy) = project(self.center, self.zoom);
        let (x, y) = project(coords, self.zoom);
        rect.center() + vec2((x - cx) as f32, (y - cy) as f32)
    }

    fn from_screen(&self, rect: Rect, pos: Pos2) -> Coords {
        let (cx, cy) = project(self.center, self.zoom);
        let offset = pos - rect.center();
        unproject(cx + f64::from(offset.x), cy + f64::from(offset.y), self.zoom)
    }
}

// Web Mercator: geographic coordinates to world pixels at a zoom level.
fn project(coords: Coords, zoom: f64) -> (f64, f64) {
    let scale = TILE_SIZE * 2f64.powf(zoom);
    let lat = coords[0].to_radians();
    let x = (coords[1] + 180.0) / 360.0 * scale;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * scale;
    (x, y)
}

fn unproject(x: f64, y: f64, zoom: f64) -> Coords {
    let scale = TILE_SIZE * 2f64.powf(zoom);
    let lng = x / scale * 360.0 - 180.0;
    let n = PI * (1.0 - 2.0 * y / scale);
    let lat = n.sinh().atan().to_degrees();
    [lat, lng]
}
