//! Tap-versus-drag recognition for list items.
//!
//! Two event vocabularies feed the same session: raw pointer events (touch and
//! pen, which do not reliably start native drags) and native drag-and-drop
//! events (mouse). Both adapters drive one phase machine and share the distance and
//! proximity math, so a drag looks the same to the host whatever started it.
//!
//! Movement past the drag threshold turns a press into a drag and arms click
//! suppression. The click that browsers synthesize after a drag is swallowed
//! once; [`GestureRecognizer::tick`] drops any suppression left over after the
//! event loop turn in which the drag ended.

use tracing::{debug, trace};

pub const DRAG_THRESHOLD_PX: f64 = 10.0;
pub const NEAR_RADIUS_PX: f64 = 96.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Axis-aligned bounds in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            right: left + width,
            bottom: top + height,
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }

    /// Shortest distance from `p` to the rectangle; zero inside it.
    pub fn distance_to(&self, p: Point) -> f64 {
        let dx = (self.left - p.x).max(0.0).max(p.x - self.right);
        let dy = (self.top - p.y).max(0.0).max(p.y - self.bottom);
        dx.hypot(dy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
    Pen,
}

/// Drop-target highlight. `near` is always set when `over` is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Affordance {
    pub near: bool,
    pub over: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GestureIntent {
    /// Host should capture the pointer on the pressed element.
    CapturePointer { pointer_id: i32 },
    Toggle(String),
    BeginDrag(String),
    DragOver {
        item_id: String,
        affordance: Affordance,
    },
    DropDelete(String),
    CancelDrag(String),
}

#[derive(Debug, Clone, Copy)]
pub struct GestureConfig {
    pub drag_threshold: f64,
    pub near_radius: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            drag_threshold: DRAG_THRESHOLD_PX,
            near_radius: NEAR_RADIUS_PX,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Pointer(i32),
    Native,
}

#[derive(Debug, Clone, PartialEq)]
enum Phase {
    Idle,
    Armed {
        pointer_id: i32,
        item_id: String,
        start: Point,
    },
    Dragging {
        source: Source,
        item_id: String,
    },
    /// Native drop delivered; waiting for drag-end.
    Resolving { item_id: String },
}

#[derive(Debug, Clone)]
pub struct GestureRecognizer {
    config: GestureConfig,
    phase: Phase,
    drop_zone: Option<Rect>,
    affordance: Affordance,
    suppress_click: bool,
    clear_on_tick: bool,
}

impl Default for GestureRecognizer {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}

impl GestureRecognizer {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            phase: Phase::Idle,
            drop_zone: None,
            affordance: Affordance::default(),
            suppress_click: false,
            clear_on_tick: false,
        }
    }

    /// Bounds of the delete target, refreshed by the host on layout changes.
    pub fn set_drop_zone(&mut self, zone: Option<Rect>) {
        self.drop_zone = zone;
    }

    pub fn dragging_item(&self) -> Option<&str> {
        match &self.phase {
            Phase::Dragging { item_id, .. } => Some(item_id.as_str()),
            _ => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Idle
    }

    pub fn affordance(&self) -> Affordance {
        self.affordance
    }

    pub fn click_suppressed(&self) -> bool {
        self.suppress_click
    }

    // ---- pointer adapter ----

    pub fn pointer_down(
        &mut self,
        pointer_id: i32,
        kind: PointerKind,
        item_id: &str,
        at: Point,
    ) -> Vec<GestureIntent> {
        if kind == PointerKind::Mouse {
            // Mouse goes through native drag-and-drop.
            return vec![];
        }
        if matches!(self.phase, Phase::Dragging { .. } | Phase::Resolving { .. }) {
            trace!(pointer_id, item_id, "ignoring press during active drag");
            return vec![];
        }
        debug!(pointer_id, item_id, x = at.x, y = at.y, "armed");
        self.phase = Phase::Armed {
            pointer_id,
            item_id: item_id.to_string(),
            start: at,
        };
        vec![GestureIntent::CapturePointer { pointer_id }]
    }

    pub fn pointer_move(&mut self, pointer_id: i32, item_id: &str, at: Point) -> Vec<GestureIntent> {
        match &self.phase {
            Phase::Armed {
                pointer_id: armed,
                item_id: armed_item,
                start,
            } if *armed == pointer_id && armed_item == item_id => {
                if start.distance_to(at) <= self.config.drag_threshold {
                    return vec![];
                }
                debug!(pointer_id, item_id, "drag threshold exceeded");
                self.begin_drag(Source::Pointer(pointer_id), item_id);
                let drag_over = self.update_affordance(at);
                vec![GestureIntent::BeginDrag(item_id.to_string()), drag_over]
            }
            Phase::Dragging {
                source: Source::Pointer(active),
                item_id: active_item,
            } if *active == pointer_id && active_item == item_id => vec![self.update_affordance(at)],
            _ => {
                trace!(pointer_id, item_id, "stale pointer move");
                vec![]
            }
        }
    }

    pub fn pointer_up(&mut self, pointer_id: i32, item_id: &str, at: Point) -> Vec<GestureIntent> {
        match &self.phase {
            Phase::Armed {
                pointer_id: armed,
                item_id: armed_item,
                ..
            } if *armed == pointer_id && armed_item == item_id => {
                // A press that never moved far enough: the click toggles.
                self.reset();
                vec![]
            }
            Phase::Dragging {
                source: Source::Pointer(active),
                item_id: active_item,
            } if *active == pointer_id && active_item == item_id => {
                let over = self.over_drop_zone(at);
                debug!(pointer_id, item_id, over, "pointer drag released");
                self.reset();
                self.suppress_until_tick();
                if over {
                    vec![GestureIntent::DropDelete(item_id.to_string())]
                } else {
                    vec![GestureIntent::CancelDrag(item_id.to_string())]
                }
            }
            _ => {
                trace!(pointer_id, item_id, "stale pointer up");
                vec![]
            }
        }
    }

    /// Cancellation never deletes.
    pub fn pointer_cancel(&mut self, pointer_id: i32, item_id: &str) -> Vec<GestureIntent> {
        match &self.phase {
            Phase::Armed {
                pointer_id: armed,
                item_id: armed_item,
                ..
            } if *armed == pointer_id && armed_item == item_id => {
                self.reset();
                vec![]
            }
            Phase::Dragging {
                source: Source::Pointer(active),
                item_id: active_item,
            } if *active == pointer_id && active_item == item_id => {
                debug!(pointer_id, item_id, "pointer drag cancelled");
                self.reset();
                self.suppress_until_tick();
                vec![GestureIntent::CancelDrag(item_id.to_string())]
            }
            _ => vec![],
        }
    }

    // ---- native drag-and-drop adapter ----

    pub fn drag_start(&mut self, item_id: &str) -> Vec<GestureIntent> {
        debug!(item_id, "native drag started");
        self.begin_drag(Source::Native, item_id);
        vec![GestureIntent::BeginDrag(item_id.to_string())]
    }

    pub fn drag(&mut self, item_id: &str, at: Point) -> Vec<GestureIntent> {
        if !self.native_drag_of(item_id) {
            return vec![];
        }
        // Browsers report (0, 0) on the final drag event.
        if at.x == 0.0 && at.y == 0.0 {
            return vec![];
        }
        vec![self.update_affordance(at)]
    }

    /// Drop event fired by the delete target.
    pub fn drop_on_target(&mut self, item_id: &str) -> Vec<GestureIntent> {
        if !self.native_drag_of(item_id) {
            trace!(item_id, "stale drop");
            return vec![];
        }
        debug!(item_id, "dropped on delete target");
        self.phase = Phase::Resolving {
            item_id: item_id.to_string(),
        };
        self.affordance = Affordance::default();
        vec![GestureIntent::DropDelete(item_id.to_string())]
    }

    pub fn drag_end(&mut self, item_id: &str) -> Vec<GestureIntent> {
        let intents = match &self.phase {
            Phase::Dragging {
                source: Source::Native,
                item_id: active,
            } if active == item_id => vec![GestureIntent::CancelDrag(item_id.to_string())],
            Phase::Resolving { item_id: active } if active == item_id => vec![],
            _ => {
                trace!(item_id, "stale drag end");
                return vec![];
            }
        };
        self.reset();
        self.suppress_until_tick();
        intents
    }

    // ---- shared ----

    /// Tap on an item. Consumes a pending suppression instead of toggling.
    pub fn click(&mut self, item_id: &str) -> Option<GestureIntent> {
        if self.suppress_click {
            trace!(item_id, "click suppressed after drag");
            self.suppress_click = false;
            self.clear_on_tick = false;
            return None;
        }
        Some(GestureIntent::Toggle(item_id.to_string()))
    }

    /// Called by the host once per event-loop turn after drag completion.
    pub fn tick(&mut self) {
        if self.clear_on_tick {
            self.suppress_click = false;
            self.clear_on_tick = false;
        }
    }

    fn begin_drag(&mut self, source: Source, item_id: &str) {
        self.phase = Phase::Dragging {
            source,
            item_id: item_id.to_string(),
        };
        self.suppress_click = true;
        self.clear_on_tick = false;
        self.affordance = Affordance::default();
    }

    fn native_drag_of(&self, item_id: &str) -> bool {
        matches!(
            &self.phase,
            Phase::Dragging { source: Source::Native, item_id: active } if active == item_id
        )
    }

    fn over_drop_zone(&self, at: Point) -> bool {
        self.drop_zone.is_some_and(|zone| zone.contains(at))
    }

    fn update_affordance(&mut self, at: Point) -> GestureIntent {
        let (near, over) = match self.drop_zone {
            Some(zone) => {
                let over = zone.contains(at);
                (over || zone.distance_to(at) <= self.config.near_radius, over)
            }
            None => (false, false),
        };
        self.affordance = Affordance { near, over };
        let item_id = match &self.phase {
            Phase::Dragging { item_id, .. } => item_id.clone(),
            _ => String::new(),
        };
        GestureIntent::DragOver {
            item_id,
            affordance: self.affordance,
        }
    }

    fn suppress_until_tick(&mut self) {
        self.suppress_click = true;
        self.clear_on_tick = true;
    }

    fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.affordance = Affordance::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone() -> Rect {
        // Delete target at the bottom of a 400x800 viewport.
        Rect::new(100.0, 700.0, 200.0, 60.0)
    }

    fn recognizer() -> GestureRecognizer {
        let mut r = GestureRecognizer::default();
        r.set_drop_zone(Some(zone()));
        r
    }

    fn affordance_of(intents: &[GestureIntent]) -> Option<Affordance> {
        intents.iter().find_map(|intent| match intent {
            GestureIntent::DragOver { affordance, .. } => Some(*affordance),
            _ => None,
        })
    }

    #[test]
    fn rect_distance_is_zero_inside() {
        let r = zone();
        assert_eq!(r.distance_to(Point::new(150.0, 720.0)), 0.0);
        assert_eq!(r.distance_to(Point::new(150.0, 690.0)), 10.0);
        assert_eq!(r.distance_to(Point::new(97.0, 696.0)), 5.0);
    }

    #[test]
    fn short_press_is_a_tap() {
        let mut r = recognizer();
        let intents = r.pointer_down(1, PointerKind::Touch, "a", Point::new(50.0, 50.0));
        assert_eq!(intents, vec![GestureIntent::CapturePointer { pointer_id: 1 }]);
        assert!(r.pointer_move(1, "a", Point::new(56.0, 58.0)).is_empty());
        assert!(r.pointer_up(1, "a", Point::new(56.0, 58.0)).is_empty());
        assert_eq!(r.click("a"), Some(GestureIntent::Toggle("a".to_string())));
    }

    #[test]
    fn mouse_press_is_left_to_native_drag() {
        let mut r = recognizer();
        assert!(r.pointer_down(1, PointerKind::Mouse, "a", Point::new(0.0, 0.0)).is_empty());
        assert!(r.is_idle());
    }

    #[test]
    fn drag_released_outside_target_cancels_and_swallows_click() {
        let mut r = recognizer();
        r.pointer_down(7, PointerKind::Touch, "a", Point::new(50.0, 50.0));
        let intents = r.pointer_move(7, "a", Point::new(50.0, 65.0));
        assert_eq!(intents[0], GestureIntent::BeginDrag("a".to_string()));
        assert_eq!(r.dragging_item(), Some("a"));

        let intents = r.pointer_up(7, "a", Point::new(50.0, 65.0));
        assert_eq!(intents, vec![GestureIntent::CancelDrag("a".to_string())]);
        assert_eq!(r.click("a"), None);
        assert_eq!(r.click("a"), Some(GestureIntent::Toggle("a".to_string())));
    }

    #[test]
    fn drag_released_over_target_deletes() {
        let mut r = recognizer();
        r.pointer_down(2, PointerKind::Pen, "b", Point::new(200.0, 100.0));
        r.pointer_move(2, "b", Point::new(200.0, 400.0));

        let near = r.pointer_move(2, "b", Point::new(200.0, 650.0));
        assert_eq!(
            affordance_of(&near),
            Some(Affordance {
                near: true,
                over: false
            })
        );
        let over = r.pointer_move(2, "b", Point::new(200.0, 720.0));
        assert_eq!(
            affordance_of(&over),
            Some(Affordance {
                near: true,
                over: true
            })
        );

        let intents = r.pointer_up(2, "b", Point::new(200.0, 720.0));
        assert_eq!(intents, vec![GestureIntent::DropDelete("b".to_string())]);
        assert!(r.is_idle());
        assert_eq!(r.affordance(), Affordance::default());
    }

    #[test]
    fn far_pointer_is_neither_near_nor_over() {
        let mut r = recognizer();
        r.pointer_down(2, PointerKind::Touch, "b", Point::new(200.0, 100.0));
        let intents = r.pointer_move(2, "b", Point::new(200.0, 200.0));
        assert_eq!(affordance_of(&intents), Some(Affordance::default()));
    }

    #[test]
    fn near_radius_is_inclusive() {
        let mut r = recognizer();
        r.pointer_down(4, PointerKind::Touch, "d", Point::new(200.0, 100.0));
        r.pointer_move(4, "d", Point::new(200.0, 300.0));

        let at_edge = r.pointer_move(4, "d", Point::new(200.0, 700.0 - NEAR_RADIUS_PX));
        assert_eq!(
            affordance_of(&at_edge),
            Some(Affordance {
                near: true,
                over: false
            })
        );
        let beyond = r.pointer_move(4, "d", Point::new(200.0, 700.0 - NEAR_RADIUS_PX - 1.0));
        assert_eq!(affordance_of(&beyond), Some(Affordance::default()));
    }

    #[test]
    fn over_implies_near_with_zero_radius() {
        let mut r = GestureRecognizer::new(GestureConfig {
            drag_threshold: DRAG_THRESHOLD_PX,
            near_radius: 0.0,
        });
        r.set_drop_zone(Some(zone()));
        r.pointer_down(5, PointerKind::Touch, "e", Point::new(200.0, 100.0));
        r.pointer_move(5, "e", Point::new(200.0, 300.0));

        let outside = r.pointer_move(5, "e", Point::new(200.0, 699.0));
        assert_eq!(affordance_of(&outside), Some(Affordance::default()));
        let inside = r.pointer_move(5, "e", Point::new(200.0, 730.0));
        assert_eq!(
            affordance_of(&inside),
            Some(Affordance {
                near: true,
                over: true
            })
        );
    }

    #[test]
    fn cancel_never_deletes() {
        let mut r = recognizer();
        r.pointer_down(3, PointerKind::Touch, "c", Point::new(200.0, 600.0));
        r.pointer_move(3, "c", Point::new(200.0, 720.0));
        let intents = r.pointer_cancel(3, "c");
        assert_eq!(intents, vec![GestureIntent::CancelDrag("c".to_string())]);
        assert!(r.is_idle());
    }

    #[test]
    fn stale_events_are_ignored() {
        let mut r = recognizer();
        r.pointer_down(1, PointerKind::Touch, "a", Point::new(0.0, 0.0));
        assert!(r.pointer_move(2, "a", Point::new(100.0, 100.0)).is_empty());
        assert!(r.pointer_move(1, "b", Point::new(100.0, 100.0)).is_empty());
        assert!(r.pointer_up(9, "a", Point::new(100.0, 100.0)).is_empty());
        assert!(!r.is_idle());
        assert!(!r.click_suppressed());
    }

    #[test]
    fn tick_clears_unused_suppression() {
        let mut r = recognizer();
        r.pointer_down(1, PointerKind::Touch, "a", Point::new(0.0, 0.0));
        r.pointer_move(1, "a", Point::new(0.0, 30.0));
        r.pointer_up(1, "a", Point::new(0.0, 30.0));
        assert!(r.click_suppressed());
        r.tick();
        assert_eq!(r.click("a"), Some(GestureIntent::Toggle("a".to_string())));
    }

    #[test]
    fn native_drop_on_target_deletes_then_swallows_click() {
        let mut r = recognizer();
        assert_eq!(r.drag_start("a"), vec![GestureIntent::BeginDrag("a".to_string())]);
        assert!(r.click_suppressed());

        let intents = r.drag("a", Point::new(150.0, 690.0));
        assert_eq!(
            affordance_of(&intents),
            Some(Affordance {
                near: true,
                over: false
            })
        );
        assert!(r.drag("a", Point::new(0.0, 0.0)).is_empty());

        assert_eq!(r.drop_on_target("a"), vec![GestureIntent::DropDelete("a".to_string())]);
        assert!(r.drag_end("a").is_empty());
        assert_eq!(r.click("a"), None);
    }

    #[test]
    fn native_drag_end_without_drop_cancels() {
        let mut r = recognizer();
        r.drag_start("a");
        assert_eq!(r.drag_end("a"), vec![GestureIntent::CancelDrag("a".to_string())]);
        assert!(r.is_idle());
        r.tick();
        assert!(!r.click_suppressed());
    }

    #[test]
    fn custom_threshold_applies() {
        let mut r = GestureRecognizer::new(GestureConfig {
            drag_threshold: 40.0,
            near_radius: 10.0,
        });
        r.pointer_down(1, PointerKind::Touch, "a", Point::new(0.0, 0.0));
        assert!(r.pointer_move(1, "a", Point::new(0.0, 30.0)).is_empty());
        assert!(!r.pointer_move(1, "a", Point::new(0.0, 41.0)).is_empty());
    }
}
