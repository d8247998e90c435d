//! Focus mode: fit a filtered subset of stacks into the viewport.

use crate::geometry::union_bounds;
use crate::model::Stack;
use crate::transform::{ViewSettings, ViewTransform};

/// Fit parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusConfig {
    /// Screen-space gap kept free around the fitted content.
    pub margin: f64,
    /// Focus never zooms in further than this.
    pub max_zoom: f64,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            margin: 50.0,
            max_zoom: 2.0,
        }
    }
}

/// Visible canvas area in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

/// Zoom/translate that fits `stacks` into the viewport.
///
/// Content is centred, then each axis is shifted just enough that neither
/// edge falls inside the margin band. When content cannot fit on an axis
/// the leading (left/top) edge is pinned at the margin.
pub fn compute_focus_transform(
    stacks: &[Stack],
    viewport: Viewport,
    config: FocusConfig,
) -> ViewTransform {
    let Some(bounds) = union_bounds(stacks) else {
        return ViewTransform::IDENTITY;
    };
    let margin = config.margin;
    let avail_w = (viewport.width - 2.0 * margin).max(1.0);
    let avail_h = (viewport.height - 2.0 * margin).max(1.0);

    let fit_w = if bounds.width() > 0.0 { avail_w / bounds.width() } else { config.max_zoom };
    let fit_h = if bounds.height() > 0.0 { avail_h / bounds.height() } else { config.max_zoom };
    let zoom = fit_w.min(fit_h).min(config.max_zoom);

    let center = bounds.center();
    let mut x = viewport.width / 2.0 - center.x * zoom;
    let mut y = viewport.height / 2.0 - center.y * zoom;

    x = pin_axis(x, bounds.x0 * zoom, bounds.x1 * zoom, viewport.width, margin);
    y = pin_axis(y, bounds.y0 * zoom, bounds.y1 * zoom, viewport.height, margin);

    ViewTransform { zoom, x, y }
}

fn pin_axis(t: f64, lo: f64, hi: f64, extent: f64, margin: f64) -> f64 {
    let mut t = t;
    if hi + t > extent - margin {
        t = extent - margin - hi;
    }
    if lo + t < margin {
        t = margin - lo;
    }
    t
}

/// Normal/focus viewport bookkeeping.
///
/// Entering focus stores the current viewport as "normal"; leaving focus
/// hands it back untouched.
#[derive(Debug, Clone, Default)]
pub struct FocusState {
    pub normal: ViewSettings,
    pub focus: ViewSettings,
    pub config: FocusConfig,
    active: bool,
}

impl FocusState {
    pub fn new(config: FocusConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Enter focus mode: save `current` as normal, fit `stacks`, and return
    /// the view to apply.
    pub fn enter(&mut self, current: ViewSettings, stacks: &[Stack], viewport: Viewport) -> ViewSettings {
        if !self.active {
            self.normal = current;
        }
        self.active = true;
        self.focus = compute_focus_transform(stacks, viewport, self.config);
        log::debug!("focus on {} stacks: {:?}", stacks.len(), self.focus);
        self.focus
    }

    /// Leave focus mode, returning the saved normal view.
    pub fn exit(&mut self) -> ViewSettings {
        self.active = false;
        self.normal
    }

    pub fn toggle(&mut self, current: ViewSettings, stacks: &[Stack], viewport: Viewport) -> ViewSettings {
        if self.active {
            self.exit()
        } else {
            self.enter(current, stacks, viewport)
        }
    }

    /// Re-fit after the filtered set changed. `None` when not focused.
    pub fn on_filter_changed(&mut self, stacks: &[Stack], viewport: Viewport) -> Option<ViewSettings> {
        if !self.active {
            return None;
        }
        self.focus = compute_focus_transform(stacks, viewport, self.config);
        Some(self.focus)
    }

    /// Record a user pan/zoom into whichever view is live.
    pub fn record(&mut self, view: ViewSettings) {
        if self.active {
            self.focus = view;
        } else {
            self.normal = view;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::stack_bounds;
    use crate::id::EntityId;
    use crate::model::Card;

    fn stack(id: &str, x: f64, y: f64) -> Stack {
        Stack::new(
            EntityId::intern(id),
            x,
            y,
            vec![Card::new(EntityId::intern(&format!("{id}-c")), "c")],
        )
    }

    const VIEW: Viewport = Viewport {
        width: 1200.0,
        height: 900.0,
    };

    #[test]
    fn empty_set_is_identity() {
        assert_eq!(
            compute_focus_transform(&[], VIEW, FocusConfig::default()),
            ViewTransform::IDENTITY
        );
    }

    #[test]
    fn single_stack_is_centred_and_outside_margin() {
        let s = stack("f-one", 3000.0, -700.0);
        let config = FocusConfig {
            margin: 50.0,
            max_zoom: 10.0,
        };
        let t = compute_focus_transform(std::slice::from_ref(&s), VIEW, config);
        let screen = t.rect_to_screen(stack_bounds(&s));
        assert!((screen.center().x - 600.0).abs() < 1e-6);
        assert!((screen.center().y - 450.0).abs() < 1e-6);
        assert!(screen.x0 >= 50.0 - 1e-6 && screen.x1 <= 1150.0 + 1e-6);
        assert!(screen.y0 >= 50.0 - 1e-6 && screen.y1 <= 850.0 + 1e-6);
    }

    #[test]
    fn zoom_is_capped() {
        let s = stack("f-cap", 0.0, 0.0);
        let t = compute_focus_transform(&[s], VIEW, FocusConfig::default());
        assert_eq!(t.zoom, 2.0);
    }

    #[test]
    fn wide_content_zooms_out() {
        let stacks = [stack("f-l", 0.0, 0.0), stack("f-r", 5000.0, 0.0)];
        let t = compute_focus_transform(&stacks, VIEW, FocusConfig::default());
        assert!(t.zoom < 1.0);
        let screen = t.rect_to_screen(union_bounds(&stacks).unwrap());
        assert!((screen.x0 - 50.0).abs() < 1e-6);
        assert!((screen.x1 - 1150.0).abs() < 1e-6);
    }

    #[test]
    fn exit_restores_normal_view_verbatim() {
        let mut state = FocusState::default();
        let normal = ViewTransform::new(0.75, -120.0, 33.0);
        let s = stack("f-toggle", 10.0, 10.0);
        let focused = state.enter(normal, std::slice::from_ref(&s), VIEW);
        assert!(state.is_active());
        assert_ne!(focused, normal);
        assert_eq!(state.exit(), normal);
        assert!(!state.is_active());
    }

    #[test]
    fn filter_changes_refit_only_while_active() {
        let mut state = FocusState::default();
        let a = stack("f-a", 0.0, 0.0);
        let b = stack("f-b", 2000.0, 2000.0);
        assert!(state.on_filter_changed(std::slice::from_ref(&a), VIEW).is_none());

        state.enter(ViewTransform::IDENTITY, std::slice::from_ref(&a), VIEW);
        let before = state.focus;
        let after = state.on_filter_changed(&[a, b], VIEW).unwrap();
        assert_ne!(before, after);
        assert_eq!(state.focus, after);
    }

    #[test]
    fn re_entering_keeps_first_normal_view() {
        let mut state = FocusState::default();
        let s = stack("f-re", 0.0, 0.0);
        let normal = ViewTransform::new(1.0, 5.0, 5.0);
        let focused = state.enter(normal, std::slice::from_ref(&s), VIEW);
        state.enter(focused, std::slice::from_ref(&s), VIEW);
        assert_eq!(state.exit(), normal);
    }
}
