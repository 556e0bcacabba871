// SPDX-License-Identifier: MIT
//
// Viewport: which canvas coordinate sits at the top-left of the terminal.
//
// The offset may go negative or past the far edge so the canvas can be
// pulled partly off screen, but never so far that it disappears: clamp()
// keeps it within a margin of a quarter of the terminal width (half the
// height) on the near side and two pixels of canvas on the far side.
//
// Dragging works in terminal cells. Every drag report moves the offset by
// the distance since the previous report and becomes the new anchor.

/// Clamp margins and pan step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportPolicy {
    /// The near-side margin is `term_w / margin_x_div` canvas pixels.
    pub margin_x_div: i32,
    /// The near-side margin is `term_h / margin_y_div` canvas pixels.
    pub margin_y_div: i32,
    /// How far one arrow key moves the view.
    pub pan_step: i32,
}

impl Default for ViewportPolicy {
    fn default() -> Self {
        Self {
            margin_x_div: 4,
            margin_y_div: 2,
            pan_step: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub offset_x: i32,
    pub offset_y: i32,
    anchor: Option<(u16, u16)>,
}

impl Viewport {
    #[must_use]
    pub const fn new(offset_x: i32, offset_y: i32) -> Self {
        Self {
            offset_x,
            offset_y,
            anchor: None,
        }
    }

    pub const fn pan(&mut self, dx: i32, dy: i32) {
        self.offset_x = self.offset_x.saturating_add(dx);
        self.offset_y = self.offset_y.saturating_add(dy);
    }

    /// Keep the canvas on screen.
    ///
    /// `offset_x` is limited to `[-term_w/div_x, canvas_w - 2 - term_w/div_x]`
    /// and likewise for y. The lower bound is checked first, so an empty
    /// range still pins anything below it to `lo`.
    pub fn clamp(
        &mut self,
        term_w: u16,
        term_h: u16,
        canvas_w: usize,
        canvas_h: usize,
        policy: &ViewportPolicy,
    ) {
        self.offset_x = clamp_axis(self.offset_x, term_w, canvas_w, policy.margin_x_div);
        self.offset_y = clamp_axis(self.offset_y, term_h, canvas_h, policy.margin_y_div);
    }

    /// A left-button press or drag report at terminal cell `(x, y)`.
    pub fn drag_to(&mut self, x: u16, y: u16) {
        if let Some((ax, ay)) = self.anchor {
            self.pan(anchor_delta(ax, x), anchor_delta(ay, y));
        }
        self.anchor = Some((x, y));
    }

    pub const fn end_drag(&mut self) {
        self.anchor = None;
    }

    #[must_use]
    pub const fn is_dragging(&self) -> bool {
        self.anchor.is_some()
    }
}

/// Offset change for a pointer moving from `anchor` to `now`: the view
/// follows the pointer, so the offset moves the other way.
fn anchor_delta(anchor: u16, now: u16) -> i32 {
    i32::from(anchor) - i32::from(now)
}

fn clamp_axis(offset: i32, term_len: u16, canvas_len: usize, margin_div: i32) -> i32 {
    let margin = i64::from(term_len) / i64::from(margin_div.max(1));
    let canvas_len = i64::try_from(canvas_len).unwrap_or(i64::MAX);
    let lo = -margin;
    let hi = canvas_len.saturating_sub(2).saturating_sub(margin);

    let v = i64::from(offset);
    let v = if v < lo {
        lo
    } else if v > hi {
        hi
    } else {
        v
    };
    i32::try_from(v).unwrap_or(if v < 0 { i32::MIN } else { i32::MAX })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn clamped(x: i32, y: i32, term: (u16, u16), canvas: (usize, usize)) -> (i32, i32) {
        let mut vp = Viewport::new(x, y);
        vp.clamp(term.0, term.1, canvas.0, canvas.1, &ViewportPolicy::default());
        (vp.offset_x, vp.offset_y)
    }

    #[test]
    fn clamp_far_side() {
        assert_eq!(clamped(1000, 1000, (40, 20), (10, 10)), (-2, -2));
    }

    #[test]
    fn clamp_near_side() {
        assert_eq!(clamped(-1000, -1000, (40, 20), (10, 10)), (-10, -10));
    }

    #[test]
    fn clamp_leaves_valid_offset_alone() {
        assert_eq!(clamped(30, 40, (80, 24), (200, 100)), (30, 40));
    }

    #[test]
    fn empty_range_checks_lower_bound_first() {
        // 1x1 canvas in 40x20: both ranges are [-10, -11].
        assert_eq!(clamped(-50, -50, (40, 20), (1, 1)), (-10, -10));
        assert_eq!(clamped(50, 50, (40, 20), (1, 1)), (-11, -11));
    }

    #[test]
    fn custom_margins() {
        let policy = ViewportPolicy {
            margin_x_div: 2,
            margin_y_div: 4,
            pan_step: 5,
        };
        let mut vp = Viewport::new(-1000, -1000);
        vp.clamp(40, 20, 100, 100, &policy);
        assert_eq!((vp.offset_x, vp.offset_y), (-20, -5));
    }

    #[test]
    fn pan_saturates() {
        let mut vp = Viewport::new(i32::MAX - 1, 0);
        vp.pan(5, -5);
        assert_eq!((vp.offset_x, vp.offset_y), (i32::MAX, -5));
    }

    #[test]
    fn drag_moves_against_pointer() {
        let mut vp = Viewport::new(10, 10);
        vp.drag_to(20, 5);
        assert_eq!((vp.offset_x, vp.offset_y), (10, 10));
        vp.drag_to(23, 4);
        assert_eq!((vp.offset_x, vp.offset_y), (7, 11));
        vp.drag_to(21, 4);
        assert_eq!((vp.offset_x, vp.offset_y), (9, 11));
    }

    #[test]
    fn release_clears_anchor() {
        let mut vp = Viewport::new(0, 0);
        vp.drag_to(5, 5);
        assert!(vp.is_dragging());
        vp.end_drag();
        assert!(!vp.is_dragging());
        vp.drag_to(9, 9);
        assert_eq!((vp.offset_x, vp.offset_y), (0, 0));
    }
}
