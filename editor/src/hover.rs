//! Hover tracking for the selection modes.
//!
//! [`HoverTracker`] is the single source of truth for the ray-selection
//! hover target. Raw ray hits feed [`set_pending`](HoverTracker::set_pending)
//! every frame and only become the confirmed hover after a short debounce,
//! which stops the highlight flickering when the ray sweeps quickly across
//! objects.
//!
//! [`SphereHoverTracker`] is the volume-mode counterpart: it tracks every
//! object inside the selection sphere at once and diffs against the
//! previous set, so highlights only change when membership changes. The
//! sphere position is stable, so no debounce is needed.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use vredit_core::interfaces::{Color, Highlighter};
use vredit_core::math::Vec3;
use vredit_core::object::ObjectId;
use vredit_core::selection::Selection;

/// Hover highlight color (cyan).
pub const HOVER_COLOR: Color = Color::new(0.2, 0.8, 1.0);

/// How long the same object must stay under the ray before it becomes the
/// confirmed hover.
pub const HOVER_DEBOUNCE_TIME: f32 = 0.0375;

/// Debounced single-object hover state.
pub struct HoverTracker {
    highlighter: Rc<RefCell<dyn Highlighter>>,
    selection: Rc<RefCell<dyn Selection>>,
    hovered: Option<ObjectId>,
    hovered_point: Option<Vec3>,
    pending: Option<ObjectId>,
    pending_point: Option<Vec3>,
    pending_time: f32,
}

impl HoverTracker {
    pub fn new(
        highlighter: Rc<RefCell<dyn Highlighter>>,
        selection: Rc<RefCell<dyn Selection>>,
    ) -> Self {
        Self {
            highlighter,
            selection,
            hovered: None,
            hovered_point: None,
            pending: None,
            pending_point: None,
            pending_time: 0.0,
        }
    }

    /// Feed this frame's raw ray hit (object and hit point), or `None`
    /// when the ray hits nothing selectable.
    pub fn set_pending(&mut self, target: Option<(ObjectId, Vec3)>) {
        let id = target.map(|(id, _)| id);
        if id != self.pending {
            self.pending = id;
            self.pending_time = 0.0;
        }
        self.pending_point = target.map(|(_, point)| point);
    }

    /// Advance the debounce timer and confirm the pending target once it
    /// has been stable long enough.
    pub fn update(&mut self, delta_time: f32) {
        if self.pending == self.hovered {
            if self.hovered.is_some() {
                self.hovered_point = self.pending_point;
            }
            self.pending_time = 0.0;
            return;
        }

        self.pending_time += delta_time;
        if self.pending_time < HOVER_DEBOUNCE_TIME {
            return;
        }

        if let Some(old) = self.hovered {
            if !self.selection.borrow().is_selected(old) {
                self.highlighter.borrow_mut().unhighlight(old);
            }
        }
        self.hovered = self.pending;
        self.hovered_point = self.pending_point;
        self.pending_time = 0.0;
        if let Some(new) = self.hovered {
            if !self.selection.borrow().is_selected(new) {
                self.highlighter.borrow_mut().highlight(new, HOVER_COLOR);
            }
        }
    }

    /// The confirmed hover target.
    pub fn hovered(&self) -> Option<ObjectId> {
        self.hovered
    }

    /// Ray hit point on the confirmed hover target, for grab-offset math.
    pub fn hit_point(&self) -> Option<Vec3> {
        self.hovered_point
    }

    pub fn has_hovered(&self) -> bool {
        self.hovered.is_some()
    }

    /// Drop all hover state and remove the highlight.
    pub fn clear(&mut self) {
        if let Some(old) = self.hovered {
            if !self.selection.borrow().is_selected(old) {
                self.highlighter.borrow_mut().unhighlight(old);
            }
        }
        self.hovered = None;
        self.hovered_point = None;
        self.pending = None;
        self.pending_point = None;
        self.pending_time = 0.0;
    }
}

/// Multi-object hover set for volume selection.
pub struct SphereHoverTracker {
    highlighter: Rc<RefCell<dyn Highlighter>>,
    selection: Rc<RefCell<dyn Selection>>,
    hovered: Vec<ObjectId>,
    hovered_set: HashSet<ObjectId>,
}

impl SphereHoverTracker {
    pub fn new(
        highlighter: Rc<RefCell<dyn Highlighter>>,
        selection: Rc<RefCell<dyn Selection>>,
    ) -> Self {
        Self {
            highlighter,
            selection,
            hovered: Vec::new(),
            hovered_set: HashSet::new(),
        }
    }

    /// Replace the hover set with the objects currently inside the sphere.
    /// Highlights change only for the membership diff.
    pub fn set_hovered(&mut self, objects: Vec<ObjectId>) {
        let mut deduped = Vec::with_capacity(objects.len());
        let mut new_set = HashSet::with_capacity(objects.len());
        for id in objects {
            if new_set.insert(id) {
                deduped.push(id);
            }
        }

        let selection = self.selection.borrow();
        let mut highlighter = self.highlighter.borrow_mut();
        for old in &self.hovered {
            if !new_set.contains(old) && !selection.is_selected(*old) {
                highlighter.unhighlight(*old);
            }
        }
        for new in &deduped {
            if !self.hovered_set.contains(new) && !selection.is_selected(*new) {
                highlighter.highlight(*new, HOVER_COLOR);
            }
        }
        drop(highlighter);
        drop(selection);

        self.hovered = deduped;
        self.hovered_set = new_set;
    }

    /// All currently hovered objects, in query order.
    pub fn hovered(&self) -> &[ObjectId] {
        &self.hovered
    }

    pub fn has_hovered(&self) -> bool {
        !self.hovered.is_empty()
    }

    pub fn count(&self) -> usize {
        self.hovered.len()
    }

    pub fn is_hovered(&self, id: ObjectId) -> bool {
        self.hovered_set.contains(&id)
    }

    /// Drop all hover state and remove the highlights.
    pub fn clear(&mut self) {
        let selection = self.selection.borrow();
        let mut highlighter = self.highlighter.borrow_mut();
        for id in &self.hovered {
            if !selection.is_selected(*id) {
                highlighter.unhighlight(*id);
            }
        }
        drop(highlighter);
        drop(selection);
        self.hovered.clear();
        self.hovered_set.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeHighlighter {
        highlighted: Vec<ObjectId>,
        events: Vec<(ObjectId, bool)>, // (id, highlighted?)
    }

    impl Highlighter for FakeHighlighter {
        fn highlight(&mut self, id: ObjectId, _color: Color) {
            self.highlighted.push(id);
            self.events.push((id, true));
        }

        fn unhighlight(&mut self, id: ObjectId) {
            self.highlighted.retain(|h| *h != id);
            self.events.push((id, false));
        }

        fn unhighlight_all(&mut self) {
            self.highlighted.clear();
        }
    }

    #[derive(Default)]
    struct FakeSelection {
        selected: HashSet<ObjectId>,
    }

    impl Selection for FakeSelection {
        fn set_single(&mut self, id: ObjectId) {
            self.selected.clear();
            self.selected.insert(id);
        }
        fn add(&mut self, id: ObjectId) {
            self.selected.insert(id);
        }
        fn remove(&mut self, id: ObjectId) {
            self.selected.remove(&id);
        }
        fn toggle(&mut self, id: ObjectId) {
            if !self.selected.remove(&id) {
                self.selected.insert(id);
            }
        }
        fn clear(&mut self) {
            self.selected.clear();
        }
        fn is_selected(&self, id: ObjectId) -> bool {
            self.selected.contains(&id)
        }
        fn is_empty(&self) -> bool {
            self.selected.is_empty()
        }
        fn count(&self) -> usize {
            self.selected.len()
        }
        fn first(&self) -> Option<ObjectId> {
            self.selected.iter().next().copied()
        }
        fn ids(&self) -> Vec<ObjectId> {
            self.selected.iter().copied().collect()
        }
    }

    fn fixture() -> (
        HoverTracker,
        Rc<RefCell<FakeHighlighter>>,
        Rc<RefCell<FakeSelection>>,
    ) {
        let highlighter = Rc::new(RefCell::new(FakeHighlighter::default()));
        let selection = Rc::new(RefCell::new(FakeSelection::default()));
        let tracker = HoverTracker::new(highlighter.clone(), selection.clone());
        (tracker, highlighter, selection)
    }

    const A: ObjectId = ObjectId(0xA);
    const B: ObjectId = ObjectId(0xB);

    #[test]
    fn hover_confirms_after_debounce() {
        let (mut tracker, highlighter, _) = fixture();
        let point = Vec3::new(1.0, 2.0, 3.0);

        tracker.set_pending(Some((A, point)));
        tracker.update(0.02);
        assert_eq!(tracker.hovered(), None);

        tracker.update(0.02);
        assert_eq!(tracker.hovered(), Some(A));
        assert_eq!(tracker.hit_point(), Some(point));
        assert_eq!(highlighter.borrow().highlighted, vec![A]);
    }

    #[test]
    fn switching_target_restarts_debounce() {
        let (mut tracker, _, _) = fixture();
        tracker.set_pending(Some((A, Vec3::zeros())));
        tracker.update(0.03);
        tracker.set_pending(Some((B, Vec3::zeros())));
        tracker.update(0.02);
        assert_eq!(tracker.hovered(), None);
        tracker.update(0.02);
        assert_eq!(tracker.hovered(), Some(B));
    }

    #[test]
    fn losing_the_target_clears_after_debounce() {
        let (mut tracker, highlighter, _) = fixture();
        tracker.set_pending(Some((A, Vec3::zeros())));
        tracker.update(0.05);
        assert_eq!(tracker.hovered(), Some(A));

        tracker.set_pending(None);
        tracker.update(0.05);
        assert_eq!(tracker.hovered(), None);
        assert!(highlighter.borrow().highlighted.is_empty());
    }

    #[test]
    fn selected_objects_keep_their_highlight() {
        let (mut tracker, highlighter, selection) = fixture();
        selection.borrow_mut().add(A);

        tracker.set_pending(Some((A, Vec3::zeros())));
        tracker.update(0.05);
        assert_eq!(tracker.hovered(), Some(A));
        // No hover highlight was applied over the selection highlight.
        assert!(highlighter.borrow().events.is_empty());

        tracker.clear();
        assert!(highlighter.borrow().events.is_empty());
    }

    #[test]
    fn clear_removes_highlight_and_state() {
        let (mut tracker, highlighter, _) = fixture();
        tracker.set_pending(Some((A, Vec3::zeros())));
        tracker.update(0.05);
        tracker.clear();
        assert!(!tracker.has_hovered());
        assert_eq!(tracker.hit_point(), None);
        assert!(highlighter.borrow().highlighted.is_empty());
    }

    #[test]
    fn sphere_diff_updates_only_changes() {
        let highlighter = Rc::new(RefCell::new(FakeHighlighter::default()));
        let selection = Rc::new(RefCell::new(FakeSelection::default()));
        let mut tracker = SphereHoverTracker::new(highlighter.clone(), selection.clone());

        tracker.set_hovered(vec![A, B]);
        assert_eq!(highlighter.borrow().events.len(), 2);
        assert!(tracker.is_hovered(A));
        assert_eq!(tracker.count(), 2);

        // B leaves, nothing enters: one unhighlight, no rehighlight of A.
        tracker.set_hovered(vec![A]);
        let events = highlighter.borrow().events.clone();
        assert_eq!(events.len(), 3);
        assert_eq!(events[2], (B, false));
    }

    #[test]
    fn sphere_clear_unhighlights_unselected_only() {
        let highlighter = Rc::new(RefCell::new(FakeHighlighter::default()));
        let selection = Rc::new(RefCell::new(FakeSelection::default()));
        let mut tracker = SphereHoverTracker::new(highlighter.clone(), selection.clone());

        selection.borrow_mut().add(A);
        tracker.set_hovered(vec![A, B]);
        tracker.clear();

        assert!(!tracker.has_hovered());
        let events = highlighter.borrow().events.clone();
        // A was selected: never hover-highlighted, never unhighlighted.
        assert!(events.iter().all(|(id, _)| *id != A));
    }
}
