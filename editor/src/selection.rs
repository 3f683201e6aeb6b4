//! Concrete selection state with highlight synchronization.
//!
//! One unified list backs single- and multi-select. Every mutation keeps
//! the highlighter in sync and reports old/new membership to an optional
//! change callback so an undo layer can record selection changes; the
//! callback can be suppressed while undo/redo itself mutates the
//! selection.

use std::cell::RefCell;
use std::rc::Rc;

use vredit_core::interfaces::{Color, Highlighter};
use vredit_core::object::ObjectId;
use vredit_core::selection::{Selection, SelectionInfo};
use vredit_core::world::WorldObjects;

/// Selection highlight color (gold).
pub const SELECTED_COLOR: Color = Color::new(1.0, 0.8, 0.2);

/// Invoked with `(old, new)` membership after every selection change.
pub type SelectionChangeCallback = Box<dyn FnMut(&[SelectionInfo], &[SelectionInfo])>;

/// The set of currently-selected objects.
pub struct SelectionState {
    world: Rc<RefCell<dyn WorldObjects>>,
    highlighter: Rc<RefCell<dyn Highlighter>>,
    selection: Vec<SelectionInfo>,
    change_callback: Option<SelectionChangeCallback>,
    suppress_callback: bool,
}

impl SelectionState {
    pub fn new(
        world: Rc<RefCell<dyn WorldObjects>>,
        highlighter: Rc<RefCell<dyn Highlighter>>,
    ) -> Self {
        Self {
            world,
            highlighter,
            selection: Vec::new(),
            change_callback: None,
            suppress_callback: false,
        }
    }

    /// Register the selection-change callback (for undo recording).
    pub fn set_change_callback(&mut self, callback: SelectionChangeCallback) {
        self.change_callback = Some(callback);
    }

    /// Suppress the change callback, e.g. while undo/redo replays
    /// selection changes.
    pub fn set_suppress_callback(&mut self, suppress: bool) {
        self.suppress_callback = suppress;
    }

    /// Full selection entries, in selection order.
    pub fn infos(&self) -> &[SelectionInfo] {
        &self.selection
    }

    fn info_for(&self, id: ObjectId) -> Option<SelectionInfo> {
        self.world
            .borrow()
            .transform_of(id)
            .map(|transform| SelectionInfo {
                id,
                transform_at_selection: transform,
            })
    }

    fn notify(&mut self, old: Vec<SelectionInfo>) {
        if self.suppress_callback {
            return;
        }
        if old == self.selection {
            return;
        }
        if let Some(callback) = &mut self.change_callback {
            callback(&old, &self.selection);
        }
    }
}

impl Selection for SelectionState {
    fn set_single(&mut self, id: ObjectId) {
        let old = self.selection.clone();
        {
            let mut highlighter = self.highlighter.borrow_mut();
            for info in &self.selection {
                highlighter.unhighlight(info.id);
            }
        }
        self.selection.clear();
        match self.info_for(id) {
            Some(info) => {
                self.highlighter.borrow_mut().highlight(id, SELECTED_COLOR);
                self.selection.push(info);
                log::info!("SelectionState: single-selected {id}");
            }
            None => log::warn!("SelectionState: cannot select {id}, object not live"),
        }
        self.notify(old);
    }

    fn add(&mut self, id: ObjectId) {
        if self.is_selected(id) {
            return;
        }
        match self.info_for(id) {
            Some(info) => {
                let old = self.selection.clone();
                self.highlighter.borrow_mut().highlight(id, SELECTED_COLOR);
                self.selection.push(info);
                log::info!(
                    "SelectionState: added {id} to selection ({} total)",
                    self.selection.len()
                );
                self.notify(old);
            }
            None => log::warn!("SelectionState: cannot add {id}, object not live"),
        }
    }

    fn remove(&mut self, id: ObjectId) {
        let Some(pos) = self.selection.iter().position(|info| info.id == id) else {
            return;
        };
        let old = self.selection.clone();
        self.selection.remove(pos);
        self.highlighter.borrow_mut().unhighlight(id);
        log::info!(
            "SelectionState: removed {id} from selection ({} remain)",
            self.selection.len()
        );
        self.notify(old);
    }

    fn toggle(&mut self, id: ObjectId) {
        if self.is_selected(id) {
            self.remove(id);
        } else {
            self.add(id);
        }
    }

    fn clear(&mut self) {
        if self.selection.is_empty() {
            return;
        }
        let old = self.selection.clone();
        {
            let mut highlighter = self.highlighter.borrow_mut();
            for info in &self.selection {
                highlighter.unhighlight(info.id);
            }
        }
        self.selection.clear();
        log::info!("SelectionState: cleared selection");
        self.notify(old);
    }

    fn is_selected(&self, id: ObjectId) -> bool {
        self.selection.iter().any(|info| info.id == id)
    }

    fn is_empty(&self) -> bool {
        self.selection.is_empty()
    }

    fn count(&self) -> usize {
        self.selection.len()
    }

    fn first(&self) -> Option<ObjectId> {
        self.selection.first().map(|info| info.id)
    }

    fn ids(&self) -> Vec<ObjectId> {
        self.selection.iter().map(|info| info.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use vredit_core::math::{Transform, Vec3};

    #[derive(Default)]
    struct FakeWorld {
        objects: HashMap<ObjectId, Transform>,
    }

    impl WorldObjects for FakeWorld {
        fn is_valid(&self, id: ObjectId) -> bool {
            self.objects.contains_key(&id)
        }
        fn transform_of(&self, id: ObjectId) -> Option<Transform> {
            self.objects.get(&id).copied()
        }
        fn set_transform(&mut self, id: ObjectId, transform: Transform) -> bool {
            if let Some(slot) = self.objects.get_mut(&id) {
                *slot = transform;
                true
            } else {
                false
            }
        }
        fn objects_in_sphere(&self, center: Vec3, radius: f32) -> Vec<ObjectId> {
            let mut ids: Vec<ObjectId> = self
                .objects
                .iter()
                .filter(|(_, t)| (t.translation - center).norm() <= radius)
                .map(|(id, _)| *id)
                .collect();
            ids.sort();
            ids
        }
    }

    #[derive(Default)]
    struct FakeHighlighter {
        highlighted: Vec<ObjectId>,
    }

    impl Highlighter for FakeHighlighter {
        fn highlight(&mut self, id: ObjectId, _color: Color) {
            self.highlighted.push(id);
        }
        fn unhighlight(&mut self, id: ObjectId) {
            self.highlighted.retain(|h| *h != id);
        }
        fn unhighlight_all(&mut self) {
            self.highlighted.clear();
        }
    }

    const A: ObjectId = ObjectId(0xA);
    const B: ObjectId = ObjectId(0xB);

    fn fixture() -> (SelectionState, Rc<RefCell<FakeHighlighter>>) {
        let mut world = FakeWorld::default();
        world
            .objects
            .insert(A, Transform::from_translation(Vec3::new(1.0, 0.0, 0.0)));
        world
            .objects
            .insert(B, Transform::from_translation(Vec3::new(2.0, 0.0, 0.0)));
        let world = Rc::new(RefCell::new(world));
        let highlighter = Rc::new(RefCell::new(FakeHighlighter::default()));
        (
            SelectionState::new(world, highlighter.clone()),
            highlighter,
        )
    }

    #[test]
    fn set_single_replaces_previous_selection() {
        let (mut selection, highlighter) = fixture();
        selection.add(A);
        selection.set_single(B);
        assert_eq!(selection.ids(), vec![B]);
        assert_eq!(highlighter.borrow().highlighted, vec![B]);
    }

    #[test]
    fn toggle_adds_then_removes() {
        let (mut selection, highlighter) = fixture();
        selection.toggle(A);
        assert!(selection.is_selected(A));
        selection.toggle(A);
        assert!(selection.is_empty());
        assert!(highlighter.borrow().highlighted.is_empty());
    }

    #[test]
    fn add_is_idempotent_and_captures_transform() {
        let (mut selection, _) = fixture();
        selection.add(A);
        selection.add(A);
        assert_eq!(selection.count(), 1);
        assert_eq!(
            selection.infos()[0].transform_at_selection.translation,
            Vec3::new(1.0, 0.0, 0.0)
        );
    }

    #[test]
    fn stale_object_is_not_selected() {
        let (mut selection, _) = fixture();
        selection.add(ObjectId(0xDEAD));
        assert!(selection.is_empty());
    }

    #[test]
    fn clear_unhighlights_everything() {
        let (mut selection, highlighter) = fixture();
        selection.add(A);
        selection.add(B);
        selection.clear();
        assert!(selection.is_empty());
        assert!(highlighter.borrow().highlighted.is_empty());
    }

    #[test]
    fn change_callback_sees_old_and_new() {
        let (mut selection, _) = fixture();
        let changes: Rc<RefCell<Vec<(usize, usize)>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = changes.clone();
        selection.set_change_callback(Box::new(move |old, new| {
            sink.borrow_mut().push((old.len(), new.len()));
        }));

        selection.add(A);
        selection.add(B);
        selection.clear();
        assert_eq!(*changes.borrow(), vec![(0, 1), (1, 2), (2, 0)]);
    }

    #[test]
    fn suppressed_callback_stays_silent() {
        let (mut selection, _) = fixture();
        let calls = Rc::new(RefCell::new(0usize));
        let sink = calls.clone();
        selection.set_change_callback(Box::new(move |_, _| {
            *sink.borrow_mut() += 1;
        }));

        selection.set_suppress_callback(true);
        selection.add(A);
        selection.set_suppress_callback(false);
        selection.add(B);
        assert_eq!(*calls.borrow(), 1);
    }
}
