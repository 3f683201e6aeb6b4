//! Undo history for completed edits.
//!
//! A linear command stack of [`EditAction`] trait objects. Placements are
//! recorded after the fact — the movement already happened on the world —
//! so [`ActionHistory::record`] pushes without applying; `undo`/`redo`
//! replay the stored transforms against the world trait. Recording a new
//! action discards the redo branch.
//!
//! Stale objects are tolerated everywhere: an object that unloaded between
//! recording and undo is skipped with a warning, never an error.

use std::collections::VecDeque;

use vredit_core::math::Transform;
use vredit_core::object::ObjectId;
use vredit_core::world::WorldObjects;

/// Default maximum number of undo steps.
pub const DEFAULT_MAX_UNDO: usize = 100;

/// A reversible, replayable edit.
pub trait EditAction {
    /// Reapply the edit (redo direction).
    fn apply(&mut self, world: &mut dyn WorldObjects);

    /// Reverse the edit.
    fn undo(&mut self, world: &mut dyn WorldObjects);

    /// Short human-readable description for logs and edit menus.
    fn description(&self) -> &str;
}

/// Bounded undo/redo stack.
///
/// The undo stack drops its oldest entry past `max_undo`; the redo stack
/// can never outgrow what was undone.
pub struct ActionHistory {
    undo_stack: VecDeque<Box<dyn EditAction>>,
    redo_stack: Vec<Box<dyn EditAction>>,
    max_undo: usize,
}

impl ActionHistory {
    pub fn new(max_undo: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_undo,
        }
    }

    /// Push an already-applied action onto the undo stack, discarding the
    /// redo branch.
    pub fn record(&mut self, action: Box<dyn EditAction>) {
        log::debug!("ActionHistory: recorded '{}'", action.description());
        self.redo_stack.clear();
        self.undo_stack.push_back(action);
        if self.undo_stack.len() > self.max_undo {
            self.undo_stack.pop_front();
        }
    }

    /// Undo the most recent action. Returns `false` when there is nothing
    /// to undo.
    pub fn undo(&mut self, world: &mut dyn WorldObjects) -> bool {
        let mut action = match self.undo_stack.pop_back() {
            Some(action) => action,
            None => {
                log::trace!("ActionHistory: nothing to undo");
                return false;
            }
        };
        action.undo(world);
        log::info!("ActionHistory: undid '{}'", action.description());
        self.redo_stack.push(action);
        true
    }

    /// Redo the most recently undone action. Returns `false` when there is
    /// nothing to redo.
    pub fn redo(&mut self, world: &mut dyn WorldObjects) -> bool {
        let mut action = match self.redo_stack.pop() {
            Some(action) => action,
            None => {
                log::trace!("ActionHistory: nothing to redo");
                return false;
            }
        };
        action.apply(world);
        log::info!("ActionHistory: redid '{}'", action.description());
        self.undo_stack.push_back(action);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }
}

impl Default for ActionHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UNDO)
    }
}

/// One object moved by a placement.
#[derive(Debug, Clone, Copy)]
pub struct PlacedObject {
    pub id: ObjectId,
    pub old_transform: Transform,
    pub new_transform: Transform,
}

/// A finalized placement of one or more objects.
pub struct PlacementAction {
    objects: Vec<PlacedObject>,
    description: String,
}

impl PlacementAction {
    pub fn new(objects: Vec<PlacedObject>) -> Self {
        let description = if objects.len() == 1 {
            format!("Move {}", objects[0].id)
        } else {
            format!("Move {} objects", objects.len())
        };
        Self {
            objects,
            description,
        }
    }

    pub fn objects(&self) -> &[PlacedObject] {
        &self.objects
    }
}

impl EditAction for PlacementAction {
    fn apply(&mut self, world: &mut dyn WorldObjects) {
        for object in &self.objects {
            if !world.set_transform(object.id, object.new_transform) {
                log::warn!("PlacementAction: {} no longer live, skipping redo", object.id);
            }
        }
    }

    fn undo(&mut self, world: &mut dyn WorldObjects) {
        for object in &self.objects {
            if !world.set_transform(object.id, object.old_transform) {
                log::warn!("PlacementAction: {} no longer live, skipping undo", object.id);
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }
}
