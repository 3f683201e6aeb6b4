//! Candidate population for the selection modes.
//!
//! [`RaySelectionScanner`] feeds the single-object hover tracker from a
//! ray cast along the right hand's aim; [`SphereSelectionScanner`] feeds
//! the volume tracker from a sphere containment query ahead of the hand.
//! All trigger and timing logic lives in the state controller; these only
//! decide what is currently hoverable.

use std::cell::RefCell;
use std::rc::Rc;

use vredit_core::config::{keys, ConfigStore};
use vredit_core::input::Hand;
use vredit_core::world::{RayCaster, VrPoses, WorldObjects};

use crate::frame::FrameUpdateListener;
use crate::hover::{HoverTracker, SphereHoverTracker};

/// Default maximum ray-selection distance, in game units.
pub const DEFAULT_MAX_RAY_DISTANCE: f32 = 2000.0;

/// Default volume-selection sphere radius, in game units.
pub const DEFAULT_SPHERE_RADIUS: f32 = 150.0;

/// How far ahead of the hand the selection sphere sits.
pub const SPHERE_FORWARD_OFFSET: f32 = 100.0;

/// Per-frame ray cast along the hand aim, feeding the hover tracker.
pub struct RaySelectionScanner {
    active: bool,
    max_distance: f32,
    poses: Rc<dyn VrPoses>,
    raycaster: Rc<dyn RayCaster>,
    hover: Rc<RefCell<HoverTracker>>,
}

impl RaySelectionScanner {
    pub fn new(
        poses: Rc<dyn VrPoses>,
        raycaster: Rc<dyn RayCaster>,
        hover: Rc<RefCell<HoverTracker>>,
        config: &dyn ConfigStore,
    ) -> Self {
        Self {
            active: false,
            max_distance: config.get_f32(keys::MAX_RAY_DISTANCE, DEFAULT_MAX_RAY_DISTANCE),
            poses,
            raycaster,
            hover,
        }
    }

    pub fn start(&mut self) {
        if self.active {
            return;
        }
        self.active = true;
        log::debug!("RaySelectionScanner: started");
    }

    /// Stop scanning; clears the hover tracker.
    pub fn stop(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.hover.borrow_mut().clear();
        log::debug!("RaySelectionScanner: stopped");
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl FrameUpdateListener for RaySelectionScanner {
    fn on_frame_update(&mut self, delta_time: f32) {
        if !self.active {
            return;
        }
        let hit = self.poses.hand_aim(Hand::Right).and_then(|ray| {
            self.raycaster
                .cast_ray(ray.origin, ray.direction, self.max_distance)
        });
        let target = hit.and_then(|h| h.object.map(|id| (id, h.point)));

        let mut hover = self.hover.borrow_mut();
        hover.set_pending(target);
        hover.update(delta_time);
    }
}

/// Per-frame sphere containment query, feeding the volume hover tracker.
pub struct SphereSelectionScanner {
    active: bool,
    radius: f32,
    forward_offset: f32,
    poses: Rc<dyn VrPoses>,
    world: Rc<RefCell<dyn WorldObjects>>,
    sphere_hover: Rc<RefCell<SphereHoverTracker>>,
}

impl SphereSelectionScanner {
    pub fn new(
        poses: Rc<dyn VrPoses>,
        world: Rc<RefCell<dyn WorldObjects>>,
        sphere_hover: Rc<RefCell<SphereHoverTracker>>,
        config: &dyn ConfigStore,
    ) -> Self {
        Self {
            active: false,
            radius: config.get_f32(keys::SPHERE_RADIUS, DEFAULT_SPHERE_RADIUS),
            forward_offset: SPHERE_FORWARD_OFFSET,
            poses,
            world,
            sphere_hover,
        }
    }

    pub fn start(&mut self) {
        if self.active {
            return;
        }
        self.active = true;
        log::debug!("SphereSelectionScanner: started");
    }

    /// Stop scanning; clears the volume hover tracker.
    pub fn stop(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.sphere_hover.borrow_mut().clear();
        log::debug!("SphereSelectionScanner: stopped");
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl FrameUpdateListener for SphereSelectionScanner {
    fn on_frame_update(&mut self, _delta_time: f32) {
        if !self.active {
            return;
        }
        let ray = match self.poses.hand_aim(Hand::Right) {
            Some(ray) => ray,
            None => return,
        };
        let center = ray.origin + ray.direction * self.forward_offset;
        let objects = self.world.borrow().objects_in_sphere(center, self.radius);
        self.sphere_hover.borrow_mut().set_hovered(objects);
    }
}
