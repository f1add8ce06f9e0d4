pub mod agitator;
pub mod chassis;

pub use agitator::{AgitatorConfig, VelocityAgitatorSubsystem};
pub use chassis::{ChassisConfig, ChassisSubsystem, WheelId};

use crate::requirements::{SubsystemId, SubsystemSet};
use core::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

/// Smallest unit of mutual exclusion: owns one piece of hardware-bound state.
///
/// The scheduler calls [`Subsystem::initialize`] once at registration and
/// [`Subsystem::refresh`] exactly once per tick afterwards, whether or not a
/// command is bound to it.
pub trait Subsystem {
    fn name(&self) -> &'static str;

    fn initialize(&mut self) {}

    /// Reads sensors, advances controllers, writes actuators, and updates the
    /// derived online/calibration flags.
    fn refresh(&mut self);

    fn is_online(&self) -> bool {
        true
    }

    /// Never true while offline.
    fn is_calibrated(&self) -> bool {
        self.is_online()
    }
}

/// Subsystem that tracks a setpoint and the integral of its measured value.
pub trait SetpointSubsystem: Subsystem {
    fn setpoint(&self) -> f32;
    fn set_setpoint(&mut self, setpoint: f32);
    fn current_value(&self) -> f32;
    /// Displacement from the calibrated zero, unwrapped across revolutions.
    fn current_value_integral(&self) -> f32;
    /// Captures the current position as zero. Fails while offline.
    fn calibrate_here(&mut self) -> bool;
    fn is_jammed(&self) -> bool;
    fn clear_jam(&mut self);
}

/// Typed, shared access to a registered subsystem.
///
/// Handed out by the scheduler on registration and cloned into every command
/// that needs the subsystem. The scheduler keeps its own type-erased clone
/// for refreshing.
pub struct SubsystemHandle<S: ?Sized> {
    id: SubsystemId,
    inner: Rc<RefCell<S>>,
}

impl<S: ?Sized> SubsystemHandle<S> {
    pub(crate) fn new(id: SubsystemId, inner: Rc<RefCell<S>>) -> Self {
        Self { id, inner }
    }

    pub fn id(&self) -> SubsystemId {
        self.id
    }

    /// Requirement set containing only this subsystem.
    pub fn requirement(&self) -> SubsystemSet {
        SubsystemSet::single(self.id)
    }

    pub fn borrow(&self) -> Ref<'_, S> {
        self.inner.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, S> {
        self.inner.borrow_mut()
    }
}

impl<S: ?Sized> Clone for SubsystemHandle<S> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: ?Sized> core::fmt::Debug for SubsystemHandle<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SubsystemHandle").field("id", &self.id).finish()
    }
}
