use std::any::Any;

use aurora_nwscript::{EngineType, EngineTypeKind, ObjectId, Variable};
use glam::Vec3;
use serde::Serialize;

/// A point in an area plus a facing, passed around by value.
///
/// The area is a back-reference only. Nothing keeps it alive, so anything
/// acting on a location must check the area is still loaded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Location {
    area: Option<ObjectId>,
    position: Vec3,
    facing: f32,
}

impl Default for Location {
    fn default() -> Self {
        Self {
            area: None,
            position: Vec3::ZERO,
            facing: 0.0,
        }
    }
}

impl Location {
    pub fn new(area: Option<ObjectId>, position: Vec3, facing: f32) -> Self {
        let area = area.filter(|id| id.is_valid());
        Self {
            area,
            position,
            facing,
        }
    }

    pub fn area(&self) -> Option<ObjectId> {
        self.area
    }

    pub fn set_area(&mut self, area: Option<ObjectId>) {
        self.area = area.filter(|id| id.is_valid());
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Facing in degrees.
    pub fn facing(&self) -> f32 {
        self.facing
    }

    pub fn set_facing(&mut self, facing: f32) {
        self.facing = facing;
    }

    /// Pull a location out of a script value, if it holds one.
    pub fn from_variable(value: &Variable) -> Option<Location> {
        let engine = value.as_engine_type().ok()??;
        if engine.kind() != EngineTypeKind::Location {
            return None;
        }
        engine.as_any().downcast_ref::<Location>().copied()
    }
}

impl EngineType for Location {
    fn kind(&self) -> EngineTypeKind {
        EngineTypeKind::Location
    }

    fn clone_box(&self) -> Box<dyn EngineType> {
        Box::new(*self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl From<Location> for Variable {
    fn from(location: Location) -> Self {
        Variable::engine(location)
    }
}
