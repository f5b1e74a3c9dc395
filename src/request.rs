//! Effect requests handed to the predictor and the results it returns.

use std::ops::BitOr;

use bevy::math::DVec2;

use crate::types::{Agent, AgentId, Confidence};

/// Footprint of an effect.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EffectShape {
    /// Lands as a disc of the request radius.
    Circle,
    /// Sweeps a cone of total opening `angle` (radians) up to the range.
    Cone { angle: f64 },
    /// Travels as a band whose half-width is the request radius.
    Line,
}

/// Categories of bodies an effect can be stopped by.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CollisionMask(u8);

impl CollisionMask {
    pub const NONE: Self = Self(0);
    pub const MINIONS: Self = Self(1 << 0);
    pub const HEROES: Self = Self(1 << 1);
    pub const WALLS: Self = Self(1 << 2);

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for CollisionMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Reasons a request is rejected before any prediction happens.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RequestError {
    #[error("effect origin is not finite: {0:?}")]
    NonFiniteOrigin(DVec2),
    #[error("range must be non-negative, got {0}")]
    NegativeRange(f64),
    #[error("delay must be finite and non-negative, got {0}")]
    InvalidDelay(f64),
    #[error("radius must be finite and non-negative, got {0}")]
    InvalidRadius(f64),
    #[error("speed must be positive, got {0}")]
    InvalidSpeed(f64),
    #[error("cone angle must lie in (0, π), got {0}")]
    InvalidConeAngle(f64),
}

/// Everything the predictor needs to know about one effect aimed at one
/// target.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectRequest {
    pub target: AgentId,
    /// Agent launching the effect; its bounding radius shifts the origin.
    pub caster: Option<AgentId>,
    /// Launch point.
    pub origin: DVec2,
    /// Point range limits are measured from; defaults to `origin`.
    pub range_origin: Option<DVec2>,
    /// Maximum range, `f64::INFINITY` for unbounded.
    pub range: f64,
    /// Seconds between the decision and the effect leaving the origin.
    pub delay: f64,
    pub radius: f64,
    /// Travel speed, `f64::INFINITY` for delay-only effects.
    pub speed: f64,
    pub shape: EffectShape,
    /// Search for a launch point hitting several agents at once.
    pub area: bool,
    /// Obstacles that stop the effect; empty skips collision checks.
    pub collision: CollisionMask,
    /// Add the target's bounding radius to the effect radius.
    pub use_bounding_radius: bool,
}

impl EffectRequest {
    /// An instant, unbounded circle effect with no delay or radius.
    pub fn new(target: AgentId, origin: DVec2) -> Self {
        Self {
            target,
            caster: None,
            origin,
            range_origin: None,
            range: f64::INFINITY,
            delay: 0.0,
            radius: 1.0,
            speed: f64::INFINITY,
            shape: EffectShape::Circle,
            area: false,
            collision: CollisionMask::NONE,
            use_bounding_radius: true,
        }
    }

    pub fn with_caster(mut self, caster: AgentId) -> Self {
        self.caster = Some(caster);
        self
    }

    pub fn with_range(mut self, range: f64) -> Self {
        self.range = range;
        self
    }

    pub fn with_range_origin(mut self, range_origin: DVec2) -> Self {
        self.range_origin = Some(range_origin);
        self
    }

    pub fn with_delay(mut self, delay: f64) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_shape(mut self, shape: EffectShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_area(mut self, area: bool) -> Self {
        self.area = area;
        self
    }

    pub fn with_collision(mut self, collision: CollisionMask) -> Self {
        self.collision = collision;
        self
    }

    pub fn with_bounding_radius(mut self, use_bounding_radius: bool) -> Self {
        self.use_bounding_radius = use_bounding_radius;
        self
    }

    /// Point range checks are measured from.
    pub fn range_check_origin(&self) -> DVec2 {
        self.range_origin.unwrap_or(self.origin)
    }

    pub fn has_finite_range(&self) -> bool {
        self.range.is_finite()
    }

    pub fn is_instant(&self) -> bool {
        self.speed.is_infinite()
    }

    /// Effect radius including the target's body when requested.
    pub fn effective_radius(&self, target: &Agent) -> f64 {
        if self.use_bounding_radius {
            self.radius + target.bounding_radius
        } else {
            self.radius
        }
    }

    /// The same effect aimed at another agent.
    pub fn retargeted(&self, target: AgentId) -> Self {
        Self {
            target,
            ..self.clone()
        }
    }

    /// Check the numeric fields for values no prediction can work with.
    pub fn validate(&self) -> Result<(), RequestError> {
        if !self.origin.is_finite() {
            return Err(RequestError::NonFiniteOrigin(self.origin));
        }
        if let Some(range_origin) = self.range_origin
            && !range_origin.is_finite()
        {
            return Err(RequestError::NonFiniteOrigin(range_origin));
        }
        if self.range.is_nan() || self.range < 0.0 {
            return Err(RequestError::NegativeRange(self.range));
        }
        if !self.delay.is_finite() || self.delay < 0.0 {
            return Err(RequestError::InvalidDelay(self.delay));
        }
        if !self.radius.is_finite() || self.radius < 0.0 {
            return Err(RequestError::InvalidRadius(self.radius));
        }
        if self.speed.is_nan() || self.speed <= 0.0 {
            return Err(RequestError::InvalidSpeed(self.speed));
        }
        if let EffectShape::Cone { angle } = self.shape
            && !(angle > 0.0 && angle < std::f64::consts::PI)
        {
            return Err(RequestError::InvalidConeAngle(angle));
        }
        Ok(())
    }
}

/// Something standing between the origin and the target.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Obstacle {
    Agent(AgentId),
    /// A deflecting wall, identified by its name.
    Wall(String),
}

/// Outcome of one prediction. Always fully populated: unset positions fall
/// back to the target's position at call time.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectResult {
    pub target: AgentId,
    pub(crate) predicted_position: Option<DVec2>,
    pub(crate) cast_position: Option<DVec2>,
    pub(crate) anchor: DVec2,
    pub confidence: Confidence,
    /// Obstacles found between the origin and the target.
    pub collisions: Vec<Obstacle>,
    /// Agents an area placement is expected to hit.
    pub hits: Vec<AgentId>,
    pub(crate) hit_count: usize,
}

impl EffectResult {
    /// A result carrying no prediction, anchored at `anchor`.
    pub fn unresolved(target: AgentId, anchor: DVec2, confidence: Confidence) -> Self {
        Self {
            target,
            predicted_position: None,
            cast_position: None,
            anchor,
            confidence,
            collisions: Vec::new(),
            hits: Vec::new(),
            hit_count: 0,
        }
    }

    /// Where the target is expected to be when the effect arrives.
    pub fn predicted_position(&self) -> DVec2 {
        self.predicted_position.unwrap_or(self.anchor)
    }

    /// Where the effect should be launched at.
    pub fn cast_position(&self) -> DVec2 {
        self.cast_position.unwrap_or(self.anchor)
    }

    /// Whether a prediction step produced explicit positions.
    pub fn is_resolved(&self) -> bool {
        self.predicted_position.is_some()
    }

    /// Number of agents expected to be hit.
    pub fn hit_count(&self) -> usize {
        self.hit_count.max(self.hits.len())
    }
}
