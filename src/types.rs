//! Core agent types and the confidence scale shared by every prediction stage.

use bevy::math::DVec2;

/// Stable identifier of an agent in the world snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AgentId(pub u32);

/// Team an agent fights for. Obstacles and area candidates are always taken
/// from the primary target's team.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Team {
    Order,
    Chaos,
    Neutral,
}

/// Broad category of an agent, used for collision filtering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AgentKind {
    /// Player-controlled champion.
    Hero,
    /// Lane or jungle minion.
    Minion,
    /// Anything else (wards, structures, pets).
    Other,
}

/// Kind of an active status effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatusKind {
    Stun,
    Snare,
    Charm,
    Knockup,
    Suppression,
    Slow,
    Silence,
    Haste,
}

impl StatusKind {
    /// Whether an agent carrying this status cannot move.
    pub fn blocks_movement(self) -> bool {
        matches!(
            self,
            StatusKind::Stun
                | StatusKind::Snare
                | StatusKind::Charm
                | StatusKind::Knockup
                | StatusKind::Suppression
        )
    }
}

/// A status effect with the simulation time (seconds) at which it ends.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StatusEffect {
    pub kind: StatusKind,
    pub end_time: f64,
}

impl StatusEffect {
    pub fn new(kind: StatusKind, end_time: f64) -> Self {
        Self { kind, end_time }
    }
}

/// Forced movement burst towards a fixed destination.
#[derive(Clone, Debug, PartialEq)]
pub struct Dash {
    /// Waypoints still ahead of the agent; the last one is the destination.
    pub path: Vec<DVec2>,
    /// Dash speed in units per second.
    pub speed: f64,
    /// Instantaneous relocation with no interceptable path.
    pub is_blink: bool,
}

impl Dash {
    pub fn new(path: Vec<DVec2>, speed: f64) -> Self {
        Self {
            path,
            speed,
            is_blink: false,
        }
    }

    pub fn blink(destination: DVec2) -> Self {
        Self {
            path: vec![destination],
            speed: f64::INFINITY,
            is_blink: true,
        }
    }

    /// Final point of the dash, if the descriptor carries any waypoint.
    pub fn end_point(&self) -> Option<DVec2> {
        self.path.last().copied()
    }
}

/// Read-only snapshot of a world entity, supplied by the host every tick.
#[derive(Clone, Debug, PartialEq)]
pub struct Agent {
    pub id: AgentId,
    pub kind: AgentKind,
    pub team: Team,
    pub position: DVec2,
    /// Nominal movement speed in units per second.
    pub move_speed: f64,
    pub bounding_radius: f64,
    pub is_valid: bool,
    pub is_alive: bool,
    pub is_targetable: bool,
    /// Mid-swing on an action that cannot be interrupted by movement.
    pub is_committed: bool,
    pub status_effects: Vec<StatusEffect>,
    /// Current waypoints, starting at the agent's position.
    pub path: Vec<DVec2>,
    pub dash: Option<Dash>,
}

impl Agent {
    /// Create a stationary, valid agent.
    pub fn new(id: AgentId, kind: AgentKind, team: Team, position: DVec2) -> Self {
        Self {
            id,
            kind,
            team,
            position,
            move_speed: 325.0,
            bounding_radius: 65.0,
            is_valid: true,
            is_alive: true,
            is_targetable: true,
            is_committed: false,
            status_effects: Vec::new(),
            path: vec![position],
            dash: None,
        }
    }

    pub fn with_move_speed(mut self, move_speed: f64) -> Self {
        self.move_speed = move_speed;
        self
    }

    pub fn with_bounding_radius(mut self, bounding_radius: f64) -> Self {
        self.bounding_radius = bounding_radius;
        self
    }

    /// Set the path to walk; the agent's position is prepended.
    pub fn moving_along(mut self, waypoints: &[DVec2]) -> Self {
        self.path = std::iter::once(self.position)
            .chain(waypoints.iter().copied())
            .collect();
        self
    }

    pub fn with_dash(mut self, dash: Dash) -> Self {
        self.dash = Some(dash);
        self
    }

    pub fn with_status(mut self, status: StatusEffect) -> Self {
        self.status_effects.push(status);
        self
    }

    /// Whether the agent can be targeted at all.
    pub fn is_valid_target(&self) -> bool {
        self.is_valid && self.is_alive && self.is_targetable && self.position.is_finite()
    }

    /// Seconds of remaining immobilization, or `None` when free to move.
    pub fn immobile_for(&self, now: f64) -> Option<f64> {
        self.status_effects
            .iter()
            .filter(|s| s.kind.blocks_movement() && s.end_time >= now)
            .map(|s| s.end_time - now)
            .fold(None, |acc: Option<f64>, remaining| {
                Some(acc.map_or(remaining, |a| a.max(remaining)))
            })
    }
}

/// How likely an effect is to land, ordered from worst to best.
///
/// `Dashing` and `Immobile` are terminal states of the special movement
/// branches; they compare above `VeryHigh` so any `>= High` threshold accepts
/// them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Confidence {
    #[default]
    Impossible,
    OutOfRange,
    Collision,
    Medium,
    High,
    VeryHigh,
    Dashing,
    Immobile,
}

impl Confidence {
    /// Lower the confidence to `cap` if it currently sits above it.
    pub fn downgraded_to(self, cap: Confidence) -> Confidence {
        self.min(cap)
    }
}
