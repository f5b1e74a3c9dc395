//! Planar geometry used by the predictor and the area clusterer.
//!
//! Everything works on `DVec2` in world units. Functions that can degenerate
//! (zero-length segments, parallel lines, non-real roots) return `None`
//! instead of producing NaN or infinite coordinates.

use bevy::math::DVec2;

/// Tolerance below which lengths, determinants and quadratic coefficients
/// are treated as zero.
pub const EPSILON: f64 = 1e-9;

/// Total length of a polyline.
pub fn path_length(path: &[DVec2]) -> f64 {
    path.windows(2).map(|w| w[0].distance(w[1])).sum()
}

/// Drop the first `distance` units of a polyline.
///
/// A negative distance extends the first segment backwards instead. Cutting
/// more than the whole length leaves only the final point.
pub fn cut_path(path: &[DVec2], distance: f64) -> Vec<DVec2> {
    let Some(&last) = path.last() else {
        return Vec::new();
    };

    if distance < 0.0 {
        let mut extended = path.to_vec();
        if path.len() > 1 {
            let direction = (path[1] - path[0]).normalize_or_zero();
            extended[0] = path[0] + direction * distance;
        }
        return extended;
    }

    let mut remaining = distance;
    for i in 0..path.len().saturating_sub(1) {
        let (a, b) = (path[i], path[i + 1]);
        let segment = a.distance(b);
        if segment > remaining {
            let mut cut = Vec::with_capacity(path.len() - i);
            cut.push(a + (b - a).normalize_or_zero() * remaining);
            cut.extend_from_slice(&path[i + 1..]);
            return cut;
        }
        remaining -= segment;
    }

    vec![last]
}

/// Rotate a vector counter-clockwise by `angle` radians.
pub fn rotated(v: DVec2, angle: f64) -> DVec2 {
    let (sin, cos) = angle.sin_cos();
    DVec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Unsigned angle between two vectors in degrees; zero if either is null.
pub fn angle_between_degrees(a: DVec2, b: DVec2) -> f64 {
    let lengths = a.length() * b.length();
    if lengths < EPSILON {
        return 0.0;
    }
    (a.dot(b) / lengths).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Projection of a point onto the line through `a` and `b`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    /// Closest point on the infinite line.
    pub line_point: DVec2,
    /// Closest point on the segment `a..b`.
    pub segment_point: DVec2,
    /// Whether the line projection falls within the segment.
    pub is_on_segment: bool,
}

pub fn project_on(point: DVec2, a: DVec2, b: DVec2) -> Projection {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < EPSILON {
        return Projection {
            line_point: a,
            segment_point: a,
            is_on_segment: true,
        };
    }

    let t = (point - a).dot(ab) / len_sq;
    let line_point = a + ab * t;
    let is_on_segment = (0.0..=1.0).contains(&t);
    Projection {
        line_point,
        segment_point: if is_on_segment {
            line_point
        } else if t < 0.0 {
            a
        } else {
            b
        },
        is_on_segment,
    }
}

/// Squared distance from `point` to the segment `a..b`.
pub fn segment_distance_squared(point: DVec2, a: DVec2, b: DVec2) -> f64 {
    point.distance_squared(project_on(point, a, b).segment_point)
}

/// Intersection point of segments `a1..a2` and `b1..b2`, if they cross.
pub fn segment_intersection(a1: DVec2, a2: DVec2, b1: DVec2, b2: DVec2) -> Option<DVec2> {
    let r = a2 - a1;
    let s = b2 - b1;
    let denom = r.perp_dot(s);
    if denom.abs() < EPSILON {
        return None;
    }

    let offset = b1 - a1;
    let t = offset.perp_dot(s) / denom;
    let u = offset.perp_dot(r) / denom;
    ((0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u)).then(|| a1 + r * t)
}

/// The two intersection points of two circles, if they intersect in two
/// points (tangency and containment return `None`).
pub fn circle_circle_intersection(
    c1: DVec2,
    c2: DVec2,
    r1: f64,
    r2: f64,
) -> Option<[DVec2; 2]> {
    let delta = c2 - c1;
    let d = delta.length();
    if d < EPSILON || d >= r1 + r2 || d <= (r1 - r2).abs() {
        return None;
    }

    let a = (r1 * r1 - r2 * r2 + d * d) / (2.0 * d);
    let h = (r1 * r1 - a * a).max(0.0).sqrt();
    let base = c1 + delta * (a / d);
    let offset = delta.perp() * (h / d);
    Some([base + offset, base - offset])
}

/// A circle in the plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    pub center: DVec2,
    pub radius: f64,
}

impl Circle {
    fn from_diameter(a: DVec2, b: DVec2) -> Self {
        Self {
            center: (a + b) * 0.5,
            radius: a.distance(b) * 0.5,
        }
    }

    fn circumscribing(a: DVec2, b: DVec2, c: DVec2) -> Self {
        let ab = b - a;
        let ac = c - a;
        let det = 2.0 * ab.perp_dot(ac);
        if det.abs() < EPSILON {
            // Collinear: the widest pair spans the circle.
            return [
                Self::from_diameter(a, b),
                Self::from_diameter(a, c),
                Self::from_diameter(b, c),
            ]
            .into_iter()
            .fold(Self::from_diameter(a, b), |best, candidate| {
                if candidate.radius > best.radius {
                    candidate
                } else {
                    best
                }
            });
        }

        let ab_sq = ab.length_squared();
        let ac_sq = ac.length_squared();
        let offset = DVec2::new(
            ac.y * ab_sq - ab.y * ac_sq,
            ab.x * ac_sq - ac.x * ab_sq,
        ) / det;
        Self {
            center: a + offset,
            radius: offset.length(),
        }
    }

    pub fn contains(&self, point: DVec2) -> bool {
        self.center.distance(point) <= self.radius + 1e-7
    }
}

/// Smallest circle enclosing every point (incremental Welzl construction).
pub fn min_enclosing_circle(points: &[DVec2]) -> Option<Circle> {
    let (&first, _) = points.split_first()?;
    let mut circle = Circle {
        center: first,
        radius: 0.0,
    };

    for i in 1..points.len() {
        if circle.contains(points[i]) {
            continue;
        }
        circle = Circle {
            center: points[i],
            radius: 0.0,
        };
        for j in 0..i {
            if circle.contains(points[j]) {
                continue;
            }
            circle = Circle::from_diameter(points[i], points[j]);
            for k in 0..j {
                if !circle.contains(points[k]) {
                    circle = Circle::circumscribing(points[i], points[j], points[k]);
                }
            }
        }
    }

    Some(circle)
}

/// Whether `point` (relative to the cone apex) lies strictly inside a cone
/// aimed along `aim` with total opening `angle` radians and length `range`.
pub fn cone_contains(aim: DVec2, angle: f64, range: f64, point: DVec2) -> bool {
    let edge1 = rotated(aim, -angle / 2.0);
    let edge2 = rotated(edge1, angle);
    point.length_squared() < range * range
        && edge1.perp_dot(point) > 0.0
        && point.perp_dot(edge2) > 0.0
}

/// Earliest meeting of a mover and a projectile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Intercept {
    /// Time since launch, in seconds.
    pub time: f64,
    pub position: DVec2,
}

/// Solve where a projectile launched from `shooter` at `shot_speed` meets a
/// mover that starts at `mover_start` and heads to `mover_end` at
/// `mover_speed`.
///
/// The mover's position at time `t` is `mover_start + v·t`; the projectile
/// covers `shot_speed·t`. Solves `|v·t − r|² = w²·t²` with `r = shooter −
/// mover_start` and returns the earliest strictly positive root no earlier
/// than `min_time`. Degenerate cases (zero-length segment, no real root,
/// non-finite inputs) yield `None`.
pub fn solve_intercept(
    mover_start: DVec2,
    mover_end: DVec2,
    mover_speed: f64,
    shooter: DVec2,
    shot_speed: f64,
    min_time: f64,
) -> Option<Intercept> {
    let heading = mover_end - mover_start;
    let length = heading.length();
    if length < EPSILON || !mover_speed.is_finite() || mover_speed < 0.0 {
        return None;
    }

    let velocity = heading / length * mover_speed;
    let at = |time: f64| Intercept {
        time,
        position: mover_start + velocity * time,
    };

    if shot_speed.is_infinite() {
        return (min_time > 0.0).then(|| at(min_time));
    }
    if shot_speed.is_nan() || shot_speed <= 0.0 {
        return None;
    }

    let r = shooter - mover_start;
    let a = velocity.length_squared() - shot_speed * shot_speed;
    let half_b = -r.dot(velocity);
    let c = r.length_squared();
    let accept = |t: f64| t.is_finite() && t > 0.0 && t >= min_time;

    let time = if a.abs() < EPSILON {
        if half_b.abs() < EPSILON {
            None
        } else {
            Some(-c / (2.0 * half_b)).filter(|&t| accept(t))
        }
    } else {
        let discriminant = half_b * half_b - a * c;
        if discriminant < 0.0 {
            None
        } else {
            // Cancellation-free form of the two roots.
            let q = -(half_b + discriminant.sqrt().copysign(half_b));
            if q == 0.0 {
                None
            } else {
                let (t1, t2) = (q / a, c / q);
                [t1.min(t2), t1.max(t2)].into_iter().find(|&t| accept(t))
            }
        }
    };

    time.map(at).filter(|i| i.position.is_finite())
}
