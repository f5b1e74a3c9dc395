//! Linear placement: beams aimed straight at, or grazing, each candidate.

use bevy::math::DVec2;

use crate::geometry::{
    EPSILON, angle_between_degrees, circle_circle_intersection, project_on,
    segment_distance_squared,
};

use super::{Cluster, Placement};

pub fn place(cluster: &Cluster<'_>) -> Option<Placement> {
    let request = cluster.request;
    let origin = request.origin;
    let radius = request.radius;
    let primary = cluster.primary_candidate();
    let tight = radius + cluster.primary.bounding_radius / 3.0 - cluster.settings.line_primary_slack;
    if tight < 0.0 {
        return None;
    }

    let mut best: Option<(DVec2, Vec<usize>)> = None;
    for aim in cluster
        .candidates
        .iter()
        .flat_map(|c| aims_for(origin, c.position, radius, request.range))
    {
        if segment_distance_squared(primary.position, origin, aim) > tight * tight {
            continue;
        }
        let hits: Vec<usize> = cluster
            .candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| segment_distance_squared(c.position, origin, aim) <= radius * radius)
            .map(|(i, _)| i)
            .collect();
        if best.as_ref().is_none_or(|(_, b)| hits.len() > b.len()) {
            best = Some((aim, hits));
        }
    }

    let (aim, hits) = best?;
    if hits.len() < 2 {
        return None;
    }

    let points: Vec<DVec2> = hits.iter().map(|&i| cluster.candidates[i].position).collect();
    let mut cast_position = widest_pair(origin, aim, &points).unwrap_or(aim);
    let range_origin = request.range_check_origin();
    if request.has_finite_range() && cast_position.distance(range_origin) > request.range {
        cast_position = range_origin + (cast_position - range_origin).normalize_or_zero() * request.range;
    }

    Some(Placement {
        cast_position,
        hits: hits.iter().map(|&i| cluster.candidates[i].id).collect(),
    })
}

/// Aim points for one candidate: straight at it, then the two beams whose
/// edge just touches it. All are pushed out to `range`, or to the
/// candidate's distance for unbounded effects.
fn aims_for(origin: DVec2, candidate: DVec2, radius: f64, range: f64) -> Vec<DVec2> {
    let distance = origin.distance(candidate);
    if distance < EPSILON {
        return Vec::new();
    }
    let reach = if range.is_finite() { range } else { distance };
    let project = |point: DVec2| origin + (point - origin).normalize_or_zero() * reach;

    let mut aims = vec![project(candidate)];
    // Tangent points from the origin to the circle of `radius` around the
    // candidate lie on the circle over (origin, candidate) as diameter.
    let midpoint = (origin + candidate) * 0.5;
    if let Some(tangents) = circle_circle_intersection(candidate, midpoint, radius, distance * 0.5) {
        aims.extend(tangents.map(project));
    }
    aims
}

/// Midpoint of the two hit points farthest from the beam on opposite sides.
fn widest_pair(origin: DVec2, aim: DVec2, points: &[DVec2]) -> Option<DVec2> {
    let offsets: Vec<DVec2> = points
        .iter()
        .map(|&p| p - project_on(p, origin, aim).line_point)
        .collect();

    let mut best: Option<(f64, DVec2)> = None;
    for i in 0..points.len() {
        for j in i + 1..points.len() {
            if angle_between_degrees(offsets[i], offsets[j]) <= 90.0 {
                continue;
            }
            let spread = offsets[i].length_squared() + offsets[j].length_squared();
            if best.is_none_or(|(b, _)| spread > b) {
                best = Some((spread, (points[i] + points[j]) * 0.5));
            }
        }
    }
    best.map(|(_, midpoint)| midpoint)
}
