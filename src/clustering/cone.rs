//! Conical placement: aim at the midpoint of a candidate pair.

use bevy::math::DVec2;

use crate::geometry::cone_contains;

use super::{Cluster, Placement};

/// Best aim found so far.
struct Aim {
    direction: DVec2,
    covers_primary: bool,
    hits: Vec<usize>,
}

impl Aim {
    fn beats(&self, other: &Aim) -> bool {
        (self.covers_primary, self.hits.len()) > (other.covers_primary, other.hits.len())
    }
}

pub fn place(cluster: &Cluster<'_>, angle: f64) -> Option<Placement> {
    let origin = cluster.request.origin;
    let range = cluster.request.range;
    let relative: Vec<DVec2> = cluster
        .candidates
        .iter()
        .map(|c| c.position - origin)
        .collect();

    let mut best: Option<Aim> = None;
    for direction in aim_candidates(&relative) {
        let hits: Vec<usize> = relative
            .iter()
            .enumerate()
            .filter(|(_, p)| cone_contains(direction, angle, range, **p))
            .map(|(i, _)| i)
            .collect();
        let aim = Aim {
            direction,
            covers_primary: hits.first() == Some(&0),
            hits,
        };
        if best.as_ref().is_none_or(|b| aim.beats(b)) {
            best = Some(aim);
        }
    }

    let best = best?;
    if !best.covers_primary
        || best.hits.len() < 2
        || best.direction.length() <= cluster.settings.cone_min_aim_distance
    {
        return None;
    }
    Some(Placement {
        cast_position: origin + best.direction,
        hits: best.hits.iter().map(|&i| cluster.candidates[i].id).collect(),
    })
}

/// Midpoints of every distinct candidate pair, pairs with the primary
/// first, without duplicates.
fn aim_candidates(relative: &[DVec2]) -> Vec<DVec2> {
    let mut aims: Vec<DVec2> = Vec::new();
    for (i, a) in relative.iter().enumerate() {
        for b in relative.iter().skip(i + 1) {
            let mid = (*a + *b) * 0.5;
            if !aims.contains(&mid) {
                aims.push(mid);
            }
        }
    }
    aims
}
