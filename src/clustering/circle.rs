//! Circular placement: the smallest circle around the candidates, dropping
//! outliers until it fits the effect.

use crate::geometry::min_enclosing_circle;

use super::{Cluster, Placement};

pub fn place(cluster: &Cluster<'_>) -> Option<Placement> {
    let primary = cluster.primary_candidate();
    let fit = cluster.request.effective_radius(cluster.primary) - cluster.settings.circle_slack;
    let range_origin = cluster.request.range_check_origin();
    let range = cluster.request.range;

    let mut remaining = cluster.candidates.clone();
    while remaining.len() > 1 {
        let points: Vec<_> = remaining.iter().map(|c| c.position).collect();
        let circle = min_enclosing_circle(&points)?;
        if circle.radius <= fit && circle.center.distance_squared(range_origin) <= range * range {
            return Some(Placement {
                cast_position: circle.center,
                hits: remaining.iter().map(|c| c.id).collect(),
            });
        }

        // The primary sits at distance zero from itself, so it is never
        // the one dropped.
        let farthest = remaining
            .iter()
            .enumerate()
            .skip(1)
            .max_by(|(_, a), (_, b)| {
                let da = a.position.distance_squared(primary.position);
                let db = b.position.distance_squared(primary.position);
                da.total_cmp(&db)
            })
            .map(|(i, _)| i)?;
        remaining.remove(farthest);
    }
    None
}
