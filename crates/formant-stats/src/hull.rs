//! Convex hull of points in the plane

/// Indices of the points on the convex hull, counter-clockwise, starting
/// from the lowest-x (then lowest-y) point.
///
/// Non-finite points are ignored and collinear boundary points dropped.
/// With fewer than three distinct points every distinct point is returned.
pub fn convex_hull(points: &[(f64, f64)]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..points.len())
        .filter(|&i| points[i].0.is_finite() && points[i].1.is_finite())
        .collect();
    order.sort_by(|&a, &b| {
        points[a]
            .0
            .total_cmp(&points[b].0)
            .then(points[a].1.total_cmp(&points[b].1))
    });
    order.dedup_by(|a, b| points[*a] == points[*b]);

    if order.len() < 3 {
        return order;
    }

    let cross = |o: usize, a: usize, b: usize| {
        let (ox, oy) = points[o];
        let (ax, ay) = points[a];
        let (bx, by) = points[b];
        (ax - ox) * (by - oy) - (ay - oy) * (bx - ox)
    };

    let mut hull: Vec<usize> = Vec::with_capacity(order.len() * 2);
    for &i in &order {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], i) <= 0.0 {
            hull.pop();
        }
        hull.push(i);
    }
    let lower = hull.len() + 1;
    for &i in order.iter().rev().skip(1) {
        while hull.len() >= lower && cross(hull[hull.len() - 2], hull[hull.len() - 1], i) <= 0.0 {
            hull.pop();
        }
        hull.push(i);
    }
    hull.pop();
    hull
}
