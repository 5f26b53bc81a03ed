//! R-tree over graph nodes.
//!
//! Nodes are stored as unit vectors on the sphere. The straight-line chord
//! between two unit vectors grows monotonically with their great-circle
//! angle, so a chord radius query returns exactly the nodes inside a
//! haversine radius, and nearest-by-chord is nearest-by-haversine.

use rstar::{RTree, primitives::GeomWithData};

use crate::{EARTH_RADIUS_M, LatLng, Meters, NodeId, haversine_meters};

type IndexedNode = GeomWithData<[f64; 3], NodeId>;

/// Relative slack on chord radius queries so boundary nodes survive rounding
const RADIUS_SLACK: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct SpatialIndex {
    tree: RTree<IndexedNode>,
    len: usize,
}

impl SpatialIndex {
    /// Builds an index over `positions`, with node ids equal to slice indices
    pub fn new(positions: &[LatLng]) -> Self {
        let items = positions
            .iter()
            .enumerate()
            .map(|(id, p)| IndexedNode::new(to_unit_vector(*p), id))
            .collect();

        Self {
            tree: RTree::bulk_load(items),
            len: positions.len(),
        }
    }

    /// Number of nodes covered; ids at or above this were added later
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Nearest indexed node
    pub fn nearest(&self, point: LatLng) -> Option<NodeId> {
        self.tree
            .nearest_neighbor(&to_unit_vector(point))
            .map(|item| item.data)
    }

    /// Indexed nodes whose chord puts them within `radius` meters of `point`.
    ///
    /// Callers still confirm the haversine distance; the slack admits a few
    /// nodes sitting exactly on the boundary.
    pub fn within(&self, point: LatLng, radius: Meters) -> impl Iterator<Item = NodeId> + '_ {
        let chord = chord_for_meters(radius) * (1.0 + RADIUS_SLACK);
        self.tree
            .locate_within_distance(to_unit_vector(point), chord * chord)
            .map(|item| item.data)
    }
}

fn to_unit_vector(p: LatLng) -> [f64; 3] {
    let (lat, lng) = (p.lat.to_radians(), p.lng.to_radians());
    [lat.cos() * lng.cos(), lat.cos() * lng.sin(), lat.sin()]
}

fn chord_for_meters(meters: Meters) -> f64 {
    let angle = (meters.max(0.0) / EARTH_RADIUS_M).min(std::f64::consts::PI);
    2.0 * (angle / 2.0).sin()
}

/// Haversine distance check shared by index users
pub(crate) fn within_radius(a: LatLng, b: LatLng, radius: Meters) -> Option<Meters> {
    let d = haversine_meters(a, b);
    (d <= radius).then_some(d)
}
