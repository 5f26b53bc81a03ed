//! Footpath graph construction and walking route queries.
//!
//! A [`FootpathGraph`] is built once from raw path polylines, repaired so that
//! small real-world gaps are bridged, and then shared read-only between any
//! number of route queries. Every query works on its own [`QueryGraph`] copy,
//! so snapping and heuristic patching never leak into the durable graph.

pub mod config;
mod error;
pub mod geometry;
pub mod loading;
pub mod model;
pub mod prelude;
pub mod routing;

pub use config::{FootpathConfig, PatchConfig, RepairConfig, RouteConfig};
pub use error::Error;
pub use geometry::{LatLng, bearing_degrees, haversine_meters, project_point_onto_segment};
pub use loading::{
    BuildStats, GraphBuilder, PathFeature, build_footpath_graph, load_footpaths_geojson,
    parse_footpaths_geojson,
};
pub use model::{Edge, EdgeKind, FootpathGraph, Node, QueryGraph, Segment};
pub use routing::{
    FallbackReason, QueryStats, Route, RouteProgress, SnapResult, TourRoute, find_route,
    find_routes_one_to_many, find_tour, route_progress, snap_point,
};

/// Dense node identifier, equal to the node's index in the graph
pub type NodeId = usize;

/// Distance along the ground, in meters
pub type Meters = f64;

/// Mean Earth radius used by every distance computation
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;
