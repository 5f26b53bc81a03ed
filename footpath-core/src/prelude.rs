// Re-export key components
pub use crate::config::{FootpathConfig, PatchConfig, RepairConfig, RouteConfig};
pub use crate::loading::{BuildStats, PathFeature, build_footpath_graph, load_footpaths_geojson};
pub use crate::model::{FootpathGraph, QueryGraph};
pub use crate::routing::{
    Route, RouteProgress, TourRoute, find_route, find_routes_one_to_many, find_tour,
    route_progress,
};

// Core types
pub use crate::Error;
pub use crate::LatLng;
pub use crate::Meters;
pub use crate::NodeId;
