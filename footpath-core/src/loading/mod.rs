//! This module is responsible for turning raw path geometry into a repaired,
//! routable footpath graph.

mod builder;
mod geojson_source;
mod repair;

pub use builder::{BuildStats, GraphBuilder, PathFeature, build_footpath_graph};
pub use geojson_source::{load_footpaths_geojson, parse_footpaths_geojson};
pub use repair::RepairReport;
