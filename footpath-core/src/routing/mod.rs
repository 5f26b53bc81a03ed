//! Route queries over a footpath graph

pub mod dijkstra;
mod patch;
mod progress;
mod route;
mod snap;
mod tour;

pub use dijkstra::{ShortestPath, shortest_path};
pub use patch::{PatchOutcome, connect_heuristically};
pub use progress::{RouteProgress, route_progress};
pub use route::{FallbackReason, QueryStats, Route, SnapKind, SnapSummary, find_route};
pub use snap::{SnapResult, snap_point};
pub use tour::{TourRoute, find_routes_one_to_many, find_tour};
