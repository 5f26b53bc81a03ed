//! Tunable parameters for graph repair, query-time patching and route assembly.
//!
//! Field values observed in deployed footpath data differ between sites, so
//! nothing here is authoritative: the defaults are a sane starting point and
//! every value can be overridden from a config file.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Upper bound for endpoint tolerance bridging; anything wider starts
/// joining unrelated paths
pub const MAX_ENDPOINT_TOLERANCE_M: f64 = 20.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FootpathConfig {
    pub repair: RepairConfig,
    pub patch: PatchConfig,
    pub route: RouteConfig,
}

/// Build-time connectivity repair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepairConfig {
    /// Pass 1: endpoints closer than this are bridged
    pub endpoint_tolerance_m: f64,
    /// Pass 2: components closer than this are bridged
    pub component_bridge_max_m: f64,
    /// Pass 2: maximum number of component bridges
    pub component_bridge_max_iterations: usize,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            endpoint_tolerance_m: 2.0,
            component_bridge_max_m: 6.0,
            component_bridge_max_iterations: 20,
        }
    }
}

/// Query-time heuristic hops between components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchConfig {
    pub max_hop_m: f64,
    /// Multiplier applied to hop weights so real paths win whenever they exist
    pub hop_penalty: f64,
    /// Weight of the hop target's distance to the destination in hop scoring
    pub target_bias: f64,
    /// Nodes up to this degree are preferred as hop sources
    pub frontier_max_degree: usize,
    pub max_iterations: usize,
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self {
            max_hop_m: 25.0,
            hop_penalty: 2.0,
            target_bias: 0.2,
            frontier_max_degree: 3,
            max_iterations: 12,
        }
    }
}

/// Route assembly and presentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    /// Snap projections closer than this to the query point are dropped
    pub stub_threshold_m: f64,
    pub walking_speed_mps: f64,
    /// Consecutive points closer than this (in degrees) are collapsed
    pub dedup_epsilon_deg: f64,
    /// Route progress flags positions farther than this as off route
    pub off_route_threshold_m: f64,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            stub_threshold_m: 1.0,
            walking_speed_mps: 1.4,
            dedup_epsilon_deg: 1e-9,
            off_route_threshold_m: 30.0,
        }
    }
}

impl FootpathConfig {
    /// Returns a copy with out-of-range values clamped or reset to defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for a non-positive walking speed, since
    /// no duration can be derived from it.
    pub fn validated(&self) -> Result<Self, Error> {
        Ok(Self {
            repair: self.repair.sanitized(),
            patch: self.patch.sanitized(),
            route: self.route.validated()?,
        })
    }
}

impl RepairConfig {
    /// Clamps the endpoint tolerance into `[0, MAX_ENDPOINT_TOLERANCE_M]` and
    /// resets invalid distances to their defaults
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let mut config = self.clone();

        let tolerance = config.endpoint_tolerance_m;
        if !tolerance.is_finite() {
            warn!(
                "Endpoint tolerance {tolerance} is not finite, using {}",
                defaults.endpoint_tolerance_m
            );
            config.endpoint_tolerance_m = defaults.endpoint_tolerance_m;
        } else if !(0.0..=MAX_ENDPOINT_TOLERANCE_M).contains(&tolerance) {
            let clamped = tolerance.clamp(0.0, MAX_ENDPOINT_TOLERANCE_M);
            warn!("Endpoint tolerance {tolerance} m clamped to {clamped} m");
            config.endpoint_tolerance_m = clamped;
        }

        reset_if_invalid(
            &mut config.component_bridge_max_m,
            defaults.component_bridge_max_m,
            "component bridge distance",
        );
        config
    }
}

impl PatchConfig {
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let mut config = self.clone();

        reset_if_invalid(&mut config.max_hop_m, defaults.max_hop_m, "maximum hop distance");
        reset_if_invalid(&mut config.target_bias, defaults.target_bias, "hop target bias");

        // A penalty below 1 would make hops cheaper than walking the network
        let penalty = config.hop_penalty;
        if !(penalty.is_finite() && penalty >= 1.0) {
            warn!(
                "Hop penalty {penalty} must be at least 1, using {}",
                defaults.hop_penalty
            );
            config.hop_penalty = defaults.hop_penalty;
        }
        config
    }
}

impl RouteConfig {
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for a non-positive walking speed.
    pub fn validated(&self) -> Result<Self, Error> {
        let defaults = Self::default();
        let mut config = self.clone();

        let speed = config.walking_speed_mps;
        if !(speed.is_finite() && speed > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "walking speed must be positive, got {speed}"
            )));
        }

        reset_if_invalid(
            &mut config.stub_threshold_m,
            defaults.stub_threshold_m,
            "stub threshold",
        );
        reset_if_invalid(
            &mut config.dedup_epsilon_deg,
            defaults.dedup_epsilon_deg,
            "deduplication epsilon",
        );
        reset_if_invalid(
            &mut config.off_route_threshold_m,
            defaults.off_route_threshold_m,
            "off-route threshold",
        );
        Ok(config)
    }
}

fn reset_if_invalid(value: &mut f64, default: f64, name: &str) {
    if !(value.is_finite() && *value >= 0.0) {
        warn!("Invalid {name} {value}, using {default}");
        *value = default;
    }
}
