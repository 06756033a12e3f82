// src/pipeline/state.rs

use std::fmt;
use std::str::FromStr;

use crate::errors::{LaunchpadError, Result};

/// Position of a build in the linear bootstrap workflow.
///
/// `Pending → Provisioned → DependenciesInstalled → SourceMaterialized →
/// AssetsCollected → Listening`. Every transition is one-way; any failure
/// moves to the terminal `BuildFailed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BuildState {
    Pending,
    Provisioned,
    DependenciesInstalled,
    SourceMaterialized,
    AssetsCollected,
    Listening,
    BuildFailed,
}

impl BuildState {
    /// States that produce a build layer, in order.
    pub const BUILD_LAYERS: [BuildState; 4] = [
        BuildState::Provisioned,
        BuildState::DependenciesInstalled,
        BuildState::SourceMaterialized,
        BuildState::AssetsCollected,
    ];

    /// The only state reachable from `self` on success.
    pub fn next(self) -> Option<BuildState> {
        match self {
            BuildState::Pending => Some(BuildState::Provisioned),
            BuildState::Provisioned => Some(BuildState::DependenciesInstalled),
            BuildState::DependenciesInstalled => Some(BuildState::SourceMaterialized),
            BuildState::SourceMaterialized => Some(BuildState::AssetsCollected),
            BuildState::AssetsCollected => Some(BuildState::Listening),
            BuildState::Listening | BuildState::BuildFailed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BuildState::Listening | BuildState::BuildFailed)
    }

    /// Move to `to`, rejecting anything but the single forward edge.
    pub fn advance(self, to: BuildState) -> Result<BuildState> {
        if self.next() == Some(to) {
            Ok(to)
        } else {
            Err(LaunchpadError::InvalidTransition {
                from: self.to_string(),
                to: to.to_string(),
            })
        }
    }

    /// Failure is reachable from every non-terminal state.
    pub fn fail(self) -> Result<BuildState> {
        if self.is_terminal() {
            return Err(LaunchpadError::InvalidTransition {
                from: self.to_string(),
                to: BuildState::BuildFailed.to_string(),
            });
        }
        Ok(BuildState::BuildFailed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BuildState::Pending => "pending",
            BuildState::Provisioned => "provisioned",
            BuildState::DependenciesInstalled => "dependencies_installed",
            BuildState::SourceMaterialized => "source_materialized",
            BuildState::AssetsCollected => "assets_collected",
            BuildState::Listening => "listening",
            BuildState::BuildFailed => "build_failed",
        }
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "pending" => Ok(BuildState::Pending),
            "provisioned" => Ok(BuildState::Provisioned),
            "dependencies_installed" => Ok(BuildState::DependenciesInstalled),
            "source_materialized" => Ok(BuildState::SourceMaterialized),
            "assets_collected" => Ok(BuildState::AssetsCollected),
            "listening" => Ok(BuildState::Listening),
            "build_failed" => Ok(BuildState::BuildFailed),
            other => Err(format!("unknown build state '{other}'")),
        }
    }
}
