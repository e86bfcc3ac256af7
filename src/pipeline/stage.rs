use std::{fmt, str::FromStr};

use anyhow::anyhow;

/// The five narrowing stages of an analysis, in execution order.
///
/// Each stage consumes the previous stage's survivors, so the ordering here
/// is also the derivation order of cached results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    SuitableRegions, // Regions passing the region predicates
    SitesInRegions,  // Sites covered by a suitable region
    SuitableSites,   // Surviving sites passing the site predicates
    SitesNearLinear, // Surviving sites within reach of a linear feature
    FinalCandidates, // Surviving sites within reach of an area feature
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Self::SuitableRegions,
        Self::SitesInRegions,
        Self::SuitableSites,
        Self::SitesNearLinear,
        Self::FinalCandidates,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SuitableRegions => "suitable_regions",
            Self::SitesInRegions => "sites_in_regions",
            Self::SuitableSites => "suitable_sites",
            Self::SitesNearLinear => "sites_near_linear",
            Self::FinalCandidates => "final_candidates",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = anyhow::Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == text)
            .ok_or_else(|| anyhow!("unknown stage {text:?} (expected one of suitable_regions, \
                 sites_in_regions, suitable_sites, sites_near_linear, final_candidates)"))
    }
}
