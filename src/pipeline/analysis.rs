use std::collections::BTreeMap;

use anyhow::{anyhow, Context, Result};

use geoframe::Frame;

use crate::filter::{filter_attributes, filter_contained, filter_within};
use crate::layer::Layer;
use crate::pipeline::{AnalysisConfig, Stage};
use crate::study::StudyArea;

/// A configured analysis over a study area, with cached stage results.
///
/// Construction projects every layer into the resolved frame, so spatial
/// stages never mix frames. Each stage consumes the previous stage's
/// survivors; results are looked up by [`Stage`].
#[derive(Debug)]
pub struct Analysis {
    study: StudyArea,
    config: AnalysisConfig,
    frame: Frame,
    results: BTreeMap<Stage, Layer>,
}

impl Analysis {
    /// Set up an analysis: validate the config, resolve the frame, and
    /// project the whole study into it.
    pub fn new(mut study: StudyArea, config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        let frame = config.resolve(study.bounds())?;
        study.project_to(frame)?;
        Ok(Self { study, config, frame, results: BTreeMap::new() })
    }

    #[inline] pub fn frame(&self) -> Frame { self.frame }

    #[inline] pub fn config(&self) -> &AnalysisConfig { &self.config }

    #[inline] pub fn study(&self) -> &StudyArea { &self.study }

    /// Run all five stages, replacing any cached results.
    ///
    /// The cache is filled only once every stage has succeeded, so an error
    /// part way through leaves it empty rather than half filled.
    pub fn run(&mut self) -> Result<()> {
        self.results.clear();

        let regions = filter_attributes(&self.study.regions, &self.config.region_predicates)
            .with_context(|| format!("stage {}", Stage::SuitableRegions))?;
        let in_regions = filter_contained(&self.study.sites, &regions)
            .with_context(|| format!("stage {}", Stage::SitesInRegions))?;
        let sites = filter_attributes(&in_regions, &self.config.site_predicates)
            .with_context(|| format!("stage {}", Stage::SuitableSites))?;
        let near_linear = filter_within(&sites, &self.study.linear, self.config.linear_threshold)
            .with_context(|| format!("stage {}", Stage::SitesNearLinear))?;
        let candidates = filter_within(&near_linear, &self.study.areas, self.config.area_threshold)
            .with_context(|| format!("stage {}", Stage::FinalCandidates))?;

        self.results.insert(Stage::SuitableRegions, regions);
        self.results.insert(Stage::SitesInRegions, in_regions);
        self.results.insert(Stage::SuitableSites, sites);
        self.results.insert(Stage::SitesNearLinear, near_linear);
        self.results.insert(Stage::FinalCandidates, candidates);
        Ok(())
    }

    /// Cached output of `stage`, if the analysis has run.
    pub fn stage(&self, stage: Stage) -> Option<&Layer> {
        self.results.get(&stage)
    }

    /// Cached stage outputs in execution order.
    pub fn stages(&self) -> impl Iterator<Item = (Stage, &Layer)> {
        self.results.iter().map(|(&stage, layer)| (stage, layer))
    }

    /// The final candidate layer. Errors if the analysis has not run.
    pub fn final_candidates(&self) -> Result<&Layer> {
        self.stage(Stage::FinalCandidates)
            .ok_or_else(|| anyhow!("analysis has not been run"))
    }

    /// Swap in a new config, reprojecting if its frame differs. Cached
    /// results are always dropped, even when the swap fails; the next `run`
    /// rebuilds them.
    pub fn set_config(&mut self, config: AnalysisConfig) -> Result<()> {
        self.results.clear();
        config.validate()?;
        let frame = config.resolve(self.study.bounds())?;
        if frame != self.frame {
            self.study.project_to(frame)?;
            self.frame = frame;
        }
        self.config = config;
        Ok(())
    }
}
