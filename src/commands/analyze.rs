use anyhow::{anyhow, Result};

use crate::cli::AnalyzeArgs;
use crate::layer::Layer;
use crate::pipeline::{Analysis, AnalysisConfig, Stage};
use crate::study::StudyArea;

pub fn run(cli: &crate::cli::Cli, args: &AnalyzeArgs) -> Result<()> {
    if cli.verbose > 0 {
        eprintln!("[analyze] study={} config={}", args.study.display(), args.config.display());
    }

    let study = StudyArea::load(&args.study)?;
    let config = AnalysisConfig::from_path(&args.config)?;

    let mut analysis = Analysis::new(study, config)?;
    if cli.verbose > 0 {
        eprintln!("[analyze] frame {}", analysis.frame());
    }
    analysis.run()?;

    if let Some(name) = &args.stage {
        let stage: Stage = name.parse()?;
        let layer = analysis
            .stage(stage)
            .ok_or_else(|| anyhow!("stage {stage} has no cached result"))?;
        println!("{stage}: {} records", layer.len());
        print_records(layer);
    } else {
        for (stage, layer) in analysis.stages() {
            println!("{stage}: {}", layer.len());
        }
        let finals = analysis.final_candidates()?;
        println!();
        println!("candidates:");
        print_records(finals);
    }

    Ok(())
}

fn print_records(layer: &Layer) {
    for (row, id) in layer.ids.iter().enumerate() {
        let name = layer.name_of(row as u32);
        match region_of(layer, row) {
            Some(region) => println!("  {id}  {name} ({region})"),
            None => println!("  {id}  {name}"),
        }
    }
}

/// The covering region's name, for layers downstream of the containment stage.
fn region_of(layer: &Layer, row: usize) -> Option<String> {
    layer
        .data
        .column("region")
        .ok()
        .and_then(|col| col.str().ok())
        .and_then(|names| names.get(row))
        .map(str::to_string)
}
