use anyhow::Result;

use crate::cli::InspectArgs;
use crate::layer::LayerKind;
use crate::study::StudyArea;

pub fn run(cli: &crate::cli::Cli, args: &InspectArgs) -> Result<()> {
    if cli.verbose > 0 {
        eprintln!("[inspect] loading {}", args.study.display());
    }
    let study = StudyArea::load(&args.study)?;

    for kind in LayerKind::ALL {
        let layer = study.layer(kind);
        let columns: Vec<&str> = layer
            .data
            .get_column_names()
            .iter()
            .map(|name| name.as_str())
            .collect();
        println!("{kind}: {} records, frame {}", layer.len(), layer.source.frame());
        println!("  columns: {}", columns.join(", "));
    }

    if let Some(bounds) = study.bounds() {
        println!(
            "bounds: ({}, {}) .. ({}, {})",
            bounds.min().x,
            bounds.min().y,
            bounds.max().x,
            bounds.max().y
        );
    }

    Ok(())
}
