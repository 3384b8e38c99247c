use clap::Subcommand;
use serde::Serialize;

use breathwork_core::catalog::{FilterKey, Technique};

#[derive(Subcommand)]
pub enum TechniqueAction {
    /// List techniques, optionally ordered for a goal
    List {
        /// sleep, focus, calm, energy or anxiety
        #[arg(long)]
        filter: Option<String>,
        /// Only techniques ranked under the filter
        #[arg(long)]
        only: bool,
        #[arg(long)]
        json: bool,
    },
    /// Show one technique as JSON
    Show {
        /// Technique id
        id: String,
    },
}

#[derive(Serialize)]
struct TechniqueDetail<'a> {
    #[serde(flatten)]
    technique: &'a Technique,
    cycle_duration_ms: u64,
    breaths_per_minute: f64,
}

pub fn run(action: TechniqueAction) -> Result<(), Box<dyn std::error::Error>> {
    let (_, catalog) = super::load()?;

    match action {
        TechniqueAction::List { filter, only, json } => {
            let techniques = match (&filter, only) {
                (Some(f), true) => {
                    let key: FilterKey = f.parse()?;
                    catalog.matching(key)
                }
                (Some(f), false) => catalog.ranked(f),
                (None, _) => catalog.ranked(""),
            };
            if json {
                let list: Vec<&Technique> = techniques.iter().map(|t| t.as_ref()).collect();
                println!("{}", serde_json::to_string_pretty(&list)?);
            } else {
                for t in &techniques {
                    println!(
                        "{:<10} {:<24} {:>5.1} bpm",
                        t.id,
                        t.name,
                        t.breaths_per_minute()
                    );
                }
            }
        }
        TechniqueAction::Show { id } => {
            let technique = catalog.technique(&id)?;
            let detail = TechniqueDetail {
                technique: &technique,
                cycle_duration_ms: technique.cycle_duration_ms(),
                breaths_per_minute: technique.breaths_per_minute(),
            };
            println!("{}", serde_json::to_string_pretty(&detail)?);
        }
    }
    Ok(())
}
