use std::time::Duration;

use clap::Subcommand;

use breathwork_core::session::{Recorder, SessionRuntime};

use super::session::{print_report, simulated_host};
use crate::console;

#[derive(Subcommand)]
pub enum PresetAction {
    /// List presets
    List {
        #[arg(long)]
        json: bool,
    },
    /// Play a preset from its first segment
    Run {
        /// Preset id
        id: String,
        /// Fast-forward in virtual time and print the recorded events
        #[arg(long)]
        simulate: bool,
        #[arg(long, default_value = "16")]
        frame_ms: u64,
    },
}

pub fn run(action: PresetAction) -> Result<(), Box<dyn std::error::Error>> {
    let (config, catalog) = super::load()?;

    match action {
        PresetAction::List { json } => {
            if json {
                let list: Vec<_> = catalog.presets().iter().map(|p| p.as_ref()).collect();
                println!("{}", serde_json::to_string_pretty(&list)?);
            } else {
                for p in catalog.presets() {
                    let legs: Vec<String> = p
                        .segments
                        .iter()
                        .map(|s| format!("{} {}s", s.technique_id, s.duration_secs))
                        .collect();
                    println!("{:<16} {:>5}s  {}", p.id, p.total_duration_secs(), legs.join(" -> "));
                }
            }
        }
        PresetAction::Run {
            id,
            simulate,
            frame_ms,
        } => {
            let total_secs = catalog.preset(&id)?.total_duration_secs();
            if simulate {
                let recorder = Recorder::new();
                let mut host = simulated_host(catalog, config.session, &recorder)?;
                host.controller_mut().start_preset(&id)?;
                host.refresh(0);
                host.run_for(total_secs.saturating_add(1).saturating_mul(1000), frame_ms);
                return print_report(&host, &recorder);
            }

            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            rt.block_on(async move {
                let session = SessionRuntime::spawn(catalog, config.session, console::collaborators())?;
                session.start_preset(&id).await?;
                loop {
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    let snapshot = session.snapshot().await?;
                    if snapshot.active_preset_id.is_none() {
                        println!("{}", serde_json::to_string_pretty(&snapshot)?);
                        break;
                    }
                }
                session.shutdown().await?;
                Ok::<(), Box<dyn std::error::Error>>(())
            })?;
        }
    }
    Ok(())
}
