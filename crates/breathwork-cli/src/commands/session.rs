use std::time::Duration;

use clap::Subcommand;
use serde::Serialize;

use breathwork_core::session::{
    Recorder, SessionController, SessionRuntime, SessionSnapshot, SimulatedHost,
};
use breathwork_core::timer::ManualScheduler;
use breathwork_core::{Catalog, SessionEvent, SessionSettings};

use crate::console;

#[derive(Subcommand)]
pub enum SessionAction {
    /// Breathe along in real time
    Run {
        /// Technique id (defaults to session.default_technique)
        #[arg(long)]
        technique: Option<String>,
        /// Stop after this many seconds
        #[arg(long, default_value = "60")]
        seconds: u64,
    },
    /// Fast-forward a session in virtual time and print what it did
    Simulate {
        #[arg(long)]
        technique: Option<String>,
        /// Virtual seconds to run, up to one day
        #[arg(long, default_value = "60", value_parser = clap::value_parser!(u64).range(0..=86_400))]
        seconds: u64,
        /// Virtual display refresh interval
        #[arg(long, default_value = "16")]
        frame_ms: u64,
    },
}

/// JSON printed by the simulate commands.
#[derive(Serialize)]
pub(crate) struct SimulationReport {
    snapshot: SessionSnapshot,
    events: Vec<SessionEvent>,
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    let (config, catalog) = super::load()?;

    match action {
        SessionAction::Run { technique, seconds } => {
            let settings = with_technique(config.session, technique);
            realtime(catalog, settings, seconds)
        }
        SessionAction::Simulate {
            technique,
            seconds,
            frame_ms,
        } => {
            let settings = with_technique(config.session, technique);
            catalog.technique(&settings.default_technique)?;
            let recorder = Recorder::new();
            let mut host = simulated_host(catalog, settings, &recorder)?;
            host.controller_mut().start()?;
            host.refresh(0);
            host.run_for(seconds.saturating_mul(1000), frame_ms);
            print_report(&host, &recorder)
        }
    }
}

fn with_technique(mut settings: SessionSettings, technique: Option<String>) -> SessionSettings {
    if let Some(id) = technique {
        settings.default_technique = id;
    }
    settings
}

/// A simulated host whose controller reports into `recorder`.
pub(crate) fn simulated_host(
    catalog: Catalog,
    settings: SessionSettings,
    recorder: &Recorder,
) -> Result<SimulatedHost, Box<dyn std::error::Error>> {
    let controller = SessionController::new(
        catalog,
        settings,
        ManualScheduler::new(),
        recorder.collaborators(),
    )?;
    Ok(SimulatedHost::new(controller))
}

pub(crate) fn print_report(
    host: &SimulatedHost,
    recorder: &Recorder,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = SimulationReport {
        snapshot: host.snapshot(),
        events: recorder.events(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn realtime(
    catalog: Catalog,
    settings: SessionSettings,
    seconds: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    catalog.technique(&settings.default_technique)?;
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    rt.block_on(async move {
        let session = SessionRuntime::spawn(catalog, settings, console::collaborators())?;
        session.toggle().await?;
        for _ in 0..seconds {
            tokio::time::sleep(Duration::from_secs(1)).await;
            for err in session.take_errors().await? {
                tracing::warn!("{err}");
            }
        }
        let snapshot = session.snapshot().await?;
        session.shutdown().await?;
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
