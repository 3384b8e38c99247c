use clap::Subcommand;

use breathwork_core::storage::{Config, DailyLog};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's practice per technique
    Today,
    /// Today's progress against the configured goals
    Goals,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let log = DailyLog::open()?;

    match action {
        StatsAction::Today => {
            let stats = log.stats_today()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        StatsAction::Goals => {
            let config = Config::load()?;
            let today = chrono::Local::now().date_naive();
            let report = log.compliance(today, &config.goals)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
