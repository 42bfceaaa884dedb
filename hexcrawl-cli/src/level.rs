//! Level command - scenario level for a party

use anyhow::{bail, Result};
use clap::Args;

use hexcrawl_core::scenario::{LevelStats, ScenarioLevel, MAX_SCENARIO_LEVEL};

#[derive(Args)]
pub struct LevelArgs {
    /// Character levels, comma separated
    #[arg(long, value_delimiter = ',', required = true)]
    pub levels: Vec<u32>,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: LevelArgs) -> Result<()> {
    if args.levels.contains(&0) {
        bail!("character levels start at 1");
    }
    let level = ScenarioLevel::for_party(&args.levels);
    tracing::info!(party = args.levels.len(), level = level.value(), "scenario level computed");

    if args.json {
        print_json(&args.levels, level)?;
    } else {
        print_table(&args.levels, level);
    }
    Ok(())
}

fn print_json(party: &[u32], level: ScenarioLevel) -> Result<()> {
    #[derive(serde::Serialize)]
    struct JsonOutput<'a> {
        party: &'a [u32],
        scenario_level: u32,
        stats: LevelStats,
    }

    let output = JsonOutput {
        party,
        scenario_level: level.value(),
        stats: level.stats(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_table(party: &[u32], level: ScenarioLevel) {
    println!("\n=== Scenario Level ===");
    println!("Party levels:    {:?}", party);
    println!("Scenario level:  {}", level.value());

    println!("\n  L  monster  trap  hazard  gold  xp");
    for value in 0..=MAX_SCENARIO_LEVEL {
        let stats = ScenarioLevel::new(value).stats();
        let marker = if value == level.value() { ">" } else { " " };
        println!(
            "{} {}  {:>7}  {:>4}  {:>6}  {:>4}  {:>2}",
            marker,
            value,
            stats.monster_level,
            stats.trap_damage,
            stats.hazard_damage,
            stats.gold_conversion,
            stats.bonus_experience
        );
    }
}
