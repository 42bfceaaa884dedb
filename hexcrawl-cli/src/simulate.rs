//! Simulate command - auto-play seeded runs of one scenario
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: load_setup(), play_runs(), report_results()
//! - Level 3: play_single_run(), compute_summary()
//! - Level 4: initiative rolls and formatting

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use hexcrawl_core::{
    FigureId, FigureType, InitiativeEntry, RulesConfig, ScenarioSetup, ScenarioStatus, Session,
};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct SimulateArgs {
    /// Scenario setup JSON file
    #[arg(long, value_name = "FILE")]
    pub scenario: PathBuf,

    /// Rules config JSON file, replacing the scenario's own rules
    #[arg(long, value_name = "FILE")]
    pub rules: Option<PathBuf>,

    /// Maximum rounds per run
    #[arg(long, default_value = "20")]
    pub rounds: u32,

    /// Number of runs
    #[arg(long, default_value = "100")]
    pub runs: usize,

    /// Base seed; run i uses seed + i
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Result of a single run
#[derive(Clone, Debug)]
struct RunRecord {
    run_number: usize,
    seed: u64,
    status: ScenarioStatus,
    rounds: u32,
    survivors: usize,
}

/// Aggregated simulation results
#[derive(Clone, Debug)]
struct SimulationSummary {
    runs: Vec<RunRecord>,
    victories: usize,
    defeats: usize,
    unfinished: usize,
    avg_rounds: f32,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

pub fn run(args: SimulateArgs) -> Result<()> {
    let (setup, config) = load_setup(&args)?;
    let base_seed = args.seed.unwrap_or_else(|| config.effective_seed());

    tracing::info!(
        "Simulating {}: {} runs, up to {} rounds, seed {}",
        setup.name,
        args.runs,
        args.rounds,
        base_seed
    );

    let summary = play_runs(&setup, &config, base_seed, &args)?;

    report_results(&setup.name, &summary, args.json)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn load_setup(args: &SimulateArgs) -> Result<(ScenarioSetup, RulesConfig)> {
    let setup = ScenarioSetup::load(&args.scenario)?;
    let config = match &args.rules {
        Some(path) => RulesConfig::load(path)?,
        None => setup.rules.clone(),
    };
    Ok((setup, config))
}

fn play_runs(setup: &ScenarioSetup, config: &RulesConfig, base_seed: u64, args: &SimulateArgs) -> Result<SimulationSummary> {
    let runs = (0..args.runs)
        .into_par_iter()
        .map(|i| play_single_run(setup, config, i + 1, base_seed.wrapping_add(i as u64), args.rounds))
        .collect::<Result<Vec<_>>>()?;

    for record in &runs {
        tracing::debug!(
            "Run {}: {:?} after {} rounds ({} survivors)",
            record.run_number,
            record.status,
            record.rounds,
            record.survivors
        );
    }

    Ok(compute_summary(runs))
}

fn report_results(name: &str, summary: &SimulationSummary, json: bool) -> Result<()> {
    if json {
        print_json_results(name, summary)
    } else {
        print_text_results(name, summary);
        Ok(())
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// Play one run to victory, defeat or the round limit
fn play_single_run(
    setup: &ScenarioSetup,
    config: &RulesConfig,
    run_number: usize,
    seed: u64,
    max_rounds: u32,
) -> Result<RunRecord> {
    let mut session = setup
        .build_with(config.clone().with_seed(seed))
        .with_context(|| format!("building run {}", run_number))?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    while session.status() == ScenarioStatus::Ongoing && session.round() < max_rounds {
        session.begin_round(roll_initiative(setup, &mut rng));
        while let Some(id) = session.next_figure() {
            play_turn(&mut session, id).with_context(|| format!("run {} round {}", run_number, session.round()))?;
            if session.status() != ScenarioStatus::Ongoing {
                break;
            }
        }
        session.end_round();
    }

    let rounds = session.round();
    let survivors = session
        .figures()
        .filter(|f| f.figure_type() == FigureType::Character && f.is_alive())
        .count();
    let status = session.end_scenario();

    Ok(RunRecord {
        run_number,
        seed,
        status,
        rounds,
        survivors,
    })
}

fn play_turn(session: &mut Session, id: FigureId) -> Result<()> {
    let start = session.start_turn(id)?;
    if !start.skip_turn {
        session.auto_turn(id)?;
    }
    session.end_turn(id)?;
    Ok(())
}

fn compute_summary(runs: Vec<RunRecord>) -> SimulationSummary {
    let count = |status: ScenarioStatus| runs.iter().filter(|r| r.status == status).count();
    let victories = count(ScenarioStatus::Victory);
    let defeats = count(ScenarioStatus::Defeat);
    let unfinished = count(ScenarioStatus::Ongoing);

    let total_rounds: u32 = runs.iter().map(|r| r.rounds).sum();
    let avg_rounds = if runs.is_empty() {
        0.0
    } else {
        total_rounds as f32 / runs.len() as f32
    };

    SimulationSummary {
        runs,
        victories,
        defeats,
        unfinished,
        avg_rounds,
    }
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

/// Characters draw a fresh initiative each round; monsters keep the one in
/// the setup file
fn roll_initiative<R: Rng>(setup: &ScenarioSetup, rng: &mut R) -> Vec<InitiativeEntry> {
    setup
        .roster
        .iter()
        .map(|entry| {
            let figure_type = entry.figure.figure_type();
            let initiative = match figure_type {
                FigureType::Character => rng.gen_range(1..=99),
                FigureType::Monster => entry.initiative,
            };
            InitiativeEntry::new(entry.figure.id, figure_type, initiative)
        })
        .collect()
}

fn rate(count: usize, total: usize) -> f32 {
    if total > 0 {
        count as f32 / total as f32
    } else {
        0.0
    }
}

fn print_json_results(name: &str, summary: &SimulationSummary) -> Result<()> {
    #[derive(serde::Serialize)]
    struct JsonRun {
        run_number: usize,
        seed: u64,
        status: ScenarioStatus,
        rounds: u32,
        survivors: usize,
    }

    #[derive(serde::Serialize)]
    struct JsonOutput<'a> {
        scenario: &'a str,
        total_runs: usize,
        victories: usize,
        defeats: usize,
        unfinished: usize,
        win_rate: f32,
        avg_rounds: f32,
        runs: Vec<JsonRun>,
    }

    let total = summary.runs.len();
    let output = JsonOutput {
        scenario: name,
        total_runs: total,
        victories: summary.victories,
        defeats: summary.defeats,
        unfinished: summary.unfinished,
        win_rate: rate(summary.victories, total),
        avg_rounds: summary.avg_rounds,
        runs: summary
            .runs
            .iter()
            .map(|r| JsonRun {
                run_number: r.run_number,
                seed: r.seed,
                status: r.status,
                rounds: r.rounds,
                survivors: r.survivors,
            })
            .collect(),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_text_results(name: &str, summary: &SimulationSummary) {
    let total = summary.runs.len();

    println!("\n=== {} ===", name);
    println!("Total runs:  {}", total);
    println!(
        "Victories:   {} ({:.1}%)",
        summary.victories,
        rate(summary.victories, total) * 100.0
    );
    println!(
        "Defeats:     {} ({:.1}%)",
        summary.defeats,
        rate(summary.defeats, total) * 100.0
    );
    println!(
        "Unfinished:  {} ({:.1}%)",
        summary.unfinished,
        rate(summary.unfinished, total) * 100.0
    );
    println!("Avg rounds:  {:.1}", summary.avg_rounds);
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use hexcrawl_core::scenario::{BoardLayout, BoardShape, RosterEntry};
    use hexcrawl_core::{CombatProfile, Figure, HexCoord};

    fn duel() -> ScenarioSetup {
        let hero = Figure::character(FigureId(1), "Brute", "brute", 1, 10, CombatProfile::new(3, 3, 0))
            .at(HexCoord::new(-2, 0));
        let rat = Figure::monster(FigureId(10), "Giant Rat", false, 3, CombatProfile::new(3, 1, 0))
            .at(HexCoord::new(2, 0));
        ScenarioSetup {
            name: "duel".into(),
            board: BoardLayout {
                shape: Some(BoardShape::Hexagon { radius: 3 }),
                hexes: Vec::new(),
            },
            level: Some(1),
            roster: vec![
                RosterEntry {
                    figure: hero,
                    initiative: 0,
                    perks: Vec::new(),
                },
                RosterEntry {
                    figure: rat,
                    initiative: 40,
                    perks: Vec::new(),
                },
            ],
            rules: RulesConfig::default(),
        }
    }

    fn record(status: ScenarioStatus, rounds: u32) -> RunRecord {
        RunRecord {
            run_number: 1,
            seed: 0,
            status,
            rounds,
            survivors: 0,
        }
    }

    #[test]
    fn test_compute_summary_empty() {
        let summary = compute_summary(vec![]);
        assert_eq!(summary.victories, 0);
        assert_eq!(summary.defeats, 0);
        assert_eq!(summary.avg_rounds, 0.0);
    }

    #[test]
    fn test_compute_summary() {
        let summary = compute_summary(vec![
            record(ScenarioStatus::Victory, 4),
            record(ScenarioStatus::Defeat, 8),
            record(ScenarioStatus::Ongoing, 12),
        ]);
        assert_eq!(summary.victories, 1);
        assert_eq!(summary.defeats, 1);
        assert_eq!(summary.unfinished, 1);
        assert_eq!(summary.avg_rounds, 8.0);
    }

    #[test]
    fn test_roll_initiative_keeps_monster_values() {
        let setup = duel();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let entries = roll_initiative(&setup, &mut rng);
        assert_eq!(entries.len(), 2);
        assert!((1..=99).contains(&entries[0].initiative));
        assert_eq!(entries[1].initiative, 40);
    }

    #[test]
    fn test_run_is_deterministic() {
        let setup = duel();
        let config = RulesConfig::default();
        let a = play_single_run(&setup, &config, 1, 77, 10).unwrap();
        let b = play_single_run(&setup, &config, 1, 77, 10).unwrap();
        assert_eq!(a.status, b.status);
        assert_eq!(a.rounds, b.rounds);
        assert_eq!(a.survivors, b.survivors);
    }

    #[test]
    fn test_duel_finishes() {
        // the brute outclasses a lone rat
        let record = play_single_run(&duel(), &RulesConfig::default(), 1, 5, 20).unwrap();
        assert_eq!(record.status, ScenarioStatus::Victory);
        assert_eq!(record.survivors, 1);
    }
}
