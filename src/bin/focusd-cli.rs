//! Command-line demo of the recommender, backed by a local JSON data
//! directory.
//!
//! Usage: focusd-cli --task coding --energy mid recommend-focus --heuristic 25

use clap::{Parser, Subcommand, ValueEnum};
use focusd::{
    CompletionType, Config, Context, EnergyLevel, JsonFileStorage, Recommender, Sampler,
    SessionOutcome, SkipReason,
};

#[derive(Parser)]
#[command(name = "focusd-cli", about = "Adaptive focus-duration recommender")]
struct Cli {
    #[arg(long, default_value = "")]
    task: String,
    #[arg(long, value_enum, default_value = "mid")]
    energy: EnergyArg,
    #[command(subcommand)]
    command: Command,
}

#[derive(ValueEnum, Clone, Copy)]
enum EnergyArg {
    Low,
    Mid,
    High,
    Unset,
}

impl From<EnergyArg> for EnergyLevel {
    fn from(value: EnergyArg) -> Self {
        match value {
            EnergyArg::Low => EnergyLevel::Low,
            EnergyArg::Mid => EnergyLevel::Mid,
            EnergyArg::High => EnergyLevel::High,
            EnergyArg::Unset => EnergyLevel::Unset,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Ask for a focus-session duration.
    RecommendFocus {
        /// Caller's own rule-of-thumb pick, used below the learning
        /// threshold and to seed a never-seen context's zone.
        #[arg(long, default_value_t = 25)]
        heuristic: u32,
        /// Arms this context should already offer beyond the zone's base
        /// set (e.g. restored from elsewhere), comma-separated.
        #[arg(long, value_delimiter = ',')]
        dynamic_arms: Vec<u32>,
    },
    /// Ask for a break duration.
    RecommendBreak {
        #[arg(long, default_value_t = 5)]
        heuristic: u32,
        /// The focus-session length this break follows, which bounds the
        /// permitted break arms.
        #[arg(long)]
        focus_minutes: u32,
    },
    /// Record how a previously recommended session actually went.
    Observe {
        #[arg(long)]
        selected: u32,
        #[arg(long)]
        focused: u32,
        #[arg(long)]
        recommended: u32,
        #[arg(long, default_value_t = 5)]
        selected_break: u32,
        #[arg(long)]
        accepted: bool,
        #[arg(long, value_enum)]
        completion: CompletionArg,
    },
    /// Tell the recommender the user turned down a recommendation outright.
    Reject {
        #[arg(long)]
        minutes: u32,
    },
    /// Wipe all learned state for this data directory.
    Clear,
}

#[derive(ValueEnum, Clone, Copy)]
enum CompletionArg {
    Completed,
    SkippedFocus,
    SkippedBreak,
}

impl From<CompletionArg> for CompletionType {
    fn from(value: CompletionArg) -> Self {
        match value {
            CompletionArg::Completed => CompletionType::Completed,
            CompletionArg::SkippedFocus => CompletionType::SkippedFocus,
            CompletionArg::SkippedBreak => CompletionType::SkippedBreak,
        }
    }
}

fn main() {
    focusd::init_logging();
    let cli = Cli::parse();
    let config = Config::from_env();
    let storage = JsonFileStorage::new(config.data_dir);
    let sampler = match config.rng_seed {
        Some(seed) => Sampler::seeded(seed),
        None => Sampler::from_os_rng(),
    };
    let mut recommender = Recommender::new(storage, sampler);
    let context = Context::new(cli.task, cli.energy.into());

    match cli.command {
        Command::RecommendFocus { heuristic, dynamic_arms } => {
            let recommendation = recommender.recommend_focus(&context, heuristic, &dynamic_arms);
            print_json(&recommendation);
        }
        Command::RecommendBreak { heuristic, focus_minutes } => {
            let recommendation = recommender.recommend_break(&context, heuristic, focus_minutes);
            print_json(&recommendation);
        }
        Command::Observe {
            selected,
            focused,
            recommended,
            selected_break,
            accepted,
            completion,
        } => {
            let outcome = build_outcome(completion.into(), accepted, selected, selected_break, focused, recommended)
                .expect("invalid --observe input");
            recommender.observe_outcome(&context, outcome);
        }
        Command::Reject { minutes } => recommender.penalize_rejection(&context, minutes),
        Command::Clear => recommender.clear_all_data(),
    }
}

/// Sanity-check user-typed CLI input before it becomes a `SessionOutcome`.
/// The core library itself never rejects an outcome (it records whatever it
/// can and moves on); this is the process's own input boundary, where a
/// nonsensical value should fail loudly rather than quietly mis-teach a
/// posterior.
fn build_outcome(
    completion_type: CompletionType,
    accepted_recommendation: bool,
    selected_focus_minutes: u32,
    selected_break_minutes: u32,
    focused_minutes: u32,
    recommended_focus: u32,
) -> anyhow::Result<SessionOutcome> {
    anyhow::ensure!(selected_focus_minutes > 0, "--selected must be positive");
    anyhow::ensure!(focused_minutes <= 24 * 60, "--focused looks implausible (> 24h)");
    Ok(SessionOutcome {
        completion_type,
        accepted_recommendation,
        selected_focus_minutes,
        selected_break_minutes,
        focused_minutes,
        recommended_focus,
        skip_reason: SkipReason::None,
        timestamp: 0,
        time_of_day: None,
    })
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(err) => log::error!("could not serialise output: {err}"),
    }
}
