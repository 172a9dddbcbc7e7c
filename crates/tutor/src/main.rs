//! Tutor - command line walkthrough of indicators, patterns and lessons.
//!
//! Usage: tutor [--config PATH] [--csv PATH | --pattern ID --count N] [--lesson PATH] [--user ID]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tutor::events::InteractionBus;
use tutor::lesson::{FileStore, Lesson, LessonEngine, StepOutcome, StoreListener, ValidationDescriptor};
use tutor_config::{Config, APP_DIR};
use tutor_core::{Candle, IndicatorSeries, SignalType};
use tutor_data::{CsvLoader, DataSource, SyntheticPattern, SyntheticSource};
use tutor_indicators::{Indicator, Macd, Rsi};
use tutor_ta::{scan_patterns, support_resistance, PatternKind, PatternMatch, StructureKind};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file; defaults to ./tutor.toml or the user config directory
    #[arg(long)]
    config: Option<PathBuf>,

    /// Load candles from a CSV file
    #[arg(long, conflicts_with = "pattern")]
    csv: Option<PathBuf>,

    /// Append a synthetic pattern, e.g. hammer or head-and-shoulders
    #[arg(long)]
    pattern: Option<String>,

    /// Number of random-walk candles before the pattern
    #[arg(long)]
    count: Option<usize>,

    /// Lesson definition (JSON) to walk through
    #[arg(long)]
    lesson: Option<PathBuf>,

    /// User id for saved progress
    #[arg(long)]
    user: Option<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => Config::load_default(),
    };
    if cli.user.is_some() {
        config.general.user_id = cli.user.clone();
    }

    let lesson = cli
        .lesson
        .as_ref()
        .map(|path| Lesson::load(path).with_context(|| format!("loading lesson {}", path.display())))
        .transpose()?;

    let candles = load_candles(&cli, &config, lesson.as_ref())?;
    println!("Loaded {} candles", candles.len());

    print_indicators(&candles, &config);
    print_structure(&candles, &config);
    let matches = print_patterns(&candles);
    print_levels(&candles, &config);

    if let Some(lesson) = lesson {
        walk_lesson(lesson, candles, &config, &matches)?;
    }

    Ok(())
}

fn load_candles(cli: &Cli, config: &Config, lesson: Option<&Lesson>) -> Result<Vec<Candle>> {
    if let Some(path) = &cli.csv {
        return CsvLoader::new(path).load();
    }
    if cli.pattern.is_none() {
        if let Some(candles) = lesson.and_then(|l| l.candles.clone()) {
            return Ok(candles);
        }
    }

    let pattern = cli
        .pattern
        .as_deref()
        .map(|id| id.parse::<SyntheticPattern>().map_err(anyhow::Error::msg))
        .transpose()?;

    SyntheticSource {
        count: cli.count.unwrap_or(config.general.candle_count),
        start_price: config.general.base_price,
        interval_ms: config.general.interval_ms,
        seed: config.general.seed,
        pattern,
        ..Default::default()
    }
    .load()
}

fn print_indicators(candles: &[Candle], config: &Config) {
    let rsi = Rsi::new(config.indicators.rsi.clone());
    let macd = Macd::new(config.indicators.macd.clone());

    for (name, series) in [(rsi.name(), rsi.calculate(candles)), (macd.name(), macd.calculate(candles))] {
        summarize_series(name, &series);
    }
}

fn summarize_series(name: &str, series: &IndicatorSeries) {
    match series.last() {
        Some(last) => println!(
            "{name}: {} values from candle {}, last {:.2}, {} buy / {} sell signals",
            series.len(),
            series.warmup_offset,
            last,
            series.signals_of(SignalType::Buy).count(),
            series.signals_of(SignalType::Sell).count(),
        ),
        None => println!("{name}: not enough history"),
    }
}

fn print_structure(candles: &[Candle], config: &Config) {
    for kind in [StructureKind::Normal, StructureKind::Inverse] {
        let Some(pattern) = config.structure.detect(candles, kind) else {
            continue;
        };
        println!("{kind:?} head and shoulders:");
        for point in &pattern.points {
            println!("  {:<15} candle {:>4} at {:.4}", point.label, point.index, point.price);
        }
        let [start, end] = &pattern.neckline;
        println!(
            "  Neckline        candle {:>4} at {:.4} to candle {:>4} at {:.4}",
            start.index, start.price, end.index, end.price
        );
    }
}

fn print_patterns(candles: &[Candle]) -> Vec<PatternMatch> {
    let matches = scan_patterns(candles, &PatternKind::ALL);
    println!("{} candlestick patterns found", matches.len());
    for m in matches.iter().rev().take(10) {
        println!(
            "  {:<18} candles {:>4}..={:<4} strength {:.2}",
            m.kind.label(),
            m.start_index,
            m.end_index,
            m.strength
        );
    }
    matches
}

fn print_levels(candles: &[Candle], config: &Config) {
    let lookback = config.validation.support_resistance_lookback;
    let Some((support, resistance)) = support_resistance(candles, lookback) else {
        return;
    };

    for (name, price) in [("Support", support), ("Resistance", resistance)] {
        let result = config.validation.level.validate(price, candles);
        println!("{name} {price:.4}: {}", result.message);
    }
}

fn walk_lesson(lesson: Lesson, candles: Vec<Candle>, config: &Config, matches: &[PatternMatch]) -> Result<()> {
    let store = FileStore::new(progress_dir());
    let listener = StoreListener::new(store, config.general.user_id.as_deref(), &lesson.id);
    let saved = listener.load()?;

    println!("Lesson: {}", lesson.title);
    let steps = lesson.steps.clone();
    let mut engine = LessonEngine::new(lesson, candles, config).with_listener(Box::new(listener));
    if let Some(saved) = saved {
        match engine.restore(&saved) {
            Ok(()) => println!(
                "Resuming at step {} ({} done)",
                saved.current_step_index + 1,
                saved.completed_steps.len()
            ),
            Err(e) => log::warn!("Ignoring saved progress: {}", e),
        }
    }
    let pending: Vec<_> = steps
        .into_iter()
        .filter(|s| !engine.is_step_complete(&s.id))
        .collect();
    let mut bus = InteractionBus::new();

    for step in &pending {
        println!("[{}] {}", step.id, step.content);

        // Stand in for the learner by clicking the latest matching candle
        if let Some(ValidationDescriptor::Pattern { pattern_id, .. }) = &step.validation {
            let found = pattern_id
                .parse::<PatternKind>()
                .ok()
                .and_then(|kind| matches.iter().rev().find(|m| m.kind == kind));
            if let Some(m) = found {
                // Unclick the previous choice so the engine sees the deselection
                for index in bus.state().selected_candles.clone() {
                    bus.handle_candle_click(&engine.candles()[index], index);
                }
                bus.handle_candle_click(&engine.candles()[m.end_index], m.end_index);
            }
        }
        for event in bus.take_events() {
            engine.record_interaction(&event);
        }

        match engine.complete_step(&step.id) {
            StepOutcome::Advanced { next_index } => println!("  passed, on to step {}", next_index + 1),
            StepOutcome::Completed => println!("  passed"),
            StepOutcome::LessonComplete => println!("  passed, lesson complete"),
            StepOutcome::Blocked(result) => {
                println!("  not yet: {}", result.message);
                if engine.current_step().is_some_and(|s| s.id == step.id) {
                    engine.next_step();
                }
            }
            StepOutcome::UnknownStep => {}
        }
    }

    println!("Progress: {:.0}%", engine.progress() * 100.0);
    Ok(())
}

/// Saved lesson progress lives next to the user config.
fn progress_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("progress")
}
