mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use reversi_analyzer::config::Settings;
use reversi_analyzer::engine::{
    move_score, Board, Color, GameLog, LogSummary, SelfPlay, Strategist, Strength,
};
use reversi_analyzer::error::AppError;
use reversi_analyzer::logging::init_logging;
use reversi_analyzer::pipeline::{AnalyzerService, ProcessingPipeline};
use reversi_analyzer::Frame;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tower::ServiceExt;
use tracing::{error, info};

#[derive(Debug, Deserialize)]
struct BoardFile {
    board: Board,
    player_color: Color,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();
    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };
    init_logging(
        &settings.logging.level,
        cli.verbose,
        cli.json_logs || settings.logging.json,
    );
    info!(command = ?cli.command, "Starting reversi-analyzer");

    let outcome = match cli.command {
        Commands::Analyze { image } => return analyze(&settings, image).await,
        Commands::Recognize { image, debug_dir } => recognize(settings, image, debug_dir).await,
        Commands::Advise { image } => advise(&settings, &image).await,
        Commands::Solve { board_json } => solve(&settings, &board_json),
        Commands::Play {
            color,
            strength,
            seed,
        } => play(settings, color, strength, seed).await,
        Commands::Stats { logs_dir } => {
            stats(&logs_dir.unwrap_or_else(|| settings.logging.game_log_dir.clone()))
        }
    };

    if let Err(e) = outcome {
        error!(error = %e, "Command failed");
        eprintln!("{e}");
        std::process::exit(1);
    }
    Ok(())
}

fn print_json(value: &impl Serialize) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn analyze(settings: &Settings, image: PathBuf) -> Result<(), AppError> {
    match AnalyzerService::from_settings(&settings.vision).oneshot(image).await {
        Ok(response) => print_json(&response),
        Err(failure) => {
            print_json(&failure)?;
            std::process::exit(1);
        }
    }
}

async fn recognize(
    mut settings: Settings,
    image: PathBuf,
    debug_dir: Option<PathBuf>,
) -> Result<(), AppError> {
    if let Some(dir) = debug_dir {
        settings.vision = settings.vision.with_debug_dir(dir);
    }
    let mut pipeline = ProcessingPipeline::from_settings(&settings);
    let ctx = pipeline.recognize(Frame::load(&image)?).await?;
    print_json(ctx.recognition())
}

async fn advise(settings: &Settings, image: &Path) -> Result<(), AppError> {
    let mut pipeline = ProcessingPipeline::from_settings(settings);
    let ctx = pipeline.process_path(image).await?;
    print_json(ctx.advice())
}

fn solve(settings: &Settings, path: &Path) -> Result<(), AppError> {
    let input: BoardFile = serde_json::from_slice(&std::fs::read(path)?)?;
    let (board, color) = (input.board, input.player_color);
    let before = board.count();

    println!("{board}");
    println!(
        "Black: {}  White: {}  Empty: {}  Player: {color}",
        before.black, before.white, before.empty
    );

    let mut moves: Vec<_> = board
        .valid_moves(color)
        .into_iter()
        .map(|pos| (pos, move_score(&board, pos, color)))
        .collect();
    if moves.is_empty() {
        println!("No moves available");
        return Ok(());
    }
    moves.sort_by(|a, b| b.1.cmp(&a.1));
    println!("\nValid moves ({}):", moves.len());
    for (i, (pos, score)) in moves.iter().take(10).enumerate() {
        println!("{:>2}. {pos}  score {score}", i + 1);
    }

    let mut strategist = Strategist::new(&settings.search);
    let Some(choice) = strategist.best_move(&board, color, None, None) else {
        println!("No moves available");
        return Ok(());
    };
    let after = board.apply(choice.position, color).unwrap_or(board);
    let count = after.count();
    println!(
        "\nBest move: {} ({}), score {:.3}",
        choice.position, choice.source, choice.score
    );
    println!("{}", after.render(Some(choice.position)));
    println!(
        "Black: {} ({:+})  White: {} ({:+})  Empty: {}",
        count.black,
        count.black as i64 - before.black as i64,
        count.white,
        count.white as i64 - before.white as i64,
        count.empty
    );
    Ok(())
}

async fn play(
    mut settings: Settings,
    color: Color,
    strength: Strength,
    seed: Option<u64>,
) -> Result<(), AppError> {
    if let Some(seed) = seed {
        settings.search = settings.search.with_seed(seed);
    }
    let log_dir = settings.logging.game_log_dir.clone();

    let result = tokio::task::spawn_blocking(move || {
        let mut log = GameLog::create(&log_dir)?;
        let mut game = SelfPlay::new(color, strength, &settings.search);
        let result = game.play(Some(&mut log))?;
        info!(path = %log.path().display(), "Game log saved");
        Ok::<_, AppError>(result)
    })
    .await
    .map_err(|e| AppError::Pipeline(format!("game task failed: {e}")))??;

    println!("{}", result.final_board);
    print_json(&result)
}

fn stats(dir: &Path) -> Result<(), AppError> {
    let summary = LogSummary::from_dir(dir)?;
    print_json(&summary)
}
