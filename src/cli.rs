use clap::{Parser, Subcommand};
use reversi_analyzer::engine::{Color, Strength};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "reversi-analyzer", version, about = "Reversi screenshot analyzer and move advisor")]
pub struct Cli {
    #[arg(long, global = true, help = "TOML settings file")]
    pub config: Option<PathBuf>,
    #[arg(short, long, global = true, help = "Enable debug logging")]
    pub verbose: bool,
    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub json_logs: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load and threshold a screenshot, reporting success or failure as JSON
    Analyze { image: PathBuf },
    /// Read the board and player colour from a screenshot
    Recognize {
        image: PathBuf,
        #[arg(long, help = "Write rectified board and overlay images here")]
        debug_dir: Option<PathBuf>,
    },
    /// Recommend a move and where to click for it
    Advise { image: PathBuf },
    /// Analyse a board stored as JSON `{board, player_color}`
    Solve { board_json: PathBuf },
    /// Play the strategist against the simulated opponent
    Play {
        #[arg(long, default_value = "black")]
        color: Color,
        #[arg(long, default_value = "medium")]
        strength: Strength,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Summarise algorithm performance across game logs
    Stats {
        #[arg(long)]
        logs_dir: Option<PathBuf>,
    },
}
