use crate::error::AppError;
use crate::vision::color::HsvRange;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top level settings, layered from defaults, an optional TOML file and
/// `REVERSI__<SECTION>__<KEY>` environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub vision: VisionSettings,
    pub search: SearchSettings,
    pub advisor: AdvisorSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VisionSettings {
    pub blur_kernel: u32,
    pub threshold_block_size: u32,
    pub threshold_c: f32,
    pub min_board_area: f64,
    pub approx_epsilon_ratio: f64,
    pub cell_sample_ratio: f32,
    pub cell_fill_ratio: f32,
    pub badge_fill_ratio: f32,
    pub colors: ColorThresholds,
    pub debug_dir: Option<PathBuf>,
}

/// HSV ranges in OpenCV 8-bit scale (H in 0..180).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ColorThresholds {
    pub white_disc: HsvRange,
    pub black_disc: HsvRange,
    pub highlight: HsvRange,
    pub board_green: HsvRange,
    pub badge_white: HsvRange,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub max_time_ms: u64,
    pub mcts_iterations: u32,
    pub mcts_exploration: f64,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Opening book, corners and phase-dependent search.
    Adaptive,
    /// Single-ply corner/edge/flip scoring.
    Greedy,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdvisorSettings {
    pub strategy: StrategyKind,
    pub step_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
    pub game_log_dir: PathBuf,
}

impl Default for VisionSettings {
    fn default() -> Self {
        Self {
            blur_kernel: 5,
            threshold_block_size: 11,
            threshold_c: 2.0,
            min_board_area: 1000.0,
            approx_epsilon_ratio: 0.02,
            cell_sample_ratio: 0.25,
            cell_fill_ratio: 0.2,
            badge_fill_ratio: 0.3,
            colors: ColorThresholds::default(),
            debug_dir: None,
        }
    }
}

impl Default for ColorThresholds {
    fn default() -> Self {
        Self {
            white_disc: HsvRange::new([80, 10, 180], [120, 50, 255]), // light blue-ish discs
            black_disc: HsvRange::new([0, 0, 0], [180, 255, 60]),
            highlight: HsvRange::new([25, 100, 100], [35, 255, 255]),
            board_green: HsvRange::new([40, 40, 40], [80, 255, 255]),
            badge_white: HsvRange::new([0, 0, 180], [180, 30, 255]),
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_time_ms: 500,
            mcts_iterations: 3000,
            mcts_exploration: 1.414,
            seed: None,
        }
    }
}

impl Default for AdvisorSettings {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::Adaptive,
            step_timeout_ms: None,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            game_log_dir: PathBuf::from("logs"),
        }
    }
}

impl Settings {
    /// Load settings from an optional file plus the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("REVERSI")
                .separator("__")
                .try_parsing(true),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings
            .validate()
            .map_err(|e| AppError::Config(config::ConfigError::Message(e)))?;
        Ok(settings)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), String> {
        self.vision.validate()?;

        if self.search.max_time_ms == 0 {
            return Err("Search time budget must be greater than 0".to_string());
        }

        if self.search.mcts_iterations == 0 {
            return Err("MCTS iterations must be greater than 0".to_string());
        }

        if self.search.mcts_exploration < 0.0 {
            return Err("MCTS exploration weight must not be negative".to_string());
        }

        Ok(())
    }
}

impl VisionSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.blur_kernel % 2 == 0 {
            return Err(format!("Blur kernel must be odd, got {}", self.blur_kernel));
        }

        if self.threshold_block_size < 3 || self.threshold_block_size % 2 == 0 {
            return Err(format!(
                "Threshold block size must be odd and at least 3, got {}",
                self.threshold_block_size
            ));
        }

        for (name, ratio) in [
            ("cell_sample_ratio", self.cell_sample_ratio),
            ("cell_fill_ratio", self.cell_fill_ratio),
            ("badge_fill_ratio", self.badge_fill_ratio),
        ] {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(format!("{name} must be between 0.0 and 1.0"));
            }
        }

        Ok(())
    }

    /// Set the directory that receives debug renderings
    pub fn with_debug_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.debug_dir = Some(dir.into());
        self
    }

    /// Override the adaptive threshold block size
    pub fn with_block_size(mut self, block_size: u32) -> Self {
        self.threshold_block_size = block_size;
        self
    }
}

impl SearchSettings {
    pub fn time_budget(&self) -> Duration {
        Duration::from_millis(self.max_time_ms)
    }

    /// Fix the random seed for reproducible MCTS playouts
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_time_ms(mut self, max_time_ms: u64) -> Self {
        self.max_time_ms = max_time_ms;
        self
    }
}

impl AdvisorSettings {
    pub fn step_timeout(&self) -> Option<Duration> {
        self.step_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_reference_pipeline() {
        let settings = Settings::default();
        assert_eq!(settings.vision.blur_kernel, 5);
        assert_eq!(settings.vision.threshold_block_size, 11);
        assert_eq!(settings.vision.threshold_c, 2.0);
        assert_eq!(settings.advisor.strategy, StrategyKind::Adaptive);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn even_block_size_is_rejected() {
        let mut settings = Settings::default();
        settings.vision = settings.vision.with_block_size(10);
        assert!(settings.validate().unwrap_err().contains("block size"));
    }

    #[test]
    fn loads_partial_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[search]\nmax_time_ms = 50\nseed = 7\n\n[advisor]\nstrategy = \"greedy\"\n\n[vision.colors]\nblack_disc = {{ lower = [0, 0, 0], upper = [180, 255, 40] }}"
        )
        .unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.search.max_time_ms, 50);
        assert_eq!(settings.search.seed, Some(7));
        assert_eq!(settings.advisor.strategy, StrategyKind::Greedy);
        assert_eq!(settings.vision.colors.black_disc.upper, [180, 255, 40]);
        assert_eq!(settings.vision.threshold_block_size, 11);
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = Settings::load(Some(Path::new("/definitely/not/here.toml")));
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
