// config.rs
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "MESHROAM_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "meshroam.json";
pub const SCENE_ENV: &str = "MESHROAM_SCENE";
pub const PLAYER_ENV: &str = "MESHROAM_PLAYER";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io { path: PathBuf, #[source] source: std::io::Error },
    #[error("failed to parse config {path}: {source}")]
    Parse { path: PathBuf, #[source] source: serde_json::Error },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Startup settings. Every field falls back to its default when absent from the file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    // --- Window ---
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub fullscreen: bool,

    // --- Assets ---
    pub scene_mesh: PathBuf,
    pub player_mesh: PathBuf,
    /// Abort startup on a failed mesh load instead of drawing nothing.
    pub strict_assets: bool,

    // --- Movement ---
    pub move_speed: f32,
    pub mouse_sensitivity: f32,
    pub start_position: [f32; 3],
    pub start_yaw_deg: f32,
    pub start_pitch_deg: f32,

    // --- Rendering ---
    pub fov_y_deg: f32,
    pub z_near: f32,
    pub z_far: f32,
    /// (unused, height, back distance) relative to the player.
    pub camera_offset: [f32; 3],
    pub player_yaw_correction_deg: f32,
    pub clear_color: [f64; 3],
    pub msaa_samples: u32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window_title: "MeshRoam".to_string(),
            window_width: 1920,
            window_height: 1080,
            fullscreen: false,
            scene_mesh: PathBuf::from("assets/scene.obj"),
            player_mesh: PathBuf::from("assets/player.obj"),
            strict_assets: false,
            move_speed: 10.0,
            mouse_sensitivity: 0.1,
            start_position: [30.2, 28.0, 0.0],
            start_yaw_deg: -90.0,
            start_pitch_deg: 0.0,
            fov_y_deg: 45.0,
            z_near: 0.1,
            z_far: 1000.0,
            camera_offset: [10.0, 3.0, 10.0],
            player_yaw_correction_deg: 90.0,
            clear_color: [0.2, 0.3, 0.3],
            msaa_samples: 4,
        }
    }
}

impl ViewerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let cfg: Self = serde_json::from_str(&text)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// `$MESHROAM_CONFIG`, then `./meshroam.json`, then defaults. Mesh paths can be
    /// overridden individually through `$MESHROAM_SCENE` / `$MESHROAM_PLAYER`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(Path::new(&path))?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Self::load(Path::new(DEFAULT_CONFIG_FILE))?,
            None => Self::default(),
        };
        if let Some(p) = std::env::var_os(SCENE_ENV) {
            cfg.scene_mesh = PathBuf::from(p);
        }
        if let Some(p) = std::env::var_os(PLAYER_ENV) {
            cfg.player_mesh = PathBuf::from(p);
        }
        log::debug!("config: {cfg:?}");
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let fail = |msg: String| Err(ConfigError::Invalid(msg));
        if self.window_width == 0 || self.window_height == 0 {
            return fail(format!("window size {}x{} must be non-zero", self.window_width, self.window_height));
        }
        if !(self.z_near > 0.0 && self.z_far > self.z_near) {
            return fail(format!("clip planes must satisfy 0 < near < far (got {} / {})", self.z_near, self.z_far));
        }
        if !(self.fov_y_deg > 0.0 && self.fov_y_deg < 180.0) {
            return fail(format!("fov_y_deg {} outside (0, 180)", self.fov_y_deg));
        }
        if self.move_speed.is_nan() || self.move_speed < 0.0 {
            return fail(format!("move_speed {} must be >= 0", self.move_speed));
        }
        if !self.mouse_sensitivity.is_finite() {
            return fail("mouse_sensitivity must be finite".to_string());
        }
        if !matches!(self.msaa_samples, 1 | 4) {
            return fail(format!("msaa_samples {} must be 1 or 4", self.msaa_samples));
        }
        Ok(())
    }
}
