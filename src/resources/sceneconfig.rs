//! Scene configuration resource.
//!
//! Manages transform-system settings loaded from an INI configuration file.
//! Provides defaults for safe startup and methods to load/save configuration.
//!
//! # Configuration File Format
//!
//! ```ini
//! [transform]
//! composition = legacy
//! orphan_policy = reparent
//!
//! [handoff]
//! capacity = 2
//!
//! [log]
//! level = info
//!
//! [demo]
//! frames = 120
//! delta = 0.016
//! debris = 3
//! seed = 7
//! ```

use std::path::PathBuf;
use std::str::FromStr;

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::{LevelFilter, info};

use crate::resources::transformtree::{CompositionMode, OrphanPolicy, TransformTree};

/// Default safe values for startup
const DEFAULT_HANDOFF_CAPACITY: usize = 2;
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Info;
const DEFAULT_FRAMES: u32 = 120;
const DEFAULT_DELTA: f32 = 1.0 / 60.0;
const DEFAULT_DEBRIS: u32 = 3;
const DEFAULT_SEED: u64 = 7;
/// Upper bound for `[demo] debris`; larger values are clamped.
pub const MAX_DEBRIS: u32 = 10_000;
const DEFAULT_CONFIG_PATH: &str = "./scene.ini";

/// Scene configuration resource.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct SceneConfig {
    /// How child local poses compose with their parent's world pose.
    pub composition: CompositionMode,
    /// What happens to children when their parent's transform is removed.
    pub orphan_policy: OrphanPolicy,
    /// Frames the logic thread may run ahead of the render thread.
    pub handoff_capacity: usize,
    pub log_level: LevelFilter,
    /// Frames simulated by the demo binary.
    pub frames: u32,
    /// Fixed frame delta in seconds for the demo.
    pub delta: f32,
    /// Number of debris entities scattered on the demo platform.
    pub debris: u32,
    pub seed: u64,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneConfig {
    /// Create a new configuration with safe default values.
    pub fn new() -> Self {
        Self {
            composition: CompositionMode::default(),
            orphan_policy: OrphanPolicy::default(),
            handoff_capacity: DEFAULT_HANDOFF_CAPACITY,
            log_level: DEFAULT_LOG_LEVEL,
            frames: DEFAULT_FRAMES,
            delta: DEFAULT_DELTA,
            debris: DEFAULT_DEBRIS,
            seed: DEFAULT_SEED,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a new configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current (default) values.
    /// Returns an error if the file cannot be read or a value is invalid.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;
        self.apply_ini(&config)?;
        info!(
            "Loaded config from {:?}: composition={}, orphan_policy={}, handoff={}, log={}",
            self.config_path,
            self.composition,
            self.orphan_policy,
            self.handoff_capacity,
            self.log_level
        );
        Ok(())
    }

    /// Load configuration from INI text.
    pub fn load_from_str(&mut self, content: &str) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        self.apply_ini(&config)
    }

    fn apply_ini(&mut self, config: &Ini) -> Result<(), String> {
        // [transform] section
        if let Some(mode) = config.get("transform", "composition") {
            self.composition = CompositionMode::from_str(&mode)?;
        }
        if let Some(policy) = config.get("transform", "orphan_policy") {
            self.orphan_policy = OrphanPolicy::from_str(&policy)?;
        }

        // [handoff] section
        if let Some(capacity) = config.getuint("handoff", "capacity")? {
            self.handoff_capacity = (capacity as usize).max(1);
        }

        // [log] section
        if let Some(level) = config.get("log", "level") {
            self.log_level = LevelFilter::from_str(level.trim())
                .map_err(|_| format!("Invalid log level '{}'", level))?;
        }

        // [demo] section
        if let Some(frames) = config.getuint("demo", "frames")? {
            self.frames = u32::try_from(frames)
                .map_err(|_| format!("[demo] frames = {} is out of range", frames))?;
        }
        if let Some(delta) = config.getfloat("demo", "delta")? {
            self.delta = delta as f32;
        }
        if let Some(debris) = config.getuint("demo", "debris")? {
            self.debris = u32::try_from(debris)
                .map_err(|_| format!("[demo] debris = {} is out of range", debris))?
                .min(MAX_DEBRIS);
        }
        if let Some(seed) = config.getuint("demo", "seed")? {
            self.seed = seed;
        }
        Ok(())
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        // [transform] section
        config.set("transform", "composition", Some(self.composition.to_string()));
        config.set("transform", "orphan_policy", Some(self.orphan_policy.to_string()));

        // [handoff] section
        config.set("handoff", "capacity", Some(self.handoff_capacity.to_string()));

        // [log] section
        config.set("log", "level", Some(self.log_level.to_string().to_lowercase()));

        // [demo] section
        config.set("demo", "frames", Some(self.frames.to_string()));
        config.set("demo", "delta", Some(self.delta.to_string()));
        config.set("demo", "debris", Some(self.debris.to_string()));
        config.set("demo", "seed", Some(self.seed.to_string()));

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }

    /// Push the `[transform]` settings into a tree.
    pub fn apply_to_tree(&self, tree: &mut TransformTree) {
        tree.set_mode(self.composition);
        tree.set_orphan_policy(self.orphan_policy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SceneConfig::default();
        assert_eq!(config.composition, CompositionMode::Legacy);
        assert_eq!(config.orphan_policy, OrphanPolicy::ReparentToGrandparent);
        assert_eq!(config.handoff_capacity, 2);
        assert_eq!(config.log_level, LevelFilter::Info);
        assert_eq!(config.config_path, PathBuf::from("./scene.ini"));
    }

    #[test]
    fn test_load_from_str_overrides_present_keys_only() {
        let mut config = SceneConfig::new();
        config
            .load_from_str("[transform]\ncomposition = affine\n\n[demo]\nframes = 10\n")
            .unwrap();
        assert_eq!(config.composition, CompositionMode::Affine);
        assert_eq!(config.frames, 10);
        assert_eq!(config.orphan_policy, OrphanPolicy::ReparentToGrandparent);
        assert_eq!(config.debris, 3);
    }

    #[test]
    fn test_load_from_str_rejects_unknown_mode() {
        let mut config = SceneConfig::new();
        let err = config
            .load_from_str("[transform]\ncomposition = matrix\n")
            .unwrap_err();
        assert!(err.contains("matrix"), "{}", err);
    }

    #[test]
    fn test_load_from_str_parses_policy_and_log_level() {
        let mut config = SceneConfig::new();
        config
            .load_from_str("[transform]\norphan_policy = forbid\n[log]\nlevel = debug\n[handoff]\ncapacity = 0\n")
            .unwrap();
        assert_eq!(config.orphan_policy, OrphanPolicy::Forbid);
        assert_eq!(config.log_level, LevelFilter::Debug);
        // Capacity is clamped so the channel can hold at least one frame.
        assert_eq!(config.handoff_capacity, 1);
    }

    #[test]
    fn test_load_from_str_rejects_frames_beyond_u32() {
        let mut config = SceneConfig::new();
        let err = config
            .load_from_str("[demo]\nframes = 5000000000\n")
            .unwrap_err();
        assert!(err.contains("frames"), "{}", err);
        assert_eq!(config.frames, 120);

        let err = config
            .load_from_str("[demo]\ndebris = 5000000000\n")
            .unwrap_err();
        assert!(err.contains("debris"), "{}", err);
    }

    #[test]
    fn test_load_from_str_clamps_debris() {
        let mut config = SceneConfig::new();
        config.load_from_str("[demo]\ndebris = 4000000000\n").unwrap();
        assert_eq!(config.debris, MAX_DEBRIS);
    }

    #[test]
    fn test_save_then_load_from_file() {
        let path = std::env::temp_dir().join(format!(
            "scenetransform-config-{}.ini",
            std::process::id()
        ));
        let mut saved = SceneConfig::with_path(&path);
        saved.composition = CompositionMode::Affine;
        saved.orphan_policy = OrphanPolicy::DetachToRoot;
        saved.seed = 99;
        saved.save_to_file().unwrap();

        let mut loaded = SceneConfig::with_path(&path);
        loaded.load_from_file().unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded.composition, CompositionMode::Affine);
        assert_eq!(loaded.orphan_policy, OrphanPolicy::DetachToRoot);
        assert_eq!(loaded.seed, 99);
    }

    #[test]
    fn test_apply_to_tree() {
        let mut config = SceneConfig::new();
        config.composition = CompositionMode::Affine;
        config.orphan_policy = OrphanPolicy::Forbid;
        let mut tree = TransformTree::new();
        config.apply_to_tree(&mut tree);
        assert_eq!(tree.mode(), CompositionMode::Affine);
        assert_eq!(tree.orphan_policy(), OrphanPolicy::Forbid);
    }
}
