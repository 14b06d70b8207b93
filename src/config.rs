use crate::{
    relay::MailSettings,
    render::Camera,
    swarm::{AnimatorSettings, Palette, ScatterField, SwarmError},
    viewport::{Variant, ViewportProfiles},
    visibility::ScrollFade,
};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::{
    fs, io,
    path::{Path, PathBuf},
};

const APPLICATION: &str = "glyph-swarm";

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Config {
    /// Settings shared by every swarm.
    pub(crate) swarm: AnimatorSettings,

    /// The hero section visual.
    pub(crate) hero: HeroConfig,

    /// The page-wide block overlay.
    pub(crate) fullscreen: FullscreenConfig,

    pub(crate) preview: PreviewConfig,

    pub(crate) relay: RelayConfig,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct HeroConfig {
    /// Overrides the swarm palette for this variant.
    pub(crate) palette: Option<Palette>,

    /// Overrides the swarm scatter field for this variant.
    pub(crate) scatter: Option<ScatterField>,

    pub(crate) viewport: ViewportProfiles,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct FullscreenConfig {
    /// Overrides the swarm palette for this variant.
    pub(crate) palette: Option<Palette>,

    /// Overrides the swarm scatter field for this variant.
    pub(crate) scatter: Option<ScatterField>,

    pub(crate) viewport: ViewportProfiles,

    /// How the overlay fades out as the page scrolls.
    pub(crate) scroll: ScrollFade,
}

impl Default for FullscreenConfig {
    fn default() -> Self {
        Self {
            palette: Some(Palette::Multicolor),
            scatter: Some(ScatterField::Box { spread: 15.0 }),
            viewport: ViewportProfiles::fullscreen_blocks(),
            scroll: ScrollFade::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct PreviewConfig {
    /// Frames per second the preview is drawn at.
    pub(crate) fps: u32,

    pub(crate) camera: Camera,

    /// Pixels scrolled per arrow key press.
    pub(crate) scroll_step: f32,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self { fps: 30, camera: Camera::default(), scroll_step: 40.0 }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct RelayConfig {
    /// Where relayed messages are written; defaults to the user's data directory.
    pub(crate) outbox: Option<PathBuf>,

    pub(crate) mail: MailSettings,
}

impl RelayConfig {
    pub(crate) fn outbox_dir(&self) -> PathBuf {
        if let Some(outbox) = &self.outbox {
            return outbox.clone();
        }
        match ProjectDirs::from("", "", APPLICATION) {
            Some(dirs) => dirs.data_dir().join("outbox"),
            None => PathBuf::from("outbox"),
        }
    }
}

/// Errors that can occur when loading the configuration
#[derive(thiserror::Error, Debug)]
pub(crate) enum ConfigError {
    #[error("reading {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("parsing config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(#[from] SwarmError),
}

impl Config {
    /// The config file looked up when none is given explicitly.
    pub(crate) fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APPLICATION).map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Load `path` if given, else the default config file if it exists, else the defaults.
    pub(crate) fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => {
                log::debug!("no config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub(crate) fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        log::info!("loading config from {}", path.display());
        Self::from_yaml(&contents)
    }

    /// Parse a config, layering whatever it sets over the defaults.
    pub(crate) fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let overrides: Value = serde_yaml::from_str(contents)?;
        let mut merged = serde_yaml::to_value(Self::default())?;
        // an empty document sets nothing
        if !overrides.is_null() {
            merge(&mut merged, overrides);
        }
        let config: Self = serde_yaml::from_value(merged)?;
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn validate(&self) -> Result<(), SwarmError> {
        self.settings_for(Variant::Hero).validate()?;
        self.settings_for(Variant::Fullscreen).validate()?;
        self.hero.viewport.validate()?;
        self.fullscreen.viewport.validate()?;
        if !self.fullscreen.scroll.is_valid() {
            return Err(SwarmError::InvalidParameter("scroll fade start", self.fullscreen.scroll.start as f64));
        }
        if self.preview.fps == 0 {
            return Err(SwarmError::InvalidParameter("fps", 0.0));
        }
        if !self.preview.scroll_step.is_finite() || self.preview.scroll_step <= 0.0 {
            return Err(SwarmError::InvalidParameter("scroll step", self.preview.scroll_step as f64));
        }
        self.preview.camera.validate()
    }

    /// The swarm settings for a variant, with its overrides applied.
    pub(crate) fn settings_for(&self, variant: Variant) -> AnimatorSettings {
        let (palette, scatter) = match variant {
            Variant::Hero => (self.hero.palette, self.hero.scatter),
            Variant::Fullscreen => (self.fullscreen.palette, self.fullscreen.scatter),
        };
        AnimatorSettings {
            palette: palette.unwrap_or(self.swarm.palette),
            scatter: scatter.unwrap_or(self.swarm.scatter),
            ..self.swarm.clone()
        }
    }

    pub(crate) fn profiles_for(&self, variant: Variant) -> &ViewportProfiles {
        match variant {
            Variant::Hero => &self.hero.viewport,
            Variant::Fullscreen => &self.fullscreen.viewport,
        }
    }

    /// The scroll fade applied to a variant, if any.
    pub(crate) fn fade_for(&self, variant: Variant) -> Option<ScrollFade> {
        match variant {
            Variant::Hero => None,
            Variant::Fullscreen => Some(self.fullscreen.scroll),
        }
    }
}

// Mappings merge key by key; anything else, null included, replaces the base value.
fn merge(base: &mut Value, overrides: Value) {
    match (base, overrides) {
        (Value::Mapping(base), Value::Mapping(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overrides) => *base = overrides,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::swarm::{GlyphLayout, Phase};
    use std::io::Write;

    #[test]
    fn empty_file_is_the_defaults() {
        assert_eq!(Config::from_yaml("").unwrap(), Config::default());
    }

    #[test]
    fn defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn overrides_merge_onto_defaults() {
        let config = Config::from_yaml(
            r"
swarm:
  durations:
    formed: 5
  seed: 7
fullscreen:
  viewport:
    narrow:
      particle_count: 90
",
        )
        .unwrap();
        assert_eq!(config.swarm.durations.formed, 5.0);
        assert_eq!(config.swarm.durations.gathering, 2.5);
        assert_eq!(config.swarm.seed, Some(7));

        // untouched siblings keep their own defaults, not the generic ones
        let narrow = &config.fullscreen.viewport.narrow;
        assert_eq!(narrow.particle_count, 90);
        assert_eq!(narrow.layout, GlyphLayout::Blocks);
        assert_eq!(narrow.block_size, 0.15);
        assert_eq!(config.fullscreen.viewport.wide, ViewportProfiles::fullscreen_blocks().wide);
    }

    #[test]
    fn scatter_shape_can_change() {
        let config = Config::from_yaml("swarm:\n  scatter:\n    shape: box\n    spread: 12\n").unwrap();
        // a box reports its spread, the default annulus its outer radius
        assert_eq!(config.swarm.scatter.radius(), 12.0);
    }

    #[test]
    fn null_clears_optional_defaults() {
        let config = Config::from_yaml(
            r"
swarm:
  seed: null
fullscreen:
  palette: null
  scatter: null
  viewport:
    large_scene: null
relay:
  outbox: null
",
        )
        .unwrap();
        assert_eq!(config.swarm.seed, None);
        assert_eq!(config.fullscreen.palette, None);
        assert_eq!(config.fullscreen.viewport.large_scene, None);
        assert_eq!(config.relay.outbox, None);

        // cleared overrides fall back to the shared swarm settings
        let settings = config.settings_for(Variant::Fullscreen);
        assert_eq!(settings.palette, config.swarm.palette);
        assert_eq!(settings.scatter, config.swarm.scatter);
    }

    #[test]
    fn null_clears_a_seed_set_earlier_in_the_defaults() {
        let seeded = Config { swarm: AnimatorSettings { seed: Some(3), ..Default::default() }, ..Default::default() };
        let mut merged = serde_yaml::to_value(seeded).unwrap();
        merge(&mut merged, serde_yaml::from_str("swarm:\n  seed: ~\n").unwrap());
        let config: Config = serde_yaml::from_value(merged).unwrap();
        assert_eq!(config.swarm.seed, None);
    }

    #[test]
    fn fullscreen_scatters_in_a_box() {
        let config = Config::default();
        assert_eq!(config.settings_for(Variant::Fullscreen).scatter, ScatterField::Box { spread: 15.0 });
        assert_eq!(config.settings_for(Variant::Hero).scatter, ScatterField::default());
    }

    #[test]
    fn invalid_durations_are_rejected() {
        let error = Config::from_yaml("swarm:\n  durations:\n    gathering: 0\n").unwrap_err();
        assert!(matches!(error, ConfigError::Invalid(SwarmError::InvalidDuration(Phase::Gathering, _))));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let error = Config::from_yaml("swarm:\n  particle_size: 3\n").unwrap_err();
        assert!(matches!(error, ConfigError::Parse(_)));
    }

    #[test]
    fn inverted_scroll_fade_is_rejected() {
        let error = Config::from_yaml("fullscreen:\n  scroll:\n    start: 0.9\n    end: 0.1\n").unwrap_err();
        assert!(matches!(error, ConfigError::Invalid(_)));
    }

    #[test]
    fn variant_palettes() {
        let config = Config::default();
        assert_eq!(config.settings_for(Variant::Hero).palette, Palette::Frost);
        assert_eq!(config.settings_for(Variant::Fullscreen).palette, Palette::Multicolor);
        assert!(config.fade_for(Variant::Hero).is_none());
        assert_eq!(config.profiles_for(Variant::Fullscreen), &ViewportProfiles::fullscreen_blocks());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("no temp file");
        writeln!(file, "preview:\n  fps: 12\nrelay:\n  mail:\n    recipient: team@example.org").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.preview.fps, 12);
        assert_eq!(config.relay.mail.recipient, "team@example.org");
        assert_eq!(config.relay.mail.from_name, MailSettings::default().from_name);
    }

    #[test]
    fn missing_file_reports_the_path() {
        let dir = tempfile::tempdir().expect("no temp dir");
        let path = dir.path().join("nope.yaml");
        let error = Config::resolve(Some(&path)).unwrap_err();
        assert!(matches!(error, ConfigError::Io { path: reported, .. } if reported == path));
    }

    #[test]
    fn explicit_outbox_wins() {
        let config = RelayConfig { outbox: Some("/tmp/outbox".into()), ..Default::default() };
        assert_eq!(config.outbox_dir(), PathBuf::from("/tmp/outbox"));
    }
}
