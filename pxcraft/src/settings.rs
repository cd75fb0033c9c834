//! User preferences, stored as TOML in the platform preferences directory.

use std::path::PathBuf;

use pxcraft_core::raster::Filter;

const DOCUMENTATION: &str = r#"# pxcraft settings.
#
# filter:         resampling used when resizing. One of "nearest", "triangle",
#                 "catmull_rom", "lanczos3".
# thumbnail_edge: longest edge of layer icons, in pixels.
# history_depth:  canvas operations kept for undo.
# log_level:      one of "off", "error", "warn", "info", "debug", "trace".
#
# Missing entries take their default.

"#;

/// Where settings live, or `None` if the platform has no such place.
pub fn preferences_dir() -> Option<PathBuf> {
    let mut base_dir = dirs::preference_dir()?;
    base_dir.push(env!("CARGO_PKG_NAME"));
    Some(base_dir)
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub filter: String,
    pub thumbnail_edge: u32,
    pub history_depth: usize,
    pub log_level: String,
    /// Set if this was created from default because the file was missing or unreadable.
    #[serde(skip)]
    failed_to_load: bool,
}
impl Default for Settings {
    fn default() -> Self {
        Self {
            filter: Filter::default().to_string(),
            thumbnail_edge: pxcraft_core::state::layer::DEFAULT_THUMBNAIL_EDGE,
            history_depth: pxcraft_core::history::DEFAULT_LIMIT,
            log_level: log::LevelFilter::Info.to_string().to_lowercase(),
            failed_to_load: false,
        }
    }
}

impl Settings {
    const FILENAME: &'static str = "settings.toml";

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        let mut path = preferences_dir()?;
        path.push(Self::FILENAME);
        Some(path)
    }
    /// Settings of this run, loaded on first access.
    #[must_use]
    pub fn get() -> &'static Self {
        static SETTINGS: std::sync::OnceLock<Settings> = std::sync::OnceLock::new();
        SETTINGS.get_or_init(Self::load_or_default)
    }
    #[must_use]
    pub fn did_fail_to_load(&self) -> bool {
        self.failed_to_load
    }
    fn load_or_default() -> Self {
        let loaded: anyhow::Result<Self> = try_block::try_block! {
            let path = Self::path().ok_or_else(|| anyhow::anyhow!("no preferences directory"))?;
            let string = std::fs::read_to_string(path)?;
            Ok(Self::parse(&string)?)
        };

        loaded.unwrap_or_else(|_| Self {
            failed_to_load: true,
            ..Self::default()
        })
    }
    pub fn parse(string: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(string)
    }
    #[must_use]
    pub fn to_documented_string(&self) -> Option<String> {
        let body = toml::ser::to_string_pretty(self).ok()?;
        Some(DOCUMENTATION.to_owned() + &body)
    }
    /// Write these settings out, along with a description of each entry.
    pub fn save(&self) -> anyhow::Result<()> {
        let dir = preferences_dir().ok_or_else(|| anyhow::anyhow!("no preferences directory"))?;
        std::fs::create_dir_all(&dir)?;
        let string = self
            .to_documented_string()
            .ok_or_else(|| anyhow::anyhow!("settings couldn't be serialized"))?;
        std::fs::write(dir.join(Self::FILENAME), string)?;
        Ok(())
    }
    /// The configured resampling filter. Unknown names fall back to the default, with a warning.
    #[must_use]
    pub fn filter(&self) -> Filter {
        self.filter.parse().unwrap_or_else(|_| {
            log::warn!("unknown filter {:?} in settings", self.filter);
            Filter::default()
        })
    }
    #[must_use]
    pub fn log_level(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
    #[must_use]
    pub fn editor_config(&self) -> pxcraft_core::editor::EditorConfig {
        pxcraft_core::editor::EditorConfig {
            history_limit: self.history_depth,
            thumbnail_edge: self.thumbnail_edge.max(1),
        }
    }
}
