use std::fmt;

/// Errors raised while looking up or loading palettes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaletteError {
    /// A render or leaf-generation step needed a color slot the palette
    /// does not define.
    MissingKey(String),
    /// A palette book did not contain the requested palette name.
    UnknownPalette(String),
    /// A palette file could not be parsed.
    Parse(String),
}

impl fmt::Display for PaletteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaletteError::MissingKey(key) => write!(f, "Missing key '{}' in palette", key),
            PaletteError::UnknownPalette(name) => write!(f, "Palette '{}' not found", name),
            PaletteError::Parse(msg) => write!(f, "Invalid palette file: {}", msg),
        }
    }
}

impl std::error::Error for PaletteError {}

impl From<serde_json::Error> for PaletteError {
    fn from(err: serde_json::Error) -> Self {
        PaletteError::Parse(err.to_string())
    }
}

/// Errors raised while loading or checking tuning parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A config file could not be parsed.
    Parse(String),
    /// A field holds a value growth or rendering cannot work with.
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse(msg) => write!(f, "Invalid config file: {}", msg),
            ConfigError::Invalid { field, reason } => {
                write!(f, "Invalid config value '{}': {}", field, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

/// Errors raised while creating a [`crate::plant::Plant`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlantError {
    Palette(PaletteError),
    Config(ConfigError),
}

impl fmt::Display for PlantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlantError::Palette(e) => e.fmt(f),
            PlantError::Config(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for PlantError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlantError::Palette(e) => Some(e),
            PlantError::Config(e) => Some(e),
        }
    }
}

impl From<PaletteError> for PlantError {
    fn from(err: PaletteError) -> Self {
        PlantError::Palette(err)
    }
}

impl From<ConfigError> for PlantError {
    fn from(err: ConfigError) -> Self {
        PlantError::Config(err)
    }
}
