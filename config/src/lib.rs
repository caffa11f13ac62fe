use std::fmt;
use std::path::{Path, PathBuf};

use egui::Color32;
use once_cell::sync::Lazy;
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use tokenizing::ColorScheme;

pub static CONFIG: Lazy<Config> = Lazy::new(|| Config::parse(commands::ARGS.config.as_deref()));

/// Name of the config looked up in the working directory.
const LOCAL_CONFIG: &str = "unmangle.yaml";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub colors: Colors,
    #[serde(default)]
    pub output: Output,
}

#[derive(Debug, Deserialize)]
pub struct Colors {
    #[serde(default = "defaults::item", deserialize_with = "color32")]
    pub item: Color32,
    #[serde(default = "defaults::known", deserialize_with = "color32")]
    pub known: Color32,
    #[serde(default = "defaults::delimiter", deserialize_with = "color32")]
    pub delimiter: Color32,
    #[serde(default = "defaults::brackets", deserialize_with = "color32")]
    pub brackets: Color32,
    #[serde(default = "defaults::special", deserialize_with = "color32")]
    pub special: Color32,
    #[serde(default = "defaults::annotation", deserialize_with = "color32")]
    pub annotation: Color32,
    #[serde(default = "defaults::comment", deserialize_with = "color32")]
    pub comment: Color32,
}

#[derive(Debug, Deserialize)]
pub struct Output {
    /// Emit ANSI color escapes.
    #[serde(default = "defaults::enabled")]
    pub color: bool,
    /// Worker threads used for demangling, 0 uses every core.
    #[serde(default)]
    pub threads: usize,
    /// Print symbols that fail to demangle as they are.
    #[serde(default = "defaults::enabled")]
    pub fallback: bool,
}

impl Default for Colors {
    fn default() -> Self {
        Self {
            item: defaults::item(),
            known: defaults::known(),
            delimiter: defaults::delimiter(),
            brackets: defaults::brackets(),
            special: defaults::special(),
            annotation: defaults::annotation(),
            comment: defaults::comment(),
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self {
            color: true,
            threads: 0,
            fallback: true,
        }
    }
}

impl Colors {
    /// Map one of the colorscheme's token colors onto the configured one.
    pub fn get_by_color(&self, color: &Color32) -> Color32 {
        type Scheme = tokenizing::Colors;

        match *color {
            c if c == *Scheme::item() => self.item,
            c if c == *Scheme::known() => self.known,
            c if c == *Scheme::delimiter() => self.delimiter,
            c if c == *Scheme::brackets() => self.brackets,
            c if c == *Scheme::special() => self.special,
            c if c == *Scheme::annotation() => self.annotation,
            c if c == *Scheme::comment() => self.comment,
            c => c,
        }
    }
}

/// Default color values when one is missing in the config's colors field.
mod defaults {
    use egui::Color32;
    use tokenizing::{ColorScheme, Colors};

    pub fn enabled() -> bool {
        true
    }

    pub fn item() -> Color32 {
        *Colors::item()
    }
    pub fn known() -> Color32 {
        *Colors::known()
    }
    pub fn delimiter() -> Color32 {
        *Colors::delimiter()
    }
    pub fn brackets() -> Color32 {
        *Colors::brackets()
    }
    pub fn special() -> Color32 {
        *Colors::special()
    }
    pub fn annotation() -> Color32 {
        *Colors::annotation()
    }
    pub fn comment() -> Color32 {
        *Colors::comment()
    }
}

impl Config {
    /// Read the config at `path`, or else the first one found in the working
    /// directory or the user's config directory.
    pub fn parse(path: Option<&Path>) -> Self {
        // a config named on the command line failing is louder than one we
        // went looking for
        let explicit = path.is_some();

        let path = match path {
            Some(path) => Some(path.to_path_buf()),
            None => Self::locate(),
        };

        let path = match path {
            Some(path) => path,
            None => return Self::default(),
        };

        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if explicit => {
                log::strong!("Failed to read config {path:?}: {err}.");
                return Self::default();
            }
            Err(err) => {
                log::warning!("Failed to read config {path:?}: {err}.");
                return Self::default();
            }
        };

        match Self::from_yaml(&raw) {
            Ok(parsed) => {
                log::notify!("Loaded config {path:?}.");
                parsed
            }
            Err(err) if explicit => {
                log::strong!("Failed to parse config {path:?}.\nError: {err}.");
                Self::default()
            }
            Err(err) => {
                log::warning!("Failed to parse config {path:?}.\nError: {err}.");

                // parse everything as default
                Self::default()
            }
        }
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(raw)
    }

    fn locate() -> Option<PathBuf> {
        let local = PathBuf::from(LOCAL_CONFIG);
        if local.is_file() {
            return Some(local);
        }

        let mut path = dirs::config_dir()?;
        path.push("unmangle");
        path.push("config.yaml");
        path.is_file().then_some(path)
    }
}

fn color32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Color32, D::Error> {
    struct ColorParsing;
    impl<'de> Visitor<'de> for ColorParsing {
        type Value = Color32;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("expected hex color values")
        }

        fn visit_str<E: de::Error>(self, s: &str) -> Result<Self::Value, E> {
            Color32::from_hex(s).map_err(|err| E::custom(format!("{err:?}")))
        }
    }

    deserializer.deserialize_str(ColorParsing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokenizing::colors;

    #[test]
    fn empty_config_is_default() {
        let config = Config::from_yaml("").unwrap();

        assert_eq!(config.colors.item, colors::MAGENTA);
        assert!(config.output.color);
        assert!(config.output.fallback);
        assert_eq!(config.output.threads, 0);
    }

    #[test]
    fn overrides() {
        let config = Config::from_yaml(
            "colors:\n  item: \"#102030\"\noutput:\n  color: false\n  threads: 2\n",
        )
        .unwrap();

        assert_eq!(config.colors.item, Color32::from_rgb(0x10, 0x20, 0x30));
        assert_eq!(config.colors.known, colors::PURPLE);
        assert!(!config.output.color);
        assert!(config.output.fallback);
        assert_eq!(config.output.threads, 2);
    }

    #[test]
    fn malformed_colors() {
        assert!(Config::from_yaml("colors:\n  item: \"not a color\"\n").is_err());
        assert!(Config::from_yaml("colors:\n  item: 12\n").is_err());
    }

    #[test]
    fn unusable_config_falls_back() {
        let path = std::env::temp_dir().join(format!("unmangle-{}-bad.yaml", std::process::id()));
        std::fs::write(&path, "colors:\n  item: \"#zzzzzz\"\n").unwrap();

        let config = Config::parse(Some(&path));
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.colors.item, colors::MAGENTA);
        assert!(log::logger().format(false).contains("Failed to parse config"));

        let missing = Path::new("/definitely/not/here/unmangle.yaml");
        assert!(Config::parse(Some(missing)).output.fallback);
        assert!(log::logger().format(false).contains("Failed to read config"));
    }

    #[test]
    fn maps_scheme_colors() {
        let config = Config::from_yaml("colors:\n  special: \"#00ff00\"\n").unwrap();

        assert_eq!(config.colors.get_by_color(&colors::RED), Color32::from_rgb(0, 0xff, 0));
        assert_eq!(config.colors.get_by_color(&colors::MAGENTA), colors::MAGENTA);
        assert_eq!(config.colors.get_by_color(&colors::WHITE), colors::WHITE);
    }
}
