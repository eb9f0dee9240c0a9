use dotenv::var;
use hd44780_gpio::lcd::hd44780::DisplayConfig;
use serde::{Deserialize, Serialize};
use std::env::var_os;
use std::ffi::OsStr;
use std::path::Path;

const DEFAULT_CONFIG_FILE: &str = "display.json";

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(default)]
pub struct Config {
    pub display: DisplayConfig,
    /// Shown on the first row after the demo characters. Empty to skip.
    pub greeting: String,
}

impl Config {
    pub fn try_load() -> Option<Self> {
        let config_str = var_os("HD44780_CONFIG");
        let config_str: &OsStr = config_str
            .as_deref()
            .unwrap_or(OsStr::new(DEFAULT_CONFIG_FILE));
        let config_path = Path::new(config_str);
        if config_path.exists() {
            let file = std::fs::File::open(config_path).ok()?;
            let reader = std::io::BufReader::new(file);
            serde_json::from_reader(reader).ok()
        } else {
            None
        }
    }

    pub fn save(&self) -> std::io::Result<()> {
        let config_str = var("HD44780_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let config_path = Path::new(&config_str);
        let file = std::fs::File::create(config_path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hd44780_gpio::lcd::hd44780::Lines;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: Config =
            serde_json::from_str(r#"{ "display": { "lines": "four", "columns": 20 } }"#).unwrap();
        assert_eq!(config.display.lines, Lines::Four);
        assert_eq!(config.display.columns, 20);
        assert!(config.display.backlight);
        assert!(config.greeting.is_empty());
    }
}
