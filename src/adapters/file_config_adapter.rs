//! INI file configuration adapter.

use crate::domain::error::EdgecheckError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, EdgecheckError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| EdgecheckError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, EdgecheckError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| EdgecheckError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[data]
directory = /var/prices
symbols = AAPL, MSFT

[signal]
name = Volume Spike
rule = REL_VOLUME(20) > 2.0
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("data", "directory"),
            Some("/var/prices".to_string())
        );
        assert_eq!(
            adapter.get_string("signal", "name"),
            Some("Volume Spike".to_string())
        );
        assert_eq!(
            adapter.get_string("signal", "rule"),
            Some("REL_VOLUME(20) > 2.0".to_string())
        );
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[signal]\nlookback = 20\n").unwrap();
        assert_eq!(adapter.get_string("signal", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_returns_value() {
        let adapter = FileConfigAdapter::from_string("[evaluation]\nsimulations = 5000\n").unwrap();
        assert_eq!(adapter.get_int("evaluation", "simulations", 0), 5000);
    }

    #[test]
    fn get_int_returns_default_for_missing() {
        let adapter = FileConfigAdapter::from_string("[evaluation]\n").unwrap();
        assert_eq!(adapter.get_int("evaluation", "missing", 42), 42);
    }

    #[test]
    fn get_int_returns_default_for_non_numeric() {
        let adapter =
            FileConfigAdapter::from_string("[evaluation]\nholding_period = abc\n").unwrap();
        assert_eq!(adapter.get_int("evaluation", "holding_period", 5), 5);
    }

    #[test]
    fn get_double_returns_value() {
        let adapter = FileConfigAdapter::from_string("[signal]\nthreshold = 2.5\n").unwrap();
        assert_eq!(adapter.get_double("signal", "threshold", 0.0), 2.5);
    }

    #[test]
    fn get_double_returns_default_for_missing() {
        let adapter = FileConfigAdapter::from_string("[signal]\n").unwrap();
        assert_eq!(adapter.get_double("signal", "missing", 99.9), 99.9);
    }

    #[test]
    fn has_value_ignores_blank() {
        let adapter =
            FileConfigAdapter::from_string("[report]\njson = out.json\noutcomes_csv =\n").unwrap();
        assert!(adapter.has_value("report", "json"));
        assert!(!adapter.has_value("report", "outcomes_csv"));
        assert!(!adapter.has_value("report", "missing"));
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[report]\njson = /tmp/result.json\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("report", "json"),
            Some("/tmp/result.json".to_string())
        );
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(matches!(result, Err(EdgecheckError::ConfigParse { .. })));
    }

    #[test]
    fn handles_all_config_sections() {
        let content = r#"
[data]
directory = data
start_date = 2020-01-01
end_date = 2024-12-31
symbols = SPY,QQQ

[signal]
name = Spike
rule = REL_VOLUME(20) > 2.0 AND CLV >= 0.7
lookback = 20
cooldown = 5

[evaluation]
holding_period = 5
simulations = 1000
min_signals = 15
seed = 7

[report]
json = result.json
outcomes_csv = outcomes.csv
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();

        assert_eq!(
            adapter.get_string("data", "end_date"),
            Some("2024-12-31".to_string())
        );
        assert_eq!(adapter.get_int("signal", "lookback", 0), 20);
        assert_eq!(adapter.get_int("signal", "cooldown", 0), 5);
        assert_eq!(adapter.get_int("evaluation", "seed", 0), 7);
        assert_eq!(
            adapter.get_string("report", "outcomes_csv"),
            Some("outcomes.csv".to_string())
        );
    }
}
