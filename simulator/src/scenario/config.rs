use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Declarative scenario description loaded from YAML.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub name: String,
    /// Generator seed; identical seeds replay identical scenarios.
    pub seed: u64,
    /// Simulated seconds between cycles.
    pub cycle_secs: f64,
    /// Civilian transits present throughout the run.
    pub civilian_count: usize,
    /// Probability that any one detection is emitted malformed.
    pub malformed_rate: f64,
    /// Cycle at which a fast unidentified raid starts inbound, if any.
    pub raid_after_cycle: Option<u64>,
    /// Number of raiders in the inbound group.
    pub raid_size: usize,
    /// Cycle at which broadband jamming starts, if any.
    pub jamming_after_cycle: Option<u64>,
    /// Cycle at which an access probe against the command surface starts.
    pub probe_after_cycle: Option<u64>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            name: "mixed-traffic".into(),
            seed: 7,
            cycle_secs: 1.0,
            civilian_count: 3,
            malformed_rate: 0.05,
            raid_after_cycle: Some(20),
            raid_size: 2,
            jamming_after_cycle: Some(35),
            probe_after_cycle: Some(45),
        }
    }
}

impl ScenarioConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading scenario {}", path_ref.display()))?;
        let config: ScenarioConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing scenario {}", path_ref.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn load_reads_yaml_with_defaults() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"name: quiet-skies\nseed: 42\ncivilian_count: 5\nraid_after_cycle: null\n")
            .unwrap();
        let path = temp.into_temp_path();
        let cfg = ScenarioConfig::load(&path).unwrap();
        assert_eq!(cfg.name, "quiet-skies");
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.civilian_count, 5);
        assert!(cfg.raid_after_cycle.is_none());
        // Unspecified fields take the defaults.
        assert_eq!(cfg.cycle_secs, 1.0);
    }

    #[test]
    fn load_rejects_malformed_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"seed: [not, a, number]\n").unwrap();
        let path = temp.into_temp_path();
        assert!(ScenarioConfig::load(&path).is_err());
    }
}
