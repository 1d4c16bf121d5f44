//! Simulation parameters and the config file that supplies them

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use rand_distr::Bernoulli;
use serde::{Deserialize, Serialize};

use crate::arrival::bernoulli;
use crate::error::{ConfigError, SimulationError};

pub const DEFAULT_SERVICE_DURATION: i64 = 240;
pub const DEFAULT_ARRIVAL_PROBABILITY: f64 = 0.0025;
pub const DEFAULT_TOTAL_DURATION: i64 = 6000;

/// What happens at closing time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GatePolicy {
    /// Run exactly `total_duration` ticks; anyone still queued is never served
    #[default]
    ClosedGate,
    /// Admit arrivals up to and including `total_duration`, then keep washing
    /// until the queue is empty
    OpenGate,
}

impl fmt::Display for GatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatePolicy::ClosedGate => write!(f, "closed-gate"),
            GatePolicy::OpenGate => write!(f, "open-gate"),
        }
    }
}

impl FromStr for GatePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "closed-gate" | "closed" | "a" | "A" => Ok(GatePolicy::ClosedGate),
            "open-gate" | "open" | "b" | "B" => Ok(GatePolicy::OpenGate),
            other => Err(ConfigError::UnknownPolicy(other.to_string())),
        }
    }
}

/// Parameters as supplied by the outside world, not yet checked
///
/// Durations are signed so that a negative value coming from a config file or
/// the command line can be represented and rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Params {
    /// Ticks needed to wash one car
    #[serde(alias = "wash_time")]
    pub service_duration: i64,
    /// Probability of a customer arriving during any one tick
    #[serde(alias = "arrival_prob")]
    pub arrival_probability: f64,
    /// Closing time in ticks
    #[serde(alias = "total_time")]
    pub total_duration: i64,
    pub policy: GatePolicy,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            service_duration: DEFAULT_SERVICE_DURATION,
            arrival_probability: DEFAULT_ARRIVAL_PROBABILITY,
            total_duration: DEFAULT_TOTAL_DURATION,
            policy: GatePolicy::default(),
        }
    }
}

impl Params {
    pub fn new(service_duration: i64, arrival_probability: f64, total_duration: i64) -> Self {
        Params {
            service_duration,
            arrival_probability,
            total_duration,
            policy: GatePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: GatePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn validate(&self) -> Result<ValidatedParams, SimulationError> {
        if self.service_duration <= 0 {
            return Err(SimulationError::invalid(format!(
                "service duration must be positive, got {}",
                self.service_duration
            )));
        }
        let arrival_distribution = bernoulli(self.arrival_probability)?;
        if self.total_duration < 0 {
            return Err(SimulationError::invalid(format!(
                "total duration must not be negative, got {}",
                self.total_duration
            )));
        }
        let service_duration = usize::try_from(self.service_duration)
            .map_err(|_| SimulationError::invalid("service duration does not fit in usize"))?;
        let total_duration = usize::try_from(self.total_duration)
            .map_err(|_| SimulationError::invalid("total duration does not fit in usize"))?;

        Ok(ValidatedParams {
            service_duration,
            arrival_probability: self.arrival_probability,
            total_duration,
            policy: self.policy,
            arrival_distribution,
        })
    }
}

/// Parameters that passed validation; fixed for the whole run
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValidatedParams {
    pub service_duration: usize,
    pub arrival_probability: f64,
    pub total_duration: usize,
    pub policy: GatePolicy,
    #[serde(skip)]
    arrival_distribution: Bernoulli,
}

impl ValidatedParams {
    pub fn arrival_distribution(&self) -> Bernoulli {
        self.arrival_distribution
    }
}

/// `[replications]` table of the config file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReplicationSettings {
    pub count: usize,
    /// Replication `i` is seeded with `base_seed + i`
    pub base_seed: u64,
    /// Worker threads; rayon's global pool when absent
    pub threads: Option<usize>,
}

impl Default for ReplicationSettings {
    fn default() -> Self {
        ReplicationSettings {
            count: 1,
            base_seed: 42,
            threads: None,
        }
    }
}

/// Contents of a TOML config file
///
/// `wash_time`, `arrival_prob` and `total_time` are accepted as the CLI
/// spellings of the three `[simulation]` durations. Unknown keys are errors.
///
/// ```toml
/// seed = 7
///
/// [simulation]
/// service_duration = 240
/// arrival_probability = 0.0025
/// total_duration = 6000
/// policy = "open-gate"
///
/// [replications]
/// count = 100
/// base_seed = 1
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Seed for a single run; drawn from the OS when absent
    pub seed: Option<u64>,
    pub simulation: Params,
    pub replications: Option<ReplicationSettings>,
}

impl SimulationConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejects(params: Params) -> bool {
        matches!(
            params.validate(),
            Err(SimulationError::InvalidParameters { .. })
        )
    }

    #[test]
    fn defaults_match_reference_run() {
        let params = Params::default();
        assert_eq!(params.service_duration, 240);
        assert_eq!(params.arrival_probability, 0.0025);
        assert_eq!(params.total_duration, 6000);
        assert_eq!(params.policy, GatePolicy::ClosedGate);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert!(rejects(Params::new(0, 0.5, 10)));
        assert!(rejects(Params::new(-3, 0.5, 10)));
        assert!(rejects(Params::new(3, 1.5, 10)));
        assert!(rejects(Params::new(3, -0.01, 10)));
        assert!(rejects(Params::new(3, f64::NAN, 10)));
        assert!(rejects(Params::new(3, 0.5, -1)));
    }

    #[test]
    fn boundary_values_are_accepted() {
        let validated = Params::new(1, 0.0, 0).validate().unwrap();
        assert_eq!(validated.service_duration, 1);
        assert_eq!(validated.total_duration, 0);
        assert!(Params::new(1, 1.0, 0).validate().is_ok());
    }

    #[test]
    fn policy_parses_from_cli_spellings() {
        assert_eq!("open-gate".parse::<GatePolicy>().unwrap(), GatePolicy::OpenGate);
        assert_eq!("closed".parse::<GatePolicy>().unwrap(), GatePolicy::ClosedGate);
        assert!(matches!(
            "drain".parse::<GatePolicy>(),
            Err(ConfigError::UnknownPolicy(p)) if p == "drain"
        ));
        assert_eq!(GatePolicy::OpenGate.to_string(), "open-gate");
    }

    #[test]
    fn config_file_with_all_sections() {
        let config = SimulationConfig::from_toml_str(
            r#"
            seed = 7

            [simulation]
            service_duration = 120
            arrival_probability = 0.01
            total_duration = 3600
            policy = "open-gate"

            [replications]
            count = 50
            base_seed = 1000
            threads = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.seed, Some(7));
        assert_eq!(
            config.simulation,
            Params::new(120, 0.01, 3600).with_policy(GatePolicy::OpenGate)
        );
        assert_eq!(
            config.replications,
            Some(ReplicationSettings {
                count: 50,
                base_seed: 1000,
                threads: Some(2),
            })
        );
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config = SimulationConfig::from_toml_str(
            r#"
            [simulation]
            total_duration = 100
            "#,
        )
        .unwrap();

        assert_eq!(config.seed, None);
        assert_eq!(config.simulation.total_duration, 100);
        assert_eq!(config.simulation.service_duration, 240);
        assert!(config.replications.is_none());
    }

    #[test]
    fn negative_values_survive_parsing_for_validation() {
        let config = SimulationConfig::from_toml_str("[simulation]\ntotal_duration = -1\n").unwrap();
        assert!(rejects(config.simulation));
    }

    #[test]
    fn cli_spellings_are_accepted_as_keys() {
        let config = SimulationConfig::from_toml_str(
            r#"
            [simulation]
            wash_time = 3
            arrival_prob = 0.5
            total_time = 10
            policy = "open-gate"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.simulation,
            Params::new(3, 0.5, 10).with_policy(GatePolicy::OpenGate)
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        for toml in [
            "[simulation]\nwash_tme = 3\n",
            "[replications]\ncount = 5\nbase-seed = 1\n",
            "sede = 7\n",
            "[simulaton]\ntotal_duration = 10\n",
        ] {
            assert!(
                matches!(
                    SimulationConfig::from_toml_str(toml),
                    Err(ConfigError::Toml(_))
                ),
                "{toml:?} should be rejected"
            );
        }
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        assert!(matches!(
            SimulationConfig::from_toml_str("[simulation\n"),
            Err(ConfigError::Toml(_))
        ));
    }
}
