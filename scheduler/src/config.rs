use std::fmt::{self, Display};
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

const MAX_CYCLES: i64 = 1 << 32;

/// The scheduling policy.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Policy {
    /// First come, first served: a process runs until it ends or sleeps.
    #[default]
    Fcfs,
    /// Round robin: a process runs for at most one quantum per dispatch.
    RoundRobin,
}

impl FromStr for Policy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fcfs" => Ok(Policy::Fcfs),
            "rr" => Ok(Policy::RoundRobin),
            _ => Err(ConfigError::UnknownPolicy(s.to_string())),
        }
    }
}

impl Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::Fcfs => write!(f, "fcfs"),
            Policy::RoundRobin => write!(f, "rr"),
        }
    }
}

/// Processor configuration. Immutable once the processor is configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Number of simulated cores.
    pub num_cores: usize,

    pub policy: Policy,

    /// Instructions per dispatch under round robin.
    pub quantum: usize,

    /// Simulated cost of one instruction.
    pub instruction_delay: Duration,

    /// Time between two ticks of the background clock.
    pub tick_interval: Duration,

    /// Ticks between two synthetic admissions.
    pub batch_frequency: u64,

    /// Shortest synthetic program.
    pub min_instructions: usize,

    /// Longest synthetic program.
    pub max_instructions: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            num_cores: 4,
            policy: Policy::Fcfs,
            quantum: 3,
            instruction_delay: Duration::from_millis(10),
            tick_interval: Duration::from_millis(100),
            batch_frequency: 10,
            min_instructions: 5,
            max_instructions: 10,
        }
    }
}

impl Config {
    /// Checks every value against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        bounded("num-cpu", wide(self.num_cores), 1, 128)?;
        bounded("quantum-cycles", wide(self.quantum), 1, MAX_CYCLES)?;
        bounded("batch-process-freq", wide(self.batch_frequency), 1, MAX_CYCLES)?;
        bounded("min-ins", wide(self.min_instructions), 1, MAX_CYCLES)?;
        bounded("max-ins", wide(self.max_instructions), 1, MAX_CYCLES)?;
        bounded("delay-per-exec", wide(self.instruction_delay.as_millis()), 0, MAX_CYCLES)?;
        bounded("tick-interval", wide(self.tick_interval.as_millis()), 1, MAX_CYCLES)?;

        if self.min_instructions > self.max_instructions {
            return Err(ConfigError::MinAboveMax {
                min: self.min_instructions,
                max: self.max_instructions,
            });
        }
        Ok(())
    }
}

/// Parses the `key value` line format of `config.txt`.
///
/// Keys accept both `-` and `_` separators. Keys that are absent keep
/// their default value. The result is validated.
impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut config = Config::default();

        for line in s.lines() {
            let mut tokens = line.split_whitespace();
            let Some(key) = tokens.next() else {
                continue;
            };
            let key = key.replace('_', "-");
            let value = tokens
                .next()
                .map(|value| value.trim_matches('"'))
                .ok_or_else(|| ConfigError::MissingValue(key.clone()))?;

            match key.as_str() {
                "num-cpu" => config.num_cores = number(&key, value)? as usize,
                "scheduler" => config.policy = value.parse()?,
                "quantum-cycles" => config.quantum = number(&key, value)? as usize,
                "batch-process-freq" => config.batch_frequency = number(&key, value)? as u64,
                "min-ins" => config.min_instructions = number(&key, value)? as usize,
                "max-ins" => config.max_instructions = number(&key, value)? as usize,
                "delay-per-exec" | "delays-per-exec" => {
                    config.instruction_delay = Duration::from_millis(number(&key, value)? as u64)
                }
                "tick-interval" => {
                    config.tick_interval = Duration::from_millis(number(&key, value)? as u64)
                }
                _ => return Err(ConfigError::UnknownKey(key)),
            }
        }

        config.validate()?;
        Ok(config)
    }
}

/// Parses a non-negative number no larger than 2^32.
fn number(key: &str, value: &str) -> Result<i64, ConfigError> {
    let parsed = value.parse::<i64>().map_err(|_| ConfigError::InvalidNumber {
        key: key.to_string(),
        value: value.to_string(),
    })?;
    if !(0..=MAX_CYCLES).contains(&parsed) {
        return Err(ConfigError::InvalidNumber {
            key: key.to_string(),
            value: value.to_string(),
        });
    }
    Ok(parsed)
}

fn bounded(key: &'static str, value: i64, min: i64, max: i64) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { key, value, min, max })
    }
}

fn wide<T: TryInto<i64>>(value: T) -> i64 {
    value.try_into().unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_config_file_format() {
        let text = "num-cpu 2\nscheduler \"rr\"\nquantum-cycles 5\n\nbatch-process-freq 1\nmin-ins 100\nmax-ins 100\ndelay-per-exec 0\n";
        let config: Config = text.parse().unwrap();
        assert_eq!(
            config,
            Config {
                num_cores: 2,
                policy: Policy::RoundRobin,
                quantum: 5,
                instruction_delay: Duration::ZERO,
                tick_interval: Duration::from_millis(100),
                batch_frequency: 1,
                min_instructions: 100,
                max_instructions: 100,
            }
        );
    }

    #[test]
    fn underscore_keys_and_tick_interval() {
        let config: Config = "num_cpu 1\ndelays_per_exec 3\ntick_interval 5".parse().unwrap();
        assert_eq!(config.num_cores, 1);
        assert_eq!(config.instruction_delay, Duration::from_millis(3));
        assert_eq!(config.tick_interval, Duration::from_millis(5));
    }

    #[test]
    fn rejects_out_of_range_cores() {
        let err = "num-cpu 129".parse::<Config>().unwrap_err();
        assert_eq!(
            err,
            ConfigError::OutOfRange {
                key: "num-cpu",
                value: 129,
                min: 1,
                max: 128
            }
        );
    }

    #[test]
    fn rejects_unknown_policy_and_key() {
        assert_eq!(
            "scheduler sjf".parse::<Config>().unwrap_err(),
            ConfigError::UnknownPolicy("sjf".to_string())
        );
        assert_eq!(
            "colour blue".parse::<Config>().unwrap_err(),
            ConfigError::UnknownKey("colour".to_string())
        );
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(matches!(
            "quantum-cycles lots".parse::<Config>(),
            Err(ConfigError::InvalidNumber { .. })
        ));
        assert!(matches!(
            "delay-per-exec -1".parse::<Config>(),
            Err(ConfigError::InvalidNumber { .. })
        ));
        assert_eq!(
            "min-ins".parse::<Config>().unwrap_err(),
            ConfigError::MissingValue("min-ins".to_string())
        );
    }

    #[test]
    fn rejects_min_above_max() {
        assert_eq!(
            "min-ins 20\nmax-ins 10".parse::<Config>().unwrap_err(),
            ConfigError::MinAboveMax { min: 20, max: 10 }
        );
    }

    #[test]
    fn largest_instruction_bounds_are_valid() {
        let config = Config {
            min_instructions: 1 << 32,
            max_instructions: 1 << 32,
            ..Config::default()
        };
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(
            Config {
                max_instructions: (1 << 32) + 1,
                ..config
            }
            .validate()
            .unwrap_err(),
            ConfigError::OutOfRange {
                key: "max-ins",
                value: (1 << 32) + 1,
                min: 1,
                max: 1 << 32,
            }
        );
    }

    #[test]
    fn default_is_valid() {
        assert_eq!(Config::default().validate(), Ok(()));
        assert_eq!(Policy::default().to_string(), "fcfs");
    }
}
