use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::ExtractionParameters;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{0}")]
    Invalid(String),
}

/// Clamped linear map from text length to a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LengthRamp {
    pub min_length: usize,
    pub max_length: usize,
    pub min_value: f64,
    pub max_value: f64,
}

impl LengthRamp {
    pub fn new(min_length: usize, max_length: usize, min_value: f64, max_value: f64) -> Self {
        Self {
            min_length,
            max_length,
            min_value,
            max_value,
        }
    }

    pub fn value_at(&self, length: usize) -> f64 {
        if length <= self.min_length {
            return self.min_value;
        }
        if length >= self.max_length {
            return self.max_value;
        }

        let progress =
            (length - self.min_length) as f64 / (self.max_length - self.min_length) as f64;
        self.min_value + progress * (self.max_value - self.min_value)
    }

    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        if self.min_length > self.max_length {
            return Err(ConfigError::Invalid(format!(
                "{name}: min_length {} is greater than max_length {}",
                self.min_length, self.max_length
            )));
        }
        if !(self.min_value <= self.max_value) {
            return Err(ConfigError::Invalid(format!(
                "{name}: min_value {} is greater than max_value {}",
                self.min_value, self.max_value
            )));
        }
        Ok(())
    }
}

/// Beam count and output length, which do not scale with the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedParams {
    pub num_beams: u32,
    pub max_length: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub submit: FixedParams,
    pub warm_up: FixedParams,
    pub length_penalty: LengthRamp,
    pub sequence_count: LengthRamp,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            // Higher beam counts give better triplets but take longer
            submit: FixedParams {
                num_beams: 50,
                max_length: 512,
            },
            warm_up: FixedParams {
                num_beams: 1,
                max_length: 16,
            },
            length_penalty: LengthRamp::new(100, 1000, 1.0, 10.0),
            sequence_count: LengthRamp::new(200, 2000, 1.0, 3.0),
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, fixed) in [("submit", &self.submit), ("warm_up", &self.warm_up)] {
            if fixed.num_beams == 0 {
                return Err(ConfigError::Invalid(format!("{name}: num_beams must be at least 1")));
            }
            if fixed.max_length == 0 {
                return Err(ConfigError::Invalid(format!("{name}: max_length must be at least 1")));
            }
        }

        self.length_penalty.validate("length_penalty")?;
        self.sequence_count.validate("sequence_count")?;

        if !(self.length_penalty.min_value > 0.0) {
            return Err(ConfigError::Invalid(
                "length_penalty: min_value must be positive".to_string(),
            ));
        }
        if self.sequence_count.min_value < 1.0 {
            return Err(ConfigError::Invalid(
                "sequence_count: min_value must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Derives extraction parameters from the size of the input.
#[derive(Debug, Clone, Default)]
pub struct ParameterScheduler {
    config: SchedulerConfig,
}

impl ParameterScheduler {
    pub fn new(config: SchedulerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Parameters for a normal submission. Length is counted in characters.
    pub fn compute(&self, text: &str) -> ExtractionParameters {
        let length = text.chars().count();
        let sequences = self.config.sequence_count.value_at(length).round();

        ExtractionParameters {
            beam_count: self.config.submit.num_beams,
            max_output_length: self.config.submit.max_length,
            length_penalty: self.config.length_penalty.value_at(length),
            sequence_count: (sequences as u32).max(1),
        }
    }

    /// Cheapest possible call; only used to wake the service up.
    pub fn warm_up(&self) -> ExtractionParameters {
        ExtractionParameters {
            beam_count: self.config.warm_up.num_beams,
            max_output_length: self.config.warm_up.max_length,
            length_penalty: self.config.length_penalty.min_value,
            sequence_count: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> ParameterScheduler {
        ParameterScheduler::new(SchedulerConfig::default()).unwrap()
    }

    #[test]
    fn test_short_text_gets_minimum_penalty() {
        let params = scheduler().compute("apple is red.");
        assert_eq!(params.length_penalty, 1.0);
        assert_eq!(params.sequence_count, 1);
        assert_eq!(params.beam_count, 50);
        assert_eq!(params.max_output_length, 512);
    }

    #[test]
    fn test_ramp_clamps_at_both_ends() {
        let ramp = LengthRamp::new(100, 1000, 1.0, 10.0);
        assert_eq!(ramp.value_at(0), 1.0);
        assert_eq!(ramp.value_at(100), 1.0);
        assert_eq!(ramp.value_at(1000), 10.0);
        assert_eq!(ramp.value_at(50_000), 10.0);
        assert!((ramp.value_at(550) - 5.5).abs() < 1e-9);
    }

    #[test]
    fn test_parameters_never_decrease_with_length() {
        let scheduler = scheduler();
        let mut previous = scheduler.compute("");
        for length in (0..2500).step_by(7) {
            let params = scheduler.compute(&"x".repeat(length));
            assert!(params.length_penalty >= previous.length_penalty);
            assert!(params.sequence_count >= previous.sequence_count);
            previous = params;
        }
        assert_eq!(previous.length_penalty, 10.0);
        assert_eq!(previous.sequence_count, 3);
    }

    #[test]
    fn test_sequence_count_is_rounded() {
        // 200..2000 maps onto 1.0..3.0; 650 chars lands on 1.5
        let params = scheduler().compute(&"y".repeat(650));
        assert_eq!(params.sequence_count, 2);
        let params = scheduler().compute(&"y".repeat(600));
        assert_eq!(params.sequence_count, 1);
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let config = SchedulerConfig {
            length_penalty: LengthRamp::new(2, 4, 1.0, 3.0),
            ..SchedulerConfig::default()
        };
        let scheduler = ParameterScheduler::new(config).unwrap();
        // three chars, nine bytes
        assert_eq!(scheduler.compute("äöü").length_penalty, 2.0);
    }

    #[test]
    fn test_warm_up_is_minimal() {
        let params = scheduler().warm_up();
        assert_eq!(params.beam_count, 1);
        assert_eq!(params.max_output_length, 16);
        assert_eq!(params.sequence_count, 1);
    }

    #[test]
    fn test_invalid_configs_are_rejected() {
        let mut config = SchedulerConfig::default();
        config.submit.num_beams = 0;
        assert!(ParameterScheduler::new(config).is_err());

        let mut config = SchedulerConfig::default();
        config.length_penalty = LengthRamp::new(1000, 100, 1.0, 10.0);
        assert!(config.validate().is_err());

        let mut config = SchedulerConfig::default();
        config.length_penalty = LengthRamp::new(100, 1000, 0.0, 10.0);
        assert!(config.validate().is_err());

        let mut config = SchedulerConfig::default();
        config.sequence_count = LengthRamp::new(100, 1000, 4.0, 2.0);
        assert!(config.validate().is_err());
    }
}
