// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the planner configuration which is read from TOML files.
//!
//! ```toml
//! sampling_time = 0.1
//! ik_timeout = 0.05
//! check_self_collision = false
//!
//! [limits.cartesian_limits]
//! max_trans_vel = 1.0
//! max_trans_acc = 2.25
//! max_trans_dec = -5.0
//! max_rot_vel = 1.57
//!
//! [limits.joint_limits.shoulder]
//! max_velocity = 1.0
//! max_acceleration = 2.0
//! max_deceleration = -2.0
//! ```
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::exception::create_config_exception;
use crate::model::limits::LimitsContainer;
use crate::model::DEFAULT_IK_TIMEOUT;
use crate::PlanningResult;

/// Default time between two samples of a generated trajectory in \[s\].
pub const DEFAULT_SAMPLING_TIME: f64 = 0.1;

fn default_sampling_time() -> f64 {
    DEFAULT_SAMPLING_TIME
}

fn default_ik_timeout() -> f64 {
    DEFAULT_IK_TIMEOUT.as_secs_f64()
}

/// Settings of the trajectory generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Time between two samples in \[s\].
    #[serde(default = "default_sampling_time")]
    pub sampling_time: f64,
    /// Time the inverse kinematics solver may search per sample in \[s\].
    #[serde(default = "default_ik_timeout")]
    pub ik_timeout: f64,
    #[serde(default)]
    pub check_self_collision: bool,
    #[serde(default)]
    pub limits: LimitsContainer,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            sampling_time: DEFAULT_SAMPLING_TIME,
            ik_timeout: default_ik_timeout(),
            check_self_collision: false,
            limits: LimitsContainer::default(),
        }
    }
}

impl PlannerConfig {
    /// Parses and validates a configuration.
    /// # Errors
    /// * InvalidConfiguration if the text is no valid configuration.
    pub fn from_toml_str(content: &str) -> PlanningResult<Self> {
        let config: PlannerConfig = toml::from_str(content)
            .map_err(|e| create_config_exception(format!("Cannot parse planner config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    /// # Errors
    /// * InvalidConfiguration if the file cannot be read or holds no valid configuration.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> PlanningResult<Self> {
        let path = path.as_ref();
        debug!("Loading planner config from {}", path.display());
        let content = fs::read_to_string(path).map_err(|e| {
            create_config_exception(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// checks the sampling time, the IK timeout and the limits.
    pub fn validate(&self) -> PlanningResult<()> {
        if !(self.sampling_time.is_finite() && self.sampling_time > 0.) {
            return Err(create_config_exception("Sampling time has to be positive"));
        }
        if !(self.ik_timeout.is_finite() && self.ik_timeout > 0.) {
            return Err(create_config_exception("IK timeout has to be positive"));
        }
        self.limits.validate()
    }

    pub fn ik_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.ik_timeout)
    }
}
