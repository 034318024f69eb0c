// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the joint and Cartesian limits the planner has to respect.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::exception::create_config_exception;
use crate::PlanningResult;

/// Velocity, acceleration and deceleration limits of a single joint.
///
/// The acceleration and deceleration limits are optional and only their magnitude matters.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointLimits {
    pub max_velocity: f64,
    #[serde(default)]
    pub max_acceleration: Option<f64>,
    #[serde(default)]
    pub max_deceleration: Option<f64>,
}

impl JointLimits {
    pub fn new(
        max_velocity: f64,
        max_acceleration: Option<f64>,
        max_deceleration: Option<f64>,
    ) -> Self {
        JointLimits {
            max_velocity,
            max_acceleration,
            max_deceleration,
        }
    }
    pub fn has_acceleration_limits(&self) -> bool {
        self.max_acceleration.is_some()
    }
    pub fn has_deceleration_limits(&self) -> bool {
        self.max_deceleration.is_some()
    }
}

/// Limits of all joints, keyed by joint name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JointLimitsContainer {
    limits: BTreeMap<String, JointLimits>,
}

impl JointLimitsContainer {
    pub fn new() -> Self {
        Self::default()
    }
    /// Adds the limits of a joint, replacing limits given before.
    pub fn add_limit<S: Into<String>>(&mut self, joint_name: S, limits: JointLimits) {
        self.limits.insert(joint_name.into(), limits);
    }
    pub fn get_limit(&self, joint_name: &str) -> Option<&JointLimits> {
        self.limits.get(joint_name)
    }
    pub fn has_limit(&self, joint_name: &str) -> bool {
        self.limits.contains_key(joint_name)
    }
    pub fn is_empty(&self) -> bool {
        self.limits.is_empty()
    }
    pub fn len(&self) -> usize {
        self.limits.len()
    }
    pub fn iter(&self) -> impl Iterator<Item = (&String, &JointLimits)> {
        self.limits.iter()
    }
    /// checks the magnitude of `velocity` against the velocity limit of the joint.
    ///
    /// A joint without limits never satisfies the check.
    pub fn verify_velocity_limit(&self, joint_name: &str, velocity: f64) -> bool {
        self.get_limit(joint_name)
            .map_or(false, |limit| velocity.abs() <= limit.max_velocity)
    }

    fn validate(&self) -> PlanningResult<()> {
        for (name, limit) in self.iter() {
            if !(limit.max_velocity.is_finite() && limit.max_velocity > 0.) {
                return Err(create_config_exception(format!(
                    "Velocity limit of joint {} has to be positive",
                    name
                )));
            }
            for value in limit.max_acceleration.iter().chain(limit.max_deceleration.iter()) {
                if !value.is_finite() || *value == 0. {
                    return Err(create_config_exception(format!(
                        "Acceleration and deceleration limits of joint {} have to be non-zero",
                        name
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Limits of the Cartesian motion of a link.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartesianLimits {
    /// Maximum translational velocity in \[m/s\].
    pub max_trans_vel: f64,
    /// Maximum translational acceleration in \[m/s²\].
    pub max_trans_acc: f64,
    /// Maximum translational deceleration in \[m/s²\], only the magnitude is used.
    pub max_trans_dec: f64,
    /// Maximum rotational velocity in \[rad/s\].
    pub max_rot_vel: f64,
}

impl CartesianLimits {
    fn validate(&self) -> PlanningResult<()> {
        let values = [
            ("max_trans_vel", self.max_trans_vel),
            ("max_trans_acc", self.max_trans_acc),
            ("max_trans_dec", self.max_trans_dec.abs()),
            ("max_rot_vel", self.max_rot_vel),
        ];
        for (name, value) in values.iter() {
            if !(value.is_finite() && *value > 0.) {
                return Err(create_config_exception(format!(
                    "Cartesian limit {} has to be positive",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// All limits of the planner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LimitsContainer {
    #[serde(default)]
    pub joint_limits: JointLimitsContainer,
    /// Needed by Cartesian motions only.
    #[serde(default)]
    pub cartesian_limits: Option<CartesianLimits>,
}

impl LimitsContainer {
    pub fn new(joint_limits: JointLimitsContainer, cartesian_limits: Option<CartesianLimits>) -> Self {
        LimitsContainer {
            joint_limits,
            cartesian_limits,
        }
    }
    /// checks that every configured limit is usable.
    /// # Errors
    /// * InvalidConfiguration if a limit is not positive or not finite.
    pub fn validate(&self) -> PlanningResult<()> {
        self.joint_limits.validate()?;
        if let Some(cartesian_limits) = &self.cartesian_limits {
            cartesian_limits.validate()?;
        }
        Ok(())
    }
}
