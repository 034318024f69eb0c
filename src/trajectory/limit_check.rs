// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the check of sampled joint velocities, accelerations and decelerations against
//! the joint limits.
//!
//! Velocities are finite differences of consecutive positions. Accelerations are finite
//! differences of consecutive velocities over the mean of both sample durations, which
//! assumes a constant acceleration within each sample. This is a modeling choice and an
//! approximation, not an exact derivative.
use tracing::error;

use crate::exception::PlanningException;
use crate::model::limits::JointLimitsContainer;
use crate::utils::JointValues;
use crate::PlanningResult;

/// Sample durations up to this value are too small to differentiate.
pub static SAMPLE_DURATION_EPS: f64 = 1e-5;

/// Determines whether a joint accelerates between two samples.
///
/// A joint whose speed stays the same counts as accelerating.
pub fn is_accelerating(velocity_last: f64, velocity_current: f64) -> bool {
    velocity_last.abs() <= velocity_current.abs()
}

/// Verifies that a sample does not violate the joint limits.
/// # Arguments
/// * `position_last` - Joint positions of the previous sample.
/// * `velocity_last` - Joint velocities of the previous sample.
/// * `position_current` - Joint positions of the current sample.
/// * `duration_last` - Duration of the previous sample in \[s\].
/// * `duration_current` - Duration of the current sample in \[s\].
/// * `joint_limits` - Limits of all joints in `position_current`.
/// # Errors
/// * DegenerateInput if `duration_current` is too small or a joint is missing in the
/// previous sample.
/// * LimitsViolated for the first joint whose velocity, acceleration or deceleration
/// exceeds its limit.
pub fn verify_sample_joint_limits(
    position_last: &JointValues,
    velocity_last: &JointValues,
    position_current: &JointValues,
    duration_last: f64,
    duration_current: f64,
    joint_limits: &JointLimitsContainer,
) -> PlanningResult<()> {
    if duration_current <= SAMPLE_DURATION_EPS {
        error!("Sample duration too small, cannot compute the velocity");
        return Err(PlanningException::DegenerateInput {
            message: format!(
                "Sample duration {} too small, cannot compute the velocity",
                duration_current
            ),
        });
    }

    for (joint_name, &position) in position_current {
        let (last_position, last_velocity) =
            match (position_last.get(joint_name), velocity_last.get(joint_name)) {
                (Some(&p), Some(&v)) => (p, v),
                _ => {
                    return Err(PlanningException::DegenerateInput {
                        message: format!("Joint {} is missing in the previous sample", joint_name),
                    })
                }
            };
        let limit = joint_limits.get_limit(joint_name).ok_or_else(|| {
            error!("No limits configured for joint {}", joint_name);
            PlanningException::LimitsViolated {
                message: format!("No limits configured for joint {}", joint_name),
            }
        })?;

        let velocity_current = (position - last_position) / duration_current;
        if !joint_limits.verify_velocity_limit(joint_name, velocity_current) {
            let message = format!(
                "Joint velocity limit of {} violated. Set the velocity scaling factor lower! Actual joint velocity is {}, while the limit is {}.",
                joint_name, velocity_current, limit.max_velocity
            );
            error!("{}", message);
            return Err(PlanningException::LimitsViolated { message });
        }

        let acceleration_current =
            (velocity_current - last_velocity) / (duration_last + duration_current) * 2.;
        if is_accelerating(last_velocity, velocity_current) {
            if let Some(max_acceleration) = limit.max_acceleration {
                if acceleration_current.abs() > max_acceleration.abs() {
                    let message = format!(
                        "Joint acceleration limit of {} violated. Set the acceleration scaling factor lower! Actual joint acceleration is {}, while the limit is {}.",
                        joint_name, acceleration_current, max_acceleration
                    );
                    error!("{}", message);
                    return Err(PlanningException::LimitsViolated { message });
                }
            }
        } else if let Some(max_deceleration) = limit.max_deceleration {
            if acceleration_current.abs() > max_deceleration.abs() {
                let message = format!(
                    "Joint deceleration limit of {} violated. Set the acceleration scaling factor lower! Actual joint deceleration is {}, while the limit is {}.",
                    joint_name, acceleration_current, max_deceleration
                );
                error!("{}", message);
                return Err(PlanningException::LimitsViolated { message });
            }
        }
    }
    Ok(())
}
