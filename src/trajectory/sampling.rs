// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the generation of sample times and the check that two trajectories share the same
//! sampling time.
use tracing::error;

use crate::exception::PlanningException;
use crate::trajectory::RobotTrajectory;
use crate::PlanningResult;

/// Keeps the last regular sample and the final sample apart.
pub static TIME_SAMPLE_EPS: f64 = 1e-5;

/// Generates the sample times for a motion of `duration` seconds.
///
/// The samples start at zero and are `sampling_time` apart. The last sample is always exactly at
/// `duration`, so the last interval may be shorter than `sampling_time`. A regular sample closer
/// than [`TIME_SAMPLE_EPS`] to `duration` is dropped in favour of the final one.
/// # Errors
/// * DegenerateInput if `sampling_time` is too small or `duration` is negative or not finite.
pub fn time_samples(duration: f64, sampling_time: f64) -> PlanningResult<Vec<f64>> {
    if !(sampling_time.is_finite() && sampling_time > TIME_SAMPLE_EPS) {
        return Err(PlanningException::DegenerateInput {
            message: format!("Sampling time {} is too small", sampling_time),
        });
    }
    if !(duration.is_finite() && duration >= 0.) {
        return Err(PlanningException::DegenerateInput {
            message: format!("Cannot sample a path with duration {}", duration),
        });
    }
    let mut samples = Vec::new();
    let mut index = 0;
    loop {
        let time = index as f64 * sampling_time;
        if time >= duration - TIME_SAMPLE_EPS {
            break;
        }
        samples.push(time);
        index += 1;
    }
    samples.push(duration);
    Ok(samples)
}

/// Determines the common sampling time of two trajectories and checks that both follow it.
///
/// The last waypoint of each trajectory is ignored because its interval is allowed to be
/// shorter. The sampling time is taken from the first trajectory if it has at least two
/// intervals apart from the last one, otherwise from the second trajectory.
/// # Arguments
/// * `first_trajectory` - First trajectory.
/// * `second_trajectory` - Second trajectory.
/// * `epsilon` - Allowed deviation of an interval from the sampling time.
/// # Return
/// The sampling time in \[s\].
/// # Errors
/// * DegenerateInput if neither trajectory has enough waypoints.
/// * SamplingTimeMismatch for the first interval which deviates.
pub fn determine_and_check_sampling_time(
    first_trajectory: &RobotTrajectory,
    second_trajectory: &RobotTrajectory,
    epsilon: f64,
) -> PlanningResult<f64> {
    let n1 = first_trajectory.waypoint_count().saturating_sub(1);
    let n2 = second_trajectory.waypoint_count().saturating_sub(1);
    if n1 < 2 && n2 < 2 {
        error!("Both trajectories do not have enough points to determine sampling time.");
        return Err(PlanningException::DegenerateInput {
            message: "Both trajectories do not have enough points to determine sampling time"
                .to_string(),
        });
    }

    let reference = if n1 >= 2 {
        first_trajectory
    } else {
        second_trajectory
    };
    let sampling_time = reference.duration_from_previous(1).unwrap_or_default();

    let check = |trajectory: &RobotTrajectory, number: usize, index: usize| {
        let actual = trajectory.duration_from_previous(index).unwrap_or_default();
        if (sampling_time - actual).abs() > epsilon {
            error!(
                "Trajectory {} violates sampling time {} between points {} and {} (indices).",
                number,
                sampling_time,
                index - 1,
                index
            );
            return Err(PlanningException::SamplingTimeMismatch {
                trajectory: number,
                index,
                expected: sampling_time,
                actual,
            });
        }
        Ok(())
    };

    for i in 1..n1.max(n2) {
        if i < n1 {
            check(first_trajectory, 1, i)?;
        }
        if i < n2 {
            check(second_trajectory, 2, i)?;
        }
    }
    Ok(sampling_time)
}
