// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the synchronized point to point motion in joint space.
use std::time::Duration;
use tracing::{debug, error};

use crate::exception::{create_config_exception, PlanningException};
use crate::model::limits::JointLimitsContainer;
use crate::trajectory::sampling::time_samples;
use crate::trajectory::velocity_profile::TrapezoidalProfile;
use crate::trajectory::{JointTrajectory, JointTrajectoryPoint};
use crate::utils::JointValues;
use crate::PlanningResult;

/// Checks that every joint has the limits a point to point motion needs.
/// # Errors
/// * InvalidConfiguration if a joint has no limits or no acceleration limit.
pub fn check_joint_limits(
    joint_names: &[String],
    joint_limits: &JointLimitsContainer,
) -> PlanningResult<()> {
    for joint_name in joint_names {
        match joint_limits.get_limit(joint_name) {
            Some(limit) if limit.has_acceleration_limits() => {}
            Some(_) => {
                error!("Joint {} has no acceleration limit", joint_name);
                return Err(create_config_exception(format!(
                    "Point to point motion needs an acceleration limit for joint {}",
                    joint_name
                )));
            }
            None => {
                error!("Joint {} has no limits", joint_name);
                return Err(create_config_exception(format!(
                    "Point to point motion needs limits for joint {}",
                    joint_name
                )));
            }
        }
    }
    Ok(())
}

/// Computes one trapezoidal profile per joint. All joints share the acceleration, cruise and
/// deceleration phases of the slowest joint, so they start and stop together.
///
/// The shared acceleration (deceleration) phase is the longest one of all joints and the
/// shared motion lasts at least as long as the slowest joint, hence no synchronized joint
/// exceeds its own scaled limits.
pub fn synchronized_profiles(
    start: &JointValues,
    goal: &JointValues,
    joint_limits: &JointLimitsContainer,
    velocity_scaling_factor: f64,
    acceleration_scaling_factor: f64,
) -> PlanningResult<Vec<(String, TrapezoidalProfile)>> {
    let mut fastest = Vec::with_capacity(start.len());
    for (joint_name, &start_position) in start {
        let goal_position = goal.get(joint_name).copied().ok_or_else(|| {
            PlanningException::InvalidGoalConstraints {
                message: format!("No goal given for joint {}", joint_name),
            }
        })?;
        let limit = joint_limits
            .get_limit(joint_name)
            .ok_or_else(|| create_config_exception(format!("No limits for joint {}", joint_name)))?;
        let max_acceleration = limit.max_acceleration.ok_or_else(|| {
            create_config_exception(format!("No acceleration limit for joint {}", joint_name))
        })?;
        let max_deceleration = limit.max_deceleration.unwrap_or(max_acceleration);
        let profile = TrapezoidalProfile::new(
            start_position,
            goal_position,
            velocity_scaling_factor * limit.max_velocity,
            acceleration_scaling_factor * max_acceleration.abs(),
            acceleration_scaling_factor * max_deceleration.abs(),
        );
        fastest.push((joint_name.clone(), profile));
    }

    let mut t_acc: f64 = 0.;
    let mut t_dec: f64 = 0.;
    let mut ramp_time: f64 = 0.;
    for (_, profile) in &fastest {
        let (acc, cruise, dec) = profile.phase_durations();
        t_acc = t_acc.max(acc);
        t_dec = t_dec.max(dec);
        ramp_time = ramp_time.max(0.5 * acc + cruise + 0.5 * dec);
    }
    let t_cruise = (ramp_time - 0.5 * t_acc - 0.5 * t_dec).max(0.);
    debug!(
        "Synchronized phases: acceleration {} s, cruise {} s, deceleration {} s",
        t_acc, t_cruise, t_dec
    );

    Ok(fastest
        .into_iter()
        .map(|(joint_name, profile)| {
            let synchronized = TrapezoidalProfile::with_phase_durations(
                profile.start(),
                profile.end(),
                t_acc,
                t_cruise,
                t_dec,
            );
            (joint_name, synchronized)
        })
        .collect())
}

/// Plans a synchronized point to point motion from `start` to `goal`.
///
/// The samples follow the shared sampling rule, the last one lies exactly at the end of the
/// motion. A motion without any distance yields a single point.
/// # Errors
/// * InvalidConfiguration if a joint lacks limits.
/// * InvalidGoalConstraints if a joint of `start` has no goal.
/// * DegenerateInput if the sampling time is too small.
pub fn plan_ptp(
    start: &JointValues,
    goal: &JointValues,
    joint_limits: &JointLimitsContainer,
    velocity_scaling_factor: f64,
    acceleration_scaling_factor: f64,
    sampling_time: f64,
) -> PlanningResult<JointTrajectory> {
    let profiles = synchronized_profiles(
        start,
        goal,
        joint_limits,
        velocity_scaling_factor,
        acceleration_scaling_factor,
    )?;
    let duration = profiles
        .iter()
        .map(|(_, profile)| profile.duration())
        .fold(0., f64::max);

    let mut joint_trajectory =
        JointTrajectory::new(profiles.iter().map(|(name, _)| name.clone()).collect());
    for time in time_samples(duration, sampling_time)? {
        joint_trajectory.points.push(JointTrajectoryPoint {
            time_from_start: Duration::from_secs_f64(time),
            positions: profiles.iter().map(|(_, p)| p.position(time)).collect(),
            velocities: profiles.iter().map(|(_, p)| p.velocity(time)).collect(),
            accelerations: profiles.iter().map(|(_, p)| p.acceleration(time)).collect(),
        });
    }
    Ok(joint_trajectory)
}

#[cfg(test)]
mod tests {
    use crate::exception::ErrorKind;
    use crate::model::limits::{JointLimits, JointLimitsContainer};
    use crate::planner::ptp::{check_joint_limits, plan_ptp, synchronized_profiles};
    use crate::utils::joint_values_from;

    fn limits() -> JointLimitsContainer {
        let mut limits = JointLimitsContainer::new();
        limits.add_limit("j1", JointLimits::new(1.0, Some(2.0), Some(-2.0)));
        limits.add_limit("j2", JointLimits::new(0.5, Some(4.0), None));
        limits
    }

    #[test]
    fn profiles_are_synchronized() {
        let start = joint_values_from(&["j1", "j2"], &[0., 0.]);
        let goal = joint_values_from(&["j1", "j2"], &[1., -1.]);
        let profiles = synchronized_profiles(&start, &goal, &limits(), 1., 1.).unwrap();
        let (_, j1) = &profiles[0];
        let (_, j2) = &profiles[1];
        assert!((j1.duration() - j2.duration()).abs() < 1e-12);
        assert_eq!(j1.phase_durations(), j2.phase_durations());
        // j2 is slowest: 1 m at 0.5 m/s plus ramps
        assert!((j2.peak_velocity() - 0.5).abs() < 1e-12);
        assert!(j1.peak_velocity() <= 1.0);
        let (t_acc, _, t_dec) = j1.phase_durations();
        assert!(j1.peak_velocity() / t_acc <= 2.0 + 1e-12);
        assert!(j1.peak_velocity() / t_dec <= 2.0 + 1e-12);
        assert!(j2.peak_velocity() / t_acc <= 4.0 + 1e-12);
    }

    #[test]
    fn ptp_trajectory() {
        let start = joint_values_from(&["j1", "j2"], &[0., 0.]);
        let goal = joint_values_from(&["j1", "j2"], &[1., 0.5]);
        let trajectory = plan_ptp(&start, &goal, &limits(), 1., 1., 0.1).unwrap();
        assert_eq!(trajectory.joint_names, vec!["j1", "j2"]);
        let last = trajectory.points.last().unwrap();
        assert_eq!(last.positions, vec![1., 0.5]);
        assert_eq!(last.velocities, vec![0., 0.]);
        for point in &trajectory.points {
            assert!(point.velocities[0].abs() <= 1.0 + 1e-9);
            assert!(point.velocities[1].abs() <= 0.5 + 1e-9);
        }
        for window in trajectory.points.windows(2) {
            assert!(window[0].time_from_start < window[1].time_from_start);
        }
    }

    #[test]
    fn ptp_without_motion() {
        let start = joint_values_from(&["j1", "j2"], &[0.3, 0.]);
        let trajectory = plan_ptp(&start, &start, &limits(), 1., 1., 0.1).unwrap();
        assert_eq!(trajectory.len(), 1);
        assert_eq!(trajectory.points[0].positions, vec![0.3, 0.]);
    }

    #[test]
    fn missing_limits() {
        let names = vec!["j1".to_string(), "j3".to_string()];
        let error = check_joint_limits(&names, &limits()).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidConfiguration);

        let mut without_acceleration = JointLimitsContainer::new();
        without_acceleration.add_limit("j1", JointLimits::new(1.0, None, None));
        let error = check_joint_limits(&names[..1], &without_acceleration).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidConfiguration);
        assert!(check_joint_limits(&names[..1], &limits()).is_ok());
    }
}
