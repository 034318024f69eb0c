// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the conversion of Cartesian paths into joint trajectories.
use std::time::{Duration, Instant};
use tracing::{debug, error};

use crate::exception::PlanningException;
use crate::model::limits::JointLimitsContainer;
use crate::model::KinematicContext;
use crate::trajectory::limit_check::verify_sample_joint_limits;
use crate::trajectory::path::ContinuousPath;
use crate::trajectory::sampling::time_samples;
use crate::trajectory::{CartesianTrajectory, JointTrajectory, JointTrajectoryPoint};
use crate::utils::JointValues;
use crate::PlanningResult;

fn value_of(values: &JointValues, joint_name: &str) -> PlanningResult<f64> {
    values.get(joint_name).copied().ok_or_else(|| {
        error!("Joint {} is missing in the sampled joint state", joint_name);
        PlanningException::DegenerateInput {
            message: format!("Joint {} is missing in the sampled joint state", joint_name),
        }
    })
}

fn log_generation_time(generation_begin: Instant, points: usize) {
    let duration_ms = generation_begin.elapsed().as_secs_f64() * 1000.;
    debug!(
        "Generate trajectory (N-Points: {}) took {} ms | {} ms per Point",
        points,
        duration_ms,
        duration_ms / points.max(1) as f64
    );
}

/// Samples a continuous Cartesian path and converts every sample into joint positions.
///
/// The path is sampled every `sampling_time` seconds and once more exactly at its duration.
/// Each sample is resolved by inverse kinematics seeded with the solution of the previous
/// sample and checked against the joint limits. The first and the last point are at rest.
/// Intermediate velocities and accelerations assume a constant acceleration within each
/// sample interval.
/// # Arguments
/// * `context` - Robot capabilities used for the inverse kinematics.
/// * `joint_limits` - Limits every sample is checked against.
/// * `path` - Path of the link.
/// * `group_name` - Planning group.
/// * `link_name` - Link which follows the path.
/// * `initial_joint_position` - Seed of the first sample. Its joints name the trajectory.
/// * `sampling_time` - Time between two samples in \[s\].
/// # Errors
/// * NoSolutionFound (or the error of the inverse kinematics) if a sample cannot be resolved.
/// * LimitsViolated if a sample violates the joint limits.
/// * DegenerateInput if the sampling time is too small.
pub fn generate_joint_trajectory<P: ContinuousPath + ?Sized>(
    context: &KinematicContext,
    joint_limits: &JointLimitsContainer,
    path: &P,
    group_name: &str,
    link_name: &str,
    initial_joint_position: &JointValues,
    sampling_time: f64,
) -> PlanningResult<JointTrajectory> {
    debug!("Generate joint trajectory from a continuous Cartesian path.");
    let generation_begin = Instant::now();

    let samples = time_samples(path.duration(), sampling_time)?;
    let model_frame = context.model.model_frame();
    let joint_names: Vec<String> = initial_joint_position.keys().cloned().collect();
    let mut joint_trajectory = JointTrajectory::new(joint_names.clone());

    let mut ik_solution_last = initial_joint_position.clone();
    let mut joint_velocity_last: JointValues = joint_names
        .iter()
        .map(|joint_name| (joint_name.clone(), 0.))
        .collect();

    let last_index = samples.len() - 1;
    for (i, &time) in samples.iter().enumerate() {
        let pose = path.pose_at(time);
        let ik_solution = context
            .compute_pose_ik(group_name, link_name, &pose, &model_frame, &ik_solution_last)
            .map_err(|e| {
                error!("Failed to compute inverse kinematics solution for sampled Cartesian pose.");
                e
            })?;

        // the last interval may be shorter than the sampling time
        let duration_current = if samples.len() == 1 {
            time
        } else if i == last_index {
            time - samples[i - 1]
        } else {
            sampling_time
        };

        if i != 0 {
            verify_sample_joint_limits(
                &ik_solution_last,
                &joint_velocity_last,
                &ik_solution,
                sampling_time,
                duration_current,
                joint_limits,
            )
            .map_err(|e| {
                error!(
                    "Inverse kinematics solution at {}s violates the joint velocity/acceleration/deceleration limits.",
                    time
                );
                e
            })?;
        }

        let mut point = JointTrajectoryPoint {
            time_from_start: Duration::from_secs_f64(time),
            ..Default::default()
        };
        for joint_name in &joint_names {
            let position = value_of(&ik_solution, joint_name)?;
            point.positions.push(position);
            let (velocity, acceleration) = if i != 0 && i != last_index {
                let distance = position - value_of(&ik_solution_last, joint_name)?;
                let velocity_last = value_of(&joint_velocity_last, joint_name)?;
                let acceleration = 2. * (distance - velocity_last * duration_current)
                    / duration_current.powi(2);
                (velocity_last + acceleration * duration_current, acceleration)
            } else {
                (0., 0.)
            };
            point.velocities.push(velocity);
            point.accelerations.push(acceleration);
            joint_velocity_last.insert(joint_name.clone(), velocity);
        }
        joint_trajectory.points.push(point);
        ik_solution_last = ik_solution;
    }

    log_generation_time(generation_begin, joint_trajectory.len());
    Ok(joint_trajectory)
}

/// Converts an already sampled Cartesian trajectory into a joint trajectory.
///
/// Every sample is resolved by inverse kinematics seeded with the solution of the previous
/// sample. Velocities and accelerations are finite differences, the first sample is
/// differentiated against `initial_joint_position` and `initial_joint_velocity` over its time
/// from start. Every sample, the first one included, is checked against the joint limits.
/// # Arguments
/// * `context` - Robot capabilities used for the inverse kinematics.
/// * `joint_limits` - Limits every sample is checked against.
/// * `trajectory` - Samples of the link named in the trajectory.
/// * `group_name` - Planning group.
/// * `initial_joint_position` - Seed of the first sample. Its joints name the trajectory.
/// * `initial_joint_velocity` - Joint velocities before the first sample.
/// # Errors
/// * NoSolutionFound (or the error of the inverse kinematics) if a sample cannot be resolved.
/// * LimitsViolated if a sample violates the joint limits.
/// * DegenerateInput if two samples are too close in time, in particular if the first
/// sample has no time from start.
pub fn generate_joint_trajectory_from_samples(
    context: &KinematicContext,
    joint_limits: &JointLimitsContainer,
    trajectory: &CartesianTrajectory,
    group_name: &str,
    initial_joint_position: &JointValues,
    initial_joint_velocity: &JointValues,
) -> PlanningResult<JointTrajectory> {
    debug!("Generate joint trajectory from a Cartesian trajectory.");
    let generation_begin = Instant::now();

    let model_frame = context.model.model_frame();
    let joint_names: Vec<String> = initial_joint_position.keys().cloned().collect();
    let mut joint_trajectory = JointTrajectory::new(joint_names.clone());

    let mut ik_solution_last = initial_joint_position.clone();
    let mut joint_velocity_last = initial_joint_velocity.clone();
    let mut duration_last = 0.;
    for (i, sample) in trajectory.points.iter().enumerate() {
        let ik_solution = context
            .compute_pose_ik(
                group_name,
                &trajectory.link_name,
                &sample.pose,
                &model_frame,
                &ik_solution_last,
            )
            .map_err(|e| {
                error!("Failed to compute inverse kinematics solution for sampled Cartesian pose.");
                e
            })?;

        let time = sample.time_from_start.as_secs_f64();
        let duration_current = if i == 0 {
            duration_last = time;
            time
        } else {
            time - trajectory.points[i - 1].time_from_start.as_secs_f64()
        };

        verify_sample_joint_limits(
            &ik_solution_last,
            &joint_velocity_last,
            &ik_solution,
            duration_last,
            duration_current,
            joint_limits,
        )
        .map_err(|e| {
            error!(
                "Inverse kinematics solution of the {}th sample violates the joint velocity/acceleration/deceleration limits.",
                i
            );
            e
        })?;

        let mut point = JointTrajectoryPoint {
            time_from_start: sample.time_from_start,
            ..Default::default()
        };
        for joint_name in &joint_names {
            let position = value_of(&ik_solution, joint_name)?;
            let velocity = (position - value_of(&ik_solution_last, joint_name)?) / duration_current;
            let acceleration = (velocity - value_of(&joint_velocity_last, joint_name)?)
                / (duration_current + duration_last)
                * 2.;
            point.positions.push(position);
            point.velocities.push(velocity);
            point.accelerations.push(acceleration);
            joint_velocity_last.insert(joint_name.clone(), velocity);
        }
        joint_trajectory.points.push(point);
        ik_solution_last = ik_solution;
        duration_last = duration_current;
    }

    log_generation_time(generation_begin, joint_trajectory.len());
    Ok(joint_trajectory)
}
