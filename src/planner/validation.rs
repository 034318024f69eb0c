// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the checks every motion plan request has to pass before a trajectory is
//! generated.
use std::collections::BTreeSet;
use tracing::error;

use crate::exception::{create_goal_exception, create_start_state_exception, PlanningException};
use crate::model::RobotModel;
use crate::planner::request::{Constraints, MotionPlanRequest, RobotState};
use crate::PlanningResult;

/// Scaling factors have to be greater than this value.
pub static MIN_SCALING_FACTOR: f64 = 0.0001;
/// Scaling factors may not exceed this value.
pub static MAX_SCALING_FACTOR: f64 = 1.;
/// Largest start velocity which is still considered at rest in \[rad/s\].
pub static VELOCITY_TOLERANCE: f64 = 1e-8;

/// Determines whether a scaling factor lies in (0.0001, 1].
pub fn is_scaling_factor_valid(scaling_factor: f64) -> bool {
    scaling_factor > MIN_SCALING_FACTOR && scaling_factor <= MAX_SCALING_FACTOR
}

fn check_scaling_factor(scaling_factor: f64, name: &str) -> PlanningResult<()> {
    if !is_scaling_factor_valid(scaling_factor) {
        let message = format!(
            "{} scaling not in range [{}, {}], actual value is: {}",
            name, MIN_SCALING_FACTOR, MAX_SCALING_FACTOR, scaling_factor
        );
        error!("{}", message);
        return Err(PlanningException::InvalidScalingFactor { message });
    }
    Ok(())
}

fn start_state_error(message: String) -> PlanningException {
    error!("{}", message);
    create_start_state_exception(message)
}

fn goal_error(message: String) -> PlanningException {
    error!("{}", message);
    create_goal_exception(message)
}

fn check_start_state(
    model: &dyn RobotModel,
    active_joints: &[String],
    start_state: &RobotState,
) -> PlanningResult<()> {
    if start_state.joint_names.is_empty() {
        return Err(start_state_error("No joint names for state state given".to_string()));
    }
    if start_state.joint_names.len() != start_state.positions.len() {
        return Err(start_state_error(format!(
            "Joint state name and position do not match in start state ({} names, {} positions)",
            start_state.joint_names.len(),
            start_state.positions.len()
        )));
    }
    let unique_names: BTreeSet<&String> = start_state.joint_names.iter().collect();
    if unique_names.len() != active_joints.len()
        || start_state.joint_names.len() != active_joints.len()
    {
        return Err(start_state_error(format!(
            "Start state has {} joints, the group has {} active joints",
            start_state.joint_names.len(),
            active_joints.len()
        )));
    }
    for (joint_name, &position) in start_state.joint_names.iter().zip(start_state.positions.iter()) {
        if !active_joints.contains(joint_name) {
            return Err(start_state_error(format!(
                "Joint {} of the start state does not belong to the group",
                joint_name
            )));
        }
        match model.position_limits(joint_name) {
            Some(limits) if limits.satisfies(position) => {}
            _ => {
                return Err(start_state_error(format!(
                    "Joint {} of the start state is out of range ({})",
                    joint_name, position
                )))
            }
        }
    }
    if !start_state.velocities.is_empty() {
        if start_state.velocities.len() != start_state.joint_names.len() {
            return Err(start_state_error(
                "Joint state name and velocity do not match in start state".to_string(),
            ));
        }
        if start_state
            .velocities
            .iter()
            .any(|velocity| velocity.abs() > VELOCITY_TOLERANCE)
        {
            return Err(start_state_error(
                "Trajectory Generator does not allow non-zero start velocity".to_string(),
            ));
        }
    }
    Ok(())
}

fn check_joint_goal_constraint(
    model: &dyn RobotModel,
    constraint: &Constraints,
    expected_joint_names: &[String],
    active_joints: &[String],
) -> PlanningResult<()> {
    let goal_names: BTreeSet<&String> = constraint
        .joint_constraints
        .iter()
        .map(|joint_constraint| &joint_constraint.joint_name)
        .collect();
    let expected_names: BTreeSet<&String> = expected_joint_names.iter().collect();
    if goal_names != expected_names {
        return Err(goal_error(
            "Cannot create joint goal for group, joint names of start state and goal do not match"
                .to_string(),
        ));
    }
    for joint_constraint in &constraint.joint_constraints {
        if !active_joints.contains(&joint_constraint.joint_name) {
            return Err(goal_error(format!(
                "Joint {} does not belong to the group",
                joint_constraint.joint_name
            )));
        }
        match model.position_limits(&joint_constraint.joint_name) {
            Some(limits) if limits.satisfies(joint_constraint.position) => {}
            _ => {
                return Err(goal_error(format!(
                    "Goal of joint {} is out of range ({})",
                    joint_constraint.joint_name, joint_constraint.position
                )))
            }
        }
    }
    Ok(())
}

fn check_cartesian_goal_constraint(
    model: &dyn RobotModel,
    constraint: &Constraints,
    group_name: &str,
) -> PlanningResult<()> {
    let position_constraint = &constraint.position_constraints[0];
    let orientation_constraint = &constraint.orientation_constraints[0];
    if position_constraint.link_name.is_empty() {
        return Err(goal_error("Link name of position constraint missing".to_string()));
    }
    if orientation_constraint.link_name.is_empty() {
        return Err(goal_error("Link name of orientation constraint missing".to_string()));
    }
    if position_constraint.link_name != orientation_constraint.link_name {
        return Err(goal_error(format!(
            "Link name of position ({}) and orientation ({}) constraint differ",
            position_constraint.link_name, orientation_constraint.link_name
        )));
    }
    if !model.can_solve_ik(group_name, &position_constraint.link_name) {
        let message = format!(
            "No IK solver available for link {} in group {}",
            position_constraint.link_name, group_name
        );
        error!("{}", message);
        return Err(PlanningException::NoKinematicsSolver { message });
    }
    if position_constraint.primitive_poses.is_empty() {
        return Err(goal_error("Primitive pose in position constraints of goal missing".to_string()));
    }
    Ok(())
}

fn check_goal_constraints(
    model: &dyn RobotModel,
    goal_constraints: &[Constraints],
    expected_joint_names: &[String],
    active_joints: &[String],
    group_name: &str,
) -> PlanningResult<()> {
    if goal_constraints.len() != 1 {
        return Err(goal_error(format!(
            "Exactly one goal constraint required, but {} goal constraints given",
            goal_constraints.len()
        )));
    }
    let constraint = &goal_constraints[0];
    if !constraint.is_only_one_goal_type_given() {
        return Err(goal_error(
            "Only cartesian XOR joint goal allowed".to_string(),
        ));
    }
    if constraint.is_joint_goal() {
        check_joint_goal_constraint(model, constraint, expected_joint_names, active_joints)
    } else {
        check_cartesian_goal_constraint(model, constraint, group_name)
    }
}

/// Validates a motion plan request against the robot model.
///
/// Checks in this order, each failure is reported on its own:
/// 1. both scaling factors lie in (0.0001, 1]
/// 2. the group exists
/// 3. the start state names exactly the active joints of the group, lies within the position
/// limits and is at rest
/// 4. exactly one goal constraint with exactly one goal type is given
/// 5. a joint goal names the same joints as the start state, all of the group, within limits
/// 6. a Cartesian goal names the same link in its position and orientation constraint, the
/// link has an inverse kinematics solver and a target position is given
/// # Errors
/// * InvalidScalingFactor, UnknownGroup, InvalidStartState, InvalidGoalConstraints or
/// NoKinematicsSolver for the first failing check.
pub fn validate_request(model: &dyn RobotModel, request: &MotionPlanRequest) -> PlanningResult<()> {
    check_scaling_factor(request.max_velocity_scaling_factor, "Velocity")?;
    check_scaling_factor(request.max_acceleration_scaling_factor, "Acceleration")?;

    let active_joints = match model.active_joint_names(&request.group_name) {
        Some(joints) if model.has_group(&request.group_name) => joints,
        _ => {
            error!("Unknown planning group: {}", request.group_name);
            return Err(PlanningException::UnknownGroup {
                group: request.group_name.clone(),
            });
        }
    };

    check_start_state(model, &active_joints, &request.start_state)?;
    check_goal_constraints(
        model,
        &request.goal_constraints,
        &request.start_state.joint_names,
        &active_joints,
        &request.group_name,
    )
}
