// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the in-memory motion plan request and response.
use nalgebra::{Quaternion, Vector3};
use std::time::Duration;

use crate::exception::{ErrorKind, PlanningException};
use crate::trajectory::RobotTrajectory;
use crate::utils::{joint_values_from, JointValues};

/// Joint state of the robot at the beginning of the motion.
///
/// `positions` and `velocities` are ordered like `joint_names`. Empty velocities mean the
/// robot is at rest.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RobotState {
    pub joint_names: Vec<String>,
    pub positions: Vec<f64>,
    pub velocities: Vec<f64>,
}

impl RobotState {
    /// Creates a state at rest.
    pub fn new<S: AsRef<str>>(joint_names: &[S], positions: &[f64]) -> Self {
        RobotState {
            joint_names: joint_names.iter().map(|n| n.as_ref().to_string()).collect(),
            positions: positions.to_vec(),
            velocities: Vec::new(),
        }
    }
    /// Positions keyed by joint name.
    pub fn joint_positions(&self) -> JointValues {
        joint_values_from(&self.joint_names, &self.positions)
    }
}

/// Target position of a single joint.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JointConstraint {
    pub joint_name: String,
    pub position: f64,
}

/// Target position of a link. Only the first primitive pose is used.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PositionConstraint {
    pub link_name: String,
    pub frame_id: String,
    pub primitive_poses: Vec<Vector3<f64>>,
}

/// Target orientation of a link. The quaternion does not need to be normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct OrientationConstraint {
    pub link_name: String,
    pub frame_id: String,
    pub orientation: Quaternion<f64>,
}

/// A named set of constraints.
///
/// As a goal it holds either joint constraints or exactly one position and one orientation
/// constraint. As path constraint of a circular motion its name tells how the position
/// constraint defines the circle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Constraints {
    pub name: String,
    pub joint_constraints: Vec<JointConstraint>,
    pub position_constraints: Vec<PositionConstraint>,
    pub orientation_constraints: Vec<OrientationConstraint>,
}

impl Constraints {
    /// Creates a joint goal.
    pub fn joint_goal<S: AsRef<str>>(joint_names: &[S], positions: &[f64]) -> Self {
        Constraints {
            joint_constraints: joint_names
                .iter()
                .zip(positions.iter())
                .map(|(name, &position)| JointConstraint {
                    joint_name: name.as_ref().to_string(),
                    position,
                })
                .collect(),
            ..Default::default()
        }
    }

    /// Creates a Cartesian goal for `link_name`.
    pub fn cartesian_goal(
        link_name: &str,
        frame_id: &str,
        position: Vector3<f64>,
        orientation: Quaternion<f64>,
    ) -> Self {
        Constraints {
            position_constraints: vec![PositionConstraint {
                link_name: link_name.to_string(),
                frame_id: frame_id.to_string(),
                primitive_poses: vec![position],
            }],
            orientation_constraints: vec![OrientationConstraint {
                link_name: link_name.to_string(),
                frame_id: frame_id.to_string(),
                orientation,
            }],
            ..Default::default()
        }
    }

    /// Creates the path constraint of a circular motion. `name` is `interim` or `center`.
    pub fn path_point(name: &str, link_name: &str, frame_id: &str, position: Vector3<f64>) -> Self {
        Constraints {
            name: name.to_string(),
            position_constraints: vec![PositionConstraint {
                link_name: link_name.to_string(),
                frame_id: frame_id.to_string(),
                primitive_poses: vec![position],
            }],
            ..Default::default()
        }
    }

    /// checks whether exactly one position and one orientation constraint are given.
    pub fn is_cartesian_goal(&self) -> bool {
        self.position_constraints.len() == 1 && self.orientation_constraints.len() == 1
    }
    pub fn is_joint_goal(&self) -> bool {
        !self.joint_constraints.is_empty()
    }
    /// checks whether either a joint goal or a Cartesian goal is given, but not both.
    pub fn is_only_one_goal_type_given(&self) -> bool {
        self.is_joint_goal() != self.is_cartesian_goal()
    }
    /// Goal positions keyed by joint name.
    pub fn joint_positions(&self) -> JointValues {
        self.joint_constraints
            .iter()
            .map(|constraint| (constraint.joint_name.clone(), constraint.position))
            .collect()
    }
}

/// Describes the motion a caller wants to be planned.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MotionPlanRequest {
    /// Motion primitive: `PTP`, `LIN` or `CIRC`.
    pub planner_id: String,
    pub group_name: String,
    pub start_state: RobotState,
    pub goal_constraints: Vec<Constraints>,
    pub path_constraints: Constraints,
    pub max_velocity_scaling_factor: f64,
    pub max_acceleration_scaling_factor: f64,
}

/// Outcome of a motion plan request.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionPlanResponse {
    pub group_name: String,
    pub trajectory_start: RobotState,
    /// The planned trajectory, `None` if planning failed.
    pub trajectory: Option<RobotTrajectory>,
    /// Why planning failed, `None` on success.
    pub error: Option<PlanningException>,
    /// Wall clock time spent planning.
    pub planning_time: Duration,
}

impl MotionPlanResponse {
    pub(crate) fn success(
        request: &MotionPlanRequest,
        trajectory: RobotTrajectory,
        planning_time: Duration,
    ) -> Self {
        MotionPlanResponse {
            group_name: request.group_name.clone(),
            trajectory_start: request.start_state.clone(),
            trajectory: Some(trajectory),
            error: None,
            planning_time,
        }
    }
    pub(crate) fn failure(
        request: &MotionPlanRequest,
        error: PlanningException,
        planning_time: Duration,
    ) -> Self {
        MotionPlanResponse {
            group_name: request.group_name.clone(),
            trajectory_start: request.start_state.clone(),
            trajectory: None,
            error: Some(error),
            planning_time,
        }
    }
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(PlanningException::kind)
    }
}

#[cfg(test)]
mod tests {
    use crate::planner::request::{Constraints, RobotState};
    use nalgebra::{Quaternion, Vector3};

    #[test]
    fn goal_types() {
        let joint_goal = Constraints::joint_goal(&["j1", "j2"], &[1., 0.5]);
        assert!(joint_goal.is_joint_goal());
        assert!(!joint_goal.is_cartesian_goal());
        assert!(joint_goal.is_only_one_goal_type_given());
        assert_eq!(joint_goal.joint_positions()["j2"], 0.5);

        let mut both = Constraints::cartesian_goal(
            "tool0",
            "world",
            Vector3::zeros(),
            Quaternion::identity(),
        );
        assert!(both.is_only_one_goal_type_given());
        both.joint_constraints = joint_goal.joint_constraints;
        assert!(!both.is_only_one_goal_type_given());
        assert!(!Constraints::default().is_only_one_goal_type_given());
    }

    #[test]
    fn start_state_positions() {
        let state = RobotState::new(&["a", "b"], &[0.1, 0.2]);
        let positions = state.joint_positions();
        assert_eq!(positions.len(), 2);
        assert_eq!(positions["b"], 0.2);
        assert!(state.velocities.is_empty());
    }
}
