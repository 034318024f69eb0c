// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the capabilities this crate expects from a robot model, a kinematics solver and a
//! collision checker, together with the planner limits.
//!
//! None of these capabilities are implemented here. A robot description library implements
//! [`RobotModel`], [`Kinematics`] and [`CollisionChecker`] and hands them to the planner
//! bundled in a [`KinematicContext`].
use nalgebra::Isometry3;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::error;

use crate::exception::PlanningException;
use crate::utils::JointValues;
use crate::PlanningResult;

pub mod limits;

/// Default time the inverse kinematics solver is allowed to search for one pose.
pub const DEFAULT_IK_TIMEOUT: Duration = Duration::from_millis(100);

/// Lower and upper position bound of a joint.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionLimits {
    pub min_position: f64,
    pub max_position: f64,
}

impl PositionLimits {
    pub fn new(min_position: f64, max_position: f64) -> Self {
        PositionLimits {
            min_position,
            max_position,
        }
    }
    /// checks whether `position` lies within the bounds (bounds included).
    pub fn satisfies(&self, position: f64) -> bool {
        position >= self.min_position && position <= self.max_position
    }
}

/// Describes which joints and links a robot has.
pub trait RobotModel: Send + Sync {
    /// Name of the frame all poses are expressed in.
    fn model_frame(&self) -> String;
    /// Determines whether the model defines the planning group.
    fn has_group(&self, group_name: &str) -> bool;
    /// Active joints of the group in their kinematic order, `None` for an unknown group.
    fn active_joint_names(&self, group_name: &str) -> Option<Vec<String>>;
    /// Position limits of a joint, `None` for an unknown joint.
    fn position_limits(&self, joint_name: &str) -> Option<PositionLimits>;
    /// Determines whether an inverse kinematics solver is configured for the link in the group.
    fn can_solve_ik(&self, group_name: &str, link_name: &str) -> bool;
    /// The link the inverse kinematics solver of the group is configured for.
    fn solver_tip_frame(&self, group_name: &str) -> Option<String>;
}

/// Forward and inverse kinematics of a robot.
#[cfg_attr(test, mockall::automock)]
pub trait Kinematics: Send + Sync {
    /// Solves the inverse kinematics for `link_name` of the group.
    ///
    /// The solver starts its search at `seed` and gives up after `timeout`.
    /// # Return
    /// Positions of the active joints of the group or `None` if no solution was found.
    fn solve_ik(
        &self,
        group_name: &str,
        link_name: &str,
        pose: &Isometry3<f64>,
        frame_id: &str,
        seed: &JointValues,
        timeout: Duration,
    ) -> Option<JointValues>;

    /// Computes the pose of a link in the model frame, `None` if the link is unknown.
    fn solve_fk(&self, link_name: &str, joint_values: &JointValues) -> Option<Isometry3<f64>>;
}

/// Checks joint configurations for self collisions.
#[cfg_attr(test, mockall::automock)]
pub trait CollisionChecker: Send + Sync {
    fn is_colliding(&self, group_name: &str, joint_values: &JointValues) -> bool;
}

/// A [`CollisionChecker`] which never reports a collision.
#[derive(Debug, Copy, Clone, Default)]
pub struct NoCollisionChecking;

impl CollisionChecker for NoCollisionChecking {
    fn is_colliding(&self, _group_name: &str, _joint_values: &JointValues) -> bool {
        false
    }
}

/// Bundles the robot capabilities used during planning.
///
/// The context only borrows the capabilities, so it can be copied freely and each planning
/// call works on its own state. The capabilities are `Sync`, so one context can serve
/// planning calls on several threads.
#[derive(Copy, Clone)]
pub struct KinematicContext<'a> {
    pub model: &'a dyn RobotModel,
    pub kinematics: &'a dyn Kinematics,
    pub collision_checker: &'a dyn CollisionChecker,
    /// Rejects inverse kinematics solutions in self collision if set.
    pub check_self_collision: bool,
    pub ik_timeout: Duration,
}

impl<'a> KinematicContext<'a> {
    /// Creates a context without self collision checking and with the default IK timeout.
    pub fn new(model: &'a dyn RobotModel, kinematics: &'a dyn Kinematics) -> Self {
        KinematicContext {
            model,
            kinematics,
            collision_checker: &NoCollisionChecking,
            check_self_collision: false,
            ik_timeout: DEFAULT_IK_TIMEOUT,
        }
    }

    /// Enables self collision checking of inverse kinematics solutions with `collision_checker`.
    pub fn with_collision_checker(mut self, collision_checker: &'a dyn CollisionChecker) -> Self {
        self.collision_checker = collision_checker;
        self.check_self_collision = true;
        self
    }

    pub fn with_ik_timeout(mut self, ik_timeout: Duration) -> Self {
        self.ik_timeout = ik_timeout;
        self
    }

    /// Computes the joint positions of the group which bring `link_name` into `pose`.
    /// # Arguments
    /// * `group_name` - Planning group.
    /// * `link_name` - Link which should reach the pose.
    /// * `pose` - Target pose of the link.
    /// * `frame_id` - Frame of the pose, has to be the model frame.
    /// * `seed` - Joint positions the solver starts from.
    /// # Errors
    /// * UnknownGroup if the model does not have the group.
    /// * NoKinematicsSolver if there is no solver for the link.
    /// * NoSolutionFound if the frame is not the model frame, no (collision free) solution
    /// exists or the solution does not cover every active joint.
    pub fn compute_pose_ik(
        &self,
        group_name: &str,
        link_name: &str,
        pose: &Isometry3<f64>,
        frame_id: &str,
        seed: &JointValues,
    ) -> PlanningResult<JointValues> {
        let active_joints = match self.model.active_joint_names(group_name) {
            Some(joints) if self.model.has_group(group_name) => joints,
            _ => {
                error!("Robot model has no planning group named {}", group_name);
                return Err(PlanningException::UnknownGroup {
                    group: group_name.to_string(),
                });
            }
        };
        if !self.model.can_solve_ik(group_name, link_name) {
            error!(
                "No valid IK solver exists for {} in planning group {}",
                link_name, group_name
            );
            return Err(PlanningException::NoKinematicsSolver {
                message: format!(
                    "No valid IK solver exists for {} in planning group {}",
                    link_name, group_name
                ),
            });
        }
        let model_frame = self.model.model_frame();
        if frame_id != model_frame {
            error!(
                "Given frame ({}) is unequal to model frame ({})",
                frame_id, model_frame
            );
            return Err(PlanningException::NoSolutionFound {
                message: format!(
                    "Given frame ({}) is unequal to model frame ({})",
                    frame_id, model_frame
                ),
            });
        }

        let solution = self
            .kinematics
            .solve_ik(group_name, link_name, pose, frame_id, seed, self.ik_timeout)
            .ok_or_else(|| {
                error!(
                    "Inverse kinematics for position {:?} has no solution",
                    pose.translation.vector.as_slice()
                );
                PlanningException::NoSolutionFound {
                    message: format!(
                        "Inverse kinematics for position {:?} has no solution",
                        pose.translation.vector.as_slice()
                    ),
                }
            })?;

        let mut active_solution = JointValues::new();
        for joint_name in &active_joints {
            match solution.get(joint_name) {
                Some(&position) => {
                    active_solution.insert(joint_name.clone(), position);
                }
                None => {
                    error!("Inverse kinematics solution misses joint {}", joint_name);
                    return Err(PlanningException::NoSolutionFound {
                        message: format!("Inverse kinematics solution misses joint {}", joint_name),
                    });
                }
            }
        }

        if self.check_self_collision
            && self
                .collision_checker
                .is_colliding(group_name, &active_solution)
        {
            error!("Inverse kinematics solution is in self collision");
            return Err(PlanningException::NoSolutionFound {
                message: "Inverse kinematics solution is in self collision".to_string(),
            });
        }
        Ok(active_solution)
    }

    /// Computes the pose of `link_name` for the given joint positions.
    /// # Errors
    /// * NoKinematicsSolver if the link is not known by the robot.
    pub fn compute_link_fk(
        &self,
        link_name: &str,
        joint_values: &JointValues,
    ) -> PlanningResult<Isometry3<f64>> {
        self.kinematics
            .solve_fk(link_name, joint_values)
            .ok_or_else(|| {
                error!("The target link {} is not known by robot", link_name);
                PlanningException::NoKinematicsSolver {
                    message: format!("The target link {} is not known by robot", link_name),
                }
            })
    }
}
