// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the motion primitives and how each of them turns a request into a joint trajectory.
use nalgebra::{Isometry3, Vector3};
use std::fmt;
use tracing::{debug, error};

use crate::exception::{create_config_exception, create_goal_exception, PlanningException};
use crate::model::limits::{CartesianLimits, LimitsContainer};
use crate::model::KinematicContext;
use crate::planner::ptp::{check_joint_limits, plan_ptp};
use crate::planner::request::{Constraints, MotionPlanRequest};
use crate::trajectory::generation::generate_joint_trajectory;
use crate::trajectory::path::{CircularPath, LinearPath, PathGeometry, ProfiledPath};
use crate::trajectory::velocity_profile::cartesian_trap_velocity_profile;
use crate::trajectory::JointTrajectory;
use crate::utils::{normalize_quaternion, pose_from_parts, JointValues};
use crate::PlanningResult;

/// Name of the path constraint which gives a point on the arc of a circular motion.
pub static INTERIM_POINT_NAME: &str = "interim";
/// Name of the path constraint which gives the center of a circular motion.
pub static CENTER_POINT_NAME: &str = "center";

/// Auxiliary point which defines the circle of a circular motion.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum CircPathPoint {
    /// A point on the arc between start and goal.
    Interim(Vector3<f64>),
    /// The center of the circle.
    Center(Vector3<f64>),
}

/// The data of a validated request every motion primitive plans with.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionPlanInfo {
    pub group_name: String,
    /// Link which performs the motion.
    pub link_name: String,
    pub start_pose: Isometry3<f64>,
    pub goal_pose: Isometry3<f64>,
    pub start_joint_position: JointValues,
    /// Goal positions, empty for Cartesian goals of Cartesian motions.
    pub goal_joint_position: JointValues,
    pub circ_path_point: Option<CircPathPoint>,
}

/// Kind of motion a trajectory generator plans.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MotionPrimitive {
    /// Synchronized point to point motion in joint space.
    Ptp,
    /// Straight line of the link.
    Lin,
    /// Circular arc of the link.
    Circ,
}

impl fmt::Display for MotionPrimitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.planner_id())
    }
}

fn goal_pose(model_frame: &str, constraint: &Constraints) -> PlanningResult<(String, Isometry3<f64>)> {
    let position_constraint = &constraint.position_constraints[0];
    let orientation_constraint = &constraint.orientation_constraints[0];
    for frame_id in [&position_constraint.frame_id, &orientation_constraint.frame_id] {
        if frame_id != model_frame {
            let message = format!(
                "Goal frame ({}) is unequal to model frame ({})",
                frame_id, model_frame
            );
            error!("{}", message);
            return Err(create_goal_exception(message));
        }
    }
    let position = position_constraint
        .primitive_poses
        .first()
        .ok_or_else(|| create_goal_exception("Primitive pose in position constraints of goal missing"))?;
    let orientation = normalize_quaternion(&orientation_constraint.orientation)
        .ok_or_else(|| create_goal_exception("Goal orientation is no valid quaternion"))?;
    Ok((
        position_constraint.link_name.clone(),
        pose_from_parts(position, &orientation),
    ))
}

fn circ_path_point(request: &MotionPlanRequest) -> PlanningResult<CircPathPoint> {
    let path_constraints = &request.path_constraints;
    let position = path_constraints
        .position_constraints
        .first()
        .and_then(|constraint| constraint.primitive_poses.first())
        .copied();
    let position = position.ok_or_else(|| {
        error!("No auxiliary point for the circular motion given");
        PlanningException::InvalidPathConstraints {
            message: "No auxiliary point for the circular motion given".to_string(),
        }
    })?;
    if path_constraints.name == INTERIM_POINT_NAME {
        Ok(CircPathPoint::Interim(position))
    } else if path_constraints.name == CENTER_POINT_NAME {
        Ok(CircPathPoint::Center(position))
    } else {
        let message = format!(
            "Path constraint of a circular motion has to be named {} or {}, got '{}'",
            INTERIM_POINT_NAME, CENTER_POINT_NAME, path_constraints.name
        );
        error!("{}", message);
        Err(PlanningException::InvalidPathConstraints { message })
    }
}

fn required_cartesian_limits(limits: &LimitsContainer) -> PlanningResult<&CartesianLimits> {
    limits
        .cartesian_limits
        .as_ref()
        .ok_or_else(|| create_config_exception("Cartesian motions need Cartesian limits"))
}

impl MotionPrimitive {
    /// Selects the primitive named `PTP`, `LIN` or `CIRC`.
    pub fn from_planner_id(planner_id: &str) -> Option<Self> {
        match planner_id {
            "PTP" => Some(MotionPrimitive::Ptp),
            "LIN" => Some(MotionPrimitive::Lin),
            "CIRC" => Some(MotionPrimitive::Circ),
            _ => None,
        }
    }

    pub fn planner_id(&self) -> &'static str {
        match self {
            MotionPrimitive::Ptp => "PTP",
            MotionPrimitive::Lin => "LIN",
            MotionPrimitive::Circ => "CIRC",
        }
    }

    /// Checks that the limits hold everything the primitive needs.
    /// # Errors
    /// * InvalidConfiguration if joint limits (point to point) or Cartesian limits are missing.
    pub fn check_limits(&self, limits: &LimitsContainer, joint_names: &[String]) -> PlanningResult<()> {
        match self {
            MotionPrimitive::Ptp => check_joint_limits(joint_names, &limits.joint_limits),
            MotionPrimitive::Lin | MotionPrimitive::Circ => {
                required_cartesian_limits(limits).map(|_| ())
            }
        }
    }

    /// Checks the parts of a request only this primitive cares about.
    /// # Errors
    /// * InvalidPathConstraints if a circular motion has no valid auxiliary point.
    pub fn validate_request(&self, request: &MotionPlanRequest) -> PlanningResult<()> {
        match self {
            MotionPrimitive::Circ => circ_path_point(request).map(|_| ()),
            MotionPrimitive::Ptp | MotionPrimitive::Lin => Ok(()),
        }
    }

    /// Extracts the information needed for planning from a validated request.
    ///
    /// A point to point motion resolves a Cartesian goal by inverse kinematics seeded with the
    /// start state. Cartesian motions use the tip frame of the group's solver for joint goals
    /// and compute the goal pose by forward kinematics.
    /// # Errors
    /// * InvalidGoalConstraints if the goal is not given in the model frame or its orientation
    /// is no valid quaternion.
    /// * InvalidPathConstraints if a circular motion has no valid auxiliary point.
    /// * NoKinematicsSolver or NoSolutionFound if the kinematics fail.
    pub fn extract_motion_plan_info(
        &self,
        context: &KinematicContext,
        request: &MotionPlanRequest,
    ) -> PlanningResult<MotionPlanInfo> {
        debug!("Extract necessary information from motion plan request.");
        let group_name = request.group_name.clone();
        let start_joint_position = request.start_state.joint_positions();
        let goal = request
            .goal_constraints
            .first()
            .ok_or_else(|| create_goal_exception("No goal constraint given"))?;
        let model_frame = context.model.model_frame();

        let (link_name, goal_joint_position, goal_pose) = if goal.is_joint_goal() {
            let link_name = context.model.solver_tip_frame(&group_name).ok_or_else(|| {
                PlanningException::NoKinematicsSolver {
                    message: format!("No IK solver configured for group {}", group_name),
                }
            })?;
            let goal_joint_position = goal.joint_positions();
            let goal_pose = context.compute_link_fk(&link_name, &goal_joint_position)?;
            (link_name, goal_joint_position, goal_pose)
        } else {
            let (link_name, goal_pose) = goal_pose(&model_frame, goal)?;
            let goal_joint_position = if *self == MotionPrimitive::Ptp {
                context.compute_pose_ik(
                    &group_name,
                    &link_name,
                    &goal_pose,
                    &model_frame,
                    &start_joint_position,
                )?
            } else {
                JointValues::new()
            };
            (link_name, goal_joint_position, goal_pose)
        };
        let start_pose = context.compute_link_fk(&link_name, &start_joint_position)?;
        let circ_path_point = match self {
            MotionPrimitive::Circ => Some(circ_path_point(request)?),
            MotionPrimitive::Ptp | MotionPrimitive::Lin => None,
        };

        Ok(MotionPlanInfo {
            group_name,
            link_name,
            start_pose,
            goal_pose,
            start_joint_position,
            goal_joint_position,
            circ_path_point,
        })
    }

    fn plan_cartesian<G: PathGeometry>(
        context: &KinematicContext,
        limits: &LimitsContainer,
        request: &MotionPlanRequest,
        info: &MotionPlanInfo,
        geometry: G,
        sampling_time: f64,
    ) -> PlanningResult<JointTrajectory> {
        let profile = cartesian_trap_velocity_profile(
            request.max_velocity_scaling_factor,
            request.max_acceleration_scaling_factor,
            required_cartesian_limits(limits)?,
            geometry.translational_length(),
            geometry.rotational_length(),
        );
        let path = ProfiledPath::new(geometry, profile);
        generate_joint_trajectory(
            context,
            &limits.joint_limits,
            &path,
            &info.group_name,
            &info.link_name,
            &info.start_joint_position,
            sampling_time,
        )
    }

    /// Plans the joint trajectory of the primitive.
    /// # Errors
    /// * InvalidPathConstraints if the auxiliary point does not define a circle.
    /// * Every error of the joint trajectory generation.
    pub fn plan(
        &self,
        context: &KinematicContext,
        limits: &LimitsContainer,
        request: &MotionPlanRequest,
        info: &MotionPlanInfo,
        sampling_time: f64,
    ) -> PlanningResult<JointTrajectory> {
        debug!("Plan {} motion of {}", self, info.link_name);
        match self {
            MotionPrimitive::Ptp => plan_ptp(
                &info.start_joint_position,
                &info.goal_joint_position,
                &limits.joint_limits,
                request.max_velocity_scaling_factor,
                request.max_acceleration_scaling_factor,
                sampling_time,
            ),
            MotionPrimitive::Lin => Self::plan_cartesian(
                context,
                limits,
                request,
                info,
                LinearPath::new(info.start_pose, info.goal_pose),
                sampling_time,
            ),
            MotionPrimitive::Circ => {
                let geometry = match info.circ_path_point {
                    Some(CircPathPoint::Interim(interim)) => {
                        CircularPath::from_interim(&info.start_pose, &info.goal_pose, &interim)?
                    }
                    Some(CircPathPoint::Center(center)) => {
                        CircularPath::from_center(&info.start_pose, &info.goal_pose, &center)?
                    }
                    None => {
                        return Err(PlanningException::InvalidPathConstraints {
                            message: "No auxiliary point for the circular motion given".to_string(),
                        })
                    }
                };
                Self::plan_cartesian(context, limits, request, info, geometry, sampling_time)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::exception::ErrorKind;
    use crate::model::KinematicContext;
    use crate::planner::primitives::{CircPathPoint, MotionPrimitive};
    use crate::planner::request::{Constraints, MotionPlanRequest, RobotState};
    use crate::testing::GantryRobot;
    use nalgebra::{Quaternion, Vector3};

    fn request(goal: Constraints) -> MotionPlanRequest {
        MotionPlanRequest {
            planner_id: "LIN".to_string(),
            group_name: "arm".to_string(),
            start_state: RobotState::new(&["x", "y", "z"], &[0., 0., 0.]),
            goal_constraints: vec![goal],
            max_velocity_scaling_factor: 1.,
            max_acceleration_scaling_factor: 1.,
            ..Default::default()
        }
    }

    fn cartesian_goal(frame_id: &str) -> Constraints {
        Constraints::cartesian_goal(
            "tool0",
            frame_id,
            Vector3::new(0.1, 0.2, 0.),
            Quaternion::new(2., 0., 0., 0.),
        )
    }

    #[test]
    fn planner_ids() {
        for primitive in [MotionPrimitive::Ptp, MotionPrimitive::Lin, MotionPrimitive::Circ] {
            assert_eq!(MotionPrimitive::from_planner_id(primitive.planner_id()), Some(primitive));
        }
        assert_eq!(MotionPrimitive::from_planner_id("SPLINE"), None);
        assert_eq!(MotionPrimitive::Circ.to_string(), "CIRC");
    }

    #[test]
    fn extract_joint_goal() {
        let robot = GantryRobot::xyz();
        let context = KinematicContext::new(&robot, &robot);
        let req = request(Constraints::joint_goal(&["x", "y", "z"], &[0.3, 0., 0.1]));
        let info = MotionPrimitive::Lin
            .extract_motion_plan_info(&context, &req)
            .unwrap();
        assert_eq!(info.link_name, "tool0");
        assert_eq!(info.goal_pose.translation.vector, Vector3::new(0.3, 0., 0.1));
        assert_eq!(info.start_pose.translation.vector, Vector3::zeros());
        assert_eq!(info.goal_joint_position["x"], 0.3);
        assert_eq!(info.circ_path_point, None);
    }

    #[test]
    fn extract_cartesian_goal() {
        let robot = GantryRobot::xyz();
        let context = KinematicContext::new(&robot, &robot);
        let req = request(cartesian_goal("world"));
        let info = MotionPrimitive::Lin
            .extract_motion_plan_info(&context, &req)
            .unwrap();
        assert!(info.goal_joint_position.is_empty());
        assert!((info.goal_pose.rotation.angle()).abs() < 1e-12);

        let info = MotionPrimitive::Ptp
            .extract_motion_plan_info(&context, &req)
            .unwrap();
        assert!((info.goal_joint_position["y"] - 0.2).abs() < 1e-12);

        let error = MotionPrimitive::Lin
            .extract_motion_plan_info(&context, &request(cartesian_goal("base")))
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidGoalConstraints);

        let mut goal = cartesian_goal("world");
        goal.orientation_constraints[0].frame_id = "base".to_string();
        let error = MotionPrimitive::Lin
            .extract_motion_plan_info(&context, &request(goal))
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidGoalConstraints);

        let mut goal = cartesian_goal("world");
        goal.orientation_constraints[0].orientation = Quaternion::new(0., 0., 0., 0.);
        let error = MotionPrimitive::Lin
            .extract_motion_plan_info(&context, &request(goal))
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidGoalConstraints);
    }

    #[test]
    fn circ_path_points() {
        let robot = GantryRobot::xyz();
        let context = KinematicContext::new(&robot, &robot);
        let mut req = request(cartesian_goal("world"));
        assert_eq!(
            MotionPrimitive::Circ.validate_request(&req).unwrap_err().kind(),
            ErrorKind::InvalidPathConstraints
        );
        assert!(MotionPrimitive::Lin.validate_request(&req).is_ok());

        req.path_constraints =
            Constraints::path_point("middle", "tool0", "world", Vector3::new(0.1, 0., 0.));
        assert_eq!(
            MotionPrimitive::Circ.validate_request(&req).unwrap_err().kind(),
            ErrorKind::InvalidPathConstraints
        );

        req.path_constraints =
            Constraints::path_point("center", "tool0", "world", Vector3::new(0.1, 0., 0.));
        let info = MotionPrimitive::Circ
            .extract_motion_plan_info(&context, &req)
            .unwrap();
        assert_eq!(
            info.circ_path_point,
            Some(CircPathPoint::Center(Vector3::new(0.1, 0., 0.)))
        );
    }
}
