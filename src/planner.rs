// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the [`TrajectoryGenerator`] which answers motion plan requests.
use std::time::Instant;
use tracing::{debug, error, info};

use crate::config::PlannerConfig;
use crate::exception::{create_config_exception, PlanningException};
use crate::model::limits::LimitsContainer;
use crate::model::KinematicContext;
use crate::planner::primitives::MotionPrimitive;
use crate::planner::request::{MotionPlanRequest, MotionPlanResponse};
use crate::planner::validation::validate_request;
use crate::trajectory::{JointTrajectory, JointTrajectoryPoint, RobotTrajectory};
use crate::PlanningResult;

pub mod primitives;
pub mod ptp;
pub mod request;
pub mod validation;

/// Generates trajectories for point to point, linear and circular motions.
///
/// The generator holds no state which changes while planning. [`generate`](Self::generate)
/// only takes `&self`, so independent requests can be answered by the same generator.
pub struct TrajectoryGenerator<'a> {
    context: KinematicContext<'a>,
    limits: LimitsContainer,
    sampling_time: f64,
}

fn align_to_group(
    joint_trajectory: &JointTrajectory,
    group_joints: &[String],
) -> PlanningResult<JointTrajectory> {
    let indices = group_joints
        .iter()
        .map(|joint_name| {
            joint_trajectory
                .joint_names
                .iter()
                .position(|name| name == joint_name)
                .ok_or_else(|| PlanningException::DegenerateInput {
                    message: format!("Trajectory misses joint {}", joint_name),
                })
        })
        .collect::<PlanningResult<Vec<usize>>>()?;
    let mut aligned = JointTrajectory::new(group_joints.to_vec());
    for point in &joint_trajectory.points {
        aligned.points.push(JointTrajectoryPoint {
            time_from_start: point.time_from_start,
            positions: indices.iter().map(|&i| point.positions[i]).collect(),
            velocities: indices.iter().map(|&i| point.velocities[i]).collect(),
            accelerations: indices.iter().map(|&i| point.accelerations[i]).collect(),
        });
    }
    Ok(aligned)
}

impl<'a> TrajectoryGenerator<'a> {
    /// Creates a generator which samples with [`DEFAULT_SAMPLING_TIME`](crate::DEFAULT_SAMPLING_TIME).
    /// # Errors
    /// * InvalidConfiguration if the limits are not usable.
    pub fn new(context: KinematicContext<'a>, limits: LimitsContainer) -> PlanningResult<Self> {
        limits.validate()?;
        Ok(TrajectoryGenerator {
            context,
            limits,
            sampling_time: crate::config::DEFAULT_SAMPLING_TIME,
        })
    }

    /// Creates a generator from a planner configuration. The IK timeout, the self collision
    /// check and the sampling time of the configuration are applied.
    /// # Errors
    /// * InvalidConfiguration if the configuration is not usable.
    pub fn from_config(context: KinematicContext<'a>, config: &PlannerConfig) -> PlanningResult<Self> {
        config.validate()?;
        let mut context = context.with_ik_timeout(config.ik_timeout());
        context.check_self_collision = config.check_self_collision;
        Ok(TrajectoryGenerator {
            context,
            limits: config.limits.clone(),
            sampling_time: config.sampling_time,
        })
    }

    pub fn limits(&self) -> &LimitsContainer {
        &self.limits
    }

    /// Sampling time used by [`generate_default`](Self::generate_default).
    pub fn sampling_time(&self) -> f64 {
        self.sampling_time
    }

    /// Answers a request with the configured sampling time.
    pub fn generate_default(&self, request: &MotionPlanRequest) -> MotionPlanResponse {
        self.generate(request, self.sampling_time)
    }

    /// Validates the request, plans the motion selected by its planner id and samples it
    /// every `sampling_time` seconds.
    ///
    /// The response carries the planning time on success and on failure. A failed request
    /// never carries a trajectory.
    pub fn generate(&self, request: &MotionPlanRequest, sampling_time: f64) -> MotionPlanResponse {
        debug!("Generating {} trajectory...", request.planner_id);
        let planning_begin = Instant::now();
        let result = self.try_generate(request, sampling_time);
        let planning_time = planning_begin.elapsed();
        match result {
            Ok(trajectory) => {
                info!(
                    "Generated {} trajectory with {} points in {:?}",
                    request.planner_id,
                    trajectory.waypoint_count(),
                    planning_time
                );
                MotionPlanResponse::success(request, trajectory, planning_time)
            }
            Err(e) => {
                error!("Planning {} failed: {}", request.planner_id, e);
                MotionPlanResponse::failure(request, e, planning_time)
            }
        }
    }

    fn try_generate(
        &self,
        request: &MotionPlanRequest,
        sampling_time: f64,
    ) -> PlanningResult<RobotTrajectory> {
        validate_request(self.context.model, request)?;

        let primitive = MotionPrimitive::from_planner_id(&request.planner_id).ok_or_else(|| {
            create_config_exception(format!(
                "No trajectory generator for planner id '{}'",
                request.planner_id
            ))
        })?;
        primitive.check_limits(&self.limits, &request.start_state.joint_names)?;
        primitive.validate_request(request)?;

        let plan_info = primitive.extract_motion_plan_info(&self.context, request)?;
        let joint_trajectory =
            primitive.plan(&self.context, &self.limits, request, &plan_info, sampling_time)?;

        let group_joints = self
            .context
            .model
            .active_joint_names(&request.group_name)
            .ok_or_else(|| PlanningException::UnknownGroup {
                group: request.group_name.clone(),
            })?;
        let aligned = align_to_group(&joint_trajectory, &group_joints)?;
        Ok(RobotTrajectory::from_joint_trajectory(
            request.group_name.clone(),
            &aligned,
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::config::PlannerConfig;
    use crate::exception::ErrorKind;
    use crate::model::limits::{CartesianLimits, JointLimits, JointLimitsContainer, LimitsContainer};
    use crate::model::{KinematicContext, MockCollisionChecker};
    use crate::planner::request::{Constraints, MotionPlanRequest, RobotState};
    use crate::planner::TrajectoryGenerator;
    use crate::testing::GantryRobot;
    use nalgebra::{Quaternion, Vector3};

    fn limits<S: AsRef<str>>(joint_names: &[S]) -> LimitsContainer {
        let mut joint_limits = JointLimitsContainer::new();
        for joint_name in joint_names {
            joint_limits.add_limit(
                joint_name.as_ref(),
                JointLimits::new(1.0, Some(2.0), Some(-2.0)),
            );
        }
        LimitsContainer::new(
            joint_limits,
            Some(CartesianLimits {
                max_trans_vel: 0.5,
                max_trans_acc: 1.0,
                max_trans_dec: -1.0,
                max_rot_vel: 1.0,
            }),
        )
    }

    fn request(planner_id: &str, goal: Constraints) -> MotionPlanRequest {
        MotionPlanRequest {
            planner_id: planner_id.to_string(),
            group_name: "arm".to_string(),
            start_state: RobotState::new(&["x", "y", "z"], &[0., 0., 0.]),
            goal_constraints: vec![goal],
            max_velocity_scaling_factor: 1.,
            max_acceleration_scaling_factor: 1.,
            ..Default::default()
        }
    }

    fn cartesian_goal(position: Vector3<f64>) -> Constraints {
        Constraints::cartesian_goal("tool0", "world", position, Quaternion::identity())
    }

    #[test]
    fn ptp_with_two_joints() {
        let robot = GantryRobot::new(&["j1", "j2"]);
        let generator =
            TrajectoryGenerator::new(KinematicContext::new(&robot, &robot), limits(&["j1", "j2"]))
                .unwrap();
        let req = MotionPlanRequest {
            start_state: RobotState::new(&["j1", "j2"], &[0., 0.]),
            ..request("PTP", Constraints::joint_goal(&["j1", "j2"], &[1.0, 0.5]))
        };
        let response = generator.generate(&req, 0.1);
        assert!(response.is_success(), "{:?}", response.error);
        assert_eq!(response.group_name, "arm");
        assert_eq!(response.trajectory_start, req.start_state);

        let trajectory = response.trajectory.unwrap().to_joint_trajectory();
        assert_eq!(trajectory.joint_names, vec!["j1", "j2"]);
        let last = trajectory.points.last().unwrap();
        assert!((last.positions[0] - 1.0).abs() < 1e-9);
        assert!((last.positions[1] - 0.5).abs() < 1e-9);
        for point in &trajectory.points {
            assert_eq!(point.positions.len(), 2);
            for velocity in &point.velocities {
                assert!(velocity.abs() <= 1.0 + 1e-9);
            }
        }
        for window in trajectory.points.windows(2) {
            assert!(window[0].time_from_start <= window[1].time_from_start);
        }
    }

    #[test]
    fn lin_with_cartesian_goal() {
        let robot = GantryRobot::xyz();
        let generator =
            TrajectoryGenerator::new(KinematicContext::new(&robot, &robot), limits(&["x", "y", "z"]))
                .unwrap();
        let req = request("LIN", cartesian_goal(Vector3::new(0.3, 0.4, 0.)));
        let response = generator.generate(&req, 0.1);
        assert!(response.is_success(), "{:?}", response.error);
        let trajectory = response.trajectory.unwrap();
        assert_eq!(trajectory.joint_names(), ["x", "y", "z"]);
        let last = trajectory.last_waypoint().unwrap();
        assert!((last.positions[0] - 0.3).abs() < 1e-9);
        assert!((last.positions[1] - 0.4).abs() < 1e-9);
        // the line stays on its direction
        for waypoint in trajectory.waypoints() {
            assert!((waypoint.positions[0] * 4. - waypoint.positions[1] * 3.).abs() < 1e-9);
        }

        // planning times differ, the trajectories do not
        assert_eq!(
            generator.generate(&req, 0.1).trajectory,
            generator.generate(&req, 0.1).trajectory
        );
    }

    #[test]
    fn concurrent_requests_share_one_generator() {
        let robot = GantryRobot::xyz();
        let generator =
            TrajectoryGenerator::new(KinematicContext::new(&robot, &robot), limits(&["x", "y", "z"]))
                .unwrap();
        let lin = request("LIN", cartesian_goal(Vector3::new(0.3, 0.4, 0.)));
        let ptp = request("PTP", Constraints::joint_goal(&["x", "y", "z"], &[0.5, 0., 0.2]));
        let (lin_response, ptp_response) = std::thread::scope(|s| {
            let lin_handle = s.spawn(|| generator.generate(&lin, 0.1));
            let ptp_handle = s.spawn(|| generator.generate(&ptp, 0.1));
            (lin_handle.join().unwrap(), ptp_handle.join().unwrap())
        });
        assert!(lin_response.is_success(), "{:?}", lin_response.error);
        assert!(ptp_response.is_success(), "{:?}", ptp_response.error);
        assert_eq!(lin_response.trajectory, generator.generate(&lin, 0.1).trajectory);
        assert_eq!(ptp_response.trajectory, generator.generate(&ptp, 0.1).trajectory);
    }

    #[test]
    fn circ_with_interim_point() {
        let robot = GantryRobot::xyz();
        let generator =
            TrajectoryGenerator::new(KinematicContext::new(&robot, &robot), limits(&["x", "y", "z"]))
                .unwrap();
        let mut req = request("CIRC", cartesian_goal(Vector3::new(0.4, 0., 0.)));
        req.path_constraints =
            Constraints::path_point("interim", "tool0", "world", Vector3::new(0.2, 0.2, 0.));
        let response = generator.generate(&req, 0.1);
        assert!(response.is_success(), "{:?}", response.error);
        let trajectory = response.trajectory.unwrap();
        for waypoint in trajectory.waypoints() {
            let radius = (waypoint.positions[0] - 0.2).hypot(waypoint.positions[1]);
            assert!((radius - 0.2).abs() < 1e-9);
        }

        req.path_constraints =
            Constraints::path_point("center", "tool0", "world", Vector3::new(0.1, 0.1, 0.));
        let response = generator.generate(&req, 0.1);
        assert_eq!(response.error_kind(), Some(ErrorKind::InvalidPathConstraints));
    }

    #[test]
    fn failures_carry_no_trajectory() {
        let robot = GantryRobot::xyz();
        let generator =
            TrajectoryGenerator::new(KinematicContext::new(&robot, &robot), limits(&["x", "y", "z"]))
                .unwrap();
        let mut req = request("LIN", cartesian_goal(Vector3::new(0.3, 0., 0.)));
        req.max_velocity_scaling_factor = 0.;
        let response = generator.generate(&req, 0.1);
        assert_eq!(response.error_kind(), Some(ErrorKind::InvalidScalingFactor));
        assert!(response.trajectory.is_none());

        let req = request("SPLINE", cartesian_goal(Vector3::new(0.3, 0., 0.)));
        let response = generator.generate(&req, 0.1);
        assert_eq!(response.error_kind(), Some(ErrorKind::InvalidConfiguration));

        // out of the workspace of the gantry
        let req = request("LIN", cartesian_goal(Vector3::new(3.5, 0., 0.)));
        let response = generator.generate(&req, 0.1);
        assert_eq!(response.error_kind(), Some(ErrorKind::NoSolutionFound));
        assert!(response.trajectory.is_none());
    }

    #[test]
    fn cartesian_motion_needs_cartesian_limits() {
        let robot = GantryRobot::xyz();
        let mut limits = limits(&["x", "y", "z"]);
        limits.cartesian_limits = None;
        let generator =
            TrajectoryGenerator::new(KinematicContext::new(&robot, &robot), limits).unwrap();
        let response = generator.generate(&request("LIN", cartesian_goal(Vector3::zeros())), 0.1);
        assert_eq!(response.error_kind(), Some(ErrorKind::InvalidConfiguration));
        let response = generator.generate(
            &request("PTP", Constraints::joint_goal(&["x", "y", "z"], &[0.1, 0., 0.])),
            0.1,
        );
        assert!(response.is_success());
    }

    #[test]
    fn configured_generator() {
        let robot = GantryRobot::xyz();
        let mut checker = MockCollisionChecker::new();
        checker.expect_is_colliding().return_const(true);
        let config = PlannerConfig {
            sampling_time: 0.05,
            check_self_collision: true,
            limits: limits(&["x", "y", "z"]),
            ..Default::default()
        };
        let context = KinematicContext::new(&robot, &robot).with_collision_checker(&checker);
        let generator = TrajectoryGenerator::from_config(context, &config).unwrap();
        assert_eq!(generator.sampling_time(), 0.05);
        let response =
            generator.generate_default(&request("LIN", cartesian_goal(Vector3::new(0.1, 0., 0.))));
        assert_eq!(response.error_kind(), Some(ErrorKind::NoSolutionFound));
    }
}
