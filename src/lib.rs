// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! # trajectory-generation-rs
//! trajectory-generation-rs turns motion plan requests for industrial robot arms into
//! time-parameterized joint trajectories which respect the joint limits of the robot.
//!
//! ## Design
//! The library does not know any robot itself. A robot description library provides the
//! [`RobotModel`], the [`Kinematics`] and optionally a [`CollisionChecker`]. The
//! [`TrajectoryGenerator`] validates a [`MotionPlanRequest`], plans the motion and samples it:
//! * `PTP` - synchronized point to point motion in joint space.
//! * `LIN` - straight line of a link in Cartesian space.
//! * `CIRC` - circular arc of a link, defined by an interim point or the center.
//!
//! The library is divided into these modules:
//! * [model](`crate::model`) - the capabilities expected from the robot and the limits.
//! * [trajectory](`crate::trajectory`) - trajectory types together with their generation,
//! limit checking, merging and analysis.
//! * [planner](`crate::planner`) - requests, their validation and the motion primitives.
//! * [config](`crate::config`) - planner configuration read from TOML.
//!
//! # Example:
//!```ignore
//! use trajectory_generation::{
//!     Constraints, KinematicContext, MotionPlanRequest, PlannerConfig, PlanningResult,
//!     RobotState, TrajectoryGenerator,
//! };
//! fn main() -> PlanningResult<()> {
//!     let robot = MyRobot::load("robot.urdf");
//!     let config = PlannerConfig::load_from_file("planner.toml")?;
//!     let context = KinematicContext::new(&robot, &robot);
//!     let generator = TrajectoryGenerator::from_config(context, &config)?;
//!     let request = MotionPlanRequest {
//!         planner_id: "PTP".to_string(),
//!         group_name: "arm".to_string(),
//!         start_state: RobotState::new(&["j1", "j2"], &[0., 0.]),
//!         goal_constraints: vec![Constraints::joint_goal(&["j1", "j2"], &[1.0, 0.5])],
//!         max_velocity_scaling_factor: 0.5,
//!         max_acceleration_scaling_factor: 0.5,
//!         ..Default::default()
//!     };
//!     let response = generator.generate_default(&request);
//!     match response.error {
//!         None => println!("planned in {:?}", response.planning_time),
//!         Some(error) => return Err(error),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Failures are reported as [`PlanningException`]. Its [`kind`](PlanningException::kind)
//! tells which [`ErrorKind`] of failure occurred. A failed request never carries a
//! (partial) trajectory.
//!
//! The library logs with [tracing](https://docs.rs/tracing) and never installs a subscriber.

pub mod config;
pub mod exception;
pub mod model;
pub mod planner;
pub mod trajectory;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use config::PlannerConfig;
pub use config::DEFAULT_SAMPLING_TIME;
pub use exception::ErrorKind;
pub use exception::PlanningException;
pub use exception::PlanningResult;
pub use model::limits::{CartesianLimits, JointLimits, JointLimitsContainer, LimitsContainer};
pub use model::CollisionChecker;
pub use model::KinematicContext;
pub use model::Kinematics;
pub use model::RobotModel;
pub use planner::primitives::MotionPrimitive;
pub use planner::request::*;
pub use planner::TrajectoryGenerator;
pub use trajectory::{CartesianTrajectory, JointTrajectory, PoseSample, RobotTrajectory};
pub use utils::*;
