// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

use clap::Parser;
use nalgebra::{Isometry3, Quaternion, Vector3};
use std::time::Duration;
use trajectory_generation::model::PositionLimits;
use trajectory_generation::{
    CartesianLimits, Constraints, JointLimits, JointLimitsContainer, JointValues,
    KinematicContext, Kinematics, LimitsContainer, MotionPlanRequest, PlannerConfig,
    PlanningResult, RobotModel, RobotState, TrajectoryGenerator,
};

const JOINTS: [&str; 3] = ["x", "y", "z"];

/// An example showing how to plan PTP, LIN and CIRC motions for a three axis gantry.
///
/// The tool of the gantry starts at the origin.
#[derive(Parser, Debug)]
#[clap(author, version, name = "plan_gantry_motion")]
struct CommandLineArguments {
    /// Motion primitive: PTP, LIN or CIRC
    #[clap(default_value = "LIN")]
    pub planner_id: String,
    /// Goal position of the tool along x
    #[clap(long, default_value = "0.3", allow_hyphen_values = true)]
    pub goal_x: f64,
    /// Goal position of the tool along y
    #[clap(long, default_value = "0.4", allow_hyphen_values = true)]
    pub goal_y: f64,
    /// Interim point of a circular motion along x
    #[clap(long, default_value = "0.15", allow_hyphen_values = true)]
    pub interim_x: f64,
    /// Interim point of a circular motion along y
    #[clap(long, default_value = "0.05", allow_hyphen_values = true)]
    pub interim_y: f64,
    /// TOML file with the planner configuration, built-in limits are used otherwise
    #[clap(long)]
    pub config: Option<String>,
    /// Velocity and acceleration scaling factor
    #[clap(long, default_value = "0.5")]
    pub scaling: f64,
}

struct Gantry;

impl RobotModel for Gantry {
    fn model_frame(&self) -> String {
        "world".to_string()
    }
    fn has_group(&self, group_name: &str) -> bool {
        group_name == "gantry"
    }
    fn active_joint_names(&self, group_name: &str) -> Option<Vec<String>> {
        self.has_group(group_name)
            .then(|| JOINTS.iter().map(|joint| joint.to_string()).collect())
    }
    fn position_limits(&self, joint_name: &str) -> Option<PositionLimits> {
        JOINTS
            .contains(&joint_name)
            .then(|| PositionLimits::new(-1., 1.))
    }
    fn can_solve_ik(&self, group_name: &str, link_name: &str) -> bool {
        self.has_group(group_name) && link_name == "tool"
    }
    fn solver_tip_frame(&self, group_name: &str) -> Option<String> {
        self.has_group(group_name).then(|| "tool".to_string())
    }
}

impl Kinematics for Gantry {
    fn solve_ik(
        &self,
        _group_name: &str,
        _link_name: &str,
        pose: &Isometry3<f64>,
        _frame_id: &str,
        _seed: &JointValues,
        _timeout: Duration,
    ) -> Option<JointValues> {
        let translation = pose.translation.vector;
        if translation.iter().any(|value| value.abs() > 1.) {
            return None;
        }
        Some(
            JOINTS
                .iter()
                .zip(translation.iter())
                .map(|(joint, &value)| (joint.to_string(), value))
                .collect(),
        )
    }
    fn solve_fk(&self, link_name: &str, joint_values: &JointValues) -> Option<Isometry3<f64>> {
        if link_name != "tool" {
            return None;
        }
        let value = |joint: &str| joint_values.get(joint).copied().unwrap_or_default();
        Some(Isometry3::translation(value("x"), value("y"), value("z")))
    }
}

fn default_config() -> PlannerConfig {
    let mut joint_limits = JointLimitsContainer::new();
    for joint in JOINTS {
        joint_limits.add_limit(joint, JointLimits::new(1.0, Some(2.0), Some(-2.0)));
    }
    PlannerConfig {
        limits: LimitsContainer::new(
            joint_limits,
            Some(CartesianLimits {
                max_trans_vel: 0.5,
                max_trans_acc: 1.0,
                max_trans_dec: -1.0,
                max_rot_vel: 1.0,
            }),
        ),
        ..Default::default()
    }
}

fn main() -> PlanningResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let args = CommandLineArguments::parse();
    let config = match &args.config {
        Some(path) => PlannerConfig::load_from_file(path)?,
        None => default_config(),
    };

    let robot = Gantry;
    let generator = TrajectoryGenerator::from_config(KinematicContext::new(&robot, &robot), &config)?;
    let goal = Vector3::new(args.goal_x, args.goal_y, 0.);
    let goal_constraints = if args.planner_id == "PTP" {
        Constraints::joint_goal(&JOINTS, goal.as_slice())
    } else {
        Constraints::cartesian_goal("tool", "world", goal, Quaternion::identity())
    };
    let request = MotionPlanRequest {
        planner_id: args.planner_id.clone(),
        group_name: "gantry".to_string(),
        start_state: RobotState::new(&JOINTS, &[0., 0., 0.]),
        goal_constraints: vec![goal_constraints],
        path_constraints: Constraints::path_point(
            "interim",
            "tool",
            "world",
            Vector3::new(args.interim_x, args.interim_y, 0.),
        ),
        max_velocity_scaling_factor: args.scaling,
        max_acceleration_scaling_factor: args.scaling,
    };

    let response = generator.generate_default(&request);
    if let Some(error) = response.error {
        eprintln!("Planning failed after {:?}", response.planning_time);
        return Err(error);
    }
    if let Some(trajectory) = response.trajectory {
        println!("time x y z");
        for (i, waypoint) in trajectory.waypoints().iter().enumerate() {
            println!(
                "{:.3} {:.4} {:.4} {:.4}",
                trajectory.time_from_start(i).unwrap_or_default(),
                waypoint.positions[0],
                waypoint.positions[1],
                waypoint.positions[2]
            );
        }
        println!("Planned in {:?}", response.planning_time);
    }
    Ok(())
}
