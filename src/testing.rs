// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! A Cartesian gantry robot for the unit tests.
//!
//! The group `arm` moves the link `tool0` in the frame `world`. Its first joint drives the
//! x axis, the second one the y axis and the third one the z axis. The orientation never
//! changes.
use nalgebra::{Isometry3, Vector3};
use std::time::Duration;

use crate::model::{CollisionChecker, Kinematics, PositionLimits, RobotModel};
use crate::utils::JointValues;

pub(crate) static GROUP: &str = "arm";
pub(crate) static TIP_LINK: &str = "tool0";
/// Known to the forward kinematics, but without inverse kinematics solver.
pub(crate) static FLANGE_LINK: &str = "flange";
pub(crate) static MODEL_FRAME: &str = "world";
pub(crate) static POSITION_LIMIT: f64 = 3.14;

pub(crate) struct GantryRobot {
    joint_names: Vec<String>,
}

impl GantryRobot {
    /// Creates a gantry with up to three joints.
    pub(crate) fn new(joint_names: &[&str]) -> Self {
        assert!(joint_names.len() <= 3);
        GantryRobot {
            joint_names: joint_names.iter().map(|name| name.to_string()).collect(),
        }
    }
    pub(crate) fn xyz() -> Self {
        GantryRobot::new(&["x", "y", "z"])
    }
}

impl RobotModel for GantryRobot {
    fn model_frame(&self) -> String {
        MODEL_FRAME.to_string()
    }
    fn has_group(&self, group_name: &str) -> bool {
        group_name == GROUP
    }
    fn active_joint_names(&self, group_name: &str) -> Option<Vec<String>> {
        if self.has_group(group_name) {
            Some(self.joint_names.clone())
        } else {
            None
        }
    }
    fn position_limits(&self, joint_name: &str) -> Option<PositionLimits> {
        if self.joint_names.iter().any(|name| name == joint_name) {
            Some(PositionLimits::new(-POSITION_LIMIT, POSITION_LIMIT))
        } else {
            None
        }
    }
    fn can_solve_ik(&self, group_name: &str, link_name: &str) -> bool {
        group_name == GROUP && link_name == TIP_LINK
    }
    fn solver_tip_frame(&self, group_name: &str) -> Option<String> {
        if self.has_group(group_name) {
            Some(TIP_LINK.to_string())
        } else {
            None
        }
    }
}

impl Kinematics for GantryRobot {
    fn solve_ik(
        &self,
        group_name: &str,
        link_name: &str,
        pose: &Isometry3<f64>,
        _frame_id: &str,
        _seed: &JointValues,
        _timeout: Duration,
    ) -> Option<JointValues> {
        if !self.can_solve_ik(group_name, link_name) {
            return None;
        }
        let translation = pose.translation.vector;
        // axes without joint cannot be reached
        if (self.joint_names.len()..3).any(|axis| translation[axis].abs() > 1e-9) {
            return None;
        }
        let limits = PositionLimits::new(-POSITION_LIMIT, POSITION_LIMIT);
        let mut solution = JointValues::new();
        for (axis, joint_name) in self.joint_names.iter().enumerate() {
            if !limits.satisfies(translation[axis]) {
                return None;
            }
            solution.insert(joint_name.clone(), translation[axis]);
        }
        Some(solution)
    }

    fn solve_fk(&self, link_name: &str, joint_values: &JointValues) -> Option<Isometry3<f64>> {
        if link_name != TIP_LINK && link_name != FLANGE_LINK {
            return None;
        }
        let mut translation = Vector3::zeros();
        for (axis, joint_name) in self.joint_names.iter().enumerate() {
            translation[axis] = joint_values.get(joint_name).copied().unwrap_or_default();
        }
        Some(Isometry3::translation(translation.x, translation.y, translation.z))
    }
}

impl CollisionChecker for GantryRobot {
    fn is_colliding(&self, _group_name: &str, _joint_values: &JointValues) -> bool {
        false
    }
}
