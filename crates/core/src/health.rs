// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

//! Health-check enforcement modes.

use serde::{Deserialize, Serialize};

/// How a failed health check should affect process startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthMode {
 /// Any failure aborts process start.
    Strict,
 /// Any failure leaves the process up with recovery features disabled and a warning.
    Safe,
 /// Failures are warnings only.
    Dev,
}

crate::simple_display! {
    HealthMode {
        Strict => "strict",
        Safe => "safe",
        Dev => "dev",
    }
}

impl Default for HealthMode {
    fn default() -> Self {
        HealthMode::Strict
    }
}

/// One named check's result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub detail: Option<String>,
}

/// Outcome of running the full health-check suite under a given mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub mode: HealthMode,
    pub checks: Vec<CheckResult>,
}

impl HealthReport {
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn failed(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks.iter().filter(|c| !c.passed)
    }

 /// Whether the caller should abort process startup.
    pub fn should_abort(&self) -> bool {
        self.mode == HealthMode::Strict && !self.all_passed()
    }

 /// Whether recovery features (lock-manager write paths, checkpoint engine) should degrade.
    pub fn should_degrade(&self) -> bool {
        self.mode == HealthMode::Safe && !self.all_passed()
    }
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
