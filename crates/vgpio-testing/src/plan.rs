//! Testbench steps

use serde::{Deserialize, Serialize};

/// Value the firmware writes when one of its own checks fails
pub const ERROR_CODE: u32 = 0xEEEE;

fn full_mask() -> u32 {
    u32::MAX
}

/// One step of a testbench sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// Wait for a milestone; a timeout fails the scenario
    Wait {
        value: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_cycles: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },

    /// Let clock edges pass
    Settle { cycles: u64 },

    /// Read the register now and check the masked value lies in `min..=max`.
    /// A miss is recorded but does not stop the scenario.
    Sample {
        #[serde(default = "full_mask")]
        mask: u32,
        min: u32,
        max: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },

    /// Read every edge until the value is at least `at_least`, giving up
    /// quietly after `max_cycles`
    PollUntil { at_least: u32, max_cycles: u64 },

    /// Fail the scenario if the register holds `value`
    Reject {
        value: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
}

impl Step {
    pub fn wait(value: u32, label: &str) -> Self {
        Step::Wait {
            value,
            timeout_cycles: None,
            label: Some(label.to_string()),
        }
    }

    pub fn settle(cycles: u64) -> Self {
        Step::Settle { cycles }
    }

    pub fn reject_error_code() -> Self {
        Step::Reject {
            value: ERROR_CODE,
            label: Some("firmware error code".to_string()),
        }
    }

    /// Human-readable description for logs and reports
    pub fn label(&self) -> String {
        match self {
            Step::Wait {
                label: Some(label), ..
            }
            | Step::Sample {
                label: Some(label), ..
            }
            | Step::Reject {
                label: Some(label), ..
            } => label.clone(),
            Step::Wait { value, .. } => format!("vgpio={value:#x}"),
            Step::Settle { cycles } => format!("settle {cycles} cycles"),
            Step::Sample { mask, .. } => format!("sample vgpio & {mask:#x}"),
            Step::PollUntil { at_least, .. } => format!("poll until vgpio >= {at_least:#x}"),
            Step::Reject { value, .. } => format!("vgpio != {value:#x}"),
        }
    }
}
