//! Built-in peripheral scenarios
//!
//! Milestone numbering and cycle limits follow the firmware tests of the
//! multi-peripheral SoC. Gaps between firmware writes are representative of
//! the firmware's run time, not measured.

use crate::error::{Result, ScenarioError};
use crate::firmware::FirmwareModel;
use crate::plan::{Step, ERROR_CODE};
use crate::scenario::{BenchConfig, Scenario};
use indexmap::IndexMap;
use vgpio_sync::VgpioConfig;

fn scenario(
    name: &str,
    description: &str,
    cycle_limit: u64,
    firmware: FirmwareModel,
    steps: Vec<Step>,
) -> Scenario {
    Scenario {
        name: name.to_string(),
        description: description.to_string(),
        bench: BenchConfig {
            cycle_limit,
            ..Default::default()
        },
        vgpio: VgpioConfig::default(),
        firmware,
        steps,
    }
}

/// Sample value the ADC model converts to
const ADC_SAMPLE: u32 = 0x5A3;

pub fn adc() -> Scenario {
    scenario(
        "adc",
        "ADC enable, single conversion with 12-bit result check, burst, disable",
        500_000,
        FirmwareModel::boot(2_000)
            .then(0, 1)
            .then(400, 2)
            .then(1_200, 3)
            .then(40, ADC_SAMPLE)
            .then(6_000, 5)
            .then(200, 6),
        vec![
            Step::wait(1, "firmware ready"),
            Step::wait(2, "ADC peripheral enabled"),
            Step::wait(3, "first conversion complete"),
            Step::settle(100),
            Step::Sample {
                mask: 0xFFF,
                min: 0,
                max: 0xFFF,
                label: Some("ADC value in 12-bit range".to_string()),
            },
            Step::wait(5, "multiple conversions complete"),
            Step::wait(6, "ADC peripheral disabled"),
        ],
    )
}

pub fn uart() -> Scenario {
    scenario(
        "uart",
        "UART enable, transmit, disable and post-disable pulse",
        200_000,
        FirmwareModel::boot(2_000)
            .then(0, 1)
            .then(500, 2)
            .then(12_000, 3)
            .then(300, 4)
            .then(300, 5)
            .then(300, 6),
        vec![
            Step::wait(1, "firmware ready"),
            Step::wait(2, "UART enabled"),
            Step::wait(3, "transmission complete"),
            Step::wait(4, "UART disabled"),
            Step::wait(5, "post-disable check pulse"),
            Step::wait(6, "cross-peripheral marker"),
        ],
    )
}

pub fn spi() -> Scenario {
    let mut firmware = FirmwareModel::boot(2_000)
        .then(0, 1)
        .then(600, 2)
        .then(9_000, 3);
    // Firmware echoes every byte it received on MISO before disabling.
    for byte in [0x66, 0xBB, 0x23, 0x42, 0x78, 0xAB, 0xBB, 0xCF] {
        firmware = firmware.then(800, byte);
    }
    firmware = firmware.then(500, 6);

    scenario(
        "spi",
        "SPI enable, eight-byte exchange, disable",
        1_000_000,
        firmware,
        vec![
            Step::wait(1, "firmware ready"),
            Step::wait(2, "SPI peripheral enabled"),
            Step::wait(3, "data transmission complete"),
            Step::wait(6, "SPI peripheral disabled"),
            Step::reject_error_code(),
        ],
    )
}

pub fn i2c() -> Scenario {
    scenario(
        "i2c",
        "I2C enable, bus activity window, transaction complete, disable",
        500_000,
        FirmwareModel::boot(2_000)
            .then(0, 1)
            .then(500, 2)
            .then(20_000, 3)
            .then(400, 4),
        vec![
            Step::wait(1, "firmware ready"),
            Step::wait(2, "I2C peripheral enabled"),
            Step::PollUntil {
                at_least: 3,
                max_cycles: 50_000,
            },
            Step::wait(3, "transaction complete"),
            Step::wait(4, "I2C peripheral disabled"),
        ],
    )
}

pub fn sram() -> Scenario {
    let phases: [(u32, &str, u64); 14] = [
        (1, "system initialization complete", 0),
        (2, "corner address test", 5),
        (3, "boundary address test", 5),
        (4, "walking ones pattern", 10),
        (5, "walking zeros pattern", 10),
        (6, "alternating patterns", 10),
        (7, "byte-level patterns", 5),
        (8, "nibble-level patterns", 5),
        (9, "byte lane test", 5),
        (10, "all zeros pattern", 50),
        (11, "all ones pattern", 50),
        (15, "data retention check", 5),
        (17, "halfword access test", 5),
        (18, "SRAM suite complete", 0),
    ];

    let mut firmware = FirmwareModel::boot(3_000);
    let mut steps = Vec::new();
    for (milestone, label, settle) in phases {
        firmware = firmware.then(if milestone == 1 { 0 } else { 4_000 }, milestone);
        steps.push(Step::wait(milestone, label));
        if settle > 0 {
            steps.push(Step::settle(settle));
        }
    }
    steps.push(Step::reject_error_code());

    scenario(
        "sram",
        "SRAM verification suite: corners, boundaries, walking bits, patterns, lanes",
        15_000_000,
        firmware,
        steps,
    )
}

pub fn pwm() -> Scenario {
    scenario(
        "pwm",
        "PWM pads configured, instances enabled, sampling window",
        500_000,
        FirmwareModel::boot(2_000)
            .then(0, 1)
            .then(800, 2)
            .then(300, 3),
        vec![
            Step::wait(1, "pads configured"),
            Step::wait(2, "PWM instances enabled"),
            Step::wait(3, "sampling phase"),
            Step::settle(10_000),
            Step::settle(5_000),
        ],
    )
}

pub fn system() -> Scenario {
    scenario(
        "system",
        "System integration across PWM, UART, SPI, I2C, SRAM and ADC",
        1_000_000,
        FirmwareModel::boot(2_500)
            .then(0, 1)
            .then(600, 2)
            .then(3_000, 3)
            .then(700, 4)
            .then(700, 5)
            .then(9_000, 6)
            .then(500, 7)
            .then(900, 8),
        vec![
            Step::wait(1, "pad configuration"),
            Step::wait(2, "PWM configured"),
            Step::settle(1_000),
            Step::wait(3, "UART configured"),
            Step::wait(4, "SPI configured"),
            Step::wait(5, "I2C configured"),
            Step::wait(6, "SRAM test passed"),
            Step::wait(7, "ADC enabled"),
            Step::wait(8, "system test complete"),
            Step::Reject {
                value: ERROR_CODE,
                label: Some("system error code".to_string()),
            },
        ],
    )
}

/// Every built-in scenario, in presentation order
pub fn builtins() -> IndexMap<String, Scenario> {
    [adc(), uart(), spi(), i2c(), sram(), pwm(), system()]
        .into_iter()
        .map(|scenario| (scenario.name.clone(), scenario))
        .collect()
}

pub fn builtin(name: &str) -> Result<Scenario> {
    builtins()
        .shift_remove(name)
        .ok_or_else(|| ScenarioError::UnknownScenario(name.to_string()))
}
