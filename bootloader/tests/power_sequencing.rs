//! Power rail programs against bus doubles

mod common;

use common::{MockBus, PmicModel, VoltageLock};
use mockall::Sequence;
use mockall::predicate::eq;
use moduline_api::BusError;
use moduline_bootloader::pmic::{self, PowerRailProgram, RailStep, SequenceError, bd71837, pca9450};
use moduline_bootloader::soc::imx8m::I2C1_BASE;
use moduline_bootloader::soc::imx8m::i2c::ImxI2c;
use moduline_bootloader::utils::SimRegisters;
use proptest::prelude::*;

fn leak(steps: Vec<RailStep>) -> &'static PowerRailProgram {
    Box::leak(Box::new(PowerRailProgram {
        device: "test",
        steps: Box::leak(steps.into_boxed_slice()),
    }))
}

fn writes_of(program: &PowerRailProgram) -> Vec<(u8, u8)> {
    program
        .steps
        .iter()
        .map(|step| match *step {
            RailStep::Write { reg, value } => (reg, value),
            other => panic!("unexpected step {:?}", other),
        })
        .collect()
}

const BD71837_LOCK: VoltageLock = VoltageLock {
    lock_reg: bd71837::REGLOCK,
    lock_bit: bd71837::REGLOCK_VREG,
    is_voltage_reg: bd71837::is_voltage_reg,
};

fn bd71837_after_reset() -> PmicModel {
    PmicModel::with_lock(BD71837_LOCK, bd71837::REGLOCK_VREG | bd71837::REGLOCK_PWRSEQ)
}

#[test]
fn test_pca9450_program_is_written_in_table_order() {
    let mut bus = MockBus::new();
    let mut seq = Sequence::new();
    for (reg, value) in writes_of(&pca9450::MODULINE_DISPLAY) {
        bus.expect_write_reg()
            .with(eq(pca9450::I2C_ADDR), eq(reg), eq(value))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));
    }
    bus.expect_read_reg().never();

    assert_eq!(pmic::configure(&mut bus, pca9450::I2C_ADDR, &pca9450::MODULINE_DISPLAY), Ok(7));
}

#[test]
fn test_failure_at_third_step_stops_the_program() {
    let writes = writes_of(&pca9450::MODULINE_DISPLAY);
    let mut bus = MockBus::new();
    let mut seq = Sequence::new();
    for (index, &(reg, value)) in writes.iter().enumerate() {
        let expectation = bus.expect_write_reg().with(eq(pca9450::I2C_ADDR), eq(reg), eq(value));
        match index {
            0 | 1 => {
                expectation.times(1).in_sequence(&mut seq).returning(|_, _, _| Ok(()));
            }
            2 => {
                expectation.times(1).in_sequence(&mut seq).returning(|_, _, _| Err(BusError::Nack));
            }
            _ => {
                expectation.never();
            }
        }
    }

    let err = pmic::configure(&mut bus, pca9450::I2C_ADDR, &pca9450::MODULINE_DISPLAY).unwrap_err();
    assert_eq!(
        err,
        SequenceError {
            step: 2,
            reg: writes[2].0,
            cause: BusError::Nack,
        }
    );
}

#[test]
fn test_uninitialized_controller_issues_no_writes() {
    let mut sim = SimRegisters::new();
    let mut i2c = ImxI2c::new(&mut sim, I2C1_BASE);

    let err = pmic::configure(&mut i2c, pca9450::I2C_ADDR, &pca9450::MODULINE_DISPLAY).unwrap_err();
    assert_eq!(err.step, 0);
    assert_eq!(err.cause, BusError::NotInitialized);
    drop(i2c);
    assert!(sim.writes().is_empty());
}

#[test]
fn test_bd71837_voltages_stick_with_unlock_first() {
    let mut model = bd71837_after_reset();
    pmic::configure(&mut model, bd71837::I2C_ADDR, &bd71837::KARO_TX8M_1610).unwrap();

    let program = writes_of(&bd71837::KARO_TX8M_1610);
    for &(reg, _) in program.iter().filter(|(reg, _)| bd71837::is_voltage_reg(*reg)) {
        let last = program.iter().rev().find(|(r, _)| *r == reg).map(|(_, v)| *v);
        assert_eq!(Some(model.regs[reg as usize]), last, "reg {:#04x}", reg);
    }
    assert_eq!(
        model.regs[bd71837::REGLOCK as usize],
        bd71837::REGLOCK_VREG | bd71837::REGLOCK_PWRSEQ
    );
}

#[test]
fn test_bd71837_unlock_moved_late_loses_voltages() {
    let mut steps = bd71837::KARO_TX8M_1610.steps.to_vec();
    let unlock = steps
        .iter()
        .position(|step| *step == RailStep::write(bd71837::REGLOCK, bd71837::REGLOCK_PWRSEQ))
        .unwrap();
    let step = steps.remove(unlock);
    let relock = steps.len() - 1;
    steps.insert(relock, step);
    let reordered = leak(steps);

    let mut expected = bd71837_after_reset();
    pmic::configure(&mut expected, bd71837::I2C_ADDR, &bd71837::KARO_TX8M_1610).unwrap();
    let mut actual = bd71837_after_reset();
    pmic::configure(&mut actual, bd71837::I2C_ADDR, reordered).unwrap();

    assert_eq!(expected.writes.len(), actual.writes.len());
    assert_eq!(expected.regs[bd71837::BUCK1_VOLT_RUN as usize], 0x14);
    assert_eq!(actual.regs[bd71837::BUCK1_VOLT_RUN as usize], 0x00);
    assert_ne!(expected.regs, actual.regs);
}

fn register_write() -> impl Strategy<Value = (u8, u8)> {
    (any::<u8>(), any::<u8>())
}

proptest! {
    #[test]
    fn prop_readback_is_last_write(writes in prop::collection::vec(register_write(), 1..64)) {
        let program = leak(writes.iter().map(|&(reg, value)| RailStep::write(reg, value)).collect());
        let mut model = PmicModel::new();

        prop_assert_eq!(pmic::configure(&mut model, 0x25, program), Ok(writes.len()));
        for &(reg, _) in &writes {
            let last = writes.iter().rev().find(|(r, _)| *r == reg).map(|(_, v)| *v);
            prop_assert_eq!(Some(model.regs[reg as usize]), last);
        }
    }

    #[test]
    fn prop_update_only_touches_masked_bits(initial in any::<u8>(), mask in any::<u8>(), value in any::<u8>()) {
        let program = leak(vec![RailStep::update(0x10, mask, value)]);
        let mut model = PmicModel::new();
        model.regs[0x10] = initial;

        let writes = pmic::configure(&mut model, 0x25, program).unwrap();
        prop_assert_eq!(model.regs[0x10], (initial & !mask) | (value & mask));
        prop_assert_eq!(writes, usize::from(initial & mask != value & mask));
    }
}
