//! Forwarding and Hazard Tests.

use pretty_assertions::assert_eq;
use rv32sim_core::core::pipeline::hazards::{Operand, need_stall_load_use, resolve_operand};
use rv32sim_core::core::pipeline::latches::{ExMemEntry, MemWbEntry};
use rv32sim_core::core::pipeline::signals::InstType;
use rv32sim_core::{Config, Cpu, RunOutcome};

use crate::common::builder::*;
use crate::common::harness::TestContext;

fn producer(rd: usize, wb_value: Option<u32>) -> ExMemEntry {
    ExMemEntry {
        pc: 0,
        inst: 0,
        inst_type: InstType::OpImm,
        rd: Some(rd),
        wb_value,
        next_pc: 4,
        mem: None,
    }
}

fn cpu() -> Cpu {
    Cpu::new(&Config::default()).unwrap()
}

#[test]
fn youngest_producer_wins() {
    let mut cpu = cpu();
    cpu.regs.write(1, 10);
    assert_eq!(resolve_operand(&cpu, Some(1)), Operand::Register(10));

    cpu.mem_wb = Some(MemWbEntry {
        pc: 0,
        inst: 0,
        inst_type: InstType::OpImm,
        rd: Some(1),
        value: Some(20),
    });
    assert_eq!(resolve_operand(&cpu, Some(1)), Operand::Forwarded(20));

    cpu.ex_mem = Some(producer(1, Some(30)));
    assert_eq!(resolve_operand(&cpu, Some(1)), Operand::Forwarded(30));
}

#[test]
fn outstanding_load_forces_a_stall() {
    let mut cpu = cpu();
    cpu.ex_mem = Some(producer(2, None));
    assert_eq!(resolve_operand(&cpu, Some(2)), Operand::Stall);
    assert!(need_stall_load_use(&cpu, None, Some(2)));

    cpu.ex_mem = None;
    cpu.mem_pending = Some(producer(2, None));
    assert_eq!(resolve_operand(&cpu, Some(2)), Operand::Stall);
    assert!(!need_stall_load_use(&cpu, Some(3), None));
}

#[test]
fn x0_and_absent_operands_never_hazard() {
    let mut cpu = cpu();
    cpu.ex_mem = Some(producer(0, None));
    assert_eq!(resolve_operand(&cpu, Some(0)), Operand::Register(0));
    assert_eq!(resolve_operand(&cpu, None), Operand::Register(0));
}

#[test]
fn back_to_back_dependencies_are_forwarded() {
    let program = [
        vec![
            addi(1, 0, 5),
            addi(2, 1, 1),
            add(3, 2, 1),
            add(4, 3, 3),
        ],
        exit(0),
    ]
    .concat();
    let mut ctx = TestContext::new().load_program(&program);

    assert_eq!(ctx.run(), RunOutcome::Exited(0));
    assert_eq!(
        (ctx.reg(1), ctx.reg(2), ctx.reg(3), ctx.reg(4)),
        (5, 6, 11, 22)
    );
    assert!(ctx.sim.stats().forwards >= 4);
    assert_eq!(ctx.sim.stats().stalls_data, 0);
}

#[test]
fn load_use_stalls_until_the_data_returns() {
    let program = [
        vec![
            addi(1, 0, 21),
            sw(0, 1, 0x100),
            lw(2, 0, 0x100),
            add(3, 2, 2),
        ],
        exit(0),
    ]
    .concat();
    let mut ctx = TestContext::new().load_program(&program);

    assert_eq!(ctx.run(), RunOutcome::Exited(0));
    assert_eq!(ctx.reg(3), 42);
    assert!(ctx.sim.stats().stalls_data > 0);
    assert_eq!(ctx.sim.stats().loads, 1);
}

#[test]
fn independent_work_after_a_load_does_not_wait_on_it() {
    let program = [
        vec![
            lw(1, 0, 0x200),
            addi(2, 0, 1),
            addi(3, 0, 2),
            add(4, 1, 3),
        ],
        exit(0),
    ]
    .concat();
    let mut ctx = TestContext::new().load_program(&program);
    ctx.sim.cpu.memory.write_word(0x200, 40);

    assert_eq!(ctx.run(), RunOutcome::Exited(0));
    assert_eq!((ctx.reg(2), ctx.reg(3), ctx.reg(4)), (1, 2, 42));
}
