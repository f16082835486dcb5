//! Load and Store Tests.

use pretty_assertions::assert_eq;
use rstest::rstest;
use rv32sim_core::common::constants::MMIO_EXIT;
use rv32sim_core::common::error::{MemError, SimError};
use rv32sim_core::config::Associativity;
use rv32sim_core::core::pipeline::latches::{ExMemEntry, MemAccess};
use rv32sim_core::core::pipeline::signals::{InstType, MemOp, MemWidth};
use rv32sim_core::core::units::cache::CacheState;
use rv32sim_core::soc::memory::{MemRequest, Port};
use rv32sim_core::{Config, Cpu, RunOutcome};

use crate::common::builder::*;
use crate::common::harness::TestContext;

const BASE: i32 = 0x300;

fn run_with(associativity: Associativity, body: &[u32]) -> TestContext {
    let program = [body.to_vec(), exit(0)].concat();
    let mut ctx = TestContext::with_associativity(associativity).load_program(&program);
    ctx.sim.cpu.memory.write_word(BASE as u32, 0x8081_F0FE);
    assert_eq!(ctx.run(), RunOutcome::Exited(0));
    ctx
}

#[rstest]
#[case::lb_sign_extends(lb(1, 0, BASE), 0xFFFF_FFFE)]
#[case::lbu_zero_extends(lbu(1, 0, BASE), 0x0000_00FE)]
#[case::lb_upper_byte(lb(1, 0, BASE + 3), 0xFFFF_FF80)]
#[case::lbu_second_byte(lbu(1, 0, BASE + 1), 0x0000_00F0)]
#[case::lh_sign_extends(lh(1, 0, BASE + 2), 0xFFFF_8081)]
#[case::lhu_zero_extends(lhu(1, 0, BASE), 0x0000_F0FE)]
#[case::lw_whole_word(lw(1, 0, BASE), 0x8081_F0FE)]
fn loads_extract_and_extend(
    #[values(Associativity::DirectMapped, Associativity::TwoWay)] associativity: Associativity,
    #[case] load: u32,
    #[case] expected: u32,
) {
    let ctx = run_with(associativity, &[load]);
    assert_eq!(ctx.reg(1), expected);
}

#[rstest]
#[case::sb_low(sb(0, 1, BASE), 0x8081_F0AA)]
#[case::sb_high(sb(0, 1, BASE + 3), 0xAA81_F0FE)]
#[case::sh_upper_half(sh(0, 1, BASE + 2), 0xDDAA_F0FE)]
#[case::sw_whole(sw(0, 1, BASE), 0xCCDD_DDAA)]
fn stores_merge_into_their_lanes(
    #[values(Associativity::DirectMapped, Associativity::TwoWay)] associativity: Associativity,
    #[case] store: u32,
    #[case] expected: u32,
) {
    let setup = li(1, 0xCCDD_DDAA);
    let ctx = run_with(associativity, &[setup, vec![store]].concat());
    assert_eq!(ctx.word(BASE as u32), expected);
}

#[test]
fn store_then_load_sees_the_store() {
    let program = [
        li(1, 0x1234_5678),
        li(5, 0x0010_0000),
        vec![sw(5, 1, 0), lw(2, 5, 0), lh(3, 5, 2), lbu(4, 5, 1)],
        exit(0),
    ]
    .concat();
    let mut ctx = TestContext::new().load_program(&program);
    assert_eq!(ctx.run(), RunOutcome::Exited(0));
    assert_eq!(ctx.reg(2), 0x1234_5678);
    assert_eq!(ctx.reg(3), 0x1234);
    assert_eq!(ctx.reg(4), 0x56);
}

#[test]
fn last_word_of_memory_is_accessible() {
    let program = [
        li(1, 0x00FF_FFFC),
        vec![addi(2, 0, 77), sw(1, 2, 0), lw(3, 1, 0)],
        exit(0),
    ]
    .concat();
    let mut ctx = TestContext::new().load_program(&program);
    assert_eq!(ctx.run(), RunOutcome::Exited(0));
    assert_eq!(ctx.reg(3), 77);
    assert_eq!(ctx.word(0x00FF_FFFC), 77);
}

#[test]
fn last_byte_of_memory_is_accessible() {
    let program = [
        li(1, 0x00FF_FFFF),
        vec![addi(2, 0, 0x5A), sb(1, 2, 0), lbu(3, 1, 0)],
        exit(0),
    ]
    .concat();
    let mut ctx = TestContext::new().load_program(&program);
    assert_eq!(ctx.run(), RunOutcome::Exited(0));
    assert_eq!(ctx.reg(3), 0x5A);
    assert_eq!(ctx.word(0x00FF_FFFC) >> 24, 0x5A);
}

#[test]
fn halfword_at_the_last_byte_is_misaligned() {
    let program = [li(1, 0x00FF_FFFE), vec![lh(2, 1, 1)], exit(0)].concat();
    let mut ctx = TestContext::new().load_program(&program);
    let pc = 4 * (program.len() as u32 - 3);

    assert!(matches!(
        ctx.try_run(),
        Err(SimError::MisalignedAccess { addr: 0x00FF_FFFF, pc: p, .. }) if p == pc
    ));
}

#[test]
fn load_past_the_end_of_memory_faults() {
    let program = [li(1, 0x0100_0000), vec![lw(2, 1, 0)], exit(0)].concat();
    let mut ctx = TestContext::new().load_program(&program);
    let pc = 4 * (program.len() as u32 - 3);

    assert!(matches!(
        ctx.try_run(),
        Err(SimError::MemoryOutOfRange { addr: 0x0100_0000, pc: p, .. }) if p == pc
    ));
    assert_eq!(ctx.sim.exit_code(), None);
}

#[test]
fn store_to_unmapped_mmio_space_faults() {
    let program = [li(1, 0x4000_2000), vec![sw(1, 0, 0)], exit(0)].concat();
    let mut ctx = TestContext::new().load_program(&program);
    assert!(matches!(
        ctx.try_run(),
        Err(SimError::MemoryOutOfRange { addr: 0x4000_2000, .. })
    ));
}

#[rstest]
#[case::word(lw(2, 1, 2), 0x102)]
#[case::half(lh(2, 1, 1), 0x101)]
#[case::store_word(sw(1, 0, 1), 0x101)]
fn misaligned_accesses_fault(#[case] access: u32, #[case] addr: u32) {
    let program = [vec![addi(1, 0, 0x100), access], exit(0)].concat();
    let mut ctx = TestContext::new().load_program(&program);
    assert!(matches!(
        ctx.try_run(),
        Err(SimError::MisalignedAccess { addr: a, pc: 4, .. }) if a == addr
    ));
}

#[test]
fn data_cache_faults_name_the_requesting_instruction() {
    let mut cpu = Cpu::new(&Config::default()).unwrap();
    cpu.pc = 0x8000;
    cpu.ex_mem = Some(ExMemEntry {
        pc: 0x4000,
        inst: lw(2, 0, 0x100),
        inst_type: InstType::Load,
        rd: Some(2),
        wb_value: None,
        next_pc: 0x4004,
        mem: Some(MemAccess {
            addr: 0x100,
            op: MemOp::load(MemWidth::Word, true),
            store_data: 0,
        }),
    });

    // Intercept the data cache's line fill and answer with a short line instead.
    let intercepted = (0..100).any(|_| {
        cpu.tick().unwrap();
        cpu.memory.take_response(Port::Data).is_some()
    });
    assert!(intercepted);
    assert_eq!(cpu.dcache.state(), CacheState::Fill);
    cpu.memory
        .request(Port::Data, MemRequest::ReadLine { addr: 0, words: 8 })
        .unwrap();

    let fault = (0..100).find_map(|_| cpu.tick().err()).unwrap();
    assert!(matches!(
        fault,
        SimError::CacheProtocolViolation {
            pc: 0x4000,
            source: MemError::UnexpectedResponse,
            ..
        }
    ));
}

#[test]
fn faults_are_sticky() {
    let program = [vec![lw(2, 0, 2)], exit(0)].concat();
    let mut ctx = TestContext::new().load_program(&program);
    let first = ctx.try_run().unwrap_err();
    assert_eq!(ctx.sim.tick().unwrap_err(), first);
    assert_eq!(ctx.try_run().unwrap_err(), first);
}

/// The exit store lands at every position relative to a line boundary, including
/// the ones where its MMIO write waits behind an instruction line fill.
#[rstest]
fn nothing_after_the_exit_store_commits(
    #[values(Associativity::DirectMapped, Associativity::TwoWay)] associativity: Associativity,
) {
    for pad in 0..20 {
        let program = [
            vec![lui(SCRATCH, MMIO_EXIT)],
            vec![addi(0, 0, 0); pad],
            vec![sw(SCRATCH, 0, 0), addi(5, 0, 1), addi(6, 0, 1), addi(7, 0, 1)],
        ]
        .concat();
        let exit_pc = 4 * (pad as u32 + 1);
        let mut ctx = TestContext::with_associativity(associativity).load_program(&program);

        assert_eq!(ctx.run(), RunOutcome::Exited(0), "pad {pad}");
        assert_eq!([ctx.reg(5), ctx.reg(6), ctx.reg(7)], [0, 0, 0], "pad {pad}");
        assert!(
            ctx.commit_trace().iter().all(|&pc| pc < exit_pc),
            "pad {pad}: {:x?}",
            ctx.commit_trace()
        );
    }
}
