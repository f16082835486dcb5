//! Property Tests.
//!
//! Generated programs checked against a plain Rust model of their result.

use std::collections::HashMap;

use proptest::prelude::*;
use rv32sim_core::config::{Associativity, ReplacementPolicy};
use rv32sim_core::{Config, RunOutcome};

use crate::common::builder::*;
use crate::common::harness::TestContext;

/// Four lines that all map to set 0 of the default geometry.
fn aliasing_addr(slot: u8) -> u32 {
    let slot = u32::from(slot % 16);
    0x1000 * (1 + slot % 4) + 4 * (slot / 4)
}

/// Stores every `(slot, value)` pair, then loads each slot back in the same
/// order and exits with the wrapping sum.
fn store_load_program(ops: &[(u8, u32)]) -> Vec<u32> {
    let mut program = Vec::new();
    for &(slot, value) in ops {
        program.extend(li(1, value));
        program.extend(li(2, aliasing_addr(slot)));
        program.push(sw(2, 1, 0));
    }
    for &(slot, _) in ops {
        program.extend(li(2, aliasing_addr(slot)));
        program.push(lw(3, 2, 0));
        program.push(add(5, 5, 3));
    }
    program.extend(exit(5));
    program
}

fn expected_sum(ops: &[(u8, u32)]) -> u32 {
    let mut memory = HashMap::new();
    for &(slot, value) in ops {
        memory.insert(aliasing_addr(slot), value);
    }
    ops.iter()
        .map(|&(slot, _)| memory.get(&aliasing_addr(slot)).copied().unwrap_or(0))
        .fold(0, u32::wrapping_add)
}

fn run_on(config: &Config, program: &[u32]) -> TestContext {
    let mut ctx = TestContext::with_config(config).load_program(program);
    assert_eq!(ctx.run(), RunOutcome::Exited(ctx.reg(5)));
    ctx
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn li_round_trips_any_value(rd in 1u32..31, value in any::<u32>()) {
        let program = [li(rd, value), exit(0)].concat();
        let mut ctx = TestContext::new().load_program(&program);
        prop_assert_eq!(ctx.run(), RunOutcome::Exited(0));
        prop_assert_eq!(ctx.reg(rd as usize), value);
    }

    #[test]
    fn x0_ignores_writes(imm in -2048i32..2048) {
        let program = [vec![addi(0, 0, imm), add(1, 0, 0)], exit(0)].concat();
        let mut ctx = TestContext::new().load_program(&program);
        prop_assert_eq!(ctx.run(), RunOutcome::Exited(0));
        prop_assert_eq!(ctx.reg(0), 0);
        prop_assert_eq!(ctx.reg(1), 0);
    }

    #[test]
    fn register_arithmetic_matches_the_model(a in any::<u32>(), b in any::<u32>()) {
        let program = [
            li(1, a),
            li(2, b),
            vec![add(3, 1, 2), sub(4, 1, 2), slt(5, 1, 2), sra(6, 1, 2)],
            exit(0),
        ]
        .concat();
        let mut ctx = TestContext::new().load_program(&program);
        prop_assert_eq!(ctx.run(), RunOutcome::Exited(0));
        prop_assert_eq!(ctx.reg(3), a.wrapping_add(b));
        prop_assert_eq!(ctx.reg(4), a.wrapping_sub(b));
        prop_assert_eq!(ctx.reg(5), u32::from((a as i32) < (b as i32)));
        prop_assert_eq!(ctx.reg(6), ((a as i32) >> (b & 31)) as u32);
    }

    #[test]
    fn memory_results_do_not_depend_on_the_cache(
        ops in prop::collection::vec((any::<u8>(), any::<u32>()), 1..20),
        policy in prop_oneof![Just(ReplacementPolicy::Lru), Just(ReplacementPolicy::Fifo)],
    ) {
        let program = store_load_program(&ops);
        let expected = expected_sum(&ops);

        let mut two_way = Config::default();
        two_way.cache.dcache.policy = policy;
        let mut direct = two_way.clone();
        direct.cache.dcache.associativity = Associativity::DirectMapped;

        let a = run_on(&two_way, &program);
        let b = run_on(&direct, &program);
        prop_assert_eq!(a.sim.exit_code(), Some(expected));
        prop_assert_eq!(b.sim.exit_code(), Some(expected));
        prop_assert_eq!(a.sim.regs(), b.sim.regs());
        for slot in 0..16 {
            let addr = aliasing_addr(slot);
            prop_assert_eq!(a.word(addr), b.word(addr));
        }
    }

    #[test]
    fn identical_runs_are_identical(
        ops in prop::collection::vec((any::<u8>(), any::<u32>()), 1..12),
    ) {
        let program = store_load_program(&ops);
        let first = run_on(&Config::default(), &program);
        let second = run_on(&Config::default(), &program);
        prop_assert_eq!(first.sim.dump(&[0x1000]), second.sim.dump(&[0x1000]));
        prop_assert_eq!(first.commit_trace(), second.commit_trace());
    }
}
