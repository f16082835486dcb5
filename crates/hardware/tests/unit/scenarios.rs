//! Reference Programs.
//!
//! Small programs whose architectural results are known exactly: straight-line
//! arithmetic with memory, a taken branch over a skipped region, console output
//! and exit, and a set-aliasing access pattern run on both cache organisations.

use pretty_assertions::assert_eq;
use rv32sim_core::RunOutcome;
use rv32sim_core::config::Associativity;
use rv32sim_core::soc::devices::ConsoleEvent;

use crate::common::builder::*;
use crate::common::harness::TestContext;

#[test]
fn arithmetic_store_and_load_back() {
    let program = [
        vec![
            addi(1, 0, 5),
            addi(2, 0, 7),
            add(3, 1, 2),
            sw(0, 3, 0),
            lw(4, 0, 0),
        ],
        exit(0),
    ]
    .concat();
    let mut ctx = TestContext::new().load_program(&program);

    assert_eq!(ctx.run(), RunOutcome::Exited(0));
    assert_eq!(ctx.reg(3), 12);
    assert_eq!(ctx.reg(4), 12);
    assert_eq!(ctx.word(0), 12);
}

#[test]
fn taken_branch_skips_the_region_it_jumps_over() {
    let program = [
        vec![
            addi(1, 0, 1),  // 0x00
            beq(0, 0, 12),  // 0x04 -> 0x10
            addi(2, 0, 99), // 0x08 skipped
            addi(3, 0, 99), // 0x0c skipped
            addi(4, 0, 4),  // 0x10
        ],
        exit(0),
    ]
    .concat();
    let mut ctx = TestContext::new().load_program(&program);

    assert_eq!(ctx.run(), RunOutcome::Exited(0));
    assert_eq!(ctx.reg(1), 1);
    assert_eq!(ctx.reg(2), 0);
    assert_eq!(ctx.reg(3), 0);
    assert_eq!(ctx.reg(4), 4);
    // The run ends when the exit store reaches memory, before it commits.
    assert_eq!(ctx.commit_trace(), &[0x00, 0x04, 0x10, 0x14]);
}

#[test]
fn branch_by_eight_skips_exactly_one_instruction() {
    let program = [
        vec![
            beq(0, 0, 8),   // 0x00 -> 0x08
            addi(5, 0, 55), // 0x04 skipped
            addi(6, 0, 66), // 0x08
        ],
        exit(0),
    ]
    .concat();
    let mut ctx = TestContext::new().load_program(&program);

    assert_eq!(ctx.run(), RunOutcome::Exited(0));
    assert_eq!(ctx.reg(5), 0);
    assert_eq!(ctx.reg(6), 66);
    assert!(!ctx.commit_trace().contains(&0x04));
}

#[test]
fn console_character_then_exit() {
    let program = [
        vec![addi(10, 0, 65)],
        print_char(10),
        vec![addi(11, 0, 0)],
        exit(11),
    ]
    .concat();
    let mut ctx = TestContext::new().load_program(&program);

    assert_eq!(ctx.run(), RunOutcome::Exited(0));
    assert_eq!(ctx.sim.console_output(), "A");
    assert_eq!(ctx.sim.console_events(), &[ConsoleEvent::Char(b'A')]);
}

#[test]
fn exit_status_is_reported() {
    let program = [vec![addi(10, 0, 42)], exit(10)].concat();
    let mut ctx = TestContext::new().load_program(&program);
    assert_eq!(ctx.run(), RunOutcome::Exited(42));
    assert_eq!(ctx.sim.exit_code(), Some(42));
}

/// Loads from two addresses that map to set 0, in the order A, B, A, B.
fn aliasing_loads() -> Vec<u32> {
    [
        vec![
            lui(10, 0x1000),
            lui(11, 0x2000),
            lw(1, 10, 0),
            lw(2, 11, 0),
            lw(3, 10, 0),
            lw(4, 11, 0),
        ],
        exit(0),
    ]
    .concat()
}

#[test]
fn two_way_cache_keeps_both_aliasing_lines() {
    let mut ctx = TestContext::with_associativity(Associativity::TwoWay).load_program(&aliasing_loads());
    assert_eq!(ctx.run(), RunOutcome::Exited(0));

    let dcache = ctx.sim.stats().dcache;
    assert_eq!(dcache.misses, 2);
    assert_eq!(dcache.hits, 2);
}

#[test]
fn direct_mapped_cache_thrashes_on_aliasing_lines() {
    let mut ctx =
        TestContext::with_associativity(Associativity::DirectMapped).load_program(&aliasing_loads());
    assert_eq!(ctx.run(), RunOutcome::Exited(0));

    let dcache = ctx.sim.stats().dcache;
    assert_eq!(dcache.misses, 4);
    assert_eq!(dcache.hits, 0);
    assert_eq!(dcache.writebacks, 0);
}

#[test]
fn counting_loop_sums_to_fifty_five() {
    // x1 = 10; x2 = 0; do { x2 += x1; x1 -= 1 } while x1 != 0
    let program = [
        vec![
            addi(1, 0, 10),
            addi(2, 0, 0),
            add(2, 2, 1),
            addi(1, 1, -1),
            bne(1, 0, -8),
        ],
        print_int(2),
        exit(0),
    ]
    .concat();
    let mut ctx = TestContext::new().load_program(&program);

    assert_eq!(ctx.run(), RunOutcome::Exited(0));
    assert_eq!(ctx.reg(2), 55);
    assert_eq!(ctx.sim.console_output(), "55");
    assert_eq!(ctx.sim.stats().redirects, 9);
    assert_eq!(ctx.sim.stats().branches, 10);
}

#[test]
fn arguments_are_read_in_order() {
    let program = [
        read_arg(10),
        read_arg(11),
        vec![sub(12, 10, 11)],
        print_int(12),
        exit(12),
    ]
    .concat();
    let mut ctx = TestContext::new()
        .load_program(&program)
        .with_args(&[50, 8]);

    assert_eq!(ctx.run(), RunOutcome::Exited(42));
    assert_eq!(ctx.sim.console_output(), "42");
}
