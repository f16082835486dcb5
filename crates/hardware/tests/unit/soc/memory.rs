//! Main Memory Tests.

use pretty_assertions::assert_eq;
use rv32sim_core::common::constants::{MMIO_ARG, MMIO_CONSOLE_BYTE, MMIO_CONSOLE_INT};
use rv32sim_core::common::error::MemError;
use rv32sim_core::config::{MemoryConfig, MemoryController};
use rv32sim_core::soc::MainMemory;
use rv32sim_core::soc::devices::{ConsoleEvent, Mmio};
use rv32sim_core::soc::memory::{FULL_WORD, MemRequest, MemResponse, Port};
use rv32sim_core::soc::memory_map::{MmioRegister, Region, classify, is_mmio};

fn memory() -> MainMemory {
    MainMemory::new(&MemoryConfig::default(), Mmio::new(false))
}

/// Ticks until `port` can claim a response; returns it with the tick count.
fn complete(mem: &mut MainMemory, port: Port) -> (MemResponse, u64) {
    let mut ticks = 0;
    loop {
        if let Some(response) = mem.take_response(port) {
            return (response, ticks);
        }
        mem.tick();
        ticks += 1;
        assert!(ticks < 1_000, "transaction never completed");
    }
}

#[test]
fn line_read_costs_base_plus_per_word() {
    let mut mem = memory();
    mem.write_words(0x40, &[1, 2, 3]);
    mem.request(
        Port::Data,
        MemRequest::ReadLine {
            addr: 0x40,
            words: 16,
        },
    )
    .unwrap();

    let (response, ticks) = complete(&mut mem, Port::Data);
    assert_eq!(ticks, 35);
    let MemResponse::Line(words) = response else {
        panic!("expected a line response");
    };
    assert_eq!(words.len(), 16);
    assert_eq!(&words[..4], &[1, 2, 3, 0]);
    assert!(!mem.is_busy());
}

#[test]
fn one_transaction_at_a_time() {
    let mut mem = memory();
    mem.request(Port::Instruction, MemRequest::ReadWord { addr: 0 })
        .unwrap();
    assert_eq!(mem.owner(), Some(Port::Instruction));
    assert_eq!(
        mem.request(Port::Data, MemRequest::ReadWord { addr: 4 }),
        Err(MemError::Busy { port: Port::Data })
    );

    // A parked response still blocks until its owner claims it.
    for _ in 0..20 {
        mem.tick();
    }
    assert!(mem.is_busy());
    assert_eq!(mem.take_response(Port::Data), None);
    assert_eq!(mem.take_response(Port::Instruction), Some(MemResponse::Word(0)));
    assert!(!mem.is_busy());
    assert_eq!(mem.owner(), None);
}

#[test]
fn line_requests_must_be_line_aligned() {
    let mut mem = memory();
    assert_eq!(
        mem.request(
            Port::Data,
            MemRequest::ReadLine {
                addr: 0x20,
                words: 16
            }
        ),
        Err(MemError::Misaligned {
            addr: 0x20,
            align: 64
        })
    );
}

#[test]
fn accesses_outside_the_map_are_rejected() {
    let mut mem = memory();
    assert_eq!(
        mem.request(
            Port::Data,
            MemRequest::ReadLine {
                addr: 0x0100_0000,
                words: 16
            }
        ),
        Err(MemError::OutOfRange { addr: 0x0100_0000 })
    );
    assert_eq!(
        mem.request(Port::Data, MemRequest::ReadWord { addr: 0x5000_0000 }),
        Err(MemError::OutOfRange { addr: 0x5000_0000 })
    );
    assert_eq!(
        mem.request(Port::Data, MemRequest::ReadWord { addr: 0x6 }),
        Err(MemError::Misaligned { addr: 0x6, align: 4 })
    );
    assert!(!mem.is_busy());
}

#[test]
fn line_write_back_lands_after_its_latency() {
    let mut mem = memory();
    let data: Vec<u32> = (0..16).collect();
    mem.request(
        Port::Data,
        MemRequest::WriteLine {
            addr: 0x80,
            data: data.clone(),
        },
    )
    .unwrap();
    mem.tick();
    assert_eq!(mem.read_word(0x84), Some(0));

    let (response, _) = complete(&mut mem, Port::Data);
    assert_eq!(response, MemResponse::Ack);
    assert_eq!(mem.read_words(0x80, 16), data);
}

#[test]
fn dram_controller_charges_row_switches() {
    let config = MemoryConfig {
        controller: MemoryController::Dram,
        ..MemoryConfig::default()
    };
    let mut mem = MainMemory::new(&config, Mmio::new(false));
    let line = |addr| MemRequest::ReadLine { addr, words: 16 };

    mem.request(Port::Data, line(0)).unwrap();
    assert_eq!(complete(&mut mem, Port::Data).1, 55);

    mem.request(Port::Data, line(0x40)).unwrap();
    assert_eq!(complete(&mut mem, Port::Data).1, 35);

    mem.request(Port::Data, line(0x1000)).unwrap();
    assert_eq!(complete(&mut mem, Port::Data).1, 55);
}

#[test]
fn mmio_words_reach_the_devices() {
    let mut mem = memory();
    mem.mmio_mut().set_args([11, 22]);

    mem.request(
        Port::Data,
        MemRequest::WriteWord {
            addr: MMIO_CONSOLE_BYTE,
            data: 0x0000_4800,
            byte_enable: 0b0010,
        },
    )
    .unwrap();
    assert_eq!(complete(&mut mem, Port::Data), (MemResponse::Ack, 1));

    mem.request(
        Port::Data,
        MemRequest::WriteWord {
            addr: MMIO_CONSOLE_INT,
            data: -12_i32 as u32,
            byte_enable: FULL_WORD,
        },
    )
    .unwrap();
    let _ = complete(&mut mem, Port::Data);

    mem.request(Port::Data, MemRequest::ReadWord { addr: MMIO_ARG })
        .unwrap();
    assert_eq!(complete(&mut mem, Port::Data).0, MemResponse::Word(11));

    assert_eq!(mem.mmio().console_output(), "H-12");
    assert_eq!(
        mem.mmio().events(),
        &[ConsoleEvent::Char(b'H'), ConsoleEvent::Int(-12)]
    );
    assert_eq!(mem.mmio().remaining_args(), 1);
}

#[test]
fn debug_access_bypasses_timing() {
    let mut mem = memory();
    mem.load_bytes(0x10, &[0x78, 0x56, 0x34, 0x12]).unwrap();
    assert_eq!(mem.read_word(0x10), Some(0x1234_5678));
    assert_eq!(mem.read_bytes(0x11, 2), Some(&[0x56, 0x34][..]));
    assert_eq!(mem.read_word(0x11), None);
    assert_eq!(mem.read_word(0x0100_0000), None);
    assert_eq!(
        mem.load_bytes(0x00FF_FFFE, &[1, 2, 3, 4]),
        Err(MemError::OutOfRange { addr: 0x00FF_FFFE })
    );
    assert!(!mem.is_busy());
}

#[test]
fn address_map_decodes_registers_by_word() {
    const SIZE: usize = 16 * 1024 * 1024;
    assert_eq!(classify(0, SIZE), Region::Dram);
    assert_eq!(
        classify(MMIO_CONSOLE_INT + 2, SIZE),
        Region::Mmio(MmioRegister::ConsoleInt)
    );
    assert_eq!(classify(MMIO_ARG, SIZE), Region::Mmio(MmioRegister::Arg));
    assert!(is_mmio(MMIO_ARG, SIZE));
    assert!(!is_mmio(0x4000_0008, SIZE));
    assert_eq!(MmioRegister::Exit.addr(), 0x4000_1000);
}
