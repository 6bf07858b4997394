use beatbridge_core::bridge::BridgeConfig;
use beatbridge_core::core::{Component, NativePort, PortResponder};
use beatbridge_core::device::{HostTransaction, MemoryTiming, NativeMemory};
use beatbridge_systems::{SimError, Testbench};

/// Memory whose read data has bit 4 stuck high.
struct StuckBitMemory(NativeMemory);

impl PortResponder for StuckBitMemory {
    fn drive(&mut self, port: &mut NativePort) {
        self.0.drive(port);
        port.rdata.data |= 0x10;
    }

    fn sample(&mut self, port: &NativePort) {
        self.0.sample(port);
    }

    fn reset(&mut self) {
        self.0.reset();
    }
}

impl Component for StuckBitMemory {
    fn tick(&mut self) -> bool {
        self.0.tick()
    }
}

fn bench(host: u32, native: u32) -> Testbench {
    Testbench::new(BridgeConfig::new(host, 30, native), MemoryTiming::default()).unwrap()
}

// =================================================================
// Construction
// =================================================================

#[test]
fn rejects_invalid_config_before_any_step() {
    let result = Testbench::new(BridgeConfig::new(16, 30, 32), MemoryTiming::default());
    assert!(result.is_err());
}

#[test]
fn config_error_converts_into_sim_error() {
    let err = Testbench::new(BridgeConfig::new(16, 30, 32), MemoryTiming::default())
        .map_err(SimError::from)
        .err()
        .unwrap();
    assert!(matches!(err, SimError::Config(_)));
    assert!(err.to_string().contains("narrower"));
}

// =================================================================
// Transactions
// =================================================================

#[test]
fn scenario_8bit_passthrough() {
    let mut tb = bench(8, 8);
    tb.write(5, 0x7A).unwrap();
    assert_eq!(tb.read(5).unwrap(), 0x7A);
    assert_eq!(tb.memory().read_word(5), 0x7A);
}

#[test]
fn scenario_64bit_to_32bit() {
    let mut tb = bench(64, 32);
    tb.write(0, 0x1122_3344_5566_7788).unwrap();
    assert_eq!(tb.memory().read_word(0), 0x5566_7788);
    assert_eq!(tb.memory().read_word(1), 0x1122_3344);
    assert_eq!(tb.read(0).unwrap(), 0x1122_3344_5566_7788);
}

#[test]
fn scenario_32bit_to_8bit_with_base_address() {
    let config = BridgeConfig::new(32, 30, 8).with_base_address(0x1000_0000);
    let mut tb = Testbench::new(config, MemoryTiming::default()).unwrap();
    let a = 0x0400_0000 + 0x10;
    tb.write(a, 0xA1B2_C3D4).unwrap();
    for (beat, byte) in [0xD4, 0xC3, 0xB2, 0xA1].into_iter().enumerate() {
        assert_eq!(tb.memory().read_word((a - 0x0400_0000) * 4 + beat as u64), byte);
    }
}

#[test]
fn data_wider_than_host_is_truncated() {
    let mut tb = bench(16, 8);
    tb.write(0, 0xFFFF_1234).unwrap();
    assert_eq!(tb.read(0).unwrap(), 0x1234);
}

#[test]
fn masked_write_preserves_other_bytes() {
    let mut tb = bench(32, 8);
    tb.write(2, 0x1111_1111).unwrap();
    tb.write_masked(2, 0xAABB_CCDD, 0b1001).unwrap();
    assert_eq!(tb.read(2).unwrap(), 0xAA11_11DD);
}

#[test]
fn queued_transactions_complete_in_order() {
    let mut tb = bench(64, 16);
    tb.submit(HostTransaction::write(1, 0xAAAA_BBBB_CCCC_DDDD));
    tb.submit(HostTransaction::write(2, 0x1111_2222_3333_4444));
    tb.submit(HostTransaction::read(2));
    tb.submit(HostTransaction::read(1));

    let done = tb.run_until_idle().unwrap();
    let reads: Vec<_> = done.iter().filter_map(|c| c.read_data).collect();
    assert_eq!(reads, vec![0x1111_2222_3333_4444, 0xAAAA_BBBB_CCCC_DDDD]);
}

#[test]
fn cycle_count_scales_with_ratio() {
    for (host, native, ratio) in [(32, 32, 1u64), (32, 16, 2), (32, 8, 4)] {
        let mut tb = bench(host, native);
        let write = tb.run(HostTransaction::write(0, 0)).unwrap();
        assert_eq!(write.cycles, 1 + ratio);
        let read = tb.run(HostTransaction::read(0)).unwrap();
        assert_eq!(read.cycles, 1 + 2 * ratio);
    }
}

#[test]
fn unwritten_words_read_zero() {
    let mut tb = bench(64, 8);
    assert_eq!(tb.read(99).unwrap(), 0);
}

// =================================================================
// Run control
// =================================================================

#[test]
fn silent_responder_reports_stall() {
    let timing = MemoryTiming {
        read_latency: 1,
        ready_period: u32::MAX,
    };
    let mut tb = Testbench::new(BridgeConfig::new(32, 30, 8), timing)
        .unwrap()
        .with_step_limit(50);
    let err = tb.write(3, 1).unwrap_err();
    assert!(matches!(err, SimError::Stalled { address: 3, cycles: 50 }));
    assert!(!tb.bridge().is_idle());
}

#[test]
fn pattern_readback_passes() {
    let mut tb = bench(32, 8);
    tb.run_pattern(&[(0, 0x0102_0304), (7, 0xFFFF_0000), (3, 0x1234_5678)])
        .unwrap();
    assert_eq!(tb.memory().words().len(), 12);
}

#[test]
fn pattern_readback_detects_corruption() {
    let config = BridgeConfig::new(16, 30, 8);
    let memory = StuckBitMemory(NativeMemory::new(8, MemoryTiming::default()));
    let mut tb = Testbench::with_responder(config, memory).unwrap();

    let err = tb.run_pattern(&[(0, 0xBEEF)]).unwrap_err();
    assert!(matches!(
        err,
        SimError::ReadbackMismatch {
            address: 0,
            expected: 0xBEEF,
            actual: 0xBEFF,
        }
    ));
    assert!(err.to_string().contains("0xBEEF"));
}

#[test]
fn reset_keeps_memory() {
    let mut tb = bench(32, 16);
    tb.write(1, 0x5555_AAAA).unwrap();
    tb.reset();
    assert!(tb.bridge().is_idle());
    assert!(!tb.host().request());
    assert_eq!(tb.read(1).unwrap(), 0x5555_AAAA);
}

#[test]
fn host_bus_released_after_run() {
    let mut tb = bench(32, 8);
    tb.write(0, 1).unwrap();
    tb.step();
    assert!(!tb.host().request());
    assert!(!tb.port().cmd.valid);
}

#[test]
fn host_drops_request_between_queued_transactions() {
    let mut tb = bench(32, 16);
    tb.submit(HostTransaction::write(0, 1));
    tb.submit(HostTransaction::write(1, 2));

    let mut steps = 0;
    while !tb.step() {
        steps += 1;
        assert!(steps < 100);
    }
    tb.step();
    assert!(!tb.host().request());
    assert!(tb.bridge().is_idle());

    tb.step();
    assert!(tb.host().request());
    assert_eq!(tb.host().adr, 1);

    let done = tb.run_until_idle().unwrap();
    assert_eq!(done.len(), 2);
    assert_eq!(tb.read(1).unwrap(), 2);
}

#[test]
fn reset_discards_abandoned_read() {
    let timing = MemoryTiming {
        read_latency: 50,
        ready_period: 1,
    };
    let mut tb = Testbench::new(BridgeConfig::new(8, 30, 8), timing)
        .unwrap()
        .with_step_limit(5);
    tb.memory_mut().load(&[(0, 0xAA), (1, 0xBB)]);

    assert!(matches!(tb.read(0), Err(SimError::Stalled { address: 0, .. })));
    assert_eq!(tb.memory().pending_reads(), 1);

    tb.reset();
    assert_eq!(tb.memory().pending_reads(), 0);

    let mut tb = tb.with_step_limit(500);
    assert_eq!(tb.read(1).unwrap(), 0xBB);
    assert_eq!(tb.memory().read_word(0), 0xAA);
}
