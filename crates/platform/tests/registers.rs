//! Register map and wire-format checks against the MCP23016 datasheet.

use platform::expander::registers::{address_byte, READ, WRITE};
use platform::{ExpanderConfig, LineId, Port, Register};

// ── Register addresses ───────────────────────────────────────────────────────

#[test]
fn register_addresses_match_datasheet_table() {
    let expected: [(Register, u8); 12] = [
        (Register::Gp0, 0x00),
        (Register::Gp1, 0x01),
        (Register::Olat0, 0x02),
        (Register::Olat1, 0x03),
        (Register::Ipol0, 0x04),
        (Register::Ipol1, 0x05),
        (Register::Iodir0, 0x06),
        (Register::Iodir1, 0x07),
        (Register::Intcap0, 0x08),
        (Register::Intcap1, 0x09),
        (Register::Iocon0, 0x0A),
        (Register::Iocon1, 0x0B),
    ];
    for (register, addr) in expected {
        assert_eq!(register.addr(), addr, "{register:?}");
        assert_eq!(Register::from_addr(addr), Some(register));
    }
}

#[test]
fn addresses_past_iocon1_are_unknown() {
    assert_eq!(Register::from_addr(0x0C), None);
    assert_eq!(Register::from_addr(0xFF), None);
}

#[test]
fn port_companions_stay_on_their_port() {
    assert_eq!(Port::P0.data(), Register::Gp0);
    assert_eq!(Port::P0.direction(), Register::Iodir0);
    assert_eq!(Port::P0.capture(), Register::Intcap0);
    assert_eq!(Port::P1.data(), Register::Gp1);
    assert_eq!(Port::P1.latch(), Register::Olat1);
    assert_eq!(Port::P1.polarity(), Register::Ipol1);
}

// ── Wire format ──────────────────────────────────────────────────────────────

#[test]
fn address_byte_carries_rw_in_lsb() {
    assert_eq!(address_byte(0x20, false), 0x40);
    assert_eq!(address_byte(0x20, true), 0x41);
    assert_eq!(WRITE, 0);
    assert_eq!(READ, 1);
}

#[test]
fn address_byte_for_highest_strap() {
    assert_eq!(address_byte(0x27, false), 0x4E);
    assert_eq!(address_byte(0x27, true), 0x4F);
}

// ── Configuration ────────────────────────────────────────────────────────────

#[test]
fn default_init_sequence_inputs_on_p0_outputs_on_p1() {
    let config = ExpanderConfig::default();
    assert_eq!(config.address, 0x20);
    assert_eq!(
        config.init_sequence(),
        [
            (Register::Iodir0, 0xFF),
            (Register::Iodir1, 0x00),
            (Register::Ipol0, 0x00),
            (Register::Ipol1, 0x00),
            (Register::Iocon0, 0x00),
        ]
    );
}

#[test]
fn swapped_directions_flow_into_init_sequence() {
    let config = ExpanderConfig::default()
        .with_directions(0x00, 0xFF)
        .with_ports(Port::P1, Port::P0);
    let sequence = config.init_sequence();
    assert_eq!(sequence.first(), Some(&(Register::Iodir0, 0x00)));
    assert_eq!(sequence.get(1), Some(&(Register::Iodir1, 0xFF)));
    assert_eq!(config.input_port, Port::P1);
}

// ── Logical lines ────────────────────────────────────────────────────────────

#[test]
fn line_masks_are_single_bits() {
    assert_eq!(LineId::new(0).mask(), 0x01);
    assert_eq!(LineId::new(3).mask(), 0x08);
    assert_eq!(LineId::new(7).mask(), 0x80);
}

#[test]
fn line_outside_port_has_empty_mask() {
    assert_eq!(LineId::new(8).mask(), 0);
    assert_eq!(LineId::new(200).mask(), 0);
}
