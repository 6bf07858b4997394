/// Classic handshake host bus (Wishbone-style, single outstanding access).
///
/// All fields are public signals. The host master drives `adr`, `dat_w`,
/// `sel`, `cyc`, `stb` and `we`; the bridge drives `dat_r` and `ack`.
/// A request is valid for exactly the steps where `cyc && stb` hold, and
/// `ack` is asserted for exactly one step per transaction.
#[derive(Clone, Debug)]
pub struct HostBus {
    pub adr: u64,
    pub dat_w: u64,
    pub dat_r: u64,
    pub sel: u8, // one bit per byte lane, bit 0 = lane 0
    pub cyc: bool,
    pub stb: bool,
    pub we: bool,
    pub ack: bool,

    data_width: u32,
}

impl HostBus {
    /// Create an idle bus of `data_width` bits.
    pub fn new(data_width: u32) -> Self {
        Self {
            adr: 0,
            dat_w: 0,
            dat_r: 0,
            sel: 0,
            cyc: false,
            stb: false,
            we: false,
            ack: false,
            data_width,
        }
    }

    pub fn data_width(&self) -> u32 {
        self.data_width
    }

    pub fn byte_width(&self) -> u32 {
        self.data_width / 8
    }

    /// Byte select with every lane of this bus enabled.
    pub fn full_select(&self) -> u8 {
        lane_mask(self.byte_width())
    }

    /// True while the master holds a valid request (`cyc && stb`).
    pub fn request(&self) -> bool {
        self.cyc && self.stb
    }
}

/// Native port command channel. Driven by the bridge except `ready`.
#[derive(Clone, Debug, Default)]
pub struct CommandChannel {
    pub valid: bool,
    pub ready: bool,
    pub we: bool,
    pub addr: u64,
}

impl CommandChannel {
    pub fn fire(&self) -> bool {
        self.valid && self.ready
    }
}

/// Native port write-data channel. Driven by the bridge except `ready`.
#[derive(Clone, Debug, Default)]
pub struct WriteDataChannel {
    pub valid: bool,
    pub ready: bool,
    pub data: u64,
    pub we: u8, // per-byte write enable for this beat
}

impl WriteDataChannel {
    pub fn fire(&self) -> bool {
        self.valid && self.ready
    }
}

/// Native port read-data channel. Driven by the responder except `ready`.
#[derive(Clone, Debug, Default)]
pub struct ReadDataChannel {
    pub valid: bool,
    pub ready: bool,
    pub data: u64,
}

impl ReadDataChannel {
    pub fn fire(&self) -> bool {
        self.valid && self.ready
    }
}

/// Split command / write-data / read-data memory port.
#[derive(Clone, Debug)]
pub struct NativePort {
    pub cmd: CommandChannel,
    pub wdata: WriteDataChannel,
    pub rdata: ReadDataChannel,

    address_width: u32,
    data_width: u32,
}

impl NativePort {
    pub fn new(address_width: u32, data_width: u32) -> Self {
        Self {
            cmd: CommandChannel::default(),
            wdata: WriteDataChannel::default(),
            rdata: ReadDataChannel::default(),
            address_width,
            data_width,
        }
    }

    pub fn address_width(&self) -> u32 {
        self.address_width
    }

    pub fn data_width(&self) -> u32 {
        self.data_width
    }

    pub fn byte_width(&self) -> u32 {
        self.data_width / 8
    }

    /// Deassert every signal the bridge drives.
    pub fn clear_requests(&mut self) {
        self.cmd.valid = false;
        self.cmd.we = false;
        self.cmd.addr = 0;
        self.wdata.valid = false;
        self.wdata.data = 0;
        self.wdata.we = 0;
        self.rdata.ready = false;
    }

    /// Deassert every signal the responder drives.
    pub fn clear_responses(&mut self) {
        self.cmd.ready = false;
        self.wdata.ready = false;
        self.rdata.valid = false;
        self.rdata.data = 0;
    }
}

/// Mask with the low `lanes` bits set (up to 8 byte lanes).
pub(crate) fn lane_mask(lanes: u32) -> u8 {
    if lanes >= 8 { 0xFF } else { ((1u16 << lanes) - 1) as u8 }
}
