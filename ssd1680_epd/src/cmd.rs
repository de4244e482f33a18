// SSD1680 register map, only the commands this driver issues.

// Init
pub const DRIVER_OUTPUT_CONTROL: u8 = 0x01;
pub const DEEP_SLEEP_MODE: u8 = 0x10;
pub const DATA_ENTRY_MODE: u8 = 0x11;
pub const SW_RESET: u8 = 0x12;
pub const TEMP_SENSOR_CONTROL: u8 = 0x18;
pub const DISPLAY_UPDATE_CONTROL_1: u8 = 0x21;
pub const WRITE_LUT: u8 = 0x32;
pub const BORDER_WAVEFORM_CONTROL: u8 = 0x3C;
pub const SET_RAM_X_WINDOW: u8 = 0x44;
pub const SET_RAM_Y_WINDOW: u8 = 0x45;

// Update
pub const MASTER_ACTIVATION: u8 = 0x20;
pub const DISPLAY_UPDATE_CONTROL_2: u8 = 0x22;
pub const WRITE_RAM_BW: u8 = 0x24;
pub const WRITE_RAM_RED: u8 = 0x26;
pub const SET_RAM_X_COUNTER: u8 = 0x4E;
pub const SET_RAM_Y_COUNTER: u8 = 0x4F;

// Payloads
pub const GATE_SCAN_DEFAULT: u8 = 0x00;
/// X increment, Y decrement. The frame buffer layout assumes this order.
pub const DATA_ENTRY_INCRX_DECRY: u8 = 0x01;
/// Follow LUT, LUT1.
pub const BORDER_WAVEFORM: u8 = 0x05;
pub const INTERNAL_TEMP_SENSOR: u8 = 0x80;
pub const UPDATE_CONTROL_1_NORMAL: [u8; 2] = [0x00, 0x00];
/// Clock on, analog on, display with the loaded LUT, no LUT reload from OTP.
pub const UPDATE_CONTROL_2_FAST: u8 = 0xCC;
pub const DEEP_SLEEP_MODE_1: u8 = 0x01;
