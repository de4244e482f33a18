//! Controller session for **SSD1680** panels driven with the fast waveform.
//!
//! The session owns the SPI link, both frame planes and the waveform table.
//! [`Ssd1680::init`] loads the waveform once per power cycle, after which every
//! [`Ssd1680::flip`] streams both planes and runs a fast update.
//!
//! # Examples
//! ```no_run
//! # #[cfg(feature = "linux")]
//! # fn main() -> anyhow::Result<()> {
//! # use ssd1680_epd::{config::SessionConfig, ssd1680::LinuxSsd1680};
//! # use ssd1680_epd_core::spi_interface::PinDefinition;
//! let mut epd = LinuxSsd1680::open(
//!     SessionConfig::default(),
//!     PinDefinition::DEFAULT,
//!     "/dev/spidev0.0",
//!     "/dev/gpiochip0",
//! )?;
//! epd.init()?;
//!
//! epd.fill_rect(0, 0, 127, 249, 0x00FFFF);
//! epd.fill_rect(10, 10, 40, 40, 0xFF0000);
//! epd.flip()?;
//!
//! // Nothing puts the panel to sleep on drop.
//! epd.deep_sleep()?;
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "linux"))]
//! # fn main() {}
//! ```

use std::{
    fmt::Debug,
    time::{Duration, Instant},
};

use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
    spi::SpiDevice,
};
use ssd1680_epd_core::{
    error::TimeOutError,
    spi_interface::{DelayStep, SpiInterface},
};

use crate::{
    cmd,
    config::{DisplayGeometry, SessionConfig},
    error::{ConfigurationError, Error},
    frame::FrameBuffers,
};

#[cfg(feature = "linux")]
pub use linux::LinuxSsd1680;

/// What the driver believes the controller is doing.
///
/// After a timeout the hardware may be elsewhere; only `reset` + `init`
/// brings the two back in line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Unpowered,
    Resetting,
    Configuring,
    Idle,
    Writing,
    Activating,
}

pub struct Ssd1680<Spi, I, O, D, E> {
    spi_interface: SpiInterface<Spi, I, O, D, E>,
    config: SessionConfig,
    frame: FrameBuffers,
    state: Ssd1680State,
}

impl<Spi, I, O, D, E> Debug for Ssd1680<Spi, I, O, D, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ssd1680")
            .field("geometry", self.frame.geometry())
            .field("waveform", &self.config.waveform)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<Spi, I, O, D, E> Ssd1680<Spi, I, O, D, E>
where
    Spi: SpiDevice,
    I: InputPin,
    O: OutputPin,
    D: DelayNs,
    E: From<Spi::Error> + From<I::Error> + From<O::Error> + From<TimeOutError> + From<Error>,
{
    /// Resolves the geometry and allocates both planes. No line is touched.
    pub fn new(
        spi_interface: SpiInterface<Spi, I, O, D, E>,
        config: SessionConfig,
    ) -> Result<Self, ConfigurationError> {
        let geometry = config.geometry.resolve()?;
        Ok(Self {
            spi_interface,
            config,
            frame: FrameBuffers::new(geometry)?,
            state: Ssd1680State {
                controller: ControllerState::Unpowered,
                lut_loaded: false,
                power_on: None,
            },
        })
    }

    pub fn state(&self) -> ControllerState {
        self.state.controller
    }

    pub fn geometry(&self) -> &DisplayGeometry {
        self.frame.geometry()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn frame(&self) -> &FrameBuffers {
        &self.frame
    }

    /// Draw target for `embedded-graphics` rasterizers.
    pub fn frame_mut(&mut self) -> &mut FrameBuffers {
        &mut self.frame
    }

    pub fn power_on_dur(&self) -> Option<Duration> {
        self.state.power_on.map(|i| i.elapsed())
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, color: u32) {
        self.frame.set_pixel(x, y, color);
    }

    pub fn fill_rect(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: u32) {
        self.frame.fill_rect(x0, y0, x1, y1, color);
    }

    pub fn power_on(&mut self) -> Result<(), E> {
        self.spi_interface.set_power(true)?;
        self.state.power_on = Some(Instant::now());
        Ok(())
    }

    pub fn power_off(&mut self) -> Result<(), E> {
        self.spi_interface.set_power(false)?;
        self.state.power_down();
        Ok(())
    }

    /// Hardware reset followed by a busy wait. `init` must run again afterwards.
    pub fn reset(&mut self) -> Result<(), E> {
        self.hw_reset()?;
        self.wait_busy()?;
        Ok(())
    }

    pub fn init(&mut self) -> Result<(), E> {
        let geometry = *self.frame.geometry();
        log::debug!("init {}x{}", geometry.width, geometry.height);

        if self.state.power_on.is_none() {
            self.power_on()?;
        }
        self.reset()?;

        self.spi_interface.command(cmd::SW_RESET)?;
        self.wait_busy()?;

        self.state.controller = ControllerState::Configuring;
        let [lines_lo, lines_hi] = geometry.gate_lines();
        self.command_data(
            cmd::DRIVER_OUTPUT_CONTROL,
            [lines_lo, lines_hi, cmd::GATE_SCAN_DEFAULT],
        )?;
        self.command_data(cmd::DATA_ENTRY_MODE, [cmd::DATA_ENTRY_INCRX_DECRY])?;

        let window = geometry.ram_window;
        self.command_data(cmd::SET_RAM_X_WINDOW, window.x_window())?;
        self.command_data(cmd::SET_RAM_Y_WINDOW, window.y_window())?;

        self.command_data(cmd::BORDER_WAVEFORM_CONTROL, [cmd::BORDER_WAVEFORM])?;
        self.command_data(cmd::TEMP_SENSOR_CONTROL, [cmd::INTERNAL_TEMP_SENSOR])?;
        self.command_data(cmd::DISPLAY_UPDATE_CONTROL_1, cmd::UPDATE_CONTROL_1_NORMAL)?;
        self.wait_busy()?;

        self.load_lut()?;
        self.state.controller = ControllerState::Idle;
        log::debug!("init over");
        Ok(())
    }

    /// Writes both planes to controller RAM and runs the fast update.
    pub fn flip(&mut self) -> Result<(), E> {
        self.check_initialized()?;

        self.state.controller = ControllerState::Writing;
        let window = self.frame.geometry().ram_window;
        self.command_data(cmd::SET_RAM_X_COUNTER, window.x_counter())?;
        self.command_data(cmd::SET_RAM_Y_COUNTER, window.y_counter())?;
        self.wait_busy()?;

        let chunk_size = self.config.chunk_size;
        self.spi_interface
            .command_data(cmd::WRITE_RAM_BW, self.frame.white(), chunk_size)?;
        self.spi_interface
            .command_data(cmd::WRITE_RAM_RED, self.frame.red(), chunk_size)?;

        self.state.controller = ControllerState::Activating;
        self.command_data(cmd::DISPLAY_UPDATE_CONTROL_2, [cmd::UPDATE_CONTROL_2_FAST])?;
        self.spi_interface.command(cmd::MASTER_ACTIVATION)?;
        let elapsed = self.wait_busy()?;

        self.state.controller = ControllerState::Idle;
        log::debug!("flip settled in {elapsed:?}");
        Ok(())
    }

    /// Sets every pixel to `color`, flips, then waits `post_clear_timeout_ms`.
    pub fn clear(&mut self, color: u32) -> Result<(), E> {
        self.frame.fill(color);
        self.flip()?;
        self.spi_interface
            .delay(DelayStep::Ms(self.config.post_clear_timeout_ms));
        Ok(())
    }

    /// Puts the controller into deep sleep mode 1 and cuts panel power.
    pub fn deep_sleep(&mut self) -> Result<(), E> {
        if self.state.controller == ControllerState::Unpowered {
            return Ok(());
        }
        self.command_data(cmd::DEEP_SLEEP_MODE, [cmd::DEEP_SLEEP_MODE_1])?;
        self.state.power_down();
        self.spi_interface.set_power(false)?;
        self.spi_interface.set_rst_pin(false)?;
        Ok(())
    }

    fn hw_reset(&mut self) -> Result<(), E> {
        let [low_ms, high_ms] = self.config.reset_pulse_ms;
        self.state.controller = ControllerState::Resetting;
        self.state.lut_loaded = false;

        self.spi_interface.set_cs(false)?;
        self.spi_interface.set_rst_pin(false)?;
        self.spi_interface.delay(DelayStep::Ms(low_ms));
        self.spi_interface.set_rst_pin(true)?;
        self.spi_interface.delay(DelayStep::Ms(high_ms));
        Ok(())
    }

    fn load_lut(&mut self) -> Result<(), E> {
        let waveform = self.config.waveform;
        self.command_data(cmd::WRITE_LUT, waveform)?;
        self.state.lut_loaded = true;
        log::debug!("loaded {waveform:?}");
        Ok(())
    }

    fn check_initialized(&self) -> Result<(), E> {
        if !self.state.lut_loaded {
            return Err(Error::NotInitialized(self.state.controller).into());
        }
        Ok(())
    }

    fn wait_busy(&mut self) -> Result<Duration, E> {
        self.spi_interface.wait_busy(self.config.busy)
    }

    fn command_data(&mut self, cmd: u8, data: impl AsRef<[u8]>) -> Result<(), E> {
        self.spi_interface
            .command_data(cmd, data, self.config.chunk_size)
    }
}

#[derive(Debug, Clone, Copy)]
struct Ssd1680State {
    controller: ControllerState,
    lut_loaded: bool,
    power_on: Option<Instant>,
}

impl Ssd1680State {
    fn power_down(&mut self) {
        self.controller = ControllerState::Unpowered;
        self.lut_loaded = false;
        self.power_on = None;
    }
}

#[cfg(feature = "linux")]
mod linux {
    use std::path::Path;

    use linux_embedded_hal::{
        gpio_cdev::{Chip, LineRequestFlags},
        spidev::{SpiModeFlags, SpidevOptions},
        CdevPin, Delay, SpidevDevice,
    };
    use ssd1680_epd_core::spi_interface::{PinDefinition, SpiInterface};

    use super::Ssd1680;
    use crate::config::SessionConfig;

    pub type LinuxSsd1680 = Ssd1680<SpidevDevice, CdevPin, CdevPin, Delay, anyhow::Error>;

    impl Ssd1680<SpidevDevice, CdevPin, CdevPin, Delay, anyhow::Error> {
        pub fn open(
            config: SessionConfig,
            pindefinition: PinDefinition,
            spi_path: impl AsRef<Path>,
            gpio_path: impl AsRef<Path>,
        ) -> Result<Self, anyhow::Error> {
            let mut spi = SpidevDevice::open(spi_path)?;
            spi.0.configure(
                &SpidevOptions::new()
                    .max_speed_hz(4_000_000)
                    .mode(SpiModeFlags::SPI_MODE_0)
                    .build(),
            )?;
            let mut chip = Chip::new(gpio_path)?;
            let mut output = |line: u32, flags: LineRequestFlags, label: &str| {
                anyhow::Ok(CdevPin::new(
                    chip.get_line(line)?
                        .request(LineRequestFlags::OUTPUT | flags, 0, label)?,
                )?)
            };
            let rst_pin = output(pindefinition.rst_pin, LineRequestFlags::empty(), "ssd1680_rst_pin")?;
            let dc_pin = output(pindefinition.dc_pin, LineRequestFlags::empty(), "ssd1680_dc_pin")?;
            let cs_pin = pindefinition
                .cs_pin
                .map(|line| output(line, LineRequestFlags::ACTIVE_LOW, "ssd1680_cs_pin"))
                .transpose()?;
            let pwr_pin = pindefinition
                .pwr_pin
                .map(|line| output(line, LineRequestFlags::empty(), "ssd1680_pwr_pin"))
                .transpose()?;
            let busy_pin = CdevPin::new(chip.get_line(pindefinition.busy_pin)?.request(
                LineRequestFlags::INPUT | LineRequestFlags::from_bits_retain(1 << 6),
                0,
                "ssd1680_busy_pin",
            )?)?;

            let spi_interface =
                SpiInterface::new(spi, rst_pin, dc_pin, cs_pin, busy_pin, pwr_pin, Delay);
            Ok(Self::new(spi_interface, config)?)
        }
    }
}
