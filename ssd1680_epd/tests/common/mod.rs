//! Recording stand-ins for the SPI device and control lines.

#![allow(dead_code)]

use std::{cell::RefCell, collections::VecDeque, convert::Infallible, rc::Rc};

use embedded_hal::{
    delay::DelayNs,
    digital::{self, InputPin, OutputPin},
    spi::{self, Operation, SpiDevice},
};
use ssd1680_epd::{ConfigurationError, Error, SessionConfig, Ssd1680};
use ssd1680_epd_core::spi_interface::SpiInterface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Rst,
    Dc,
    Cs,
    Pwr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Pin(Line, bool),
    Write(Vec<u8>),
    BusyRead(bool),
    DelayMs(u32),
}

/// Register traffic as the controller sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Command(u8, Vec<u8>),
    BusyWait,
}

#[derive(Default)]
struct BusyScript {
    pending: VecDeque<bool>,
    stuck: bool,
}

#[derive(Clone, Default)]
pub struct Bus {
    events: Rc<RefCell<Vec<Event>>>,
    busy: Rc<RefCell<BusyScript>>,
}

impl Bus {
    fn push(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }

    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    /// Busy level returned once the scripted reads run out.
    pub fn set_stuck(&self, stuck: bool) {
        self.busy.borrow_mut().stuck = stuck;
    }

    pub fn script_busy(&self, levels: impl IntoIterator<Item = bool>) {
        self.busy.borrow_mut().pending.extend(levels);
    }

    pub fn timeline(&self) -> Vec<Step> {
        timeline(&self.events())
    }
}

pub fn timeline(events: &[Event]) -> Vec<Step> {
    let mut steps = Vec::new();
    let mut data_mode = false;
    for event in events {
        match event {
            Event::Pin(Line::Dc, level) => data_mode = *level,
            Event::Write(bytes) if data_mode => match steps.last_mut() {
                Some(Step::Command(_, data)) => data.extend_from_slice(bytes),
                _ => panic!("data without a command: {bytes:02x?}"),
            },
            Event::Write(bytes) => {
                steps.extend(bytes.iter().map(|&cmd| Step::Command(cmd, Vec::new())))
            }
            Event::BusyRead(_) if steps.last() != Some(&Step::BusyWait) => {
                steps.push(Step::BusyWait)
            }
            _ => {}
        }
    }
    steps
}

pub fn commands(steps: &[Step]) -> Vec<u8> {
    steps
        .iter()
        .filter_map(|step| match step {
            Step::Command(cmd, _) => Some(*cmd),
            Step::BusyWait => None,
        })
        .collect()
}

pub fn payload(steps: &[Step], cmd: u8) -> Option<&[u8]> {
    steps.iter().find_map(|step| match step {
        Step::Command(c, data) if *c == cmd => Some(data.as_slice()),
        _ => None,
    })
}

pub struct FakeSpi(Bus);

impl spi::ErrorType for FakeSpi {
    type Error = Infallible;
}

impl SpiDevice for FakeSpi {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Infallible> {
        for operation in operations {
            if let Operation::Write(bytes) = operation {
                self.0.push(Event::Write(bytes.to_vec()));
            }
        }
        Ok(())
    }
}

pub struct FakePin(Line, Bus);

impl digital::ErrorType for FakePin {
    type Error = Infallible;
}

impl OutputPin for FakePin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.1.push(Event::Pin(self.0, false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.1.push(Event::Pin(self.0, true));
        Ok(())
    }
}

pub struct FakeBusy(Bus);

impl digital::ErrorType for FakeBusy {
    type Error = Infallible;
}

impl InputPin for FakeBusy {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        let level = {
            let mut script = self.0.busy.borrow_mut();
            let stuck = script.stuck;
            script.pending.pop_front().unwrap_or(stuck)
        };
        self.0.push(Event::BusyRead(level));
        Ok(level)
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.is_high()?)
    }
}

pub struct FakeDelay(Bus);

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, _ns: u32) {}

    fn delay_ms(&mut self, ms: u32) {
        self.0.push(Event::DelayMs(ms));
    }
}

pub type TestEpd = Ssd1680<FakeSpi, FakeBusy, FakePin, FakeDelay, Error>;

pub fn try_session(config: SessionConfig) -> (Result<TestEpd, ConfigurationError>, Bus) {
    let bus = Bus::default();
    let spi_interface = SpiInterface::new(
        FakeSpi(bus.clone()),
        FakePin(Line::Rst, bus.clone()),
        FakePin(Line::Dc, bus.clone()),
        Some(FakePin(Line::Cs, bus.clone())),
        FakeBusy(bus.clone()),
        Some(FakePin(Line::Pwr, bus.clone())),
        FakeDelay(bus.clone()),
    );
    (Ssd1680::new(spi_interface, config), bus)
}

pub fn session(config: SessionConfig) -> (TestEpd, Bus) {
    let (epd, bus) = try_session(config);
    (epd.expect("valid test configuration"), bus)
}

pub fn initialized(config: SessionConfig) -> (TestEpd, Bus) {
    let (mut epd, bus) = session(config);
    epd.init().expect("init with an idle busy line");
    bus.take();
    (epd, bus)
}
