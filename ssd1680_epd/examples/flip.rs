use std::{thread::sleep, time::Duration};

use embedded_graphics::{
    pixelcolor::Rgb888,
    prelude::*,
    primitives::{Circle, Line, PrimitiveStyle, Rectangle, StyledDrawable},
};
use ssd1680_epd::{config::SessionConfig, ssd1680::LinuxSsd1680, GeometryProfile};
use ssd1680_epd_core::spi_interface::PinDefinition;

fn main() -> anyhow::Result<()> {
    let profile = std::env::args()
        .nth(1)
        .map(|name| name.parse::<GeometryProfile>())
        .transpose()?
        .unwrap_or_default();

    let mut epd = LinuxSsd1680::open(
        SessionConfig::new(profile),
        PinDefinition::DEFAULT_WITH_CS,
        "/dev/spidev0.0",
        "/dev/gpiochip0",
    )?;
    epd.init()?;
    epd.clear(0xFFFFFF)?;

    {
        let frame = epd.frame_mut();
        let black = PrimitiveStyle::with_stroke(Rgb888::BLACK, 3);
        let red = PrimitiveStyle::with_fill(Rgb888::RED);
        let size = frame.size();

        frame.bounding_box().draw_styled(&black, frame)?;
        Line::new(Point::zero(), Point::new(size.width as i32 - 1, size.height as i32 - 1))
            .draw_styled(&black, frame)?;
        Circle::with_center(frame.bounding_box().center(), size.width / 2)
            .draw_styled(&red, frame)?;
        Rectangle::new(Point::new(8, 8), Size::new(24, 12)).draw_styled(&red, frame)?;
    }
    epd.flip()?;

    sleep(Duration::from_secs(3));

    epd.fill_rect(0, 0, 40, 40, 0xFF0000);
    epd.flip()?;
    epd.deep_sleep()?;
    Ok(())
}
