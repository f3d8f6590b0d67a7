//! Demo: scan the motor through a range of positions.

use simple_logger::SimpleLogger;
use std::{thread, time::Duration};
use xenax::{error::XenaxError, Xenax};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Enable logging
    SimpleLogger::new().init().unwrap();

    let mut rail = Xenax::open_options()
        .limit_left(0)
        .limit_right(200_000)
        .speed(500_000)
        .acceleration(2_000_000)
        .read_timeout(Some(Duration::from_secs(2)))
        .open("192.168.2.100")?;
    rail.connect()?;

    // Step across the travel range, then return to the middle.
    for position in (0..=200_000).step_by(25_000) {
        rail.set_position(position)?;
        thread::sleep(Duration::from_millis(500));
        println!("{position}: {}", rail.get_position()?);
    }
    if let Some(center) = rail.center_position() {
        rail.set_position(center)?;
    }

    // Moves outside the limits are refused without reaching the controller.
    match rail.set_position(250_000) {
        Err(XenaxError::PositionOutOfLimits(e)) => println!("refused: {e}"),
        other => println!("unexpected: {other:?}"),
    }

    rail.disconnect()?;
    Ok(())
}
