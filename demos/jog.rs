//! Demo: jog the motor back and forth.

use simple_logger::SimpleLogger;
use std::{thread, time::Duration};
use xenax::Xenax;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Enable logging
    SimpleLogger::new().init().unwrap();

    // Connect, which powers on and homes the rail.
    let mut rail = Xenax::new("192.168.2.100");
    rail.connect()?;

    // Jog forwards for a second, watching the position, then come back.
    rail.set_speed(20_000)?;
    rail.jog_positive()?;
    for _ in 0..10 {
        thread::sleep(Duration::from_millis(100));
        println!("{}", rail.get_position()?);
    }
    rail.jog_negative()?;
    thread::sleep(Duration::from_secs(1));

    // Powers off the motor before closing the connection.
    rail.disconnect()?;
    Ok(())
}
