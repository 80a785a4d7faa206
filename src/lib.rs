//!
//! This library provides communication with a Victor VC8145 bench digital multimeter.
//!
//! <br>
//!
//! # Details
//!
//! - The meter is attached through its RS-232 port (or an USB adapter).
//!
//! - The meter answers a single request byte with a 12 byte snapshot of its
//!   display. [`Device::poll`] performs one such exchange and renders the
//!   display as text.
//!
//! - Basic setup and polling
//!
//!   ```no_run
//!   use vc8145::{Device, RenderOptions};
//!   #[tokio::main(flavor = "current_thread")]
//!   async fn main() -> vc8145::Result<()> {
//!       let mut device = Device::open("/dev/ttyUSB0")?;
//!       println!("{}", device.poll(RenderOptions::full()).await?);
//!       device.close();
//!       Ok(())
//!   }
//!   ```
//!
//! # Supported devices
//!
//!  * Victor VC8145
//!

pub mod device;
pub mod proto;
pub mod rawframe;
pub mod reading;
pub mod schedule;

pub use device::Device;
pub use proto::{ProtoError, Result};
pub use reading::{Diagnostic, Reading, RenderOptions, Rendered};

/// Fixed baudrate of the VC8145.
pub const BAUDRATE: u32 = 9600;
