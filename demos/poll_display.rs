use vc8145::{Device, RenderOptions};

#[tokio::main(flavor = "current_thread")]
async fn main() -> vc8145::Result<()> {
    let path = "/dev/ttyUSB0".to_string();
    let mut device = Device::open(&path)?;

    for _ in 0..10 {
        match device.poll(RenderOptions::full()).await {
            Ok(rendered) => {
                println!("Value: {}", rendered);
                for diagnostic in rendered.diagnostics {
                    eprintln!("Warning: {}", diagnostic);
                }
            }
            // Per-cycle errors are not fatal, the next poll may succeed.
            Err(err) if !err.is_fatal() => eprintln!("NO_DATA: {}", err),
            Err(err) => return Err(err),
        }
        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
    }

    device.close();
    Ok(())
}
