//! Example: Classify files and show their iCloud state
//!
//! Run with: cargo run -p icloud --example status -- [paths...]

use icloud::Client;

fn main() -> icloud::Result<()> {
    let client = Client::new()?;
    println!("iCloud Drive: {}", client.cloud_root().display());

    for arg in std::env::args().skip(1) {
        match client.status(&arg) {
            Ok(status) => {
                println!("{}", status.path.display());
                println!("  cloud:       {}", status.is_cloud_file);
                println!("  downloaded:  {}", status.is_downloaded);
                println!("  placeholder: {}", status.is_placeholder);
                println!("  downloading: {}", status.is_downloading);
                println!("  size:        {} bytes", status.size);
            }
            Err(e) => println!("{arg}: {e}"),
        }
    }

    Ok(())
}
