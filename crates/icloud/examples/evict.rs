//! Example: Evict a file, or every downloaded file under a folder
//!
//! Run with: cargo run -p icloud --example evict -- <path>

use icloud::Client;
use std::env;

fn main() -> icloud::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <file-or-folder>", args[0]);
        std::process::exit(1);
    }

    let client = Client::new()?;
    let target = std::path::Path::new(&args[1]);

    let paths: Vec<_> = if target.is_dir() {
        let scan = client.find_downloaded(target, &[])?;
        println!(
            "Found {} downloaded iCloud files ({} bytes)",
            scan.downloaded.len(),
            scan.downloaded_bytes()
        );
        scan.downloaded.into_iter().map(|s| s.path).collect()
    } else {
        vec![target.to_path_buf()]
    };

    let batch = client.evict_all(&paths, |_, batch| {
        if let Some(report) = batch.reports.last() {
            println!("{:?}: {} ({})", report.outcome, report.path.display(), report.message);
        }
    });

    println!(
        "\n{} evicted, {} failed, {} skipped, {} bytes freed",
        batch.succeeded, batch.failed, batch.skipped, batch.bytes
    );
    for (path, error) in &batch.errors {
        println!("  {}: {}", path.display(), error);
    }

    Ok(())
}
