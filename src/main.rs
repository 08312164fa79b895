mod bars;
mod charts;
mod indicators;
mod logging;
mod report;
mod screener;

use chrono::{Days, Local};
use report::{HIGH_POTENTIAL_LABEL, ScreenReport};
use std::path::PathBuf;
use std::time::Instant;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let started = Instant::now();

    // Trailing year of sessions; end runs one day ahead so the current
    // session is included.
    let today = Local::now().date_naive();
    let start = today - Days::new(365);
    let end = today + Days::new(1);

    let universe = bars::klse_universe();

    // Step 1: Fetch Daily Bars
    println!("\n--- Step 1: Fetching Daily Bars ---");
    let all_series = bars::fetch_universe(&universe, start, end).await?;
    println!(
        "Fetched series for {} of {} symbols",
        all_series.len(),
        universe.len()
    );

    // Step 2: Screen the Universe
    println!("\n--- Step 2: Screening ---");
    let mut report = ScreenReport::new();
    for symbol in &universe {
        let Some(series) = all_series.get(symbol) else {
            continue;
        };
        match screener::evaluate(series) {
            Some(classification) => report.add(symbol, classification),
            None => tracing::debug!(symbol, "excluded from all buckets"),
        }
    }

    println!(
        "\nTime elapsed: {:.2} seconds",
        started.elapsed().as_secs_f64()
    );
    report.print_summary();

    // Step 3: Render Charts
    println!("\n--- Step 3: Rendering Charts ---");
    let run_dir = PathBuf::from(today.format("%Y-%m-%d").to_string());
    let chart_buckets = [(HIGH_POTENTIAL_LABEL, report.high_potential())];
    for (label, symbols) in chart_buckets {
        let rendered = charts::render_bucket(&run_dir, label, symbols, &all_series)?;
        println!(
            "{label}: {rendered} charts written to {}",
            run_dir.join(label).display()
        );
    }

    Ok(())
}
