//! Replays a frame dump through the fall monitor.
//!
//! Usage: `replay <frames.jsonl> [config.json]`, one JSON `Frame` per line.

use std::io::BufRead;

use fallwatch::sink::LogSink;
use fallwatch::{FallMonitor, Frame, MonitorConfig, Monitoring};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let in_file_name = args.next().ok_or("expected frames file name")?;

    let config = match args.next() {
        Some(path) => MonitorConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => MonitorConfig::default(),
    };

    let mut monitor = FallMonitor::new(config, LogSink)?;
    let reader = std::io::BufReader::new(std::fs::File::open(&in_file_name)?);

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let frame: Frame = match serde_json::from_str(&line) {
            Ok(frame) => frame,
            Err(err) => {
                eprintln!("line {}: wrong frame format: {}", line_no + 1, err);
                continue;
            }
        };

        let report = monitor.update(&frame, &in_file_name)?;
        let fallen: Vec<_> = report.fallen.keys().collect();

        println!(
            "frame {:>6}  subjects {:>3}  fallen {:?}  fall count {}",
            report.frame_index,
            report.subjects.len(),
            fallen,
            report.fall_count
        );
    }

    println!("total falls: {}", monitor.fall_count(&in_file_name));

    Ok(())
}
