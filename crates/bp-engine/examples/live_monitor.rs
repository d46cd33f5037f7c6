//! Live monitoring example
//!
//! Streams simulated cardiac signals into the estimator, calibrates it
//! against two synthetic cuff references and prints readings once per
//! second. Run with `cargo run --example live_monitor`.

use anyhow::Result;
use bp_engine::{BloodPressureEstimator, EngineConfig};
use bp_simulation::{start_cardiac_stream, StreamCommand, StreamConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let engine = BloodPressureEstimator::new(EngineConfig::default())?;
    engine.set_personal_parameters(45, 175.0, true);

    let mut stream_config = StreamConfig::default();
    stream_config.cardiac.seed = Some(42);
    let (mut frames, control) = start_cardiac_stream(stream_config).await?;
    control.send(StreamCommand::Start).await?;

    println!("Acquiring signal...");
    let mut last_report_ms = 0u64;
    let mut calibrated = false;

    loop {
        let chunk = frames.recv().await?;
        for frame in &chunk {
            engine.add_ecg_sample(frame.ecg, frame.timestamp_ms);
            engine.add_ppg_sample(frame.ppg_ir, frame.ppg_red, frame.timestamp_ms);
        }

        let now = match chunk.last() {
            Some(frame) => frame.timestamp_ms,
            None => continue,
        };

        // Two cuff references at different transit times give the engine a
        // personalized fit. A real deployment would take these from an
        // actual cuff; the demo fakes them once the signal settles.
        if !calibrated && now > 15_000 && engine.is_ready_for_measurement() {
            engine.add_calibration_point(122.0, 81.0)?;
            control.send(StreamCommand::SetTransitTime(250)).await?;
            calibrated = true;
            println!("First calibration point stored, shifting transit time...");
        }
        if engine.calibration_count() == 1 && now > 30_000 {
            engine.add_calibration_point(112.0, 76.0)?;
            println!("Second calibration point stored, model fitted.");
        }

        if now >= last_report_ms + 1000 {
            last_report_ms = now;
            let reading = engine.calculate_blood_pressure();
            if reading.valid {
                println!(
                    "[{:>6} ms] {:.0}/{:.0} mmHg ({}) | HR {:.0} bpm | PTT {:.0} ms | quality {:.0}%",
                    reading.timestamp_ms,
                    reading.systolic,
                    reading.diastolic,
                    reading.category(),
                    reading.heart_rate,
                    reading.pulse_transit_time,
                    reading.signal_quality,
                );
            } else {
                println!("[{:>6} ms] {}", reading.timestamp_ms, engine.system_status());
            }
        }

        if now > 60_000 {
            control.send(StreamCommand::Stop).await?;
            break;
        }
    }

    println!("Done.");
    Ok(())
}
