//! Real-time cardiac signal streaming for live demos and soak tests

use crate::cardiac::{CardiacConfig, CardiacSimulator, SensorFrame};
use bp_core::BpResult;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, Duration, Instant};

/// Configuration for real-time streaming
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Cardiac simulation configuration
    pub cardiac: CardiacConfig,
    /// Chunk duration in milliseconds
    pub chunk_ms: u64,
    /// Broadcast buffer size (number of chunks to keep)
    pub buffer_size: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            cardiac: CardiacConfig::default(),
            chunk_ms: 100,
            buffer_size: 50,
        }
    }
}

/// Commands for controlling the stream
#[derive(Debug, Clone)]
pub enum StreamCommand {
    Start,
    Stop,
    Pause,
    Resume,
    UpdateConfig(StreamConfig),
    SetHeartRate(f32),
    SetTransitTime(u64),
}

/// Stream statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamStats {
    pub is_running: bool,
    pub chunks_generated: u64,
    pub total_duration_ms: u64,
    pub average_chunk_time: f32,
}

/// Real-time cardiac signal stream.
///
/// Generates signal chunks on a timer and fans them out over a broadcast
/// channel; a command channel controls the generator while it runs.
pub struct RealTimeCardiacStream {
    config: StreamConfig,
    simulator: Arc<Mutex<CardiacSimulator>>,
    data_sender: broadcast::Sender<Vec<SensorFrame>>,
    control_receiver: mpsc::Receiver<StreamCommand>,
    control_sender: mpsc::Sender<StreamCommand>,
    is_running: Arc<Mutex<bool>>,
}

impl RealTimeCardiacStream {
    /// Create a new stream with a validated configuration.
    pub fn new(config: StreamConfig) -> BpResult<Self> {
        let simulator = CardiacSimulator::new(config.cardiac.clone())?;
        let (data_sender, _) = broadcast::channel(config.buffer_size);
        let (control_sender, control_receiver) = mpsc::channel(32);

        Ok(Self {
            config,
            simulator: Arc::new(Mutex::new(simulator)),
            data_sender,
            control_receiver,
            control_sender,
            is_running: Arc::new(Mutex::new(false)),
        })
    }

    /// Get a receiver for generated chunks.
    pub fn subscribe(&self) -> broadcast::Receiver<Vec<SensorFrame>> {
        self.data_sender.subscribe()
    }

    /// Get a handle for sending control commands.
    pub fn control_handle(&self) -> mpsc::Sender<StreamCommand> {
        self.control_sender.clone()
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub async fn is_running(&self) -> bool {
        *self.is_running.lock().await
    }

    /// Run the streaming loop until the control channel closes.
    pub async fn run(&mut self) -> BpResult<()> {
        let mut interval_timer = interval(Duration::from_millis(self.config.chunk_ms));
        let mut stats = StreamStats {
            is_running: false,
            chunks_generated: 0,
            total_duration_ms: 0,
            average_chunk_time: 0.0,
        };

        println!(
            "Cardiac stream ready - chunk: {}ms, heart rate: {:.0} bpm",
            self.config.chunk_ms, self.config.cardiac.heart_rate_bpm
        );

        loop {
            tokio::select! {
                _ = interval_timer.tick() => {
                    let is_running = *self.is_running.lock().await;
                    if is_running {
                        let start_time = Instant::now();
                        let chunk = {
                            let mut sim = self.simulator.lock().await;
                            sim.generate_chunk(self.config.chunk_ms)
                        };

                        stats.chunks_generated += 1;
                        stats.total_duration_ms += self.config.chunk_ms;
                        stats.average_chunk_time = start_time.elapsed().as_secs_f32();

                        // Ignore the error when nobody is subscribed
                        let _ = self.data_sender.send(chunk);
                    }
                }

                command = self.control_receiver.recv() => {
                    match command {
                        Some(StreamCommand::Start) | Some(StreamCommand::Resume) => {
                            *self.is_running.lock().await = true;
                            stats.is_running = true;
                        }
                        Some(StreamCommand::Pause) => {
                            *self.is_running.lock().await = false;
                            stats.is_running = false;
                        }
                        Some(StreamCommand::Stop) => {
                            *self.is_running.lock().await = false;
                            stats.is_running = false;
                            stats.chunks_generated = 0;
                            stats.total_duration_ms = 0;
                            self.simulator.lock().await.reset_time();
                        }
                        Some(StreamCommand::UpdateConfig(new_config)) => {
                            self.simulator
                                .lock()
                                .await
                                .update_config(new_config.cardiac.clone())?;
                            interval_timer = interval(Duration::from_millis(new_config.chunk_ms));
                            self.config = new_config;
                        }
                        Some(StreamCommand::SetHeartRate(bpm)) => {
                            let mut cardiac = self.config.cardiac.clone();
                            cardiac.heart_rate_bpm = bpm;
                            self.simulator.lock().await.update_config(cardiac.clone())?;
                            self.config.cardiac = cardiac;
                        }
                        Some(StreamCommand::SetTransitTime(ptt_ms)) => {
                            let mut cardiac = self.config.cardiac.clone();
                            cardiac.ptt_ms = ptt_ms;
                            self.simulator.lock().await.update_config(cardiac.clone())?;
                            self.config.cardiac = cardiac;
                        }
                        None => break,
                    }
                }
            }
        }

        Ok(())
    }
}

/// Create a stream and run it as a background task, returning the data
/// and control handles.
pub async fn start_cardiac_stream(
    config: StreamConfig,
) -> BpResult<(
    broadcast::Receiver<Vec<SensorFrame>>,
    mpsc::Sender<StreamCommand>,
)> {
    let mut stream = RealTimeCardiacStream::new(config)?;
    let data_receiver = stream.subscribe();
    let control_sender = stream.control_handle();

    tokio::spawn(async move {
        if let Err(e) = stream.run().await {
            eprintln!("Cardiac stream error: {}", e);
        }
    });

    Ok((data_receiver, control_sender))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{sleep, Duration};

    #[tokio::test]
    async fn test_stream_delivers_chunks() {
        let config = StreamConfig {
            chunk_ms: 50,
            ..Default::default()
        };
        let (mut data_receiver, control_sender) = start_cardiac_stream(config).await.unwrap();

        control_sender.send(StreamCommand::Start).await.unwrap();
        sleep(Duration::from_millis(300)).await;

        let mut chunk_count = 0;
        while let Ok(chunk) = data_receiver.try_recv() {
            // 50 ms at 100 Hz is 5 frames per chunk
            assert_eq!(chunk.len(), 5);
            chunk_count += 1;
            if chunk_count >= 3 {
                break;
            }
        }
        assert!(chunk_count >= 3, "expected at least 3 chunks");

        control_sender.send(StreamCommand::Stop).await.unwrap();
    }

    #[tokio::test]
    async fn test_pause_halts_generation() {
        let config = StreamConfig {
            chunk_ms: 20,
            ..Default::default()
        };
        let (mut data_receiver, control_sender) = start_cardiac_stream(config).await.unwrap();

        control_sender.send(StreamCommand::Start).await.unwrap();
        sleep(Duration::from_millis(100)).await;
        control_sender.send(StreamCommand::Pause).await.unwrap();
        sleep(Duration::from_millis(50)).await;

        // Drain everything produced before the pause settled.
        while data_receiver.try_recv().is_ok() {}
        sleep(Duration::from_millis(100)).await;
        assert!(data_receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_heart_rate_update_applies() {
        let (data_receiver, control_sender) =
            start_cardiac_stream(StreamConfig::default()).await.unwrap();
        drop(data_receiver);

        control_sender
            .send(StreamCommand::SetHeartRate(90.0))
            .await
            .unwrap();
        control_sender.send(StreamCommand::Stop).await.unwrap();
    }
}
