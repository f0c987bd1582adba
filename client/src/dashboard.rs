//! Dashboard orchestration
//!
//! Starts the speed test, the data pipeline and the ping check together on
//! the current thread and collects their results into one `DashboardState`.

use crate::output::OutputManager;
use speedhub_core::{
    CacheStore, DashboardState, DataPipeline, LocationSource, Sequencer, SequencerError,
    SequencerSnapshot, WeatherSource, simulate_ping_for_hosts,
};
use tokio::sync::watch;
use tracing::{info, warn};

pub struct Dashboard<'a, L, W, S: CacheStore> {
    pipeline: &'a DataPipeline<L, W, S>,
    sequencer: &'a Sequencer,
    output: &'a OutputManager,
}

impl<'a, L, W, S> Dashboard<'a, L, W, S>
where
    L: LocationSource,
    W: WeatherSource,
    S: CacheStore,
{
    pub fn new(
        pipeline: &'a DataPipeline<L, W, S>,
        sequencer: &'a Sequencer,
        output: &'a OutputManager,
    ) -> Self {
        Self {
            pipeline,
            sequencer,
            output,
        }
    }

    pub async fn run(&self, run_speed_test: bool) -> DashboardState {
        let mut state = DashboardState::default();

        let speed_test = async {
            if run_speed_test {
                self.speed_test().await;
            }
        };
        let ping = async { simulate_ping_for_hosts() };

        let (_, _, ping) = tokio::join!(
            self.pipeline.resolve_location_and_weather(&mut state),
            speed_test,
            ping,
        );

        state.ping = ping;
        state.speed_test = self.sequencer.snapshot();
        state
    }

    async fn speed_test(&self) {
        // Subscribe before the run so its first snapshot is drawn too
        let rx = self.sequencer.subscribe();

        let run = async {
            tokio::select! {
                result = self.sequencer.run_measurement() => result,
                _ = interrupted(tokio::signal::ctrl_c()) => {
                    info!("Interrupted, stopping speed test");
                    Err(SequencerError::Cancelled)
                }
            }
        };

        let (result, _) = tokio::join!(run, self.watch_progress(rx));

        if let Err(e) = result {
            warn!("Speed test did not complete: {}", e);
        }
    }

    async fn watch_progress(&self, rx: watch::Receiver<SequencerSnapshot>) {
        follow_progress(rx, |snapshot| {
            if let Err(e) = self.output.progress(snapshot) {
                warn!("Failed to draw progress: {}", e);
            }
        })
        .await;
    }
}

/// Hand every published snapshot to `draw` until the run stops
async fn follow_progress<F>(mut rx: watch::Receiver<SequencerSnapshot>, mut draw: F)
where
    F: FnMut(&SequencerSnapshot),
{
    while rx.changed().await.is_ok() {
        let snapshot = *rx.borrow_and_update();
        draw(&snapshot);
        if !snapshot.phase.is_running() {
            break;
        }
    }
}

/// Resolves when `signal` does. Never resolves if the handler failed to install.
async fn interrupted<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        warn!("Cannot listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use async_trait::async_trait;
    use speedhub_core::{
        FetchError, IpLookup, MemoryStore, OneCallResponse, Phase, TtlCache,
    };
    use std::time::Duration;

    struct Offline;

    #[async_trait]
    impl LocationSource for Offline {
        async fn lookup(&self) -> Result<IpLookup, FetchError> {
            Err(FetchError::Transport("network unreachable".to_string()))
        }
    }

    #[async_trait]
    impl WeatherSource for Offline {
        async fn one_call(&self, _: f64, _: f64) -> Result<OneCallResponse, FetchError> {
            Err(FetchError::Transport("network unreachable".to_string()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_offline_dashboard_still_renders() {
        let pipeline = DataPipeline::new(Offline, Offline, TtlCache::new(MemoryStore::new()));
        let sequencer = Sequencer::new(Duration::from_secs(1));
        let output = OutputManager::new(OutputFormat::Json);

        let state = Dashboard::new(&pipeline, &sequencer, &output).run(true).await;

        assert_eq!(state.speed_test.phase, Phase::Done);
        assert_eq!(state.speed_test.result.progress, 100);
        assert!((150.0..=300.0).contains(&state.speed_test.result.download));
        assert!((50.0..=150.0).contains(&state.speed_test.result.upload));
        assert_eq!(state.ping.len(), 3);
        assert_eq!(state.location.city, "Karachi");
        assert_eq!(state.network.isp, "N/A");
        assert_eq!(state.weather.location, "Karachi, Pakistan");
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_starts_at_step_zero() {
        let sequencer = Sequencer::new(Duration::from_secs(1));
        let rx = sequencer.subscribe();

        let mut seen = Vec::new();
        let (result, _) = tokio::join!(
            sequencer.run_measurement(),
            follow_progress(rx, |s| seen.push((s.phase, s.result.progress)))
        );

        assert!(result.is_ok());
        assert_eq!(seen.first(), Some(&(Phase::Latency, 0)));
        assert_eq!(seen.last(), Some(&(Phase::Done, 100)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_signal_failure_is_not_an_interrupt() {
        let failed = async { Err(std::io::Error::other("no signal handler")) };
        let waited = tokio::time::timeout(Duration::from_secs(60), interrupted(failed)).await;
        assert!(waited.is_err());

        let received = async { Ok(()) };
        let waited = tokio::time::timeout(Duration::from_secs(60), interrupted(received)).await;
        assert!(waited.is_ok());
    }

    #[tokio::test]
    async fn test_skip_speed_test() {
        let pipeline = DataPipeline::new(Offline, Offline, TtlCache::new(MemoryStore::new()));
        let sequencer = Sequencer::default();
        let output = OutputManager::new(OutputFormat::Json);

        let state = Dashboard::new(&pipeline, &sequencer, &output).run(false).await;

        assert_eq!(state.speed_test.phase, Phase::Idle);
        assert_eq!(state.speed_test.result.progress, 0);
        assert_eq!(state.ping.len(), 3);
    }
}
