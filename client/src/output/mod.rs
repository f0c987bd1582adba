//! Output and display management

use anyhow::Result;
use chrono::{DateTime, Local};
use crossterm::{
    cursor::MoveToColumn,
    queue,
    style::Print,
    terminal::{Clear, ClearType},
};
use speedhub_core::{DashboardState, Phase, SequencerSnapshot};
use std::fmt::Write as _;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

pub struct OutputManager {
    format: OutputFormat,
}

impl OutputManager {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Redraw the progress line while a test runs
    pub fn progress(&self, snapshot: &SequencerSnapshot) -> Result<()> {
        if self.format != OutputFormat::Human {
            return Ok(());
        }

        let mut stdout = std::io::stdout();
        queue!(
            stdout,
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(progress_line(snapshot))
        )?;
        if snapshot.phase == Phase::Done || snapshot.phase == Phase::Idle {
            queue!(stdout, Print("\n"))?;
        }
        stdout.flush()?;

        Ok(())
    }

    pub fn finish(&self, state: &DashboardState) -> Result<()> {
        match self.format {
            OutputFormat::Human => print!("{}", render_dashboard(state, Local::now())),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(state)?),
        }
        Ok(())
    }
}

const BAR_WIDTH: usize = 30;

pub fn progress_line(snapshot: &SequencerSnapshot) -> String {
    let progress = usize::from(snapshot.result.progress.min(100));
    let filled = progress * BAR_WIDTH / 100;
    format!(
        "[{}{}] {:>3}% {} | down {:.1} Mbps | up {:.1} Mbps",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        progress,
        snapshot.phase.label(),
        snapshot.result.download,
        snapshot.result.upload,
    )
}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n== {} ==", title);
}

pub fn render_dashboard(state: &DashboardState, now: DateTime<Local>) -> String {
    let mut out = String::new();
    let result = &state.speed_test.result;
    let weather = &state.weather;
    let network = &state.network;
    let usage = &state.usage;

    let _ = writeln!(out, "SpeedTest Pro{:>40}", now.format("%H:%M:%S"));

    section(&mut out, "Internet Speed Test");
    let _ = writeln!(out, "  Download  {:>8.1} Mbps", result.download);
    let _ = writeln!(out, "  Upload    {:>8.1} Mbps", result.upload);
    let _ = writeln!(out, "  Latency   {:>8.0} ms", result.latency);
    let _ = writeln!(out, "  Jitter    {:>8.1} ms", result.jitter);
    let _ = writeln!(
        out,
        "  {} | {} | {}",
        state.location.label(),
        network.isp,
        network.ip_version_label()
    );

    section(&mut out, "Current Weather");
    let _ = writeln!(
        out,
        "  {}°C {} (feels like {}°C)",
        weather.temperature, weather.condition, weather.feels_like
    );
    let _ = writeln!(out, "  {}", weather.location);
    let _ = writeln!(
        out,
        "  Humidity {}%   Wind {} km/h",
        weather.humidity, weather.wind_speed
    );

    section(&mut out, "5-Day Forecast");
    for day in &weather.forecast {
        let _ = writeln!(
            out,
            "  {:<10} {:>3}° / {:>3}°  {}",
            day.day, day.high, day.low, day.condition
        );
    }

    section(&mut out, "Network Diagnostics");
    let _ = writeln!(out, "  Connection Type     {}", network.connection_type);
    let _ = writeln!(out, "  ISP                 {}", network.isp);
    let _ = writeln!(out, "  IP Address          {}", network.ip_address);
    let _ = writeln!(out, "  DNS Server          {}", network.dns_server);
    let _ = writeln!(out, "  Packet Loss         {}%", network.packet_loss_pct);
    let _ = writeln!(out, "  MTU Size            {}", network.mtu);
    let _ = writeln!(out, "  Connection Quality  {}", network.quality);
    let _ = writeln!(out, "  Server Distance     {} km", network.server_distance_km);

    section(&mut out, "Ping Test Results");
    for sample in &state.ping {
        let _ = writeln!(out, "  {:<14} {:>3}ms", sample.host, sample.latency_ms);
    }

    section(&mut out, "Data Usage Monitor");
    let _ = writeln!(
        out,
        "  Today's Usage   {:>5.1} GB ({}% of daily limit)",
        usage.today_gb, usage.today_limit_pct
    );
    let _ = writeln!(
        out,
        "  Monthly Usage   {:>5.1} GB ({}% of monthly limit)",
        usage.monthly_gb, usage.monthly_limit_pct
    );
    let _ = writeln!(
        out,
        "  Downloaded {:.1} GB | Uploaded {:.1} GB | Sessions {} | Online Time {}h",
        usage.downloaded_gb, usage.uploaded_gb, usage.sessions, usage.online_hours
    );

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use speedhub_core::{MeasurementResult, NetworkInfo, PingSample};

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_progress_line() {
        let snapshot = SequencerSnapshot {
            phase: Phase::Download,
            result: MeasurementResult {
                download: 125.0,
                progress: 40,
                ..MeasurementResult::default()
            },
        };
        let line = progress_line(&snapshot);
        assert!(line.starts_with("[############------------------]  40%"));
        assert!(line.contains("Testing download"));
        assert!(line.contains("down 125.0 Mbps"));
    }

    #[test]
    fn test_render_default_dashboard() {
        let text = render_dashboard(&DashboardState::default(), fixed_time());

        assert!(text.contains("09:30:00"));
        assert!(text.contains("Karachi, Pakistan"));
        assert!(text.contains("28°C Cloudy (feels like 30°C)"));
        assert!(text.contains("Wednesday"));
        assert!(text.contains("IP Address          N/A"));
        assert!(text.contains("45.2 GB (75% of monthly limit)"));
    }

    #[test]
    fn test_render_resolved_network() {
        let state = DashboardState {
            network: NetworkInfo::resolved("XYZ", "1.2.3.4"),
            ping: vec![PingSample {
                host: "Cloudflare".to_string(),
                latency_ms: 15,
            }],
            ..DashboardState::default()
        };
        let text = render_dashboard(&state, fixed_time());

        assert!(text.contains("Karachi, PK | XYZ | IPv4 Connected"));
        assert!(text.contains("Cloudflare      15ms"));
    }
}
