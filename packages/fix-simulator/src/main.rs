//! main.rs — fix-sim entry point
//!
//! Wires a synthetic walker to the Trailwatch engine and runs the reactive
//! cycle end to end without hardware:
//!   1. Walker loop: advances the true position at update_rate_hz
//!   2. Provider: delivers noisy fixes while continuous updates are on,
//!      and synthesizes region entry/exit events while they are off
//!   3. Engine: plants checkpoint rings, reacts to crossings, notifies
//!
//! Fault scenarios (signal loss, missing course, no geofencing, empty
//! fixes, foreground hold) are toggleable via config.toml or `--scenario`.

mod scenarios;
mod sim_provider;
mod walker;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tokio::time::interval;
use tracing::{debug, info, warn};
use trailwatch_engine::{EngineConfig, TrackerEngine};

use scenarios::{ScenarioConfig, ScenarioType};
use sim_provider::{LogNotifier, SimProvider};
use walker::{WalkConfig, WalkerSim};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "fix-sim", about = "Trailwatch synthetic walker simulator")]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
    /// Simulation speed multiplier (1.0 = real-time)
    #[arg(long, default_value = "1.0")]
    speed: f64,
    /// Scenario preset: default | signal_loss | no_course | no_geofencing |
    /// empty_fixes | foreground
    #[arg(long)]
    scenario: Option<String>,
    /// Stop after this many simulated seconds via the background-deadline
    /// path (0 = run until interrupted)
    #[arg(long, default_value = "0")]
    run_secs: f64,
    /// RNG seed for reproducible walks
    #[arg(long)]
    seed: Option<u64>,
}

// ── Config ────────────────────────────────────────────────────────────────────

#[derive(Debug, serde::Deserialize)]
struct FullConfig {
    walk: WalkConfig,
    simulation: SimSection,
    engine: EngineConfig,
    scenarios: ScenarioConfig,
}

#[derive(Debug, serde::Deserialize)]
struct SimSection {
    update_rate_hz: f64,
    background_after_secs: f64,
    status_every_ticks: u32,
}

// ── Main ──────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fix_simulator=info,trailwatch_engine=info".into()),
        )
        .init();

    let args = Args::parse();

    let config_str = std::fs::read_to_string(&args.config)
        .unwrap_or_else(|_| include_str!("../config.toml").to_string());
    let mut cfg: FullConfig = toml::from_str(&config_str).context("invalid config.toml")?;

    if let Some(name) = &args.scenario {
        cfg.scenarios = scenarios::preset(name)
            .ok_or_else(|| anyhow!("unknown scenario preset: {name}"))?;
        info!("🎭 scenario preset '{name}' loaded");
    }

    info!(
        "🚶 fix-sim starting — {:.1} m/s from ({:.4}, {:.4}), course {:.0}°",
        cfg.walk.speed_mps, cfg.walk.start_lat, cfg.walk.start_lon, cfg.walk.course_deg
    );

    let provider = Arc::new(SimProvider::new(
        !cfg.scenarios.has(&ScenarioType::NoGeofencing),
    ));
    let notifier = Arc::new(LogNotifier::new());
    let engine = TrackerEngine::new(provider.clone(), notifier, cfg.engine.clone());
    provider.attach_sink(engine.event_sink());

    engine
        .start()
        .await
        .map_err(|e| anyhow!("engine refused to start: {e}"))?;

    // A detached observer on the fix stream, like a UI would attach.
    let mut observer = engine.subscribe().await;
    tokio::spawn(async move {
        while let Some(fix) = observer.rx.recv().await {
            debug!(
                "observer: fix ({:.6}, {:.6}) course {:.0}°",
                fix.position.lat, fix.position.lon, fix.course_deg
            );
        }
    });

    run_walk(&args, &cfg, provider, &engine).await;

    engine.stop().await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    let end_state = engine.snapshot().await;
    info!(
        "🏁 done — phase {:?}, {} stale event(s), stalled: {}",
        end_state.phase, end_state.stale_events, end_state.stalled
    );
    debug!(
        "final state: {}",
        serde_json::to_string_pretty(&end_state).unwrap_or_default()
    );
    Ok(())
}

// ── Walk loop ─────────────────────────────────────────────────────────────────

async fn run_walk(
    args: &Args,
    cfg: &FullConfig,
    provider: Arc<SimProvider>,
    engine: &TrackerEngine,
) {
    let tick_ms = (1000.0 / cfg.simulation.update_rate_hz) as u64;
    let mut ticker = interval(Duration::from_millis(tick_ms.max(1)));
    let dt = (tick_ms as f64 / 1000.0) * args.speed;

    let mut sim = WalkerSim::new(&cfg.walk, args.seed);
    let sink = engine.event_sink();
    let with_course = !cfg.scenarios.has(&ScenarioType::MissingCourse);
    let hold_foreground = cfg.scenarios.has(&ScenarioType::ForegroundHold);
    let empty_every = if cfg.scenarios.has(&ScenarioType::EmptyFixes) {
        cfg.scenarios.empty_fix_every_n
    } else {
        0
    };

    let mut tick_count: u32 = 0;
    let mut fix_count: u32 = 0;
    let mut signal_lost = false;

    info!("⚓ walk loop running at {} Hz ({tick_ms}ms tick)", cfg.simulation.update_rate_hz);

    loop {
        ticker.tick().await;
        tick_count += 1;
        sim.tick(dt);

        if !hold_foreground && sim.t_elapsed >= cfg.simulation.background_after_secs {
            provider.set_backgrounded(true);
        }

        if cfg.scenarios.has(&ScenarioType::SignalLoss)
            && !signal_lost
            && sim.t_elapsed >= cfg.scenarios.signal_loss_after_secs
        {
            warn!("🛰 injecting signal loss at t={:.0}s", sim.t_elapsed);
            provider.fail("simulated signal loss");
            signal_lost = true;
        }

        if provider.updates_active() && !signal_lost {
            fix_count += 1;
            if empty_every > 0 && fix_count % empty_every == 0 {
                sink.empty_fix();
            } else {
                sink.fix(sim.report_fix(with_course));
            }
        }

        // The platform watches region boundaries even while updates are off.
        provider.poll_regions(sim.position);

        if tick_count % cfg.simulation.status_every_ticks.max(1) == 0 {
            let s = engine.snapshot().await;
            info!(
                "⏱ t={:.0}s | pos ({:.6}, {:.6}) | phase {:?} | regions {} | stale {}",
                sim.t_elapsed,
                sim.position.lat,
                sim.position.lon,
                s.phase,
                provider.monitored_count(),
                s.stale_events,
            );
        }

        if signal_lost && sim.t_elapsed >= cfg.scenarios.signal_loss_after_secs + 2.0 {
            // Engine is idle by design after a provider failure; nothing
            // more will happen without an explicit restart.
            break;
        }

        if args.run_secs > 0.0 && sim.t_elapsed >= args.run_secs {
            info!("⌛ background deadline at t={:.0}s — stopping", sim.t_elapsed);
            sink.deadline_expired();
            break;
        }
    }
}
