use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reactor_engine::Engine;
use reactor_engine::loader::parse_document;
use reactor_host::config::HostConfig;
use reactor_host::console::{Console, Outcome};
use reactor_host::producer::{Notification, Producer};
use reactor_host::sim::{Scenario, SimHost, SimWorld, WorldEvent};
use reactor_host::{executors, runtime};
use tokio::io::{AsyncBufReadExt, BufReader};

const DEMO_RULES: &str = include_str!("../assets/demo_rules.json");

fn arg(flag: &str) -> Option<String> {
    std::env::args().skip_while(|a| a != flag).nth(1)
}

#[tokio::main]
async fn main() -> Result<()> {
    let demo_mode = std::env::args().any(|a| a == "--demo");
    let rules_root: PathBuf = arg("--rules").unwrap_or_else(|| "rules".into()).into();
    let scenario_path = arg("--scenario").map(PathBuf::from);
    let config_path = arg("--config").map(PathBuf::from);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut config = HostConfig::load(config_path.as_deref())?;
    if let Some(ms) = arg("--frame-ms").and_then(|s| s.parse().ok()) {
        config.frame_ms = ms;
    }

    let scenario = match &scenario_path {
        Some(path) => Scenario::load(path)?,
        None => Scenario::builtin()?,
    };
    let world = SimWorld::from_scenario(&scenario)?;
    let host = SimHost::new(Arc::clone(&world));

    let engine = Engine::new(Arc::clone(&host), config.engine.clone(), executors::standard(&world));
    let engine = runtime::install(Arc::new(engine))?;
    let producer = Arc::new(Producer::new(host, config.release_window()));

    if demo_mode {
        return run_demo(engine, &producer, &world).await;
    }

    tracing::info!("Reactor reference host");
    engine.reload(&rules_root);
    runtime::start(Arc::clone(engine), Arc::clone(&producer), config.frame_time());

    let console = Console::new(Arc::clone(&world), producer, rules_root);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    break;
                };
                match console.run_line(engine, &line) {
                    Ok(Some(Outcome::Reply(reply))) => println!("{reply}"),
                    Ok(Some(Outcome::Quit)) => break,
                    Ok(None) => {}
                    Err(e) => println!("error: {e:#}"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received, shutting down...");
                break;
            }
        }
    }

    tracing::info!(
        "Final stats: {}",
        serde_json::to_string(&engine.metrics()).context("serializing metrics")?
    );
    Ok(())
}

/// Scripted walk through the built-in scenario with the bundled rules.
async fn run_demo(engine: &Engine<SimHost>, producer: &Producer, world: &SimWorld) -> Result<()> {
    tracing::info!("Reactor demo");

    let rules = parse_document("demo_rules.json", DEMO_RULES, engine.host().as_ref())?;
    let generation = engine.install(rules.rules);
    tracing::info!("Installed {} demo rules (generation {})", engine.rule_count(), generation);

    let find = |name: &str| world.find(name).with_context(|| format!("demo scenario has no {name}"));
    let player = Some(find("player")?);
    let chest = find("chest")?;
    let lever = find("lever")?;
    let rock = find("rock")?;
    let bucket = find("bucket")?;
    let gate = find("gate")?;
    let mushroom = find("mushroom")?;

    world.take_journal();

    let script = [
        Notification::Activated { target: chest, actor: player },
        Notification::Activated { target: lever, actor: player },
        Notification::Activated { target: mushroom, actor: player },
        Notification::Grabbed { target: bucket, actor: player },
        Notification::Released { target: bucket, actor: player },
        Notification::Collided { object: bucket, target: gate },
    ];
    for notification in script {
        let n = producer.deliver(engine, notification.clone());
        tracing::info!("{:?} -> {} effects queued", notification, n);
    }
    for swing in 1..=3 {
        let n = producer.deliver(
            engine,
            Notification::Hit {
                target: rock,
                aggressor: player,
                weapon: None,
                projectile: None,
                weapon_type: Some(reactor_engine::rules::WeaponType::Warhammer),
                attack: Some(reactor_engine::rules::AttackType::Power),
            },
        );
        tracing::info!("Warhammer swing {} at the rock -> {} effects queued", swing, n);
        // Let the debounce window pass between swings.
        tokio::time::sleep(engine.config().hit_debounce() + Duration::from_millis(10)).await;
    }

    let report = engine.safe_point();
    tracing::info!("Safe point: {} ran, {} aborted, {} failed", report.ran, report.aborted, report.failed);

    // Give the nudges time to finish.
    for _ in 0..20 {
        tokio::time::sleep(Duration::from_millis(50)).await;
        engine.safe_point();
    }

    for event in world.take_journal() {
        match event {
            WorldEvent::Spawned { id, .. } => println!("spawned  {}", world.describe(id)),
            WorldEvent::Disposed { id } => println!("disposed {}", id),
            WorldEvent::Moved { id, to } => println!("moved    {} to {:?}", world.describe(id), to),
            WorldEvent::SoundPlayed { sound, at } => {
                println!("sound    {} at {:?}", world.form_name(sound).unwrap_or_default(), at)
            }
            WorldEvent::SpellCast { spell, target, .. } => {
                println!("spell    {} on {}", world.form_name(spell).unwrap_or_default(), world.describe(target))
            }
            WorldEvent::ImpactPlayed { impact, at } => {
                println!("impact   {} at {:?}", world.form_name(impact).unwrap_or_default(), at)
            }
        }
    }

    println!("{}", serde_json::to_string_pretty(&engine.metrics())?);
    Ok(())
}
