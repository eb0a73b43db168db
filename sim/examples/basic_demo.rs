//! Basic demonstration of the Untamed simulation.
//!
//! Run with: RUST_LOG=untamed_sim=debug cargo run --example basic_demo
//!
//! Reads `untamed.toml` from the working directory if present.

use glam::Vec3;
use tracing_subscriber::EnvFilter;
use untamed_sim::environment::{WeatherKind, WorldEventKind};
use untamed_sim::{Notice, SimConfig, SimWorld, SpeciesKind};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== Untamed - Simulation Demo ===\n");

    let mut sim = SimWorld::with_config(SimConfig::load_or_default());
    sim.spawn_species("wolf", Vec3::new(6.0, 0.0, 6.0));
    sim.spawn_species("deer", Vec3::new(10.0, 0.0, 8.0));

    // Walk the observer east toward the forest while the world fills up.
    println!("Running 30 seconds at 20 ticks/sec...\n");
    let velocity = Vec3::new(4.0, 0.0, 1.0);
    let mut position = Vec3::ZERO;
    for tick in 0..600 {
        position += velocity * 0.05;
        sim.set_observer(position, velocity);
        sim.step(0.05);

        if tick == 100 {
            sim.force_weather(WeatherKind::Rain);
        }
        if tick == 200 {
            sim.player_attack(position, 6.0, 30.0);
        }

        if (tick + 1) % 100 == 0 {
            println!("--- Tick {} (t={:.1}s) ---", sim.current_tick(), sim.current_time());
            print_snapshot(&mut sim);
            print_notices(&mut sim);
        }
    }

    sim.set_hour(23.0);
    if sim.trigger_world_event(WorldEventKind::BloodMoon) {
        println!("\nA blood moon rises.");
    }

    println!("\n=== Final State (JSON) ===\n");
    match sim.snapshot().to_json_pretty() {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("snapshot failed: {e}"),
    }
}

fn print_snapshot(sim: &mut SimWorld) {
    let snapshot = sim.snapshot();
    println!(
        "  {:02.0}:00 day {} | {:?} -> {:?} ({:.0}%) | biome {:?} | pop {}",
        snapshot.time_of_day.hour.floor(),
        snapshot.time_of_day.day_count,
        snapshot.weather.current,
        snapshot.weather.next,
        snapshot.weather.progress * 100.0,
        snapshot.biome,
        sim.population(),
    );
    for agent in snapshot.agents.iter().filter(|a| a.kind != SpeciesKind::Player).take(6) {
        println!(
            "    #{:<4} {:<12} pos=({:6.1}, {:6.1}) hp={:5.1} st={:5.1} [{:?}]",
            agent.id.0, agent.species, agent.x, agent.z, agent.health, agent.stamina, agent.state
        );
    }
    let progress = &snapshot.progress;
    println!(
        "  xp={:.0} currency={} kills={} resources={}",
        progress.experience, progress.currency, progress.kills, progress.resources_collected
    );
}

fn print_notices(sim: &mut SimWorld) {
    for notice in sim.drain_notices() {
        match notice {
            Notice::StateChanged { .. } => {}
            other => println!("  notice: {other:?}"),
        }
    }
}
