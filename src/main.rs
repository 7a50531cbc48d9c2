//! Slope Roll entry point
//!
//! Runs a configured simulation to completion and prints every emitted
//! trajectory as JSON on stdout.
//!
//! Usage: `slope-roll [settings.json]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    if let Err(e) = run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // No native runner on wasm
}

#[cfg(not(target_arch = "wasm32"))]
fn run() -> slope_roll::SimResult<()> {
    use slope_roll::SimSettings;
    use slope_roll::sim::Trajectory;

    let settings = match std::env::args().nth(1) {
        Some(path) => SimSettings::load(path)?,
        None => {
            log::info!("No settings file given, using defaults");
            SimSettings::default()
        }
    };

    let mut sim = settings.build()?;
    log::info!(
        "Slope Roll starting: {} balls, dt = {}, g = {}",
        sim.balls().len(),
        settings.dt,
        settings.gravity
    );

    let mut curves: Vec<Trajectory> = Vec::new();
    let ticks = sim.run(settings.max_ticks, &mut curves);
    log::info!(
        "Finished after {} ticks ({:.2}s simulated), {} trajectories",
        ticks,
        ticks as f32 * settings.dt,
        curves.len()
    );

    println!("{}", serde_json::to_string_pretty(&curves)?);
    Ok(())
}
