use idsgen::config::Configuration;
use idsgen::listen::Listener;
use idsgen::scheduler::Scheduler;
use idsgen::stats::Stats;
use idsgen::transport::UdpSink;
mod cmd;

use std::io;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use anyhow::Context;
use clap::Parser;
use rand_core::SeedableRng;
use rand_pcg::Pcg32;

/// The entry point of the application.
///
/// This function builds the configuration from the file and the command line, then runs the
/// requested mode until it ends or is interrupted.
fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = cmd::Args::parse();

    let mut config = match &args.config {
        Some(path) => Configuration::from_file(path)?,
        None => Configuration::default(),
    };
    if let Some(d) = args.destination {
        config.destination = d;
    }
    if let Some(w) = args.width {
        config.vector_width = w;
    }

    // Handle ctrl+C
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        if r.load(Ordering::Relaxed) {
            log::warn!("Ending the generation, please wait");
            r.store(false, Ordering::Relaxed);
        } else {
            log::warn!("Ending immediately");
            process::abort();
        }
    })
    .context("Error setting Ctrl-C handler")?;

    match args.command {
        cmd::Command::Simulate {
            seed,
            count,
            min_delay,
            max_delay,
            normal_weight,
            attack_weight,
            sources,
        } => {
            if let Some(d) = min_delay {
                config.delay.min = d;
            }
            if let Some(d) = max_delay {
                config.delay.max = d;
            }
            if let Some(w) = normal_weight {
                config.normal_weight = w;
            }
            if let Some(w) = attack_weight {
                config.attack_weight = w;
            }
            config.validate()?;
            if sources == 0 {
                anyhow::bail!("At least one source is needed");
            }
            simulate(config, seed, count, sources, running)
        }
        cmd::Command::Burst {
            class,
            count,
            interval,
            seed,
        } => {
            if let Some(c) = count {
                config.burst.count = c;
            }
            if let Some(i) = interval {
                config.burst.interval = i;
            }
            config.validate()?;
            let sink = UdpSink::new(config.destination)
                .with_context(|| format!("Cannot open a socket to {}", config.destination))?;
            let stats = Stats::default();
            let mut scheduler = Scheduler::new(
                config.emission_policy(None),
                config.generator()?,
                new_rng(seed, 0),
            )?;
            log::info!(
                "Sending {} {} packets to {}",
                config.burst.count,
                idsgen::TrafficClass::from(class),
                config.destination
            );
            scheduler.run_burst(class.into(), config.burst, &sink, &running, &stats)?;
            stats.log_summary();
            Ok(())
        }
        cmd::Command::Listen { bind, count } => {
            config.validate()?;
            let listener = Listener::bind(bind, config.vector_width)
                .with_context(|| format!("Cannot listen on {bind}"))?;
            let received = listener.run(&running, count, &mut io::stdout().lock())?;
            log::info!("{received} valid packets received");
            Ok(())
        }
    }
}

fn new_rng(seed: Option<u64>, source: u32) -> Pcg32 {
    match seed {
        Some(s) => Pcg32::seed_from_u64(s.wrapping_add(source as u64)),
        None => Pcg32::from_entropy(),
    }
}

/// Run `sources` independent schedulers that share the socket and the statistics
fn simulate(
    config: Configuration,
    seed: Option<u64>,
    count: Option<u64>,
    sources: u32,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    if let Some(s) = seed {
        log::info!("Generating with seed {s}");
    }
    let sink = Arc::new(
        UdpSink::new(config.destination)
            .with_context(|| format!("Cannot open a socket to {}", config.destination))?,
    );
    let stats = Arc::new(Stats::default());
    let generator = config.generator()?;
    log::info!(
        "Sending random normal and attack traffic to {} ({} features per packet)",
        config.destination,
        config.vector_width
    );

    let mut gen_threads = vec![];
    for i in 0..sources {
        let mut scheduler = Scheduler::new(
            config.emission_policy(count),
            generator.clone(),
            new_rng(seed, i),
        )?;
        let sink = Arc::clone(&sink);
        let stats = Arc::clone(&stats);
        let running = Arc::clone(&running);
        let builder = thread::Builder::new().name(format!("Source-{i}"));
        gen_threads.push(
            builder.spawn(move || scheduler.run(sink.as_ref(), &running, &stats))?,
        );
    }

    // the monitoring thread has its own flag, so it stops even when every source reached its count
    let monitoring = Arc::new(AtomicBool::new(true));
    let monitor = {
        let stats = Arc::clone(&stats);
        let monitoring = Arc::clone(&monitoring);
        thread::Builder::new()
            .name("Monitoring".into())
            .spawn(move || idsgen::stats::run(stats, monitoring))?
    };

    let mut result = Ok(());
    for thread in gen_threads {
        match thread.join() {
            Ok(Ok(())) => (),
            Ok(Err(e)) => result = Err(e.into()),
            Err(_) => result = Err(anyhow::anyhow!("A source thread panicked")),
        }
    }
    monitoring.store(false, Ordering::Relaxed);
    if monitor.join().is_err() {
        log::warn!("The monitoring thread panicked");
    }
    stats.log_summary();
    result
}
