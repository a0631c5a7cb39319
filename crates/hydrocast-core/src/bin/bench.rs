/// Pure Rust benchmarks of the forecasting pipeline.
///
/// Uses std::time::Instant for timing, a deterministic LCG for synthetic
/// storms, and std::hint::black_box to keep the optimiser honest.
use std::collections::BTreeMap;
use std::hint::black_box;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use hydrocast_core::forcing::Forcing;
use hydrocast_core::level::LevelStorageCurve;
use hydrocast_core::{
    run, run_both, ForecastInput, GeneratorKind, InitialConditions, ReservoirKind, ReservoirProfile,
};

const REPEATS: usize = 7;

/// Deterministic hourly rainfall and evaporation.
fn make_data(n: usize, seed: u64) -> (Vec<f64>, Vec<f64>, Vec<Option<f64>>) {
    let mut state = seed;
    let mut next_f64 = || -> f64 {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 33) as f64 / (1u64 << 31) as f64
    };

    // Mostly dry hours with occasional bursts.
    let precip: Vec<f64> = (0..n)
        .map(|_| {
            let u = next_f64();
            if u > 0.8 {
                (u - 0.8) * 60.0
            } else {
                0.0
            }
        })
        .collect();
    let evap: Vec<f64> = (0..n).map(|_| 0.05 + next_f64() * 0.3).collect();
    let observed: Vec<Option<f64>> = (0..n)
        .map(|_| {
            let u = next_f64();
            (u > 0.3).then(|| 5.0 + u * 40.0)
        })
        .collect();
    (precip, evap, observed)
}

fn make_input(profile: &ReservoirProfile, n: usize) -> ForecastInput {
    let n1 = n / 2;
    let (precip, evap, observed) = make_data(n, 42);
    let start = NaiveDate::from_ymd_opt(2024, 7, 1)
        .and_then(|d| d.and_hms_opt(8, 0, 0))
        .unwrap_or_default();

    let stations = profile.antecedent.generator.stations.for_year(2024);
    let point_rainfall: BTreeMap<String, Vec<f64>> = stations
        .all()
        .enumerate()
        .map(|(i, s)| (s.to_string(), make_data(n, 100 + i as u64).0))
        .collect();

    let forcing = Forcing::new(precip, evap, observed, vec![0.0; n], vec![20.0; n])
        .unwrap_or_else(|e| panic!("synthetic forcing: {e}"));
    let curve = LevelStorageCurve::from_pairs(&[
        (20.0, 1000.0),
        (25.0, 5000.0),
        (30.0, 12000.0),
        (35.0, 25000.0),
    ])
    .unwrap_or_else(|e| panic!("synthetic curve: {e}"));

    ForecastInput {
        start,
        n1,
        forcing,
        curve,
        start_level: 26.0,
        daily_rainfall: make_data(20, 7).0,
        point_rainfall,
        initial: InitialConditions::default(),
    }
}

/// Run a closure `REPEATS` times, return the median duration.
fn median_time<F: FnMut()>(mut f: F) -> Duration {
    let mut times: Vec<Duration> = (0..REPEATS)
        .map(|_| {
            let start = Instant::now();
            f();
            start.elapsed()
        })
        .collect();
    times.sort();
    times[REPEATS / 2]
}

fn bench_generator(
    kind: ReservoirKind,
    generator: GeneratorKind,
    sizes: &[usize],
) -> Vec<(String, usize, Duration)> {
    let profile = ReservoirProfile::builtin(kind);
    let mut results = Vec::new();

    for &n in sizes {
        let input = make_input(&profile, n);

        // Warmup
        black_box(run(&profile, kind, generator, &input).ok());

        let dur = median_time(|| {
            black_box(run(&profile, kind, generator, &input).ok());
        });
        results.push((format!("{kind}/{generator}"), n, dur));
    }
    results
}

fn bench_both(kind: ReservoirKind, sizes: &[usize]) -> Vec<(String, usize, Duration)> {
    let profile = ReservoirProfile::builtin(kind);
    sizes
        .iter()
        .map(|&n| {
            let input = make_input(&profile, n);
            let dur = median_time(|| {
                black_box(run_both(&profile, kind, &input).ok());
            });
            (format!("{kind}/both"), n, dur)
        })
        .collect()
}

fn main() {
    let level = match std::env::var("HYDROCAST_LOG").as_deref() {
        Ok("trace") => Level::TRACE,
        Ok("debug") => Level::DEBUG,
        Ok("info") => Level::INFO,
        _ => Level::WARN,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("tracing subscriber already installed");
    }

    info!("starting benchmarks");
    println!("Forecast Pipeline Benchmarks");
    println!("============================================================");
    println!("{:<24} {:>6}   {:>12}", "Run", "N", "Median (ms)");
    println!("--------------------------------------------");

    let mut all_results: Vec<(String, usize, Duration)> = Vec::new();
    for kind in ReservoirKind::ALL {
        for generator in GeneratorKind::ALL {
            all_results.extend(bench_generator(kind, generator, &[96, 720, 8760]));
        }
        all_results.extend(bench_both(kind, &[720]));
    }

    for (label, n, dur) in &all_results {
        let ms = dur.as_secs_f64() * 1000.0;
        println!("{:<24} {:>6}      {:>8.2}", label, n, ms);
    }

    println!("============================================================");
}
