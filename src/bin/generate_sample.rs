use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Write synthetic College_Completion.csv and Job_Placement.csv with the real
/// column layouts.
#[derive(Parser)]
#[command(name = "generate-sample")]
struct Args {
    /// Output directory
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of institutions
    #[arg(long, default_value_t = 1000)]
    colleges: usize,

    /// Number of candidates
    #[arg(long, default_value_t = 215)]
    candidates: usize,
}

const STATES: &[&str] = &[
    "Alabama", "Alaska", "Arizona", "California", "Colorado", "Florida", "Georgia", "Illinois",
    "New York", "Ohio", "Texas", "Virginia", "Washington",
];
const CONTROLS: &[&str] = &["Public", "Private not-for-profit", "Private for-profit"];
const BASICS: &[&str] = &[
    "Associates--Public Rural-serving Medium",
    "Baccalaureate Colleges--Arts & Sciences",
    "Masters Colleges and Universities--larger programs",
    "Research Universities--very high research activity",
];

/// Uniform draw, left empty with probability `p_missing`.
fn maybe(rng: &mut StdRng, lo: f64, hi: f64, p_missing: f64) -> String {
    if rng.gen_bool(p_missing) {
        String::new()
    } else {
        format!("{:.1}", rng.gen_range(lo..hi))
    }
}

fn write_college(path: &Path, rows: usize, rng: &mut StdRng) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating college CSV")?;
    writer.write_record([
        "index", "unitid", "chronname", "city", "state", "level", "control", "basic", "hbcu",
        "flagship", "long_x", "lat_y", "site", "student_count", "awards_per_value", "ft_pct",
        "fte_value", "aid_value", "endow_value", "grad_100_value", "grad_100_percentile",
        "grad_150_value", "grad_150_percentile", "pell_value", "retain_value", "similar",
        "counted_pct", "nicknames", "cohort_size",
    ])?;

    for i in 0..rows {
        let level = if rng.gen_bool(0.6) { "4-year" } else { "2-year" };
        let control = CONTROLS.choose(rng).copied().unwrap_or("Public");
        let grad_150: f64 = rng.gen_range(0.0..100.0);
        let grad_100 = grad_150 * rng.gen_range(0.3..0.9);
        let students: u32 = rng.gen_range(200..40_000);
        writer.write_record([
            i.to_string(),
            (100_000 + i * 7).to_string(),
            format!("Institution {i}"),
            format!("City {}", i % 97),
            STATES.choose(rng).copied().unwrap_or("Ohio").to_string(),
            level.to_string(),
            control.to_string(),
            BASICS.choose(rng).copied().unwrap_or(BASICS[0]).to_string(),
            if rng.gen_bool(0.05) { "X".into() } else { String::new() },
            if rng.gen_bool(0.05) { "X".into() } else { String::new() },
            format!("{:.4}", rng.gen_range(-122.0..-70.0)),
            format!("{:.4}", rng.gen_range(25.0..48.0)),
            format!("www.inst{i}.edu"),
            students.to_string(),
            format!("{:.1}", rng.gen_range(5.0..60.0)),
            maybe(rng, 20.0, 100.0, 0.01),
            (students as f64 * rng.gen_range(0.5..1.0)).round().to_string(),
            maybe(rng, 2_000.0, 40_000.0, 0.01),
            maybe(rng, 500.0, 100_000.0, 0.1),
            format!("{grad_100:.1}"),
            rng.gen_range(0..100).to_string(),
            format!("{grad_150:.1}"),
            rng.gen_range(0..100).to_string(),
            format!("{:.1}", rng.gen_range(5.0..90.0)),
            maybe(rng, 30.0, 99.0, 0.02),
            format!("{}|{}", i + 1, i + 2),
            format!("{:.2}", rng.gen_range(0.3..1.0)),
            String::new(),
            rng.gen_range(50..5_000).to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_job(path: &Path, rows: usize, rng: &mut StdRng) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating job CSV")?;
    writer.write_record([
        "sl_no", "gender", "ssc_p", "ssc_b", "hsc_p", "hsc_b", "hsc_s", "degree_p", "degree_t",
        "workex", "etest_p", "specialisation", "mba_p", "status", "salary",
    ])?;

    for i in 0..rows {
        let placed = rng.gen_bool(0.7);
        let salary = if placed {
            (rng.gen_range(200..900) * 1_000).to_string()
        } else {
            String::new()
        };
        writer.write_record([
            (i + 1).to_string(),
            ["M", "F"].choose(rng).copied().unwrap_or("M").to_string(),
            format!("{:.2}", rng.gen_range(40.0..90.0)),
            ["Central", "Others"].choose(rng).copied().unwrap_or("Others").to_string(),
            format!("{:.2}", rng.gen_range(40.0..95.0)),
            ["Central", "Others"].choose(rng).copied().unwrap_or("Others").to_string(),
            ["Commerce", "Science", "Arts"].choose(rng).copied().unwrap_or("Arts").to_string(),
            format!("{:.2}", rng.gen_range(50.0..90.0)),
            ["Sci&Tech", "Comm&Mgmt", "Others"]
                .choose(rng)
                .copied()
                .unwrap_or("Others")
                .to_string(),
            ["Yes", "No"].choose(rng).copied().unwrap_or("No").to_string(),
            format!("{:.2}", rng.gen_range(50.0..98.0)),
            ["Mkt&HR", "Mkt&Fin"].choose(rng).copied().unwrap_or("Mkt&HR").to_string(),
            format!("{:.2}", rng.gen_range(50.0..78.0)),
            if placed { "Placed" } else { "Not Placed" }.to_string(),
            salary,
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut rng = StdRng::seed_from_u64(args.seed);

    std::fs::create_dir_all(&args.out_dir).context("creating output directory")?;
    let college = args.out_dir.join("College_Completion.csv");
    let job = args.out_dir.join("Job_Placement.csv");

    write_college(&college, args.colleges, &mut rng)?;
    write_job(&job, args.candidates, &mut rng)?;

    println!(
        "Wrote {} institutions to {} and {} candidates to {}",
        args.colleges,
        college.display(),
        args.candidates,
        job.display()
    );
    Ok(())
}
