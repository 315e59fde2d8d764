use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;

use phonolab::data::confusion::CONFUSION_FILE;

/// Write a small synthetic dataset tree for trying out `jenks` and `confusion`.
///
/// Datasets land in `ROOT/jenks/<speaker>/<phoneme>.txt`; the confusion
/// matrix sits at `ROOT/confusion_matrix.txt`, outside the dataset tree.
#[derive(Parser, Debug)]
#[command(name = "generate_sample", version)]
struct Args {
    /// Directory to populate.
    #[arg(default_value = "sample_data")]
    root: PathBuf,

    /// Values per dataset.
    #[arg(long, default_value_t = 200)]
    values: usize,

    /// PRNG seed.
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// (phoneme, mixture components as (mean, std dev))
const PHONEMES: [(&str, &[(f64, f64)]); 4] = [
    ("aa", &[(120.0, 8.0), (310.0, 15.0), (540.0, 20.0)]),
    ("iy", &[(95.0, 5.0), (260.0, 12.0)]),
    ("sh", &[(40.0, 4.0), (180.0, 25.0), (400.0, 10.0), (720.0, 30.0)]),
    ("uw", &[(150.0, 10.0), (450.0, 18.0)]),
];

const DATASET_DIR: &str = "jenks";

const SPEAKERS: [&str; 3] = ["female", "male", "spkr1"];

fn dataset(rng: &mut SimpleRng, components: &[(f64, f64)], count: usize, shift: f64) -> String {
    let mut line = String::new();
    for _ in 0..count {
        let (mean, sd) = components[rng.below(components.len())];
        let _ = write!(line, "{:.4},", rng.gauss(mean + shift, sd));
    }
    line.push_str("X\n");
    line
}

/// Mostly-diagonal counts in the DTW executable's `label | n | ... |` layout.
fn confusion(rng: &mut SimpleRng) -> String {
    let mut text = String::new();
    for (row, (label, _)) in PHONEMES.iter().enumerate() {
        let _ = write!(text, "{label} |");
        for col in 0..PHONEMES.len() {
            let count = if row == col {
                20 + rng.below(10)
            } else {
                rng.below(4)
            };
            let _ = write!(text, " {count} |");
        }
        text.push('\n');
    }
    text
}

fn write(path: &Path, contents: &str) -> anyhow::Result<()> {
    fs::write(path, contents).with_context(|| format!("writing {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let mut rng = SimpleRng::new(args.seed);

    let datasets = args.root.join(DATASET_DIR);
    let mut files = 0;
    for (i, speaker) in SPEAKERS.iter().enumerate() {
        let dir = datasets.join(speaker);
        fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
        for (phoneme, components) in PHONEMES {
            let text = dataset(&mut rng, components, args.values, i as f64 * 12.0);
            write(&dir.join(format!("{phoneme}.txt")), &text)?;
            files += 1;
        }
    }
    write(&args.root.join(CONFUSION_FILE), &confusion(&mut rng))?;

    println!(
        "Wrote {files} datasets ({} values each) to {} and {CONFUSION_FILE} to {}",
        args.values,
        datasets.display(),
        args.root.display()
    );
    Ok(())
}
