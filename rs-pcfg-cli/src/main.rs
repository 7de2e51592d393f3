use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use log::{error, info};

use rs_pcfg_core::config::{DEFAULT_SAMPLE_SIZE, DEFAULT_UPPER_BOUND};
use rs_pcfg_core::estimate::{CurveRenderer, EvaluationPipeline, RankEstimator, Sampler, TsvCurveWriter};
use rs_pcfg_core::{EvaluationConfig, GrammarModel};

/// Monte Carlo guess-number estimation for a trained PCFG password model
#[derive(Parser)]
#[command(name = "pcfg-guess")]
#[command(about = "Monte Carlo Simulation for PCFG password models", long_about = None)]
#[command(version)]
struct Cli {
	/// Trained model directory
	#[arg(short = 'm', long)]
	trained_model: PathBuf,

	/// Password set to be cracked, one per line
	#[arg(short = 't', long, required_unless_present = "prob_mode")]
	test_set: Option<PathBuf>,

	/// Number of sampled passwords, 10000+ suggested
	#[arg(short = 'n', long, default_value_t = DEFAULT_SAMPLE_SIZE)]
	sample_size: usize,

	/// Guess numbers at or above this bound are left out of the guess-crack file
	#[arg(short = 'u', long, default_value_t = DEFAULT_UPPER_BOUND)]
	upper_bound: f64,

	/// Guess-crack table output
	#[arg(short = 'f', long, required_unless_present = "prob_mode")]
	guess_crack_file: Option<PathBuf>,

	/// Guess-crack curve output (tab-separated series)
	#[arg(short = 'c', long, required_unless_present = "prob_mode")]
	save_gc_curve: Option<PathBuf>,

	/// Per-password output: <password>\t<guess number estimate>
	#[arg(short = 's', long = "strength", required_unless_present = "prob_mode")]
	save_strength: Option<PathBuf>,

	/// Type in passwords and print their probability
	#[arg(long)]
	prob_mode: bool,

	/// RNG seed of the sample (random when omitted)
	#[arg(long)]
	seed: Option<u64>,

	/// Curve label (defaults to the model path)
	#[arg(long)]
	label: Option<String>,

	/// Compiled model cache, created on first use
	#[arg(long)]
	model_cache: Option<PathBuf>,
}

/// Paths of a batch evaluation, all validated.
struct BatchPaths {
	test_set: PathBuf,
	guess_crack_file: PathBuf,
	save_gc_curve: PathBuf,
	save_strength: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
	let cli = Cli::parse();

	let batch = if cli.prob_mode { None } else { Some(batch_paths(&cli)) };
	if !cli.trained_model.is_dir() || batch.as_ref().is_some_and(|paths| !paths.are_valid()) {
		error!("Check whether you type in an invalid path or not!");
		process::exit(1);
	}

	let model = match &cli.model_cache {
		Some(cache) => GrammarModel::load_cached(&cli.trained_model, cache)?,
		None => GrammarModel::load(&cli.trained_model)?,
	};

	match batch {
		None => prob_mode(&model, io::stdin().lock(), io::stdout().lock()),
		Some(paths) => {
			let mut config = EvaluationConfig::default();
			config.set_sample_size(cli.sample_size)?;
			config.set_upper_bound(cli.upper_bound)?;
			config.seed = cli.seed;
			config.label = cli.label.clone().unwrap_or_else(|| cli.trained_model.display().to_string());
			evaluate(&model, &config, &paths)
		}
	}
}

fn batch_paths(cli: &Cli) -> BatchPaths {
	let or_empty = |path: &Option<PathBuf>| path.clone().unwrap_or_default();
	BatchPaths {
		test_set: or_empty(&cli.test_set),
		guess_crack_file: or_empty(&cli.guess_crack_file),
		save_gc_curve: or_empty(&cli.save_gc_curve),
		save_strength: or_empty(&cli.save_strength),
	}
}

impl BatchPaths {
	fn are_valid(&self) -> bool {
		self.test_set.is_file()
			&& writable_location(&self.guess_crack_file)
			&& writable_location(&self.save_gc_curve)
			&& writable_location(&self.save_strength)
	}
}

/// True when the parent directory of `path` exists.
fn writable_location(path: &Path) -> bool {
	if path.as_os_str().is_empty() {
		return false;
	}
	match path.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => parent.is_dir(),
		_ => true,
	}
}

/// Samples, then streams the test set; output files are only created once
/// the sample exists.
fn evaluate(model: &GrammarModel, config: &EvaluationConfig, paths: &BatchPaths) -> Result<(), Box<dyn std::error::Error>> {
	let seed = config.resolve_seed();
	let sample = Sampler::new(model, seed).sample(config.sample_size())?;
	let estimator = RankEstimator::from_sample(&sample)?;

	let test_set = BufReader::new(File::open(&paths.test_set)?);
	let strength = BufWriter::new(File::create(&paths.save_strength)?);
	let evaluation = EvaluationPipeline::new(model, &estimator, config).run(test_set, strength)?;

	evaluation.table.write_to(BufWriter::new(File::create(&paths.guess_crack_file)?))?;
	let mut renderer = TsvCurveWriter::new(BufWriter::new(File::create(&paths.save_gc_curve)?));
	renderer.render(&config.label, &evaluation.table.series())?;

	info!(
		"done: {} passwords, guess-crack table in {}",
		evaluation.total(),
		paths.guess_crack_file.display()
	);
	Ok(())
}

/// Interactive lookup: prints `probability\tsurprisal` for each input line.
///
/// Needs only the grammar, no sample. Invalid UTF-8 is decoded lossily, so
/// such a line scores as unreachable instead of ending the session.
fn prob_mode<R: BufRead, W: Write>(model: &GrammarModel, mut input: R, mut output: W) -> Result<(), Box<dyn std::error::Error>> {
	writeln!(output, "Type in password")?;
	output.flush()?;
	let mut buffer = Vec::new();
	loop {
		buffer.clear();
		if input.read_until(b'\n', &mut buffer)? == 0 {
			break;
		}
		while matches!(buffer.last(), Some(b'\n' | b'\r')) {
			buffer.pop();
		}
		let password = String::from_utf8_lossy(&buffer);
		let surprisal = model.log_probability(&password);
		writeln!(output, "{}\t{}", (-surprisal).exp2(), surprisal)?;
		output.flush()?;
	}
	Ok(())
}
