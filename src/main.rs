use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use labsynth::algorithm::report::PrivacyReport;
use labsynth::{
    GenerationBackend, GenerationRequest, ReportBuilder, SignatureClassifier, SynthConfig,
    available_backend, io, read_annotated,
};
use log::info;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[global_allocator]
static ALLOC: snmalloc_rs::SnMalloc = snmalloc_rs::SnMalloc;

#[derive(Parser)]
#[command(name = "labsynth")]
#[command(about = "Synthetic screening-panel data with privacy and fidelity scoring")]
#[command(version)]
struct Cli {
    /// JSON configuration file; defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate synthetic rows from one or more source files
    Generate {
        /// Source CSV or Parquet files
        #[arg(long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        /// Output file (.csv or .parquet)
        #[arg(long)]
        output: PathBuf,

        /// Number of rows to generate
        #[arg(long, allow_negative_numbers = true)]
        rows: i64,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Also score the result and write the report here (.json or .csv)
        #[arg(long)]
        report: Option<PathBuf>,

        /// Show a progress bar
        #[arg(long)]
        progress: bool,
    },

    /// Score an existing synthetic file against its source
    Report {
        /// Source file
        #[arg(long)]
        original: PathBuf,

        /// Synthetic file
        #[arg(long)]
        synthetic: PathBuf,

        /// Write the report here (.json or .csv)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Classify source rows against the clinical signature
    Classify {
        /// Source file
        #[arg(long)]
        input: PathBuf,

        /// Write annotated rows here (.csv or .parquet)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> Result<SynthConfig> {
    let config = match path {
        Some(path) => SynthConfig::from_json_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => SynthConfig::default(),
    };
    Ok(config.with_env_overrides()?)
}

fn write_report(report: &PrivacyReport, path: &Path) -> Result<()> {
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        report.write_to_csv(path)?;
    } else {
        report.write_to_json(path)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;

    if let Commands::Generate { seed: Some(seed), .. } = &cli.command {
        config = config.with_seed(*seed);
    }

    rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build_global()
        .context("Failed to configure worker threads")?;

    match cli.command {
        Commands::Generate {
            input,
            output,
            rows,
            report,
            progress,
            ..
        } => {
            let start = Instant::now();
            let config = config.with_progress(progress);
            let original = io::load_records_async(&input)
                .await
                .context("Failed to load source rows")?;

            let backend = available_backend(&config).await?;
            info!("Generating {rows} rows with the {} backend", backend.name());
            let request = GenerationRequest::new(original, rows);
            let response = backend.generate(&request).await.context("Generation failed")?;

            if let Some(report_path) = report {
                let annotated = SignatureClassifier::new(config.signature.clone())
                    .annotate(&request.original_rows);
                let report =
                    ReportBuilder::from_config(&config).build(&annotated, &response.synthetic_rows);
                println!("{}", report.summary());
                write_report(&report, &report_path)?;
            }

            io::write_records_async(&output, response.synthetic_rows)
                .await
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!("Finished in {:?}", start.elapsed());
        }
        Commands::Report {
            original,
            synthetic,
            output,
        } => {
            let classifier = SignatureClassifier::new(config.signature.clone());
            let original = read_annotated(&original, &classifier)?;
            let synthetic = read_annotated(&synthetic, &classifier)?;
            let report = ReportBuilder::from_config(&config).build(&original, &synthetic);
            println!("{}", report.summary());
            if let Some(path) = output {
                write_report(&report, &path)?;
            }
        }
        Commands::Classify { input, output } => {
            let classifier = SignatureClassifier::new(config.signature.clone());
            let records = io::read_records_async(&input).await?;
            let annotated = classifier.annotate(&records);

            for row in &annotated {
                let evaluation = classifier.evaluate(row.record());
                println!(
                    "{}\t{}\tscore={}\t{}",
                    row.record().id(),
                    if evaluation.positive { "positive" } else { "negative" },
                    evaluation.score,
                    evaluation.matched.join(",")
                );
            }

            if let Some(path) = output {
                io::write_records_async(&path, annotated).await?;
            }
        }
    }

    Ok(())
}
