use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use candle_core::Device;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use ravensaid::{generate_c_header, Ravensaid};
use ravensaid_common::{Corpus, RavensaidConfig};
use ravensaid_train::{evaluate, Trainer, TrainerConfig};

#[derive(Parser, Debug)]
#[command(name = "ravensaid", about = "Estimate how likely it is that Ravenholdt wrote a message")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train a network on labelled corpus files.
    Train(TrainArgs),
    /// Interactively score messages read from stdin.
    Run(RunArgs),
    /// Score a single message.
    Score(ScoreArgs),
    /// Report validation accuracy of a saved network.
    Eval(EvalArgs),
    /// Write the C header for libravensaid.
    Header(HeaderArgs),
}

// ── Corpus ─────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
struct CorpusArgs {
    /// Messages by the author. Comma-separated files are read back to back.
    #[arg(long, default_value = "data/ravenholdt.txt")]
    author: String,
    /// Messages by someone else; repeat for each source. Comma-separated files
    /// are read back to back.
    #[arg(long = "other", default_values = ["data/berk.txt,data/sidju.txt", "data/dreamer.txt"])]
    others: Vec<String>,
    /// The first 1/N of the interleaved corpus is held out for validation.
    #[arg(long, default_value_t = 5)]
    validation_divisor: usize,
}

impl CorpusArgs {
    fn load(&self) -> Result<Corpus> {
        let others: Vec<_> = self.others.iter().map(|s| parse_chain(s)).collect();
        Corpus::from_files(&parse_chain(&self.author), &others)
    }
}

fn parse_chain(s: &str) -> Vec<PathBuf> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .collect()
}

// ── Train ──────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
struct TrainArgs {
    #[command(flatten)]
    corpus: CorpusArgs,
    /// Network config JSON; defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
    /// Prepended to checkpoint file names.
    #[arg(long, default_value = "")]
    prefix: String,
    #[arg(long, default_value_t = 100)]
    epochs: usize,
    #[arg(long, default_value_t = 5e-6)]
    lr: f64,
    /// Learning rate for the second half of training.
    #[arg(long, default_value_t = 1e-6)]
    lr_late: f64,
    #[arg(long, default_value_t = 0.5)]
    grad_clip: f64,
    #[arg(long, default_value_t = 1)]
    batch_size: usize,
    #[arg(long, default_value_t = 10)]
    slices: usize,
    #[arg(long, default_value_t = 1)]
    save_every: usize,
    /// Continue from saved weights.
    #[arg(long)]
    resume: Option<PathBuf>,
}

// ── Run / Score / Eval / Header ────────────────────────────────────────────────

#[derive(Parser, Debug)]
struct RunArgs {
    model: PathBuf,
}

#[derive(Parser, Debug)]
struct ScoreArgs {
    model: PathBuf,
    message: String,
}

#[derive(Parser, Debug)]
struct EvalArgs {
    model: PathBuf,
    #[command(flatten)]
    corpus: CorpusArgs,
    #[arg(long, default_value_t = 32)]
    batch_size: usize,
}

#[derive(Parser, Debug)]
struct HeaderArgs {
    /// Write here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Train(args) => cmd_train(args).map(|()| ExitCode::SUCCESS),
        Command::Run(args) => cmd_run(args).map(|()| ExitCode::SUCCESS),
        Command::Score(args) => cmd_score(args),
        Command::Eval(args) => cmd_eval(args).map(|()| ExitCode::SUCCESS),
        Command::Header(args) => cmd_header(args).map(|()| ExitCode::SUCCESS),
    }
}

// ── Command implementations ────────────────────────────────────────────────────

fn cmd_train(args: TrainArgs) -> Result<()> {
    let net_config = match args.config {
        Some(ref p) => RavensaidConfig::load(p)?,
        None => RavensaidConfig::default(),
    };

    let corpus = args.corpus.load()?;
    let (training, validation) = corpus.split_validation(args.corpus.validation_divisor)?;
    eprintln!(
        "Added {} sentences to train on and {} to validate with.",
        training.len(),
        validation.len()
    );

    let trainer_config = TrainerConfig {
        epochs: args.epochs,
        lr: args.lr,
        lr_late: args.lr_late,
        grad_clip_value: args.grad_clip,
        batch_size: args.batch_size,
        slices: args.slices,
        save_every: args.save_every,
        output_dir: args.output_dir.clone(),
        prefix: args.prefix.clone(),
    };

    let device = Device::cuda_if_available(0)?;
    let mut trainer = Trainer::new(net_config, trainer_config, device)?;
    if let Some(ref p) = args.resume {
        trainer.load_weights(p)?;
    }

    let pb = ProgressBar::new(args.epochs as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} epochs")?
            .progress_chars("=>-"),
    );

    for epoch in 0..args.epochs {
        let m = trainer.train_epoch(epoch, &training)?;
        let eval = trainer.evaluate(&validation)?;
        tracing::info!(
            epoch,
            loss = m.loss,
            lr = m.lr,
            val_loss = eval.loss,
            accuracy = eval.accuracy,
            "Epoch complete"
        );
        pb.println(format!(
            "prefix: {:?}, epoch: {epoch}, loss: {:.4}, lr: {:.2e}",
            args.prefix, m.loss, m.lr
        ));
        pb.println(format!(
            "  tested on {} sentences, {} passed, {:.2}% success",
            eval.total,
            eval.passed,
            100.0 * eval.accuracy
        ));

        if args.save_every > 0 && (epoch + 1) % args.save_every == 0 {
            let path = trainer.save_checkpoint(epoch)?;
            pb.println(format!("  saved checkpoint to {}", path.display()));
        }
        pb.inc(1);
    }
    pb.finish_with_message("done");

    let path = trainer.save_final()?;
    eprintln!("Training done. Saved to {}", path.display());
    Ok(())
}

fn cmd_run(args: RunArgs) -> Result<()> {
    let model = load_model(&args.model)?;
    eprintln!("Ready. Type 'exit' to quit.\n");
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    model.score_loop(stdin.lock(), stdout.lock())?;
    Ok(())
}

fn cmd_score(args: ScoreArgs) -> Result<ExitCode> {
    let model = match load_model(&args.model) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error, couldn't load neural network: {e:#}");
            return Ok(ExitCode::from(1));
        }
    };
    match model.score(&args.message) {
        Ok(score) => {
            println!(
                "Message: {:?}\nProbability of being written by Ravenholdt: {score}",
                args.message
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("Error {}, failed processing message: {e}", e.code());
            Ok(ExitCode::from(2))
        }
    }
}

fn cmd_eval(args: EvalArgs) -> Result<()> {
    let model = load_model(&args.model)?;
    let corpus = args.corpus.load()?;
    let (_, validation) = corpus.split_validation(args.corpus.validation_divisor)?;
    let eval = evaluate(model.net(), &validation, args.batch_size, model.device())?;
    println!(
        "Tested on {} sentences, {} passed, {:.2}% success (loss {:.4})",
        eval.total,
        eval.passed,
        100.0 * eval.accuracy,
        eval.loss
    );
    Ok(())
}

fn cmd_header(args: HeaderArgs) -> Result<()> {
    let header = generate_c_header();
    match args.output {
        Some(ref p) => {
            std::fs::write(p, header).with_context(|| format!("write {}", p.display()))?;
            eprintln!("Wrote {}", p.display());
        }
        None => print!("{header}"),
    }
    Ok(())
}

fn load_model(path: &Path) -> Result<Ravensaid> {
    eprintln!("Loading network from {} ...", path.display());
    Ravensaid::load(path).with_context(|| format!("load {}", path.display()))
}
