//! Command line tool to tokenize a dataset file and cache the result

use std::path::PathBuf;

use anyhow::anyhow;
use burn::data::dataset::Dataset as _;
use burn_corpora::{
    cache::FsCache,
    datasets::{nli, squad, Dataset},
    tokenizer::{self, Tokenizer},
};
use pico_args::Arguments;

const HELP: &str = "\
Usage: preprocess DATASET PATH [OPTIONS]

Arguments:
  DATASET              The dataset format (e.g., 'squad' or 'nli')
  PATH                 The source file to tokenize

Options:
  -h, --help           Print help
  -m, --model          The tokenizer to use (defaults to 'xlm-roberta-base')
  -e, --evaluate       Extract evaluation examples instead of training examples (squad only)
  --lowercase          Lowercase inputs before tokenizing
  --slow               Key the cache as the slow tokenizer variant
  --local-files-only   Only use tokenizers already in the local Hugging Face cache
";

#[derive(Debug)]
struct Args {
    dataset: String,
    path: PathBuf,
    model: Option<String>,
    evaluate: bool,
    lowercase: bool,
    slow: bool,
    local_files_only: bool,
}

impl Args {
    fn parse() -> anyhow::Result<Option<Self>> {
        let mut pargs = Arguments::from_env();

        // Help has a higher priority and should be handled separately.
        if pargs.contains(["-h", "--help"]) {
            return Ok(None);
        }

        let args = Args {
            model: pargs.opt_value_from_str(["-m", "--model"])?,
            evaluate: pargs.contains(["-e", "--evaluate"]),
            lowercase: pargs.contains("--lowercase"),
            slow: pargs.contains("--slow"),
            local_files_only: pargs.contains("--local-files-only"),
            dataset: pargs.free_from_str().map_err(|e| match e {
                pico_args::Error::MissingArgument => anyhow!("Missing required argument: DATASET"),
                _ => anyhow!("{}", e),
            })?,
            path: pargs.free_from_str().map_err(|e| match e {
                pico_args::Error::MissingArgument => anyhow!("Missing required argument: PATH"),
                _ => anyhow!("{}", e),
            })?,
        };

        Ok(Some(args))
    }
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let Some(args) = Args::parse()? else {
        print!("{}", HELP);

        return Ok(());
    };

    let dataset = Dataset::try_from(args.dataset.as_str())?;

    let mut config = tokenizer::Config::new()
        .with_do_lower_case(args.lowercase)
        .with_use_fast(!args.slow)
        .with_local_files_only(args.local_files_only);

    if let Some(model) = args.model {
        config.model_name = model;
    }

    let tokenizer = Tokenizer::from_pretrained(&config)?;

    let len = match dataset {
        Dataset::Squad => {
            squad::Dataset::load(
                &args.path,
                args.evaluate,
                &tokenizer,
                &squad::Config::new(),
                &FsCache,
            )?
            .len()
        }
        Dataset::Nli => {
            let pairs =
                nli::Dataset::load(&args.path, &tokenizer, &nli::Config::new(), &FsCache)?;

            for (label, count) in pairs.label_counts() {
                println!("  {label}: {count}");
            }

            pairs.len()
        }
    };

    println!("{dataset}: {len} rows from {}", args.path.display());

    Ok(())
}
