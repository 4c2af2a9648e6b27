// gpt4all/crates/gpt4all/src/main.rs

#[cfg(feature = "cli")]
mod cli {
    use anyhow::{Context, Result};
    use clap::{Parser, Subcommand};
    use gpt4all::{
        telemetry, ChatOptions, Config, ConversationMessage, GenerateOptions, ModelResolver,
        ServerEngineFactory, StdoutSink, GPT4All,
    };
    use std::path::PathBuf;
    use std::sync::Arc;

    #[derive(Debug, Parser)]
    #[command(name = "gpt4all", version, about = "Run GPT4All models from the command line")]
    struct Cli {
        /// Model file (defaults to MODEL_PATH)
        #[arg(short, long, global = true)]
        model: Option<PathBuf>,

        /// Backend type for custom model files: gptj or llama (defaults to MODEL_TYPE)
        #[arg(short = 't', long, global = true)]
        model_type: Option<String>,

        /// Do not echo prompts and responses
        #[arg(short, long, global = true)]
        quiet: bool,

        #[command(subcommand)]
        command: Command,
    }

    #[derive(Debug, Subcommand)]
    enum Command {
        /// Show which backend a model would be loaded with
        Resolve,
        /// List the known model files
        Models,
        /// Generate a completion for a raw prompt
        Generate {
            prompt: String,
            /// Engine option as key=value, repeatable
            #[arg(short = 'p', long = "param")]
            params: Vec<String>,
        },
        /// Run a chat completion over a JSON file of {role, content} messages
        Chat {
            messages: PathBuf,
            #[arg(long)]
            no_header: bool,
            #[arg(long)]
            no_footer: bool,
            #[arg(short = 'p', long = "param")]
            params: Vec<String>,
        },
    }

    fn generate_options(verbose: bool, params: &[String]) -> Result<GenerateOptions> {
        params
            .iter()
            .try_fold(GenerateOptions::new().verbose(verbose), |options, pair| {
                options.parse_param(pair).map_err(anyhow::Error::msg)
            })
    }

    struct Target {
        model_path: PathBuf,
        model_type: Option<String>,
    }

    impl Target {
        fn resolve(cli_model: Option<PathBuf>, cli_type: Option<String>, cfg: &Config) -> Result<Self> {
            let model_path = cfg
                .select_model_path(cli_model.as_deref())
                .context("No model given. Pass --model or set MODEL_PATH")?;
            Ok(Self {
                model_path,
                model_type: cli_type.or_else(|| cfg.model_type.clone()),
            })
        }

        fn load(&self, cfg: &Config) -> Result<GPT4All> {
            let factory = ServerEngineFactory::new(cfg.runtime.clone());
            let model = GPT4All::with_factory(
                &self.model_path,
                self.model_type.as_deref(),
                &factory,
                Arc::new(StdoutSink),
            )?;
            Ok(model)
        }
    }

    pub fn run() -> Result<()> {
        let cli = Cli::parse();
        telemetry::init_tracing("warn");

        let cfg = Config::from_env()?;
        cfg.print_config();
        let verbose = cfg.verbose && !cli.quiet;

        match cli.command {
            Command::Models => {
                for (filename, variant) in ModelResolver::known_filenames() {
                    println!("{:<40} {}", filename, variant.type_tag());
                }
            }
            Command::Resolve => {
                let target = Target::resolve(cli.model, cli.model_type, &cfg)?;
                let variant = ModelResolver::resolve(&target.model_path, target.model_type.as_deref())?;
                println!("{}", variant.type_tag());
            }
            Command::Generate { prompt, params } => {
                let options = generate_options(verbose, &params)?;
                let mut model = Target::resolve(cli.model, cli.model_type, &cfg)?.load(&cfg)?;
                let response = model.generate(&prompt, &options)?;
                if !verbose {
                    println!("{}", response);
                }
            }
            Command::Chat {
                messages: path,
                no_header,
                no_footer,
                params,
            } => {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                let messages: Vec<ConversationMessage> = serde_json::from_str(&raw)
                    .with_context(|| format!("Invalid chat messages in {}", path.display()))?;
                let options = ChatOptions {
                    generate: generate_options(verbose, &params)?,
                    ..ChatOptions::default()
                }
                .header(!no_header)
                .footer(!no_footer);

                let mut model = Target::resolve(cli.model, cli.model_type, &cfg)?.load(&cfg)?;
                let completion = model.chat_completion(&messages, &options)?;
                println!("{}", serde_json::to_string_pretty(&completion)?);
            }
        }

        Ok(())
    }
}

#[cfg(feature = "cli")]
fn main() -> anyhow::Result<()> {
    cli::run()
}

#[cfg(not(feature = "cli"))]
fn main() {
    println!("CLI feature not enabled. Enable with --features cli");
}
