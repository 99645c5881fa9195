use clap::{Args, Parser, Subcommand};
use rgen_studio::{
    logger::{self, LogLevel, LoggerConfig},
    BedrockClient, Config, Feedback, GenerationDefaults, GenerationParams, GenerationRequest,
    GenerationResult, ImageClient, NormalizedImage, SeedMode, Session, SourceImage, StylePreset,
    TitanQuality,
};
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Generate images on AWS Bedrock from a prompt and an optional photo.
#[derive(Parser, Debug)]
#[command(name = "rgen-studio", version, about, long_about = None)]
struct Cli {
    /// AWS region (overrides AWS_REGION).
    #[arg(long, global = true)]
    region: Option<String>,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate one image and save it as PNG.
    Generate(GenerateArgs),
    /// Interactive session reading prompts and commands from stdin.
    Session(DraftArgs),
    /// List the supported image models.
    Models,
    /// List the style presets.
    Styles,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Prompt text.
    #[arg(short, long)]
    prompt: String,

    /// Output PNG path. Defaults to a generated name in the current directory.
    #[arg(short, long, value_name = "PATH")]
    out: Option<PathBuf>,

    #[command(flatten)]
    draft: DraftArgs,
}

#[derive(Args, Debug)]
struct DraftArgs {
    /// PNG or JPEG photo to condition on (image-to-image).
    #[arg(short, long, value_name = "PATH")]
    image: Option<PathBuf>,

    /// Model id, e.g. amazon.titan-image-generator-v1 or stability.sd3-medium-v1.
    #[arg(short, long)]
    model: Option<String>,

    /// Style preset, see `rgen-studio styles`.
    #[arg(short, long)]
    style: Option<StylePreset>,

    /// Pin the seed for reproducible output.
    #[arg(long)]
    seed: Option<u32>,

    #[arg(long, value_name = "FLOAT")]
    cfg_scale: Option<f32>,

    #[arg(long)]
    steps: Option<u32>,

    /// Titan quality tier: standard or premium.
    #[arg(long)]
    quality: Option<TitanQuality>,
}

/// The form state a request is built from.
struct Draft {
    model_id: String,
    style: Option<StylePreset>,
    image: Option<NormalizedImage>,
    params: GenerationParams,
}

impl Draft {
    fn new(defaults: &GenerationDefaults, args: &DraftArgs) -> rgen_studio::Result<Self> {
        let mut params = defaults.params.clone();
        if let Some(seed) = args.seed {
            params.seed = SeedMode::Fixed(seed);
        }
        if let Some(cfg_scale) = args.cfg_scale {
            params.guidance_scale = cfg_scale;
        }
        if let Some(steps) = args.steps {
            params.steps = steps;
        }
        if let Some(quality) = args.quality {
            params.quality = quality;
        }

        let image = match &args.image {
            Some(path) => Some(load_conditioning_image(path)?),
            None => None,
        };

        Ok(Self {
            model_id: args
                .model
                .clone()
                .unwrap_or_else(|| defaults.model_id.clone()),
            style: args.style,
            image,
            params,
        })
    }

    fn request(&self, prompt: &str) -> rgen_studio::Result<GenerationRequest> {
        let mut request =
            GenerationRequest::new(&self.model_id, prompt)?.with_params(self.params.clone());
        if let Some(style) = self.style {
            request = request.with_style(style);
        }
        if let Some(image) = &self.image {
            request = request.with_conditioning_image(image.clone());
        }
        Ok(request)
    }
}

fn load_conditioning_image(path: &Path) -> rgen_studio::Result<NormalizedImage> {
    let source = SourceImage::from_path(path)?;
    let normalized = NormalizedImage::from_source(&source)?;
    log::info!(
        "🖼️  Loaded {} ({}x{}) normalized to {}x{}",
        path.display(),
        source.width,
        source.height,
        normalized.width(),
        normalized.height()
    );
    Ok(normalized)
}

fn report(feedback: &Feedback) {
    eprintln!("❌ {}", feedback.message);
    if let Some(hint) = feedback.hint {
        log::warn!("💡 {}", hint);
    }
}

fn save(result: &GenerationResult, out: Option<&Path>) -> Result<PathBuf, Feedback> {
    let path = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(result.file_name()));
    result
        .save_png(&path)
        .map_err(|e| Feedback::from(&e))?;
    log::info!("💾 Image saved to: {}", path.display());
    Ok(path)
}

enum Outcome {
    Done(Result<GenerationResult, Feedback>),
    Cancelled,
}

/// One user action, abandoned on Ctrl-C.
async fn run_action(
    session: &mut Session,
    client: &BedrockClient,
    request: &GenerationRequest,
) -> Outcome {
    tokio::select! {
        outcome = session.submit(client, request) => Outcome::Done(outcome),
        _ = tokio::signal::ctrl_c() => Outcome::Cancelled,
    }
}

async fn run_generate(
    client: &BedrockClient,
    session: &mut Session,
    defaults: &GenerationDefaults,
    args: &GenerateArgs,
) -> ExitCode {
    let request = match Draft::new(defaults, &args.draft).and_then(|d| d.request(&args.prompt)) {
        Ok(request) => request,
        Err(err) => {
            report(&Feedback::from(&err));
            return ExitCode::FAILURE;
        }
    };

    match run_action(session, client, &request).await {
        Outcome::Done(Ok(result)) => match save(&result, args.out.as_deref()) {
            Ok(path) => {
                println!("{}", path.display());
                ExitCode::SUCCESS
            }
            Err(feedback) => {
                report(&feedback);
                ExitCode::FAILURE
            }
        },
        Outcome::Done(Err(feedback)) => {
            report(&feedback);
            ExitCode::FAILURE
        }
        Outcome::Cancelled => {
            log::warn!("⚠️  Generation cancelled");
            ExitCode::from(130)
        }
    }
}

const SESSION_HELP: &str = "Type a prompt to generate. Commands: :image PATH | :image, :style NAME | :style, \
:model ID, :seed N | :seed random, :history, :clear, :quit";

fn handle_command(line: &str, draft: &mut Draft, session: &mut Session) -> rgen_studio::Result<bool> {
    let (command, arg) = match line.split_once(' ') {
        Some((command, arg)) => (command, arg.trim()),
        None => (line, ""),
    };

    match command {
        ":quit" | ":q" => return Ok(false),
        ":image" if arg.is_empty() => {
            draft.image = None;
            println!("Conditioning image cleared (text-to-image)");
        }
        ":image" => draft.image = Some(load_conditioning_image(Path::new(arg))?),
        ":style" if arg.is_empty() => draft.style = None,
        ":style" => draft.style = Some(arg.parse()?),
        ":model" => {
            rgen_studio::ModelFamily::from_model_id(arg)?;
            draft.model_id = arg.to_string();
        }
        ":seed" if arg == "random" => draft.params.seed = SeedMode::Random,
        ":seed" => {
            let seed = arg.parse::<u32>().map_err(|_| {
                rgen_studio::BedrockError::InvalidInput(format!("'{}' is not a seed", arg))
            })?;
            draft.params.seed = SeedMode::Fixed(seed);
        }
        ":history" => {
            for (i, prompt) in session.history().entries().iter().enumerate() {
                println!("{:>3}. {}", i + 1, prompt);
            }
        }
        ":clear" => {
            session.clear_history();
            println!("History cleared");
        }
        _ => println!("{}", SESSION_HELP),
    }
    Ok(true)
}

async fn run_session(
    client: &BedrockClient,
    session: &mut Session,
    defaults: &GenerationDefaults,
    args: &DraftArgs,
) -> ExitCode {
    let mut draft = match Draft::new(defaults, args) {
        Ok(draft) => draft,
        Err(err) => {
            report(&Feedback::from(&err));
            return ExitCode::FAILURE;
        }
    };

    println!("{}", SESSION_HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = tokio::signal::ctrl_c() => break,
        };
        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                log::error!("❌ Failed to read input: {}", e);
                return ExitCode::FAILURE;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with(':') {
            match handle_command(line, &mut draft, session) {
                Ok(true) => continue,
                Ok(false) => break,
                Err(err) => {
                    report(&Feedback::from(&err));
                    continue;
                }
            }
        }

        let request = match draft.request(line) {
            Ok(request) => request,
            Err(err) => {
                report(&Feedback::from(&err));
                continue;
            }
        };

        match run_action(session, client, &request).await {
            Outcome::Done(Ok(result)) => match save(&result, None) {
                Ok(path) => println!("✅ {} (seed {})", path.display(), result.seed),
                Err(feedback) => report(&feedback),
            },
            Outcome::Done(Err(feedback)) => report(&feedback),
            Outcome::Cancelled => log::warn!("⚠️  Generation cancelled"),
        }
    }

    log::info!(
        "👋 Session ended after {} prompt(s)",
        session.history().len()
    );
    ExitCode::SUCCESS
}

/// First few characters of an access key id, safe to log.
fn key_prefix(access_key: &str) -> String {
    access_key.chars().take(5).collect()
}

fn check_aws_environment() {
    if let Ok(profile) = env::var("AWS_PROFILE") {
        log::info!("AWS_PROFILE: {}", profile);
    }

    match (
        env::var("AWS_ACCESS_KEY_ID"),
        env::var("AWS_SECRET_ACCESS_KEY"),
    ) {
        (Ok(access_key), Ok(_)) => {
            log::info!("✅ AWS credentials found in environment");
            log::debug!(
                "Access Key ID starts with: {}...",
                key_prefix(&access_key)
            );
        }
        _ => {
            log::warn!("⚠️  No AWS credentials in environment variables, will try default credential chain");
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    let cli = Cli::parse();

    let logger_config = if cli.verbose {
        LoggerConfig::development()
    } else {
        LoggerConfig::default().with_level(LogLevel::Info)
    };
    logger::init_with_config(logger_config)?;

    if dotenv_loaded {
        log::debug!("✅ .env file loaded successfully");
    } else {
        log::debug!("No .env file found, using system environment variables");
    }

    match &cli.command {
        Command::Models => {
            for (id, name, provider) in ImageClient::supported_models() {
                println!("{:<36} {} ({})", id, name, provider);
            }
            return Ok(ExitCode::SUCCESS);
        }
        Command::Styles => {
            for preset in StylePreset::ALL {
                println!("{}", preset);
            }
            return Ok(ExitCode::SUCCESS);
        }
        Command::Generate(_) | Command::Session(_) => {}
    }

    let mut config = Config::from_env()?;
    if let Some(region) = cli.region {
        config.bedrock = config.bedrock.with_region(region);
    }

    logger::log_startup_info(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    logger::log_config_info(&config);
    check_aws_environment();

    let client = match BedrockClient::new(config.bedrock.clone()).await {
        Ok(client) => client.with_timeout(config.generation.timeout),
        Err(e) => {
            log::error!("❌ Failed to initialize Bedrock client: {}", e);
            return Err(e.into());
        }
    };
    let mut session = Session::for_client(&client);

    let code = match &cli.command {
        Command::Generate(args) => {
            run_generate(&client, &mut session, &config.generation, args).await
        }
        Command::Session(args) => run_session(&client, &mut session, &config.generation, args).await,
        Command::Models | Command::Styles => ExitCode::SUCCESS,
    };

    Ok(code)
}
