use clap::{Parser, Subcommand};
use std::path::PathBuf;
use style_morph::app::AppState;
use style_morph::config::{self, Credential, DEFAULT_CONFIG_FILE};
use style_morph::generation::GenerationRequest;
use style_morph::imaging::{RustBackend, compress_image};
use style_morph::store::generate_id;
use style_morph::{output, server};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "style-morph")]
#[command(about = "Restyle and caption photos with Gemini, shared by short URL")]
#[command(long_about = "\
Restyle and caption photos with Gemini, shared by short URL

A photo is downscaled to at most 1024px, re-encoded as JPEG, then sent to
Gemini twice at once: once to redraw it in a described style, once to write
text about it in a chosen language. The result is stored under a short id
and shown at /id/<id>.

Links of the form /<prompt>/id/<id> open a quick capture page that only
writes text, following <prompt>.

The Gemini API key is read from API_KEY (or GEMINI_API_KEY).

Run 'style-morph gen-config' to generate a documented style-morph.toml.")]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the web service
    Serve {
        /// Listen address, overriding server.bind
        #[arg(long)]
        bind: Option<String>,
    },
    /// Create a post from a photo file
    Create {
        /// Photo to upload
        image: PathBuf,
        /// Style to redraw the photo in
        #[arg(long, default_value = "")]
        style: String,
        /// Instruction for the generated text
        #[arg(long, default_value = "")]
        caption_prompt: String,
        /// Language of the generated text (defaults to generation.default_language)
        #[arg(long)]
        language: Option<String>,
        /// Post id (a fresh one is generated when omitted)
        #[arg(long)]
        id: Option<String>,
        /// Show only the result on the post page
        #[arg(long)]
        minimal: bool,
    },
    /// Print a stored post
    Show {
        id: String,
    },
    /// Downscale and re-encode a photo without uploading it
    Compress {
        image: PathBuf,
        /// Write the JPEG here
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print a freshly generated post id
    NewId,
    /// Print a stock style-morph.toml with all options documented
    GenConfig,
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("style_morph=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Command::Serve { bind } => {
            let config = config::load_config(&cli.config)?;
            let state = AppState::from_config(&config, Credential::from_env());
            let addr = bind.unwrap_or_else(|| config.server.bind.clone());
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            println!("==> Serving on http://{}", listener.local_addr()?);
            server::serve(listener, server::router(state, &config.server)).await?;
        }
        Command::Create {
            image,
            style,
            caption_prompt,
            language,
            id,
            minimal,
        } => {
            let config = config::load_config(&cli.config)?;
            config.store.require_persistent("create")?;
            let state = AppState::from_config(&config, Credential::from_env());
            let source = std::fs::read(&image)?;
            let language = language.unwrap_or_else(|| state.default_language.clone());
            let request = GenerationRequest::from_prompts(&style, &caption_prompt, &language);
            let id = id.unwrap_or_else(generate_id);

            println!("==> Creating post {} from {}", id, image.display());
            let post = state.create_post(&id, source, &request, minimal).await?;
            output::print_post(&post, &config.server.public_url);
        }
        Command::Show { id } => {
            let config = config::load_config(&cli.config)?;
            config.store.require_persistent("show")?;
            let state = AppState::from_config(&config, Credential::from_env());
            match state.load_post(&id).await {
                Some(post) => output::print_post(&post, &config.server.public_url),
                None => {
                    eprintln!("Post {} not found", id);
                    std::process::exit(1);
                }
            }
        }
        Command::Compress {
            image,
            output: out_path,
        } => {
            let config = config::load_config(&cli.config)?;
            let source = std::fs::read(&image)?;
            let compressed =
                compress_image(&RustBackend::new(), &source, &config.images.compress_config())?;
            output::print_compressed(&compressed);
            if let Some(path) = out_path {
                std::fs::write(&path, compressed.data_uri.decode()?)?;
                println!("==> Wrote {}", path.display());
            }
        }
        Command::NewId => {
            println!("{}", generate_id());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
