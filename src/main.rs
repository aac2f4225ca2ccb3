use clap::{Parser, Subcommand};
use imgvar::imaging::RustBackend;
use imgvar::logging::{self, LogFormat};
use imgvar::resolver::{CACHE_CONTROL, ResolvedImage, VariantResolver};
use imgvar::{config, normalize, output};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn version_string() -> &'static str {
    let hash = env!("GIT_HASH");
    if hash.is_empty() {
        env!("CARGO_PKG_VERSION")
    } else {
        // Leaked once at startup
        Box::leak(format!("{}@{hash}", env!("CARGO_PKG_VERSION")).into_boxed_str())
    }
}

/// Flags shared by commands that resolve a single image.
#[derive(clap::Args, Clone)]
struct RequestArgs {
    /// Image path relative to the root (e.g. avatars/u1)
    path: String,

    /// Named variant; unknown names serve the original pixels
    #[arg(long)]
    variant: Option<String>,

    /// Output format: png, jpg/jpeg, webp, gif, svg
    #[arg(long)]
    format: Option<String>,
}

#[derive(Parser)]
#[command(name = "imgvar")]
#[command(about = "On-demand image variants served from a directory tree")]
#[command(long_about = "\
On-demand image variants served from a directory tree

Requests name a logical image path, an optional variant and an optional
format. The first request for a variant decodes the source, transforms it
and writes the result next to the source; later requests reuse that file.

Image root layout:

  data/
  ├── avatars/
  │   ├── u1                       # Source (extensionless upload, PNG)
  │   ├── u1.preview.png           # Derived: preview variant as PNG
  │   ├── u1.original.jpg          # Derived: original pixels as JPEG
  │   ├── u2.jpg                   # Source with extension
  │   └── u2.jpg.preview.png       # Derived: preview of u2.jpg as PNG
  └── icons/
      └── logo.svg                 # Served as-is

Source lookup order: exact path, then .png, .jpg, .webp, .jpeg.
Hidden files and directories are never served.

Run 'imgvar gen-config' to generate a documented imgvar.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Image root directory (overrides the config file)
    #[arg(long, env = "DATA_PATH", global = true)]
    root: Option<PathBuf>,

    /// Config file (default: ./imgvar.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a request and print which file answers it
    Resolve {
        #[command(flatten)]
        request: RequestArgs,

        /// Print the resolution as JSON
        #[arg(long)]
        json: bool,
    },
    /// Resolve a request and write the image bytes
    Fetch {
        #[command(flatten)]
        request: RequestArgs,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write an extensionless PNG next to every source that lacks one
    Normalize,
    /// Print a stock imgvar.toml with all options documented
    GenConfig,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let Cli {
        root,
        config: config_path,
        json_logs,
        command,
    } = Cli::parse();

    match command {
        Command::Resolve { request, json } => {
            let server_config = setup(root, config_path.as_deref(), json_logs)?;
            let resolver = VariantResolver::new(server_config.resolver_config());
            let Some(resolved) = resolve_or_report(&resolver, &request) else {
                return Ok(ExitCode::FAILURE);
            };
            if json {
                let mut value = serde_json::to_value(&resolved)?;
                if let Some(obj) = value.as_object_mut() {
                    obj.insert("status".into(), resolved.status().into());
                    obj.insert("cache_control".into(), CACHE_CONTROL.into());
                }
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                output::print_resolution(&resolved, &resolver.config().root);
            }
        }
        Command::Fetch {
            request,
            output: out_file,
        } => {
            let server_config = setup(root, config_path.as_deref(), json_logs)?;
            let resolver = VariantResolver::new(server_config.resolver_config());
            let Some(resolved) = resolve_or_report(&resolver, &request) else {
                return Ok(ExitCode::FAILURE);
            };
            let bytes = resolved.read_bytes()?;
            match out_file {
                Some(path) => std::fs::write(path, &bytes)?,
                None => {
                    let mut stdout = std::io::stdout().lock();
                    stdout.write_all(&bytes)?;
                    stdout.flush()?;
                }
            }
        }
        Command::Normalize => {
            let server_config = setup(root, config_path.as_deref(), json_logs)?;
            init_thread_pool(&server_config.processing);
            let stats = normalize::normalize_root(&RustBackend::new(), &server_config.root)?;
            output::print_normalize_stats(&stats, &server_config.root);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Load the config, apply command-line overrides, and start logging.
fn setup(
    root: Option<PathBuf>,
    config_path: Option<&Path>,
    json_logs: bool,
) -> Result<config::ServerConfig, config::ConfigError> {
    let mut server_config = match config_path {
        Some(path) => config::load_config_file(path)?,
        None => config::load_config(&std::env::current_dir()?)?,
    };
    if let Some(root) = root {
        server_config.root = root;
    }
    server_config.validate()?;

    let log_format = if json_logs {
        LogFormat::Json
    } else {
        server_config.log_format()
    };
    logging::init(log_format, &server_config.logging.filter);
    Ok(server_config)
}

/// Resolve a request, printing the failure when there is one.
fn resolve_or_report(resolver: &VariantResolver, request: &RequestArgs) -> Option<ResolvedImage> {
    resolver
        .resolve(
            &request.path,
            request.variant.as_deref(),
            request.format.as_deref(),
        )
        .inspect_err(output::print_resolve_error)
        .ok()
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; users can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
