use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use pagesmith::{
    export_notice, DeviceMode, Download, EditorConfig, EditorSession, FsResourceLoader,
    Notice, StillFormat, Target, Workbench,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pagesmith", version, about = "Assemble, preview and export HTML/CSS")]
struct Cli {
    /// JSON configuration file (missing fields keep their defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the preview document to stdout
    Assemble(Buffers),
    /// Write the standalone .html document
    Export(Buffers),
    /// Capture a still image of the preview
    Still {
        #[command(flatten)]
        buffers: Buffers,
        #[arg(long, value_enum, default_value_t = Format::Png)]
        format: Format,
        #[arg(long, value_enum, default_value_t = Device::Desktop)]
        device: Device,
    },
    /// Capture the slide set as an animation
    Animate {
        #[command(flatten)]
        buffers: Buffers,
        #[arg(long, value_enum, default_value_t = Device::Desktop)]
        device: Device,
    },
}

#[derive(Args)]
struct Buffers {
    /// Markup file; omit to use the starter page
    #[arg(long)]
    html: Option<PathBuf>,
    /// Stylesheet file
    #[arg(long)]
    css: Option<PathBuf>,
    /// Directory downloads are written to
    #[arg(long, default_value = ".")]
    out: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Png,
    Jpeg,
}

#[derive(Clone, Copy, ValueEnum)]
enum Device {
    Desktop,
    Tablet,
    Mobile,
}

impl From<Format> for StillFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Png => StillFormat::Png,
            Format::Jpeg => StillFormat::Jpeg,
        }
    }
}

impl From<Device> for DeviceMode {
    fn from(d: Device) -> Self {
        match d {
            Device::Desktop => DeviceMode::Desktop,
            Device::Tablet => DeviceMode::Tablet,
            Device::Mobile => DeviceMode::Mobile,
        }
    }
}

fn report(notice: &Notice) {
    if notice.is_error() {
        eprintln!("{}: {}", notice.title, notice.description);
    } else {
        eprintln!("{} {}", notice.title, notice.description);
    }
}

fn load_session(buffers: &Buffers) -> Result<EditorSession> {
    let mut session = if buffers.html.is_some() || buffers.css.is_some() {
        EditorSession::default()
    } else {
        EditorSession::with_starter()
    };
    if let Some(path) = &buffers.html {
        let notice = session
            .load_markup_file(path)
            .with_context(|| format!("reading {}", path.display()))?;
        report(&notice);
    }
    if let Some(path) = &buffers.css {
        let notice = session
            .load_style_file(path)
            .with_context(|| format!("reading {}", path.display()))?;
        report(&notice);
    }
    Ok(session)
}

fn base_dir(buffers: &Buffers) -> PathBuf {
    buffers
        .html
        .as_deref()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn save(result: pagesmith::Result<Download>, out: &Path) -> Result<()> {
    report(&export_notice(&result));
    let download = result?;
    let path = download
        .save_to(out)
        .with_context(|| format!("writing {} into {}", download.filename, out.display()))?;
    println!("{}", path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EditorConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EditorConfig::default(),
    };

    match cli.command {
        Command::Assemble(buffers) => {
            let session = load_session(&buffers)?;
            println!("{}", session.assemble(&config.assembler(), Target::Preview));
        }
        Command::Export(buffers) => {
            let session = load_session(&buffers)?;
            let workbench = Workbench::new(config, FsResourceLoader::new(base_dir(&buffers)))?;
            save(Ok(workbench.export_document(&session)), &buffers.out)?;
        }
        Command::Still {
            buffers,
            format,
            device,
        } => {
            let session = load_session(&buffers)?;
            let workbench = Workbench::new(config, FsResourceLoader::new(base_dir(&buffers)))?;
            workbench.set_device(device.into()).await;
            workbench.refresh(&session).await;
            save(workbench.export_still(format.into()).await, &buffers.out)?;
        }
        Command::Animate { buffers, device } => {
            let session = load_session(&buffers)?;
            let workbench = Workbench::new(config, FsResourceLoader::new(base_dir(&buffers)))?;
            workbench.set_device(device.into()).await;
            workbench.refresh(&session).await;
            save(workbench.export_animation().await, &buffers.out)?;
        }
    }
    Ok(())
}
