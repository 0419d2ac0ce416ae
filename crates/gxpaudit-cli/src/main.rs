mod config;
mod display;

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use clap::{Parser, Subcommand, ValueEnum};
use gxpaudit_ai::{
    ObservationAnalysisPipeline, RequirementsPipeline, Transcriber, transcribe_handwritten,
};
use gxpaudit_core::NewObservation;
use gxpaudit_store::{ObservationRepository, SequentialIds};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::LlmArgs;

#[derive(Parser, Debug)]
#[command(name = "gxpaudit", version, about = "Recover structured audit data from LLM output")]
struct Cli {
    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Json, global = true)]
    format: Format,

    #[command(flatten)]
    llm: LlmArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Text,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a raw requirements response (file or stdin).
    Requirements { file: Option<PathBuf> },
    /// Parse a raw observation analysis response (file or stdin).
    Analysis { file: Option<PathBuf> },
    /// Generate requirements from a prompt file.
    Generate { prompt_file: PathBuf },
    /// Analyze an observation, optionally with images.
    Analyze {
        prompt_file: PathBuf,
        #[arg(long = "image")]
        images: Vec<PathBuf>,
    },
    /// Transcribe an audio file.
    Transcribe { audio_file: PathBuf },
    /// Transcribe a photo of handwritten notes.
    Handwriting { image_file: PathBuf },
    /// Load observations from a JSON array and list them.
    Observations {
        file: PathBuf,
        /// Only observations whose primary requirement has this id.
        #[arg(long)]
        requirement: Option<String>,
        /// Print aggregate counts instead of the list.
        #[arg(long)]
        stats: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.llm.pipeline_config();
    let mut stdout = io::stdout().lock();

    match cli.command {
        Command::Requirements { file } => {
            let raw = read_input(file.as_deref())?;
            let result = RequirementsPipeline::new(config).process(&raw);
            warn_if_degraded(result.error.as_deref());
            match cli.format {
                Format::Json => write_json(&mut stdout, &result)?,
                Format::Text => display::write_requirements_card(&mut stdout, &result)?,
            }
        }
        Command::Analysis { file } => {
            let raw = read_input(file.as_deref())?;
            let result = ObservationAnalysisPipeline::new(config).process(&raw);
            warn_if_degraded(result.error.as_deref());
            match cli.format {
                Format::Json => write_json(&mut stdout, &result)?,
                Format::Text => display::write_analysis_card(&mut stdout, &result)?,
            }
        }
        Command::Generate { prompt_file } => {
            let prompt = read_input(Some(&prompt_file))?;
            let client = cli.llm.chat_client()?;
            let result = RequirementsPipeline::new(config)
                .generate(&client, &prompt)
                .await
                .context("requirements generation failed")?;
            warn_if_degraded(result.error.as_deref());
            match cli.format {
                Format::Json => write_json(&mut stdout, &result)?,
                Format::Text => display::write_requirements_card(&mut stdout, &result)?,
            }
        }
        Command::Analyze {
            prompt_file,
            images,
        } => {
            let prompt = read_input(Some(&prompt_file))?;
            let images = images
                .iter()
                .map(|p| image_data_uri(p))
                .collect::<anyhow::Result<Vec<_>>>()?;
            let client = cli.llm.chat_client()?;
            let result = ObservationAnalysisPipeline::new(config)
                .analyze(&client, &prompt, &images)
                .await
                .context("observation analysis failed")?;
            warn_if_degraded(result.error.as_deref());
            match cli.format {
                Format::Json => write_json(&mut stdout, &result)?,
                Format::Text => display::write_analysis_card(&mut stdout, &result)?,
            }
        }
        Command::Transcribe { audio_file } => {
            let audio = std::fs::read(&audio_file)
                .with_context(|| format!("reading {}", audio_file.display()))?;
            let client = cli.llm.whisper_client()?;
            let text = client
                .transcribe(&audio)
                .await
                .context("transcription failed")?;
            match cli.format {
                Format::Json => write_json(&mut stdout, &serde_json::json!({ "transcription": text }))?,
                Format::Text => writeln!(stdout, "{text}")?,
            }
        }
        Command::Handwriting { image_file } => {
            let image = image_data_uri(&image_file)?;
            let client = cli.llm.chat_client()?;
            let text = transcribe_handwritten(&client, &image)
                .await
                .context("handwriting transcription failed")?;
            match cli.format {
                Format::Json => write_json(&mut stdout, &serde_json::json!({ "transcription": text }))?,
                Format::Text => writeln!(stdout, "{text}")?,
            }
        }
        Command::Observations {
            file,
            requirement,
            stats,
        } => {
            let body = read_input(Some(&file))?;
            let new: Vec<NewObservation> = serde_json::from_str(&body)
                .with_context(|| format!("parsing observations from {}", file.display()))?;

            let mut repo = ObservationRepository::new(SequentialIds::new());
            for obs in new {
                repo.create(obs);
            }
            info!(count = repo.len(), "loaded observations");

            if stats {
                let stats = repo.stats();
                match cli.format {
                    Format::Json => write_json(&mut stdout, &stats)?,
                    Format::Text => display::write_stats(&mut stdout, &stats)?,
                }
            } else {
                let listed = repo.list(requirement.as_deref());
                match cli.format {
                    Format::Json => write_json(&mut stdout, &listed)?,
                    Format::Text => display::write_observation_list(&mut stdout, &listed)?,
                }
            }
        }
    }

    Ok(())
}

/// Read `path`, or all of stdin when no path is given.
fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(p) => std::fs::read_to_string(p).with_context(|| format!("reading {}", p.display())),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            Ok(buf)
        }
    }
}

fn image_data_uri(path: &Path) -> anyhow::Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("reading image {}", path.display()))?;
    Ok(format!(
        "data:{};base64,{}",
        image_media_type(path),
        STANDARD.encode(bytes)
    ))
}

fn image_media_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => gxpaudit_ai::generator::DEFAULT_IMAGE_MEDIA_TYPE,
    }
}

fn write_json(out: &mut impl Write, value: &impl Serialize) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn warn_if_degraded(error: Option<&str>) {
    if let Some(error) = error {
        warn!(%error, "model response could not be parsed, returning degraded result");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn analyze_accepts_repeated_images() {
        let cli = Cli::try_parse_from([
            "gxpaudit", "analyze", "prompt.txt", "--image", "a.png", "--image", "b.jpg",
        ])
        .unwrap();
        match cli.command {
            Command::Analyze { images, .. } => assert_eq!(images.len(), 2),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn handwriting_takes_one_image() {
        let cli = Cli::try_parse_from(["gxpaudit", "handwriting", "notes.jpg"]).unwrap();
        match cli.command {
            Command::Handwriting { image_file } => assert_eq!(image_file, PathBuf::from("notes.jpg")),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn format_flag_is_global() {
        let cli = Cli::try_parse_from(["gxpaudit", "requirements", "--format", "text"]).unwrap();
        assert_eq!(cli.format, Format::Text);
    }

    #[test]
    fn media_type_from_extension() {
        assert_eq!(image_media_type(Path::new("door.PNG")), "image/png");
        assert_eq!(image_media_type(Path::new("door.jpeg")), "image/jpeg");
        assert_eq!(image_media_type(Path::new("door")), "image/jpeg");
    }

    #[test]
    fn json_output_ends_with_newline() {
        let mut buf = Vec::new();
        write_json(&mut buf, &serde_json::json!({"a": 1})).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "{\n  \"a\": 1\n}\n");
    }
}
