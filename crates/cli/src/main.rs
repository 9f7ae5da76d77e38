use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use emotion_lens_core::classification::domain::emotion_classifier::EmotionClassifier;
use emotion_lens_core::classification::infrastructure::face_emotion_analyzer::FaceEmotionAnalyzer;
use emotion_lens_core::classification::infrastructure::onnx_ferplus_model::OnnxFerPlusModel;
use emotion_lens_core::detection::infrastructure::onnx_yolo_detector::OnnxYoloDetector;
use emotion_lens_core::pipeline::detect_emotion_use_case::DetectEmotionUseCase;
use emotion_lens_core::shared::constants::{
    EMOTION_MODEL_NAME, EMOTION_MODEL_URL, FACE_MODEL_NAME, FACE_MODEL_URL, IMAGE_EXTENSIONS,
};
use emotion_lens_core::shared::error::EmotionError;
use emotion_lens_core::shared::model_resolver::{self, ProgressFn};
use emotion_lens_core::shared::settings::Settings;
use emotion_lens_core::upload::image_file_reader::ImageFileReader;

/// Detect the dominant facial emotion in images.
#[derive(Parser)]
#[command(name = "emotion-lens")]
struct Cli {
    /// Input image files.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Face detection confidence threshold (0.0-1.0). Defaults to the saved setting.
    #[arg(long)]
    confidence: Option<f64>,

    /// Fail instead of analyzing the whole image when no face is found.
    #[arg(long, overrides_with = "no_enforce_detection")]
    enforce_detection: bool,

    /// Analyze the whole image when no face is found, even if saved settings enforce detection.
    #[arg(long, overrides_with = "enforce_detection")]
    no_enforce_detection: bool,

    /// Print the analysis of the first face as JSON.
    #[arg(long)]
    json: bool,

    /// Directory with pre-downloaded model files.
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Save the effective confidence and detection settings as the new defaults.
    #[arg(long)]
    save_settings: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let settings = merge_settings(&cli, Settings::load());
    validate(&cli, &settings)?;

    if cli.save_settings {
        if let Some(path) = Settings::config_path() {
            settings.save_to(&path)?;
            log::info!("Saved settings to {}", path.display());
        }
    }

    let classifier = build_classifier(&settings, cli.model_dir.as_deref())?;
    let mut use_case =
        DetectEmotionUseCase::new(classifier).with_options(settings.analysis_options());
    let reader = ImageFileReader::new();

    for input in &cli.inputs {
        let line = describe_input(&mut use_case, &reader, input, cli.json);
        if cli.inputs.len() > 1 {
            println!("{}: {line}", input.display());
        } else {
            println!("{line}");
        }
    }

    Ok(())
}

/// One output line per input; read and analysis failures become the line.
fn describe_input(
    use_case: &mut DetectEmotionUseCase,
    reader: &ImageFileReader,
    input: &Path,
    json: bool,
) -> String {
    let upload = match reader.read(input) {
        Ok(upload) => upload,
        Err(e) => return EmotionError::processing(e).to_string(),
    };
    match (use_case.execute(upload), json) {
        (Ok(detected), true) => serde_json::to_string(&detected.analysis)
            .unwrap_or_else(|e| EmotionError::processing(e).to_string()),
        (Ok(detected), false) => detected.to_string(),
        (Err(e), _) => e.to_string(),
    }
}

fn merge_settings(cli: &Cli, saved: Settings) -> Settings {
    let enforce_detection = if cli.enforce_detection {
        true
    } else if cli.no_enforce_detection {
        false
    } else {
        saved.enforce_detection
    };
    Settings {
        confidence: cli.confidence.unwrap_or(saved.confidence),
        enforce_detection,
    }
}

fn build_classifier(
    settings: &Settings,
    model_dir: Option<&Path>,
) -> Result<Box<dyn EmotionClassifier>, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {FACE_MODEL_NAME}");
    let face_model = model_resolver::resolve(
        FACE_MODEL_NAME,
        FACE_MODEL_URL,
        model_dir,
        Some(download_progress("face detection")),
    )?;
    log::info!("Resolving model: {EMOTION_MODEL_NAME}");
    let emotion_model = model_resolver::resolve(
        EMOTION_MODEL_NAME,
        EMOTION_MODEL_URL,
        model_dir,
        Some(download_progress("emotion")),
    )?;

    let detector = OnnxYoloDetector::new(&face_model, settings.confidence)?;
    let model = OnnxFerPlusModel::new(&emotion_model)?;
    Ok(Box::new(FaceEmotionAnalyzer::new(
        Box::new(detector),
        Box::new(model),
    )))
}

fn validate(cli: &Cli, settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    for input in &cli.inputs {
        if !input.exists() {
            return Err(format!("Input file not found: {}", input.display()).into());
        }
        if !is_image(input) {
            log::warn!("{} does not look like an image file", input.display());
        }
    }
    if !(0.0..=1.0).contains(&settings.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            settings.confidence
        )
        .into());
    }
    if let Some(dir) = &cli.model_dir {
        if !dir.is_dir() {
            return Err(format!("Model directory not found: {}", dir.display()).into());
        }
    }
    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn download_progress(what: &'static str) -> ProgressFn {
    Box::new(move |downloaded, total| {
        if total > 0 {
            let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
            eprint!("\rDownloading {what} model... {pct}%");
            if downloaded >= total {
                eprintln!();
            }
        } else {
            eprint!("\rDownloading {what} model... {downloaded} bytes");
        }
    })
}
