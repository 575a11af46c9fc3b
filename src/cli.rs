// ============================================================================
// CollageFE CLI — headless background removal via command-line arguments
// ============================================================================
//
// Usage examples:
//   collagefe --input scan.png --output cutout.png
//   collagefe -i a.jpg b.jpg c.png --output-dir cutouts/
//   collagefe -i logo.png -o logo-cut.png --tolerance 45 --feather 10
//
// No GUI is opened in CLI mode. Each input image gets the same chroma-key
// filter the editor applies on drop, and is written out as PNG (the only
// supported format that keeps the alpha the filter just produced).

use std::path::PathBuf;

use clap::Parser;

use crate::config::EditorConfig;
use crate::ops::chroma_key::{ChromaKeyParams, FilterOutcome, filter_ingredient};

/// CollageFE headless background remover.
///
/// Apply the white chroma-key filter to image files without opening the GUI.
#[derive(Parser, Debug)]
#[command(
    name = "collagefe",
    about = "CollageFE headless background remover",
    long_about = "Key out near-white backgrounds from image files and write the\n\
                  results as PNG, without opening the GUI.\n\n\
                  Example:\n  \
                  collagefe --input scan.png --output cutout.png\n  \
                  collagefe -i a.jpg b.jpg --output-dir cutouts/"
)]
pub struct CliArgs {
    /// Input image file(s). PNG, JPEG, WEBP and BMP are accepted.
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<PathBuf>,

    /// Output file path. Only valid for a single input file.
    #[arg(short, long, value_name = "FILE", conflicts_with = "output_dir")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing. Files are written here with
    /// the original stem and a .png extension.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// RGB distance from white below which pixels become fully transparent.
    #[arg(long, value_name = "DIST")]
    pub tolerance: Option<f32>,

    /// Width of the linear alpha ramp above the tolerance.
    #[arg(long, value_name = "DIST")]
    pub feather: Option<f32>,

    /// Longest image edge after the bounded downscale (never upscales).
    #[arg(long, value_name = "PIXELS")]
    pub max_dimension: Option<u32>,
}

impl CliArgs {
    /// CLI mode is triggered by the presence of the input flag; everything
    /// else launches the GUI.
    pub fn is_cli_mode() -> bool {
        std::env::args().any(|a| a == "--input" || a == "-i")
    }

    fn params(&self) -> ChromaKeyParams {
        let defaults = EditorConfig::load_or_default().chroma;
        ChromaKeyParams {
            tolerance: self.tolerance.unwrap_or(defaults.tolerance),
            feather: self.feather.unwrap_or(defaults.feather),
            max_dimension: self.max_dimension.unwrap_or(defaults.max_dimension),
        }
    }
}

/// Run the batch. Returns the process exit code: non-zero when any file
/// could not be processed; the remaining files are still attempted.
pub fn run(args: CliArgs) -> i32 {
    if args.input.len() > 1 && args.output.is_some() {
        eprintln!("error: --output is only valid for a single input; use --output-dir");
        return 1;
    }

    let params = args.params();
    let mut failures = 0usize;

    for input in &args.input {
        let Some(target) = output_path(input, args.output.as_ref(), args.output_dir.as_ref())
        else {
            eprintln!("{}: cannot derive an output path", input.display());
            failures += 1;
            continue;
        };

        match process_file(input, &target, &params) {
            Ok(filtered) => {
                let note = if filtered { "" } else { " (copied unfiltered)" };
                println!("{} -> {}{}", input.display(), target.display(), note);
            }
            Err(e) => {
                eprintln!("{}: {}", input.display(), e);
                failures += 1;
            }
        }
    }

    if failures == 0 { 0 } else { 1 }
}

/// Resolve where one input's result goes: explicit --output, --output-dir
/// with the input's stem, or `<stem>-cutout.png` next to the input.
fn output_path(
    input: &PathBuf,
    output: Option<&PathBuf>,
    output_dir: Option<&PathBuf>,
) -> Option<PathBuf> {
    if let Some(out) = output {
        return Some(out.clone());
    }
    let stem = input.file_stem()?;
    if let Some(dir) = output_dir {
        let mut name = stem.to_os_string();
        name.push(".png");
        return Some(dir.join(name));
    }
    let mut name = stem.to_os_string();
    name.push("-cutout.png");
    Some(input.with_file_name(name))
}

/// Load, filter, save. `Ok(true)` when the filter ran, `Ok(false)` when it
/// fell back to the unfiltered original.
fn process_file(
    input: &PathBuf,
    target: &PathBuf,
    params: &ChromaKeyParams,
) -> Result<bool, String> {
    let src = image::open(input)
        .map_err(|e| format!("cannot load: {}", e))?
        .into_rgba8();

    let (result, filtered) = match filter_ingredient(&src, params) {
        FilterOutcome::Filtered(img) => (img, true),
        FilterOutcome::Unfiltered { image, reason } => {
            eprintln!("{}: filter skipped: {}", input.display(), reason);
            (image, false)
        }
    };

    if let Some(parent) = target.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("cannot create {}: {}", parent.display(), e))?;
    }
    result
        .save_with_format(target, image::ImageFormat::Png)
        .map_err(|e| format!("cannot save: {}", e))?;
    Ok(filtered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_resolution() {
        let input = PathBuf::from("shots/pepper.jpg");

        let explicit = PathBuf::from("out.png");
        assert_eq!(
            output_path(&input, Some(&explicit), None),
            Some(PathBuf::from("out.png"))
        );

        let dir = PathBuf::from("cutouts");
        assert_eq!(
            output_path(&input, None, Some(&dir)),
            Some(PathBuf::from("cutouts/pepper.png"))
        );

        assert_eq!(
            output_path(&input, None, None),
            Some(PathBuf::from("shots/pepper-cutout.png"))
        );
    }

    #[test]
    fn cli_parses_batch_flags() {
        let args = CliArgs::parse_from([
            "collagefe",
            "--input",
            "a.png",
            "b.png",
            "--output-dir",
            "out",
            "--tolerance",
            "45",
        ]);
        assert_eq!(args.input.len(), 2);
        assert_eq!(args.output_dir, Some(PathBuf::from("out")));
        assert_eq!(args.tolerance, Some(45.0));
        assert!(args.output.is_none());
    }
}
