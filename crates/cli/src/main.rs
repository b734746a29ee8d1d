//! pngenc command-line frontend.
//!
//! Reads a raw RGBA file (`width * height * 4` bytes, row-major, no header)
//! and writes a PNG, or prints a `data:image/png;base64,` URL.
//!
//! ```text
//! pngenc frame.rgba --width 128 --height 64
//! pngenc frame.rgba -W 128 -H 64 --quality 0.8 --data-url
//! pngenc frame.rgba -W 128 -H 64 --options deflate.json --filter paeth -o shot.png
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use pngenc_core::{
    quality_to_level, to_data_url, DeflateOverrides, EncoderConfig, FilterStrategy, PixelBuffer,
    PngEncoder,
};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "pngenc")]
#[command(version)]
#[command(about = "Encode raw RGBA pixels as PNG")]
struct Args {
    /// Raw RGBA input file ("-" for stdin)
    input: PathBuf,

    /// Image width in pixels
    #[arg(short = 'W', long)]
    width: u32,

    /// Image height in pixels
    #[arg(short = 'H', long)]
    height: u32,

    /// Output path (default: input with .png extension, or stdout for --data-url)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Deflate level 0-9
    #[arg(short, long, conflicts_with = "quality")]
    level: Option<i32>,

    /// Quality 0.0-1.0, mapped inversely to a deflate level
    #[arg(short, long)]
    quality: Option<f64>,

    /// zlib window bits: 15, or -15 for raw deflate
    #[arg(long, allow_hyphen_values = true)]
    window_bits: Option<i32>,

    /// Compressor output chunk size (power of two, 256-32768)
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Deflate strategy: 0 default, 1 filtered, 2 huffman, 3 RLE, 4 fixed
    #[arg(long)]
    strategy: Option<i32>,

    /// Row filter: adaptive, none, sub, up, average, paeth
    #[arg(short, long, default_value = "adaptive")]
    filter: FilterStrategy,

    /// JSON file with deflate options, e.g. {"level": 5, "windowBits": 15}
    #[arg(long)]
    options: Option<PathBuf>,

    /// Emit a base64 data URL instead of binary PNG
    #[arg(long)]
    data_url: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Deflate overrides given on the command line; unset flags stay `None`.
    fn flag_overrides(&self) -> DeflateOverrides {
        DeflateOverrides {
            level: self.level.or(self.quality.map(quality_to_level)),
            window_bits: self.window_bits,
            chunk_size: self.chunk_size,
            strategy: self.strategy,
        }
    }

    /// Options file first, then command-line flags on top.
    fn encoder_config(&self) -> Result<EncoderConfig> {
        let file_overrides = match &self.options {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("reading options {}", path.display()))?;
                serde_json::from_str::<DeflateOverrides>(&text)
                    .with_context(|| format!("parsing options {}", path.display()))?
            }
            None => DeflateOverrides::default(),
        };
        Ok(EncoderConfig {
            filter: self.filter,
            deflate: file_overrides.overlay(&self.flag_overrides()),
        })
    }

    fn output_path(&self) -> Option<PathBuf> {
        match (&self.output, self.data_url) {
            (Some(p), _) => Some(p.clone()),
            (None, true) => None,
            (None, false) => Some(default_output(&self.input)),
        }
    }
}

/// `frame.rgba` → `frame.png`; stdin input → `out.png`.
fn default_output(input: &Path) -> PathBuf {
    if input == Path::new("-") {
        return PathBuf::from("out.png");
    }
    input.with_extension("png")
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf).context("reading stdin")?;
        return Ok(buf);
    }
    fs::read(path).with_context(|| format!("reading {}", path.display()))
}

fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_target(false)
        .with_writer(io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let config = args.encoder_config()?;
    let rgba = read_input(&args.input)?;
    let pixels = PixelBuffer::new(args.width, args.height, &rgba)?;

    let encoder = PngEncoder::with_config(config);
    debug!(options = ?encoder.deflate_options(), filter = ?config.filter, "encoder configured");
    let png = encoder.encode(&pixels)?;

    let body = if args.data_url {
        let mut url = to_data_url(&png).into_bytes();
        url.push(b'\n');
        url
    } else {
        png
    };

    match args.output_path() {
        Some(path) => {
            fs::write(&path, &body).with_context(|| format!("writing {}", path.display()))?;
            info!("{}x{} -> {} ({} bytes)", args.width, args.height, path.display(), body.len());
        }
        None => {
            io::stdout().write_all(&body).context("writing stdout")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv.iter().copied()).unwrap()
    }

    #[test]
    fn test_minimal_args() {
        let args = parse(&["pngenc", "a.rgba", "-W", "4", "-H", "2"]);
        assert_eq!(args.width, 4);
        assert_eq!(args.height, 2);
        assert_eq!(args.filter, FilterStrategy::Adaptive);
        assert_eq!(args.flag_overrides(), DeflateOverrides::default());
        assert_eq!(args.output_path(), Some(PathBuf::from("a.png")));
    }

    #[test]
    fn test_quality_maps_to_level() {
        let args = parse(&["pngenc", "a.rgba", "-W", "1", "-H", "1", "--quality", "1.0"]);
        assert_eq!(args.flag_overrides().level, Some(0));
    }

    #[test]
    fn test_level_conflicts_with_quality() {
        let res = Args::try_parse_from(["pngenc", "a", "-W", "1", "-H", "1", "-l", "3", "-q", "0.5"]);
        assert!(res.is_err());
    }

    #[test]
    fn test_negative_window_bits() {
        let args = parse(&["pngenc", "a", "-W", "1", "-H", "1", "--window-bits", "-15"]);
        assert_eq!(args.flag_overrides().window_bits, Some(-15));
    }

    #[test]
    fn test_filter_flag() {
        let args = parse(&["pngenc", "a", "-W", "1", "-H", "1", "--filter", "paeth"]);
        assert_eq!(args.encoder_config().unwrap().filter, FilterStrategy::Paeth);
        assert!(Args::try_parse_from(["pngenc", "a", "-W", "1", "-H", "1", "-f", "median"]).is_err());
    }

    #[test]
    fn test_data_url_defaults_to_stdout() {
        let args = parse(&["pngenc", "a.rgba", "-W", "1", "-H", "1", "--data-url"]);
        assert_eq!(args.output_path(), None);
        let args = parse(&["pngenc", "a.rgba", "-W", "1", "-H", "1", "--data-url", "-o", "u.txt"]);
        assert_eq!(args.output_path(), Some(PathBuf::from("u.txt")));
    }

    #[test]
    fn test_options_file_then_flags() {
        let path = std::env::temp_dir().join(format!("pngenc-opts-{}.json", std::process::id()));
        fs::write(&path, r#"{"level": 2, "strategy": 1}"#).unwrap();
        let p = path.to_str().unwrap();
        let args = parse(&["pngenc", "a", "-W", "1", "-H", "1", "--options", p, "--level", "7"]);
        let config = args.encoder_config().unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(config.deflate.level, Some(7));
        assert_eq!(config.deflate.strategy, Some(1));
        assert_eq!(config.deflate.window_bits, None);
    }

    #[test]
    fn test_options_file_typo_is_an_error() {
        let path = std::env::temp_dir().join(format!("pngenc-typo-{}.json", std::process::id()));
        fs::write(&path, r#"{"level": 2, "windowbits": 9}"#).unwrap();
        let p = path.to_str().unwrap();
        let args = parse(&["pngenc", "a", "-W", "1", "-H", "1", "--options", p]);
        let res = args.encoder_config();
        fs::remove_file(&path).unwrap();

        let err = res.unwrap_err();
        assert!(format!("{:#}", err).contains("windowbits"), "{:#}", err);
    }

    #[test]
    fn test_default_output_for_stdin() {
        assert_eq!(default_output(Path::new("-")), PathBuf::from("out.png"));
        assert_eq!(default_output(Path::new("dir/shot.raw")), PathBuf::from("dir/shot.png"));
    }
}
