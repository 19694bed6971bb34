use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use log::{info, warn};

use patterngen::canvas::{Canvas, SvgCanvas};
use patterngen::config::RenderConfig;
use patterngen::dictionary::ArucoDictionary;
use patterngen::geometry::{Page, Unit};
use patterngen::marker::{draw_marker, MarkerFamily};
use patterngen::pattern::{
    AprilGridSpec, CharucoSpec, CheckerSpec, PatternConfig, RenderReport, SquareColor,
};
use patterngen::source::{AssetSource, DirSource, MarkerRegistry, BITMAP_DB_NAME};
use patterngen::traversal::{Origin, Traversal};

mod render_pdf;
mod render_png;

/// Calibration pattern generator
#[derive(Parser)]
#[command(name = "patterngen", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory holding family files and aruco_bitmaps.json
    #[arg(long, global = true, default_value = "assets")]
    assets: PathBuf,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// List ArUco dictionaries and the AprilTag families found in the asset directory
    List,
    /// Show detailed info about an AprilTag family
    Info {
        /// Family code, e.g. 36h11
        #[arg(long)]
        family: String,
    },
    /// Render individual markers, one file per ID
    Marker(MarkerArgs),
    /// Render an AprilGrid
    Aprilgrid {
        #[command(flatten)]
        out: OutputArgs,
        #[arg(long, default_value_t = 6)]
        rows: usize,
        #[arg(long, default_value_t = 4)]
        cols: usize,
        #[arg(long, default_value = "36h11")]
        family: String,
        /// Tag side in page units
        #[arg(long, default_value_t = 30.0)]
        tag_size: f64,
        /// Gap between tags as a fraction of the tag side
        #[arg(long, default_value_t = 0.3)]
        spacing_ratio: f64,
        #[command(flatten)]
        ids: IdArgs,
        /// Leave the gap intersections empty
        #[arg(long)]
        no_corner_squares: bool,
        /// Side of the intersection squares (defaults to the spacing)
        #[arg(long)]
        corner_square_size: Option<f64>,
    },
    /// Render a ChArUco board
    Charuco {
        #[command(flatten)]
        out: OutputArgs,
        /// Squares across
        #[arg(long, default_value_t = 5)]
        squares_x: usize,
        /// Squares down
        #[arg(long, default_value_t = 7)]
        squares_y: usize,
        #[arg(long, default_value = "black")]
        top_left: SquareColor,
        /// Colour of the squares that carry markers
        #[arg(long, default_value = "white")]
        markers_on: SquareColor,
        #[arg(long, default_value_t = 0.7)]
        marker_ratio: f64,
        #[arg(long, default_value_t = 1)]
        id_step: u32,
        #[arg(long, default_value = "4x4_50")]
        dictionary: ArucoDictionary,
        /// Fixed square side in page units
        #[arg(long)]
        square_size: Option<f64>,
        #[command(flatten)]
        ids: IdArgs,
    },
    /// Render a checkerboard with optional grid lines and dots
    Checker {
        #[command(flatten)]
        out: OutputArgs,
        #[arg(long, default_value_t = 6)]
        inner_rows: usize,
        #[arg(long, default_value_t = 9)]
        inner_cols: usize,
        #[arg(long, default_value = "black")]
        top_left: SquareColor,
        /// Skip the squares layer
        #[arg(long)]
        no_squares: bool,
        #[arg(long)]
        grid_lines: bool,
        #[arg(long)]
        dots: bool,
        /// Dot radius as a fraction of the square side
        #[arg(long, default_value_t = 0.1)]
        dot_radius: f64,
        #[arg(long)]
        line_width: Option<f64>,
        #[arg(long)]
        square_size: Option<f64>,
    },
    /// Render a pattern described by a TOML or JSON file
    Render {
        /// Config file (.toml or .json)
        #[arg(long)]
        config: PathBuf,
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
        /// Output format (defaults to the output file extension)
        #[arg(long)]
        format: Option<Format>,
        /// Raster resolution for millimetre pages
        #[arg(long, default_value_t = 300.0)]
        dpi: f64,
    },
}

#[derive(Args)]
struct OutputArgs {
    /// Output file
    #[arg(short, long)]
    output: PathBuf,
    /// Output format (defaults to the output file extension)
    #[arg(long)]
    format: Option<Format>,
    /// a4, a3, letter, <name>-landscape, or WIDTHxHEIGHT pixels
    #[arg(long, default_value = "a4")]
    page: Page,
    /// Page margin in page units
    #[arg(long)]
    margin: Option<f64>,
    /// Raster resolution for millimetre pages
    #[arg(long, default_value_t = 300.0)]
    dpi: f64,
    /// Left footer text
    #[arg(long)]
    caption: Option<String>,
    #[arg(long)]
    no_footer: bool,
}

#[derive(Args)]
struct IdArgs {
    #[arg(long, default_value_t = 0)]
    start_id: u32,
    /// Numbering corner: TL, TR, BL, BR
    #[arg(long, default_value = "TL")]
    origin: Origin,
    #[arg(long, default_value = "row-major-ltr")]
    traversal: Traversal,
    /// Print each marker's ID below it
    #[arg(long)]
    show_ids: bool,
}

#[derive(Args)]
struct MarkerArgs {
    /// AprilTag family code, e.g. 36h11
    #[arg(long, conflicts_with = "dictionary", required_unless_present = "dictionary")]
    family: Option<String>,
    /// ArUco dictionary, e.g. 4x4_50
    #[arg(long)]
    dictionary: Option<ArucoDictionary>,
    /// Marker IDs (e.g. "0", "0-9", "0,3,5")
    #[arg(long, default_value = "0")]
    ids: String,
    /// Marker side in millimetres
    #[arg(long, default_value_t = 50.0)]
    size: f64,
    #[arg(long, default_value = "svg")]
    format: Format,
    #[arg(long, default_value_t = 300.0)]
    dpi: f64,
    /// Output directory
    #[arg(short, long, default_value = ".")]
    output: PathBuf,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Svg,
    Png,
    Pdf,
}

impl Format {
    fn extension(self) -> &'static str {
        match self {
            Format::Svg => "svg",
            Format::Png => "png",
            Format::Pdf => "pdf",
        }
    }

    /// Explicit format, or the one implied by `path`'s extension.
    fn resolve(explicit: Option<Format>, path: &Path) -> Result<Format> {
        if let Some(f) = explicit {
            return Ok(f);
        }
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("svg") => Ok(Format::Svg),
            Some("png") => Ok(Format::Png),
            Some("pdf") => Ok(Format::Pdf),
            _ => anyhow::bail!(
                "cannot infer format from '{}', pass --format svg|png|pdf",
                path.display()
            ),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);
    let mut registry = MarkerRegistry::new(DirSource::new(&cli.assets));

    match cli.command {
        Command::List => cmd_list(&mut registry),
        Command::Info { family } => cmd_info(&mut registry, &family),
        Command::Marker(args) => cmd_marker(&mut registry, &args),
        Command::Aprilgrid {
            out,
            rows,
            cols,
            family,
            tag_size,
            spacing_ratio,
            ids,
            no_corner_squares,
            corner_square_size,
        } => {
            let spec = AprilGridSpec {
                rows,
                cols,
                family,
                tag_size,
                spacing_ratio,
                start_id: ids.start_id,
                origin: ids.origin,
                traversal: ids.traversal,
                show_ids: ids.show_ids,
                corner_squares: !no_corner_squares,
                corner_square_size,
            };
            cmd_pattern(&mut registry, PatternConfig::Aprilgrid(spec), &out)
        }
        Command::Charuco {
            out,
            squares_x,
            squares_y,
            top_left,
            markers_on,
            marker_ratio,
            id_step,
            dictionary,
            square_size,
            ids,
        } => {
            let spec = CharucoSpec {
                squares_x,
                squares_y,
                top_left,
                markers_on,
                marker_ratio,
                id_step,
                start_id: ids.start_id,
                dictionary,
                origin: ids.origin,
                traversal: ids.traversal,
                show_ids: ids.show_ids,
                square_size,
            };
            cmd_pattern(&mut registry, PatternConfig::Charuco(spec), &out)
        }
        Command::Checker {
            out,
            inner_rows,
            inner_cols,
            top_left,
            no_squares,
            grid_lines,
            dots,
            dot_radius,
            line_width,
            square_size,
        } => {
            let spec = CheckerSpec {
                inner_rows,
                inner_cols,
                top_left,
                squares: !no_squares,
                grid_lines,
                dots,
                dot_radius,
                line_width,
                square_size,
            };
            cmd_pattern(&mut registry, PatternConfig::Checker(spec), &out)
        }
        Command::Render {
            config,
            output,
            format,
            dpi,
        } => cmd_render(&cli.assets, &config, &output, format, dpi),
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// Parse an ID specification like "0", "0-9", "0,3,5", "0-4,7,10-12".
fn parse_ids(spec: &str) -> Result<Vec<u32>> {
    let mut ids = Vec::new();
    for part in spec.split(',') {
        let part = part.trim();
        if let Some((start, end)) = part.split_once('-') {
            let start: u32 = start.trim().parse().context("invalid ID range start")?;
            let end: u32 = end.trim().parse().context("invalid ID range end")?;
            anyhow::ensure!(start <= end, "ID range {start}-{end} is reversed");
            ids.extend(start..=end);
        } else {
            ids.push(part.parse().with_context(|| format!("invalid ID '{part}'"))?);
        }
    }
    Ok(ids)
}

/// Paint onto `page` and write it as `format`.
fn write_output<T>(
    page: &Page,
    format: Format,
    dpi: f64,
    path: &Path,
    draw: impl FnOnce(&mut dyn Canvas) -> T,
) -> Result<T> {
    match format {
        Format::Svg => {
            let mut svg = SvgCanvas::new(page);
            let out = draw(&mut svg);
            std::fs::write(path, svg.finish())
                .with_context(|| format!("writing {}", path.display()))?;
            Ok(out)
        }
        Format::Png => render_png::write_png(page, dpi, path, draw),
        Format::Pdf => render_pdf::write_pdf(page, "Calibration pattern", path, draw),
    }
}

fn report(path: &Path, report: &RenderReport) {
    for w in &report.warnings {
        eprintln!("warning: {w}");
    }
    let fallback = if report.fallback {
        " (synthetic markers)"
    } else {
        ""
    };
    println!(
        "wrote {} ({} markers{fallback})",
        path.display(),
        report.markers_drawn
    );
}

fn cmd_pattern(
    registry: &mut MarkerRegistry<DirSource>,
    pattern: PatternConfig,
    out: &OutputArgs,
) -> Result<()> {
    let mut config = RenderConfig::new(pattern);
    config.caption = out.caption.clone();
    config.footer = !out.no_footer;
    let page = match out.margin {
        Some(m) => out.page.with_margin(m),
        None => out.page,
    };
    config.page = patterngen::config::PageSetting::Custom(page);
    let format = Format::resolve(out.format, &out.output)?;
    let result = write_output(&page, format, out.dpi, &out.output, |canvas| {
        config.render(registry, canvas)
    })?;
    report(&out.output, &result?);
    Ok(())
}

fn cmd_render(
    assets: &Path,
    config_path: &Path,
    output: &Path,
    format: Option<Format>,
    dpi: f64,
) -> Result<()> {
    let config = RenderConfig::load(config_path)?;
    let assets = config.assets.clone().unwrap_or_else(|| assets.to_path_buf());
    info!("assets from {}", assets.display());
    let mut registry = MarkerRegistry::new(DirSource::new(assets));
    let page = config.page()?;
    let format = Format::resolve(format, output)?;
    let result = write_output(&page, format, dpi, output, |canvas| {
        config.render(&mut registry, canvas)
    })?;
    report(output, &result?);
    Ok(())
}

fn cmd_marker(registry: &mut MarkerRegistry<DirSource>, args: &MarkerArgs) -> Result<()> {
    let family = match (&args.family, args.dictionary) {
        (Some(code), _) => registry.load_family(code),
        (None, Some(dict)) => registry.aruco_family(dict),
        (None, None) => anyhow::bail!("pass --family or --dictionary"),
    };
    for w in registry.take_warnings() {
        eprintln!("warning: {w}");
    }
    let ids = parse_ids(&args.ids)?;

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("creating output directory '{}'", args.output.display()))?;

    for id in ids {
        let bitmap = match family.render(id) {
            Ok(b) => b,
            Err(e) => {
                warn!("skipping marker {id}: {e}");
                continue;
            }
        };
        // one payload cell of white quiet zone on each side
        let quiet = args.size / (bitmap.payload_size() + 2) as f64;
        let side = args.size + 2.0 * quiet;
        let page = Page {
            width: side,
            height: side,
            margin: 0.0,
            unit: Unit::Mm,
        };
        let filename = format!("{}_{:04}.{}", family.name(), id, args.format.extension());
        let path = args.output.join(filename);
        write_output(&page, args.format, args.dpi, &path, |canvas| {
            draw_marker(canvas, quiet, quiet, args.size, &bitmap)
        })?;
        println!("wrote {}", path.display());
    }
    Ok(())
}

fn cmd_list(registry: &mut MarkerRegistry<DirSource>) -> Result<()> {
    println!("{:<12} {:<16} {:>5} {:>8}", "Dictionary", "Key", "Bits", "Markers");
    println!("{}", "-".repeat(44));
    let db = registry.bitmap_db();
    for dict in ArucoDictionary::ALL {
        let available = db.as_ref().is_some_and(|db| db.contains(dict));
        println!(
            "{:<12} {:<16} {:>5} {:>8}{}",
            dict.name(),
            dict.json_key(),
            dict.marker_size() * dict.marker_size(),
            dict.capacity(),
            if available { "" } else { "  (synthetic)" }
        );
    }
    println!();

    let mut codes: Vec<String> = registry
        .source()
        .names()
        .into_iter()
        .filter(|n| n != BITMAP_DB_NAME)
        .filter_map(|n| {
            n.strip_suffix(".toml")
                .or_else(|| n.strip_suffix(".json"))
                .map(str::to_string)
        })
        .collect();
    codes.sort();
    codes.dedup();

    println!("{:<22} {:>5} {:>7} {:>8}", "Family", "Bits", "Hamming", "Codes");
    println!("{}", "-".repeat(46));
    if codes.is_empty() {
        println!(
            "(no family files in {})",
            registry.source().root().display()
        );
    }
    for code in codes {
        match registry.ensure_family(&code) {
            Ok(family) => println!(
                "{:<22} {:>5} {:>7} {:>8}",
                family.config.name,
                family.layout.nbits,
                family.config.min_hamming,
                family.codes.len(),
            ),
            Err(e) => warn!("{code}: {e}"),
        }
    }
    Ok(())
}

fn cmd_info(registry: &mut MarkerRegistry<DirSource>, code: &str) -> Result<()> {
    let family = registry
        .ensure_family(code)
        .with_context(|| format!("loading family '{code}'"))?;
    println!("Family:        {}", family.config.name);
    println!("Data bits:     {}", family.layout.nbits);
    println!("Min hamming:   {}", family.config.min_hamming);
    if let Some(mc) = family.config.min_complexity {
        println!("Min complex:   {}", mc);
    }
    println!(
        "Grid size:     {}x{}",
        family.layout.grid_size, family.layout.grid_size
    );
    println!("Border width:  {}", family.layout.border_width);
    println!("Code count:    {}", family.codes.len());
    println!();

    println!("Layout:");
    let ds = family.layout.data_string();
    for row in ds.as_bytes().chunks(family.layout.grid_size) {
        println!("  {}", String::from_utf8_lossy(row));
    }
    println!();

    println!("Marker 0:");
    let bitmap = family.render(0)?;
    for row in bitmap.to_strings() {
        println!("  {row}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_specs() {
        assert_eq!(parse_ids("0").unwrap(), vec![0]);
        assert_eq!(parse_ids("0-3,7, 9-10").unwrap(), vec![0, 1, 2, 3, 7, 9, 10]);
        assert!(parse_ids("4-2").is_err());
        assert!(parse_ids("x").is_err());
    }

    #[test]
    fn format_from_extension() {
        assert!(Format::resolve(None, Path::new("a.SVG")).unwrap() == Format::Svg);
        assert!(Format::resolve(None, Path::new("a.pdf")).unwrap() == Format::Pdf);
        assert!(Format::resolve(Some(Format::Png), Path::new("a.svg")).unwrap() == Format::Png);
        assert!(Format::resolve(None, Path::new("board")).is_err());
    }

    #[test]
    fn cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
        let cli = Cli::try_parse_from([
            "patterngen",
            "aprilgrid",
            "-o",
            "grid.svg",
            "--rows",
            "2",
            "--origin",
            "BL",
            "--traversal",
            "snake-ltr-first",
        ])
        .unwrap();
        match cli.command {
            Command::Aprilgrid { rows, ids, .. } => {
                assert_eq!(rows, 2);
                assert_eq!(ids.origin, Origin::BottomLeft);
                assert_eq!(ids.traversal, Traversal::SnakeLtrFirst);
            }
            _ => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn svg_pattern_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let out = OutputArgs {
            output: dir.path().join("board.svg"),
            format: None,
            page: Page::a4(),
            margin: None,
            dpi: 300.0,
            caption: Some("rig".into()),
            no_footer: false,
        };
        let mut registry = MarkerRegistry::new(DirSource::new(dir.path()));
        cmd_pattern(
            &mut registry,
            PatternConfig::Checker(CheckerSpec::default()),
            &out,
        )
        .unwrap();
        let svg = std::fs::read_to_string(&out.output).unwrap();
        assert!(svg.contains("Pattern: checker"));
        assert!(svg.contains(">rig<"));
    }
}
