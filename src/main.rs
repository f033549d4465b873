use clap::{ArgGroup, Parser};
use log::info;
use std::path::PathBuf;

use ssnsweep::{
    emit_sequence, load_xgmml, network_stem, AnnotationFormat, AnnotationMap, ColorRegistry,
    ColorScheme, FrameNaming, Layout, LayoutConfig, RenderOptions, Result, Scene, Sweep,
    ThresholdSchedule,
};

#[derive(Parser)]
#[command(name = "ssnsweep")]
#[command(about = "See the effect of the alignment score threshold on an SSN, colored by annotation.", long_about = None)]
#[command(group(ArgGroup::new("source").required(true).args(["kofam", "eggnog", "annotation"])))]
struct Args {
    // MANDATORY OPTIONS
    /// XGMML network from an EFI-EST analysis.
    #[arg(short = 'g', long = "xgmml", value_name = "XGMML")]
    xgmml: PathBuf,

    // Annotation Source (exactly one)
    /// KofamScan table with 'Hit_Id' and 'Gene' columns.
    #[arg(short = 'k', long = "kofam", value_name = "KOFAM")]
    kofam: Option<PathBuf>,

    /// eggNOG-mapper annotations file.
    #[arg(short = 'e', long = "eggnog", value_name = "EGGNOG")]
    eggnog: Option<PathBuf>,

    /// Tab-separated file with a header naming the 'Hit_Id' and 'Gene' columns.
    #[arg(short = 'a', long = "annotation", value_name = "ANNOTATION")]
    annotation: Option<PathBuf>,

    /// Output folder (default: ./[NAME_OF_XGMML]).
    #[arg(short = 'o', long = "output", value_name = "OUTPUT")]
    output: Option<PathBuf>,

    // Visualization Options
    /// Width in pixels of each frame.
    #[arg(short = 'x', long = "width", value_name = "N", default_value_t = 1200)]
    width: u32,

    /// Height in pixels of each frame.
    #[arg(short = 'y', long = "height", value_name = "N", default_value_t = 1000)]
    height: u32,

    /// Node radius in pixels.
    #[arg(short = 'r', long = "node-radius", value_name = "N", default_value_t = 4)]
    node_radius: u32,

    /// Color annotations by a hash of their name instead of the palette.
    #[arg(short = 'H', long = "color-by-hash")]
    color_by_hash: bool,

    /// Don't draw the annotation legend.
    #[arg(long = "no-legend")]
    no_legend: bool,

    // Sweep Options
    /// Use N evenly spaced thresholds instead of every distinct score (N >= 1).
    #[arg(
        short = 'n',
        long = "steps",
        value_name = "N",
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
    )]
    steps: Option<usize>,

    // Layout Options
    /// Seed of the layout.
    #[arg(short = 's', long = "seed", value_name = "N", default_value_t = 42)]
    seed: u64,

    /// Iteration budget of the layout. Each iteration is quadratic in the
    /// number of nodes.
    #[arg(short = 'i', long = "iterations", value_name = "N", default_value_t = 300)]
    iterations: usize,

    // Threading
    /// Render frames in parallel.
    #[arg(short = 'P', long = "parallel-frames")]
    parallel_frames: bool,

    /// Number of threads to use for parallel operations.
    #[arg(short = 't', long = "threads", value_name = "N")]
    threads: Option<usize>,

    // Logging
    /// Verbosity level (0 = error, 1 = info, 2 = debug).
    #[arg(short = 'v', long = "verbose", value_name = "N", default_value_t = 1)]
    verbose: u8,
}

impl Args {
    fn source(&self) -> Option<(AnnotationFormat, &PathBuf)> {
        [
            (AnnotationFormat::Kofam, &self.kofam),
            (AnnotationFormat::Eggnog, &self.eggnog),
            (AnnotationFormat::Tabular, &self.annotation),
        ]
        .into_iter()
        .find_map(|(format, path)| path.as_ref().map(|p| (format, p)))
    }
}

fn run(args: &Args) -> Result<()> {
    let graph = load_xgmml(&args.xgmml)?;
    if let Some((lo, hi)) = graph.score_range() {
        info!("Network range of alignment score :: Min = {}, Max = {}", lo, hi);
    }

    let Some((format, annot_path)) = args.source() else {
        return Ok(());
    };
    let raw = format.load(annot_path)?;
    let annotations = AnnotationMap::resolve(&graph, &raw);

    let schedule = match args.steps {
        Some(n) => ThresholdSchedule::Even(n),
        None => ThresholdSchedule::Distinct,
    };
    let sweep = Sweep::new(&graph, schedule);

    info!("Computing layout...");
    let layout = Layout::compute(
        &graph,
        &LayoutConfig {
            seed: args.seed,
            iterations: args.iterations,
            ..LayoutConfig::default()
        },
    );

    let scheme = if args.color_by_hash {
        ColorScheme::Hash
    } else {
        ColorScheme::Palette
    };
    let colors = ColorRegistry::build(&annotations, scheme);
    info!("{} distinct annotations", colors.len());

    let options = RenderOptions {
        width: args.width,
        height: args.height,
        node_radius: args.node_radius,
        legend: !args.no_legend,
    };
    let scene = Scene {
        layout: &layout,
        annotations: &annotations,
        colors: &colors,
        options: &options,
    };

    let output = args.output.clone().unwrap_or_else(|| {
        PathBuf::from(
            args.xgmml
                .file_name()
                .unwrap_or(args.xgmml.as_os_str()),
        )
    });
    let dir = output.join(format.folder_name());
    std::fs::create_dir_all(&dir)?;

    let naming = FrameNaming::new(network_stem(&args.xgmml), &sweep);
    let label = format.folder_name().to_lowercase();
    let written = emit_sequence(&sweep, &scene, &dir, &naming, &label, args.parallel_frames)?;
    info!("Wrote {} frames to {:?}", written.len(), dir);
    Ok(())
}

fn main() {
    let args = Args::parse();

    // Initialize logger based on verbosity
    env_logger::Builder::new()
        .filter_level(match args.verbose {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    if let Some(threads) = args.threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
        {
            eprintln!("Warning: could not configure thread pool: {}", e);
        }
    }

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    info!("Done.");
}
