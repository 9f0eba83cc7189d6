use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use beadsprite::api;
use beadsprite::assets::{AssetCategory, AssetLoader};
use beadsprite::models::{AppConfig, ProjectSettings};
use beadsprite::server;
use beadsprite::services::{load_registry, ImagePipeline, RenderService};
use bead_pattern::{DistanceMode, GridDetector, LayoutOptions};

#[derive(Parser)]
#[command(name = "beadsprite")]
#[command(about = "Turn images into fuse-bead patterns")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Convert an image to a bead pattern PNG (no server needed)
    Convert {
        /// Input image (PNG, JPEG, GIF, BMP or WebP)
        input: PathBuf,

        /// Output PNG file path
        #[arg(short, long)]
        output: PathBuf,

        /// Palettes to match against, in order (repeat or comma-separate)
        #[arg(short, long, value_delimiter = ',')]
        palette: Vec<String>,

        /// Color distance: rgb, cie76 or ciede2000
        #[arg(short, long)]
        distance: Option<DistanceMode>,

        /// Pegs per board side
        #[arg(short, long)]
        board: Option<usize>,

        /// Mirror horizontally (for ironing from the back)
        #[arg(long)]
        mirror: bool,

        /// Keep backdrop beads in the pattern
        #[arg(long)]
        keep_background: bool,

        /// Seed for grid detection sampling
        #[arg(long)]
        seed: Option<u64>,

        /// Also write the legend as SVG to this path
        #[arg(long)]
        legend: Option<PathBuf>,

        /// Print legend labels on the beads
        #[arg(long)]
        labels: bool,
    },
    /// List palettes, or the colors of one palette
    Palettes {
        /// Palette name
        name: Option<String>,
    },
    /// Extract embedded assets to filesystem for customization
    Init {
        /// Extract palette JSON files
        #[arg(long)]
        palettes: bool,

        /// Extract SVG templates
        #[arg(long)]
        templates: bool,

        /// Extract config.yaml
        #[arg(long)]
        config: bool,

        /// Extract all assets
        #[arg(long)]
        all: bool,

        /// Overwrite existing files
        #[arg(long, short)]
        force: bool,

        /// List embedded assets without extracting
        #[arg(long)]
        list: bool,
    },
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Beadsprite API",
        description = "Convert images into fuse-bead patterns",
        version = "0.1.0",
        license(name = "MIT")
    ),
    paths(
        api::handle_root,
        api::handle_health,
        api::handle_list_palettes,
        api::handle_palette_colors,
        api::handle_palette_color,
        api::handle_upload,
        api::handle_get_project,
        api::handle_import_project,
        api::handle_set_override,
        api::handle_auto_match,
        api::handle_reset_mapping,
        api::handle_update_settings,
        api::handle_legend,
        api::handle_layout,
        api::handle_export_png,
        api::handle_export_document,
    ),
    components(schemas(
        api::RootResponse,
        api::HealthResponse,
        api::PaletteListResponse,
        api::PaletteColorsResponse,
        api::BeadColorResponse,
        api::UploadResponse,
        api::OverrideRequest,
        api::AutoMatchRequest,
        api::MappingResponse,
        api::LegendResponse,
        api::LayoutResponse,
        beadsprite::models::ProjectPayload,
        beadsprite::models::ProjectSettings,
        beadsprite::models::SettingsUpdate,
        beadsprite::services::ExportDocument,
    )),
    tags(
        (name = "Health", description = "Service status"),
        (name = "Colors", description = "Bead palettes"),
        (name = "Images", description = "Image upload and conversion"),
        (name = "Projects", description = "Project state, legend and layout"),
        (name = "Mapping", description = "Color to bead mapping edits"),
        (name = "Export", description = "PNG and printable document export")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Convert {
            input,
            output,
            palette,
            distance,
            board,
            mirror,
            keep_background,
            seed,
            legend,
            labels,
        }) => run_convert_command(ConvertArgs {
            input,
            output,
            palette,
            distance,
            board,
            mirror,
            keep_background,
            seed,
            legend,
            labels,
        }),
        Some(Commands::Palettes { name }) => run_palettes_command(name.as_deref()),
        Some(Commands::Init {
            palettes,
            templates,
            config,
            all,
            force,
            list,
        }) => run_init_command(palettes, templates, config, all, force, list),
        Some(Commands::Serve) => run_server().await,
        None => {
            run_status_command();
            Ok(())
        }
    }
}

struct ConvertArgs {
    input: PathBuf,
    output: PathBuf,
    palette: Vec<String>,
    distance: Option<DistanceMode>,
    board: Option<usize>,
    mirror: bool,
    keep_background: bool,
    seed: Option<u64>,
    legend: Option<PathBuf>,
    labels: bool,
}

/// Minimal logging for CLI
fn init_cli_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "beadsprite=warn,bead_pattern=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();
}

/// Convert an image file into a pattern PNG (and optionally a legend SVG)
fn run_convert_command(args: ConvertArgs) -> anyhow::Result<()> {
    init_cli_logging();

    let loader = AssetLoader::from_env();
    if let Err(e) = loader.seed_if_configured() {
        tracing::warn!(%e, "Failed to seed assets");
    }
    let config = AppConfig::load_from_assets(&loader);

    let mut settings = ProjectSettings::from_config(&config);
    if !args.palette.is_empty() {
        settings.palettes = args.palette;
    }
    if let Some(distance) = args.distance {
        settings.distance = distance;
    }
    if let Some(board) = args.board {
        settings.board_unit = board;
    }
    settings.mirror = args.mirror;
    let remove_background = config.remove_background && !args.keep_background;

    let renderer = RenderService::new(&loader, config.cell_px)?;
    let mut pipeline = ImagePipeline::new(Arc::new(config), Arc::new(load_registry(&loader)));
    if let Some(seed) = args.seed {
        pipeline = pipeline.with_detector(GridDetector::with_seed(seed));
    }

    let bytes = std::fs::read(&args.input)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", args.input.display()))?;
    let decoded = ImagePipeline::decode(&bytes)?;
    let pattern = pipeline.build_pattern(&decoded.pixels, &settings)?;
    let set = pipeline.palette_set(&settings.palettes)?;
    let legend = pattern.legend(&set, remove_background)?;
    let geometry = pattern.layout(LayoutOptions {
        remove_background,
        board_unit: settings.board_unit,
        mirror: settings.mirror,
    })?;

    let svg = renderer.pattern_svg(&pattern, &geometry, &legend, &set, args.labels)?;
    let png = renderer.svg_renderer.render_to_png(svg.as_bytes())?;
    std::fs::write(&args.output, &png)?;

    if let Some(ref path) = args.legend {
        let title = file_title(&args.input);
        std::fs::write(path, renderer.legend_svg(&title, &legend)?)?;
        println!("Legend written to {}", path.display());
    }

    println!(
        "Converted {} -> {} ({}x{} beads, {} boards of {})",
        args.input.display(),
        args.output.display(),
        pattern.width(),
        pattern.height(),
        geometry.board_count(),
        geometry.board_unit,
    );
    if !pattern.grid_info.is_identity() {
        println!(
            "Detected pixel-art grid: {}px cells",
            pattern.grid_info.cell_width
        );
    }
    println!();
    for entry in &legend {
        println!(
            "  {:<4} {:<6} {:<24} {:>6}",
            entry.label, entry.bead_id, entry.name, entry.count
        );
    }
    println!(
        "  {:<36} {:>6}",
        "Total",
        bead_pattern::legend::total_beads(&legend)
    );

    Ok(())
}

fn file_title(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "Pattern".to_string())
}

/// List palettes, or the colors of one
fn run_palettes_command(name: Option<&str>) -> anyhow::Result<()> {
    init_cli_logging();

    let loader = AssetLoader::from_env();
    let registry = load_registry(&loader);

    match name {
        Some(name) => {
            let palette = registry
                .get(name)
                .ok_or_else(|| anyhow::anyhow!("Unknown palette: {name}"))?;
            println!("{} ({} colors):\n", palette.name(), palette.len());
            for color in palette.colors() {
                println!(
                    "  {:<6} {:<10} {:<24} {}",
                    color.id,
                    color.code.as_deref().unwrap_or("-"),
                    color.name,
                    color.hex
                );
            }
        }
        None => {
            let active = AppConfig::load_from_assets(&loader).palettes;
            println!("Palettes:");
            for palette in registry.palettes() {
                let marker = if active.iter().any(|a| a.eq_ignore_ascii_case(palette.name())) {
                    " (active)"
                } else {
                    ""
                };
                println!("  {:<12} {:>3} colors{marker}", palette.name(), palette.len());
            }
        }
    }
    Ok(())
}

/// Extract embedded assets to filesystem
fn run_init_command(
    palettes: bool,
    templates: bool,
    config: bool,
    all: bool,
    force: bool,
    list: bool,
) -> anyhow::Result<()> {
    if list {
        println!("Embedded assets:\n");
        println!("Palettes:");
        for f in AssetLoader::list_embedded(AssetCategory::Palettes) {
            println!("  {f}");
        }
        println!("\nTemplates:");
        for f in AssetLoader::list_embedded(AssetCategory::Templates) {
            println!("  {f}");
        }
        println!("\nConfig:");
        for f in AssetLoader::list_embedded(AssetCategory::Config) {
            println!("  {f}");
        }
        return Ok(());
    }

    // Determine which categories to extract
    let mut categories = Vec::new();
    if all || palettes {
        categories.push(AssetCategory::Palettes);
    }
    if all || templates {
        categories.push(AssetCategory::Templates);
    }
    if all || config {
        categories.push(AssetCategory::Config);
    }

    if categories.is_empty() {
        eprintln!("No categories specified. Use --all, --palettes, --templates, or --config");
        eprintln!("\nRun 'beadsprite init --list' to see embedded assets.");
        std::process::exit(1);
    }

    let loader = AssetLoader::from_env();
    let report = loader.init(&categories, force)?;

    if !report.written.is_empty() {
        println!("Extracted {} files:", report.written.len());
        for f in &report.written {
            println!("  + {f}");
        }
    }
    if !report.skipped.is_empty() {
        println!(
            "\nSkipped {} existing files (use --force to overwrite):",
            report.skipped.len()
        );
        for f in &report.skipped {
            println!("  - {f}");
        }
    }

    if report.written.is_empty() && report.skipped.is_empty() {
        println!("No files to extract.");
    }

    Ok(())
}

/// Display status and configuration information
fn run_status_command() {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    let env = |var: &str| std::env::var(var).ok();
    let bind_addr = env("BIND_ADDR");
    let config_file = env("CONFIG_FILE");
    let palettes_dir = env("PALETTES_DIR");
    let templates_dir = env("TEMPLATES_DIR");
    let fonts_dir = env("FONTS_DIR");

    println!("Beadsprite v{VERSION}");
    println!("Image to fuse-bead pattern converter\n");

    println!("Environment Variables:");
    println!(
        "  BIND_ADDR     = {}",
        bind_addr.as_deref().unwrap_or("0.0.0.0:8000 (default)")
    );
    for (name, value) in [
        ("CONFIG_FILE  ", &config_file),
        ("PALETTES_DIR ", &palettes_dir),
        ("TEMPLATES_DIR", &templates_dir),
        ("FONTS_DIR    ", &fonts_dir),
    ] {
        println!("  {name} = {}", value.as_deref().unwrap_or("(not set)"));
    }

    println!("\nAsset Sources:");
    let loader = AssetLoader::from_env();

    let config_source = match config_file {
        Some(ref path) if Path::new(path).exists() => path.to_string(),
        Some(_) => "embedded (file not found)".to_string(),
        None => "embedded".to_string(),
    };
    println!("  Config:    {config_source}");

    fn source(dir: &Option<String>) -> String {
        match dir {
            Some(path) if Path::new(path).exists() => path.clone(),
            _ => "embedded".to_string(),
        }
    }

    let palettes = loader.list_palettes();
    let embedded_palettes = AssetLoader::list_embedded(AssetCategory::Palettes).len();
    println!(
        "  Palettes:  {} ({} available, {embedded_palettes} embedded: {})",
        source(&palettes_dir),
        palettes.len(),
        palettes.join(", ")
    );
    let embedded_templates = AssetLoader::list_embedded(AssetCategory::Templates).len();
    println!(
        "  Templates: {} ({embedded_templates} embedded)",
        source(&templates_dir)
    );
    println!(
        "  Fonts:     {} ({} loaded, plus system fonts)",
        source(&fonts_dir),
        loader.get_fonts().len()
    );

    println!("\nCommands:");
    println!("  beadsprite serve      Start the HTTP server");
    println!("  beadsprite convert    Convert an image to a pattern PNG");
    println!("  beadsprite palettes   List palettes and colors");
    println!("  beadsprite init       Extract embedded assets");
    println!("\nRun 'beadsprite --help' for more details.");
}

/// Run the HTTP server
async fn run_server() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "beadsprite=debug,bead_pattern=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
    let asset_loader = Arc::new(AssetLoader::from_env());

    let describe = |p: Option<&Path>| {
        p.map(|p| p.display().to_string())
            .unwrap_or_else(|| "embedded".to_string())
    };
    tracing::info!(
        palettes = %describe(asset_loader.palettes_dir()),
        templates = %describe(asset_loader.templates_dir()),
        fonts = %describe(asset_loader.fonts_dir()),
        config = %describe(asset_loader.config_file()),
        "Asset sources configured"
    );

    // Seed if configured paths are empty
    match asset_loader.seed_if_configured() {
        Ok(report) if !report.is_empty() => {
            tracing::info!(
                palettes = report.palettes_seeded.len(),
                templates = report.templates_seeded.len(),
                config = report.config_seeded,
                "Seeded empty directories with embedded assets"
            );
        }
        Err(e) => {
            tracing::warn!(%e, "Failed to seed assets");
        }
        _ => {}
    }

    let state = server::create_app_state(asset_loader)?;

    let app = server::build_router(state)
        // OpenAPI documentation (production only)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "Beadsprite server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
