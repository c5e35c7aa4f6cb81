//! Probe CLI for WMS/WFS servers.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use ogc_client::{ClientConfig, HttpTransport, WfsClient, WmsClient};
use ogc_common::{BoundingBox, FeatureTypeSchema, SpatialReference, ViewContext};
use ogc_probe::Report;
use ogc_protocol::{InfoFormat, WmsImageSource};

#[derive(Parser)]
#[command(name = "ogc-probe")]
#[command(about = "Inspect WMS/WFS servers through the OGC client layer", long_about = None)]
struct Cli {
    /// Service base URL
    #[arg(short, long, env = "OGC_URL", default_value = "http://localhost:8080/geoserver/wms")]
    url: String,

    /// Client configuration YAML
    #[arg(short, long, env = "OGC_CONFIG")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Print JSON instead of tables
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Service {
    Wms,
    Wfs,
}

#[derive(Subcommand)]
enum Commands {
    /// List the layers a service advertises
    Capabilities {
        #[arg(short, long, value_enum, default_value = "wms")]
        service: Service,
    },

    /// Show the schema of a feature type
    Describe {
        /// Feature type, e.g. topp:states
        layer: String,
    },

    /// Count the features of a type
    Count { layer: String },

    /// Load one page of features
    Features {
        layer: String,

        #[arg(long, default_value = "0")]
        start_index: u32,

        /// Page size (defaults to the configured page size)
        #[arg(long)]
        max_features: Option<u32>,

        /// Output SRS (defaults to the configured display SRS)
        #[arg(long)]
        srs: Option<String>,
    },

    /// Load the features inside an extent
    Bbox {
        layer: String,

        /// minx,miny,maxx,maxy in the display SRS
        #[arg(long, allow_hyphen_values = true)]
        extent: String,

        /// Map units per pixel
        #[arg(long, default_value = "10")]
        resolution: f64,
    },

    /// Query features under a map coordinate
    Info {
        layer: String,

        /// Coordinate in the display SRS
        #[arg(long, allow_hyphen_values = true)]
        x: f64,

        #[arg(long, allow_hyphen_values = true)]
        y: f64,

        /// Map units per pixel
        #[arg(long, default_value = "10")]
        resolution: f64,
    },

    /// Print the legend graphic URL of a layer
    Legend { layer: String },
}

fn load_config(path: Option<&PathBuf>) -> Result<ClientConfig> {
    let config = match path {
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::default(),
    };
    let config = config.with_env_overrides()?;
    config.validate()?;
    Ok(config)
}

async fn describe(wfs: &WfsClient<HttpTransport>, url: &str, layer: &str) -> Result<FeatureTypeSchema> {
    wfs.describe_feature_type(url, layer)
        .await
        .with_context(|| format!("DescribeFeatureType failed for {}", layer))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(cli.config.as_ref())?;
    info!(url = %cli.url, "Probing service");

    let transport = HttpTransport::new(&config)?;
    let wms = WmsClient::new(transport.clone());
    let wfs = WfsClient::new(transport);

    match cli.command {
        Commands::Capabilities { service } => {
            let capabilities = match service {
                Service::Wms => wms.get_capabilities(&cli.url).await?,
                Service::Wfs => wfs.get_capabilities(&cli.url).await?,
            };
            if cli.json {
                println!("{}", Report::format_json(&capabilities)?);
            } else {
                println!("{}", Report::capabilities_table(&capabilities));
            }
        }
        Commands::Describe { layer } => {
            let schema = describe(&wfs, &cli.url, &layer).await?;
            if cli.json {
                println!("{}", Report::format_json(&schema)?);
            } else {
                println!("{}", Report::schema_table(&schema));
            }
        }
        Commands::Count { layer } => {
            let schema = describe(&wfs, &cli.url, &layer).await?;
            let count = wfs.number_of_features(&schema).await?;
            println!("{}: {} features", schema.qualified_type_name(), count);
        }
        Commands::Features {
            layer,
            start_index,
            max_features,
            srs,
        } => {
            let schema = describe(&wfs, &cli.url, &layer).await?;
            let srs = match srs {
                Some(srs) => SpatialReference::parse(&srs)?,
                None => config.display_srs()?,
            };
            let features = wfs
                .load_features(
                    &schema,
                    start_index,
                    max_features.unwrap_or(config.page_size),
                    &srs,
                )
                .await?;
            if cli.json {
                println!("{}", Report::format_json(&features)?);
            } else {
                println!("{}", Report::features_table(&features, &schema.attributes));
            }
        }
        Commands::Bbox {
            layer,
            extent,
            resolution,
        } => {
            let schema = describe(&wfs, &cli.url, &layer).await?;
            let extent = BoundingBox::from_wms_string(&extent).context("invalid --extent")?;
            let view = ViewContext::new(config.display_srs()?, resolution).with_extent(extent);
            let features = wfs.bbox_filter(&schema, &view, &extent).await?;
            if cli.json {
                println!("{}", Report::format_json(&features)?);
            } else {
                println!("{}", Report::features_table(&features, &schema.attributes));
            }
        }
        Commands::Info {
            layer,
            x,
            y,
            resolution,
        } => {
            let endpoint = url::Url::parse(&cli.url).context("invalid --url")?;
            let source = WmsImageSource::new(endpoint, vec![layer]);
            let view = ViewContext::new(config.display_srs()?, resolution);
            let format: InfoFormat = config.feature_info_format();
            let result = wms.get_feature_info(&source, [x, y], &view, format).await?;
            println!("{}", Report::feature_info(&result));
        }
        Commands::Legend { layer } => {
            println!("{}", wms.legend_url(&cli.url, &layer)?);
        }
    }

    Ok(())
}
