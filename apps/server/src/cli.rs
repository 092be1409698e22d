//! Command-line flags. Each one, when given, overrides the matching configuration key.

use clap::Parser;
use fc_kernel::domain::config::ApiConfig;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "faceclaimer")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Stores character images as WebP files and serves their public URLs")]
pub struct Cli {
    /// Configuration file (TOML, JSON or YAML). Without it only defaults and
    /// `FACECLAIMER__*` environment variables apply.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Directory holding the stored images. Must already exist.
    #[arg(long, value_name = "DIR")]
    pub images_dir: Option<PathBuf>,

    /// Public URL prefix under which the images directory is served
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// WebP quality, 1 to 100
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: Option<u8>,
}

impl Cli {
    pub fn apply(&self, cfg: &mut ApiConfig) {
        if let Some(port) = self.port {
            cfg.server.port = port;
        }
        if let Some(dir) = &self.images_dir {
            cfg.storage.images_dir.clone_from(dir);
        }
        if let Some(url) = &self.base_url {
            cfg.storage.base_url.clone_from(url);
        }
        if let Some(quality) = self.quality {
            cfg.storage.quality = quality;
        }
    }
}
