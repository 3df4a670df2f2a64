use super::Parser;

#[derive(Parser, Debug)]
#[command(name = "shram-setu", about = "Shram Setu session API")]
pub struct Cli {
    /// Path to a settings file; defaults to settings/dev.toml or settings/release.toml.
    #[arg(long)]
    pub settings: Option<String>,
}
