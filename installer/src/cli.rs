use clap::Parser;

#[derive(Parser, Debug, Default)]
#[command(
    name = "modmerge",
    about = "Install mod configuration fragments into a server mission folder",
    version
)]
pub struct Cli {
    /// Server mission directory (overrides MODMERGE_MISSION_PATH)
    #[arg(long)]
    pub mission_path: Option<String>,

    /// Repository data folder with fragments and custom/ (overrides MODMERGE_DATA_DIR)
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Overwrite files without keeping a backup of the previous content
    #[arg(long)]
    pub no_backup: bool,

    /// Merge and report without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Summary output format
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from([
            "modmerge",
            "--mission-path",
            "/srv/mission",
            "--data-dir",
            "data",
            "--dry-run",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.mission_path.as_deref(), Some("/srv/mission"));
        assert!(cli.dry_run);
        assert!(!cli.no_backup);
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn defaults_to_text() {
        let cli = Cli::try_parse_from(["modmerge"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Text);
        assert!(cli.mission_path.is_none());
    }
}
