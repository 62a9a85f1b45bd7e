use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "blobwall",
    author,
    version,
    about = "Noise-driven morphing blob/ripple background"
)]
pub struct Cli {
    /// Window size in logical pixels (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_surface_size)]
    pub size: Option<(u32, u32)>,

    /// Freeze the animation on a single static frame.
    #[arg(long, env = "BLOBWALL_REDUCED_MOTION")]
    pub reduced_motion: bool,

    /// Opacity multiplier applied to the rendered field (0.0-1.0).
    #[arg(long, value_name = "FACTOR", default_value_t = 1.0)]
    pub strength: f32,

    /// Discard the persisted animation phase and generate a fresh one.
    #[arg(long)]
    pub reset_phase: bool,

    /// Override the state file used to persist the animation phase.
    #[arg(long, value_name = "PATH")]
    pub state_file: Option<PathBuf>,
}

pub fn parse() -> Cli {
    Cli::parse()
}

fn parse_surface_size(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got `{value}`"))?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width in `{value}`"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height in `{value}`"))?;
    if width == 0 || height == 0 {
        return Err(format!("size must be non-zero, got `{value}`"));
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_sizes() {
        assert_eq!(parse_surface_size("1280x720"), Ok((1280, 720)));
        assert_eq!(parse_surface_size("800X600"), Ok((800, 600)));
        assert_eq!(parse_surface_size(" 1920 x 1080 "), Ok((1920, 1080)));
    }

    #[test]
    fn rejects_malformed_sizes() {
        assert!(parse_surface_size("1280").is_err());
        assert!(parse_surface_size("axb").is_err());
        assert!(parse_surface_size("0x600").is_err());
        assert!(parse_surface_size("800x0").is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
