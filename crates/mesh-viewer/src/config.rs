use clap::{ArgAction, Parser, ValueEnum};

/// Which shader program the viewer starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ShaderChoice {
    /// Diffuse lighting from a fixed light.
    Lambert,
    /// Time-animated displacement and banding.
    Custom,
}

/// `mesh-viewer` - procedural mesh viewer.
///
/// Generates an icosphere, a cube and a square, and draws them with a
/// switchable shader program under an orbit camera.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Initial window width in logical pixels.
    #[arg(long, env = "MESH_VIEWER_WIDTH", default_value_t = 1280)]
    pub width: u32,

    /// Initial window height in logical pixels.
    #[arg(long, env = "MESH_VIEWER_HEIGHT", default_value_t = 720)]
    pub height: u32,

    /// Initial icosphere subdivision level.
    #[arg(
        long,
        env = "MESH_VIEWER_SUBDIVISIONS",
        default_value_t = 5,
        value_parser = clap::value_parser!(u32).range(0..=meshgen::MAX_SUBDIVISIONS as i64)
    )]
    pub subdivisions: u32,

    /// Shader program selected at startup.
    #[arg(long, env = "MESH_VIEWER_SHADER", value_enum, default_value_t = ShaderChoice::Lambert)]
    pub shader: ShaderChoice,

    /// Present with vertical sync.
    #[arg(long, env = "MESH_VIEWER_VSYNC", action = ArgAction::Set, default_value_t = true)]
    pub vsync: bool,

    /// Log filter, in `RUST_LOG` syntax. `RUST_LOG` wins when set.
    #[arg(long, env = "MESH_VIEWER_LOG", default_value = "info")]
    pub log_filter: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = Config::try_parse_from(["mesh-viewer"]).unwrap();
        assert_eq!((cfg.width, cfg.height), (1280, 720));
        assert_eq!(cfg.subdivisions, 5);
        assert_eq!(cfg.shader, ShaderChoice::Lambert);
        assert!(cfg.vsync);
        assert_eq!(cfg.log_filter, "info");
    }

    #[test]
    fn parses_overrides() {
        let cfg = Config::try_parse_from([
            "mesh-viewer",
            "--subdivisions",
            "2",
            "--shader",
            "custom",
            "--vsync",
            "false",
        ])
        .unwrap();
        assert_eq!(cfg.subdivisions, 2);
        assert_eq!(cfg.shader, ShaderChoice::Custom);
        assert!(!cfg.vsync);
    }

    #[test]
    fn rejects_out_of_range_subdivisions() {
        assert!(Config::try_parse_from(["mesh-viewer", "--subdivisions", "9"]).is_err());
    }

    #[test]
    fn command_is_well_formed() {
        use clap::CommandFactory;
        Config::command().debug_assert();
    }
}
