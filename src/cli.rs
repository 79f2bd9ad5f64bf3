use std::path::PathBuf;

use argh::FromArgs;
use log::LevelFilter;

/// Walk around a sector map with a software portal renderer
#[derive(Debug, Clone, FromArgs)]
pub struct CliOptions {
    /// path to a map file, the bundled demo map is used if omitted
    #[argh(option)]
    pub map: Option<PathBuf>,
    /// internal render width in pixels
    #[argh(option, default = "1024")]
    pub width: usize,
    /// internal render height in pixels
    #[argh(option, default = "680")]
    pub height: usize,
    /// verbose level: off, error, warn, info, debug, trace
    #[argh(option)]
    pub verbose: Option<LevelFilter>,
}
