use log::LevelFilter;
use std::io::Write;

fn level_for(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    }
}

/// Install the stderr logger. Records print as `LEVEL: message`; verbose
/// mode lowers the threshold from warn to debug.
pub fn init(verbose: bool) {
    let _ = env_logger::Builder::new()
        .filter_level(level_for(verbose))
        .format(|buf, record| writeln!(buf, "{}: {}", record.level(), record.args()))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for() {
        assert_eq!(level_for(false), LevelFilter::Warn);
        assert_eq!(level_for(true), LevelFilter::Debug);
    }
}
