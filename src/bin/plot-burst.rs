extern crate burst_plotter;
extern crate env_logger;
extern crate failure;
#[macro_use] extern crate log;

use std::fs;
use std::process;

use failure::Error;

use burst_plotter::plot::plotter::{PlotPaths, Plotter};
use burst_plotter::plot::progress::format_duration_from_seconds;
use burst_plotter::util::config::{PlotConfig, CONFIG};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        for cause in e.iter_chain() {
            eprintln!("error: {}", cause);
        }
        process::exit(1);
    }
}

fn run() -> Result<(), Error> {
    let config: PlotConfig = CONFIG.get("plot")?;
    let config = config.resolve_stagger_size()?;
    config.validate()?;

    fs::create_dir_all(config.output_dir())?;
    let paths = PlotPaths::new(config.output_dir(), &config);

    let summary = Plotter::open(config, &paths.working)?.plot()?;
    paths.finalize()?;

    info!("Finished plotting {} nonces into {} (hashing took {})",
          summary.nonces_written, paths.finished.display(),
          format_duration_from_seconds(summary.hashing_time.as_secs()));
    Ok(())
}
