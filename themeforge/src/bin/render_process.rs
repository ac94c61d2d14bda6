use clap::Parser;

use themeforge::prelude::*;
use themeforge::runtime::renderer::{self, RenderArgs};

fn main() {
    init_logger();

    let args = RenderArgs::parse();
    if let Err(err) = renderer::run(args) {
        eprintln!("render process failed: {}", err);
        std::process::exit(1);
    }
}
