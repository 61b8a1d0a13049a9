mod command;
mod runner;
mod util;

pub use command::Command;
pub use runner::{OutputMode, load_config, run, run_with_format};
pub use util::{parse_project_arg, split_filter_arg};
