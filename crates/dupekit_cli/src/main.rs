use std::process;

fn main() {
    process::exit(dupekit_cli::run());
}
