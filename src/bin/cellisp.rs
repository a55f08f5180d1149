use cellisp::{cmdline, Context};

fn main() {
    pretty_env_logger::init();
    let context = Context::global();
    let args = std::env::args().collect();
    if let Err(e) = cmdline::launch(args, &context) {
        std::process::exit(cmdline::report(&e));
    }
}
