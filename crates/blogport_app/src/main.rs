mod cli;
mod logging;

fn main() {
    if let Err(err) = cli::run() {
        eprintln!("blogport error: {:#}", err);
        std::process::exit(1);
    }
}
