fn main() {
    if let Err(err) = topsis_rank::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
