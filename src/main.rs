use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    segment_splits::cli::run_generate_metadata(std::env::args().skip(1))
}
