fn main() {
    if let Err(e) = budgeto_lib::run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
