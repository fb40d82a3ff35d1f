fn main() {
    env_logger::init();
    gto_trainer::cli::run();
}
