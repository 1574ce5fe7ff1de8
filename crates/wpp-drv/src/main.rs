fn main() {
    if let Err(e) = wpp_drv::main() {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}
