fn main() {
    std::process::exit(acb_gains::cmd::command_main());
}
