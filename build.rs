fn main() {
    // Host builds (`--no-default-features`) have no ESP-IDF sysenv to export.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
