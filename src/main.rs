fn main() -> std::process::ExitCode {
    docguard_lib::run()
}
