fn main() {
    // Propagates ESP-IDF link/cfg metadata when building for the
    // target; a no-op on host builds where the env is absent.
    embuild::espidf::sysenv::output();
}
