fn main() {
    // Emits the ESP-IDF link/env directives when building for espidf;
    // no-op on host targets where no saved sysenv exists.
    embuild::espidf::sysenv::output();
}
