fn main() {
    medivan_lib::run()
}
