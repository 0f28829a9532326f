fn main() -> Result<(), Box<dyn std::error::Error>> {
    podbay::runtime::run()
}
