fn main() -> Result<(), Box<dyn std::error::Error>> {
    splitchat::cli::main()
}
