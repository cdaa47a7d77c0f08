fn main() -> anyhow::Result<()> {
    glimmind_cli::run()
}
