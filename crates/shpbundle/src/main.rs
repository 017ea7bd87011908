fn main() -> anyhow::Result<()> {
    let config = shpbundle::infra::config::Config::load()?;
    shpbundle::init(&config);

    shpbundle::cli::run(config)
}
