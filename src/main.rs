use gridscape::AppConfig;

fn main() -> anyhow::Result<()> {
    gridscape::run(AppConfig::default())
}
