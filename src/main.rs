fn main() -> anyhow::Result<()> {
    labelforge::run()?;
    Ok(())
}
