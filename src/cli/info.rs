use npmreg::resolver;

pub fn run() -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&resolver::registry_info())?);
    Ok(())
}
