use anyhow::Context;

fn main() -> anyhow::Result<()> {
    let code = docgate::run().context("docgate failed")?;
    std::process::exit(code);
}
