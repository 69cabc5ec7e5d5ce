use anyhow::Result;

fn main() -> Result<()> {
    dsp_validate_cli::run()
}
