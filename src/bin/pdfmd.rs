use batchforge::pdfmd;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "pdfmd",
    version,
    about = "Convert between PDF and Markdown formats",
    long_about = "Convert between PDF and Markdown using pandoc.\n\n\
    The direction is inferred from the input extension: .pdf converts to \
    Markdown, .md/.markdown converts to PDF through xelatex with a CJK font \
    override."
)]
struct Cli {
    /// Path to input file (.pdf or .md)
    input: PathBuf,

    /// Output file path
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match pdfmd::convert(&cli.input, cli.output.as_deref()) {
        Ok(path) => println!("Wrote {}", path.display()),
        // A failing converter leaves nothing to clean up; only an
        // unusable input extension is a hard error.
        Err(err) if err.is_conversion() => eprintln!("{err}"),
        Err(err) => return Err(err.into()),
    }

    Ok(())
}
