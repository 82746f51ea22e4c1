use std::path::PathBuf;
use std::process::exit;

use clap::{Parser as ClapParser, error::ErrorKind};
use spyc::{SourceFile, SourceFileOrigin};

#[derive(Debug, ClapParser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the input spy source file
    input: PathBuf,

    /// Output path; derived from the input path when omitted
    #[arg(short)]
    output: Option<PathBuf>,

    /// Code generation target
    #[arg(short, long)]
    target: Option<String>,
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(error) => {
            // Help and version are not failures; everything else is
            let code = match error.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };

            let _ = error.print();
            exit(code);
        }
    };

    let target = match args.target.as_deref().map(spyc::select_target).transpose() {
        Ok(target) => target.unwrap_or_default(),
        Err(error) => {
            eprintln!("ERROR: {error}");
            exit(1);
        }
    };

    let contents = match std::fs::read_to_string(&args.input) {
        Ok(contents) => contents,
        Err(error) => {
            eprintln!("ERROR: could not read `{}`: {error}", args.input.display());
            exit(1);
        }
    };

    let source = SourceFile::new(contents, SourceFileOrigin::File(args.input.clone()));

    let output = match spyc::compile(&source, target) {
        Ok(output) => output,
        Err(error) => {
            eprintln!("{error}");
            exit(1);
        }
    };

    // Output is buffered in memory until here and written exactly once, only
    // on full success
    let output_path = args
        .output
        .unwrap_or_else(|| spyc::default_output_path(&args.input, target));

    if let Err(error) = std::fs::write(&output_path, output) {
        eprintln!(
            "ERROR: could not write `{}`: {error}",
            output_path.display()
        );
        exit(1);
    }
}
