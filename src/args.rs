//! Command-line argument handling.

use crate::errors::CopyError;

/// The two positional arguments of one copy run.
#[derive(Debug, Clone)]
pub struct CopyOptions {
    pub source: String,
    pub destination: String,
}

impl CopyOptions {
    /// Parse an argv-style iterator (program name first). Anything other
    /// than exactly two positional arguments is rejected before any worker
    /// exists.
    pub fn parse<I>(args: I) -> Result<Self, CopyError>
    where
        I: IntoIterator<Item = String>,
    {
        let positional: Vec<String> = args.into_iter().skip(1).collect();
        match <[String; 2]>::try_from(positional) {
            Ok([source, destination]) => Ok(CopyOptions {
                source,
                destination,
            }),
            Err(_) => Err(CopyError::InvalidArguments),
        }
    }
}

pub fn print_usage(program_name: &str) {
    println!("Usage: {} <source> <destination>", program_name);
    println!();
    println!("Copies a single file while printing live progress, and cleans up");
    println!("the partial destination if the copy is cancelled with Ctrl+C.");
}
