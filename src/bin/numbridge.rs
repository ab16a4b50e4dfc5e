use clap::{Parser, Subcommand};
use numbridge::{logging, native, Bridge, BridgeConfig, InterchangeValue};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, error};

#[derive(Parser)]
#[command(name = "numbridge")]
#[command(about = "Call routines of the linked numeric library", long_about = None)]
struct Cli {
    /// Config file (defaults to .numbridge.toml in this or a parent directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List declared foreign functions
    List,
    /// Invoke a foreign function
    Call {
        /// Declared function name
        name: String,
        /// Arguments, parsed per the declared parameter types
        #[arg(allow_negative_numbers = true)]
        args: Vec<String>,
    },
}

#[derive(Serialize)]
struct CallReport<'a> {
    function: &'a str,
    args: &'a [InterchangeValue],
    result: InterchangeValue,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        error!(error = %e, "numbridge failed");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => BridgeConfig::load(path)?,
        None => BridgeConfig::discover()?,
    };

    let _guard = logging::init_with_config(config.logging.to_log_config()?.apply_env());

    let bridge = Bridge::new(config.declarations()?, &native::symbols())?;
    debug!(library = bridge.library(), "Bridge constructed");

    match cli.command {
        Command::List => list(&bridge, cli.json),
        Command::Call { name, args } => call(&bridge, &name, &args, cli.json),
    }
}

fn list(bridge: &Bridge, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let signatures: Vec<String> = bridge.signatures().map(|s| s.to_string()).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&signatures)?);
    } else {
        for signature in signatures {
            println!("{}", signature);
        }
    }
    Ok(())
}

fn call(
    bridge: &Bridge,
    name: &str,
    args: &[String],
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let signature = bridge.lookup(name)?;

    if args.len() != signature.arity() {
        return Err(numbridge::BridgeError::ArityMismatch {
            function: name.to_string(),
            expected: signature.arity(),
            found: args.len(),
        }
        .into());
    }

    let values = args
        .iter()
        .zip(signature.params())
        .map(|(text, &ty)| InterchangeValue::parse(text, ty))
        .collect::<Result<Vec<_>, _>>()?;

    let result = bridge.invoke(name, &values)?;

    if json {
        let report = CallReport {
            function: name,
            args: &values,
            result,
        };
        println!("{}", serde_json::to_string(&report)?);
    } else {
        let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        println!("{}({}) = {}", name, rendered.join(", "), result);
    }
    Ok(())
}
