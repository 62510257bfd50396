//! Command line entry point for TN3270R
//!
//! Opens a session, reports what was negotiated and dumps every record the
//! host sends as hex until the connection closes or goes quiet.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tn3270r::config::{default_config_path, load_config, load_config_or_default};
use tn3270r::{Telnet, TN3270Error};

struct Options {
    host: String,
    port: u16,
    terminal_type: Option<String>,
    no_tn3270e: bool,
    lu_name: Option<String>,
    timeout: Duration,
    config: Option<PathBuf>,
}

fn print_help() {
    println!("TN3270R - TN3270/TN3270E client");
    println!();
    println!("Usage: tn3270r --host <host> [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --host <host> or -H <host>          Host to connect to");
    println!("  --port <port> or -p <port>          Port to connect to (default: 23)");
    println!("  --terminal-type <type> or -t <type> Terminal type to announce");
    println!("                                      (default: IBM-3279-2-E)");
    println!("  --no-tn3270e                        Refuse TN3270E, use basic TN3270 only");
    println!("  --lu <name>                         Request this LU during TN3270E negotiation");
    println!("  --timeout <secs>                    Stop after this many idle seconds");
    println!("                                      (default: 5)");
    println!("  --config <path>                     Load session settings from a JSON file");
    println!("  --help or -h                        Show this help message");
    println!();
    println!("Example:");
    println!("  tn3270r --host 10.100.200.1 --port 23 --lu TCP00034");
}

fn parse_args(args: &[String]) -> Result<Option<Options>> {
    let mut host = None;
    let mut port = 23;
    let mut terminal_type = None;
    let mut no_tn3270e = false;
    let mut lu_name = None;
    let mut timeout = Duration::from_secs(5);
    let mut config = None;

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        let mut value = || -> Result<String> {
            i += 1;
            args.get(i).cloned().with_context(|| format!("{flag} requires a value"))
        };

        match flag {
            "--host" | "-H" => host = Some(value()?),
            "--port" | "-p" => {
                port = value()?.parse().context("--port requires a numeric value")?;
            }
            "--terminal-type" | "-t" => terminal_type = Some(value()?),
            "--no-tn3270e" => no_tn3270e = true,
            "--lu" => lu_name = Some(value()?),
            "--timeout" => {
                let secs: f64 =
                    value()?.parse().context("--timeout requires a number of seconds")?;
                timeout = Duration::try_from_secs_f64(secs)
                    .context("--timeout must not be negative")?;
            }
            "--config" => config = Some(PathBuf::from(value()?)),
            "--help" | "-h" => return Ok(None),
            other => bail!("Unknown option: {other}"),
        }
        i += 1;
    }

    let Some(host) = host else {
        bail!("--host is required");
    };

    Ok(Some(Options { host, port, terminal_type, no_tn3270e, lu_name, timeout, config }))
}

fn hex_dump(record: &[u8]) -> String {
    record.iter().map(|b| format!("{b:02x}")).collect::<Vec<_>>().join(" ")
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let Some(options) = parse_args(&args)? else {
        print_help();
        return Ok(());
    };

    let mut config = match &options.config {
        Some(path) => load_config(path)?,
        None => load_config_or_default(&default_config_path())?,
    };
    if let Some(terminal_type) = options.terminal_type {
        config.terminal_type = terminal_type;
    }
    if options.no_tn3270e {
        config.tn3270e_enabled = false;
    }
    if options.lu_name.is_some() {
        config.lu_name = options.lu_name;
    }

    let mut telnet = Telnet::open(&options.host, options.port, config)
        .with_context(|| format!("Failed to open session with {}:{}", options.host, options.port))?;

    println!(
        "Negotiated TN3270{} (device type: {}, device name: {})",
        if telnet.is_tn3270e_negotiated() { "E" } else { "" },
        telnet.device_type().unwrap_or("-"),
        telnet.device_name().unwrap_or("-"),
    );

    loop {
        match telnet.read_multiple(None, Some(options.timeout)) {
            Ok(records) if records.is_empty() => {
                println!("No data for {:?}, closing", options.timeout);
                break;
            }
            Ok(records) => {
                for record in records {
                    println!("[{} bytes] {}", record.len(), hex_dump(&record));
                }
            }
            Err(TN3270Error::ConnectionClosed) => {
                println!("Connection closed by host");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }
    }

    telnet.close()?;
    Ok(())
}
