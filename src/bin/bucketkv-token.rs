//! BucketKV - Token Generator
//! Issues a signed bearer token for the server and prints it to stdout.

use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use bucketkv::auth::{duration, unix_now, TokenIssuer};
use bucketkv::config::Secret;

#[derive(Debug, Parser)]
#[command(name = "bucketkv-token", version, about = "Issue a bearer token for BucketKV")]
struct Args {
    /// Secret used to sign the token. Must match the server's JWT_SECRET.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    secret: String,

    /// Validity of the token (e.g. "24h", "30m", "1h30m").
    #[arg(long, value_parser = parse_expires_in)]
    expires_in: Duration,
}

fn parse_expires_in(input: &str) -> Result<Duration, String> {
    duration::parse(input).map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let token = Secret::new(args.secret)
        .and_then(|secret| TokenIssuer::new(&secret))
        .and_then(|issuer| issuer.issue(unix_now(), args.expires_in));

    match token {
        Ok(token) => {
            log::debug!("issued token valid for {:?}", args.expires_in);
            let mut stdout = std::io::stdout();
            if let Err(err) = stdout.write_all(token.as_bytes()).and_then(|_| stdout.flush()) {
                eprintln!("Error: failed to write token: {}", err);
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: failed to sign token: {}", err);
            ExitCode::FAILURE
        }
    }
}
