//! CLI for ECDSA correlated-nonce key recovery

use anyhow::Result;
use clap::{Parser, Subcommand};
use noncesift::attack::correlated_nonce::{DEFAULT_DELTA_MAX, DEFAULT_DELTA_MIN};
use noncesift::attack::CorrelatedNonceAttack;
use noncesift::math::{parse_order, to_decimal_string, to_hex_string, Weight, SECP256K1_ORDER_HEX};
use noncesift::provider::load_signatures;
use noncesift::RecoveredKey;
use serde::Serialize;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "noncesift")]
#[command(about = "ECDSA private key recovery from r/z-correlated nonces")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    Recover {
        #[arg(default_value = "-")]
        input: String,

        #[arg(
            long,
            default_value = "0.3653",
            help = "Nonce estimation weight in [0,1]: k ~ (1-weight)*r + weight*z"
        )]
        weight: String,

        #[arg(long, default_value_t = DEFAULT_DELTA_MIN, help = "Smallest offset around the nonce estimate")]
        delta_min: i64,

        #[arg(long, default_value_t = DEFAULT_DELTA_MAX, help = "Largest offset around the nonce estimate")]
        delta_max: i64,

        #[arg(
            long,
            help = "Signatures that must agree on a candidate (default: max(2, count/2))"
        )]
        threshold: Option<usize>,

        #[arg(
            long,
            default_value = SECP256K1_ORDER_HEX,
            help = "Curve order n in hex (default: secp256k1)"
        )]
        order: String,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(recovered_keys) => {
            if recovered_keys {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<bool> {
    match cli.command {
        Command::Recover {
            input,
            weight,
            delta_min,
            delta_max,
            threshold,
            order,
        } => {
            let order = parse_order(&order)?;
            let weight = Weight::parse(&weight)?;
            if delta_min > delta_max {
                anyhow::bail!("delta-min must not exceed delta-max");
            }
            if let Some(0) = threshold {
                anyhow::bail!("threshold must be at least 1");
            }
            let deltas: Vec<i64> = (delta_min..=delta_max).collect();

            let signatures = load_signatures(&input, &order)?;

            let attack = CorrelatedNonceAttack::new(order, weight, deltas, threshold);
            let effective_threshold = attack.effective_threshold(signatures.len());
            let recovered = attack.recover(&signatures);

            let output = format_output(&recovered, signatures.len(), effective_threshold, cli.json)?;
            println!("{}", output);

            Ok(!recovered.is_empty())
        }
    }
}

#[derive(Serialize)]
struct OutputReport {
    candidates: Vec<CandidateOutput>,
    summary: SummaryOutput,
}

#[derive(Serialize)]
struct CandidateOutput {
    private_key_hex: String,
    private_key_decimal: String,
    support: usize,
}

#[derive(Serialize)]
struct SummaryOutput {
    total_signatures: usize,
    threshold: usize,
    keys_recovered: usize,
}

fn format_output(
    recovered: &[RecoveredKey],
    total_signatures: usize,
    threshold: usize,
    json: bool,
) -> Result<String> {
    let candidates: Vec<CandidateOutput> = recovered
        .iter()
        .map(|key| CandidateOutput {
            private_key_hex: to_hex_string(&key.private_key),
            private_key_decimal: to_decimal_string(&key.private_key),
            support: key.support,
        })
        .collect();

    let report = OutputReport {
        candidates,
        summary: SummaryOutput {
            total_signatures,
            threshold,
            keys_recovered: recovered.len(),
        },
    };

    if json {
        Ok(serde_json::to_string_pretty(&report)?)
    } else {
        let mut output = String::new();
        output.push_str(&format!("Analyzed {} signatures\n\n", total_signatures));

        if report.candidates.is_empty() {
            output.push_str(&format!(
                "No consensus: no candidate appeared in at least {} signatures.\n",
                threshold
            ));
        } else {
            output.push_str(&format!(
                "Recovered {} key candidate(s) with threshold {}:\n\n",
                report.candidates.len(),
                threshold
            ));

            for (i, candidate) in report.candidates.iter().enumerate() {
                output.push_str(&format!("Candidate #{}\n", i + 1));
                output.push_str(&format!(
                    "  Support: {} of {} signatures\n",
                    candidate.support, total_signatures
                ));
                output.push_str(&format!(
                    "  Private Key (decimal): {}\n",
                    candidate.private_key_decimal
                ));
                output.push_str(&format!(
                    "  Private Key (hex): {}\n",
                    candidate.private_key_hex
                ));
                output.push('\n');
            }
        }

        Ok(output)
    }
}
