use crate::account::is_valid_address;
use crate::checker::{RankChecker, RankReport};
use crate::sources::AccountDataSource;

const USAGE: &str = "usage: rank_checker [--config <path>] (check <address>... | serve)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Check { addresses: Vec<String> },
    Serve,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub config_path: Option<String>,
    pub command: Command,
}

pub fn parse_args<I>(mut args: I) -> std::result::Result<Invocation, String>
where
    I: Iterator<Item = String>,
{
    // Drop argv[0].
    let _ = args.next();

    let mut config_path = None;
    let mut cmd = args.next();
    if cmd.as_deref() == Some("--config") {
        config_path = Some(
            args.next()
                .ok_or_else(|| "--config needs a path".to_string())?,
        );
        cmd = args.next();
    }

    let Some(cmd) = cmd else {
        return Err(USAGE.to_string());
    };

    let command = match cmd.as_str() {
        "check" => {
            let addresses: Vec<String> = args.collect();
            if addresses.is_empty() {
                return Err("usage: rank_checker check <address>...".to_string());
            }
            if let Some(bad) = addresses.iter().find(|a| !is_valid_address(a)) {
                return Err(format!(
                    "invalid address: {bad} (expected 0x followed by 40 hex characters)"
                ));
            }
            Command::Check { addresses }
        }
        "serve" => Command::Serve,
        other => return Err(format!("unknown command: {other}\n{USAGE}")),
    };

    Ok(Invocation {
        config_path,
        command,
    })
}

pub fn report_header() -> String {
    format!(
        "{:<42}  {:>14}  {:>7}  {:>7}  {:>3}  {:>10}  {}",
        "address", "balance", "tx", "tokens", "sb", "total", "tier"
    )
}

pub fn format_report_row(report: &RankReport) -> String {
    let r = &report.record;
    format!(
        "{:<42}  {:>14}  {:>7}  {:>7}  {:>3}  {:>10.2}  {} {} (L{})",
        r.address,
        r.balance.round_dp(6).to_string(),
        r.transaction_count,
        r.token_transfer_count,
        r.soulbound_nft_count,
        report.breakdown.total,
        report.tier.icon(),
        report.tier.name(),
        report.tier.level(),
    )
}

pub async fn run_check<S>(checker: &RankChecker<S>, addresses: &[String])
where
    S: AccountDataSource + Sync,
{
    let reports = checker.check_many(addresses).await;

    println!("{}", report_header());
    for report in &reports {
        println!("{}", format_report_row(report));
    }
}
