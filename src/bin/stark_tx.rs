//! Build (and optionally submit) a signed account transaction.
//!
//! Usage:
//!   cargo run --bin stark_tx -- <target> <entry_point> [calldata...] [--nonce N] [--submit] [--config PATH]
//!
//! Calldata items:
//!   0x1f / 31        a single felt
//!   [1,2,0x3]        an array, written as [len, items...]
//!   short:Hello      a short string packed into one felt
//!   str:Hello        a string as one felt per character (array)
//!
//! STARK_PRIVATE_KEY and ACCOUNT_ADDRESS must be set (a .env file is read).

use anyhow::{bail, Context};
use dotenv::dotenv;
use stark_tx_signer::{
    account_from_env, felt_to_hex, parse_felt, short_string_to_felt, string_to_felt_array, Calldata,
    Felt, PedersenHasher, RpcClient, SignerConfig, TransactionBuilder, TransactionSubmitter,
};
use std::env;
use tracing::info;

struct Args {
    target: Felt,
    entry_point: String,
    calldata: Vec<Calldata>,
    nonce: Option<Felt>,
    submit: bool,
    config_path: String,
}

fn parse_calldata_item(raw: &str) -> anyhow::Result<Calldata> {
    if let Some(text) = raw.strip_prefix("short:") {
        return Ok(Calldata::Felt(short_string_to_felt(text)?));
    }
    if let Some(text) = raw.strip_prefix("str:") {
        return Ok(Calldata::Array(string_to_felt_array(text)));
    }
    if let Some(inner) = raw.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        let items = inner
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| parse_felt(s, "calldata"))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Calldata::Array(items));
    }
    Ok(Calldata::Felt(parse_felt(raw, "calldata")?))
}

fn parse_args(raw: &[String]) -> anyhow::Result<Args> {
    let mut positional = Vec::new();
    let mut nonce = None;
    let mut submit = false;
    let mut config_path = "config.json".to_string();

    let mut iter = raw.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--submit" => submit = true,
            "--nonce" => {
                let value = iter.next().context("--nonce needs a value")?;
                nonce = Some(parse_felt(value, "nonce")?);
            }
            "--config" => {
                config_path = iter.next().context("--config needs a path")?.clone();
            }
            _ => positional.push(arg.clone()),
        }
    }

    if positional.len() < 2 {
        bail!("usage: stark_tx <target> <entry_point> [calldata...] [--nonce N] [--submit] [--config PATH]");
    }
    let target = parse_felt(&positional[0], "target")?;
    let entry_point = positional[1].clone();
    let calldata = positional[2..]
        .iter()
        .map(|item| parse_calldata_item(item))
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(Args {
        target,
        entry_point,
        calldata,
        nonce,
        submit,
        config_path,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stark_tx_signer::init_logging();
    dotenv().ok();

    let raw: Vec<String> = env::args().skip(1).collect();
    let args = parse_args(&raw)?;

    let config = SignerConfig::load(&args.config_path)?.with_env_overrides();
    let account = account_from_env()?;
    let client = RpcClient::new(&config.rpc_url)?
        .with_nonce_entry_point(&config.nonce_entry_point)
        .with_max_fee(config.max_fee()?);
    let builder = TransactionBuilder::new(PedersenHasher::shared()?).with_nonce_timeout(config.nonce_timeout());

    info!(
        "Account {} (stark key {})",
        felt_to_hex(&account.address()),
        felt_to_hex(&account.stark_key())
    );

    let payload = builder
        .build(&client, &account, &args.target, &args.entry_point, &args.calldata, args.nonce)
        .await?;
    println!("{}", serde_json::to_string_pretty(&payload)?);

    if args.submit {
        let tx_hash = client.submit(&account.address(), &args.target, &payload).await?;
        println!("transaction_hash: {}", felt_to_hex(&tx_hash));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args() {
        let args = parse_args(&strings(&["0x10", "transfer", "5", "[1,2]", "--nonce", "3", "--submit"])).unwrap();
        assert_eq!(args.target, Felt::from(16u64));
        assert_eq!(args.entry_point, "transfer");
        assert_eq!(
            args.calldata,
            vec![
                Calldata::Felt(Felt::from(5u64)),
                Calldata::Array(vec![Felt::ONE, Felt::from(2u64)])
            ]
        );
        assert_eq!(args.nonce, Some(Felt::from(3u64)));
        assert!(args.submit);
    }

    #[test]
    fn test_parse_string_items() {
        assert_eq!(
            parse_calldata_item("str:Hi").unwrap(),
            Calldata::Array(vec![Felt::from(72u64), Felt::from(105u64)])
        );
        assert_eq!(
            parse_calldata_item("short:Hi").unwrap(),
            Calldata::Felt(Felt::from(0x4869u64))
        );
        assert_eq!(parse_calldata_item("[]").unwrap(), Calldata::Array(vec![]));
    }

    #[test]
    fn test_missing_positionals() {
        assert!(parse_args(&strings(&["0x10"])).is_err());
        assert!(parse_args(&strings(&["0x10", "f", "--nonce"])).is_err());
    }
}
