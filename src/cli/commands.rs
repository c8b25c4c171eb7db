use crate::core::monetary::conversions::parse_tokens;
use crate::core::Amount;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Token amounts on the command line are decimal ("4.999"), with at most six places
pub fn parse_amount(s: &str) -> Result<Amount, String> {
    parse_tokens(s).ok_or_else(|| {
        format!("Invalid amount: {s}. Use a decimal token amount such as '4.999'")
    })
}

#[derive(Debug, Parser)]
#[command(name = "hunt-chain")]
pub struct Opt {
    #[arg(
        long = "data-file",
        global = true,
        help = "Chain snapshot to use instead of the configured one"
    )]
    pub data_file: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(name = "createidentity", about = "Create a new identity")]
    CreateIdentity,
    #[command(
        name = "sign",
        about = "Sign a transfer with a private key and print the transaction record"
    )]
    Sign {
        #[arg(long = "private-key", help = "Hex private key from createidentity")]
        private_key: String,
        #[arg(long, help = "Sender address")]
        sender: String,
        #[arg(long, help = "Recipient address")]
        recipient: String,
        #[arg(long, value_parser = parse_amount, help = "Amount in tokens")]
        amount: Amount,
        #[arg(long, help = "Timestamp to sign (seconds); defaults to now")]
        timestamp: Option<f64>,
        #[arg(long, help = "Auxiliary JSON object carried by the transaction")]
        data: Option<String>,
    },
    #[command(
        name = "submit",
        about = "Check a signed transfer against the chain without forging"
    )]
    Submit {
        #[arg(long, help = "Sender address")]
        sender: String,
        #[arg(long, help = "Recipient address")]
        recipient: String,
        #[arg(long, value_parser = parse_amount, help = "Amount in tokens")]
        amount: Amount,
        #[arg(long, help = "Timestamp the signature covers")]
        timestamp: f64,
        #[arg(long, help = "Hex signature")]
        signature: String,
        #[arg(long, help = "Auxiliary JSON object carried by the transaction")]
        data: Option<String>,
    },
    #[command(
        name = "forge",
        about = "Submit transaction records and forge them into a settlement block"
    )]
    Forge {
        #[arg(help = "Address that collects the fees")]
        forger: String,
        #[arg(long = "tx", help = "Transaction record file (JSON), repeatable")]
        transactions: Vec<PathBuf>,
    },
    #[command(name = "mint", about = "Claim the current puzzle")]
    Mint {
        #[arg(help = "Address that receives the reward")]
        solver: String,
        #[arg(help = "Proposed solution")]
        solution: String,
        #[arg(long = "tx", help = "Transaction record file (JSON) to confirm, repeatable")]
        transactions: Vec<PathBuf>,
    },
    #[command(name = "chain", about = "Print all blocks in the chain")]
    Chain,
    #[command(name = "block", about = "Print one block")]
    Block {
        #[arg(help = "Block index")]
        index: u64,
    },
    #[command(name = "address", about = "Print balance and history of an address")]
    Address {
        #[arg(help = "The address")]
        address: String,
    },
    #[command(name = "register-peer", about = "Register peers and resolve against them")]
    RegisterPeer {
        #[arg(required = true, help = "Peer endpoints, e.g. http://127.0.0.1:5001")]
        endpoints: Vec<String>,
    },
    #[command(name = "resolve", about = "Adopt the longest chain among configured peers")]
    Resolve,
    #[command(name = "puzzle", about = "Show the puzzle published by the latest block")]
    Puzzle,
    #[command(name = "solve", about = "Work out the answer to the current puzzle")]
    Solve {
        #[arg(
            long = "max-nonce",
            default_value_t = 100_000_000,
            help = "Upper bound for proof-of-work search"
        )]
        max_nonce: u64,
    },
    #[command(name = "serve", about = "Serve GET /chain so other nodes can use this one as a peer")]
    Serve {
        #[arg(long, help = "Listen address; defaults to the configured one")]
        addr: Option<String>,
    },
    #[command(name = "verify", about = "Audit hashes, links and signatures of the local chain")]
    Verify,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("4.999"), Ok(4_999_000));
        assert!(parse_amount("four").is_err());
    }

    #[test]
    fn test_parse_forge_command() {
        let opt = Opt::try_parse_from([
            "hunt-chain",
            "--data-file",
            "/tmp/chain.json",
            "forge",
            "forger",
            "--tx",
            "a.json",
            "--tx",
            "b.json",
        ])
        .unwrap();

        assert_eq!(opt.data_file, Some(PathBuf::from("/tmp/chain.json")));
        match opt.command {
            Command::Forge {
                forger,
                transactions,
            } => {
                assert_eq!(forger, "forger");
                assert_eq!(transactions.len(), 2);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_sign_command() {
        let opt = Opt::try_parse_from([
            "hunt-chain",
            "sign",
            "--private-key",
            "ab",
            "--sender",
            "s",
            "--recipient",
            "r",
            "--amount",
            "0.5",
        ])
        .unwrap();
        assert!(matches!(
            opt.command,
            Command::Sign {
                amount: 500_000,
                timestamp: None,
                ..
            }
        ));
    }

    #[test]
    fn test_register_peer_requires_endpoint() {
        assert!(Opt::try_parse_from(["hunt-chain", "register-peer"]).is_err());
    }
}
