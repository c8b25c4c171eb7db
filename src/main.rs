// This is my main entry point for the hunt ledger CLI
// Each invocation opens the chain snapshot, runs one operation and exits
// The pending pool only lives for the process, so forge and mint take transaction records with --tx
use clap::Parser;
use hunt_chain::core::monetary::conversions::format_balance;
use hunt_chain::core::solver::solve;
use hunt_chain::core::transaction::sign_payload;
use hunt_chain::utils::{from_json, to_pretty_json};
use hunt_chain::{
    Blockchain, ChainServer, ChainStore, Command, FeePolicy, HttpPeerClient, Identity, Opt,
    Resolution, SharedBlockchain, Transaction, GLOBAL_CONFIG,
};
use log::{error, info, LevelFilter};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::PathBuf;
use std::process;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn main() {
    // Info level by default, RUST_LOG can still narrow or widen it
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let opt = Opt::parse();
    if let Some(data_file) = opt.data_file {
        GLOBAL_CONFIG.set_data_file(data_file);
    }

    if let Err(e) = run_command(opt.command) {
        error!("Error: {e}");
        process::exit(1);
    }
}

// I open the ledger the same way for every command, with the configured peers already registered
fn open_blockchain() -> CliResult<Blockchain> {
    let store = ChainStore::new(GLOBAL_CONFIG.get_data_file());
    let fees = FeePolicy::new(GLOBAL_CONFIG.get_fee_rate());
    let mut blockchain =
        Blockchain::open_with_seed_phrase(store, fees, &GLOBAL_CONFIG.get_genesis_seed_phrase())?;
    for peer in GLOBAL_CONFIG.get_peers() {
        blockchain.register_peer(&peer);
    }
    Ok(blockchain)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    println!("{}", String::from_utf8(to_pretty_json(value)?)?);
    Ok(())
}

fn parse_data(data: Option<String>) -> CliResult<Map<String, Value>> {
    match data {
        None => Ok(Map::new()),
        Some(text) => match serde_json::from_str::<Value>(&text)? {
            Value::Object(map) => Ok(map),
            _ => Err("--data must be a JSON object".into()),
        },
    }
}

fn load_transactions(paths: &[PathBuf]) -> CliResult<Vec<Transaction>> {
    let mut transactions = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = fs::read(path)
            .map_err(|e| format!("Cannot read transaction file {}: {e}", path.display()))?;
        transactions.push(from_json::<Transaction>(&bytes)?);
    }
    Ok(transactions)
}

fn submit_all(blockchain: &mut Blockchain, transactions: Vec<Transaction>) -> CliResult<()> {
    for tx in transactions {
        blockchain.submit_transaction(tx)?;
    }
    Ok(())
}

fn report_resolution(blockchain: &mut Blockchain) -> CliResult<()> {
    let client = HttpPeerClient::new(GLOBAL_CONFIG.get_peer_timeout());
    match blockchain.resolve_conflicts(&client) {
        Resolution::Replaced => println!(
            "Our chain was replaced by a longer one ({} blocks)",
            blockchain.len()
        ),
        Resolution::Authoritative => println!("Our chain is authoritative ({} blocks)", blockchain.len()),
    }
    Ok(())
}

fn run_command(command: Command) -> CliResult<()> {
    match command {
        // When I want a fresh keypair to play with
        Command::CreateIdentity => {
            let identity = Identity::generate()?;
            print_json(&identity.export())?;
        }
        // When I want a transaction record I can hand to forge or mint later
        Command::Sign {
            private_key,
            sender,
            recipient,
            amount,
            timestamp,
            data,
        } => {
            let data = parse_data(data)?;
            let signed = sign_payload(
                &private_key,
                &sender,
                &recipient,
                amount,
                timestamp,
                data.clone(),
            )?;
            let tx = Transaction::new(&sender, &recipient, amount, signed.timestamp, data)
                .with_signature(Some(signed.signature));
            print_json(&tx)?;
        }
        // When I want to know whether the chain would accept a transfer right now
        Command::Submit {
            sender,
            recipient,
            amount,
            timestamp,
            signature,
            data,
        } => {
            let mut blockchain = open_blockchain()?;
            let tx = Transaction::new(&sender, &recipient, amount, timestamp, parse_data(data)?)
                .with_signature(Some(signature));
            blockchain.submit_transaction(tx.clone())?;
            println!(
                "Transaction accepted; {} still available to {}",
                format_balance(blockchain.available_balance(&sender)),
                sender
            );
            print_json(&tx)?;
        }
        Command::Forge {
            forger,
            transactions,
        } => {
            let mut blockchain = open_blockchain()?;
            submit_all(&mut blockchain, load_transactions(&transactions)?)?;
            let block = blockchain.forge_block(&forger)?;
            print_json(&block)?;
        }
        Command::Mint {
            solver,
            solution,
            transactions,
        } => {
            let mut blockchain = open_blockchain()?;
            submit_all(&mut blockchain, load_transactions(&transactions)?)?;
            let block = blockchain.attempt_mint(&solver, &solution)?;
            println!("Success! Block #{} created", block.get_index());
            print_json(&block)?;
        }
        Command::Chain => {
            let blockchain = open_blockchain()?;
            print_json(blockchain.get_chain())?;
        }
        Command::Block { index } => {
            let blockchain = open_blockchain()?;
            print_json(blockchain.get_block(index)?)?;
        }
        Command::Address { address } => {
            let blockchain = open_blockchain()?;
            let data = blockchain.address_data(&address);
            println!("Balance of {address}: {}", format_balance(data.balance));
            print_json(&data)?;
        }
        // Peers only live for this process, so I resolve against them straight away
        Command::RegisterPeer { endpoints } => {
            let mut blockchain = open_blockchain()?;
            for endpoint in &endpoints {
                if !blockchain.register_peer(endpoint) {
                    info!("Peer {endpoint} already registered");
                }
            }
            report_resolution(&mut blockchain)?;
        }
        Command::Resolve => {
            let mut blockchain = open_blockchain()?;
            if blockchain.get_peers().is_empty() {
                return Err("No peers configured; set HUNT_PEERS or use register-peer".into());
            }
            report_resolution(&mut blockchain)?;
        }
        Command::Puzzle => {
            let blockchain = open_blockchain()?;
            match blockchain.current_puzzle() {
                Some(puzzle) => print_json(puzzle)?,
                None => println!("The latest block is a settlement block; there is no puzzle to solve"),
            }
        }
        Command::Solve { max_nonce } => {
            let blockchain = open_blockchain()?;
            let puzzle = blockchain
                .current_puzzle()
                .ok_or("The latest block carries no puzzle")?;
            match solve(puzzle, max_nonce) {
                Some(answer) => println!("{answer}"),
                None => return Err("No solution found".into()),
            }
        }
        Command::Serve { addr } => {
            let addr = addr.unwrap_or_else(|| GLOBAL_CONFIG.get_listen_addr());
            let shared = SharedBlockchain::new(open_blockchain()?);
            let server = ChainServer::bind(&addr, shared)?;
            server.run()?;
        }
        Command::Verify => {
            let blockchain = open_blockchain()?;
            Blockchain::verify_chain(blockchain.get_chain())?;
            println!("Chain of {} blocks verifies", blockchain.len());
        }
    }
    Ok(())
}
