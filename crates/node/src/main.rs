#![allow(clippy::result_large_err)]

mod cli;

use cli::{Args, Op, Parser};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let op = args.command;
    match op.execute().await {
        Ok(r) => {
            println!("{}", r);
            std::process::exit(0);
        }
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };
}
