//! A small CLI exercising `SpTrie` end to end. This is the one place in
//! the workspace that is actually an application rather than a library:
//! it owns logging, argument parsing and process exit codes so the rest
//! of the crate can stay free of all three.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use kmer::{Kmer, QKmer};
use kmer_spgist::{ScanKey, SpTrie};

#[derive(Parser, Debug)]
#[clap(author, version, about = "space-partitioned radix trie over K-mers", long_about = None)]
struct Args {
    #[clap(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a trie from a list of K-mers and report how many were stored.
    Insert {
        /// File with one K-mer per line. Reads stdin if omitted.
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Build a trie from a list of K-mers, then run one query against it.
    Query {
        /// File with one K-mer per line. Reads stdin if omitted.
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Which operator strategy to query with.
        #[arg(short, long, value_enum)]
        strategy: StrategyArg,

        /// The query argument: a K-mer for equal/prefix, a QK-mer for
        /// qkmer-match.
        argument: String,
    },
}

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
enum StrategyArg {
    Equal,
    Prefix,
    Qkmer,
}

fn read_kmers(input: &Option<PathBuf>) -> io::Result<Vec<String>> {
    let text = match input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().lock().read_to_string(&mut buf)?;
            buf
        }
    };
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

fn build_trie(lines: &[String]) -> anyhow::Result<SpTrie> {
    let mut trie = SpTrie::new();
    for line in lines {
        let kmer = Kmer::parse(line)?;
        trie.insert(&kmer)?;
    }
    Ok(trie)
}

fn run(args: Args) -> anyhow::Result<()> {
    match args.cmd {
        Commands::Insert { input } => {
            let lines = read_kmers(&input)?;
            log::info!("read {} candidate K-mers", lines.len());
            let trie = build_trie(&lines)?;
            log::debug!("trie built");
            println!("inserted {} K-mers", lines.len());
            let _ = trie;
        }
        Commands::Query {
            input,
            strategy,
            argument,
        } => {
            let lines = read_kmers(&input)?;
            log::info!("read {} candidate K-mers", lines.len());
            let trie = build_trie(&lines)?;

            let scan_key = match strategy {
                StrategyArg::Equal => ScanKey::equal(Kmer::parse(&argument)?),
                StrategyArg::Prefix => ScanKey::prefix(Kmer::parse(&argument)?),
                StrategyArg::Qkmer => ScanKey::qkmer_match(QKmer::parse(&argument)?),
            };
            log::debug!("scanning with {:?}", scan_key.strategy);

            let hits = trie.search(&[scan_key])?;
            for hit in &hits {
                println!("{}", hit.render());
            }
            log::info!("{} matches", hits.len());
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_kmers_skips_blank_lines_and_trims() {
        let text = "ACGT\n\n  AAGG  \n";
        let lines: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        assert_eq!(lines, vec!["ACGT", "AAGG"]);
    }

    #[test]
    fn build_trie_rejects_invalid_symbol() {
        let err = build_trie(&["ACGX".to_string()]).unwrap_err();
        let kmer_err = err.downcast_ref::<kmer::KmerError>();
        assert!(matches!(kmer_err, Some(kmer::KmerError::InvalidSymbol(_))));
    }
}
