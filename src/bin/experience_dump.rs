//! experience_dump - inspect an experience log
//!
//! Stream-parses a log of back-to-back JSON documents, validates each one
//! against the record schema, and prints per-document summaries (or full
//! pretty-printed JSON) plus totals. A parse failure names the offending
//! document index and exits non-zero.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use affect_relay::record::read_experience_log;

#[derive(Parser, Debug)]
#[command(
    name = "experience_dump",
    about = "Parse and summarize an affect-relay experience log"
)]
struct Args {
    /// Path to the experience log
    log: PathBuf,

    /// Pretty-print every document instead of summarizing
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let documents = read_experience_log(&args.log)?;
    let mut total_faces = 0usize;
    for (index, doc) in documents.iter().enumerate() {
        total_faces += doc.persons.len();
        if args.pretty {
            println!("{}", serde_json::to_string_pretty(doc)?);
            continue;
        }
        let dominant = doc
            .persons
            .first()
            .map(|person| person.emojis.dominant())
            .unwrap_or("none");
        println!(
            "#{:<5} t={:<10.3} local={} faces={} dominant={}",
            index,
            doc.timestamp_experience,
            doc.timestamp_local,
            doc.persons.len(),
            dominant
        );
    }

    println!(
        "{}: {} documents, {} faces",
        args.log.display(),
        documents.len(),
        total_faces
    );
    Ok(())
}
